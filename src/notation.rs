//! # Published value notation
//!
//! Tables extracted from papers embed the uncertainty and the detection status in
//! the cell text itself. This module turns such cells into a [`Measurement`]:
//!
//! | Cell text        | value   | error  | upper limit |
//! |------------------|---------|--------|-------------|
//! | `18.52`          | 18.52   | –      | no          |
//! | `18.52 ± 0.05`   | 18.52   | 0.05   | no          |
//! | `18.52±0.05`     | 18.52   | 0.05   | no          |
//! | `18.52 +/- 0.05` | 18.52   | 0.05   | no          |
//! | `18.52(0.05)`    | 18.52   | 0.05   | no          |
//! | `18.52 0.05`     | 18.52   | 0.05   | no          |
//! | `<21.3`, `>21.3` | 21.3    | –      | yes         |
//! | `>21.3(0.2)`     | 21.3    | 0.2    | yes         |
//!
//! Anything else (`-`, `...`, blanks, free text) is missing data and yields `None`.
//! The parsers are written with [`nom`].
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1, one_of, space0, space1},
    combinator::{all_consuming, map, opt, recognize},
    sequence::{delimited, preceded},
    IResult, Parser,
};
use rust_decimal::Decimal;

use crate::{catalog_errors::CatalogError, conversion::parse_decimal};

/// A published value with its optional uncertainty.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub value: Decimal,
    pub error: Option<Decimal>,
    /// The value is a detection limit (`<` or `>` marker), not a measurement.
    pub upper_limit: bool,
}

fn number_literal(input: &str) -> IResult<&str, &str> {
    recognize((
        opt(one_of("+-")),
        alt((
            recognize((digit1, opt((char('.'), digit0)))),
            recognize((char('.'), digit1)),
        )),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

fn limit_marker(input: &str) -> IResult<&str, Option<char>> {
    opt(one_of("<>")).parse(input)
}

fn plus_minus_error(input: &str) -> IResult<&str, &str> {
    preceded(
        (space0, alt((tag("±"), tag("+/-"), tag("+-"))), space0),
        number_literal,
    )
    .parse(input)
}

fn paren_error(input: &str) -> IResult<&str, &str> {
    preceded(
        space0,
        delimited(
            char('('),
            delimited(space0, number_literal, space0),
            char(')'),
        ),
    )
    .parse(input)
}

fn spaced_error(input: &str) -> IResult<&str, &str> {
    preceded(space1, number_literal).parse(input)
}

type RawMeasurement<'a> = (Option<char>, &'a str, Option<&'a str>);

fn measurement(input: &str) -> IResult<&str, RawMeasurement<'_>> {
    map(
        (
            preceded(space0, limit_marker),
            preceded(space0, number_literal),
            opt(alt((plus_minus_error, paren_error, spaced_error))),
            space0,
        ),
        |(marker, value, error, _)| (marker, value, error),
    )
    .parse(input)
}

/// Parse a published cell into a [`Measurement`].
///
/// Return
/// ----------
/// * `Ok(None)` for cells that do not follow any known notation (missing data).
/// * `Ok(Some(measurement))` otherwise.
/// * `Err(CatalogError::DecimalParse)` if a literal recognized by the grammar cannot
///   be represented as a decimal.
pub fn parse_measurement(text: &str) -> Result<Option<Measurement>, CatalogError> {
    let Ok((_, (marker, value, error))) = all_consuming(measurement).parse(text.trim()) else {
        return Ok(None);
    };

    let literal = |raw: &str| -> Result<Decimal, CatalogError> {
        parse_decimal(raw)?.ok_or_else(|| CatalogError::DecimalParse(raw.into()))
    };

    let value = literal(value)?;
    let error = error.map(literal).transpose()?;

    Ok(Some(Measurement {
        value,
        error,
        upper_limit: marker.is_some(),
    }))
}

/// Split a `value ± error` cell on the plus-minus sign only, keeping each side's text.
///
/// Used for tables where the left-hand side may itself carry a limit marker
/// or a non-numeric placeholder that must be checked separately.
pub fn split_plus_minus(text: &str) -> (&str, Option<&str>) {
    match text.split_once('±') {
        Some((value, error)) => (value.trim(), Some(error.trim())),
        None => (text.trim(), None),
    }
}
