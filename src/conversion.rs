//! # Numeric converter utilities
//!
//! Pure helpers shared by the ledgers and the dataset adapters:
//!
//! - [`is_number`] / [`parse_decimal`] – numeric-literal detection gating every
//!   field before it is turned into a [`Decimal`].
//! - [`jd_to_mjd`] – exact `JD → MJD` conversion.
//! - [`counts_to_magnitude`] – instrumental counts to magnitude with asymmetric
//!   error propagation.
//! - [`make_date_string`], [`expand_two_digit_year`] – catalog date/name conventions.
//!
//! All arithmetic is done on [`Decimal`] (28 significant digits), so chained
//! subtract/log10 operations do not drift away from the digit counts quoted in
//! the literature.
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::{Decimal, MathematicalOps};

use crate::{
    catalog_errors::CatalogError,
    constants::{Jd, Mjd, JD_MJD_OFFSET, POGSON, UPPER_LIMIT_SIGMA},
};

static NUMBER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?$").expect("numeric literal regex")
});

/// Check whether a token is a plain numeric literal.
///
/// Accepts an optional sign, digits with an optional fraction (`12`, `12.`,
/// `12.5`, `.5`) and an optional exponent. Placeholders (`-`, `...`), blanks,
/// `nan` and `inf` are rejected.
pub fn is_number(token: &str) -> bool {
    NUMBER_RE.is_match(token.trim())
}

/// Parse a published numeric token into a [`Decimal`], keeping its scale.
///
/// Arguments
/// -----------------
/// * `token`: the raw cell text.
///
/// Return
/// ----------
/// * `Ok(None)` when the token is not a numeric literal (expected missing data).
/// * `Ok(Some(value))` for numeric literals, `12.500` keeps its three decimals.
/// * `Err(CatalogError::DecimalParse)` when the token passed [`is_number`] but still
///   cannot be represented (e.g. out of range). This is a logic defect, not missing data.
pub fn parse_decimal(token: &str) -> Result<Option<Decimal>, CatalogError> {
    let token = token.trim();
    if !is_number(token) {
        return Ok(None);
    }

    let unsigned = token.trim_start_matches('+');
    let (negative, digits) = match unsigned.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, unsigned),
    };

    // "12." and ".5" are valid literals in the tables but not for Decimal::from_str
    let mut literal = String::with_capacity(digits.len() + 2);
    if negative {
        literal.push('-');
    }
    if digits.starts_with('.') {
        literal.push('0');
    }
    literal.push_str(&digits.replace(".e", "e").replace(".E", "E"));
    if literal.ends_with('.') {
        literal.pop();
    }

    let parsed = if literal.contains(['e', 'E']) {
        Decimal::from_scientific(&literal)
    } else {
        Decimal::from_str(&literal)
    };

    parsed
        .map(Some)
        .map_err(|_| CatalogError::DecimalParse(token.to_string()))
}

/// Remove insignificant trailing zeros from the fractional part (`123.4500 → 123.45`).
///
/// Integer digits are never touched: `100` stays `100`.
pub fn strip_trailing_zeros(value: Decimal) -> Decimal {
    value.normalize()
}

/// Transformation from julian date (JD) to modified julian date (MJD)
///
/// The subtraction is exact: the result keeps the larger scale of the two operands,
/// `jd_to_mjd(2450000.5) == 49999.0`.
pub fn jd_to_mjd(jd: Jd) -> Mjd {
    jd - JD_MJD_OFFSET
}

/// Build a catalog date string, `YYYY/MM/DD`, zero padded.
///
/// Partial dates are allowed: only the year (`YYYY`) or year and month (`YYYY/MM`).
pub fn make_date_string(year: i32, month: Option<u8>, day: Option<u8>) -> String {
    match (month, day) {
        (Some(month), Some(day)) => format!("{year:04}/{month:02}/{day:02}"),
        (Some(month), None) => format!("{year:04}/{month:02}"),
        _ => format!("{year:04}"),
    }
}

/// Expand a two-digit year as used in supernova designations of the 1990s–2000s.
///
/// `yy < 50` maps to `20yy`, anything else to `19yy`.
pub fn expand_two_digit_year(yy: u8) -> u16 {
    if yy < 50 {
        2000 + yy as u16
    } else {
        1900 + yy as u16
    }
}

/// Magnitude derived from instrumental counts.
///
/// A detection carries the asymmetric errors `e_upper` (towards brighter values,
/// from `C + σ`) and `e_lower` (towards fainter values, from `C − σ`). A non-detection
/// is a one-sided constraint and never carries an error.
#[derive(Debug, Clone, PartialEq)]
pub struct CountsMagnitude {
    pub magnitude: Decimal,
    pub e_upper: Option<Decimal>,
    pub e_lower: Option<Decimal>,
    pub upper_limit: bool,
}

fn log10(value: Decimal) -> Result<Decimal, CatalogError> {
    if value <= Decimal::ZERO {
        return Err(CatalogError::NonPositiveCounts(value));
    }
    value
        .checked_log10()
        .ok_or(CatalogError::NonPositiveCounts(value))
}

/// Convert instrumental counts into a magnitude.
///
/// Arguments
/// -----------------
/// * `counts`: the measured counts `C`.
/// * `e_counts`: the 1σ uncertainty on the counts (its sign is ignored).
/// * `zero_point`: the calibration zero-point `ZP`.
///
/// Return
/// ----------
/// * If `σ > C` the source is noise dominated and a 3σ upper limit is reported:
///   `mag = ZP − 2.5·log10(3σ)`, `upper_limit = true`, no error.
/// * Otherwise `mag = ZP − 2.5·log10(C)` with
///   `e_upper = 2.5·(log10(C+σ) − log10(C))` and
///   `e_lower = 2.5·(log10(C) − log10(C−σ))`.
///   When `σ == C` the lower bound is unbounded and `e_lower` is `None`.
/// * [`CatalogError::NonPositiveCounts`] when a logarithm of a non-positive value
///   would be required.
pub fn counts_to_magnitude(
    counts: Decimal,
    e_counts: Decimal,
    zero_point: Decimal,
) -> Result<CountsMagnitude, CatalogError> {
    let sigma = e_counts.abs();

    if sigma > counts {
        let magnitude = zero_point - POGSON * log10(UPPER_LIMIT_SIGMA * sigma)?;
        return Ok(CountsMagnitude {
            magnitude,
            e_upper: None,
            e_lower: None,
            upper_limit: true,
        });
    }

    let log_counts = log10(counts)?;
    let magnitude = zero_point - POGSON * log_counts;
    let e_upper = POGSON * (log10(counts + sigma)? - log_counts);

    let faint = counts - sigma;
    let e_lower = if faint > Decimal::ZERO {
        Some(POGSON * (log_counts - log10(faint)?))
    } else {
        None
    };

    Ok(CountsMagnitude {
        magnitude,
        e_upper: Some(e_upper),
        e_lower,
        upper_limit: false,
    })
}
