use hifitime::Epoch;
use rust_decimal::{prelude::ToPrimitive, Decimal};

use crate::{
    catalog_errors::CatalogError,
    constants::Jd,
    conversion::{jd_to_mjd, make_date_string},
};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Transformation from julian date (JD) to a catalog date string `YYYY/MM/DD`
///
/// Only the calendar day is kept. The MJD day number is computed exactly on the
/// decimal value and the calendar conversion is delegated to hifitime at midday,
/// so leap-second offsets can never move the date across midnight.
///
/// Argument
/// --------
/// * `jd`: a julian date
///
/// Return
/// ------
/// * the UTC calendar date of `jd`, e.g. `2453005.6` → `"2004/01/01"`
pub fn jd_to_date_string(jd: Jd) -> Result<String, CatalogError> {
    let mjd_day = jd_to_mjd(jd).floor();
    let days = mjd_day
        .to_f64()
        .ok_or_else(|| CatalogError::InvalidDate(jd.to_string()))?;

    let (year, month, day, _, _, _, _) = Epoch::from_mjd_utc(days + 0.5).to_gregorian_utc();
    Ok(make_date_string(year, Some(month), Some(day)))
}

/// Transformation from a date in the format `YYYY Mon DD` (e.g. `2013 Jan 05`) to `YYYY/MM/DD`
///
/// Month names are matched on their first three letters, case-insensitively.
/// The resulting date is validated against the Gregorian calendar.
pub fn parse_month_name_date(date_str: &str) -> Result<String, CatalogError> {
    let invalid = || CatalogError::InvalidDate(date_str.to_string());

    let parts: Vec<&str> = date_str.split_whitespace().collect();
    if parts.len() != 3 {
        return Err(invalid());
    }

    let year: i32 = parts[0].parse().map_err(|_| invalid())?;
    let month_key = parts[1]
        .get(..3)
        .map(|m| m.to_ascii_lowercase())
        .ok_or_else(invalid)?;
    let month = MONTHS
        .iter()
        .position(|m| *m == month_key)
        .map(|idx| idx as u8 + 1)
        .ok_or_else(invalid)?;
    let day: u8 = parts[2].parse().map_err(|_| invalid())?;

    Epoch::maybe_from_gregorian_utc(year, month, day, 0, 0, 0, 0).map_err(|_| invalid())?;

    Ok(make_date_string(year, Some(month), Some(day)))
}

/// Julian date from a truncated `JD − 2450000` value quoted in a table.
pub fn jd_from_truncated(truncated: Decimal) -> Jd {
    truncated + crate::constants::JD_2450000
}
