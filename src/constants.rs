//! # Constants and type definitions for sncat
//!
//! This module centralizes the **numeric constants** and **common type aliases**
//! used by the catalog merge engine and the dataset adapters.
//!
//! ## Overview
//!
//! - Time-system offsets (JD ↔ MJD, truncated JD used by several papers)
//! - Photometric constants (Pogson ratio, upper-limit sigma multiplier)
//! - Core type aliases used across the crate
//!
//! Every numeric constant is a [`Decimal`] so that chained conversions never go
//! through binary floating point.

use rust_decimal::Decimal;

// -------------------------------------------------------------------------------------------------
// Time systems
// -------------------------------------------------------------------------------------------------

/// Offset between Julian Date and Modified Julian Date (`MJD = JD − 2400000.5`)
pub const JD_MJD_OFFSET: Decimal = Decimal::from_parts(24_000_005, 0, 0, false, 1);

/// Offset of the truncated Julian dates (`JD − 2450000`) quoted by several tables
pub const JD_2450000: Decimal = Decimal::from_parts(2_450_000, 0, 0, false, 0);

// -------------------------------------------------------------------------------------------------
// Photometry
// -------------------------------------------------------------------------------------------------

/// Pogson ratio, `m = ZP − 2.5·log10(F)`
pub const POGSON: Decimal = Decimal::from_parts(25, 0, 0, false, 1);

/// Significance used when a non-detection is reported as an upper limit
pub const UPPER_LIMIT_SIGMA: Decimal = Decimal::from_parts(3, 0, 0, false, 0);

// -------------------------------------------------------------------------------------------------
// Text conventions
// -------------------------------------------------------------------------------------------------

/// Characters trimmed from both ends of textual quantities (aliases, claimed types)
pub const TEXT_TRIM_CHARS: &[char] = &[':', '*', ';', ',', '.'];

/// Cell contents standing for "no data" in the published tables
pub const PLACEHOLDER_CELLS: &[&str] = &["-", "--", "...", "…", "nodata", "no data", "n/a"];

/// Length of an ADS bibliographic code (`2015ApJ...799...51M`)
pub const BIBCODE_LEN: usize = 19;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Bibliographic code of a published paper
pub type Bibcode = String;
/// Modified Julian Date (days)
pub type Mjd = Decimal;
/// Julian Date (days)
pub type Jd = Decimal;
/// Magnitude (mag)
pub type Magnitude = Decimal;
