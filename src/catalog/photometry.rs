//! # Photometry ledger and normalization
//!
//! Normalized photometric observations of an entry. Records are built through
//! [`PhotometryBuilder`], which applies the catalog normalization rules before a
//! record ever reaches the ledger:
//!
//! - **Time**: every epoch is stored as MJD. Julian dates are converted with the
//!   exact decimal subtraction of [`jd_to_mjd`].
//! - **Counts**: instrumental counts without a published magnitude are converted
//!   with [`counts_to_magnitude`] (3σ upper limit for noise-dominated points,
//!   asymmetric errors otherwise). The counts, their error and the zero-point stay
//!   on the record.
//! - **Upper limits**: a non-detection is a one-sided constraint and keeps no
//!   magnitude error, neither the symmetric `e_magnitude` nor the asymmetric pair.
//!
//! Band and instrument arrive as separate fields; no text splitting happens here.
use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::trace;

use crate::{
    catalog::sources::SourceId,
    catalog_errors::CatalogError,
    constants::{Jd, Magnitude, Mjd},
    conversion::{counts_to_magnitude, jd_to_mjd},
};

/// Time system of a stored epoch. Ingested epochs are always normalized to MJD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TimeSystem {
    #[serde(rename = "MJD")]
    Mjd,
}

/// Epoch of an observation as published.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Epoch {
    Jd(Jd),
    Mjd(Mjd),
}

impl Epoch {
    pub fn to_mjd(self) -> Mjd {
        match self {
            Epoch::Jd(jd) => jd_to_mjd(jd),
            Epoch::Mjd(mjd) => mjd,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Photometry {
    pub time: Mjd,
    #[serde(rename = "u_time")]
    pub time_system: TimeSystem,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnitude: Option<Magnitude>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_magnitude: Option<Magnitude>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_upper_magnitude: Option<Magnitude>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_lower_magnitude: Option<Magnitude>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counts: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_counts: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zero_point: Option<Decimal>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub upper_limit: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telescope: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observatory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_set: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub k_corrected: bool,
    #[serde(rename = "source")]
    pub source_ids: BTreeSet<SourceId>,
}

impl Photometry {
    /// Start building an observation taken at `epoch`, attributed to `source_ids`.
    pub fn builder(
        epoch: Epoch,
        source_ids: impl IntoIterator<Item = SourceId>,
    ) -> PhotometryBuilder {
        PhotometryBuilder {
            record: Photometry {
                time: epoch.to_mjd(),
                time_system: TimeSystem::Mjd,
                band: None,
                magnitude: None,
                e_magnitude: None,
                e_upper_magnitude: None,
                e_lower_magnitude: None,
                counts: None,
                e_counts: None,
                zero_point: None,
                upper_limit: false,
                instrument: None,
                telescope: None,
                observatory: None,
                band_set: None,
                system: None,
                k_corrected: false,
                source_ids: source_ids.into_iter().collect(),
            },
        }
    }

    /// Same observation as `other`, ignoring the attribution.
    ///
    /// Numbers are compared as published: `18.2` and `18.20` are different records.
    pub fn same_observation(&self, other: &Photometry) -> bool {
        same_digits(self.time, other.time)
            && self.time_system == other.time_system
            && self.band == other.band
            && same_optional_digits(self.magnitude, other.magnitude)
            && same_optional_digits(self.e_magnitude, other.e_magnitude)
            && same_optional_digits(self.e_upper_magnitude, other.e_upper_magnitude)
            && same_optional_digits(self.e_lower_magnitude, other.e_lower_magnitude)
            && same_optional_digits(self.counts, other.counts)
            && same_optional_digits(self.e_counts, other.e_counts)
            && same_optional_digits(self.zero_point, other.zero_point)
            && self.upper_limit == other.upper_limit
            && self.instrument == other.instrument
            && self.telescope == other.telescope
            && self.observatory == other.observatory
            && self.band_set == other.band_set
            && self.system == other.system
            && self.k_corrected == other.k_corrected
    }
}

/// Equal value and equal number of decimal places.
fn same_digits(a: Decimal, b: Decimal) -> bool {
    a == b && a.scale() == b.scale()
}

fn same_optional_digits(a: Option<Decimal>, b: Option<Decimal>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => same_digits(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Builder for [`Photometry`], applying the normalization rules in [`build`](PhotometryBuilder::build).
#[derive(Debug, Clone)]
pub struct PhotometryBuilder {
    record: Photometry,
}

impl PhotometryBuilder {
    pub fn band<'a>(mut self, band: impl Into<Option<&'a str>>) -> Self {
        self.record.band = text(band.into());
        self
    }

    pub fn magnitude(mut self, magnitude: impl Into<Option<Magnitude>>) -> Self {
        self.record.magnitude = magnitude.into();
        self
    }

    pub fn e_magnitude(mut self, error: impl Into<Option<Magnitude>>) -> Self {
        self.record.e_magnitude = error.into();
        self
    }

    pub fn e_upper_magnitude(mut self, error: impl Into<Option<Magnitude>>) -> Self {
        self.record.e_upper_magnitude = error.into();
        self
    }

    pub fn e_lower_magnitude(mut self, error: impl Into<Option<Magnitude>>) -> Self {
        self.record.e_lower_magnitude = error.into();
        self
    }

    /// Instrumental counts with their 1σ error and the zero-point used to derive a magnitude.
    pub fn counts(mut self, counts: Decimal, e_counts: Decimal, zero_point: Decimal) -> Self {
        self.record.counts = Some(counts);
        self.record.e_counts = Some(e_counts);
        self.record.zero_point = Some(zero_point);
        self
    }

    pub fn upper_limit(mut self, upper_limit: bool) -> Self {
        self.record.upper_limit = upper_limit;
        self
    }

    pub fn instrument<'a>(mut self, instrument: impl Into<Option<&'a str>>) -> Self {
        self.record.instrument = text(instrument.into());
        self
    }

    pub fn telescope<'a>(mut self, telescope: impl Into<Option<&'a str>>) -> Self {
        self.record.telescope = text(telescope.into());
        self
    }

    pub fn observatory<'a>(mut self, observatory: impl Into<Option<&'a str>>) -> Self {
        self.record.observatory = text(observatory.into());
        self
    }

    pub fn band_set<'a>(mut self, band_set: impl Into<Option<&'a str>>) -> Self {
        self.record.band_set = text(band_set.into());
        self
    }

    pub fn system<'a>(mut self, system: impl Into<Option<&'a str>>) -> Self {
        self.record.system = text(system.into());
        self
    }

    pub fn k_corrected(mut self, k_corrected: bool) -> Self {
        self.record.k_corrected = k_corrected;
        self
    }

    /// Finalize the record.
    ///
    /// Return
    /// ----------
    /// * The normalized [`Photometry`] record.
    /// * [`CatalogError::MissingBrightness`] if neither a magnitude nor counts were given.
    /// * [`CatalogError::NonPositiveCounts`] if counts cannot be turned into a magnitude.
    pub fn build(self) -> Result<Photometry, CatalogError> {
        let mut record = self.record;

        if record.magnitude.is_none() {
            if let (Some(counts), Some(e_counts), Some(zero_point)) =
                (record.counts, record.e_counts, record.zero_point)
            {
                let derived = counts_to_magnitude(counts, e_counts, zero_point)?;
                record.magnitude = Some(derived.magnitude);
                record.e_upper_magnitude = derived.e_upper;
                record.e_lower_magnitude = derived.e_lower;
                record.upper_limit |= derived.upper_limit;
            }
        }

        if record.magnitude.is_none() && record.counts.is_none() {
            return Err(CatalogError::MissingBrightness);
        }

        if record.upper_limit {
            let errors = [
                record.e_magnitude.take(),
                record.e_upper_magnitude.take(),
                record.e_lower_magnitude.take(),
            ];
            if errors.iter().any(Option::is_some) {
                trace!(time = %record.time, "dropped magnitude errors of an upper limit");
            }
        }

        Ok(record)
    }
}

/// Photometric observations of one entry, in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct PhotometryLedger {
    records: Vec<Photometry>,
}

impl PhotometryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an observation.
    ///
    /// Return
    /// ----------
    /// * `true` if appended, `false` if an identical observation already existed
    ///   (its sources are extended instead).
    pub fn insert(&mut self, photometry: Photometry) -> bool {
        match self
            .records
            .iter_mut()
            .find(|p| p.same_observation(&photometry))
        {
            Some(existing) => {
                existing.source_ids.extend(photometry.source_ids);
                false
            }
            None => {
                self.records.push(photometry);
                true
            }
        }
    }

    pub fn as_slice(&self) -> &[Photometry] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &Photometry> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod photometry_test {
    use super::*;
    use approx::assert_relative_eq;
    use rust_decimal::prelude::ToPrimitive;
    use rust_decimal_macros::dec;

    fn src(id: u32) -> [SourceId; 1] {
        [SourceId::new(id)]
    }

    #[test]
    fn test_jd_epoch_is_normalized() {
        let p = Photometry::builder(Epoch::Jd(dec!(2450000.5)), src(1))
            .band("V")
            .magnitude(dec!(17.31))
            .build()
            .unwrap();
        assert_eq!(p.time, dec!(49999.0));
        assert_eq!(p.time_system, TimeSystem::Mjd);

        let p = Photometry::builder(Epoch::Mjd(dec!(56000.123)), src(1))
            .magnitude(dec!(17.31))
            .build()
            .unwrap();
        assert_eq!(p.time.to_string(), "56000.123");
    }

    #[test]
    fn test_counts_detection() {
        let p = Photometry::builder(Epoch::Mjd(dec!(56000)), src(1))
            .band("r")
            .counts(dec!(100), dec!(10), dec!(25))
            .build()
            .unwrap();

        assert_eq!(p.magnitude, Some(dec!(20.0)));
        assert!(!p.upper_limit);
        assert_eq!(p.e_magnitude, None);
        assert_relative_eq!(
            p.e_upper_magnitude.unwrap().to_f64().unwrap(),
            2.5 * (110f64.log10() - 2.0),
            epsilon = 1e-9
        );
        assert_relative_eq!(
            p.e_lower_magnitude.unwrap().to_f64().unwrap(),
            2.5 * (2.0 - 90f64.log10()),
            epsilon = 1e-9
        );
        assert_eq!(p.counts, Some(dec!(100)));
        assert_eq!(p.zero_point, Some(dec!(25)));
    }

    #[test]
    fn test_counts_non_detection() {
        let p = Photometry::builder(Epoch::Mjd(dec!(56000)), src(1))
            .counts(dec!(10), dec!(15), dec!(25))
            .build()
            .unwrap();
        assert!(p.upper_limit);
        assert_eq!(p.e_magnitude, None);
        assert_eq!(p.e_upper_magnitude, None);
        assert_eq!(p.e_lower_magnitude, None);
    }

    #[test]
    fn test_upper_limit_drops_symmetric_error() {
        let p = Photometry::builder(Epoch::Mjd(dec!(56000)), src(1))
            .magnitude(dec!(21.3))
            .e_magnitude(dec!(0.2))
            .upper_limit(true)
            .build()
            .unwrap();
        assert!(p.upper_limit);
        assert_eq!(p.e_magnitude, None);
    }

    #[test]
    fn test_upper_limit_drops_asymmetric_errors() {
        let p = Photometry::builder(Epoch::Mjd(dec!(56000)), src(1))
            .magnitude(dec!(17.9))
            .e_upper_magnitude(dec!(0.2))
            .e_lower_magnitude(dec!(0.3))
            .upper_limit(true)
            .build()
            .unwrap();
        assert_eq!(p.e_upper_magnitude, None);
        assert_eq!(p.e_lower_magnitude, None);
    }

    #[test]
    fn test_missing_brightness() {
        let res = Photometry::builder(Epoch::Mjd(dec!(56000)), src(1))
            .band("V")
            .build();
        assert_eq!(res, Err(CatalogError::MissingBrightness));
    }

    #[test]
    fn test_blank_text_fields_are_absent() {
        let p = Photometry::builder(Epoch::Mjd(dec!(56000)), src(1))
            .magnitude(dec!(18))
            .instrument("  ")
            .telescope(None)
            .band(Some(" B "))
            .build()
            .unwrap();
        assert_eq!(p.instrument, None);
        assert_eq!(p.telescope, None);
        assert_eq!(p.band.as_deref(), Some("B"));
    }

    #[test]
    fn test_ledger_dedup() {
        let mut ledger = PhotometryLedger::new();
        let point = |id| {
            Photometry::builder(Epoch::Mjd(dec!(56000.5)), src(id))
                .band("V")
                .magnitude(dec!(18.2))
                .e_magnitude(dec!(0.05))
                .build()
                .unwrap()
        };

        assert!(ledger.insert(point(1)));
        assert!(!ledger.insert(point(2)));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.as_slice()[0].source_ids.len(), 2);

        let other_band = Photometry::builder(Epoch::Mjd(dec!(56000.5)), src(1))
            .band("R")
            .magnitude(dec!(18.2))
            .build()
            .unwrap();
        assert!(ledger.insert(other_band));
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_ledger_keeps_published_precision_apart() {
        let mut ledger = PhotometryLedger::new();
        let point = |magnitude: Decimal, error: Option<Decimal>| {
            Photometry::builder(Epoch::Mjd(dec!(56000.5)), src(1))
                .band("V")
                .magnitude(magnitude)
                .e_magnitude(error)
                .build()
                .unwrap()
        };

        assert!(ledger.insert(point(dec!(18.2), Some(dec!(0.05)))));
        assert!(ledger.insert(point(dec!(18.20), Some(dec!(0.05)))));
        assert!(ledger.insert(point(dec!(18.2), Some(dec!(0.050)))));
        assert!(ledger.insert(point(dec!(18.2), None)));
        assert!(!ledger.insert(point(dec!(18.20), Some(dec!(0.05)))));
        assert_eq!(ledger.len(), 4);
    }
}
