//! # Photometry published as instrumental counts
//!
//! Rows carry `name instrument+band time counts e_counts zero_point`. The instrument
//! and band are glued into one token (`LSQgr`, `PTFR`): LSQ tokens end with a two
//! character band, every other token with a single character.
//!
//! Magnitudes are derived by the photometry builder, see
//! [`counts_to_magnitude`](crate::conversion::counts_to_magnitude). A row with a
//! placeholder in any numeric column is skipped without creating its entry.
use crate::{
    adapters::{Adapter, DatasetSpec, Row},
    catalog::{
        photometry::{Epoch, Photometry},
        Catalog,
    },
    catalog_errors::CatalogError,
    conversion::strip_trailing_zeros,
};

/// Split an `instrument+band` token into its instrument and band.
///
/// Return
/// ----------
/// * `Some((instrument, band))`, `None` if the token is too short to hold a band.
pub fn split_instrument_band(token: &str) -> Option<(&str, &str)> {
    let band_chars = if token.starts_with("LSQ") { 2 } else { 1 };
    let split = token.char_indices().rev().nth(band_chars - 1)?.0;
    Some(token.split_at(split))
}

pub struct CountsPhotometry {
    spec: DatasetSpec,
}

impl CountsPhotometry {
    pub fn new() -> Self {
        Self::with_spec(DatasetSpec::new(
            "2015MNRAS.446.3895F",
            "2015MNRAS.446.3895F.txt",
            b' ',
        ))
    }

    /// Same layout, another table.
    pub fn with_spec(spec: DatasetSpec) -> Self {
        CountsPhotometry { spec }
    }
}

impl Default for CountsPhotometry {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for CountsPhotometry {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let object = row.require(0, "object name")?;
        let token = row.require(1, "instrument and band")?;
        let (instrument, band) = split_instrument_band(token)
            .ok_or_else(|| row.structure(format!("cannot split instrument and band in {token:?}")))?;

        let observed = (
            row.observed(2, "time")?,
            row.observed(3, "counts")?,
            row.observed(4, "counts error")?,
            row.observed(5, "zero-point")?,
        );
        let (Some(time), Some(counts), Some(e_counts), Some(zero_point)) = observed else {
            return Ok(());
        };
        let counts = strip_trailing_zeros(counts);
        let e_counts = strip_trailing_zeros(e_counts);
        let zero_point = strip_trailing_zeros(zero_point);

        let (name, source) = catalog.new_entry(object, self.spec.bibcode)?;
        let photometry = Photometry::builder(Epoch::Mjd(time), [source])
            .instrument(instrument)
            .band(band)
            .counts(counts, e_counts, zero_point)
            .build()?;
        catalog.entry_mut(&name)?.add_photometry(photometry)?;
        Ok(())
    }
}

#[cfg(test)]
mod counts_test {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_split_instrument_band() {
        assert_eq!(split_instrument_band("LSQgr"), Some(("LSQ", "gr")));
        assert_eq!(split_instrument_band("PTFR"), Some(("PTF", "R")));
        assert_eq!(split_instrument_band("g"), Some(("", "g")));
        assert_eq!(split_instrument_band(""), None);
    }

    #[test]
    fn test_counts_row_becomes_magnitude() {
        let mut catalog = Catalog::new();
        let mut adapter = CountsPhotometry::new();
        let row = Row::new(
            "2015MNRAS.446.3895F",
            1,
            ["LSQ12fxd", "LSQgr", "56233.1", "100.000", "10.000", "25.0"],
        );
        adapter.parse_row(&mut catalog, &row).unwrap();

        let entry = catalog.get("LSQ12fxd").unwrap();
        let photometry = &entry.photometry()[0];
        assert_eq!(photometry.magnitude, Some(dec!(20)));
        assert_eq!(photometry.instrument.as_deref(), Some("LSQ"));
        assert_eq!(photometry.band.as_deref(), Some("gr"));
        assert_eq!(photometry.counts, Some(dec!(100)));
        assert!(!photometry.upper_limit);
        assert_ne!(photometry.e_upper_magnitude, photometry.e_lower_magnitude);
    }

    #[test]
    fn test_noise_dominated_row_is_upper_limit() {
        let mut catalog = Catalog::new();
        let mut adapter = CountsPhotometry::new();
        let row = Row::new(
            "2015MNRAS.446.3895F",
            2,
            ["LSQ12fxd", "PTFR", "56240.0", "10", "15", "25"],
        );
        adapter.parse_row(&mut catalog, &row).unwrap();

        let photometry = &catalog.get("LSQ12fxd").unwrap().photometry()[0];
        assert!(photometry.upper_limit);
        assert_eq!(photometry.e_magnitude, None);
        assert_eq!(photometry.e_upper_magnitude, None);
        assert_eq!(photometry.band.as_deref(), Some("R"));
    }

    #[test]
    fn test_short_row_is_structural() {
        let mut catalog = Catalog::new();
        let mut adapter = CountsPhotometry::new();
        let row = Row::new("2015MNRAS.446.3895F", 4, ["LSQ12fxd", "LSQgr", "56233.1"]);
        assert!(matches!(
            adapter.parse_row(&mut catalog, &row),
            Err(CatalogError::Structure { row: 4, .. })
        ));
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_placeholder_counts_skip_the_row() {
        let mut catalog = Catalog::new();
        let mut adapter = CountsPhotometry::new();
        let name = "2015MNRAS.446.3895F";
        let rows = [
            Row::new(name, 1, ["LSQ12aaa", "LSQgr", "56233.1", "-", "10.000", "25.0"]),
            Row::new(name, 2, ["LSQ12fxd", "LSQgr", "...", "100.000", "10.000", "25.0"]),
            Row::new(name, 3, ["LSQ12fxd", "LSQgr", "56234.1", "100.000", "10.000", "25.0"]),
        ];
        for row in &rows {
            adapter.parse_row(&mut catalog, row).unwrap();
        }

        assert!(catalog.get("LSQ12aaa").is_none());
        let photometry = catalog.get("LSQ12fxd").unwrap().photometry();
        assert_eq!(photometry.len(), 1);
        assert_eq!(photometry[0].time, dec!(56234.1));
    }
}
