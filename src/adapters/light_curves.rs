//! # Light curves
//!
//! Tables with one photometric point (or one epoch) per row.
//!
//! | Adapter | Layout |
//! |---|---|
//! | [`AndersonLightCurves`] | one `.dat` file per object, `JD mag err` |
//! | [`StromloPhotometry`] | `name JD` then `(mag, e_upper, e_lower)` triples per band |
//! | [`TypedLightCurve`] | `alias/name type MJD mag band` |
//! | [`ParenthesizedErrors`] | band matrix of `mag(err)` cells, `>` limits |
//! | [`LimitedLightCurve`] | `band MJD _ mag err instrument`, `<` limits |
//! | [`FixedInstrumentLightCurve`] | `name MJD band mag err`, single instrument |
use camino::{Utf8Path, Utf8PathBuf};
use tracing::debug;

use crate::{
    adapters::{claim_alias, entry_with_alias, header_bands, Adapter, DatasetSpec, Row},
    catalog::{
        photometry::{Epoch, Photometry},
        quantity::{Quantity, QuantityKind},
        Catalog,
    },
    catalog_errors::CatalogError,
    conversion::{expand_two_digit_year, is_number},
    notation::parse_measurement,
};

/// Objects of the Anderson sample observed in the natural Swope system.
const SWOPE_OBJECTS: &[&str] = &["SN1999ca", "SN2003dq", "SN2008aw"];

struct LightCurveTarget {
    name: String,
    band_set: &'static str,
    system: &'static str,
}

/// V-band light curves of type II supernovae, one file per object.
///
/// File names start with the designation: `04dj_V.dat` holds SN2004dj. Files whose
/// name does not start with two digits are not light curves and are skipped.
pub struct AndersonLightCurves {
    spec: DatasetSpec,
    target: Option<LightCurveTarget>,
}

impl AndersonLightCurves {
    pub fn new() -> Self {
        AndersonLightCurves {
            spec: DatasetSpec::new("2014ApJ...786...67A", "SNII_anderson2014", b' '),
            target: None,
        }
    }

    /// Object name from a light-curve file name.
    ///
    /// Return
    /// ----------
    /// * `None` when the file name does not start with two digits.
    pub fn object_name(file_name: &str) -> Option<String> {
        let stem = file_name.split('_').next()?;
        let yy: u8 = stem.get(..2).filter(|yy| is_number(yy))?.parse().ok()?;
        let designation = stem.get(2..)?;

        // four-digit internal designations are not years
        if designation.bytes().all(|b| b.is_ascii_digit()) {
            return Some(format!("SN{stem}"));
        }
        Some(format!("SN{}{designation}", expand_two_digit_year(yy)))
    }
}

impl Adapter for AndersonLightCurves {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn files(&self, data_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, CatalogError> {
        let dir = data_dir.join(self.spec.path);
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&dir)? {
            let path = Utf8PathBuf::from_path_buf(entry?.path())
                .map_err(|path| CatalogError::Utf8PathError(path.display().to_string()))?;
            if path.extension() == Some("dat") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }

    fn begin_file(&mut self, catalog: &mut Catalog, path: &Utf8Path) -> Result<bool, CatalogError> {
        let file_name = path.file_name().unwrap_or_default();
        let Some(object) = Self::object_name(file_name) else {
            debug!(file = file_name, "not a light curve file");
            self.target = None;
            return Ok(false);
        };

        let (name, _) = entry_with_alias(catalog, &object, self.spec.bibcode)?;
        let (band_set, system) = if SWOPE_OBJECTS.contains(&name.as_str()) {
            ("Swope", "Swope")
        } else {
            ("Johnson-Cousins", "Landolt")
        };
        self.target = Some(LightCurveTarget {
            name,
            band_set,
            system,
        });
        Ok(true)
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let target = self
            .target
            .as_ref()
            .ok_or_else(|| row.structure("row outside of a light curve file"))?;

        let (Some(jd), Some(magnitude)) = (row.observed(0, "julian date")?, row.decimal(1)?) else {
            debug!(row = row.index(), "light curve point without magnitude");
            return Ok(());
        };

        let (name, source) = catalog.new_entry(&target.name, self.spec.bibcode)?;
        let photometry = Photometry::builder(Epoch::Jd(jd), [source])
            .band("V")
            .magnitude(magnitude)
            .e_magnitude(row.decimal(2)?)
            .band_set(target.band_set)
            .system(target.system)
            .build()?;
        catalog.entry_mut(&name)?.add_photometry(photometry)?;
        Ok(())
    }
}

/// Mount Stromlo photometry, bands as `(mag, e_upper, e_lower)` triples.
///
/// A blank upper error next to a lower error marks an upper limit, stored without
/// any error.
pub struct StromloPhotometry {
    spec: DatasetSpec,
}

impl StromloPhotometry {
    pub const BANDS: [&'static str; 6] = ["B", "V", "R", "I", "VM", "RM"];

    pub fn new() -> Self {
        StromloPhotometry {
            spec: DatasetSpec::new("2004A&A...415..863G", "J_A+A_415_863-1/photometry.csv", b','),
        }
    }
}

impl Adapter for StromloPhotometry {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let object = row.require(0, "object name")?;
        let Some(jd) = row.observed(1, "julian date")? else {
            return Ok(());
        };
        let (name, source) = entry_with_alias(catalog, object, self.spec.bibcode)?;

        for (triple, column) in (2..row.len()).step_by(3).enumerate() {
            let Some(magnitude) = row.decimal(column)? else {
                continue;
            };
            let band = Self::BANDS
                .get(triple)
                .ok_or_else(|| row.structure(format!("no band for column {column}")))?;

            // a lone lower error flags a limit, not an error bar
            let upper_limit = row.get(column + 1).is_none() && row.get(column + 2).is_some();
            let (e_upper, e_lower) = if upper_limit {
                (None, None)
            } else {
                (
                    row.decimal(column + 1)?.map(|e| e.abs()),
                    row.decimal(column + 2)?.map(|e| e.abs()),
                )
            };
            let (telescope, instrument) = match *band {
                "VM" | "RM" => ("MSSSO 1.3m", Some("MaCHO")),
                _ => ("CTIO", None),
            };

            let photometry = Photometry::builder(Epoch::Jd(jd), [source])
                .band(*band)
                .magnitude(magnitude)
                .e_upper_magnitude(e_upper)
                .e_lower_magnitude(e_lower)
                .upper_limit(upper_limit)
                .telescope(telescope)
                .instrument(instrument)
                .build()?;
            catalog.entry_mut(&name)?.add_photometry(photometry)?;
        }
        Ok(())
    }
}

/// One point per row with the object classification, `alias/name` object column.
pub struct TypedLightCurve {
    spec: DatasetSpec,
}

impl TypedLightCurve {
    pub fn new() -> Self {
        TypedLightCurve {
            spec: DatasetSpec::new("2015MNRAS.449..451W", "2015MNRAS.449..451W.dat", b'\t'),
        }
    }
}

impl Adapter for TypedLightCurve {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_header(&mut self, row: &Row) -> Result<bool, CatalogError> {
        Ok(row.index() == 0 || row.is_comment())
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let names: Vec<&str> = row.require(0, "object name")?.split('/').map(str::trim).collect();
        let object = match names.last() {
            Some(last) if last.starts_with("SN") => last.replace(' ', ""),
            Some(last) => last.to_string(),
            None => return Err(row.structure("empty object name")),
        };

        let (mut name, mut source) = entry_with_alias(catalog, &object, self.spec.bibcode)?;
        if names.len() > 1 {
            (name, source) = claim_alias(catalog, &name, names[0], self.spec.bibcode)?;
        }

        let mut entry = catalog.entry_mut(&name)?;
        if let Some(claimed_type) = row.get(1) {
            entry.add_quantity(
                Quantity::builder(QuantityKind::ClaimedType, claimed_type, [source]).build(),
            )?;
        }

        let (Some(time), Some(magnitude)) = (row.observed(2, "time")?, row.decimal(3)?) else {
            return Ok(());
        };
        let photometry = Photometry::builder(Epoch::Mjd(time), [source])
            .band(row.get(4))
            .magnitude(magnitude)
            .build()?;
        entry.add_photometry(photometry)?;
        Ok(())
    }
}

/// Band matrix of `mag(err)` cells for a single object, instrument in the last column.
pub struct ParenthesizedErrors {
    spec: DatasetSpec,
    object: &'static str,
    bands: Option<Vec<String>>,
}

impl ParenthesizedErrors {
    const FIRST_BAND: usize = 3;

    pub fn new() -> Self {
        ParenthesizedErrors {
            spec: DatasetSpec::new("2016MNRAS.459.1039T", "2016MNRAS.459.1039T.tsv", b'\t'),
            object: "LSQ13zm",
            bands: None,
        }
    }

    fn band_columns(row: &Row) -> std::ops::Range<usize> {
        Self::FIRST_BAND..row.len().saturating_sub(1).max(Self::FIRST_BAND)
    }
}

impl Adapter for ParenthesizedErrors {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_header(&mut self, row: &Row) -> Result<bool, CatalogError> {
        if row.is_comment() {
            let bands = Self::band_columns(row)
                .filter_map(|column| row.raw(column))
                .map(|band| band.replace("(err)", "").trim().to_string())
                .collect();
            self.bands = Some(bands);
            return Ok(true);
        }
        Ok(false)
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let bands = header_bands(&self.bands, row)?;
        let Some(time) = row.observed(1, "time")? else {
            return Ok(());
        };
        let instrument = row.len().checked_sub(1).and_then(|last| row.get(last));
        let (name, source) = entry_with_alias(catalog, self.object, self.spec.bibcode)?;

        for (offset, column) in Self::band_columns(row).enumerate() {
            let Some(measurement) = row.get(column).map(parse_measurement).transpose()?.flatten()
            else {
                continue;
            };
            let band = bands
                .get(offset)
                .ok_or_else(|| row.structure(format!("no header band for column {column}")))?;

            let photometry = Photometry::builder(Epoch::Mjd(time), [source])
                .band(band.as_str())
                .magnitude(measurement.value)
                .e_magnitude(measurement.error)
                .upper_limit(measurement.upper_limit)
                .instrument(instrument)
                .build()?;
            catalog.entry_mut(&name)?.add_photometry(photometry)?;
        }
        Ok(())
    }
}

/// Light curve of a single object with `<` detection limits.
pub struct LimitedLightCurve {
    spec: DatasetSpec,
    object: &'static str,
}

impl LimitedLightCurve {
    pub fn new() -> Self {
        LimitedLightCurve {
            spec: DatasetSpec::new("2015ApJ...804...28G", "2015ApJ...804...28G.tsv", b'\t'),
            object: "PS1-13arp",
        }
    }
}

impl Adapter for LimitedLightCurve {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_header(&mut self, row: &Row) -> Result<bool, CatalogError> {
        Ok(row.index() == 0 || row.is_comment())
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let Some(time) = row.observed(1, "time")? else {
            return Ok(());
        };
        let Some(measurement) = row.get(3).map(parse_measurement).transpose()?.flatten() else {
            debug!(row = row.index(), "light curve point without magnitude");
            return Ok(());
        };

        let (name, source) = entry_with_alias(catalog, self.object, self.spec.bibcode)?;
        let photometry = Photometry::builder(Epoch::Mjd(time), [source])
            .band(row.get(0))
            .magnitude(measurement.value)
            .e_magnitude(row.decimal(4)?)
            .upper_limit(measurement.upper_limit)
            .instrument(row.get(5))
            .build()?;
        catalog.entry_mut(&name)?.add_photometry(photometry)?;
        Ok(())
    }
}

/// Instrument, telescope, observatory and photometric system of a whole table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Setup {
    pub instrument: &'static str,
    pub telescope: &'static str,
    pub observatory: &'static str,
    pub band_set: &'static str,
    pub system: &'static str,
}

/// Multi-object light curves taken with a single instrument.
pub struct FixedInstrumentLightCurve {
    spec: DatasetSpec,
    setup: Setup,
}

impl FixedInstrumentLightCurve {
    pub fn new() -> Self {
        FixedInstrumentLightCurve {
            spec: DatasetSpec::new("2014ApJ...784..105W", "2014ApJ...784..105W.tsv", b'\t'),
            setup: Setup {
                instrument: "WHIRC",
                telescope: "WIYN 3.5 m",
                observatory: "NOAO",
                band_set: "Johnson-Cousins",
                system: "WHIRC",
            },
        }
    }
}

impl Adapter for FixedInstrumentLightCurve {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let object = row.require(0, "object name")?;
        let (Some(time), Some(magnitude)) = (row.observed(1, "time")?, row.decimal(3)?) else {
            return Ok(());
        };
        let (name, source) = entry_with_alias(catalog, object, self.spec.bibcode)?;

        let photometry = Photometry::builder(Epoch::Mjd(time), [source])
            .band(row.get(2))
            .magnitude(magnitude)
            .e_magnitude(row.decimal(4)?)
            .instrument(self.setup.instrument)
            .telescope(self.setup.telescope)
            .observatory(self.setup.observatory)
            .band_set(self.setup.band_set)
            .system(self.setup.system)
            .build()?;
        catalog.entry_mut(&name)?.add_photometry(photometry)?;
        Ok(())
    }
}

#[cfg(test)]
mod light_curves_test {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_anderson_object_name() {
        assert_eq!(
            AndersonLightCurves::object_name("04dj_V.dat").as_deref(),
            Some("SN2004dj")
        );
        assert_eq!(
            AndersonLightCurves::object_name("99em_V.dat").as_deref(),
            Some("SN1999em")
        );
        assert_eq!(
            AndersonLightCurves::object_name("0210_V.dat").as_deref(),
            Some("SN0210")
        );
        assert_eq!(AndersonLightCurves::object_name("README.dat"), None);
    }

    #[test]
    fn test_anderson_swope_system() {
        let mut catalog = Catalog::new();
        let mut adapter = AndersonLightCurves::new();
        assert!(!adapter
            .begin_file(&mut catalog, Utf8Path::new("SNII_anderson2014/notes.dat"))
            .unwrap());
        assert!(adapter
            .begin_file(&mut catalog, Utf8Path::new("SNII_anderson2014/99ca_V.dat"))
            .unwrap());

        let row = Row::new("2014ApJ...786...67A", 0, ["2451300.5", "15.2", "0.02"]);
        adapter.parse_row(&mut catalog, &row).unwrap();

        let point = &catalog.get("SN1999ca").unwrap().photometry()[0];
        assert_eq!(point.time, dec!(51300.0));
        assert_eq!(point.band_set.as_deref(), Some("Swope"));
        assert_eq!(point.system.as_deref(), Some("Swope"));
    }

    #[test]
    fn test_stromlo_triples() {
        let mut catalog = Catalog::new();
        let mut adapter = StromloPhotometry::new();
        let row = Row::new(
            "2004A&A...415..863G",
            0,
            [
                "SN1992bc", "2448909.5", "15.3", "0.1", "-0.12", "", "", "", "", "", "", "", "", "",
                "", "", "", "17.9", "", "0.3",
            ],
        );
        adapter.parse_row(&mut catalog, &row).unwrap();

        let photometry = catalog.get("SN1992bc").unwrap().photometry();
        assert_eq!(photometry.len(), 2);
        assert_eq!(photometry[0].band.as_deref(), Some("B"));
        assert_eq!(photometry[0].e_lower_magnitude, Some(dec!(0.12)));
        assert_eq!(photometry[0].telescope.as_deref(), Some("CTIO"));
        assert_eq!(photometry[1].band.as_deref(), Some("RM"));
        assert!(photometry[1].upper_limit);
        assert_eq!(photometry[1].instrument.as_deref(), Some("MaCHO"));
        assert_eq!(photometry[1].e_upper_magnitude, None);
        assert_eq!(photometry[1].e_lower_magnitude, None);
    }

    #[test]
    fn test_stromlo_placeholder_date_skips_the_row() {
        let mut catalog = Catalog::new();
        let mut adapter = StromloPhotometry::new();
        let row = Row::new("2004A&A...415..863G", 4, ["SN1992bc", "-", "15.3", "0.1", "0.1"]);
        adapter.parse_row(&mut catalog, &row).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn test_typed_light_curve_aliases() {
        let mut catalog = Catalog::new();
        let mut adapter = TypedLightCurve::new();
        let name = "2015MNRAS.449..451W";
        assert!(adapter
            .parse_header(&Row::new(name, 0, ["Name", "Type", "MJD", "mag", "band"]))
            .unwrap());

        let row = Row::new(name, 1, ["PTF10aaa/SN 2010ay", "Ic", "55270.1", "18.9", "R"]);
        adapter.parse_row(&mut catalog, &row).unwrap();

        assert_eq!(catalog.resolve("PTF10aaa"), Some("SN2010ay"));
        let entry = catalog.get("SN2010ay").unwrap();
        assert_eq!(entry.quantities(QuantityKind::ClaimedType)[0].value, "Ic");
        assert_eq!(entry.photometry()[0].band.as_deref(), Some("R"));
    }

    #[test]
    fn test_parenthesized_errors() {
        let mut catalog = Catalog::new();
        let mut adapter = ParenthesizedErrors::new();
        let name = "2016MNRAS.459.1039T";
        assert!(adapter
            .parse_header(&Row::new(name, 0, ["#Date", "MJD", "Phase", "g(err)", "r(err)", "Inst"]))
            .unwrap());
        let row = Row::new(name, 1, ["2013-04-08", "56390.1", "-5", "18.52(0.03)", ">20.1", "EFOSC2"]);
        adapter.parse_row(&mut catalog, &row).unwrap();

        let photometry = catalog.get("LSQ13zm").unwrap().photometry();
        assert_eq!(photometry.len(), 2);
        assert_eq!(photometry[0].band.as_deref(), Some("g"));
        assert_eq!(photometry[0].e_magnitude, Some(dec!(0.03)));
        assert!(photometry[1].upper_limit);
        assert_eq!(photometry[1].instrument.as_deref(), Some("EFOSC2"));
    }

    #[test]
    fn test_limited_light_curve() {
        let mut catalog = Catalog::new();
        let mut adapter = LimitedLightCurve::new();
        let name = "2015ApJ...804...28G";
        let rows = [
            Row::new(name, 1, ["g", "56391.3", "0", "<21.50", "...", "GPC1"]),
            Row::new(name, 2, ["r", "56392.3", "1", "20.10", "0.05", "GPC1"]),
        ];
        for row in &rows {
            adapter.parse_row(&mut catalog, row).unwrap();
        }

        let photometry = catalog.get("PS1-13arp").unwrap().photometry();
        assert!(photometry[0].upper_limit);
        assert_eq!(photometry[0].e_magnitude, None);
        assert_eq!(photometry[1].e_magnitude, Some(dec!(0.05)));
    }

    #[test]
    fn test_limited_light_curve_placeholder_time() {
        let mut catalog = Catalog::new();
        let mut adapter = LimitedLightCurve::new();
        let name = "2015ApJ...804...28G";
        let rows = [
            Row::new(name, 1, ["g", "-", "0", "20.50", "0.10", "GPC1"]),
            Row::new(name, 2, ["r", "56392.3", "1", "20.10", "0.05", "GPC1"]),
        ];
        for row in &rows {
            adapter.parse_row(&mut catalog, row).unwrap();
        }

        let photometry = catalog.get("PS1-13arp").unwrap().photometry();
        assert_eq!(photometry.len(), 1);
        assert_eq!(photometry[0].time, dec!(56392.3));
    }

    #[test]
    fn test_fixed_instrument() {
        let mut catalog = Catalog::new();
        let mut adapter = FixedInstrumentLightCurve::new();
        let row = Row::new("2014ApJ...784..105W", 1, ["SN2011fe", "55800.2", "J", "11.2", "0.02"]);
        adapter.parse_row(&mut catalog, &row).unwrap();

        let point = &catalog.get("SN2011fe").unwrap().photometry()[0];
        assert_eq!(point.instrument.as_deref(), Some("WHIRC"));
        assert_eq!(point.observatory.as_deref(), Some("NOAO"));
        assert_eq!(point.system.as_deref(), Some("WHIRC"));
    }

    #[test]
    fn test_fixed_instrument_placeholder_time() {
        let mut catalog = Catalog::new();
        let mut adapter = FixedInstrumentLightCurve::new();
        let row = Row::new("2014ApJ...784..105W", 1, ["SN2011fe", "...", "J", "11.2", "0.02"]);
        adapter.parse_row(&mut catalog, &row).unwrap();
        assert!(catalog.get("SN2011fe").is_none());
    }

    #[test]
    fn test_typed_light_curve_keeps_type_without_epoch() {
        let mut catalog = Catalog::new();
        let mut adapter = TypedLightCurve::new();
        let row = Row::new("2015MNRAS.449..451W", 2, ["SN2008ha", "Iax", "-", "18.9", "R"]);
        adapter.parse_row(&mut catalog, &row).unwrap();

        let entry = catalog.get("SN2008ha").unwrap();
        assert_eq!(entry.quantities(QuantityKind::ClaimedType)[0].value, "Iax");
        assert!(entry.photometry().is_empty());
    }
}
