//! # Band-matrix light curves
//!
//! Tables with one epoch per row and one photometric band per column, the band names
//! given by a `#` header row. Three layouts are supported:
//!
//! * [`BandMatrix`]: cells hold `mag err` pairs separated by whitespace (KAIT
//!   photometry of SN2012ap).
//! * [`PlusMinusMatrix`]: cells hold `mag ± err`, optionally prefixed by `<` for
//!   detection limits. The object name, the epoch column and the instrument vary per
//!   table and are described by a [`PlusMinusLayout`].
//! * [`KCorrectedMatrix`]: bare magnitudes, already K-corrected, with a trailing
//!   comment column (SN1997cy).
use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    adapters::{entry_with_alias, header_bands, Adapter, DatasetSpec, Row},
    catalog::{
        photometry::{Epoch, Photometry},
        Catalog,
    },
    catalog_errors::CatalogError,
    conversion::parse_decimal,
    notation::{parse_measurement, split_plus_minus},
};

/// Photometry of a single object, `mag err` cells, fixed telescope.
pub struct BandMatrix {
    spec: DatasetSpec,
    object: &'static str,
    telescope: &'static str,
    bands: Option<Vec<String>>,
}

impl BandMatrix {
    pub fn kait() -> Self {
        BandMatrix {
            spec: DatasetSpec::new("2015ApJ...799...51M", "2015ApJ...799...51M-tab1.tsv", b'\t'),
            object: "SN2012ap",
            telescope: "KAIT",
            bands: None,
        }
    }
}

impl Adapter for BandMatrix {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_header(&mut self, row: &Row) -> Result<bool, CatalogError> {
        if row.is_comment() {
            self.bands = Some(row.cells().iter().skip(1).cloned().collect());
            return Ok(true);
        }
        Ok(false)
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let bands = header_bands(&self.bands, row)?;
        if row.len() > bands.len() + 1 {
            return Err(row.structure("more magnitude columns than header bands"));
        }
        let Some(time) = row.observed(0, "time")? else {
            return Ok(());
        };
        let (name, source) = catalog.new_entry(self.object, self.spec.bibcode)?;

        for (column, band) in (1..row.len()).zip(bands) {
            let Some(cell) = row.get(column) else {
                continue;
            };
            let Some(measurement) = parse_measurement(cell)? else {
                debug!(row = row.index(), cell, "no magnitude in `mag err` cell");
                continue;
            };

            let photometry = Photometry::builder(Epoch::Mjd(time), [source])
                .band(band.as_str())
                .magnitude(measurement.value)
                .e_magnitude(measurement.error)
                .telescope(self.telescope)
                .build()?;
            catalog.entry_mut(&name)?.add_photometry(photometry)?;
        }
        Ok(())
    }
}

/// Where a [`PlusMinusMatrix`] row takes its object name from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectName {
    /// Name in the given column, also recorded as an alias.
    Column(usize),
    /// Single-object table.
    Fixed(&'static str),
}

/// Instrument, telescope and observatory of a photometric point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Facility {
    pub instrument: Option<&'static str>,
    pub telescope: Option<&'static str>,
    pub observatory: Option<&'static str>,
}

/// How each observation is attributed to an instrument.
#[derive(Debug, Clone, Copy)]
pub enum InstrumentColumn {
    /// Same facility for every row.
    Fixed(Facility),
    /// Facility picked from the object name.
    PerObject(fn(&str) -> Facility),
    /// Free-text instrument in the last column of the row.
    Trailing,
}

/// Column layout of a `mag ± err` matrix.
///
/// # Fields
///
/// * `object` - Source of the object name
/// * `time_column` - Column of the epoch
/// * `time_is_jd` - The epoch is a Julian date, converted to MJD
/// * `first_band_column` - Column of the first band, also where the header bands start
/// * `instrument` - Instrument attribution of the observations
/// * `system` - Photometric system, if the table declares one
#[derive(Debug, Clone, Copy)]
pub struct PlusMinusLayout {
    pub object: ObjectName,
    pub time_column: usize,
    pub time_is_jd: bool,
    pub first_band_column: usize,
    pub instrument: InstrumentColumn,
    pub system: Option<&'static str>,
}

/// Photometry in `mag ± err` cells.
pub struct PlusMinusMatrix {
    spec: DatasetSpec,
    layout: PlusMinusLayout,
    bands: Option<Vec<String>>,
}

fn infrared_facility(object: &str) -> Facility {
    if object == "PTF09dlc" {
        Facility {
            instrument: Some("HAWK-I"),
            telescope: Some("VLT 8.1m"),
            observatory: Some("ESO"),
        }
    } else {
        Facility {
            instrument: Some("NIRI"),
            telescope: Some("Gemini North 8.2m"),
            observatory: Some("Gemini"),
        }
    }
}

impl PlusMinusMatrix {
    pub fn new(spec: DatasetSpec, layout: PlusMinusLayout) -> Self {
        PlusMinusMatrix {
            spec,
            layout,
            bands: None,
        }
    }

    /// Near-infrared follow-up of several objects (2012MNRAS.425.1007B).
    pub fn infrared_followup() -> Self {
        Self::new(
            DatasetSpec::new("2012MNRAS.425.1007B", "2012MNRAS.425.1007B.tsv", b'\t'),
            PlusMinusLayout {
                object: ObjectName::Column(0),
                time_column: 1,
                time_is_jd: false,
                first_band_column: 2,
                instrument: InstrumentColumn::PerObject(infrared_facility),
                system: Some("Natural"),
            },
        )
    }

    /// Optical light curve of SN2008S with one instrument per row (2009MNRAS.398.1041B).
    pub fn sn2008s_optical() -> Self {
        Self::new(
            DatasetSpec::new("2009MNRAS.398.1041B", "2009MNRAS.398.1041B.tsv", b'\t'),
            PlusMinusLayout {
                object: ObjectName::Fixed("SN2008S"),
                time_column: 0,
                time_is_jd: true,
                first_band_column: 2,
                instrument: InstrumentColumn::Trailing,
                system: None,
            },
        )
    }

    /// LBT light curve of SN2008S (2010arXiv1007.0011P).
    pub fn sn2008s_lbt() -> Self {
        Self::new(
            DatasetSpec::new("2010arXiv1007.0011P", "2010arXiv1007.0011P.tsv", b'\t'),
            PlusMinusLayout {
                object: ObjectName::Fixed("SN2008S"),
                time_column: 0,
                time_is_jd: false,
                first_band_column: 1,
                instrument: InstrumentColumn::Fixed(Facility {
                    instrument: Some("LBT"),
                    ..Facility::default()
                }),
                system: None,
            },
        )
    }

    fn band_columns(&self, row: &Row) -> std::ops::Range<usize> {
        let end = match self.layout.instrument {
            InstrumentColumn::Trailing => row.len().saturating_sub(1),
            _ => row.len(),
        };
        self.layout.first_band_column..end.max(self.layout.first_band_column)
    }
}

/// Read a `mag ± err` cell, `None` when the magnitude is not a number.
fn plus_minus_cell(cell: &str) -> Result<Option<(Decimal, Option<Decimal>, bool)>, CatalogError> {
    let (magnitude, error) = split_plus_minus(cell);
    let upper_limit = magnitude.starts_with('<');
    let magnitude = magnitude.trim_start_matches('<').trim();

    let Some(magnitude) = parse_decimal(magnitude)? else {
        return Ok(None);
    };
    let error = match error {
        Some(error) => parse_decimal(error)?,
        None => None,
    };
    Ok(Some((magnitude, error, upper_limit)))
}

impl Adapter for PlusMinusMatrix {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_header(&mut self, row: &Row) -> Result<bool, CatalogError> {
        if row.is_comment() {
            let columns = self.band_columns(row);
            self.bands = Some(row.cells().get(columns).map(<[String]>::to_vec).unwrap_or_default());
            return Ok(true);
        }
        Ok(false)
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let bands = header_bands(&self.bands, row)?;

        let object = match self.layout.object {
            ObjectName::Column(column) => row.require(column, "object name")?,
            ObjectName::Fixed(object) => object,
        };
        let Some(time) = row.observed(self.layout.time_column, "time")? else {
            return Ok(());
        };
        let (name, source) = match self.layout.object {
            ObjectName::Column(_) => entry_with_alias(catalog, object, self.spec.bibcode)?,
            ObjectName::Fixed(_) => catalog.new_entry(object, self.spec.bibcode)?,
        };

        let epoch = if self.layout.time_is_jd {
            Epoch::Jd(time)
        } else {
            Epoch::Mjd(time)
        };

        let facility = match self.layout.instrument {
            InstrumentColumn::Fixed(facility) => facility,
            InstrumentColumn::PerObject(pick) => pick(&name),
            InstrumentColumn::Trailing => Facility::default(),
        };
        let trailing = match self.layout.instrument {
            InstrumentColumn::Trailing => row.len().checked_sub(1).and_then(|last| row.get(last)),
            _ => None,
        };

        for (offset, column) in self.band_columns(row).enumerate() {
            let Some(cell) = row.get(column) else {
                continue;
            };
            let Some((magnitude, error, upper_limit)) = plus_minus_cell(cell)? else {
                continue;
            };
            let band = bands
                .get(offset)
                .ok_or_else(|| row.structure(format!("no header band for column {column}")))?;

            let photometry = Photometry::builder(epoch, [source])
                .band(band.as_str())
                .magnitude(magnitude)
                .e_magnitude(error)
                .upper_limit(upper_limit)
                .instrument(facility.instrument.or(trailing))
                .telescope(facility.telescope)
                .observatory(facility.observatory)
                .system(self.layout.system)
                .build()?;
            catalog.entry_mut(&name)?.add_photometry(photometry)?;
        }
        Ok(())
    }
}

/// K-corrected photometry of a single object, bare magnitudes and JD epochs.
pub struct KCorrectedMatrix {
    spec: DatasetSpec,
    object: &'static str,
    observatory: &'static str,
    telescope: &'static str,
    bands: Option<Vec<String>>,
}

impl KCorrectedMatrix {
    pub fn sn1997cy() -> Self {
        KCorrectedMatrix {
            spec: DatasetSpec::new("2000ApJ...533..320G", "2000ApJ...533..320G.tsv", b'\t'),
            object: "SN1997cy",
            observatory: "Mount Stromlo",
            telescope: "MSSSO",
            bands: None,
        }
    }
}

impl Adapter for KCorrectedMatrix {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_header(&mut self, row: &Row) -> Result<bool, CatalogError> {
        if row.is_comment() {
            // last header column labels the comment column
            let end = row.len().saturating_sub(1).max(1);
            self.bands = Some(row.cells()[1..end].to_vec());
            return Ok(true);
        }
        Ok(false)
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let bands = header_bands(&self.bands, row)?;
        let Some(jd) = row.observed(0, "julian date")? else {
            return Ok(());
        };
        let (name, source) = catalog.new_entry(self.object, self.spec.bibcode)?;

        for (column, band) in (1..=bands.len()).zip(bands) {
            let Some(magnitude) = row.decimal(column)? else {
                continue;
            };
            let photometry = Photometry::builder(Epoch::Jd(jd), [source])
                .band(band.as_str())
                .magnitude(magnitude)
                .observatory(self.observatory)
                .telescope(self.telescope)
                .k_corrected(true)
                .build()?;
            catalog.entry_mut(&name)?.add_photometry(photometry)?;
        }
        Ok(())
    }
}
