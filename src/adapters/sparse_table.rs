//! # Sparse table with in-file legends
//!
//! Photometry compilation of SN2003dh laid out as three blocks addressed by line
//! number:
//!
//! 1. an instrument legend, `key = Instrument description (Author et al.)`, whose
//!    author names point to additional bibcodes;
//! 2. a band legend, `key = band`;
//! 3. the data rows, `instrument_key band_key _ JD−2450000 mag _ err`.
//!
//! The line ranges are part of the [`SparseTableLayout`] of the table.
use std::{collections::HashMap, ops::RangeInclusive};

use crate::{
    adapters::{Adapter, DatasetSpec, Row},
    catalog::{
        photometry::{Epoch, Photometry},
        Catalog,
    },
    catalog_errors::CatalogError,
    time::jd_from_truncated,
};

/// Line ranges of the three blocks of a sparse table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseTableLayout {
    pub instruments: RangeInclusive<usize>,
    pub bands: RangeInclusive<usize>,
    pub data_from: usize,
}

struct InstrumentLegend {
    instrument: String,
    bibcode: Option<&'static str>,
}

pub struct SparseTable {
    spec: DatasetSpec,
    object: &'static str,
    layout: SparseTableLayout,
    references: &'static [(&'static str, &'static str)],
    instruments: HashMap<String, InstrumentLegend>,
    bands: HashMap<String, String>,
}

impl SparseTable {
    pub fn sn2003dh() -> Self {
        SparseTable {
            spec: DatasetSpec::new("2004ApJ...606..381L", "2004ApJ...606..381L-table3.txt", b' '),
            object: "SN2003dh",
            layout: SparseTableLayout {
                instruments: 23..=38,
                bands: 40..=43,
                data_from: 45,
            },
            references: &[
                ("Uemura", "2003Natur.423..843U"),
                ("Burenin", "2003AstL...29..573B"),
                ("Bloom", "2004AJ....127..252B"),
                ("Matheson", "2003ApJ...599..394M"),
            ],
            instruments: HashMap::new(),
            bands: HashMap::new(),
        }
    }

    fn read_instrument(&mut self, row: &Row) -> Result<(), CatalogError> {
        let key = row.require(0, "instrument key")?;
        let description = row.cells().get(2..).unwrap_or_default().join(" ");
        let description = description.trim_end_matches(['.', ';']);

        let instrument = description
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        let bibcode = self
            .references
            .iter()
            .find(|(author, _)| description.contains(author))
            .map(|(_, bibcode)| *bibcode);

        self.instruments
            .insert(key.to_string(), InstrumentLegend { instrument, bibcode });
        Ok(())
    }

    fn read_band(&mut self, row: &Row) -> Result<(), CatalogError> {
        let key = row.require(0, "band key")?;
        let band = row.require(2, "band")?;
        self.bands.insert(key.to_string(), band.to_string());
        Ok(())
    }
}

impl Adapter for SparseTable {
    fn spec(&self) -> &DatasetSpec {
        &self.spec
    }

    fn parse_header(&mut self, row: &Row) -> Result<bool, CatalogError> {
        let index = row.index();
        if self.layout.instruments.contains(&index) {
            self.read_instrument(row)?;
            return Ok(true);
        }
        if self.layout.bands.contains(&index) {
            self.read_band(row)?;
            return Ok(true);
        }
        Ok(index < self.layout.data_from)
    }

    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError> {
        let instrument_key = row.require(0, "instrument key")?;
        let legend = self
            .instruments
            .get(instrument_key)
            .ok_or_else(|| row.structure(format!("unknown instrument key {instrument_key:?}")))?;
        let band_key = row.require(1, "band key")?;
        let band = self
            .bands
            .get(band_key)
            .ok_or_else(|| row.structure(format!("unknown band key {band_key:?}")))?;

        let (Some(time), Some(magnitude)) = (row.observed(3, "time")?, row.observed(4, "magnitude")?)
        else {
            return Ok(());
        };
        let jd = jd_from_truncated(time);

        let (name, source) = catalog.new_entry(self.object, self.spec.bibcode)?;
        let mut sources = vec![source];
        if let Some(bibcode) = legend.bibcode {
            sources.push(catalog.entry_mut(&name)?.add_source(bibcode)?);
        }

        let photometry = Photometry::builder(Epoch::Jd(jd), sources)
            .instrument(legend.instrument.as_str())
            .band(band.as_str())
            .magnitude(magnitude)
            .e_magnitude(row.decimal(6)?)
            .build()?;
        catalog.entry_mut(&name)?.add_photometry(photometry)?;
        Ok(())
    }
}
