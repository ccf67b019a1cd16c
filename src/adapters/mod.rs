//! # Dataset adapters
//!
//! Each published table is described by a [`DatasetSpec`] (file, delimiter, bibcode)
//! and interpreted by an [`Adapter`], which turns the table rows into catalog records.
//!
//! ## Overview
//! -----------------
//! Tables are read with the `csv` crate, without headers and with a flexible number
//! of columns per row. Every cell is trimmed; space-delimited tables have runs of
//! spaces collapsed so that aligned columns split cleanly.
//!
//! The driver ([`ingest::run`](crate::ingest::run)) feeds every [`Row`] of a dataset to
//! its adapter in file order:
//! 1. [`Adapter::parse_header`] first, which may consume the row (header or comment
//!    row, band legend, ...), keeping whatever state the following rows need;
//! 2. [`Adapter::parse_row`] otherwise, which adds entries, quantities and photometry.
//!
//! Row indices are 0-based physical line numbers, so that tables addressed by fixed
//! line ranges stay aligned even when blank lines are present. Files are split into
//! lines first and every line is parsed as a single `csv` record; a blank line is a
//! row without cells.
//!
//! ## Missing data
//! -----------------
//! Blank cells and the placeholders of [`PLACEHOLDER_CELLS`] are missing data:
//! [`Row::get`] returns `None` for them and the field is skipped. This holds for the
//! epoch and brightness columns too: [`Row::observed`] gives `None` for a placeholder
//! and the adapter skips that observation. A row that does not follow the layout of
//! its table (missing column, data before the band header, unknown legend key) is a
//! [`CatalogError::Structure`], fatal to that dataset.
//!
//! ## Datasets
//! -----------------
//! [`all_adapters`] lists every supported table in processing order.
pub mod band_matrix;
pub mod counts;
pub mod light_curves;
pub mod object_lists;
pub mod sparse_table;

use std::{
    fs::File,
    io::{BufRead, BufReader, Split},
    iter::Enumerate,
};

use camino::{Utf8Path, Utf8PathBuf};
use csv::{ByteRecord, ReaderBuilder};
use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    catalog::{
        quantity::{Quantity, QuantityKind},
        sources::SourceId,
        Catalog,
    },
    catalog_errors::CatalogError,
    constants::PLACEHOLDER_CELLS,
    conversion::parse_decimal,
};

/// Static description of one published table.
///
/// # Fields
///
/// * `name` - Dataset name used in reports and in [`IngestConfig::only`](crate::config::IngestConfig::only)
/// * `path` - File (or directory) relative to the data directory
/// * `delimiter` - Column delimiter, `b' '` collapses runs of spaces
/// * `bibcode` - Source every record of the table is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetSpec {
    pub name: &'static str,
    pub path: &'static str,
    pub delimiter: u8,
    pub bibcode: &'static str,
}

impl DatasetSpec {
    /// A dataset named after its bibcode.
    pub const fn new(bibcode: &'static str, path: &'static str, delimiter: u8) -> Self {
        DatasetSpec {
            name: bibcode,
            path,
            delimiter,
            bibcode,
        }
    }

    pub fn collapses_spaces(&self) -> bool {
        self.delimiter == b' '
    }
}

/// One table row, cells trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    dataset: &'static str,
    index: usize,
    cells: Vec<String>,
}

impl Row {
    pub fn new<S: Into<String>>(
        dataset: &'static str,
        index: usize,
        cells: impl IntoIterator<Item = S>,
    ) -> Self {
        Row {
            dataset,
            index,
            cells: cells.into_iter().map(|c| c.into().trim().to_string()).collect(),
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// No cell carries any text.
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(String::is_empty)
    }

    pub fn cells(&self) -> &[String] {
        &self.cells
    }

    /// Cell text as read, `Some("")` for blank cells, `None` past the end of the row.
    pub fn raw(&self, column: usize) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    /// Cell text, `None` for missing, blank and placeholder cells.
    pub fn get(&self, column: usize) -> Option<&str> {
        self.raw(column)
            .filter(|cell| !cell.is_empty() && !PLACEHOLDER_CELLS.contains(cell))
    }

    /// The row is a comment or a header (first cell starts with `#`).
    pub fn is_comment(&self) -> bool {
        self.raw(0).is_some_and(|cell| cell.starts_with('#'))
    }

    /// Build a [`CatalogError::Structure`] pointing at this row.
    pub fn structure(&self, reason: impl Into<String>) -> CatalogError {
        CatalogError::structure(self.dataset, self.index, reason)
    }

    /// Cell text that the table layout requires.
    pub fn require(&self, column: usize, what: &str) -> Result<&str, CatalogError> {
        self.get(column)
            .ok_or_else(|| self.structure(format!("missing {what} in column {column}")))
    }

    /// Numeric cell, `None` when missing or not a number.
    pub fn decimal(&self, column: usize) -> Result<Option<Decimal>, CatalogError> {
        match self.get(column) {
            Some(cell) => parse_decimal(cell),
            None => Ok(None),
        }
    }

    /// Numeric cell holding one observed value (epoch, magnitude, counts...).
    ///
    /// Return
    /// ----------
    /// * `Some(value)` for a number, `None` for a blank, placeholder or non-numeric
    ///   cell: the observation is missing and the caller skips it.
    /// * [`CatalogError::Structure`] when the row stops before `column`.
    pub fn observed(&self, column: usize, what: &str) -> Result<Option<Decimal>, CatalogError> {
        if self.raw(column).is_none() {
            return Err(self.structure(format!("missing {what} in column {column}")));
        }
        let value = self.decimal(column)?;
        if value.is_none() {
            debug!(
                dataset = self.dataset,
                row = self.index,
                column,
                cell = self.raw(column).unwrap_or_default(),
                "no {what}, observation skipped"
            );
        }
        Ok(value)
    }
}

/// Rows of one table file, in file order, blank lines included.
pub struct RowReader {
    dataset: &'static str,
    collapse_spaces: bool,
    builder: ReaderBuilder,
    lines: Enumerate<Split<BufReader<File>>>,
}

impl RowReader {
    fn parse_line(&self, index: usize, mut line: Vec<u8>) -> Result<Row, CatalogError> {
        if line.last() == Some(&b'\r') {
            line.pop();
        }

        let mut record = ByteRecord::new();
        self.builder
            .from_reader(line.as_slice())
            .read_byte_record(&mut record)?;

        let cells = record
            .iter()
            .map(|field| String::from_utf8_lossy(field).trim().to_string())
            .filter(|cell| !self.collapse_spaces || !cell.is_empty())
            .collect();

        Ok(Row {
            dataset: self.dataset,
            index,
            cells,
        })
    }
}

impl Iterator for RowReader {
    type Item = Result<Row, CatalogError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (index, line) = self.lines.next()?;
        Some(
            line.map_err(CatalogError::from)
                .and_then(|line| self.parse_line(index, line)),
        )
    }
}

/// Open `path` as a table laid out according to `spec`.
///
/// Return
/// ----------
/// * A [`RowReader`], or [`CatalogError::IoError`] if the file cannot be opened.
pub fn read_rows(spec: &DatasetSpec, path: &Utf8Path) -> Result<RowReader, CatalogError> {
    let file = File::open(path)?;
    let mut builder = ReaderBuilder::new();
    builder
        .delimiter(spec.delimiter)
        .has_headers(false)
        .flexible(true);

    Ok(RowReader {
        dataset: spec.name,
        collapse_spaces: spec.collapses_spaces(),
        builder,
        lines: BufReader::new(file).split(b'\n').enumerate(),
    })
}

/// Interpretation of one published table.
pub trait Adapter {
    fn spec(&self) -> &DatasetSpec;

    /// Files making up the dataset, a single file by default.
    fn files(&self, data_dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>, CatalogError> {
        Ok(vec![data_dir.join(self.spec().path)])
    }

    /// Called before the rows of each file; returning `false` skips the file.
    fn begin_file(&mut self, _catalog: &mut Catalog, _path: &Utf8Path) -> Result<bool, CatalogError> {
        Ok(true)
    }

    /// Consume header-like rows, returning `true` when `row` must not reach
    /// [`Adapter::parse_row`]. Comment rows are consumed by default.
    fn parse_header(&mut self, row: &Row) -> Result<bool, CatalogError> {
        Ok(row.is_comment())
    }

    /// Turn a data row into catalog records.
    fn parse_row(&mut self, catalog: &mut Catalog, row: &Row) -> Result<(), CatalogError>;
}

/// Get or create `name`, cite `bibcode` and record the name itself as an alias.
pub(crate) fn entry_with_alias(
    catalog: &mut Catalog,
    name: &str,
    bibcode: &str,
) -> Result<(String, SourceId), CatalogError> {
    let (name, source) = catalog.new_entry(name, bibcode)?;
    let mut entry = catalog.entry_mut(&name)?;
    entry.add_quantity(Quantity::builder(QuantityKind::Alias, &name, [source]).build())?;
    Ok((entry.name().to_string(), source))
}

/// Claim `alias` for the entry `name`, which may merge it into another entry.
///
/// Source ids are re-keyed by a merge, so the entry name and the id of `bibcode`
/// are looked up again and returned.
pub(crate) fn claim_alias(
    catalog: &mut Catalog,
    name: &str,
    alias: &str,
    bibcode: &str,
) -> Result<(String, SourceId), CatalogError> {
    let source = catalog.new_entry(name, bibcode)?.1;
    let mut entry = catalog.entry_mut(name)?;
    entry.add_quantity(Quantity::builder(QuantityKind::Alias, alias, [source]).build())?;
    let survivor = entry.name().to_string();
    catalog.new_entry(&survivor, bibcode)
}

/// Band names of a matrix table, read from its `#` header row.
pub(crate) fn header_bands<'a>(
    bands: &'a Option<Vec<String>>,
    row: &Row,
) -> Result<&'a [String], CatalogError> {
    bands
        .as_deref()
        .ok_or_else(|| row.structure("data row before the band header"))
}

/// Every supported dataset, in processing order.
pub fn all_adapters() -> Vec<Box<dyn Adapter>> {
    vec![
        Box::new(band_matrix::BandMatrix::kait()),
        Box::new(object_lists::ObjectTypeList::new()),
        Box::new(counts::CountsPhotometry::new()),
        Box::new(object_lists::TypedNameList::new()),
        Box::new(sparse_table::SparseTable::sn2003dh()),
        Box::new(object_lists::HostRedshiftTable::new()),
        Box::new(light_curves::AndersonLightCurves::new()),
        Box::new(light_curves::StromloPhotometry::new()),
        Box::new(light_curves::TypedLightCurve::new()),
        Box::new(light_curves::ParenthesizedErrors::new()),
        Box::new(light_curves::LimitedLightCurve::new()),
        Box::new(object_lists::DiscoveryTable::new()),
        Box::new(light_curves::FixedInstrumentLightCurve::new()),
        Box::new(band_matrix::PlusMinusMatrix::infrared_followup()),
        Box::new(object_lists::PhotoSpecRedshiftTable::new()),
        Box::new(object_lists::HostTypeTable::new()),
        Box::new(object_lists::HostRedshiftList::new()),
        Box::new(band_matrix::PlusMinusMatrix::sn2008s_optical()),
        Box::new(band_matrix::PlusMinusMatrix::sn2008s_lbt()),
        Box::new(band_matrix::KCorrectedMatrix::sn1997cy()),
    ]
}
