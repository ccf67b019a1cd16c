//! # Ingestion driver
//!
//! Runs the dataset adapters against a [`Catalog`], one dataset at a time and rows in
//! file order, then flushes the modified entries to a [`Journal`] after each dataset.
//!
//! ## Failure isolation
//! -----------------
//! A dataset that fails (missing file, structural violation, unparsable literal) is
//! reported in its [`DatasetReport`] and the run moves on to the next dataset, unless
//! [`IngestConfig::stop_on_error`] is set. Datasets already journaled are never
//! rolled back; the rows of the failing dataset read before the failure stay in the
//! catalog, and re-ingesting is idempotent.
//!
//! ## Progress
//! -----------------
//! With the `progress` feature, a progress bar over the datasets is drawn on stderr.
//!
//! ## Example
//! -----------------
//! ```rust,no_run
//! use sncat::{catalog::Catalog, config::IngestConfig, ingest, journal::JsonDirJournal};
//!
//! # fn demo() -> Result<(), sncat::catalog_errors::CatalogError> {
//! let config = IngestConfig::builder().data_dir("data/ascii").build()?;
//! let mut catalog = Catalog::new();
//! let mut journal = JsonDirJournal::new("output/entries")?;
//!
//! for report in ingest::run(&mut catalog, &mut journal, &config)? {
//!     if let Err(err) = &report.outcome {
//!         eprintln!("{}: {err}", report.dataset);
//!     }
//! }
//! # Ok(()) }
//! ```
#[cfg(feature = "progress")]
use std::time::Duration;

use camino::Utf8Path;
#[cfg(feature = "progress")]
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::{
    adapters::{all_adapters, read_rows, Adapter},
    catalog::Catalog,
    catalog_errors::CatalogError,
    config::IngestConfig,
    journal::Journal,
};

/// Counters of a successfully ingested dataset.
///
/// # Fields
///
/// * `files` - Files read (a dataset may span a directory of files)
/// * `rows` - Data rows handed to the adapter
/// * `header_rows` - Rows consumed as headers, legends or comments
/// * `committed` - Entries flushed to the journal at the end of the dataset
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DatasetStats {
    pub files: usize,
    pub rows: usize,
    pub header_rows: usize,
    pub committed: usize,
}

/// Outcome of one dataset.
#[derive(Debug)]
pub struct DatasetReport {
    pub dataset: String,
    pub outcome: Result<DatasetStats, CatalogError>,
}

impl DatasetReport {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Read every row of a dataset into `catalog`.
///
/// Return
/// ----------
/// * The dataset counters (`committed` left at zero), or the first error raised by
///   the reader or the adapter.
pub fn ingest_dataset(
    catalog: &mut Catalog,
    adapter: &mut dyn Adapter,
    data_dir: &Utf8Path,
) -> Result<DatasetStats, CatalogError> {
    let spec = *adapter.spec();
    let mut stats = DatasetStats::default();

    for path in adapter.files(data_dir)? {
        if !adapter.begin_file(catalog, &path)? {
            continue;
        }
        stats.files += 1;

        for row in read_rows(&spec, &path)? {
            let row = row?;
            if row.is_blank() {
                continue;
            }
            if adapter.parse_header(&row)? {
                stats.header_rows += 1;
                continue;
            }
            adapter.parse_row(catalog, &row)?;
            stats.rows += 1;
        }
    }

    Ok(stats)
}

fn process_dataset(
    catalog: &mut Catalog,
    journal: &mut dyn Journal,
    adapter: &mut dyn Adapter,
    data_dir: &Utf8Path,
) -> DatasetReport {
    let dataset = adapter.spec().name.to_string();
    info!(dataset = %dataset, "ingesting dataset");

    let outcome = ingest_dataset(catalog, adapter, data_dir);
    let flushed = catalog.journal_entries(journal);

    let outcome = match (outcome, flushed) {
        (Ok(stats), Ok(committed)) => {
            info!(
                dataset = %dataset,
                rows = stats.rows,
                entries = committed,
                "dataset ingested"
            );
            Ok(DatasetStats { committed, ..stats })
        }
        (Err(err), _) | (Ok(_), Err(err)) => {
            warn!(dataset = %dataset, error = %err, "dataset failed");
            Err(err)
        }
    };

    DatasetReport { dataset, outcome }
}

/// Ingest every dataset selected by `config`.
///
/// Return
/// ----------
/// * One [`DatasetReport`] per processed dataset, in processing order.
/// * [`CatalogError::InvalidIngestParameter`] if `config` selects an unknown dataset.
pub fn run(
    catalog: &mut Catalog,
    journal: &mut dyn Journal,
    config: &IngestConfig,
) -> Result<Vec<DatasetReport>, CatalogError> {
    run_adapters(catalog, journal, config, all_adapters())
}

/// Same as [`run`] over an explicit list of adapters.
pub fn run_adapters(
    catalog: &mut Catalog,
    journal: &mut dyn Journal,
    config: &IngestConfig,
    adapters: Vec<Box<dyn Adapter>>,
) -> Result<Vec<DatasetReport>, CatalogError> {
    if let Some(only) = config.only() {
        let unknown = only
            .iter()
            .filter(|name| !adapters.iter().any(|a| a.spec().name == name.as_str()))
            .join(", ");
        if !unknown.is_empty() {
            return Err(CatalogError::InvalidIngestParameter(format!(
                "unknown datasets: {unknown}"
            )));
        }
    }

    let selected: Vec<Box<dyn Adapter>> = adapters
        .into_iter()
        .filter(|adapter| config.selects(adapter.spec().name))
        .collect();
    debug!(datasets = selected.len(), data_dir = %config.data_dir(), "starting ingestion");

    Ok(drive(catalog, journal, config, selected))
}

#[cfg(feature = "progress")]
fn drive(
    catalog: &mut Catalog,
    journal: &mut dyn Journal,
    config: &IngestConfig,
    adapters: Vec<Box<dyn Adapter>>,
) -> Vec<DatasetReport> {
    let pb = ProgressBar::new((adapters.len() as u64).max(1));
    pb.set_style(
        ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} | ETA {eta_precise} | {msg}")
            .expect("indicatif template"),
    );
    pb.enable_steady_tick(Duration::from_millis(200));

    let mut reports = Vec::with_capacity(adapters.len());
    for mut adapter in adapters {
        pb.set_message(adapter.spec().name);
        let report = process_dataset(catalog, journal, adapter.as_mut(), config.data_dir());
        let failed = !report.is_ok();
        reports.push(report);
        pb.inc(1);

        if failed && config.stop_on_error() {
            pb.set_message("Interrupted");
            break;
        }
    }

    pb.disable_steady_tick();
    pb.finish_and_clear();
    reports
}

#[cfg(not(feature = "progress"))]
fn drive(
    catalog: &mut Catalog,
    journal: &mut dyn Journal,
    config: &IngestConfig,
    adapters: Vec<Box<dyn Adapter>>,
) -> Vec<DatasetReport> {
    let mut reports = Vec::with_capacity(adapters.len());
    for mut adapter in adapters {
        let report = process_dataset(catalog, journal, adapter.as_mut(), config.data_dir());
        let failed = !report.is_ok();
        reports.push(report);

        if failed && config.stop_on_error() {
            break;
        }
    }
    reports
}
