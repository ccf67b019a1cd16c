#![allow(dead_code)]

use approx::assert_relative_eq;
use rust_decimal::{prelude::ToPrimitive, Decimal};
use sncat::{
    catalog::{entry::Entry, quantity::QuantityKind},
    config::IngestConfig,
    ingest::DatasetReport,
};

pub const ASCII_DIR: &str = "tests/data/ascii";

/// Datasets with a fixture table under [`ASCII_DIR`].
pub const FIXTURE_DATASETS: [&str; 11] = [
    "2015ApJ...799...51M",
    "2013ApJ...767...57F",
    "2015MNRAS.446.3895F",
    "2015arXiv150907124M",
    "2004ApJ...606..381L",
    "2014ApJ...786...67A",
    "2004A&A...415..863G",
    "2016MNRAS.459.1039T",
    "2015MNRAS.449..451W",
    "2009MNRAS.398.1041B",
    "2010arXiv1007.0011P",
];

/// Entries created by ingesting every fixture dataset.
pub const FIXTURE_ENTRIES: usize = 11;

pub fn fixture_config() -> IngestConfig {
    IngestConfig::builder()
        .data_dir(ASCII_DIR)
        .only(FIXTURE_DATASETS)
        .build()
        .unwrap()
}

/// Config ingesting a single fixture dataset.
pub fn dataset_config(dataset: &str) -> IngestConfig {
    IngestConfig::builder()
        .data_dir(ASCII_DIR)
        .only([dataset])
        .build()
        .unwrap()
}

pub fn report<'a>(reports: &'a [DatasetReport], dataset: &str) -> &'a DatasetReport {
    reports
        .iter()
        .find(|r| r.dataset == dataset)
        .unwrap_or_else(|| panic!("no report for {dataset}"))
}

pub fn claimed_types(entry: &Entry) -> Vec<&str> {
    entry
        .quantities(QuantityKind::ClaimedType)
        .iter()
        .map(|q| q.value.as_str())
        .collect()
}

/// Bibcodes cited by an entry, sorted.
pub fn bibcodes(entry: &Entry) -> Vec<&str> {
    let mut bibcodes: Vec<&str> = entry.sources().iter().map(|s| s.bibcode.as_str()).collect();
    bibcodes.sort_unstable();
    bibcodes
}

pub fn assert_decimal_close(actual: Option<Decimal>, expected: f64, epsilon: f64) {
    let actual = actual.and_then(|d| d.to_f64()).unwrap();
    assert_relative_eq!(actual, expected, epsilon = epsilon);
}
