mod common;

use rust_decimal_macros::dec;
use sncat::adapters::counts::CountsPhotometry;
use sncat::adapters::object_lists::ObjectTypeList;
use sncat::adapters::{Adapter, DatasetSpec};
use sncat::catalog::Catalog;
use sncat::catalog_errors::CatalogError;
use sncat::config::IngestConfig;
use sncat::ingest::{self, DatasetStats};
use sncat::journal::MemoryJournal;

use crate::common::{
    assert_decimal_close, bibcodes, claimed_types, dataset_config, fixture_config, report,
    ASCII_DIR, FIXTURE_DATASETS, FIXTURE_ENTRIES,
};

fn broken_counts() -> Box<dyn Adapter> {
    Box::new(CountsPhotometry::with_spec(DatasetSpec::new(
        "2015MNRAS.446.3895F",
        "broken/2015MNRAS.446.3895F.txt",
        b' ',
    )))
}

#[test]
fn test_counts_table_end_to_end() {
    let config = dataset_config("2015MNRAS.446.3895F");
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();

    let reports = ingest::run(&mut catalog, &mut journal, &config).unwrap();
    assert_eq!(reports.len(), 1);
    assert_eq!(
        reports[0].outcome.as_ref().unwrap(),
        &DatasetStats {
            files: 1,
            rows: 2,
            header_rows: 1,
            committed: 1,
        }
    );

    // placeholder counts: no point and no entry
    assert!(catalog.get("LSQ12fxe").is_none());
    let entry = catalog.get("LSQ12fxd").unwrap();
    assert_eq!(bibcodes(entry), vec!["2015MNRAS.446.3895F"]);

    let photometry = entry.photometry();
    assert_eq!(photometry.len(), 1);
    let point = &photometry[0];
    assert_eq!(point.time, dec!(56233.1));
    assert_eq!(point.magnitude, Some(dec!(20)));
    assert_eq!(point.counts, Some(dec!(100)));
    assert_eq!(point.zero_point, Some(dec!(25)));
    assert_eq!(point.band.as_deref(), Some("gr"));
    assert_eq!(point.instrument.as_deref(), Some("LSQ"));
    assert!(!point.upper_limit);
    assert_decimal_close(point.e_upper_magnitude, 2.5 * 1.1_f64.log10(), 1e-9);
    assert_decimal_close(point.e_lower_magnitude, 2.5 * (100.0_f64 / 90.0).log10(), 1e-9);

    let source = entry.sources().find("2015MNRAS.446.3895F").unwrap();
    assert!(point.source_ids.contains(&source));

    assert_eq!(journal.len(), 1);
    assert!(journal.get("LSQ12fxd").is_some());
    assert_eq!(journal.checkpoints(), 1);
}

#[test]
fn test_fixture_datasets() {
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();
    let reports = ingest::run(&mut catalog, &mut journal, &fixture_config()).unwrap();

    assert_eq!(reports.len(), FIXTURE_DATASETS.len());
    assert!(reports.iter().all(|r| r.is_ok()), "{reports:?}");
    assert_eq!(catalog.len(), FIXTURE_ENTRIES);

    let kait = catalog.get("SN2012ap").unwrap().photometry();
    assert_eq!(kait.len(), 3);
    assert!(kait.iter().all(|p| p.telescope.as_deref() == Some("KAIT")));

    let anderson = catalog.get("SN2004dj").unwrap().photometry();
    assert_eq!(anderson.len(), 2);
    assert_eq!(anderson[0].time, dec!(53224.0));
    assert_eq!(anderson[0].band_set.as_deref(), Some("Johnson-Cousins"));
    assert_eq!(
        report(&reports, "2014ApJ...786...67A").outcome.as_ref().unwrap().files,
        1
    );

    assert_eq!(catalog.resolve("PTF05hk"), Some("SN2005hk"));
    assert_eq!(claimed_types(catalog.get("SN2002cx").unwrap()), vec!["Ia-02cx"]);
}

#[test]
fn test_sparse_table_blocks_follow_line_numbers() {
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();
    let reports =
        ingest::run(&mut catalog, &mut journal, &dataset_config("2004ApJ...606..381L")).unwrap();

    // blank lines 42..=44 sit between the band legend and the first data row
    assert_eq!(
        reports[0].outcome.as_ref().unwrap(),
        &DatasetStats {
            files: 1,
            rows: 4,
            header_rows: 10,
            committed: 1,
        }
    );

    let entry = catalog.get("SN2003dh").unwrap();
    assert_eq!(
        bibcodes(entry),
        vec![
            "2003AstL...29..573B",
            "2003Natur.423..843U",
            "2004ApJ...606..381L"
        ]
    );

    let photometry = entry.photometry();
    assert_eq!(photometry.len(), 3);
    assert_eq!(photometry[0].instrument.as_deref(), Some("VSNET"));
    assert_eq!(photometry[0].band.as_deref(), Some("R"));
    assert_eq!(photometry[0].time, dec!(52743.02));
    assert_eq!(photometry[0].e_magnitude, Some(dec!(0.05)));
    assert_eq!(photometry[1].instrument.as_deref(), Some("FLWO 1.2 m"));
    assert_eq!(photometry[1].band.as_deref(), Some("V"));
    assert_eq!(photometry[1].e_magnitude, None);
    assert_eq!(photometry[2].instrument.as_deref(), Some("RTT150"));
    assert_eq!(photometry[2].time, dec!(52750.0));
    assert_eq!(photometry[2].source_ids.len(), 2);
}

#[test]
fn test_stromlo_csv_table() {
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();
    let reports =
        ingest::run(&mut catalog, &mut journal, &dataset_config("2004A&A...415..863G")).unwrap();
    assert_eq!(reports[0].outcome.as_ref().unwrap().rows, 3);

    let bc = catalog.get("SN1992bc").unwrap().photometry();
    assert_eq!(bc.len(), 2);
    assert_eq!(bc[0].band.as_deref(), Some("B"));
    assert_eq!(bc[0].time, dec!(48909.0));
    assert_eq!(bc[0].e_upper_magnitude, Some(dec!(0.1)));
    assert_eq!(bc[0].e_lower_magnitude, Some(dec!(0.12)));
    assert_eq!(bc[1].band.as_deref(), Some("RM"));
    assert!(bc[1].upper_limit);
    assert_eq!(bc[1].e_upper_magnitude, None);
    assert_eq!(bc[1].e_lower_magnitude, None);

    // quoted object name
    let a = catalog.get("SN1992A").unwrap().photometry();
    assert_eq!(a.len(), 1);
    assert_eq!(a[0].magnitude, Some(dec!(12.0)));
    assert_eq!(a[0].telescope.as_deref(), Some("CTIO"));
}

#[test]
fn test_parenthesized_error_table() {
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();
    let reports =
        ingest::run(&mut catalog, &mut journal, &dataset_config("2016MNRAS.459.1039T")).unwrap();
    assert!(reports[0].is_ok(), "{reports:?}");

    let photometry = catalog.get("LSQ13zm").unwrap().photometry();
    assert_eq!(photometry.len(), 3);
    assert_eq!(photometry[0].e_magnitude, Some(dec!(0.03)));
    assert!(photometry[1].upper_limit);
    assert_eq!(photometry[1].band.as_deref(), Some("r"));
    assert_eq!(photometry[2].time, dec!(56392.1));
    assert_eq!(photometry[2].magnitude, Some(dec!(18.70)));
    assert_eq!(photometry[2].e_magnitude, Some(dec!(0.05)));
    assert!(photometry.iter().all(|p| p.instrument.as_deref() == Some("EFOSC2")));
}

#[test]
fn test_same_object_across_tables() {
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();
    ingest::run(&mut catalog, &mut journal, &fixture_config()).unwrap();

    let entry = catalog.get("SN2008S").unwrap();
    assert_eq!(
        bibcodes(entry),
        vec!["2009MNRAS.398.1041B", "2010arXiv1007.0011P"]
    );

    let photometry = entry.photometry();
    assert_eq!(photometry.len(), 5);
    assert_eq!(photometry.iter().filter(|p| p.upper_limit).count(), 1);
    assert_eq!(
        photometry
            .iter()
            .filter(|p| p.instrument.as_deref() == Some("LBT"))
            .count(),
        1
    );
    assert_eq!(photometry[0].time, dec!(54508.1));
    assert_eq!(photometry[0].e_magnitude, Some(dec!(0.05)));
}

#[test]
fn test_alias_merge_across_datasets() {
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();
    let reports = ingest::run(&mut catalog, &mut journal, &fixture_config()).unwrap();

    // PTF08ha is journaled on its own before the light curve links it to SN2008ha
    assert!(report(&reports, "2015arXiv150907124M").is_ok());
    assert_eq!(catalog.resolve("PTF08ha"), Some("SN2008ha"));
    assert!(catalog.iter().all(|e| e.name() != "PTF08ha"));

    let entry = catalog.get("PTF08ha").unwrap();
    assert_eq!(entry.name(), "SN2008ha");
    assert!(entry.aliases().contains("PTF08ha"));
    assert_eq!(
        bibcodes(entry),
        vec![
            "2013ApJ...767...57F",
            "2015MNRAS.449..451W",
            "2015arXiv150907124M"
        ]
    );

    let mut types = claimed_types(entry);
    types.sort_unstable();
    assert_eq!(types, vec!["Ia-02cx", "Iax"]);

    let iax = entry
        .quantities(sncat::catalog::quantity::QuantityKind::ClaimedType)
        .iter()
        .find(|q| q.value == "Iax")
        .unwrap();
    assert_eq!(iax.source_ids.len(), 2);

    assert!(journal.get("PTF08ha").is_none());
    assert_eq!(journal.get("SN2008ha").unwrap().photometry().len(), 1);
    assert_eq!(journal.len(), FIXTURE_ENTRIES);
    assert_eq!(journal.checkpoints(), FIXTURE_DATASETS.len());
}

#[test]
fn test_reingestion_is_idempotent() {
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();
    let config = fixture_config();

    ingest::run(&mut catalog, &mut journal, &config).unwrap();
    let first = serde_json::to_value(catalog.iter().collect::<Vec<_>>()).unwrap();

    let reports = ingest::run(&mut catalog, &mut journal, &config).unwrap();
    assert!(reports.iter().all(|r| r.is_ok()));
    let second = serde_json::to_value(catalog.iter().collect::<Vec<_>>()).unwrap();

    assert_eq!(first, second);
    assert_eq!(journal.len(), FIXTURE_ENTRIES);
}

#[test]
fn test_failed_dataset_is_isolated() {
    let config = IngestConfig::builder().data_dir(ASCII_DIR).build().unwrap();
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();

    let adapters: Vec<Box<dyn Adapter>> = vec![broken_counts(), Box::new(ObjectTypeList::new())];
    let reports = ingest::run_adapters(&mut catalog, &mut journal, &config, adapters).unwrap();

    assert_eq!(reports.len(), 2);
    assert!(matches!(
        reports[0].outcome,
        Err(CatalogError::Structure { row: 1, .. })
    ));
    assert!(catalog.get("LSQ12fxd").is_none());
    assert!(reports[1].is_ok());
    assert!(catalog.get("SN2008ha").is_some());
}

#[test]
fn test_stop_on_error() {
    let config = IngestConfig::builder()
        .data_dir(ASCII_DIR)
        .stop_on_error(true)
        .build()
        .unwrap();
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();

    let adapters: Vec<Box<dyn Adapter>> = vec![broken_counts(), Box::new(ObjectTypeList::new())];
    let reports = ingest::run_adapters(&mut catalog, &mut journal, &config, adapters).unwrap();

    assert_eq!(reports.len(), 1);
    assert!(!reports[0].is_ok());
    assert!(catalog.is_empty());
    assert_eq!(journal.checkpoints(), 1);
}

#[test]
fn test_missing_tables_are_reported() {
    let config = IngestConfig::builder().data_dir(ASCII_DIR).build().unwrap();
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();

    let reports = ingest::run(&mut catalog, &mut journal, &config).unwrap();
    assert_eq!(reports.len(), 20);

    for report in &reports {
        if FIXTURE_DATASETS.contains(&report.dataset.as_str()) {
            assert!(report.is_ok(), "{}: {:?}", report.dataset, report.outcome);
        } else {
            assert!(
                matches!(report.outcome, Err(CatalogError::IoError(_))),
                "{}: {:?}",
                report.dataset,
                report.outcome
            );
        }
    }
    assert_eq!(catalog.len(), FIXTURE_ENTRIES);
}

#[test]
fn test_unknown_dataset_is_rejected() {
    let config = IngestConfig::builder()
        .data_dir(ASCII_DIR)
        .only(["2099ApJ...000....0X", "2015MNRAS.446.3895F"])
        .build()
        .unwrap();
    let mut catalog = Catalog::new();
    let mut journal = MemoryJournal::new();

    assert!(matches!(
        ingest::run(&mut catalog, &mut journal, &config),
        Err(CatalogError::InvalidIngestParameter(msg)) if msg == "unknown datasets: 2099ApJ...000....0X"
    ));
    assert_eq!(journal.checkpoints(), 0);
}
