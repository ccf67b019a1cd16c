//! Ingest every ASCII table found under a data directory and write one JSON document
//! per entry.
//!
//! ```text
//! cargo run --example ingest_ascii -- <data_dir> <output_dir> [dataset ...]
//! RUST_LOG=sncat=debug cargo run --example ingest_ascii --features progress -- data/ascii out
//! ```
use sncat::{
    catalog::Catalog, catalog_errors::CatalogError, config::IngestConfig, ingest,
    journal::JsonDirJournal,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), CatalogError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sncat=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let data_dir = args.next().unwrap_or_else(|| "data/ascii".into());
    let output_dir = args.next().unwrap_or_else(|| "output/entries".into());
    let only: Vec<String> = args.collect();

    let mut builder = IngestConfig::builder().data_dir(data_dir);
    if !only.is_empty() {
        builder = builder.only(only);
    }
    let config = builder.build()?;

    let mut catalog = Catalog::new();
    let mut journal = JsonDirJournal::new(&output_dir)?;
    let reports = ingest::run(&mut catalog, &mut journal, &config)?;

    for report in &reports {
        match &report.outcome {
            Ok(stats) => println!(
                "{:<22} ok     {:>5} rows  {:>4} entries",
                report.dataset, stats.rows, stats.committed
            ),
            Err(err) => println!("{:<22} FAILED {err}", report.dataset),
        }
    }

    let failed = reports.iter().filter(|r| !r.is_ok()).count();
    println!(
        "{} entries in {}, {failed}/{} datasets failed",
        catalog.len(),
        journal.dir(),
        reports.len()
    );
    Ok(())
}
