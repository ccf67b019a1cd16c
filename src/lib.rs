//! # sncat
//!
//! Provenance-aware merge engine for supernova catalogs. Published ASCII tables are
//! read by dataset adapters and merged into a [`Catalog`](catalog::Catalog) of
//! entries, where every quantity and photometric point keeps the list of sources
//! asserting it.
//!
//! * [`catalog`]: entries, aliases and merges, source registry, quantity and
//!   photometry ledgers.
//! * [`adapters`]: one adapter per published table.
//! * [`ingest`]: runs the adapters and flushes the catalog to a [`journal`].
//! * [`conversion`], [`time`], [`notation`]: numeric, date and error-notation parsing.
pub mod adapters;
pub mod catalog;
pub mod catalog_errors;
pub mod config;
pub mod constants;
pub mod conversion;
pub mod ingest;
pub mod journal;
pub mod notation;
pub mod time;

pub use catalog::{Catalog, EntryMut};
pub use catalog_errors::CatalogError;
pub use config::IngestConfig;
