//! # Ingestion parameters
//!
//! [`IngestConfig`] controls which published tables [`ingest::run`](crate::ingest::run)
//! reads and how it reacts to a failing dataset. It is built with a validating
//! builder:
//!
//! ```rust
//! use sncat::config::IngestConfig;
//!
//! let config = IngestConfig::builder()
//!     .data_dir("tests/data/ascii")
//!     .only(["2015MNRAS.446.3895F"])
//!     .stop_on_error(true)
//!     .build()
//!     .unwrap();
//! assert!(config.selects("2015MNRAS.446.3895F"));
//! assert!(!config.selects("2013ApJ...767...57F"));
//! ```
use std::collections::BTreeSet;

use camino::{Utf8Path, Utf8PathBuf};

use crate::catalog_errors::CatalogError;

/// Parameters of an ingestion run.
///
/// # Fields
///
/// * `data_dir` - Directory holding the published tables, file names are relative to it
/// * `only` - Restrict the run to these dataset names (all datasets when `None`)
/// * `stop_on_error` - Abort the run at the first failed dataset instead of moving on
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    data_dir: Utf8PathBuf,
    only: Option<BTreeSet<String>>,
    stop_on_error: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        IngestConfig {
            data_dir: Utf8PathBuf::from("data"),
            only: None,
            stop_on_error: false,
        }
    }
}

impl IngestConfig {
    pub fn builder() -> IngestConfigBuilder {
        IngestConfigBuilder::new()
    }

    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    pub fn only(&self) -> Option<&BTreeSet<String>> {
        self.only.as_ref()
    }

    pub fn stop_on_error(&self) -> bool {
        self.stop_on_error
    }

    /// Whether the dataset called `name` takes part in the run.
    pub fn selects(&self, name: &str) -> bool {
        self.only.as_ref().is_none_or(|only| only.contains(name))
    }
}

/// Builder for [`IngestConfig`], with validation.
#[derive(Debug, Clone)]
pub struct IngestConfigBuilder {
    config: IngestConfig,
}

impl Default for IngestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl IngestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: IngestConfig::default(),
        }
    }

    pub fn data_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.config.data_dir = dir.into();
        self
    }

    pub fn only<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.only = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn stop_on_error(mut self, v: bool) -> Self {
        self.config.stop_on_error = v;
        self
    }

    /// Validate and return the configuration.
    ///
    /// Return
    /// ----------
    /// * [`CatalogError::InvalidIngestParameter`] if the data directory is empty, if
    ///   `only` was given an empty selection or a blank dataset name.
    pub fn build(self) -> Result<IngestConfig, CatalogError> {
        let c = &self.config;

        if c.data_dir.as_str().trim().is_empty() {
            return Err(CatalogError::InvalidIngestParameter(
                "data_dir must not be empty".into(),
            ));
        }

        if let Some(only) = &c.only {
            if only.is_empty() {
                return Err(CatalogError::InvalidIngestParameter(
                    "only must select at least one dataset".into(),
                ));
            }
            if only.iter().any(|name| name.trim().is_empty()) {
                return Err(CatalogError::InvalidIngestParameter(
                    "dataset names in only must not be blank".into(),
                ));
            }
        }

        Ok(self.config)
    }
}
