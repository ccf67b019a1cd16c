//! # Per-entry bibliographic source registry
//!
//! Every datum in the catalog is attributed to one or more published sources.
//! Sources are deduplicated **per entry** on their bibcode: the many rows of one
//! table all share the single [`SourceId`] allocated the first time the bibcode
//! was seen for that entry.
//!
//! Identifiers are sequential and start at `1`; they are only meaningful inside the
//! entry that allocated them. When two entries are merged the absorbed registry is
//! re-keyed into the surviving one with [`SourceRegistry::absorb`].
use std::{collections::HashMap, fmt};

use serde::Serialize;

use crate::{
    catalog_errors::CatalogError,
    constants::{Bibcode, BIBCODE_LEN},
    conversion::is_number,
};

/// Identifier of a source inside one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct SourceId(u32);

impl SourceId {
    pub fn new(id: u32) -> Self {
        SourceId(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRecord {
    pub alias: SourceId,
    pub bibcode: Bibcode,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct SourceRegistry {
    sources: Vec<SourceRecord>,
}

/// Check that a bibcode looks like an ADS bibliographic code.
///
/// A bibcode is exactly 19 characters long, starts with a four-digit year and
/// contains no whitespace (`2015ApJ...799...51M`, `2004A&A...415..863G`).
pub fn validate_bibcode(bibcode: &str) -> Result<&str, CatalogError> {
    let bibcode = bibcode.trim();
    let valid = bibcode.chars().count() == BIBCODE_LEN
        && !bibcode.contains(char::is_whitespace)
        && bibcode.get(..4).is_some_and(is_number);

    if valid {
        Ok(bibcode)
    } else {
        Err(CatalogError::InvalidBibcode(bibcode.to_string()))
    }
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a bibcode, returning its identifier.
    ///
    /// Idempotent: a bibcode already known to this registry returns the id
    /// allocated the first time, otherwise the next sequential id is allocated.
    ///
    /// Arguments
    /// -----------------
    /// * `bibcode`: the bibliographic code of the paper.
    ///
    /// Return
    /// ----------
    /// * The [`SourceId`] of the bibcode, or [`CatalogError::InvalidBibcode`].
    pub fn add_source(&mut self, bibcode: &str) -> Result<SourceId, CatalogError> {
        let bibcode = validate_bibcode(bibcode)?;

        if let Some(existing) = self.find(bibcode) {
            return Ok(existing);
        }

        let alias = SourceId(self.sources.len() as u32 + 1);
        self.sources.push(SourceRecord {
            alias,
            bibcode: bibcode.to_string(),
        });
        Ok(alias)
    }

    pub fn find(&self, bibcode: &str) -> Option<SourceId> {
        let bibcode = bibcode.trim();
        self.sources
            .iter()
            .find(|s| s.bibcode == bibcode)
            .map(|s| s.alias)
    }

    pub fn get(&self, id: SourceId) -> Option<&SourceRecord> {
        self.sources.iter().find(|s| s.alias == id)
    }

    pub fn contains(&self, id: SourceId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SourceRecord> {
        self.sources.iter()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Re-key every source of `other` into this registry.
    ///
    /// Return
    /// ----------
    /// * The mapping from the ids of `other` to the ids of `self`. Bibcodes known
    ///   to both registries map onto the existing id.
    pub fn absorb(
        &mut self,
        other: &SourceRegistry,
    ) -> Result<HashMap<SourceId, SourceId>, CatalogError> {
        other
            .iter()
            .map(|record| Ok((record.alias, self.add_source(&record.bibcode)?)))
            .collect()
    }
}
