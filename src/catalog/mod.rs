//! # Catalog: entry store, alias resolution and merge
//!
//! This module defines [`Catalog`], the store that every dataset adapter writes
//! into. It is passed explicitly (`&mut Catalog`) to whoever needs it; there is no
//! process-wide catalog.
//!
//! ## Responsibilities
//! -----------------
//! 1. **Name resolution**: any name or alias resolves to the one canonical entry
//!    through an alias index ([`Catalog::add_entry`], [`Catalog::resolve`]).
//! 2. **Record attribution**: records are added through an [`EntryMut`] handle,
//!    which validates sources and routes alias claims back into the index.
//! 3. **Merge**: when an alias claimed by one entry already belongs to another,
//!    both entries are merged. Nothing is dropped: aliases, sources (re-keyed),
//!    quantities and photometry are united. The survivor is the entry created
//!    first (ties broken on the name).
//! 4. **Checkpoints**: [`Catalog::journal_entries`] hands every entry modified
//!    since the previous checkpoint to a [`Journal`].
//!
//! ## Name normalization
//! -----------------
//! [`normalize_name`] trims the name, drops the space of `"SN 2005ap"` and
//! expands two-digit supernova years (`"SN99em"` → `"SN1999em"`,
//! `"SN04dj"` → `"SN2004dj"`).
//!
//! ## Example
//! -----------------
//! ```rust
//! use sncat::catalog::{Catalog, quantity::{Quantity, QuantityKind, MeasurementKind}};
//!
//! # fn demo() -> Result<(), sncat::catalog_errors::CatalogError> {
//! let mut catalog = Catalog::new();
//! let (name, source) = catalog.new_entry("SN2012ap", "2015ApJ...799...51M")?;
//!
//! let mut entry = catalog.entry_mut(&name)?;
//! entry.add_quantity(
//!     Quantity::builder(QuantityKind::Redshift, "0.01218", [source])
//!         .measurement_kind(MeasurementKind::Host)
//!         .build(),
//! )?;
//! assert_eq!(catalog.get("SN2012ap").unwrap().quantities(QuantityKind::Redshift).len(), 1);
//! # Ok(()) }
//! # demo().unwrap();
//! ```
pub mod entry;
pub mod photometry;
pub mod quantity;
pub mod sources;

use std::collections::{BTreeMap, BTreeSet, HashMap};

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::{
    catalog_errors::CatalogError, conversion::expand_two_digit_year, journal::Journal,
};
use entry::Entry;
use photometry::Photometry;
use quantity::{Quantity, QuantityKind};
use sources::SourceId;

static TWO_DIGIT_SN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SN(\d{2})([a-zA-Z]{1,3})$").expect("two-digit SN regex"));

static SPACED_SN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^SN\s+(\d{4}[a-zA-Z]{1,3})$").expect("spaced SN regex"));

/// Normalize an object name before it is resolved.
///
/// Return
/// ----------
/// * The normalized name, or [`CatalogError::EmptyName`] if nothing is left.
pub fn normalize_name(name: &str) -> Result<String, CatalogError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::EmptyName(name.to_string()));
    }

    if let Some(caps) = SPACED_SN_RE.captures(trimmed) {
        return Ok(format!("SN{}", &caps[1]));
    }

    if let Some(caps) = TWO_DIGIT_SN_RE.captures(trimmed) {
        let yy: u8 = caps[1]
            .parse()
            .map_err(|_| CatalogError::EmptyName(name.to_string()))?;
        return Ok(format!("SN{}{}", expand_two_digit_year(yy), &caps[2]));
    }

    Ok(trimmed.to_string())
}

#[derive(Debug, Default)]
pub struct Catalog {
    entries: BTreeMap<String, Entry>,
    alias_index: HashMap<String, String>,
    next_created: u64,
    dirty: BTreeSet<String>,
    retired: BTreeSet<String>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a name or alias to its canonical entry name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        let name = normalize_name(name).ok()?;
        self.alias_index.get(&name).map(String::as_str)
    }

    /// Get or create the entry called `name`.
    ///
    /// Arguments
    /// -----------------
    /// * `name`: a name or alias of the object.
    ///
    /// Return
    /// ----------
    /// * The canonical name of the entry. Repeated calls with the same name, or with
    ///   any alias of the entry, return the same canonical name.
    pub fn add_entry(&mut self, name: &str) -> Result<String, CatalogError> {
        let name = normalize_name(name)?;

        if let Some(canonical) = self.alias_index.get(&name) {
            return Ok(canonical.clone());
        }

        let entry = Entry::new(name.clone(), self.next_created);
        self.next_created += 1;
        self.alias_index.insert(name.clone(), name.clone());
        self.entries.insert(name.clone(), entry);
        self.dirty.insert(name.clone());
        self.retired.remove(&name);
        Ok(name)
    }

    /// Get or create the entry called `name` and register `bibcode` as one of its sources.
    ///
    /// Return
    /// ----------
    /// * `(canonical name, source id)`.
    pub fn new_entry(
        &mut self,
        name: &str,
        bibcode: &str,
    ) -> Result<(String, SourceId), CatalogError> {
        let name = self.add_entry(name)?;
        let source = self.entry_mut(&name)?.add_source(bibcode)?;
        Ok((name, source))
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        let canonical = self.resolve(name)?;
        self.entries.get(canonical)
    }

    /// Mutable handle on the entry named `name` (or any of its aliases).
    pub fn entry_mut(&mut self, name: &str) -> Result<EntryMut<'_>, CatalogError> {
        let canonical = self
            .resolve(name)
            .ok_or_else(|| CatalogError::EntryNotFound(name.to_string()))?
            .to_string();
        Ok(EntryMut {
            catalog: self,
            name: canonical,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flush every entry modified since the previous checkpoint to `journal`.
    ///
    /// Entries absorbed by a merge are retired from the journal first, then the
    /// modified entries are committed and the journal checkpoint is taken.
    ///
    /// Return
    /// ----------
    /// * The number of committed entries.
    pub fn journal_entries(&mut self, journal: &mut dyn Journal) -> Result<usize, CatalogError> {
        for name in &self.retired {
            journal.retire(name)?;
        }

        let mut committed = 0;
        for name in &self.dirty {
            if let Some(entry) = self.entries.get(name) {
                journal.commit(entry)?;
                committed += 1;
            }
        }
        journal.checkpoint()?;

        self.retired.clear();
        self.dirty.clear();
        Ok(committed)
    }

    fn entry_by_canonical(&mut self, name: &str) -> Result<&mut Entry, CatalogError> {
        self.entries
            .get_mut(name)
            .ok_or_else(|| CatalogError::EntryNotFound(name.to_string()))
    }

    /// Point `alias` at the entry `name`, merging when it already belongs elsewhere.
    ///
    /// Return
    /// ----------
    /// * The canonical name of the entry holding the alias afterwards.
    fn link_alias(&mut self, name: &str, alias: &str) -> Result<String, CatalogError> {
        match self.alias_index.get(alias).cloned() {
            None => {
                self.alias_index.insert(alias.to_string(), name.to_string());
                Ok(name.to_string())
            }
            Some(owner) if owner == name => Ok(owner),
            Some(owner) => self.merge(name, &owner),
        }
    }

    /// Merge two entries, returning the survivor's name.
    fn merge(&mut self, first: &str, second: &str) -> Result<String, CatalogError> {
        let key = |entry: &Entry| (entry.created(), entry.name().to_string());
        let lookup = |name: &str| {
            self.entries
                .get(name)
                .map(key)
                .ok_or_else(|| CatalogError::EntryNotFound(name.to_string()))
        };
        let first_key = lookup(first)?;
        let second_key = lookup(second)?;

        let (survivor, absorbed) = if first_key <= second_key {
            (first.to_string(), second.to_string())
        } else {
            (second.to_string(), first.to_string())
        };

        let loser = self
            .entries
            .remove(&absorbed)
            .ok_or_else(|| CatalogError::EntryNotFound(absorbed.clone()))?;

        debug!(survivor = %survivor, absorbed = %absorbed, "merging entries sharing an alias");

        for alias in loser.aliases() {
            self.alias_index.insert(alias.clone(), survivor.clone());
        }
        self.entry_by_canonical(&survivor)?.absorb(loser)?;

        self.dirty.remove(&absorbed);
        self.retired.insert(absorbed);
        self.dirty.insert(survivor.clone());
        Ok(survivor)
    }
}

/// Mutable handle on one entry of a [`Catalog`].
///
/// The handle follows its entry through merges: after an alias claim merged the
/// entry into an older one, [`EntryMut::name`] returns the survivor.
pub struct EntryMut<'a> {
    catalog: &'a mut Catalog,
    name: String,
}

impl EntryMut<'_> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn entry(&self) -> Option<&Entry> {
        self.catalog.entries.get(&self.name)
    }

    fn entry_mut(&mut self) -> Result<&mut Entry, CatalogError> {
        self.catalog.dirty.insert(self.name.clone());
        self.catalog.entry_by_canonical(&self.name)
    }

    /// Register `bibcode` as a source of this entry (idempotent per bibcode).
    pub fn add_source(&mut self, bibcode: &str) -> Result<SourceId, CatalogError> {
        self.entry_mut()?.add_source(bibcode)
    }

    /// Add a quantity claim.
    ///
    /// Alias claims are name-normalized and linked in the catalog alias index; if
    /// the alias already belongs to another entry, the two entries are merged.
    ///
    /// Return
    /// ----------
    /// * `true` if a new record was appended, `false` if the claim matched an existing
    ///   record or had an empty value.
    pub fn add_quantity(&mut self, mut quantity: Quantity) -> Result<bool, CatalogError> {
        if quantity.kind != QuantityKind::Alias {
            return self.entry_mut()?.insert_quantity(quantity);
        }

        let Ok(alias) = normalize_name(&quantity.value) else {
            return Ok(false);
        };
        quantity.value = alias.clone();

        let added = self.entry_mut()?.insert_quantity(quantity)?;
        self.name = self.catalog.link_alias(&self.name, &alias)?;
        Ok(added)
    }

    /// Add a photometric observation, built with [`Photometry::builder`].
    pub fn add_photometry(&mut self, photometry: Photometry) -> Result<bool, CatalogError> {
        self.entry_mut()?.insert_photometry(photometry)
    }
}
