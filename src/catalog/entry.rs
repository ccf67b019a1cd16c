use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use crate::{
    catalog::{
        photometry::{Photometry, PhotometryLedger},
        quantity::{Quantity, QuantityKind, QuantityLedger},
        sources::{SourceId, SourceRegistry},
    },
    catalog_errors::CatalogError,
};

/// One astronomical object of the catalog.
///
/// # Fields
///
/// * `name` - The canonical name, unique across the catalog
/// * `aliases` - Every known name of the object, always including `name`
/// * `sources` - The bibliographic sources cited by this entry
/// * `quantities` - Scientific attributes, all asserted values kept
/// * `photometry` - Normalized photometric observations
/// * `created` - Creation order in the catalog, used to pick the survivor of a merge
#[derive(Debug, Clone, Serialize)]
pub struct Entry {
    name: String,
    #[serde(rename = "alias")]
    aliases: BTreeSet<String>,
    sources: SourceRegistry,
    quantities: QuantityLedger,
    photometry: PhotometryLedger,
    #[serde(skip)]
    created: u64,
}

impl Entry {
    pub(crate) fn new(name: String, created: u64) -> Self {
        let aliases = BTreeSet::from([name.clone()]);
        Entry {
            name,
            aliases,
            sources: SourceRegistry::new(),
            quantities: QuantityLedger::new(),
            photometry: PhotometryLedger::new(),
            created,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &BTreeSet<String> {
        &self.aliases
    }

    pub fn sources(&self) -> &SourceRegistry {
        &self.sources
    }

    pub fn quantities(&self, kind: QuantityKind) -> &[Quantity] {
        self.quantities.get(kind)
    }

    pub fn photometry(&self) -> &[Photometry] {
        self.photometry.as_slice()
    }

    pub fn created(&self) -> u64 {
        self.created
    }

    pub(crate) fn add_source(&mut self, bibcode: &str) -> Result<SourceId, CatalogError> {
        self.sources.add_source(bibcode)
    }

    /// Every record must cite at least one source already registered on this entry.
    fn check_sources(&self, source_ids: &BTreeSet<SourceId>) -> Result<(), CatalogError> {
        if source_ids.is_empty() {
            return Err(CatalogError::MissingSource(self.name.clone()));
        }
        match source_ids.iter().find(|id| !self.sources.contains(**id)) {
            Some(id) => Err(CatalogError::UnknownSource {
                entry: self.name.clone(),
                id: *id,
            }),
            None => Ok(()),
        }
    }

    pub(crate) fn insert_quantity(&mut self, quantity: Quantity) -> Result<bool, CatalogError> {
        self.check_sources(&quantity.source_ids)?;
        if quantity.kind == QuantityKind::Alias && !quantity.value.is_empty() {
            self.aliases.insert(quantity.value.clone());
        }
        Ok(self.quantities.insert(quantity))
    }

    pub(crate) fn insert_photometry(
        &mut self,
        photometry: Photometry,
    ) -> Result<bool, CatalogError> {
        self.check_sources(&photometry.source_ids)?;
        Ok(self.photometry.insert(photometry))
    }

    /// Merge `other` into `self`, keeping every alias, source, quantity and observation.
    ///
    /// Source ids of `other` are re-keyed into this entry's registry before its
    /// records are inserted, so the deduplication rules apply across both entries.
    pub(crate) fn absorb(&mut self, other: Entry) -> Result<(), CatalogError> {
        let mapping = self.sources.absorb(&other.sources)?;
        let rekey = |ids: BTreeSet<SourceId>, mapping: &HashMap<SourceId, SourceId>| {
            ids.into_iter()
                .filter_map(|id| mapping.get(&id).copied())
                .collect::<BTreeSet<_>>()
        };

        self.aliases.extend(other.aliases);

        for mut quantity in other.quantities.iter().cloned() {
            quantity.source_ids = rekey(quantity.source_ids, &mapping);
            self.insert_quantity(quantity)?;
        }

        for mut photometry in other.photometry.iter().cloned() {
            photometry.source_ids = rekey(photometry.source_ids, &mapping);
            self.insert_photometry(photometry)?;
        }

        Ok(())
    }
}
