//! # Quantity ledger
//!
//! Multi-valued, provenance-tagged scientific attributes of an entry (redshift,
//! coordinates, claimed type, aliases, discovery date).
//!
//! Conflicting literature values are **never** resolved here: a claim whose
//! `(kind, value, measurement_kind)` matches an existing record only adds its
//! sources to that record, any other value is kept side by side as a distinct claim.
use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use serde::Serialize;

use crate::{catalog::sources::SourceId, constants::TEXT_TRIM_CHARS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantityKind {
    Alias,
    ClaimedType,
    Redshift,
    Ra,
    Dec,
    DiscoverDate,
}

impl QuantityKind {
    /// Free-text kinds are normalized before deduplication.
    pub fn is_textual(&self) -> bool {
        matches!(self, QuantityKind::Alias | QuantityKind::ClaimedType)
    }
}

/// Provenance type of a numeric claim, e.g. spectroscopic vs photometric redshift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MeasurementKind {
    Spectroscopic,
    Photometric,
    Host,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Quantity {
    pub kind: QuantityKind,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_upper: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub e_lower: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub measurement_kind: Option<MeasurementKind>,
    pub source_ids: BTreeSet<SourceId>,
}

/// Normalize a raw quantity value for storage and comparison.
///
/// Every value is whitespace-trimmed; textual kinds also lose the punctuation
/// in [`TEXT_TRIM_CHARS`] at both ends (`"Ia:"` → `"Ia"`, `"IIn*"` → `"IIn"`).
pub fn normalize_value(kind: QuantityKind, raw: &str) -> String {
    if kind.is_textual() {
        raw.trim_matches(|c: char| c.is_whitespace() || TEXT_TRIM_CHARS.contains(&c))
            .to_string()
    } else {
        raw.trim().to_string()
    }
}

impl Quantity {
    /// Start building a quantity claim attributed to `source_ids`.
    pub fn builder(
        kind: QuantityKind,
        value: impl AsRef<str>,
        source_ids: impl IntoIterator<Item = SourceId>,
    ) -> QuantityBuilder {
        QuantityBuilder {
            quantity: Quantity {
                kind,
                value: normalize_value(kind, value.as_ref()),
                error: None,
                e_upper: None,
                e_lower: None,
                measurement_kind: None,
                source_ids: source_ids.into_iter().collect(),
            },
        }
    }

    /// Two records are the same claim when kind, value and measurement kind agree.
    pub fn same_claim(&self, other: &Quantity) -> bool {
        self.kind == other.kind
            && self.value == other.value
            && self.measurement_kind == other.measurement_kind
    }
}

#[derive(Debug, Clone)]
pub struct QuantityBuilder {
    quantity: Quantity,
}

impl QuantityBuilder {
    pub fn error(mut self, error: impl Into<Option<Decimal>>) -> Self {
        self.quantity.error = error.into();
        self
    }

    pub fn e_upper(mut self, e_upper: impl Into<Option<Decimal>>) -> Self {
        self.quantity.e_upper = e_upper.into();
        self
    }

    pub fn e_lower(mut self, e_lower: impl Into<Option<Decimal>>) -> Self {
        self.quantity.e_lower = e_lower.into();
        self
    }

    pub fn measurement_kind(mut self, kind: impl Into<Option<MeasurementKind>>) -> Self {
        self.quantity.measurement_kind = kind.into();
        self
    }

    pub fn build(self) -> Quantity {
        self.quantity
    }
}

/// Quantity records of one entry, grouped by kind in insertion order.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct QuantityLedger {
    records: BTreeMap<QuantityKind, Vec<Quantity>>,
}

impl QuantityLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a claim.
    ///
    /// Return
    /// ----------
    /// * `true` if the claim was appended as a new record, `false` if it matched an
    ///   existing record (whose sources were extended) or if its value is empty.
    pub fn insert(&mut self, quantity: Quantity) -> bool {
        if quantity.value.is_empty() {
            return false;
        }

        let records = self.records.entry(quantity.kind).or_default();
        match records.iter_mut().find(|q| q.same_claim(&quantity)) {
            Some(existing) => {
                existing.source_ids.extend(quantity.source_ids);
                false
            }
            None => {
                records.push(quantity);
                true
            }
        }
    }

    pub fn get(&self, kind: QuantityKind) -> &[Quantity] {
        self.records.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Quantity> {
        self.records.values().flatten()
    }

    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
