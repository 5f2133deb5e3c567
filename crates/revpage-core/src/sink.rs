//! Size-bounded accumulation of the response body
//!
//! A sink admits items until the budget is exhausted. The first item that
//! does not fit is discarded and every later commit reports overflow, so a
//! response never has gaps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::model::ContainerId;
use crate::projection::RevisionRecord;

/// Ceiling for one whole response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultBudget {
    /// Serialized JSON bytes across all committed items
    pub max_bytes: Option<usize>,
    /// Revision records across all entities
    pub max_records: Option<usize>,
}

impl ResultBudget {
    pub fn unlimited() -> Self {
        Self::default()
    }

    pub fn records(max: usize) -> Self {
        Self {
            max_bytes: None,
            max_records: Some(max),
        }
    }

    pub fn bytes(max: usize) -> Self {
        Self {
            max_bytes: Some(max),
            max_records: None,
        }
    }
}

/// Outcome of a commit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub enum Fit {
    Fits,
    Overflow,
}

impl Fit {
    pub fn fits(self) -> bool {
        self == Fit::Fits
    }
}

/// Per-entity section of the response
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct EntityHistory {
    pub title: String,
    /// Repository name; empty when the entity has no stored content
    pub repository: String,
    pub revisions: Vec<RevisionRecord>,
    /// Set when the entity is in scope but contributed no revisions
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub empty: bool,
}

/// Destination for projected output
pub trait ResultSink {
    /// Commit the per-entity header (title and repository).
    fn try_commit_header(&mut self, container: ContainerId, title: &str, repository: &str) -> Fit;

    /// Commit one revision record under an entity.
    fn try_commit_revision(&mut self, container: ContainerId, record: RevisionRecord) -> Fit;

    /// Set the empty marker on an entity, creating its section if needed.
    ///
    /// Costs nothing against the budget: fails only if the sink has already
    /// overflowed.
    fn mark_empty(&mut self, container: ContainerId, title: &str) -> Fit;

    /// Revision records committed so far under `container`
    fn revision_count(&self, container: ContainerId) -> usize;

    fn is_overflowed(&self) -> bool;
}

/// [`ResultSink`] enforcing a [`ResultBudget`]
#[derive(Debug, Clone, Default)]
pub struct BoundedSink {
    budget: ResultBudget,
    used_bytes: usize,
    used_records: usize,
    overflowed: bool,
    entities: BTreeMap<ContainerId, EntityHistory>,
}

#[derive(Serialize)]
struct Header<'a> {
    title: &'a str,
    repository: &'a str,
}

fn json_len<T: Serialize>(value: &T) -> usize {
    // An unserializable item can never fit
    serde_json::to_vec(value).map_or(usize::MAX, |v| v.len())
}

impl BoundedSink {
    pub fn new(budget: ResultBudget) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    pub fn used_bytes(&self) -> usize {
        self.used_bytes
    }

    pub fn used_records(&self) -> usize {
        self.used_records
    }

    pub fn entities(&self) -> &BTreeMap<ContainerId, EntityHistory> {
        &self.entities
    }

    pub fn into_entities(self) -> BTreeMap<ContainerId, EntityHistory> {
        self.entities
    }

    /// Charge `bytes` (and `records`) against the budget, latching overflow.
    fn reserve(&mut self, bytes: usize, records: usize) -> Fit {
        if self.overflowed {
            return Fit::Overflow;
        }
        let bytes_after = self.used_bytes.saturating_add(bytes);
        let records_after = self.used_records + records;
        let over_bytes = self.budget.max_bytes.is_some_and(|max| bytes_after > max);
        let over_records = self.budget.max_records.is_some_and(|max| records_after > max);
        if over_bytes || over_records {
            self.overflowed = true;
            return Fit::Overflow;
        }
        self.used_bytes = bytes_after;
        self.used_records = records_after;
        Fit::Fits
    }
}

impl ResultSink for BoundedSink {
    fn try_commit_header(&mut self, container: ContainerId, title: &str, repository: &str) -> Fit {
        let fit = self.reserve(json_len(&Header { title, repository }), 0);
        if fit.fits() {
            let entry = self.entities.entry(container).or_default();
            entry.title = title.to_string();
            entry.repository = repository.to_string();
        }
        fit
    }

    fn try_commit_revision(&mut self, container: ContainerId, record: RevisionRecord) -> Fit {
        let fit = self.reserve(json_len(&record), 1);
        if fit.fits() {
            self.entities
                .entry(container)
                .or_default()
                .revisions
                .push(record);
        }
        fit
    }

    fn mark_empty(&mut self, container: ContainerId, title: &str) -> Fit {
        if self.overflowed {
            return Fit::Overflow;
        }
        let entry = self.entities.entry(container).or_default();
        if entry.title.is_empty() {
            entry.title = title.to_string();
        }
        entry.empty = true;
        Fit::Fits
    }

    fn revision_count(&self, container: ContainerId) -> usize {
        self.entities
            .get(&container)
            .map_or(0, |e| e.revisions.len())
    }

    fn is_overflowed(&self) -> bool {
        self.overflowed
    }
}
