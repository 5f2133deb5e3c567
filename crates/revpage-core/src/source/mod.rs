//! Collaborators the query engine reads from
//!
//! Both traits are synchronous and read-only. Implementations report their
//! own failures as [`HistoryError::Fetch`](crate::errors::HistoryError::Fetch).

pub mod memory;

use crate::errors::Result;
use crate::model::{Entity, Namespace, QueryWindow, Revision};

pub use memory::MemoryRepo;

/// Supplies the entities of a namespace
pub trait EntityKeySource {
    /// All entities in `namespace`.
    ///
    /// The full scope is returned even when resuming: the number of entities
    /// in scope decides the cursor form, so the suffix is cut by the caller.
    fn list_entities(&self, namespace: Namespace) -> Result<Vec<Entity>>;
}

/// Per-entity revision history
pub trait RevisionHistory {
    /// The newest revision, if the entity has any
    fn current_revision(&self, entity: &Entity) -> Result<Option<Revision>>;

    /// Up to `limit` historical (non-current) revisions inside `window`,
    /// newest first.
    ///
    /// Window bounds are compared at full timestamp precision; a continuation
    /// cursor carries the exact timestamp of the revision it points at.
    fn history(&self, entity: &Entity, limit: usize, window: &QueryWindow)
        -> Result<Vec<Revision>>;
}
