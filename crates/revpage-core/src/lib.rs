//! revpage Core - building blocks of the revision-history query engine
//!
//! This crate provides:
//! - Entity and revision models with per-revision redaction flags
//! - The closed property set and the redaction-aware field projector
//! - The size-bounded result sink
//! - The continuation cursor codec
//! - Collaborator traits for entity listing and history fetching, plus an
//!   in-memory repository
//! - Query configuration, the error facility and the logging facility

pub mod config;
pub mod continuation;
pub mod errors;
pub mod logging_facility;
pub mod model;
pub mod projection;
pub mod props;
pub mod sink;
pub mod source;

// Logging macros reach the schema constants through this path
pub use revpage_core_types as core_types;

// Re-export commonly used types
pub use config::QueryConfig;
pub use continuation::{ContinuationCursor, CursorForm, CursorMode};
pub use errors::{ExError, ExErrorKind, HistoryError, Result};
pub use model::{ContainerId, Entity, EntityId, Namespace, QueryWindow, Revision};
pub use projection::{FieldProjector, RevisionRecord};
pub use props::{Prop, PropSet};
pub use sink::{BoundedSink, EntityHistory, Fit, ResultBudget, ResultSink};
pub use source::{EntityKeySource, MemoryRepo, RevisionHistory};
