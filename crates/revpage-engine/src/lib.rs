//! revpage Engine - history query orchestration
//!
//! Drives entity iteration, per-entity revision iteration, budget checks and
//! continuation emission on top of the building blocks in `revpage-core`.
//!
//! A host initializes logging once, then answers each request with
//! [`apply_history_query`], feeding the returned `continue` token back in to
//! fetch the next page:
//!
//! ```
//! use chrono::{TimeZone, Utc};
//! use revpage_core::logging_facility::{init, Profile};
//! use revpage_core::model::{Author, Entity, EntityId, Revision};
//! use revpage_core::{FieldProjector, MemoryRepo, QueryConfig};
//! use revpage_engine::{apply_history_query, HistoryQuery};
//!
//! init(Profile::Production);
//!
//! let mut repo = MemoryRepo::new();
//! repo.insert_entity(Entity::new("Cat.jpg", 1))?;
//! for secs in [30, 20] {
//!     let at = Utc.timestamp_opt(secs, 0).unwrap();
//!     repo.add_revision(&EntityId::from("Cat.jpg"), Revision::new(at, Author::new("Alice", 7)))?;
//! }
//!
//! let config = QueryConfig::default();
//! let projector = FieldProjector::with_defaults(&config.thumb_base_url);
//! let query = HistoryQuery::default();
//!
//! let first = apply_history_query(&repo, &repo, &projector, &config, &query)?;
//! assert_eq!(first.record_count(), 1);
//!
//! let token = first.continuation.expect("one revision left");
//! let mut next = query.clone().with_continuation(token);
//! next.context = query.context.for_next_page();
//! let second = apply_history_query(&repo, &repo, &projector, &config, &next)?;
//! assert_eq!(second.record_count(), 1);
//! assert!(!second.is_truncated());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod commands;

pub use commands::history_query::{apply_history_query, run_history_query, OP_HISTORY_QUERY};
pub use commands::read_tools::{HistoryPage, HistoryQuery};
