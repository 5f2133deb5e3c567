//! Request and result types for the history query.
//!
//! Plain data containers with no I/O. Validation against the configuration
//! happens in `history_query`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use revpage_core::model::{ContainerId, Namespace};
use revpage_core::props::PropSet;
use revpage_core::sink::EntityHistory;
use revpage_core_types::RequestContext;
use serde::Serialize;

// ---------------------------------------------------------------------------
// Query
// ---------------------------------------------------------------------------

/// Inbound parameters of one history query call.
#[derive(Debug, Clone)]
pub struct HistoryQuery {
    /// Namespace whose entities are in scope.
    pub namespace: Namespace,
    /// Requested properties; `None` uses the configured default set.
    pub props: Option<PropSet>,
    /// Per-entity revision limit; `None` uses the configured default.
    pub limit: Option<usize>,
    /// Newest timestamp admitted (inclusive).
    pub start: Option<DateTime<Utc>>,
    /// Oldest timestamp admitted (inclusive).
    pub end: Option<DateTime<Utc>>,
    /// Token returned by the previous call, echoed back verbatim.
    pub continuation: Option<String>,
    /// Thumbnail bounding box.
    pub url_width: Option<u32>,
    pub url_height: Option<u32>,
    pub context: RequestContext,
}

impl HistoryQuery {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            props: None,
            limit: None,
            start: None,
            end: None,
            continuation: None,
            url_width: None,
            url_height: None,
            context: RequestContext::new(),
        }
    }

    pub fn with_props(mut self, props: PropSet) -> Self {
        self.props = Some(props);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_window(mut self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn with_continuation(mut self, token: impl Into<String>) -> Self {
        self.continuation = Some(token.into());
        self
    }

    pub fn with_thumb(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.url_width = width;
        self.url_height = height;
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = context;
        self
    }
}

impl Default for HistoryQuery {
    fn default() -> Self {
        Self::new(Namespace::FILE)
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// One page of history, keyed by container id.
#[derive(Debug, Clone, Default, Serialize)]
pub struct HistoryPage {
    pub entities: BTreeMap<ContainerId, EntityHistory>,
    /// Opaque token for the next call; absent on the last page.
    #[serde(rename = "continue", skip_serializing_if = "Option::is_none")]
    pub continuation: Option<String>,
}

impl HistoryPage {
    pub fn is_truncated(&self) -> bool {
        self.continuation.is_some()
    }

    /// Revision records across all entities
    pub fn record_count(&self) -> usize {
        self.entities.values().map(|e| e.revisions.len()).sum()
    }

    pub fn entity(&self, container: ContainerId) -> Option<&EntityHistory> {
        self.entities.get(&container)
    }
}
