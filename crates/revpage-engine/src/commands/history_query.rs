//! Bounded, continuable revision-history query.
//!
//! `run_history_query` is the pagination state machine. It scans entities in
//! ascending id order and each entity's revisions newest first, commits
//! projected records into a [`ResultSink`], and stops at the first record
//! that cannot be returned, handing back a cursor that points at it.
//!
//! `apply_history_query` is the standalone entry point: it owns a
//! [`BoundedSink`] sized from the configuration and brackets the run with op
//! logging.

use std::time::Instant;

use chrono::{DateTime, Utc};
use revpage_core::config::QueryConfig;
use revpage_core::continuation::{ContinuationCursor, CursorForm};
use revpage_core::errors::{ExError, ExErrorKind, HistoryError};
use revpage_core::model::{Entity, QueryWindow, Revision};
use revpage_core::projection::{FieldProjector, Scale};
use revpage_core::props::PropSet;
use revpage_core::sink::{BoundedSink, ResultSink};
use revpage_core::source::{EntityKeySource, RevisionHistory};
use revpage_core::{log_op_end, log_op_error, log_op_start};
use revpage_core_types::RequestContext;
use tracing::{debug, warn};

use crate::commands::read_tools::{HistoryPage, HistoryQuery};

pub type Result<T> = std::result::Result<T, ExError>;

pub const OP_HISTORY_QUERY: &str = "history_query";

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Query parameters checked against the configuration
#[derive(Debug, Clone, Copy)]
struct Params {
    props: PropSet,
    limit: usize,
    window: QueryWindow,
    scale: Option<Scale>,
}

fn resolve_params(config: &QueryConfig, query: &HistoryQuery) -> Result<Params> {
    let scale = Scale::from_params(query.url_width, query.url_height)?;
    let window = QueryWindow::new(query.start, query.end)?;

    let requested = query.limit.unwrap_or(config.default_limit);
    let limit = requested.clamp(1, config.max_limit.max(1));
    if limit != requested {
        warn!(
            requested,
            limit,
            max_limit = config.max_limit,
            "Revision limit out of range, clamped"
        );
    }

    let props = match query.props {
        Some(props) => props,
        None => config.default_props()?,
    };

    Ok(Params {
        props,
        limit,
        window,
        scale,
    })
}

/// Entities still to scan, and where the first of them resumes
struct Scope {
    entities: Vec<Entity>,
    form: CursorForm,
    resume_at: Option<DateTime<Utc>>,
}

fn resolve_scope(
    source: &dyn EntityKeySource,
    config: &QueryConfig,
    query: &HistoryQuery,
) -> Result<Scope> {
    let mut entities = source.list_entities(query.namespace).map_err(|e| {
        ExError::new(ExErrorKind::UpstreamFetch)
            .with_op("list_entities")
            .with_message(e.to_string())
    })?;
    entities.sort_by(|a, b| a.id.cmp(&b.id));
    entities.dedup_by(|a, b| a.id == b.id);

    // Decided on the full scope so every page of one query agrees
    let form = config.cursor_mode.form_for(entities.len());

    let Some(token) = query.continuation.as_deref() else {
        return Ok(Scope {
            entities,
            form,
            resume_at: None,
        });
    };

    let cursor = ContinuationCursor::decode(token, form)?;
    let resume_at = match cursor.entity() {
        None => Some(cursor.timestamp()),
        Some(id) => {
            entities.retain(|e| &e.id >= id);
            // The cursor's entity may have left scope since the last call
            entities
                .first()
                .filter(|e| &e.id == id)
                .map(|_| cursor.timestamp())
        }
    };

    Ok(Scope {
        entities,
        form,
        resume_at,
    })
}

fn fetch_failed(entity: &Entity, err: HistoryError) -> ExError {
    match err {
        HistoryError::Fetch { .. } => err.into(),
        other => HistoryError::Fetch {
            entity_id: entity.id.to_string(),
            message: other.to_string(),
        }
        .into(),
    }
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

struct Scan<'a> {
    sink: &'a mut dyn ResultSink,
    history: &'a dyn RevisionHistory,
    projector: &'a FieldProjector,
    params: Params,
    form: CursorForm,
}

impl Scan<'_> {
    /// Scan one entity. A returned cursor means the whole scan halts.
    fn entity(
        &mut self,
        entity: &Entity,
        window: &QueryWindow,
    ) -> Result<Option<ContinuationCursor>> {
        let mut header_committed = false;
        let mut emitted = 0usize;

        let current = self
            .history
            .current_revision(entity)
            .map_err(|e| fetch_failed(entity, e))?;
        if let Some(current) = current.filter(|r| window.contains(r.timestamp)) {
            if let Some(cursor) = self.commit(entity, &current, &mut header_committed) {
                return Ok(Some(cursor));
            }
            emitted += 1;
        }

        // One past the remaining allowance, to see whether more exist
        let fetch = self.params.limit - emitted + 1;
        let older = self
            .history
            .history(entity, fetch, window)
            .map_err(|e| fetch_failed(entity, e))?;

        for revision in &older {
            if emitted >= self.params.limit {
                debug!(
                    entity_id = %entity.id,
                    limit = self.params.limit,
                    resume_at = %revision.timestamp,
                    "Per-entity limit reached"
                );
                return Ok(Some(self.cursor_at(entity, revision)));
            }
            if let Some(cursor) = self.commit(entity, revision, &mut header_committed) {
                return Ok(Some(cursor));
            }
            emitted += 1;
        }

        Ok(None)
    }

    /// Commit one revision, preceded by the entity header if not yet sent.
    fn commit(
        &mut self,
        entity: &Entity,
        revision: &Revision,
        header_committed: &mut bool,
    ) -> Option<ContinuationCursor> {
        let container = entity.container_id;

        if !*header_committed {
            let repository = entity.repository.as_deref().unwrap_or_default();
            if !self
                .sink
                .try_commit_header(container, entity.id.as_str(), repository)
                .fits()
            {
                debug!(entity_id = %entity.id, "Entity header does not fit");
                return Some(self.cursor_at(entity, revision));
            }
            *header_committed = true;
        }

        let record = self
            .projector
            .project(entity, revision, self.params.props, self.params.scale);
        if self.sink.try_commit_revision(container, record).fits() {
            return None;
        }

        debug!(
            entity_id = %entity.id,
            resume_at = %revision.timestamp,
            "Result budget exhausted"
        );
        Some(self.cursor_at(entity, revision))
    }

    fn cursor_at(&self, entity: &Entity, revision: &Revision) -> ContinuationCursor {
        ContinuationCursor::at(self.form, &entity.id, revision.timestamp)
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Run one history query into a caller-owned sink.
///
/// Used when several sub-queries share one response and one budget. Returns
/// the cursor to resume from, or `None` when every in-scope revision was
/// returned.
///
/// A cursor can come back with nothing committed when the sink is already
/// full, or when one header plus record is larger than the whole budget.
/// Callers owning the sink decide whether that is progress; see
/// [`apply_history_query`].
///
/// # Errors
///
/// Client input errors (`ERR_URLHEIGHT_WITHOUT_URLWIDTH`,
/// `ERR_INVALID_WINDOW`, `ERR_UNKNOWN_PROPERTY`, `ERR_INVALID_CONTINUATION`)
/// are raised before any history is fetched. A collaborator failure is
/// `ERR_UPSTREAM_FETCH`; records already committed stay in the sink, but no
/// cursor is produced.
pub fn run_history_query(
    sink: &mut dyn ResultSink,
    source: &dyn EntityKeySource,
    history: &dyn RevisionHistory,
    projector: &FieldProjector,
    config: &QueryConfig,
    query: &HistoryQuery,
) -> Result<Option<ContinuationCursor>> {
    let params = resolve_params(config, query)?;
    let scope = resolve_scope(source, config, query)?;
    debug!(
        entity_count = scope.entities.len(),
        limit = params.limit,
        resumed = scope.resume_at.is_some(),
        "History scan starting"
    );

    let mut scan = Scan {
        sink: &mut *sink,
        history,
        projector,
        params,
        form: scope.form,
    };

    for (index, entity) in scope.entities.iter().enumerate() {
        if !entity.has_history() {
            debug!(entity_id = %entity.id, redirect = entity.redirect, "Entity has no history");
            continue;
        }

        let window = match scope.resume_at {
            Some(ts) if index == 0 => {
                let start = params.window.start.map_or(ts, |s| s.min(ts));
                params.window.with_start(start)
            }
            _ => params.window,
        };

        if let Some(cursor) = scan.entity(entity, &window)? {
            return Ok(Some(cursor));
        }
    }

    // Only a complete scan may claim an entity has nothing to show
    for entity in &scope.entities {
        let container = entity.container_id;
        if sink.revision_count(container) == 0
            && !sink.mark_empty(container, entity.id.as_str()).fits()
        {
            break;
        }
    }

    Ok(None)
}

/// Run one history query into a fresh budgeted response.
///
/// # Errors
///
/// As [`run_history_query`]; the error carries the request id of
/// `query.context`. A page that would hold no record but still point at a
/// cursor is `ERR_BUDGET_TOO_SMALL`: the budget cannot fit the next record,
/// so resuming from that cursor would return the same page forever.
pub fn apply_history_query(
    source: &dyn EntityKeySource,
    history: &dyn RevisionHistory,
    projector: &FieldProjector,
    config: &QueryConfig,
    query: &HistoryQuery,
) -> Result<HistoryPage> {
    let request_id = query.context.request_id.as_str();
    log_op_start!(OP_HISTORY_QUERY, request_id = request_id);
    let start = Instant::now();

    let mut sink = BoundedSink::new(config.budget);
    let result = run_history_query(&mut sink, source, history, projector, config, query)
        .and_then(|cursor| match cursor {
            Some(cursor) if sink.used_records() == 0 => Err(stalled(&cursor)),
            cursor => Ok(cursor),
        });

    let elapsed = start.elapsed().as_millis() as u64;
    match result {
        Ok(cursor) => {
            let page = HistoryPage {
                entities: sink.into_entities(),
                continuation: cursor.map(|c| c.encode()),
            };
            log_op_end!(
                OP_HISTORY_QUERY,
                duration_ms = elapsed,
                request_id = request_id,
                records = page.record_count(),
                truncated = page.is_truncated()
            );
            Ok(page)
        }
        Err(e) => {
            let e = with_context(e, &query.context);
            log_op_error!(
                OP_HISTORY_QUERY,
                e.clone(),
                duration_ms = elapsed,
                request_id = request_id
            );
            Err(e)
        }
    }
}

fn stalled(cursor: &ContinuationCursor) -> ExError {
    let err: ExError = HistoryError::BudgetTooSmall {
        position: cursor.to_string(),
    }
    .into();
    match cursor.entity() {
        Some(entity) => err.with_entity_id(entity.as_str()),
        None => err,
    }
}

fn with_context(err: ExError, context: &RequestContext) -> ExError {
    let err = if err.op().is_none() {
        err.with_op(OP_HISTORY_QUERY)
    } else {
        err
    };
    let err = err.with_request_id(context.request_id.clone());
    match &context.trace_id {
        Some(trace_id) => err.with_trace_id(trace_id.clone()),
        None => err,
    }
}
