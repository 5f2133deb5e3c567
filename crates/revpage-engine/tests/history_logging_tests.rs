#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{config_with_records, repo};
use revpage_core::logging_facility::test_capture::{init_test_capture, CapturedEvent, TestCapture};
use revpage_core::projection::FieldProjector;
use revpage_core_types::schema::{
    EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE, FIELD_RECORDS, FIELD_REQUEST_ID,
    FIELD_TRUNCATED,
};
use revpage_core_types::{RequestContext, RequestId};
use revpage_engine::{apply_history_query, HistoryQuery, OP_HISTORY_QUERY};

/// Events of one query, told apart by request id
fn events_for_request(capture: &TestCapture, event: &str, request_id: &str) -> Vec<CapturedEvent> {
    capture
        .events_for(OP_HISTORY_QUERY, event)
        .into_iter()
        .filter(|e| e.field(FIELD_REQUEST_ID) == Some(request_id))
        .collect()
}

fn context(id: &str) -> RequestContext {
    RequestContext::with_request_id(RequestId::from_string(id.to_string()))
}

#[test]
fn test_query_logs_start_and_end_with_outcome() {
    let capture = init_test_capture();
    let repo = repo(&[("A", &[30, 20, 10])]);
    let projector = FieldProjector::with_defaults("/images");

    let query = HistoryQuery::default()
        .with_limit(5)
        .with_context(context("log-req-truncated"));
    let page =
        apply_history_query(&repo, &repo, &projector, &config_with_records(2), &query).unwrap();
    assert!(page.is_truncated());

    assert_eq!(events_for_request(&capture, EVENT_START, "log-req-truncated").len(), 1);

    let ends = events_for_request(&capture, EVENT_END, "log-req-truncated");
    assert_eq!(ends.len(), 1);
    let end = &ends[0];
    assert_eq!(end.field(FIELD_RECORDS), Some("2"));
    assert_eq!(end.field(FIELD_TRUNCATED), Some("true"));
    assert!(end.field("duration_ms").is_some());
}

#[test]
fn test_query_error_logs_code() {
    let capture = init_test_capture();
    let repo = repo(&[("A", &[30]), ("B", &[20])]);
    let projector = FieldProjector::with_defaults("/images");

    let query = HistoryQuery::default()
        .with_continuation("@@@")
        .with_context(context("log-req-error"));
    let err = apply_history_query(
        &repo,
        &repo,
        &projector,
        &config_with_records(10),
        &query,
    )
    .unwrap_err();
    assert_eq!(err.code(), "ERR_INVALID_CONTINUATION");

    let errors = events_for_request(&capture, EVENT_END_ERROR, "log-req-error");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field(FIELD_ERR_CODE), Some("ERR_INVALID_CONTINUATION"));
    assert!(events_for_request(&capture, EVENT_END, "log-req-error").is_empty());
}
