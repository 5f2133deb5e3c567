//! Canonical schema constants for structured logging
//!
//! These constants keep log field names consistent between the logging
//! macros, the orchestrator and test assertions.

// Canonical field keys
pub const FIELD_COMPONENT: &str = "component";
pub const FIELD_OP: &str = "op";
pub const FIELD_EVENT: &str = "event";
pub const FIELD_DURATION_MS: &str = "duration_ms";
pub const FIELD_REQUEST_ID: &str = "request_id";
pub const FIELD_TRACE_ID: &str = "trace_id";

// Query scope
pub const FIELD_ENTITY_ID: &str = "entity_id";
pub const FIELD_ENTITY_COUNT: &str = "entity_count";
pub const FIELD_LIMIT: &str = "limit";

// Query outcome
pub const FIELD_RECORDS: &str = "records";
pub const FIELD_TRUNCATED: &str = "truncated";

// Error fields
pub const FIELD_ERR_KIND: &str = "err_kind";
pub const FIELD_ERR_CODE: &str = "err_code";

// Canonical event names
pub const EVENT_START: &str = "start";
pub const EVENT_END: &str = "end";
pub const EVENT_END_ERROR: &str = "end_error";
