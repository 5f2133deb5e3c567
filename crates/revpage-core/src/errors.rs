use revpage_core_types::{RequestId, TraceId};
use thiserror::Error;

/// Result type alias using HistoryError
pub type Result<T> = std::result::Result<T, HistoryError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Each kind maps to a stable error code usable by callers for programmatic
/// handling and by transports for their own error envelopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Client input
    InvalidInput,
    InvalidContinuation,
    UrlHeightWithoutWidth,
    InvalidWindow,
    UnknownProperty,

    // Repository
    AlreadyExists,
    NotFound,

    // Upstream
    UpstreamFetch,

    // Budget
    BudgetTooSmall,

    // Integration/IO
    Config,
    Serialization,
    Io,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            ExErrorKind::InvalidContinuation => "ERR_INVALID_CONTINUATION",
            ExErrorKind::UrlHeightWithoutWidth => "ERR_URLHEIGHT_WITHOUT_URLWIDTH",
            ExErrorKind::InvalidWindow => "ERR_INVALID_WINDOW",
            ExErrorKind::UnknownProperty => "ERR_UNKNOWN_PROPERTY",
            ExErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::UpstreamFetch => "ERR_UPSTREAM_FETCH",
            ExErrorKind::BudgetTooSmall => "ERR_BUDGET_TOO_SMALL",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Serialization => "ERR_SERIALIZATION",
            ExErrorKind::Io => "ERR_IO",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }

    /// Whether the caller caused this error by sending a bad request.
    ///
    /// Client errors are always raised before any entity is scanned.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ExErrorKind::InvalidInput
                | ExErrorKind::InvalidContinuation
                | ExErrorKind::UrlHeightWithoutWidth
                | ExErrorKind::InvalidWindow
                | ExErrorKind::UnknownProperty
        )
    }
}

/// Canonical structured error type
///
/// Classification fields for programmatic handling plus context for
/// debugging. This is what the engine returns to its callers.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    request_id: Option<RequestId>,
    trace_id: Option<TraceId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            request_id: None,
            trace_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity ID context
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add trace ID context
    pub fn with_trace_id(mut self, trace_id: TraceId) -> Self {
        self.trace_id = Some(trace_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    /// Get the stable error code
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn trace_id(&self) -> Option<&TraceId> {
        self.trace_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity_id: {})", entity_id)?;
        }
        if let Some(request_id) = &self.request_id {
            write!(f, " (request_id: {})", request_id)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for history query components
#[derive(Error, Debug, Clone, PartialEq)]
pub enum HistoryError {
    // ===== Client input =====
    /// Continuation token could not be decoded or has the wrong arity
    #[error("Invalid continue param: {reason}. Pass the value returned by the previous query")]
    InvalidContinuation { reason: String },

    /// Thumbnail height was requested without a width
    #[error("urlheight cannot be used without urlwidth")]
    UrlHeightWithoutWidth,

    /// Window start lies before window end
    #[error("Invalid window: start {start} is earlier than end {end}")]
    InvalidWindow { start: String, end: String },

    /// Requested property name is not part of the property set
    #[error("Unknown property: {name}")]
    UnknownProperty { name: String },

    /// Generic malformed request value
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    // ===== Repository =====
    /// Entity identifier already registered
    #[error("Entity already exists: {entity_id}")]
    DuplicateEntity { entity_id: String },

    /// Two revisions of one entity share a timestamp
    #[error("Entity {entity_id} already has a revision at {timestamp}")]
    DuplicateRevision {
        entity_id: String,
        timestamp: String,
    },

    /// Entity not known to the repository
    #[error("Entity not found: {entity_id}")]
    EntityNotFound { entity_id: String },

    // ===== Upstream =====
    /// The revision history fetcher or key source failed
    #[error("Fetch failed for {entity_id}: {message}")]
    Fetch { entity_id: String, message: String },

    // ===== Budget =====
    /// A fresh response cannot hold even one record, so no call makes progress
    #[error("Result budget too small to return the record at {position}")]
    BudgetTooSmall { position: String },

    // ===== Integration =====
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl From<HistoryError> for ExError {
    fn from(err: HistoryError) -> Self {
        let message = err.to_string();
        match err {
            HistoryError::InvalidContinuation { .. } => {
                ExError::new(ExErrorKind::InvalidContinuation).with_message(message)
            }
            HistoryError::UrlHeightWithoutWidth => {
                ExError::new(ExErrorKind::UrlHeightWithoutWidth).with_message(message)
            }
            HistoryError::InvalidWindow { .. } => {
                ExError::new(ExErrorKind::InvalidWindow).with_message(message)
            }
            HistoryError::UnknownProperty { .. } => {
                ExError::new(ExErrorKind::UnknownProperty).with_message(message)
            }
            HistoryError::InvalidInput { .. } => {
                ExError::new(ExErrorKind::InvalidInput).with_message(message)
            }
            HistoryError::DuplicateEntity { entity_id }
            | HistoryError::DuplicateRevision { entity_id, .. } => {
                ExError::new(ExErrorKind::AlreadyExists)
                    .with_entity_id(entity_id)
                    .with_message(message)
            }
            HistoryError::EntityNotFound { entity_id } => ExError::new(ExErrorKind::NotFound)
                .with_entity_id(entity_id)
                .with_message(message),
            HistoryError::Fetch { entity_id, .. } => ExError::new(ExErrorKind::UpstreamFetch)
                .with_op("history_fetch")
                .with_entity_id(entity_id)
                .with_message(message),
            HistoryError::BudgetTooSmall { .. } => {
                ExError::new(ExErrorKind::BudgetTooSmall).with_message(message)
            }
            HistoryError::Config { .. } => ExError::new(ExErrorKind::Config)
                .with_op("config_load")
                .with_message(message),
            HistoryError::Serialization { .. } => {
                ExError::new(ExErrorKind::Serialization).with_message(message)
            }
            HistoryError::Io { .. } => ExError::new(ExErrorKind::Io).with_message(message),
        }
    }
}

impl From<serde_json::Error> for HistoryError {
    fn from(err: serde_json::Error) -> Self {
        HistoryError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for HistoryError {
    fn from(err: std::io::Error) -> Self {
        HistoryError::Io {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_error_kinds() {
        let client = [
            ExErrorKind::InvalidInput,
            ExErrorKind::InvalidContinuation,
            ExErrorKind::UrlHeightWithoutWidth,
            ExErrorKind::InvalidWindow,
            ExErrorKind::UnknownProperty,
        ];
        for kind in client {
            assert!(kind.is_client_error(), "{:?} should be a client error", kind);
        }
        assert!(!ExErrorKind::UpstreamFetch.is_client_error());
        assert!(!ExErrorKind::BudgetTooSmall.is_client_error());
        assert!(!ExErrorKind::Internal.is_client_error());
    }

    #[test]
    fn test_history_error_maps_to_kind() {
        let cases = [
            (
                HistoryError::InvalidContinuation {
                    reason: "x".to_string(),
                },
                "ERR_INVALID_CONTINUATION",
            ),
            (
                HistoryError::UrlHeightWithoutWidth,
                "ERR_URLHEIGHT_WITHOUT_URLWIDTH",
            ),
            (
                HistoryError::Fetch {
                    entity_id: "A".to_string(),
                    message: "down".to_string(),
                },
                "ERR_UPSTREAM_FETCH",
            ),
            (
                HistoryError::DuplicateRevision {
                    entity_id: "A".to_string(),
                    timestamp: "t".to_string(),
                },
                "ERR_ALREADY_EXISTS",
            ),
            (
                HistoryError::BudgetTooSmall {
                    position: "A|10000".to_string(),
                },
                "ERR_BUDGET_TOO_SMALL",
            ),
        ];
        for (err, code) in cases {
            let ex: ExError = err.into();
            assert_eq!(ex.code(), code);
        }
    }

    #[test]
    fn test_fetch_error_carries_entity() {
        let ex: ExError = HistoryError::Fetch {
            entity_id: "File:A.png".to_string(),
            message: "timeout".to_string(),
        }
        .into();
        assert_eq!(ex.entity_id(), Some("File:A.png"));
        assert_eq!(ex.op(), Some("history_fetch"));
        assert!(ex.to_string().contains("timeout"));
    }
}
