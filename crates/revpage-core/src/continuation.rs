//! Continuation cursors
//!
//! A cursor names the first revision a follow-up call must return. It is
//! either a bare timestamp (one entity in scope) or an `(entity, timestamp)`
//! pair. The plain form is `"<ts>"` or `"<entity>|<ts>"`, where `<ts>` is
//! Unix epoch milliseconds, followed by `.` and six digits of nanoseconds
//! when the timestamp has a sub-millisecond part. The token handed to
//! callers is that text in URL-safe base64 without padding.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{HistoryError, Result};
use crate::model::EntityId;

/// How the cursor form is chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CursorMode {
    /// Timestamp-only cursor when exactly one entity is in scope,
    /// compound otherwise
    #[default]
    Auto,
    /// Always compound
    Compound,
}

impl CursorMode {
    /// Cursor form used for a query with `entity_count` entities in scope
    pub fn form_for(self, entity_count: usize) -> CursorForm {
        match self {
            CursorMode::Auto if entity_count == 1 => CursorForm::Single,
            _ => CursorForm::Compound,
        }
    }
}

/// Shape of a cursor; fixes the arity a decoder accepts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorForm {
    Single,
    Compound,
}

impl CursorForm {
    fn arity(self) -> usize {
        match self {
            CursorForm::Single => 1,
            CursorForm::Compound => 2,
        }
    }
}

/// Resume position for the next call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContinuationCursor {
    Single {
        timestamp: DateTime<Utc>,
    },
    Compound {
        entity: EntityId,
        timestamp: DateTime<Utc>,
    },
}

impl ContinuationCursor {
    /// Cursor pointing at `entity`'s revision at `timestamp`, in `form`
    pub fn at(form: CursorForm, entity: &EntityId, timestamp: DateTime<Utc>) -> Self {
        match form {
            CursorForm::Single => ContinuationCursor::Single { timestamp },
            CursorForm::Compound => ContinuationCursor::Compound {
                entity: entity.clone(),
                timestamp,
            },
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ContinuationCursor::Single { timestamp }
            | ContinuationCursor::Compound { timestamp, .. } => *timestamp,
        }
    }

    pub fn entity(&self) -> Option<&EntityId> {
        match self {
            ContinuationCursor::Single { .. } => None,
            ContinuationCursor::Compound { entity, .. } => Some(entity),
        }
    }

    pub fn form(&self) -> CursorForm {
        match self {
            ContinuationCursor::Single { .. } => CursorForm::Single,
            ContinuationCursor::Compound { .. } => CursorForm::Compound,
        }
    }

    /// Opaque token for the caller
    pub fn encode(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_string())
    }

    /// Parse a token, requiring the arity of `expected`.
    pub fn decode(token: &str, expected: CursorForm) -> Result<Self> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.trim())
            .map_err(|e| invalid(format!("not a continuation token ({})", e)))?;
        let text = String::from_utf8(bytes).map_err(|_| invalid("token is not UTF-8"))?;
        Self::parse_plain(&text, expected)
    }

    fn parse_plain(text: &str, expected: CursorForm) -> Result<Self> {
        // Entity ids may contain '|'; the timestamp never does.
        let (entity, ts) = match text.rsplit_once('|') {
            Some((entity, ts)) => (Some(entity), ts),
            None => (None, text),
        };
        let found = if entity.is_some() { 2 } else { 1 };
        if found != expected.arity() {
            return Err(invalid(format!(
                "expected {} field(s), found {}",
                expected.arity(),
                found
            )));
        }

        let timestamp = parse_timestamp(ts)?;

        match entity {
            None => Ok(ContinuationCursor::Single { timestamp }),
            Some("") => Err(invalid("empty entity")),
            Some(entity) => Ok(ContinuationCursor::Compound {
                entity: EntityId::new(entity),
                timestamp,
            }),
        }
    }
}

impl std::fmt::Display for ContinuationCursor {
    /// Plain (pre-encoding) form
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContinuationCursor::Single { timestamp } => write_timestamp(f, timestamp),
            ContinuationCursor::Compound { entity, timestamp } => {
                write!(f, "{}|", entity)?;
                write_timestamp(f, timestamp)
            }
        }
    }
}

const NANOS_PER_MILLI: u32 = 1_000_000;

fn write_timestamp(f: &mut std::fmt::Formatter<'_>, ts: &DateTime<Utc>) -> std::fmt::Result {
    // timestamp_millis floors, so the remainder is never negative
    let sub_milli = ts.timestamp_subsec_nanos() % NANOS_PER_MILLI;
    write!(f, "{}", ts.timestamp_millis())?;
    if sub_milli != 0 {
        write!(f, ".{:06}", sub_milli)?;
    }
    Ok(())
}

fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    let bad = || invalid(format!("bad timestamp '{}'", text));

    let (millis, sub_milli) = match text.split_once('.') {
        Some((millis, frac)) => {
            if frac.len() != 6 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(bad());
            }
            let nanos: u32 = frac.parse().map_err(|_| bad())?;
            (millis, nanos)
        }
        None => (text, 0),
    };
    let millis: i64 = millis.parse().map_err(|_| bad())?;

    DateTime::<Utc>::from_timestamp_millis(millis)
        .and_then(|t| t.checked_add_signed(Duration::nanoseconds(i64::from(sub_milli))))
        .ok_or_else(|| invalid(format!("timestamp out of range '{}'", text)))
}

fn invalid(reason: impl Into<String>) -> HistoryError {
    HistoryError::InvalidContinuation {
        reason: reason.into(),
    }
}
