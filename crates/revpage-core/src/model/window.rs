use chrono::{DateTime, Utc};

use crate::errors::{HistoryError, Result};

/// Inclusive timestamp bounds for a newest-first scan
///
/// `start` is the newest timestamp admitted, `end` the oldest. A missing
/// bound is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueryWindow {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl QueryWindow {
    /// Build a window, rejecting `start < end`.
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self> {
        if let (Some(s), Some(e)) = (start, end) {
            if s < e {
                return Err(HistoryError::InvalidWindow {
                    start: s.to_rfc3339(),
                    end: e.to_rfc3339(),
                });
            }
        }
        Ok(Self { start, end })
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Same window with a different start; used when resuming from a cursor.
    pub fn with_start(self, start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: self.end,
        }
    }

    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start.map_or(true, |s| ts <= s) && self.end.map_or(true, |e| ts >= e)
    }
}
