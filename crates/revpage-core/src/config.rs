//! Query configuration loaded from TOML
//!
//! ```toml
//! default_limit = 1
//! max_limit = 500
//! default_props = "timestamp|user"
//! cursor_mode = "auto"
//! thumb_base_url = "/images"
//!
//! [budget]
//! max_bytes = 8388608
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::continuation::CursorMode;
use crate::errors::{HistoryError, Result};
use crate::props::PropSet;
use crate::sink::ResultBudget;

pub const DEFAULT_MAX_BYTES: usize = 8 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Per-entity revision limit when the query names none
    pub default_limit: usize,
    /// Upper clamp for the per-entity revision limit
    pub max_limit: usize,
    /// Properties returned when the query names none
    pub default_props: String,
    pub cursor_mode: CursorMode,
    pub budget: ResultBudget,
    /// Root for thumbnail URLs built by the default scaler
    pub thumb_base_url: String,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_limit: 1,
            max_limit: 500,
            default_props: "timestamp|user".to_string(),
            cursor_mode: CursorMode::Auto,
            budget: ResultBudget::bytes(DEFAULT_MAX_BYTES),
            thumb_base_url: "/images".to_string(),
        }
    }
}

impl QueryConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(|e| HistoryError::Config {
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Parsed `default_props`
    pub fn default_props(&self) -> Result<PropSet> {
        PropSet::parse(&self.default_props)
    }

    fn validate(&self) -> Result<()> {
        if self.max_limit == 0 {
            return Err(config_error("max_limit must be at least 1"));
        }
        if self.default_limit == 0 || self.default_limit > self.max_limit {
            return Err(config_error(format!(
                "default_limit {} outside 1..={}",
                self.default_limit, self.max_limit
            )));
        }
        self.default_props()
            .map_err(|e| config_error(format!("default_props: {}", e)))?;
        Ok(())
    }
}

fn config_error(message: impl Into<String>) -> HistoryError {
    HistoryError::Config {
        message: message.into(),
    }
}
