//! Query entry points.
//!
//! `read_tools` holds the request and response types, `history_query` the
//! pagination orchestrator that fills them.

pub mod history_query;
pub mod read_tools;
