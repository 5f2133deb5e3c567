use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who made a revision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    /// Account id; `0` means the author has no account (anonymous)
    pub id: u64,
}

impl Author {
    pub fn new(name: impl Into<String>, id: u64) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.id == 0
    }
}

/// Independent per-revision redaction markers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RedactionFlags {
    #[serde(default)]
    pub author_hidden: bool,
    #[serde(default)]
    pub comment_hidden: bool,
    #[serde(default)]
    pub content_hidden: bool,
}

/// Position of a revision in its entity's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevisionKind {
    /// The newest revision
    Current,
    /// A superseded revision, kept under an archive name
    Archived { archive_name: String },
}

/// One historical version of an entity's content and metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
    pub timestamp: DateTime<Utc>,
    pub kind: RevisionKind,
    pub author: Author,
    pub size: u64,
    pub width: u32,
    pub height: u32,
    /// Number of pages for multi-page documents
    #[serde(default)]
    pub page_count: Option<u32>,
    /// Raw SHA-1 digest of the content
    #[serde(default)]
    pub sha1: Vec<u8>,
    pub mime: String,
    #[serde(default)]
    pub comment: String,
    pub url: String,
    #[serde(default)]
    pub bit_depth: u32,
    /// Structured technical metadata (e.g. EXIF)
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    pub redaction: RedactionFlags,
}

impl Revision {
    /// Create a current revision with placeholder attributes
    ///
    /// Tests and fixtures adjust the public fields afterwards.
    pub fn new(timestamp: DateTime<Utc>, author: Author) -> Self {
        Self {
            timestamp,
            kind: RevisionKind::Current,
            author,
            size: 0,
            width: 0,
            height: 0,
            page_count: None,
            sha1: Vec::new(),
            mime: "application/octet-stream".to_string(),
            comment: String::new(),
            url: String::new(),
            bit_depth: 0,
            metadata: None,
            redaction: RedactionFlags::default(),
        }
    }

    pub fn is_current(&self) -> bool {
        matches!(self.kind, RevisionKind::Current)
    }

    pub fn archive_name(&self) -> Option<&str> {
        match &self.kind {
            RevisionKind::Current => None,
            RevisionKind::Archived { archive_name } => Some(archive_name),
        }
    }

    pub fn is_author_hidden(&self) -> bool {
        self.redaction.author_hidden
    }

    pub fn is_comment_hidden(&self) -> bool {
        self.redaction.comment_hidden
    }

    pub fn is_content_hidden(&self) -> bool {
        self.redaction.content_hidden
    }

    /// Archive this revision under `{yyyymmddhhmmss}!{name}`
    pub fn archive(&mut self, name: &str) {
        let archive_name = format!("{}!{}", self.timestamp.format("%Y%m%d%H%M%S"), name);
        self.kind = RevisionKind::Archived { archive_name };
    }
}
