//! Projected revision records
//!
//! Each redactable field group is a [`Redactable`]; a hidden group carries
//! no data, so nothing belonging to it can leak into the serialized form.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::metadata::MetadataList;

/// A field group that is either shown or replaced by a hidden marker
#[derive(Debug, Clone, PartialEq)]
pub enum Redactable<T> {
    Visible(T),
    Hidden,
}

impl<T> Redactable<T> {
    pub fn is_hidden(&self) -> bool {
        matches!(self, Redactable::Hidden)
    }

    pub fn visible(&self) -> Option<&T> {
        match self {
            Redactable::Visible(v) => Some(v),
            Redactable::Hidden => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AuthorFields {
    pub user: Option<String>,
    pub userid: Option<u64>,
    pub anon: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SizeFields {
    pub size: u64,
    pub width: u32,
    pub height: u32,
    pub pagecount: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CommentFields {
    pub comment: Option<String>,
    pub parsedcomment: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThumbFields {
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub mime: Option<String>,
}

/// Result of asking for a scaled variant
#[derive(Debug, Clone, PartialEq)]
pub enum ThumbOutcome {
    Scaled(ThumbFields),
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrlFields {
    pub url: String,
    pub descriptionurl: String,
    pub thumb: Option<ThumbOutcome>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ContentFields {
    pub url: Option<UrlFields>,
    pub sha1: Option<String>,
    /// Outer `Option`: requested. Inner: the revision has metadata.
    pub metadata: Option<Option<MetadataList>>,
    pub mime: Option<String>,
    pub archivename: Option<String>,
    pub bitdepth: Option<u32>,
}

/// One projected revision
///
/// A `None` group was not requested. The always-visible timestamp is a
/// plain field outside any group.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RevisionRecord {
    pub timestamp: Option<DateTime<Utc>>,
    pub author: Option<Redactable<AuthorFields>>,
    pub size: Option<SizeFields>,
    pub comment: Option<Redactable<CommentFields>>,
    pub content: Option<Redactable<ContentFields>>,
}

impl Serialize for RevisionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;

        if let Some(ts) = &self.timestamp {
            // Whole seconds print without a fraction; finer timestamps keep theirs
            map.serialize_entry("timestamp", &ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))?;
        }

        match &self.author {
            Some(Redactable::Hidden) => map.serialize_entry("userhidden", "")?,
            Some(Redactable::Visible(a)) => {
                if let Some(user) = &a.user {
                    map.serialize_entry("user", user)?;
                }
                if let Some(userid) = a.userid {
                    map.serialize_entry("userid", &userid)?;
                }
                if a.anon {
                    map.serialize_entry("anon", "")?;
                }
            }
            None => {}
        }

        if let Some(s) = &self.size {
            map.serialize_entry("size", &s.size)?;
            map.serialize_entry("width", &s.width)?;
            map.serialize_entry("height", &s.height)?;
            if let Some(pages) = s.pagecount {
                map.serialize_entry("pagecount", &pages)?;
            }
        }

        match &self.comment {
            Some(Redactable::Hidden) => map.serialize_entry("commenthidden", "")?,
            Some(Redactable::Visible(c)) => {
                if let Some(parsed) = &c.parsedcomment {
                    map.serialize_entry("parsedcomment", parsed)?;
                }
                if let Some(comment) = &c.comment {
                    map.serialize_entry("comment", comment)?;
                }
            }
            None => {}
        }

        match &self.content {
            Some(Redactable::Hidden) => map.serialize_entry("filehidden", "")?,
            Some(Redactable::Visible(c)) => serialize_content(&mut map, c)?,
            None => {}
        }

        map.end()
    }
}

fn serialize_content<M: SerializeMap>(map: &mut M, c: &ContentFields) -> Result<(), M::Error> {
    if let Some(u) = &c.url {
        match &u.thumb {
            Some(ThumbOutcome::Scaled(t)) => {
                map.serialize_entry("thumburl", &t.url)?;
                map.serialize_entry("thumbwidth", &t.width)?;
                map.serialize_entry("thumbheight", &t.height)?;
                if let Some(mime) = &t.mime {
                    map.serialize_entry("thumbmime", mime)?;
                }
            }
            Some(ThumbOutcome::Error(text)) => map.serialize_entry("thumberror", text)?,
            None => {}
        }
        map.serialize_entry("url", &u.url)?;
        map.serialize_entry("descriptionurl", &u.descriptionurl)?;
    }
    if let Some(sha1) = &c.sha1 {
        map.serialize_entry("sha1", sha1)?;
    }
    if let Some(metadata) = &c.metadata {
        map.serialize_entry("metadata", metadata)?;
    }
    if let Some(mime) = &c.mime {
        map.serialize_entry("mime", mime)?;
    }
    if let Some(name) = &c.archivename {
        map.serialize_entry("archivename", name)?;
    }
    if let Some(depth) = c.bitdepth {
        map.serialize_entry("bitdepth", &depth)?;
    }
    Ok(())
}
