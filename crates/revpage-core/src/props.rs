//! Requested-property set
//!
//! Callers name the revision fields they want with a closed set of
//! properties. Membership is a bit test; there is no string dispatch past
//! parsing.

use std::str::FromStr;

use crate::errors::HistoryError;

/// A revision property that can be requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Prop {
    Timestamp,
    User,
    UserId,
    Comment,
    ParsedComment,
    Url,
    Size,
    /// Alias of `Size`
    Dimensions,
    Sha1,
    Mime,
    ThumbMime,
    Metadata,
    ArchiveName,
    BitDepth,
}

impl Prop {
    pub const ALL: [Prop; 14] = [
        Prop::Timestamp,
        Prop::User,
        Prop::UserId,
        Prop::Comment,
        Prop::ParsedComment,
        Prop::Url,
        Prop::Size,
        Prop::Dimensions,
        Prop::Sha1,
        Prop::Mime,
        Prop::ThumbMime,
        Prop::Metadata,
        Prop::ArchiveName,
        Prop::BitDepth,
    ];

    /// Properties whose output depends on the stored content and is
    /// suppressed as a group when content is hidden
    pub const CONTENT: [Prop; 6] = [
        Prop::Url,
        Prop::Sha1,
        Prop::Metadata,
        Prop::Mime,
        Prop::ArchiveName,
        Prop::BitDepth,
    ];

    /// Wire name
    pub fn name(&self) -> &'static str {
        match self {
            Prop::Timestamp => "timestamp",
            Prop::User => "user",
            Prop::UserId => "userid",
            Prop::Comment => "comment",
            Prop::ParsedComment => "parsedcomment",
            Prop::Url => "url",
            Prop::Size => "size",
            Prop::Dimensions => "dimensions",
            Prop::Sha1 => "sha1",
            Prop::Mime => "mime",
            Prop::ThumbMime => "thumbmime",
            Prop::Metadata => "metadata",
            Prop::ArchiveName => "archivename",
            Prop::BitDepth => "bitdepth",
        }
    }

    fn bit(self) -> u16 {
        1 << (self as u16)
    }
}

impl FromStr for Prop {
    type Err = HistoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Prop::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or_else(|| HistoryError::UnknownProperty {
                name: s.to_string(),
            })
    }
}

impl std::fmt::Display for Prop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of requested properties
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropSet(u16);

impl PropSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Every property
    pub fn all() -> Self {
        Prop::ALL.iter().copied().collect()
    }

    /// Parse the pipe-separated wire form, e.g. `"timestamp|user|url"`.
    ///
    /// Empty segments are ignored; an unknown name is an error.
    pub fn parse(s: &str) -> Result<Self, HistoryError> {
        s.split('|')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(Prop::from_str)
            .collect()
    }

    pub fn with(mut self, prop: Prop) -> Self {
        self.0 |= prop.bit();
        self
    }

    pub fn contains(&self, prop: Prop) -> bool {
        self.0 & prop.bit() != 0
    }

    pub fn contains_any(&self, props: &[Prop]) -> bool {
        props.iter().any(|p| self.contains(*p))
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = Prop> + '_ {
        Prop::ALL.iter().copied().filter(|p| self.contains(*p))
    }
}

impl Default for PropSet {
    /// `timestamp|user`
    fn default() -> Self {
        Self::empty().with(Prop::Timestamp).with(Prop::User)
    }
}

impl FromIterator<Prop> for PropSet {
    fn from_iter<I: IntoIterator<Item = Prop>>(iter: I) -> Self {
        iter.into_iter().fold(Self::empty(), PropSet::with)
    }
}

impl std::fmt::Debug for PropSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl std::fmt::Display for PropSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.iter().map(|p| p.name()).collect();
        f.write_str(&names.join("|"))
    }
}
