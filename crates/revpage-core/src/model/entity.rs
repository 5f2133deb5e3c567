use serde::{Deserialize, Serialize};

/// Sortable entity identifier (e.g. a file title)
///
/// Ordering is plain byte-wise string ordering; the pagination scan and the
/// compound continuation cursor both rely on it being total and stable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(String);

impl EntityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Namespace tag of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace(pub i32);

impl Namespace {
    /// Namespace holding file entities
    pub const FILE: Namespace = Namespace(6);
}

/// Key the external source assigned to the entity's container (a page id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContainerId(pub u64);

impl std::fmt::Display for ContainerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An entity owning an ordered revision history
///
/// Produced by an [`EntityKeySource`](crate::source::EntityKeySource) for the
/// duration of one query and never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub namespace: Namespace,
    pub container_id: ContainerId,

    /// Alias entity; never contributes revisions
    #[serde(default)]
    pub redirect: bool,

    /// Name of the repository holding this entity's content.
    /// `None` when the entity exists but has no stored content.
    #[serde(default)]
    pub repository: Option<String>,

    /// URL of the entity's description page
    #[serde(default)]
    pub description_url: String,
}

impl Entity {
    /// Create a file entity stored in the `local` repository
    pub fn new(id: impl Into<String>, container_id: u64) -> Self {
        let id = EntityId::new(id);
        let description_url = format!("/wiki/{}", id.as_str().replace(' ', "_"));
        Self {
            id,
            namespace: Namespace::FILE,
            container_id: ContainerId(container_id),
            redirect: false,
            repository: Some("local".to_string()),
            description_url,
        }
    }

    /// Mark this entity as a redirect
    pub fn as_redirect(mut self) -> Self {
        self.redirect = true;
        self
    }

    /// Drop the repository, leaving an entity with no stored content
    pub fn without_content(mut self) -> Self {
        self.repository = None;
        self
    }

    /// Whether the scan should visit this entity's history at all
    pub fn has_history(&self) -> bool {
        !self.redirect && self.repository.is_some()
    }
}
