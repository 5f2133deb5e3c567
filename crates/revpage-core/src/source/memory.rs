use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;

use crate::errors::{HistoryError, Result};
use crate::model::{Entity, EntityId, Namespace, QueryWindow, Revision, RevisionKind};

use super::{EntityKeySource, RevisionHistory};

/// In-memory entity and revision repository
///
/// Keeps each entity's revisions newest first. The newest revision is always
/// the current one; anything older is archived on insert.
#[derive(Debug, Clone, Default)]
pub struct MemoryRepo {
    entities: BTreeMap<EntityId, Entity>,
    revisions: HashMap<EntityId, Vec<Revision>>,
}

/// Fixture shape accepted by [`MemoryRepo::from_json`]
#[derive(Debug, Deserialize)]
struct Fixture {
    entities: Vec<FixtureEntity>,
}

#[derive(Debug, Deserialize)]
struct FixtureEntity {
    #[serde(flatten)]
    entity: Entity,
    #[serde(default)]
    revisions: Vec<Revision>,
}

impl MemoryRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load entities and revisions from a JSON fixture
    ///
    /// ```json
    /// { "entities": [ { "id": "A.png", "namespace": 6, "container_id": 1,
    ///                   "repository": "local", "revisions": [ ... ] } ] }
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        let fixture: Fixture = serde_json::from_str(json)?;
        let mut repo = Self::new();
        for item in fixture.entities {
            let id = item.entity.id.clone();
            repo.insert_entity(item.entity)?;
            for revision in item.revisions {
                repo.add_revision(&id, revision)?;
            }
        }
        Ok(repo)
    }

    /// Register an entity
    ///
    /// # Errors
    ///
    /// Returns `DuplicateEntity` if the identifier is already registered.
    pub fn insert_entity(&mut self, entity: Entity) -> Result<()> {
        if self.entities.contains_key(&entity.id) {
            return Err(HistoryError::DuplicateEntity {
                entity_id: entity.id.to_string(),
            });
        }
        self.revisions.insert(entity.id.clone(), Vec::new());
        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    /// Add a revision to an entity's history
    ///
    /// # Errors
    ///
    /// Returns `EntityNotFound` for an unknown entity and `DuplicateRevision`
    /// if the entity already has a revision at the same timestamp.
    pub fn add_revision(&mut self, entity_id: &EntityId, mut revision: Revision) -> Result<()> {
        let revisions =
            self.revisions
                .get_mut(entity_id)
                .ok_or_else(|| HistoryError::EntityNotFound {
                    entity_id: entity_id.to_string(),
                })?;

        // Newest first
        let pos = match revisions.binary_search_by(|r| revision.timestamp.cmp(&r.timestamp)) {
            Ok(_) => {
                return Err(HistoryError::DuplicateRevision {
                    entity_id: entity_id.to_string(),
                    timestamp: revision.timestamp.to_rfc3339(),
                })
            }
            Err(pos) => pos,
        };

        if pos == 0 {
            revision.kind = RevisionKind::Current;
            if let Some(previous) = revisions.first_mut() {
                previous.archive(entity_id.as_str());
            }
        } else if revision.is_current() {
            revision.archive(entity_id.as_str());
        }
        revisions.insert(pos, revision);
        Ok(())
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Every revision of an entity, newest first
    pub fn revisions(&self, id: &EntityId) -> &[Revision] {
        self.revisions.get(id).map_or(&[], Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl EntityKeySource for MemoryRepo {
    fn list_entities(&self, namespace: Namespace) -> Result<Vec<Entity>> {
        Ok(self
            .entities
            .values()
            .filter(|e| e.namespace == namespace)
            .cloned()
            .collect())
    }
}

impl RevisionHistory for MemoryRepo {
    fn current_revision(&self, entity: &Entity) -> Result<Option<Revision>> {
        Ok(self.revisions(&entity.id).first().cloned())
    }

    fn history(
        &self,
        entity: &Entity,
        limit: usize,
        window: &QueryWindow,
    ) -> Result<Vec<Revision>> {
        Ok(self
            .revisions(&entity.id)
            .iter()
            .skip(1)
            .filter(|r| window.contains(r.timestamp))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Author;
    use chrono::{DateTime, TimeZone, Utc};

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn rev(secs: i64) -> Revision {
        Revision::new(ts(secs), Author::new("Alice", 1))
    }

    fn repo_with(id: &str, times: &[i64]) -> MemoryRepo {
        let mut repo = MemoryRepo::new();
        repo.insert_entity(Entity::new(id, 1)).unwrap();
        for &t in times {
            repo.add_revision(&EntityId::from(id), rev(t)).unwrap();
        }
        repo
    }

    #[test]
    fn test_newest_revision_is_current_regardless_of_insert_order() {
        let repo = repo_with("A.png", &[20, 30, 10]);
        let revs = repo.revisions(&EntityId::from("A.png"));

        let times: Vec<_> = revs.iter().map(|r| r.timestamp.timestamp()).collect();
        assert_eq!(times, vec![30, 20, 10]);
        assert!(revs[0].is_current());
        assert!(revs[1..].iter().all(|r| r.archive_name().is_some()));
    }

    #[test]
    fn test_duplicate_timestamp_rejected() {
        let mut repo = repo_with("A.png", &[10]);
        let err = repo
            .add_revision(&EntityId::from("A.png"), rev(10))
            .unwrap_err();
        assert!(matches!(err, HistoryError::DuplicateRevision { .. }));
    }

    #[test]
    fn test_sub_millisecond_timestamps_stay_distinct() {
        let mut repo = repo_with("A.png", &[]);
        let id = EntityId::from("A.png");
        for (nanos, user) in [(123_456_789, "Alice"), (123_999_000, "Bob")] {
            repo.add_revision(
                &id,
                Revision::new(Utc.timestamp_opt(10, nanos).unwrap(), Author::new(user, 1)),
            )
            .unwrap();
        }

        let stored: Vec<u32> = repo
            .revisions(&id)
            .iter()
            .map(|r| r.timestamp.timestamp_subsec_nanos())
            .collect();
        assert_eq!(stored, vec![123_999_000, 123_456_789]);
    }

    #[test]
    fn test_unknown_and_duplicate_entities() {
        let mut repo = repo_with("A.png", &[]);
        assert!(matches!(
            repo.add_revision(&EntityId::from("B.png"), rev(1)),
            Err(HistoryError::EntityNotFound { .. })
        ));
        assert!(matches!(
            repo.insert_entity(Entity::new("A.png", 2)),
            Err(HistoryError::DuplicateEntity { .. })
        ));
    }

    #[test]
    fn test_history_excludes_current_and_respects_window() {
        let repo = repo_with("A.png", &[50, 40, 30, 20, 10]);
        let entity = repo.entity(&EntityId::from("A.png")).unwrap().clone();

        let window = QueryWindow::new(Some(ts(45)), Some(ts(15))).unwrap();
        let times: Vec<_> = repo
            .history(&entity, 10, &window)
            .unwrap()
            .iter()
            .map(|r| r.timestamp.timestamp())
            .collect();
        assert_eq!(times, vec![40, 30, 20]);

        let limited = repo.history(&entity, 1, &QueryWindow::unbounded()).unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].timestamp, ts(40));
    }

    #[test]
    fn test_list_entities_sorted_and_filtered_by_namespace() {
        let mut repo = MemoryRepo::new();
        repo.insert_entity(Entity::new("b.png", 2)).unwrap();
        repo.insert_entity(Entity::new("a.png", 1)).unwrap();
        let mut other = Entity::new("Talk", 3);
        other.namespace = Namespace(1);
        repo.insert_entity(other).unwrap();

        let ids: Vec<_> = repo
            .list_entities(Namespace::FILE)
            .unwrap()
            .into_iter()
            .map(|e| e.id.to_string())
            .collect();
        assert_eq!(ids, vec!["a.png", "b.png"]);
    }

    #[test]
    fn test_from_json_fixture() {
        let json = r#"{
            "entities": [
                {
                    "id": "A.png", "namespace": 6, "container_id": 11,
                    "repository": "local",
                    "revisions": [
                        { "timestamp": "2020-01-01T00:00:00Z", "kind": { "kind": "current" },
                          "author": { "name": "Alice", "id": 1 }, "size": 10,
                          "width": 2, "height": 2, "mime": "image/png", "url": "/a" },
                        { "timestamp": "2021-01-01T00:00:00Z", "kind": { "kind": "current" },
                          "author": { "name": "Bob", "id": 2 }, "size": 12,
                          "width": 2, "height": 2, "mime": "image/png", "url": "/a" }
                    ]
                },
                { "id": "R.png", "namespace": 6, "container_id": 12, "redirect": true }
            ]
        }"#;

        let repo = MemoryRepo::from_json(json).unwrap();
        assert_eq!(repo.len(), 2);
        let revs = repo.revisions(&EntityId::from("A.png"));
        assert_eq!(revs[0].author.name, "Bob");
        assert_eq!(revs[1].archive_name(), Some("20200101000000!A.png"));

        let redirect = repo.entity(&EntityId::from("R.png")).unwrap();
        assert!(redirect.redirect);
        assert!(!redirect.has_history());
    }
}
