use std::cell::Cell;

use chrono::{DateTime, TimeZone, Utc};
use revpage_core::errors::{HistoryError, Result};
use revpage_core::model::{Author, Entity, EntityId, Namespace, QueryWindow, Revision};
use revpage_core::projection::FieldProjector;
use revpage_core::source::{EntityKeySource, MemoryRepo, RevisionHistory};
use revpage_core::sink::ResultBudget;
use revpage_core::QueryConfig;
use revpage_engine::{apply_history_query, HistoryPage, HistoryQuery};

#[allow(dead_code)]
pub fn ts(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).unwrap()
}

/// Image revision at `secs` with enough attributes for every property
#[allow(dead_code)]
pub fn revision(secs: i64) -> Revision {
    let mut rev = Revision::new(ts(secs), Author::new("Alice", 7));
    rev.size = 1000 + secs as u64;
    rev.width = 800;
    rev.height = 600;
    rev.mime = "image/jpeg".to_string();
    rev.sha1 = vec![0x5a; 20];
    rev.bit_depth = 8;
    rev.comment = format!("upload at {}", secs);
    rev
}

/// Repository of file entities; container ids follow the slice order from 1
#[allow(dead_code)]
pub fn repo(entities: &[(&str, &[i64])]) -> MemoryRepo {
    let mut repo = MemoryRepo::new();
    for (index, (id, times)) in entities.iter().enumerate() {
        repo.insert_entity(Entity::new(*id, index as u64 + 1)).unwrap();
        for &secs in times.iter() {
            let mut rev = revision(secs);
            rev.url = format!("/images/{}", id);
            repo.add_revision(&EntityId::from(*id), rev).unwrap();
        }
    }
    repo
}

#[allow(dead_code)]
pub fn config_with_records(max_records: usize) -> QueryConfig {
    QueryConfig {
        budget: ResultBudget::records(max_records),
        ..QueryConfig::default()
    }
}

#[allow(dead_code)]
pub fn apply(repo: &MemoryRepo, config: &QueryConfig, query: &HistoryQuery) -> HistoryPage {
    let projector = FieldProjector::with_defaults(&config.thumb_base_url);
    apply_history_query(repo, repo, &projector, config, query).unwrap()
}

/// `(title, unix seconds)` of every record in a page, in response order
#[allow(dead_code)]
pub fn records(page: &HistoryPage) -> Vec<(String, i64)> {
    page.entities
        .values()
        .flat_map(|e| {
            e.revisions.iter().map(move |r| {
                (
                    e.title.clone(),
                    r.timestamp.map_or(-1, |t| t.timestamp()),
                )
            })
        })
        .collect()
}

/// Follow continuation tokens until the last page; returns every record seen
#[allow(dead_code)]
pub fn drain(repo: &MemoryRepo, config: &QueryConfig, query: &HistoryQuery) -> Vec<(String, i64)> {
    let mut seen = Vec::new();
    let mut query = query.clone();
    for _ in 0..1_000 {
        let page = apply(repo, config, &query);
        seen.extend(records(&page));
        match page.continuation {
            Some(token) => {
                query.continuation = Some(token);
                query.context = query.context.for_next_page();
            }
            None => return seen,
        }
    }
    panic!("pagination did not terminate");
}

/// History source that counts calls and can fail for one entity
#[allow(dead_code)]
pub struct FlakyHistory<'a> {
    pub inner: &'a MemoryRepo,
    pub fail_on: Option<EntityId>,
    pub calls: Cell<usize>,
}

#[allow(dead_code)]
impl<'a> FlakyHistory<'a> {
    pub fn new(inner: &'a MemoryRepo) -> Self {
        Self {
            inner,
            fail_on: None,
            calls: Cell::new(0),
        }
    }

    pub fn failing_on(mut self, id: &str) -> Self {
        self.fail_on = Some(EntityId::from(id));
        self
    }

    fn check(&self, entity: &Entity) -> Result<()> {
        self.calls.set(self.calls.get() + 1);
        if self.fail_on.as_ref() == Some(&entity.id) {
            return Err(HistoryError::Fetch {
                entity_id: entity.id.to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }
}

impl RevisionHistory for FlakyHistory<'_> {
    fn current_revision(&self, entity: &Entity) -> Result<Option<Revision>> {
        self.check(entity)?;
        self.inner.current_revision(entity)
    }

    fn history(&self, entity: &Entity, limit: usize, window: &QueryWindow) -> Result<Vec<Revision>> {
        self.check(entity)?;
        self.inner.history(entity, limit, window)
    }
}

/// Collaborator that must never be reached
#[allow(dead_code)]
pub struct Untouchable;

impl EntityKeySource for Untouchable {
    fn list_entities(&self, _namespace: Namespace) -> Result<Vec<Entity>> {
        panic!("entity source consulted");
    }
}

impl RevisionHistory for Untouchable {
    fn current_revision(&self, _entity: &Entity) -> Result<Option<Revision>> {
        panic!("history fetched");
    }

    fn history(&self, _entity: &Entity, _limit: usize, _window: &QueryWindow) -> Result<Vec<Revision>> {
        panic!("history fetched");
    }
}
