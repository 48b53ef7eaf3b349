use async_trait::async_trait;
use dashmap::mapref::entry::Entry as MapEntry;
use dashmap::DashMap;
use jiff::Timestamp;
use shrinkray_core::repository::{
    NewUrlRecord, PendingRecord, RecordId, RecordState, Repository, Result, UrlRecord,
};
use shrinkray_core::{ShortCode, StorageError};
use std::sync::atomic::{AtomicI64, Ordering};

/// In-memory storage entry for a URL mapping.
#[derive(Debug, Clone)]
struct Entry {
    long_url: String,
    short_code: Option<ShortCode>,
    created_at: Timestamp,
    hit_count: u64,
}

impl Entry {
    fn to_record(&self, id: RecordId) -> UrlRecord {
        let state = match &self.short_code {
            Some(code) => RecordState::Complete(code.clone()),
            None => RecordState::Pending,
        };
        UrlRecord {
            id,
            long_url: self.long_url.clone(),
            state,
            created_at: self.created_at,
            hit_count: self.hit_count,
        }
    }
}

/// In-memory implementation of the Repository trait using DashMap.
///
/// Records are keyed by identifier, with secondary indexes on long URL and
/// short code that play the role of unique constraints. Identifiers come from
/// an atomic sequence starting at 1.
#[derive(Debug)]
pub struct InMemoryRepository {
    records: DashMap<RecordId, Entry>,
    by_long_url: DashMap<String, RecordId>,
    by_short_code: DashMap<ShortCode, RecordId>,
    next_id: AtomicI64,
}

impl InMemoryRepository {
    /// Creates a new in-memory repository.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates a new in-memory repository with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: DashMap::with_capacity(capacity),
            by_long_url: DashMap::with_capacity(capacity),
            by_short_code: DashMap::with_capacity(capacity),
            next_id: AtomicI64::new(1),
        }
    }

    /// Number of stored records, pending ones included.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<UrlRecord>> {
        let Some(id) = self.by_long_url.get(long_url).map(|id| *id) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<UrlRecord>> {
        Ok(self.records.get(&id).map(|entry| entry.to_record(id)))
    }

    async fn insert(&self, record: NewUrlRecord) -> Result<PendingRecord> {
        // The long-URL slot is the unique constraint: whoever claims it first
        // gets an identifier, everyone else sees a conflict.
        let slot = match self.by_long_url.entry(record.long_url.clone()) {
            MapEntry::Occupied(_) => return Err(StorageError::Conflict(record.long_url)),
            MapEntry::Vacant(slot) => slot,
        };

        let id = RecordId::new(self.next_id.fetch_add(1, Ordering::SeqCst));
        let created_at = Timestamp::now();
        self.records.insert(
            id,
            Entry {
                long_url: record.long_url.clone(),
                short_code: None,
                created_at,
                hit_count: 0,
            },
        );
        // Publish the index only once the record it points at exists.
        slot.insert(id);

        Ok(PendingRecord {
            id,
            long_url: record.long_url,
            created_at,
        })
    }

    async fn attach_short_code(&self, id: RecordId, code: &ShortCode) -> Result<()> {
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or(StorageError::NotFound(id))?;

        match &entry.short_code {
            Some(existing) if existing == code => return Ok(()),
            Some(existing) => {
                return Err(StorageError::Conflict(format!(
                    "record {} already has short code {}",
                    id, existing
                )))
            }
            None => {}
        }

        match self.by_short_code.entry(code.clone()) {
            MapEntry::Occupied(owner) if *owner.get() != id => {
                return Err(StorageError::Conflict(format!(
                    "short code {} belongs to record {}",
                    code,
                    owner.get()
                )));
            }
            MapEntry::Occupied(_) => {}
            MapEntry::Vacant(slot) => {
                slot.insert(id);
            }
        }

        entry.short_code = Some(code.clone());
        Ok(())
    }

    async fn increment_hit_count(&self, id: RecordId) -> Result<()> {
        let mut entry = self
            .records
            .get_mut(&id)
            .ok_or(StorageError::NotFound(id))?;
        entry.hit_count += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shrinkray_core::codec;
    use std::sync::Arc;

    fn new(url: &str) -> NewUrlRecord {
        NewUrlRecord::new(url)
    }

    #[tokio::test]
    async fn insert_assigns_increasing_ids() {
        let repo = InMemoryRepository::new();

        let a = repo.insert(new("https://example.com/a")).await.unwrap();
        let b = repo.insert(new("https://example.com/b")).await.unwrap();

        assert_eq!(a.id, RecordId::new(1));
        assert_eq!(b.id, RecordId::new(2));
        assert!(b.created_at >= a.created_at);
    }

    #[tokio::test]
    async fn inserted_record_is_pending() {
        let repo = InMemoryRepository::new();

        let pending = repo.insert(new("https://example.com")).await.unwrap();
        let record = repo
            .find_by_long_url("https://example.com")
            .await
            .unwrap()
            .unwrap();

        assert_eq!(record.id, pending.id);
        assert!(record.is_pending());
        assert_eq!(record.hit_count, 0);
    }

    #[tokio::test]
    async fn find_nonexistent() {
        let repo = InMemoryRepository::new();

        assert!(repo.find_by_long_url("https://nope").await.unwrap().is_none());
        assert!(repo.find_by_id(RecordId::new(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn insert_conflict_on_duplicate_long_url() {
        let repo = InMemoryRepository::new();

        repo.insert(new("https://example.com")).await.unwrap();
        let err = repo.insert(new("https://example.com")).await.unwrap_err();

        assert!(matches!(err, StorageError::Conflict(_)));
        assert_eq!(repo.len(), 1);
    }

    #[tokio::test]
    async fn attach_completes_record() {
        let repo = InMemoryRepository::new();
        let pending = repo.insert(new("https://example.com")).await.unwrap();
        let code = codec::encode(pending.id.get()).unwrap();

        repo.attach_short_code(pending.id, &code).await.unwrap();

        let record = repo.find_by_id(pending.id).await.unwrap().unwrap();
        assert_eq!(record.short_code(), Some(&code));
    }

    #[tokio::test]
    async fn attach_same_code_twice_is_noop() {
        let repo = InMemoryRepository::new();
        let pending = repo.insert(new("https://example.com")).await.unwrap();
        let code = codec::encode(pending.id.get()).unwrap();

        repo.attach_short_code(pending.id, &code).await.unwrap();
        repo.attach_short_code(pending.id, &code).await.unwrap();
    }

    #[tokio::test]
    async fn attach_different_code_conflicts() {
        let repo = InMemoryRepository::new();
        let pending = repo.insert(new("https://example.com")).await.unwrap();

        repo.attach_short_code(pending.id, &codec::encode(1).unwrap())
            .await
            .unwrap();
        let err = repo
            .attach_short_code(pending.id, &codec::encode(2).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[tokio::test]
    async fn attach_code_owned_by_other_record_conflicts() {
        let repo = InMemoryRepository::new();
        let a = repo.insert(new("https://example.com/a")).await.unwrap();
        let b = repo.insert(new("https://example.com/b")).await.unwrap();
        let code = codec::encode(a.id.get()).unwrap();

        repo.attach_short_code(a.id, &code).await.unwrap();
        let err = repo.attach_short_code(b.id, &code).await.unwrap_err();

        assert!(matches!(err, StorageError::Conflict(_)));
        assert!(repo.find_by_id(b.id).await.unwrap().unwrap().is_pending());
    }

    #[tokio::test]
    async fn attach_unknown_id() {
        let repo = InMemoryRepository::new();

        let err = repo
            .attach_short_code(RecordId::new(42), &codec::encode(42).unwrap())
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::NotFound(id) if id == RecordId::new(42)));
    }

    #[tokio::test]
    async fn increment_hit_count() {
        let repo = InMemoryRepository::new();
        let pending = repo.insert(new("https://example.com")).await.unwrap();

        repo.increment_hit_count(pending.id).await.unwrap();
        repo.increment_hit_count(pending.id).await.unwrap();

        let record = repo.find_by_id(pending.id).await.unwrap().unwrap();
        assert_eq!(record.hit_count, 2);
    }

    #[tokio::test]
    async fn increment_unknown_id() {
        let repo = InMemoryRepository::new();

        let err = repo.increment_hit_count(RecordId::new(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let repo = Arc::new(InMemoryRepository::new());
        let id = repo.insert(new("https://example.com")).await.unwrap().id;

        let handles: Vec<_> = (0..100)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.increment_hit_count(id).await.unwrap() })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let record = repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.hit_count, 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_inserts_of_same_url_admit_one() {
        let repo = Arc::new(InMemoryRepository::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo = Arc::clone(&repo);
                tokio::spawn(async move { repo.insert(new("https://example.com")).await })
            })
            .collect();

        let mut won = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => won += 1,
                Err(StorageError::Conflict(_)) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(won, 1);
        assert_eq!(repo.len(), 1);
    }
}
