use crate::error::StorageError;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Result type for repository operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Store-assigned, strictly increasing record identifier.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(i64);

impl RecordId {
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a record is in its two-step creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordState {
    /// Inserted, identifier known, short code not yet attached.
    Pending,
    /// Short code attached. Never changes afterwards.
    Complete(ShortCode),
}

/// A stored URL mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UrlRecord {
    pub id: RecordId,
    /// The original URL that was shortened. Unique across records.
    pub long_url: String,
    pub state: RecordState,
    /// Set once on insert.
    pub created_at: Timestamp,
    /// Resolutions and resubmissions since creation.
    pub hit_count: u64,
}

impl UrlRecord {
    /// Returns the attached short code, or `None` while pending.
    pub fn short_code(&self) -> Option<&ShortCode> {
        match &self.state {
            RecordState::Complete(code) => Some(code),
            RecordState::Pending => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, RecordState::Pending)
    }
}

/// Input for [`Repository::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrlRecord {
    pub long_url: String,
}

impl NewUrlRecord {
    pub fn new(long_url: impl Into<String>) -> Self {
        Self {
            long_url: long_url.into(),
        }
    }
}

/// A freshly inserted record that has an identifier but no short code yet.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRecord {
    pub id: RecordId,
    pub long_url: String,
    pub created_at: Timestamp,
}

impl From<&UrlRecord> for PendingRecord {
    fn from(record: &UrlRecord) -> Self {
        Self {
            id: record.id,
            long_url: record.long_url.clone(),
            created_at: record.created_at,
        }
    }
}

/// Ordered-identifier store for URL records.
///
/// Implementations must enforce uniqueness of `long_url` and of attached
/// short codes, and must assign strictly increasing identifiers on insert.
#[async_trait]
pub trait Repository: Send + Sync + 'static {
    /// Looks up a record by exact long URL match.
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<UrlRecord>>;

    /// Looks up a record by its identifier.
    async fn find_by_id(&self, id: RecordId) -> Result<Option<UrlRecord>>;

    /// Inserts a pending record and returns it with its assigned identifier.
    /// Returns `Err(Conflict)` if the long URL is already stored.
    async fn insert(&self, record: NewUrlRecord) -> Result<PendingRecord>;

    /// Attaches `code` to the record `id`.
    ///
    /// Attaching the code a record already has is a no-op. Returns
    /// `Err(NotFound)` for an unknown identifier and `Err(Conflict)` if a
    /// different code is already attached or `code` belongs to another record.
    async fn attach_short_code(&self, id: RecordId, code: &ShortCode) -> Result<()>;

    /// Atomically adds one to the record's hit counter.
    async fn increment_hit_count(&self, id: RecordId) -> Result<()>;
}
