use async_trait::async_trait;
use jiff::Timestamp;
use shrinkray_core::error::StorageError;
use shrinkray_core::repository::{
    NewUrlRecord, PendingRecord, RecordId, RecordState, Repository, Result, UrlRecord,
};
use shrinkray_core::shortcode::ShortCode;
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};
use tracing::debug;

const SCHEMA: &str = include_str!("../ddl/mysql/short_urls.sql");

/// MySQL implementation of the repository contract.
///
/// Identifiers come from `AUTO_INCREMENT`. Uniqueness of the long URL is
/// enforced on a stored SHA-256 column so that arbitrarily long URLs can be
/// indexed. A `NULL` short code is the pending state.
#[derive(Debug, Clone)]
pub struct MySqlRepository {
    pool: MySqlPool,
}

impl MySqlRepository {
    /// Creates a repository from an existing MySQL connection pool.
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Creates a repository by opening a new MySQL connection pool.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = MySqlPool::connect(database_url)
            .await
            .map_err(map_sqlx_error)?;
        Ok(Self::new(pool))
    }

    /// Creates the `short_urls` table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }

    /// Returns a reference to the underlying pool.
    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    async fn stored_short_code(&self, id: RecordId) -> Result<Option<Option<String>>> {
        let row = sqlx::query("SELECT short_code FROM short_urls WHERE id = ?")
            .bind(id.get())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)?;

        row.map(|row| row.try_get("short_code").map_err(map_sqlx_error))
            .transpose()
    }
}

fn parse_created_at(micros: i64) -> Result<Timestamp> {
    Timestamp::from_microsecond(micros).map_err(|e| {
        StorageError::InvalidData(format!("invalid created_at timestamp '{}': {e}", micros))
    })
}

fn parse_short_code(code: Option<String>) -> Result<RecordState> {
    match code {
        None => Ok(RecordState::Pending),
        Some(code) => ShortCode::parse(code.as_str())
            .map(RecordState::Complete)
            .map_err(|e| StorageError::InvalidData(format!("stored short code '{code}': {e}"))),
    }
}

fn record_from_row(row: &MySqlRow) -> Result<UrlRecord> {
    let id: i64 = row.try_get("id").map_err(map_sqlx_error)?;
    let long_url: String = row.try_get("long_url").map_err(map_sqlx_error)?;
    let short_code: Option<String> = row.try_get("short_code").map_err(map_sqlx_error)?;
    let created_at: i64 = row.try_get("created_at").map_err(map_sqlx_error)?;
    let hit_count: u64 = row.try_get("hit_count").map_err(map_sqlx_error)?;

    Ok(UrlRecord {
        id: RecordId::new(id),
        long_url,
        state: parse_short_code(short_code)?,
        created_at: parse_created_at(created_at)?,
        hit_count,
    })
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(sqlx::error::DatabaseError::is_unique_violation)
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    let message = err.to_string();

    match err {
        sqlx::Error::PoolTimedOut => StorageError::Timeout(message),
        sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_) => StorageError::Unavailable(message),
        sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::TypeNotFound { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::RowNotFound => StorageError::InvalidData(message),
        _ => StorageError::Query(message),
    }
}

#[async_trait]
impl Repository for MySqlRepository {
    async fn find_by_long_url(&self, long_url: &str) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, long_url, short_code, created_at, hit_count
            FROM short_urls
            WHERE long_url_hash = UNHEX(SHA2(?, 256))
              AND long_url = ?
            LIMIT 1
            "#,
        )
        .bind(long_url)
        .bind(long_url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn find_by_id(&self, id: RecordId) -> Result<Option<UrlRecord>> {
        let row = sqlx::query(
            r#"
            SELECT id, long_url, short_code, created_at, hit_count
            FROM short_urls
            WHERE id = ?
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        row.as_ref().map(record_from_row).transpose()
    }

    async fn insert(&self, record: NewUrlRecord) -> Result<PendingRecord> {
        // Truncate to what the column stores so the returned value matches a re-read.
        let created_at = parse_created_at(Timestamp::now().as_microsecond())?;

        let result = sqlx::query(
            r#"
            INSERT INTO short_urls (long_url, short_code, created_at, hit_count)
            VALUES (?, NULL, ?, 0)
            "#,
        )
        .bind(&record.long_url)
        .bind(created_at.as_microsecond())
        .execute(&self.pool)
        .await;

        let done = match result {
            Ok(done) => done,
            Err(err) if is_unique_violation(&err) => {
                return Err(StorageError::Conflict(record.long_url))
            }
            Err(err) => return Err(map_sqlx_error(err)),
        };

        let id = i64::try_from(done.last_insert_id()).map_err(|_| {
            StorageError::InvalidData(format!(
                "assigned id {} does not fit in i64",
                done.last_insert_id()
            ))
        })?;
        debug!(id, long_url = %record.long_url, "inserted pending record");

        Ok(PendingRecord {
            id: RecordId::new(id),
            long_url: record.long_url,
            created_at,
        })
    }

    async fn attach_short_code(&self, id: RecordId, code: &ShortCode) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET short_code = ?
            WHERE id = ?
              AND short_code IS NULL
            "#,
        )
        .bind(code.as_str())
        .bind(id.get())
        .execute(&self.pool)
        .await;

        let done = match result {
            Ok(done) => done,
            Err(err) if is_unique_violation(&err) => {
                return Err(StorageError::Conflict(format!(
                    "short code {} belongs to another record",
                    code
                )))
            }
            Err(err) => return Err(map_sqlx_error(err)),
        };

        if done.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing updated: either the row is gone or a code is already set.
        match self.stored_short_code(id).await? {
            None => Err(StorageError::NotFound(id)),
            Some(Some(existing)) if existing == code.as_str() => Ok(()),
            Some(Some(existing)) => Err(StorageError::Conflict(format!(
                "record {} already has short code {}",
                id, existing
            ))),
            Some(None) => Err(StorageError::Operation(format!(
                "short code update for record {} affected no rows",
                id
            ))),
        }
    }

    async fn increment_hit_count(&self, id: RecordId) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE short_urls
            SET hit_count = hit_count + 1
            WHERE id = ?
            "#,
        )
        .bind(id.get())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(id));
        }
        Ok(())
    }
}
