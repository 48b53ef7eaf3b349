use crate::settings::ShortenerSettings;
use async_trait::async_trait;
use jiff::Timestamp;
use shrinkray_core::{
    codec, NewUrlRecord, PendingRecord, RecordState, Repository, ShortCode, ShortenedUrl,
    Shortener, ShortenerError, StorageError, UrlRecord,
};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, error, trace, warn};

type Result<T> = std::result::Result<T, ShortenerError>;

/// Outcome of the dedup lookup by long URL.
#[derive(Debug)]
enum Lookup {
    Found(UrlRecord),
    Missing,
}

/// Outcome of trying to insert a new record for a long URL.
#[derive(Debug)]
enum Claim {
    /// This call owns the new record and must complete it.
    Claimed(PendingRecord),
    /// Another call inserted the same long URL first.
    LostRace,
}

/// A concrete implementation of the `Shortener` trait.
///
/// Short codes are derived from the store-assigned identifier, so creating a
/// mapping takes two writes: an insert that yields the identifier, then an
/// update that attaches `encode(id)` to that same record.
///
/// Concurrent submissions of the same new URL are serialised by the store's
/// unique constraint on the long URL. The call that loses the insert falls
/// back to a single extra lookup and never inserts again.
///
/// A pending record found by the lookup (an in-flight creation, or one whose
/// code write failed earlier) is completed here by attaching `encode(id)`.
/// The code is only returned once the store has accepted that write.
#[derive(Debug)]
pub struct ShortenerService<R> {
    repository: Arc<R>,
    settings: ShortenerSettings,
}

impl<R> Clone for ShortenerService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            settings: self.settings.clone(),
        }
    }
}

impl<R: Repository> ShortenerService<R> {
    /// Creates a new `ShortenerService` that owns its repository.
    pub fn new(repository: R, settings: ShortenerSettings) -> Self {
        Self::from_shared(Arc::new(repository), settings)
    }

    /// Creates a new `ShortenerService` over a repository shared with others.
    pub fn from_shared(repository: Arc<R>, settings: ShortenerSettings) -> Self {
        Self {
            repository,
            settings,
        }
    }

    pub fn settings(&self) -> &ShortenerSettings {
        &self.settings
    }

    /// Runs one store call under the configured deadline.
    async fn bounded<T>(
        &self,
        op: &'static str,
        call: impl Future<Output = std::result::Result<T, StorageError>>,
    ) -> std::result::Result<T, StorageError> {
        match tokio::time::timeout(self.settings.store_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout(format!(
                "{op} exceeded {:?}",
                self.settings.store_timeout
            ))),
        }
    }

    async fn lookup(&self, long_url: &str) -> Result<Lookup> {
        let found = self
            .bounded("find_by_long_url", self.repository.find_by_long_url(long_url))
            .await?;
        Ok(match found {
            Some(record) => Lookup::Found(record),
            None => Lookup::Missing,
        })
    }

    async fn claim(&self, long_url: &str) -> Result<Claim> {
        match self
            .bounded("insert", self.repository.insert(NewUrlRecord::new(long_url)))
            .await
        {
            Ok(pending) => Ok(Claim::Claimed(pending)),
            Err(StorageError::Conflict(_)) => Ok(Claim::LostRace),
            Err(e) => Err(e.into()),
        }
    }

    /// Moves a pending record to complete by attaching `encode(id)`.
    async fn complete(&self, pending: &PendingRecord) -> Result<ShortCode> {
        let code = codec::encode(pending.id.get())?;

        if let Err(source) = self
            .bounded(
                "attach_short_code",
                self.repository.attach_short_code(pending.id, &code),
            )
            .await
        {
            error!(id = %pending.id, error = %source, "record left pending without a short code");
            return Err(ShortenerError::IncompleteRecord {
                id: pending.id,
                source,
            });
        }

        debug!(id = %pending.id, code = %code, "attached short code");
        Ok(code)
    }

    /// Serves a record that already existed before this call.
    async fn reuse(&self, record: UrlRecord) -> Result<ShortenedUrl> {
        let code = match &record.state {
            RecordState::Complete(code) => code.clone(),
            RecordState::Pending => {
                warn!(id = %record.id, "found pending record, attaching its short code");
                self.complete(&PendingRecord::from(&record)).await?
            }
        };

        self.bounded(
            "increment_hit_count",
            self.repository.increment_hit_count(record.id),
        )
        .await?;

        debug!(id = %record.id, code = %code, "reused existing short code");
        Ok(self.respond(&code, record.long_url, record.created_at))
    }

    fn respond(&self, code: &ShortCode, long_url: String, created_at: Timestamp) -> ShortenedUrl {
        ShortenedUrl {
            short_url: code.to_url(&self.settings.base_url),
            long_url,
            created_at,
        }
    }
}

#[async_trait]
impl<R: Repository> Shortener for ShortenerService<R> {
    async fn shorten(&self, long_url: &str) -> Result<ShortenedUrl> {
        if long_url.trim().is_empty() {
            return Err(ShortenerError::InvalidArgument(
                "long URL cannot be blank".to_string(),
            ));
        }
        trace!(long_url = %long_url, "shortening");

        if let Lookup::Found(record) = self.lookup(long_url).await? {
            return self.reuse(record).await;
        }

        match self.claim(long_url).await? {
            Claim::Claimed(pending) => {
                let code = self.complete(&pending).await?;
                Ok(self.respond(&code, pending.long_url, pending.created_at))
            }
            Claim::LostRace => {
                warn!(long_url = %long_url, "lost insert race, retrying as lookup");
                match self.lookup(long_url).await? {
                    Lookup::Found(record) => self.reuse(record).await,
                    Lookup::Missing => Err(StorageError::Operation(format!(
                        "insert conflicted but no record exists for {long_url}"
                    ))
                    .into()),
                }
            }
        }
    }

    async fn resolve(&self, code: &ShortCode) -> Result<Option<UrlRecord>> {
        trace!(code = %code, "resolving short code");

        let Some(mut record) = self
            .bounded("find_by_id", self.repository.find_by_id(code.id()))
            .await?
        else {
            trace!(code = %code, "short code not found");
            return Ok(None);
        };

        if record.short_code() != Some(code) {
            debug!(code = %code, id = %record.id, "record has no matching short code");
            return Ok(None);
        }

        self.bounded(
            "increment_hit_count",
            self.repository.increment_hit_count(record.id),
        )
        .await?;
        record.hit_count += 1;

        debug!(code = %code, url = %record.long_url, "resolved short code");
        Ok(Some(record))
    }
}
