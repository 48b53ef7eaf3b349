use crate::repository::UrlRecord;
use crate::shortcode::ShortCode;
use async_trait::async_trait;
use jiff::Timestamp;
use serde::{Deserialize, Serialize};

type Result<T> = std::result::Result<T, crate::error::ShortenerError>;

/// The externally visible result of shortening a URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenedUrl {
    /// Base URL joined with the short code.
    pub short_url: String,
    pub long_url: String,
    /// When the mapping was first created, not when this call happened.
    pub created_at: Timestamp,
}

#[async_trait]
pub trait Shortener: Send + Sync + 'static {
    /// Returns the short URL for `long_url`, creating the mapping on first use.
    ///
    /// Repeated calls with the same URL return the same short URL.
    async fn shorten(&self, long_url: &str) -> Result<ShortenedUrl>;

    /// Resolves a short code to its stored record and counts the hit.
    /// Returns `None` if the code does not exist or is not yet attached.
    async fn resolve(&self, code: &ShortCode) -> Result<Option<UrlRecord>>;
}
