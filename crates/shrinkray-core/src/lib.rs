//! Core types and traits for the Shrinkray URL shortener.
//!
//! This crate provides the base62 codec, the record lifecycle types and the
//! store contract shared by the shortener service, the storage backends and
//! the HTTP gateway.

pub mod codec;
pub mod error;
pub mod repository;
pub mod shortcode;
pub mod shortener;

pub use error::{CodecError, ShortenerError, StorageError};
pub use repository::{
    NewUrlRecord, PendingRecord, RecordId, RecordState, Repository, UrlRecord,
};
pub use shortcode::ShortCode;
pub use shortener::{ShortenedUrl, Shortener};
