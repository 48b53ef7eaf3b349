//! URL shortener service implementation.
//!
//! This crate provides [`ShortenerService`], the find-or-create orchestration
//! over a [`Repository`](shrinkray_core::Repository). Core types are
//! re-exported from `shrinkray_core`.

pub mod service;
pub mod settings;

pub use service::ShortenerService;
pub use settings::{ShortenerSettings, DEFAULT_STORE_TIMEOUT};
pub use shrinkray_core::{ShortenedUrl, Shortener, ShortenerError};
