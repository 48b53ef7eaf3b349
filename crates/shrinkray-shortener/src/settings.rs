use std::time::Duration;
use typed_builder::TypedBuilder;

/// Upper bound on a single store call unless configured otherwise.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Configures a [`ShortenerService`](crate::service::ShortenerService).
#[derive(Debug, Clone, TypedBuilder)]
pub struct ShortenerSettings {
    /// Prefix of every public short URL, e.g. `https://shr.ink`.
    #[builder(setter(into))]
    pub base_url: String,
    /// Deadline applied to each individual store call.
    #[builder(default = DEFAULT_STORE_TIMEOUT)]
    pub store_timeout: Duration,
}
