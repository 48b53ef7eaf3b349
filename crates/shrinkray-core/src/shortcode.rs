use crate::codec;
use crate::error::CodecError;
use crate::repository::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// A validated short code: a non-empty base62 string that decodes to a
/// representable identifier.
///
/// Codes only come from [`codec::encode`] or from [`ShortCode::parse`], so a
/// `ShortCode` always round-trips through [`ShortCode::id`].
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ShortCode(String);

impl ShortCode {
    /// Wraps the output of the encoder, which is valid by construction.
    pub(crate) fn from_encoded(code: String) -> Self {
        Self(code)
    }

    /// Parses untrusted input (e.g. a request path segment).
    ///
    /// # Examples
    ///
    /// ```
    /// use shrinkray_core::ShortCode;
    ///
    /// let code = ShortCode::parse("01").unwrap();
    /// assert_eq!(code.id().get(), 62);
    /// assert!(ShortCode::parse("no-dash").is_err());
    /// ```
    pub fn parse(code: impl Into<String>) -> Result<Self, CodecError> {
        let code = code.into();
        codec::decode(&code)?;
        Ok(Self(code))
    }

    /// The identifier this code was derived from.
    pub fn id(&self) -> RecordId {
        // Construction guarantees the code decodes.
        RecordId::new(codec::decode(&self.0).unwrap_or_default())
    }

    /// Generates the full shortened URL based on the provided base URL.
    pub fn to_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.0)
    }

    /// Returns the short code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ShortCode").field(&self.0).finish()
    }
}

impl Display for ShortCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for ShortCode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ShortCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ShortCode::parse(s).map_err(serde::de::Error::custom)
    }
}

impl TryFrom<&str> for ShortCode {
    type Error = CodecError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        ShortCode::parse(value)
    }
}
