use serde::Deserialize;

/// Body of `POST /api/v1/short-url`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUrlRequest {
    pub long_url: String,
}
