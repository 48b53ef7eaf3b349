use crate::error::{AppError, Result};
use crate::model::CreateUrlRequest;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::response::Redirect;
use axum::Json;
use shrinkray_core::{ShortCode, ShortenedUrl};
use tracing::debug;

const MAX_URL_LENGTH: usize = 2048;

/// Accepts only non-blank absolute `http`/`https` URLs with a host.
fn validate_long_url(raw: &str) -> Result<()> {
    if raw.trim().is_empty() {
        return Err(AppError::InvalidUrl("URL cannot be blank".to_string()));
    }
    if raw.len() > MAX_URL_LENGTH {
        return Err(AppError::InvalidUrl(format!(
            "URL is longer than {MAX_URL_LENGTH} bytes"
        )));
    }

    let parsed = url::Url::parse(raw).map_err(|e| AppError::InvalidUrl(format!("{raw}: {e}")))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(AppError::InvalidUrl(format!(
            "URL scheme must be http or https: {}",
            parsed.scheme()
        )));
    }
    if parsed.host_str().is_none() {
        return Err(AppError::InvalidUrl(format!("URL has no host: {raw}")));
    }
    Ok(())
}

pub async fn create_url_handler(
    State(state): State<AppState>,
    Json(request): Json<CreateUrlRequest>,
) -> Result<Json<ShortenedUrl>> {
    validate_long_url(&request.long_url)?;

    let shortened = state.shortener().shorten(&request.long_url).await?;
    Ok(Json(shortened))
}

pub async fn redirect_handler(
    Path(short_code): Path<String>,
    State(state): State<AppState>,
) -> Result<Redirect> {
    let code = ShortCode::parse(short_code)?;

    match state.shortener().resolve(&code).await? {
        Some(record) => {
            debug!(code = %code, hits = record.hit_count, "redirecting");
            Ok(Redirect::temporary(&record.long_url))
        }
        None => Err(AppError::NotFound(code.to_string())),
    }
}
