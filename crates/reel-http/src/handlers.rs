use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use reel_core::{
    config::{Config, Credentials},
    domain::ResolvedMedia,
    errors::Error,
    media::filter_by_caption,
    pipeline::collect_channel_media,
    ports::FileLocator,
    Result,
};
use reel_telegram::TelegramBotApi;

use crate::{error::ApiError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct VideosQuery {
    /// Optional case-insensitive caption filter.
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideosResponse {
    pub videos: Vec<ResolvedMedia>,
}

/// `/api/getVideos`: preflight, method check, config check, then the pipeline.
///
/// Exactly one response per request; the success shape is always
/// `{ "videos": [...] }`. The query string is only looked at once the request
/// is known to be a configured GET.
pub async fn get_videos(
    State(state): State<AppState>,
    method: Method,
    query: std::result::Result<Query<VideosQuery>, QueryRejection>,
) -> Response {
    if method == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }

    if method != Method::GET {
        return ApiError(Error::MethodNotAllowed(method.to_string())).into_response();
    }

    let creds = match state.cfg.credentials() {
        Ok(c) => c,
        Err(e) => return ApiError(e).into_response(),
    };

    let query = match query {
        Ok(Query(q)) => q,
        Err(rejection) => {
            return ApiError(Error::BadRequest(rejection.body_text())).into_response();
        }
    };

    match list_videos(&state.cfg, creds, query.q.as_deref()).await {
        Ok(videos) => {
            tracing::info!(videos = videos.len(), "serving video list");
            Json(VideosResponse { videos }).into_response()
        }
        Err(e) => ApiError(e).into_response(),
    }
}

async fn list_videos(
    cfg: &Config,
    creds: Credentials,
    query: Option<&str>,
) -> Result<Vec<ResolvedMedia>> {
    let api = Arc::new(TelegramBotApi::from_config(cfg, creds)?);
    let locator: Arc<dyn FileLocator> = api.clone();
    let videos = collect_channel_media(api.as_ref(), locator).await?;

    Ok(match query {
        Some(q) => filter_by_caption(videos, q),
        None => videos,
    })
}
