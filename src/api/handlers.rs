//! Request handlers for the matching endpoints

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use image::DynamicImage;

use crate::{
    core::imaging,
    error::{AppError, Result},
    state::AppState,
};

use super::responses::{MatchResponse, UrlRequest};

/// POST /api/upload - match products against an uploaded image.
///
/// Expects a multipart form with a `file` field holding the image bytes.
pub async fn match_upload(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<MatchResponse>> {
    let mut contents = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            contents = Some(field.bytes().await?);
        }
    }

    let contents =
        contents.ok_or_else(|| AppError::InvalidInput("no file field in form data".to_string()))?;

    let image = imaging::decode_image(&contents)?;
    respond_with_matches(&state, image).await
}

/// POST /api/url - match products against an image fetched from a URL.
///
/// A missing or blank `url` is rejected before any network access.
pub async fn match_url(
    State(state): State<Arc<AppState>>,
    Json(request): Json<UrlRequest>,
) -> Result<Json<MatchResponse>> {
    let url = request
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::InvalidInput("url is required".to_string()))?;

    let image = imaging::fetch_image(&state.fetcher, url).await?;
    respond_with_matches(&state, image).await
}

/// Shared tail of both entry operations: embed, query the similarity
/// service, and assemble the response envelope.
async fn respond_with_matches(
    state: &AppState,
    image: DynamicImage,
) -> Result<Json<MatchResponse>> {
    // Re-encode before the image moves to the inference thread; the caller
    // gets back the color-normalized copy that was embedded.
    let uploaded_image = imaging::to_jpeg_base64(&image)?;

    // Model inference is compute-bound; keep it off the async workers.
    let encoder = Arc::clone(&state.encoder);
    let embedding = tokio::task::spawn_blocking(move || encoder.embed(&image)).await??;

    let products = state
        .matcher
        .find_similar(
            &embedding.to_vec(),
            state.config.match_limit,
            state.config.match_threshold,
        )
        .await;

    Ok(Json(MatchResponse::new(products, uploaded_image)))
}
