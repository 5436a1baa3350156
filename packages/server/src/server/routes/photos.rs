//! Photo selection endpoints.

use anyhow::Context;
use axum::{
    extract::{Extension, Path, Query},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::common::{PhotoAlbumId, PhotoId};
use crate::domains::photos::{Photo, PhotoFilter, PhotoListing, PhotoView};
use crate::server::app::AppState;
use crate::server::error::{ApiError, ApiResult};
use crate::server::middleware::RequireAdmin;

const DEFAULT_PHOTO_LIMIT: i64 = 200;
const MAX_PHOTO_LIMIT: i64 = 1000;

#[derive(Debug, Default, Deserialize)]
pub struct PhotoQuery {
    pub view: Option<String>,
    pub album_id: Option<PhotoAlbumId>,
    pub batch_key: Option<String>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct PhotoListResponse {
    pub view: &'static str,
    pub photos: Vec<PhotoListing>,
}

/// GET /api/photos
pub async fn list_photos_handler(
    Extension(state): Extension<AppState>,
    RequireAdmin(_user): RequireAdmin,
    Query(query): Query<PhotoQuery>,
) -> ApiResult<Json<PhotoListResponse>> {
    let view = match query.view.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse::<PhotoView>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
        None => PhotoView::default(),
    };
    let filter = PhotoFilter {
        album_id: query.album_id,
        batch_key: query
            .batch_key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty()),
    };
    let limit = query
        .limit
        .unwrap_or(DEFAULT_PHOTO_LIMIT)
        .clamp(1, MAX_PHOTO_LIMIT);

    let photos = Photo::list(view, &filter, limit, &state.deps.db_pool)
        .await
        .context("Failed to list photos")?;

    Ok(Json(PhotoListResponse {
        view: view.as_str(),
        photos,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CaptionUpdate {
    pub caption: Option<String>,
}

/// PATCH /api/photos/:id/caption
pub async fn update_caption_handler(
    Extension(state): Extension<AppState>,
    RequireAdmin(user): RequireAdmin,
    Path(id): Path<PhotoId>,
    Json(update): Json<CaptionUpdate>,
) -> ApiResult<Json<Photo>> {
    let photo = Photo::update_caption(id, update.caption.as_deref(), &state.deps.db_pool)
        .await
        .context("Failed to update caption")?
        .ok_or_else(|| ApiError::NotFound(format!("Photo {} not found", id)))?;

    tracing::debug!(photo_id = %id, edited_by = %user.user_id, "Caption updated");
    Ok(Json(photo))
}
