// Signed playback URL for a room's video

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use pairwatch_core::models::RoomId;

use super::{content::UrlResponse, AppResult, AppState, RoomViewer};

/// GET /api/video/{room_id}/{*video_key}
///
/// Keys may contain slashes (uploaded media lives under `media/`).
pub async fn video_url(
    viewer: RoomViewer,
    State(state): State<AppState>,
    path: Result<Path<(u64, String)>, PathRejection>,
) -> AppResult<Json<UrlResponse>> {
    let Path((room_id, video_key)) = path?;

    let url = state
        .rooms
        .video_url(&viewer.claims, RoomId(room_id), &video_key)
        .await?;

    Ok(Json(UrlResponse { success: true, url }))
}
