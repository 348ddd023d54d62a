// Room endpoints: create, seat login and leave

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use pairwatch_core::models::{RoomId, RoomSummary, VideoId};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use super::{AppError, AppResult, AppState, RoomViewer, SiteViewer};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomRequest {
    pub name: Option<String>,
    pub password: Option<String>,
    #[serde(default, deserialize_with = "numeric_id")]
    pub content_id: Option<u64>,
}

/// Accept content ids sent either as numbers or numeric strings
fn numeric_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::Number(id)) => Ok(Some(id)),
        Some(Raw::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom("contentId must be numeric")),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub success: bool,
    pub room_id: RoomId,
    pub name: String,
}

/// POST /api/rooms
pub async fn create_room(
    _viewer: SiteViewer,
    State(state): State<AppState>,
    payload: Result<Json<CreateRoomRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<CreateRoomResponse>)> {
    let Json(req) = payload?;

    let (Some(name), Some(password), Some(content_id)) = (req.name, req.password, req.content_id)
    else {
        return Err(AppError::bad_request("Missing required fields"));
    };

    let room = state
        .rooms
        .create(name.trim(), &password, VideoId(content_id))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(CreateRoomResponse {
            success: true,
            room_id: room.id,
            name: room.name,
        }),
    ))
}

#[derive(Debug, Deserialize)]
pub struct RoomAuthRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RoomAuthResponse {
    pub success: bool,
    pub room: RoomSummary,
    pub token: String,
}

/// POST /api/room-auth
pub async fn room_auth(
    _viewer: SiteViewer,
    State(state): State<AppState>,
    payload: Result<Json<RoomAuthRequest>, JsonRejection>,
) -> AppResult<Json<RoomAuthResponse>> {
    let Json(req) = payload?;

    let name = req.name.trim();
    if name.is_empty() || req.password.is_empty() {
        return Err(AppError::bad_request("Invalid room credentials"));
    }

    let access = state.rooms.authenticate(name, &req.password).await?;

    Ok(Json(RoomAuthResponse {
        success: true,
        room: access.room,
        token: access.token,
    }))
}

/// POST /api/room-leave
///
/// Frees the caller's seat and drops their relay connection, if any.
pub async fn room_leave(viewer: RoomViewer, State(state): State<AppState>) -> AppResult<Json<Value>> {
    let session = state.rooms.leave(&viewer.session.id)?;

    // Closing the outbound queue ends the relay task, which unregisters itself
    state.hub.remove_session(session.room_id, &session.id);

    Ok(Json(json!({ "success": true })))
}
