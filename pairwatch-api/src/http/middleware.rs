// Bearer token extractors

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use pairwatch_core::{models::RoomSession, service::RoomClaims};

use super::{AppError, AppState};

/// Caller that passed the site password
#[derive(Debug, Clone, Copy)]
pub struct SiteViewer;

/// Caller holding a live seat in a room
#[derive(Debug, Clone)]
pub struct RoomViewer {
    pub claims: RoomClaims,
    pub session: RoomSession,
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::unauthorized("Missing Authorization header"))?;

    header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::unauthorized("Invalid Authorization header format"))
}

impl<S> FromRequestParts<S> for SiteViewer
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts)?;

        app_state
            .tokens
            .verify_site_token(token)
            .map_err(|e| {
                tracing::debug!("Rejected site token: {}", e);
                AppError::unauthorized("Site authentication required")
            })?;

        Ok(Self)
    }
}

impl<S> FromRequestParts<S> for RoomViewer
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let token = bearer_token(parts)?;

        let claims = app_state.tokens.verify_room_token(token).map_err(|e| {
            tracing::debug!("Rejected room token: {}", e);
            AppError::unauthorized("Room authentication required")
        })?;

        // Tokens outlive seats; a pruned or released seat invalidates them
        let session = app_state.rooms.session_for(&claims)?;
        app_state.rooms.touch(&session.id);

        Ok(Self { claims, session })
    }
}
