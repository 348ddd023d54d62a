// Site password gate

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use pairwatch_core::validation;
use serde::{Deserialize, Serialize};

use super::{AppError, AppResult, AppState};

#[derive(Debug, Deserialize)]
pub struct SiteAuthRequest {
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct SiteAuthResponse {
    pub success: bool,
    pub token: String,
}

/// POST /api/site-auth
pub async fn site_auth(
    State(state): State<AppState>,
    payload: Result<Json<SiteAuthRequest>, JsonRejection>,
) -> AppResult<Json<SiteAuthResponse>> {
    let Json(req) = payload?;

    if validation::validate_site_password(&req.password).is_err() {
        return Err(AppError::bad_request("Invalid password format"));
    }

    if !state.site_gate.verify(&req.password).await? {
        tracing::info!("Rejected site password");
        return Err(AppError::unauthorized("Invalid site password"));
    }

    let token = state.tokens.sign_site_token()?;
    Ok(Json(SiteAuthResponse {
        success: true,
        token,
    }))
}
