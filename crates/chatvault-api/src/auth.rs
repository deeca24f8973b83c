use std::sync::Arc;

use axum::{Json, extract::State};

use chatvault_auth::AuthFlow;
use chatvault_platform::BridgeClient;
use chatvault_types::api::{
    ConfirmCodeRequest, ConfirmCodeResponse, ConfirmPasswordRequest, ConfirmPasswordResponse,
    SendCodeRequest, SendCodeResponse,
};

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub flow: AuthFlow<BridgeClient>,
}

/// Step 1: send a confirmation code to the user's phone.
pub async fn send_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<SendCodeResponse>, ApiError> {
    state.flow.request_code(&req.init_data, &req.phone).await?;
    Ok(Json(SendCodeResponse { ok: true }))
}

/// Step 2: redeem the confirmation code; may signal that a
/// second-factor password is still required.
pub async fn confirm_code(
    State(state): State<AppState>,
    Json(req): Json<ConfirmCodeRequest>,
) -> Result<Json<ConfirmCodeResponse>, ApiError> {
    let confirmation = state.flow.confirm_code(&req.init_data, &req.code).await?;
    Ok(Json(ConfirmCodeResponse {
        ok: true,
        password_required: confirmation.password_required,
    }))
}

/// Step 3: submit the second-factor password.
pub async fn confirm_password(
    State(state): State<AppState>,
    Json(req): Json<ConfirmPasswordRequest>,
) -> Result<Json<ConfirmPasswordResponse>, ApiError> {
    state
        .flow
        .confirm_password(&req.init_data, &req.password)
        .await?;
    Ok(Json(ConfirmPasswordResponse { ok: true }))
}

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
