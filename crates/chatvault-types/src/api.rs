use serde::{Deserialize, Serialize};

// -- Login flow --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SendCodeRequest {
    pub phone: String,
    pub init_data: String,
}

#[derive(Debug, Serialize)]
pub struct SendCodeResponse {
    pub ok: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfirmCodeRequest {
    pub code: String,
    pub init_data: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmCodeResponse {
    pub ok: bool,
    pub password_required: bool,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfirmPasswordRequest {
    pub password: String,
    pub init_data: String,
}

#[derive(Debug, Serialize)]
pub struct ConfirmPasswordResponse {
    pub ok: bool,
}

// -- Errors --

/// Caller-facing error body; `detail` is always an actionable message,
/// never a provider stack trace.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub detail: String,
}
