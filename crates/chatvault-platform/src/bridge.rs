use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{ApiCredentials, CodeSent, PlatformClient, PlatformError, SignInOutcome};

/// HTTP client for the MTProto bridge sidecar.
///
/// The bridge owns the actual platform connection; each call here is a
/// single request/response, with the session blob carried in the body,
/// so no remote connection is held across HTTP calls to us.
pub struct BridgeClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct SendCodeBody<'a> {
    api_id: i32,
    api_hash: &'a str,
    phone: &'a str,
}

#[derive(Deserialize)]
struct SendCodeReply {
    phone_code_hash: String,
    session: String,
}

#[derive(Serialize)]
struct SignInCodeBody<'a> {
    api_id: i32,
    api_hash: &'a str,
    session: &'a str,
    phone: &'a str,
    code: &'a str,
    phone_code_hash: &'a str,
}

#[derive(Deserialize)]
struct SignInReply {
    session: String,
    #[serde(default)]
    password_needed: bool,
}

#[derive(Serialize)]
struct SignInPasswordBody<'a> {
    api_id: i32,
    api_hash: &'a str,
    session: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct DownloadMediaBody<'a> {
    api_id: i32,
    api_hash: &'a str,
    session: &'a str,
    chat_id: i64,
    message_id: i64,
}

/// Error shape the bridge returns on non-2xx responses.
#[derive(Deserialize)]
struct BridgeError {
    error: String,
    #[serde(default)]
    seconds: Option<u64>,
}

impl BridgeClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    async fn post<B: Serialize, R: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, PlatformError> {
        let url = format!("{}{}", self.base_url.trim_end_matches('/'), path);
        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        if resp.status().is_success() {
            return resp
                .json::<R>()
                .await
                .map_err(|e| PlatformError::Other(format!("bad bridge reply: {e}")));
        }

        let status = resp.status();
        match resp.json::<BridgeError>().await {
            Ok(err) => Err(map_bridge_error(&err)),
            Err(_) => {
                warn!("bridge returned {} with unreadable body", status);
                Err(PlatformError::Other(format!("bridge status {status}")))
            }
        }
    }
}

fn map_bridge_error(err: &BridgeError) -> PlatformError {
    match err.error.as_str() {
        "phone_invalid" => PlatformError::InvalidPhone,
        "code_invalid" => PlatformError::InvalidCode,
        "password_invalid" => PlatformError::InvalidPassword,
        "flood_wait" => PlatformError::FloodWait {
            seconds: err.seconds.unwrap_or(60),
        },
        other => PlatformError::Other(other.to_string()),
    }
}

#[async_trait]
impl PlatformClient for BridgeClient {
    async fn send_code(
        &self,
        creds: &ApiCredentials,
        phone: &str,
    ) -> Result<CodeSent, PlatformError> {
        let reply: SendCodeReply = self
            .post(
                "/session/send_code",
                &SendCodeBody {
                    api_id: creds.api_id,
                    api_hash: &creds.api_hash,
                    phone,
                },
            )
            .await?;
        Ok(CodeSent {
            phone_code_hash: reply.phone_code_hash,
            session: reply.session,
        })
    }

    async fn sign_in_code(
        &self,
        creds: &ApiCredentials,
        session: &str,
        phone: &str,
        code: &str,
        phone_code_hash: &str,
    ) -> Result<SignInOutcome, PlatformError> {
        let reply: SignInReply = self
            .post(
                "/session/sign_in",
                &SignInCodeBody {
                    api_id: creds.api_id,
                    api_hash: &creds.api_hash,
                    session,
                    phone,
                    code,
                    phone_code_hash,
                },
            )
            .await?;
        if reply.password_needed {
            Ok(SignInOutcome::PasswordNeeded {
                session: reply.session,
            })
        } else {
            Ok(SignInOutcome::Authorized {
                session: reply.session,
            })
        }
    }

    async fn sign_in_password(
        &self,
        creds: &ApiCredentials,
        session: &str,
        password: &str,
    ) -> Result<String, PlatformError> {
        let reply: SignInReply = self
            .post(
                "/session/sign_in_password",
                &SignInPasswordBody {
                    api_id: creds.api_id,
                    api_hash: &creds.api_hash,
                    session,
                    password,
                },
            )
            .await?;
        Ok(reply.session)
    }

    async fn download_media(
        &self,
        creds: &ApiCredentials,
        session: &str,
        chat_id: i64,
        message_id: i64,
    ) -> Result<Vec<u8>, PlatformError> {
        let url = format!("{}/media/download", self.base_url.trim_end_matches('/'));
        let resp = self
            .http
            .post(&url)
            .json(&DownloadMediaBody {
                api_id: creds.api_id,
                api_hash: &creds.api_hash,
                session,
                chat_id,
                message_id,
            })
            .send()
            .await
            .map_err(|e| PlatformError::Other(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            return match resp.json::<BridgeError>().await {
                Ok(err) => Err(map_bridge_error(&err)),
                Err(_) => Err(PlatformError::Other(format!("bridge status {status}"))),
            };
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| PlatformError::Other(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}
