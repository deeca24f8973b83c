use std::time::Duration;

use chatvault_platform::{ApiCredentials, PlatformClient, PlatformError};
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

/// Media downloads may hit provider rate limits; unlike the login flow
/// this path is non-interactive, so a small bounded retry with the
/// provider-mandated wait is acceptable here.
const MAX_DOWNLOAD_ATTEMPTS: u32 = 3;

#[derive(Debug, Error)]
pub enum TranscribeError {
    #[error("media download failed: {0}")]
    Download(#[from] PlatformError),
    #[error("transcription request failed: {0}")]
    Http(String),
}

/// Whisper-style transcription client for voice notes.
pub struct Transcriber {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct TranscriptionReply {
    text: String,
}

impl Transcriber {
    pub fn new(endpoint: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: "whisper-large-v3".into(),
        }
    }

    /// Download one voice note and transcribe it.
    pub async fn transcribe_voice<P: PlatformClient>(
        &self,
        platform: &P,
        creds: &ApiCredentials,
        session: &str,
        chat_id: i64,
        message_id: i64,
    ) -> Result<String, TranscribeError> {
        let audio = download_with_retry(platform, creds, session, chat_id, message_id).await?;
        self.transcribe_ogg(audio).await
    }

    pub async fn transcribe_ogg(&self, audio: Vec<u8>) -> Result<String, TranscribeError> {
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name("voice.ogg")
            .mime_str("audio/ogg")
            .map_err(|e| TranscribeError::Http(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscribeError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(TranscribeError::Http(format!(
                "transcription endpoint returned {}",
                resp.status()
            )));
        }

        let reply: TranscriptionReply = resp
            .json()
            .await
            .map_err(|e| TranscribeError::Http(e.to_string()))?;
        Ok(reply.text.trim().to_string())
    }
}

/// Retry flood-waited downloads up to [`MAX_DOWNLOAD_ATTEMPTS`], sleeping
/// the mandated duration between attempts. Any other error, or the final
/// flood wait, is returned to the caller.
pub async fn download_with_retry<P: PlatformClient>(
    platform: &P,
    creds: &ApiCredentials,
    session: &str,
    chat_id: i64,
    message_id: i64,
) -> Result<Vec<u8>, PlatformError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match platform
            .download_media(creds, session, chat_id, message_id)
            .await
        {
            Ok(bytes) => return Ok(bytes),
            Err(PlatformError::FloodWait { seconds }) if attempt < MAX_DOWNLOAD_ATTEMPTS => {
                warn!(
                    "flood wait {seconds}s downloading media (attempt {attempt}/{MAX_DOWNLOAD_ATTEMPTS})"
                );
                tokio::time::sleep(Duration::from_secs(seconds)).await;
            }
            Err(e) => return Err(e),
        }
    }
}
