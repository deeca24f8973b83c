use std::sync::Arc;

use chatvault_crypto::CredentialCipher;
use chatvault_db::Database;
use chatvault_db::models::LoginStage;
use chatvault_platform::{ApiCredentials, PlatformClient, SignInOutcome};
use chatvault_types::AuthError;
use tracing::info;

use crate::signature::verify_init_data;

/// Outcome of the code-confirmation step.
#[derive(Debug)]
pub struct CodeConfirmation {
    pub password_required: bool,
}

/// The three-step login state machine.
///
/// States: no session -> code requested -> (authenticated | password
/// needed) -> authenticated. The current state is one discriminated
/// pending row (or its absence); the account row is the terminal state.
/// Every entry point verifies the signed payload first, and the
/// intermediate session is persisted after each provider interaction.
pub struct AuthFlow<P> {
    db: Arc<Database>,
    cipher: Arc<CredentialCipher>,
    platform: P,
    bot_token: String,
    default_api: ApiCredentials,
}

impl<P: PlatformClient> AuthFlow<P> {
    pub fn new(
        db: Arc<Database>,
        cipher: Arc<CredentialCipher>,
        platform: P,
        bot_token: String,
        default_api: ApiCredentials,
    ) -> Self {
        Self {
            db,
            cipher,
            platform,
            bot_token,
            default_api,
        }
    }

    /// Step 1: ask the platform to send a confirmation code to `phone`.
    ///
    /// The pending row is written last, so a provider failure leaves no
    /// half-written state; a repeat call simply overwrites the slot.
    pub async fn request_code(&self, init_data: &str, phone: &str) -> Result<(), AuthError> {
        let user_id = self.identify(init_data)?;
        info!("send_code requested by user_id={user_id}");

        let creds = self.api_credentials_for(user_id)?;
        let sent = self.platform.send_code(&creds, phone).await?;

        self.db.put_pending_login(
            &self.cipher,
            user_id,
            LoginStage::CodeRequested,
            phone,
            &sent.phone_code_hash,
            &sent.session,
        )?;

        info!("confirmation code sent for user_id={user_id}");
        Ok(())
    }

    /// Step 2: redeem the confirmation code.
    pub async fn confirm_code(
        &self,
        init_data: &str,
        code: &str,
    ) -> Result<CodeConfirmation, AuthError> {
        let user_id = self.identify(init_data)?;
        info!("confirm_code from user_id={user_id}");

        let pending = self
            .db
            .pending_login(&self.cipher, user_id)?
            .ok_or(AuthError::NoPendingLogin)?;

        if pending.stage == LoginStage::PasswordNeeded {
            // Repeat of step 2 after the second factor was already
            // signalled; the stored state is still valid for step 3.
            return Ok(CodeConfirmation {
                password_required: true,
            });
        }

        let creds = self.api_credentials_for(user_id)?;
        let code = normalize_code(code);
        let outcome = self
            .platform
            .sign_in_code(
                &creds,
                &pending.session,
                &pending.phone,
                &code,
                &pending.phone_code_hash,
            )
            .await?;

        match outcome {
            SignInOutcome::Authorized { session } => {
                self.finalize(user_id, &session)?;
                info!("user_id={user_id} authenticated (no second factor)");
                Ok(CodeConfirmation {
                    password_required: false,
                })
            }
            SignInOutcome::PasswordNeeded { session } => {
                // The session advanced to the password-needed state;
                // re-persist it under the same slot for step 3.
                self.db.put_pending_login(
                    &self.cipher,
                    user_id,
                    LoginStage::PasswordNeeded,
                    &pending.phone,
                    &pending.phone_code_hash,
                    &session,
                )?;
                info!("user_id={user_id} requires second-factor password");
                Ok(CodeConfirmation {
                    password_required: true,
                })
            }
        }
    }

    /// Step 3: submit the second-factor password.
    pub async fn confirm_password(
        &self,
        init_data: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        let user_id = self.identify(init_data)?;
        info!("confirm_password from user_id={user_id}");

        let pending = self
            .db
            .pending_login(&self.cipher, user_id)?
            .ok_or(AuthError::NoPendingLogin)?;

        let creds = self.api_credentials_for(user_id)?;
        let session = self
            .platform
            .sign_in_password(&creds, &pending.session, password)
            .await?;

        self.finalize(user_id, &session)?;
        info!("user_id={user_id} authenticated (with second factor)");
        Ok(())
    }

    fn identify(&self, init_data: &str) -> Result<i64, AuthError> {
        verify_init_data(init_data, &self.bot_token)
    }

    /// Per-user API credentials when the account carries them, the
    /// process-wide default otherwise.
    fn api_credentials_for(&self, user_id: i64) -> Result<ApiCredentials, AuthError> {
        match self.db.api_credentials(&self.cipher, user_id)? {
            Some((api_id, api_hash)) => Ok(ApiCredentials { api_id, api_hash }),
            None => Ok(self.default_api.clone()),
        }
    }

    /// Persist the authorized session and close out the pending login.
    fn finalize(&self, user_id: i64, session: &str) -> Result<(), AuthError> {
        self.db.save_session(&self.cipher, user_id, session)?;
        self.db.set_authenticated(user_id, true)?;
        self.db.delete_pending_login(user_id)?;
        Ok(())
    }
}

/// Strip whitespace and separators users paste along with the code.
fn normalize_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect()
}
