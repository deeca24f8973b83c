//! End-to-end login-flow scenarios against an in-memory store and a
//! scripted platform fake.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chatvault_auth::AuthFlow;
use chatvault_crypto::CredentialCipher;
use chatvault_crypto::keys::generate_key;
use chatvault_db::Database;
use chatvault_db::models::LoginStage;
use chatvault_platform::{
    ApiCredentials, CodeSent, PlatformClient, PlatformError, SignInOutcome,
};
use chatvault_types::AuthError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

const BOT_TOKEN: &str = "777:FAKE-token";

fn sign_init_data(user_id: i64) -> String {
    type HmacSha256 = Hmac<Sha256>;
    let user = format!(r#"{{"id":{user_id},"first_name":"Test"}}"#);
    let pairs = [("auth_date", "1712000000"), ("user", user.as_str())];

    let mut sorted = pairs.to_vec();
    sorted.sort_by_key(|(k, _)| *k);
    let data_check = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let secret_key = {
        let mut mac = HmacSha256::new_from_slice(b"WebAppData").unwrap();
        mac.update(BOT_TOKEN.as_bytes());
        mac.finalize().into_bytes()
    };
    let mut mac = HmacSha256::new_from_slice(&secret_key).unwrap();
    mac.update(data_check.as_bytes());
    let hash = hex::encode(mac.finalize().into_bytes());

    let mut encoded: Vec<String> = pairs
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect();
    encoded.push(format!("hash={hash}"));
    encoded.join("&")
}

#[derive(Default)]
struct FakeState {
    flood_seconds: Option<u64>,
    seen_api_id: Mutex<Option<i32>>,
    sign_in_calls: AtomicUsize,
}

#[derive(Clone)]
struct FakePlatform {
    correct_code: &'static str,
    password: Option<&'static str>,
    state: Arc<FakeState>,
}

impl FakePlatform {
    fn new(correct_code: &'static str, password: Option<&'static str>) -> Self {
        Self {
            correct_code,
            password,
            state: Arc::new(FakeState::default()),
        }
    }
}

#[async_trait]
impl PlatformClient for FakePlatform {
    async fn send_code(
        &self,
        creds: &ApiCredentials,
        phone: &str,
    ) -> Result<CodeSent, PlatformError> {
        *self.state.seen_api_id.lock().unwrap() = Some(creds.api_id);
        if let Some(seconds) = self.state.flood_seconds {
            return Err(PlatformError::FloodWait { seconds });
        }
        Ok(CodeSent {
            phone_code_hash: "pch-1".into(),
            session: format!("preauth:{phone}"),
        })
    }

    async fn sign_in_code(
        &self,
        _creds: &ApiCredentials,
        session: &str,
        phone: &str,
        code: &str,
        phone_code_hash: &str,
    ) -> Result<SignInOutcome, PlatformError> {
        self.state.sign_in_calls.fetch_add(1, Ordering::SeqCst);
        assert_eq!(session, &format!("preauth:{phone}"));
        assert_eq!(phone_code_hash, "pch-1");
        if code != self.correct_code {
            return Err(PlatformError::InvalidCode);
        }
        if self.password.is_some() {
            Ok(SignInOutcome::PasswordNeeded {
                session: format!("pwstate:{phone}"),
            })
        } else {
            Ok(SignInOutcome::Authorized {
                session: format!("authorized:{phone}"),
            })
        }
    }

    async fn sign_in_password(
        &self,
        _creds: &ApiCredentials,
        session: &str,
        password: &str,
    ) -> Result<String, PlatformError> {
        assert!(session.starts_with("pwstate:"));
        if Some(password) != self.password {
            return Err(PlatformError::InvalidPassword);
        }
        Ok("authorized-2fa".into())
    }

    async fn download_media(
        &self,
        _creds: &ApiCredentials,
        _session: &str,
        _chat_id: i64,
        _message_id: i64,
    ) -> Result<Vec<u8>, PlatformError> {
        Err(PlatformError::Other("not supported by fake".into()))
    }
}

fn flow_with(
    platform: FakePlatform,
) -> (AuthFlow<FakePlatform>, Arc<Database>, Arc<CredentialCipher>) {
    let db = Arc::new(Database::open_in_memory().unwrap());
    let cipher = Arc::new(CredentialCipher::new(&generate_key()));
    let flow = AuthFlow::new(
        db.clone(),
        cipher.clone(),
        platform,
        BOT_TOKEN.into(),
        ApiCredentials {
            api_id: 1000,
            api_hash: "default-hash".into(),
        },
    );
    (flow, db, cipher)
}

#[tokio::test]
async fn confirm_code_without_pending_login_is_hard_error() {
    let (flow, db, _) = flow_with(FakePlatform::new("12345", None));

    let err = flow
        .confirm_code(&sign_init_data(42), "12345")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::NoPendingLogin));
    assert!(db.account(42).unwrap().is_none());
}

#[tokio::test]
async fn forged_payload_never_reaches_the_platform() {
    let (flow, db, cipher) = flow_with(FakePlatform::new("12345", None));

    let err = flow
        .request_code("auth_date=1&hash=deadbeef", "+15551234")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::InvalidAuthPayload(_)));
    assert!(db.pending_login(&cipher, 42).unwrap().is_none());
}

#[tokio::test]
async fn full_login_without_second_factor() {
    let (flow, db, cipher) = flow_with(FakePlatform::new("12345", None));
    let init = sign_init_data(42);

    flow.request_code(&init, "+15551234").await.unwrap();
    let pending = db.pending_login(&cipher, 42).unwrap().unwrap();
    assert_eq!(pending.stage, LoginStage::CodeRequested);
    assert_eq!(pending.phone, "+15551234");

    // wrong code: rejected, pending retained for retry
    let err = flow.confirm_code(&init, "99999").await.unwrap_err();
    assert!(matches!(err, AuthError::ProviderRejected(_)));
    assert!(db.pending_login(&cipher, 42).unwrap().is_some());

    // correct code, with the separators a user pastes in
    let confirmation = flow.confirm_code(&init, " 12 34-5 ").await.unwrap();
    assert!(!confirmation.password_required);
    assert!(db.is_authenticated(42).unwrap());
    assert_eq!(
        db.session(&cipher, 42).unwrap().unwrap(),
        "authorized:+15551234"
    );
    assert!(db.pending_login(&cipher, 42).unwrap().is_none());
}

#[tokio::test]
async fn second_factor_branch_and_password_confirmation() {
    let platform = FakePlatform::new("12345", Some("hunter2"));
    let state = platform.state.clone();
    let (flow, db, cipher) = flow_with(platform);
    let init = sign_init_data(42);

    flow.request_code(&init, "+15551234").await.unwrap();

    let confirmation = flow.confirm_code(&init, "12345").await.unwrap();
    assert!(confirmation.password_required);
    let pending = db.pending_login(&cipher, 42).unwrap().unwrap();
    assert_eq!(pending.stage, LoginStage::PasswordNeeded);
    assert_eq!(pending.session, "pwstate:+15551234");

    // a repeated confirm_code is answered from storage, no provider call
    let calls_before = state.sign_in_calls.load(Ordering::SeqCst);
    let repeat = flow.confirm_code(&init, "12345").await.unwrap();
    assert!(repeat.password_required);
    assert_eq!(state.sign_in_calls.load(Ordering::SeqCst), calls_before);

    // wrong password: rejected, pending retained
    let err = flow.confirm_password(&init, "letmein").await.unwrap_err();
    assert!(matches!(err, AuthError::ProviderRejected(_)));
    assert!(db.pending_login(&cipher, 42).unwrap().is_some());

    flow.confirm_password(&init, "hunter2").await.unwrap();
    assert!(db.is_authenticated(42).unwrap());
    assert_eq!(db.session(&cipher, 42).unwrap().unwrap(), "authorized-2fa");
    assert!(db.pending_login(&cipher, 42).unwrap().is_none());
}

#[tokio::test]
async fn rate_limit_is_surfaced_with_wait_and_leaves_no_state() {
    let mut platform = FakePlatform::new("12345", None);
    platform.state = Arc::new(FakeState {
        flood_seconds: Some(33),
        ..FakeState::default()
    });
    let (flow, db, cipher) = flow_with(platform);

    let err = flow
        .request_code(&sign_init_data(42), "+15551234")
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::ProviderRateLimited { seconds: 33 }));
    assert!(db.pending_login(&cipher, 42).unwrap().is_none());
}

#[tokio::test]
async fn per_user_api_credentials_override_default() {
    let platform = FakePlatform::new("12345", None);
    let state = platform.state.clone();
    let (flow, db, cipher) = flow_with(platform);
    db.save_session(&cipher, 42, "old-session").unwrap();
    db.set_api_credentials(&cipher, 42, 2222, "user-hash").unwrap();

    flow.request_code(&sign_init_data(42), "+15551234")
        .await
        .unwrap();
    assert_eq!(*state.seen_api_id.lock().unwrap(), Some(2222));
}

#[tokio::test]
async fn session_corrupted_by_key_rotation_demands_reauth() {
    let (flow, db, _) = flow_with(FakePlatform::new("12345", None));
    let init = sign_init_data(42);
    flow.request_code(&init, "+15551234").await.unwrap();

    // overwrite the pending ciphertext with one from a different key
    let foreign = CredentialCipher::new(&generate_key());
    let bogus = foreign.encrypt("stale-session").unwrap();
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE pending_logins SET session_cipher = ?1 WHERE user_id = 42",
            [&bogus],
        )?;
        Ok(())
    })
    .unwrap();

    let err = flow.confirm_code(&init, "12345").await.unwrap_err();
    assert!(matches!(err, AuthError::CorruptCredential));
}
