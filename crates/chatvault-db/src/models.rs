/// Row and view types for the ChatVault stores.
///
/// `AccountRow` maps directly to the accounts table (ciphertext columns
/// as stored); `PendingLogin` is the decrypted view handed to the auth
/// state machine.

/// Which step of the login flow a pending row is parked at. Persisted as
/// the `stage` column so the state is an explicit discriminant instead of
/// being inferred from the shape of the session blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginStage {
    CodeRequested,
    PasswordNeeded,
}

impl LoginStage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CodeRequested => "code_requested",
            Self::PasswordNeeded => "password_needed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "code_requested" => Some(Self::CodeRequested),
            "password_needed" => Some(Self::PasswordNeeded),
            _ => None,
        }
    }
}

pub struct AccountRow {
    pub user_id: i64,
    pub session_cipher: String,
    pub is_authenticated: bool,
    pub last_activity: i64,
    pub api_id_cipher: Option<String>,
    pub api_hash_cipher: Option<String>,
}

/// Decrypted pending-login state. `session` is the in-progress,
/// not-yet-authorized session blob; it never appears in logs.
pub struct PendingLogin {
    pub stage: LoginStage,
    pub phone: String,
    pub phone_code_hash: String,
    pub session: String,
}
