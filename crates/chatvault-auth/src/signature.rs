use chatvault_types::AuthError;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Key label fixed by the platform's WebApp signing scheme.
const SECRET_LABEL: &[u8] = b"WebAppData";

/// Verify a signed WebApp payload and extract the caller's user id.
///
/// The payload is a URL query string carrying key/value pairs plus a
/// `hash` field. The expected MAC is recomputed over the newline-joined
/// `key=value` pairs (sorted by key, `hash` excluded) with a key derived
/// as HMAC_SHA256("WebAppData", bot_token), and compared in constant
/// time. Every failure collapses to `InvalidAuthPayload`; the check
/// never partially succeeds.
pub fn verify_init_data(init_data: &str, bot_token: &str) -> Result<i64, AuthError> {
    let mut pairs: Vec<(String, String)> = Vec::new();
    let mut received_hash: Option<String> = None;

    for part in init_data.split('&') {
        if part.is_empty() {
            continue;
        }
        let (key, value) = part.split_once('=').unwrap_or((part, ""));
        let key = decode_component(key)?;
        let value = decode_component(value)?;
        if key == "hash" {
            received_hash = Some(value);
        } else {
            pairs.push((key, value));
        }
    }

    let received_hash = received_hash.ok_or_else(|| invalid("missing hash field"))?;
    let received = hex::decode(&received_hash).map_err(|_| invalid("hash is not hex"))?;

    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    let data_check = pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("\n");

    let secret_key = {
        let mut mac =
            HmacSha256::new_from_slice(SECRET_LABEL).expect("HMAC accepts any key length");
        mac.update(bot_token.as_bytes());
        mac.finalize().into_bytes()
    };

    let mut mac =
        HmacSha256::new_from_slice(&secret_key).expect("HMAC accepts any key length");
    mac.update(data_check.as_bytes());
    // verify_slice is constant-time
    mac.verify_slice(&received)
        .map_err(|_| invalid("signature mismatch"))?;

    let user_json = pairs
        .iter()
        .find(|(k, _)| k == "user")
        .map(|(_, v)| v.as_str())
        .ok_or_else(|| invalid("missing user payload"))?;

    let user: serde_json::Value =
        serde_json::from_str(user_json).map_err(|_| invalid("user payload is not JSON"))?;
    user.get("id")
        .and_then(serde_json::Value::as_i64)
        .ok_or_else(|| invalid("missing user id"))
}

fn invalid(reason: &str) -> AuthError {
    AuthError::InvalidAuthPayload(reason.to_string())
}

fn decode_component(raw: &str) -> Result<String, AuthError> {
    // query-string convention: '+' encodes a space
    let raw = raw.replace('+', " ");
    urlencoding::decode(&raw)
        .map(|cow| cow.into_owned())
        .map_err(|_| invalid("malformed percent-encoding"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOKEN: &str = "12345:TEST-bot-token";

    /// Build a correctly signed init_data string the way the front end
    /// would, from already-decoded pairs.
    fn sign(pairs: &[(&str, &str)], bot_token: &str) -> String {
        let mut sorted: Vec<_> = pairs.to_vec();
        sorted.sort_by_key(|(k, _)| *k);
        let data_check = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("\n");

        let secret_key = {
            let mut mac = HmacSha256::new_from_slice(SECRET_LABEL).unwrap();
            mac.update(bot_token.as_bytes());
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

    fn user_payload(id: i64) -> String {
        format!(r#"{{"id":{id},"first_name":"Ada","language_code":"en"}}"#)
    }

    #[test]
    fn valid_payload_yields_user_id() {
        let user = user_payload(42);
        let init = sign(
            &[("auth_date", "1712000000"), ("query_id", "AAE42"), ("user", &user)],
            TOKEN,
        );
        assert_eq!(verify_init_data(&init, TOKEN).unwrap(), 42);
    }

    #[test]
    fn single_byte_mutation_rejected() {
        let user = user_payload(42);
        let init = sign(
            &[("auth_date", "1712000000"), ("user", &user)],
            TOKEN,
        );
        let mutated = init.replace("1712000000", "1712000001");
        assert!(matches!(
            verify_init_data(&mutated, TOKEN),
            Err(AuthError::InvalidAuthPayload(_))
        ));
    }

    #[test]
    fn wrong_secret_rejected() {
        let user = user_payload(42);
        let init = sign(&[("auth_date", "1712000000"), ("user", &user)], TOKEN);
        assert!(verify_init_data(&init, "other:token").is_err());
    }

    #[test]
    fn missing_hash_rejected() {
        assert!(matches!(
            verify_init_data("auth_date=1712000000&user=%7B%22id%22%3A42%7D", TOKEN),
            Err(AuthError::InvalidAuthPayload(_))
        ));
    }

    #[test]
    fn missing_user_rejected() {
        let init = sign(&[("auth_date", "1712000000")], TOKEN);
        assert!(matches!(
            verify_init_data(&init, TOKEN),
            Err(AuthError::InvalidAuthPayload(_))
        ));
    }

    #[test]
    fn user_without_id_rejected() {
        let init = sign(
            &[("auth_date", "1712000000"), ("user", r#"{"first_name":"Ada"}"#)],
            TOKEN,
        );
        assert!(matches!(
            verify_init_data(&init, TOKEN),
            Err(AuthError::InvalidAuthPayload(_))
        ));
    }
}
