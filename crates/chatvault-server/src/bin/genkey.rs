//! Print a fresh base64 encryption key for CHATVAULT_ENCRYPTION_KEY.

use chatvault_crypto::keys::{generate_key, key_to_base64};

fn main() {
    println!("{}", key_to_base64(&generate_key()));
}
