/// Session token generation
use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

/// Token length (before hashing)
const TOKEN_LENGTH: usize = 48;

/// Generate a random opaque session token for the cookie
pub fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a token using SHA-256; only the hash is persisted
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
