/// Opaque random tokens for session cookies and invitation links
///
/// Tokens are base62 strings drawn from `rand::thread_rng()`. Session tokens
/// are only ever stored as their SHA-256 hex digest; invitation tokens are
/// stored as-is because the link itself is the credential an Owner shares.
///
/// # Example
///
/// ```
/// use workbuddy_shared::auth::token::{generate_session_token, hash_token};
///
/// let (token, hash) = generate_session_token();
/// assert_eq!(token.len(), 48);
/// assert_eq!(hash, hash_token(&token));
/// assert_eq!(hash.len(), 64);
/// ```

use rand::Rng;
use sha2::{Digest, Sha256};

/// Length of a session token
pub const SESSION_TOKEN_LENGTH: usize = 48;

/// Length of an invitation token
pub const INVITATION_TOKEN_LENGTH: usize = 32;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

/// Random base62 string of `length` characters
pub fn random_token(length: usize) -> String {
    let mut rng = rand::thread_rng();

    (0..length)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect()
}

/// Generates a session token and the hash to store for it
///
/// Returns `(plaintext_token, sha256_hex)`. Only the plaintext goes into the
/// cookie.
pub fn generate_session_token() -> (String, String) {
    let token = random_token(SESSION_TOKEN_LENGTH);
    let hash = hash_token(&token);
    (token, hash)
}

pub fn generate_invitation_token() -> String {
    random_token(INVITATION_TOKEN_LENGTH)
}

/// Hex-encoded SHA-256 of a token
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// Cheap shape check before touching the database
pub fn is_well_formed_session_token(token: &str) -> bool {
    token.len() == SESSION_TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
