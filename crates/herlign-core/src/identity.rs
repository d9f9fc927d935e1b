//! Guest and admin identity helpers.
//!
//! Guests are never stored by raw IP; only a salted SHA-256 of it.

use std::fmt::Write;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use http::HeaderMap;
use sha2::{Digest, Sha256};

use crate::error::CoreError;

/// Returned by [`client_ip`] when no proxy header is present.
pub const UNKNOWN_IP: &str = "unknown";

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().fold(String::with_capacity(64), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

/// Salted hash identifying a guest chat session.
pub fn hash_ip(ip: &str, salt: &str) -> String {
    sha256_hex(format!("{ip}:{salt}").as_bytes())
}

/// Best-effort client address from proxy headers.
///
/// Order: first `x-forwarded-for` hop, `x-real-ip`, `cf-connecting-ip`.
pub fn client_ip(headers: &HeaderMap) -> String {
    header(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .or_else(|| header(headers, "x-real-ip"))
        .or_else(|| header(headers, "cf-connecting-ip"))
        .unwrap_or(UNKNOWN_IP)
        .to_owned()
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

/// Argon2id hash of `password` in PHC string form, salt included.
pub fn hash_password(password: &str) -> Result<String, CoreError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CoreError::PasswordHash(e.to_string()))
}

/// Checks `password` against a stored PHC string. A malformed hash never verifies.
pub fn verify_password(password: &str, phc: &str) -> bool {
    PasswordHash::new(phc)
        .map(|parsed| Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
        .unwrap_or(false)
}
