use crate::error::{AuthError, ConfigError, Error};
use aws_lc_rs::pbkdf2;
use std::num::NonZeroU32;
use tokio::task;

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

///
/// Hash a password with a fresh random salt
///
/// Encoded as `pbkdf2-sha256$<iterations>$<hex salt>$<hex hash>`
///
pub fn hash_password(password: &str, iterations: u32) -> Result<String, Error> {
    let rounds = NonZeroU32::new(iterations).ok_or_else(|| ConfigError::InvalidParameter {
        name: "auth.hash_iterations".to_string(),
        value: iterations.to_string(),
    })?;

    let salt: [u8; SALT_LEN] = rand::random();
    let mut hash = [0u8; HASH_LEN];
    pbkdf2::derive(
        pbkdf2::PBKDF2_HMAC_SHA256,
        rounds,
        &salt,
        password.as_bytes(),
        &mut hash,
    );

    Ok(format!(
        "{SCHEME}${iterations}${}${}",
        hex::encode(salt),
        hex::encode(hash)
    ))
}

///
/// Check a password against an encoded hash
///
/// The comparison is constant time. A hash that cannot be decoded is an error,
/// a wrong password is `Ok(false)`.
///
pub fn verify_password(password: &str, encoded: &str) -> Result<bool, Error> {
    let mut parts = encoded.split('$');

    let (Some(SCHEME), Some(iterations), Some(salt), Some(hash), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return Err(AuthError::MalformedHash.into());
    };

    let rounds = iterations
        .parse::<u32>()
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(AuthError::MalformedHash)?;
    let salt = hex::decode(salt).map_err(|_| AuthError::MalformedHash)?;
    let hash = hex::decode(hash).map_err(|_| AuthError::MalformedHash)?;

    let verified = pbkdf2::verify(
        pbkdf2::PBKDF2_HMAC_SHA256,
        rounds,
        &salt,
        password.as_bytes(),
        &hash,
    );

    Ok(verified.is_ok())
}

///
/// `hash_password` on the blocking pool, hashing costs tens of milliseconds
///
pub async fn hash_password_in_background(
    password: &str,
    iterations: u32,
) -> Result<String, Error> {
    let password = password.to_owned();
    task::spawn_blocking(move || hash_password(&password, iterations))
        .await
        .map_err(AuthError::from)?
}

/// `verify_password` on the blocking pool
pub async fn verify_password_in_background(password: &str, encoded: &str) -> Result<bool, Error> {
    let (password, encoded) = (password.to_owned(), encoded.to_owned());
    task::spawn_blocking(move || verify_password(&password, &encoded))
        .await
        .map_err(AuthError::from)?
}
