use crate::models::{CredentialStoreError, User};
use crate::repositories::CredentialRepository;
use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use rand::RngCore;
use rand::rngs::OsRng;
use thiserror::Error;

pub const SESSION_COOKIE: &str = "sessionid";

/// The identity a request acts as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    Anonymous,
    User {
        id: i64,
        username: String,
        is_staff: bool,
    },
}

impl Principal {
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous)
    }

    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::User { is_staff: true, .. })
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self::User {
            id: user.id(),
            username: user.username().to_string(),
            is_staff: user.is_staff(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Retrieve,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const fn is_read(self) -> bool {
        matches!(self, Self::List | Self::Retrieve)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    #[error("Authentication credentials were not provided.")]
    Unauthenticated,
    #[error("You do not have permission to perform this action.")]
    Forbidden,
}

/// Reads are public; writes are reserved to administrators.
pub fn authorize(principal: &Principal, operation: Operation) -> Result<(), AccessDenied> {
    if operation.is_read() || principal.is_admin() {
        Ok(())
    } else if principal.is_anonymous() {
        Err(AccessDenied::Unauthenticated)
    } else {
        Err(AccessDenied::Forbidden)
    }
}

/// Resolves the principal by trying the session cookie, then basic
/// credentials, then an API token. Credentials that do not check out fall
/// through to the next mechanism.
pub async fn authenticate<C>(
    headers: &HeaderMap,
    credentials: &C,
) -> Result<Principal, CredentialStoreError>
where
    C: CredentialRepository + ?Sized,
{
    if let Some(key) = session_key(headers) {
        if let Some(user) = credentials.find_user_by_session(key).await? {
            if user.is_active() {
                return Ok(Principal::from(&user));
            }
        }
        tracing::debug!("ignoring unknown or expired session");
    }

    if let Some((username, password)) = basic_credentials(headers) {
        if let Some(user) = credentials.find_user_by_username(&username).await? {
            if user.is_active() && verify_password(&password, user.password_hash()) {
                return Ok(Principal::from(&user));
            }
        }
        tracing::debug!(%username, "rejected basic credentials");
    }

    if let Some(key) = token_key(headers) {
        if let Some(user) = credentials.find_user_by_token(key).await? {
            if user.is_active() {
                return Ok(Principal::from(&user));
            }
        }
        tracing::debug!("ignoring unknown token");
    }

    Ok(Principal::Anonymous)
}

fn session_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, key)| key.trim_matches('"'))
        .filter(|key| !key.is_empty())
}

fn authorization(headers: &HeaderMap) -> Option<(&str, &str)> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credentials) = value.trim().split_once(' ')?;
    Some((scheme, credentials.trim()))
}

fn basic_credentials(headers: &HeaderMap) -> Option<(String, String)> {
    let (scheme, encoded) = authorization(headers)?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn token_key(headers: &HeaderMap) -> Option<&str> {
    let (scheme, key) = authorization(headers)?;
    let is_token = scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer");
    (is_token && !key.is_empty()).then_some(key)
}

/// Hashes a password with Argon2id for storage.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow::anyhow!("Failed to hash password: {err}"))
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Generates a 256-bit random key, URL-safe base64 encoded.
pub fn generate_key() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}
