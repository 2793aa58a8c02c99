//! Token authentication.
//!
//! Tokens are issued elsewhere; a request presents one as
//! `Authorization: Token <key>`. Other schemes are left to other layers and
//! the request is treated as anonymous.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use sha2::Sha256;
use tracing::debug;
use uuid::Uuid;

use crate::{database::models::user::User, error::AppError, state::AppState};

const SCHEME: &str = "Token";
const ALGORITHM: &str = "pbkdf2_sha256";

fn derive(password: &str, salt: &str, iterations: u32) -> String {
    let mut key = [0u8; 32];
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    STANDARD.encode(key)
}

/// Stored form of a password, `pbkdf2_sha256$<iterations>$<salt>$<hash>`.
///
/// Every call draws a fresh salt, so equal passwords never share a hash.
pub fn hash_password(password: &str, iterations: u32) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let hash = derive(password, &salt, iterations);
    format!("{ALGORITHM}${iterations}${salt}${hash}")
}

fn token_key(parts: &Parts) -> Result<Option<String>, AppError> {
    let Some(header) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let header = header
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid token header."))?;

    let mut words = header.split_whitespace();
    match words.next() {
        Some(scheme) if scheme.eq_ignore_ascii_case(SCHEME) => {}
        _ => return Ok(None),
    }

    match (words.next(), words.next()) {
        (Some(key), None) => Ok(Some(key.to_string())),
        _ => Err(AppError::Unauthorized("Invalid token header.")),
    }
}

/// The requesting user, if any.
pub struct Viewer(pub Option<User>);

impl FromRequestParts<Arc<AppState>> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let Some(key) = token_key(parts)? else {
            return Ok(Viewer(None));
        };

        let user = state
            .run(move |store| Ok(store.user_by_token(&key)?))
            .await?
            .ok_or(AppError::Unauthorized("Invalid token."))?;
        debug!("Authenticated {}", user.username);

        Ok(Viewer(Some(user)))
    }
}

/// The requesting user; anonymous requests are rejected with 401.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match Viewer::from_request_parts(parts, state).await? {
            Viewer(Some(user)) => Ok(CurrentUser(user)),
            Viewer(None) => Err(AppError::Unauthorized(AppError::NOT_AUTHENTICATED)),
        }
    }
}
