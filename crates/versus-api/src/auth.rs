//! HTTP Basic-auth extractors and standalone verifier.
//!
//! Accounts come from configuration. The authenticated username is the
//! caller's voter id; the account's [`Role`] gates the admin routes.

use argon2::{Argon2, PasswordHash, PasswordVerifier};
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, header, request::Parts};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use serde::{Deserialize, Serialize};
use versus_core::store::BattleStore;

use crate::{AppState, error::ApiError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  #[default]
  Voter,
  Admin,
}

/// One configured login.
#[derive(Clone, Deserialize)]
pub struct Account {
  pub username:      String,
  /// PHC string produced by argon2, e.g. `$argon2id$v=19$…`
  pub password_hash: String,
  #[serde(default)]
  pub role:          Role,
}

/// Credentials accepted as valid for this server instance.
#[derive(Clone, Default)]
pub struct AuthConfig {
  pub accounts: Vec<Account>,
}

impl AuthConfig {
  fn account(&self, username: &str) -> Option<&Account> {
    self.accounts.iter().find(|a| a.username == username)
  }
}

/// Who the request was made by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
  pub username: String,
  pub role:     Role,
}

/// Verify credentials directly from headers.
pub fn verify_auth(headers: &HeaderMap, config: &AuthConfig) -> Result<Identity, ApiError> {
  let header_val = headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .ok_or(ApiError::Unauthorized)?;

  let encoded = header_val
    .strip_prefix("Basic ")
    .ok_or(ApiError::Unauthorized)?;

  let decoded = B64.decode(encoded).map_err(|_| ApiError::Unauthorized)?;
  let creds   = std::str::from_utf8(&decoded).map_err(|_| ApiError::Unauthorized)?;

  let (username, password) = creds.split_once(':').ok_or(ApiError::Unauthorized)?;

  let account = config.account(username).ok_or(ApiError::Unauthorized)?;

  let parsed_hash = PasswordHash::new(&account.password_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Argon2::default()
    .verify_password(password.as_bytes(), &parsed_hash)
    .map_err(|_| ApiError::Unauthorized)?;

  Ok(Identity { username: account.username.clone(), role: account.role })
}

// ─── Extractors ──────────────────────────────────────────────────────────────

/// Any authenticated account. The username is the voter id.
pub struct Voter(pub Identity);

/// An authenticated account with [`Role::Admin`]; other accounts get 403.
pub struct Admin(pub Identity);

/// Anonymous callers are allowed; bad credentials are still rejected.
pub struct MaybeVoter(pub Option<Identity>);

impl<S> FromRequestParts<AppState<S>> for Voter
where
  S: BattleStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    verify_auth(&parts.headers, &state.auth).map(Voter)
  }
}

impl<S> FromRequestParts<AppState<S>> for Admin
where
  S: BattleStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let identity = verify_auth(&parts.headers, &state.auth)?;
    if identity.role != Role::Admin {
      tracing::warn!(username = %identity.username, "admin route refused");
      return Err(ApiError::Forbidden);
    }
    Ok(Admin(identity))
  }
}

impl<S> FromRequestParts<AppState<S>> for MaybeVoter
where
  S: BattleStore + Clone + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    if !parts.headers.contains_key(header::AUTHORIZATION) {
      return Ok(MaybeVoter(None));
    }
    verify_auth(&parts.headers, &state.auth).map(|id| MaybeVoter(Some(id)))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use argon2::{PasswordHasher, password_hash::SaltString};
  use axum::http::HeaderValue;
  use rand_core::OsRng;

  fn hash(password: &str) -> String {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .unwrap()
      .to_string()
  }

  fn config() -> AuthConfig {
    AuthConfig {
      accounts: vec![
        Account { username: "alice".into(), password_hash: hash("secret"), role: Role::Voter },
        Account { username: "root".into(),  password_hash: hash("hunter2"), role: Role::Admin },
      ],
    }
  }

  fn headers(value: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
    headers
  }

  fn basic(user: &str, pass: &str) -> String {
    let encoded = B64.encode(format!("{user}:{pass}"));
    format!("Basic {encoded}")
  }

  #[test]
  fn correct_credentials_yield_identity() {
    let config = config();
    let id = verify_auth(&headers(&basic("alice", "secret")), &config).unwrap();
    assert_eq!(id, Identity { username: "alice".into(), role: Role::Voter });
    let id = verify_auth(&headers(&basic("root", "hunter2")), &config).unwrap();
    assert_eq!(id.role, Role::Admin);
  }

  #[test]
  fn wrong_password() {
    let result = verify_auth(&headers(&basic("alice", "wrong")), &config());
    assert!(matches!(result, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn unknown_user() {
    let result = verify_auth(&headers(&basic("mallory", "secret")), &config());
    assert!(matches!(result, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn missing_header() {
    let result = verify_auth(&HeaderMap::new(), &config());
    assert!(matches!(result, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn invalid_base64() {
    let result = verify_auth(&headers("Basic !!!not-base64!!!"), &config());
    assert!(matches!(result, Err(ApiError::Unauthorized)));
  }

  #[test]
  fn role_defaults_to_voter() {
    let account: Account =
      serde_json::from_str(r#"{"username":"bob","password_hash":"x"}"#).unwrap();
    assert_eq!(account.role, Role::Voter);
  }
}
