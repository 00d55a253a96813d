//! JWT signing/verification and the [`AuthUser`] extractor.
//!
//! Tokens are stateless HS256. The extractor verifies signature and expiry,
//! then re-loads the user by id so deactivation takes effect before the
//! token expires.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::Utc;
use jsonwebtoken::{
  Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use vitalis_core::{
  role::UserRole,
  store::BackOfficeStore,
  user::{Administrator, Patient, Professional, SubProfile, UserWithProfile},
};

use crate::{AppState, error::{ApiError, store_err}};

// ─── Configuration ───────────────────────────────────────────────────────────

/// Token signing material and lifetime, built once at startup.
pub struct AuthConfig {
  encoding:        EncodingKey,
  decoding:        DecodingKey,
  pub expiry_secs: i64,
}

impl AuthConfig {
  pub fn new(secret: &str, expiry_secs: i64) -> Self {
    Self {
      encoding: EncodingKey::from_secret(secret.as_bytes()),
      decoding: DecodingKey::from_secret(secret.as_bytes()),
      expiry_secs,
    }
  }
}

// ─── Claims ──────────────────────────────────────────────────────────────────

/// The public-safe user payload embedded in the token and echoed by login.
/// Exactly one of the three profile fields is present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserClaims {
  pub id:     Uuid,
  pub email:  String,
  pub active: bool,
  pub role:   UserRole,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub administrator: Option<Administrator>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub professional: Option<Professional>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub patient: Option<Patient>,
}

impl From<&UserWithProfile> for UserClaims {
  fn from(user: &UserWithProfile) -> Self {
    let mut claims = Self {
      id:            user.user.id,
      email:         user.user.email.clone(),
      active:        user.user.active,
      role:          user.user.role,
      administrator: None,
      professional:  None,
      patient:       None,
    };
    match &user.profile {
      SubProfile::Administrator(a) => claims.administrator = Some(a.clone()),
      SubProfile::Professional(p) => claims.professional = Some(p.clone()),
      SubProfile::Patient(p) => claims.patient = Some(p.clone()),
    }
    claims
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
  #[serde(flatten)]
  pub user: UserClaims,
  pub iat:  i64,
  pub exp:  i64,
}

// ─── Signing / verification ──────────────────────────────────────────────────

/// Sign a token for `user` valid from now for the configured lifetime.
pub fn sign(auth: &AuthConfig, user: &UserClaims) -> Result<String, ApiError> {
  let now = Utc::now().timestamp();
  sign_claims(auth, user, now, now + auth.expiry_secs)
}

pub(crate) fn sign_claims(
  auth: &AuthConfig,
  user: &UserClaims,
  iat: i64,
  exp: i64,
) -> Result<String, ApiError> {
  let claims = Claims { user: user.clone(), iat, exp };
  encode(&Header::default(), &claims, &auth.encoding)
    .map_err(|e| ApiError::Internal(Box::new(e)))
}

/// Verify signature and expiry; any failure is a uniform 401.
fn decode_token(auth: &AuthConfig, token: &str) -> Result<Claims, ApiError> {
  let mut validation = Validation::new(Algorithm::HS256);
  // no leeway, so expiry is exact
  validation.leeway = 0;
  decode::<Claims>(token, &auth.decoding, &validation)
    .map(|data| data.claims)
    .map_err(|_| ApiError::Unauthorized)
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated user, freshly loaded from the store.
pub struct AuthUser(pub UserWithProfile);

impl AuthUser {
  /// 403 unless the caller's role is in `allowed`.
  pub fn require(&self, allowed: &[UserRole]) -> Result<(), ApiError> {
    if allowed.contains(&self.0.user.role) {
      Ok(())
    } else {
      Err(ApiError::Forbidden)
    }
  }
}

impl<S> FromRequestParts<AppState<S>> for AuthUser
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    let header = parts
      .headers
      .get(axum::http::header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .ok_or(ApiError::Unauthorized)?;
    let token = header.strip_prefix("Bearer ").ok_or(ApiError::Unauthorized)?;

    let claims = decode_token(&state.auth, token)?;

    // The token may outlive the account's state; the store is authoritative.
    let user = state
      .store
      .find_user(claims.user.id)
      .await
      .map_err(store_err)?
      .ok_or(ApiError::Unauthorized)?;
    if !user.user.active {
      return Err(ApiError::Unauthorized);
    }
    Ok(AuthUser(user))
  }
}
