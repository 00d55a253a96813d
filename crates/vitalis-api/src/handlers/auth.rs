//! `POST /auth/login`.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};

use vitalis_core::{credential, store::BackOfficeStore};

use crate::{
  AppState,
  auth::{self, UserClaims},
  error::{ApiError, store_err},
};

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub email:    String,
  pub password: String,
}

/// `POST /auth/login` — body: `{"email", "password"}`.
///
/// Unknown email, deactivated account and wrong password all produce the
/// identical 401.
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<Value>, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  if body.email.trim().is_empty() || body.password.is_empty() {
    return Err(ApiError::BadRequest(
      "email and password are required".to_owned(),
    ));
  }

  let Some(user) = state
    .store
    .find_active_by_email(body.email)
    .await
    .map_err(store_err)?
  else {
    // Unknown accounts pay the same argon2 cost as a wrong password.
    credential::verify(&body.password, Some(credential::DUMMY_HASH));
    return Err(ApiError::Unauthorized);
  };
  if !credential::verify(&body.password, user.password_hash.as_deref()) {
    return Err(ApiError::Unauthorized);
  }

  let claims = UserClaims::from(&user);
  let token = auth::sign(&state.auth, &claims)?;
  Ok(Json(json!({ "user": claims, "token": token })))
}
