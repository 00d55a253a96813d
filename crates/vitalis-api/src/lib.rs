//! HTTP layer for the Vitalis back office.
//!
//! Exposes an axum [`Router`] backed by any
//! [`vitalis_core::store::BackOfficeStore`]. Authentication is stateless JWT;
//! every route except `/health` and `/auth/login` requires a valid token.

pub mod auth;
pub mod error;
pub mod handlers;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, patch, post, put},
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use vitalis_core::store::BackOfficeStore;

use auth::AuthConfig;
pub use error::ApiError;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_host() -> String {
  "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
  8080
}

fn default_store_path() -> PathBuf {
  PathBuf::from("vitalis.db")
}

fn default_token_expiry() -> i64 {
  3600
}

/// Administrator created at startup when the user table is empty, so a fresh
/// deployment has someone who can log in.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedAdmin {
  pub email:    String,
  pub password: String,
  pub name:     String,
}

/// Runtime server configuration, deserialised from `config.toml` and
/// `VITALIS_*` environment variables.
#[derive(Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  #[serde(default = "default_store_path")]
  pub store_path: PathBuf,

  pub jwt_secret: String,
  #[serde(default = "default_token_expiry")]
  pub token_expiry_secs: i64,

  pub seed_admin: Option<SeedAdmin>,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: BackOfficeStore> {
  pub store: Arc<S>,
  pub auth:  Arc<AuthConfig>,
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the full back-office router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  Router::new()
    .route("/health", get(handlers::health::health::<S>))
    .route("/auth/login", post(handlers::auth::login::<S>))
    // Users (ADMIN)
    .route(
      "/users",
      get(handlers::users::list::<S>).post(handlers::users::create::<S>),
    )
    .route(
      "/users/{id}",
      get(handlers::users::get_one::<S>)
        .delete(handlers::users::delete_one::<S>),
    )
    .route("/users/{id}/activate", post(handlers::users::activate::<S>))
    .route(
      "/users/{id}/deactivate",
      post(handlers::users::deactivate::<S>),
    )
    .route(
      "/users/{id}/password",
      patch(handlers::users::update_password::<S>),
    )
    .route(
      "/users/administrator/{id}",
      put(handlers::users::update_administrator::<S>),
    )
    .route(
      "/users/professional/{id}",
      put(handlers::users::update_professional::<S>),
    )
    .route(
      "/users/patient/{id}",
      put(handlers::users::update_patient::<S>),
    )
    // Units (PROFESSIONAL)
    .route(
      "/units",
      get(handlers::units::list::<S>).post(handlers::units::create::<S>),
    )
    .route(
      "/units/{id}",
      get(handlers::units::get_one::<S>)
        .put(handlers::units::update::<S>)
        .delete(handlers::units::delete_one::<S>),
    )
    .route("/units/{id}/activate", post(handlers::units::activate::<S>))
    .route(
      "/units/{id}/deactivate",
      post(handlers::units::deactivate::<S>),
    )
    // Appointments (PROFESSIONAL reads+writes, PATIENT reads)
    .route(
      "/appointments",
      get(handlers::appointments::list::<S>)
        .post(handlers::appointments::create::<S>),
    )
    .route(
      "/appointments/{id}",
      get(handlers::appointments::get_one::<S>)
        .put(handlers::appointments::update::<S>),
    )
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}
