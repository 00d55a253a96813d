//! `GET /health` — liveness, no auth.

use axum::{Json, extract::State};
use serde_json::{Value, json};

use vitalis_core::store::BackOfficeStore;

use crate::AppState;

pub async fn health<S>(State(state): State<AppState<S>>) -> Json<Value>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
{
  let database_up = state.store.ping().await.is_ok();
  Json(json!({
    "status": if database_up { "ok" } else { "degraded" },
    "database": if database_up { "up" } else { "down" },
  }))
}
