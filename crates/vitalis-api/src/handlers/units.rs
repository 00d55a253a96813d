//! Handlers for `/units` endpoints. Every route is PROFESSIONAL-only.

use std::collections::HashSet;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use vitalis_core::{
  page::Page,
  role::{UnitType, UserRole},
  store::{BackOfficeStore, UnitFilter},
  unit::{NewUnit, Unit, UnitDetails},
};

use crate::{
  AppState,
  auth::AuthUser,
  error::{ApiError, store_err},
};

const PROFESSIONAL_ONLY: &[UserRole] = &[UserRole::Professional];

fn default_true() -> bool {
  true
}

// ─── Payload ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UnitBody {
  pub code:    String,
  pub name:    String,
  pub address: String,
  #[serde(rename = "type")]
  pub kind:    UnitType,
  #[serde(default = "default_true")]
  pub active:  bool,
  /// Professional profile ids to assign; all must exist.
  #[serde(default)]
  pub professionals: Vec<Uuid>,
}

impl UnitBody {
  fn validate(self) -> Result<NewUnit, ApiError> {
    let mut violations = Vec::new();
    if self.code.trim().is_empty() {
      violations.push("code must not be empty".to_owned());
    }
    if self.name.trim().is_empty() {
      violations.push("name must not be empty".to_owned());
    }
    if self.address.trim().is_empty() {
      violations.push("address must not be empty".to_owned());
    }
    if !violations.is_empty() {
      return Err(ApiError::Validation(violations));
    }
    // A repeated id would trip the assignment table's composite key.
    let mut seen = HashSet::new();
    let mut professionals = self.professionals;
    professionals.retain(|id| seen.insert(*id));
    Ok(NewUnit {
      code:    self.code,
      name:    self.name,
      address: self.address,
      kind:    self.kind,
      active:  self.active,
      professionals,
    })
  }
}

// ─── List / read ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListUnitsQuery {
  pub page:   Option<u32>,
  pub limit:  Option<u32>,
  pub code:   Option<String>,
  pub name:   Option<String>,
  #[serde(rename = "type")]
  pub kind:   Option<UnitType>,
  pub active: Option<bool>,
}

pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Query(query): Query<ListUnitsQuery>,
) -> Result<Json<Page<Unit>>, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(PROFESSIONAL_ONLY)?;
  let page = state
    .store
    .list_units(UnitFilter {
      page:   query.page,
      limit:  query.limit,
      code:   query.code,
      name:   query.name,
      kind:   query.kind,
      active: query.active,
    })
    .await
    .map_err(store_err)?;
  Ok(Json(page))
}

pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<UnitDetails>, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(PROFESSIONAL_ONLY)?;
  let unit = state
    .store
    .unit_details(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("unit {id} not found")))?;
  Ok(Json(unit))
}

// ─── Write ───────────────────────────────────────────────────────────────────

pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Json(body): Json<UnitBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(PROFESSIONAL_ONLY)?;
  let input = body.validate()?;
  let id = state.store.create_unit(input).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
  Json(body): Json<UnitBody>,
) -> Result<StatusCode, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(PROFESSIONAL_ONLY)?;
  let input = body.validate()?;
  state.store.update_unit(id, input).await.map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

pub async fn activate<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(PROFESSIONAL_ONLY)?;
  state
    .store
    .set_unit_active(id, true)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

pub async fn deactivate<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(PROFESSIONAL_ONLY)?;
  state
    .store
    .set_unit_active(id, false)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(PROFESSIONAL_ONLY)?;
  state.store.delete_unit(id).await.map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}
