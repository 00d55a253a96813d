//! Handlers for `/appointments` endpoints.
//!
//! Reads are for PROFESSIONAL and PATIENT roles; writes are
//! PROFESSIONAL-only.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use vitalis_core::{
  appointment::{
    Appointment, AppointmentDetails, AppointmentUpdate, NewAppointment,
  },
  page::Page,
  role::{AppointmentStatus, AppointmentType, UserRole},
  store::{AppointmentFilter, BackOfficeStore},
};

use crate::{
  AppState,
  auth::AuthUser,
  error::{ApiError, store_err},
};

const CARE_ROLES: &[UserRole] = &[UserRole::Professional, UserRole::Patient];
const PROFESSIONAL_ONLY: &[UserRole] = &[UserRole::Professional];

// ─── Payloads ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentBody {
  pub date: DateTime<Utc>,
  #[serde(rename = "type")]
  pub kind: AppointmentType,
  #[serde(default)]
  pub notes:      String,
  pub medic_id:   Uuid,
  pub patient_id: Uuid,
  pub unit_id:    Uuid,
}

impl From<CreateAppointmentBody> for NewAppointment {
  fn from(body: CreateAppointmentBody) -> Self {
    Self {
      date:       body.date,
      kind:       body.kind,
      notes:      body.notes,
      medic_id:   body.medic_id,
      patient_id: body.patient_id,
      unit_id:    body.unit_id,
    }
  }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAppointmentBody {
  pub date:   DateTime<Utc>,
  pub status: AppointmentStatus,
  #[serde(rename = "type")]
  pub kind: AppointmentType,
  #[serde(default)]
  pub notes:      String,
  pub medic_id:   Uuid,
  pub patient_id: Uuid,
  pub unit_id:    Uuid,
}

impl From<UpdateAppointmentBody> for AppointmentUpdate {
  fn from(body: UpdateAppointmentBody) -> Self {
    Self {
      date:       body.date,
      status:     body.status,
      kind:       body.kind,
      notes:      body.notes,
      medic_id:   body.medic_id,
      patient_id: body.patient_id,
      unit_id:    body.unit_id,
    }
  }
}

// ─── List / read ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListAppointmentsQuery {
  pub page:  Option<u32>,
  pub limit: Option<u32>,
  /// Comma-separated, e.g. `status=SCHEDULED,CANCELED`.
  pub status: Option<String>,
  /// Comma-separated, e.g. `type=IN_PERSON`.
  #[serde(rename = "type")]
  pub kind:       Option<String>,
  pub start_date: Option<DateTime<Utc>>,
  pub end_date:   Option<DateTime<Utc>>,
}

fn parse_list<T>(raw: Option<&str>) -> Result<Vec<T>, ApiError>
where
  T: std::str::FromStr<Err = vitalis_core::Error>,
{
  raw
    .unwrap_or_default()
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(|s| s.parse().map_err(|e: vitalis_core::Error| {
      ApiError::BadRequest(e.to_string())
    }))
    .collect()
}

pub async fn list<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<Page<Appointment>>, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(CARE_ROLES)?;
  let status = parse_list(query.status.as_deref())?;
  let kinds = parse_list(query.kind.as_deref())?;
  let page = state
    .store
    .list_appointments(AppointmentFilter {
      page: query.page,
      limit: query.limit,
      status,
      kinds,
      start_date: query.start_date,
      end_date: query.end_date,
    })
    .await
    .map_err(store_err)?;
  Ok(Json(page))
}

pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<AppointmentDetails>, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(CARE_ROLES)?;
  let appointment = state
    .store
    .appointment_details(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("appointment {id} not found")))?;
  Ok(Json(appointment))
}

// ─── Write ───────────────────────────────────────────────────────────────────

pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Json(body): Json<CreateAppointmentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(PROFESSIONAL_ONLY)?;
  let id = state
    .store
    .create_appointment(body.into())
    .await
    .map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

pub async fn update<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateAppointmentBody>,
) -> Result<StatusCode, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(PROFESSIONAL_ONLY)?;
  state
    .store
    .update_appointment(id, body.into())
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}
