//! Handlers for `/users` endpoints. Every route is ADMIN-only.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/users` | Paginated; filters `email`, `name`, `active`, `role` (comma list) |
//! | `POST`   | `/users` | Onboarding; 201 `{"id"}` |
//! | `GET`    | `/users/:id` | Sub-profile joined; 404 if absent |
//! | `POST`   | `/users/:id/activate`, `/users/:id/deactivate` | 204 |
//! | `PUT`    | `/users/administrator/:id` etc. | Per-role profile update |
//! | `PATCH`  | `/users/:id/password` | Requires the old password |
//! | `DELETE` | `/users/:id` | Cascades to the sub-profile |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use vitalis_core::{
  page::Page,
  role::{ProfessionalType, UserRole},
  store::{BackOfficeStore, UserFilter},
  user::{
    AdministratorUpdate, NewSubProfile, NewUser, PatientUpdate,
    ProfessionalUpdate, UserSummary, UserWithProfile,
  },
  validate,
};

use crate::{
  AppState,
  auth::AuthUser,
  error::{ApiError, store_err},
};

const ADMIN_ONLY: &[UserRole] = &[UserRole::Admin];

fn default_true() -> bool {
  true
}

// ─── Onboarding payload ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AdministratorBody {
  pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfessionalBody {
  pub name:       String,
  pub speciality: String,
  #[serde(rename = "type")]
  pub kind:       ProfessionalType,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientBody {
  pub name:       String,
  pub cpf:        String,
  pub birth_date: NaiveDate,
  pub contact:    String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
  pub email:    String,
  pub password: String,
  #[serde(default = "default_true")]
  pub active:   bool,
  pub role:     UserRole,
  /// Optional; an explicit `false` is rejected.
  pub accepted_terms: Option<bool>,
  pub administrator:  Option<AdministratorBody>,
  pub professional:   Option<ProfessionalBody>,
  pub patient:        Option<PatientBody>,
}

impl CreateUserBody {
  /// Full payload validation; all violations are collected and reported
  /// together.
  pub fn validate(self) -> Result<NewUser, ApiError> {
    let CreateUserBody {
      email,
      password,
      active,
      role,
      accepted_terms,
      administrator,
      professional,
      patient,
    } = self;

    let mut violations = Vec::new();
    if accepted_terms == Some(false) {
      violations.push("the terms of use must be accepted".to_owned());
    }
    if !validate::is_email(&email) {
      violations.push("email must be a valid email address".to_owned());
    }
    violations.extend(validate::password_violations(&password));

    let profile = match (role, administrator, professional, patient) {
      (UserRole::Admin, Some(a), None, None) => {
        if a.name.trim().is_empty() {
          violations.push("administrator name must not be empty".to_owned());
        }
        Some(NewSubProfile::Administrator { name: a.name })
      }
      (UserRole::Professional, None, Some(p), None) => {
        if p.name.trim().is_empty() {
          violations.push("professional name must not be empty".to_owned());
        }
        if p.speciality.trim().is_empty() {
          violations.push("speciality must not be empty".to_owned());
        }
        Some(NewSubProfile::Professional {
          name:       p.name,
          speciality: p.speciality,
          kind:       p.kind,
        })
      }
      (UserRole::Patient, None, None, Some(p)) => {
        if p.name.trim().is_empty() {
          violations.push("patient name must not be empty".to_owned());
        }
        if !validate::is_valid_cpf(&p.cpf) {
          violations.push("cpf is not valid".to_owned());
        }
        Some(NewSubProfile::Patient {
          name:       p.name,
          cpf:        p.cpf,
          birth_date: p.birth_date,
          contact:    p.contact,
        })
      }
      _ => {
        violations
          .push("exactly the profile matching the role must be provided".to_owned());
        None
      }
    };

    match profile {
      Some(profile) if violations.is_empty() => Ok(NewUser {
        email,
        password,
        active,
        profile,
      }),
      _ => Err(ApiError::Validation(violations)),
    }
  }
}

// ─── List / read ─────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
  pub page:   Option<u32>,
  pub limit:  Option<u32>,
  pub email:  Option<String>,
  pub name:   Option<String>,
  pub active: Option<bool>,
  /// Comma-separated role list, e.g. `role=ADMIN,PROFESSIONAL`.
  pub role:   Option<String>,
}

fn parse_roles(raw: Option<&str>) -> Result<Vec<UserRole>, ApiError> {
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
  Query(query): Query<ListUsersQuery>,
) -> Result<Json<Page<UserSummary>>, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(ADMIN_ONLY)?;
  let roles = parse_roles(query.role.as_deref())?;
  let page = state
    .store
    .list_users(UserFilter {
      page:   query.page,
      limit:  query.limit,
      email:  query.email,
      name:   query.name,
      active: query.active,
      roles,
    })
    .await
    .map_err(store_err)?;
  Ok(Json(page))
}

pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<Json<UserWithProfile>, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(ADMIN_ONLY)?;
  let user = state
    .store
    .find_user(id)
    .await
    .map_err(store_err)?
    .ok_or_else(|| ApiError::NotFound(format!("user {id} not found")))?;
  Ok(Json(user))
}

// ─── Create ──────────────────────────────────────────────────────────────────

pub async fn create<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Json(body): Json<CreateUserBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(ADMIN_ONLY)?;
  let input = body.validate()?;
  let id = state.store.create_user(input).await.map_err(store_err)?;
  Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

pub async fn activate<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(ADMIN_ONLY)?;
  state
    .store
    .set_user_active(id, true)
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
  auth.require(ADMIN_ONLY)?;
  state
    .store
    .set_user_active(id, false)
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
  auth.require(ADMIN_ONLY)?;
  state.store.delete_user(id).await.map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Per-role profile updates ────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct UpdateAdministratorBody {
  pub email: String,
  pub name:  String,
}

impl UpdateAdministratorBody {
  fn validate(self) -> Result<AdministratorUpdate, ApiError> {
    let mut violations = Vec::new();
    if !validate::is_email(&self.email) {
      violations.push("email must be a valid email address".to_owned());
    }
    if self.name.trim().is_empty() {
      violations.push("administrator name must not be empty".to_owned());
    }
    if !violations.is_empty() {
      return Err(ApiError::Validation(violations));
    }
    Ok(AdministratorUpdate { email: self.email, name: self.name })
  }
}

pub async fn update_administrator<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateAdministratorBody>,
) -> Result<StatusCode, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(ADMIN_ONLY)?;
  let update = body.validate()?;
  state
    .store
    .update_administrator(id, update)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfessionalBody {
  pub email:      String,
  pub name:       String,
  pub speciality: String,
  #[serde(rename = "type")]
  pub kind:       ProfessionalType,
}

impl UpdateProfessionalBody {
  fn validate(self) -> Result<ProfessionalUpdate, ApiError> {
    let mut violations = Vec::new();
    if !validate::is_email(&self.email) {
      violations.push("email must be a valid email address".to_owned());
    }
    if self.name.trim().is_empty() {
      violations.push("professional name must not be empty".to_owned());
    }
    if self.speciality.trim().is_empty() {
      violations.push("speciality must not be empty".to_owned());
    }
    if !violations.is_empty() {
      return Err(ApiError::Validation(violations));
    }
    Ok(ProfessionalUpdate {
      email:      self.email,
      name:       self.name,
      speciality: self.speciality,
      kind:       self.kind,
    })
  }
}

pub async fn update_professional<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdateProfessionalBody>,
) -> Result<StatusCode, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(ADMIN_ONLY)?;
  let update = body.validate()?;
  state
    .store
    .update_professional(id, update)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePatientBody {
  pub email:      String,
  pub name:       String,
  pub cpf:        String,
  pub birth_date: NaiveDate,
  pub contact:    String,
}

impl UpdatePatientBody {
  fn validate(self) -> Result<PatientUpdate, ApiError> {
    let mut violations = Vec::new();
    if !validate::is_email(&self.email) {
      violations.push("email must be a valid email address".to_owned());
    }
    if self.name.trim().is_empty() {
      violations.push("patient name must not be empty".to_owned());
    }
    if !validate::is_valid_cpf(&self.cpf) {
      violations.push("cpf is not valid".to_owned());
    }
    if !violations.is_empty() {
      return Err(ApiError::Validation(violations));
    }
    Ok(PatientUpdate {
      email:      self.email,
      name:       self.name,
      cpf:        self.cpf,
      birth_date: self.birth_date,
      contact:    self.contact,
    })
  }
}

pub async fn update_patient<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
  Json(body): Json<UpdatePatientBody>,
) -> Result<StatusCode, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(ADMIN_ONLY)?;
  let update = body.validate()?;
  state
    .store
    .update_patient(id, update)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Password change ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordBody {
  pub old_password: String,
  pub new_password: String,
}

pub async fn update_password<S>(
  State(state): State<AppState<S>>,
  auth: AuthUser,
  Path(id): Path<Uuid>,
  Json(body): Json<PasswordBody>,
) -> Result<StatusCode, ApiError>
where
  S: BackOfficeStore + Clone + Send + Sync + 'static,
  S::Error: Into<vitalis_core::Error>,
{
  auth.require(ADMIN_ONLY)?;
  let violations = validate::password_violations(&body.new_password);
  if !violations.is_empty() {
    return Err(ApiError::Validation(violations));
  }
  state
    .store
    .update_password(id, body.old_password, body.new_password)
    .await
    .map_err(store_err)?;
  Ok(StatusCode::NO_CONTENT)
}
