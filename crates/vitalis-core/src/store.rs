//! The `BackOfficeStore` trait and supporting query types.
//!
//! The trait is implemented by storage backends (e.g.
//! `vitalis-store-sqlite`). The HTTP layer depends on this abstraction, not
//! on any concrete backend.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  appointment::{
    Appointment, AppointmentDetails, AppointmentUpdate, NewAppointment,
  },
  page::Page,
  role::{AppointmentStatus, AppointmentType, UnitType, UserRole},
  unit::{NewUnit, Unit, UnitDetails},
  user::{
    AdministratorUpdate, NewUser, PatientUpdate, ProfessionalUpdate,
    UserSummary, UserWithProfile,
  },
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Parameters for [`BackOfficeStore::list_users`]. Text filters are
/// substring matches; `active` defaults to `true` when unset.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
  pub page:   Option<u32>,
  pub limit:  Option<u32>,
  pub email:  Option<String>,
  pub name:   Option<String>,
  pub active: Option<bool>,
  pub roles:  Vec<UserRole>,
}

/// Parameters for [`BackOfficeStore::list_units`].
#[derive(Debug, Clone, Default)]
pub struct UnitFilter {
  pub page:   Option<u32>,
  pub limit:  Option<u32>,
  pub code:   Option<String>,
  pub name:   Option<String>,
  pub kind:   Option<UnitType>,
  pub active: Option<bool>,
}

/// Parameters for [`BackOfficeStore::list_appointments`].
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
  pub page:       Option<u32>,
  pub limit:      Option<u32>,
  pub status:     Vec<AppointmentStatus>,
  pub kinds:      Vec<AppointmentType>,
  pub start_date: Option<DateTime<Utc>>,
  pub end_date:   Option<DateTime<Utc>>,
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the back-office relational store.
///
/// Writes that span several rows (onboarding, unit assignment) are atomic:
/// the backend applies the whole unit or none of it. Uniqueness of
/// email/cpf/professional name/unit code is ultimately enforced by the
/// backend's constraints; pre-checks in the implementations are a fail-fast
/// optimisation, not the safety mechanism.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait BackOfficeStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Onboard a user: persist the base row (hashing the password inside
  /// this step) and its role-matching sub-profile in one transaction.
  /// Returns only the new user's id.
  fn create_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + '_;

  /// Load an *active* user by email with its sub-profile joined and the
  /// password hash populated. Returns `None` for unknown emails and for
  /// deactivated accounts alike.
  fn find_active_by_email(
    &self,
    email: String,
  ) -> impl Future<Output = Result<Option<UserWithProfile>, Self::Error>> + Send + '_;

  /// Load a user by id with its sub-profile joined. The password hash is
  /// not populated.
  fn find_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<UserWithProfile>, Self::Error>> + Send + '_;

  /// Paginated, filtered user listing ordered by creation time descending.
  fn list_users(
    &self,
    filter: UserFilter,
  ) -> impl Future<Output = Result<Page<UserSummary>, Self::Error>> + Send + '_;

  /// Toggle the `active` flag. Errors if the user does not exist.
  fn set_user_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Update an administrator's email and name.
  fn update_administrator(
    &self,
    id: Uuid,
    update: AdministratorUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Update a professional's email and profile fields.
  fn update_professional(
    &self,
    id: Uuid,
    update: ProfessionalUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Update a patient's email and profile fields.
  fn update_patient(
    &self,
    id: Uuid,
    update: PatientUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Change a user's password after verifying the old one. The new value
  /// is hashed inside this step.
  fn update_password(
    &self,
    id: Uuid,
    old_password: String,
    new_password: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a user; the sub-profile row goes with it (cascade).
  fn delete_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Units ─────────────────────────────────────────────────────────────

  /// Create a unit with its professional assignments in one transaction.
  fn create_unit(
    &self,
    input: NewUnit,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + '_;

  fn list_units(
    &self,
    filter: UnitFilter,
  ) -> impl Future<Output = Result<Page<Unit>, Self::Error>> + Send + '_;

  fn unit_details(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<UnitDetails>, Self::Error>> + Send + '_;

  fn set_unit_active(
    &self,
    id: Uuid,
    active: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Replace a unit's fields and its professional assignments atomically.
  fn update_unit(
    &self,
    id: Uuid,
    input: NewUnit,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn delete_unit(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Appointments ──────────────────────────────────────────────────────

  /// Schedule an appointment. Unit and patient must exist; the medic must
  /// be a professional of type MEDIC.
  fn create_appointment(
    &self,
    input: NewAppointment,
  ) -> impl Future<Output = Result<Uuid, Self::Error>> + Send + '_;

  fn list_appointments(
    &self,
    filter: AppointmentFilter,
  ) -> impl Future<Output = Result<Page<Appointment>, Self::Error>> + Send + '_;

  fn appointment_details(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<AppointmentDetails>, Self::Error>> + Send + '_;

  fn update_appointment(
    &self,
    id: Uuid,
    update: AppointmentUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Health ────────────────────────────────────────────────────────────

  /// Cheap liveness probe against the backing database.
  fn ping(&self) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
