//! Error types for `vitalis-core`.
//!
//! The variants carry the domain taxonomy: conflicts on unique fields,
//! not-founds per entity, credential failures. Storage backends wrap their
//! infrastructure errors in [`Error::Backend`] so callers see one type.

use thiserror::Error;
use uuid::Uuid;

use crate::role::UserRole;

#[derive(Debug, Error)]
pub enum Error {
  // ── Conflicts (unique fields) ─────────────────────────────────────────
  #[error("a user with the email {0} already exists")]
  EmailTaken(String),

  #[error("a patient with the cpf {0} already exists")]
  CpfTaken(String),

  #[error("a professional with the name {0} already exists")]
  ProfessionalNameTaken(String),

  #[error("a unit with the code {0} already exists")]
  UnitCodeTaken(String),

  // ── Not found ─────────────────────────────────────────────────────────
  #[error("user {0} not found")]
  UserNotFound(Uuid),

  #[error("{role} {1} not found", role = .0.as_str().to_lowercase())]
  ProfileNotFound(UserRole, Uuid),

  #[error("unit {0} not found")]
  UnitNotFound(Uuid),

  #[error("patient {0} not found")]
  PatientNotFound(Uuid),

  #[error("medic {0} not found")]
  MedicNotFound(Uuid),

  #[error("some professionals were not found: {}", format_ids(.0))]
  ProfessionalsNotFound(Vec<Uuid>),

  #[error("appointment {0} not found")]
  AppointmentNotFound(Uuid),

  // ── Credentials / payload ─────────────────────────────────────────────
  #[error("the old password is incorrect")]
  PasswordMismatch,

  #[error("password hashing failed: {0}")]
  Hash(String),

  #[error("unknown role: {0}")]
  UnknownRole(String),

  #[error("unknown {0}: {1}")]
  UnknownVariant(&'static str, String),

  // ── Infrastructure ────────────────────────────────────────────────────
  #[error("storage error: {0}")]
  Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

fn format_ids(ids: &[Uuid]) -> String {
  ids
    .iter()
    .map(Uuid::to_string)
    .collect::<Vec<_>>()
    .join(", ")
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn messages_with_format_arguments_render() {
    let id = Uuid::nil();
    assert_eq!(
      Error::ProfileNotFound(UserRole::Professional, id).to_string(),
      format!("professional {id} not found"),
    );
    assert_eq!(
      Error::ProfessionalsNotFound(vec![id, id]).to_string(),
      format!("some professionals were not found: {id}, {id}"),
    );
  }
}
