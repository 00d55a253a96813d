//! Role and category enums shared across the workspace.
//!
//! Wire names are the SCREAMING_SNAKE_CASE strings consumers expect; the
//! same strings are used as the storage encoding.

use serde::{Deserialize, Serialize};

/// The role a user is created with. Fixed at onboarding; there is no
/// role-change operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
  Admin,
  Professional,
  Patient,
}

impl UserRole {
  pub fn as_str(self) -> &'static str {
    match self {
      UserRole::Admin => "ADMIN",
      UserRole::Professional => "PROFESSIONAL",
      UserRole::Patient => "PATIENT",
    }
  }
}

impl std::str::FromStr for UserRole {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "ADMIN" => Ok(UserRole::Admin),
      "PROFESSIONAL" => Ok(UserRole::Professional),
      "PATIENT" => Ok(UserRole::Patient),
      other => Err(crate::Error::UnknownRole(other.to_owned())),
    }
  }
}

/// Category of a health professional.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProfessionalType {
  Medic,
  Nurse,
  Technician,
}

impl ProfessionalType {
  pub fn as_str(self) -> &'static str {
    match self {
      ProfessionalType::Medic => "MEDIC",
      ProfessionalType::Nurse => "NURSE",
      ProfessionalType::Technician => "TECHNICIAN",
    }
  }
}

impl std::str::FromStr for ProfessionalType {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "MEDIC" => Ok(ProfessionalType::Medic),
      "NURSE" => Ok(ProfessionalType::Nurse),
      "TECHNICIAN" => Ok(ProfessionalType::Technician),
      other => Err(crate::Error::UnknownVariant("professional type", other.to_owned())),
    }
  }
}

/// Category of an organizational unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitType {
  Hospital,
  Clinic,
}

impl UnitType {
  pub fn as_str(self) -> &'static str {
    match self {
      UnitType::Hospital => "HOSPITAL",
      UnitType::Clinic => "CLINIC",
    }
  }
}

impl std::str::FromStr for UnitType {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "HOSPITAL" => Ok(UnitType::Hospital),
      "CLINIC" => Ok(UnitType::Clinic),
      other => Err(crate::Error::UnknownVariant("unit type", other.to_owned())),
    }
  }
}

/// Lifecycle status of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
  Scheduled,
  Completed,
  Canceled,
}

impl AppointmentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      AppointmentStatus::Scheduled => "SCHEDULED",
      AppointmentStatus::Completed => "COMPLETED",
      AppointmentStatus::Canceled => "CANCELED",
    }
  }
}

impl std::str::FromStr for AppointmentStatus {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "SCHEDULED" => Ok(AppointmentStatus::Scheduled),
      "COMPLETED" => Ok(AppointmentStatus::Completed),
      "CANCELED" => Ok(AppointmentStatus::Canceled),
      other => Err(crate::Error::UnknownVariant("appointment status", other.to_owned())),
    }
  }
}

/// Modality of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentType {
  InPerson,
  Remote,
}

impl AppointmentType {
  pub fn as_str(self) -> &'static str {
    match self {
      AppointmentType::InPerson => "IN_PERSON",
      AppointmentType::Remote => "REMOTE",
    }
  }
}

impl std::str::FromStr for AppointmentType {
  type Err = crate::Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "IN_PERSON" => Ok(AppointmentType::InPerson),
      "REMOTE" => Ok(AppointmentType::Remote),
      other => Err(crate::Error::UnknownVariant("appointment type", other.to_owned())),
    }
  }
}
