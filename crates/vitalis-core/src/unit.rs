//! Organizational units and the professionals assigned to them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{role::UnitType, user::Professional};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Unit {
  pub id:         Uuid,
  pub created_at: DateTime<Utc>,
  pub code:       String,
  pub name:       String,
  pub address:    String,
  #[serde(rename = "type")]
  pub kind:       UnitType,
  pub active:     bool,
}

/// A unit joined with its assigned professionals.
#[derive(Debug, Clone, Serialize)]
pub struct UnitDetails {
  #[serde(flatten)]
  pub unit:          Unit,
  pub professionals: Vec<Professional>,
}

/// Input for unit creation and full update. Every referenced professional
/// must exist; the store rejects the write otherwise.
#[derive(Debug, Clone)]
pub struct NewUnit {
  pub code:          String,
  pub name:          String,
  pub address:       String,
  pub kind:          UnitType,
  pub active:        bool,
  pub professionals: Vec<Uuid>,
}
