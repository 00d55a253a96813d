//! Appointments between a patient and a medic at a unit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
  role::{AppointmentStatus, AppointmentType},
  unit::Unit,
  user::{Patient, Professional},
};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
  pub id:         Uuid,
  pub created_at: DateTime<Utc>,
  pub date:       DateTime<Utc>,
  pub status:     AppointmentStatus,
  #[serde(rename = "type")]
  pub kind:       AppointmentType,
  pub notes:      String,
  pub medic_id:   Uuid,
  pub patient_id: Uuid,
  pub unit_id:    Uuid,
}

/// An appointment joined with the records it references.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentDetails {
  #[serde(flatten)]
  pub appointment: Appointment,
  pub medic:       Professional,
  pub patient:     Patient,
  pub unit:        Unit,
}

/// Input for appointment creation. The medic must be a professional of type
/// MEDIC; unit and patient must exist.
#[derive(Debug, Clone)]
pub struct NewAppointment {
  pub date:       DateTime<Utc>,
  pub kind:       AppointmentType,
  pub notes:      String,
  pub medic_id:   Uuid,
  pub patient_id: Uuid,
  pub unit_id:    Uuid,
}

/// Input for a full appointment update.
#[derive(Debug, Clone)]
pub struct AppointmentUpdate {
  pub date:       DateTime<Utc>,
  pub status:     AppointmentStatus,
  pub kind:       AppointmentType,
  pub notes:      String,
  pub medic_id:   Uuid,
  pub patient_id: Uuid,
  pub unit_id:    Uuid,
}
