//! Encoding/decoding between SQLite rows and domain types.
//!
//! Raw structs hold the stringly-typed column values so row mapping inside
//! `conn.call` closures stays infallible; conversion into domain types (and
//! its error handling) happens outside the closure.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use uuid::Uuid;

use vitalis_core::{
  appointment::Appointment,
  role::UserRole,
  unit::Unit,
  user::{
    Administrator, Patient, Professional, SubProfile, User, UserSummary,
    UserWithProfile,
  },
};

use crate::{Error, Result};

// ─── Scalar helpers ──────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String {
  id.to_string()
}

pub fn decode_uuid(s: &str) -> Result<Uuid> {
  Uuid::parse_str(s).map_err(Error::Uuid)
}

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Users ───────────────────────────────────────────────────────────────────

/// One row of the user-with-profile join (all three sub-profile tables
/// LEFT-joined; at most one side is populated).
pub struct RawUser {
  pub id:            String,
  pub created_at:    String,
  pub email:         String,
  pub active:        bool,
  pub role:          String,
  pub password_hash: Option<String>,

  pub admin_id:   Option<String>,
  pub admin_name: Option<String>,

  pub prof_id:         Option<String>,
  pub prof_name:       Option<String>,
  pub prof_speciality: Option<String>,
  pub prof_type:       Option<String>,

  pub pat_id:         Option<String>,
  pub pat_name:       Option<String>,
  pub pat_cpf:        Option<String>,
  pub pat_birth_date: Option<String>,
  pub pat_contact:    Option<String>,
}

impl RawUser {
  /// Column order must match [`crate::store::USER_JOIN_COLUMNS`].
  pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
    Ok(Self {
      id:            row.get(0)?,
      created_at:    row.get(1)?,
      email:         row.get(2)?,
      active:        row.get(3)?,
      role:          row.get(4)?,
      password_hash: row.get(5)?,

      admin_id:   row.get(6)?,
      admin_name: row.get(7)?,

      prof_id:         row.get(8)?,
      prof_name:       row.get(9)?,
      prof_speciality: row.get(10)?,
      prof_type:       row.get(11)?,

      pat_id:         row.get(12)?,
      pat_name:       row.get(13)?,
      pat_cpf:        row.get(14)?,
      pat_birth_date: row.get(15)?,
      pat_contact:    row.get(16)?,
    })
  }

  pub fn into_user(self) -> Result<UserWithProfile> {
    let id = decode_uuid(&self.id)?;
    let role: UserRole = self.role.parse()?;

    let profile = match (role, self.admin_id, self.prof_id, self.pat_id) {
      (UserRole::Admin, Some(aid), _, _) => {
        SubProfile::Administrator(Administrator {
          id:   decode_uuid(&aid)?,
          name: self.admin_name.unwrap_or_default(),
        })
      }
      (UserRole::Professional, _, Some(pid), _) => {
        SubProfile::Professional(Professional {
          id:         decode_uuid(&pid)?,
          name:       self.prof_name.unwrap_or_default(),
          speciality: self.prof_speciality.unwrap_or_default(),
          kind:       self.prof_type.unwrap_or_default().parse()?,
        })
      }
      (UserRole::Patient, _, _, Some(tid)) => {
        SubProfile::Patient(Patient {
          id:         decode_uuid(&tid)?,
          name:       self.pat_name.unwrap_or_default(),
          cpf:        self.pat_cpf.unwrap_or_default(),
          birth_date: decode_date(&self.pat_birth_date.unwrap_or_default())?,
          contact:    self.pat_contact.unwrap_or_default(),
        })
      }
      _ => return Err(Error::ProfileMissing(id)),
    };

    Ok(UserWithProfile {
      user: User {
        id,
        created_at: decode_dt(&self.created_at)?,
        email: self.email,
        active: self.active,
        role,
      },
      profile,
      password_hash: self.password_hash,
    })
  }
}

/// One row of the paginated user listing.
pub struct RawUserSummary {
  pub id:         String,
  pub created_at: String,
  pub email:      String,
  pub active:     bool,
  pub role:       String,
  pub name:       String,
}

impl RawUserSummary {
  pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      created_at: row.get(1)?,
      email:      row.get(2)?,
      active:     row.get(3)?,
      role:       row.get(4)?,
      name:       row.get(5)?,
    })
  }

  pub fn into_summary(self) -> Result<UserSummary> {
    Ok(UserSummary {
      id:         decode_uuid(&self.id)?,
      created_at: decode_dt(&self.created_at)?,
      email:      self.email,
      active:     self.active,
      role:       self.role.parse()?,
      name:       self.name,
    })
  }
}

// ─── Professionals / patients (standalone rows) ──────────────────────────────

pub struct RawProfessional {
  pub id:         String,
  pub name:       String,
  pub speciality: String,
  pub kind:       String,
}

impl RawProfessional {
  pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      speciality: row.get(2)?,
      kind:       row.get(3)?,
    })
  }

  pub fn into_professional(self) -> Result<Professional> {
    Ok(Professional {
      id:         decode_uuid(&self.id)?,
      name:       self.name,
      speciality: self.speciality,
      kind:       self.kind.parse()?,
    })
  }
}

pub struct RawPatient {
  pub id:         String,
  pub name:       String,
  pub cpf:        String,
  pub birth_date: String,
  pub contact:    String,
}

impl RawPatient {
  pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      name:       row.get(1)?,
      cpf:        row.get(2)?,
      birth_date: row.get(3)?,
      contact:    row.get(4)?,
    })
  }

  pub fn into_patient(self) -> Result<Patient> {
    Ok(Patient {
      id:         decode_uuid(&self.id)?,
      name:       self.name,
      cpf:        self.cpf,
      birth_date: decode_date(&self.birth_date)?,
      contact:    self.contact,
    })
  }
}

// ─── Units ───────────────────────────────────────────────────────────────────

pub struct RawUnit {
  pub id:         String,
  pub created_at: String,
  pub code:       String,
  pub name:       String,
  pub address:    String,
  pub kind:       String,
  pub active:     bool,
}

impl RawUnit {
  pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      created_at: row.get(1)?,
      code:       row.get(2)?,
      name:       row.get(3)?,
      address:    row.get(4)?,
      kind:       row.get(5)?,
      active:     row.get(6)?,
    })
  }

  pub fn into_unit(self) -> Result<Unit> {
    Ok(Unit {
      id:         decode_uuid(&self.id)?,
      created_at: decode_dt(&self.created_at)?,
      code:       self.code,
      name:       self.name,
      address:    self.address,
      kind:       self.kind.parse()?,
      active:     self.active,
    })
  }
}

// ─── Appointments ────────────────────────────────────────────────────────────

pub struct RawAppointment {
  pub id:         String,
  pub created_at: String,
  pub date:       String,
  pub status:     String,
  pub kind:       String,
  pub notes:      String,
  pub medic_id:   String,
  pub patient_id: String,
  pub unit_id:    String,
}

impl RawAppointment {
  pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
    Ok(Self {
      id:         row.get(0)?,
      created_at: row.get(1)?,
      date:       row.get(2)?,
      status:     row.get(3)?,
      kind:       row.get(4)?,
      notes:      row.get(5)?,
      medic_id:   row.get(6)?,
      patient_id: row.get(7)?,
      unit_id:    row.get(8)?,
    })
  }

  pub fn into_appointment(self) -> Result<Appointment> {
    Ok(Appointment {
      id:         decode_uuid(&self.id)?,
      created_at: decode_dt(&self.created_at)?,
      date:       decode_dt(&self.date)?,
      status:     self.status.parse()?,
      kind:       self.kind.parse()?,
      notes:      self.notes,
      medic_id:   decode_uuid(&self.medic_id)?,
      patient_id: decode_uuid(&self.patient_id)?,
      unit_id:    decode_uuid(&self.unit_id)?,
    })
  }
}
