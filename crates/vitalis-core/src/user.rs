//! User and sub-profile records.
//!
//! A user owns exactly one sub-profile matching its role; the sub-profile is
//! created in the same transaction as the user and cascade-deleted with it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::role::{ProfessionalType, UserRole};

// ─── Stored records ──────────────────────────────────────────────────────────

/// The base identity record. The password hash never appears here; it only
/// travels on [`UserWithProfile::password_hash`] for credential checks and is
/// never serialised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id:         Uuid,
  pub created_at: DateTime<Utc>,
  pub email:      String,
  pub active:     bool,
  pub role:       UserRole,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Administrator {
  pub id:   Uuid,
  pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professional {
  pub id:         Uuid,
  pub name:       String,
  pub speciality: String,
  #[serde(rename = "type")]
  pub kind:       ProfessionalType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
  pub id:         Uuid,
  pub name:       String,
  pub cpf:        String,
  pub birth_date: NaiveDate,
  pub contact:    String,
}

/// The role-specific extension record attached 1:1 to a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubProfile {
  Administrator(Administrator),
  Professional(Professional),
  Patient(Patient),
}

impl SubProfile {
  pub fn role(&self) -> UserRole {
    match self {
      SubProfile::Administrator(_) => UserRole::Admin,
      SubProfile::Professional(_) => UserRole::Professional,
      SubProfile::Patient(_) => UserRole::Patient,
    }
  }

  /// The display name carried by whichever profile variant this is.
  pub fn name(&self) -> &str {
    match self {
      SubProfile::Administrator(a) => &a.name,
      SubProfile::Professional(p) => &p.name,
      SubProfile::Patient(p) => &p.name,
    }
  }
}

/// A user joined with its sub-profile.
///
/// `password_hash` is populated only by credential-path lookups
/// ([`crate::store::BackOfficeStore::find_active_by_email`] and the password
/// update flow) and is skipped by serde so it can never leak onto the wire.
#[derive(Debug, Clone, Serialize)]
pub struct UserWithProfile {
  #[serde(flatten)]
  pub user:    User,
  pub profile: SubProfile,
  #[serde(skip)]
  pub password_hash: Option<String>,
}

/// One row of a paginated user listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
  pub id:         Uuid,
  pub created_at: DateTime<Utc>,
  pub email:      String,
  pub active:     bool,
  pub role:       UserRole,
  pub name:       String,
}

// ─── Onboarding input ────────────────────────────────────────────────────────

/// Validated input for the onboarding transaction. The password is still
/// plain here; it is hashed inside the persist step, never before.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub email:    String,
  pub password: String,
  pub active:   bool,
  pub profile:  NewSubProfile,
}

impl NewUser {
  pub fn role(&self) -> UserRole {
    match self.profile {
      NewSubProfile::Administrator { .. } => UserRole::Admin,
      NewSubProfile::Professional { .. } => UserRole::Professional,
      NewSubProfile::Patient { .. } => UserRole::Patient,
    }
  }
}

/// Role-specific payload for onboarding. Exactly one variant per role, so a
/// role/profile mismatch cannot reach the store.
#[derive(Debug, Clone)]
pub enum NewSubProfile {
  Administrator {
    name: String,
  },
  Professional {
    name:       String,
    speciality: String,
    kind:       ProfessionalType,
  },
  Patient {
    name:       String,
    cpf:        String,
    birth_date: NaiveDate,
    contact:    String,
  },
}

// ─── Update inputs ───────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AdministratorUpdate {
  pub email: String,
  pub name:  String,
}

#[derive(Debug, Clone)]
pub struct ProfessionalUpdate {
  pub email:      String,
  pub name:       String,
  pub speciality: String,
  pub kind:       ProfessionalType,
}

#[derive(Debug, Clone)]
pub struct PatientUpdate {
  pub email:      String,
  pub name:       String,
  pub cpf:        String,
  pub birth_date: NaiveDate,
  pub contact:    String,
}
