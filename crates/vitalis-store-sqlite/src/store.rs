//! [`SqliteStore`] — the SQLite implementation of [`BackOfficeStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, params, params_from_iter, types::Value};
use uuid::Uuid;

use vitalis_core::{
  Error as CoreError, credential,
  appointment::{
    Appointment, AppointmentDetails, AppointmentUpdate, NewAppointment,
  },
  page::{DEFAULT_LIMIT, DEFAULT_PAGE, Page, Pagination},
  role::{ProfessionalType, UserRole},
  store::{
    AppointmentFilter, BackOfficeStore, UnitFilter, UserFilter,
  },
  unit::{NewUnit, Unit, UnitDetails},
  user::{
    AdministratorUpdate, NewSubProfile, NewUser, PatientUpdate,
    ProfessionalUpdate, SubProfile, UserSummary, UserWithProfile,
  },
};

use crate::{
  Error, Result,
  encode::{
    RawAppointment, RawPatient, RawProfessional, RawUnit, RawUser,
    RawUserSummary, encode_date, encode_dt, encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Query fragments ─────────────────────────────────────────────────────────

/// Column list consumed by [`RawUser::from_row`]; order matters.
pub(crate) const USER_JOIN_COLUMNS: &str = "
  u.user_id, u.created_at, u.email, u.active, u.role, u.password_hash,
  a.administrator_id, a.name,
  p.professional_id, p.name, p.speciality, p.type,
  t.patient_id, t.name, t.cpf, t.birth_date, t.contact";

const USER_JOIN_FROM: &str = "
  FROM users u
  LEFT JOIN administrators a ON a.user_id = u.user_id
  LEFT JOIN professionals p  ON p.user_id = u.user_id
  LEFT JOIN patients t       ON t.user_id = u.user_id";

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Vitalis back-office store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Fail-fast uniqueness pre-checks ───────────────────────────────────
  //
  // These run before the write transaction opens. The UNIQUE constraints
  // remain the arbiter under races; see `unique_violation`.

  async fn email_taken(&self, email: String, besides: Option<Uuid>) -> Result<bool> {
    let besides = besides.map(encode_uuid).unwrap_or_default();
    let taken = self
      .conn
      .call(move |conn| {
        let found: bool = conn
          .query_row(
            "SELECT 1 FROM users WHERE email = ?1 AND user_id != ?2",
            params![email, besides],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        Ok(found)
      })
      .await?;
    Ok(taken)
  }

  async fn cpf_taken(&self, cpf: String, besides: Option<Uuid>) -> Result<bool> {
    let besides = besides.map(encode_uuid).unwrap_or_default();
    let taken = self
      .conn
      .call(move |conn| {
        let found: bool = conn
          .query_row(
            "SELECT 1 FROM patients WHERE cpf = ?1 AND user_id != ?2",
            params![cpf, besides],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        Ok(found)
      })
      .await?;
    Ok(taken)
  }

  async fn unit_code_taken(&self, code: String, besides: Option<Uuid>) -> Result<bool> {
    let besides = besides.map(encode_uuid).unwrap_or_default();
    let taken = self
      .conn
      .call(move |conn| {
        let found: bool = conn
          .query_row(
            "SELECT 1 FROM units WHERE code = ?1 AND unit_id != ?2",
            params![code, besides],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        Ok(found)
      })
      .await?;
    Ok(taken)
  }

  /// Which of `ids` have no professionals row.
  async fn missing_professionals(&self, ids: Vec<Uuid>) -> Result<Vec<Uuid>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let id_strs: Vec<String> = ids.iter().copied().map(encode_uuid).collect();
    let missing = self
      .conn
      .call(move |conn| {
        let placeholders = vec!["?"; id_strs.len()].join(", ");
        let sql = format!(
          "SELECT professional_id FROM professionals WHERE professional_id IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let found: Vec<String> = stmt
          .query_map(params_from_iter(id_strs.iter()), |r| r.get(0))?
          .collect::<rusqlite::Result<_>>()?;
        let missing: Vec<String> = id_strs
          .into_iter()
          .filter(|id| !found.contains(id))
          .collect();
        Ok(missing)
      })
      .await?;
    missing
      .iter()
      .map(|s| crate::encode::decode_uuid(s))
      .collect()
  }
}

// ─── Constraint-race mapping ─────────────────────────────────────────────────

/// If `err` is a SQLite unique-constraint failure, return the violated
/// `table.column` message so the caller can re-map it onto the same Conflict
/// variant its pre-check would have produced. A concurrent duplicate insert
/// then surfaces identically to a pre-checked one.
fn unique_violation(err: &tokio_rusqlite::Error) -> Option<&str> {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(f, Some(msg))) = err
    && f.code == rusqlite::ErrorCode::ConstraintViolation
  {
    return Some(msg.as_str());
  }
  None
}

// ─── Trait implementation ────────────────────────────────────────────────────

impl BackOfficeStore for SqliteStore {
  type Error = Error;

  // ── Users ─────────────────────────────────────────────────────────────

  async fn create_user(&self, input: NewUser) -> Result<Uuid> {
    // Fail-fast pre-checks, before any write.
    if self.email_taken(input.email.clone(), None).await? {
      return Err(CoreError::EmailTaken(input.email).into());
    }
    if let NewSubProfile::Patient { cpf, .. } = &input.profile
      && self.cpf_taken(cpf.clone(), None).await?
    {
      return Err(CoreError::CpfTaken(cpf.clone()).into());
    }

    // Kept for re-mapping a lost uniqueness race after the transaction.
    let email = input.email.clone();
    let cpf = match &input.profile {
      NewSubProfile::Patient { cpf, .. } => Some(cpf.clone()),
      _ => None,
    };
    let prof_name = match &input.profile {
      NewSubProfile::Professional { name, .. } => Some(name.clone()),
      _ => None,
    };

    let user_id = Uuid::new_v4();
    let profile_id = Uuid::new_v4();
    let now = Utc::now();
    let role = input.role();

    // Hashing belongs to the persist step: it happens only once every
    // validation and pre-check has passed.
    let password_hash = credential::hash(&input.password).map_err(Error::Core)?;

    let res = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO users (user_id, created_at, email, password_hash, active, role)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          params![
            encode_uuid(user_id),
            encode_dt(now),
            input.email,
            password_hash,
            input.active,
            role.as_str(),
          ],
        )?;
        match input.profile {
          NewSubProfile::Administrator { name } => {
            tx.execute(
              "INSERT INTO administrators (administrator_id, user_id, name)
               VALUES (?1, ?2, ?3)",
              params![encode_uuid(profile_id), encode_uuid(user_id), name],
            )?;
          }
          NewSubProfile::Professional { name, speciality, kind } => {
            tx.execute(
              "INSERT INTO professionals (professional_id, user_id, name, speciality, type)
               VALUES (?1, ?2, ?3, ?4, ?5)",
              params![
                encode_uuid(profile_id),
                encode_uuid(user_id),
                name,
                speciality,
                kind.as_str(),
              ],
            )?;
          }
          NewSubProfile::Patient { name, cpf, birth_date, contact } => {
            tx.execute(
              "INSERT INTO patients (patient_id, user_id, name, cpf, birth_date, contact)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
              params![
                encode_uuid(profile_id),
                encode_uuid(user_id),
                name,
                cpf,
                encode_date(birth_date),
                contact,
              ],
            )?;
          }
        }
        tx.commit()?;
        Ok(user_id)
      })
      .await;

    res.map_err(|e| match unique_violation(&e) {
      Some(m) if m.contains("users.email") => {
        CoreError::EmailTaken(email).into()
      }
      Some(m) if m.contains("patients.cpf") => {
        CoreError::CpfTaken(cpf.unwrap_or_default()).into()
      }
      Some(m) if m.contains("professionals.name") => {
        CoreError::ProfessionalNameTaken(prof_name.unwrap_or_default()).into()
      }
      _ => Error::Database(e),
    })
  }

  async fn find_active_by_email(
    &self,
    email: String,
  ) -> Result<Option<UserWithProfile>> {
    let raw = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {USER_JOIN_COLUMNS} {USER_JOIN_FROM}
           WHERE u.email = ?1 AND u.active = 1"
        );
        let raw = conn
          .query_row(&sql, params![email], RawUser::from_row)
          .optional()?;
        Ok(raw)
      })
      .await?;
    raw.map(RawUser::into_user).transpose()
  }

  async fn find_user(&self, id: Uuid) -> Result<Option<UserWithProfile>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {USER_JOIN_COLUMNS} {USER_JOIN_FROM}
           WHERE u.user_id = ?1"
        );
        let raw = conn
          .query_row(&sql, params![id_str], RawUser::from_row)
          .optional()?;
        Ok(raw)
      })
      .await?;
    let mut user = raw.map(RawUser::into_user).transpose()?;
    if let Some(u) = user.as_mut() {
      // Id lookups serve the authorization gate and detail reads; neither
      // may ever see the hash.
      u.password_hash = None;
    }
    Ok(user)
  }

  async fn list_users(&self, filter: UserFilter) -> Result<Page<UserSummary>> {
    let page = filter.page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).max(1);
    let offset = i64::from(page - 1).saturating_mul(i64::from(limit));
    let email = filter.email.unwrap_or_default();
    let name = filter.name.unwrap_or_default();
    let active = filter.active.unwrap_or(true);
    let roles: Vec<String> =
      filter.roles.iter().map(|r| r.as_str().to_owned()).collect();

    let (total, raws) = self
      .conn
      .call(move |conn| {
        let mut base = String::from(
          "FROM users u
           LEFT JOIN administrators a ON a.user_id = u.user_id
           LEFT JOIN professionals p  ON p.user_id = u.user_id
           LEFT JOIN patients t       ON t.user_id = u.user_id
           WHERE u.email LIKE '%' || ?1 || '%'
             AND u.active = ?2
             AND COALESCE(a.name, p.name, t.name) LIKE '%' || ?3 || '%'",
        );
        let mut args: Vec<Value> = vec![
          Value::Text(email),
          Value::Integer(i64::from(active)),
          Value::Text(name),
        ];
        if !roles.is_empty() {
          let placeholders = vec!["?"; roles.len()].join(", ");
          base.push_str(&format!(" AND u.role IN ({placeholders})"));
          args.extend(roles.into_iter().map(Value::Text));
        }

        let total: u64 = conn.query_row(
          &format!("SELECT COUNT(*) {base}"),
          params_from_iter(args.iter()),
          |r| r.get(0),
        )?;

        let sql = format!(
          "SELECT u.user_id, u.created_at, u.email, u.active, u.role,
                  COALESCE(a.name, p.name, t.name)
           {base}
           ORDER BY u.created_at DESC
           LIMIT ? OFFSET ?"
        );
        args.push(Value::Integer(i64::from(limit)));
        args.push(Value::Integer(offset));

        let mut stmt = conn.prepare(&sql)?;
        let raws: Vec<RawUserSummary> = stmt
          .query_map(params_from_iter(args.iter()), RawUserSummary::from_row)?
          .collect::<rusqlite::Result<_>>()?;
        Ok((total, raws))
      })
      .await?;

    let data = raws
      .into_iter()
      .map(RawUserSummary::into_summary)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page {
      data,
      pagination: Pagination::compute(page, limit, total),
    })
  }

  async fn set_user_active(&self, id: Uuid, active: bool) -> Result<()> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE users SET active = ?1 WHERE user_id = ?2",
          params![active, id_str],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::UserNotFound(id).into());
    }
    Ok(())
  }

  async fn update_administrator(
    &self,
    id: Uuid,
    update: AdministratorUpdate,
  ) -> Result<()> {
    let Some(current) = self.find_user(id).await? else {
      return Err(CoreError::ProfileNotFound(UserRole::Admin, id).into());
    };
    if !matches!(current.profile, SubProfile::Administrator(_)) {
      return Err(CoreError::ProfileNotFound(UserRole::Admin, id).into());
    }
    if update.email != current.user.email
      && self.email_taken(update.email.clone(), Some(id)).await?
    {
      return Err(CoreError::EmailTaken(update.email).into());
    }

    let email = update.email.clone();
    let id_str = encode_uuid(id);
    let res = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE users SET email = ?1 WHERE user_id = ?2",
          params![update.email, id_str],
        )?;
        tx.execute(
          "UPDATE administrators SET name = ?1 WHERE user_id = ?2",
          params![update.name, id_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await;

    res.map_err(|e| match unique_violation(&e) {
      Some(m) if m.contains("users.email") => CoreError::EmailTaken(email).into(),
      _ => Error::Database(e),
    })
  }

  async fn update_professional(
    &self,
    id: Uuid,
    update: ProfessionalUpdate,
  ) -> Result<()> {
    let Some(current) = self.find_user(id).await? else {
      return Err(CoreError::ProfileNotFound(UserRole::Professional, id).into());
    };
    if !matches!(current.profile, SubProfile::Professional(_)) {
      return Err(CoreError::ProfileNotFound(UserRole::Professional, id).into());
    }
    if update.email != current.user.email
      && self.email_taken(update.email.clone(), Some(id)).await?
    {
      return Err(CoreError::EmailTaken(update.email).into());
    }

    let email = update.email.clone();
    let name = update.name.clone();
    let id_str = encode_uuid(id);
    let res = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE users SET email = ?1 WHERE user_id = ?2",
          params![update.email, id_str],
        )?;
        tx.execute(
          "UPDATE professionals SET name = ?1, speciality = ?2, type = ?3
           WHERE user_id = ?4",
          params![update.name, update.speciality, update.kind.as_str(), id_str],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await;

    res.map_err(|e| match unique_violation(&e) {
      Some(m) if m.contains("users.email") => CoreError::EmailTaken(email).into(),
      Some(m) if m.contains("professionals.name") => {
        CoreError::ProfessionalNameTaken(name).into()
      }
      _ => Error::Database(e),
    })
  }

  async fn update_patient(&self, id: Uuid, update: PatientUpdate) -> Result<()> {
    let Some(current) = self.find_user(id).await? else {
      return Err(CoreError::ProfileNotFound(UserRole::Patient, id).into());
    };
    let SubProfile::Patient(ref patient) = current.profile else {
      return Err(CoreError::ProfileNotFound(UserRole::Patient, id).into());
    };
    if update.email != current.user.email
      && self.email_taken(update.email.clone(), Some(id)).await?
    {
      return Err(CoreError::EmailTaken(update.email).into());
    }
    if update.cpf != patient.cpf
      && self.cpf_taken(update.cpf.clone(), Some(id)).await?
    {
      return Err(CoreError::CpfTaken(update.cpf).into());
    }

    let email = update.email.clone();
    let cpf = update.cpf.clone();
    let id_str = encode_uuid(id);
    let res = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE users SET email = ?1 WHERE user_id = ?2",
          params![update.email, id_str],
        )?;
        tx.execute(
          "UPDATE patients SET name = ?1, cpf = ?2, birth_date = ?3, contact = ?4
           WHERE user_id = ?5",
          params![
            update.name,
            update.cpf,
            encode_date(update.birth_date),
            update.contact,
            id_str,
          ],
        )?;
        tx.commit()?;
        Ok(())
      })
      .await;

    res.map_err(|e| match unique_violation(&e) {
      Some(m) if m.contains("users.email") => CoreError::EmailTaken(email).into(),
      Some(m) if m.contains("patients.cpf") => CoreError::CpfTaken(cpf).into(),
      _ => Error::Database(e),
    })
  }

  async fn update_password(
    &self,
    id: Uuid,
    old_password: String,
    new_password: String,
  ) -> Result<()> {
    let id_str = encode_uuid(id);
    let stored: Option<String> = self
      .conn
      .call({
        let id_str = id_str.clone();
        move |conn| {
          let hash = conn
            .query_row(
              "SELECT password_hash FROM users WHERE user_id = ?1",
              params![id_str],
              |r| r.get(0),
            )
            .optional()?;
          Ok(hash)
        }
      })
      .await?;

    let Some(stored) = stored else {
      return Err(CoreError::UserNotFound(id).into());
    };
    if !credential::verify(&old_password, Some(&stored)) {
      return Err(CoreError::PasswordMismatch.into());
    }

    let new_hash = credential::hash(&new_password).map_err(Error::Core)?;
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE users SET password_hash = ?1 WHERE user_id = ?2",
          params![new_hash, id_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_user(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        // Sub-profile rows follow through ON DELETE CASCADE.
        Ok(conn.execute("DELETE FROM users WHERE user_id = ?1", params![id_str])?)
      })
      .await?;
    if deleted == 0 {
      return Err(CoreError::UserNotFound(id).into());
    }
    Ok(())
  }

  // ── Units ─────────────────────────────────────────────────────────────

  async fn create_unit(&self, input: NewUnit) -> Result<Uuid> {
    if self.unit_code_taken(input.code.clone(), None).await? {
      return Err(CoreError::UnitCodeTaken(input.code).into());
    }
    let missing = self.missing_professionals(input.professionals.clone()).await?;
    if !missing.is_empty() {
      return Err(CoreError::ProfessionalsNotFound(missing).into());
    }

    let code = input.code.clone();
    let unit_id = Uuid::new_v4();
    let now = Utc::now();
    let res = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "INSERT INTO units (unit_id, created_at, code, name, address, type, active)
           VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          params![
            encode_uuid(unit_id),
            encode_dt(now),
            input.code,
            input.name,
            input.address,
            input.kind.as_str(),
            input.active,
          ],
        )?;
        for professional_id in &input.professionals {
          tx.execute(
            "INSERT INTO unit_professionals (unit_id, professional_id) VALUES (?1, ?2)",
            params![encode_uuid(unit_id), encode_uuid(*professional_id)],
          )?;
        }
        tx.commit()?;
        Ok(unit_id)
      })
      .await;

    res.map_err(|e| match unique_violation(&e) {
      Some(m) if m.contains("units.code") => CoreError::UnitCodeTaken(code).into(),
      _ => Error::Database(e),
    })
  }

  async fn list_units(&self, filter: UnitFilter) -> Result<Page<Unit>> {
    let page = filter.page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).max(1);
    let offset = i64::from(page - 1).saturating_mul(i64::from(limit));
    let code = filter.code.unwrap_or_default();
    let name = filter.name.unwrap_or_default();
    let active = filter.active.unwrap_or(true);
    let kind = filter.kind.map(|k| k.as_str().to_owned());

    let (total, raws) = self
      .conn
      .call(move |conn| {
        let mut base = String::from(
          "FROM units
           WHERE code LIKE '%' || ?1 || '%'
             AND name LIKE '%' || ?2 || '%'
             AND active = ?3",
        );
        let mut args: Vec<Value> = vec![
          Value::Text(code),
          Value::Text(name),
          Value::Integer(i64::from(active)),
        ];
        if let Some(kind) = kind {
          base.push_str(" AND type = ?4");
          args.push(Value::Text(kind));
        }

        let total: u64 = conn.query_row(
          &format!("SELECT COUNT(*) {base}"),
          params_from_iter(args.iter()),
          |r| r.get(0),
        )?;

        let sql = format!(
          "SELECT unit_id, created_at, code, name, address, type, active
           {base}
           ORDER BY created_at DESC
           LIMIT ? OFFSET ?"
        );
        args.push(Value::Integer(i64::from(limit)));
        args.push(Value::Integer(offset));

        let mut stmt = conn.prepare(&sql)?;
        let raws: Vec<RawUnit> = stmt
          .query_map(params_from_iter(args.iter()), RawUnit::from_row)?
          .collect::<rusqlite::Result<_>>()?;
        Ok((total, raws))
      })
      .await?;

    let data = raws
      .into_iter()
      .map(RawUnit::into_unit)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page {
      data,
      pagination: Pagination::compute(page, limit, total),
    })
  }

  async fn unit_details(&self, id: Uuid) -> Result<Option<UnitDetails>> {
    let id_str = encode_uuid(id);
    let found = self
      .conn
      .call(move |conn| {
        let unit = conn
          .query_row(
            "SELECT unit_id, created_at, code, name, address, type, active
             FROM units WHERE unit_id = ?1",
            params![id_str],
            RawUnit::from_row,
          )
          .optional()?;
        let Some(unit) = unit else {
          return Ok(None);
        };

        let mut stmt = conn.prepare(
          "SELECT p.professional_id, p.name, p.speciality, p.type
           FROM unit_professionals up
           JOIN professionals p ON p.professional_id = up.professional_id
           WHERE up.unit_id = ?1
           ORDER BY p.name",
        )?;
        let professionals: Vec<RawProfessional> = stmt
          .query_map(params![id_str], RawProfessional::from_row)?
          .collect::<rusqlite::Result<_>>()?;
        Ok(Some((unit, professionals)))
      })
      .await?;

    let Some((raw_unit, raw_professionals)) = found else {
      return Ok(None);
    };
    Ok(Some(UnitDetails {
      unit:          raw_unit.into_unit()?,
      professionals: raw_professionals
        .into_iter()
        .map(RawProfessional::into_professional)
        .collect::<Result<Vec<_>>>()?,
    }))
  }

  async fn set_unit_active(&self, id: Uuid, active: bool) -> Result<()> {
    let id_str = encode_uuid(id);
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE units SET active = ?1 WHERE unit_id = ?2",
          params![active, id_str],
        )?)
      })
      .await?;
    if changed == 0 {
      return Err(CoreError::UnitNotFound(id).into());
    }
    Ok(())
  }

  async fn update_unit(&self, id: Uuid, input: NewUnit) -> Result<()> {
    if self.unit_details(id).await?.is_none() {
      return Err(CoreError::UnitNotFound(id).into());
    }
    if self.unit_code_taken(input.code.clone(), Some(id)).await? {
      return Err(CoreError::UnitCodeTaken(input.code).into());
    }
    let missing = self.missing_professionals(input.professionals.clone()).await?;
    if !missing.is_empty() {
      return Err(CoreError::ProfessionalsNotFound(missing).into());
    }

    let code = input.code.clone();
    let id_str = encode_uuid(id);
    let res = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE units SET code = ?1, name = ?2, address = ?3, type = ?4, active = ?5
           WHERE unit_id = ?6",
          params![
            input.code,
            input.name,
            input.address,
            input.kind.as_str(),
            input.active,
            id_str,
          ],
        )?;
        tx.execute(
          "DELETE FROM unit_professionals WHERE unit_id = ?1",
          params![id_str],
        )?;
        for professional_id in &input.professionals {
          tx.execute(
            "INSERT INTO unit_professionals (unit_id, professional_id) VALUES (?1, ?2)",
            params![id_str, encode_uuid(*professional_id)],
          )?;
        }
        tx.commit()?;
        Ok(())
      })
      .await;

    res.map_err(|e| match unique_violation(&e) {
      Some(m) if m.contains("units.code") => CoreError::UnitCodeTaken(code).into(),
      _ => Error::Database(e),
    })
  }

  async fn delete_unit(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);
    let deleted = self
      .conn
      .call(move |conn| {
        Ok(conn.execute("DELETE FROM units WHERE unit_id = ?1", params![id_str])?)
      })
      .await?;
    if deleted == 0 {
      return Err(CoreError::UnitNotFound(id).into());
    }
    Ok(())
  }

  // ── Appointments ──────────────────────────────────────────────────────

  async fn create_appointment(&self, input: NewAppointment) -> Result<Uuid> {
    self
      .check_appointment_refs(input.unit_id, input.patient_id, input.medic_id)
      .await?;

    let appointment_id = Uuid::new_v4();
    let now = Utc::now();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO appointments
             (appointment_id, created_at, date, status, type, notes,
              medic_id, patient_id, unit_id)
           VALUES (?1, ?2, ?3, 'SCHEDULED', ?4, ?5, ?6, ?7, ?8)",
          params![
            encode_uuid(appointment_id),
            encode_dt(now),
            encode_dt(input.date),
            input.kind.as_str(),
            input.notes,
            encode_uuid(input.medic_id),
            encode_uuid(input.patient_id),
            encode_uuid(input.unit_id),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(appointment_id)
  }

  async fn list_appointments(
    &self,
    filter: AppointmentFilter,
  ) -> Result<Page<Appointment>> {
    let page = filter.page.unwrap_or(DEFAULT_PAGE).max(1);
    let limit = filter.limit.unwrap_or(DEFAULT_LIMIT).max(1);
    let offset = i64::from(page - 1).saturating_mul(i64::from(limit));
    let status: Vec<String> =
      filter.status.iter().map(|s| s.as_str().to_owned()).collect();
    let kinds: Vec<String> =
      filter.kinds.iter().map(|k| k.as_str().to_owned()).collect();
    let start = filter.start_date.map(encode_dt);
    let end = filter.end_date.map(encode_dt);

    let (total, raws) = self
      .conn
      .call(move |conn| {
        let mut base = String::from("FROM appointments WHERE 1 = 1");
        let mut args: Vec<Value> = Vec::new();
        if !status.is_empty() {
          let placeholders = vec!["?"; status.len()].join(", ");
          base.push_str(&format!(" AND status IN ({placeholders})"));
          args.extend(status.into_iter().map(Value::Text));
        }
        if !kinds.is_empty() {
          let placeholders = vec!["?"; kinds.len()].join(", ");
          base.push_str(&format!(" AND type IN ({placeholders})"));
          args.extend(kinds.into_iter().map(Value::Text));
        }
        // RFC 3339 with a fixed UTC offset compares correctly as text.
        if let Some(start) = start {
          base.push_str(" AND date >= ?");
          args.push(Value::Text(start));
        }
        if let Some(end) = end {
          base.push_str(" AND date <= ?");
          args.push(Value::Text(end));
        }

        let total: u64 = conn.query_row(
          &format!("SELECT COUNT(*) {base}"),
          params_from_iter(args.iter()),
          |r| r.get(0),
        )?;

        let sql = format!(
          "SELECT appointment_id, created_at, date, status, type, notes,
                  medic_id, patient_id, unit_id
           {base}
           ORDER BY date DESC
           LIMIT ? OFFSET ?"
        );
        args.push(Value::Integer(i64::from(limit)));
        args.push(Value::Integer(offset));

        let mut stmt = conn.prepare(&sql)?;
        let raws: Vec<RawAppointment> = stmt
          .query_map(params_from_iter(args.iter()), RawAppointment::from_row)?
          .collect::<rusqlite::Result<_>>()?;
        Ok((total, raws))
      })
      .await?;

    let data = raws
      .into_iter()
      .map(RawAppointment::into_appointment)
      .collect::<Result<Vec<_>>>()?;

    Ok(Page {
      data,
      pagination: Pagination::compute(page, limit, total),
    })
  }

  async fn appointment_details(
    &self,
    id: Uuid,
  ) -> Result<Option<AppointmentDetails>> {
    let id_str = encode_uuid(id);
    let found = self
      .conn
      .call(move |conn| {
        let appointment = conn
          .query_row(
            "SELECT appointment_id, created_at, date, status, type, notes,
                    medic_id, patient_id, unit_id
             FROM appointments WHERE appointment_id = ?1",
            params![id_str],
            RawAppointment::from_row,
          )
          .optional()?;
        let Some(appointment) = appointment else {
          return Ok(None);
        };

        let medic = conn.query_row(
          "SELECT professional_id, name, speciality, type
           FROM professionals WHERE professional_id = ?1",
          params![appointment.medic_id.clone()],
          RawProfessional::from_row,
        )?;
        let patient = conn.query_row(
          "SELECT patient_id, name, cpf, birth_date, contact
           FROM patients WHERE patient_id = ?1",
          params![appointment.patient_id.clone()],
          RawPatient::from_row,
        )?;
        let unit = conn.query_row(
          "SELECT unit_id, created_at, code, name, address, type, active
           FROM units WHERE unit_id = ?1",
          params![appointment.unit_id.clone()],
          RawUnit::from_row,
        )?;
        Ok(Some((appointment, medic, patient, unit)))
      })
      .await?;

    let Some((raw_appointment, raw_medic, raw_patient, raw_unit)) = found else {
      return Ok(None);
    };
    Ok(Some(AppointmentDetails {
      appointment: raw_appointment.into_appointment()?,
      medic:       raw_medic.into_professional()?,
      patient:     raw_patient.into_patient()?,
      unit:        raw_unit.into_unit()?,
    }))
  }

  async fn update_appointment(
    &self,
    id: Uuid,
    update: AppointmentUpdate,
  ) -> Result<()> {
    if self.appointment_details(id).await?.is_none() {
      return Err(CoreError::AppointmentNotFound(id).into());
    }
    self
      .check_appointment_refs(update.unit_id, update.patient_id, update.medic_id)
      .await?;

    let id_str = encode_uuid(id);
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE appointments
           SET date = ?1, status = ?2, type = ?3, notes = ?4,
               medic_id = ?5, patient_id = ?6, unit_id = ?7
           WHERE appointment_id = ?8",
          params![
            encode_dt(update.date),
            update.status.as_str(),
            update.kind.as_str(),
            update.notes,
            encode_uuid(update.medic_id),
            encode_uuid(update.patient_id),
            encode_uuid(update.unit_id),
            id_str,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Health ────────────────────────────────────────────────────────────

  async fn ping(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl SqliteStore {
  /// Existence checks shared by appointment creation and update: unit,
  /// patient, then medic (which must be a professional of type MEDIC).
  async fn check_appointment_refs(
    &self,
    unit_id: Uuid,
    patient_id: Uuid,
    medic_id: Uuid,
  ) -> Result<()> {
    let unit_str = encode_uuid(unit_id);
    let patient_str = encode_uuid(patient_id);
    let medic_str = encode_uuid(medic_id);

    let (unit_ok, patient_ok, medic_type): (bool, bool, Option<String>) = self
      .conn
      .call(move |conn| {
        let unit_ok: bool = conn
          .query_row(
            "SELECT 1 FROM units WHERE unit_id = ?1",
            params![unit_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        let patient_ok: bool = conn
          .query_row(
            "SELECT 1 FROM patients WHERE patient_id = ?1",
            params![patient_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        let medic_type: Option<String> = conn
          .query_row(
            "SELECT type FROM professionals WHERE professional_id = ?1",
            params![medic_str],
            |r| r.get(0),
          )
          .optional()?;
        Ok((unit_ok, patient_ok, medic_type))
      })
      .await?;

    if !unit_ok {
      return Err(CoreError::UnitNotFound(unit_id).into());
    }
    if !patient_ok {
      return Err(CoreError::PatientNotFound(patient_id).into());
    }
    match medic_type.as_deref() {
      Some(t) if t == ProfessionalType::Medic.as_str() => Ok(()),
      _ => Err(CoreError::MedicNotFound(medic_id).into()),
    }
  }
}
