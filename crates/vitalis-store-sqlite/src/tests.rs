use chrono::{NaiveDate, TimeZone, Utc};
use uuid::Uuid;

use vitalis_core::{
  Error as CoreError, credential,
  appointment::{AppointmentUpdate, NewAppointment},
  role::{
    AppointmentStatus, AppointmentType, ProfessionalType, UnitType, UserRole,
  },
  store::{AppointmentFilter, BackOfficeStore, UnitFilter, UserFilter},
  unit::NewUnit,
  user::{NewSubProfile, NewUser, PatientUpdate, SubProfile},
};

use crate::{Error, SqliteStore};

const PASSWORD: &str = "Str0ng!Pass";

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory().await.unwrap()
}

/// Raw row count, bypassing the store API.
async fn count(store: &SqliteStore, table: &'static str) -> i64 {
  store
    .conn
    .call(move |conn| {
      Ok(conn.query_row(
        &format!("SELECT COUNT(*) FROM {table}"),
        [],
        |r| r.get(0),
      )?)
    })
    .await
    .unwrap()
}

fn new_admin(email: &str, name: &str) -> NewUser {
  NewUser {
    email:    email.to_owned(),
    password: PASSWORD.to_owned(),
    active:   true,
    profile:  NewSubProfile::Administrator { name: name.to_owned() },
  }
}

fn new_professional(email: &str, name: &str, kind: ProfessionalType) -> NewUser {
  NewUser {
    email:    email.to_owned(),
    password: PASSWORD.to_owned(),
    active:   true,
    profile:  NewSubProfile::Professional {
      name: name.to_owned(),
      speciality: "cardiology".to_owned(),
      kind,
    },
  }
}

fn new_patient(email: &str, name: &str, cpf: &str) -> NewUser {
  NewUser {
    email:    email.to_owned(),
    password: PASSWORD.to_owned(),
    active:   true,
    profile:  NewSubProfile::Patient {
      name:       name.to_owned(),
      cpf:        cpf.to_owned(),
      birth_date: NaiveDate::from_ymd_opt(1990, 4, 12).unwrap(),
      contact:    "+55 11 99999-0000".to_owned(),
    },
  }
}

fn new_unit(code: &str, professionals: Vec<Uuid>) -> NewUnit {
  NewUnit {
    code: code.to_owned(),
    name: "Unidade Central".to_owned(),
    address: "Av. Paulista, 1000".to_owned(),
    kind: UnitType::Hospital,
    active: true,
    professionals,
  }
}

async fn professional_profile_id(store: &SqliteStore, user_id: Uuid) -> Uuid {
  let user = store.find_user(user_id).await.unwrap().unwrap();
  match user.profile {
    SubProfile::Professional(p) => p.id,
    other => panic!("expected professional profile, got {other:?}"),
  }
}

async fn patient_profile_id(store: &SqliteStore, user_id: Uuid) -> Uuid {
  let user = store.find_user(user_id).await.unwrap().unwrap();
  match user.profile {
    SubProfile::Patient(p) => p.id,
    other => panic!("expected patient profile, got {other:?}"),
  }
}

// ─── Onboarding ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn creates_one_user_per_role() {
  let store = store().await;

  let admin = store
    .create_user(new_admin("admin@vitalis.dev", "Alice"))
    .await
    .unwrap();
  let professional = store
    .create_user(new_professional(
      "medic@vitalis.dev",
      "Dr. Bob",
      ProfessionalType::Medic,
    ))
    .await
    .unwrap();
  let patient = store
    .create_user(new_patient("pat@vitalis.dev", "Carla", "52998224725"))
    .await
    .unwrap();

  assert_eq!(count(&store, "users").await, 3);
  assert_eq!(count(&store, "administrators").await, 1);
  assert_eq!(count(&store, "professionals").await, 1);
  assert_eq!(count(&store, "patients").await, 1);

  let loaded = store.find_user(admin).await.unwrap().unwrap();
  assert_eq!(loaded.user.role, UserRole::Admin);
  assert!(matches!(loaded.profile, SubProfile::Administrator(_)));
  // id lookups never carry the hash
  assert!(loaded.password_hash.is_none());

  let loaded = store.find_user(professional).await.unwrap().unwrap();
  let SubProfile::Professional(p) = loaded.profile else {
    panic!("wrong profile");
  };
  assert_eq!(p.kind, ProfessionalType::Medic);

  let loaded = store.find_user(patient).await.unwrap().unwrap();
  let SubProfile::Patient(p) = loaded.profile else {
    panic!("wrong profile");
  };
  assert_eq!(p.cpf, "52998224725");
  assert_eq!(p.birth_date, NaiveDate::from_ymd_opt(1990, 4, 12).unwrap());
}

#[tokio::test]
async fn duplicate_email_conflicts_and_writes_nothing() {
  let store = store().await;
  store
    .create_user(new_admin("dup@vitalis.dev", "First"))
    .await
    .unwrap();

  let err = store
    .create_user(new_admin("dup@vitalis.dev", "Second"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::EmailTaken(e)) if e == "dup@vitalis.dev"));

  assert_eq!(count(&store, "users").await, 1);
  assert_eq!(count(&store, "administrators").await, 1);
}

#[tokio::test]
async fn duplicate_cpf_conflicts() {
  let store = store().await;
  store
    .create_user(new_patient("a@vitalis.dev", "Ana", "52998224725"))
    .await
    .unwrap();

  let err = store
    .create_user(new_patient("b@vitalis.dev", "Bia", "52998224725"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::CpfTaken(_))));
  assert_eq!(count(&store, "users").await, 1);
}

#[tokio::test]
async fn failed_sub_profile_insert_rolls_back_the_user_row() {
  let store = store().await;
  store
    .create_user(new_professional(
      "one@vitalis.dev",
      "Dr. Same Name",
      ProfessionalType::Medic,
    ))
    .await
    .unwrap();

  // Fresh email passes the pre-checks; the professionals.name UNIQUE
  // constraint then fails mid-transaction. The user row must not survive.
  let err = store
    .create_user(new_professional(
      "two@vitalis.dev",
      "Dr. Same Name",
      ProfessionalType::Nurse,
    ))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::ProfessionalNameTaken(n)) if n == "Dr. Same Name"
  ));

  assert_eq!(count(&store, "users").await, 1);
  assert_eq!(count(&store, "professionals").await, 1);
}

// ─── Credentials ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn login_lookup_returns_hash_for_active_users_only() {
  let store = store().await;
  let id = store
    .create_user(new_admin("login@vitalis.dev", "Alice"))
    .await
    .unwrap();

  let found = store
    .find_active_by_email("login@vitalis.dev".to_owned())
    .await
    .unwrap()
    .unwrap();
  assert!(credential::verify(PASSWORD, found.password_hash.as_deref()));
  assert!(!credential::verify("wrong", found.password_hash.as_deref()));

  store.set_user_active(id, false).await.unwrap();
  let gone = store
    .find_active_by_email("login@vitalis.dev".to_owned())
    .await
    .unwrap();
  assert!(gone.is_none());

  let unknown = store
    .find_active_by_email("nobody@vitalis.dev".to_owned())
    .await
    .unwrap();
  assert!(unknown.is_none());
}

#[tokio::test]
async fn password_change_requires_the_old_one() {
  let store = store().await;
  let id = store
    .create_user(new_admin("pw@vitalis.dev", "Alice"))
    .await
    .unwrap();

  let err = store
    .update_password(id, "not-the-password".to_owned(), "N3w!Password".to_owned())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PasswordMismatch)));

  store
    .update_password(id, PASSWORD.to_owned(), "N3w!Password".to_owned())
    .await
    .unwrap();
  let found = store
    .find_active_by_email("pw@vitalis.dev".to_owned())
    .await
    .unwrap()
    .unwrap();
  assert!(credential::verify("N3w!Password", found.password_hash.as_deref()));
  assert!(!credential::verify(PASSWORD, found.password_hash.as_deref()));
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn activation_errors_on_unknown_user() {
  let store = store().await;
  let err = store
    .set_user_active(Uuid::new_v4(), true)
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(_))));
}

#[tokio::test]
async fn deleting_a_user_cascades_to_its_sub_profile() {
  let store = store().await;
  let id = store
    .create_user(new_patient("del@vitalis.dev", "Ana", "52998224725"))
    .await
    .unwrap();
  assert_eq!(count(&store, "patients").await, 1);

  store.delete_user(id).await.unwrap();
  assert_eq!(count(&store, "users").await, 0);
  assert_eq!(count(&store, "patients").await, 0);

  let err = store.delete_user(id).await.unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UserNotFound(_))));
}

#[tokio::test]
async fn patient_update_checks_conflicts_against_other_users() {
  let store = store().await;
  store
    .create_user(new_patient("first@vitalis.dev", "Ana", "52998224725"))
    .await
    .unwrap();
  let second = store
    .create_user(new_patient("second@vitalis.dev", "Bia", "11144477735"))
    .await
    .unwrap();

  let update = |email: &str, cpf: &str| PatientUpdate {
    email:      email.to_owned(),
    name:       "Bia".to_owned(),
    cpf:        cpf.to_owned(),
    birth_date: NaiveDate::from_ymd_opt(1985, 1, 1).unwrap(),
    contact:    "contact".to_owned(),
  };

  let err = store
    .update_patient(second, update("first@vitalis.dev", "11144477735"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::EmailTaken(_))));

  let err = store
    .update_patient(second, update("second@vitalis.dev", "52998224725"))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::CpfTaken(_))));

  // keeping your own email and cpf is not a conflict
  store
    .update_patient(second, update("second@vitalis.dev", "11144477735"))
    .await
    .unwrap();
  let loaded = store.find_user(second).await.unwrap().unwrap();
  let SubProfile::Patient(p) = loaded.profile else {
    panic!("wrong profile");
  };
  assert_eq!(p.birth_date, NaiveDate::from_ymd_opt(1985, 1, 1).unwrap());
}

// ─── Listing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn user_listing_filters_and_paginates() {
  let store = store().await;
  store
    .create_user(new_admin("admin@vitalis.dev", "Alice Admin"))
    .await
    .unwrap();
  store
    .create_user(new_professional(
      "medic@vitalis.dev",
      "Dr. Bob",
      ProfessionalType::Medic,
    ))
    .await
    .unwrap();
  let patient = store
    .create_user(new_patient("pat@vitalis.dev", "Carla", "52998224725"))
    .await
    .unwrap();
  store.set_user_active(patient, false).await.unwrap();

  // active defaults to true, so the deactivated patient is absent
  let page = store.list_users(UserFilter::default()).await.unwrap();
  assert_eq!(page.data.len(), 2);
  assert_eq!(page.pagination.total_items, 2);
  assert_eq!(page.pagination.current_page, 1);
  assert!(page.pagination.next_page.is_none());

  let page = store
    .list_users(UserFilter { active: Some(false), ..Default::default() })
    .await
    .unwrap();
  assert_eq!(page.data.len(), 1);
  assert_eq!(page.data[0].role, UserRole::Patient);

  let page = store
    .list_users(UserFilter {
      roles: vec![UserRole::Admin],
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.data.len(), 1);
  assert_eq!(page.data[0].name, "Alice Admin");

  let page = store
    .list_users(UserFilter {
      name: Some("bob".to_owned().to_uppercase()),
      ..Default::default()
    })
    .await
    .unwrap();
  // LIKE is case-insensitive for ASCII in SQLite
  assert_eq!(page.data.len(), 1);
  assert_eq!(page.data[0].email, "medic@vitalis.dev");

  let page = store
    .list_users(UserFilter {
      limit: Some(1),
      page: Some(2),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.data.len(), 1);
  assert_eq!(page.pagination.total_items, 2);
  assert_eq!(page.pagination.previous_page, Some(1));
  assert!(page.pagination.next_page.is_none());
}

#[tokio::test]
async fn listing_survives_extreme_page_and_limit() {
  let store = store().await;
  store
    .create_user(new_admin("admin@vitalis.dev", "Alice"))
    .await
    .unwrap();

  // page and limit come straight from the query string; their product must
  // not overflow the offset.
  let page = store
    .list_users(UserFilter {
      page: Some(u32::MAX),
      limit: Some(u32::MAX),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(page.data.is_empty());
  assert_eq!(page.pagination.total_items, 1);

  let page = store
    .list_units(UnitFilter {
      page: Some(u32::MAX),
      limit: Some(u32::MAX),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(page.data.is_empty());

  let page = store
    .list_appointments(AppointmentFilter {
      page: Some(u32::MAX),
      limit: Some(u32::MAX),
      ..Default::default()
    })
    .await
    .unwrap();
  assert!(page.data.is_empty());
}

// ─── Units ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unit_crud_with_professional_assignments() {
  let store = store().await;
  let medic_user = store
    .create_user(new_professional(
      "medic@vitalis.dev",
      "Dr. Bob",
      ProfessionalType::Medic,
    ))
    .await
    .unwrap();
  let nurse_user = store
    .create_user(new_professional(
      "nurse@vitalis.dev",
      "Nina",
      ProfessionalType::Nurse,
    ))
    .await
    .unwrap();
  let medic = professional_profile_id(&store, medic_user).await;
  let nurse = professional_profile_id(&store, nurse_user).await;

  let unit = store.create_unit(new_unit("U-001", vec![medic])).await.unwrap();

  let details = store.unit_details(unit).await.unwrap().unwrap();
  assert_eq!(details.unit.code, "U-001");
  assert_eq!(details.professionals.len(), 1);
  assert_eq!(details.professionals[0].id, medic);

  // replacing the assignment set is atomic
  let mut updated = new_unit("U-001", vec![medic, nurse]);
  updated.name = "Unidade Norte".to_owned();
  store.update_unit(unit, updated).await.unwrap();
  let details = store.unit_details(unit).await.unwrap().unwrap();
  assert_eq!(details.unit.name, "Unidade Norte");
  assert_eq!(details.professionals.len(), 2);

  store.delete_unit(unit).await.unwrap();
  assert!(store.unit_details(unit).await.unwrap().is_none());
  assert_eq!(count(&store, "unit_professionals").await, 0);
}

#[tokio::test]
async fn unit_code_conflicts_and_unknown_professionals_are_rejected() {
  let store = store().await;
  store.create_unit(new_unit("U-001", vec![])).await.unwrap();

  let err = store
    .create_unit(new_unit("U-001", vec![]))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UnitCodeTaken(c)) if c == "U-001"));

  let ghost = Uuid::new_v4();
  let err = store
    .create_unit(new_unit("U-002", vec![ghost]))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Core(CoreError::ProfessionalsNotFound(ids)) if ids == vec![ghost]
  ));
  assert_eq!(count(&store, "units").await, 1);
}

#[tokio::test]
async fn unit_listing_filters_by_kind() {
  let store = store().await;
  store.create_unit(new_unit("U-001", vec![])).await.unwrap();
  let mut clinic = new_unit("C-001", vec![]);
  clinic.kind = UnitType::Clinic;
  store.create_unit(clinic).await.unwrap();

  let page = store.list_units(UnitFilter::default()).await.unwrap();
  assert_eq!(page.pagination.total_items, 2);

  let page = store
    .list_units(UnitFilter {
      kind: Some(UnitType::Clinic),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.data.len(), 1);
  assert_eq!(page.data[0].code, "C-001");

  let page = store
    .list_units(UnitFilter {
      code: Some("U-".to_owned()),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.data.len(), 1);
  assert_eq!(page.data[0].kind, UnitType::Hospital);
}

// ─── Appointments ────────────────────────────────────────────────────────────

async fn appointment_fixtures(store: &SqliteStore) -> (Uuid, Uuid, Uuid) {
  let medic_user = store
    .create_user(new_professional(
      "medic@vitalis.dev",
      "Dr. Bob",
      ProfessionalType::Medic,
    ))
    .await
    .unwrap();
  let patient_user = store
    .create_user(new_patient("pat@vitalis.dev", "Carla", "52998224725"))
    .await
    .unwrap();
  let medic = professional_profile_id(store, medic_user).await;
  let patient = patient_profile_id(store, patient_user).await;
  let unit = store.create_unit(new_unit("U-001", vec![medic])).await.unwrap();
  (medic, patient, unit)
}

fn new_appointment(medic: Uuid, patient: Uuid, unit: Uuid) -> NewAppointment {
  NewAppointment {
    date:       Utc.with_ymd_and_hms(2026, 9, 1, 14, 30, 0).unwrap(),
    kind:       AppointmentType::InPerson,
    notes:      "first visit".to_owned(),
    medic_id:   medic,
    patient_id: patient,
    unit_id:    unit,
  }
}

#[tokio::test]
async fn schedules_and_updates_an_appointment() {
  let store = store().await;
  let (medic, patient, unit) = appointment_fixtures(&store).await;

  let id = store
    .create_appointment(new_appointment(medic, patient, unit))
    .await
    .unwrap();

  let details = store.appointment_details(id).await.unwrap().unwrap();
  assert_eq!(details.appointment.status, AppointmentStatus::Scheduled);
  assert_eq!(details.medic.id, medic);
  assert_eq!(details.patient.id, patient);
  assert_eq!(details.unit.id, unit);

  store
    .update_appointment(id, AppointmentUpdate {
      date:       details.appointment.date,
      status:     AppointmentStatus::Completed,
      kind:       AppointmentType::Remote,
      notes:      "done remotely".to_owned(),
      medic_id:   medic,
      patient_id: patient,
      unit_id:    unit,
    })
    .await
    .unwrap();

  let details = store.appointment_details(id).await.unwrap().unwrap();
  assert_eq!(details.appointment.status, AppointmentStatus::Completed);
  assert_eq!(details.appointment.kind, AppointmentType::Remote);

  let err = store
    .update_appointment(Uuid::new_v4(), AppointmentUpdate {
      date:       details.appointment.date,
      status:     AppointmentStatus::Canceled,
      kind:       AppointmentType::Remote,
      notes:      String::new(),
      medic_id:   medic,
      patient_id: patient,
      unit_id:    unit,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::AppointmentNotFound(_))));
}

#[tokio::test]
async fn appointment_references_are_checked_in_order() {
  let store = store().await;
  let (medic, patient, unit) = appointment_fixtures(&store).await;

  let err = store
    .create_appointment(new_appointment(medic, patient, Uuid::new_v4()))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::UnitNotFound(_))));

  let err = store
    .create_appointment(new_appointment(medic, Uuid::new_v4(), unit))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::PatientNotFound(_))));

  let err = store
    .create_appointment(new_appointment(Uuid::new_v4(), patient, unit))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::MedicNotFound(_))));

  // a nurse cannot be the appointment's medic
  let nurse_user = store
    .create_user(new_professional(
      "nurse@vitalis.dev",
      "Nina",
      ProfessionalType::Nurse,
    ))
    .await
    .unwrap();
  let nurse = professional_profile_id(&store, nurse_user).await;
  let err = store
    .create_appointment(new_appointment(nurse, patient, unit))
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(CoreError::MedicNotFound(_))));

  assert_eq!(count(&store, "appointments").await, 0);
}

#[tokio::test]
async fn appointment_listing_filters_by_status_and_range() {
  let store = store().await;
  let (medic, patient, unit) = appointment_fixtures(&store).await;

  let first = store
    .create_appointment(new_appointment(medic, patient, unit))
    .await
    .unwrap();
  let mut later = new_appointment(medic, patient, unit);
  later.date = Utc.with_ymd_and_hms(2026, 10, 15, 9, 0, 0).unwrap();
  let second = store.create_appointment(later).await.unwrap();

  let details = store.appointment_details(first).await.unwrap().unwrap();
  store
    .update_appointment(first, AppointmentUpdate {
      date:       details.appointment.date,
      status:     AppointmentStatus::Canceled,
      kind:       details.appointment.kind,
      notes:      details.appointment.notes,
      medic_id:   medic,
      patient_id: patient,
      unit_id:    unit,
    })
    .await
    .unwrap();

  let page = store
    .list_appointments(AppointmentFilter::default())
    .await
    .unwrap();
  assert_eq!(page.pagination.total_items, 2);
  // ordered by date descending
  assert_eq!(page.data[0].id, second);

  let page = store
    .list_appointments(AppointmentFilter {
      status: vec![AppointmentStatus::Scheduled],
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.data.len(), 1);
  assert_eq!(page.data[0].id, second);

  let page = store
    .list_appointments(AppointmentFilter {
      start_date: Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).single(),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.data.len(), 1);
  assert_eq!(page.data[0].id, second);

  let page = store
    .list_appointments(AppointmentFilter {
      end_date: Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).single(),
      ..Default::default()
    })
    .await
    .unwrap();
  assert_eq!(page.data.len(), 1);
  assert_eq!(page.data[0].id, first);
}

// ─── Health ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ping_succeeds_on_a_healthy_store() {
  let store = store().await;
  store.ping().await.unwrap();
}
