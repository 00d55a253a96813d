//! SQL schema for the Vitalis SQLite store.
//!
//! Executed once at connection startup. The UNIQUE constraints on
//! `users.email`, `patients.cpf`, `professionals.name` and `units.code` are
//! the authoritative uniqueness arbiter under concurrent writes; the
//! application-level pre-checks are only a fail-fast optimisation.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS users (
    user_id       TEXT PRIMARY KEY,
    created_at    TEXT NOT NULL,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,   -- argon2 PHC string, never leaves the store layer
    active        INTEGER NOT NULL,
    role          TEXT NOT NULL    -- 'ADMIN' | 'PROFESSIONAL' | 'PATIENT'
);

-- Sub-profiles are 1:1 with users and die with them.
CREATE TABLE IF NOT EXISTS administrators (
    administrator_id TEXT PRIMARY KEY,
    user_id          TEXT NOT NULL UNIQUE REFERENCES users(user_id) ON DELETE CASCADE,
    name             TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS professionals (
    professional_id TEXT PRIMARY KEY,
    user_id         TEXT NOT NULL UNIQUE REFERENCES users(user_id) ON DELETE CASCADE,
    name            TEXT NOT NULL UNIQUE,
    speciality      TEXT NOT NULL,
    type            TEXT NOT NULL   -- 'MEDIC' | 'NURSE' | 'TECHNICIAN'
);

CREATE TABLE IF NOT EXISTS patients (
    patient_id TEXT PRIMARY KEY,
    user_id    TEXT NOT NULL UNIQUE REFERENCES users(user_id) ON DELETE CASCADE,
    name       TEXT NOT NULL,
    cpf        TEXT NOT NULL UNIQUE,
    birth_date TEXT NOT NULL,
    contact    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS units (
    unit_id    TEXT PRIMARY KEY,
    created_at TEXT NOT NULL,
    code       TEXT NOT NULL UNIQUE,
    name       TEXT NOT NULL,
    address    TEXT NOT NULL,
    type       TEXT NOT NULL,       -- 'HOSPITAL' | 'CLINIC'
    active     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS unit_professionals (
    unit_id         TEXT NOT NULL REFERENCES units(unit_id) ON DELETE CASCADE,
    professional_id TEXT NOT NULL REFERENCES professionals(professional_id),
    PRIMARY KEY (unit_id, professional_id)
);

CREATE TABLE IF NOT EXISTS appointments (
    appointment_id TEXT PRIMARY KEY,
    created_at     TEXT NOT NULL,
    date           TEXT NOT NULL,
    status         TEXT NOT NULL,   -- 'SCHEDULED' | 'COMPLETED' | 'CANCELED'
    type           TEXT NOT NULL,   -- 'IN_PERSON' | 'REMOTE'
    notes          TEXT NOT NULL,
    medic_id       TEXT NOT NULL REFERENCES professionals(professional_id),
    patient_id     TEXT NOT NULL REFERENCES patients(patient_id),
    unit_id        TEXT NOT NULL REFERENCES units(unit_id)
);

CREATE INDEX IF NOT EXISTS users_created_idx        ON users(created_at);
CREATE INDEX IF NOT EXISTS appointments_date_idx    ON appointments(date);
CREATE INDEX IF NOT EXISTS appointments_status_idx  ON appointments(status);

PRAGMA user_version = 1;
";
