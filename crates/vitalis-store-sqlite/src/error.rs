//! Error type for `vitalis-store-sqlite`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] vitalis_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A user row exists whose role has no matching sub-profile row. The
  /// onboarding transaction makes this unreachable; surfacing it beats
  /// guessing.
  #[error("user {0} has no sub-profile matching its role")]
  ProfileMissing(Uuid),
}

/// Funnel into the domain taxonomy: domain variants pass through, anything
/// infrastructural becomes an opaque backend error.
impl From<Error> for vitalis_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Core(core) => core,
      other => vitalis_core::Error::Backend(Box::new(other)),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
