//! Vitalis back-office server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the SQLite
//! store, optionally seeds the first administrator, and serves HTTP.
//!
//! # Password hash generation
//!
//! To print the argon2 PHC string for a password entered on stdin:
//!
//! ```
//! cargo run -p vitalis-api --bin server -- --hash-password
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use vitalis_api::{AppState, ServerConfig, auth::AuthConfig};
use vitalis_core::{
  credential,
  store::{BackOfficeStore as _, UserFilter},
  user::{NewSubProfile, NewUser},
};
use vitalis_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vitalis back-office server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = read_password()?;
    let hash = credential::hash(&password)?;
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VITALIS"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(seed) = &server_cfg.seed_admin {
    seed_admin(&store, seed).await?;
  }

  let state = AppState {
    store: Arc::new(store),
    auth:  Arc::new(AuthConfig::new(
      &server_cfg.jwt_secret,
      server_cfg.token_expiry_secs,
    )),
  };

  let app = vitalis_api::router(state);
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Create the seed administrator, but only into an empty user table; an
/// existing deployment is never touched.
async fn seed_admin(
  store: &SqliteStore,
  seed: &vitalis_api::SeedAdmin,
) -> anyhow::Result<()> {
  // list_users filters on active, so count both sides
  let one = UserFilter { limit: Some(1), ..Default::default() };
  let active = store.list_users(one.clone()).await?;
  let inactive = store
    .list_users(UserFilter { active: Some(false), ..one })
    .await?;
  if active.pagination.total_items + inactive.pagination.total_items > 0 {
    return Ok(());
  }

  let id = store
    .create_user(NewUser {
      email:    seed.email.clone(),
      password: seed.password.clone(),
      active:   true,
      profile:  NewSubProfile::Administrator { name: seed.name.clone() },
    })
    .await
    .context("failed to create seed administrator")?;
  tracing::info!(%id, email = %seed.email, "created seed administrator");
  Ok(())
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
