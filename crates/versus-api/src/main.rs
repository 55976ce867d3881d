//! versus server binary.
//!
//! Layers `config.toml` (or the path given with `--config`) under `VERSUS_*`
//! environment variables, validates the accounts, opens the SQLite store and
//! serves the bracket API and event stream over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for an account's `password_hash`:
//!
//! ```
//! cargo run -p versus-api --bin versus-server -- --hash-password
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;
use versus_api::{AppState, ServerConfig};
use versus_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Versus bracket-battle server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Validate the configuration, report it and exit without serving.
  #[arg(long)]
  check: bool,
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

  if cli.hash_password {
    println!("{}", hash_password(&read_password()?)?);
    return Ok(());
  }

  let server_cfg = load_config(&cli.config)?;
  report(&server_cfg);
  if cli.check {
    return Ok(());
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = versus_api::router(AppState::new(store, server_cfg));

  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;
  info!(%address, store = %store_path.display(), "listening");

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

fn load_config(path: &Path) -> anyhow::Result<ServerConfig> {
  let cfg: ServerConfig = config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(config::Environment::with_prefix("VERSUS").try_parsing(true))
    .build()
    .with_context(|| format!("failed to read {}", path.display()))?
    .try_deserialize()
    .context("invalid server configuration")?;
  cfg.validate().context("invalid server configuration")?;
  Ok(cfg)
}

fn report(cfg: &ServerConfig) {
  info!(
    vote_threshold = cfg.vote_threshold.get(),
    broadcast_capacity = cfg.broadcast_capacity,
    accounts = cfg.accounts.len(),
    admins = cfg.admin_count(),
    "configuration loaded"
  );
  if cfg.accounts.is_empty() {
    warn!("no accounts configured; every authenticated route will answer 401");
  } else if cfg.admin_count() == 0 {
    warn!("no admin account configured; /admin routes will answer 403");
  }
}

fn hash_password(password: &str) -> anyhow::Result<String> {
  let salt = SaltString::generate(&mut OsRng);
  let hash = Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?;
  Ok(hash.to_string())
}

fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  let password = line.trim_end_matches(['\n', '\r']);
  anyhow::ensure!(!password.is_empty(), "refusing to hash an empty password");
  Ok(password.to_owned())
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
