//! trackplan-server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens an
//! in-process SQLite store, and serves the tracking-plan API over HTTP.
//!
//! # API keys
//!
//! Only SHA-256 digests of keys go into `config.toml`. To mint a key and the
//! matching config entry:
//!
//! ```
//! cargo run -p trackplan-server -- --generate-key --owner acme
//! ```

mod settings;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::Parser;
use rand_core::{OsRng, RngCore};
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use trackplan_api::{AppState, digest_key};
use trackplan_core::OwnerId;
use trackplan_store_sqlite::SqliteStore;

use settings::{ServerConfig, expand_tilde};

#[derive(Parser)]
#[command(author, version, about = "Tracking-plan catalog server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the SHA-256 digest of an API key read from stdin and exit.
  #[arg(long)]
  hash_key: bool,

  /// Generate a random API key for `--owner`, print it with its config
  /// entry and exit.
  #[arg(long, requires = "owner")]
  generate_key: bool,

  /// Owner the generated key belongs to.
  #[arg(long)]
  owner: Option<String>,
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

  // Helper mode: hash a key and exit.
  if cli.hash_key {
    let key = read_stdin_line()?;
    println!("{}", digest_key(&key));
    return Ok(());
  }

  // Helper mode: mint a key and exit.
  if cli.generate_key {
    let owner = OwnerId::new(cli.owner.unwrap_or_default()).context("invalid --owner")?;
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    let key = hex::encode(bytes);
    println!("API key: {key}");
    println!();
    println!("[[api_keys]]");
    println!("owner = \"{owner}\"");
    println!("key_sha256 = \"{}\"", digest_key(&key));
    return Ok(());
  }

  let server_cfg = ServerConfig::load(&cli.config)?;
  let keys = server_cfg.api_keys()?;
  if keys.is_empty() {
    tracing::warn!("no API keys configured; every request will be rejected");
  }

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let app = trackplan_api::api_router(AppState::new(store, keys));
  let address = server_cfg.address();

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read one line from stdin, without its line terminator.
fn read_stdin_line() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("API key: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}
