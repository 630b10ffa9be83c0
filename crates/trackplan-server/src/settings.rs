//! Runtime configuration, deserialised from `config.toml` and `TRACKPLAN_*`
//! environment variables.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use config::{ConfigBuilder, builder::DefaultState};
use serde::Deserialize;
use trackplan_api::ApiKeys;
use trackplan_core::OwnerId;

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:       String,
  #[serde(default = "default_port")]
  pub port:       u16,
  pub store_path: PathBuf,
  #[serde(default)]
  pub api_keys:   Vec<ApiKeyEntry>,
}

/// One accepted API key. Only the digest is stored, never the key itself.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeyEntry {
  pub owner:      String,
  /// Hex SHA-256 of the key, as printed by `--hash-key`.
  pub key_sha256: String,
}

impl ServerConfig {
  /// Layer the file at `path` (optional) under the environment.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    Self::from_builder(
      config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("TRACKPLAN")),
    )
  }

  fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
    builder
      .build()
      .context("failed to read config file")?
      .try_deserialize()
      .context("failed to deserialise ServerConfig")
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }

  /// Build the key table, rejecting malformed digests and blank owners.
  pub fn api_keys(&self) -> anyhow::Result<ApiKeys> {
    let mut keys = ApiKeys::new();
    for (i, entry) in self.api_keys.iter().enumerate() {
      let digest = entry.key_sha256.trim();
      if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
        bail!("api_keys[{i}].key_sha256 is not a hex SHA-256 digest");
      }
      let owner = OwnerId::new(entry.owner.as_str())
        .with_context(|| format!("api_keys[{i}].owner"))?;
      keys.insert_digest(digest, owner);
    }
    Ok(keys)
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
