//! Configuration – reads/writes `~/.mnemo/config.toml`.

use mnemo_memory::MemoryConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted user configuration stored in `~/.mnemo/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// SQLite database file holding every record.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Base URL of the Ollama instance serving embeddings.
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,

    /// Embedding model name (e.g. "nomic-embed-text").
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Bearer token for an Ollama instance behind an auth proxy (stored as
    /// plain text; the file is written owner-only).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub embedding_api_key: String,

    /// Engine defaults (`[memory]` table).
    #[serde(default)]
    pub memory: MemoryConfig,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("db_path", &self.db_path)
            .field("ollama_url", &self.ollama_url)
            .field("embedding_model", &self.embedding_model)
            .field(
                "embedding_api_key",
                if self.embedding_api_key.is_empty() { &"<not set>" } else { &"<redacted>" },
            )
            .field("memory", &self.memory)
            .finish()
    }
}

fn default_db_path() -> PathBuf {
    mnemo_dir(&home_dir()).join("mnemo.db")
}
fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_embedding_model() -> String {
    "nomic-embed-text".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            ollama_url: default_ollama_url(),
            embedding_model: default_embedding_model(),
            embedding_api_key: String::new(),
            memory: MemoryConfig::default(),
        }
    }
}

fn home_dir() -> String {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string())
}

fn mnemo_dir(home: &str) -> PathBuf {
    PathBuf::from(home).join(".mnemo")
}

/// Return the path to `~/.mnemo/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(&home_dir())
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    mnemo_dir(home).join("config.toml")
}

/// Load the config from disk.  Returns `None` if the file does not exist.
pub fn load() -> Result<Option<Config>, String> {
    load_from(&config_path())
}

pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `MNEMO_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `MNEMO_DB_PATH` | `db_path` |
/// | `MNEMO_OLLAMA_URL` | `ollama_url` |
/// | `MNEMO_EMBEDDING_MODEL` | `embedding_model` |
/// | `MNEMO_EMBEDDING_API_KEY` | `embedding_api_key` |
/// | `MNEMO_TIMEOUT_MS` | `memory.call_timeout_ms` |
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("MNEMO_DB_PATH") {
        cfg.db_path = PathBuf::from(v);
    }
    if let Ok(v) = std::env::var("MNEMO_OLLAMA_URL") {
        cfg.ollama_url = v;
    }
    if let Ok(v) = std::env::var("MNEMO_EMBEDDING_MODEL") {
        cfg.embedding_model = v;
    }
    if let Ok(v) = std::env::var("MNEMO_EMBEDDING_API_KEY") {
        cfg.embedding_api_key = v;
    }
    if let Ok(v) = std::env::var("MNEMO_TIMEOUT_MS")
        && let Ok(ms) = v.parse::<u64>()
    {
        cfg.memory.call_timeout_ms = ms;
    }
}

/// Save the config to disk, creating `~/.mnemo/` if necessary.
pub fn save(cfg: &Config) -> Result<(), String> {
    save_to(cfg, &config_path())
}

pub(crate) fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        ensure_private_dir(parent)?;
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

/// Create `dir` (owner-only on Unix) if it does not exist yet.
pub fn ensure_private_dir(dir: &Path) -> Result<(), String> {
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create directory {}: {}", dir.display(), e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(dir, fs::Permissions::from_mode(0o700))
            .map_err(|e| format!("Failed to set permissions on {}: {}", dir.display(), e))?;
    }
    Ok(())
}
