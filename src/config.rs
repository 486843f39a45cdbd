use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FilesearchConfig {
    pub database: Option<String>,
    /// Gitignore-style patterns skipped by `add`
    #[serde(default)]
    pub exclude: Vec<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("filesearch.toml")
}

fn home_dir() -> Option<PathBuf> {
    std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".filesearch").join("filesearch.db")
}

/// `~/.filesearch/filesearch.db`, or relative to the working directory when
/// no home directory is known
pub fn default_database_path() -> PathBuf {
    default_database_path_in(&home_dir().unwrap_or_default())
}

/// Read the config file. An explicitly named file must exist; the default
/// `filesearch.toml` is optional.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<FilesearchConfig>> {
    let explicit = path.is_some();
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        if explicit {
            anyhow::bail!("config file {} does not exist", path.display());
        }
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: FilesearchConfig = toml::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("invalid config {}: {}", path.display(), e))?;
    tracing::debug!("Loaded config from {}", path.display());
    Ok(Some(config))
}

/// `--db` wins over the config file, which wins over the default location
pub fn resolve_database(cli_db: Option<PathBuf>, config: Option<&FilesearchConfig>) -> PathBuf {
    cli_db
        .or_else(|| config.and_then(|c| c.database.as_ref()).map(PathBuf::from))
        .unwrap_or_else(default_database_path)
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
