//! Index configuration (§6) and environment-derived runtime configuration.
//!
//! Every environment variable the engine consults is read once, here, into
//! [`RuntimeConfig`], so downstream business logic takes an explicit config
//! value instead of calling `std::env::var` itself (§9 "global mutable
//! state" redesign flag).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{
    CONSOLIDATION_DEFAULT_INTERVAL_SECS, DEFAULT_COLLECTION_PATTERN,
    DEFAULT_HOOK_DEDUP_WINDOW_SECS,
};
use crate::error::{Error, Result};

/// One collection entry of `~/.config/clawmem/index.yml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionConfig {
    pub name: String,
    pub path: PathBuf,
    #[serde(default = "default_pattern")]
    pub pattern: String,
    #[serde(default)]
    pub context: HashMap<String, String>,
    #[serde(default)]
    pub update: Option<String>,
}

fn default_pattern() -> String {
    DEFAULT_COLLECTION_PATTERN.to_string()
}

/// The full index configuration file (§6).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    #[serde(default)]
    pub collections: Vec<CollectionConfig>,
    #[serde(default)]
    pub global_context: Option<String>,
    #[serde(default)]
    pub directory_context: bool,
}

impl IndexConfig {
    /// Load from an explicit path, or the default
    /// `~/.config/clawmem/index.yml` when `path` is `None`. Missing files
    /// yield an empty (default) configuration rather than an error, matching
    /// the teacher's `load_config` fail-open stance for a fresh install.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let resolved = match path {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        match std::fs::read_to_string(&resolved) {
            Ok(contents) => serde_yaml::from_str(&contents)
                .map_err(|e| Error::InvalidInput(format!("invalid index.yml: {e}"))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(IndexConfig::default()),
            Err(e) => Err(Error::Internal(e.into())),
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs_home()
        .join(".config")
        .join("clawmem")
        .join("index.yml")
}

fn dirs_home() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Environment-derived runtime configuration (§6's environment variable
/// list). Read once at process startup via [`RuntimeConfig::from_env`].
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    pub embed_url: Option<String>,
    pub llm_url: Option<String>,
    pub rerank_url: Option<String>,
    pub enable_amem: bool,
    pub enable_consolidation: bool,
    pub consolidation_interval_secs: u64,
    pub heartbeat_patterns: Vec<String>,
    pub disable_heartbeat_suppression: bool,
    pub hook_dedup_window_secs: u64,
    pub index_path: Option<PathBuf>,
    pub no_color: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            embed_url: None,
            llm_url: None,
            rerank_url: None,
            enable_amem: true,
            enable_consolidation: true,
            consolidation_interval_secs: CONSOLIDATION_DEFAULT_INTERVAL_SECS,
            heartbeat_patterns: default_heartbeat_patterns(),
            disable_heartbeat_suppression: false,
            hook_dedup_window_secs: DEFAULT_HOOK_DEDUP_WINDOW_SECS,
            index_path: None,
            no_color: false,
        }
    }
}

fn default_heartbeat_patterns() -> Vec<String> {
    vec![
        "<system-heartbeat>".to_string(),
        "ping".to_string(),
        "keepalive".to_string(),
    ]
}

impl RuntimeConfig {
    #[must_use]
    pub fn from_env() -> Self {
        let mut cfg = RuntimeConfig::default();

        cfg.embed_url = env_nonempty("CLAWMEM_EMBED_URL");
        cfg.llm_url = env_nonempty("CLAWMEM_LLM_URL");
        cfg.rerank_url = env_nonempty("CLAWMEM_RERANK_URL");

        if let Some(v) = env_bool("CLAWMEM_ENABLE_AMEM") {
            cfg.enable_amem = v;
        }
        if let Some(v) = env_bool("CLAWMEM_ENABLE_CONSOLIDATION") {
            cfg.enable_consolidation = v;
        }
        if let Some(secs) = std::env::var("CLAWMEM_CONSOLIDATION_INTERVAL")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.consolidation_interval_secs = secs;
        }
        if let Some(patterns) = env_nonempty("CLAWMEM_HEARTBEAT_PATTERNS") {
            cfg.heartbeat_patterns = patterns.split(',').map(|s| s.trim().to_string()).collect();
        }
        if let Some(v) = env_bool("CLAWMEM_DISABLE_HEARTBEAT_SUPPRESSION") {
            cfg.disable_heartbeat_suppression = v;
        }
        if let Some(secs) = std::env::var("CLAWMEM_HOOK_DEDUP_WINDOW_SEC")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            cfg.hook_dedup_window_secs = secs;
        }
        cfg.index_path = env_nonempty("INDEX_PATH").map(PathBuf::from);
        cfg.no_color = std::env::var_os("NO_COLOR").is_some();

        cfg
    }

    /// Resolve the SQLite-compatible database path: `INDEX_PATH` override,
    /// else `$XDG_CACHE_HOME/clawmem/index.sqlite` (§6).
    #[must_use]
    pub fn resolve_db_path(&self) -> PathBuf {
        if let Some(p) = &self.index_path {
            return p.clone();
        }
        xdg_cache_home()
            .join("clawmem")
            .join("index.sqlite")
    }
}

fn xdg_cache_home() -> PathBuf {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| dirs_home().join(".cache"))
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|v| {
        matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_config_file_is_empty_default() {
        let cfg = IndexConfig::load(Some(Path::new("/nonexistent/index.yml"))).unwrap();
        assert!(cfg.collections.is_empty());
        assert!(!cfg.directory_context);
    }

    #[test]
    fn parses_collection_with_defaults() {
        let yaml = r#"
collections:
  - name: notes
    path: /home/user/notes
"#;
        let cfg: IndexConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.collections.len(), 1);
        assert_eq!(cfg.collections[0].pattern, "**/*.md");
    }

    #[test]
    fn runtime_config_defaults_are_sane() {
        let cfg = RuntimeConfig::default();
        assert!(cfg.enable_amem);
        assert!(cfg.enable_consolidation);
        assert_eq!(cfg.hook_dedup_window_secs, 600);
    }
}
