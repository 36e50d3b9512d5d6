// src/config/personalizer.rs
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, path::PathBuf};

pub const DEFAULT_PERSONALIZER_CONFIG_PATH: &str = "config/personalizer.toml";
pub const ENV_PERSONALIZER_CONFIG_PATH: &str = "PERSONALIZER_CONFIG_PATH";
pub const ENV_PERSONALIZER_ENDPOINT: &str = "PERSONALIZER_ENDPOINT";
pub const ENV_PERSONALIZER_API_KEY: &str = "PERSONALIZER_API_KEY";

fn default_enabled() -> bool {
    true
}
fn default_rank_timeout_secs() -> u64 {
    5
}
fn default_fetch_timeout_secs() -> u64 {
    10
}

/// Ranking service settings. Built once at startup and read-only afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonalizerConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Service base URL, e.g. `https://westeurope.api.cognitive.microsoft.com/`.
    #[serde(default)]
    pub endpoint: String,
    /// "ENV" means: read from PERSONALIZER_API_KEY
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_rank_timeout_secs")]
    pub rank_timeout_secs: u64,
    /// Per-feed fetch timeout; one slow feed never holds up the round past this.
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

impl Default for PersonalizerConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            endpoint: String::new(),
            api_key: "ENV".to_string(),
            rank_timeout_secs: default_rank_timeout_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl PersonalizerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading personalizer config from {}", path.display()))?;
        Self::from_toml_str(&data)
    }

    pub fn from_toml_str(s: &str) -> anyhow::Result<Self> {
        let cfg: PersonalizerConfig = toml::from_str(s).context("parsing personalizer config")?;
        Ok(cfg.resolve())
    }

    /// Resolve the config using env + fallbacks:
    /// 1) $PERSONALIZER_CONFIG_PATH (must exist)
    /// 2) config/personalizer.toml
    /// 3) built-in defaults (key from env, no endpoint unless $PERSONALIZER_ENDPOINT)
    pub fn load_default() -> anyhow::Result<Self> {
        if let Ok(p) = env::var(ENV_PERSONALIZER_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                anyhow::bail!("{ENV_PERSONALIZER_CONFIG_PATH} points to non-existent path");
            }
            return Self::load_from_file(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_PERSONALIZER_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        Ok(Self::default().resolve())
    }

    fn resolve(mut self) -> Self {
        if let Ok(endpoint) = env::var(ENV_PERSONALIZER_ENDPOINT) {
            if !endpoint.trim().is_empty() {
                self.endpoint = endpoint;
            }
        }
        self.endpoint = self.endpoint.trim().to_string();

        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key = env::var(ENV_PERSONALIZER_API_KEY).unwrap_or_default();
            if self.api_key.is_empty() {
                tracing::warn!("{ENV_PERSONALIZER_API_KEY} not set; ranking will fall back to feed order");
            }
        }
        self.api_key = self.api_key.trim().to_string();

        if self.rank_timeout_secs == 0 {
            self.rank_timeout_secs = default_rank_timeout_secs();
        }
        if self.fetch_timeout_secs == 0 {
            self.fetch_timeout_secs = default_fetch_timeout_secs();
        }
        self
    }

    /// Enabled, with both an endpoint and a credential.
    pub fn is_usable(&self) -> bool {
        self.enabled && !self.endpoint.is_empty() && !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[serial_test::serial]
    #[test]
    fn literal_key_and_defaults() {
        env::remove_var(ENV_PERSONALIZER_ENDPOINT);
        let cfg = PersonalizerConfig::from_toml_str(
            r#"
            endpoint = " https://svc.example/ "
            api_key = "abc"
            rank_timeout_secs = 0
            "#,
        )
        .unwrap();
        assert!(cfg.enabled);
        assert_eq!(cfg.endpoint, "https://svc.example/");
        assert_eq!(cfg.api_key, "abc");
        assert_eq!(cfg.rank_timeout_secs, 5);
        assert_eq!(cfg.fetch_timeout_secs, 10);
        assert!(cfg.is_usable());
    }

    #[serial_test::serial]
    #[test]
    fn env_key_and_endpoint_override() {
        env::set_var(ENV_PERSONALIZER_API_KEY, "from-env");
        env::set_var(ENV_PERSONALIZER_ENDPOINT, "https://override.example/");
        let cfg = PersonalizerConfig::from_toml_str(
            r#"
            endpoint = "https://file.example/"
            api_key = "ENV"
            "#,
        )
        .unwrap();
        env::remove_var(ENV_PERSONALIZER_API_KEY);
        env::remove_var(ENV_PERSONALIZER_ENDPOINT);

        assert_eq!(cfg.api_key, "from-env");
        assert_eq!(cfg.endpoint, "https://override.example/");
    }

    #[serial_test::serial]
    #[test]
    fn missing_env_key_means_not_usable() {
        env::remove_var(ENV_PERSONALIZER_API_KEY);
        env::remove_var(ENV_PERSONALIZER_ENDPOINT);
        let cfg = PersonalizerConfig::from_toml_str(
            r#"
            endpoint = "https://file.example/"
            api_key = "env"
            "#,
        )
        .unwrap();
        assert!(cfg.api_key.is_empty());
        assert!(!cfg.is_usable());

        let off = PersonalizerConfig::from_toml_str(
            r#"
            enabled = false
            endpoint = "https://file.example/"
            api_key = "k"
            "#,
        )
        .unwrap();
        assert!(!off.is_usable());
    }
}
