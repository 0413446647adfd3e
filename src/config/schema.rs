/// Configuration schema and defaults for clausescope.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[server]`, `[client]`, `[ai]`, `[storage]` and `[logging]`.
///
/// Every field has a built-in default, so a config file only needs the
/// values it wants to change.
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level clausescope configuration.
///
/// Maps directly to `~/.clausescope/config.toml` and `.clausescope.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClauseScopeConfig {
    pub server: ServerConfig,
    pub client: ClientConfig,
    pub ai: AiConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

// ---------------------------------------------------------------------------
// [server]
// ---------------------------------------------------------------------------

/// HTTP backend settings for `clausescope serve`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address (`host:port`).
    pub addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8750".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [client]
// ---------------------------------------------------------------------------

/// Settings used by the CLI when it talks to a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of a running `clausescope serve`. Empty means the CLI runs
    /// the analysis and store in-process.
    pub backend_url: String,
    /// Transport timeout for backend requests (milliseconds).
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            backend_url: String::new(),
            timeout_ms: 60_000,
        }
    }
}

// ---------------------------------------------------------------------------
// [ai]
// ---------------------------------------------------------------------------

/// AI engine settings (any OpenAI-compatible chat completions endpoint).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    /// Whether the AI engine runs at all. When disabled the AI panel carries
    /// an error and the rule-based result is still produced.
    pub enabled: bool,
    /// API base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Bearer token. Prefer `CLAUSESCOPE_AI_API_KEY` over writing it to disk.
    pub api_key: String,
    /// Request timeout (milliseconds).
    pub timeout_ms: u64,
    /// Response token cap.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.aimlapi.com/v1".to_string(),
            model: "google/gemma-3-12b-it".to_string(),
            api_key: String::new(),
            timeout_ms: 30_000,
            max_tokens: 500,
            temperature: 0.2,
        }
    }
}

// ---------------------------------------------------------------------------
// [storage]
// ---------------------------------------------------------------------------

/// Which record store backs saved analyses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackend {
    /// Plain files under `storage.local_dir`.
    #[default]
    Local,
    /// A GitHub repository via the contents API.
    Github,
}

impl std::fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Github => write!(f, "github"),
        }
    }
}

/// Record store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Root directory for the local store. Empty means `~/.clausescope`.
    pub local_dir: String,
    pub github_token: String,
    pub github_owner: String,
    pub github_repo: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            local_dir: String::new(),
            github_token: String::new(),
            github_owner: String::new(),
            github_repo: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// [logging]
// ---------------------------------------------------------------------------

/// Activity log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Append events to `~/.clausescope/activity.jsonl`.
    pub enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ---------------------------------------------------------------------------
// Secrets
// ---------------------------------------------------------------------------

impl ClauseScopeConfig {
    /// Return a copy with credentials replaced by a mask, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.ai.api_key = mask(&copy.ai.api_key);
        copy.storage.github_token = mask(&copy.storage.github_token);
        copy
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "********".to_string()
    }
}

// ---------------------------------------------------------------------------
// Default TOML content
// ---------------------------------------------------------------------------

impl ClauseScopeConfig {
    /// Annotated default config file content, written by `config init`.
    pub fn default_toml() -> String {
        r#"# clausescope configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (CLAUSESCOPE_*)
#   2. Project config (.clausescope.toml in current directory)
#   3. User global config (~/.clausescope/config.toml)
#   4. Built-in defaults

[server]
addr = "127.0.0.1:8750"

[client]
backend_url = ""          # Empty: analyze and store in-process
timeout_ms = 60000

[ai]
enabled = true
base_url = "https://api.aimlapi.com/v1"
model = "google/gemma-3-12b-it"
api_key = ""              # Prefer CLAUSESCOPE_AI_API_KEY
timeout_ms = 30000
max_tokens = 500
temperature = 0.2

[storage]
backend = "local"         # local | github
local_dir = ""            # Empty: ~/.clausescope
github_token = ""         # Prefer CLAUSESCOPE_GITHUB_TOKEN
github_owner = ""
github_repo = ""

[logging]
enabled = true
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_expected_values() {
        let cfg = ClauseScopeConfig::default();
        assert_eq!(cfg.server.addr, "127.0.0.1:8750");
        assert!(cfg.client.backend_url.is_empty());
        assert!(cfg.ai.enabled);
        assert_eq!(cfg.ai.max_tokens, 500);
        assert_eq!(cfg.storage.backend, StorageBackend::Local);
        assert!(cfg.logging.enabled);
    }

    #[test]
    fn empty_toml_produces_defaults() {
        let cfg: ClauseScopeConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.ai.model, "google/gemma-3-12b-it");
        assert_eq!(cfg.client.timeout_ms, 60_000);
    }

    #[test]
    fn deserialize_partial_toml() {
        let toml_str = r#"
[storage]
backend = "github"
github_owner = "acme"
github_repo = "contracts"

[ai]
enabled = false
"#;
        let cfg: ClauseScopeConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Github);
        assert_eq!(cfg.storage.github_owner, "acme");
        assert!(!cfg.ai.enabled);
        assert_eq!(cfg.ai.timeout_ms, 30_000);
    }

    #[test]
    fn default_toml_parses_back() {
        let cfg: ClauseScopeConfig = toml::from_str(&ClauseScopeConfig::default_toml()).unwrap();
        assert_eq!(cfg.server.addr, "127.0.0.1:8750");
        assert_eq!(cfg.storage.backend, StorageBackend::Local);
    }

    #[test]
    fn redacted_masks_only_present_secrets() {
        let mut cfg = ClauseScopeConfig::default();
        cfg.ai.api_key = "sk-live".to_string();
        let shown = cfg.redacted();
        assert_eq!(shown.ai.api_key, "********");
        assert_eq!(shown.storage.github_token, "");
    }

    #[test]
    fn storage_backend_display() {
        assert_eq!(StorageBackend::Local.to_string(), "local");
        assert_eq!(StorageBackend::Github.to_string(), "github");
    }
}
