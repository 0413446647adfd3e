/// Configuration system for clausescope.
///
/// Layered hierarchy, later layers win at the field level:
///
/// 1. **Built-in defaults**: [`schema::ClauseScopeConfig::default()`]
/// 2. **User global config**: `~/.clausescope/config.toml`
/// 3. **Project local config**: `.clausescope.toml` in the working directory
/// 4. **Environment variables**: `CLAUSESCOPE_*`
///
/// File layers are merged as TOML tables, so a file that only sets
/// `[ai] model` leaves every other key of the previous layer untouched.
pub mod schema;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};

pub use schema::{ClauseScopeConfig, StorageBackend};

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved configuration.
///
/// Malformed files are skipped rather than reported; a broken project file
/// must not stop the dashboard from starting.
pub fn load() -> ClauseScopeConfig {
    let mut merged = toml::Value::try_from(ClauseScopeConfig::default())
        .unwrap_or_else(|_| toml::Value::Table(toml::map::Map::new()));

    for path in [global_config_path(), project_config_path()] {
        if let Some(layer) = read_toml_layer(path) {
            merge_tables(&mut merged, layer);
        }
    }

    let mut config: ClauseScopeConfig = merged.try_into().unwrap_or_default();
    apply_env_overrides(&mut config);
    config
}

/// Parse a TOML file into a raw value tree, if it exists and is valid.
fn read_toml_layer(path: Option<PathBuf>) -> Option<toml::Value> {
    let path = path?;
    let content = fs::read_to_string(&path).ok()?;
    toml::from_str(&content).ok()
}

/// Deep-merge `overlay` into `base`: tables merge key by key, any other
/// value in the overlay replaces the base value.
fn merge_tables(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_tables(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// `~/.clausescope`, the home of the global config, the activity log and
/// (by default) the local record store.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".clausescope"))
}

fn global_config_path() -> Option<PathBuf> {
    home_dir().map(|dir| dir.join("config.toml"))
}

fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".clausescope.toml"))
}

/// Path to the global config file, for display.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Path to the project config file, for display.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

/// Root directory of the local record store.
pub fn data_dir(config: &ClauseScopeConfig) -> Option<PathBuf> {
    if config.storage.local_dir.trim().is_empty() {
        home_dir()
    } else {
        Some(PathBuf::from(config.storage.local_dir.trim()))
    }
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply `CLAUSESCOPE_*` overrides (highest precedence layer).
///
/// Supported variables:
/// - `CLAUSESCOPE_SERVER_ADDR`
/// - `CLAUSESCOPE_BACKEND_URL`
/// - `CLAUSESCOPE_AI_ENABLED` (`1`/`true`/`yes`/`on`)
/// - `CLAUSESCOPE_AI_BASE_URL`, `CLAUSESCOPE_AI_MODEL`, `CLAUSESCOPE_AI_API_KEY`
/// - `CLAUSESCOPE_AI_TIMEOUT_MS`
/// - `CLAUSESCOPE_STORAGE` (`local` | `github`), `CLAUSESCOPE_DATA_DIR`
/// - `CLAUSESCOPE_GITHUB_TOKEN`, `CLAUSESCOPE_GITHUB_OWNER`, `CLAUSESCOPE_GITHUB_REPO`
/// - `CLAUSESCOPE_LOG`
fn apply_env_overrides(config: &mut ClauseScopeConfig) {
    override_string("CLAUSESCOPE_SERVER_ADDR", &mut config.server.addr);
    override_string("CLAUSESCOPE_BACKEND_URL", &mut config.client.backend_url);

    if let Ok(val) = std::env::var("CLAUSESCOPE_AI_ENABLED") {
        config.ai.enabled = is_truthy(&val);
    }
    override_string("CLAUSESCOPE_AI_BASE_URL", &mut config.ai.base_url);
    override_string("CLAUSESCOPE_AI_MODEL", &mut config.ai.model);
    override_string("CLAUSESCOPE_AI_API_KEY", &mut config.ai.api_key);
    if let Ok(val) = std::env::var("CLAUSESCOPE_AI_TIMEOUT_MS")
        && let Ok(ms) = val.parse::<u64>()
    {
        config.ai.timeout_ms = ms;
    }

    if let Ok(val) = std::env::var("CLAUSESCOPE_STORAGE")
        && let Some(backend) = parse_storage_backend(&val)
    {
        config.storage.backend = backend;
    }
    override_string("CLAUSESCOPE_DATA_DIR", &mut config.storage.local_dir);
    override_string("CLAUSESCOPE_GITHUB_TOKEN", &mut config.storage.github_token);
    override_string("CLAUSESCOPE_GITHUB_OWNER", &mut config.storage.github_owner);
    override_string("CLAUSESCOPE_GITHUB_REPO", &mut config.storage.github_repo);

    if let Ok(val) = std::env::var("CLAUSESCOPE_LOG") {
        config.logging.enabled = is_truthy(&val);
    }
}

/// Replace `slot` with the variable's value when it is set and non-empty.
fn override_string(var: &str, slot: &mut String) {
    if let Ok(val) = std::env::var(var)
        && !val.is_empty()
    {
        *slot = val;
    }
}

/// Check if a string value represents a truthy boolean.
fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn parse_storage_backend(val: &str) -> Option<StorageBackend> {
    match val.to_ascii_lowercase().as_str() {
        "local" | "fs" | "file" => Some(StorageBackend::Local),
        "github" | "gh" => Some(StorageBackend::Github),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Config init / set / reset
// ---------------------------------------------------------------------------

/// Write the annotated default config to `~/.clausescope/config.toml`.
///
/// Refuses to overwrite an existing file unless `force` is set.
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.clausescope/ directory")?;
    }

    fs::write(&path, ClauseScopeConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set one dotted key (e.g. `ai.model`) in the global config file.
///
/// The key must exist in the schema; the new value is typed after the
/// existing one.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config file")?
    } else {
        toml::Value::try_from(ClauseScopeConfig::default())
            .context("failed to serialize default config")?
    };

    // Validate against the full schema so unknown keys are rejected even
    // when the file only holds a few sections.
    let mut schema_view = toml::Value::try_from(ClauseScopeConfig::default())
        .context("failed to serialize default config")?;
    merge_tables(&mut schema_view, root.clone());
    let typed = set_toml_value(&mut schema_view, key, value)?;
    insert_dotted(&mut root, key, typed)?;

    // Reject values that no longer deserialize (e.g. an unknown backend).
    let _: ClauseScopeConfig = schema_view
        .try_into()
        .with_context(|| format!("invalid value for '{key}': {value}"))?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    let output = toml::to_string_pretty(&root).context("failed to serialize config")?;
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML tree using a dotted key path, typed after the
/// existing value. Returns the value that was written.
fn set_toml_value(root: &mut toml::Value, key: &str, raw_value: &str) -> Result<toml::Value> {
    let (sections, leaf) = split_key(key)?;

    let mut current = root;
    for part in sections {
        current = current
            .get_mut(part)
            .with_context(|| format!("config key not found: section '{part}' in '{key}'"))?;
    }

    let table = current
        .as_table_mut()
        .with_context(|| format!("expected a table above '{key}'"))?;

    let new_value = match table.get(leaf) {
        Some(toml::Value::Boolean(_)) => toml::Value::Boolean(is_truthy(raw_value)),
        Some(toml::Value::Integer(_)) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        Some(toml::Value::Float(_)) => {
            let f: f64 = raw_value
                .parse()
                .with_context(|| format!("expected float for '{key}', got '{raw_value}'"))?;
            toml::Value::Float(f)
        }
        Some(toml::Value::String(_)) => toml::Value::String(raw_value.to_string()),
        Some(_) => anyhow::bail!("config key '{key}' cannot be set from the command line"),
        None => anyhow::bail!("config key not found: '{key}'"),
    };

    table.insert(leaf.to_string(), new_value.clone());
    Ok(new_value)
}

/// Insert `value` at a dotted path, creating intermediate tables.
fn insert_dotted(root: &mut toml::Value, key: &str, value: toml::Value) -> Result<()> {
    let (sections, leaf) = split_key(key)?;

    let mut current = root;
    for part in sections {
        let table = current
            .as_table_mut()
            .with_context(|| format!("expected a table above '{key}'"))?;
        current = table
            .entry(part.to_string())
            .or_insert_with(|| toml::Value::Table(toml::map::Map::new()));
    }

    current
        .as_table_mut()
        .with_context(|| format!("expected a table above '{key}'"))?
        .insert(leaf.to_string(), value);
    Ok(())
}

fn split_key(key: &str) -> Result<(Vec<&str>, &str)> {
    let mut parts: Vec<&str> = key.split('.').collect();
    match parts.pop() {
        Some(leaf) if !leaf.is_empty() => Ok((parts, leaf)),
        _ => anyhow::bail!("empty config key"),
    }
}

/// Reset the global config to defaults.
pub fn reset_config() -> Result<PathBuf> {
    init_config(true)
}

/// The effective config as TOML, with credentials masked.
pub fn show_effective_config() -> Result<String> {
    let config = load().redacted();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
