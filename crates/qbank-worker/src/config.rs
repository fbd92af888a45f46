use std::path::{Path, PathBuf};

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};

use qbank_engine::EngineSettings;
use qbank_engine::resolver::DEFAULT_SCAN_LIMIT;

/// One schema step: a pure edit of the raw config object.
type Migration = fn(&mut serde_json::Map<String, serde_json::Value>);

/// Schema steps in order. Entry `n` moves a config from version `n` to
/// `n + 1`, so adding a field means appending here.
const MIGRATIONS: [(&str, Migration); 1] = [("added response_scan_limit", add_response_scan_limit)];

/// Current config version.
const CURRENT_VERSION: u32 = MIGRATIONS.len() as u32;

/// Overrides the config location.
pub const CONFIG_ENV: &str = "QBANK_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Schema version. Missing or 0 = pre-versioned config.
    #[serde(default)]
    pub config_version: u32,
    /// Bank catalog JSON.
    pub catalog_path: PathBuf,
    /// Data snapshot read at the start of a run and written back at the end.
    pub snapshot_path: PathBuf,
    #[serde(default)]
    pub strict_invariants: bool,
    /// Added in v1.
    pub response_scan_limit: usize,
    #[serde(default = "default_cache_ttl_minutes")]
    pub cache_ttl_minutes: u32,
}

fn default_cache_ttl_minutes() -> u32 {
    60
}

impl WorkerConfig {
    pub fn new(catalog_path: impl Into<PathBuf>, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            config_version: CURRENT_VERSION,
            catalog_path: catalog_path.into(),
            snapshot_path: snapshot_path.into(),
            strict_invariants: false,
            response_scan_limit: DEFAULT_SCAN_LIMIT,
            cache_ttl_minutes: default_cache_ttl_minutes(),
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            strict_invariants: self.strict_invariants,
            response_scan_limit: self.response_scan_limit,
        }
    }

    pub fn cache_ttl(&self) -> SignedDuration {
        SignedDuration::from_mins(i64::from(self.cache_ttl_minutes))
    }
}

/// `$QBANK_CONFIG`, else `config.json` under the platform config directory.
pub fn config_path() -> eyre::Result<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::config_dir().ok_or_else(|| eyre::eyre!("no config directory found"))?;
    Ok(base.join("qbank").join("config.json"))
}

pub fn load_config_from(path: &Path) -> eyre::Result<WorkerConfig> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read config at {}: {e}", path.display()))?;

    // Migrate the raw JSON first; older shapes need not deserialize.
    let raw: serde_json::Value = serde_json::from_str(&contents)?;
    let version = stored_version(&raw)?;
    let config: WorkerConfig = serde_json::from_value(migrate(raw, version)?)?;

    if config.response_scan_limit == 0 {
        return Err(eyre::eyre!("response_scan_limit must be at least 1"));
    }
    Ok(config)
}

/// The `config_version` recorded in a raw config. Absent means 0.
fn stored_version(raw: &serde_json::Value) -> eyre::Result<u32> {
    match raw.get("config_version") {
        None | Some(serde_json::Value::Null) => Ok(0),
        Some(value) => {
            let number = value
                .as_u64()
                .ok_or_else(|| eyre::eyre!("config_version must be a non-negative integer, got {value}"))?;
            u32::try_from(number).map_err(|_| eyre::eyre!("config_version {number} is out of range"))
        }
    }
}

/// Bring a raw config from `from_version` up to the current version.
pub fn migrate(mut raw: serde_json::Value, from_version: u32) -> eyre::Result<serde_json::Value> {
    if from_version > CURRENT_VERSION {
        return Err(eyre::eyre!(
            "config_version {from_version} is newer than this build supports ({CURRENT_VERSION}); \
             update qbank-worker"
        ));
    }
    let object = raw
        .as_object_mut()
        .ok_or_else(|| eyre::eyre!("config is not a JSON object"))?;

    for (to_version, (change, step)) in (1u32..).zip(MIGRATIONS).skip(from_version as usize) {
        step(object);
        object.insert("config_version".to_string(), to_version.into());
        tracing::info!(to_version, change, "config migrated");
    }
    Ok(raw)
}

fn add_response_scan_limit(object: &mut serde_json::Map<String, serde_json::Value>) {
    object
        .entry("response_scan_limit")
        .or_insert(DEFAULT_SCAN_LIMIT.into());
}

pub fn save_config_to(path: &Path, config: &WorkerConfig) -> eyre::Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir)?;
    }

    // Always write the current version, regardless of what was loaded.
    let mut stamped = config.clone();
    stamped.config_version = CURRENT_VERSION;
    let json = serde_json::to_string_pretty(&stamped)?;

    // Write to a temp file then rename for atomicity
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())?;
    std::fs::rename(&tmp_path, path)?;

    tracing::info!(path = %path.display(), "config saved");
    Ok(())
}
