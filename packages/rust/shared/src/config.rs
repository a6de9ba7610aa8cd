//! Application configuration for symptomfix.
//!
//! User config lives at `~/.symptomfix/symptomfix.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, SymptomFixError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "symptomfix.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".symptomfix";

// ---------------------------------------------------------------------------
// Config structs (matching symptomfix.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document store location.
    #[serde(default)]
    pub store: StoreSection,

    /// Cleanup behaviour.
    #[serde(default)]
    pub cleanup: CleanupSection,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSection {
    /// MongoDB connection string.
    #[serde(default = "default_uri")]
    pub uri: String,

    /// Database holding both collections.
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection of knowledge base rules.
    #[serde(default = "default_kb_collection")]
    pub knowledge_base_collection: String,

    /// Symptom lookup collection.
    #[serde(default = "default_symptom_collection")]
    pub symptom_collection: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            database: default_database(),
            knowledge_base_collection: default_kb_collection(),
            symptom_collection: default_symptom_collection(),
        }
    }
}

fn default_uri() -> String {
    "mongodb://localhost:27017/".into()
}
fn default_database() -> String {
    "dokter".into()
}
fn default_kb_collection() -> String {
    "knowledgebases".into()
}
fn default_symptom_collection() -> String {
    "symptoms".into()
}

/// `[cleanup]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupSection {
    /// Maintain `createdAt`/`updatedAt` the way the backend models do.
    #[serde(default = "default_true")]
    pub timestamps: bool,

    /// Compute the report without writing anything.
    #[serde(default)]
    pub dry_run: bool,
}

impl Default for CleanupSection {
    fn default() -> Self {
        Self {
            timestamps: true,
            dry_run: false,
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Connection settings handed to the store backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub uri: String,
    pub database: String,
    pub knowledge_base_collection: String,
    pub symptom_collection: String,
    /// Stamp `createdAt`/`updatedAt` on writes.
    pub timestamps: bool,
}

/// Values supplied on the command line. `None`/`false` means "not given".
#[derive(Debug, Clone, Default)]
pub struct RunOverrides {
    pub uri: Option<String>,
    pub database: Option<String>,
    pub knowledge_base_collection: Option<String>,
    pub symptom_collection: Option<String>,
    pub dry_run: bool,
    pub no_timestamps: bool,
}

/// Runtime configuration for one cleanup run.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub store: StoreConfig,
    pub dry_run: bool,
}

impl RunConfig {
    /// Merge CLI overrides on top of the loaded config and validate the result.
    pub fn resolve(config: &AppConfig, overrides: &RunOverrides) -> Result<Self> {
        let pick = |flag: &Option<String>, file: &str| {
            flag.clone().unwrap_or_else(|| file.to_string())
        };

        let store = StoreConfig {
            uri: pick(&overrides.uri, &config.store.uri),
            database: pick(&overrides.database, &config.store.database),
            knowledge_base_collection: pick(
                &overrides.knowledge_base_collection,
                &config.store.knowledge_base_collection,
            ),
            symptom_collection: pick(
                &overrides.symptom_collection,
                &config.store.symptom_collection,
            ),
            timestamps: config.cleanup.timestamps && !overrides.no_timestamps,
        };

        let run = Self {
            store,
            dry_run: config.cleanup.dry_run || overrides.dry_run,
        };
        run.validate()?;
        Ok(run)
    }

    fn validate(&self) -> Result<()> {
        let fields = [
            ("uri", &self.store.uri),
            ("database", &self.store.database),
            ("knowledge_base_collection", &self.store.knowledge_base_collection),
            ("symptom_collection", &self.store.symptom_collection),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(SymptomFixError::config(format!("{name} must not be empty")));
            }
        }
        if self.store.knowledge_base_collection == self.store.symptom_collection {
            return Err(SymptomFixError::config(format!(
                "knowledge base and symptom collections must differ (both are '{}')",
                self.store.symptom_collection
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.symptomfix/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| SymptomFixError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.symptomfix/symptomfix.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| SymptomFixError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        SymptomFixError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| SymptomFixError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let content = toml::to_string_pretty(&AppConfig::default())
        .map_err(|e| SymptomFixError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| SymptomFixError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("mongodb://localhost:27017/"));
        assert!(toml_str.contains("knowledgebases"));
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[store]
database = "dokter_staging"

[cleanup]
timestamps = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.store.database, "dokter_staging");
        assert_eq!(config.store.uri, "mongodb://localhost:27017/");
        assert_eq!(config.store.symptom_collection, "symptoms");
        assert!(!config.cleanup.timestamps);
        assert!(!config.cleanup.dry_run);
    }

    #[test]
    fn run_config_uses_defaults_without_overrides() {
        let run = RunConfig::resolve(&AppConfig::default(), &RunOverrides::default())
            .expect("resolve");
        assert_eq!(run.store.database, "dokter");
        assert_eq!(run.store.knowledge_base_collection, "knowledgebases");
        assert!(run.store.timestamps);
        assert!(!run.dry_run);
    }

    #[test]
    fn flags_override_file_values() {
        let mut config = AppConfig::default();
        config.store.database = "from_file".into();
        let overrides = RunOverrides {
            database: Some("from_flag".into()),
            dry_run: true,
            no_timestamps: true,
            ..Default::default()
        };
        let run = RunConfig::resolve(&config, &overrides).expect("resolve");
        assert_eq!(run.store.database, "from_flag");
        assert!(run.dry_run);
        assert!(!run.store.timestamps);
    }

    #[test]
    fn empty_database_is_rejected() {
        let overrides = RunOverrides {
            database: Some("  ".into()),
            ..Default::default()
        };
        let err = RunConfig::resolve(&AppConfig::default(), &overrides).unwrap_err();
        assert!(err.to_string().contains("database must not be empty"));
    }

    #[test]
    fn identical_collections_are_rejected() {
        let overrides = RunOverrides {
            symptom_collection: Some("knowledgebases".into()),
            ..Default::default()
        };
        let err = RunConfig::resolve(&AppConfig::default(), &overrides).unwrap_err();
        assert!(err.to_string().contains("must differ"));
    }

    #[test]
    fn load_from_missing_file_is_io_error() {
        let path = std::env::temp_dir().join("symptomfix_missing_dir/none.toml");
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, SymptomFixError::Io { .. }));
    }
}
