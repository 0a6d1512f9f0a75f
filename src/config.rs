use crate::error::{NutriError, Result};
use dialoguer::{Confirm, Input};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub rules: RulesConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Explicit database file; defaults to `<data_dir>/nutriexpert.db`
    pub database: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "warn".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RulesConfig {
    /// Insert the base rule set when the rules table is empty
    #[serde(default = "default_seed")]
    pub seed_defaults: bool,
}

fn default_seed() -> bool {
    true
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            seed_defaults: default_seed(),
        }
    }
}

impl Config {
    /// Load config from the override path or standard locations.
    /// Falls back to defaults when no file exists anywhere.
    pub fn load(config_override: Option<&PathBuf>) -> Result<Self> {
        let config_path = match config_override {
            Some(p) => {
                if !p.exists() {
                    return Err(NutriError::Config(format!(
                        "Config file not found at {:?}",
                        p
                    )));
                }
                p.clone()
            }
            None => match Self::find_config_path() {
                Some(p) => p,
                None => {
                    tracing::debug!("No config file found, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| NutriError::Config(format!("Failed to read config: {}", e)))?;

        Self::parse(&config_str)
    }

    fn parse(content: &str) -> Result<Self> {
        let content = Self::substitute_env_vars(content);
        serde_yaml::from_str(&content)
            .map_err(|e| NutriError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Search for config.yaml in standard locations.
    fn find_config_path() -> Option<PathBuf> {
        let local_config = PathBuf::from("config/config.yaml");
        if local_config.exists() {
            return Some(local_config);
        }

        dirs::config_dir()
            .map(|dir| dir.join("nutriexpert").join("config.yaml"))
            .filter(|p| p.exists())
    }

    /// Default path for writing new config files (~/.config/nutriexpert/config.yaml).
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| NutriError::Config("Cannot determine config directory".into()))?
            .join("nutriexpert");
        Ok(config_dir.join("config.yaml"))
    }

    /// Run interactive setup prompts and write config to disk.
    pub fn setup_interactive() -> Result<(Self, PathBuf)> {
        println!();
        println!("Let's set up NutriExpert!");
        println!();

        println!("Storage (leave blank for the default data directory)");
        let database: String = Input::new()
            .with_prompt("  Database file")
            .default(String::new())
            .allow_empty(true)
            .interact_text()
            .map_err(|e| NutriError::Config(format!("Input error: {}", e)))?;

        println!();
        println!("Logging");
        let level: String = Input::new()
            .with_prompt("  Level (error, warn, info, debug, trace)")
            .default(default_log_level())
            .interact_text()
            .map_err(|e| NutriError::Config(format!("Input error: {}", e)))?;

        println!();
        println!("Rules");
        let seed_defaults = Confirm::new()
            .with_prompt("  Seed the base rule set into an empty database?")
            .default(true)
            .interact()
            .map_err(|e| NutriError::Config(format!("Input error: {}", e)))?;

        println!();

        let config = Config {
            storage: StorageConfig {
                database: (!database.is_empty()).then(|| PathBuf::from(database)),
            },
            logging: LoggingConfig { level },
            rules: RulesConfig { seed_defaults },
        };

        let config_path = Self::default_config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let yaml = serde_yaml::to_string(&config)
            .map_err(|e| NutriError::Config(format!("Failed to serialize config: {}", e)))?;

        let content = format!(
            "# NutriExpert Configuration\n# Generated by `nutriexpert init`\n# Environment variable substitution (${{VAR}}) is supported.\n\n{}",
            yaml
        );
        std::fs::write(&config_path, content)?;

        println!("Configuration saved to {}", config_path.display());
        println!();

        Ok((config, config_path))
    }

    fn substitute_env_vars(content: &str) -> String {
        let mut result = content.to_string();

        let re = match regex_lite::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}") {
            Ok(re) => re,
            Err(_) => return result,
        };

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let placeholder = &cap[0];
            if let Ok(value) = std::env::var(var_name) {
                result = result.replace(placeholder, &value);
            }
        }

        result
    }

    pub fn data_dir(data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        // CLI override takes priority
        if let Some(dir) = data_dir_override {
            std::fs::create_dir_all(dir)?;
            return Ok(dir.clone());
        }

        if let Ok(dir) = std::env::var("NUTRIEXPERT_DATA_DIR") {
            let p = PathBuf::from(dir);
            std::fs::create_dir_all(&p)?;
            return Ok(p);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| NutriError::Config("Cannot determine data directory".into()))?
            .join("nutriexpert");

        std::fs::create_dir_all(&data_dir)?;
        Ok(data_dir)
    }

    pub fn db_path(&self, data_dir_override: Option<&PathBuf>) -> Result<PathBuf> {
        // An explicit --data-dir beats the config file
        if data_dir_override.is_none() {
            if let Some(ref path) = self.storage.database {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                return Ok(path.clone());
            }
        }
        Ok(Self::data_dir(data_dir_override)?.join("nutriexpert.db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = Config::parse("{}").unwrap();
        assert!(config.storage.database.is_none());
        assert_eq!(config.logging.level, "warn");
        assert!(config.rules.seed_defaults);
    }

    #[test]
    fn parses_all_sections() {
        let yaml = r#"
storage:
  database: /tmp/rules.db
logging:
  level: debug
rules:
  seed_defaults: false
"#;
        let config = Config::parse(yaml).unwrap();
        assert_eq!(config.storage.database, Some(PathBuf::from("/tmp/rules.db")));
        assert_eq!(config.logging.level, "debug");
        assert!(!config.rules.seed_defaults);
    }

    #[test]
    fn substitutes_environment_variables() {
        std::env::set_var("NUTRIEXPERT_TEST_LOG_LEVEL", "trace");
        let config = Config::parse("logging:\n  level: ${NUTRIEXPERT_TEST_LOG_LEVEL}\n").unwrap();
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn unset_variables_are_left_in_place() {
        let out = Config::substitute_env_vars("x: ${NUTRIEXPERT_SURELY_UNSET_VAR}");
        assert_eq!(out, "x: ${NUTRIEXPERT_SURELY_UNSET_VAR}");
    }

    #[test]
    fn malformed_yaml_is_a_config_error() {
        let err = Config::parse("logging: [unterminated").unwrap_err();
        assert!(matches!(err, NutriError::Config(_)));
    }

    #[test]
    fn explicit_database_path_wins_without_override() {
        let dir = std::env::temp_dir().join("nutriexpert-config-test");
        let mut config = Config::default();
        config.storage.database = Some(dir.join("custom.db"));
        assert_eq!(config.db_path(None).unwrap(), dir.join("custom.db"));
    }
}
