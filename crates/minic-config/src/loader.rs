//! Configuration Loader
//!
//! Finds and layers configuration files, then applies environment overrides.

use crate::settings::{validate_log_level, MinicConfig};
use crate::{ConfigError, ConfigResult};
use std::env;
use std::path::{Path, PathBuf};

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "minic.toml";

/// Configuration loader
///
/// Precedence, lowest first:
/// 1. Defaults
/// 2. Global config (~/.minic/config.toml)
/// 3. Project config (minic.toml)
/// 4. Environment variables (MINIC_*)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Merged configuration with effective-value accessors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub settings: MinicConfig,

    /// Directory where minic.toml was found
    pub project_root: Option<PathBuf>,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use a specific global config file instead of ~/.minic/config.toml
    pub fn with_global_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Load configuration starting from the given directory.
    ///
    /// Walks up the directory tree to find minic.toml.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project) = self.find_project_config(start_dir)?;
        self.assemble(project_root, project)
    }

    /// Load configuration from a specific project config file
    pub fn load_from_file(&mut self, config_path: &Path) -> ConfigResult<Config> {
        let project = MinicConfig::load_from_file(config_path)?;
        let project_root = config_path.parent().map(|p| p.to_path_buf());
        self.assemble(project_root, project)
    }

    fn assemble(&mut self, project_root: Option<PathBuf>, project: MinicConfig) -> ConfigResult<Config> {
        let mut settings = self.load_global_config()?;
        settings.merge(&project);
        apply_env_overrides(&mut settings)?;

        tracing::debug!(
            project_root = ?project_root,
            "configuration loaded"
        );

        Ok(Config {
            settings,
            project_root,
        })
    }

    fn find_project_config(&self, start_dir: &Path) -> ConfigResult<(Option<PathBuf>, MinicConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                let config = MinicConfig::load_from_file(&config_path)?;
                return Ok((Some(current), config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, MinicConfig::default())),
            }
        }
    }

    /// Global config is optional; a missing file or home directory yields defaults
    fn load_global_config(&mut self) -> ConfigResult<MinicConfig> {
        if self.global_config_path.is_none() {
            self.global_config_path = global_config_path().ok();
        }

        match &self.global_config_path {
            Some(path) if path.exists() => MinicConfig::load_from_file(path),
            _ => Ok(MinicConfig::default()),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Get the global config file path (~/.minic/config.toml)
pub fn global_config_path() -> ConfigResult<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
    Ok(home.join(".minic").join("config.toml"))
}

/// Apply MINIC_* environment overrides
///
/// - MINIC_ENRICH, MINIC_UNUSED_WARNINGS: booleans
/// - MINIC_MAX_PROBLEMS: positive integer
/// - MINIC_SOURCE: diagnostic source name
/// - MINIC_LOG: log level
fn apply_env_overrides(config: &mut MinicConfig) -> ConfigResult<()> {
    if let Ok(value) = env::var("MINIC_ENRICH") {
        config
            .diagnostics
            .get_or_insert_with(Default::default)
            .enrich = Some(parse_bool(&value));
    }

    if let Ok(value) = env::var("MINIC_UNUSED_WARNINGS") {
        config
            .diagnostics
            .get_or_insert_with(Default::default)
            .unused_variable_warnings = Some(parse_bool(&value));
    }

    if let Ok(value) = env::var("MINIC_MAX_PROBLEMS") {
        let max = value
            .trim()
            .parse::<usize>()
            .ok()
            .filter(|max| *max > 0)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "MINIC_MAX_PROBLEMS".to_string(),
                reason: format!("expected a positive integer, got '{}'", value),
            })?;
        config
            .diagnostics
            .get_or_insert_with(Default::default)
            .max_problems = Some(max);
    }

    if let Ok(value) = env::var("MINIC_SOURCE") {
        config.diagnostics.get_or_insert_with(Default::default).source = Some(value);
    }

    if let Ok(value) = env::var("MINIC_LOG") {
        validate_log_level("MINIC_LOG", &value)?;
        config.logging.get_or_insert_with(Default::default).level = Some(value);
    }

    Ok(())
}

fn parse_bool(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

impl Config {
    pub fn enrich(&self) -> bool {
        self.settings
            .diagnostics
            .as_ref()
            .and_then(|d| d.enrich)
            .unwrap_or(true)
    }

    pub fn source(&self) -> &str {
        self.settings
            .diagnostics
            .as_ref()
            .and_then(|d| d.source.as_deref())
            .unwrap_or("minic")
    }

    pub fn max_problems(&self) -> usize {
        self.settings
            .diagnostics
            .as_ref()
            .and_then(|d| d.max_problems)
            .unwrap_or(100)
    }

    pub fn unused_variable_warnings(&self) -> bool {
        self.settings
            .diagnostics
            .as_ref()
            .and_then(|d| d.unused_variable_warnings)
            .unwrap_or(true)
    }

    pub fn generic_fallback(&self) -> bool {
        self.settings
            .quickfix
            .as_ref()
            .and_then(|q| q.generic_fallback)
            .unwrap_or(true)
    }

    pub fn extract_actions(&self) -> bool {
        self.settings
            .quickfix
            .as_ref()
            .and_then(|q| q.extract_actions)
            .unwrap_or(true)
    }

    /// Log level name, lowercase
    pub fn log_level(&self) -> String {
        self.settings
            .logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or("warn")
            .to_ascii_lowercase()
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// Check if this is a project (has minic.toml)
    pub fn is_project(&self) -> bool {
        self.project_root.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn create_config_file(dir: &Path, content: &str) -> PathBuf {
        let config_path = dir.join(PROJECT_CONFIG_FILE);
        fs::write(&config_path, content).unwrap();
        config_path
    }

    fn isolated_loader(temp_dir: &TempDir) -> ConfigLoader {
        ConfigLoader::with_global_path(temp_dir.path().join("no-global.toml"))
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.enrich());
        assert_eq!(config.source(), "minic");
        assert_eq!(config.max_problems(), 100);
        assert!(config.unused_variable_warnings());
        assert!(config.generic_fallback());
        assert!(config.extract_actions());
        assert_eq!(config.log_level(), "warn");
    }

    #[test]
    #[serial]
    fn test_find_config_in_parent() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[diagnostics]\nmax_problems = 7\n");
        let sub_dir = temp_dir.path().join("src");
        fs::create_dir(&sub_dir).unwrap();

        let config = isolated_loader(&temp_dir)
            .load_from_directory(&sub_dir)
            .unwrap();

        assert_eq!(config.max_problems(), 7);
        assert_eq!(config.project_root(), Some(temp_dir.path()));
    }

    #[test]
    #[serial]
    fn test_project_overrides_global() {
        let temp_dir = TempDir::new().unwrap();
        let global = temp_dir.path().join("global.toml");
        fs::write(&global, "[diagnostics]\nenrich = false\nsource = \"global\"\n").unwrap();
        let project = create_config_file(temp_dir.path(), "[diagnostics]\nsource = \"project\"\n");

        let config = ConfigLoader::with_global_path(global)
            .load_from_file(&project)
            .unwrap();

        assert_eq!(config.source(), "project");
        assert!(!config.enrich());
    }

    #[test]
    #[serial]
    fn test_env_overrides_project() {
        let temp_dir = TempDir::new().unwrap();
        create_config_file(temp_dir.path(), "[logging]\nlevel = \"info\"\n");

        env::set_var("MINIC_LOG", "TRACE");
        env::set_var("MINIC_ENRICH", "0");
        let config = isolated_loader(&temp_dir).load_from_directory(temp_dir.path());
        env::remove_var("MINIC_LOG");
        env::remove_var("MINIC_ENRICH");

        let config = config.unwrap();
        assert_eq!(config.log_level(), "trace");
        assert!(!config.enrich());
    }

    #[test]
    #[serial]
    fn test_invalid_env_value() {
        let temp_dir = TempDir::new().unwrap();

        env::set_var("MINIC_MAX_PROBLEMS", "lots");
        let result = isolated_loader(&temp_dir).load_from_directory(temp_dir.path());
        env::remove_var("MINIC_MAX_PROBLEMS");

        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    #[serial]
    fn test_invalid_toml_reports_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = create_config_file(temp_dir.path(), "[diagnostics\n");

        let err = isolated_loader(&temp_dir).load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::TomlParseError { ref file, .. } if file == &path));
    }
}
