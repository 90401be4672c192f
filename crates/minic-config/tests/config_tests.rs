//! Configuration discovery and precedence

use minic_config::{ConfigError, ConfigLoader, MinicConfig};
use pretty_assertions::assert_eq;
use rstest::rstest;
use serial_test::serial;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_nearest_project_file_wins() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "minic.toml", "[diagnostics]\nmax_problems = 1\n");
    let nested = temp_dir.path().join("a").join("b");
    fs::create_dir_all(&nested).unwrap();
    write(&temp_dir.path().join("a"), "minic.toml", "[diagnostics]\nmax_problems = 2\n");

    let mut loader = ConfigLoader::with_global_path(temp_dir.path().join("absent.toml"));
    let config = loader.load_from_directory(&nested).unwrap();

    assert_eq!(config.max_problems(), 2);
    assert_eq!(config.project_root(), Some(temp_dir.path().join("a").as_path()));
}

#[test]
#[serial]
fn test_invalid_global_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let global = write(temp_dir.path(), "global.toml", "[logging]\nlevel = \"chatty\"\n");

    let mut loader = ConfigLoader::with_global_path(global);
    let result = loader.load_from_directory(temp_dir.path());

    assert!(matches!(
        result,
        Err(ConfigError::InvalidValue { ref field, .. }) if field == "logging.level"
    ));
}

#[rstest]
#[case("[quickfix]\ngeneric_fallback = false\n", false, true)]
#[case("[quickfix]\nextract_actions = false\n", true, false)]
#[case("", true, true)]
#[serial]
fn test_quickfix_switches(
    #[case] content: &str,
    #[case] generic_fallback: bool,
    #[case] extract_actions: bool,
) {
    let temp_dir = TempDir::new().unwrap();
    let path = write(temp_dir.path(), "minic.toml", content);

    let mut loader = ConfigLoader::with_global_path(temp_dir.path().join("absent.toml"));
    let config = loader.load_from_file(&path).unwrap();

    assert_eq!(config.generic_fallback(), generic_fallback);
    assert_eq!(config.extract_actions(), extract_actions);
}

#[test]
fn test_serialized_settings_snapshot() {
    let config: MinicConfig = toml::from_str(
        "[diagnostics]\nenrich = true\nmax_problems = 25\n\n[logging]\nlevel = \"info\"\n",
    )
    .unwrap();
    insta::assert_snapshot!(toml::to_string(&config).unwrap(), @r###"
    [diagnostics]
    enrich = true
    max_problems = 25

    [logging]
    level = "info"
    "###);
}
