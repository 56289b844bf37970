//! Config save/load roundtrip integration tests.

use hostshell_core::config::{Config, IsolationSetting, LogLevel};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[test]
fn test_config_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hostshell.json5");

    let config = Config::default();
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.terminal.isolation, config.terminal.isolation);
    assert_eq!(loaded.terminal.max_output_bytes, config.terminal.max_output_bytes);
    assert_eq!(loaded.terminal.pty, config.terminal.pty);
    assert_eq!(loaded.terminal.wait, config.terminal.wait);
}

#[test]
fn test_config_modify_and_reload() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("hostshell.json5");

    let mut config = Config::default();
    config.terminal.working_directory = PathBuf::from("/srv/agent");
    config.terminal.isolation = IsolationSetting::Sandbox;
    config.logging.level = LogLevel::Debug;
    config.save(&path).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.terminal.working_directory, PathBuf::from("/srv/agent"));
    assert_eq!(loaded.terminal.isolation, IsolationSetting::Sandbox);
    assert_eq!(loaded.logging.level, LogLevel::Debug);
    assert!(loaded.validate().is_ok());
}

#[test]
fn test_config_accepts_json5_syntax() {
    let config = Config::parse(
        r#"{
            // comments and trailing commas are fine
            terminal: {
                isolation: "none",
                wait: { settle_interval_ms: 100, },
            },
        }"#,
    )
    .unwrap();
    assert_eq!(config.terminal.isolation, IsolationSetting::None);
    assert_eq!(config.terminal.wait.settle_interval_ms, 100);
    assert_eq!(config.terminal.default_timeout_secs, 60);
}

#[test]
fn test_config_load_nonexistent() {
    let result = Config::load(Path::new("/nonexistent/hostshell.json5"));
    assert!(result.is_err());
}

#[test]
fn test_config_parse_invalid() {
    assert!(Config::parse("not valid json").is_err());
    assert!(Config::parse(r#"{ terminal: { isolation: "chroot" } }"#).is_err());
}
