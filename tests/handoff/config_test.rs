/*!
 * Configuration and Strategy Selection Tests
 */

use pretty_assertions::assert_eq;
use serial_test::serial;
use std::time::Duration;
use thread_handoff::{ConfigError, HandoffConfig, HandoffKind, HandoffProfile};

const CONFIG_VAR: &str = "HANDOFF_CONFIG";

#[test]
#[serial]
fn test_from_env_defaults_when_unset() {
    std::env::remove_var(CONFIG_VAR);
    let config = HandoffConfig::from_env().unwrap();
    assert_eq!(config, HandoffConfig::default());
}

#[test]
#[serial]
fn test_from_env_reads_json() {
    std::env::set_var(
        CONFIG_VAR,
        r#"{"preferred": "condition", "backoff": {"spin_limit": 4, "yield_limit": 8, "max_sleep": 200}}"#,
    );
    let config = HandoffConfig::from_env();
    std::env::remove_var(CONFIG_VAR);

    let config = config.unwrap();
    assert_eq!(config.preferred, Some(HandoffKind::Condition));
    assert_eq!(config.backoff.spin_limit, 4);
    assert_eq!(config.backoff.max_sleep, Duration::from_micros(200));
    assert_eq!(
        config.select(&HandoffProfile::hot_path()),
        HandoffKind::Condition
    );
}

#[test]
#[serial]
fn test_from_env_rejects_invalid() {
    std::env::set_var(CONFIG_VAR, r#"{"backoff": {"spin_limit": 90, "yield_limit": 10}}"#);
    let result = HandoffConfig::from_env();
    std::env::remove_var(CONFIG_VAR);

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[cfg(unix)]
#[test]
#[serial]
fn test_from_env_rejects_non_unicode() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    std::env::set_var(CONFIG_VAR, OsStr::from_bytes(b"{\"preferred\": \"\xff\"}"));
    let result = HandoffConfig::from_env();
    std::env::remove_var(CONFIG_VAR);

    assert!(matches!(result, Err(ConfigError::Malformed(_))));
}

#[test]
#[serial]
fn test_from_env_rejects_zero_initial_sleep() {
    std::env::set_var(
        CONFIG_VAR,
        r#"{"backoff": {"initial_sleep": 0, "max_sleep": 10000}}"#,
    );
    let result = HandoffConfig::from_env();
    std::env::remove_var(CONFIG_VAR);

    assert!(matches!(result, Err(ConfigError::Invalid(_))));
}

#[test]
fn test_config_serializes_durations_as_micros() {
    let json = serde_json::to_value(HandoffConfig::default()).unwrap();
    assert_eq!(json["backoff"]["max_sleep"], 1000);
    assert_eq!(json["preferred"], serde_json::Value::Null);
}

#[test]
fn test_default_selection_table() {
    let config = HandoffConfig::default();
    assert_eq!(config.select(&HandoffProfile::one_time()), HandoffKind::OneShot);
    assert_eq!(config.select(&HandoffProfile::repeated()), HandoffKind::Condition);
    assert_eq!(config.select(&HandoffProfile::hot_path()), HandoffKind::AtomicFlag);
}
