//! scoutpost.toml 통합 설정 테스트
//!
//! - scoutpost.toml.example 파싱 테스트
//! - 부분 설정 (일부 섹션만) 로딩 테스트
//! - 환경변수 우선순위 테스트
//! - 빈 파일 / 잘못된 형식 에러 테스트

use std::io::Write;

use scoutpost_core::config::ScoutpostConfig;
use scoutpost_core::error::{ConfigError, ScoutpostError};

const EXAMPLE: &str = include_str!("../../../scoutpost.toml.example");

// =============================================================================
// scoutpost.toml.example 파싱 테스트
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let config = ScoutpostConfig::parse(EXAMPLE).expect("example config should parse");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.engine.binary, "docker");
    assert_eq!(config.scan.output_mode, "text");
}

#[test]
fn example_config_passes_validation() {
    let config = ScoutpostConfig::parse(EXAMPLE).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_code_defaults() {
    let example = ScoutpostConfig::parse(EXAMPLE).expect("should parse");
    let defaults = ScoutpostConfig::default();

    assert_eq!(example.general.log_level, defaults.general.log_level);
    assert_eq!(example.general.log_format, defaults.general.log_format);
    assert_eq!(example.engine.binary, defaults.engine.binary);
    assert_eq!(example.engine.socket, defaults.engine.socket);
    assert_eq!(
        example.engine.connect_timeout_secs,
        defaults.engine.connect_timeout_secs
    );
    assert_eq!(
        example.engine.pull_before_scan,
        defaults.engine.pull_before_scan
    );
    assert_eq!(example.scan.subcommand, defaults.scan.subcommand);
    assert_eq!(example.scan.output_mode, defaults.scan.output_mode);
    assert_eq!(
        example.scan.command_timeout_secs,
        defaults.scan.command_timeout_secs
    );
    assert_eq!(
        example.scan.probe_before_scan,
        defaults.scan.probe_before_scan
    );
    assert_eq!(example.scan.extension_marker, defaults.scan.extension_marker);
    assert_eq!(
        example.scan.advisory_url_base,
        defaults.scan.advisory_url_base
    );
}

// =============================================================================
// 부분 설정 테스트
// =============================================================================

#[test]
fn partial_config_engine_only() {
    let toml = r#"
[engine]
binary = "podman"
pull_before_scan = false
"#;
    let config = ScoutpostConfig::parse(toml).expect("should parse");
    assert_eq!(config.engine.binary, "podman");
    assert!(!config.engine.pull_before_scan);
    assert_eq!(config.engine.connect_timeout_secs, 120);
    assert_eq!(config.scan.subcommand, "scout");
}

#[test]
fn partial_config_two_sections() {
    let toml = r#"
[general]
log_format = "json"

[scan]
probe_before_scan = false
"#;
    let config = ScoutpostConfig::parse(toml).expect("should parse");
    assert_eq!(config.general.log_format, "json");
    assert_eq!(config.general.log_level, "info");
    assert!(!config.scan.probe_before_scan);
}

// =============================================================================
// 환경변수 우선순위 테스트
// =============================================================================

fn with_env<T>(key: &str, value: &str, f: impl FnOnce() -> T) -> T {
    let original = std::env::var(key).ok();
    // SAFETY: #[serial]로 직렬화되어 환경변수 조작이 안전합니다.
    unsafe {
        std::env::set_var(key, value);
    }

    let result = f();

    // SAFETY: 테스트 정리
    unsafe {
        match original {
            Some(val) => std::env::set_var(key, val),
            None => std::env::remove_var(key),
        }
    }
    result
}

#[test]
#[serial_test::serial]
fn env_override_takes_precedence_over_toml() {
    let toml = r#"
[scan]
output_mode = "text"
"#;
    let result = with_env("SCOUTPOST_SCAN_OUTPUT_MODE", "structured", || {
        let mut config = ScoutpostConfig::parse(toml).expect("should parse");
        config.apply_env_overrides();
        config.scan.output_mode
    });
    assert_eq!(result, "structured");
}

#[test]
#[serial_test::serial]
fn env_override_bool_field() {
    let result = with_env("SCOUTPOST_ENGINE_PULL_BEFORE_SCAN", "false", || {
        let mut config = ScoutpostConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.engine.pull_before_scan
    });
    assert!(!result);
}

#[test]
#[serial_test::serial]
fn env_override_numeric_field() {
    let result = with_env("SCOUTPOST_SCAN_COMMAND_TIMEOUT_SECS", "42", || {
        let mut config = ScoutpostConfig::parse("").expect("should parse");
        config.apply_env_overrides();
        config.scan.command_timeout_secs
    });
    assert_eq!(result, 42);
}

#[test]
#[serial_test::serial]
fn env_override_invalid_numeric_keeps_toml_value() {
    let toml = r#"
[scan]
command_timeout_secs = 90
"#;
    let result = with_env("SCOUTPOST_SCAN_COMMAND_TIMEOUT_SECS", "soon", || {
        let mut config = ScoutpostConfig::parse(toml).expect("should parse");
        config.apply_env_overrides();
        config.scan.command_timeout_secs
    });
    assert_eq!(result, 90);
}

// =============================================================================
// 에러 처리 테스트
// =============================================================================

#[test]
fn empty_string_parses_with_defaults() {
    let config = ScoutpostConfig::parse("").expect("empty should parse");
    config.validate().expect("defaults should validate");
}

#[test]
fn comments_only_parses_with_defaults() {
    let config = ScoutpostConfig::parse("# nothing here\n# at all\n").expect("should parse");
    assert_eq!(config.engine.binary, "docker");
}

#[test]
fn malformed_toml_returns_parse_error() {
    let err = ScoutpostConfig::parse("[scan\noutput_mode = ").unwrap_err();
    assert!(matches!(
        err,
        ScoutpostError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn wrong_type_for_numeric_field() {
    let toml = r#"
[scan]
command_timeout_secs = "five minutes"
"#;
    let err = ScoutpostConfig::parse(toml).unwrap_err();
    assert!(matches!(
        err,
        ScoutpostError::Config(ConfigError::ParseFailed { .. })
    ));
}

#[test]
fn unknown_section_is_ignored() {
    let toml = r#"
[telemetry]
endpoint = "http://localhost:4317"

[engine]
binary = "nerdctl"
"#;
    let config = ScoutpostConfig::parse(toml).expect("unknown sections are ignored");
    assert_eq!(config.engine.binary, "nerdctl");
}

#[tokio::test]
async fn from_file_nonexistent_returns_file_not_found() {
    let err = ScoutpostConfig::from_file("/definitely/not/here/scoutpost.toml")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ScoutpostError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    writeln!(file, "[scan]\noutput_mode = \"sarif\"").expect("write");

    let err = ScoutpostConfig::from_file(file.path()).await.unwrap_err();
    assert!(err.to_string().contains("scan.output_mode"));
}

#[tokio::test]
async fn from_file_loads_example_from_disk() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(EXAMPLE.as_bytes()).expect("write");

    let config = ScoutpostConfig::from_file(file.path())
        .await
        .expect("example file should load");
    assert_eq!(config.scan.extension_marker, "Docker Scout");
}
