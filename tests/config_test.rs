//! Config loading and defaults integration tests

use std::io::Write;
use std::net::IpAddr;

use user_insights::Config;

#[test]
fn test_default_config_values() {
    let config = Config::default();

    assert_eq!(config.server.http_port, 8080);
    assert_eq!(config.server.bind_addr, IpAddr::from([0, 0, 0, 0]));
    assert_eq!(config.server.max_upload_bytes, 64 * 1024 * 1024);
    assert_eq!(config.analytics.top_countries_limit, 5);
    assert_eq!(config.evaluation.timeout_ms, 5000);
    assert_eq!(
        config.evaluation.targets,
        vec![
            "/superusers",
            "/top-countries",
            "/team-insights",
            "/active-users-per-day"
        ]
    );
}

#[test]
fn test_empty_sections_use_defaults() {
    let toml_str = r#"
[server]

[analytics]

[evaluation]
"#;

    let config: Config = toml::from_str(toml_str).expect("valid TOML");
    assert_eq!(config.server.http_port, 8080);
    assert_eq!(config.analytics.top_countries_limit, 5);
    assert!(config.evaluation.base_url.is_none());
}

#[test]
fn test_config_with_all_fields() {
    let toml_str = r#"
[server]
bind_addr = "127.0.0.1"
http_port = 9090
max_upload_bytes = 1048576

[analytics]
top_countries_limit = 10

[evaluation]
base_url = "http://insights.local:9090"
timeout_ms = 250
targets = ["/superusers", "/team-insights"]
"#;

    let config: Config = toml::from_str(toml_str).expect("valid TOML");

    assert_eq!(config.listen_addr().to_string(), "127.0.0.1:9090");
    assert_eq!(config.server.max_upload_bytes, 1_048_576);
    assert_eq!(config.analytics.top_countries_limit, 10);
    assert_eq!(config.evaluation_base_url(), "http://insights.local:9090");
    assert_eq!(config.evaluation_timeout().as_millis(), 250);
    assert_eq!(config.evaluation.targets.len(), 2);
    assert!(config.validate().is_ok());
}

#[test]
fn test_load_missing_file_falls_back_to_defaults() {
    let dir = tempfile::TempDir::new().unwrap();
    let config = Config::load(dir.path().join("absent.toml")).unwrap();
    assert_eq!(config.server.http_port, 8080);
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nhttp_port = 7000").unwrap();

    let config = Config::load(file.path()).unwrap();
    assert_eq!(config.server.http_port, 7000);
    assert_eq!(config.evaluation.timeout_ms, 5000);
}

#[test]
fn test_load_rejects_invalid_values() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[analytics]\ntop_countries_limit = 0").unwrap();
    assert!(Config::load(file.path()).is_err());

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[server]\nhttp_port = \"eighty\"").unwrap();
    assert!(Config::load(file.path()).is_err());
}
