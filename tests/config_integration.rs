use faq_chat_widget::config::AppConfig;
use serial_test::serial;
use std::env;
use std::fs;
use std::io::Write;
use std::time::Duration;

// Helper to clear environment variables that might interfere with tests
fn clear_env_vars() {
    unsafe {
        env::remove_var("CHAT_SERVER__PORT");
        env::remove_var("CHAT_QUERY__ENDPOINT");
        env::remove_var("CHAT_WIDGET__TITLE");
        env::remove_var("CHAT_STORE__MAX_WIDGETS");
        env::remove_var("CONFIG_FILE");
        env::remove_var("PORT");
        env::remove_var("BIND_HOST");
        env::remove_var("QUERY_ENDPOINT");
        env::remove_var("QUERY_TIMEOUT_SECS");
    }
}

fn load(args: &[&str]) -> Result<AppConfig, config::ConfigError> {
    let argv = std::iter::once("faq-chat-widget").chain(args.iter().copied());
    AppConfig::load_from_args(argv)
}

#[test]
#[serial]
fn test_default_config() {
    clear_env_vars();

    let config = load(&[]).expect("Failed to load default config");
    assert_eq!(config.server.port, 8080);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.query.endpoint, "http://127.0.0.1:3000/query/");
    assert_eq!(config.query_timeout(), None);

    let settings = config.widget_settings();
    assert_eq!(settings.title, "Chatbot");
    assert_eq!(settings.placeholder, "Type a message...");
    assert_eq!(settings.poll_interval_ms, 500);

    let limits = config.store_limits();
    assert_eq!(limits.max_widgets, 1000);
    assert_eq!(limits.idle_timeout, Duration::from_secs(1800));
}

#[test]
#[serial]
fn test_loaded_defaults_match_default_impl() {
    clear_env_vars();

    let loaded = load(&[]).expect("Failed to load default config");
    let built = AppConfig::default();
    assert_eq!(loaded.bind_address(), built.bind_address());
    assert_eq!(loaded.query.endpoint, built.query.endpoint);
    assert_eq!(loaded.widget_settings().title, built.widget_settings().title);
    assert_eq!(loaded.store_limits(), built.store_limits());
}

#[test]
#[serial]
fn test_store_limits_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_STORE__MAX_WIDGETS", "25");
    }

    let config = load(&[]).expect("Failed to load config");
    assert_eq!(config.store_limits().max_widgets, 25);

    clear_env_vars();
}

#[test]
#[serial]
fn test_env_override() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_SERVER__PORT", "9090");
        env::set_var("CHAT_QUERY__ENDPOINT", "http://qa.internal:8000/query/");
    }

    let config = load(&[]).expect("Failed to load config");
    assert_eq!(config.server.port, 9090);
    assert_eq!(
        config.query_endpoint().unwrap().host_str(),
        Some("qa.internal")
    );

    clear_env_vars();
}

#[test]
#[serial]
fn test_file_load() {
    clear_env_vars();

    let mut file = tempfile::Builder::new()
        .suffix(".yaml")
        .tempfile()
        .expect("Failed to create temp config");
    writeln!(
        file,
        r#"
server:
  port: 7070
query:
  endpoint: "http://10.0.0.5:3000/query/"
  timeout_secs: 15
widget:
  title: "Campus FAQ"
"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let config = load(&["--config", &path]).expect("Failed to load config from file");

    assert_eq!(config.server.port, 7070);
    assert_eq!(config.query.endpoint, "http://10.0.0.5:3000/query/");
    assert_eq!(config.query_timeout(), Some(Duration::from_secs(15)));
    assert_eq!(config.widget.title, "Campus FAQ");
    // Untouched keys keep their defaults.
    assert_eq!(config.widget.placeholder, "Type a message...");
}

#[test]
#[serial]
fn test_cli_beats_env_and_file() {
    clear_env_vars();
    unsafe {
        env::set_var("CHAT_SERVER__PORT", "9090");
    }

    let config = load(&["--port", "6060", "--query-timeout-secs", "3"])
        .expect("Failed to load config");
    assert_eq!(config.server.port, 6060);
    assert_eq!(config.query_timeout(), Some(Duration::from_secs(3)));
    assert_eq!(config.bind_address(), "0.0.0.0:6060");

    clear_env_vars();
}

#[test]
#[serial]
fn test_invalid_endpoint_rejected() {
    clear_env_vars();

    let result = load(&["--query-endpoint", "not a url"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_missing_explicit_file_rejected() {
    clear_env_vars();

    let result = load(&["--config", "/definitely/not/here.yaml"]);
    assert!(result.is_err());
}

#[test]
#[serial]
fn test_cwd_config_fallback() {
    clear_env_vars();

    let config_content = r#"
server:
  port: 6161
    "#;
    let cwd_path = "config.yaml";
    fs::write(cwd_path, config_content).expect("Failed to write ./config.yaml");

    let config = load(&[]);

    fs::remove_file(cwd_path).unwrap();

    assert_eq!(config.expect("Failed to load config").server.port, 6161);
}
