use std::collections::HashMap;
use std::time::Duration;

use mcp_servicenow::config::{Config, ConfigError, Credentials};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

const REQUIRED: [(&str, &str); 3] = [
    ("SERVICENOW_INSTANCE", "https://dev1.service-now.com/"),
    ("SERVICENOW_USERNAME", "admin"),
    ("SERVICENOW_PASSWORD", "secret"),
];

#[test]
fn test_required_settings_with_defaults() {
    let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();

    assert_eq!(config.instance_url, "https://dev1.service-now.com");
    assert_eq!(config.credentials, Credentials::new("admin", "secret"));
    assert_eq!(config.timeout, Duration::from_secs(30));
    assert!(config.gemini.is_none());
    assert_eq!(config.missing_optional(), vec!["GEMINI_API_KEY"]);
    assert_eq!(config.proxy, None);
}

#[test]
fn test_transport_options_carry_timeout_and_proxy() {
    let mut vars = REQUIRED.to_vec();
    vars.push(("SERVICENOW_TIMEOUT_SECS", "5"));
    vars.push(("MCP_SERVICENOW_PROXY", "http://proxy.corp:3128"));
    let config = Config::from_lookup(lookup(&vars)).unwrap();

    let options = config.transport_options();
    assert_eq!(options.timeout(), Some(Duration::from_secs(5)));
    assert_eq!(options.proxy(), Some("http://proxy.corp:3128"));

    let config = Config::from_lookup(lookup(&REQUIRED)).unwrap();
    assert_eq!(config.transport_options().proxy(), None);
}

#[test]
fn test_gemini_settings() {
    let mut vars = REQUIRED.to_vec();
    vars.push(("GEMINI_API_KEY", "key"));
    let config = Config::from_lookup(lookup(&vars)).unwrap();

    let gemini = config.gemini.unwrap();
    assert_eq!(gemini.api_key, "key");
    assert_eq!(gemini.model, "gemini-1.5-flash");
    assert_eq!(gemini.base_url, "https://generativelanguage.googleapis.com");

    vars.push(("GEMINI_MODEL", "gemini-2.0-flash"));
    let config = Config::from_lookup(lookup(&vars)).unwrap();
    assert_eq!(config.gemini.unwrap().model, "gemini-2.0-flash");
}

#[test]
fn test_all_missing_variables_are_reported_together() {
    let err = Config::from_lookup(lookup(&[("SERVICENOW_USERNAME", "  ")])).unwrap_err();

    assert_eq!(
        err,
        ConfigError::Missing(vec![
            "SERVICENOW_INSTANCE",
            "SERVICENOW_USERNAME",
            "SERVICENOW_PASSWORD"
        ])
    );
    assert!(err.to_string().contains("SERVICENOW_PASSWORD"));
}

#[test]
fn test_invalid_values() {
    let mut vars = REQUIRED.to_vec();
    vars[0] = ("SERVICENOW_INSTANCE", "dev1.service-now.com");
    assert!(matches!(
        Config::from_lookup(lookup(&vars)),
        Err(ConfigError::Invalid { name: "SERVICENOW_INSTANCE", .. })
    ));

    let mut vars = REQUIRED.to_vec();
    vars.push(("SERVICENOW_TIMEOUT_SECS", "soon"));
    assert!(matches!(
        Config::from_lookup(lookup(&vars)),
        Err(ConfigError::Invalid { name: "SERVICENOW_TIMEOUT_SECS", .. })
    ));
}

#[test]
fn test_secrets_are_redacted_in_debug() {
    let mut vars = REQUIRED.to_vec();
    vars.push(("GEMINI_API_KEY", "super-secret-key"));
    let config = Config::from_lookup(lookup(&vars)).unwrap();
    let debug = format!("{config:?}");

    assert!(!debug.contains("secret\""));
    assert!(!debug.contains("super-secret-key"));
    assert!(debug.contains("admin"));
}
