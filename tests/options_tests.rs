use std::time::Duration;
use mcp_servicenow::options::{ModelOptions, TransportOptions};

#[test]
fn test_transport_options_builder() {
    let options = TransportOptions::new()
        .with_timeout(Duration::from_secs(5))
        .with_proxy("http://proxy.example.com".to_string());

    match options {
        TransportOptions::Http { timeout, proxy } => {
            assert_eq!(timeout, Some(Duration::from_secs(5)));
            assert_eq!(proxy, Some("http://proxy.example.com".to_string()));
        }
    }
}

#[test]
fn test_transport_options_default_timeout() {
    assert_eq!(TransportOptions::new().timeout(), Some(Duration::from_secs(30)));
    assert_eq!(TransportOptions::new().proxy(), None);
}

#[test]
fn test_model_options_new() {
    let options = ModelOptions::new("gemini-1.5-flash");

    assert_eq!(options.model, "gemini-1.5-flash");
    assert_eq!(options.temperature, None);
    assert_eq!(options.response_mime_type, None);
}

#[test]
fn test_model_options_for_extraction() {
    let options = ModelOptions::for_extraction("gemini-1.5-flash");

    assert_eq!(options.model, "gemini-1.5-flash");
    assert_eq!(options.temperature, Some(0.0));
    assert_eq!(options.response_mime_type.as_deref(), Some("application/json"));
}

#[test]
fn test_model_options_serialization_skips_unset() {
    let options = ModelOptions::new("gemini-1.5-flash");
    let json = serde_json::to_value(&options).unwrap();

    assert_eq!(json, serde_json::json!({ "model": "gemini-1.5-flash" }));
}
