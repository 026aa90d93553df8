/// Bearer credential handling
use yahoo_map_mcp::config::extract_api_key;
use yahoo_map_mcp::*;

#[test]
fn test_bearer_header_yields_key() {
    let auth = AuthContext::from_header(Some("Bearer my-app-id"));
    assert_eq!(auth.api_key(), Ok("my-app-id"));
}

#[test]
fn test_missing_or_malformed_header_is_rejected() {
    assert_eq!(AuthContext::from_header(None).api_key(), Err(AuthError::MissingBearer));
    assert_eq!(
        AuthContext::from_header(Some("bearer lowercase")).api_key(),
        Err(AuthError::MissingBearer)
    );
    assert_eq!(extract_api_key(Some("Bearer ")), Err(AuthError::EmptyToken));
}

#[test]
fn test_stdio_key_from_config() {
    let config = AppConfig {
        transport: Transport::Stdio,
        api_key: Some("cli-key".to_string()),
        ..Default::default()
    };
    let auth = AuthContext::bearer(config.api_key.clone().unwrap());
    assert!(auth.is_authenticated());
}
