use std::io::Write;

use assert_matches::assert_matches;
use serde_json::{Value, json};
use url::Url;

use mg_download::auth::{AuthToken, Credentials};
use mg_download::catalog::CatalogClient;
use mg_download::error::MgError;

struct LoginEndpoint {
    response: Value,
}

impl CatalogClient for LoginEndpoint {
    fn fetch_json(&self, _url: &Url) -> Result<Value, MgError> {
        mg_download::catalog::reject_reported(self.response.clone())
    }

    fn download(&self, _url: &str, _sink: &mut dyn Write) -> Result<u64, MgError> {
        Err(MgError::TransferHttp("not implemented".to_string()))
    }
}

fn api() -> Url {
    Url::parse("https://api.mg-rast.org").unwrap()
}

fn never_connect(_: &AuthToken) -> Result<LoginEndpoint, MgError> {
    panic!("no login expected")
}

#[test]
fn explicit_token_skips_login() {
    let credentials = Credentials {
        token: Some("abc123".to_string()),
        user: Some("alice".to_string()),
        passwd: Some("secret".to_string()),
        stored: None,
    };
    let token = credentials.acquire(&api(), never_connect).unwrap();
    assert_eq!(token.unwrap().as_str(), "abc123");
}

#[test]
fn login_exchanges_credentials_for_token() {
    let credentials = Credentials {
        user: Some("alice".to_string()),
        passwd: Some("secret".to_string()),
        ..Credentials::default()
    };
    let token = credentials
        .acquire(&api(), |header| {
            assert_eq!(header.as_str(), "kbgo4711YWxpY2U6c2VjcmV0");
            Ok(LoginEndpoint {
                response: json!({ "token": "session-token" }),
            })
        })
        .unwrap();
    assert_eq!(token.unwrap().as_str(), "session-token");
}

#[test]
fn login_without_token_is_auth_error() {
    let credentials = Credentials {
        user: Some("alice".to_string()),
        passwd: Some("wrong".to_string()),
        ..Credentials::default()
    };
    let err = credentials
        .acquire(&api(), |_| {
            Ok(LoginEndpoint {
                response: json!({ "login": "alice" }),
            })
        })
        .unwrap_err();
    assert_matches!(err, MgError::Auth(_));
}

#[test]
fn user_without_password_is_rejected() {
    let credentials = Credentials {
        user: Some("alice".to_string()),
        ..Credentials::default()
    };
    let err = credentials.acquire(&api(), never_connect).unwrap_err();
    assert_matches!(err, MgError::IncompleteLogin);
    assert!(err.is_usage());
}

#[test]
fn login_rejected_by_server_is_auth_error() {
    let credentials = Credentials {
        user: Some("alice".to_string()),
        passwd: Some("wrong".to_string()),
        ..Credentials::default()
    };
    let err = credentials
        .acquire(&api(), |_| {
            Ok(LoginEndpoint {
                response: json!({ "ERROR": "invalid login" }),
            })
        })
        .unwrap_err();
    assert_matches!(err, MgError::Auth(message) if message.contains("invalid login"));
}
