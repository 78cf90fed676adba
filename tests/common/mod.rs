//! Shared test fixtures and helpers.

#![allow(dead_code)]

use std::cell::Cell;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use gmail_watch::auth::{AuthError, ClientSecrets, Consent, TokenResponse};
use gmail_watch::settings::{GMAIL_READONLY_SCOPE, Settings};

pub fn scopes() -> Vec<String> {
    vec![GMAIL_READONLY_SCOPE.to_string()]
}

pub fn temp_dir() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().expect("failed to create temp dir");
    let dir = tmp.path().to_path_buf();
    (tmp, dir)
}

/// Write client_credentials.json pointing its token_uri at `token_uri`.
pub fn write_client_secrets(dir: &Path, token_uri: &str) -> PathBuf {
    let content = serde_json::json!({
        "installed": {
            "client_id": "test-client.apps.googleusercontent.com",
            "client_secret": "test-secret",
            "auth_uri": "https://accounts.google.com/o/oauth2/auth",
            "token_uri": token_uri,
            "redirect_uris": ["http://localhost"]
        }
    });
    let path = dir.join("client_credentials.json");
    std::fs::write(&path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
    path
}

/// Write token.json with the given access token, refresh token and expiry.
pub fn write_token(
    dir: &Path,
    token: &str,
    refresh_token: Option<&str>,
    expiry: &str,
    token_uri: &str,
) -> PathBuf {
    let mut content = serde_json::json!({
        "token": token,
        "token_uri": token_uri,
        "client_id": "test-client.apps.googleusercontent.com",
        "client_secret": "test-secret",
        "scopes": [GMAIL_READONLY_SCOPE],
        "expiry": expiry,
    });
    if let Some(refresh) = refresh_token {
        content["refresh_token"] = serde_json::Value::String(refresh.to_string());
    }
    let path = dir.join("token.json");
    std::fs::write(&path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
    path
}

/// A token good for another hour.
pub fn future_expiry() -> String {
    (chrono::Utc::now() + chrono::Duration::hours(1)).to_rfc3339()
}

pub fn past_expiry() -> String {
    (chrono::Utc::now() - chrono::Duration::hours(1)).to_rfc3339()
}

pub fn settings_for(dir: &Path, api_base: &str) -> Settings {
    Settings {
        project: Some("my-project".to_string()),
        topic: Some("gmail-events".to_string()),
        user: Some("me".to_string()),
        labels: vec!["INBOX".to_string()],
        label_filter_behavior: None,
        scopes: scopes(),
        token_file: dir.join("token.json"),
        client_secrets: dir.join("client_credentials.json"),
        api_base: api_base.to_string(),
        open_browser: false,
    }
}

/// Consent stand-in that hands back a fixed token and counts calls.
pub struct StubConsent {
    pub calls: Cell<usize>,
    pub access_token: String,
}

impl StubConsent {
    pub fn new(access_token: &str) -> Self {
        Self {
            calls: Cell::new(0),
            access_token: access_token.to_string(),
        }
    }
}

impl Consent for StubConsent {
    fn obtain(&self, _secrets: &ClientSecrets, _scopes: &[String]) -> Result<TokenResponse, AuthError> {
        self.calls.set(self.calls.get() + 1);
        Ok(TokenResponse {
            access_token: self.access_token.clone(),
            expires_in: Some(3599),
            refresh_token: Some("1//consented-refresh".to_string()),
            scope: Some(GMAIL_READONLY_SCOPE.to_string()),
            token_type: Some("Bearer".to_string()),
        })
    }
}

/// Consent that must not be reached.
pub struct NoConsent;

impl Consent for NoConsent {
    fn obtain(&self, _secrets: &ClientSecrets, _scopes: &[String]) -> Result<TokenResponse, AuthError> {
        panic!("consent flow should not run");
    }
}

/// Drop `expiry` from a token file, as older writers sometimes did.
pub fn strip_expiry(path: &Path) {
    let mut content: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
    content.as_object_mut().unwrap().remove("expiry");
    std::fs::write(path, serde_json::to_string_pretty(&content).unwrap()).unwrap();
}

/// Mock token endpoint that accepts one refresh and hands back `access_token`.
pub fn mock_refresh(server: &mut mockito::ServerGuard, access_token: &str) -> mockito::Mock {
    server
        .mock("POST", "/token")
        .match_body(mockito::Matcher::UrlEncoded(
            "grant_type".into(),
            "refresh_token".into(),
        ))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            serde_json::json!({
                "access_token": access_token,
                "expires_in": 3599,
                "token_type": "Bearer"
            })
            .to_string(),
        )
        .create()
}
