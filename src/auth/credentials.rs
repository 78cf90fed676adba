//! Cached OAuth credential in Google's "authorized user" JSON shape.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

use super::client_secrets::ClientSecrets;
use super::endpoint::TokenResponse;
use super::error::AuthError;

pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens this close to expiry are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

/// Lifetime assumed when a token response omits `expires_in`.
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Load a cached token file. Scopes default to `scopes` when the file has none.
    ///
    /// A file without `expiry` gives no way to tell how old the access token is,
    /// so it is loaded as already expired.
    pub fn from_authorized_user_file(path: &Path, scopes: &[String]) -> Result<Self, AuthError> {
        Self::from_authorized_user_file_at(path, scopes, Utc::now())
    }

    pub fn from_authorized_user_file_at(
        path: &Path,
        scopes: &[String],
        now: DateTime<Utc>,
    ) -> Result<Self, AuthError> {
        let data = std::fs::read(path).map_err(|source| AuthError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut creds: Credentials =
            serde_json::from_slice(&data).map_err(|source| AuthError::MalformedToken {
                path: path.to_path_buf(),
                source,
            })?;
        if creds.scopes.is_empty() {
            creds.scopes = scopes.to_vec();
        }
        if creds.expiry.is_none() {
            creds.expiry = Some(now);
        }
        Ok(creds)
    }

    /// Build a fresh credential from an authorization-code exchange.
    pub fn from_token_response(
        resp: TokenResponse,
        secrets: &ClientSecrets,
        scopes: &[String],
        now: DateTime<Utc>,
    ) -> Self {
        let mut creds = Credentials {
            token: None,
            refresh_token: None,
            token_uri: secrets.token_uri.clone(),
            client_id: Some(secrets.client_id.clone()),
            client_secret: Some(secrets.client_secret.clone()),
            scopes: scopes.to_vec(),
            expiry: None,
        };
        creds.apply(resp, now);
        creds
    }

    /// Write the credential as pretty JSON, readable only by the owner on unix.
    pub fn save(&self, path: &Path) -> Result<(), AuthError> {
        let io_err = |source: std::io::Error| AuthError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let content = serde_json::to_string_pretty(self).map_err(|e| io_err(e.into()))?;

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(io_err)?;
        // mode() only applies on create; tighten a file that already existed.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }
        file.write_all(content.as_bytes()).map_err(io_err)?;
        tracing::info!(path = %path.display(), "saved credentials");
        Ok(())
    }

    pub fn expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.expiry {
            Some(expiry) => now + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }

    pub fn expired(&self) -> bool {
        self.expired_at(Utc::now())
    }

    /// An access token is present and not expired.
    pub fn valid_at(&self, now: DateTime<Utc>) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty()) && !self.expired_at(now)
    }

    pub fn valid(&self) -> bool {
        self.valid_at(Utc::now())
    }

    /// Every requested scope was granted.
    pub fn has_scopes(&self, requested: &[String]) -> bool {
        requested.iter().all(|s| self.scopes.contains(s))
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Fill the client id and secret from the client secrets file if the cache lacks them.
    pub fn fill_client(&mut self, secrets: &ClientSecrets) {
        if self.client_id.is_none() {
            self.client_id = Some(secrets.client_id.clone());
        }
        if self.client_secret.is_none() {
            self.client_secret = Some(secrets.client_secret.clone());
        }
    }

    pub fn has_client(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    /// Merge a token endpoint response. The refresh token and scopes only change when sent.
    pub fn apply(&mut self, resp: TokenResponse, now: DateTime<Utc>) {
        self.token = Some(resp.access_token);
        let lifetime = resp.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);
        self.expiry = Some(now + Duration::seconds(lifetime));
        if let Some(refresh) = resp.refresh_token {
            self.refresh_token = Some(refresh);
        }
        if let Some(scope) = resp.scope {
            let granted: Vec<String> = scope.split_whitespace().map(str::to_string).collect();
            if !granted.is_empty() {
                self.scopes = granted;
            }
        }
    }

    pub fn access_token(&self) -> Result<&str, AuthError> {
        self.token
            .as_deref()
            .ok_or(AuthError::MissingAccessToken)
    }
}
