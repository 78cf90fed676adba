//! OAuth2 token endpoint: code exchange and refresh.

use serde::Deserialize;
use std::time::Duration;

use super::client_secrets::ClientSecrets;
use super::credentials::Credentials;
use super::error::AuthError;

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Clone)]
pub struct TokenEndpoint {
    agent: ureq::Agent,
}

impl Default for TokenEndpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenEndpoint {
    pub fn new() -> Self {
        Self {
            agent: ureq::AgentBuilder::new().timeout(TIMEOUT).build(),
        }
    }

    /// Trade a refresh token for a new access token.
    pub fn refresh(&self, creds: &Credentials) -> Result<TokenResponse, AuthError> {
        let refresh_token = creds
            .refresh_token
            .as_deref()
            .ok_or_else(|| AuthError::NotRefreshable("no refresh token".to_string()))?;
        let (Some(client_id), Some(client_secret)) =
            (creds.client_id.as_deref(), creds.client_secret.as_deref())
        else {
            return Err(AuthError::NotRefreshable(
                "client id or secret missing".to_string(),
            ));
        };
        tracing::info!(token_uri = %creds.token_uri, "refreshing access token");
        self.post_form(
            &creds.token_uri,
            &[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token),
                ("client_id", client_id),
                ("client_secret", client_secret),
            ],
        )
    }

    /// Exchange an authorization code (with its PKCE verifier) for tokens.
    pub fn exchange_code(
        &self,
        secrets: &ClientSecrets,
        code: &str,
        redirect_uri: &str,
        code_verifier: &str,
    ) -> Result<TokenResponse, AuthError> {
        tracing::info!(token_uri = %secrets.token_uri, "exchanging authorization code");
        self.post_form(
            &secrets.token_uri,
            &[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("client_id", secrets.client_id.as_str()),
                ("client_secret", secrets.client_secret.as_str()),
                ("code_verifier", code_verifier),
            ],
        )
    }

    fn post_form(&self, url: &str, form: &[(&str, &str)]) -> Result<TokenResponse, AuthError> {
        match self.agent.post(url).send_form(form) {
            Ok(resp) => resp
                .into_json::<TokenResponse>()
                .map_err(|e| AuthError::Transport(format!("invalid token response: {}", e))),
            Err(ureq::Error::Status(code, resp)) => {
                let body = resp.into_string().unwrap_or_default();
                Err(parse_oauth_error(code, &body))
            }
            Err(ureq::Error::Transport(t)) => Err(AuthError::Transport(t.to_string())),
        }
    }
}

fn parse_oauth_error(code: u16, body: &str) -> AuthError {
    match serde_json::from_str::<OAuthErrorBody>(body) {
        Ok(err) => AuthError::TokenEndpoint {
            error: err.error,
            description: err.error_description,
        },
        Err(_) => AuthError::TokenEndpoint {
            error: format!("HTTP {}", code),
            description: Some(body.trim().to_string()).filter(|b| !b.is_empty()),
        },
    }
}
