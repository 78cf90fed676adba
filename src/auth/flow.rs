//! Installed-app consent: loopback redirect with PKCE, or paste-the-code on the console.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use sha2::{Digest, Sha256};
use std::io::BufRead;
use std::time::{Duration, Instant};
use url::Url;

use super::client_secrets::ClientSecrets;
use super::endpoint::{TokenEndpoint, TokenResponse};
use super::error::AuthError;

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Obtains a fresh token through user consent.
pub trait Consent {
    fn obtain(&self, secrets: &ClientSecrets, scopes: &[String]) -> Result<TokenResponse, AuthError>;
}

/// PKCE verifier and its S256 challenge.
pub struct Pkce {
    pub verifier: String,
    pub challenge: String,
}

impl Pkce {
    pub fn new() -> Self {
        let verifier = format!(
            "{}{}",
            uuid::Uuid::new_v4().simple(),
            uuid::Uuid::new_v4().simple()
        );
        let challenge = challenge_for(&verifier);
        Self { verifier, challenge }
    }
}

impl Default for Pkce {
    fn default() -> Self {
        Self::new()
    }
}

pub fn challenge_for(verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

/// Build the consent URL for an offline (refreshable) grant.
pub fn authorization_url(
    secrets: &ClientSecrets,
    scopes: &[String],
    redirect_uri: &str,
    state: &str,
    code_challenge: &str,
) -> Result<Url, AuthError> {
    let scope = scopes.join(" ");
    Url::parse_with_params(
        &secrets.auth_uri,
        &[
            ("response_type", "code"),
            ("client_id", secrets.client_id.as_str()),
            ("redirect_uri", redirect_uri),
            ("scope", scope.as_str()),
            ("state", state),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("code_challenge", code_challenge),
            ("code_challenge_method", "S256"),
        ],
    )
    .map_err(|e| AuthError::Consent(format!("invalid auth_uri '{}': {}", secrets.auth_uri, e)))
}

/// Pull the code out of a redirect URL.
///
/// Returns Ok(None) when the URL carries neither a code nor an error
/// (e.g. a browser asking for /favicon.ico).
pub fn parse_redirect(url: &Url, expected_state: &str) -> Result<Option<String>, AuthError> {
    let mut code = None;
    let mut state = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "state" => state = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }
    if let Some(error) = error {
        return Err(AuthError::Consent(error));
    }
    let Some(code) = code else {
        return Ok(None);
    };
    if state.as_deref() != Some(expected_state) {
        return Err(AuthError::StateMismatch);
    }
    Ok(Some(code))
}

/// Accept either the full redirected URL or the bare code.
pub fn parse_pasted(input: &str, expected_state: &str) -> Result<String, AuthError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(AuthError::Consent("no authorization code entered".to_string()));
    }
    if input.starts_with("http://") || input.starts_with("https://") {
        let url = Url::parse(input)
            .map_err(|e| AuthError::Consent(format!("could not parse URL: {}", e)))?;
        return parse_redirect(&url, expected_state)?
            .ok_or_else(|| AuthError::Consent("URL has no code parameter".to_string()));
    }
    Ok(input.to_string())
}

pub struct InstalledAppFlow {
    endpoint: TokenEndpoint,
    open_browser: bool,
    timeout: Duration,
}

impl InstalledAppFlow {
    pub fn new(endpoint: TokenEndpoint, open_browser: bool) -> Self {
        Self {
            endpoint,
            open_browser,
            timeout: CALLBACK_TIMEOUT,
        }
    }

    /// Shorten how long the loopback listener waits for the redirect.
    #[cfg(test)]
    pub(crate) fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Serve the loopback port until a redirect carries a code for `state`.
    ///
    /// Redirects with a foreign state or an error parameter get a 400 and the
    /// wait goes on; the last such rejection is reported if time runs out.
    fn wait_for_code(
        &self,
        server: &tiny_http::Server,
        state: &str,
    ) -> Result<String, AuthError> {
        let deadline = Instant::now() + self.timeout;
        let mut rejected = None;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(rejected.unwrap_or(AuthError::Timeout));
            }
            let request = match server.recv_timeout(remaining) {
                Ok(Some(request)) => request,
                Ok(None) => return Err(rejected.unwrap_or(AuthError::Timeout)),
                Err(e) => return Err(AuthError::Consent(format!("loopback listener failed: {}", e))),
            };
            let parsed = Url::parse(&format!("http://127.0.0.1{}", request.url()))
                .map_err(|e| AuthError::Consent(format!("bad redirect: {}", e)))
                .and_then(|url| parse_redirect(&url, state));
            match parsed {
                Ok(Some(code)) => {
                    let _ = request.respond(tiny_http::Response::from_string(
                        "The authentication flow has completed. You may close this window.",
                    ));
                    return Ok(code);
                }
                Ok(None) => {
                    let _ = request.respond(tiny_http::Response::empty(404u16));
                }
                Err(e) => {
                    tracing::warn!(error = %e, "rejected authorization redirect");
                    let _ = request.respond(
                        tiny_http::Response::from_string(format!("Authorization failed: {}", e))
                            .with_status_code(400u16),
                    );
                    rejected = Some(e);
                }
            }
        }
    }

    fn read_pasted_code(&self, state: &str) -> Result<String, AuthError> {
        eprint!("Enter the authorization code (or the full redirected URL): ");
        let mut line = String::new();
        std::io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| AuthError::Consent(format!("could not read stdin: {}", e)))?;
        parse_pasted(&line, state)
    }
}

impl Consent for InstalledAppFlow {
    fn obtain(&self, secrets: &ClientSecrets, scopes: &[String]) -> Result<TokenResponse, AuthError> {
        let server = tiny_http::Server::http("127.0.0.1:0")
            .map_err(|e| AuthError::Consent(format!("could not start loopback listener: {}", e)))?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| AuthError::Consent("loopback listener has no port".to_string()))?;
        let redirect_uri = format!("http://127.0.0.1:{}/", port);

        let pkce = Pkce::new();
        let state = uuid::Uuid::new_v4().simple().to_string();
        let url = authorization_url(secrets, scopes, &redirect_uri, &state, &pkce.challenge)?;

        eprintln!("Authorize this app by visiting this url:\n\n{}\n", url);

        let code = if self.open_browser {
            if let Err(e) = open::that(url.as_str()) {
                tracing::warn!(error = %e, "could not open a browser; open the URL manually");
            }
            tracing::debug!(%redirect_uri, "waiting for authorization redirect");
            self.wait_for_code(&server, &state)?
        } else {
            drop(server);
            self.read_pasted_code(&state)?
        };

        self.endpoint
            .exchange_code(secrets, &code, &redirect_uri, &pkce.verifier)
    }
}
