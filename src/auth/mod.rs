//! Gmail OAuth: load the cached token, refresh it once, or run consent.

pub mod client_secrets;
pub mod credentials;
pub mod endpoint;
pub mod error;
pub mod flow;

use anyhow::Result;
use chrono::Utc;
use std::path::Path;

use crate::settings::Settings;

pub use client_secrets::ClientSecrets;
pub use credentials::Credentials;
pub use endpoint::{TokenEndpoint, TokenResponse};
pub use error::AuthError;
pub use flow::{Consent, InstalledAppFlow};

/// How the credential in hand was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Cached,
    Refreshed,
    Consented,
}

/// Return usable credentials for `scopes`, persisting any new token to `token_file`.
///
/// - cached token valid and covering `scopes`: used as-is, file untouched
/// - expired with a refresh token: refreshed once (failure is not retried)
/// - otherwise: interactive consent via `consent`
pub fn authorize_with(
    token_file: &Path,
    client_secrets: &Path,
    scopes: &[String],
    endpoint: &TokenEndpoint,
    consent: &dyn Consent,
) -> Result<(Credentials, Source), AuthError> {
    let cached = if token_file.exists() {
        Some(Credentials::from_authorized_user_file(token_file, scopes)?)
    } else {
        tracing::info!(path = %token_file.display(), "no cached token");
        None
    };

    if let Some(creds) = &cached {
        if creds.valid() && creds.has_scopes(scopes) {
            tracing::info!(path = %token_file.display(), "using cached token");
            return Ok((creds.clone(), Source::Cached));
        }
    }

    let (creds, source) = match cached {
        Some(mut creds) if creds.expired() && creds.can_refresh() && creds.has_scopes(scopes) => {
            if !creds.has_client() {
                creds.fill_client(&ClientSecrets::load(client_secrets)?);
            }
            let resp = endpoint.refresh(&creds)?;
            creds.apply(resp, Utc::now());
            (creds, Source::Refreshed)
        }
        _ => {
            let secrets = ClientSecrets::load(client_secrets)?;
            let resp = consent.obtain(&secrets, scopes)?;
            tracing::info!("consent granted");
            (
                Credentials::from_token_response(resp, &secrets, scopes, Utc::now()),
                Source::Consented,
            )
        }
    };

    creds.save(token_file)?;
    Ok((creds, source))
}

/// `authorize_with` using the configured files and the interactive flow.
fn authorize_interactive(settings: &Settings) -> Result<(Credentials, Source), AuthError> {
    let endpoint = TokenEndpoint::new();
    let flow = InstalledAppFlow::new(endpoint.clone(), settings.open_browser);
    authorize_with(
        &settings.token_file,
        &settings.client_secrets,
        &settings.scopes,
        &endpoint,
        &flow,
    )
}

pub fn authorize(settings: &Settings) -> Result<Credentials> {
    let (creds, _) = authorize_interactive(settings)?;
    Ok(creds)
}

/// gmail-watch auth
pub fn run(settings: &Settings) -> Result<()> {
    let (_, source) = authorize_interactive(settings)?;
    match source {
        Source::Cached => println!("Token in {} is still valid.", settings.token_file.display()),
        Source::Refreshed => println!("Refreshed token saved to {}", settings.token_file.display()),
        Source::Consented => println!("Token saved to {}", settings.token_file.display()),
    }
    Ok(())
}
