//! Register (or stop) Gmail push notifications for one mailbox.

use anyhow::{Context, Result};

use crate::auth::{self, Credentials};
use crate::gmail::{GmailClient, WatchResponse};
use crate::settings::Settings;

/// Issue users.watch with the configured body using `creds`.
pub fn register(settings: &Settings, creds: &Credentials) -> Result<WatchResponse> {
    let user = settings.require_user()?;
    let request = settings.watch_request()?;
    let client = GmailClient::new(&settings.api_base, creds.access_token()?);
    let response = client
        .watch(user, &request)
        .with_context(|| format!("watch request for {} failed", user))?;
    Ok(response)
}

/// Issue users.stop for the configured mailbox using `creds`.
pub fn unregister(settings: &Settings, creds: &Credentials) -> Result<()> {
    let user = settings.require_user()?;
    let client = GmailClient::new(&settings.api_base, creds.access_token()?);
    client
        .stop(user)
        .with_context(|| format!("stop request for {} failed", user))?;
    Ok(())
}

/// gmail-watch [watch]
pub fn run(settings: &Settings) -> Result<()> {
    // Fail on missing config before prompting for consent.
    settings.require_user()?;
    settings.topic_name()?;

    let creds = auth::authorize(settings)?;
    let response = register(settings, &creds)?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// gmail-watch stop
pub fn stop(settings: &Settings) -> Result<()> {
    let user = settings.require_user()?;
    let creds = auth::authorize(settings)?;
    unregister(settings, &creds)?;
    println!("Stopped push notifications for {}", user);
    Ok(())
}
