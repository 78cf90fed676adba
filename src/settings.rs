//! Run settings — CLI flags over environment over .gmail-watch.toml over defaults.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::cli::Options;
use crate::gmail::{LabelFilterBehavior, WatchRequest};
use crate::resolve;

pub const GMAIL_READONLY_SCOPE: &str = "https://www.googleapis.com/auth/gmail.readonly";
pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com";
pub const DEFAULT_LABEL: &str = "INBOX";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub watch: WatchSection,
}

/// The `[watch]` table of the config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WatchSection {
    pub project: Option<String>,
    pub topic: Option<String>,
    pub user: Option<String>,
    pub labels: Option<Vec<String>>,
    pub label_filter_behavior: Option<LabelFilterBehavior>,
    pub scopes: Option<Vec<String>>,
    pub token_file: Option<String>,
    pub client_secrets: Option<String>,
    pub api_base: Option<String>,
}

/// Load a config file from the given path, or the resolved location.
///
/// A missing file yields the empty config; a malformed one is an error.
pub fn load_config(path: Option<&Path>) -> Result<FileConfig> {
    let path = match path {
        Some(p) => PathBuf::from(p),
        None => match resolve::config_file() {
            Some(p) => p,
            None => return Ok(FileConfig::default()),
        },
    };
    if !path.exists() {
        return Ok(FileConfig::default());
    }
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: FileConfig =
        toml::from_str(&content).with_context(|| format!("Invalid config in {}", path.display()))?;
    tracing::debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub project: Option<String>,
    pub topic: Option<String>,
    pub user: Option<String>,
    pub labels: Vec<String>,
    pub label_filter_behavior: Option<LabelFilterBehavior>,
    pub scopes: Vec<String>,
    pub token_file: PathBuf,
    pub client_secrets: PathBuf,
    pub api_base: String,
    pub open_browser: bool,
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty()).cloned()
}

fn pick(flag: Option<&String>, file: Option<&String>) -> Option<String> {
    non_empty(flag).or_else(|| non_empty(file))
}

impl Settings {
    /// Merge CLI options (which already carry environment values) with the config file.
    pub fn resolve(opts: &Options, file: &FileConfig) -> Result<Self> {
        let w = &file.watch;

        let labels = if !opts.labels.is_empty() {
            opts.labels.clone()
        } else {
            w.labels
                .clone()
                .filter(|l| !l.is_empty())
                .unwrap_or_else(|| vec![DEFAULT_LABEL.to_string()])
        };

        let scopes = if !opts.scopes.is_empty() {
            opts.scopes.clone()
        } else {
            w.scopes
                .clone()
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| vec![GMAIL_READONLY_SCOPE.to_string()])
        };

        let label_filter_behavior = match opts.label_filter_behavior.as_deref() {
            Some(raw) => Some(raw.parse()?),
            None => w.label_filter_behavior,
        };

        let token_file = pick(opts.token_file.as_ref(), w.token_file.as_ref())
            .unwrap_or_else(|| resolve::TOKEN_FILE.to_string());
        let client_secrets = pick(opts.client_secrets.as_ref(), w.client_secrets.as_ref())
            .unwrap_or_else(|| resolve::CLIENT_SECRETS_FILE.to_string());
        let api_base = pick(opts.api_base.as_ref(), w.api_base.as_ref())
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            project: pick(opts.project.as_ref(), w.project.as_ref()),
            topic: pick(opts.topic.as_ref(), w.topic.as_ref()),
            user: pick(opts.user.as_ref(), w.user.as_ref()),
            labels,
            label_filter_behavior,
            scopes,
            token_file: resolve::expand_tilde(&token_file),
            client_secrets: resolve::expand_tilde(&client_secrets),
            api_base: api_base.trim_end_matches('/').to_string(),
            open_browser: !opts.no_browser,
        })
    }

    /// The mailbox id, e.g. `me` or an email address.
    pub fn require_user(&self) -> Result<&str> {
        match self.user.as_deref() {
            Some(user) => Ok(user),
            None => bail!(missing("GMAIL_ID", "--user", "user")),
        }
    }

    /// Full Pub/Sub topic resource name: `projects/{project}/topics/{topic}`.
    pub fn topic_name(&self) -> Result<String> {
        let Some(project) = self.project.as_deref() else {
            bail!(missing("GCP_PROJECT", "--project", "project"));
        };
        let Some(topic) = self.topic.as_deref() else {
            bail!(missing("PUBSUB_TOPIC", "--topic", "topic"));
        };
        Ok(format!("projects/{}/topics/{}", project, topic))
    }

    /// The watch body for this mailbox.
    pub fn watch_request(&self) -> Result<WatchRequest> {
        Ok(WatchRequest {
            label_ids: self.labels.clone(),
            topic_name: self.topic_name()?,
            label_filter_behavior: self.label_filter_behavior,
        })
    }
}

fn missing(var: &str, flag: &str, key: &str) -> String {
    format!(
        "{} is not set.\nSet the {} environment variable, pass {}, or add `{}` to the [watch] table in .gmail-watch.toml.",
        var, var, flag, key
    )
}
