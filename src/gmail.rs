//! Minimal Gmail API client: users.watch and users.stop.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum GmailError {
    #[error("Gmail API error {code} ({status}): {message}")]
    Api {
        code: u16,
        status: String,
        message: String,
    },

    #[error("Gmail API returned HTTP {code}: {body}")]
    Http { code: u16, body: String },

    #[error("request to Gmail API failed: {0}")]
    Transport(String),

    #[error("could not decode Gmail API response: {0}")]
    Decode(#[from] std::io::Error),

    #[error("invalid Gmail API base URL '{0}'")]
    InvalidBaseUrl(String),

    #[error("invalid label filter behavior '{0}' (expected include or exclude)")]
    InvalidLabelFilter(String),
}

/// How `labelIds` filter the notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelFilterBehavior {
    Include,
    Exclude,
}

impl FromStr for LabelFilterBehavior {
    type Err = GmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "include" => Ok(Self::Include),
            "exclude" => Ok(Self::Exclude),
            _ => Err(GmailError::InvalidLabelFilter(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRequest {
    pub label_ids: Vec<String>,
    pub topic_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_filter_behavior: Option<LabelFilterBehavior>,
}

/// Response of users.watch. Fields Gmail adds later are kept in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchResponse {
    pub history_id: String,
    /// Epoch millis at which the watch lapses; re-register before then.
    pub expiration: String,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

pub struct GmailClient {
    agent: ureq::Agent,
    base_url: String,
    access_token: String,
}

impl GmailClient {
    pub fn new(base_url: &str, access_token: &str) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(TIMEOUT).build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
        }
    }

    /// `{base}/gmail/v1/users/{user_id}/{method}`, with `user_id` as one path segment.
    fn user_url(&self, user_id: &str, method: &str) -> Result<Url, GmailError> {
        let invalid = || GmailError::InvalidBaseUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| invalid())?;
        url.path_segments_mut()
            .map_err(|_| invalid())?
            .pop_if_empty()
            .extend(["gmail", "v1", "users", user_id, method]);
        Ok(url)
    }

    fn post(&self, url: &Url) -> ureq::Request {
        self.agent
            .post(url.as_str())
            .set("Authorization", &format!("Bearer {}", self.access_token))
            .set("Accept", "application/json")
    }

    /// users.watch: start push notifications for `user_id`.
    pub fn watch(&self, user_id: &str, request: &WatchRequest) -> Result<WatchResponse, GmailError> {
        let url = self.user_url(user_id, "watch")?;
        tracing::info!(user = user_id, topic = %request.topic_name, "registering watch");
        let resp = self.post(&url).send_json(request).map_err(map_error)?;
        let body: WatchResponse = resp.into_json()?;
        tracing::info!(history_id = %body.history_id, expiration = %body.expiration, "watch registered");
        Ok(body)
    }

    /// users.stop: stop push notifications for `user_id`.
    pub fn stop(&self, user_id: &str) -> Result<(), GmailError> {
        let url = self.user_url(user_id, "stop")?;
        tracing::info!(user = user_id, "stopping watch");
        self.post(&url).send_string("").map_err(map_error)?;
        Ok(())
    }
}

/// Translate a ureq failure, preferring Google's error envelope when present.
fn map_error(err: ureq::Error) -> GmailError {
    match err {
        ureq::Error::Status(code, resp) => {
            let body = resp.into_string().unwrap_or_default();
            parse_api_error(code, &body)
        }
        ureq::Error::Transport(t) => GmailError::Transport(t.to_string()),
    }
}

pub(crate) fn parse_api_error(code: u16, body: &str) -> GmailError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => GmailError::Api {
            code: if env.error.code == 0 { code } else { env.error.code },
            status: env.error.status,
            message: env.error.message,
        },
        Err(_) => GmailError::Http {
            code,
            body: body.trim().to_string(),
        },
    }
}
