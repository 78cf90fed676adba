use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("token file {} is not valid authorized-user JSON: {source}", .path.display())]
    MalformedToken {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(
        "client secrets file {} not found.\n\
         Download it from Google Cloud Console → APIs & Services → Credentials → your Desktop client → Download JSON\n\
         and save it under that name.",
        .path.display()
    )]
    MissingClientSecrets { path: PathBuf },

    #[error("client secrets file {} is invalid: {reason}", .path.display())]
    ClientSecrets { path: PathBuf, reason: String },

    #[error("token endpoint rejected the request: {error}{}", .description.as_deref().map(|d| format!(" ({d})")).unwrap_or_default())]
    TokenEndpoint {
        error: String,
        description: Option<String>,
    },

    #[error("credential cannot be refreshed: {0}")]
    NotRefreshable(String),

    #[error("request to token endpoint failed: {0}")]
    Transport(String),

    #[error("credential has no access token")]
    MissingAccessToken,

    #[error("authorization failed: {0}")]
    Consent(String),

    #[error("authorization response state did not match the request")]
    StateMismatch,

    #[error("timed out waiting for the authorization redirect")]
    Timeout,
}
