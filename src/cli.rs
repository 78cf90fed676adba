use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gmail-watch",
    version,
    about = "Register Gmail push notifications to a Pub/Sub topic"
)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (default: .gmail-watch.toml, then the app config dir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub options: Options,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct Options {
    /// Google Cloud project id
    #[arg(long, env = "GCP_PROJECT", global = true)]
    pub project: Option<String>,

    /// Pub/Sub topic name within the project
    #[arg(long, env = "PUBSUB_TOPIC", global = true)]
    pub topic: Option<String>,

    /// Mailbox to watch (email address or `me`)
    #[arg(long, env = "GMAIL_ID", global = true)]
    pub user: Option<String>,

    /// Label id(s) to watch (default: INBOX)
    #[arg(long = "label", global = true)]
    pub labels: Vec<String>,

    /// Whether --label ids are included or excluded
    #[arg(long, global = true, value_parser = ["include", "exclude"])]
    pub label_filter_behavior: Option<String>,

    /// OAuth scope(s) to request (default: gmail.readonly)
    #[arg(long = "scope", global = true)]
    pub scopes: Vec<String>,

    /// Cached token file
    #[arg(long, env = "GMAIL_WATCH_TOKEN_FILE", global = true)]
    pub token_file: Option<String>,

    /// OAuth client secrets file
    #[arg(long, env = "GMAIL_WATCH_CLIENT_SECRETS", global = true)]
    pub client_secrets: Option<String>,

    /// Gmail API base URL
    #[arg(long, env = "GMAIL_API_BASE", global = true)]
    pub api_base: Option<String>,

    /// Print the consent URL and read the code from stdin instead of opening a browser
    #[arg(long, global = true)]
    pub no_browser: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Register push notifications (the default)
    Watch,

    /// Stop push notifications for the mailbox
    Stop,

    /// Obtain or refresh the OAuth token without calling the API
    Auth,
}
