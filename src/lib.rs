pub mod auth;
pub mod cli;
pub mod gmail;
pub mod logging;
pub mod resolve;
pub mod settings;
pub mod watch;
