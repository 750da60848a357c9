use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_PUSHOVER_URL: &str = "https://api.pushover.net/1/messages.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Process configuration. Every flag falls back to an environment variable.
#[derive(Debug, Clone, Parser)]
#[command(name = "card-notifier", version, about = "Relay card webhooks to Pushover")]
pub struct Config {
    /// Port to listen on (0 picks a free port)
    #[arg(short = 'p', long, env = "PORT", default_value_t = 0)]
    pub port: u16,

    /// Address to listen on
    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Pushover application token
    #[arg(long = "ptoken", env = "PUSHOVER_TOKEN", default_value = "", hide_env_values = true)]
    pub pushover_token: String,

    /// Pushover user (or group) key
    #[arg(long = "puser", env = "PUSHOVER_USER", default_value = "", hide_env_values = true)]
    pub pushover_user: String,

    /// Pushover messages endpoint
    #[arg(long, env = "PUSHOVER_API_URL", default_value = DEFAULT_PUSHOVER_URL)]
    pub pushover_url: String,

    /// Timeout for a single push request, in seconds
    #[arg(long, env = "NOTIFY_TIMEOUT_SECS", default_value_t = 10)]
    pub notify_timeout_secs: u64,

    /// Maximum accepted request body, in bytes
    #[arg(long, env = "BODY_LIMIT_BYTES", default_value_t = 1024 * 1024)]
    pub body_limit: usize,

    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

impl Config {
    /// Credentials are required; the listener must not bind without them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pushover_token.trim().is_empty() {
            return Err(ConfigError::MissingCredential("application token"));
        }
        if self.pushover_user.trim().is_empty() {
            return Err(ConfigError::MissingCredential("user key"));
        }
        if self.notify_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "notify timeout must be at least one second".into(),
            ));
        }
        if self.body_limit == 0 {
            return Err(ConfigError::Invalid("body limit must be positive".into()));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }
}
