use std::net::SocketAddr;

use clap::Parser;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

/// Relay settings. Every flag falls back to an environment variable.
#[derive(Parser, Debug, Clone)]
#[command(name = "spinner-server", about = "Invoice relay for the Decision Spinner")]
pub struct Config {
    /// Bot token used to verify init-data and to call the Bot API
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    pub bot_token: Option<String>,
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    pub host: String,
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,
    /// Bot API base URL
    #[arg(long, env = "TELEGRAM_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,
}

impl Config {
    /// The token, unless it is unset or blank.
    pub fn bot_token(&self) -> Option<&str> {
        self.bot_token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn bind_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}
