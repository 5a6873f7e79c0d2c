//! Layered application configuration.
//!
//! Priority: CLI flag (or its env var) > `CHATBOT_*` env > config file > defaults.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::session::DEFAULT_SESSION_TIMEOUT;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long, env = "CHATBOT_HOST")]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Base URL of the chat endpoint (requests go to `<url>/chatbot`)
    #[arg(long, env = "CHATBOT_ENDPOINT_URL")]
    pub endpoint_url: Option<String>,

    /// Give up on the chat endpoint after this many seconds (no limit if unset)
    #[arg(long, env = "CHATBOT_ENDPOINT_TIMEOUT_SECS")]
    pub endpoint_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub endpoint: EndpointConfig,
    pub session: SessionConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Directory served under `/static`.
    pub static_dir: String,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    pub base_url: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub sweep_interval_secs: u64,
}

impl SessionConfig {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Sweep period, never below one second.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
                static_dir: "static".to_string(),
            },
            endpoint: EndpointConfig {
                base_url: "http://localhost:8000".to_string(),
                timeout_secs: None,
            },
            session: SessionConfig {
                idle_timeout_secs: DEFAULT_SESSION_TIMEOUT.as_secs(),
                sweep_interval_secs: 60,
            },
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.static_dir", defaults.server.static_dir)?
            .set_default("endpoint.base_url", defaults.endpoint.base_url)?
            .set_default("session.idle_timeout_secs", defaults.session.idle_timeout_secs)?
            .set_default(
                "session.sweep_interval_secs",
                defaults.session.sweep_interval_secs,
            )?;

        // An explicit file must exist; ./config.{yaml,toml,json} is optional.
        builder = match &cli.config {
            Some(path) => builder.add_source(File::from(PathBuf::from(path)).required(true)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. CHATBOT_SERVER__PORT=8080
        builder = builder.add_source(
            Environment::with_prefix("CHATBOT")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(url) = cli.endpoint_url {
            builder = builder.set_override("endpoint.base_url", url)?;
        }
        if let Some(secs) = cli.endpoint_timeout_secs {
            builder = builder.set_override("endpoint.timeout_secs", secs)?;
        }

        builder.build()?.try_deserialize()
    }
}
