use clap::Parser;
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use url::Url;

use crate::client::DEFAULT_ENDPOINT;
use crate::render::WidgetSettings;
use crate::store::{DEFAULT_IDLE_TIMEOUT, DEFAULT_MAX_WIDGETS, StoreLimits};

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG_FILE: &str = "config.yaml";

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_TITLE: &str = "Chatbot";
const DEFAULT_PLACEHOLDER: &str = "Type a message...";
const DEFAULT_POLL_INTERVAL_MS: u64 = 500;
const DEFAULT_IDLE_SECS: u64 = DEFAULT_IDLE_TIMEOUT.as_secs();

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "BIND_HOST")]
    pub host: Option<String>,

    /// Question-answering endpoint the widget posts to
    #[arg(long, env = "QUERY_ENDPOINT")]
    pub query_endpoint: Option<String>,

    /// Give up on a question after this many seconds (no limit when unset)
    #[arg(long, env = "QUERY_TIMEOUT_SECS")]
    pub query_timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub query: QueryConfig,
    pub widget: WidgetConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueryConfig {
    pub endpoint: String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct WidgetConfig {
    pub title: String,
    pub placeholder: String,
    pub poll_interval_ms: u64,
}

/// Bounds on the number and lifetime of mounted widgets.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// Most widgets kept at once; the least recently used is evicted first.
    pub max_widgets: usize,
    /// Widgets untouched for this long are evicted.
    pub idle_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                port: DEFAULT_PORT,
                host: DEFAULT_HOST.to_string(),
            },
            query: QueryConfig {
                endpoint: DEFAULT_ENDPOINT.to_string(),
                timeout_secs: None,
            },
            widget: WidgetConfig {
                title: DEFAULT_TITLE.to_string(),
                placeholder: DEFAULT_PLACEHOLDER.to_string(),
                poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            },
            store: StoreConfig {
                max_widgets: DEFAULT_MAX_WIDGETS,
                idle_secs: DEFAULT_IDLE_SECS,
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

        let mut builder = Config::builder();

        // 1. Defaults
        builder = builder
            .set_default("server.port", i64::from(DEFAULT_PORT))?
            .set_default("server.host", DEFAULT_HOST)?
            .set_default("query.endpoint", DEFAULT_ENDPOINT)?
            .set_default("widget.title", DEFAULT_TITLE)?
            .set_default("widget.placeholder", DEFAULT_PLACEHOLDER)?
            .set_default("widget.poll_interval_ms", DEFAULT_POLL_INTERVAL_MS)?
            .set_default("store.max_widgets", DEFAULT_MAX_WIDGETS as u64)?
            .set_default("store.idle_secs", DEFAULT_IDLE_SECS)?;

        // 2. Config file: explicit path must exist, ./config.yaml is optional
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::new(path, FileFormat::Yaml));
        } else if Path::new(DEFAULT_CONFIG_FILE).exists() {
            builder = builder.add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml));
        }

        // 3. Environment variables prefixed with CHAT_, e.g. CHAT_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("CHAT")
                .separator("__")
                .try_parsing(true),
        );

        // 4. CLI flags (and their env fallbacks) win over everything else
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(host) = cli.host {
            builder = builder.set_override("server.host", host)?;
        }
        if let Some(endpoint) = cli.query_endpoint {
            builder = builder.set_override("query.endpoint", endpoint)?;
        }
        if let Some(secs) = cli.query_timeout_secs {
            builder = builder.set_override("query.timeout_secs", secs)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        cfg.query_endpoint()
            .map_err(|e| config::ConfigError::Message(format!("query.endpoint: {e}")))?;
        Ok(cfg)
    }

    /// The question-answering endpoint as a URL.
    pub fn query_endpoint(&self) -> Result<Url, url::ParseError> {
        Url::parse(&self.query.endpoint)
    }

    /// Per-request timeout, if one is configured.
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query.timeout_secs.map(Duration::from_secs)
    }

    /// Address to bind, as `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Presentation settings for every widget.
    pub fn widget_settings(&self) -> WidgetSettings {
        WidgetSettings {
            title: self.widget.title.clone(),
            placeholder: self.widget.placeholder.clone(),
            poll_interval_ms: self.widget.poll_interval_ms,
        }
    }

    /// Eviction bounds for the widget store.
    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            max_widgets: self.store.max_widgets,
            idle_timeout: Duration::from_secs(self.store.idle_secs),
        }
    }
}
