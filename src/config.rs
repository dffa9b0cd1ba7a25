use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::llm::LlmSettings;

/// Model used when `LLM_MODEL` is unset.
const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Development-only cookie signing secret; override in any real deployment.
const DEFAULT_SESSION_SECRET: &str = "banter-dev-session-secret-change-me-in-production";

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Host to bind
    #[arg(long, env = "HOST")]
    pub host: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub security: SecurityConfig,
    pub resilience: ResilienceConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SecurityConfig {
    /// Secret used to sign identity cookies. Must be at least 32 bytes.
    pub session_secret: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    /// Upper bound on a single completion call, in seconds.
    pub collaborator_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from CLI args, an optional config file, and
    /// `BANTER_`-prefixed environment variables.
    ///
    /// Priority: CLI flag > environment > config file > defaults.
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

        let mut builder = Config::builder()
            .set_default("server.port", 5000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("security.session_secret", DEFAULT_SESSION_SECRET)?
            .set_default("resilience.collaborator_timeout_secs", 30)?;

        // Explicit config file wins over the ./config.* fallback.
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }

        // E.g. BANTER_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("BANTER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.clone())?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}

/// Load completion endpoint settings from the environment.
///
/// `LLM_BASE_URL` is required; `LLM_API_KEY` is optional; `LLM_MODEL`
/// falls back to [`DEFAULT_MODEL`].
pub fn load_llm_settings() -> Result<LlmSettings, String> {
    let base_url = std::env::var("LLM_BASE_URL")
        .map_err(|_| "Missing required env var: LLM_BASE_URL".to_string())?;
    if base_url.trim().is_empty() {
        return Err("LLM_BASE_URL cannot be empty".to_string());
    }

    let api_key = std::env::var("LLM_API_KEY")
        .ok()
        .filter(|s| !s.trim().is_empty());

    let model = std::env::var("LLM_MODEL")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());

    Ok(LlmSettings {
        base_url,
        api_key,
        model,
    })
}
