//! Configuration loading from relay.toml.

use std::path::{Path, PathBuf};
use std::time::Duration;

use mcp::ServerConfig;
use runtime::{DEFAULT_MODEL, ResolverOptions};
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Text-generation backend.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Tool server to spawn.
    #[serde(default)]
    pub server: ServerSection,

    /// Resolution loop limits.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Default, Deserialize)]
pub struct BackendConfig {
    /// Gemini model. Falls back to `GEMINI_MODEL_NAME`, then the default model.
    pub model: Option<String>,

    /// Gemini API key. Falls back to `GEMINI_API_KEY`.
    pub api_key: Option<String>,

    /// Answer from canned completions instead of calling Gemini.
    #[serde(default)]
    pub mock: bool,
}

#[derive(Debug, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_server_name")]
    pub name: String,

    /// Executable to spawn. Defaults to this binary.
    pub command: Option<String>,

    #[serde(default = "default_server_args")]
    pub args: Vec<String>,

    /// Per-request timeout.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            name: default_server_name(),
            command: None,
            args: default_server_args(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ResolverConfig {
    /// Tool invocations allowed per query. Absent means unbounded.
    pub max_tool_calls: Option<usize>,
}

fn default_server_name() -> String {
    "research".to_string()
}

fn default_server_args() -> Vec<String> {
    vec!["serve".to_string(), "research".to_string()]
}

fn default_timeout_secs() -> u64 {
    mcp::DEFAULT_TIMEOUT.as_secs()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// API key from config or `GEMINI_API_KEY`.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        pick(self.backend.api_key.clone(), std::env::var("GEMINI_API_KEY").ok())
            .ok_or(ConfigError::MissingApiKey)
    }

    /// Model from config, `GEMINI_MODEL_NAME`, or the default.
    pub fn model(&self) -> String {
        pick(self.backend.model.clone(), std::env::var("GEMINI_MODEL_NAME").ok())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string())
    }

    /// How to spawn the tool server. `current_exe` stands in for a missing command.
    pub fn server_config(&self, current_exe: &Path) -> ServerConfig {
        let command = self
            .server
            .command
            .clone()
            .unwrap_or_else(|| current_exe.to_string_lossy().into_owned());
        let mut config =
            ServerConfig::new(&self.server.name, command).with_args(self.server.args.clone());
        config.timeout = Duration::from_secs(self.server.timeout_secs);
        config
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            max_tool_calls: self.resolver.max_tool_calls,
        }
    }
}

/// First non-blank value.
fn pick(configured: Option<String>, env: Option<String>) -> Option<String> {
    configured
        .into_iter()
        .chain(env)
        .find(|v| !v.trim().is_empty())
}

/// Default config path in the working directory.
pub fn default_path() -> PathBuf {
    PathBuf::from("relay.toml")
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("Gemini API key not configured: set backend.api_key or GEMINI_API_KEY")]
    MissingApiKey,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.name, "research");
        assert_eq!(config.server.args, vec!["serve", "research"]);
        assert_eq!(config.server.timeout_secs, 60);
        assert_eq!(config.resolver.max_tool_calls, None);
        assert!(!config.backend.mock);
    }

    #[test]
    fn full_file() {
        let config = Config::parse(
            r#"
            [backend]
            model = "gemini-1.5-pro"
            api_key = "abc"

            [server]
            name = "weather"
            command = "/usr/local/bin/relay"
            args = ["serve", "weather"]
            timeout_secs = 5

            [resolver]
            max_tool_calls = 8
            "#,
        )
        .unwrap();

        assert_eq!(config.model(), "gemini-1.5-pro");
        assert_eq!(config.api_key().unwrap(), "abc");
        assert_eq!(config.resolver_options().max_tool_calls, Some(8));

        let server = config.server_config(Path::new("/ignored"));
        assert_eq!(server.name, "weather");
        assert_eq!(server.command, "/usr/local/bin/relay");
        assert_eq!(server.args, vec!["serve", "weather"]);
        assert_eq!(server.timeout, Duration::from_secs(5));
    }

    #[test]
    fn server_defaults_to_current_exe() {
        let config = Config::default();
        let server = config.server_config(Path::new("/opt/relay/bin/relay"));
        assert_eq!(server.command, "/opt/relay/bin/relay");
        assert_eq!(server.args, vec!["serve", "research"]);
        assert_eq!(server.timeout, mcp::DEFAULT_TIMEOUT);
    }

    #[test]
    fn configured_value_wins_over_env() {
        assert_eq!(pick(Some("file".into()), Some("env".into())).as_deref(), Some("file"));
        assert_eq!(pick(None, Some("env".into())).as_deref(), Some("env"));
        assert_eq!(pick(Some("  ".into()), Some("env".into())).as_deref(), Some("env"));
        assert_eq!(pick(None, None), None);
    }

    #[test]
    fn rejects_bad_toml() {
        assert!(matches!(
            Config::parse("[server]\ntimeout_secs = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = Config::load_or_default(dir.path().join("relay.toml")).unwrap();
        assert_eq!(config.server.name, "research");
    }
}
