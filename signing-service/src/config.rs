//! Startup configuration for the signing service.
//!
//! Settings are layered: built-in defaults, then an optional configuration file (format chosen by
//! extension: YAML, TOML, or JSON), then `QS_SIGNER_*` environment variables, then command-line
//! overrides.
use {
    crate::credentials::{Credentials, CredentialsError},
    clap::Parser,
    config::{Config, ConfigError, Environment, File},
    serde::Deserialize,
    std::{
        fmt::{Debug, Formatter, Result as FmtResult},
        path::{Path, PathBuf},
    },
};

/// Prefix of environment variables read by [ServiceConfig::load].
pub const ENV_PREFIX: &str = "QS_SIGNER";

/// Default listen host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default listen port.
pub const DEFAULT_PORT: u16 = 9000;

/// Default log filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Settings for one signing service process.
#[derive(Clone, Deserialize, Eq, PartialEq)]
pub struct ServiceConfig {
    /// Host or address to listen on.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Access key id used for every signature.
    #[serde(default)]
    pub access_key_id: String,

    /// Secret access key used for every signature.
    #[serde(default)]
    pub secret_access_key: String,

    /// `env_logger` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: DEFAULT_PORT,
            access_key_id: String::new(),
            secret_access_key: String::new(),
            log_level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    /// Load the configuration from an optional file layered under `QS_SIGNER_*` environment
    /// variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    /// Like [ServiceConfig::load], reading environment variables named `{prefix}_{FIELD}`.
    pub fn load_with_env_prefix(path: Option<&Path>, prefix: &str) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        builder
            .add_source(Environment::with_prefix(prefix).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    /// The credential pair described by this configuration.
    ///
    /// # Errors
    /// [CredentialsError] if either half is missing.
    pub fn credentials(&self) -> Result<Credentials, CredentialsError> {
        Credentials::new(self.access_key_id.as_str(), self.secret_access_key.as_str())
    }

    /// The `host:port` string to bind.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Debug for ServiceConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ServiceConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"SecretAccessKey")
            .field("log_level", &self.log_level)
            .finish()
    }
}

/// Command-line arguments of the `qs-signing-service` binary.
#[derive(Debug, Parser)]
#[command(name = "qs-signing-service")]
#[command(about = "Signs QingStor requests on behalf of clients that do not hold the secret key")]
#[command(version)]
pub struct CliArgs {
    /// Configuration file path (YAML, TOML, or JSON)
    #[arg(short, long, env = "QS_SIGNER_CONFIG")]
    pub config: Option<PathBuf>,

    /// Listen host; overrides the configuration file
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port; overrides the configuration file
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl CliArgs {
    /// Load the configuration named by these arguments and apply the overrides.
    pub fn load(&self) -> Result<ServiceConfig, ConfigError> {
        let mut config = ServiceConfig::load(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    /// Apply the command-line overrides to `config`.
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(host) = &self.host {
            config.host = host.clone();
        }

        if let Some(port) = self.port {
            config.port = port;
        }
    }
}
