use {
    config::{Config, ConfigError, Environment, File},
    serde::Deserialize,
    std::{path::Path, time::Duration},
};

/// Prefix of environment variables read by [ClientConfig::load].
pub const ENV_PREFIX: &str = "QS_CLIENT";

/// Where to find the signing service and how long to wait for it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct ClientConfig {
    /// `http` or `https`.
    pub signature_server_protocol: String,

    /// Host name or address of the signing service.
    pub signature_server_host: String,

    /// Port of the signing service.
    pub signature_server_port: u16,

    /// Upper bound on one signing round-trip, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            signature_server_protocol: "http".to_string(),
            signature_server_host: "127.0.0.1".to_string(),
            signature_server_port: 9000,
            timeout_ms: 5000,
        }
    }
}

impl ClientConfig {
    /// Load the configuration from an optional file layered under `QS_CLIENT_*` environment
    /// variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env_prefix(path, ENV_PREFIX)
    }

    /// Like [ClientConfig::load], reading environment variables named `{prefix}_{FIELD}`.
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

    /// Base URL of the signing service, without a trailing slash, e.g. `http://127.0.0.1:9000`.
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.signature_server_protocol, self.signature_server_host, self.signature_server_port)
    }

    /// [ClientConfig::timeout_ms] as a [Duration].
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
