use secrecy::SecretString;
use serde::Deserialize;

use crate::env;

/// Langfuse Cloud, used when no host is configured
pub const DEFAULT_HOST: &str = "https://cloud.langfuse.com";

pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Number of buffered ingestion events that triggers a background flush
pub const DEFAULT_FLUSH_AT: usize = 15;

pub const ENABLED_ENV: &str = "LANGFUSE_TRACING_ENABLED";
pub const HOST_ENV: &str = "LANGFUSE_HOST";
pub const PUBLIC_KEY_ENV: &str = "LANGFUSE_PUBLIC_KEY";
pub const SECRET_KEY_ENV: &str = "LANGFUSE_SECRET_KEY";
pub const ENVIRONMENT_ENV: &str = "LANGFUSE_TRACING_ENVIRONMENT";
pub const RELEASE_ENV: &str = "LANGFUSE_RELEASE";
pub const FLUSH_AT_ENV: &str = "LANGFUSE_FLUSH_AT";

/// Tracing settings as supplied by the caller or a config file
///
/// Every field is optional; unset fields are filled by [`TracingSettings::resolve`].
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TracingSettings {
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default)]
    pub host: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub secret_key: Option<SecretString>,
    /// Deployment environment attached to every trace
    #[serde(default)]
    pub environment: Option<String>,
    /// Application release or name attached to every trace
    #[serde(default)]
    pub release: Option<String>,
    #[serde(default)]
    pub flush_at: Option<usize>,
}

impl TracingSettings {
    /// Settings with tracing explicitly switched on
    pub fn enabled() -> Self {
        Self {
            enabled: Some(true),
            ..Self::default()
        }
    }

    /// Settings with tracing explicitly switched off
    pub fn disabled() -> Self {
        Self {
            enabled: Some(false),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    #[must_use]
    pub fn with_credentials(mut self, public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        self.public_key = Some(public_key.into());
        self.secret_key = Some(SecretString::from(secret_key.into()));
        self
    }

    #[must_use]
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = Some(environment.into());
        self
    }

    #[must_use]
    pub fn with_release(mut self, release: impl Into<String>) -> Self {
        self.release = Some(release.into());
        self
    }

    #[must_use]
    pub const fn with_flush_at(mut self, flush_at: usize) -> Self {
        self.flush_at = Some(flush_at);
        self
    }

    /// Fill unset fields from `LANGFUSE_*` environment variables, then defaults
    ///
    /// Resolution never fails. Missing credentials are carried through as
    /// `None` and turn an enabled tracer into a no-op at construction time.
    pub fn resolve(&self) -> TracingConfig {
        let enabled = self.enabled.or_else(|| env::boolean(ENABLED_ENV)).unwrap_or(false);

        let host = non_blank(self.host.as_deref())
            .or_else(|| env::string(HOST_ENV))
            .unwrap_or_else(|| DEFAULT_HOST.to_owned());

        let public_key = non_blank(self.public_key.as_deref()).or_else(|| env::string(PUBLIC_KEY_ENV));

        let secret_key = self
            .secret_key
            .clone()
            .or_else(|| env::string(SECRET_KEY_ENV).map(SecretString::from));

        let environment = non_blank(self.environment.as_deref())
            .or_else(|| env::string(ENVIRONMENT_ENV))
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_owned());

        let release = non_blank(self.release.as_deref()).or_else(|| env::string(RELEASE_ENV));

        let flush_at = self
            .flush_at
            .or_else(|| env::parsed(FLUSH_AT_ENV))
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_FLUSH_AT);

        TracingConfig {
            enabled,
            host,
            public_key,
            secret_key,
            environment,
            release,
            flush_at,
        }
    }
}

/// Fully resolved tracing configuration
#[derive(Debug, Clone)]
pub struct TracingConfig {
    pub enabled: bool,
    pub host: String,
    pub public_key: Option<String>,
    pub secret_key: Option<SecretString>,
    pub environment: String,
    pub release: Option<String>,
    pub flush_at: usize,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: DEFAULT_HOST.to_owned(),
            public_key: None,
            secret_key: None,
            environment: DEFAULT_ENVIRONMENT.to_owned(),
            release: None,
            flush_at: DEFAULT_FLUSH_AT,
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(ToOwned::to_owned)
}
