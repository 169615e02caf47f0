use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

use crate::env;

/// Hosted MaaS endpoint used when no base URL is configured
pub const DEFAULT_BASE_URL: &str = "https://infinitai.sifymdp.digital/maas";

/// Ceiling applied to every request unless overridden
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

pub const API_KEY_ENV: &str = "MAAS_API_KEY";
pub const BASE_URL_ENV: &str = "MAAS_BASE_URL";
pub const MODEL_ENV: &str = "MAAS_MODEL";
pub const TIMEOUT_ENV: &str = "MAAS_TIMEOUT";

/// MaaS API client settings as written in a config file
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Bearer token for the MaaS API
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Default model identifier
    #[serde(default)]
    pub model: Option<String>,
    /// Per-request timeout (`"30s"`, `"5m"`)
    #[serde(default, deserialize_with = "duration_str::deserialize_option_duration")]
    pub timeout: Option<Duration>,
}

/// Client settings after environment and default resolution
#[derive(Debug, Clone)]
pub struct ResolvedClientConfig {
    pub api_key: SecretString,
    pub base_url: Url,
    pub model: Option<String>,
    pub timeout: Duration,
}

impl ClientConfig {
    /// Fill unset fields from `MAAS_*` environment variables, then defaults
    ///
    /// # Errors
    ///
    /// Returns an error if no API key is available or the base URL taken
    /// from the environment is not a valid URL
    pub fn resolve(&self) -> anyhow::Result<ResolvedClientConfig> {
        let api_key = self
            .api_key
            .clone()
            .or_else(|| env::string(API_KEY_ENV).map(SecretString::from))
            .ok_or_else(|| anyhow::anyhow!("no API key configured (set client.api_key or {API_KEY_ENV})"))?;

        let base_url = match &self.base_url {
            Some(url) => url.clone(),
            None => {
                let raw = env::string(BASE_URL_ENV).unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
                Url::parse(&raw).map_err(|e| anyhow::anyhow!("invalid base URL `{raw}`: {e}"))?
            }
        };

        let model = self
            .model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(ToOwned::to_owned)
            .or_else(|| env::string(MODEL_ENV));

        let timeout = self
            .timeout
            .or_else(|| env::duration(TIMEOUT_ENV))
            .unwrap_or(DEFAULT_TIMEOUT);

        Ok(ResolvedClientConfig {
            api_key,
            base_url,
            model,
            timeout,
        })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    const ALL_VARS: [&str; 4] = [API_KEY_ENV, BASE_URL_ENV, MODEL_ENV, TIMEOUT_ENV];

    fn without_env<F: FnOnce()>(f: F) {
        temp_env::with_vars_unset(ALL_VARS, f);
    }

    #[test]
    fn explicit_values_win() {
        temp_env::with_vars(
            [
                (API_KEY_ENV, Some("env-key")),
                (BASE_URL_ENV, Some("https://env.example.com")),
                (MODEL_ENV, Some("env-model")),
                (TIMEOUT_ENV, Some("10s")),
            ],
            || {
                let config = ClientConfig {
                    api_key: Some(SecretString::from("explicit-key".to_owned())),
                    base_url: Some(Url::parse("https://explicit.example.com").unwrap()),
                    model: Some("explicit-model".to_owned()),
                    timeout: Some(Duration::from_secs(1)),
                };

                let resolved = config.resolve().unwrap();
                assert_eq!(resolved.api_key.expose_secret(), "explicit-key");
                assert_eq!(resolved.base_url.as_str(), "https://explicit.example.com/");
                assert_eq!(resolved.model.as_deref(), Some("explicit-model"));
                assert_eq!(resolved.timeout, Duration::from_secs(1));
            },
        );
    }

    #[test]
    fn environment_fills_gaps() {
        temp_env::with_vars(
            [
                (API_KEY_ENV, Some("env-key")),
                (BASE_URL_ENV, Some("https://env.example.com/maas")),
                (MODEL_ENV, Some("env-model")),
                (TIMEOUT_ENV, Some("10s")),
            ],
            || {
                let resolved = ClientConfig::default().resolve().unwrap();
                assert_eq!(resolved.api_key.expose_secret(), "env-key");
                assert_eq!(resolved.base_url.as_str(), "https://env.example.com/maas");
                assert_eq!(resolved.model.as_deref(), Some("env-model"));
                assert_eq!(resolved.timeout, Duration::from_secs(10));
            },
        );
    }

    #[test]
    fn defaults_apply_last() {
        temp_env::with_vars_unset([BASE_URL_ENV, MODEL_ENV, TIMEOUT_ENV], || {
            let config = ClientConfig {
                api_key: Some(SecretString::from("key".to_owned())),
                ..ClientConfig::default()
            };

            let resolved = config.resolve().unwrap();
            assert_eq!(resolved.base_url.as_str(), DEFAULT_BASE_URL);
            assert_eq!(resolved.model, None);
            assert_eq!(resolved.timeout, DEFAULT_TIMEOUT);
        });
    }

    #[test]
    fn blank_model_falls_through() {
        without_env(|| {
            let config = ClientConfig {
                api_key: Some(SecretString::from("key".to_owned())),
                model: Some("   ".to_owned()),
                ..ClientConfig::default()
            };

            assert_eq!(config.resolve().unwrap().model, None);
        });
    }

    #[test]
    fn missing_api_key_is_an_error() {
        without_env(|| {
            let err = ClientConfig::default().resolve().unwrap_err();
            assert!(err.to_string().contains(API_KEY_ENV));
        });
    }

    #[test]
    fn invalid_env_base_url_is_an_error() {
        temp_env::with_vars(
            [(API_KEY_ENV, Some("key")), (BASE_URL_ENV, Some("not a url"))],
            || {
                let err = ClientConfig::default().resolve().unwrap_err();
                assert!(err.to_string().contains("invalid base URL"));
            },
        );
    }
}
