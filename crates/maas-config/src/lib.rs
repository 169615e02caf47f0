#![allow(clippy::must_use_candidate)]

//! Settings for the MaaS client and its Langfuse tracing
//!
//! Every value resolves in the same order: an explicit value (builder call
//! or TOML file), then an environment variable, then a literal default.

pub mod client;
mod env;
pub mod langfuse;
mod loader;

use serde::Deserialize;

pub use client::{ClientConfig, ResolvedClientConfig};
pub use langfuse::{TracingConfig, TracingSettings};

/// Top-level SDK configuration file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// MaaS API client settings
    #[serde(default)]
    pub client: ClientConfig,
    /// Langfuse tracing settings
    #[serde(default)]
    pub tracing: TracingSettings,
}
