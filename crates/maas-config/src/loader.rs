use std::path::Path;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or TOML parsing fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::from_toml_str(&raw)
    }

    /// Parse configuration from TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML, contains unknown
    /// keys, or a value has the wrong shape
    pub fn from_toml_str(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Reject values that can never resolve to a working setup
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly configured field is blank
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(ref model) = self.client.model
            && model.trim().is_empty()
        {
            anyhow::bail!("client.model must not be blank when set");
        }

        if let Some(ref host) = self.tracing.host
            && host.trim().is_empty()
        {
            anyhow::bail!("tracing.host must not be blank when set");
        }

        if self.tracing.flush_at == Some(0) {
            anyhow::bail!("tracing.flush_at must be greater than 0");
        }

        Ok(())
    }
}
