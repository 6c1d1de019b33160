//! Context configuration, loadable from TOML

use std::path::Path;

use lockstep_runtime::RuntimeConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ContextError, Result};

/// Settings for a [`crate::LockstepContext`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Lag flag for components absent from the lag table
    pub default_lag: bool,

    /// Rebuild after construction and after every `update` scope
    pub auto_rebuild: bool,

    /// Runtime parameters used by every rebuild
    pub runtime: RuntimeConfig,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            default_lag: false,
            auto_rebuild: true,
            runtime: RuntimeConfig::default(),
        }
    }
}

impl ContextConfig {
    /// Load configuration from file; a missing file yields the defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)
                .map_err(|e| ContextError::config(format!("Invalid config file: {}", e)))?;
            config.validate()?;
            Ok(config)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ContextError::config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check the runtime parameters
    pub fn validate(&self) -> Result<()> {
        self.runtime.validate()?;
        Ok(())
    }
}
