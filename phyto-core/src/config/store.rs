//! Configuration store
//!
//! Holds the single active [`ControlConfig`]. A new configuration is
//! validated on [`ConfigStore::load`] and staged; it only becomes active on
//! [`ConfigStore::commit`], which the control loop calls at the start of an
//! iteration. Readers never observe a partially applied configuration.

use super::types::{ConfigError, ControlConfig, RawConfig, SensorLimits};

/// Owner of the active control configuration
#[derive(Debug, Clone)]
pub struct ConfigStore {
    /// Configuration in effect
    active: ControlConfig,
    /// Validated configuration waiting for the next iteration boundary
    staged: Option<ControlConfig>,
    /// Limits thresholds are validated against
    limits: SensorLimits,
    /// Number of rejected loads
    rejected: u32,
}

impl ConfigStore {
    /// Create a store with a validated initial configuration
    pub fn new(initial: RawConfig, limits: SensorLimits) -> Result<Self, ConfigError> {
        let active = initial.validate(&limits)?;
        Ok(Self {
            active,
            staged: None,
            limits,
            rejected: 0,
        })
    }

    /// Create a store holding the default configuration
    ///
    /// The defaults go through the same validation as any other
    /// configuration, so limits that exclude them are an error.
    pub fn with_defaults(limits: SensorLimits) -> Result<Self, ConfigError> {
        Self::new(RawConfig::default(), limits)
    }

    /// Get the active configuration
    pub fn active(&self) -> &ControlConfig {
        &self.active
    }

    /// Get the sensor limits
    pub fn limits(&self) -> &SensorLimits {
        &self.limits
    }

    /// Check if a configuration is staged
    pub fn has_staged(&self) -> bool {
        self.staged.is_some()
    }

    /// Number of loads rejected since creation
    pub fn rejected_count(&self) -> u32 {
        self.rejected
    }

    /// Validate and stage a configuration
    ///
    /// On error nothing changes: the active configuration and any
    /// previously staged one are retained. A later successful load replaces
    /// a staged configuration that was never committed.
    pub fn load(&mut self, raw: RawConfig) -> Result<(), ConfigError> {
        match raw.validate(&self.limits) {
            Ok(config) => {
                self.staged = Some(config);
                Ok(())
            }
            Err(e) => {
                self.rejected = self.rejected.saturating_add(1);
                warn!("Configuration rejected: {:?}", e);
                Err(e)
            }
        }
    }

    /// Make the staged configuration active
    ///
    /// Returns the new configuration if one was staged.
    pub fn commit(&mut self) -> Option<&ControlConfig> {
        let staged = self.staged.take()?;
        self.active = staged;
        info!("Configuration applied");
        Some(&self.active)
    }

    /// Validate and activate a configuration immediately
    ///
    /// For use outside the control loop (boot, tests).
    pub fn replace(&mut self, config: ControlConfig) -> Result<(), ConfigError> {
        self.load(config.into())?;
        self.commit();
        Ok(())
    }
}
