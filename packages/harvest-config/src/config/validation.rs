//! Configuration validation
//!
//! Range sanity for flat records. Cross-record checks do not exist at this
//! layer: every record is validated on its own.

use super::error::ConfigResult;

/// Trait for validatable configuration records
///
/// # Example
/// ```rust,ignore
/// use harvest_config::config::Validatable;
///
/// fn start_agent<C: Validatable>(config: C) -> Result<Agent, ConfigError> {
///     config.validate()?;
///     // ... build agent
/// }
/// ```
pub trait Validatable {
    /// Returns `Ok(())` if valid, `Err(ConfigError)` with details if invalid.
    fn validate(&self) -> ConfigResult<()>;

    /// Get the configuration name for error messages
    fn config_name(&self) -> &'static str {
        "Config"
    }
}
