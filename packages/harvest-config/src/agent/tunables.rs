//! Agent tunables
//!
//! Flat timing and sizing knobs of the ICE agent core. Every field has its own
//! default and there is no resolution chain; the record can be built in code
//! or read from the `ice4j.agent` section of a YAML document.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::keys::modern;
use crate::config::store::{ConfigStore, YamlStore};
use crate::config::validation::Validatable;
use crate::config::value::describe;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// ICE agent tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct AgentTunables {
    /// Interval between consent freshness checks
    #[serde(with = "duration_millis")]
    pub consent_freshness_interval: Duration,

    /// Randomize the consent freshness interval
    pub randomize_consent_freshness_interval: bool,

    /// Initial wait for a consent freshness response
    #[serde(with = "duration_millis")]
    pub consent_freshness_original_wait_interval: Duration,

    /// Upper bound of the (backed-off) wait
    #[serde(with = "duration_millis")]
    pub consent_freshness_max_wait_interval: Duration,

    pub max_consent_freshness_retransmissions: u32,

    /// Delay before a completed agent is terminated
    #[serde(with = "duration_millis")]
    pub termination_delay: Duration,

    pub max_check_list_size: usize,

    /// SOFTWARE attribute of outgoing messages; `None` omits the attribute
    pub software: Option<String>,

    /// Redact remote IP addresses in logs
    pub redact_remote_addresses: bool,

    /// Use the per-component merging socket by default
    pub use_component_socket: bool,
}

impl Default for AgentTunables {
    fn default() -> Self {
        Self {
            consent_freshness_interval: Duration::from_millis(15_000),
            randomize_consent_freshness_interval: true,
            consent_freshness_original_wait_interval: Duration::from_millis(500),
            consent_freshness_max_wait_interval: Duration::from_millis(500),
            max_consent_freshness_retransmissions: 30,
            termination_delay: Duration::from_millis(3_000),
            max_check_list_size: 100,
            software: Some("ice4j.org".to_string()),
            redact_remote_addresses: false,
            use_component_socket: true,
        }
    }
}

impl AgentTunables {
    /// Read the `ice4j.agent` section; a missing section yields the defaults
    pub fn from_store(store: &YamlStore) -> ConfigResult<Self> {
        let Some(section) = store.lookup(modern::AGENT_ROOT) else {
            return Ok(Self::default());
        };
        if !section.is_mapping() {
            return Err(ConfigError::conversion(
                modern::AGENT_ROOT,
                "a mapping of agent tunables",
                describe(section),
            ));
        }

        let tunables: Self = serde_yaml::from_value(section.clone())?;
        if let Err(e) = tunables.validate() {
            warn!(config = tunables.config_name(), error = %e, "Rejected agent tunables");
            return Err(e);
        }
        Ok(tunables)
    }

    /// Parse a YAML document and read its `ice4j.agent` section
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        Self::from_store(&YamlStore::from_yaml_str("agent", yaml)?)
    }
}

impl Validatable for AgentTunables {
    fn validate(&self) -> ConfigResult<()> {
        if self.consent_freshness_interval.is_zero() {
            return Err(ConfigError::range_with_hint(
                "consent_freshness_interval",
                "0ms",
                "1ms",
                "unbounded",
                "Consent freshness checks need a non-zero interval",
            ));
        }

        if self.max_check_list_size == 0 {
            return Err(ConfigError::range_with_hint(
                "max_check_list_size",
                self.max_check_list_size,
                1,
                usize::MAX,
                "A check list must hold at least one candidate pair",
            ));
        }

        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "AgentTunables"
    }
}

// Durations as integer milliseconds
mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let tunables = AgentTunables::default();
        assert_eq!(tunables.consent_freshness_interval, Duration::from_secs(15));
        assert!(tunables.randomize_consent_freshness_interval);
        assert_eq!(tunables.max_consent_freshness_retransmissions, 30);
        assert_eq!(tunables.termination_delay, Duration::from_secs(3));
        assert_eq!(tunables.max_check_list_size, 100);
        assert_eq!(tunables.software.as_deref(), Some("ice4j.org"));
        assert!(!tunables.redact_remote_addresses);
        assert!(tunables.use_component_socket);
        assert!(tunables.validate().is_ok());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let yaml = r#"
ice4j:
  agent:
    max-check-list-size: 10
    termination-delay: 1000
    software: ~
"#;
        let tunables = AgentTunables::from_yaml_str(yaml).unwrap();
        assert_eq!(tunables.max_check_list_size, 10);
        assert_eq!(tunables.termination_delay, Duration::from_secs(1));
        assert_eq!(tunables.software, None);
        assert_eq!(tunables.consent_freshness_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_missing_section_is_default() {
        let tunables = AgentTunables::from_yaml_str("ice4j:\n  harvest: {}\n").unwrap();
        assert_eq!(tunables, AgentTunables::default());
    }

    #[test]
    fn test_negative_interval_rejected() {
        let yaml = "ice4j:\n  agent:\n    consent-freshness-interval: -5\n";
        assert!(matches!(AgentTunables::from_yaml_str(yaml), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_invalid_section_rejected_on_load() {
        let yaml = "ice4j:\n  agent:\n    max-check-list-size: 0\n";
        assert!(matches!(AgentTunables::from_yaml_str(yaml), Err(ConfigError::Range { ref field, .. }) if field == "max_check_list_size"));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = "ice4j:\n  agent:\n    max-check-list-sise: 5\n";
        assert!(AgentTunables::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_validation() {
        let mut tunables = AgentTunables::default();
        tunables.max_check_list_size = 0;
        assert!(matches!(tunables.validate(), Err(ConfigError::Range { .. })));

        let mut tunables = AgentTunables::default();
        tunables.consent_freshness_interval = Duration::ZERO;
        assert!(matches!(tunables.validate(), Err(ConfigError::Range { .. })));
        assert_eq!(tunables.config_name(), "AgentTunables");
    }

    #[test]
    fn test_serialized_as_millis() {
        let json = serde_json::to_string(&AgentTunables::default()).unwrap();
        assert!(json.contains("\"consent-freshness-interval\":15000"));
    }
}
