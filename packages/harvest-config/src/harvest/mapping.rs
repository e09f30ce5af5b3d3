//! Static local→public address mappings
//!
//! Two sources feed the final set:
//! - the modern structured list, where each entry's `local-port` and
//!   `public-port` must be both present or both absent (a half-specified entry
//!   fails the whole resolution)
//! - the legacy single NAT pair, host-only, added as one port-less mapping
//!   when both of its keys are present
//!
//! The result is a duplicate-eliminating set; equality is over every field.

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::keys::{legacy, modern};
use crate::config::provenance::ConfigProvenance;
use crate::config::resolver::Setting;
use crate::config::store::ConfigStore;
use crate::config::value::{describe, FromConfigValue};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeSet;
use std::fmt;
use tracing::warn;

/// Operator-declared translation between a local and a public address
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct StaticMapping {
    pub local_address: String,
    pub public_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub local_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl StaticMapping {
    /// Host-only mapping
    pub fn new(local_address: impl Into<String>, public_address: impl Into<String>) -> Self {
        Self {
            local_address: local_address.into(),
            public_address: public_address.into(),
            local_port: None,
            public_port: None,
            name: None,
        }
    }

    /// Set both ports
    pub fn with_ports(mut self, local_port: u16, public_port: u16) -> Self {
        self.local_port = Some(local_port);
        self.public_port = Some(public_port);
        self
    }

    /// Set the name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl fmt::Display for StaticMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_endpoint(f, &self.local_address, self.local_port)?;
        write!(f, " -> ")?;
        write_endpoint(f, &self.public_address, self.public_port)?;
        if let Some(name) = &self.name {
            write!(f, " ({})", name)?;
        }
        Ok(())
    }
}

fn write_endpoint(f: &mut fmt::Formatter<'_>, address: &str, port: Option<u16>) -> fmt::Result {
    match port {
        Some(port) => write!(f, "{}:{}", address, port),
        None => write!(f, "{}", address),
    }
}

/// The legacy single NAT pair (host-only, no ports)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyNatMapping {
    pub local_address: String,
    pub public_address: String,
}

impl From<LegacyNatMapping> for StaticMapping {
    fn from(legacy: LegacyNatMapping) -> Self {
        StaticMapping::new(legacy.local_address, legacy.public_address)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Modern list parsing
// ═══════════════════════════════════════════════════════════════════════════

/// Parse the modern structured list found under `key`.
///
/// Fails on the first malformed entry; no partial set is returned.
pub fn parse_static_mappings(key: &str, value: &Value) -> ConfigResult<BTreeSet<StaticMapping>> {
    let Value::Sequence(entries) = value else {
        return Err(ConfigError::conversion(
            key,
            "a list of static mappings",
            describe(value),
        ));
    };

    entries
        .iter()
        .enumerate()
        .map(|(index, entry)| parse_entry(key, index, entry))
        .collect()
}

fn parse_entry(key: &str, index: usize, entry: &Value) -> ConfigResult<StaticMapping> {
    let Value::Mapping(fields) = entry else {
        return Err(ConfigError::InvalidMapping {
            index,
            reason: format!("expected a mapping, {}", describe(entry)),
        });
    };

    let local_address: String = required_field(key, index, fields, "local-address")?;
    let public_address: String = required_field(key, index, fields, "public-address")?;
    let local_port: Option<u16> = optional_field(key, index, fields, "local-port")?;
    let public_port: Option<u16> = optional_field(key, index, fields, "public-port")?;
    let name: Option<String> = optional_field(key, index, fields, "name")?;

    let mapping = StaticMapping {
        local_address,
        public_address,
        local_port,
        public_port,
        name,
    };

    if local_port.is_some() != public_port.is_some() {
        return Err(ConfigError::InconsistentPortPairing {
            index,
            entry: mapping.to_string(),
        });
    }

    Ok(mapping)
}

fn optional_field<T: FromConfigValue>(
    key: &str,
    index: usize,
    fields: &Mapping,
    field: &str,
) -> ConfigResult<Option<T>> {
    match fields.get(field).filter(|value| !value.is_null()) {
        None => Ok(None),
        Some(raw) => T::from_config_value(raw).map(Some).map_err(|reason| {
            ConfigError::conversion(format!("{}[{}].{}", key, index, field), T::EXPECTED, reason)
        }),
    }
}

fn required_field<T: FromConfigValue>(
    key: &str,
    index: usize,
    fields: &Mapping,
    field: &str,
) -> ConfigResult<T> {
    optional_field(key, index, fields, field)?.ok_or_else(|| ConfigError::InvalidMapping {
        index,
        reason: format!("missing '{}'", field),
    })
}

/// Union of the modern set and the legacy pair, if any
pub fn merge_legacy_mapping(
    mut mappings: BTreeSet<StaticMapping>,
    legacy: Option<LegacyNatMapping>,
) -> BTreeSet<StaticMapping> {
    if let Some(legacy) = legacy {
        mappings.insert(legacy.into());
    }
    mappings
}

// ═══════════════════════════════════════════════════════════════════════════
// Resolution from stores
// ═══════════════════════════════════════════════════════════════════════════

/// Resolve the effective mapping set from the legacy and modern stores
pub fn resolve_static_mappings(
    legacy_store: &dyn ConfigStore,
    modern_store: &dyn ConfigStore,
    provenance: &mut ConfigProvenance,
) -> ConfigResult<BTreeSet<StaticMapping>> {
    let from_modern = Setting::<BTreeSet<StaticMapping>>::new("static_mappings")
        .with_converter(modern::STATIC_MAPPINGS, modern_store, parse_static_mappings)
        .resolve_or_else(BTreeSet::new)?
        .record(provenance, "static_mappings");

    let local = Setting::<String>::new("nat_harvester_local_address")
        .from(legacy::NAT_HARVESTER_LOCAL_ADDRESS, legacy_store)
        .resolve_optional()?
        .record(provenance, "nat_harvester_local_address");
    let public = Setting::<String>::new("nat_harvester_public_address")
        .from(legacy::NAT_HARVESTER_PUBLIC_ADDRESS, legacy_store)
        .resolve_optional()?
        .record(provenance, "nat_harvester_public_address");

    let legacy_pair = match (local, public) {
        (Some(local_address), Some(public_address)) => Some(LegacyNatMapping {
            local_address,
            public_address,
        }),
        (None, None) => None,
        (local, public) => {
            warn!(
                local = ?local,
                public = ?public,
                "Legacy NAT mapping needs both local and public address, ignoring it"
            );
            None
        }
    };

    Ok(merge_legacy_mapping(from_modern, legacy_pair))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::{EmptyStore, PropertyStore, YamlStore};

    fn list(yaml: &str) -> Value {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_host_only_entry() {
        let mappings =
            parse_static_mappings("k", &list("- local-address: 10.0.0.1\n  public-address: 1.2.3.4\n")).unwrap();
        assert_eq!(mappings.len(), 1);
        let mapping = mappings.iter().next().unwrap();
        assert_eq!(mapping, &StaticMapping::new("10.0.0.1", "1.2.3.4"));
        assert_eq!(mapping.local_port, None);
        assert_eq!(mapping.public_port, None);
    }

    #[test]
    fn test_full_entry() {
        let yaml = r#"
- local-address: 10.0.0.1
  public-address: 1.2.3.4
  local-port: 10000
  public-port: 20000
  name: media
"#;
        let mappings = parse_static_mappings("k", &list(yaml)).unwrap();
        let expected = StaticMapping::new("10.0.0.1", "1.2.3.4")
            .with_ports(10000, 20000)
            .with_name("media");
        assert!(mappings.contains(&expected));
        assert_eq!(expected.to_string(), "10.0.0.1:10000 -> 1.2.3.4:20000 (media)");
    }

    #[test]
    fn test_half_specified_ports_fail() {
        let yaml = r#"
- local-address: 10.0.0.9
  public-address: 9.9.9.9
- local-address: 10.0.0.1
  public-address: 1.2.3.4
  local-port: 5000
"#;
        let err = parse_static_mappings("k", &list(yaml)).unwrap_err();
        match err {
            ConfigError::InconsistentPortPairing { index, entry } => {
                assert_eq!(index, 1);
                assert!(entry.contains("10.0.0.1:5000"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let only_public = "- local-address: a\n  public-address: b\n  public-port: 1\n";
        assert!(matches!(
            parse_static_mappings("k", &list(only_public)),
            Err(ConfigError::InconsistentPortPairing { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_address_is_invalid() {
        let err = parse_static_mappings("k", &list("- public-address: 1.2.3.4\n")).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMapping { index: 0, ref reason } if reason.contains("local-address")));
    }

    #[test]
    fn test_bad_port_is_conversion_error() {
        let yaml = "- local-address: a\n  public-address: b\n  local-port: 70000\n  public-port: 1\n";
        let err = parse_static_mappings("maps", &list(yaml)).unwrap_err();
        assert!(matches!(err, ConfigError::Conversion { ref key, .. } if key == "maps[0].local-port"));
    }

    #[test]
    fn test_not_a_list() {
        assert!(matches!(
            parse_static_mappings("k", &Value::String("x".to_string())),
            Err(ConfigError::Conversion { .. })
        ));
        assert!(matches!(
            parse_static_mappings("k", &list("- just text\n")),
            Err(ConfigError::InvalidMapping { index: 0, .. })
        ));
    }

    #[test]
    fn test_duplicates_collapse() {
        let yaml = r#"
- local-address: 10.0.0.1
  public-address: 1.2.3.4
- local-address: 10.0.0.1
  public-address: 1.2.3.4
"#;
        assert_eq!(parse_static_mappings("k", &list(yaml)).unwrap().len(), 1);
    }

    #[test]
    fn test_merge_legacy() {
        let modern: BTreeSet<_> = [StaticMapping::new("10.0.0.1", "1.2.3.4")].into();
        let legacy = LegacyNatMapping {
            local_address: "10.0.0.2".to_string(),
            public_address: "5.6.7.8".to_string(),
        };
        let merged = merge_legacy_mapping(modern.clone(), Some(legacy));
        assert_eq!(merged.len(), 2);
        assert!(merged.contains(&StaticMapping::new("10.0.0.2", "5.6.7.8")));

        // Identical legacy and modern entries collapse
        let same = LegacyNatMapping {
            local_address: "10.0.0.1".to_string(),
            public_address: "1.2.3.4".to_string(),
        };
        assert_eq!(merge_legacy_mapping(modern, Some(same)).len(), 1);
    }

    #[test]
    fn test_resolve_from_stores() {
        let legacy = PropertyStore::from_pairs(
            "legacy",
            [
                (legacy::NAT_HARVESTER_LOCAL_ADDRESS, "10.0.0.2"),
                (legacy::NAT_HARVESTER_PUBLIC_ADDRESS, "5.6.7.8"),
            ],
        );
        let modern = YamlStore::from_yaml_str(
            "modern",
            r#"
ice4j:
  harvest:
    mapping:
      static-mappings:
        - local-address: 10.0.0.1
          public-address: 1.2.3.4
          name: primary
"#,
        )
        .unwrap();

        let mut provenance = ConfigProvenance::new();
        let mappings = resolve_static_mappings(&legacy, &modern, &mut provenance).unwrap();
        assert_eq!(mappings.len(), 2);
        assert_eq!(
            provenance.get_source("static_mappings").and_then(|s| s.winning_key()),
            Some(modern::STATIC_MAPPINGS)
        );
    }

    #[test]
    fn test_half_legacy_pair_is_ignored() {
        let legacy = PropertyStore::from_pairs("legacy", [(legacy::NAT_HARVESTER_LOCAL_ADDRESS, "10.0.0.2")]);
        let mut provenance = ConfigProvenance::new();
        let mappings = resolve_static_mappings(&legacy, &EmptyStore, &mut provenance).unwrap();
        assert!(mappings.is_empty());
    }
}
