//! Recognized configuration keys
//!
//! Legacy keys are flat property names read from the legacy store; modern keys
//! are dotted paths read from the hierarchical store. Legacy candidates are
//! always listed before modern ones.

use super::error::ConfigError;
use super::store::YamlStore;

/// Legacy (flat property) keys
pub mod legacy {
    pub const DISABLE_LINK_LOCAL_ADDRESSES: &str = "org.ice4j.ice.harvest.DISABLE_LINK_LOCAL_ADDRESSES";
    pub const SO_RCVBUF: &str = "org.ice4j.ice.harvest.AbstractUdpListener.SO_RCVBUF";
    pub const IPV6_DISABLED: &str = "org.ice4j.ipv6.DISABLED";
    pub const USE_DYNAMIC_HOST_HARVESTER: &str = "org.ice4j.ice.harvest.USE_DYNAMIC_HOST_HARVESTER";
    pub const STUN_MAPPING_HARVESTER_ADDRESSES: &str = "org.ice4j.ice.harvest.STUN_MAPPING_HARVESTER_ADDRESSES";
    pub const DISABLE_AWS_HARVESTER: &str = "org.ice4j.ice.harvest.DISABLE_AWS_HARVESTER";
    pub const FORCE_AWS_HARVESTER: &str = "org.ice4j.ice.harvest.FORCE_AWS_HARVESTER";
    pub const NAT_HARVESTER_LOCAL_ADDRESS: &str = "org.ice4j.ice.harvest.NAT_HARVESTER_LOCAL_ADDRESS";
    pub const NAT_HARVESTER_PUBLIC_ADDRESS: &str = "org.ice4j.ice.harvest.NAT_HARVESTER_PUBLIC_ADDRESS";
    pub const ALLOWED_ADDRESSES: &str = "org.ice4j.ice.harvest.ALLOWED_ADDRESSES";
    pub const BLOCKED_ADDRESSES: &str = "org.ice4j.ice.harvest.BLOCKED_ADDRESSES";
    pub const ALLOWED_INTERFACES: &str = "org.ice4j.ice.harvest.ALLOWED_INTERFACES";
    pub const BLOCKED_INTERFACES: &str = "org.ice4j.ice.harvest.BLOCKED_INTERFACES";
}

/// Modern (hierarchical) keys
pub mod modern {
    /// Root of every harvest key
    pub const HARVEST_ROOT: &str = "ice4j.harvest";

    pub const USE_LINK_LOCAL_ADDRESSES: &str = "ice4j.harvest.use-link-local-addresses";
    pub const UDP_RECEIVE_BUFFER_SIZE: &str = "ice4j.harvest.udp.receive-buffer-size";
    pub const UDP_SOCKET_POOL_SIZE: &str = "ice4j.harvest.udp.socket-pool-size";
    pub const USE_IPV6: &str = "ice4j.harvest.use-ipv6";
    pub const USE_DYNAMIC_PORTS: &str = "ice4j.harvest.udp.use-dynamic-ports";
    pub const TIMEOUT: &str = "ice4j.harvest.timeout";
    pub const STUN_MAPPING_ADDRESSES: &str = "ice4j.harvest.mapping.stun.addresses";
    pub const AWS_ENABLED: &str = "ice4j.harvest.mapping.aws.enabled";
    pub const AWS_FORCE: &str = "ice4j.harvest.mapping.aws.force";
    pub const STATIC_MAPPINGS: &str = "ice4j.harvest.mapping.static-mappings";
    pub const ALLOWED_ADDRESSES: &str = "ice4j.harvest.allowed-addresses";
    pub const BLOCKED_ADDRESSES: &str = "ice4j.harvest.blocked-addresses";
    pub const ALLOWED_INTERFACES: &str = "ice4j.harvest.allowed-interfaces";
    pub const BLOCKED_INTERFACES: &str = "ice4j.harvest.blocked-interfaces";

    /// Every recognized key under [`HARVEST_ROOT`]
    pub const ALL: &[&str] = &[
        USE_LINK_LOCAL_ADDRESSES,
        UDP_RECEIVE_BUFFER_SIZE,
        UDP_SOCKET_POOL_SIZE,
        USE_IPV6,
        USE_DYNAMIC_PORTS,
        TIMEOUT,
        STUN_MAPPING_ADDRESSES,
        AWS_ENABLED,
        AWS_FORCE,
        STATIC_MAPPINGS,
        ALLOWED_ADDRESSES,
        BLOCKED_ADDRESSES,
        ALLOWED_INTERFACES,
        BLOCKED_INTERFACES,
    ];

    /// Root of the agent tunables section
    pub const AGENT_ROOT: &str = "ice4j.agent";
}

/// Unrecognized keys under `ice4j.harvest`, each with a closest-match suggestion.
///
/// These are reported, never fatal.
pub fn unknown_harvest_keys(store: &YamlStore) -> Vec<ConfigError> {
    store
        .leaf_keys_under(modern::HARVEST_ROOT)
        .into_iter()
        .filter(|key| !modern::ALL.contains(&key.as_str()))
        .map(|key| ConfigError::unknown_key_with_suggestion(key, modern::ALL))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modern_keys_are_under_root() {
        for key in modern::ALL {
            assert!(key.starts_with("ice4j.harvest."), "{key}");
        }
    }

    #[test]
    fn test_unknown_harvest_keys() {
        let yaml = r#"
ice4j:
  harvest:
    use-ipv6: true
    use-ipv7: true
    udp:
      socket-pool-size: 2
  agent:
    whatever: 1
"#;
        let store = YamlStore::from_yaml_str("modern", yaml).unwrap();
        let unknown = unknown_harvest_keys(&store);
        assert_eq!(unknown.len(), 1);
        match &unknown[0] {
            ConfigError::UnknownKey { key, suggestion } => {
                assert_eq!(key, "ice4j.harvest.use-ipv7");
                assert!(suggestion.contains("ice4j.harvest.use-ipv6"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_no_unknown_keys_in_clean_document() {
        let yaml = r#"
ice4j:
  harvest:
    allowed-interfaces: [eth0]
    mapping:
      aws:
        enabled: false
"#;
        let store = YamlStore::from_yaml_str("modern", yaml).unwrap();
        assert!(unknown_harvest_keys(&store).is_empty());
    }
}
