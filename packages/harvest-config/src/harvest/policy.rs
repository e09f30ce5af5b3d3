//! Harvest policy snapshot
//!
//! Every harvesting knob resolved once, at startup, into one immutable value.
//! The harvesting subsystem owns the snapshot and reads it from any number of
//! threads; nothing in here is mutated after [`HarvestPolicy::resolve`].
//!
//! Interface precedence is a consumer contract: when `allowed_interfaces` is
//! non-empty, `blocked_interfaces` must be ignored. The snapshot exposes both
//! lists exactly as configured and does not reconcile them.

use super::address::{parse_addresses, parse_interfaces, split_delimited, AddressResolver, SystemResolver};
use super::mapping::{resolve_static_mappings, StaticMapping};
use crate::config::error::ConfigResult;
use crate::config::keys::{self, legacy, modern};
use crate::config::provenance::ConfigProvenance;
use crate::config::resolver::Setting;
use crate::config::store::{ConfigStore, EmptyStore, YamlStore};
use serde::Serialize;
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{info, warn};

/// Default harvest timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(90);

static EMPTY_STORE: EmptyStore = EmptyStore;

/// The two stores a policy is resolved from
#[derive(Clone, Copy)]
pub struct ConfigSources<'a> {
    /// Flat legacy properties, consulted first
    pub legacy: &'a dyn ConfigStore,
    /// Hierarchical modern configuration
    pub modern: &'a dyn ConfigStore,
}

impl<'a> ConfigSources<'a> {
    /// Pair a legacy and a modern store
    pub fn new(legacy: &'a dyn ConfigStore, modern: &'a dyn ConfigStore) -> Self {
        Self { legacy, modern }
    }

    /// Only a modern store
    pub fn modern_only(modern: &'a dyn ConfigStore) -> Self {
        Self::new(&EMPTY_STORE, modern)
    }

    /// Only a legacy store
    pub fn legacy_only(legacy: &'a dyn ConfigStore) -> Self {
        Self::new(legacy, &EMPTY_STORE)
    }
}

impl ConfigSources<'static> {
    /// No store at all: every setting takes its default
    pub fn defaults() -> Self {
        Self::new(&EMPTY_STORE, &EMPTY_STORE)
    }
}

/// Resolved harvesting policy
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HarvestPolicy {
    use_link_local_addresses: bool,
    use_ipv6: bool,
    use_dynamic_ports: bool,
    /// `None` means the platform default
    udp_receive_buffer_size: Option<u32>,
    udp_socket_pool_size: u32,
    #[serde(serialize_with = "serialize_millis")]
    timeout: Duration,
    stun_mapping_harvester_addresses: Vec<String>,
    enable_aws_harvester: bool,
    force_aws_harvester: bool,
    static_mappings: BTreeSet<StaticMapping>,
    allowed_addresses: Vec<IpAddr>,
    blocked_addresses: Vec<IpAddr>,
    allowed_interfaces: Vec<String>,
    blocked_interfaces: Vec<String>,
    /// Address entries dropped because they did not resolve
    dropped_address_entries: usize,
    provenance: ConfigProvenance,
}

fn serialize_millis<S: serde::Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
}

impl Default for HarvestPolicy {
    fn default() -> Self {
        Self {
            use_link_local_addresses: true,
            use_ipv6: true,
            use_dynamic_ports: true,
            udp_receive_buffer_size: None,
            udp_socket_pool_size: 0,
            timeout: DEFAULT_TIMEOUT,
            stun_mapping_harvester_addresses: Vec::new(),
            enable_aws_harvester: true,
            force_aws_harvester: false,
            static_mappings: BTreeSet::new(),
            allowed_addresses: Vec::new(),
            blocked_addresses: Vec::new(),
            allowed_interfaces: Vec::new(),
            blocked_interfaces: Vec::new(),
            dropped_address_entries: 0,
            provenance: ConfigProvenance::new(),
        }
    }
}

impl HarvestPolicy {
    /// Resolve with the system address resolver
    pub fn resolve(sources: ConfigSources<'_>) -> ConfigResult<Self> {
        Self::resolve_with(sources, &SystemResolver)
    }

    /// Resolve with a caller-supplied address resolver
    pub fn resolve_with(sources: ConfigSources<'_>, resolver: &dyn AddressResolver) -> ConfigResult<Self> {
        let ConfigSources {
            legacy: legacy_store,
            modern: modern_store,
        } = sources;
        let defaults = Self::default();
        let mut provenance = ConfigProvenance::new();

        let use_link_local_addresses = Setting::<bool>::new("use_link_local_addresses")
            .from(legacy::DISABLE_LINK_LOCAL_ADDRESSES, legacy_store)
            .transformed_by(|disabled| !disabled)
            .from(modern::USE_LINK_LOCAL_ADDRESSES, modern_store)
            .resolve_or(defaults.use_link_local_addresses)?
            .record(&mut provenance, "use_link_local_addresses");

        let udp_receive_buffer_size = Setting::<u32>::new("udp_receive_buffer_size")
            .from(legacy::SO_RCVBUF, legacy_store)
            .from(modern::UDP_RECEIVE_BUFFER_SIZE, modern_store)
            .resolve_optional()?
            .record(&mut provenance, "udp_receive_buffer_size");

        let udp_socket_pool_size = Setting::<u32>::new("udp_socket_pool_size")
            .from(modern::UDP_SOCKET_POOL_SIZE, modern_store)
            .resolve_or(defaults.udp_socket_pool_size)?
            .record(&mut provenance, "udp_socket_pool_size");

        let use_ipv6 = Setting::<bool>::new("use_ipv6")
            .from(legacy::IPV6_DISABLED, legacy_store)
            .transformed_by(|disabled| !disabled)
            .from(modern::USE_IPV6, modern_store)
            .resolve_or(defaults.use_ipv6)?
            .record(&mut provenance, "use_ipv6");

        let use_dynamic_ports = Setting::<bool>::new("use_dynamic_ports")
            .from(legacy::USE_DYNAMIC_HOST_HARVESTER, legacy_store)
            .from(modern::USE_DYNAMIC_PORTS, modern_store)
            .resolve_or(defaults.use_dynamic_ports)?
            .record(&mut provenance, "use_dynamic_ports");

        let timeout = Setting::<Duration>::new("timeout")
            .from(modern::TIMEOUT, modern_store)
            .resolve_or(defaults.timeout)?
            .record(&mut provenance, "timeout");

        let stun_mapping_harvester_addresses = Setting::<Vec<String>>::new("stun_mapping_harvester_addresses")
            .convert_from(legacy::STUN_MAPPING_HARVESTER_ADDRESSES, legacy_store, |text: String| {
                split_non_blank(text.split(','))
            })
            .convert_from(modern::STUN_MAPPING_ADDRESSES, modern_store, |list: Vec<String>| {
                split_non_blank(list.iter().map(String::as_str))
            })
            .resolve_or_else(Vec::new)?
            .record(&mut provenance, "stun_mapping_harvester_addresses");

        let enable_aws_harvester = Setting::<bool>::new("enable_aws_harvester")
            .from(legacy::DISABLE_AWS_HARVESTER, legacy_store)
            .transformed_by(|disabled| !disabled)
            .from(modern::AWS_ENABLED, modern_store)
            .resolve_or(defaults.enable_aws_harvester)?
            .record(&mut provenance, "enable_aws_harvester");

        let force_aws_harvester = Setting::<bool>::new("force_aws_harvester")
            .from(legacy::FORCE_AWS_HARVESTER, legacy_store)
            .from(modern::AWS_FORCE, modern_store)
            .resolve_or(defaults.force_aws_harvester)?
            .record(&mut provenance, "force_aws_harvester");

        let static_mappings = resolve_static_mappings(legacy_store, modern_store, &mut provenance)?;

        let mut dropped_address_entries = 0;
        let mut address_list = |name: &str, legacy_key: &str, modern_key: &str| -> ConfigResult<Vec<IpAddr>> {
            let parsed = Setting::new(name)
                .convert_from(legacy_key, legacy_store, |text: String| {
                    parse_addresses(split_delimited(&text), resolver)
                })
                .convert_from(modern_key, modern_store, |list: Vec<String>| parse_addresses(list, resolver))
                .resolve_or_else(Default::default)?
                .record(&mut provenance, name);
            dropped_address_entries += parsed.dropped;
            Ok(parsed.into_entries())
        };
        let allowed_addresses = address_list(
            "allowed_addresses",
            legacy::ALLOWED_ADDRESSES,
            modern::ALLOWED_ADDRESSES,
        )?;
        let blocked_addresses = address_list(
            "blocked_addresses",
            legacy::BLOCKED_ADDRESSES,
            modern::BLOCKED_ADDRESSES,
        )?;

        let mut interface_list = |name: &str, legacy_key: &str, modern_key: &str| -> ConfigResult<Vec<String>> {
            Ok(Setting::new(name)
                .convert_from(legacy_key, legacy_store, |text: String| split_delimited(&text))
                .convert_from(modern_key, modern_store, |list: Vec<String>| parse_interfaces(list))
                .resolve_or_else(Vec::new)?
                .record(&mut provenance, name))
        };
        let allowed_interfaces = interface_list(
            "allowed_interfaces",
            legacy::ALLOWED_INTERFACES,
            modern::ALLOWED_INTERFACES,
        )?;
        let blocked_interfaces = interface_list(
            "blocked_interfaces",
            legacy::BLOCKED_INTERFACES,
            modern::BLOCKED_INTERFACES,
        )?;

        let policy = Self {
            use_link_local_addresses,
            use_ipv6,
            use_dynamic_ports,
            udp_receive_buffer_size,
            udp_socket_pool_size,
            timeout,
            stun_mapping_harvester_addresses,
            enable_aws_harvester,
            force_aws_harvester,
            static_mappings,
            allowed_addresses,
            blocked_addresses,
            allowed_interfaces,
            blocked_interfaces,
            dropped_address_entries,
            provenance,
        };

        info!(
            static_mappings = policy.static_mappings.len(),
            allowed_addresses = policy.allowed_addresses.len(),
            blocked_addresses = policy.blocked_addresses.len(),
            dropped_address_entries = policy.dropped_address_entries,
            "Harvest policy resolved"
        );
        Ok(policy)
    }

    /// Resolve and additionally warn about unrecognized modern keys
    pub fn resolve_checked(legacy: &dyn ConfigStore, modern: &YamlStore) -> ConfigResult<Self> {
        for unknown in keys::unknown_harvest_keys(modern) {
            warn!("{}", unknown);
        }
        Self::resolve(ConfigSources::new(legacy, modern))
    }

    pub fn use_link_local_addresses(&self) -> bool {
        self.use_link_local_addresses
    }

    pub fn use_ipv6(&self) -> bool {
        self.use_ipv6
    }

    pub fn use_dynamic_ports(&self) -> bool {
        self.use_dynamic_ports
    }

    /// `None`: leave the platform default receive buffer
    pub fn udp_receive_buffer_size(&self) -> Option<u32> {
        self.udp_receive_buffer_size
    }

    pub fn udp_socket_pool_size(&self) -> u32 {
        self.udp_socket_pool_size
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn stun_mapping_harvester_addresses(&self) -> &[String] {
        &self.stun_mapping_harvester_addresses
    }

    pub fn enable_aws_harvester(&self) -> bool {
        self.enable_aws_harvester
    }

    /// The force flag, read unnegated from the legacy key. Intentionally not an
    /// alias of [`Self::enable_aws_harvester`].
    pub fn force_aws_harvester(&self) -> bool {
        self.force_aws_harvester
    }

    pub fn static_mappings(&self) -> &BTreeSet<StaticMapping> {
        &self.static_mappings
    }

    /// Addresses allowed for host candidates; empty means every address is allowed
    pub fn allowed_addresses(&self) -> &[IpAddr] {
        &self.allowed_addresses
    }

    /// Addresses never used for host candidates
    pub fn blocked_addresses(&self) -> &[IpAddr] {
        &self.blocked_addresses
    }

    /// Interfaces allowed for host candidates; empty means no restriction.
    /// When non-empty, [`Self::blocked_interfaces`] must be ignored.
    pub fn allowed_interfaces(&self) -> &[String] {
        &self.allowed_interfaces
    }

    /// Interfaces never used, unless [`Self::allowed_interfaces`] is non-empty
    pub fn blocked_interfaces(&self) -> &[String] {
        &self.blocked_interfaces
    }

    pub fn dropped_address_entries(&self) -> usize {
        self.dropped_address_entries
    }

    pub fn provenance(&self) -> &ConfigProvenance {
        &self.provenance
    }

    pub fn provenance_summary(&self) -> String {
        self.provenance.summary()
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        let mut lines = vec![
            format!("use-link-local-addresses: {}", self.use_link_local_addresses),
            format!("use-ipv6: {}", self.use_ipv6),
            format!("use-dynamic-ports: {}", self.use_dynamic_ports),
            format!(
                "udp receive-buffer-size: {}",
                self.udp_receive_buffer_size
                    .map_or_else(|| "platform default".to_string(), |size| size.to_string())
            ),
            format!("udp socket-pool-size: {}", self.udp_socket_pool_size),
            format!("timeout: {:?}", self.timeout),
            format!("aws harvester: enabled={} force={}", self.enable_aws_harvester, self.force_aws_harvester),
            format!("stun mapping addresses: [{}]", self.stun_mapping_harvester_addresses.join(", ")),
            format!("allowed addresses: [{}]", join_display(&self.allowed_addresses)),
            format!("blocked addresses: [{}]", join_display(&self.blocked_addresses)),
            format!("allowed interfaces: [{}]", self.allowed_interfaces.join(", ")),
            format!("blocked interfaces: [{}]", self.blocked_interfaces.join(", ")),
        ];
        if self.static_mappings.is_empty() {
            lines.push("static mappings: none".to_string());
        } else {
            lines.push("static mappings:".to_string());
            lines.extend(self.static_mappings.iter().map(|m| format!("  {}", m)));
        }
        lines.join("\n")
    }
}

fn split_non_blank<'a>(items: impl Iterator<Item = &'a str>) -> Vec<String> {
    items
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn join_display<T: std::fmt::Display>(items: &[T]) -> String {
    items.iter().map(T::to_string).collect::<Vec<_>>().join(", ")
}
