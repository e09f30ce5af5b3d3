/*
 * Harvest Config - ICE harvesting and agent configuration
 *
 * Resolves every candidate-harvesting knob once, at startup, from a legacy
 * flat property source and a modern hierarchical YAML source, into an
 * immutable snapshot shared by the harvesters.
 *
 * Architecture:
 * - Ordered (key, store) candidates per setting, legacy first
 * - Fatal conversion errors, lenient address lists
 * - Field-level provenance of every resolved value
 */

pub mod agent;
pub mod config;
pub mod harvest;

// Re-exports
pub use agent::AgentTunables;
pub use config::{
    ConfigError, ConfigProvenance, ConfigResult, ConfigStore, EmptyStore, PropertyStore, Setting,
    SettingSource, Validatable, YamlStore,
};
pub use harvest::{
    AddressResolver, ConfigSources, HarvestPolicy, LiteralResolver, StaticMapping, SystemResolver,
};
