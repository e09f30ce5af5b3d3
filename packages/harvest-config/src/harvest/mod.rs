//! Harvesting configuration
//!
//! Candidate-harvest knobs: address and interface filters, port behavior,
//! mapping harvesters and static NAT mappings.

pub mod address;
pub mod mapping;
pub mod policy;

pub use address::{AddressResolver, LiteralResolver, ParsedList, SystemResolver};
pub use mapping::{LegacyNatMapping, StaticMapping};
pub use policy::{ConfigSources, HarvestPolicy, DEFAULT_TIMEOUT};
