//! Layered configuration resolution
//!
//! Settings are resolved from an explicit, ordered list of `(key, store)`
//! candidates instead of declaration order:
//! - Legacy flat properties are consulted first, possibly through a transform
//!   (e.g. `DISABLED` flags are negated)
//! - Modern hierarchical keys come next
//! - The caller-supplied default (or absence) closes the chain
//!
//! # Examples
//!
//! ```rust,ignore
//! use harvest_config::config::{PropertyStore, Setting, YamlStore};
//!
//! let legacy = PropertyStore::from_file("sip-communicator.properties")?;
//! let modern = YamlStore::from_file("ice4j.yaml")?;
//!
//! let pool = Setting::<u32>::new("udp_socket_pool_size")
//!     .from("ice4j.harvest.udp.socket-pool-size", &modern)
//!     .resolve_or(0)?;
//! println!("{} (from {})", pool.value, pool.source);
//! ```

pub mod error;
pub mod keys;
pub mod provenance;
pub mod resolver;
pub mod store;
pub mod validation;
pub mod value;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use provenance::{ConfigProvenance, SettingSource};
pub use resolver::{ResolvedSetting, Setting};
pub use store::{ConfigStore, EmptyStore, PropertyStore, YamlStore};
pub use validation::Validatable;
pub use value::FromConfigValue;
