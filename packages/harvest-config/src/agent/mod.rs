//! ICE agent tunables

pub mod tunables;

pub use tunables::AgentTunables;
