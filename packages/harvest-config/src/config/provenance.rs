//! Configuration provenance tracking
//!
//! Track which store and key supplied each resolved setting.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Where a resolved setting came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SettingSource {
    /// A candidate key present in a store
    Key { store: String, key: String },

    /// No candidate present, caller-supplied default used
    Default,

    /// No candidate present, optional setting left unset
    Absent,
}

impl SettingSource {
    /// Create a key source
    pub fn key(store: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Key {
            store: store.into(),
            key: key.into(),
        }
    }

    /// The winning key, if any
    pub fn winning_key(&self) -> Option<&str> {
        match self {
            Self::Key { key, .. } => Some(key),
            Self::Default | Self::Absent => None,
        }
    }

    /// Get a short description
    pub fn describe(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for SettingSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key { store, key } => write!(f, "{}:{}", store, key),
            Self::Default => write!(f, "default"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Field-level provenance of a resolved snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigProvenance {
    /// field name → source
    field_sources: BTreeMap<String, SettingSource>,
}

impl ConfigProvenance {
    /// Create empty provenance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the source of a field (last write wins)
    pub fn track_field(&mut self, field: &str, source: SettingSource) {
        self.field_sources.insert(field.to_string(), source);
    }

    /// Get source for a specific field
    pub fn get_source(&self, field: &str) -> Option<&SettingSource> {
        self.field_sources.get(field)
    }

    /// Get all field sources, sorted by field name
    pub fn field_sources(&self) -> &BTreeMap<String, SettingSource> {
        &self.field_sources
    }

    /// Get human-readable summary
    pub fn summary(&self) -> String {
        if self.field_sources.is_empty() {
            return "No settings resolved".to_string();
        }

        let width = self.field_sources.keys().map(String::len).max().unwrap_or(0);
        let mut lines = vec!["Resolved settings:".to_string()];
        for (field, source) in &self.field_sources {
            lines.push(format!("  {:<width$} ← {}", field, source, width = width));
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provenance_tracking() {
        let mut prov = ConfigProvenance::new();
        assert!(prov.field_sources().is_empty());

        prov.track_field("use_ipv6", SettingSource::key("legacy", "org.ice4j.ipv6.DISABLED"));
        assert_eq!(prov.field_sources().len(), 1);

        let source = prov.get_source("use_ipv6").unwrap();
        assert_eq!(source.winning_key(), Some("org.ice4j.ipv6.DISABLED"));
    }

    #[test]
    fn test_field_override() {
        let mut prov = ConfigProvenance::new();
        prov.track_field("timeout", SettingSource::Default);
        prov.track_field("timeout", SettingSource::key("modern", "ice4j.harvest.timeout"));
        assert!(matches!(
            prov.get_source("timeout").unwrap(),
            SettingSource::Key { .. }
        ));
    }

    #[test]
    fn test_get_source_nonexistent() {
        let prov = ConfigProvenance::new();
        assert!(prov.get_source("nonexistent").is_none());
    }

    #[test]
    fn test_summary_formatting() {
        let mut prov = ConfigProvenance::new();
        assert_eq!(prov.summary(), "No settings resolved");

        prov.track_field("z_field", SettingSource::Absent);
        prov.track_field("a_field", SettingSource::key("modern.yaml", "ice4j.harvest.use-ipv6"));
        prov.track_field("m_field", SettingSource::Default);

        let summary = prov.summary();
        assert!(summary.contains("modern.yaml:ice4j.harvest.use-ipv6"));
        assert!(summary.contains("default"));
        assert!(summary.contains("absent"));

        // Alphabetical order (a < m < z)
        let a_pos = summary.find("a_field").unwrap();
        let m_pos = summary.find("m_field").unwrap();
        let z_pos = summary.find("z_field").unwrap();
        assert!(a_pos < m_pos);
        assert!(m_pos < z_pos);
    }

    #[test]
    fn test_source_describe() {
        assert_eq!(SettingSource::Default.describe(), "default");
        assert_eq!(SettingSource::Absent.describe(), "absent");
        assert_eq!(SettingSource::key("legacy", "X").describe(), "legacy:X");
        assert_eq!(SettingSource::Default.winning_key(), None);
    }
}
