//! Configuration stores
//!
//! A store is an opaque, read-only source of raw values addressed by key. The
//! resolver only needs [`ConfigStore::has`] and [`ConfigStore::get`]; which
//! store a key is looked up in is decided by the caller's candidate list.
//!
//! Three stores are provided:
//! - [`EmptyStore`]: never has any key (default-only mode)
//! - [`PropertyStore`]: legacy flat `key=value` properties, all values text
//! - [`YamlStore`]: modern hierarchical YAML, keys are dotted paths

use super::error::{ConfigError, ConfigResult};
use super::value::FromConfigValue;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Read-only key/value source consumed by the resolver
pub trait ConfigStore: Send + Sync {
    /// Store name used in provenance and diagnostics
    fn name(&self) -> &str;

    /// Raw value for `key`, or `None` if the key is absent
    fn lookup(&self, key: &str) -> Option<&Value>;

    /// Whether `key` is present
    fn has(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }
}

impl dyn ConfigStore + '_ {
    /// Typed lookup: `Ok(None)` when absent, an error when present but malformed.
    pub fn get<T: FromConfigValue>(&self, key: &str) -> ConfigResult<Option<T>> {
        match self.lookup(key) {
            None => Ok(None),
            Some(raw) => T::from_config_value(raw)
                .map(Some)
                .map_err(|reason| ConfigError::conversion(key, T::EXPECTED, reason)),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// EmptyStore
// ═══════════════════════════════════════════════════════════════════════════

/// Store that never has any key
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyStore;

impl ConfigStore for EmptyStore {
    fn name(&self) -> &str {
        "empty"
    }

    fn lookup(&self, _key: &str) -> Option<&Value> {
        None
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// PropertyStore (legacy)
// ═══════════════════════════════════════════════════════════════════════════

/// Legacy flat property source.
///
/// Values are kept as text and trimmed. A key with a blank value is still
/// present: it wins over later candidates and must convert like any other.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyStore {
    name: String,
    properties: BTreeMap<String, Value>,
}

impl PropertyStore {
    /// Create an empty property store
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    /// Build from key/value pairs
    pub fn from_pairs<K, V, I>(name: impl Into<String>, pairs: I) -> Self
    where
        K: Into<String>,
        V: AsRef<str>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut store = Self::new(name);
        for (key, value) in pairs {
            store.insert(key, value.as_ref());
        }
        store
    }

    /// Parse `.properties` text (`key=value` or `key: value`, `#`/`!` comments)
    pub fn parse(name: impl Into<String>, text: &str) -> ConfigResult<Self> {
        let mut store = Self::new(name);

        for (idx, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let Some(split_at) = line.find(|c: char| c == '=' || c == ':') else {
                return Err(ConfigError::Property {
                    line: idx + 1,
                    reason: format!("expected 'key=value', found '{}'", line),
                });
            };

            let key = line[..split_at].trim();
            if key.is_empty() {
                return Err(ConfigError::Property {
                    line: idx + 1,
                    reason: "empty property name".to_string(),
                });
            }
            store.insert(key, &line[split_at + 1..]);
        }

        Ok(store)
    }

    /// Load a `.properties` file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse(path.display().to_string(), &content)
    }

    fn insert(&mut self, key: impl Into<String>, value: &str) {
        self.properties
            .insert(key.into(), Value::String(value.trim().to_string()));
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether the store holds no property
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

impl ConfigStore for PropertyStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// YamlStore (modern)
// ═══════════════════════════════════════════════════════════════════════════

/// Modern hierarchical source backed by a YAML document.
///
/// `ice4j.harvest.use-ipv6` is found either as nested mappings or as a literal
/// dotted key at any level. `null` values count as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct YamlStore {
    name: String,
    root: Value,
}

impl YamlStore {
    /// Wrap an already parsed YAML value
    pub fn from_value(name: impl Into<String>, root: Value) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }

    /// Parse YAML text. An empty document yields an empty store.
    pub fn from_yaml_str(name: impl Into<String>, yaml: &str) -> ConfigResult<Self> {
        let root = if yaml.trim().is_empty() {
            Value::Mapping(Mapping::new())
        } else {
            serde_yaml::from_str(yaml)?
        };
        Ok(Self::from_value(name, root))
    }

    /// Load a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(path.display().to_string(), &content)
    }

    /// Dotted paths of every leaf below `prefix` (sequences are leaves)
    pub fn leaf_keys_under(&self, prefix: &str) -> Vec<String> {
        let mut leaves = Vec::new();
        flatten(&self.root, String::new(), &mut leaves);
        leaves
            .into_iter()
            .filter(|key| key == prefix || key.starts_with(&format!("{}.", prefix)))
            .collect()
    }
}

impl ConfigStore for YamlStore {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, key: &str) -> Option<&Value> {
        walk(&self.root, key).filter(|value| !value.is_null())
    }
}

fn walk<'a>(node: &'a Value, path: &str) -> Option<&'a Value> {
    let map = node.as_mapping()?;
    if let Some(value) = map.get(path) {
        return Some(value);
    }

    path.match_indices('.').find_map(|(idx, _)| {
        let child = map.get(&path[..idx])?;
        walk(child, &path[idx + 1..])
    })
}

fn flatten(node: &Value, path: String, out: &mut Vec<String>) {
    match node.as_mapping() {
        Some(map) => {
            for (key, child) in map {
                let segment = match key {
                    Value::String(s) => s.clone(),
                    other => match serde_yaml::to_string(other) {
                        Ok(s) => s.trim().to_string(),
                        Err(_) => continue,
                    },
                };
                let child_path = if path.is_empty() {
                    segment
                } else {
                    format!("{}.{}", path, segment)
                };
                flatten(child, child_path, out);
            }
        }
        None if !path.is_empty() => out.push(path),
        None => {}
    }
}
