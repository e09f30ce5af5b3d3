//! Ordered-candidate setting resolution
//!
//! A [`Setting`] lists, in precedence order, the `(key, store)` pairs that may
//! supply a value. The first candidate whose key is present wins; its raw
//! value is converted (and optionally transformed) and a conversion failure is
//! an error, never a fall-through to the next candidate.
//!
//! ```rust,ignore
//! let use_ipv6 = Setting::<bool>::new("use_ipv6")
//!     .from("org.ice4j.ipv6.DISABLED", legacy)
//!     .transformed_by(|disabled| !disabled)
//!     .from("ice4j.harvest.use-ipv6", modern)
//!     .resolve_or(true)?;
//! ```

use super::error::{ConfigError, ConfigResult};
use super::provenance::{ConfigProvenance, SettingSource};
use super::store::ConfigStore;
use super::value::FromConfigValue;
use serde_yaml::Value;
use tracing::debug;

type Converter<'s, T> = Box<dyn Fn(&str, &Value) -> ConfigResult<T> + 's>;

struct Candidate<'s, T> {
    key: String,
    store: &'s dyn ConfigStore,
    convert: Converter<'s, T>,
}

/// A typed value together with the source that supplied it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSetting<T> {
    pub value: T,
    pub source: SettingSource,
}

impl<T> ResolvedSetting<T> {
    /// Map the value, keeping the source
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ResolvedSetting<U> {
        ResolvedSetting {
            value: f(self.value),
            source: self.source,
        }
    }

    /// Record the source under `field` and return the value
    pub fn record(self, provenance: &mut ConfigProvenance, field: &str) -> T {
        provenance.track_field(field, self.source);
        self.value
    }
}

/// Ordered candidate list for one setting
pub struct Setting<'s, T> {
    name: String,
    candidates: Vec<Candidate<'s, T>>,
}

impl<'s, T: 's> Setting<'s, T> {
    /// Create a setting with no candidates
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            candidates: Vec::new(),
        }
    }

    /// Add a candidate converted straight to `T`
    pub fn from(self, key: impl Into<String>, store: &'s dyn ConfigStore) -> Self
    where
        T: FromConfigValue,
    {
        self.convert_from(key, store, |value: T| value)
    }

    /// Add a candidate read as `R` and adapted to `T` (e.g. split text into a list)
    pub fn convert_from<R, F>(self, key: impl Into<String>, store: &'s dyn ConfigStore, f: F) -> Self
    where
        R: FromConfigValue,
        F: Fn(R) -> T + 's,
    {
        self.with_converter(key, store, move |key: &str, raw: &Value| {
            R::from_config_value(raw)
                .map(&f)
                .map_err(|reason| ConfigError::conversion(key, R::EXPECTED, reason))
        })
    }

    /// Add a candidate with a fully custom converter
    pub fn with_converter<F>(mut self, key: impl Into<String>, store: &'s dyn ConfigStore, f: F) -> Self
    where
        F: Fn(&str, &Value) -> ConfigResult<T> + 's,
    {
        self.candidates.push(Candidate {
            key: key.into(),
            store,
            convert: Box::new(f),
        });
        self
    }

    /// Attach a transform to the most recently added candidate.
    ///
    /// Has no effect on a setting without candidates.
    pub fn transformed_by<F>(mut self, f: F) -> Self
    where
        F: Fn(T) -> T + 's,
    {
        if let Some(last) = self.candidates.pop() {
            let inner = last.convert;
            self.candidates.push(Candidate {
                key: last.key,
                store: last.store,
                convert: Box::new(move |key: &str, raw: &Value| inner(key, raw).map(&f)),
            });
        }
        self
    }

    /// Setting name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Candidate keys in precedence order
    pub fn keys(&self) -> Vec<&str> {
        self.candidates.iter().map(|c| c.key.as_str()).collect()
    }

    /// Resolve, falling back to `default` when no candidate is present
    pub fn resolve_or(self, default: T) -> ConfigResult<ResolvedSetting<T>> {
        self.resolve_or_else(|| default)
    }

    /// Resolve, computing the default lazily
    pub fn resolve_or_else(self, default: impl FnOnce() -> T) -> ConfigResult<ResolvedSetting<T>> {
        match self.first_present()? {
            Some(resolved) => Ok(resolved),
            None => {
                debug!(setting = %self.name, "using default");
                Ok(ResolvedSetting {
                    value: default(),
                    source: SettingSource::Default,
                })
            }
        }
    }

    /// Resolve a mandatory setting; no present candidate is an error
    pub fn resolve_required(self) -> ConfigResult<ResolvedSetting<T>> {
        match self.first_present()? {
            Some(resolved) => Ok(resolved),
            None => Err(ConfigError::MissingSetting {
                keys: self.keys().into_iter().map(str::to_string).collect(),
                setting: self.name,
            }),
        }
    }

    /// Resolve an optional setting; no present candidate yields `None`
    pub fn resolve_optional(self) -> ConfigResult<ResolvedSetting<Option<T>>> {
        match self.first_present()? {
            Some(resolved) => Ok(resolved.map(Some)),
            None => Ok(ResolvedSetting {
                value: None,
                source: SettingSource::Absent,
            }),
        }
    }

    fn first_present(&self) -> ConfigResult<Option<ResolvedSetting<T>>> {
        let Some(candidate) = self.candidates.iter().find(|c| c.store.has(&c.key)) else {
            return Ok(None);
        };

        // has() was true, lookup() cannot miss for a well-behaved store
        let raw = candidate
            .store
            .lookup(&candidate.key)
            .ok_or_else(|| ConfigError::MissingSetting {
                setting: self.name.clone(),
                keys: vec![candidate.key.clone()],
            })?;

        let value = (candidate.convert)(&candidate.key, raw)?;
        debug!(
            setting = %self.name,
            key = %candidate.key,
            store = candidate.store.name(),
            "resolved setting"
        );

        Ok(Some(ResolvedSetting {
            value,
            source: SettingSource::key(candidate.store.name(), candidate.key.as_str()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::store::{EmptyStore, PropertyStore, YamlStore};

    fn legacy() -> PropertyStore {
        PropertyStore::from_pairs(
            "legacy",
            [("org.ice4j.ipv6.DISABLED", "true"), ("legacy.size", "12")],
        )
    }

    fn modern() -> YamlStore {
        YamlStore::from_yaml_str(
            "modern",
            "ice4j:\n  harvest:\n    use-ipv6: true\n    size: 7\n    bad: not-a-number\n",
        )
        .unwrap()
    }

    #[test]
    fn test_first_present_wins() {
        let (legacy, modern) = (legacy(), modern());
        let resolved = Setting::<u32>::new("size")
            .from("legacy.size", &legacy)
            .from("ice4j.harvest.size", &modern)
            .resolve_or(0)
            .unwrap();
        assert_eq!(resolved.value, 12);
        assert_eq!(resolved.source, SettingSource::key("legacy", "legacy.size"));
    }

    #[test]
    fn test_absent_legacy_falls_through() {
        let (legacy, modern) = (legacy(), modern());
        let resolved = Setting::<u32>::new("size")
            .from("legacy.missing", &legacy)
            .from("ice4j.harvest.size", &modern)
            .resolve_or(0)
            .unwrap();
        assert_eq!(resolved.value, 7);
        assert_eq!(resolved.source.winning_key(), Some("ice4j.harvest.size"));
    }

    #[test]
    fn test_negation_transform() {
        let (legacy, modern) = (legacy(), modern());
        let resolved = Setting::<bool>::new("use_ipv6")
            .from("org.ice4j.ipv6.DISABLED", &legacy)
            .transformed_by(|disabled| !disabled)
            .from("ice4j.harvest.use-ipv6", &modern)
            .resolve_or(true)
            .unwrap();
        assert!(!resolved.value);

        // Transform only applies to its own candidate
        let resolved = Setting::<bool>::new("use_ipv6")
            .from("org.ice4j.ipv6.MISSING", &legacy)
            .transformed_by(|disabled| !disabled)
            .from("ice4j.harvest.use-ipv6", &modern)
            .resolve_or(false)
            .unwrap();
        assert!(resolved.value);
    }

    #[test]
    fn test_malformed_value_is_error_not_absent() {
        let modern = modern();
        let err = Setting::<u32>::new("bad")
            .from("ice4j.harvest.bad", &modern)
            .resolve_or(5)
            .unwrap_err();
        match err {
            ConfigError::Conversion { key, .. } => assert_eq!(key, "ice4j.harvest.bad"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_required_optional() {
        let empty = EmptyStore;

        let resolved = Setting::<u32>::new("x").from("a", &empty).resolve_or(3).unwrap();
        assert_eq!(resolved.value, 3);
        assert_eq!(resolved.source, SettingSource::Default);

        let err = Setting::<u32>::new("x")
            .from("a", &empty)
            .from("b", &empty)
            .resolve_required()
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting { ref keys, .. } if keys == &["a", "b"]));

        let resolved = Setting::<u32>::new("x").from("a", &empty).resolve_optional().unwrap();
        assert_eq!(resolved.value, None);
        assert_eq!(resolved.source, SettingSource::Absent);
    }

    #[test]
    fn test_convert_from_text() {
        let legacy = PropertyStore::from_pairs("legacy", [("list", "a,b,,c")]);
        let resolved = Setting::<Vec<String>>::new("list")
            .convert_from("list", &legacy, |text: String| {
                text.split(',')
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .resolve_or(Vec::new())
            .unwrap();
        assert_eq!(resolved.value, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_record_into_provenance() {
        let modern = modern();
        let mut provenance = ConfigProvenance::new();
        let value = Setting::<u32>::new("size")
            .from("ice4j.harvest.size", &modern)
            .resolve_or(0)
            .unwrap()
            .record(&mut provenance, "size");
        assert_eq!(value, 7);
        assert_eq!(
            provenance.get_source("size"),
            Some(&SettingSource::key("modern", "ice4j.harvest.size"))
        );
    }

    #[test]
    fn test_transform_without_candidates_is_noop() {
        let setting = Setting::<bool>::new("x").transformed_by(|v| !v);
        assert!(setting.keys().is_empty());
        assert_eq!(setting.name(), "x");
    }
}
