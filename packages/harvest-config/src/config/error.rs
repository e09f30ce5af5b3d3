//! Configuration error types

use thiserror::Error;

/// Configuration error type
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A mandatory setting had no candidate key present and no default
    #[error("Missing required setting '{setting}'. Looked up keys: {}", keys.join(", "))]
    MissingSetting { setting: String, keys: Vec<String> },

    /// A key was present but its value could not be converted to the target type
    #[error("Invalid value for '{key}': expected {expected}, {reason}")]
    Conversion {
        key: String,
        expected: &'static str,
        reason: String,
    },

    /// Static mapping with exactly one of local-port/public-port
    #[error("Inconsistent value for local-port and public-port in static mapping #{index} ({entry}): both must be present or both missing")]
    InconsistentPortPairing { index: usize, entry: String },

    /// Static mapping missing a required field or otherwise malformed
    #[error("Invalid static mapping #{index}: {reason}")]
    InvalidMapping { index: usize, reason: String },

    /// Range validation error
    #[error("Invalid range for field '{field}': {value} not in {min}..={max}. {hint}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
        hint: String,
    },

    /// Unrecognized key in the modern source (reported, never fatal)
    #[error("Unknown key '{key}'. {suggestion}")]
    UnknownKey { key: String, suggestion: String },

    /// Malformed line in a legacy property file
    #[error("Malformed property at line {line}: {reason}")]
    Property { line: usize, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Configuration result type
pub type ConfigResult<T> = Result<T, ConfigError>;

impl ConfigError {
    /// Create a conversion error
    pub fn conversion(key: impl Into<String>, expected: &'static str, reason: impl Into<String>) -> Self {
        Self::Conversion {
            key: key.into(),
            expected,
            reason: reason.into(),
        }
    }

    /// Create a range error with a hint
    pub fn range_with_hint(
        field: impl Into<String>,
        value: impl ToString,
        min: impl ToString,
        max: impl ToString,
        hint: impl Into<String>,
    ) -> Self {
        Self::Range {
            field: field.into(),
            value: value.to_string(),
            min: min.to_string(),
            max: max.to_string(),
            hint: hint.into(),
        }
    }

    /// Create an unknown key error with the closest recognized key as suggestion
    pub fn unknown_key_with_suggestion(key: impl Into<String>, known_keys: &[&str]) -> Self {
        let key = key.into();
        let suggestion = find_closest_match(&key, known_keys);
        Self::UnknownKey { key, suggestion }
    }
}

/// Find closest match using simple edit distance
fn find_closest_match(target: &str, candidates: &[&str]) -> String {
    match candidates
        .iter()
        .min_by_key(|candidate| levenshtein_distance(target, candidate))
    {
        Some(closest) => format!("Did you mean '{}'?", closest),
        None => "No recognized keys available".to_string(),
    }
}

/// Simple Levenshtein distance implementation
fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    // Single rolling row
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, c1) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, c2) in b.iter().enumerate() {
            let cost = usize::from(c1 != c2);
            let next = (row[j + 1] + 1).min(row[j] + 1).min(diagonal + cost);
            diagonal = row[j + 1];
            row[j + 1] = next;
        }
    }

    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("use-ipv6", "use-ipv6"), 0);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abc", ""), 3);
    }

    #[test]
    fn test_closest_match() {
        let known = ["ice4j.harvest.use-ipv6", "ice4j.harvest.timeout"];
        let suggestion = find_closest_match("ice4j.harvest.use-ipv7", &known);
        assert!(suggestion.contains("ice4j.harvest.use-ipv6"));

        assert_eq!(find_closest_match("x", &[]), "No recognized keys available");
    }

    #[test]
    fn test_missing_setting_names_keys() {
        let err = ConfigError::MissingSetting {
            setting: "udp_socket_pool_size".to_string(),
            keys: vec!["a.b".to_string(), "c.d".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("udp_socket_pool_size"));
        assert!(msg.contains("a.b, c.d"));
    }

    #[test]
    fn test_pairing_error_names_entry() {
        let err = ConfigError::InconsistentPortPairing {
            index: 2,
            entry: "10.0.0.1:5000 -> 1.2.3.4".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("#2"));
        assert!(msg.contains("10.0.0.1:5000 -> 1.2.3.4"));
    }

    #[test]
    fn test_unknown_key_suggestion() {
        let err = ConfigError::unknown_key_with_suggestion("ice4j.harvest.use-ipv7", &["ice4j.harvest.use-ipv6"]);
        assert!(err.to_string().contains("Did you mean 'ice4j.harvest.use-ipv6'?"));
    }

    #[test]
    fn test_range_error_formatting() {
        let err = ConfigError::range_with_hint(
            "max_check_list_size",
            0,
            1,
            usize::MAX,
            "A check list must hold at least one pair",
        );
        let msg = err.to_string();
        assert!(msg.contains("max_check_list_size"));
        assert!(msg.contains("at least one pair"));
    }
}
