//! Typed conversion of raw store values
//!
//! Legacy stores only hold text, modern stores hold typed YAML scalars, so
//! every conversion accepts both the native YAML form and its text form.

use serde_yaml::Value;
use std::time::Duration;

/// Conversion from a raw store value
pub trait FromConfigValue: Sized {
    /// Human-readable target type, used in conversion errors
    const EXPECTED: &'static str;

    /// Convert, returning the failure reason on mismatch
    fn from_config_value(value: &Value) -> Result<Self, String>;
}

/// Short description of a raw value for error messages
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "found null".to_string(),
        Value::Bool(b) => format!("found boolean {}", b),
        Value::Number(n) => format!("found number {}", n),
        Value::String(s) => format!("found string '{}'", s),
        Value::Sequence(seq) => format!("found a list of {} element(s)", seq.len()),
        Value::Mapping(_) => "found a mapping".to_string(),
        Value::Tagged(tagged) => format!("found tagged value {}", tagged.tag),
    }
}

impl FromConfigValue for Value {
    const EXPECTED: &'static str = "any value";

    fn from_config_value(value: &Value) -> Result<Self, String> {
        Ok(value.clone())
    }
}

impl FromConfigValue for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_config_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Bool(b) => Ok(*b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" => Ok(false),
                _ => Err(describe(value)),
            },
            _ => Err(describe(value)),
        }
    }
}

impl FromConfigValue for String {
    const EXPECTED: &'static str = "a string";

    fn from_config_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) => Ok(n.to_string()),
            Value::Bool(b) => Ok(b.to_string()),
            _ => Err(describe(value)),
        }
    }
}

macro_rules! impl_integer {
    ($($ty:ty => $expected:literal),* $(,)?) => {
        $(
            impl FromConfigValue for $ty {
                const EXPECTED: &'static str = $expected;

                fn from_config_value(value: &Value) -> Result<Self, String> {
                    let out_of_range = || format!("{} is out of range", describe(value));
                    match value {
                        Value::Number(n) => {
                            if let Some(v) = n.as_u64() {
                                <$ty>::try_from(v).map_err(|_| out_of_range())
                            } else if let Some(v) = n.as_i64() {
                                <$ty>::try_from(v).map_err(|_| out_of_range())
                            } else {
                                Err(describe(value))
                            }
                        }
                        Value::String(s) => s.trim().parse::<$ty>().map_err(|e| {
                            format!("{} ({})", describe(value), e)
                        }),
                        _ => Err(describe(value)),
                    }
                }
            }
        )*
    };
}

impl_integer! {
    u16 => "a port number (0..=65535)",
    u32 => "a non-negative integer",
    u64 => "a non-negative integer",
    usize => "a non-negative integer",
    i32 => "an integer",
    i64 => "an integer",
}

impl FromConfigValue for Vec<String> {
    const EXPECTED: &'static str = "a list of strings";

    fn from_config_value(value: &Value) -> Result<Self, String> {
        let Value::Sequence(items) = value else {
            return Err(describe(value));
        };

        items
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                String::from_config_value(item)
                    .map_err(|reason| format!("element {}: {}", idx, reason))
            })
            .collect()
    }
}

impl FromConfigValue for Duration {
    const EXPECTED: &'static str = "a duration (milliseconds or '<n> ms|s|m|h')";

    fn from_config_value(value: &Value) -> Result<Self, String> {
        match value {
            Value::Number(n) => n
                .as_u64()
                .map(Duration::from_millis)
                .ok_or_else(|| describe(value)),
            Value::String(s) => parse_duration(s).ok_or_else(|| describe(value)),
            _ => Err(describe(value)),
        }
    }
}

/// Parse `"90s"`, `"90 seconds"`, `"1500ms"`, `"2 minutes"` or bare milliseconds
pub fn parse_duration(text: &str) -> Option<Duration> {
    let text = text.trim();
    let split_at = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (amount, unit) = text.split_at(split_at);
    let amount: u64 = amount.parse().ok()?;

    let millis_per_unit: u64 = match unit.trim() {
        "" | "ms" | "milli" | "millis" | "millisecond" | "milliseconds" => 1,
        "s" | "second" | "seconds" => 1_000,
        "m" | "minute" | "minutes" => 60_000,
        "h" | "hour" | "hours" => 3_600_000,
        _ => return None,
    };

    amount.checked_mul(millis_per_unit).map(Duration::from_millis)
}
