//! Checksum normalization
//!
//! Storage backends report content identifiers in different shapes: md5
//! hex digests, `<md5>-<parts>` etags, long hex block-store checksums, or
//! plain integers when a YAML parser decided the value was a number. This
//! module turns any of them into a single canonical [`Checksum`] or rejects
//! the value outright.
//!
//! | Input | Result |
//! |-------|--------|
//! | null, `""` | `None` |
//! | integer | decimal string |
//! | string | lowercased |
//! | shorter than 3 characters | rejected |
//! | float, bool, list, mapping | rejected |

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_yaml::Value;
use std::fmt;
use thiserror::Error;

/// Suffix distinguishing directory manifest checksums from file checksums
pub const DIR_SUFFIX: &str = ".dir";

/// Shortest string accepted as a checksum
const MIN_LEN: usize = 3;

/// A raw value that cannot be used as a checksum
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid checksum {value}: {reason}")]
pub struct InvalidChecksum {
    /// Rendering of the rejected value
    pub value: String,
    /// Why it was rejected
    pub reason: &'static str,
}

/// Canonical, lowercase, non-empty content identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Checksum(String);

impl Checksum {
    /// Parse a checksum from a string, rejecting empty input
    pub fn parse(value: &str) -> Result<Self, InvalidChecksum> {
        normalize(&Value::String(value.to_string()))?.ok_or_else(|| InvalidChecksum {
            value: "\"\"".to_string(),
            reason: "checksum must not be empty",
        })
    }

    /// Checksum of an md5 digest
    pub fn from_digest(digest: md5::Digest) -> Self {
        Self(format!("{:x}", digest))
    }

    /// Whether this checksum names a directory manifest
    pub fn is_dir(&self) -> bool {
        self.0.ends_with(DIR_SUFFIX)
    }

    /// The directory-manifest form of this checksum
    pub fn to_dir(&self) -> Self {
        if self.is_dir() {
            return self.clone();
        }
        Self(format!("{}{}", self.0, DIR_SUFFIX))
    }

    /// Split into the cache shard prefix (two characters) and object name
    pub fn shard(&self) -> (&str, &str) {
        let idx = self
            .0
            .char_indices()
            .nth(2)
            .map(|(i, _)| i)
            .unwrap_or(self.0.len());
        self.0.split_at(idx)
    }

    /// Borrow the canonical string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Checksum {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde::de::Error;

        let value = Value::deserialize(deserializer)?;
        normalize(&value)
            .map_err(D::Error::custom)?
            .ok_or_else(|| D::Error::custom("checksum must not be empty"))
    }
}

/// Deserialize an optional checksum field through [`normalize`]
///
/// Use with `#[serde(default, deserialize_with = "...")]`.
pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<Checksum>, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    let value = Value::deserialize(deserializer)?;
    normalize(&value).map_err(D::Error::custom)
}

/// Normalize a raw checksum value
///
/// Returns `Ok(None)` for an absent value, the canonical checksum for an
/// accepted one, and an error for anything else. Values are never coerced
/// into shape: a list is not a checksum, and neither is `"11"`.
///
/// Integers lose their literal spelling once parsed, so `0x3451` in a
/// pointer file becomes `"13393"`.
pub fn normalize(value: &Value) -> Result<Option<Checksum>, InvalidChecksum> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) if s.is_empty() => Ok(None),
        Value::String(s) => accept(s.to_lowercase()),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                accept(i.to_string())
            } else if let Some(u) = n.as_u64() {
                accept(u.to_string())
            } else {
                Err(reject(value, "floating point numbers are not checksums"))
            }
        }
        Value::Bool(_) => Err(reject(value, "booleans are not checksums")),
        Value::Sequence(_) => Err(reject(value, "a list is not a checksum")),
        Value::Mapping(_) => Err(reject(value, "a mapping is not a checksum")),
        Value::Tagged(_) => Err(reject(value, "tagged values are not checksums")),
    }
}

fn accept(candidate: String) -> Result<Option<Checksum>, InvalidChecksum> {
    if candidate.chars().count() < MIN_LEN {
        return Err(InvalidChecksum {
            value: format!("'{}'", candidate),
            reason: "too short to be a checksum",
        });
    }
    Ok(Some(Checksum(candidate)))
}

fn reject(value: &Value, reason: &'static str) -> InvalidChecksum {
    let value = match value {
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Sequence(items) => format!("<list of {}>", items.len()),
        Value::Mapping(map) => format!("<mapping of {}>", map.len()),
        Value::Tagged(tagged) => format!("<tagged {}>", tagged.tag),
        Value::String(s) => format!("'{}'", s),
        Value::Null => "null".to_string(),
    };
    InvalidChecksum { value, reason }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(text: &str) -> Value {
        serde_yaml::from_str(text).unwrap()
    }

    fn normalized(value: Value) -> Option<String> {
        normalize(&value).unwrap().map(|c| c.to_string())
    }

    #[test]
    fn absent_values_are_none() {
        assert_eq!(normalized(Value::Null), None);
        assert_eq!(normalized(Value::String(String::new())), None);
        assert_eq!(normalized(yaml("~")), None);
        assert_eq!(normalized(yaml("''")), None);
    }

    #[test]
    fn integers_become_decimal_strings() {
        assert_eq!(normalized(Value::from(11111)).as_deref(), Some("11111"));
        assert_eq!(normalized(yaml("11111")).as_deref(), Some("11111"));
    }

    #[test]
    fn hex_and_octal_literals_lose_their_spelling() {
        assert_eq!(normalized(yaml("0x3451")).as_deref(), Some("13393"));
        assert_eq!(normalized(yaml("0o1244")).as_deref(), Some("676"));
    }

    #[test]
    fn strings_are_lowercased() {
        assert_eq!(normalized(yaml("'11111'")).as_deref(), Some("11111"));
        assert_eq!(normalized(yaml("aAaBa")).as_deref(), Some("aaaba"));
    }

    #[test]
    fn backend_shapes_are_preserved() {
        for raw in [
            "3cc286c534a71504476da009ed174423",
            "d41d8cd98f00b204e9800998ecf8427e-38",
            "000002000000000000000000c16859d1d071c6b1ffc9c8557d4909f1",
        ] {
            assert_eq!(normalized(Value::from(raw)).as_deref(), Some(raw));
        }
    }

    #[test]
    fn short_and_structured_values_are_rejected() {
        for raw in ["'1'", "'11'", "{}", "{a: b}", "[]", "[1, 2]", "1", "1.5", "true"] {
            assert!(normalize(&yaml(raw)).is_err(), "accepted {}", raw);
        }
    }

    #[test]
    fn rejection_names_the_value() {
        let err = normalize(&yaml("[1, 2]")).unwrap_err();
        assert_eq!(err.reason, "a list is not a checksum");
        assert!(err.to_string().contains("<list of 2>"));
    }

    #[test]
    fn dir_suffix_and_shard() {
        let file = Checksum::parse("acbd18db4cc2f85cedef654fccc4a4d8").unwrap();
        assert!(!file.is_dir());
        let dir = file.to_dir();
        assert!(dir.is_dir());
        assert_eq!(dir.to_dir(), dir);
        assert_eq!(dir.shard(), ("ac", "bd18db4cc2f85cedef654fccc4a4d8.dir"));
    }

    #[test]
    fn digest_is_lower_hex() {
        let checksum = Checksum::from_digest(md5::compute(b"foo"));
        assert_eq!(checksum.as_str(), "acbd18db4cc2f85cedef654fccc4a4d8");
    }

    #[test]
    fn deserializes_through_normalize() {
        #[derive(Deserialize)]
        struct Field {
            #[serde(default, deserialize_with = "deserialize_opt")]
            md5: Option<Checksum>,
        }

        let field: Field = serde_yaml::from_str("md5: ABCDEF").unwrap();
        assert_eq!(field.md5.unwrap().as_str(), "abcdef");

        let field: Field = serde_yaml::from_str("{}").unwrap();
        assert!(field.md5.is_none());

        assert!(serde_yaml::from_str::<Field>("md5: [a, b]").is_err());
    }
}
