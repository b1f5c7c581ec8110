//! Ordered FileIO properties.
//!
//! `Properties` is the string-to-string configuration map handed to
//! [`FileIo::initialize`](crate::FileIo::initialize). Keys are case-sensitive
//! and unique, and iteration follows declaration order. That ordering is what
//! lets `protocol.mapping.*` rules be tried first-declared, first-matched.
//!
//! # Files
//!
//! Properties can be loaded from a TOML or JSON document whose top level is a
//! flat table of string values. Keys containing dots must be quoted in TOML,
//! otherwise they would be read as nested tables:
//!
//! ```toml
//! io-impl-delegate = "memory"
//! "protocol.mapping.^s3a?://" = "mem://"
//! "adls.sas-token.myaccount" = "sv=2024-01-01&sig=..."
//! ```
//!
//! ```
//! use locswitch::Properties;
//!
//! let props = Properties::from_toml_str(r#"
//! io-impl-delegate = "memory"
//! "protocol.mapping.^s3://" = "mem://"
//! "#).unwrap();
//!
//! assert_eq!(props.get("io-impl-delegate"), Some("memory"));
//! assert_eq!(props.len(), 2);
//! ```

use serde::de::{self, Deserialize, Deserializer, MapAccess, Visitor};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::fs;
use std::path::Path;

use crate::error::{FileIoError, Result};

/// Key fragments whose values are never printed by `Debug`.
const SENSITIVE_KEY_MARKERS: &[&str] = &["sas-token", "secret", "password", "access-key"];

/// Ordered, case-sensitive map of configuration properties.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Properties {
    // Configuration maps are small; linear lookup keeps declaration order cheap.
    entries: Vec<(String, String)>,
}

impl Properties {
    /// Create an empty property map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty property map with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Add a property (for method chaining).
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a property.
    ///
    /// Replacing an existing key keeps its original position and returns the
    /// previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Get a property value.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Check whether a key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Number of properties.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map has no properties.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, value)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Iterate over keys in declaration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// Iterate over properties whose key starts with `prefix`, yielding the
    /// remainder of the key and the value.
    pub fn strip_prefix<'a>(
        &'a self,
        prefix: &'a str,
    ) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.iter()
            .filter_map(move |(k, v)| k.strip_prefix(prefix).map(|rest| (rest, v)))
    }

    /// Parse properties from a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| FileIoError::Config(format!("Invalid TOML properties: {}", e)))
    }

    /// Parse properties from a JSON object.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| FileIoError::Config(format!("Invalid JSON properties: {}", e)))
    }

    /// Load properties from a file.
    ///
    /// Files ending in `.json` are read as JSON, everything else as TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            FileIoError::Config(format!(
                "Failed to read properties file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&content)
        } else {
            Self::from_toml_str(&content)
        }
    }

    /// Save properties as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string(self)
            .map_err(|e| FileIoError::Config(format!("Cannot serialize properties: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    fn is_sensitive(key: &str) -> bool {
        let lower = key.to_ascii_lowercase();
        SENSITIVE_KEY_MARKERS.iter().any(|m| lower.contains(m))
    }
}

impl fmt::Debug for Properties {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in self.iter() {
            if Self::is_sensitive(key) {
                map.entry(&key, &"<redacted>");
            } else {
                map.entry(&key, &value);
            }
        }
        map.finish()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        props.extend(iter);
        props
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for Properties {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = Properties;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a flat map of string keys to string values")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<Properties, A::Error> {
                let mut props = Properties::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    if props.contains_key(&key) {
                        return Err(de::Error::custom(format!("duplicate property '{}'", key)));
                    }
                    props.entries.push((key, value));
                }
                Ok(props)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_insert_keeps_declaration_order() {
        let mut props = Properties::new();
        props.insert("b", "1");
        props.insert("a", "2");
        props.insert("c", "3");

        let keys: Vec<&str> = props.keys().collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_insert_replaces_in_place() {
        let mut props = Properties::new().with("a", "1").with("b", "2");
        let previous = props.insert("a", "3");

        assert_eq!(previous, Some("1".to_string()));
        assert_eq!(props.get("a"), Some("3"));
        assert_eq!(props.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let props = Properties::new().with("Key", "upper").with("key", "lower");
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("Key"), Some("upper"));
        assert_eq!(props.get("key"), Some("lower"));
        assert_eq!(props.get("KEY"), None);
    }

    #[test]
    fn test_strip_prefix() {
        let props = Properties::new()
            .with("protocol.mapping.^s3://", "mem://")
            .with("io-impl-delegate", "memory")
            .with("protocol.mapping.^gs://", "mem://gcs/");

        let rules: Vec<(&str, &str)> = props.strip_prefix("protocol.mapping.").collect();
        assert_eq!(rules, vec![("^s3://", "mem://"), ("^gs://", "mem://gcs/")]);
    }

    #[test]
    fn test_from_toml_preserves_document_order() {
        let props = Properties::from_toml_str(
            r#"
"protocol.mapping.z" = "1"
io-impl-delegate = "memory"
"protocol.mapping.a" = "2"
"#,
        )
        .unwrap();

        let keys: Vec<&str> = props.keys().collect();
        assert_eq!(
            keys,
            vec!["protocol.mapping.z", "io-impl-delegate", "protocol.mapping.a"]
        );
    }

    #[test]
    fn test_from_toml_rejects_nested_tables() {
        // Unquoted dotted keys become nested tables.
        let result = Properties::from_toml_str("protocol.mapping.x = \"y\"\n");
        assert!(matches!(result, Err(FileIoError::Config(_))));
    }

    #[test]
    fn test_from_json_rejects_duplicates() {
        let result = Properties::from_json_str(r#"{"a": "1", "a": "2"}"#);
        match result {
            Err(FileIoError::Config(msg)) => assert!(msg.contains("duplicate property 'a'")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }

    #[test]
    fn test_from_json_rejects_non_string_values() {
        let result = Properties::from_json_str(r#"{"a": 1}"#);
        assert!(matches!(result, Err(FileIoError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf/fileio.toml");

        let props = Properties::new()
            .with("io-impl-delegate", "memory")
            .with("protocol.mapping.^s3a?://", "mem://")
            .with("adls.sas-token.acct", "sv=1&sig=abc");
        props.save(&path).unwrap();

        let loaded = Properties::load(&path).unwrap();
        assert_eq!(loaded, props);
    }

    #[test]
    fn test_load_json_by_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fileio.json");
        fs::write(&path, r#"{"io-impl-delegate": "memory", "x": "y"}"#).unwrap();

        let loaded = Properties::load(&path).unwrap();
        assert_eq!(loaded.get("io-impl-delegate"), Some("memory"));
        assert_eq!(loaded.keys().collect::<Vec<_>>(), vec!["io-impl-delegate", "x"]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = Properties::load(&dir.path().join("missing.toml"));
        assert!(matches!(result, Err(FileIoError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_credentials() {
        let props = Properties::new()
            .with("adls.sas-token.acct", "sv=1&sig=topsecret")
            .with("io-impl-delegate", "memory");

        let debug = format!("{:?}", props);
        assert!(!debug.contains("topsecret"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("memory"));
    }
}
