use std::path::Path;

use serde_json::Value;

use crate::error::{Result, SyncError};

/// A locally authored UMM profile document.
///
/// The document is held verbatim and sent to the catalog unchanged; schema
/// validation is the catalog's job. The only local requirement is a string
/// `Name` field, which anchors the record's natural key.
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    value: Value,
}

impl Profile {
    pub fn from_value(value: Value) -> Result<Self> {
        if value.get("Name").and_then(Value::as_str).is_none() {
            return Err(SyncError::MissingName);
        }
        Ok(Self { value })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_value(serde_json::from_str(&content)?)
    }

    pub fn name(&self) -> &str {
        // Presence of a string Name is checked at construction.
        self.value
            .get("Name")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Natural key for this profile within a provider:
    /// `{provider}_{name}`, lowercased, with every whitespace run in the
    /// name collapsed to a single underscore. Deterministic, so the same
    /// local document always locates the same remote record.
    pub fn native_id(&self, provider: &str) -> String {
        format!("{}_{}", provider.to_lowercase(), snake_case(self.name()))
    }

    pub fn as_value(&self) -> &Value {
        &self.value
    }

    /// Structural comparison against a remote copy. Object key order is
    /// irrelevant: serde_json compares maps by key lookup.
    pub fn matches(&self, remote: &Value) -> bool {
        &self.value == remote
    }
}

fn snake_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch.is_whitespace() {
            out.push('_');
            while chars.peek().is_some_and(|c| c.is_whitespace()) {
                chars.next();
            }
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_native_id_collapses_whitespace_and_lowercases() {
        let profile = Profile::from_value(json!({"Name": "Air Temp  Tool"})).unwrap();
        assert_eq!(profile.native_id("POCLOUD"), "pocloud_air_temp_tool");
    }

    #[test]
    fn test_native_id_handles_tabs_and_newlines() {
        let profile = Profile::from_value(json!({"Name": "My\t\nService"})).unwrap();
        assert_eq!(profile.native_id("POCLOUD"), "pocloud_my_service");
    }

    #[test]
    fn test_missing_name_is_rejected() {
        let err = Profile::from_value(json!({"LongName": "x"})).unwrap_err();
        assert!(matches!(err, SyncError::MissingName));

        let err = Profile::from_value(json!({"Name": 7})).unwrap_err();
        assert!(matches!(err, SyncError::MissingName));
    }

    #[test]
    fn test_structural_equality_ignores_key_order() {
        let profile = Profile::from_value(json!({"Name": "x", "a": 1, "b": 2})).unwrap();
        let reordered: Value =
            serde_json::from_str(r#"{"b": 2, "a": 1, "Name": "x"}"#).unwrap();
        assert!(profile.matches(&reordered));
    }

    #[test]
    fn test_structural_equality_detects_changed_value() {
        let profile = Profile::from_value(json!({"Name": "x", "Version": "1.0"})).unwrap();
        let remote = json!({"Name": "x", "Version": "1.1"});
        assert!(!profile.matches(&remote));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("umm_s.json");
        std::fs::write(&path, r#"{"Name": "My Tool", "Type": "Downloadable"}"#).unwrap();

        let profile = Profile::load(&path).unwrap();
        assert_eq!(profile.name(), "My Tool");
        assert_eq!(profile.native_id("POCLOUD"), "pocloud_my_tool");
    }
}
