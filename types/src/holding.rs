//! Asset holdings: a snapshot item from the external asset provider.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One item of a subject's asset inventory.
///
/// Immutable; never owned by this engine. Attribute values arrive as
/// arbitrary JSON from the marketplace and are compared loosely against the
/// string values stored in rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetHolding {
    pub collection_slug: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

impl AssetHolding {
    pub fn new(collection_slug: impl Into<String>) -> Self {
        Self {
            collection_slug: collection_slug.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether `attributes[key]` loosely equals `expected`.
    pub fn attribute_equals(&self, key: &str, expected: &str) -> bool {
        self.attributes
            .get(key)
            .is_some_and(|value| loose_value_eq(value, expected))
    }
}

/// Loose equality between a JSON attribute value and a rule's string value.
///
/// Marketplaces serialize numeric traits inconsistently (`7` vs `"7"`), and
/// rules always store strings, so numbers and booleans compare through their
/// canonical string form.
pub fn loose_value_eq(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected,
        Value::Bool(b) => b.to_string() == expected,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_attribute_matches() {
        let holding = AssetHolding::new("apes").with_attribute("trait", "gold");
        assert!(holding.attribute_equals("trait", "gold"));
        assert!(!holding.attribute_equals("trait", "silver"));
    }

    #[test]
    fn numeric_attribute_compares_loosely() {
        let holding = AssetHolding::new("apes").with_attribute("level", 7);
        assert!(holding.attribute_equals("level", "7"));
        assert!(!holding.attribute_equals("level", "8"));
    }

    #[test]
    fn boolean_attribute_compares_loosely() {
        let holding = AssetHolding::new("apes").with_attribute("shiny", true);
        assert!(holding.attribute_equals("shiny", "true"));
    }

    #[test]
    fn missing_attribute_never_matches() {
        let holding = AssetHolding::new("apes");
        assert!(!holding.attribute_equals("trait", "gold"));
    }

    #[test]
    fn structured_values_never_match() {
        let holding = AssetHolding::new("apes").with_attribute("nested", json!({"a": 1}));
        assert!(!holding.attribute_equals("nested", "a"));
    }

    #[test]
    fn snapshot_item_deserializes_from_camel_case() {
        let json = r#"{"collectionSlug": "apes", "attributes": {"trait": "gold"}}"#;
        let holding: AssetHolding = serde_json::from_str(json).unwrap();
        assert_eq!(holding.collection_slug, "apes");
        assert!(holding.attribute_equals("trait", "gold"));
    }
}
