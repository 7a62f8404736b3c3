//! Core types for the classifier

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Loosely-typed key/value structure returned by the model boundary
pub type RawResponse = serde_json::Map<String, serde_json::Value>;

/// Separator placed between clauses appended to a result's reason
const REASON_SEPARATOR: &str = "; ";

/// A catalog item (SKU) to be classified
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Primary display name, never blank
    pub name: String,

    /// Identifier in the source catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Manufacturer name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<String>,

    /// Alternate name from a second catalog
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_name: Option<String>,
}

impl ProductRecord {
    /// Create a record, trimming the name and rejecting blank names
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(Error::invalid_record("SKU name is empty"));
        }

        Ok(Self {
            name: trimmed.to_string(),
            external_id: None,
            manufacturer: None,
            alternate_name: None,
        })
    }

    /// Set the source catalog identifier
    pub fn with_external_id(mut self, id: impl Into<String>) -> Self {
        self.external_id = non_blank(id.into());
        self
    }

    /// Set the manufacturer
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = non_blank(manufacturer.into());
        self
    }

    /// Set the alternate name
    pub fn with_alternate_name(mut self, name: impl Into<String>) -> Self {
        self.alternate_name = non_blank(name.into());
        self
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// One row of the category taxonomy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryNode {
    /// Unique category code
    pub code: String,

    #[serde(default)]
    pub level: Option<String>,

    #[serde(default)]
    pub direction: Option<String>,

    #[serde(default)]
    pub need: Option<String>,

    #[serde(default)]
    pub group: Option<String>,

    /// Active-ingredient cluster; synonyms are separated by `/` or `\`
    #[serde(default, alias = "inn_cluster")]
    pub ingredient_cluster: Option<String>,

    #[serde(default)]
    pub dosage_form: Option<String>,

    #[serde(default)]
    pub age_segment: Option<String>,
}

impl CategoryNode {
    /// Create a node with only a code set
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            level: None,
            direction: None,
            need: None,
            group: None,
            ingredient_cluster: None,
            dosage_form: None,
            age_segment: None,
        }
    }

    /// Set the ingredient cluster
    pub fn with_ingredient_cluster(mut self, cluster: impl Into<String>) -> Self {
        self.ingredient_cluster = Some(cluster.into());
        self
    }

    /// Set the direction / need / group hierarchy
    pub fn with_hierarchy(
        mut self,
        direction: impl Into<String>,
        need: impl Into<String>,
        group: impl Into<String>,
    ) -> Self {
        self.direction = Some(direction.into());
        self.need = Some(need.into());
        self.group = Some(group.into());
        self
    }

    /// Human-readable path through the hierarchy, falling back to the code
    pub fn path(&self) -> String {
        let parts: Vec<&str> = [&self.direction, &self.need, &self.group]
            .into_iter()
            .filter_map(|part| part.as_deref())
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .collect();

        if parts.is_empty() {
            self.code.clone()
        } else {
            parts.join(" > ")
        }
    }
}

/// Final classification of one SKU
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Name of the classified SKU
    pub sku_name: String,

    pub category_code: Option<String>,

    pub category_path: Option<String>,

    /// Active ingredient (INN)
    #[serde(rename = "inn")]
    pub active_ingredient: Option<String>,

    pub dosage_form: Option<String>,

    pub age_restriction: Option<String>,

    /// `Some(true)` = OTC, `Some(false)` = prescription, `None` = unknown
    #[serde(rename = "otc")]
    pub is_over_the_counter: Option<bool>,

    /// Confidence in the assigned category, always within [0.0, 1.0]
    pub confidence: f32,

    /// Whether a human must review this result
    pub needs_review: bool,

    /// Human-readable explanation; clauses are only ever appended
    pub reason: String,

    /// The normalized model output this result was derived from
    #[serde(default)]
    pub raw_response: RawResponse,
}

impl ClassificationResult {
    /// Create an empty result for the given SKU name
    pub fn new(sku_name: impl Into<String>) -> Self {
        Self {
            sku_name: sku_name.into(),
            category_code: None,
            category_path: None,
            active_ingredient: None,
            dosage_form: None,
            age_restriction: None,
            is_over_the_counter: None,
            confidence: 0.0,
            needs_review: false,
            reason: String::new(),
            raw_response: RawResponse::new(),
        }
    }

    /// Append a clause to the reason unless it is already present.
    ///
    /// Returns `true` if the reason changed.
    pub fn append_reason(&mut self, clause: &str) -> bool {
        let clause = clause.trim();
        if clause.is_empty() || self.reason.contains(clause) {
            return false;
        }

        if !self.reason.trim().is_empty() {
            self.reason.push_str(REASON_SEPARATOR);
        } else {
            self.reason.clear();
        }
        self.reason.push_str(clause);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_record_trims_name() {
        let record = ProductRecord::new("  Nurofen Forte 400mg  ").unwrap();
        assert_eq!(record.name, "Nurofen Forte 400mg");
    }

    #[test]
    fn test_product_record_rejects_blank_name() {
        assert!(matches!(
            ProductRecord::new("   "),
            Err(Error::InvalidRecord(_))
        ));
    }

    #[test]
    fn test_product_record_blank_enrichment_is_absent() {
        let record = ProductRecord::new("Aspirin")
            .unwrap()
            .with_manufacturer(" ")
            .with_external_id("42");
        assert_eq!(record.manufacturer, None);
        assert_eq!(record.external_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_category_path() {
        let node = CategoryNode::new("A01").with_hierarchy("Pain relief", "Pain", "Analgesics");
        assert_eq!(node.path(), "Pain relief > Pain > Analgesics");

        let bare = CategoryNode::new("B07");
        assert_eq!(bare.path(), "B07");
    }

    #[test]
    fn test_category_node_accepts_inn_cluster_alias() {
        let json = r#"{"code": "A01", "inn_cluster": "Ibuprofen"}"#;
        let node: CategoryNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.ingredient_cluster.as_deref(), Some("Ibuprofen"));
    }

    #[test]
    fn test_append_reason_is_idempotent() {
        let mut result = ClassificationResult::new("SKU");
        assert!(result.append_reason("first note"));
        assert!(!result.append_reason("first note"));
        assert!(result.append_reason("second note"));
        assert_eq!(result.reason, "first note; second note");
    }

    #[test]
    fn test_result_serializes_boundary_field_names() {
        let mut result = ClassificationResult::new("SKU");
        result.active_ingredient = Some("Ibuprofen".to_string());
        result.is_over_the_counter = Some(true);

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["inn"], "Ibuprofen");
        assert_eq!(value["otc"], true);
    }
}
