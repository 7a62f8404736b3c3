//! Loading taxonomy, SKU and test-set files

use std::path::Path;

use anyhow::{bail, Context};
use pharmclass_classifiers::LabeledSku;
use pharmclass_core::{CategoryNode, ProductRecord};
use serde::Deserialize;
use tracing::{info, warn};

/// Load taxonomy rows from a YAML or JSON array
pub fn load_taxonomy(path: &Path) -> anyhow::Result<Vec<CategoryNode>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read taxonomy {}", path.display()))?;

    let nodes: Vec<CategoryNode> = match extension(path).as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("failed to parse taxonomy {}", path.display()))?,
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("failed to parse taxonomy {}", path.display()))?,
        _ => bail!(
            "unsupported taxonomy format for {} (expected .yaml, .yml or .json)",
            path.display()
        ),
    };

    info!(path = %path.display(), categories = nodes.len(), "Loaded taxonomy");
    Ok(nodes)
}

/// Load SKUs from a JSON-lines file; rows with a blank name are skipped.
///
/// `limit` caps the number of records returned, not the number of rows read.
pub fn load_records(path: &Path, limit: Option<usize>) -> anyhow::Result<Vec<ProductRecord>> {
    let records = collect_json_lines(path, limit, |line, row: SkuRow| {
        match row.into_record() {
            Ok(record) => Some(record),
            Err(e) => {
                warn!(path = %path.display(), line, error = %e, "Skipping SKU row");
                None
            }
        }
    })?;

    info!(path = %path.display(), records = records.len(), "Loaded SKUs");
    Ok(records)
}

/// Load labeled SKUs from a JSON-lines file
pub fn load_testset(path: &Path, limit: Option<usize>) -> anyhow::Result<Vec<LabeledSku>> {
    let samples = collect_json_lines(path, limit, |line, row: TestsetRow| {
        let expected_code = row.expected_code.unwrap_or_default();
        match row.sku.into_record() {
            Ok(record) => Some(LabeledSku {
                record,
                expected_code,
            }),
            Err(e) => {
                warn!(path = %path.display(), line, error = %e, "Skipping test-set row");
                None
            }
        }
    })?;

    info!(path = %path.display(), samples = samples.len(), "Loaded test set");
    Ok(samples)
}

/// Parse non-blank lines and convert them with `convert`, which receives the
/// 1-based line number. Reading stops once `limit` items were kept.
fn collect_json_lines<T, R>(
    path: &Path,
    limit: Option<usize>,
    mut convert: impl FnMut(usize, T) -> Option<R>,
) -> anyhow::Result<Vec<R>>
where
    T: for<'de> Deserialize<'de>,
{
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;

    let mut items = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if limit.is_some_and(|limit| items.len() >= limit) {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let row = serde_json::from_str(line)
            .with_context(|| format!("{}:{}: invalid JSON row", path.display(), idx + 1))?;
        items.extend(convert(idx + 1, row));
    }

    Ok(items)
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Source catalog identifiers come as numbers or strings
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExternalId {
    Number(i64),
    Text(String),
}

impl ExternalId {
    fn into_string(self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SkuRow {
    name: String,

    #[serde(default, alias = "id")]
    external_id: Option<ExternalId>,

    #[serde(default)]
    manufacturer: Option<String>,

    #[serde(default, alias = "alt_name")]
    alternate_name: Option<String>,
}

impl SkuRow {
    fn into_record(self) -> pharmclass_core::Result<ProductRecord> {
        let mut record = ProductRecord::new(self.name)?;
        if let Some(id) = self.external_id {
            record = record.with_external_id(id.into_string());
        }
        if let Some(manufacturer) = self.manufacturer {
            record = record.with_manufacturer(manufacturer);
        }
        if let Some(alternate) = self.alternate_name {
            record = record.with_alternate_name(alternate);
        }
        Ok(record)
    }
}

#[derive(Debug, Deserialize)]
struct TestsetRow {
    #[serde(flatten)]
    sku: SkuRow,

    #[serde(default, alias = "category_code")]
    expected_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_yaml_taxonomy() {
        let file = write_file(
            ".yaml",
            r#"
- code: A01
  direction: Pain relief
  inn_cluster: Ibuprofen
- code: C10
  ingredient_cluster: "Rimantadine/Римантадин"
"#,
        );

        let nodes = load_taxonomy(file.path()).unwrap();

        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].ingredient_cluster.as_deref(), Some("Ibuprofen"));
        assert_eq!(nodes[1].code, "C10");
    }

    #[test]
    fn test_load_json_taxonomy() {
        let file = write_file(".json", r#"[{"code": "A01"}, {"code": "A02", "group": "NSAID"}]"#);
        let nodes = load_taxonomy(file.path()).unwrap();
        assert_eq!(nodes[1].group.as_deref(), Some("NSAID"));
    }

    #[test]
    fn test_unknown_taxonomy_extension() {
        let file = write_file(".xlsx", "");
        assert!(load_taxonomy(file.path()).is_err());
    }

    #[test]
    fn test_load_records_skips_blank_names_and_lines() {
        let file = write_file(
            ".jsonl",
            "{\"name\": \"Nurofen\", \"id\": 17, \"alt_name\": \"NUROFEN TAB\"}\n\n{\"name\": \"  \"}\n{\"name\": \"Aspirin\", \"external_id\": \"X-9\"}\n",
        );

        let records = load_records(file.path(), None).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].external_id.as_deref(), Some("17"));
        assert_eq!(records[0].alternate_name.as_deref(), Some("NUROFEN TAB"));
        assert_eq!(records[1].external_id.as_deref(), Some("X-9"));
    }

    #[test]
    fn test_load_records_limit() {
        let file = write_file(".jsonl", "{\"name\": \"A\"}\n{\"name\": \"B\"}\n{\"name\": \"C\"}\n");
        let records = load_records(file.path(), Some(2)).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_load_records_limit_counts_kept_records() {
        let file = write_file(
            ".jsonl",
            "{\"name\": \"\"}\n{\"name\": \"A\"}\n{\"name\": \" \"}\n{\"name\": \"B\"}\n{\"name\": \"C\"}\n",
        );

        let records = load_records(file.path(), Some(2)).unwrap();

        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_invalid_json_row_reports_line() {
        let file = write_file(".jsonl", "{\"name\": \"A\"}\n{oops\n");
        let err = load_records(file.path(), None).unwrap_err();
        assert!(format!("{:#}", err).contains(":2: invalid JSON row"));
    }

    #[test]
    fn test_load_testset() {
        let file = write_file(
            ".jsonl",
            "{\"name\": \"Nurofen\", \"category_code\": \"A01\"}\n{\"name\": \"Unknown\"}\n",
        );

        let samples = load_testset(file.path(), None).unwrap();

        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].expected_code, "A01");
        assert_eq!(samples[1].expected_code, "");
    }
}
