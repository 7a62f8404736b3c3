//! In-memory category index
//!
//! Answers "which taxonomy rows belong to ingredient cluster X?". Cluster
//! strings in the source taxonomy list synonyms of one cluster separated by
//! `/` or `\` (e.g. `Rimantadine/Римантадин`); every synonym is indexed after
//! trimming and lowercasing, and lookups match whole synonyms only.

use std::collections::{HashMap, HashSet};

use pharmclass_core::{CategoryNode, Error, Result};
use tracing::debug;

/// Read-only view over the category taxonomy
#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    /// Nodes in their original order
    nodes: Vec<CategoryNode>,

    /// Normalized synonym -> positions in `nodes`, ascending
    by_ingredient: HashMap<String, Vec<usize>>,

    /// Category code -> position in `nodes`
    by_code: HashMap<String, usize>,
}

impl CategoryIndex {
    /// Build an index, rejecting blank or duplicate category codes
    pub fn new(nodes: Vec<CategoryNode>) -> Result<Self> {
        let mut by_ingredient: HashMap<String, Vec<usize>> = HashMap::new();
        let mut by_code = HashMap::with_capacity(nodes.len());

        for (position, node) in nodes.iter().enumerate() {
            let code = node.code.trim();
            if code.is_empty() {
                return Err(Error::taxonomy(format!(
                    "category at position {} has an empty code",
                    position
                )));
            }
            if by_code.insert(code.to_string(), position).is_some() {
                return Err(Error::taxonomy(format!("duplicate category code '{}'", code)));
            }

            let Some(cluster) = node.ingredient_cluster.as_deref() else {
                continue;
            };
            let mut seen = HashSet::new();
            for synonym in cluster_synonyms(cluster) {
                if seen.insert(synonym.clone()) {
                    by_ingredient.entry(synonym).or_default().push(position);
                }
            }
        }

        debug!(
            categories = nodes.len(),
            synonyms = by_ingredient.len(),
            "Built category index"
        );

        Ok(Self {
            nodes,
            by_ingredient,
            by_code,
        })
    }

    /// An index without any categories
    pub fn empty() -> Self {
        Self::default()
    }

    /// All categories whose ingredient cluster contains `name`.
    ///
    /// Blank input means "no ingredient detected" and yields nothing.
    /// Results keep the order the nodes were given in.
    pub fn find_by_ingredient(&self, name: &str) -> Vec<&CategoryNode> {
        let key = normalize(name);
        if key.is_empty() {
            return Vec::new();
        }

        self.by_ingredient
            .get(&key)
            .map(|positions| positions.iter().map(|&i| &self.nodes[i]).collect())
            .unwrap_or_default()
    }

    /// Look up a category by code
    pub fn get(&self, code: &str) -> Option<&CategoryNode> {
        self.by_code.get(code.trim()).map(|&i| &self.nodes[i])
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the index holds no categories
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over categories in their original order
    pub fn iter(&self) -> impl Iterator<Item = &CategoryNode> {
        self.nodes.iter()
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Split a cluster string into its normalized, non-empty synonyms
fn cluster_synonyms(cluster: &str) -> impl Iterator<Item = String> + '_ {
    cluster
        .split(['/', '\\'])
        .map(normalize)
        .filter(|part| !part.is_empty())
}
