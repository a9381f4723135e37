use serde::Serialize;
use std::collections::BTreeMap;

/// Scalar value carried through from the source data (extra CSV columns,
/// unrecognized JSON fields). Not consumed by layout; surfaced in dumps.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Number(f64),
    Flag(bool),
}

/// One node of the validated capability tree. Owned exclusively by its
/// parent; the import pipeline guarantees the forest is acyclic.
#[derive(Debug, Clone, Serialize)]
pub struct CapabilityNode {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, PropertyValue>,
    pub children: Vec<CapabilityNode>,
}

impl CapabilityNode {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            properties: BTreeMap::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ModelSummary {
    pub nodes: usize,
    pub roots: usize,
    pub max_depth: usize,
}

pub fn summarize(roots: &[CapabilityNode]) -> ModelSummary {
    fn count(node: &CapabilityNode) -> usize {
        1 + node.children.iter().map(count).sum::<usize>()
    }
    fn depth(node: &CapabilityNode, level: usize) -> usize {
        node.children
            .iter()
            .map(|child| depth(child, level + 1))
            .max()
            .unwrap_or(level)
    }

    ModelSummary {
        nodes: roots.iter().map(count).sum(),
        roots: roots.len(),
        max_depth: roots.iter().map(|root| depth(root, 0)).max().unwrap_or(0),
    }
}
