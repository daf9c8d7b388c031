//! Maps arbitrary input records onto the canonical node/edge shape.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::KeyMap;
use crate::error::{Error, Result};

/// Node id → community label. Nodes without an entry belong to the unassigned community.
pub type CommunityMap = IndexMap<String, String>;

/// The raw input document: `{ "nodes": [...], "edges": [...], "community": {...} }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub nodes: Vec<Value>,
    pub edges: Vec<Value>,
    pub community: IndexMap<String, Value>,
}

impl Dataset {
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        if !value.is_object() {
            return Err(Error::InvalidDataset {
                message: "expected a JSON object with `nodes`, `edges` and `community`".to_string(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Community labels stringified; entries whose label is not a string or number are ignored.
    pub fn community_map(&self) -> CommunityMap {
        self.community
            .iter()
            .filter_map(|(id, label)| scalar_text(label).map(|label| (id.clone(), label)))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRecord {
    pub id: Option<String>,
    pub date: Option<String>,
    pub description: Option<String>,
    pub original: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub source_id: Option<String>,
    pub target_id: Option<String>,
    pub weight: f64,
    pub original: Value,
}

impl NodeRecord {
    pub fn from_value(record: &Value, keys: &KeyMap) -> Self {
        let field = |name: &str| record.get(name).and_then(scalar_text);
        let id = field(&keys.id);
        let description = field(&keys.description).filter(|d| !d.is_empty());
        Self {
            description: description.or_else(|| id.clone()),
            id,
            date: field(&keys.date),
            original: record.clone(),
        }
    }
}

impl EdgeRecord {
    pub fn from_value(record: &Value, keys: &KeyMap) -> Self {
        let field = |name: &str| record.get(name).and_then(scalar_text);
        Self {
            source_id: field(&keys.source_id),
            target_id: field(&keys.target_id),
            weight: record.get(&keys.weight).map(weight_of).unwrap_or(0.0),
            original: record.clone(),
        }
    }
}

/// Normalizes node records one by one. Validation and duplicate ids are left to preparation.
pub fn normalize_nodes(records: &[Value], keys: &KeyMap) -> Vec<NodeRecord> {
    records
        .iter()
        .map(|record| NodeRecord::from_value(record, keys))
        .collect()
}

pub fn normalize_edges(records: &[Value], keys: &KeyMap) -> Vec<EdgeRecord> {
    records
        .iter()
        .map(|record| EdgeRecord::from_value(record, keys))
        .collect()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn weight_of(value: &Value) -> f64 {
    let weight = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    weight.filter(|w| w.is_finite()).unwrap_or(0.0)
}
