
use crate::*;
use serde_json::{Value, json};

/// Normalizes `dataset` with the default key map and prepares it.
pub(crate) fn prepare_json(dataset: Value, options: &PrepareOptions) -> PreparedData {
    let dataset: Dataset = serde_json::from_value(dataset).unwrap();
    let keys = KeyMap::default();
    PreparedData::prepare(
        &normalize_nodes(&dataset.nodes, &keys),
        &normalize_edges(&dataset.edges, &keys),
        &dataset.community_map(),
        &DateFormats::default(),
        options,
    )
}

pub(crate) fn ids(data: &PreparedData) -> Vec<&str> {
    data.nodes().iter().map(|n| n.id.as_str()).collect()
}

pub(crate) fn pairs(data: &PreparedData) -> Vec<(&str, &str)> {
    data.edges()
        .iter()
        .map(|e| (e.source_id.as_str(), e.target_id.as_str()))
        .collect()
}

pub(crate) fn sample() -> Value {
    json!({
        "nodes": [
            { "id": "a", "date": "2020-01-01", "description": "first" },
            { "id": "b", "date": "2020-01-03" },
            { "id": "c", "date": "2020-01-03" },
            { "id": "d", "date": "2020-01-06" },
            { "id": "e", "date": "2020-01-10" }
        ],
        "edges": [
            { "sourceId": "e", "targetId": "a", "weight": 0.9 },
            { "sourceId": "b", "targetId": "a", "weight": 0.5 },
            { "sourceId": "d", "targetId": "b", "weight": 0.2 },
            { "sourceId": "d", "targetId": "c", "weight": 0.7 }
        ],
        "community": { "a": "x", "b": "x", "c": "y", "d": "y", "e": "x" }
    })
}
