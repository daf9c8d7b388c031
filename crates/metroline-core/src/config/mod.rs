//! Layered JSON configuration.
//!
//! The base object mirrors the defaults a metro diagram starts from; caller overrides are
//! deep-merged on top (objects merge key by key, every other value replaces).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::error::{Error, Result};

/// Category10 minus its last entry, so the palette cycles through nine colors.
pub const DEFAULT_COLORS: [&str; 9] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22",
];

pub const DEFAULT_SYMBOLS: [&str; 4] = ["circle", "square", "triangle-down", "triangle-up"];

pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq)]
pub struct MetroConfig(Value);

impl Default for MetroConfig {
    fn default() -> Self {
        Self(json!({
            "keyMap": KeyMap::default(),
            "dateFormatNode": ISO_DATE_FORMAT,
            "dateFormatView": ISO_DATE_FORMAT,
            "pixel": 15,
            "scale": 1,
            "minSize": 4,
            "maxSize": 10,
            "baseLane": 1,
            "drawUnlinked": true,
            "maxNudges": 64,
            "colors": DEFAULT_COLORS,
            "symbols": DEFAULT_SYMBOLS,
        }))
    }
}

impl MetroConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// Defaults with `overrides` merged on top.
    pub fn with_overrides(overrides: &Value) -> Result<Self> {
        if !overrides.is_object() {
            return Err(Error::InvalidConfig {
                message: "config overrides must be a JSON object".to_string(),
            });
        }
        let mut cfg = Self::default();
        cfg.deep_merge(overrides);
        Ok(cfg)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    fn lookup(&self, dotted_path: &str) -> Option<&Value> {
        let mut cur = &self.0;
        for segment in dotted_path.split('.') {
            cur = cur.as_object()?.get(segment)?;
        }
        Some(cur)
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.lookup(dotted_path)?.as_str()
    }

    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        self.lookup(dotted_path)?.as_f64()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.lookup(dotted_path)?.as_bool()
    }

    pub fn get_str_list(&self, dotted_path: &str) -> Option<Vec<String>> {
        let items = self.lookup(dotted_path)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
        )
    }

    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        if !self.0.is_object() {
            self.0 = Value::Object(Map::new());
        }

        let Value::Object(ref mut root) = self.0 else {
            return;
        };
        let mut cur: &mut Map<String, Value> = root;
        let mut segments = dotted_path.split('.').peekable();
        while let Some(seg) = segments.next() {
            if segments.peek().is_none() {
                cur.insert(seg.to_string(), value);
                return;
            }
            let slot = cur.entry(seg).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            let Some(next) = slot.as_object_mut() else {
                return;
            };
            cur = next;
        }
    }

    pub fn deep_merge(&mut self, other: &Value) {
        deep_merge_value(&mut self.0, other);
    }

    /// Field names used to read raw node and edge records.
    ///
    /// Keys that are absent (or not strings) keep their default name.
    pub fn key_map(&self) -> KeyMap {
        let defaults = KeyMap::default();
        let pick = |key: &str, fallback: String| {
            self.get_str(&format!("keyMap.{key}"))
                .map(str::to_owned)
                .unwrap_or(fallback)
        };
        KeyMap {
            id: pick("id", defaults.id),
            date: pick("date", defaults.date),
            description: pick("description", defaults.description),
            weight: pick("weight", defaults.weight),
            source_id: pick("sourceId", defaults.source_id),
            target_id: pick("targetId", defaults.target_id),
        }
    }

    pub fn date_formats(&self) -> DateFormats {
        let defaults = DateFormats::default();
        DateFormats {
            node: self
                .get_str("dateFormatNode")
                .map(str::to_owned)
                .unwrap_or(defaults.node),
            view: self
                .get_str("dateFormatView")
                .map(str::to_owned)
                .unwrap_or(defaults.view),
        }
    }
}

fn deep_merge_value(base: &mut Value, incoming: &Value) {
    match (base, incoming) {
        (Value::Object(base_map), Value::Object(in_map)) => {
            for (key, in_value) in in_map {
                match base_map.get_mut(key) {
                    Some(base_value) => deep_merge_value(base_value, in_value),
                    None => {
                        base_map.insert(key.clone(), in_value.clone());
                    }
                }
            }
        }
        (base_slot, in_value) => {
            *base_slot = in_value.clone();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyMap {
    pub id: String,
    pub date: String,
    pub description: String,
    pub weight: String,
    pub source_id: String,
    pub target_id: String,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            id: "id".to_string(),
            date: "date".to_string(),
            description: "description".to_string(),
            weight: "weight".to_string(),
            source_id: "sourceId".to_string(),
            target_id: "targetId".to_string(),
        }
    }
}

/// chrono `strftime` patterns: `node` parses record dates, `view` parses range boundaries and
/// formats display labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormats {
    pub node: String,
    pub view: String,
}

impl Default for DateFormats {
    fn default() -> Self {
        Self {
            node: ISO_DATE_FORMAT.to_string(),
            view: ISO_DATE_FORMAT.to_string(),
        }
    }
}
