use metroline_core::MetroConfig;
use metroline_core::config::{DEFAULT_COLORS, DEFAULT_SYMBOLS};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::grid::Lane;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Symbol {
    Circle,
    Square,
    TriangleDown,
    TriangleUp,
}

impl Symbol {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "circle" => Some(Self::Circle),
            "square" => Some(Self::Square),
            "triangle-down" => Some(Self::TriangleDown),
            "triangle-up" => Some(Self::TriangleUp),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CommunityStyle {
    pub color: String,
    pub symbol: Symbol,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    /// Pixels per lane and per day tick, before `scale`.
    pub pixel: f64,
    pub scale: f64,
    pub min_size: f64,
    pub max_size: f64,
    /// First lane tried for nodes that are not reached through a relation.
    pub base_lane: Lane,
    /// Also draw traversal roots that have no relation to traverse.
    pub draw_unlinked: bool,
    /// Per-column bound on routing nudges before an edge escapes to a fresh lane.
    pub max_nudges: u32,
    pub colors: Vec<String>,
    pub symbols: Vec<Symbol>,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            pixel: 15.0,
            scale: 1.0,
            min_size: 4.0,
            max_size: 10.0,
            base_lane: 1,
            draw_unlinked: true,
            max_nudges: 64,
            colors: DEFAULT_COLORS.iter().map(|c| c.to_string()).collect(),
            symbols: DEFAULT_SYMBOLS.iter().filter_map(|s| Symbol::parse(s)).collect(),
        }
    }
}

impl LayoutOptions {
    pub fn from_config(config: &MetroConfig) -> Result<Self> {
        let defaults = Self::default();
        let symbols = match config.get_str_list("symbols") {
            Some(names) => names
                .iter()
                .map(|name| {
                    Symbol::parse(name).ok_or_else(|| Error::InvalidOptions {
                        message: format!("unknown symbol `{name}`"),
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            None => defaults.symbols,
        };
        let options = Self {
            pixel: config.get_f64("pixel").unwrap_or(defaults.pixel),
            scale: config.get_f64("scale").unwrap_or(defaults.scale),
            min_size: config.get_f64("minSize").unwrap_or(defaults.min_size),
            max_size: config.get_f64("maxSize").unwrap_or(defaults.max_size),
            base_lane: config
                .get_f64("baseLane")
                .map(|v| v as Lane)
                .unwrap_or(defaults.base_lane),
            draw_unlinked: config
                .get_bool("drawUnlinked")
                .unwrap_or(defaults.draw_unlinked),
            max_nudges: config
                .get_f64("maxNudges")
                .map(|v| v.max(0.0) as u32)
                .unwrap_or(defaults.max_nudges),
            colors: config.get_str_list("colors").unwrap_or(defaults.colors),
            symbols,
        };
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |message: &str| {
            Err(Error::InvalidOptions {
                message: message.to_string(),
            })
        };
        if !(self.pixel.is_finite() && self.pixel > 0.0) {
            return invalid("`pixel` must be a positive number");
        }
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return invalid("`scale` must be a positive number");
        }
        if !(self.min_size.is_finite() && self.max_size.is_finite()) || self.min_size > self.max_size {
            return invalid("`minSize` must not exceed `maxSize`");
        }
        if self.colors.is_empty() || self.symbols.is_empty() {
            return invalid("`colors` and `symbols` must not be empty");
        }
        Ok(())
    }

    /// Distance between day ticks on the axis, in whole pixels.
    pub fn tick(&self) -> i64 {
        ((self.pixel * self.scale).round() as i64).max(1)
    }

    /// Pixels per lane.
    pub fn lane_unit(&self) -> f64 {
        self.pixel * self.scale
    }

    /// Marker size grows by one per merged record, capped at `max_size` and never below
    /// `min_size`. Unvalidated options with `min_size > max_size` get `min_size`.
    pub fn marker_size(&self, members: usize) -> f64 {
        (self.min_size + members as f64)
            .min(self.max_size)
            .max(self.min_size)
            * self.scale
    }

    /// Style of the `index`-th community in traversal order. An empty palette falls back to the
    /// first default color or to circles.
    pub fn community_style(&self, index: usize) -> CommunityStyle {
        let color = match self.colors.len() {
            0 => DEFAULT_COLORS[0].to_string(),
            len => self.colors[index % len].clone(),
        };
        let symbol = match self.symbols.len() {
            0 => Symbol::Circle,
            len => self.symbols[index % len],
        };
        CommunityStyle { color, symbol }
    }
}
