use metroline_core::{EdgeIx, NodeIx};
use serde::Serialize;

use crate::grid::{Column, Lane};
use crate::options::CommunityStyle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Waypoint {
    pub column: Column,
    pub lane: Lane,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedNode {
    pub node: NodeIx,
    pub id: String,
    pub column: Column,
    pub lane: Lane,
    pub marker_size: f64,
    pub style: CommunityStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutedEdge {
    pub edge: EdgeIx,
    pub source_id: String,
    pub target_id: String,
    /// Starts at the source cell, ends at the target cell.
    pub waypoints: Vec<Waypoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub community: Option<String>,
    pub style: CommunityStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum LayoutEvent {
    CommunityStarted(LegendEntry),
    NodePlaced(PlacedNode),
    EdgeRouted(RoutedEdge),
    Progress { percent: u8 },
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetroLayout {
    pub nodes: Vec<PlacedNode>,
    pub edges: Vec<RoutedEdge>,
    pub legend: Vec<LegendEntry>,
    pub min_lane: Lane,
    pub max_lane: Lane,
}

impl MetroLayout {
    /// Vertical extent in pixels, including room for edges nudged above lane 0.
    pub fn canvas_height(&self, pixel: f64) -> f64 {
        (self.max_lane - self.min_lane.min(0)) as f64 * pixel + 50.0
    }

    pub fn placed(&self, id: &str) -> Option<&PlacedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub(crate) fn record(&mut self, event: &LayoutEvent) {
        match event {
            LayoutEvent::CommunityStarted(entry) => self.legend.push(entry.clone()),
            LayoutEvent::NodePlaced(node) => {
                self.min_lane = self.min_lane.min(node.lane);
                self.max_lane = self.max_lane.max(node.lane);
                self.nodes.push(node.clone());
            }
            LayoutEvent::EdgeRouted(edge) => {
                for point in &edge.waypoints {
                    self.min_lane = self.min_lane.min(point.lane);
                    self.max_lane = self.max_lane.max(point.lane);
                }
                self.edges.push(edge.clone());
            }
            LayoutEvent::Progress { .. } | LayoutEvent::Completed => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn events_serialize_with_a_type_tag() {
        assert_eq!(
            serde_json::to_value(LayoutEvent::Progress { percent: 40 }).unwrap(),
            json!({ "type": "progress", "percent": 40 })
        );
        assert_eq!(
            serde_json::to_value(LayoutEvent::Completed).unwrap(),
            json!({ "type": "completed" })
        );
    }

    #[test]
    fn canvas_height_covers_lanes_above_zero() {
        let layout = MetroLayout {
            min_lane: -2,
            max_lane: 4,
            ..MetroLayout::default()
        };
        assert_eq!(layout.canvas_height(10.0), 110.0);
    }
}
