//! Sparse (column, lane) occupancy table shared by lane assignment and edge routing.

use metroline_core::{EdgeIx, NodeIx};
use rustc_hash::FxHashMap;
use serde::Serialize;

/// Discrete vertical track; may go negative when edges are nudged above the first lane.
pub type Lane = i64;

/// Horizontal position bucket of one calendar day, as handed out by a [`crate::Timeline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Column(pub i64);

/// One routed cell of an edge, tagged with the node the edge leaves from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSegment {
    pub edge: EdgeIx,
    pub source: NodeIx,
}

#[derive(Debug, Clone, Default)]
struct Cell {
    node: Option<NodeIx>,
    segments: Vec<EdgeSegment>,
}

#[derive(Debug, Clone, Default)]
pub struct OccupancyGrid {
    cells: FxHashMap<(Column, Lane), Cell>,
    node_lanes: FxHashMap<NodeIx, Lane>,
    /// Earliest column at which each lane holds anything.
    first_occupied: FxHashMap<Lane, Column>,
    column_max: FxHashMap<Column, Lane>,
    bounds: Option<(Lane, Lane)>,
}

impl OccupancyGrid {
    pub fn new() -> Self {
        Self::default()
    }

    fn occupy(&mut self, column: Column, lane: Lane) -> &mut Cell {
        self.first_occupied
            .entry(lane)
            .and_modify(|first| *first = (*first).min(column))
            .or_insert(column);
        self.column_max
            .entry(column)
            .and_modify(|max| *max = (*max).max(lane))
            .or_insert(lane);
        self.bounds = Some(match self.bounds {
            Some((lo, hi)) => (lo.min(lane), hi.max(lane)),
            None => (lane, lane),
        });
        self.cells.entry((column, lane)).or_default()
    }

    /// Marks the cell as holding `node` and records `lane` as that node's lane.
    ///
    /// A cell's node never changes once set; placing a second node there is refused and
    /// returns `false`.
    pub fn place_node(&mut self, column: Column, lane: Lane, node: NodeIx) -> bool {
        if let Some(existing) = self.node_at(column, lane) {
            debug_assert_eq!(existing, node, "cell ({column:?}, {lane}) already holds a node");
            return existing == node;
        }
        self.occupy(column, lane).node = Some(node);
        self.node_lanes.insert(node, lane);
        true
    }

    pub fn place_edge(&mut self, column: Column, lane: Lane, segment: EdgeSegment) {
        self.occupy(column, lane).segments.push(segment);
    }

    pub fn node_at(&self, column: Column, lane: Lane) -> Option<NodeIx> {
        self.cells.get(&(column, lane)).and_then(|c| c.node)
    }

    pub fn has_node(&self, column: Column, lane: Lane) -> bool {
        self.node_at(column, lane).is_some()
    }

    pub fn segments_at(&self, column: Column, lane: Lane) -> &[EdgeSegment] {
        self.cells
            .get(&(column, lane))
            .map(|c| c.segments.as_slice())
            .unwrap_or(&[])
    }

    /// True when a segment from some other origin crosses the cell. Segments sharing
    /// `source` may overlap.
    pub fn has_edge_blocking_for(&self, column: Column, lane: Lane, source: NodeIx) -> bool {
        self.segments_at(column, lane)
            .iter()
            .any(|s| s.source != source)
    }

    pub fn lane_of(&self, node: NodeIx) -> Option<Lane> {
        self.node_lanes.get(&node).copied()
    }

    pub fn is_placed(&self, node: NodeIx) -> bool {
        self.node_lanes.contains_key(&node)
    }

    pub fn first_occupied(&self, lane: Lane) -> Option<Column> {
        self.first_occupied.get(&lane).copied()
    }

    /// Highest lane in use, either at `column` or anywhere; 0 when nothing is there.
    pub fn max_lane(&self, column: Option<Column>) -> Lane {
        match column {
            Some(column) => self.column_max.get(&column).copied().unwrap_or(0),
            None => self.bounds.map_or(0, |(_, hi)| hi),
        }
    }

    /// Lowest lane in use anywhere; 0 when the grid is empty.
    pub fn min_lane(&self) -> Lane {
        self.bounds.map_or(0, |(lo, _)| lo)
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
