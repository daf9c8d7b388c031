use chrono::NaiveDate;
use metroline_core::NodeIx;

use super::LayoutEngine;
use crate::grid::Lane;
use crate::model::{LayoutEvent, PlacedNode};
use crate::timeline::{Timeline, days_back};

impl<T: Timeline> LayoutEngine<'_, T> {
    /// Assigns `node` the first lane whose history is clear from the node's day back to the
    /// earliest visible day, and places it there.
    ///
    /// Roots start searching at the base lane; nodes reached from `from` start one lane past
    /// their source.
    pub(crate) fn place_node(&mut self, node: NodeIx, from: Option<NodeIx>) -> Lane {
        let data = self.data;
        let prepared = data.node(node);
        let day = prepared.day();
        let earliest = self.earliest.unwrap_or(day);

        let mut lane = match from.and_then(|source| self.grid.lane_of(source)) {
            Some(source_lane) => source_lane + 1,
            None => self.options.base_lane,
        };
        while !self.lane_is_clear(lane, day, earliest, node) {
            lane += 1;
        }

        let column = self.timeline.column(day);
        self.grid.place_node(column, lane, node);
        let style = self.style_for(prepared.community.as_deref());
        tracing::trace!(id = %prepared.id, column = column.0, lane, "node placed");
        self.events.push(LayoutEvent::NodePlaced(PlacedNode {
            node,
            id: prepared.id.clone(),
            column,
            lane,
            marker_size: self.options.marker_size(prepared.member_count()),
            style,
        }));
        lane
    }

    fn lane_is_clear(&self, lane: Lane, day: NaiveDate, earliest: NaiveDate, node: NodeIx) -> bool {
        let Some(first) = self.grid.first_occupied(lane) else {
            return true;
        };
        for scanned in days_back(day, earliest) {
            let column = self.timeline.column(scanned);
            if column < first {
                // Nothing on this lane before `first`.
                return true;
            }
            if self.grid.has_node(column, lane) || self.grid.has_edge_blocking_for(column, lane, node)
            {
                return false;
            }
        }
        true
    }
}
