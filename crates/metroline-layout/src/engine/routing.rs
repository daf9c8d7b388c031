use metroline_core::EdgeIx;

use super::LayoutEngine;
use crate::grid::EdgeSegment;
use crate::model::{LayoutEvent, RoutedEdge, Waypoint};
use crate::timeline::{Timeline, days_back};

impl<T: Timeline> LayoutEngine<'_, T> {
    /// Walks from the source's day back to the target's day, claiming one cell per
    /// intermediate day. A blocked cell nudges the walk one lane toward the target's lane and
    /// retries the same day; after `max_nudges` failed nudges the walk escapes to a lane outside
    /// the occupied band.
    pub(crate) fn route_edge(&mut self, ix: EdgeIx) {
        let data = self.data;
        let timeline = self.timeline;
        let edge = data.edge(ix);
        let (Some(source_lane), Some(target_lane)) =
            (self.grid.lane_of(edge.source), self.grid.lane_of(edge.target))
        else {
            tracing::warn!(
                source = %edge.source_id,
                target = %edge.target_id,
                "relation endpoint was never placed; not routed"
            );
            return;
        };

        let source_day = data.node(edge.source).day();
        let target_day = data.node(edge.target).day();
        let step = if source_lane >= target_lane { -1 } else { 1 };
        let segment = EdgeSegment {
            edge: ix,
            source: edge.source,
        };

        let mut waypoints = vec![Waypoint {
            column: timeline.column(source_day),
            lane: source_lane,
        }];
        let mut lane = source_lane;
        for day in days_back(source_day, target_day)
            .skip(1)
            .take_while(|d| *d > target_day)
        {
            let column = timeline.column(day);
            let mut nudges = 0u32;
            while self.grid.has_node(column, lane)
                || self.grid.has_edge_blocking_for(column, lane, edge.source)
            {
                if nudges == self.options.max_nudges {
                    let escape = if step < 0 {
                        self.grid.min_lane() - 1
                    } else {
                        self.grid.max_lane(None) + 1
                    };
                    tracing::warn!(
                        source = %edge.source_id,
                        target = %edge.target_id,
                        column = column.0,
                        from_lane = lane,
                        to_lane = escape,
                        "nudge bound reached; escaping to a fresh lane"
                    );
                    lane = escape;
                    break;
                }
                lane += step;
                nudges += 1;
            }
            self.grid.place_edge(column, lane, segment);
            waypoints.push(Waypoint { column, lane });
        }
        waypoints.push(Waypoint {
            column: timeline.column(target_day),
            lane: target_lane,
        });

        tracing::trace!(
            source = %edge.source_id,
            target = %edge.target_id,
            points = waypoints.len(),
            "relation routed"
        );
        self.events.push(LayoutEvent::EdgeRouted(RoutedEdge {
            edge: ix,
            source_id: edge.source_id.clone(),
            target_id: edge.target_id.clone(),
            waypoints,
        }));
    }
}
