//! Lane assignment, edge routing and relation traversal over one [`OccupancyGrid`].
//!
//! One engine serves exactly one pass. All placement state lives in the grid it owns; a new pass
//! needs a new engine.

mod lanes;
mod routing;
mod traversal;

use std::collections::VecDeque;

use chrono::NaiveDate;
use metroline_core::{EdgeIx, PreparedData};
use rustc_hash::FxHashMap;

use crate::grid::OccupancyGrid;
use crate::model::{LayoutEvent, LegendEntry};
use crate::options::{CommunityStyle, LayoutOptions};
use crate::timeline::Timeline;

pub(crate) struct LayoutEngine<'a, T: Timeline> {
    data: &'a PreparedData,
    timeline: &'a T,
    options: &'a LayoutOptions,
    grid: OccupancyGrid,
    /// Lower bound of every backward lane scan.
    earliest: Option<NaiveDate>,
    styles: FxHashMap<Option<String>, CommunityStyle>,
    /// Cross-community relations, routed once every community has been traversed.
    deferred: VecDeque<EdgeIx>,
    events: Vec<LayoutEvent>,
}

impl<'a, T: Timeline> LayoutEngine<'a, T> {
    pub(crate) fn new(data: &'a PreparedData, timeline: &'a T, options: &'a LayoutOptions) -> Self {
        Self {
            data,
            timeline,
            options,
            grid: OccupancyGrid::new(),
            earliest: data.start().map(|d| d.date()),
            styles: FxHashMap::default(),
            deferred: VecDeque::new(),
            events: Vec::new(),
        }
    }

    pub(crate) fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    pub(crate) fn take_events(&mut self) -> Vec<LayoutEvent> {
        std::mem::take(&mut self.events)
    }

    /// Styles are handed out in the order communities are first asked for.
    fn style_for(&mut self, community: Option<&str>) -> CommunityStyle {
        let key = community.map(str::to_owned);
        if let Some(style) = self.styles.get(&key) {
            return style.clone();
        }
        let style = self.options.community_style(self.styles.len());
        self.styles.insert(key, style.clone());
        style
    }

    pub(crate) fn start_community(&mut self, community: Option<&str>) {
        let style = self.style_for(community);
        tracing::trace!(community = ?community, color = %style.color, "community started");
        self.events.push(LayoutEvent::CommunityStarted(LegendEntry {
            community: community.map(str::to_owned),
            style,
        }));
    }

    pub(crate) fn flush_deferred(&mut self) {
        let data = self.data;
        while let Some(ix) = self.deferred.pop_front() {
            let edge = data.edge(ix);
            if !self.grid.is_placed(edge.target) {
                tracing::warn!(
                    source = %edge.source_id,
                    target = %edge.target_id,
                    "deferred relation reached an undrawn node; placing it from its source"
                );
                self.place_node(edge.target, Some(edge.source));
            }
            self.route_edge(ix);
        }
    }
}
