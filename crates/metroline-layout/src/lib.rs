#![forbid(unsafe_code)]

//! Headless metro-map layout for prepared timeline data.
//!
//! Nodes sit on a discrete grid: one column per calendar day (through a [`Timeline`]) and one
//! integer lane per row. Relations are walked depth-first per community; every relation is
//! routed as a polyline that claims one grid cell per intermediate day and detours around
//! occupied cells.
//!
//! The pass is incremental ([`LayoutPass::step`]) so interactive hosts can interleave it with
//! rendering; [`layout`] runs it to completion.

mod engine;
pub mod error;
pub mod grid;
pub mod model;
pub mod options;
pub mod schedule;
pub mod timeline;

use metroline_core::PreparedData;

pub use error::{Error, Result};
pub use grid::{Column, EdgeSegment, Lane, OccupancyGrid};
pub use model::{LayoutEvent, LegendEntry, MetroLayout, PlacedNode, RoutedEdge, Waypoint};
pub use options::{CommunityStyle, LayoutOptions, Symbol};
pub use schedule::LayoutPass;
pub use timeline::{DayScale, TickLabel, Timeline};

/// Lays out `data` in one go.
pub fn layout<T: Timeline>(
    data: &PreparedData,
    timeline: &T,
    options: &LayoutOptions,
) -> MetroLayout {
    LayoutPass::new(data, timeline, options).run()
}

/// The stock day axis for `data`: one tick per day from its earliest to its latest node.
pub fn day_scale(data: &PreparedData, options: &LayoutOptions) -> Option<DayScale> {
    let start = data.start()?.date();
    let end = data.end()?.date();
    Some(DayScale::new(start, end, options.tick()))
}
