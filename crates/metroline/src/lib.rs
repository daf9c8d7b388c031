#![forbid(unsafe_code)]

//! `metroline` lays out temporal relation graphs as metro maps, headless.
//!
//! Records carry an id and a date; relations point from a later record back to an earlier one.
//! Each record lands on a day column and an integer lane, and every relation becomes a polyline
//! that steps back one day at a time and detours around occupied cells. Rendering is up to the
//! host: the output is plain data.
//!
//! [`Metro`] wires the pipeline together; the underlying crates stay usable on their own.

mod pipeline;

pub use metroline_core::{
    Aggregation, CommunityMap, Dataset, DateFormats, DateRange, EdgeIx, EdgeRecord, KeyMap,
    MetroConfig, NodeIx, NodeRecord, PrepareOptions, PreparedData, PreparedEdge, PreparedNode,
    describe_node, format_date, normalize_edges, normalize_nodes, parse_date,
};
pub use metroline_layout::{
    Column, CommunityStyle, DayScale, Lane, LayoutEvent, LayoutOptions, LayoutPass, LegendEntry,
    MetroLayout, OccupancyGrid, PlacedNode, RoutedEdge, Symbol, TickLabel, Timeline, Waypoint,
    day_scale, layout,
};
pub use pipeline::{Metro, MetroOutput, Prepared};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] metroline_core::Error),
    #[error(transparent)]
    Layout(#[from] metroline_layout::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
