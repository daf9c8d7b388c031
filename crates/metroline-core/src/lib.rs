#![forbid(unsafe_code)]

//! Record normalization and dataset preparation for metro-map timelines (headless).
//!
//! Pipeline:
//! - raw JSON records are mapped onto canonical nodes/edges through a configurable [`KeyMap`]
//! - [`PreparedData::prepare`] validates dates, applies the visible window, keeps only causal
//!   relations (a later source pointing at an earlier target), sorts, indexes and optionally
//!   aggregates nodes per community and day
//!
//! Layout lives in `metroline-layout`; this crate never allocates lanes or columns.

pub mod config;
pub mod error;
pub mod prepare;
pub mod record;
pub mod time;

pub use config::{DateFormats, KeyMap, MetroConfig};
pub use error::{Error, Result};
pub use prepare::{
    Aggregation, EdgeIx, NodeIx, PrepareOptions, PreparedData, PreparedEdge, PreparedNode,
    describe_node,
};
pub use record::{
    CommunityMap, Dataset, EdgeRecord, NodeRecord, normalize_edges, normalize_nodes,
};
pub use time::{DateRange, format_date, parse_date};

#[cfg(test)]
mod tests;
