//! Filters, sorts, indexes and optionally day-aggregates normalized records.
//!
//! The output is read-only: a layout pass borrows it, and any change of range, weight threshold
//! or aggregation mode builds a fresh [`PreparedData`] from the normalized records.

mod aggregate;

use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use indexmap::IndexMap;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DateFormats;
use crate::record::{CommunityMap, EdgeRecord, NodeRecord};
use crate::time::{DateRange, format_date, parse_date};

pub type NodeIx = usize;
pub type EdgeIx = usize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Aggregation {
    #[default]
    None,
    /// One aggregate node per (community, calendar day).
    ByDay,
}

impl FromStr for Aggregation {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "day" | "by-day" => Ok(Self::ByDay),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrepareOptions {
    /// Relations lighter than this are still counted but never traversed.
    pub weight_threshold: f64,
    pub range: DateRange,
    pub aggregation: Aggregation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedNode {
    pub id: String,
    pub date: NaiveDateTime,
    /// The date exactly as the record spelled it (aggregates use the ISO day).
    pub date_text: String,
    pub description: String,
    pub community: Option<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub original: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_nodes: Option<Vec<PreparedNode>>,
}

impl PreparedNode {
    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    /// Number of original records merged into this node; 0 for plain nodes.
    pub fn member_count(&self) -> usize {
        self.member_nodes.as_ref().map_or(0, Vec::len)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreparedEdge {
    pub source_id: String,
    pub target_id: String,
    pub weight: f64,
    pub source: NodeIx,
    pub target: NodeIx,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub original: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_edges: Option<Vec<EdgeRecord>>,
}

impl PreparedEdge {
    fn to_record(&self) -> EdgeRecord {
        EdgeRecord {
            source_id: Some(self.source_id.clone()),
            target_id: Some(self.target_id.clone()),
            weight: self.weight,
            original: self.original.clone(),
        }
    }
}

/// An edge whose endpoints are still ids; resolved against the kept node set in `assemble`.
#[derive(Debug, Clone)]
struct EdgeDraft {
    source_id: String,
    target_id: String,
    weight: f64,
    original: Value,
    member_edges: Option<Vec<EdgeRecord>>,
}

impl EdgeDraft {
    fn from_record(record: &EdgeRecord) -> Option<Self> {
        Some(Self {
            source_id: record.source_id.clone()?,
            target_id: record.target_id.clone()?,
            weight: record.weight,
            original: record.original.clone(),
            member_edges: None,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreparedData {
    nodes: Vec<PreparedNode>,
    edges: Vec<PreparedEdge>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    nodes_by_community: IndexMap<Option<String>, Vec<NodeIx>>,
    edges_by_target_community: IndexMap<Option<String>, Vec<EdgeIx>>,
    edges_by_source: FxHashMap<String, Vec<EdgeIx>>,
    node_index: FxHashMap<String, NodeIx>,
}

impl PreparedData {
    pub fn prepare(
        nodes: &[NodeRecord],
        edges: &[EdgeRecord],
        community: &CommunityMap,
        formats: &DateFormats,
        options: &PrepareOptions,
    ) -> Self {
        let mut seen: FxHashSet<String> = FxHashSet::default();
        let mut unparsed = 0usize;
        let mut duplicates = 0usize;
        let mut parsed: Vec<PreparedNode> = Vec::with_capacity(nodes.len());
        for record in nodes {
            let Some(node) = parse_node(record, community, &formats.node) else {
                unparsed += 1;
                continue;
            };
            // First valid record per id wins.
            if !seen.insert(node.id.clone()) {
                duplicates += 1;
                continue;
            }
            parsed.push(node);
        }
        if unparsed > 0 || duplicates > 0 {
            tracing::debug!(
                unparsed,
                duplicates,
                "dropped node records without a usable id or date, or with a repeated id"
            );
        }
        let drafts: Vec<EdgeDraft> = edges.iter().filter_map(EdgeDraft::from_record).collect();

        let data = Self::assemble(parsed, drafts, options);
        match options.aggregation {
            Aggregation::None => data,
            Aggregation::ByDay => {
                let (nodes, drafts) = aggregate::by_day(&data);
                Self::assemble(nodes, drafts, options)
            }
        }
    }

    fn assemble(
        mut nodes: Vec<PreparedNode>,
        drafts: Vec<EdgeDraft>,
        options: &PrepareOptions,
    ) -> Self {
        nodes.sort_by_key(|n| n.date);
        let candidates = nodes.len();
        if let (Some(first), Some(last)) = (nodes.first(), nodes.last()) {
            let (from, to) = options.range.resolve(first.date, last.date);
            nodes.retain(|n| from <= n.date && n.date <= to);
        }

        let mut data = Self {
            start: nodes.first().map(|n| n.date),
            end: nodes.last().map(|n| n.date),
            ..Self::default()
        };
        for (ix, node) in nodes.iter().enumerate() {
            data.node_index.insert(node.id.clone(), ix);
            data.nodes_by_community
                .entry(node.community.clone())
                .or_default()
                .push(ix);
        }

        let relations = drafts.len();
        let mut edges: Vec<PreparedEdge> = drafts
            .into_iter()
            .filter_map(|draft| {
                let source = *data.node_index.get(&draft.source_id)?;
                let target = *data.node_index.get(&draft.target_id)?;
                // Relations point from a later node back to an earlier one.
                if nodes[source].date <= nodes[target].date {
                    return None;
                }
                Some(PreparedEdge {
                    source_id: draft.source_id,
                    target_id: draft.target_id,
                    weight: draft.weight,
                    source,
                    target,
                    original: draft.original,
                    member_edges: draft.member_edges,
                })
            })
            .collect();
        edges.sort_by_key(|e| nodes[e.source].date - nodes[e.target].date);

        for (ix, edge) in edges.iter().enumerate() {
            data.edges_by_target_community
                .entry(nodes[edge.target].community.clone())
                .or_default()
                .push(ix);
            if edge.weight >= options.weight_threshold {
                data.edges_by_source
                    .entry(edge.source_id.clone())
                    .or_default()
                    .push(ix);
            }
        }

        tracing::debug!(
            nodes = nodes.len(),
            filtered_nodes = candidates - nodes.len(),
            edges = edges.len(),
            dropped_edges = relations - edges.len(),
            start = ?data.start,
            end = ?data.end,
            "prepared dataset"
        );

        data.nodes = nodes;
        data.edges = edges;
        data
    }

    pub fn nodes(&self) -> &[PreparedNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[PreparedEdge] {
        &self.edges
    }

    pub fn node(&self, ix: NodeIx) -> &PreparedNode {
        &self.nodes[ix]
    }

    pub fn edge(&self, ix: EdgeIx) -> &PreparedEdge {
        &self.edges[ix]
    }

    pub fn node_ix(&self, id: &str) -> Option<NodeIx> {
        self.node_index.get(id).copied()
    }

    pub fn node_by_id(&self, id: &str) -> Option<&PreparedNode> {
        self.node_ix(id).map(|ix| &self.nodes[ix])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Earliest visible date, after filtering.
    pub fn start(&self) -> Option<NaiveDateTime> {
        self.start
    }

    /// Latest visible date, after filtering.
    pub fn end(&self) -> Option<NaiveDateTime> {
        self.end
    }

    pub fn nodes_by_community(&self) -> &IndexMap<Option<String>, Vec<NodeIx>> {
        &self.nodes_by_community
    }

    /// Communities in order of first appearance on the time axis.
    pub fn community_labels(&self) -> impl Iterator<Item = Option<&str>> {
        self.nodes_by_community.keys().map(Option::as_deref)
    }

    /// Relations whose target belongs to `community`, regardless of the weight threshold.
    pub fn incoming_by_community(&self, community: Option<&str>) -> &[EdgeIx] {
        self.edges_by_target_community
            .get(&community.map(str::to_owned))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Relations leaving `id` that pass the weight threshold, tightest first.
    pub fn outgoing(&self, id: &str) -> &[EdgeIx] {
        self.edges_by_source
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Tooltip line: `"<date>: <description>"`, with the member count appended for aggregates.
    pub fn describe(&self, ix: NodeIx, view_format: &str) -> String {
        describe_node(&self.nodes[ix], view_format)
    }
}

pub fn describe_node(node: &PreparedNode, view_format: &str) -> String {
    let mut text = format!(
        "{}: {}",
        format_date(view_format, node.date),
        node.description
    );
    let members = node.member_count();
    if members > 0 {
        text.push_str(&format!(" ({members})"));
    }
    text
}

fn parse_node(record: &NodeRecord, community: &CommunityMap, format: &str) -> Option<PreparedNode> {
    let id = record.id.clone()?;
    let date_text = record.date.clone()?;
    let date = parse_date(format, &date_text)?;
    Some(PreparedNode {
        description: record.description.clone().unwrap_or_else(|| id.clone()),
        community: community.get(&id).cloned(),
        id,
        date,
        date_text,
        original: record.original.clone(),
        member_nodes: None,
    })
}
