use indexmap::IndexMap;
use indexmap::map::Entry;
use serde_json::Value;

use super::{EdgeDraft, PreparedData, PreparedNode};
use crate::config::ISO_DATE_FORMAT;
use crate::time::format_date;

/// Aggregate id: `<community>/<day>`, with an empty label for the unassigned community.
///
/// `day` is always ISO `%Y-%m-%d`, whatever the node date format, so records with different
/// times on one calendar day share an id.
pub(super) fn aggregate_id(community: Option<&str>, day: &str) -> String {
    format!("{}/{}", community.unwrap_or_default(), day)
}

/// Collapses every (community, day) group into one node and every resulting (source, target)
/// pair into one relation carrying the heaviest member weight. Relations that collapse onto a
/// single aggregate are dropped.
pub(super) fn by_day(data: &PreparedData) -> (Vec<PreparedNode>, Vec<EdgeDraft>) {
    let mut aggregates: IndexMap<String, PreparedNode> = IndexMap::new();
    // prepared node index -> aggregate position
    let mut owner: Vec<usize> = Vec::with_capacity(data.nodes().len());

    for node in data.nodes() {
        let day_start = node.day().and_hms_opt(0, 0, 0).unwrap_or(node.date);
        let day_text = format_date(ISO_DATE_FORMAT, day_start);
        let id = aggregate_id(node.community.as_deref(), &day_text);
        let position = match aggregates.entry(id) {
            Entry::Occupied(mut slot) => {
                slot.get_mut()
                    .member_nodes
                    .get_or_insert_with(Vec::new)
                    .push(node.clone());
                slot.index()
            }
            Entry::Vacant(slot) => {
                let id = slot.key().clone();
                let position = slot.index();
                slot.insert(PreparedNode {
                    description: id.clone(),
                    id,
                    date: day_start,
                    date_text: day_text,
                    community: node.community.clone(),
                    original: Value::Null,
                    member_nodes: Some(vec![node.clone()]),
                });
                position
            }
        };
        owner.push(position);
    }

    let mut merged: IndexMap<(usize, usize), EdgeDraft> = IndexMap::new();
    let mut self_loops = 0usize;
    for edge in data.edges() {
        let (source, target) = (owner[edge.source], owner[edge.target]);
        if source == target {
            self_loops += 1;
            continue;
        }
        let draft = merged.entry((source, target)).or_insert_with(|| EdgeDraft {
            source_id: aggregates[source].id.clone(),
            target_id: aggregates[target].id.clone(),
            weight: edge.weight,
            original: Value::Null,
            member_edges: Some(Vec::new()),
        });
        draft.weight = draft.weight.max(edge.weight);
        draft
            .member_edges
            .get_or_insert_with(Vec::new)
            .push(edge.to_record());
    }

    tracing::debug!(
        aggregates = aggregates.len(),
        relations = merged.len(),
        self_loops,
        "aggregated dataset by day"
    );

    (
        aggregates.into_values().collect(),
        merged.into_values().collect(),
    )
}
