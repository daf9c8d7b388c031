use metroline_core::{EdgeIx, NodeIx};

use super::LayoutEngine;
use crate::timeline::Timeline;

/// One node whose outgoing relations are being walked.
struct Frame<'a> {
    node: NodeIx,
    outgoing: &'a [EdgeIx],
    next: usize,
    /// Relations to targets on the node's own day, walked after all others.
    same_day: Vec<EdgeIx>,
    same_day_next: usize,
    /// Relation whose target subtree is in progress; routed once the subtree is done.
    pending: Option<EdgeIx>,
}

impl<'a, T: Timeline> LayoutEngine<'a, T> {
    /// Depth-first walk over the relations leaving `root`, placing every node it reaches and
    /// routing each relation after its target's own subtree.
    ///
    /// The walk keeps an explicit stack, so chain depth is bounded by memory only.
    pub(crate) fn draw_tree(&mut self, root: NodeIx) {
        let mut stack: Vec<Frame<'a>> = Vec::new();
        if let Some(frame) = self.visit(root, None) {
            stack.push(frame);
        }
        while let Some(frame) = stack.last_mut() {
            if let Some(edge) = frame.pending.take() {
                self.route_edge(edge);
                continue;
            }
            let Some((edge, target)) = self.next_relation(frame) else {
                stack.pop();
                continue;
            };
            frame.pending = Some(edge);
            let from = frame.node;
            if let Some(child) = self.visit(target, Some(from)) {
                stack.push(child);
            }
        }
    }

    /// Places `node` and opens its frame, unless it is already placed or is an unlinked root
    /// that should stay hidden.
    fn visit(&mut self, node: NodeIx, from: Option<NodeIx>) -> Option<Frame<'a>> {
        if self.grid.is_placed(node) {
            return None;
        }
        let data = self.data;
        let outgoing = data.outgoing(&data.node(node).id);
        if !(self.options.draw_unlinked || from.is_some() || !outgoing.is_empty()) {
            return None;
        }
        self.place_node(node, from);
        Some(Frame {
            node,
            outgoing,
            next: 0,
            same_day: Vec::new(),
            same_day_next: 0,
            pending: None,
        })
    }

    fn next_relation(&mut self, frame: &mut Frame<'a>) -> Option<(EdgeIx, NodeIx)> {
        let data = self.data;
        let node = data.node(frame.node);
        while let Some(&ix) = frame.outgoing.get(frame.next) {
            frame.next += 1;
            let edge = data.edge(ix);
            let target = data.node(edge.target);
            if target.community != node.community && !self.grid.is_placed(edge.target) {
                tracing::trace!(source = %edge.source_id, target = %edge.target_id, "relation deferred");
                self.deferred.push_back(ix);
                continue;
            }
            // Calendar days, not timestamps: one day is one column. Retained targets are strictly
            // earlier, so only time-bearing node formats ever land here.
            if target.day() == node.day() {
                frame.same_day.push(ix);
                continue;
            }
            return Some((ix, edge.target));
        }
        let ix = *frame.same_day.get(frame.same_day_next)?;
        frame.same_day_next += 1;
        Some((ix, data.edge(ix).target))
    }
}
