//! Incremental driver for one layout pass.
//!
//! A [`LayoutPass`] owns a queue of small steps: open a community, draw one traversal root,
//! flush the deferred cross-community relations. Hosts that must stay responsive call
//! [`LayoutPass::step`] from their own loop or timer and forward the events drained after each
//! step; batch callers use [`LayoutPass::run`]. Both cadences produce the same layout.

use std::collections::VecDeque;

use metroline_core::{NodeIx, PreparedData};

use crate::engine::LayoutEngine;
use crate::grid::OccupancyGrid;
use crate::model::{LayoutEvent, MetroLayout};
use crate::options::LayoutOptions;
use crate::timeline::Timeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    StartCommunity(usize),
    DrawTree(NodeIx),
    FlushDeferred,
}

pub struct LayoutPass<'a, T: Timeline> {
    data: &'a PreparedData,
    engine: LayoutEngine<'a, T>,
    queue: VecDeque<Step>,
    total: usize,
    drawn: usize,
    percent: u8,
    events: Vec<LayoutEvent>,
    layout: MetroLayout,
}

impl<'a, T: Timeline> LayoutPass<'a, T> {
    pub fn new(data: &'a PreparedData, timeline: &'a T, options: &'a LayoutOptions) -> Self {
        let first = if data.nodes_by_community().is_empty() {
            Step::FlushDeferred
        } else {
            Step::StartCommunity(0)
        };
        tracing::debug!(
            nodes = data.nodes().len(),
            edges = data.edges().len(),
            communities = data.nodes_by_community().len(),
            "layout pass created"
        );
        Self {
            data,
            engine: LayoutEngine::new(data, timeline, options),
            queue: VecDeque::from([first]),
            total: data.nodes_by_community().values().map(Vec::len).sum(),
            drawn: 0,
            percent: 0,
            events: Vec::new(),
            layout: MetroLayout::default(),
        }
    }

    /// Runs the next queued step. Returns `false` once the pass has completed.
    pub fn step(&mut self) -> bool {
        let Some(step) = self.queue.pop_front() else {
            return false;
        };
        match step {
            Step::StartCommunity(index) => self.start_community(index),
            Step::DrawTree(node) => {
                self.engine.draw_tree(node);
                self.drawn += 1;
                self.collect();
                self.report_progress();
            }
            Step::FlushDeferred => {
                self.engine.flush_deferred();
                self.collect();
                self.events.push(LayoutEvent::Completed);
                tracing::debug!(
                    nodes = self.layout.nodes.len(),
                    edges = self.layout.edges.len(),
                    min_lane = self.layout.min_lane,
                    max_lane = self.layout.max_lane,
                    "layout pass completed"
                );
            }
        }
        !self.queue.is_empty()
    }

    /// Steps until the pass completes and returns the accumulated layout.
    pub fn run(mut self) -> MetroLayout {
        while self.step() {}
        self.layout
    }

    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    /// Steps still queued. Grows while communities are opened.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Events produced since the last drain, in emission order.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, LayoutEvent> {
        self.events.drain(..)
    }

    /// Layout accumulated so far.
    pub fn layout(&self) -> &MetroLayout {
        &self.layout
    }

    pub fn grid(&self) -> &OccupancyGrid {
        self.engine.grid()
    }

    pub fn into_layout(self) -> MetroLayout {
        self.layout
    }

    fn start_community(&mut self, index: usize) {
        let data = self.data;
        let communities = data.nodes_by_community();
        let Some((community, members)) = communities.get_index(index) else {
            self.queue.push_back(Step::FlushDeferred);
            return;
        };
        self.engine.start_community(community.as_deref());
        self.collect();
        // Latest first, so long chains are laid out from their newest end.
        self.queue
            .extend(members.iter().rev().map(|&node| Step::DrawTree(node)));
        self.queue.push_back(if index + 1 < communities.len() {
            Step::StartCommunity(index + 1)
        } else {
            Step::FlushDeferred
        });
    }

    fn collect(&mut self) {
        for event in self.engine.take_events() {
            self.layout.record(&event);
            self.events.push(event);
        }
    }

    fn report_progress(&mut self) {
        if self.total == 0 {
            return;
        }
        let percent = (self.drawn * 100 / self.total).min(100) as u8;
        if percent > self.percent {
            self.percent = percent;
            self.events.push(LayoutEvent::Progress { percent });
        }
    }
}
