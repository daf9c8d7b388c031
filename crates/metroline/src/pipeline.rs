use chrono::NaiveDate;
use metroline_core::{
    Aggregation, CommunityMap, Dataset, DateRange, EdgeRecord, MetroConfig, NodeRecord,
    PrepareOptions, PreparedData, normalize_edges, normalize_nodes,
};
use metroline_layout::{
    DayScale, LayoutOptions, LayoutPass, MetroLayout, TickLabel, day_scale,
};
use serde_json::Value;

use crate::Result;

/// Pipeline builder: raw dataset in, layout out.
///
/// Records are normalized once, when the dataset arrives or the key map changes. Every other
/// setting only affects the next [`Metro::prepare`].
#[derive(Debug, Clone)]
pub struct Metro {
    dataset: Dataset,
    config: MetroConfig,
    nodes: Vec<NodeRecord>,
    edges: Vec<EdgeRecord>,
    community: CommunityMap,
    weight: f64,
    from: Option<String>,
    to: Option<String>,
    aggregation: Aggregation,
}

impl Metro {
    pub fn new(dataset: Dataset) -> Self {
        let mut metro = Self {
            dataset,
            config: MetroConfig::default(),
            nodes: Vec::new(),
            edges: Vec::new(),
            community: CommunityMap::new(),
            weight: 0.0,
            from: None,
            to: None,
            aggregation: Aggregation::None,
        };
        metro.normalize();
        metro
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(Self::new(Dataset::from_json_str(text)?))
    }

    fn normalize(&mut self) {
        let keys = self.config.key_map();
        self.nodes = normalize_nodes(&self.dataset.nodes, &keys);
        self.edges = normalize_edges(&self.dataset.edges, &keys);
        self.community = self.dataset.community_map();
        tracing::debug!(
            nodes = self.nodes.len(),
            edges = self.edges.len(),
            communities = self.community.len(),
            "records normalized"
        );
    }

    /// Layers `overrides` onto the current configuration.
    pub fn config(mut self, overrides: &Value) -> Result<Self> {
        if !overrides.is_object() {
            return Err(metroline_core::Error::InvalidConfig {
                message: "config overrides must be a JSON object".to_string(),
            }
            .into());
        }
        let keys = self.config.key_map();
        self.config.deep_merge(overrides);
        if self.config.key_map() != keys {
            self.normalize();
        }
        Ok(self)
    }

    /// Relations lighter than `threshold` are kept but not traversed.
    pub fn weight(mut self, threshold: f64) -> Self {
        self.weight = threshold;
        self
    }

    /// Visible window in the view date format; `None` or blank leaves that side open.
    pub fn range(mut self, from: Option<&str>, to: Option<&str>) -> Self {
        self.from = from.map(str::to_owned);
        self.to = to.map(str::to_owned);
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn settings(&self) -> &MetroConfig {
        &self.config
    }

    pub fn node_records(&self) -> &[NodeRecord] {
        &self.nodes
    }

    pub fn edge_records(&self) -> &[EdgeRecord] {
        &self.edges
    }

    pub fn prepare_options(&self) -> Result<PrepareOptions> {
        let formats = self.config.date_formats();
        Ok(PrepareOptions {
            weight_threshold: self.weight,
            range: DateRange::parse(&formats.view, self.from.as_deref(), self.to.as_deref())?,
            aggregation: self.aggregation,
        })
    }

    pub fn prepare(&self) -> Result<Prepared> {
        let options = LayoutOptions::from_config(&self.config)?;
        let formats = self.config.date_formats();
        let data = PreparedData::prepare(
            &self.nodes,
            &self.edges,
            &self.community,
            &formats,
            &self.prepare_options()?,
        );
        // Nothing visible: any single-day axis will do.
        let scale = day_scale(&data, &options).unwrap_or_else(|| {
            let day = NaiveDate::default();
            DayScale::new(day, day, options.tick())
        });
        Ok(Prepared {
            data,
            scale,
            options,
            view_format: formats.view,
        })
    }

    /// Prepares and lays out in one go.
    pub fn layout(&self) -> Result<MetroOutput> {
        let prepared = self.prepare()?;
        let layout = prepared.layout();
        let labels = prepared.labels();
        let height = layout.canvas_height(prepared.options.lane_unit());
        Ok(MetroOutput {
            prepared: prepared.data,
            scale: prepared.scale,
            layout,
            labels,
            height,
        })
    }
}

/// A prepared dataset together with the axis and options its layout pass runs on.
#[derive(Debug, Clone)]
pub struct Prepared {
    pub data: PreparedData,
    pub scale: DayScale,
    pub options: LayoutOptions,
    pub view_format: String,
}

impl Prepared {
    /// Incremental pass for hosts that interleave layout with rendering.
    pub fn layout_pass(&self) -> LayoutPass<'_, DayScale> {
        LayoutPass::new(&self.data, &self.scale, &self.options)
    }

    pub fn layout(&self) -> MetroLayout {
        self.layout_pass().run()
    }

    pub fn labels(&self) -> Vec<TickLabel> {
        self.scale.labels(&self.view_format)
    }
}

#[derive(Debug, Clone)]
pub struct MetroOutput {
    pub prepared: PreparedData,
    pub scale: DayScale,
    pub layout: MetroLayout,
    pub labels: Vec<TickLabel>,
    /// Canvas height in pixels.
    pub height: f64,
}

impl MetroOutput {
    /// Canvas width in pixels.
    pub fn width(&self) -> i64 {
        self.scale.width()
    }
}
