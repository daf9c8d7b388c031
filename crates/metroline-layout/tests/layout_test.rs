use metroline_core::{
    Dataset, MetroConfig, PrepareOptions, PreparedData, normalize_edges, normalize_nodes,
};
use metroline_layout::{
    LayoutEvent, LayoutOptions, LayoutPass, MetroLayout, Symbol, day_scale, layout,
};
use serde_json::{Value, json};

fn prepare_with(dataset: Value, config: Value, options: &PrepareOptions) -> PreparedData {
    let config = MetroConfig::with_overrides(&config).unwrap();
    let dataset: Dataset = serde_json::from_value(dataset).unwrap();
    let keys = config.key_map();
    PreparedData::prepare(
        &normalize_nodes(&dataset.nodes, &keys),
        &normalize_edges(&dataset.edges, &keys),
        &dataset.community_map(),
        &config.date_formats(),
        options,
    )
}

fn prepare(dataset: Value) -> PreparedData {
    prepare_with(dataset, json!({}), &PrepareOptions::default())
}

fn run(data: &PreparedData, options: &LayoutOptions) -> MetroLayout {
    let scale = day_scale(data, options).unwrap();
    layout(data, &scale, options)
}

fn lane(layout: &MetroLayout, id: &str) -> i64 {
    layout.placed(id).unwrap().lane
}

fn route(layout: &MetroLayout, source: &str, target: &str) -> Vec<(i64, i64)> {
    layout
        .edges
        .iter()
        .find(|e| e.source_id == source && e.target_id == target)
        .unwrap()
        .waypoints
        .iter()
        .map(|w| (w.column.0, w.lane))
        .collect()
}

fn sample() -> Value {
    json!({
        "nodes": [
            { "id": "a", "date": "2020-01-01" },
            { "id": "b", "date": "2020-01-03" },
            { "id": "c", "date": "2020-01-03" },
            { "id": "d", "date": "2020-01-06" },
            { "id": "e", "date": "2020-01-10" }
        ],
        "edges": [
            { "sourceId": "e", "targetId": "a", "weight": 0.9 },
            { "sourceId": "b", "targetId": "a", "weight": 0.5 },
            { "sourceId": "d", "targetId": "b", "weight": 0.2 },
            { "sourceId": "d", "targetId": "c", "weight": 0.7 }
        ],
        "community": { "a": "x", "b": "x", "c": "y", "d": "y", "e": "x" }
    })
}

#[test]
fn sample_lanes_and_routes() {
    let data = prepare(sample());
    let out = run(&data, &LayoutOptions::default());

    assert_eq!(
        ["e", "a", "b", "d", "c"].map(|id| lane(&out, id)),
        [1, 2, 3, 4, 5]
    );
    assert_eq!(out.placed("d").unwrap().column.0, 90);

    let long = route(&out, "e", "a");
    assert_eq!(long.len(), 10);
    assert!(long[1..9].iter().all(|&(_, lane)| lane == 1));
    assert_eq!(long.last(), Some(&(15, 2)));

    assert_eq!(route(&out, "b", "a"), vec![(45, 3), (30, 3), (15, 2)]);
    // Relations leaving the same node may share cells.
    assert_eq!(route(&out, "d", "b"), vec![(90, 4), (75, 4), (60, 4), (45, 3)]);
    assert_eq!(route(&out, "d", "c"), vec![(90, 4), (75, 4), (60, 4), (45, 5)]);

    assert_eq!((out.min_lane, out.max_lane), (0, 5));
    assert_eq!(out.canvas_height(15.0), 125.0);
}

#[test]
fn legend_follows_community_order() {
    let data = prepare(sample());
    let out = run(&data, &LayoutOptions::default());

    let legend: Vec<(Option<&str>, &str, Symbol)> = out
        .legend
        .iter()
        .map(|l| (l.community.as_deref(), l.style.color.as_str(), l.style.symbol))
        .collect();
    assert_eq!(
        legend,
        vec![
            (Some("x"), "#1f77b4", Symbol::Circle),
            (Some("y"), "#ff7f0e", Symbol::Square),
        ]
    );
    assert_eq!(out.placed("c").unwrap().style.symbol, Symbol::Square);
    assert_eq!(out.placed("c").unwrap().marker_size, 4.0);
}

/// `count` nodes spread over 28 days and three communities, each pointing at three others.
fn generated(count: u32) -> Value {
    let mut nodes = Vec::new();
    let mut edges = Vec::new();
    let mut community = serde_json::Map::new();
    for i in 0..count {
        let id = format!("n{i}");
        nodes.push(json!({ "id": id, "date": format!("2021-03-{:02}", 1 + i % 28) }));
        community.insert(id, json!(format!("c{}", i % 3)));
        for step in [1u32, 5, 11] {
            edges.push(json!({ "sourceId": format!("n{i}"), "targetId": format!("n{}", (i + step) % count) }));
        }
    }
    json!({ "nodes": nodes, "edges": edges, "community": community })
}

/// Placed cells are unique, and every route runs backwards in time between its endpoints'
/// lanes without crossing a node.
fn assert_well_formed(out: &MetroLayout) {
    let mut cells: Vec<(i64, i64)> = out.nodes.iter().map(|n| (n.column.0, n.lane)).collect();
    cells.sort();
    let before = cells.len();
    cells.dedup();
    assert_eq!(cells.len(), before);

    for edge in &out.edges {
        let interior = &edge.waypoints[1..edge.waypoints.len() - 1];
        assert!(
            interior
                .iter()
                .all(|w| cells.binary_search(&(w.column.0, w.lane)).is_err()),
            "{} -> {} crosses a node",
            edge.source_id,
            edge.target_id
        );

        let columns: Vec<i64> = edge.waypoints.iter().map(|w| w.column.0).collect();
        assert!(columns.windows(2).all(|w| w[0] > w[1]), "{columns:?}");
        let source = out.placed(&edge.source_id).unwrap();
        let target = out.placed(&edge.target_id).unwrap();
        assert_eq!(edge.waypoints.first().map(|w| w.lane), Some(source.lane));
        assert_eq!(edge.waypoints.last().map(|w| w.lane), Some(target.lane));
    }
}

#[test]
fn nodes_never_share_a_cell_and_routes_run_backwards_in_time() {
    let data = prepare(generated(40));
    let out = run(&data, &LayoutOptions::default());

    assert_eq!(out.nodes.len(), data.nodes().len());
    assert_eq!(out.edges.len(), data.edges().len());
    assert_well_formed(&out);
}

#[test]
fn hiding_unlinked_roots_stays_deterministic_and_well_formed() {
    let data = prepare(generated(40));
    let options = LayoutOptions {
        draw_unlinked: false,
        ..LayoutOptions::default()
    };
    let scale = day_scale(&data, &options).unwrap();

    let mut pass = LayoutPass::new(&data, &scale, &options);
    let mut events = Vec::new();
    while pass.step() {
        events.extend(pass.drain_events());
    }
    events.extend(pass.drain_events());
    assert_eq!(events.last(), Some(&LayoutEvent::Completed));

    let stepped = pass.into_layout();
    assert_eq!(stepped, layout(&data, &scale, &options));
    assert_eq!(stepped, layout(&data, &scale, &options));
    // n28 has no earlier target and is only reached from other communities.
    assert!(stepped.placed("n28").is_some());
    assert_eq!(stepped.edges.len(), data.edges().len());
    assert_well_formed(&stepped);
}

#[test]
fn unvalidated_sizes_and_empty_palettes_still_lay_out() {
    let data = prepare(sample());
    let options = LayoutOptions {
        min_size: 12.0,
        colors: Vec::new(),
        symbols: Vec::new(),
        ..LayoutOptions::default()
    };
    assert!(options.validate().is_err());

    let scale = day_scale(&data, &options).unwrap();
    let out = layout(&data, &scale, &options);
    assert_eq!(out.nodes.len(), 5);
    assert!(out.nodes.iter().all(|n| n.marker_size == 12.0));
    assert!(out.legend.iter().all(|l| l.style.symbol == Symbol::Circle));
}

#[test]
fn stepping_matches_a_single_run() {
    let data = prepare(sample());
    let options = LayoutOptions::default();
    let scale = day_scale(&data, &options).unwrap();

    let mut pass = LayoutPass::new(&data, &scale, &options);
    let mut events = Vec::new();
    let mut steps = 0;
    while pass.step() {
        steps += 1;
        events.extend(pass.drain_events());
    }
    events.extend(pass.drain_events());
    assert!(pass.is_finished());
    assert_eq!(pass.remaining(), 0);
    // Two community openings, five roots, one flush.
    assert_eq!(steps + 1, 8);

    assert_eq!(pass.into_layout(), layout(&data, &scale, &options));

    let progress: Vec<u8> = events
        .iter()
        .filter_map(|e| match e {
            LayoutEvent::Progress { percent } => Some(*percent),
            _ => None,
        })
        .collect();
    assert_eq!(progress, vec![20, 40, 60, 80, 100]);
    assert_eq!(events.last(), Some(&LayoutEvent::Completed));
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, LayoutEvent::Completed))
            .count(),
        1
    );
    assert!(matches!(events.first(), Some(LayoutEvent::CommunityStarted(_))));
}

#[test]
fn relations_below_the_threshold_are_never_routed() {
    let data = prepare_with(
        sample(),
        json!({}),
        &PrepareOptions {
            weight_threshold: 0.6,
            ..PrepareOptions::default()
        },
    );
    let out = run(&data, &LayoutOptions::default());

    let mut routed: Vec<(&str, &str)> = out
        .edges
        .iter()
        .map(|e| (e.source_id.as_str(), e.target_id.as_str()))
        .collect();
    routed.sort();
    assert_eq!(routed, vec![("d", "c"), ("e", "a")]);
    assert_eq!(out.nodes.len(), 5);
}

#[test]
fn cross_community_relations_are_routed_after_every_community() {
    let data = prepare(json!({
        "nodes": [
            { "id": "a", "date": "2020-01-01" },
            { "id": "p", "date": "2020-01-02" },
            { "id": "q", "date": "2020-01-05" }
        ],
        "edges": [{ "sourceId": "q", "targetId": "p" }],
        "community": { "a": "x", "q": "x", "p": "y" }
    }));
    let options = LayoutOptions::default();
    let scale = day_scale(&data, &options).unwrap();
    let mut pass = LayoutPass::new(&data, &scale, &options);
    while pass.step() {}
    let events: Vec<LayoutEvent> = pass.drain_events().collect();

    let routed_at = events
        .iter()
        .position(|e| matches!(e, LayoutEvent::EdgeRouted(_)))
        .unwrap();
    let finished_at = events
        .iter()
        .position(|e| matches!(e, LayoutEvent::Progress { percent: 100 }))
        .unwrap();
    assert!(routed_at > finished_at);

    let out = pass.into_layout();
    assert_eq!(["q", "a", "p"].map(|id| lane(&out, id)), [1, 1, 2]);
    assert_eq!(
        route(&out, "q", "p"),
        vec![(75, 1), (60, 1), (45, 1), (30, 2)]
    );
}

#[test]
fn hidden_unlinked_roots_are_placed_late_when_a_deferred_relation_needs_them() {
    let data = prepare(json!({
        "nodes": [
            { "id": "a", "date": "2020-01-01" },
            { "id": "p", "date": "2020-01-02" },
            { "id": "q", "date": "2020-01-05" }
        ],
        "edges": [{ "sourceId": "q", "targetId": "p" }],
        "community": { "a": "x", "q": "x", "p": "y" }
    }));
    let options = LayoutOptions {
        draw_unlinked: false,
        ..LayoutOptions::default()
    };
    let out = run(&data, &options);

    assert!(out.placed("a").is_none());
    assert_eq!(lane(&out, "q"), 1);
    assert_eq!(lane(&out, "p"), 2);
    assert_eq!(out.edges.len(), 1);
}

#[test]
fn same_day_targets_are_walked_last() {
    let data = prepare_with(
        json!({
            "nodes": [
                { "id": "u", "date": "2020-01-01T00:00" },
                { "id": "t", "date": "2020-01-02T08:00" },
                { "id": "s", "date": "2020-01-02T18:00" }
            ],
            "edges": [
                { "sourceId": "s", "targetId": "t" },
                { "sourceId": "s", "targetId": "u" }
            ]
        }),
        json!({ "dateFormatNode": "%Y-%m-%dT%H:%M" }),
        &PrepareOptions::default(),
    );
    // Tightest relation first in the index.
    assert_eq!(data.edge(data.outgoing("s")[0]).target_id, "t");

    let out = run(&data, &LayoutOptions::default());
    assert_eq!(["s", "u", "t"].map(|id| lane(&out, id)), [1, 2, 3]);
    let order: Vec<&str> = out.edges.iter().map(|e| e.target_id.as_str()).collect();
    assert_eq!(order, vec!["u", "t"]);
    assert_eq!(route(&out, "s", "t"), vec![(30, 1), (30, 3)]);
}

#[test]
fn empty_data_completes_with_nothing_placed() {
    let data = prepare(json!({ "nodes": [], "edges": [] }));
    let options = LayoutOptions::default();
    assert!(day_scale(&data, &options).is_none());

    let scale = |_: chrono::NaiveDate| metroline_layout::Column(0);
    let mut pass = LayoutPass::new(&data, &scale, &options);
    assert!(!pass.step());
    let events: Vec<LayoutEvent> = pass.drain_events().collect();
    assert_eq!(events, vec![LayoutEvent::Completed]);
    assert!(!pass.step());
    assert_eq!(pass.into_layout(), MetroLayout::default());
}

#[test]
fn aggregated_nodes_grow_their_markers() {
    let data = prepare_with(
        json!({
            "nodes": [
                { "id": "a1", "date": "2020-01-01" },
                { "id": "a2", "date": "2020-01-01" },
                { "id": "a3", "date": "2020-01-01" },
                { "id": "b", "date": "2020-01-04" }
            ],
            "edges": [{ "sourceId": "b", "targetId": "a2" }],
            "community": { "a1": "x", "a2": "x", "a3": "x", "b": "x" }
        }),
        json!({}),
        &PrepareOptions {
            aggregation: metroline_core::Aggregation::ByDay,
            ..PrepareOptions::default()
        },
    );
    let out = run(&data, &LayoutOptions::default());
    assert_eq!(out.placed("x/2020-01-01").unwrap().marker_size, 7.0);
    assert_eq!(out.placed("x/2020-01-04").unwrap().marker_size, 5.0);
    assert_eq!(
        route(&out, "x/2020-01-04", "x/2020-01-01"),
        vec![(60, 1), (45, 1), (30, 1), (15, 2)]
    );
}
