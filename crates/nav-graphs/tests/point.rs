use nav_core::{Bounds, GraphUpdateObject, LayerMask, NavError, NavGraph, NoPhysics, UpdatableGraph, Vec3};
use nav_graphs::{PointGraph, PointGraphSettings, StaticScene, Waypoint, WaypointTree};

fn line_of_waypoints() -> WaypointTree {
    WaypointTree::new(vec![Waypoint::new("Waypoints", Vec3::ZERO).with_children(vec![
        Waypoint::new("a", Vec3::new(0.0, 0.0, 0.0)),
        Waypoint::new("b", Vec3::new(3.0, 0.0, 0.0)),
        Waypoint::new("c", Vec3::new(10.0, 0.0, 0.0)),
    ])])
}

fn graph_with(settings: PointGraphSettings) -> PointGraph {
    PointGraph::new(
        PointGraphSettings {
            root: Some("Waypoints".into()),
            ..settings
        },
        line_of_waypoints(),
    )
}

fn connects(graph: &PointGraph, from: usize, to: usize) -> bool {
    graph.connections(from).iter().any(|c| c.target == graph.node_ref(to))
}

#[test]
fn max_distance_limits_connections() {
    let mut graph = graph_with(PointGraphSettings {
        max_distance: 5.0,
        ..PointGraphSettings::default()
    });
    let report = graph.scan(&NoPhysics).expect("scan");

    assert_eq!(report.nodes, 3);
    assert_eq!(report.connections, 2);
    assert!(connects(&graph, 0, 1));
    assert!(connects(&graph, 1, 0));
    assert!(!connects(&graph, 1, 2));
    assert_eq!(graph.connections(0)[0].cost, 3000);
}

#[test]
fn zero_max_distance_is_unbounded() {
    let mut graph = graph_with(PointGraphSettings::default());
    let report = graph.scan(&NoPhysics).expect("scan");
    assert_eq!(report.connections, 6);
}

#[test]
fn negative_max_distance_disables_connections() {
    let mut graph = graph_with(PointGraphSettings {
        max_distance: -1.0,
        ..PointGraphSettings::default()
    });
    let report = graph.scan(&NoPhysics).expect("scan");
    assert_eq!(report.nodes, 3);
    assert_eq!(report.connections, 0);
}

#[test]
fn axis_limits_reject_large_steps() {
    let tree = WaypointTree::new(vec![Waypoint::new("Waypoints", Vec3::ZERO).with_children(vec![
        Waypoint::new("low", Vec3::new(0.0, 0.0, 0.0)),
        Waypoint::new("high", Vec3::new(1.0, 2.0, 0.0)),
        Waypoint::new("near", Vec3::new(1.0, 0.5, 0.0)),
    ])]);
    let mut graph = PointGraph::new(
        PointGraphSettings {
            root: Some("Waypoints".into()),
            limits: Vec3::new(0.0, 1.0, 0.0),
            ..PointGraphSettings::default()
        },
        tree,
    );
    graph.scan(&NoPhysics).expect("scan");

    assert!(!connects(&graph, 0, 1));
    assert!(connects(&graph, 0, 2));
    assert!(!connects(&graph, 2, 1));
}

#[test]
fn obstacles_on_the_mask_block_line_of_sight() {
    let scene = StaticScene::new().with_box(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE, 1);

    let mut blocked = graph_with(PointGraphSettings {
        mask: LayerMask::layer(1),
        ..PointGraphSettings::default()
    });
    blocked.scan(&scene).expect("scan");
    assert!(!connects(&blocked, 0, 1));
    assert!(!connects(&blocked, 1, 0));

    let mut ignored = graph_with(PointGraphSettings::default());
    ignored.scan(&scene).expect("scan");
    assert!(connects(&ignored, 0, 1));

    let mut unchecked = graph_with(PointGraphSettings {
        mask: LayerMask::layer(1),
        raycast: false,
        ..PointGraphSettings::default()
    });
    unchecked.scan(&scene).expect("scan");
    assert!(connects(&unchecked, 0, 1));
}

#[test]
fn thick_raycast_catches_near_misses() {
    // A small sphere just off the line between a and b.
    let scene = StaticScene::new().with_sphere(Vec3::new(1.5, 0.0, 0.6), 0.2, 1);

    let mut thin = graph_with(PointGraphSettings {
        mask: LayerMask::layer(1),
        ..PointGraphSettings::default()
    });
    thin.scan(&scene).expect("scan");
    assert!(connects(&thin, 0, 1));

    let mut thick = graph_with(PointGraphSettings {
        mask: LayerMask::layer(1),
        thick_raycast: true,
        thick_raycast_radius: 0.5,
        ..PointGraphSettings::default()
    });
    thick.scan(&scene).expect("scan");
    assert!(!connects(&thick, 0, 1));
}

#[test]
fn missing_root_is_an_error() {
    let mut graph = PointGraph::new(
        PointGraphSettings {
            root: Some("Nowhere".into()),
            ..PointGraphSettings::default()
        },
        line_of_waypoints(),
    );
    assert_eq!(
        graph.scan(&NoPhysics),
        Err(NavError::MissingRoot("Nowhere".into()))
    );
    assert_eq!(graph.node_count(), 0);
}

#[test]
fn search_tag_collects_points_without_a_root() {
    let tree = WaypointTree::new(vec![
        Waypoint::new("one", Vec3::new(0.0, 0.0, 0.0)).with_tag("Nav"),
        Waypoint::new("group", Vec3::ZERO).with_children(vec![
            Waypoint::new("two", Vec3::new(1.0, 0.0, 0.0)).with_tag("Nav"),
            Waypoint::new("decor", Vec3::new(2.0, 0.0, 0.0)).with_tag("Prop"),
        ]),
    ]);
    let mut graph = PointGraph::new(
        PointGraphSettings {
            search_tag: "Nav".into(),
            ..PointGraphSettings::default()
        },
        tree,
    );
    graph.scan(&NoPhysics).expect("scan");

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.node(1).expect("node").world_position(), Vec3::new(1.0, 0.0, 0.0));
}

#[test]
fn recursive_flag_controls_nested_children() {
    let tree = WaypointTree::new(vec![Waypoint::new("root", Vec3::ZERO).with_children(vec![
        Waypoint::new("a", Vec3::new(1.0, 0.0, 0.0))
            .with_children(vec![Waypoint::new("a1", Vec3::new(1.0, 0.0, 1.0))]),
        Waypoint::new("b", Vec3::new(2.0, 0.0, 0.0)),
    ])]);

    let mut recursive = PointGraph::new(
        PointGraphSettings {
            root: Some("root".into()),
            ..PointGraphSettings::default()
        },
        tree.clone(),
    );
    recursive.scan(&NoPhysics).expect("scan");
    assert_eq!(recursive.node_count(), 3);

    let mut direct = PointGraph::new(
        PointGraphSettings {
            root: Some("root".into()),
            recursive: false,
            ..PointGraphSettings::default()
        },
        tree,
    );
    direct.scan(&NoPhysics).expect("scan");
    assert_eq!(direct.node_count(), 2);
}

#[test]
fn physics_update_reevaluates_connections() {
    let mut graph = graph_with(PointGraphSettings {
        mask: LayerMask::layer(1),
        ..PointGraphSettings::default()
    });
    graph.scan(&StaticScene::new()).expect("scan");
    assert!(connects(&graph, 0, 1));

    let scene = StaticScene::new().with_box(Vec3::new(1.5, 0.0, 0.0), Vec3::ONE, 1);
    let mut update = GraphUpdateObject::new(Bounds::new(Vec3::new(3.0, 0.0, 0.0), Vec3::ONE));
    graph.update_area(&mut update, &scene);

    assert!(!connects(&graph, 0, 1));
    assert!(!connects(&graph, 1, 0));
    assert!(connects(&graph, 1, 2));
}

#[test]
fn walkability_update_only_touches_nodes_inside_bounds() {
    let mut graph = graph_with(PointGraphSettings::default());
    graph.scan(&NoPhysics).expect("scan");

    let mut update = GraphUpdateObject::set_walkable(Bounds::new(Vec3::new(10.0, 0.0, 0.0), Vec3::ONE), false);
    update.track_changed_nodes = true;
    graph.update_area(&mut update, &NoPhysics);

    assert!(graph.node(0).expect("node").walkable);
    assert!(!graph.node(2).expect("node").walkable);

    assert_eq!(graph.revert_update(&mut update), Ok(1));
    assert!(graph.node(2).expect("node").walkable);
}

#[test]
fn walkability_update_drops_and_restores_connections() {
    let mut graph = graph_with(PointGraphSettings::default());
    graph.scan(&NoPhysics).expect("scan");
    assert!(connects(&graph, 0, 1));

    let bounds = Bounds::new(Vec3::new(3.0, 0.0, 0.0), Vec3::ONE);
    let mut update = GraphUpdateObject::set_walkable(bounds, false);
    graph.update_area(&mut update, &NoPhysics);

    assert!(!connects(&graph, 0, 1));
    assert!(!connects(&graph, 1, 0));
    assert!(!connects(&graph, 1, 2));
    assert!(connects(&graph, 0, 2));

    let mut update = GraphUpdateObject::set_walkable(bounds, true);
    graph.update_area(&mut update, &NoPhysics);
    assert!(connects(&graph, 0, 1));
    assert!(connects(&graph, 2, 1));
}
