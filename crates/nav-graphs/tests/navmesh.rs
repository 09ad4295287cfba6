use nav_core::geometry::is_clockwise;
use nav_core::{
    Bounds, FunnelGraph, GraphUpdateObject, Int3, Matrix4, NavError, NavGraph, NoPhysics, NodeConstraint,
    UpdatableGraph, Vec3,
};
use nav_graphs::{string_pull, MeshSource, NavMeshGraph, NavMeshSettings};

fn unit_square() -> MeshSource {
    MeshSource::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ],
        vec![0, 1, 2, 0, 2, 3],
    )
}

fn scanned(source: MeshSource) -> NavMeshGraph {
    let mut mesh = NavMeshGraph::new(NavMeshSettings::default(), source);
    mesh.scan(&NoPhysics).expect("scan");
    mesh
}

fn assert_near(a: Vec3, b: Vec3) {
    assert!(a.distance_squared(b) < 1e-6, "{a:?} != {b:?}");
}

#[test]
fn two_triangles_sharing_an_edge_connect_to_each_other() {
    let mesh = scanned(unit_square());

    assert_eq!(mesh.node_count(), 2);
    let a = mesh.connections(0);
    let b = mesh.connections(1);
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
    assert_eq!(a[0].target, mesh.node_ref(1));
    assert_eq!(b[0].target, mesh.node_ref(0));
    assert_eq!(a[0].cost, b[0].cost);
    assert_eq!(a[0].cost, 472);
}

#[test]
fn node_position_is_rounded_triangle_centroid() {
    let mesh = scanned(unit_square());
    assert_eq!(mesh.node(0).expect("node").position, Int3::new(667, 0, 333));
    assert_eq!(mesh.node(1).expect("node").position, Int3::new(333, 0, 667));
}

#[test]
fn duplicated_vertices_are_welded() {
    let source = MeshSource::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
        ],
        vec![0, 1, 2, 3, 4, 5],
    );
    let mesh = scanned(source);

    assert_eq!(mesh.vertices().len(), 4);
    assert_eq!(mesh.connections(0).len(), 1);
    assert_eq!(mesh.connections(1).len(), 1);
}

#[test]
fn triangles_are_stored_clockwise_whatever_the_input_winding() {
    let source = MeshSource::new(unit_square().vertices, vec![0, 1, 2, 3, 2, 0]);
    let mesh = scanned(source);

    for node in mesh.mesh_nodes() {
        let [a, b, c] = node.vertices.map(|v| mesh.vertices()[v as usize]);
        assert!(is_clockwise(a, b, c));
    }
}

#[test]
fn identical_triangles_are_reported_but_not_connected() {
    let source = MeshSource::new(unit_square().vertices, vec![0, 1, 2, 2, 1, 0]);
    let mut mesh = NavMeshGraph::new(NavMeshSettings::default(), source);
    let report = mesh.scan(&NoPhysics).expect("scan");

    assert_eq!(report.nodes, 2);
    assert_eq!(report.identical_triangles, 2);
    assert!(mesh.connections(0).is_empty());
    assert!(mesh.connections(1).is_empty());
}

#[test]
fn degenerate_triangles_are_counted() {
    let source = MeshSource::new(
        vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0)],
        vec![0, 1, 2],
    );
    let mut mesh = NavMeshGraph::new(NavMeshSettings::default(), source);
    let report = mesh.scan(&NoPhysics).expect("scan");
    assert_eq!(report.colinear_triangles, 1);
    assert_eq!(report.nodes, 1);
}

#[test]
fn bad_triangle_index_keeps_previous_mesh() {
    let mut mesh = scanned(unit_square());
    mesh.source = Some(MeshSource::new(unit_square().vertices, vec![0, 1, 7]));

    let err = mesh.scan(&NoPhysics).expect_err("index out of range");
    assert_eq!(
        err,
        NavError::InvalidTriangleIndex {
            index: 7,
            vertex_count: 4
        }
    );
    assert_eq!(mesh.node_count(), 2);
}

#[test]
fn graph_without_source_scans_to_nothing() {
    let mut mesh = NavMeshGraph::default();
    let report = mesh.scan(&NoPhysics).expect("scan");
    assert_eq!(report.nodes, 0);
    assert!(mesh.get_nearest(Vec3::ZERO, &NodeConstraint::none(), None).is_empty());
}

#[test]
fn settings_transform_the_source() {
    let settings = NavMeshSettings {
        offset: Vec3::new(5.0, 0.0, 0.0),
        scale: 2.0,
        ..NavMeshSettings::default()
    };
    let mut mesh = NavMeshGraph::new(settings, unit_square());
    mesh.scan(&NoPhysics).expect("scan");
    assert_eq!(mesh.vertices()[2], Int3::new(7000, 0, 2000));
}

#[test]
fn accurate_nearest_clamps_onto_the_triangle() {
    let mesh = scanned(unit_square());
    let query = Vec3::new(0.8, 2.0, 0.2);

    let info = mesh.get_nearest(query, &NodeConstraint::default(), None);
    assert_eq!(info.node, Some(mesh.node_ref(0)));
    assert_near(info.clamped_position, Vec3::new(0.8, 0.0, 0.2));
    assert_eq!(info.constrained_node, Some(mesh.node_ref(0)));
    assert!(mesh.contains_point(0, query));
    assert!(!mesh.contains_point(1, query));
}

#[test]
fn fast_nearest_prefers_the_containing_triangle() {
    let settings = NavMeshSettings {
        accurate_nearest_node: false,
        ..NavMeshSettings::default()
    };
    let mut mesh = NavMeshGraph::new(settings, unit_square());
    mesh.scan(&NoPhysics).expect("scan");

    let info = mesh.get_nearest(Vec3::new(0.8, 2.0, 0.2), &NodeConstraint::default(), None);
    assert_eq!(info.node, Some(mesh.node_ref(0)));
    let info = mesh.get_nearest(Vec3::new(0.1, 0.0, 0.9), &NodeConstraint::default(), None);
    assert_eq!(info.node, Some(mesh.node_ref(1)));
}

#[test]
fn fast_nearest_prefers_the_containing_triangle_on_small_meshes() {
    let settings = NavMeshSettings {
        scale: 0.2,
        accurate_nearest_node: false,
        ..NavMeshSettings::default()
    };
    let mut mesh = NavMeshGraph::new(settings, unit_square());
    mesh.scan(&NoPhysics).expect("scan");

    // Slightly above the mesh: the other triangle's center is closer in plain
    // world distance, but the containing triangle must still win.
    let query = Vec3::new(0.11, 0.3, 0.09);
    assert!(mesh.contains_point(0, query));
    assert!(!mesh.contains_point(1, query));

    let info = mesh.get_nearest(query, &NodeConstraint::default(), None);
    assert_eq!(info.node, Some(mesh.node_ref(0)));
    let info = mesh.get_nearest_force(query, &NodeConstraint::default());
    assert_eq!(info.node, Some(mesh.node_ref(0)));

    let info = mesh.get_nearest(Vec3::new(0.02, 0.1, 0.18), &NodeConstraint::default(), None);
    assert_eq!(info.node, Some(mesh.node_ref(1)));
}

#[test]
fn fast_nearest_checks_the_distance_limit_in_world_units() {
    let settings = NavMeshSettings {
        accurate_nearest_node: false,
        ..NavMeshSettings::default()
    };
    let mut mesh = NavMeshGraph::new(settings, unit_square());
    mesh.scan(&NoPhysics).expect("scan");

    let near = NodeConstraint::default().with_max_distance(0.5);
    let info = mesh.get_nearest_force(Vec3::new(0.8, 0.3, 0.2), &near);
    assert_eq!(info.node, Some(mesh.node_ref(0)));

    let info = mesh.get_nearest_force(Vec3::new(0.8, 3.0, 0.2), &near);
    assert!(info.is_empty());
}

#[test]
fn nearest_force_skips_unsuitable_triangles() {
    let mut mesh = scanned(unit_square());
    mesh.node_mut(0).expect("node").walkable = false;
    let query = Vec3::new(0.8, 0.0, 0.2);

    // The cheap query ignores the constraint entirely.
    let info = mesh.get_nearest(query, &NodeConstraint::default(), None);
    assert_eq!(info.node, Some(mesh.node_ref(0)));
    assert_eq!(info.constrained_node, Some(mesh.node_ref(0)));

    let forced = mesh.get_nearest_force(query, &NodeConstraint::default());
    assert_eq!(forced.node, Some(mesh.node_ref(1)));
    assert_near(forced.clamped_position, Vec3::new(0.5, 0.0, 0.5));

    mesh.node_mut(1).expect("node").walkable = false;
    assert!(mesh.get_nearest_force(query, &NodeConstraint::default()).is_empty());
}

#[test]
fn relocation_rebuilds_vertices_from_the_source() {
    let mut mesh = scanned(unit_square());
    let old = mesh.base.matrix;
    let generation = mesh.generation();

    mesh.relocate_nodes(&old, &Matrix4::translation(Vec3::new(10.0, 0.0, 0.0)));
    assert_eq!(mesh.vertices()[0], Int3::new(10_000, 0, 0));
    assert_eq!(mesh.node(0).expect("node").position, Int3::new(10_667, 0, 333));
    assert_eq!(mesh.connections(0)[0].cost, 472);
    assert!(mesh.generation() > generation);

    // Relocating back does not accumulate error.
    let moved = mesh.base.matrix;
    mesh.relocate_nodes(&moved, &Matrix4::IDENTITY);
    assert_eq!(mesh.vertices()[2], Int3::new(1000, 0, 1000));
}

#[test]
fn update_touches_only_overlapping_triangles_and_reverts() {
    let mut mesh = scanned(unit_square());
    let bounds = Bounds::new(Vec3::new(0.8, 0.0, 0.2), Vec3::new(0.2, 10.0, 0.2));
    let mut update = GraphUpdateObject::set_walkable(bounds, false);
    update.track_changed_nodes = true;

    mesh.update_area(&mut update, &NoPhysics);
    assert!(!mesh.node(0).expect("node").walkable);
    assert!(mesh.node(1).expect("node").walkable);

    assert_eq!(mesh.revert_update(&mut update), Ok(1));
    assert!(mesh.node(0).expect("node").walkable);
}

#[test]
fn corridor_through_shared_edge_pulls_straight() {
    let mesh = scanned(unit_square());
    let (mut left, mut right) = (Vec::new(), Vec::new());
    mesh.build_funnel_corridor(&[0, 1], 0, 1, &mut left, &mut right);

    assert_eq!(left.len(), 1);
    assert_eq!(right.len(), 1);
    let mut portal = [left[0], right[0]];
    portal.sort_by(|a, b| a.x.total_cmp(&b.x));
    assert_eq!(portal, [Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 1.0)]);

    let start = Vec3::new(0.8, 0.0, 0.2);
    let end = Vec3::new(0.2, 0.0, 0.8);
    assert_eq!(string_pull(start, end, &left, &right), vec![start, end]);
}

#[test]
fn corridor_sides_stay_on_shared_vertices() {
    // Fan of three triangles around the vertex at the origin.
    let source = MeshSource::new(
        vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 2.0),
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(-2.0, 0.0, 2.0),
        ],
        vec![0, 1, 2, 0, 2, 3, 0, 3, 4],
    );
    let mesh = scanned(source);
    let (mut left, mut right) = (Vec::new(), Vec::new());
    mesh.build_funnel_corridor(&[0, 1, 2], 0, 2, &mut left, &mut right);

    assert_eq!(left.len(), 2);
    // The pivot vertex stays on one side for the whole corridor.
    let origin = Vec3::ZERO;
    assert!((left[0] == origin && left[1] == origin) || (right[0] == origin && right[1] == origin));
}
