use nav_core::{NavGraph, NoPhysics, NodeConstraint, Vec3};
use nav_graphs::{GridGraph, GridGraphSettings, GridLayout, MeshSource, NavMeshGraph, NavMeshSettings, NumNeighbours};
use proptest::prelude::*;

const W: i32 = 6;
const D: i32 = 5;

fn grid_with(blocked: &[bool], cut_corners: bool, neighbours: NumNeighbours) -> GridGraph {
    let mut settings = GridGraphSettings {
        center: Vec3::new(W as f32 * 0.5, 0.0, D as f32 * 0.5),
        unclamped_size: [W as f32, D as f32],
        cut_corners,
        neighbours,
        ..GridGraphSettings::default()
    };
    settings.collision.height_check = false;

    let mut grid = GridGraph::new(settings);
    grid.scan(&NoPhysics).expect("scan");
    for z in 0..D {
        for x in 0..W {
            grid.set_walkable(x, z, !blocked[(z * W + x) as usize]);
        }
    }
    grid.calculate_connections_for(0, 0, W - 1, D - 1);
    grid
}

fn opposite(dir: usize) -> usize {
    if dir < 4 {
        (dir + 2) % 4
    } else {
        (dir - 4 + 2) % 4 + 4
    }
}

fn blocked_cells() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(prop::bool::weighted(0.3), (W * D) as usize)
}

proptest! {
    #[test]
    fn grid_connections_are_symmetric(blocked in blocked_cells(), cut in any::<bool>(), eight in any::<bool>()) {
        let neighbours = if eight { NumNeighbours::Eight } else { NumNeighbours::Four };
        let grid = grid_with(&blocked, cut, neighbours);

        for index in 0..grid.node_count() {
            for dir in 0..8 {
                if let Some(other) = grid.neighbour(index, dir) {
                    let back = grid.grid_node(other).expect("neighbour exists");
                    prop_assert!(back.has_connection(opposite(dir)), "{index} -> {other} in dir {dir}");
                }
            }
        }
    }

    #[test]
    fn diagonals_follow_the_cut_corner_rule(blocked in blocked_cells(), cut in any::<bool>()) {
        let grid = grid_with(&blocked, cut, NumNeighbours::Eight);

        for index in 0..grid.node_count() {
            let node = grid.grid_node(index).expect("node");
            let (x, z) = grid.coords(index);
            for dir in 4..8 {
                let (dx, dz) = (
                    nav_graphs::grid::NEIGHBOUR_X_OFFSETS[dir],
                    nav_graphs::grid::NEIGHBOUR_Z_OFFSETS[dir],
                );
                let target_walkable = grid.node_at(x + dx, z + dz).is_some_and(|n| n.data.walkable);
                let a = node.has_connection(dir - 4);
                let b = node.has_connection((dir - 4 + 1) % 4);
                let supported = if cut { a || b } else { a && b };

                let expected = node.data.walkable && target_walkable && supported;
                prop_assert_eq!(node.has_connection(dir), expected, "node {} dir {}", index, dir);
            }
        }
    }

    #[test]
    fn more_erosion_never_adds_walkable_nodes(blocked in blocked_cells(), iterations in 0u32..4) {
        let mut fewer = grid_with(&blocked, true, NumNeighbours::Eight);
        let mut more = fewer.clone();

        fewer.settings.erode_iterations = iterations;
        fewer.erode_walkable_area(0, 0, W, D);
        more.settings.erode_iterations = iterations + 1;
        more.erode_walkable_area(0, 0, W, D);

        for (a, b) in fewer.grid_nodes().iter().zip(more.grid_nodes()) {
            prop_assert!(!b.data.walkable || a.data.walkable);
        }
    }

    #[test]
    fn erosion_past_a_fixed_point_changes_nothing(blocked in blocked_cells()) {
        let mut grid = grid_with(&blocked, true, NumNeighbours::Eight);
        grid.settings.erode_iterations = 1;
        // A 6x5 grid is fully eroded after three passes.
        for _ in 0..3 {
            grid.erode_walkable_area(0, 0, W, D);
        }
        let settled: Vec<bool> = grid.grid_nodes().iter().map(|n| n.data.walkable).collect();
        prop_assert!(settled.iter().all(|w| !w));

        grid.erode_walkable_area(0, 0, W, D);
        let after: Vec<bool> = grid.grid_nodes().iter().map(|n| n.data.walkable).collect();
        prop_assert_eq!(settled, after);
    }

    #[test]
    fn nearest_force_finds_a_walkable_node_when_one_exists(
        blocked in blocked_cells(),
        px in -2.0f32..8.0,
        pz in -2.0f32..7.0,
    ) {
        let grid = grid_with(&blocked, true, NumNeighbours::Eight);
        let position = Vec3::new(px, 0.0, pz);
        let info = grid.get_nearest_force(position, &NodeConstraint::default());

        let any_walkable = grid.grid_nodes().iter().any(|n| n.data.walkable);
        prop_assert_eq!(!info.is_empty(), any_walkable);
        if let Some(node) = info.node {
            let data = grid.node(node.slot()).expect("node");
            prop_assert!(data.walkable);
            prop_assert!(data.world_position().distance_squared(position) <= 100.0 * 100.0);
        }
    }

    #[test]
    fn whole_multiples_of_node_size_cover_the_requested_size(cells in 1i32..200, step in 0usize..3) {
        let node_size = [0.25f32, 0.5, 2.0][step];
        let size = cells as f32 * node_size;
        let layout = GridLayout::generate(&GridGraphSettings {
            unclamped_size: [size, size],
            node_size,
            ..GridGraphSettings::default()
        });
        prop_assert!(layout.width as f32 * layout.node_size >= size);
        prop_assert_eq!(layout.width, cells);
    }

    #[test]
    fn navmesh_strip_connections_are_symmetric(quads in 1usize..8, height in -5.0f32..5.0) {
        let mut vertices = Vec::new();
        for i in 0..=quads {
            vertices.push(Vec3::new(i as f32, height, 0.0));
            vertices.push(Vec3::new(i as f32, height, 1.0));
        }
        let mut triangles = Vec::new();
        for i in 0..quads as u32 {
            let (a, b, c, d) = (2 * i, 2 * i + 1, 2 * i + 2, 2 * i + 3);
            triangles.extend([a, b, c, b, d, c]);
        }

        let mut mesh = NavMeshGraph::new(NavMeshSettings::default(), MeshSource::new(vertices, triangles));
        mesh.scan(&NoPhysics).expect("scan");
        prop_assert_eq!(mesh.node_count(), quads * 2);

        for index in 0..mesh.node_count() {
            for connection in mesh.connections(index) {
                let back = mesh.connections(connection.target.slot());
                prop_assert!(back.iter().any(|c| c.target == mesh.node_ref(index)));
            }
        }
    }
}
