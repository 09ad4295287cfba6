use criterion::{black_box, criterion_group, criterion_main, Criterion};
use nav_core::{NavGraph, NodeConstraint, Vec3};
use nav_graphs::{GridGraph, GridGraphSettings, MeshSource, NavMeshGraph, NavMeshSettings, StaticScene};

fn pillar_scene(side: usize) -> StaticScene {
    let mut scene = StaticScene::new().with_ground(0.0, 0);
    for z in (2..side).step_by(6) {
        for x in (2..side).step_by(6) {
            scene = scene.with_box(
                Vec3::new(x as f32 + 0.5, 1.0, z as f32 + 0.5),
                Vec3::new(1.0, 2.0, 1.0),
                1,
            );
        }
    }
    scene
}

fn grid(side: usize) -> GridGraph {
    let mut settings = GridGraphSettings {
        center: Vec3::new(side as f32 * 0.5, 0.0, side as f32 * 0.5),
        unclamped_size: [side as f32, side as f32],
        erode_iterations: 1,
        ..GridGraphSettings::default()
    };
    settings.collision.mask = nav_core::LayerMask::layer(1);
    settings.collision.height_mask = nav_core::LayerMask::layer(0);
    GridGraph::new(settings)
}

fn quad_mesh(side: usize) -> MeshSource {
    let mut vertices = Vec::with_capacity((side + 1) * (side + 1));
    for z in 0..=side {
        for x in 0..=side {
            vertices.push(Vec3::new(x as f32, 0.0, z as f32));
        }
    }
    let row = side as u32 + 1;
    let mut triangles = Vec::with_capacity(side * side * 6);
    for z in 0..side as u32 {
        for x in 0..side as u32 {
            let a = z * row + x;
            triangles.extend([a, a + 1, a + row + 1, a, a + row + 1, a + row]);
        }
    }
    MeshSource::new(vertices, triangles)
}

fn bench_grid(c: &mut Criterion) {
    let side = 64;
    let scene = pillar_scene(side);

    let mut group = c.benchmark_group("nav-graphs/grid");

    group.bench_function("scan_64x64", |b| {
        b.iter(|| {
            let mut graph = grid(side);
            let report = graph.scan(&scene).expect("scan");
            black_box(report.walkable);
        })
    });

    let mut graph = grid(side);
    graph.scan(&scene).expect("scan");
    let constraint = NodeConstraint::default();

    group.bench_function("get_nearest", |b| {
        b.iter(|| {
            let info = graph.get_nearest(black_box(Vec3::new(31.3, 0.0, 17.8)), &constraint, None);
            black_box(info.node);
        })
    });

    // Inside a pillar, so the ring search has to walk outwards.
    group.bench_function("get_nearest_force", |b| {
        b.iter(|| {
            let info = graph.get_nearest_force(black_box(Vec3::new(32.5, 0.0, 32.5)), &constraint);
            black_box(info.node);
        })
    });

    group.finish();
}

fn bench_navmesh(c: &mut Criterion) {
    let side = 32;
    let source = quad_mesh(side);
    let scene = StaticScene::new();

    let mut group = c.benchmark_group("nav-graphs/navmesh");

    group.bench_function("scan_32x32", |b| {
        b.iter(|| {
            let mut mesh = NavMeshGraph::new(NavMeshSettings::default(), source.clone());
            let report = mesh.scan(&scene).expect("scan");
            black_box(report.connections);
        })
    });

    let mut accurate = NavMeshGraph::new(NavMeshSettings::default(), source.clone());
    accurate.scan(&scene).expect("scan");
    let mut fast = NavMeshGraph::new(
        NavMeshSettings {
            accurate_nearest_node: false,
            ..NavMeshSettings::default()
        },
        source,
    );
    fast.scan(&scene).expect("scan");
    let constraint = NodeConstraint::default();
    let query = Vec3::new(20.3, 1.0, 11.7);

    group.bench_function("get_nearest_accurate", |b| {
        b.iter(|| black_box(accurate.get_nearest(black_box(query), &constraint, None).node))
    });

    group.bench_function("get_nearest_fast", |b| {
        b.iter(|| black_box(fast.get_nearest(black_box(query), &constraint, None).node))
    });

    group.finish();
}

criterion_group!(benches, bench_grid, bench_navmesh);
criterion_main!(benches);
