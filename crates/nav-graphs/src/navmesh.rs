//! Triangle mesh graph: one node per triangle, edges between triangles sharing an edge.

use std::collections::HashMap;

use nav_core::geometry::{
    closest_point_on_triangle, is_clockwise, is_colinear, segments_intersect_xz, triangle_contains_xz,
};
use nav_core::{
    Connection, FunnelGraph, GraphBase, GraphKind, GraphNode, GraphUpdateObject, Int3, Matrix4, NavError,
    NavGraph, NnConstraint, NnInfo, NodeConstraint, NodeData, NodeRef, NodeSnapshot, Physics, ScanReport,
    UpdatableGraph, Vec3,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Raw mesh: vertex positions in graph-local space and a flat list of triangle indices.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeshSource {
    pub vertices: Vec<Vec3>,
    pub triangles: Vec<u32>,
}

impl MeshSource {
    pub fn new(vertices: Vec<Vec3>, triangles: Vec<u32>) -> Self {
        Self { vertices, triangles }
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NavMeshSettings {
    pub offset: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    pub scale: f32,
    /// Use the closest point on every triangle instead of the XZ containment test.
    pub accurate_nearest_node: bool,
}

impl Default for NavMeshSettings {
    fn default() -> Self {
        Self {
            offset: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            accurate_nearest_node: true,
        }
    }
}

impl NavMeshSettings {
    pub fn matrix(&self) -> Matrix4 {
        Matrix4::trs(self.offset, self.rotation, Vec3::new(self.scale, self.scale, self.scale))
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeshNode {
    pub data: NodeData,
    /// Indices into the graph's welded vertex buffer, clockwise in XZ.
    pub vertices: [u32; 3],
    connections: Vec<Connection>,
}

impl MeshNode {
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }
}

impl GraphNode for MeshNode {
    fn data(&self) -> &NodeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }
}

#[derive(Debug, Clone, Default)]
pub struct NavMeshGraph {
    pub base: GraphBase,
    pub settings: NavMeshSettings,
    pub source: Option<MeshSource>,
    vertices: Vec<Int3>,
    /// Local-space position of each welded vertex, kept for relocation.
    source_vertices: Vec<Vec3>,
    nodes: Vec<MeshNode>,
}

impl NavMeshGraph {
    pub fn new(settings: NavMeshSettings, source: MeshSource) -> Self {
        Self {
            base: GraphBase::named("NavMesh Graph"),
            settings,
            source: Some(source),
            ..Self::default()
        }
    }

    pub fn generate_matrix(&mut self) {
        self.base.matrix = self.settings.matrix();
    }

    pub fn vertices(&self) -> &[Int3] {
        &self.vertices
    }

    pub fn mesh_nodes(&self) -> &[MeshNode] {
        &self.nodes
    }

    pub fn mesh_node(&self, index: usize) -> Option<&MeshNode> {
        self.nodes.get(index)
    }

    fn triangle(&self, node: &MeshNode) -> [Vec3; 3] {
        node.vertices.map(|v| self.vertices[v as usize].to_vec3())
    }

    /// Whether `position` lies inside the node's triangle in XZ, edges included.
    pub fn contains_point(&self, index: usize, position: Vec3) -> bool {
        let Some(node) = self.nodes.get(index) else {
            return false;
        };
        let [a, b, c] = self.triangle(node);
        triangle_contains_xz(a, b, c, position)
    }

    pub fn closest_point_on_node(&self, index: usize, position: Vec3) -> Option<Vec3> {
        let node = self.nodes.get(index)?;
        let [a, b, c] = self.triangle(node);
        Some(closest_point_on_triangle(a, b, c, position))
    }

    /// Linear search over every triangle, tracking the closest node overall and
    /// the closest node accepted by `constraint` within its distance limit.
    ///
    /// Fast mode ranks in fixed-point units: a triangle containing the query in XZ
    /// scores its height difference, any other triangle the squared distance to
    /// its center. The distance limit is always checked in world units.
    pub fn nearest_both(&self, position: Vec3, constraint: &dyn NnConstraint) -> NnInfo {
        if self.nodes.is_empty() {
            return NnInfo::EMPTY;
        }

        let pos = Int3::from(position);
        let rounded = pos.to_vec3();
        let max_dist_sqr = constraint.distance_limit_sqr();
        let accurate = self.settings.accurate_nearest_node;
        let precision_sqr = (Int3::FLOAT_PRECISION * Int3::FLOAT_PRECISION) as f64;

        let mut min: Option<(usize, f64)> = None;
        let mut min_const: Option<(usize, f64)> = None;

        for (index, node) in self.nodes.iter().enumerate() {
            let (score, dist_sqr) = if accurate {
                let [a, b, c] = self.triangle(node);
                let d = rounded.distance_squared(closest_point_on_triangle(a, b, c, position));
                (d as f64, d)
            } else {
                let [v1, v2, v3] = node.vertices.map(|v| self.vertices[v as usize]);
                let inside = is_clockwise(v1, v2, pos) && is_clockwise(v2, v3, pos) && is_clockwise(v3, v1, pos);
                if inside {
                    let dy = (node.data.position.y as i64 - pos.y as i64).abs();
                    let world = dy as f32 * Int3::PRECISION_FACTOR;
                    (dy as f64, world * world)
                } else {
                    let d = (node.data.position - pos).sqr_magnitude();
                    (d, (d / precision_sqr) as f32)
                }
            };

            if min.map_or(true, |(_, s)| score < s) {
                min = Some((index, score));
            }
            if dist_sqr < max_dist_sqr
                && constraint.suitable(&node.data)
                && min_const.map_or(true, |(_, s)| score < s)
            {
                min_const = Some((index, score));
            }
        }

        let mut info = NnInfo::EMPTY;
        if let Some((index, _)) = min {
            let clamped = self.closest_point_on_node(index, position).unwrap_or(position);
            info = NnInfo::new(self.base.node_ref(index), clamped);
        }
        if let Some((index, _)) = min_const {
            let clamped = self.closest_point_on_node(index, position).unwrap_or(position);
            info.set_constrained(self.base.node_ref(index), clamped);
        }
        info
    }

    fn recompute_costs(&mut self) {
        let own = self.base.index;
        let positions: Vec<Int3> = self.nodes.iter().map(|n| n.data.position).collect();
        for node in &mut self.nodes {
            let from = node.data.position;
            for connection in &mut node.connections {
                if connection.target.graph == own {
                    connection.cost = (from - positions[connection.target.slot()]).cost_magnitude();
                }
            }
        }
    }

    /// Whether the triangle overlaps the XZ rectangle of `bounds`.
    fn overlaps_rect(&self, node: &MeshNode, min: Vec3, max: Vec3) -> bool {
        let triangle = self.triangle(node);

        let mut inside = false;
        let (mut all_left, mut all_right, mut all_below, mut all_above) = (0, 0, 0, 0);
        for vert in triangle {
            if vert.x >= min.x && vert.x < max.x && vert.z >= min.z && vert.z < max.z {
                inside = true;
                break;
            }
            all_left += (vert.x < min.x) as u32;
            all_right += (vert.x > max.x) as u32;
            all_below += (vert.z < min.z) as u32;
            all_above += (vert.z > max.z) as u32;
        }
        if inside {
            return true;
        }
        if all_left == 3 || all_right == 3 || all_below == 3 || all_above == 3 {
            return false;
        }

        let a = Vec3::new(min.x, 0.0, min.z);
        let b = Vec3::new(min.x, 0.0, max.z);
        let c = Vec3::new(max.x, 0.0, min.z);
        let d = Vec3::new(max.x, 0.0, max.z);

        for v in 0..3 {
            let (p1, p2) = (triangle[v], triangle[(v + 1) % 3]);
            if [(a, b), (a, c), (c, d), (d, b)]
                .iter()
                .any(|&(s, e)| segments_intersect_xz(s, e, p1, p2))
            {
                return true;
            }
        }

        let [t1, t2, t3] = triangle;
        [a, b, c, d].iter().any(|&corner| triangle_contains_xz(t1, t2, t3, corner))
    }
}

struct WeldedMesh {
    vertices: Vec<Int3>,
    source_vertices: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
}

/// Merges vertices that land on the same fixed-point position, in first-seen order.
fn weld(source: &MeshSource, matrix: &Matrix4) -> Result<WeldedMesh, NavError> {
    let vertex_count = source.vertices.len();
    if let Some(&bad) = source.triangles.iter().find(|&&t| t as usize >= vertex_count) {
        return Err(NavError::InvalidTriangleIndex {
            index: bad as usize,
            vertex_count,
        });
    }

    let mut lookup: HashMap<Int3, u32> = HashMap::with_capacity(vertex_count);
    let mut vertices = Vec::new();
    let mut source_vertices = Vec::new();
    let mut remap = Vec::with_capacity(vertex_count);

    for &v in &source.vertices {
        let p = Int3::from(matrix.multiply_point3x4(v));
        let index = *lookup.entry(p).or_insert_with(|| {
            vertices.push(p);
            source_vertices.push(v);
            (vertices.len() - 1) as u32
        });
        remap.push(index);
    }

    let triangles = source
        .triangles
        .chunks_exact(3)
        .map(|t| [remap[t[0] as usize], remap[t[1] as usize], remap[t[2] as usize]])
        .collect();

    Ok(WeldedMesh {
        vertices,
        source_vertices,
        triangles,
    })
}

fn shared_vertex_count(a: &[u32; 3], b: &[u32; 3]) -> usize {
    a.iter().map(|v| b.iter().filter(|w| *w == v).count()).sum()
}

impl NavGraph for NavMeshGraph {
    fn base(&self) -> &GraphBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GraphBase {
        &mut self.base
    }

    fn kind(&self) -> GraphKind {
        GraphKind::NavMesh
    }

    fn scan(&mut self, _physics: &dyn Physics) -> Result<ScanReport, NavError> {
        let Some(source) = &self.source else {
            tracing::warn!(graph = %self.base.name, "Navmesh graph has no source mesh, nothing to scan");
            return Ok(ScanReport::default());
        };

        let matrix = self.settings.matrix();
        let welded = weld(source, &matrix)?;
        let vertices = &welded.vertices;

        let mut report = ScanReport::default();
        let mut nodes: Vec<MeshNode> = welded
            .triangles
            .iter()
            .map(|&[v1, v2, v3]| {
                let (p1, p2, p3) = (vertices[v1 as usize], vertices[v2 as usize], vertices[v3 as usize]);
                let mut data = NodeData::new((p1 + p2 + p3).div_round(3.0), self.base.initial_penalty);
                data.walkable = true;

                let mut corners = [v1, v2, v3];
                if !is_clockwise(p1, p2, p3) {
                    corners.swap(0, 2);
                }
                if is_colinear(p1, p2, p3) {
                    report.colinear_triangles += 1;
                }
                MeshNode {
                    data,
                    vertices: corners,
                    connections: Vec::new(),
                }
            })
            .collect();

        let graph = self.base.index;
        for i in 0..welded.triangles.len() {
            let mut connections = Vec::new();
            for j in 0..welded.triangles.len() {
                if i == j {
                    continue;
                }
                match shared_vertex_count(&welded.triangles[i], &welded.triangles[j]) {
                    n if n >= 3 => report.identical_triangles += 1,
                    2 => {
                        let cost = (nodes[i].data.position - nodes[j].data.position).cost_magnitude();
                        connections.push(Connection::new(NodeRef::new(graph, j as u32), cost));
                    }
                    _ => {}
                }
            }
            nodes[i].connections = connections;
        }

        if report.identical_triangles > 0 {
            tracing::warn!(
                graph = %self.base.name,
                identical = report.identical_triangles,
                "Navmesh contains identical triangles; increasing the mesh scale might help"
            );
        }
        if report.colinear_triangles > 0 {
            tracing::warn!(
                graph = %self.base.name,
                colinear = report.colinear_triangles,
                "Navmesh contains degenerate triangles"
            );
        }

        report.nodes = nodes.len();
        report.walkable = nodes.len();
        report.connections = nodes.iter().map(|n| n.connections.len()).sum();

        self.base.matrix = matrix;
        self.vertices = welded.vertices;
        self.source_vertices = welded.source_vertices;
        self.nodes = nodes;
        self.base.bump_generation();

        tracing::debug!(
            graph = %self.base.name,
            vertices = self.vertices.len(),
            nodes = report.nodes,
            connections = report.connections,
            "Scanned navmesh graph"
        );
        Ok(report)
    }

    fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn node(&self, index: usize) -> Option<&NodeData> {
        self.nodes.get(index).map(|n| &n.data)
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut NodeData> {
        self.nodes.get_mut(index).map(|n| &mut n.data)
    }

    fn connections(&self, index: usize) -> Vec<Connection> {
        self.nodes
            .get(index)
            .map(|n| n.connections.clone())
            .unwrap_or_default()
    }

    fn add_connection(&mut self, index: usize, connection: Connection) {
        if let Some(node) = self.nodes.get_mut(index) {
            nav_core::upsert_connection(&mut node.connections, connection.target, connection.cost);
        }
    }

    /// Closest node ignoring the constraint, with the constrained candidate filled in.
    fn get_nearest(&self, position: Vec3, _constraint: &dyn NnConstraint, _hint: Option<NodeRef>) -> NnInfo {
        self.nearest_both(position, &NodeConstraint::none())
    }

    fn get_nearest_force(&self, position: Vec3, constraint: &dyn NnConstraint) -> NnInfo {
        self.nearest_both(position, constraint).into_constrained()
    }

    /// Rebuilds vertex positions from the local-space source with `new`; `old` is unused.
    fn relocate_nodes(&mut self, _old: &Matrix4, new: &Matrix4) {
        if self.vertices.is_empty() || self.source_vertices.len() != self.vertices.len() {
            return;
        }
        self.vertices = self
            .source_vertices
            .iter()
            .map(|&v| Int3::from(new.multiply_point3x4(v)))
            .collect();

        let vertices = &self.vertices;
        for node in &mut self.nodes {
            let [a, b, c] = node.vertices.map(|v| vertices[v as usize]);
            node.data.position = (a + b + c).div_round(3.0);
        }
        self.recompute_costs();

        self.base.matrix = *new;
        self.base.bump_generation();
    }
}

impl FunnelGraph for NavMeshGraph {
    /// Portals between consecutive triangles, keeping each side on the vertex it
    /// shared with the previous portal so the corridor never crosses itself.
    fn build_funnel_corridor(
        &self,
        path: &[usize],
        start: usize,
        end: usize,
        left: &mut Vec<Vec3>,
        right: &mut Vec<Vec3>,
    ) {
        let end = end.min(path.len().saturating_sub(1));
        let mut last_left: Option<u32> = None;
        let mut last_right: Option<u32> = None;

        for i in start..end {
            let (Some(n1), Some(n2)) = (self.nodes.get(path[i]), self.nodes.get(path[i + 1])) else {
                continue;
            };

            let mut first = None;
            let mut second = None;
            for &v1 in &n1.vertices {
                for &v2 in &n2.vertices {
                    if v1 == v2 {
                        if first.is_some() {
                            second = Some(v2);
                            break;
                        }
                        first = Some(v2);
                    }
                }
            }

            let (Some(first), Some(second)) = (first, second) else {
                let (p1, p2) = (n1.data.world_position(), n2.data.world_position());
                left.extend([p1, p2]);
                right.extend([p1, p2]);
                last_left = first;
                last_right = second;
                continue;
            };

            let (l, r) = if Some(first) == last_left {
                (first, second)
            } else if Some(first) == last_right || Some(second) == last_left {
                (second, first)
            } else {
                (first, second)
            };
            left.push(self.vertices[l as usize].to_vec3());
            right.push(self.vertices[r as usize].to_vec3());
            last_left = Some(l);
            last_right = Some(r);
        }
    }

    /// Shared edge of two triangles, in the order the corridor builder would emit it.
    fn add_portal(&self, n1: usize, n2: usize, left: &mut Vec<Vec3>, right: &mut Vec<Vec3>) {
        self.build_funnel_corridor(&[n1, n2], 0, 1, left, right);
    }
}

impl UpdatableGraph for NavMeshGraph {
    /// Applies `update` to every triangle overlapping the XZ rectangle of its bounds.
    fn update_area(&mut self, update: &mut GraphUpdateObject, _physics: &dyn Physics) {
        if self.nodes.is_empty() {
            tracing::warn!(graph = %self.base.name, "Navmesh graph is not scanned, cannot update area");
            return;
        }

        let (min, max) = (update.bounds.min(), update.bounds.max());
        let touched: Vec<usize> = (0..self.nodes.len())
            .filter(|&i| self.overlaps_rect(&self.nodes[i], min, max))
            .collect();

        for &index in &touched {
            if let Some(snapshot) = self.snapshot_node(index) {
                update.will_update_node(snapshot);
            }
            update.apply(&mut self.nodes[index].data);
        }

        if !touched.is_empty() {
            self.base.bump_generation();
        }
        tracing::trace!(graph = %self.base.name, touched = touched.len(), "Updated navmesh area");
    }

    fn snapshot_node(&self, index: usize) -> Option<NodeSnapshot> {
        let node = self.nodes.get(index)?;
        Some(NodeSnapshot {
            node: self.base.node_ref(index),
            data: node.data,
            extra: 0,
        })
    }

    fn restore_node(&mut self, snapshot: &NodeSnapshot) {
        if let Some(node) = self.nodes.get_mut(snapshot.node.slot()) {
            node.data = snapshot.data;
        }
    }
}
