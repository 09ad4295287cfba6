//! Regular lattice graph.
//!
//! Nodes sit at cell centers of a `width x depth` lattice placed in the world by
//! `matrix`. Each node stores an 8-bit mask of its lattice neighbours; the
//! neighbour offset and cost tables turn a direction bit into a node index and an
//! edge cost. Directions 0..4 are orthogonal (-z, +x, +z, -x), 4..8 diagonal.

mod connections;
mod erosion;
mod funnel;
mod link;
mod nearest;
mod update;

pub use link::GridLink;

use nav_core::{
    approximately, Connection, GraphBase, GraphCollision, GraphKind, GraphNode, Matrix4, NavError,
    NavGraph, NodeData, Physics, ScanReport, Vec3, MAX_TAG,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest lattice side, in nodes.
pub const MAX_GRID_SIDE: i32 = 1024;

pub const NEIGHBOUR_X_OFFSETS: [i32; 8] = [0, 1, 0, -1, 1, 1, -1, -1];
pub const NEIGHBOUR_Z_OFFSETS: [i32; 8] = [-1, 0, 1, 0, -1, 1, 1, -1];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum NumNeighbours {
    Four,
    #[default]
    Eight,
}

/// Persisted grid configuration.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GridGraphSettings {
    pub center: Vec3,
    /// Euler angles in degrees.
    pub rotation: Vec3,
    /// Requested world size along local x and z. Sign is ignored.
    pub unclamped_size: [f32; 2],
    pub node_size: f32,
    /// Stretch of a cell along local x.
    pub aspect_ratio: f32,
    /// Largest height step between neighbours, world units. `0` disables the check.
    pub max_climb: f32,
    /// Axis the climb is measured along (0 = x, 1 = y, 2 = z).
    pub max_climb_axis: usize,
    /// Steepest walkable slope in degrees. `90` disables the check.
    pub max_slope: f32,
    pub erode_iterations: u32,
    /// Tag eroded nodes instead of making them unwalkable.
    pub erosion_use_tags: bool,
    pub erosion_first_tag: u8,
    pub neighbours: NumNeighbours,
    /// Allow a diagonal when only one of its two orthogonal neighbours is connected.
    pub cut_corners: bool,
    pub penalty_position: bool,
    /// Subtracted from the fixed-point y coordinate before scaling.
    pub penalty_position_offset: f32,
    pub penalty_position_factor: f32,
    pub penalty_angle: bool,
    pub penalty_angle_factor: f32,
    pub auto_link_grids: bool,
    /// Longest cross-grid link, world units.
    pub auto_link_dist_limit: f32,
    /// Extra rings searched by `get_nearest_force` after a first hit.
    pub get_nearest_force_overlap: u32,
    pub collision: GraphCollision,
}

impl Default for GridGraphSettings {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            rotation: Vec3::ZERO,
            unclamped_size: [10.0, 10.0],
            node_size: 1.0,
            aspect_ratio: 1.0,
            max_climb: 0.4,
            max_climb_axis: 1,
            max_slope: 90.0,
            erode_iterations: 0,
            erosion_use_tags: false,
            erosion_first_tag: 1,
            neighbours: NumNeighbours::Eight,
            cut_corners: true,
            penalty_position: false,
            penalty_position_offset: 0.0,
            penalty_position_factor: 1.0,
            penalty_angle: false,
            penalty_angle_factor: 100.0,
            auto_link_grids: false,
            auto_link_dist_limit: 10.0,
            get_nearest_force_overlap: 2,
            collision: GraphCollision::default(),
        }
    }
}

impl GridGraphSettings {
    /// Slope sampling is only needed when slopes can be rejected.
    pub fn use_raycast_normal(&self) -> bool {
        (90.0 - self.max_slope).abs() > f32::EPSILON
    }

    fn validate(&self) -> Result<(), NavError> {
        if self.node_size <= 0.0 || self.node_size.is_nan() {
            return Err(NavError::InvalidNodeSize(self.node_size));
        }
        if self.erosion_use_tags {
            if self.erode_iterations + self.erosion_first_tag as u32 > MAX_TAG as u32 {
                return Err(NavError::ErosionTagOverflow {
                    iterations: self.erode_iterations,
                    first_tag: self.erosion_first_tag,
                });
            }
            if self.erosion_first_tag == 0 {
                return Err(NavError::InvalidErosionFirstTag);
            }
        }
        Ok(())
    }
}

/// Lattice dimensions and transforms derived from the settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub width: i32,
    pub depth: i32,
    /// Node size after clamping to `size / 1024`.
    pub node_size: f32,
    /// Clamped world size.
    pub size: [f32; 2],
    pub bounds_matrix: Matrix4,
    pub matrix: Matrix4,
    pub inverse_matrix: Matrix4,
    pub neighbour_offsets: [i32; 8],
    pub neighbour_costs: [u32; 8],
}

impl GridLayout {
    pub fn generate(settings: &GridGraphSettings) -> Self {
        let mut size = [settings.unclamped_size[0].abs(), settings.unclamped_size[1].abs()];

        let node_size = settings
            .node_size
            .max(size[0] / MAX_GRID_SIDE as f32)
            .max(size[1] / MAX_GRID_SIDE as f32);

        size[0] = size[0].max(node_size);
        size[1] = size[1].max(node_size);

        let bounds_matrix = Matrix4::trs(
            settings.center,
            settings.rotation,
            Vec3::new(settings.aspect_ratio, 1.0, 1.0),
        );

        let cells = |extent: f32| {
            let ratio = extent / node_size;
            if approximately(ratio, ratio.ceil()) {
                ratio.ceil() as i32
            } else {
                ratio.floor() as i32
            }
        };
        let width = cells(size[0]);
        let depth = cells(size[1]);

        let origin = bounds_matrix.multiply_point3x4(Vec3::new(size[0], 0.0, size[1]) * -0.5);
        let matrix = Matrix4::trs(
            origin,
            settings.rotation,
            Vec3::new(node_size * settings.aspect_ratio, 1.0, node_size),
        );

        let straight = nav_core::round_to_int(node_size * nav_core::Int3::FLOAT_PRECISION).max(0) as u32;
        let diagonal = nav_core::round_to_int(node_size * std::f32::consts::SQRT_2 * nav_core::Int3::FLOAT_PRECISION)
            .max(0) as u32;

        Self {
            width,
            depth,
            node_size,
            size,
            bounds_matrix,
            matrix,
            inverse_matrix: matrix.inverse(),
            neighbour_offsets: [
                -width,
                1,
                width,
                -1,
                -width + 1,
                width + 1,
                width - 1,
                -width - 1,
            ],
            neighbour_costs: [
                straight, straight, straight, straight, diagonal, diagonal, diagonal, diagonal,
            ],
        }
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            width: 0,
            depth: 0,
            node_size: 1.0,
            size: [0.0, 0.0],
            bounds_matrix: Matrix4::IDENTITY,
            matrix: Matrix4::IDENTITY,
            inverse_matrix: Matrix4::IDENTITY,
            neighbour_offsets: [0; 8],
            neighbour_costs: [0; 8],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridNode {
    pub data: NodeData,
    index: u32,
    connections: u8,
    /// Walkability before erosion.
    walkable_erosion: bool,
    /// Edges that are not lattice neighbours (links to other graphs).
    links: Vec<Connection>,
}

impl GridNode {
    fn new(index: usize, penalty: u32) -> Self {
        Self {
            data: NodeData::new(Default::default(), penalty),
            index: index as u32,
            connections: 0,
            walkable_erosion: true,
            links: Vec::new(),
        }
    }

    pub fn index(&self) -> usize {
        self.index as usize
    }

    pub fn has_connection(&self, dir: usize) -> bool {
        (self.connections >> dir) & 1 != 0
    }

    /// Raw neighbour mask, bit `d` for direction `d`.
    pub fn connection_mask(&self) -> u8 {
        self.connections
    }

    pub fn walkable_erosion(&self) -> bool {
        self.walkable_erosion
    }

    pub fn links(&self) -> &[Connection] {
        &self.links
    }
}

impl GraphNode for GridNode {
    fn data(&self) -> &NodeData {
        &self.data
    }

    fn data_mut(&mut self) -> &mut NodeData {
        &mut self.data
    }
}

#[derive(Debug, Clone, Default)]
pub struct GridGraph {
    pub base: GraphBase,
    pub settings: GridGraphSettings,
    layout: GridLayout,
    nodes: Vec<GridNode>,
}

impl GridGraph {
    pub fn new(settings: GridGraphSettings) -> Self {
        let mut graph = Self {
            base: GraphBase::named("Grid Graph"),
            settings,
            layout: GridLayout::default(),
            nodes: Vec::new(),
        };
        graph.generate_matrix();
        graph
    }

    /// Recomputes dimensions and transforms from the settings. Nodes are untouched.
    pub fn generate_matrix(&mut self) {
        self.layout = GridLayout::generate(&self.settings);
        self.base.matrix = self.layout.matrix;
    }

    /// Sets the requested size so the lattice has exactly `width x depth` nodes.
    pub fn update_size_from_width_depth(&mut self, width: i32, depth: i32) {
        self.settings.unclamped_size = [
            width as f32 * self.settings.node_size,
            depth as f32 * self.settings.node_size,
        ];
        self.generate_matrix();
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    pub fn width(&self) -> i32 {
        self.layout.width
    }

    pub fn depth(&self) -> i32 {
        self.layout.depth
    }

    pub fn node_size(&self) -> f32 {
        self.layout.node_size
    }

    pub fn matrix(&self) -> &Matrix4 {
        &self.layout.matrix
    }

    pub fn inverse_matrix(&self) -> &Matrix4 {
        &self.layout.inverse_matrix
    }

    pub fn grid_nodes(&self) -> &[GridNode] {
        &self.nodes
    }

    pub fn grid_node(&self, index: usize) -> Option<&GridNode> {
        self.nodes.get(index)
    }

    pub fn node_index(&self, x: i32, z: i32) -> Option<usize> {
        self.in_bounds(x, z).then(|| (z * self.layout.width + x) as usize)
    }

    pub fn node_at(&self, x: i32, z: i32) -> Option<&GridNode> {
        self.node_index(x, z).and_then(|i| self.nodes.get(i))
    }

    pub fn node_at_mut(&mut self, x: i32, z: i32) -> Option<&mut GridNode> {
        self.node_index(x, z).and_then(move |i| self.nodes.get_mut(i))
    }

    pub fn in_bounds(&self, x: i32, z: i32) -> bool {
        x >= 0 && z >= 0 && x < self.layout.width && z < self.layout.depth
    }

    /// Lattice coordinates of a node index.
    pub fn coords(&self, index: usize) -> (i32, i32) {
        let i = index as i32;
        (i % self.layout.width, i / self.layout.width)
    }

    /// World position of the center of cell `(x, z)` on the graph plane.
    pub fn cell_center(&self, x: i32, z: i32) -> Vec3 {
        self.layout
            .matrix
            .multiply_point3x4(Vec3::new(x as f32 + 0.5, 0.0, z as f32 + 0.5))
    }

    fn has_valid_nodes(&self) -> bool {
        !self.nodes.is_empty() && self.nodes.len() == (self.layout.width * self.layout.depth) as usize
    }

    /// Sets walkability directly, keeping the pre-erosion copy in sync.
    ///
    /// Connections are not recomputed; call `calculate_connections_for` afterwards.
    pub fn set_walkable(&mut self, x: i32, z: i32, walkable: bool) {
        if let Some(node) = self.node_at_mut(x, z) {
            node.data.walkable = walkable;
            node.walkable_erosion = walkable;
        }
    }

    fn count_walkable(&self) -> usize {
        self.nodes.iter().filter(|n| n.data.walkable).count()
    }
}

impl NavGraph for GridGraph {
    fn base(&self) -> &GraphBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut GraphBase {
        &mut self.base
    }

    fn kind(&self) -> GraphKind {
        GraphKind::Grid
    }

    fn scan(&mut self, physics: &dyn Physics) -> Result<ScanReport, NavError> {
        self.settings.validate()?;

        let layout = GridLayout::generate(&self.settings);
        if layout.width > MAX_GRID_SIDE || layout.depth > MAX_GRID_SIDE {
            return Err(NavError::GridTooLarge {
                width: layout.width,
                depth: layout.depth,
            });
        }

        self.layout = layout;
        self.base.matrix = layout.matrix;

        let (width, depth) = (layout.width, layout.depth);
        let initial_penalty = self.base.initial_penalty;
        self.nodes = (0..(width * depth) as usize)
            .map(|i| GridNode::new(i, initial_penalty))
            .collect();

        let collision = self.settings.collision.clone();
        let prepared = collision.prepare(&layout.matrix, layout.node_size);

        for z in 0..depth {
            for x in 0..width {
                self.update_node_position_collision(x, z, &prepared, physics, true);
            }
        }

        for z in 0..depth {
            for x in 0..width {
                self.calculate_connections(x, z);
            }
        }

        self.erode_walkable_area(0, 0, width, depth);
        self.base.bump_generation();

        let report = ScanReport {
            nodes: self.nodes.len(),
            walkable: self.count_walkable(),
            connections: (0..self.nodes.len()).map(|i| self.connection_count(i)).sum(),
            ..ScanReport::default()
        };
        tracing::debug!(
            graph = %self.base.name,
            width,
            depth,
            node_size = layout.node_size,
            walkable = report.walkable,
            "Scanned grid graph"
        );
        Ok(report)
    }

    fn node_count(&self) -> usize {
        if self.has_valid_nodes() {
            self.nodes.len()
        } else {
            0
        }
    }

    fn node(&self, index: usize) -> Option<&NodeData> {
        self.nodes.get(index).map(|n| &n.data)
    }

    fn node_mut(&mut self, index: usize) -> Option<&mut NodeData> {
        self.nodes.get_mut(index).map(|n| &mut n.data)
    }

    fn connections(&self, index: usize) -> Vec<Connection> {
        let Some(node) = self.nodes.get(index) else {
            return Vec::new();
        };
        let mut out: Vec<Connection> = (0..8)
            .filter(|&dir| node.has_connection(dir))
            .map(|dir| {
                let other = (index as i32 + self.layout.neighbour_offsets[dir]) as usize;
                Connection::new(self.base.node_ref(other), self.layout.neighbour_costs[dir])
            })
            .collect();
        out.extend_from_slice(&node.links);
        out
    }

    fn add_connection(&mut self, index: usize, connection: Connection) {
        if let Some(node) = self.nodes.get_mut(index) {
            nav_core::upsert_connection(&mut node.links, connection.target, connection.cost);
        }
    }

    fn get_nearest(
        &self,
        position: Vec3,
        _constraint: &dyn nav_core::NnConstraint,
        _hint: Option<nav_core::NodeRef>,
    ) -> nav_core::NnInfo {
        self.nearest_cell(position)
    }

    fn get_nearest_force(&self, position: Vec3, constraint: &dyn nav_core::NnConstraint) -> nav_core::NnInfo {
        self.nearest_force(position, constraint)
    }

    /// Moves the nodes and re-targets the lattice transform so cell lookups and
    /// physics resampling follow them. The settings are untouched; a rescan
    /// places the grid back where the settings say.
    fn relocate_nodes(&mut self, old: &Matrix4, new: &Matrix4) {
        nav_core::relocate_linear(self, old, new);
        self.layout.matrix = *new;
        self.layout.inverse_matrix = new.inverse();
    }
}

impl GridGraph {
    fn connection_count(&self, index: usize) -> usize {
        self.nodes
            .get(index)
            .map(|n| n.connections.count_ones() as usize + n.links.len())
            .unwrap_or(0)
    }
}
