//! Obstacle and ground sampling settings shared by lattice-style graphs.

use crate::geometry::nearest_point_on_line;
use crate::math::{Matrix4, Vec3};
use crate::physics::{LayerMask, Physics, RaycastHit};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Extra length added to the height probe so a hit exactly at the bottom is not missed.
pub const RAYCAST_ERROR_MARGIN: f32 = 0.005;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ColliderType {
    Sphere,
    #[default]
    Capsule,
    Ray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RayDirection {
    /// From the bottom upwards.
    Up,
    /// From the top downwards.
    Down,
    #[default]
    Both,
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GraphCollision {
    pub collider: ColliderType,
    /// Collider diameter in node-size units.
    pub diameter: f32,
    pub height: f32,
    /// Shift of the collider along the graph's up axis.
    pub collision_offset: f32,
    pub ray_direction: RayDirection,
    /// Layers treated as obstacles.
    pub mask: LayerMask,
    /// Layers treated as ground.
    pub height_mask: LayerMask,
    /// Start height of the downward ground probe.
    pub from_height: f32,
    pub thick_raycast: bool,
    /// Thick probe diameter in node-size units.
    pub thick_raycast_diameter: f32,
    pub collision_check: bool,
    /// When off, nodes stay on the graph plane.
    pub height_check: bool,
    pub unwalkable_when_no_ground: bool,
}

impl Default for GraphCollision {
    fn default() -> Self {
        Self {
            collider: ColliderType::Capsule,
            diameter: 1.0,
            height: 2.0,
            collision_offset: 0.0,
            ray_direction: RayDirection::Both,
            mask: LayerMask::NONE,
            height_mask: LayerMask::ALL,
            from_height: 100.0,
            thick_raycast: false,
            thick_raycast_diameter: 1.0,
            collision_check: true,
            height_check: true,
            unwalkable_when_no_ground: true,
        }
    }
}

/// Result of a ground probe.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightSample {
    pub position: Vec3,
    pub hit: Option<RaycastHit>,
    pub walkable: bool,
}

impl GraphCollision {
    /// Binds the settings to a graph transform and node scale.
    pub fn prepare(&self, matrix: &Matrix4, scale: f32) -> PreparedCollision<'_> {
        let up = matrix.multiply_vector(Vec3::UP);
        PreparedCollision {
            settings: self,
            up,
            up_height: up * self.height,
            final_radius: self.diameter * scale * 0.5,
            final_raycast_radius: self.thick_raycast_diameter * scale * 0.5,
        }
    }
}

/// `GraphCollision` resolved against a graph transform.
#[derive(Debug, Clone, Copy)]
pub struct PreparedCollision<'a> {
    settings: &'a GraphCollision,
    pub up: Vec3,
    up_height: Vec3,
    pub final_radius: f32,
    pub final_raycast_radius: f32,
}

impl PreparedCollision<'_> {
    /// `true` when nothing on the obstacle mask overlaps the collider at `position`.
    pub fn check(&self, physics: &dyn Physics, position: Vec3) -> bool {
        let s = self.settings;
        if !s.collision_check {
            return true;
        }

        let position = position + self.up * s.collision_offset;
        match s.collider {
            ColliderType::Capsule => {
                !physics.check_capsule(position, position + self.up_height, self.final_radius, s.mask)
            }
            ColliderType::Sphere => !physics.check_sphere(position, self.final_radius, s.mask),
            ColliderType::Ray => {
                let up_hit = || physics.raycast(position, self.up, s.height, s.mask).is_some();
                let down_hit = || {
                    physics
                        .raycast(position + self.up_height, -self.up, s.height, s.mask)
                        .is_some()
                };
                match s.ray_direction {
                    RayDirection::Both => !up_hit() && !down_hit(),
                    RayDirection::Up => !up_hit(),
                    RayDirection::Down => !down_hit(),
                }
            }
        }
    }

    /// Drops `position` onto the ground below it.
    ///
    /// Without a hit the position is returned unchanged and the sample is walkable
    /// unless `unwalkable_when_no_ground` is set.
    pub fn check_height(&self, physics: &dyn Physics, position: Vec3) -> HeightSample {
        let s = self.settings;
        if !s.height_check {
            return HeightSample {
                position,
                hit: None,
                walkable: true,
            };
        }

        let origin = position + self.up * s.from_height;
        let length = s.from_height + RAYCAST_ERROR_MARGIN;
        let hit = if s.thick_raycast {
            physics
                .sphere_cast(origin, self.final_raycast_radius, -self.up, length, s.height_mask)
                .map(|hit| {
                    let point = nearest_point_on_line(origin, origin - self.up, hit.point);
                    (point, hit)
                })
        } else {
            physics
                .raycast(origin, -self.up, length, s.height_mask)
                .map(|hit| (hit.point, hit))
        };

        match hit {
            Some((point, hit)) => HeightSample {
                position: point,
                hit: Some(hit),
                walkable: true,
            },
            None => HeightSample {
                position,
                hit: None,
                walkable: !s.unwalkable_when_no_ground,
            },
        }
    }
}
