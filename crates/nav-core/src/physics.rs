use crate::math::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Bit set of collider layers a query considers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(u32::MAX);

    pub const fn layer(layer: u32) -> Self {
        Self(1 << layer)
    }

    pub fn includes(self, layer: u32) -> bool {
        layer < 32 && (self.0 >> layer) & 1 != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::NONE
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Collision oracle supplied by the host world.
///
/// Overlap checks return `true` when something on `mask` overlaps the volume.
/// Casts take a unit `direction` and report the first hit within `max_distance`.
pub trait Physics {
    fn check_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool;

    fn check_capsule(&self, start: Vec3, end: Vec3, radius: f32, mask: LayerMask) -> bool;

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit>;

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit>;
}

/// Empty world: nothing overlaps, nothing is hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPhysics;

impl Physics for NoPhysics {
    fn check_sphere(&self, _center: Vec3, _radius: f32, _mask: LayerMask) -> bool {
        false
    }

    fn check_capsule(&self, _start: Vec3, _end: Vec3, _radius: f32, _mask: LayerMask) -> bool {
        false
    }

    fn raycast(&self, _: Vec3, _: Vec3, _: f32, _: LayerMask) -> Option<RaycastHit> {
        None
    }

    fn sphere_cast(&self, _: Vec3, _: f32, _: Vec3, _: f32, _: LayerMask) -> Option<RaycastHit> {
        None
    }
}
