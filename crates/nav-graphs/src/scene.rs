//! In-memory collision world of planes, boxes and spheres.

use nav_core::{LayerMask, Physics, RaycastHit, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

const CONTACT_EPSILON: f32 = 1e-5;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Shape {
    /// Solid half-space below the plane through `point` facing `normal`.
    Plane { point: Vec3, normal: Vec3 },
    /// Axis-aligned box.
    Box { center: Vec3, half_extents: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl Shape {
    /// Signed distance from `p` to the surface, negative inside.
    pub fn distance(&self, p: Vec3) -> f32 {
        match *self {
            Shape::Plane { point, normal } => (p - point).dot(normal.normalize_or_zero()),
            Shape::Box { center, half_extents } => {
                let d = p - center;
                let q = Vec3::new(
                    d.x.abs() - half_extents.x,
                    d.y.abs() - half_extents.y,
                    d.z.abs() - half_extents.z,
                );
                let outside = q.max(Vec3::ZERO).length();
                let inside = q.x.max(q.y).max(q.z).min(0.0);
                outside + inside
            }
            Shape::Sphere { center, radius } => (p - center).length() - radius,
        }
    }

    fn inflated(&self, r: f32) -> Shape {
        match *self {
            Shape::Plane { point, normal } => Shape::Plane {
                point: point + normal.normalize_or_zero() * r,
                normal,
            },
            Shape::Box { center, half_extents } => Shape::Box {
                center,
                half_extents: half_extents + Vec3::ONE * r,
            },
            Shape::Sphere { center, radius } => Shape::Sphere {
                center,
                radius: radius + r,
            },
        }
    }

    /// First entry of the ray into the shape. Rays starting inside never hit.
    pub fn raycast(&self, origin: Vec3, dir: Vec3, max_distance: f32) -> Option<RaycastHit> {
        if self.distance(origin) <= 0.0 {
            return None;
        }
        let (t, normal) = match *self {
            Shape::Plane { point, normal } => {
                let n = normal.normalize_or_zero();
                let denom = dir.dot(n);
                if denom >= 0.0 {
                    return None;
                }
                (-(origin - point).dot(n) / denom, n)
            }
            Shape::Sphere { center, radius } => {
                let oc = origin - center;
                let b = oc.dot(dir);
                let c = oc.length_squared() - radius * radius;
                let disc = b * b - c;
                if disc < 0.0 {
                    return None;
                }
                let t = -b - disc.sqrt();
                if t < 0.0 {
                    return None;
                }
                (t, (origin + dir * t - center).normalize_or_zero())
            }
            Shape::Box { center, half_extents } => slab(origin - center, dir, half_extents)?,
        };
        if t > max_distance {
            return None;
        }
        Some(RaycastHit {
            point: origin + dir * t,
            normal,
            distance: t,
        })
    }
}

/// Ray against a box centered at the origin. Returns entry distance and face normal.
fn slab(origin: Vec3, dir: Vec3, half: Vec3) -> Option<(f32, Vec3)> {
    let mut t_enter = f32::NEG_INFINITY;
    let mut t_exit = f32::INFINITY;
    let mut normal = Vec3::ZERO;

    for axis in 0..3 {
        let (o, d, h) = (origin[axis], dir[axis], half[axis]);
        if d.abs() < f32::EPSILON {
            if o < -h || o > h {
                return None;
            }
            continue;
        }
        let mut t1 = (-h - o) / d;
        let mut t2 = (h - o) / d;
        let mut sign = -1.0;
        if t1 > t2 {
            std::mem::swap(&mut t1, &mut t2);
            sign = 1.0;
        }
        if t1 > t_enter {
            t_enter = t1;
            normal = axis_vector(axis) * sign;
        }
        t_exit = t_exit.min(t2);
        if t_enter > t_exit {
            return None;
        }
    }

    (t_enter >= 0.0).then_some((t_enter, normal))
}

fn axis_vector(axis: usize) -> Vec3 {
    match axis {
        0 => Vec3::RIGHT,
        1 => Vec3::UP,
        _ => Vec3::FORWARD,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Collider {
    pub shape: Shape,
    #[cfg_attr(feature = "serde", serde(default))]
    pub layer: u32,
}

/// A fixed set of colliders answering overlap and cast queries.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StaticScene {
    pub colliders: Vec<Collider>,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, shape: Shape, layer: u32) -> &mut Self {
        self.colliders.push(Collider { shape, layer });
        self
    }

    /// Horizontal ground plane at `height`.
    pub fn with_ground(mut self, height: f32, layer: u32) -> Self {
        self.add(
            Shape::Plane {
                point: Vec3::new(0.0, height, 0.0),
                normal: Vec3::UP,
            },
            layer,
        );
        self
    }

    pub fn with_box(mut self, center: Vec3, size: Vec3, layer: u32) -> Self {
        self.add(
            Shape::Box {
                center,
                half_extents: size * 0.5,
            },
            layer,
        );
        self
    }

    pub fn with_sphere(mut self, center: Vec3, radius: f32, layer: u32) -> Self {
        self.add(Shape::Sphere { center, radius }, layer);
        self
    }

    fn in_mask(&self, mask: LayerMask) -> impl Iterator<Item = &Collider> + '_ {
        self.colliders.iter().filter(move |c| mask.includes(c.layer))
    }
}

/// Minimum of a convex function on `[0, 1]`.
fn min_on_segment(f: impl Fn(f32) -> f32) -> f32 {
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    for _ in 0..48 {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if f(m1) < f(m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    f(0.0).min(f(1.0)).min(f((lo + hi) * 0.5))
}

impl Physics for StaticScene {
    fn check_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> bool {
        self.in_mask(mask)
            .any(|c| c.shape.distance(center) <= radius + CONTACT_EPSILON)
    }

    fn check_capsule(&self, start: Vec3, end: Vec3, radius: f32, mask: LayerMask) -> bool {
        self.in_mask(mask).any(|c| {
            let closest = min_on_segment(|t| c.shape.distance(start + (end - start) * t));
            closest <= radius + CONTACT_EPSILON
        })
    }

    fn raycast(&self, origin: Vec3, direction: Vec3, max_distance: f32, mask: LayerMask) -> Option<RaycastHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        self.in_mask(mask)
            .filter_map(|c| c.shape.raycast(origin, dir, max_distance))
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Casts against shapes inflated by `radius`; box corners are treated as square.
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit> {
        let dir = direction.normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        self.in_mask(mask)
            .filter_map(|c| {
                let hit = c.shape.inflated(radius).raycast(origin, dir, max_distance)?;
                Some(RaycastHit {
                    point: hit.point - hit.normal * radius,
                    ..hit
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }
}
