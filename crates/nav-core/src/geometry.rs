//! Orientation, containment and closest-point helpers.
//!
//! All 2D predicates work in the XZ plane. Clockwise means a negative signed area.

use crate::math::{Int3, Vec3, FLOAT_EPSILON};

/// Twice the signed XZ area of `a, b, c`.
pub fn tri_area2(a: Int3, b: Int3, c: Int3) -> i64 {
    (b.x as i64 - a.x as i64) * (c.z as i64 - a.z as i64)
        - (c.x as i64 - a.x as i64) * (b.z as i64 - a.z as i64)
}

pub fn tri_area2_f(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (b.x - a.x) * (c.z - a.z) - (c.x - a.x) * (b.z - a.z)
}

pub fn is_clockwise(a: Int3, b: Int3, c: Int3) -> bool {
    tri_area2(a, b, c) < 0
}

pub fn is_colinear(a: Int3, b: Int3, c: Int3) -> bool {
    tri_area2(a, b, c) == 0
}

/// `p` is left of, or on, the line `a -> b`.
pub fn left(a: Int3, b: Int3, p: Int3) -> bool {
    tri_area2(a, b, p) <= 0
}

/// Clockwise, colinear, or counter-clockwise by at most the smallest float.
pub fn is_clockwise_margin(a: Vec3, b: Vec3, c: Vec3) -> bool {
    tri_area2_f(a, b, c) <= FLOAT_EPSILON
}

/// Point in a clockwise triangle, boundary included.
pub fn triangle_contains_xz(a: Vec3, b: Vec3, c: Vec3, p: Vec3) -> bool {
    is_clockwise_margin(a, b, p) && is_clockwise_margin(b, c, p) && is_clockwise_margin(c, a, p)
}

/// Even-odd rule containment for an arbitrary polygon.
pub fn polygon_contains_xz(points: &[Vec3], p: Vec3) -> bool {
    if points.is_empty() {
        return false;
    }
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (pi, pj) = (points[i], points[j]);
        if ((pi.z <= p.z && p.z < pj.z) || (pj.z <= p.z && p.z < pi.z))
            && p.x < (pj.x - pi.x) * (p.z - pi.z) / (pj.z - pi.z) + pi.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Finite segment intersection in XZ. Parallel segments never intersect.
pub fn segments_intersect_xz(start1: Vec3, end1: Vec3, start2: Vec3, end2: Vec3) -> bool {
    let dir1 = end1 - start1;
    let dir2 = end2 - start2;

    let den = dir2.z * dir1.x - dir2.x * dir1.z;
    if den == 0.0 {
        return false;
    }

    let nom = dir2.x * (start1.z - start2.z) - dir2.z * (start1.x - start2.x);
    let nom2 = dir1.x * (start1.z - start2.z) - dir1.z * (start1.x - start2.x);
    let u = nom / den;
    let u2 = nom2 / den;

    (0.0..=1.0).contains(&u) && (0.0..=1.0).contains(&u2)
}

/// Projection of `point` on the infinite line through `start` towards `end`.
pub fn nearest_point_on_line(start: Vec3, end: Vec3, point: Vec3) -> Vec3 {
    let dir = (end - start).normalize_or_zero();
    start + dir * (point - start).dot(dir)
}

/// Closest point to `p` on the solid triangle `t0, t1, t2` in 3D.
pub fn closest_point_on_triangle(t0: Vec3, t1: Vec3, t2: Vec3, p: Vec3) -> Vec3 {
    let edge0 = t1 - t0;
    let edge1 = t2 - t0;
    let v0 = t0 - p;

    let a = edge0.dot(edge0);
    let b = edge0.dot(edge1);
    let c = edge1.dot(edge1);
    let d = edge0.dot(v0);
    let e = edge1.dot(v0);

    let det = a * c - b * b;
    let mut s = b * e - c * d;
    let mut t = b * d - a * e;

    let clamp01 = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };

    if s + t < det {
        if s < 0.0 {
            if t < 0.0 && d < 0.0 {
                s = clamp01(-d / a);
                t = 0.0;
            } else {
                s = 0.0;
                t = clamp01(-e / c);
            }
        } else if t < 0.0 {
            s = clamp01(-d / a);
            t = 0.0;
        } else {
            let inv_det = 1.0 / det;
            s *= inv_det;
            t *= inv_det;
        }
    } else if s < 0.0 {
        let tmp0 = b + d;
        let tmp1 = c + e;
        if tmp1 > tmp0 {
            s = clamp01((tmp1 - tmp0) / (a - 2.0 * b + c));
            t = 1.0 - s;
        } else {
            t = clamp01(-e / c);
            s = 0.0;
        }
    } else if t < 0.0 {
        if a + d > b + e {
            s = clamp01((c + e - b - d) / (a - 2.0 * b + c));
            t = 1.0 - s;
        } else {
            s = clamp01(-e / c);
            t = 0.0;
        }
    } else {
        s = clamp01((c + e - b - d) / (a - 2.0 * b + c));
        t = 1.0 - s;
    }

    t0 + edge0 * s + edge1 * t
}
