use core::ops::{Add, AddAssign, Div, Index, Mul, Neg, Sub, SubAssign};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest positive `f32` (a subnormal). Margin used by float orientation tests.
pub const FLOAT_EPSILON: f32 = f32::from_bits(1);

/// Compares two floats with a tolerance relative to their magnitude.
pub fn approximately(a: f32, b: f32) -> bool {
    (b - a).abs() < (1e-6 * a.abs().max(b.abs())).max(FLOAT_EPSILON * 8.0)
}

/// Rounds half to even, the rounding used for every float to fixed-point conversion.
pub fn round_to_int(v: f32) -> i32 {
    (v as f64).round_ties_even() as i32
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);
    pub const UP: Self = Self::new(0.0, 1.0, 0.0);
    pub const RIGHT: Self = Self::new(1.0, 0.0, 0.0);
    pub const FORWARD: Self = Self::new(0.0, 0.0, 1.0);

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length_squared(self) -> f32 {
        self.dot(self)
    }

    pub fn length(self) -> f32 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or zero for (near) zero vectors.
    pub fn normalize_or_zero(self) -> Self {
        let len = self.length();
        if len > 1e-5 {
            self / len
        } else {
            Self::ZERO
        }
    }

    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    pub fn distance_squared(self, other: Self) -> f32 {
        (self - other).length_squared()
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl SubAssign for Vec3 {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Mul<f32> for Vec3 {
    type Output = Self;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Div<f32> for Vec3 {
    type Output = Self;

    fn div(self, rhs: f32) -> Self::Output {
        Self::new(self.x / rhs, self.y / rhs, self.z / rhs)
    }
}

impl Neg for Vec3 {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y, -self.z)
    }
}

impl Index<usize> for Vec3 {
    type Output = f32;

    fn index(&self, axis: usize) -> &f32 {
        match axis {
            0 => &self.x,
            1 => &self.y,
            _ => &self.z,
        }
    }
}

/// Fixed-point position with three decimals of precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Int3 {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Int3 {
    pub const PRECISION: i32 = 1000;
    pub const FLOAT_PRECISION: f32 = 1000.0;
    pub const PRECISION_FACTOR: f32 = 0.001;
    pub const ZERO: Self = Self::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn to_vec3(self) -> Vec3 {
        Vec3::new(
            self.x as f32 * Self::PRECISION_FACTOR,
            self.y as f32 * Self::PRECISION_FACTOR,
            self.z as f32 * Self::PRECISION_FACTOR,
        )
    }

    /// Component by axis index (0 = x, 1 = y, 2 = z).
    pub fn axis(self, axis: usize) -> i32 {
        match axis {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn sqr_magnitude(self) -> f64 {
        let (x, y, z) = (self.x as f64, self.y as f64, self.z as f64);
        x * x + y * y + z * z
    }

    pub fn magnitude(self) -> f64 {
        self.sqr_magnitude().sqrt()
    }

    /// Edge cost between two nodes whose positions differ by `self`.
    pub fn cost_magnitude(self) -> u32 {
        self.magnitude().round_ties_even() as u32
    }

    /// Length in world units.
    pub fn world_magnitude(self) -> f32 {
        (self.magnitude() * Self::PRECISION_FACTOR as f64) as f32
    }

    /// Divides every component, rounding half to even.
    pub fn div_round(self, d: f64) -> Self {
        Self::new(
            (self.x as f64 / d).round_ties_even() as i32,
            (self.y as f64 / d).round_ties_even() as i32,
            (self.z as f64 / d).round_ties_even() as i32,
        )
    }
}

impl From<Vec3> for Int3 {
    fn from(v: Vec3) -> Self {
        Self::new(
            round_to_int(v.x * Int3::FLOAT_PRECISION),
            round_to_int(v.y * Int3::FLOAT_PRECISION),
            round_to_int(v.z * Int3::FLOAT_PRECISION),
        )
    }
}

impl From<Int3> for Vec3 {
    fn from(v: Int3) -> Self {
        v.to_vec3()
    }
}

impl Add for Int3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Int3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<i32> for Int3 {
    type Output = Self;

    fn mul(self, rhs: i32) -> Self::Output {
        Self::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

/// Affine 4x4 matrix, row-major (`m[row][col]`), acting on column vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Matrix4 {
    pub m: [[f32; 4]; 4],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        m: [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ],
    };

    pub const ZERO: Self = Self { m: [[0.0; 4]; 4] };

    /// Translation, rotation (Euler angles in degrees) and scale.
    ///
    /// The rotation is applied around Z first, then X, then Y.
    pub fn trs(translation: Vec3, euler_degrees: Vec3, scale: Vec3) -> Self {
        let r = rotation_from_euler(euler_degrees);
        let s = [scale.x, scale.y, scale.z];
        let t = [translation.x, translation.y, translation.z];
        let mut m = Self::IDENTITY.m;
        for row in 0..3 {
            for col in 0..3 {
                m[row][col] = r[row][col] * s[col];
            }
            m[row][3] = t[row];
        }
        Self { m }
    }

    pub fn translation(t: Vec3) -> Self {
        Self::trs(t, Vec3::ZERO, Vec3::ONE)
    }

    pub fn multiply_point3x4(&self, p: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * p.x + m[0][1] * p.y + m[0][2] * p.z + m[0][3],
            m[1][0] * p.x + m[1][1] * p.y + m[1][2] * p.z + m[1][3],
            m[2][0] * p.x + m[2][1] * p.y + m[2][2] * p.z + m[2][3],
        )
    }

    pub fn multiply_vector(&self, v: Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }

    /// Gauss-Jordan inverse; `None` for singular matrices.
    pub fn try_inverse(&self) -> Option<Self> {
        let mut a = [[0.0f64; 8]; 4];
        for (row, r) in a.iter_mut().enumerate() {
            for col in 0..4 {
                r[col] = self.m[row][col] as f64;
            }
            r[4 + row] = 1.0;
        }

        for col in 0..4 {
            let pivot = (col..4).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
            if a[pivot][col].abs() < 1e-12 {
                return None;
            }
            a.swap(col, pivot);
            let inv = 1.0 / a[col][col];
            for v in a[col].iter_mut() {
                *v *= inv;
            }
            for row in 0..4 {
                if row == col {
                    continue;
                }
                let factor = a[row][col];
                if factor != 0.0 {
                    for k in 0..8 {
                        a[row][k] -= factor * a[col][k];
                    }
                }
            }
        }

        let mut out = Self::ZERO;
        for row in 0..4 {
            for col in 0..4 {
                out.m[row][col] = a[row][4 + col] as f32;
            }
        }
        Some(out)
    }

    /// Inverse, or the zero matrix when singular.
    pub fn inverse(&self) -> Self {
        self.try_inverse().unwrap_or(Self::ZERO)
    }
}

impl Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let mut out = Self::ZERO;
        for row in 0..4 {
            for col in 0..4 {
                out.m[row][col] = (0..4).map(|k| self.m[row][k] * rhs.m[k][col]).sum();
            }
        }
        out
    }
}

fn rotation_from_euler(deg: Vec3) -> [[f32; 3]; 3] {
    let (sx, cx) = deg.x.to_radians().sin_cos();
    let (sy, cy) = deg.y.to_radians().sin_cos();
    let (sz, cz) = deg.z.to_radians().sin_cos();

    let rx = [[1.0, 0.0, 0.0], [0.0, cx, -sx], [0.0, sx, cx]];
    let ry = [[cy, 0.0, sy], [0.0, 1.0, 0.0], [-sy, 0.0, cy]];
    let rz = [[cz, -sz, 0.0], [sz, cz, 0.0], [0.0, 0.0, 1.0]];

    mul3(mul3(ry, rx), rz)
}

fn mul3(a: [[f32; 3]; 3], b: [[f32; 3]; 3]) -> [[f32; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for row in 0..3 {
        for col in 0..3 {
            out[row][col] = (0..3).map(|k| a[row][k] * b[k][col]).sum();
        }
    }
    out
}

/// Axis-aligned box given by center and half extents.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bounds {
    pub center: Vec3,
    pub extents: Vec3,
}

impl Bounds {
    pub fn new(center: Vec3, size: Vec3) -> Self {
        Self {
            center,
            extents: size * 0.5,
        }
    }

    pub fn from_min_max(min: Vec3, max: Vec3) -> Self {
        Self {
            center: (min + max) * 0.5,
            extents: (max - min) * 0.5,
        }
    }

    pub fn min(&self) -> Vec3 {
        self.center - self.extents
    }

    pub fn max(&self) -> Vec3 {
        self.center + self.extents
    }

    pub fn size(&self) -> Vec3 {
        self.extents * 2.0
    }

    pub fn contains(&self, p: Vec3) -> bool {
        let (min, max) = (self.min(), self.max());
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y && p.z >= min.z && p.z <= max.z
    }

    pub fn encapsulate(&mut self, p: Vec3) {
        *self = Self::from_min_max(self.min().min(p), self.max().max(p));
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let c = self.center;
        let e = self.extents;
        [
            c + Vec3::new(e.x, e.y, e.z),
            c + Vec3::new(e.x, e.y, -e.z),
            c + Vec3::new(e.x, -e.y, e.z),
            c + Vec3::new(e.x, -e.y, -e.z),
            c + Vec3::new(-e.x, e.y, e.z),
            c + Vec3::new(-e.x, e.y, -e.z),
            c + Vec3::new(-e.x, -e.y, e.z),
            c + Vec3::new(-e.x, -e.y, -e.z),
        ]
    }

    /// Min and max of the eight corners after transforming them by `matrix`.
    pub fn transformed_min_max(&self, matrix: &Matrix4) -> (Vec3, Vec3) {
        let corners = self.corners();
        let first = matrix.multiply_point3x4(corners[0]);
        corners[1..].iter().fold((first, first), |(min, max), &c| {
            let p = matrix.multiply_point3x4(c);
            (min.min(p), max.max(p))
        })
    }
}

/// Inclusive integer rectangle in grid space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IntRect {
    pub xmin: i32,
    pub ymin: i32,
    pub xmax: i32,
    pub ymax: i32,
}

impl IntRect {
    pub const fn new(xmin: i32, ymin: i32, xmax: i32, ymax: i32) -> Self {
        Self {
            xmin,
            ymin,
            xmax,
            ymax,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.xmin <= self.xmax && self.ymin <= self.ymax
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        !(x < self.xmin || y < self.ymin || x > self.xmax || y > self.ymax)
    }

    pub fn width(&self) -> i32 {
        self.xmax - self.xmin + 1
    }

    pub fn height(&self) -> i32 {
        self.ymax - self.ymin + 1
    }

    /// Overlap of two rects. May be invalid (empty) when they do not touch.
    pub fn intersection(a: Self, b: Self) -> Self {
        Self::new(
            a.xmin.max(b.xmin),
            a.ymin.max(b.ymin),
            a.xmax.min(b.xmax),
            a.ymax.min(b.ymax),
        )
    }

    /// Smallest rect containing both.
    pub fn union(a: Self, b: Self) -> Self {
        Self::new(
            a.xmin.min(b.xmin),
            a.ymin.min(b.ymin),
            a.xmax.max(b.xmax),
            a.ymax.max(b.ymax),
        )
    }

    pub fn expand(&self, range: i32) -> Self {
        Self::new(
            self.xmin - range,
            self.ymin - range,
            self.xmax + range,
            self.ymax + range,
        )
    }

    /// Cells in x-major order, empty for invalid rects.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        let (ymin, ymax) = (self.ymin, self.ymax);
        (self.xmin..=self.xmax).flat_map(move |x| (ymin..=ymax).map(move |y| (x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn int3_rounds_half_to_even() {
        assert_eq!(round_to_int(2.5), 2);
        assert_eq!(round_to_int(3.5), 4);
        assert_eq!(round_to_int(-2.5), -2);
        assert_eq!(Int3::from(Vec3::new(1.0, -2.25, 0.5)), Int3::new(1000, -2250, 500));
        assert_eq!(Int3::from(Vec3::new(1.2344, 0.0, 0.0)).x, 1234);
    }

    #[test]
    fn cost_magnitude_is_rounded_length() {
        assert_eq!(Int3::new(3000, 0, 4000).cost_magnitude(), 5000);
        assert_eq!(Int3::new(1000, 0, 1000).cost_magnitude(), 1414);
    }

    #[test]
    fn trs_inverse_round_trips_points() {
        let m = Matrix4::trs(
            Vec3::new(3.0, -1.0, 2.0),
            Vec3::new(10.0, 35.0, -20.0),
            Vec3::new(2.0, 1.0, 0.5),
        );
        let inv = m.inverse();
        let p = Vec3::new(1.5, 2.0, -4.0);
        assert!(close(inv.multiply_point3x4(m.multiply_point3x4(p)), p));
        assert!(close((m * inv).multiply_point3x4(p), p));
    }

    #[test]
    fn yaw_rotates_forward_towards_positive_x() {
        let m = Matrix4::trs(Vec3::ZERO, Vec3::new(0.0, 90.0, 0.0), Vec3::ONE);
        assert!(close(m.multiply_vector(Vec3::FORWARD), Vec3::RIGHT));
    }

    #[test]
    fn singular_matrix_inverts_to_zero() {
        let m = Matrix4::trs(Vec3::ZERO, Vec3::ZERO, Vec3::new(1.0, 0.0, 1.0));
        assert!(m.try_inverse().is_none());
        assert_eq!(m.inverse(), Matrix4::ZERO);
    }

    #[test]
    fn approximately_tolerates_float_noise() {
        assert!(approximately(10.0, 10.000001));
        assert!(!approximately(10.0, 10.001));
        assert!(approximately(0.0, 0.0));
    }

    #[test]
    fn int_rect_set_operations() {
        let a = IntRect::new(0, 0, 4, 4);
        let b = IntRect::new(3, -2, 8, 1);
        assert_eq!(IntRect::intersection(a, b), IntRect::new(3, 0, 4, 1));
        assert_eq!(IntRect::union(a, b), IntRect::new(0, -2, 8, 4));
        assert_eq!(a.expand(2), IntRect::new(-2, -2, 6, 6));
        assert!(!IntRect::intersection(a, IntRect::new(6, 6, 7, 7)).is_valid());
        assert_eq!(IntRect::new(1, 1, 2, 3).cells().count(), 6);
    }
}
