//! Straightens a portal corridor into the shortest polyline through it (XZ plane).

use nav_core::geometry::tri_area2_f;
use nav_core::Vec3;

/// Shortest path from `start` to `end` through the portals `left[i] -> right[i]`.
///
/// Works with corridors from either portal builder; sides are normalized so each
/// portal is seen with its left point clockwise of its right point from the
/// previous portal. Output points carry the height of the corridor point they
/// come from.
pub fn string_pull(start: Vec3, end: Vec3, left: &[Vec3], right: &[Vec3]) -> Vec<Vec3> {
    let mut out = Vec::new();
    string_pull_into(start, end, left, right, &mut out);
    out
}

pub fn string_pull_into(start: Vec3, end: Vec3, left: &[Vec3], right: &[Vec3], out: &mut Vec<Vec3>) {
    let portals = normalized_portals(start, end, left, right);
    pull(start, &portals, out);
    if out.last().copied() != Some(end) {
        out.push(end);
    }
}

fn normalized_portals(start: Vec3, end: Vec3, left: &[Vec3], right: &[Vec3]) -> Vec<(Vec3, Vec3)> {
    let mut portals = Vec::with_capacity(left.len().min(right.len()) + 1);
    let mut reference = start;
    for (&l, &r) in left.iter().zip(right) {
        let portal = if tri_area2_f(reference, l, r) < 0.0 { (r, l) } else { (l, r) };
        reference = (l + r) * 0.5;
        portals.push(portal);
    }
    portals.push((end, end));
    portals
}

fn pull(start: Vec3, portals: &[(Vec3, Vec3)], out: &mut Vec<Vec3>) {
    out.clear();
    out.push(start);
    if portals.is_empty() {
        return;
    }

    let mut apex = start;
    let mut left = portals[0].0;
    let mut right = portals[0].1;
    let mut left_index = 0;
    let mut right_index = 0;

    let mut i = 1;
    while i < portals.len() {
        let (p_left, p_right) = portals[i];

        if tri_area2_f(apex, right, p_right) <= 0.0 {
            if apex == right || tri_area2_f(apex, left, p_right) > 0.0 {
                right = p_right;
                right_index = i;
            } else {
                out.push(left);
                apex = left;
                let restart = left_index;
                right = apex;
                right_index = restart;
                i = restart + 1;
                continue;
            }
        }

        if tri_area2_f(apex, left, p_left) >= 0.0 {
            if apex == left || tri_area2_f(apex, right, p_left) < 0.0 {
                left = p_left;
                left_index = i;
            } else {
                out.push(right);
                apex = right;
                let restart = right_index;
                left = apex;
                left_index = restart;
                i = restart + 1;
                continue;
            }
        }

        i += 1;
    }
}
