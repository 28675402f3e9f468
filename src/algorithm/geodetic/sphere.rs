//! Unit-sphere vector helpers for arc lengths and spherical point-in-polygon tests.
//!
//! Coordinates are longitude/latitude in degrees.

use crate::native::Coord;

const EPSILON: f64 = 1e-12;

pub(crate) type Vec3 = [f64; 3];

pub(crate) fn to_vec3(c: &Coord) -> Vec3 {
    let (lon, lat) = (c.x.to_radians(), c.y.to_radians());
    [lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin()]
}

fn dot(a: &Vec3, b: &Vec3) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn cross(a: &Vec3, b: &Vec3) -> Vec3 {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn norm(a: &Vec3) -> f64 {
    dot(a, a).sqrt()
}

/// Central angle between two points, in radians.
pub(crate) fn arc_length(a: &Vec3, b: &Vec3) -> f64 {
    norm(&cross(a, b)).atan2(dot(a, b))
}

fn same_point(a: &Vec3, b: &Vec3) -> bool {
    arc_length(a, b) < EPSILON
}

/// Whether `p` lies on the minor great-circle arc from `a` to `b`.
pub(crate) fn point_on_arc(p: &Vec3, a: &Vec3, b: &Vec3) -> bool {
    if same_point(p, a) || same_point(p, b) {
        return true;
    }
    let total = arc_length(a, b);
    (arc_length(a, p) + arc_length(p, b) - total).abs() < EPSILON * 10.
}

/// Whether the arcs `a-b` and `c-d` cross at a point interior to both.
pub(crate) fn arcs_cross(a: &Vec3, b: &Vec3, c: &Vec3, d: &Vec3) -> bool {
    let n1 = cross(a, b);
    let n2 = cross(c, d);
    let side_c = dot(&n1, c);
    let side_d = dot(&n1, d);
    let side_a = dot(&n2, a);
    let side_b = dot(&n2, b);
    // Touching or collinear arcs are not a proper crossing
    if side_c.abs() < EPSILON
        || side_d.abs() < EPSILON
        || side_a.abs() < EPSILON
        || side_b.abs() < EPSILON
    {
        return false;
    }
    if side_c.signum() == side_d.signum() || side_a.signum() == side_b.signum() {
        return false;
    }
    // Both great circles intersect in two antipodal points; the crossing must be the one on
    // the same hemisphere as the arcs.
    let mut x = cross(&n1, &n2);
    if dot(&x, a) + dot(&x, b) < 0. {
        x = [-x[0], -x[1], -x[2]];
    }
    dot(&x, c) + dot(&x, d) > 0.
}

/// Whether `p` lies on the boundary of `ring`.
pub(crate) fn on_ring(p: &Vec3, ring: &[Vec3]) -> bool {
    ring.windows(2).any(|w| point_on_arc(p, &w[0], &w[1]))
}

/// Twice the signed area of `ring` projected onto the plane normal to its mean direction.
/// Positive when the ring runs counter-clockwise seen from outside the sphere.
fn orientation(ring: &[Vec3]) -> f64 {
    let center = ring.iter().fold([0.; 3], |acc, v| {
        [acc[0] + v[0], acc[1] + v[1], acc[2] + v[2]]
    });
    ring.windows(2)
        .map(|w| dot(&center, &cross(&w[0], &w[1])))
        .sum()
}

/// Whether `p` lies strictly inside `ring`, by summing the signed angles the ring's edges
/// subtend at `p`. Valid for rings enclosing less than a hemisphere.
///
/// Seen from the far side of the sphere the ring winds around `p` as well, in the opposite
/// direction, so the winding has to agree with the ring's own orientation.
pub(crate) fn in_ring(p: &Vec3, ring: &[Vec3]) -> bool {
    let winding: f64 = ring
        .windows(2)
        .map(|w| {
            let (a, b) = (&w[0], &w[1]);
            let y = dot(p, &cross(a, b));
            let x = dot(a, b) - dot(p, a) * dot(p, b);
            y.atan2(x)
        })
        .sum();
    winding.abs() > std::f64::consts::PI && winding.signum() == orientation(ring).signum()
}

/// The point halfway along the minor arc from `a` to `b`.
pub(crate) fn midpoint(a: &Vec3, b: &Vec3) -> Vec3 {
    let sum = [a[0] + b[0], a[1] + b[1], a[2] + b[2]];
    let len = norm(&sum);
    if len < EPSILON {
        return *a;
    }
    [sum[0] / len, sum[1] / len, sum[2] / len]
}
