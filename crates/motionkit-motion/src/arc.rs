//! Arc expansion into axis-space chords

use motionkit_core::{ArcSpec, CartesianPosition};

/// Chord end points of `arc` from `start` to `target`
///
/// Chords are sized so their sagitta stays within `tolerance`. The last
/// point is `target` itself.
pub fn arc_chords(
    start: &CartesianPosition,
    target: &CartesianPosition,
    arc: &ArcSpec,
    tolerance: f64,
) -> Vec<CartesianPosition> {
    let sweep = arc.sweep(start, target);
    let chord_span = (tolerance * (2.0 * arc.radius - tolerance)).max(0.0).sqrt();
    let count = if chord_span > 0.0 {
        (((0.5 * sweep * arc.radius).abs() / chord_span).ceil() as usize).max(1)
    } else {
        1
    };

    let mut points: Vec<CartesianPosition> = (1..count)
        .map(|i| arc.point_at(start, target, sweep, i as f64 / count as f64))
        .collect();
    points.push(target.clone());
    points
}

/// Whether `point` lies on the arc circle within `tolerance`
pub fn on_circle(point: &CartesianPosition, arc: &ArcSpec, tolerance: f64) -> bool {
    let d0 = point.axis(arc.plane.axis0) - arc.center[0];
    let d1 = point.axis(arc.plane.axis1) - arc.center[1];
    (d0.hypot(d1) - arc.radius).abs() <= tolerance
}
