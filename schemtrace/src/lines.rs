//! Similar-line pruning for detection producers.
//!
//! A Hough transform run at several thresholds reports the same wire many
//! times. Pruning must happen before endpoints are classified, because
//! endpoint identifiers are line indices; the core pipeline never reorders
//! or drops lines itself.

use crate::types::Line;

/// Two lines are similar when both endpoint pairs lie within `radius`,
/// matched either directly or crosswise.
pub fn are_similar(a: &Line, b: &Line, radius: f64) -> bool {
    let direct = a.start.distance(b.start) < radius && a.end.distance(b.end) < radius;
    let crossed = a.start.distance(b.end) < radius && a.end.distance(b.start) < radius;
    direct || crossed
}

/// Keep the first line of each group of similar lines, preserving order.
pub fn prune_similar(lines: &[Line], radius: f64) -> Vec<Line> {
    let mut kept: Vec<Line> = Vec::with_capacity(lines.len());
    for line in lines {
        if !kept.iter().any(|k| are_similar(k, line, radius)) {
            kept.push(*line);
        }
    }
    tracing::debug!(
        input = lines.len(),
        kept = kept.len(),
        "pruned similar lines"
    );
    kept
}
