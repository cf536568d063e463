//! Geometry normalization: orientation inference, grid snap, grid alignment.
//!
//! Runs after linking and before emission. Only node positions and
//! rotations change here; the node set and its links are left alone.

use crate::config::{ConfigError, GraphConfig};
use crate::graph::Graph;
use crate::types::{Point, Rotation, Terminal};

/// Applies the normalization passes under one configuration.
#[derive(Debug, Clone)]
pub struct Normalizer {
    config: GraphConfig,
}

impl Normalizer {
    /// Fails when the configuration does not validate.
    pub fn new(config: GraphConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Run all passes: orientation, snapping, then alignment.
    pub fn normalize(&self, graph: &mut Graph) {
        infer_orientations(graph);
        self.snap_to_grid(graph);
        let moved = self.align_to_grid(graph);
        tracing::debug!(nodes = graph.len(), moved, "normalized geometry");
    }

    /// Round every coordinate to the nearest grid point.
    pub fn snap_to_grid(&self, graph: &mut Graph) {
        let step = self.config.min_grid_step;
        for poi in &mut graph.nodes {
            poi.position = Point::new(snap(poi.position.x, step), snap(poi.position.y, step));
        }
    }

    /// Pull nearly-aligned nodes onto shared rows and columns.
    ///
    /// For every ordered pair (P1, P2): nodes sharing rotation R0 copy P1's
    /// x into P2 when their x differ by less than the margin, and nodes
    /// sharing R90 do the same with y. Independently, corners, junctions and
    /// grounds act as two-axis anchors pulling P2 onto their x and y.
    ///
    /// Positions are read live, so earlier moves feed later comparisons.
    /// Returns the number of coordinate writes that changed a value.
    pub fn align_to_grid(&self, graph: &mut Graph) -> usize {
        let margin = self.config.alignment_margin();
        let n = graph.nodes.len();
        let mut moved = 0;

        for i in 0..n {
            for j in 0..n {
                let anchor = graph.nodes[i].clone();
                let target = &mut graph.nodes[j];
                let before = target.position;

                if anchor.rotation == target.rotation {
                    match anchor.rotation {
                        Rotation::R0 => {
                            if (anchor.position.x - target.position.x).abs() < margin {
                                target.position.x = anchor.position.x;
                            }
                        }
                        Rotation::R90 => {
                            if (anchor.position.y - target.position.y).abs() < margin {
                                target.position.y = anchor.position.y;
                            }
                        }
                    }
                }

                if anchor.kind.is_alignment_anchor() {
                    if (anchor.position.x - target.position.x).abs() < margin {
                        target.position.x = anchor.position.x;
                    }
                    if (anchor.position.y - target.position.y).abs() < margin {
                        target.position.y = anchor.position.y;
                    }
                }

                if target.position != before {
                    moved += 1;
                }
            }
        }
        moved
    }
}

/// Set each node's rotation from its terminal lines.
///
/// Terminal A is evaluated first, then B; when both exist B decides.
/// Nodes with no terminal line keep their rotation.
pub fn infer_orientations(graph: &mut Graph) {
    for poi in &mut graph.nodes {
        for t in [Terminal::A, Terminal::B] {
            if let Some(far) = poi.terminal_line(t) {
                poi.rotation = rotation_for_lead(far, poi.position);
            }
        }
    }
}

/// Signed angle in degrees of the segment `from → to`, with the y axis
/// flipped so angles read counter-clockwise on screen.
pub fn angle_of_line(from: Point, to: Point) -> f64 {
    let dy = -(to.y - from.y) as f64;
    let dx = (to.x - from.x) as f64;
    dy.atan2(dx).to_degrees()
}

/// Rotation for a part whose lead runs from `far` to `position`.
///
/// LTspice draws two-terminal symbols upright at R0, so leads whose angle
/// magnitude lies strictly inside (45°, 165°) give R0 and all others R90.
pub fn rotation_for_lead(far: Point, position: Point) -> Rotation {
    let a = angle_of_line(far, position).abs();
    if a > 45.0 && a < 165.0 {
        Rotation::R0
    } else {
        Rotation::R90
    }
}

/// Round half up to a multiple of `step` with floor division.
pub fn snap(v: i64, step: i64) -> i64 {
    (v + step / 2).div_euclid(step) * step
}
