//! Graph assembly: detections → deduplicated, linked node arena.
//!
//! Assembly runs in three steps:
//!
//! 1. **Construction.** One [`Poi`] per confidently classified endpoint, in
//!    line order, endpoint A before B.
//! 2. **Deduplication.** Same-type nodes closer than the duplicate radius
//!    collapse onto the earliest-inserted one.
//! 3. **Linking.** Pass 1 finds where each node's wires go (far line
//!    endpoints); pass 2 finds which node sits at each far end. The two
//!    passes use separate radii because pin stubs are short and dense while
//!    component bodies are larger and sparser.

use crate::config::GraphConfig;
use crate::detections::{Detections, EndpointId};
use crate::label;
use crate::poi::Poi;
use crate::types::{Line, PoiId, Terminal};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("No classification for endpoint {0}")]
    MissingData(EndpointId),
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Node arena plus the lines it was built from.
///
/// Connectivity lives in each node's `terminals` slots as [`PoiId`]s. Links
/// are one-directional: resolving A→B never writes B→A.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Graph {
    pub lines: Vec<Line>,
    pub nodes: Vec<Poi>,
}

impl Graph {
    pub fn new(lines: Vec<Line>, nodes: Vec<Poi>) -> Self {
        Self { lines, nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: PoiId) -> Option<&Poi> {
        self.nodes.get(id.0)
    }

    /// Iterate `(id, node)` pairs in arena order.
    pub fn iter(&self) -> impl Iterator<Item = (PoiId, &Poi)> {
        self.nodes.iter().enumerate().map(|(i, p)| (PoiId(i), p))
    }

    /// Every resolved link as `(from, terminal, to)`, A before B per node.
    pub fn links(&self) -> Vec<(PoiId, Terminal, PoiId)> {
        let mut out = Vec::new();
        for (id, poi) in self.iter() {
            for t in [Terminal::A, Terminal::B] {
                if let Some(to) = poi.terminal(t) {
                    out.push((id, t, to));
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// Builds a [`Graph`] from detections under one configuration.
#[derive(Debug, Clone)]
pub struct Assembler {
    config: GraphConfig,
}

impl Assembler {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    /// Construct, deduplicate and link.
    pub fn assemble(&self, detections: &Detections) -> Result<Graph, AssemblyError> {
        let mut graph = self.construct(detections)?;
        self.remove_duplicates(&mut graph);
        self.link(&mut graph);
        Ok(graph)
    }

    /// Build the loose node list.
    ///
    /// Every endpoint of every line must have a classification entry;
    /// low-confidence entries produce no node.
    pub fn construct(&self, detections: &Detections) -> Result<Graph, AssemblyError> {
        let mut nodes = Vec::new();
        for (id, position) in detections.endpoints() {
            let probs = detections
                .classifications
                .get(&id)
                .ok_or(AssemblyError::MissingData(id))?;
            let Some((kind, confidence)) = probs.classify(self.config.confidence_floor) else {
                tracing::trace!(endpoint = %id, best = ?probs.best(), "endpoint below confidence floor");
                continue;
            };
            let label = detections.ocr.get(&id).and_then(|t| label::node_label(t));
            nodes.push(Poi::new(id, kind, position, confidence).with_label(label));
        }
        tracing::debug!(
            endpoints = detections.lines.len() * 2,
            nodes = nodes.len(),
            "constructed loose graph"
        );
        Ok(Graph::new(detections.lines.clone(), nodes))
    }

    /// Collapse same-type nodes closer than the duplicate radius.
    ///
    /// Nodes are scanned in insertion order; a surviving node marks every
    /// later same-type node within range, and marked nodes are skipped as
    /// candidates. The arena is compacted once at the end, so the earliest
    /// node of any cluster survives. Existing terminal links are remapped,
    /// and links into removed nodes are dropped. Returns the number removed.
    pub fn remove_duplicates(&self, graph: &mut Graph) -> usize {
        let radius = self.config.duplicate_radius();
        let n = graph.nodes.len();
        let mut removed = vec![false; n];

        for i in 0..n {
            if removed[i] {
                continue;
            }
            for j in (i + 1)..n {
                if removed[j] {
                    continue;
                }
                let (a, b) = (&graph.nodes[i], &graph.nodes[j]);
                if a.kind == b.kind && a.position.distance(b.position) < radius {
                    tracing::trace!(kept = %a.endpoint, dropped = %b.endpoint, "duplicate node");
                    removed[j] = true;
                }
            }
        }

        let count = removed.iter().filter(|r| **r).count();
        if count == 0 {
            tracing::debug!(removed = 0, remaining = n, "removed duplicates");
            return 0;
        }

        let mut remap: Vec<Option<PoiId>> = Vec::with_capacity(n);
        let mut next = 0;
        for &r in &removed {
            if r {
                remap.push(None);
            } else {
                remap.push(Some(PoiId(next)));
                next += 1;
            }
        }

        let mut flags = removed.iter();
        graph.nodes.retain(|_| !flags.next().copied().unwrap_or(false));
        for poi in &mut graph.nodes {
            for slot in &mut poi.terminals {
                *slot = slot.and_then(|id| remap[id.0]);
            }
        }

        tracing::debug!(removed = count, remaining = graph.nodes.len(), "removed duplicates");
        count
    }

    /// Resolve terminal connectivity (both passes).
    pub fn link(&self, graph: &mut Graph) {
        let discovered = self.discover_terminal_lines(graph);
        let resolved = self.resolve_terminals(graph);
        tracing::debug!(discovered, resolved, "linked graph");
    }

    /// Pass 1: for every node and line, if the node sits on one end of the
    /// line, record the other end in the node's next free terminal-line slot
    /// (B, then A). Returns the number of slots filled.
    pub fn discover_terminal_lines(&self, graph: &mut Graph) -> usize {
        let radius = self.config.terminal_b_radius();
        let mut filled = 0;
        for poi in &mut graph.nodes {
            for line in &graph.lines {
                if let Some(far) = line.far_end_from(poi.position, radius) {
                    if poi.push_terminal_line(far).is_some() {
                        filled += 1;
                    }
                }
            }
        }
        filled
    }

    /// Pass 2: for each ordered pair of distinct nodes (P1, P2), resolve
    /// P1's terminal A to P2 when P2 lies near P1's A terminal line;
    /// otherwise try terminal B the same way. The first match per slot wins.
    /// Returns the number of terminals resolved.
    pub fn resolve_terminals(&self, graph: &mut Graph) -> usize {
        let radius_a = self.config.terminal_a_radius();
        let radius_b = self.config.terminal_b_radius();
        let positions: Vec<_> = graph.nodes.iter().map(|p| p.position).collect();
        let mut resolved = 0;

        for (i, poi) in graph.nodes.iter_mut().enumerate() {
            for (j, &candidate) in positions.iter().enumerate() {
                if i == j {
                    continue;
                }
                let near = |t: Terminal, r: f64| {
                    poi.terminal(t).is_none()
                        && poi
                            .terminal_line(t)
                            .is_some_and(|far| candidate.distance(far) < r)
                };
                let slot = if near(Terminal::A, radius_a) {
                    Terminal::A
                } else if near(Terminal::B, radius_b) {
                    Terminal::B
                } else {
                    continue;
                };
                if poi.resolve_terminal(slot, PoiId(j)) {
                    resolved += 1;
                }
            }
        }
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detections::Endpoint;
    use crate::poi::{ClassProbabilities, ComponentType};
    use crate::types::Point;

    fn unit_config() -> GraphConfig {
        GraphConfig {
            duplicate_variance: 10.0,
            terminal_a_variance: 12.0,
            terminal_b_variance: 12.0,
            scaling_factor: 1.0,
            ..Default::default()
        }
    }

    fn sure(kind: ComponentType) -> ClassProbabilities {
        [(kind, 0.99)].into_iter().collect()
    }

    fn unsure() -> ClassProbabilities {
        [(ComponentType::Resistor, 0.6), (ComponentType::Capacitor, 0.4)]
            .into_iter()
            .collect()
    }

    fn poi(line: usize, kind: ComponentType, x: i64, y: i64) -> Poi {
        Poi::new(EndpointId::new(line, Endpoint::A), kind, Point::new(x, y), 0.99)
    }

    #[test]
    fn construct_keeps_confident_endpoints_in_order() {
        let det = Detections::new(vec![Line::from([0, 0, 0, 100]), Line::from([50, 0, 50, 100])])
            .classify(EndpointId::new(0, Endpoint::A), sure(ComponentType::Resistor))
            .classify(EndpointId::new(0, Endpoint::B), unsure())
            .classify(EndpointId::new(1, Endpoint::A), sure(ComponentType::Corner))
            .classify(EndpointId::new(1, Endpoint::B), sure(ComponentType::Ground))
            .with_text(EndpointId::new(0, Endpoint::A), "r7");
        let graph = Assembler::new(unit_config()).construct(&det).unwrap();
        let kinds: Vec<_> = graph.nodes.iter().map(|p| p.kind).collect();
        assert_eq!(
            kinds,
            [ComponentType::Resistor, ComponentType::Corner, ComponentType::Ground]
        );
        assert_eq!(graph.nodes[0].label.as_deref(), Some("R7"));
        assert_eq!(graph.nodes[2].position, Point::new(50, 100));
        assert_eq!(graph.nodes[0].rotation, crate::types::Rotation::R90);
    }

    #[test]
    fn missing_classification_is_fatal() {
        let det = Detections::new(vec![Line::from([0, 0, 0, 100])])
            .classify(EndpointId::new(0, Endpoint::A), sure(ComponentType::Resistor));
        let err = Assembler::new(unit_config()).construct(&det).unwrap_err();
        assert!(matches!(err, AssemblyError::MissingData(id) if id.to_string() == "0B"));
    }

    #[test]
    fn near_duplicates_collapse() {
        let mut graph = Graph::new(
            vec![],
            vec![
                poi(0, ComponentType::Resistor, 100, 100),
                poi(1, ComponentType::Resistor, 103, 101),
            ],
        );
        let removed = Assembler::new(unit_config()).remove_duplicates(&mut graph);
        assert_eq!(removed, 1);
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.nodes[0].position, Point::new(100, 100));
    }

    #[test]
    fn duplicates_require_matching_type() {
        let mut graph = Graph::new(
            vec![],
            vec![
                poi(0, ComponentType::Resistor, 100, 100),
                poi(1, ComponentType::Corner, 101, 100),
            ],
        );
        assert_eq!(Assembler::new(unit_config()).remove_duplicates(&mut graph), 0);
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn chain_cluster_keeps_earliest_and_skips_removed_candidates() {
        // 0 and 1 are within range, 1 and 2 are within range, 0 and 2 are not.
        // Node 1 is removed by node 0, so it never removes node 2.
        let mut graph = Graph::new(
            vec![],
            vec![
                poi(0, ComponentType::Junction, 0, 0),
                poi(1, ComponentType::Junction, 8, 0),
                poi(2, ComponentType::Junction, 16, 0),
            ],
        );
        Assembler::new(unit_config()).remove_duplicates(&mut graph);
        let xs: Vec<_> = graph.nodes.iter().map(|p| p.position.x).collect();
        assert_eq!(xs, [0, 16]);
    }

    #[test]
    fn dedup_remaps_existing_links() {
        let mut nodes = vec![
            poi(0, ComponentType::Resistor, 0, 0),
            poi(1, ComponentType::Resistor, 1, 1),
            poi(2, ComponentType::Ground, 0, 200),
        ];
        nodes[0].terminals[0] = Some(PoiId(2));
        nodes[2].terminals[0] = Some(PoiId(1));
        let mut graph = Graph::new(vec![], nodes);
        Assembler::new(unit_config()).remove_duplicates(&mut graph);
        assert_eq!(graph.nodes[0].terminal(Terminal::A), Some(PoiId(1)));
        assert_eq!(graph.nodes[1].terminal(Terminal::A), None);
    }

    #[test]
    fn pass_one_records_far_endpoints_b_first() {
        let mut graph = Graph::new(
            vec![Line::from([0, 0, 0, 100]), Line::from([100, 0, 1, 1])],
            vec![poi(0, ComponentType::Corner, 0, 0)],
        );
        let filled = Assembler::new(unit_config()).discover_terminal_lines(&mut graph);
        assert_eq!(filled, 2);
        let corner = &graph.nodes[0];
        assert_eq!(corner.terminal_line(Terminal::B), Some(Point::new(0, 100)));
        assert_eq!(corner.terminal_line(Terminal::A), Some(Point::new(100, 0)));
    }

    #[test]
    fn linking_resolves_neighbors_and_never_self() {
        // Resistor at the top of a vertical wire, ground at the bottom.
        let mut graph = Graph::new(
            vec![Line::from([0, 0, 0, 100])],
            vec![
                poi(0, ComponentType::Resistor, 0, 0),
                poi(0, ComponentType::Ground, 0, 100),
            ],
        );
        Assembler::new(unit_config()).link(&mut graph);
        assert_eq!(graph.nodes[0].terminal(Terminal::B), Some(PoiId(1)));
        assert_eq!(graph.nodes[1].terminal(Terminal::B), Some(PoiId(0)));
        for (id, poi) in graph.iter() {
            for t in Terminal::ALL {
                assert_ne!(poi.terminal(t), Some(id));
            }
        }
    }

    #[test]
    fn first_match_wins() {
        let mut graph = Graph::new(
            vec![Line::from([0, 0, 0, 100])],
            vec![
                poi(0, ComponentType::Resistor, 0, 0),
                poi(1, ComponentType::Corner, 2, 100),
                poi(2, ComponentType::Ground, 0, 101),
            ],
        );
        Assembler::new(unit_config()).link(&mut graph);
        assert_eq!(graph.nodes[0].terminal(Terminal::B), Some(PoiId(1)));
    }

    fn split_radii() -> GraphConfig {
        GraphConfig {
            terminal_a_variance: 5.0,
            terminal_b_variance: 20.0,
            ..unit_config()
        }
    }

    fn with_lines(mut p: Poi, a: Option<Point>, b: Option<Point>) -> Poi {
        p.terminal_lines[Terminal::A.index()] = a;
        p.terminal_lines[Terminal::B.index()] = b;
        p
    }

    #[test]
    fn terminal_a_uses_its_own_radius() {
        let part = with_lines(
            poi(0, ComponentType::Resistor, 0, 0),
            Some(Point::new(100, 0)),
            None,
        );
        // 10px from the far end: inside the B radius, outside the A radius.
        let mut graph = Graph::new(
            vec![],
            vec![part.clone(), poi(1, ComponentType::Corner, 110, 0)],
        );
        Assembler::new(split_radii()).resolve_terminals(&mut graph);
        assert_eq!(graph.nodes[0].terminal(Terminal::A), None);

        let mut graph = Graph::new(
            vec![],
            vec![
                part,
                poi(1, ComponentType::Corner, 110, 0),
                poi(2, ComponentType::Junction, 103, 0),
            ],
        );
        Assembler::new(split_radii()).resolve_terminals(&mut graph);
        assert_eq!(graph.nodes[0].terminal(Terminal::A), Some(PoiId(2)));
    }

    #[test]
    fn terminal_b_uses_its_own_radius() {
        let mut graph = Graph::new(
            vec![],
            vec![
                with_lines(
                    poi(0, ComponentType::Resistor, 0, 0),
                    None,
                    Some(Point::new(0, 100)),
                ),
                poi(1, ComponentType::Ground, 0, 110),
            ],
        );
        Assembler::new(split_radii()).resolve_terminals(&mut graph);
        assert_eq!(graph.nodes[0].terminal(Terminal::B), Some(PoiId(1)));
        assert_eq!(graph.nodes[0].terminal(Terminal::A), None);
    }

    #[test]
    fn filled_terminal_a_falls_through_to_b() {
        // Both terminal lines end at the same point.
        let far = Point::new(100, 0);
        let mut graph = Graph::new(
            vec![],
            vec![
                with_lines(poi(0, ComponentType::Resistor, 0, 0), Some(far), Some(far)),
                poi(1, ComponentType::Corner, 101, 0),
                poi(2, ComponentType::Junction, 102, 0),
            ],
        );
        let resolved = Assembler::new(split_radii()).resolve_terminals(&mut graph);
        let part = &graph.nodes[0];
        // The first candidate matches A, so B is not tried for it.
        assert_eq!(part.terminal(Terminal::A), Some(PoiId(1)));
        assert_eq!(part.terminal(Terminal::B), Some(PoiId(2)));
        assert_eq!(resolved, 2);
    }

    #[test]
    fn linking_resolves_terminal_a_through_both_passes() {
        // Corner with two wires: the first line fills B, the second fills A.
        let mut graph = Graph::new(
            vec![Line::from([0, 0, 0, 100]), Line::from([0, 0, 100, 0])],
            vec![
                poi(0, ComponentType::Corner, 0, 0),
                poi(0, ComponentType::Resistor, 0, 110),
                poi(1, ComponentType::Capacitor, 103, 0),
            ],
        );
        Assembler::new(split_radii()).link(&mut graph);
        let corner = &graph.nodes[0];
        assert_eq!(corner.terminal_line(Terminal::A), Some(Point::new(100, 0)));
        assert_eq!(corner.terminal(Terminal::A), Some(PoiId(2)));
        assert_eq!(corner.terminal(Terminal::B), Some(PoiId(1)));
    }

    #[test]
    fn empty_detections_give_empty_graph() {
        let graph = Assembler::new(unit_config())
            .assemble(&Detections::default())
            .unwrap();
        assert!(graph.is_empty());
        assert!(graph.links().is_empty());
    }
}
