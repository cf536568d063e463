//! Points of interest: the typed nodes of the schematic graph.
//!
//! Every accepted line endpoint becomes one [`Poi`]. An endpoint is accepted
//! only when the classifier is confident about it; ambiguous detections are
//! dropped rather than guessed.

use crate::detections::EndpointId;
use crate::types::{Point, PoiId, Rotation, Terminal};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Default classification floor. The winning probability must exceed it.
pub const CONFIDENCE_FLOOR: f64 = 0.95;

// ---------------------------------------------------------------------------
// Component types
// ---------------------------------------------------------------------------

/// Closed set of classifier labels.
///
/// Declaration order is significant: it is the argmax tie-break order, and
/// `Resistor..=Diode` are the two-terminal parts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ComponentType {
    Resistor,
    Capacitor,
    Inductor,
    Diode,
    Corner,
    Junction,
    Cross,
    Ground,
}

impl ComponentType {
    pub const ALL: [ComponentType; 8] = [
        ComponentType::Resistor,
        ComponentType::Capacitor,
        ComponentType::Inductor,
        ComponentType::Diode,
        ComponentType::Corner,
        ComponentType::Junction,
        ComponentType::Cross,
        ComponentType::Ground,
    ];

    /// Parts drawn as a symbol with an A and a B pin.
    pub fn is_two_terminal(self) -> bool {
        matches!(
            self,
            ComponentType::Resistor
                | ComponentType::Capacitor
                | ComponentType::Inductor
                | ComponentType::Diode
        )
    }

    /// Types that pull nearby nodes onto their row and column during grid
    /// alignment.
    pub fn is_alignment_anchor(self) -> bool {
        matches!(
            self,
            ComponentType::Corner | ComponentType::Junction | ComponentType::Ground
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ComponentType::Resistor => "Resistor",
            ComponentType::Capacitor => "Capacitor",
            ComponentType::Inductor => "Inductor",
            ComponentType::Diode => "Diode",
            ComponentType::Corner => "Corner",
            ComponentType::Junction => "Junction",
            ComponentType::Cross => "Cross",
            ComponentType::Ground => "Ground",
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error for a classifier label outside the closed type set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown component class label '{0}'")]
pub struct UnknownClass(pub String);

impl FromStr for ComponentType {
    type Err = UnknownClass;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("gnd") {
            return Ok(ComponentType::Ground);
        }
        ComponentType::ALL
            .into_iter()
            .find(|k| k.name().eq_ignore_ascii_case(t))
            .ok_or_else(|| UnknownClass(s.to_string()))
    }
}

impl TryFrom<String> for ComponentType {
    type Error = UnknownClass;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ComponentType> for String {
    fn from(k: ComponentType) -> Self {
        k.name().to_string()
    }
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Per-endpoint classifier output: probability per component type.
///
/// Labels absent from the map count as probability zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassProbabilities(pub BTreeMap<ComponentType, f64>);

impl ClassProbabilities {
    pub fn get(&self, kind: ComponentType) -> f64 {
        self.0.get(&kind).copied().unwrap_or(0.0)
    }

    /// Argmax over the type set. Ties go to the earliest type.
    pub fn best(&self) -> (ComponentType, f64) {
        let mut best = (ComponentType::Resistor, self.get(ComponentType::Resistor));
        for kind in ComponentType::ALL.into_iter().skip(1) {
            let p = self.get(kind);
            if p > best.1 {
                best = (kind, p);
            }
        }
        best
    }

    /// Validity rule: accept the argmax type only when its probability is
    /// strictly greater than `floor`.
    pub fn classify(&self, floor: f64) -> Option<(ComponentType, f64)> {
        let (kind, p) = self.best();
        (p > floor).then_some((kind, p))
    }
}

impl FromIterator<(ComponentType, f64)> for ClassProbabilities {
    fn from_iter<I: IntoIterator<Item = (ComponentType, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A classified point of interest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    /// Line endpoint this node was derived from.
    pub endpoint: EndpointId,
    pub kind: ComponentType,
    pub position: Point,
    pub rotation: Rotation,
    /// Far endpoint of each line leaving this node, by terminal slot.
    pub terminal_lines: [Option<Point>; 4],
    /// Resolved neighbor per terminal slot. Never overwritten once set.
    pub terminals: [Option<PoiId>; 4],
    /// OCR designator such as `R1`. Descriptive only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Winning classifier probability.
    pub confidence: f64,
}

impl Poi {
    pub fn new(endpoint: EndpointId, kind: ComponentType, position: Point, confidence: f64) -> Self {
        Self {
            endpoint,
            kind,
            position,
            rotation: Rotation::default(),
            terminal_lines: [None; 4],
            terminals: [None; 4],
            label: None,
            confidence,
        }
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn terminal_line(&self, t: Terminal) -> Option<Point> {
        self.terminal_lines[t.index()]
    }

    pub fn terminal(&self, t: Terminal) -> Option<PoiId> {
        self.terminals[t.index()]
    }

    /// Record a discovered terminal line. B fills before A; returns the slot
    /// used, or `None` when both are taken.
    pub fn push_terminal_line(&mut self, far_end: Point) -> Option<Terminal> {
        let slot = [Terminal::B, Terminal::A]
            .into_iter()
            .find(|t| self.terminal_lines[t.index()].is_none())?;
        self.terminal_lines[slot.index()] = Some(far_end);
        Some(slot)
    }

    /// Resolve a terminal to `neighbor` unless it is already resolved.
    /// Returns whether the slot was written.
    pub fn resolve_terminal(&mut self, t: Terminal, neighbor: PoiId) -> bool {
        let slot = &mut self.terminals[t.index()];
        if slot.is_some() {
            return false;
        }
        *slot = Some(neighbor);
        true
    }
}

impl fmt::Display for Poi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} @ {} {}",
            self.endpoint, self.kind, self.position, self.rotation
        )?;
        if let Some(label) = &self.label {
            write!(f, " [{label}]")?;
        }
        write!(f, " p={:.3}", self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detections::Endpoint;

    fn probs(pairs: &[(ComponentType, f64)]) -> ClassProbabilities {
        pairs.iter().copied().collect()
    }

    #[test]
    fn confident_endpoint_is_accepted() {
        let p = probs(&[(ComponentType::Resistor, 0.01), (ComponentType::Ground, 0.97)]);
        assert_eq!(p.classify(CONFIDENCE_FLOOR), Some((ComponentType::Ground, 0.97)));
    }

    #[test]
    fn floor_is_exclusive() {
        let p = probs(&[(ComponentType::Diode, 0.95)]);
        assert_eq!(p.classify(CONFIDENCE_FLOOR), None);
    }

    #[test]
    fn argmax_tie_prefers_earlier_type() {
        let p = probs(&[(ComponentType::Junction, 0.5), (ComponentType::Capacitor, 0.5)]);
        assert_eq!(p.best().0, ComponentType::Capacitor);
    }

    #[test]
    fn empty_probabilities_are_rejected() {
        assert_eq!(ClassProbabilities::default().classify(CONFIDENCE_FLOOR), None);
    }

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!("GND".parse::<ComponentType>().unwrap(), ComponentType::Ground);
        assert_eq!("resistor".parse::<ComponentType>().unwrap(), ComponentType::Resistor);
        assert!("Transistor".parse::<ComponentType>().is_err());
    }

    #[test]
    fn terminal_lines_fill_b_first() {
        let mut poi = Poi::new(
            EndpointId::new(0, Endpoint::A),
            ComponentType::Resistor,
            Point::new(0, 0),
            0.99,
        );
        assert_eq!(poi.push_terminal_line(Point::new(0, 50)), Some(Terminal::B));
        assert_eq!(poi.push_terminal_line(Point::new(50, 0)), Some(Terminal::A));
        assert_eq!(poi.push_terminal_line(Point::new(9, 9)), None);
        assert_eq!(poi.terminal_line(Terminal::B), Some(Point::new(0, 50)));
    }

    #[test]
    fn resolved_terminal_is_never_overwritten() {
        let mut poi = Poi::new(
            EndpointId::new(0, Endpoint::B),
            ComponentType::Capacitor,
            Point::new(0, 0),
            0.99,
        );
        assert!(poi.resolve_terminal(Terminal::A, PoiId(3)));
        assert!(!poi.resolve_terminal(Terminal::A, PoiId(4)));
        assert_eq!(poi.terminal(Terminal::A), Some(PoiId(3)));
    }
}
