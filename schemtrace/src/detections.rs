//! Input record produced by the external detection collaborators.
//!
//! Line detection, classification and OCR run outside this crate. Their
//! results arrive as a single JSON document:
//!
//! ```json
//! {
//!   "lines": [[120, 80, 120, 400]],
//!   "classifications": {
//!     "0A": { "Resistor": 0.98, "Ground": 0.01 },
//!     "0B": { "GND": 0.99 }
//!   },
//!   "ocr": { "0A": "r1" },
//!   "scale": 0.031
//! }
//! ```
//!
//! Endpoint identifiers are `"{lineIndex}{A|B}"`, where `A` is the line's
//! start point and `B` its end point.

use crate::poi::ClassProbabilities;
use crate::types::{Line, Point};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectionError {
    #[error("Failed to read detections file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse detections JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid endpoint identifier '{0}' (expected e.g. \"12A\")")]
    InvalidEndpoint(String),
    #[error("Line {line} has coordinate {value} outside the accepted pixel range")]
    CoordinateOutOfRange { line: usize, value: i64 },
}

/// Largest accepted pixel coordinate magnitude. Keeps grid and pin
/// arithmetic far from `i64` overflow.
pub const MAX_COORDINATE: i64 = 1 << 31;

// ---------------------------------------------------------------------------
// Endpoint identifiers
// ---------------------------------------------------------------------------

/// Which end of a line segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Endpoint {
    A,
    B,
}

/// Identifier of one line endpoint, e.g. `12A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EndpointId {
    pub line: usize,
    pub end: Endpoint,
}

impl EndpointId {
    pub fn new(line: usize, end: Endpoint) -> Self {
        Self { line, end }
    }

    /// Coordinates of this endpoint on `line`.
    pub fn locate(&self, line: &Line) -> Point {
        match self.end {
            Endpoint::A => line.start,
            Endpoint::B => line.end,
        }
    }
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = match self.end {
            Endpoint::A => 'A',
            Endpoint::B => 'B',
        };
        write!(f, "{}{}", self.line, end)
    }
}

impl FromStr for EndpointId {
    type Err = DetectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DetectionError::InvalidEndpoint(s.to_string());
        let (digits, end) = match s.strip_suffix('A') {
            Some(d) => (d, Endpoint::A),
            None => (s.strip_suffix('B').ok_or_else(invalid)?, Endpoint::B),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let line = digits.parse().map_err(|_| invalid())?;
        Ok(EndpointId { line, end })
    }
}

impl TryFrom<String> for EndpointId {
    type Error = DetectionError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<EndpointId> for String {
    fn from(id: EndpointId) -> Self {
        id.to_string()
    }
}

// ---------------------------------------------------------------------------
// Detections record
// ---------------------------------------------------------------------------

/// Everything the core consumes from upstream collaborators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Detections {
    /// Detected segments, in detector order.
    #[serde(default)]
    pub lines: Vec<Line>,
    /// Classifier output per endpoint.
    #[serde(default)]
    pub classifications: BTreeMap<EndpointId, ClassProbabilities>,
    /// Recognized text near each endpoint.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub ocr: BTreeMap<EndpointId, String>,
    /// Resolution factor from the scale estimator. Overrides the configured
    /// factor when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<f64>,
}

impl Detections {
    pub fn new(lines: Vec<Line>) -> Self {
        Self {
            lines,
            ..Default::default()
        }
    }

    /// Load from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DetectionError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, DetectionError> {
        let detections: Self = serde_json::from_str(json)?;
        detections.validate()?;
        Ok(detections)
    }

    /// Reject line coordinates outside [`MAX_COORDINATE`].
    pub fn validate(&self) -> Result<(), DetectionError> {
        for (line, l) in self.lines.iter().enumerate() {
            for value in [l.start.x, l.start.y, l.end.x, l.end.y] {
                if !(-MAX_COORDINATE..=MAX_COORDINATE).contains(&value) {
                    return Err(DetectionError::CoordinateOutOfRange { line, value });
                }
            }
        }
        Ok(())
    }

    /// Builder helper: attach classifier output to an endpoint.
    pub fn classify(mut self, id: EndpointId, probs: ClassProbabilities) -> Self {
        self.classifications.insert(id, probs);
        self
    }

    /// Builder helper: attach OCR text to an endpoint.
    pub fn with_text(mut self, id: EndpointId, text: impl Into<String>) -> Self {
        self.ocr.insert(id, text.into());
        self
    }

    /// Iterate every endpoint in line order, A before B.
    pub fn endpoints(&self) -> impl Iterator<Item = (EndpointId, Point)> + '_ {
        self.lines.iter().enumerate().flat_map(|(i, line)| {
            [Endpoint::A, Endpoint::B].into_iter().map(move |end| {
                let id = EndpointId::new(i, end);
                (id, id.locate(line))
            })
        })
    }
}
