//! LTspice `.asc` schematic export.
//!
//! Output layout is one `SHEET` header, then every `WIRE`, then every
//! `SYMBOL`/`FLAG`. LTspice's parser accepts wires ahead of the parts they
//! attach to, and keeping them grouped makes the file diff cleanly.
//!
//! ```text
//! SHEET 1 1000 1000
//! WIRE 112 64 112 -16
//! SYMBOL res 96 48 R0
//! FLAG 112 -16 0
//! ```

use crate::config::GraphConfig;
use crate::graph::Graph;
use crate::symbols::{alias, flag_point, pin_point};
use crate::types::{Point, Rotation, Terminal};
use std::fmt;
use std::fs::{self, Permissions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EmitError {
    #[error("Failed to write schematic to {}: {source}", path.display())]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One line of an `.asc` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Sheet { width: u32, height: u32 },
    Wire { from: Point, to: Point },
    Symbol { name: &'static str, origin: Point, rotation: Rotation },
    InstName(String),
    Flag { at: Point, net: &'static str },
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Statement::Sheet { width, height } => write!(f, "SHEET 1 {width} {height}"),
            Statement::Wire { from, to } => {
                write!(f, "WIRE {} {} {} {}", from.x, from.y, to.x, to.y)
            }
            Statement::Symbol { name, origin, rotation } => {
                write!(f, "SYMBOL {name} {} {} {rotation}", origin.x, origin.y)
            }
            Statement::InstName(label) => write!(f, "SYMATTR InstName {label}"),
            Statement::Flag { at, net } => write!(f, "FLAG {} {} {net}", at.x, at.y),
        }
    }
}

/// Serializes a normalized [`Graph`] to `.asc` text.
#[derive(Debug, Clone)]
pub struct AscEmitter {
    config: GraphConfig,
}

impl AscEmitter {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn header(&self) -> Statement {
        Statement::Sheet {
            width: self.config.sheet_width,
            height: self.config.sheet_height,
        }
    }

    /// One wire per resolved terminal, A then B for each node.
    ///
    /// Both ends use the slot's terminal role: a node's A link runs from
    /// its own A pin to the neighbor's A pin.
    pub fn wires(&self, graph: &Graph) -> Vec<Statement> {
        let mut out = Vec::new();
        for (id, poi) in graph.iter() {
            for t in [Terminal::A, Terminal::B] {
                let Some(to) = poi.terminal(t) else {
                    tracing::debug!(node = %poi.endpoint, terminal = %t, "unresolved terminal, no wire");
                    continue;
                };
                let Some(target) = graph.node(to) else {
                    tracing::warn!(node = %id, neighbor = %to, "terminal points outside the graph");
                    continue;
                };
                out.push(Statement::Wire {
                    from: pin_point(poi.kind, poi.position, poi.rotation, t),
                    to: pin_point(target.kind, target.position, target.rotation, t),
                });
            }
        }
        out
    }

    /// Symbol placements for parts and flags for grounds.
    pub fn symbols(&self, graph: &Graph) -> Vec<Statement> {
        let mut out = Vec::new();
        for poi in &graph.nodes {
            let Some(name) = alias(poi.kind) else {
                continue;
            };
            if poi.kind.is_two_terminal() {
                out.push(Statement::Symbol {
                    name,
                    origin: poi.position,
                    rotation: poi.rotation,
                });
                if self.config.emit_labels {
                    if let Some(label) = &poi.label {
                        out.push(Statement::InstName(label.clone()));
                    }
                }
            } else {
                out.push(Statement::Flag {
                    at: flag_point(poi.position),
                    net: name,
                });
            }
        }
        out
    }

    /// Header, wires, then symbols.
    pub fn statements(&self, graph: &Graph) -> Vec<Statement> {
        let mut out = vec![self.header()];
        out.extend(self.wires(graph));
        out.extend(self.symbols(graph));
        out
    }

    /// Render the complete file; every line is newline-terminated.
    pub fn render(&self, graph: &Graph) -> String {
        let statements = self.statements(graph);
        tracing::debug!(statements = statements.len(), "rendered schematic");
        let mut out = String::with_capacity(statements.len() * 24);
        for s in &statements {
            out.push_str(&s.to_string());
            out.push('\n');
        }
        out
    }

    /// Render and write to `path`.
    ///
    /// The text goes to a temporary file beside the destination which is
    /// then renamed over it, so readers never see a half-written schematic.
    pub fn write(&self, graph: &Graph, path: impl AsRef<Path>) -> Result<(), EmitError> {
        let path = path.as_ref();
        let text = self.render(graph);
        write_atomic(path, text.as_bytes()).map_err(|source| EmitError::WriteFailure {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    // Write through symlinks instead of replacing them.
    let dest = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    if let Some(perms) = output_permissions(&dest)? {
        tmp.as_file().set_permissions(perms)?;
    }
    tmp.persist(&dest).map_err(|e| e.error)?;
    Ok(())
}

/// Permissions the written file should end up with: those of the file being
/// replaced, or an ordinary world-readable mode for a new file.
fn output_permissions(dest: &Path) -> io::Result<Option<Permissions>> {
    match fs::metadata(dest) {
        Ok(meta) => Ok(Some(meta.permissions())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(new_file_permissions()),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn new_file_permissions() -> Option<Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detections::{Endpoint, EndpointId};
    use crate::poi::{ComponentType, Poi};
    use crate::types::PoiId;

    fn poi(kind: ComponentType, x: i64, y: i64, rotation: Rotation) -> Poi {
        let mut p = Poi::new(EndpointId::new(0, Endpoint::A), kind, Point::new(x, y), 0.99);
        p.rotation = rotation;
        p
    }

    fn resistor_to_ground() -> Graph {
        let mut r = poi(ComponentType::Resistor, 0, 0, Rotation::R0);
        r.terminals[Terminal::A.index()] = Some(PoiId(1));
        let g = poi(ComponentType::Ground, 0, -16, Rotation::R90);
        Graph::new(vec![], vec![r, g])
    }

    #[test]
    fn statement_formatting() {
        let wire = Statement::Wire { from: Point::new(1, 2), to: Point::new(3, -4) };
        assert_eq!(wire.to_string(), "WIRE 1 2 3 -4");
        let sym = Statement::Symbol { name: "cap", origin: Point::new(96, 48), rotation: Rotation::R90 };
        assert_eq!(sym.to_string(), "SYMBOL cap 96 48 R90");
        let flag = Statement::Flag { at: Point::new(16, 0), net: "0" };
        assert_eq!(flag.to_string(), "FLAG 16 0 0");
    }

    #[test]
    fn wire_uses_pin_offsets_of_both_ends() {
        let emitter = AscEmitter::new(GraphConfig::default());
        let wires = emitter.wires(&resistor_to_ground());
        assert_eq!(
            wires,
            vec![Statement::Wire { from: Point::new(16, 16), to: Point::new(16, -16) }]
        );
    }

    #[test]
    fn header_then_wires_then_symbols() {
        let text = AscEmitter::new(GraphConfig::default()).render(&resistor_to_ground());
        assert_eq!(
            text,
            "SHEET 1 1000 1000\nWIRE 16 16 16 -16\nSYMBOL res 0 0 R0\nFLAG 16 -16 0\n"
        );
    }

    #[test]
    fn routing_points_are_not_drawn() {
        let graph = Graph::new(
            vec![],
            vec![
                poi(ComponentType::Corner, 0, 0, Rotation::R90),
                poi(ComponentType::Junction, 48, 0, Rotation::R90),
                poi(ComponentType::Cross, 96, 0, Rotation::R90),
            ],
        );
        assert!(AscEmitter::new(GraphConfig::default()).symbols(&graph).is_empty());
    }

    #[test]
    fn labels_only_with_opt_in() {
        let mut r = poi(ComponentType::Resistor, 0, 0, Rotation::R0);
        r.label = Some("R3".into());
        let graph = Graph::new(vec![], vec![r]);

        let plain = AscEmitter::new(GraphConfig::default()).render(&graph);
        assert!(!plain.contains("SYMATTR"));

        let config = GraphConfig { emit_labels: true, ..Default::default() };
        let labelled = AscEmitter::new(config).render(&graph);
        assert!(labelled.ends_with("SYMBOL res 0 0 R0\nSYMATTR InstName R3\n"));
    }

    #[test]
    fn empty_graph_is_header_only() {
        let text = AscEmitter::new(GraphConfig::default()).render(&Graph::default());
        assert_eq!(text, "SHEET 1 1000 1000\n");
    }

    #[test]
    fn write_to_missing_directory_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("no/such/dir/out.asc");
        let err = AscEmitter::new(GraphConfig::default())
            .write(&Graph::default(), &path)
            .unwrap_err();
        assert!(matches!(err, EmitError::WriteFailure { path: p, .. } if p == path));
    }
}
