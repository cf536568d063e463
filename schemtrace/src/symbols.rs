//! LTspice symbol names and pin geometry.
//!
//! LTspice does not document where a symbol's pins sit relative to its
//! placement origin. The offsets below were measured by hand from the
//! stock `res`, `cap`, `ind` and `diode` symbols.
//!
//! ```text
//!             R0 (upright)        R90 (lying)
//!  res/ind    A (+16, +16)        A (-96, +16)
//!             B (+16, +96)        B (-16, +16)
//!  cap/diode  A (+16,   0)        A (-64, +16)
//!             B (+16, +64)        B (  0, +16)
//!  routing    (+16, +16) for every slot
//!  ground     (+16,   0) for every slot
//! ```

use crate::poi::ComponentType;
use crate::types::{Point, Rotation, Terminal};

/// Symbol name used in `SYMBOL` statements, or the net name for flags.
/// Routing points have no symbol.
pub fn alias(kind: ComponentType) -> Option<&'static str> {
    match kind {
        ComponentType::Resistor => Some("res"),
        ComponentType::Capacitor => Some("cap"),
        ComponentType::Inductor => Some("ind"),
        ComponentType::Diode => Some("diode"),
        ComponentType::Ground => Some("0"),
        ComponentType::Corner | ComponentType::Junction | ComponentType::Cross => None,
    }
}

/// Offset of a pin from the symbol's placement origin.
///
/// Only A and B are physical pins on two-terminal parts; C and D fall back
/// to the A offset. Routing points and grounds use one point for all slots.
pub fn pin_offset(kind: ComponentType, rotation: Rotation, terminal: Terminal) -> (i64, i64) {
    let is_b = terminal == Terminal::B;
    match kind {
        ComponentType::Resistor | ComponentType::Inductor => match (rotation, is_b) {
            (Rotation::R0, false) => (16, 16),
            (Rotation::R0, true) => (16, 96),
            (Rotation::R90, false) => (-96, 16),
            (Rotation::R90, true) => (-16, 16),
        },
        ComponentType::Capacitor | ComponentType::Diode => match (rotation, is_b) {
            (Rotation::R0, false) => (16, 0),
            (Rotation::R0, true) => (16, 64),
            (Rotation::R90, false) => (-64, 16),
            (Rotation::R90, true) => (0, 16),
        },
        ComponentType::Corner | ComponentType::Junction | ComponentType::Cross => (16, 16),
        ComponentType::Ground => (16, 0),
    }
}

/// Absolute pin location for a part placed at `origin`.
pub fn pin_point(
    kind: ComponentType,
    origin: Point,
    rotation: Rotation,
    terminal: Terminal,
) -> Point {
    let (dx, dy) = pin_offset(kind, rotation, terminal);
    origin.offset(dx, dy)
}

/// Where a ground flag is drawn relative to the node position.
pub fn flag_point(origin: Point) -> Point {
    origin.offset(16, 0)
}
