//! Addressing rules for the virtual memory segments.

use crate::ast::Segment;
use crate::error::{Result, TranslateError};

/// First of the eight `temp` registers (R5..R12).
pub const TEMP_BASE: u16 = 5;
pub const TEMP_SIZE: u16 = 8;
/// Largest literal an `@` instruction can load.
pub const MAX_CONSTANT: u16 = 0x7fff;

/// How to reach `segment[index]` on the target machine.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Location {
    /// The literal itself; only readable.
    Constant(u16),
    /// `RAM[RAM[base] + index]`, with `base` one of LCL/ARG/THIS/THAT.
    Indirect { base: &'static str, index: u16 },
    /// A single named cell: `Rn`, `THIS`/`THAT`, or a unit static.
    Direct(String),
}

pub fn base_register(segment: Segment) -> Option<&'static str> {
    match segment {
        Segment::Local => Some("LCL"),
        Segment::Argument => Some("ARG"),
        Segment::This => Some("THIS"),
        Segment::That => Some("THAT"),
        _ => None,
    }
}

/// Resolves a segment access. `unit` keys the `static` segment.
pub fn resolve(unit: &str, segment: Segment, index: u16) -> Result<Location> {
    if let Some(base) = base_register(segment) {
        return Ok(Location::Indirect { base, index });
    }
    match segment {
        Segment::Constant if index <= MAX_CONSTANT => Ok(Location::Constant(index)),
        Segment::Static => Ok(Location::Direct(format!("{}.{}", unit, index))),
        Segment::Temp if index < TEMP_SIZE => {
            Ok(Location::Direct(format!("R{}", TEMP_BASE + index)))
        }
        Segment::Pointer if index < 2 => Ok(Location::Direct(
            if index == 0 { "THIS" } else { "THAT" }.to_string(),
        )),
        _ => Err(TranslateError::IndexOutOfRange { segment, index }),
    }
}

/// Like [`resolve`], but rejects locations that cannot be written.
pub fn resolve_writable(unit: &str, segment: Segment, index: u16) -> Result<Location> {
    if segment == Segment::Constant {
        return Err(TranslateError::IllegalPop);
    }
    resolve(unit, segment, index)
}
