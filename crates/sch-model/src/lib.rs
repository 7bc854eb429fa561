//! Data model for the schematic distiller.
//!
//! This crate holds the *passive* side of the distiller: the in-memory
//! document tree handed over by the upstream parser (sheets, placed symbol
//! instances, wires, junctions, labels), the symbol-library contract used to
//! look up canonical pin geometry, and the distilled output structures
//! consumed by downstream tooling (netlist export, rule checking, BOM
//! generation).  Everything is serialisable with `serde` so documents and
//! results can be stored or transferred as JSON.
//!
//! All coordinates are exact fixed-point grid units ([`Point`] is integer
//! valued) – connectivity decisions never involve floating-point tolerance.
//!
//! The engine that turns a [`SchematicDoc`] into a
//! [`DistilledSchematic`] lives in the `sch-distill` crate.

pub mod distilled;
pub mod document;
pub mod geometry;
pub mod library;

pub use distilled::{DistilledComponent, DistilledNet, DistilledPin, DistilledSchematic, PinRef};
pub use document::{
    BusEntry, BusRange, Junction, Label, LabelKind, SchematicDoc, Sheet, SheetInstance, SheetPath,
    SheetPathParseError, SheetPin, SymbolInstance, WireSegment,
};
pub use geometry::{MirrorAxis, Placement, Point, strictly_on_segment};
pub use library::{PinType, SymbolDefinition, SymbolLibrary, SymbolPin, SymbolTable};
