//! Connectivity resolution for hierarchical schematic documents.
//!
//! Given a parsed document tree (from `sch-model`) and a symbol library,
//! this crate computes, for every placed symbol instance, the electrical
//! net attached to each of its pins, and emits the canonical distilled
//! representation used by downstream tooling.
//!
//! The pipeline, leaf first:
//!
//! 1. [`transform`]: pure coordinate math placing symbol-local pin
//!    geometry into sheet-absolute coordinates (rotate, then mirror, then
//!    translate).
//! 2. [`resolve`]: combines instances with library pin geometry into
//!    identity-tagged absolute pin endpoints.
//! 3. [`trace`]: per-sheet union-find over wires, junctions, bus entries
//!    and endpoints; runs in parallel across sheets.
//! 4. [`hierarchy`]: merges per-sheet groups across the sheet tree
//!    (global/power labels design-wide, sheet pins parent↔child) and
//!    applies the canonical naming policy.
//! 5. [`distill`]: walks the resolved instances and emits the
//!    [`sch_model::DistilledSchematic`].
//!
//! Recoverable problems (library misses, ambiguous labelling) accumulate
//! in [`Diagnostics`] next to best-effort output; geometry errors and
//! internal-invariant breaches abort the run.

pub mod diagnostics;
pub mod distill;
pub mod error;
pub mod hierarchy;
mod naming;
pub mod resolve;
pub mod trace;
pub mod transform;

pub use diagnostics::{Diagnostics, WithDiagnostics};
pub use distill::distill;
pub use error::DistillError;
pub use hierarchy::{DesignNets, FinalNet, propagate};
pub use resolve::{PinEndpoint, ResolvedInstance, resolve_instance};
pub use trace::{NetLabel, TracedNet, trace_sheet};
pub use transform::place_pin;
