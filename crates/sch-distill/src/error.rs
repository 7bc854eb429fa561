use thiserror::Error;

/// Everything that can go wrong while distilling a document.
///
/// Two of the kinds are fatal (geometry that cannot be trusted, or a broken
/// internal invariant) and abort the run; the other two accumulate into the
/// diagnostics list so a caller sees the full picture alongside best-effort
/// output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DistillError {
    #[error("invalid rotation {rotation}° on {reference} (must be 0, 90, 180 or 270)")]
    InvalidTransform { reference: String, rotation: i32 },

    #[error("symbol '{symbol}' unit {unit} referenced by {reference} not found in library")]
    UnresolvedSymbol {
        reference: String,
        symbol: String,
        unit: u32,
    },

    #[error("conflicting {tier} labels on one net: {candidates:?} (falling back to '{fallback}')")]
    ConflictingNetName {
        /// Label tier the conflict occurred in ("power", "global", ...).
        tier: &'static str,
        /// The distinct label texts found, sorted.
        candidates: Vec<String>,
        /// The anonymous name the net was given instead.
        fallback: String,
    },

    #[error("pin {pin} of {reference} was never assigned to a net")]
    IncompleteResolution { reference: String, pin: String },
}

impl DistillError {
    /// Fatal errors abort distillation of the whole document; the rest are
    /// reported and the run continues.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DistillError::InvalidTransform { .. } | DistillError::IncompleteResolution { .. }
        )
    }
}
