//! Error types for warp intrinsic dispatch.

use thiserror::Error;

use crate::types::ScalarType;

/// Result type for warp intrinsic operations.
pub type Result<T> = std::result::Result<T, WarpError>;

/// Errors raised by the façade, by intrinsic lowering, or by a dispatcher.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WarpError {
    /// Operation exists in the API but has no dispatch target.
    #[error("Not implemented: {0}")]
    NotImplemented(&'static str),

    /// Name does not correspond to any known intrinsic.
    #[error("Unknown intrinsic: {0}")]
    UnknownIntrinsic(String),

    /// Wrong number of arguments for an intrinsic.
    #[error("Intrinsic {name} expects {expected} arguments, got {actual}")]
    ArityMismatch {
        /// Intrinsic name.
        name: &'static str,
        /// Expected argument count.
        expected: usize,
        /// Actual argument count.
        actual: usize,
    },

    /// A value sits where an immediate is required, or the reverse.
    #[error("Intrinsic {name}: argument {position} must be {expected}")]
    OperandKind {
        /// Intrinsic name.
        name: &'static str,
        /// Zero-based argument position.
        position: usize,
        /// Expected kind ("a value" or "an immediate").
        expected: &'static str,
    },

    /// Dispatcher returned nothing for a value-producing intrinsic.
    #[error("Intrinsic {0} produced no result")]
    MissingResult(&'static str),

    /// Warp width is not usable.
    #[error("Invalid warp size: {0} (must be a power of two in 1..=32)")]
    InvalidWarpSize(u32),

    /// Lane mask is malformed or does not match the executing lanes.
    #[error("Invalid lane mask {mask:#010x} for {name}: {reason}")]
    InvalidMask {
        /// Intrinsic name.
        name: &'static str,
        /// Offending mask.
        mask: u32,
        /// What is wrong with it.
        reason: String,
    },

    /// Operand has the wrong scalar type.
    #[error("Type mismatch in {name}: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Intrinsic name.
        name: &'static str,
        /// Expected type.
        expected: ScalarType,
        /// Actual type.
        actual: ScalarType,
    },

    /// Operand does not carry one value per lane.
    #[error("Intrinsic {name} expects {expected} lanes, got {actual}")]
    LaneCountMismatch {
        /// Intrinsic name.
        name: &'static str,
        /// Warp width.
        expected: usize,
        /// Lanes supplied.
        actual: usize,
    },

    /// Shuffle reads from a lane that is not executing.
    #[error("Lane {lane} reads from inactive lane {source_lane}")]
    InactiveSourceLane {
        /// Reading lane.
        lane: u32,
        /// Source lane.
        source_lane: u32,
    },

    /// Failure reported by the dispatcher itself.
    #[error("Dispatch error: {0}")]
    Dispatch(String),
}
