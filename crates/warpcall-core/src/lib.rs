//! # warpcall core
//!
//! Typed warp-level GPU intrinsics for SIMT kernels.
//!
//! A kernel body talks to [`Warp`], which turns each primitive (votes,
//! ballot, shuffles, active mask, barrier) into exactly one
//! [`WarpIntrinsic`] and hands it to an [`IntrinsicDispatcher`]. The
//! dispatcher is owned by whatever gives the intrinsic meaning: a compiler
//! backend lowering it to an instruction, or the CPU emulator in
//! `warpcall-cpu`.
//!
//! ## Core Abstractions
//!
//! - [`WarpIntrinsic`] - Intrinsic with its operands and fixed immediates
//! - [`IntrinsicId`] - Name table for the dispatchable intrinsics
//! - [`InternalCall`] - Flat `(name, args)` form for name-indexed backends
//! - [`IntrinsicDispatcher`] - The single seam to the runtime
//! - [`Warp`] - The façade kernel bodies call
//!
//! ## Example
//!
//! ```
//! use warpcall_core::prelude::*;
//!
//! let recorder = RecordingDispatcher::new(0u32);
//! let warp = Warp::new(&recorder);
//!
//! warp.sync(FULL_MASK).unwrap();
//! assert!(warp.match_any().is_err());
//!
//! let calls = recorder.calls();
//! assert_eq!(calls.len(), 1);
//! assert_eq!(calls[0].name, "warp_barrier");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod dispatch;
pub mod error;
pub mod intrinsic;
pub mod types;
pub mod warp;

pub use dispatch::{IntrinsicDispatcher, RecordingDispatcher};
pub use error::{Result, WarpError};
pub use intrinsic::{
    Arg, InternalCall, IntrinsicId, ShuffleMode, ShuffleOp, VoteOp, WarpIntrinsic,
};
pub use types::{ScalarType, WarpConfig, FULL_MASK, SHFL_UP_CLAMP, WARP_SIZE};
pub use warp::Warp;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::dispatch::{IntrinsicDispatcher, RecordingDispatcher};
    pub use crate::error::{Result, WarpError};
    pub use crate::intrinsic::{
        Arg, InternalCall, IntrinsicId, ShuffleMode, ShuffleOp, VoteOp, WarpIntrinsic,
    };
    pub use crate::types::{ScalarType, WarpConfig, FULL_MASK, WARP_SIZE};
    pub use crate::warp::Warp;
}
