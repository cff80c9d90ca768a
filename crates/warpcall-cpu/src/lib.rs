//! # warpcall CPU emulator
//!
//! Executes warp intrinsics lane by lane on the host. Kernel bodies written
//! against [`warpcall_core::Warp`] can be run and checked without a GPU.
//!
//! ```
//! use warpcall_cpu::{CpuWarp, Lanes};
//!
//! let cpu = CpuWarp::new();
//! let warp = cpu.warp().unwrap();
//!
//! let mask = cpu.mask_lanes(warpcall_core::FULL_MASK);
//! let evens = Lanes::from_fn_i32(32, |lane| (lane % 2 == 0) as i32);
//! let ballot = warp.ballot(evens).unwrap();
//! assert_eq!(ballot.lane_i32(0), Some(0x5555_5555));
//!
//! let all = warp.all_nonzero(mask, Lanes::splat_i32(32, 1)).unwrap();
//! assert_eq!(all.lane_i32(31), Some(1));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod emulator;
mod lanes;

pub use emulator::{CpuWarp, WarpMetrics};
pub use lanes::Lanes;
