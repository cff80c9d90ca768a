//! Fuzz target for flat intrinsic calls.
//!
//! Feeds arbitrary `(name, args)` calls through `WarpIntrinsic::from_parts`
//! into the CPU emulator to find panics in raising, mask resolution or
//! shuffle lane arithmetic. Errors are expected; panics are not.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use warpcall_core::{Arg, IntrinsicDispatcher, IntrinsicId, WarpConfig, WarpIntrinsic};
use warpcall_cpu::{CpuWarp, Lanes};

#[derive(Debug, Arbitrary)]
enum FuzzArg {
    Splat(i32),
    SplatF32(f32),
    PerLane(Vec<i32>),
    Imm(u32),
}

/// Fuzz input: warp geometry, divergence and one flat call.
#[derive(Debug, Arbitrary)]
struct FuzzInput {
    warp_size_log2: u8,
    active: u32,
    name_idx: u8,
    unknown_name: bool,
    args: Vec<FuzzArg>,
}

fuzz_target!(|input: FuzzInput| {
    if input.args.len() > 8 {
        return;
    }

    let warp_size = 1u32 << (input.warp_size_log2 % 6);
    let Ok(cpu) = CpuWarp::with_config(WarpConfig::new().with_warp_size(warp_size)) else {
        return;
    };
    let _ = cpu.set_active_mask(input.active);
    let width = cpu.width();

    let name = if input.unknown_name {
        "cuda_match_any_sync_i32"
    } else {
        IntrinsicId::ALL[input.name_idx as usize % IntrinsicId::ALL.len()].name()
    };

    let args = input
        .args
        .into_iter()
        .map(|arg| match arg {
            FuzzArg::Splat(v) => Arg::Value(Lanes::splat_i32(width, v)),
            FuzzArg::SplatF32(v) => Arg::Value(Lanes::splat_f32(width, v)),
            FuzzArg::PerLane(mut v) => {
                v.truncate(64);
                Arg::Value(Lanes::I32(v))
            }
            FuzzArg::Imm(c) => Arg::Imm(c),
        })
        .collect();

    if let Ok(intrinsic) = WarpIntrinsic::from_parts(name, args) {
        let _ = cpu.dispatch(intrinsic);
    }
});
