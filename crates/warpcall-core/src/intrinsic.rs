//! Warp intrinsic definitions.
//!
//! [`WarpIntrinsic`] is the typed form handed to a dispatcher. Each variant
//! carries exactly the operands its instruction takes. [`InternalCall`] is the
//! flat, name-indexed form a compiler backend consumes: an operation name
//! followed by value operands and then literal immediates.

use serde::Serialize;

use crate::error::{Result, WarpError};
use crate::types::{ScalarType, WarpConfig, SHFL_UP_CLAMP};

/// Warp vote flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VoteOp {
    /// Predicate nonzero on every participating lane.
    All,
    /// Predicate nonzero on at least one participating lane.
    Any,
    /// Predicate identical on every participating lane.
    Uni,
}

impl VoteOp {
    /// Intrinsic implementing this vote.
    pub fn id(&self) -> IntrinsicId {
        match self {
            VoteOp::All => IntrinsicId::AllSync,
            VoteOp::Any => IntrinsicId::AnySync,
            VoteOp::Uni => IntrinsicId::UniSync,
        }
    }
}

/// Source-lane addressing of a shuffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShuffleMode {
    /// Read from an absolute lane.
    Idx,
    /// Read from `lane - offset`.
    Up,
    /// Read from `lane + offset`.
    Down,
    /// Read from `lane ^ offset`.
    Xor,
}

impl ShuffleMode {
    /// Clamp immediate appended to the dispatched call.
    ///
    /// Up shuffles clamp against the bottom of the segment; all others
    /// clamp against the highest lane.
    pub fn clamp(&self, config: &WarpConfig) -> u32 {
        match self {
            ShuffleMode::Up => SHFL_UP_CLAMP,
            ShuffleMode::Idx | ShuffleMode::Down | ShuffleMode::Xor => config.lane_clamp(),
        }
    }
}

/// The shuffle instructions the façade exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShuffleOp {
    /// Indexed shuffle of an `i32`.
    SyncI32,
    /// Indexed shuffle of an `f32`.
    SyncF32,
    /// Shuffle-up of an `i32`.
    UpI32,
    /// Shuffle-up of an `f32`.
    UpF32,
    /// Shuffle-down of an `i32`.
    DownI32,
    /// Shuffle-down of an `f32`.
    DownF32,
    /// Butterfly shuffle of an `i32`.
    XorI32,
}

impl ShuffleOp {
    /// Every shuffle op.
    pub const ALL: [ShuffleOp; 7] = [
        ShuffleOp::SyncI32,
        ShuffleOp::SyncF32,
        ShuffleOp::UpI32,
        ShuffleOp::UpF32,
        ShuffleOp::DownI32,
        ShuffleOp::DownF32,
        ShuffleOp::XorI32,
    ];

    /// Lane addressing mode.
    pub fn mode(&self) -> ShuffleMode {
        match self {
            ShuffleOp::SyncI32 | ShuffleOp::SyncF32 => ShuffleMode::Idx,
            ShuffleOp::UpI32 | ShuffleOp::UpF32 => ShuffleMode::Up,
            ShuffleOp::DownI32 | ShuffleOp::DownF32 => ShuffleMode::Down,
            ShuffleOp::XorI32 => ShuffleMode::Xor,
        }
    }

    /// Type of the shuffled value.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            ShuffleOp::SyncF32 | ShuffleOp::UpF32 | ShuffleOp::DownF32 => ScalarType::F32,
            ShuffleOp::SyncI32 | ShuffleOp::UpI32 | ShuffleOp::DownI32 | ShuffleOp::XorI32 => {
                ScalarType::I32
            }
        }
    }
}

/// Identity of a dispatchable intrinsic, independent of its operands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntrinsicId {
    /// `cuda_all_sync_i32`
    AllSync,
    /// `cuda_any_sync_i32`
    AnySync,
    /// `cuda_uni_sync_i32`
    UniSync,
    /// `cuda_ballot_i32`
    Ballot,
    /// One of the `cuda_shfl_*` family.
    Shuffle(ShuffleOp),
    /// `cuda_active_mask`
    ActiveMask,
    /// `warp_barrier`
    Barrier,
}

impl IntrinsicId {
    /// Every dispatchable intrinsic.
    pub const ALL: [IntrinsicId; 13] = [
        IntrinsicId::AllSync,
        IntrinsicId::AnySync,
        IntrinsicId::UniSync,
        IntrinsicId::Ballot,
        IntrinsicId::Shuffle(ShuffleOp::SyncI32),
        IntrinsicId::Shuffle(ShuffleOp::SyncF32),
        IntrinsicId::Shuffle(ShuffleOp::UpI32),
        IntrinsicId::Shuffle(ShuffleOp::UpF32),
        IntrinsicId::Shuffle(ShuffleOp::DownI32),
        IntrinsicId::Shuffle(ShuffleOp::DownF32),
        IntrinsicId::Shuffle(ShuffleOp::XorI32),
        IntrinsicId::ActiveMask,
        IntrinsicId::Barrier,
    ];

    /// Name the runtime resolves this intrinsic by.
    pub fn name(&self) -> &'static str {
        match self {
            IntrinsicId::AllSync => "cuda_all_sync_i32",
            IntrinsicId::AnySync => "cuda_any_sync_i32",
            IntrinsicId::UniSync => "cuda_uni_sync_i32",
            IntrinsicId::Ballot => "cuda_ballot_i32",
            IntrinsicId::Shuffle(ShuffleOp::SyncI32) => "cuda_shfl_sync_i32",
            IntrinsicId::Shuffle(ShuffleOp::SyncF32) => "cuda_shfl_sync_f32",
            IntrinsicId::Shuffle(ShuffleOp::UpI32) => "cuda_shfl_up_sync_i32",
            IntrinsicId::Shuffle(ShuffleOp::UpF32) => "cuda_shfl_up_sync_f32",
            IntrinsicId::Shuffle(ShuffleOp::DownI32) => "cuda_shfl_down_sync_i32",
            IntrinsicId::Shuffle(ShuffleOp::DownF32) => "cuda_shfl_down_sync_f32",
            IntrinsicId::Shuffle(ShuffleOp::XorI32) => "cuda_shfl_xor_sync_i32",
            IntrinsicId::ActiveMask => "cuda_active_mask",
            IntrinsicId::Barrier => "warp_barrier",
        }
    }

    /// Parse a dispatched name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.name() == name)
    }

    /// Number of value operands.
    pub fn operand_count(&self) -> usize {
        match self {
            IntrinsicId::AllSync | IntrinsicId::AnySync | IntrinsicId::UniSync => 2,
            IntrinsicId::Ballot | IntrinsicId::Barrier => 1,
            IntrinsicId::Shuffle(_) => 3,
            IntrinsicId::ActiveMask => 0,
        }
    }

    /// Number of trailing immediates.
    pub fn immediate_count(&self) -> usize {
        match self {
            IntrinsicId::Shuffle(_) => 1,
            _ => 0,
        }
    }

    /// Total positional arguments in the lowered call.
    pub fn arity(&self) -> usize {
        self.operand_count() + self.immediate_count()
    }

    /// Whether the intrinsic yields a value.
    pub fn returns_value(&self) -> bool {
        !matches!(self, IntrinsicId::Barrier)
    }

    /// Whether the intrinsic needs the ambient runtime context pointer.
    ///
    /// Warp intrinsics are single instructions and never do.
    pub fn requires_runtime_context(&self) -> bool {
        false
    }
}

impl std::fmt::Display for IntrinsicId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Positional argument of a lowered call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Arg<V> {
    /// Caller-supplied operand, forwarded unchanged.
    Value(V),
    /// Literal constant fixed by the intrinsic.
    Imm(u32),
}

impl<V> Arg<V> {
    /// The literal, if this is an immediate.
    pub fn as_imm(&self) -> Option<u32> {
        match self {
            Arg::Imm(c) => Some(*c),
            Arg::Value(_) => None,
        }
    }
}

/// Flat, name-indexed form of an intrinsic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternalCall<V> {
    /// Dispatched name.
    pub name: &'static str,
    /// Positional arguments: value operands, then immediates.
    pub args: Vec<Arg<V>>,
    /// Whether the runtime context pointer is passed.
    pub with_runtime_context: bool,
}

/// A warp intrinsic with its operands.
///
/// `V` is whatever the dispatcher uses to represent a per-lane value: an IR
/// handle in a compiler, a lane vector in an emulator.
#[derive(Debug, Clone, PartialEq)]
pub enum WarpIntrinsic<V> {
    /// `__all_sync` / `__any_sync` / `__uni_sync` style vote.
    Vote {
        /// Vote flavour.
        op: VoteOp,
        /// Participating lanes.
        mask: V,
        /// Per-lane predicate.
        predicate: V,
    },
    /// Bitmask of lanes with a nonzero predicate.
    Ballot {
        /// Per-lane predicate.
        predicate: V,
    },
    /// Register exchange between lanes.
    Shuffle {
        /// Which shuffle.
        op: ShuffleOp,
        /// Participating lanes.
        mask: V,
        /// Value to exchange.
        value: V,
        /// Source lane, delta or xor mask depending on the mode.
        offset: V,
        /// Clamp immediate.
        clamp: u32,
    },
    /// Bitmask of executing lanes.
    ActiveMask,
    /// Warp-level barrier.
    Barrier {
        /// Participating lanes.
        mask: V,
    },
}

impl<V> WarpIntrinsic<V> {
    /// Build a shuffle whose clamp comes from the warp geometry.
    pub fn shuffle(op: ShuffleOp, mask: V, value: V, offset: V, config: &WarpConfig) -> Self {
        WarpIntrinsic::Shuffle {
            op,
            mask,
            value,
            offset,
            clamp: op.mode().clamp(config),
        }
    }

    /// Identity of this intrinsic.
    pub fn id(&self) -> IntrinsicId {
        match self {
            WarpIntrinsic::Vote { op, .. } => op.id(),
            WarpIntrinsic::Ballot { .. } => IntrinsicId::Ballot,
            WarpIntrinsic::Shuffle { op, .. } => IntrinsicId::Shuffle(*op),
            WarpIntrinsic::ActiveMask => IntrinsicId::ActiveMask,
            WarpIntrinsic::Barrier { .. } => IntrinsicId::Barrier,
        }
    }

    /// Dispatched name.
    #[inline]
    pub fn name(&self) -> &'static str {
        self.id().name()
    }

    /// Whether the runtime context pointer is required.
    #[inline]
    pub fn requires_runtime_context(&self) -> bool {
        self.id().requires_runtime_context()
    }

    /// Flatten into the name-indexed call form.
    pub fn lower(self) -> InternalCall<V> {
        let id = self.id();
        let args = match self {
            WarpIntrinsic::Vote {
                mask, predicate, ..
            } => vec![Arg::Value(mask), Arg::Value(predicate)],
            WarpIntrinsic::Ballot { predicate } => vec![Arg::Value(predicate)],
            WarpIntrinsic::Shuffle {
                mask,
                value,
                offset,
                clamp,
                ..
            } => vec![
                Arg::Value(mask),
                Arg::Value(value),
                Arg::Value(offset),
                Arg::Imm(clamp),
            ],
            WarpIntrinsic::ActiveMask => Vec::new(),
            WarpIntrinsic::Barrier { mask } => vec![Arg::Value(mask)],
        };

        InternalCall {
            name: id.name(),
            args,
            with_runtime_context: id.requires_runtime_context(),
        }
    }

    /// Rebuild a typed intrinsic from a dispatched name and its arguments.
    pub fn from_parts(name: &str, args: Vec<Arg<V>>) -> Result<Self> {
        let id = IntrinsicId::from_name(name)
            .ok_or_else(|| WarpError::UnknownIntrinsic(name.to_string()))?;

        let intrinsic = match id {
            IntrinsicId::AllSync | IntrinsicId::AnySync | IntrinsicId::UniSync => {
                let op = match id {
                    IntrinsicId::AllSync => VoteOp::All,
                    IntrinsicId::AnySync => VoteOp::Any,
                    _ => VoteOp::Uni,
                };
                let [mask, predicate] = positional::<V, 2>(id, args)?;
                WarpIntrinsic::Vote {
                    op,
                    mask: operand(id, 0, mask)?,
                    predicate: operand(id, 1, predicate)?,
                }
            }
            IntrinsicId::Ballot => {
                let [predicate] = positional::<V, 1>(id, args)?;
                WarpIntrinsic::Ballot {
                    predicate: operand(id, 0, predicate)?,
                }
            }
            IntrinsicId::Shuffle(op) => {
                let [mask, value, offset, clamp] = positional::<V, 4>(id, args)?;
                WarpIntrinsic::Shuffle {
                    op,
                    mask: operand(id, 0, mask)?,
                    value: operand(id, 1, value)?,
                    offset: operand(id, 2, offset)?,
                    clamp: immediate(id, 3, &clamp)?,
                }
            }
            IntrinsicId::ActiveMask => {
                positional::<V, 0>(id, args)?;
                WarpIntrinsic::ActiveMask
            }
            IntrinsicId::Barrier => {
                let [mask] = positional::<V, 1>(id, args)?;
                WarpIntrinsic::Barrier {
                    mask: operand(id, 0, mask)?,
                }
            }
        };

        Ok(intrinsic)
    }
}

/// Exactly `N` positional arguments.
fn positional<V, const N: usize>(id: IntrinsicId, args: Vec<Arg<V>>) -> Result<[Arg<V>; N]> {
    <[Arg<V>; N]>::try_from(args).map_err(|args| WarpError::ArityMismatch {
        name: id.name(),
        expected: N,
        actual: args.len(),
    })
}

fn operand<V>(id: IntrinsicId, position: usize, arg: Arg<V>) -> Result<V> {
    match arg {
        Arg::Value(v) => Ok(v),
        Arg::Imm(_) => Err(WarpError::OperandKind {
            name: id.name(),
            position,
            expected: "a value",
        }),
    }
}

fn immediate<V>(id: IntrinsicId, position: usize, arg: &Arg<V>) -> Result<u32> {
    arg.as_imm().ok_or(WarpError::OperandKind {
        name: id.name(),
        position,
        expected: "an immediate",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intrinsic_lookup() {
        assert_eq!(
            IntrinsicId::from_name("cuda_all_sync_i32"),
            Some(IntrinsicId::AllSync)
        );
        assert_eq!(
            IntrinsicId::from_name("cuda_shfl_up_sync_f32"),
            Some(IntrinsicId::Shuffle(ShuffleOp::UpF32))
        );
        assert_eq!(
            IntrinsicId::from_name("warp_barrier"),
            Some(IntrinsicId::Barrier)
        );
        assert_eq!(IntrinsicId::from_name("cuda_shfl_xor_sync_f32"), None);
        assert_eq!(IntrinsicId::from_name("cuda_match_any"), None);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = IntrinsicId::ALL.iter().map(|id| id.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), IntrinsicId::ALL.len());
    }

    #[test]
    fn test_shuffle_clamp_constants() {
        let config = WarpConfig::default();
        assert_eq!(ShuffleMode::Idx.clamp(&config), 31);
        assert_eq!(ShuffleMode::Down.clamp(&config), 31);
        assert_eq!(ShuffleMode::Xor.clamp(&config), 31);
        assert_eq!(ShuffleMode::Up.clamp(&config), 0);

        let narrow = WarpConfig::new().with_warp_size(16);
        assert_eq!(ShuffleMode::Down.clamp(&narrow), 15);
        assert_eq!(ShuffleMode::Up.clamp(&narrow), 0);
    }

    #[test]
    fn test_shuffle_op_shape() {
        assert_eq!(ShuffleOp::XorI32.mode(), ShuffleMode::Xor);
        assert_eq!(ShuffleOp::UpF32.scalar_type(), ScalarType::F32);
        assert_eq!(ShuffleOp::DownI32.scalar_type(), ScalarType::I32);
    }

    #[test]
    fn test_lower_shuffle() {
        let call = WarpIntrinsic::shuffle(
            ShuffleOp::DownF32,
            "m",
            "v",
            "o",
            &WarpConfig::default(),
        )
        .lower();

        assert_eq!(call.name, "cuda_shfl_down_sync_f32");
        assert_eq!(
            call.args,
            vec![Arg::Value("m"), Arg::Value("v"), Arg::Value("o"), Arg::Imm(31)]
        );
        assert!(!call.with_runtime_context);
    }

    #[test]
    fn test_lower_active_mask_has_no_args() {
        let call = WarpIntrinsic::<u32>::ActiveMask.lower();
        assert_eq!(call.name, "cuda_active_mask");
        assert!(call.args.is_empty());
    }

    #[test]
    fn test_from_parts_vote() {
        let intrinsic =
            WarpIntrinsic::from_parts("cuda_uni_sync_i32", vec![Arg::Value(1), Arg::Value(2)])
                .unwrap();
        assert_eq!(
            intrinsic,
            WarpIntrinsic::Vote {
                op: VoteOp::Uni,
                mask: 1,
                predicate: 2
            }
        );
    }

    #[test]
    fn test_from_parts_keeps_clamp() {
        let call = WarpIntrinsic::shuffle(ShuffleOp::UpI32, 1, 2, 3, &WarpConfig::default())
            .lower();
        let raised = WarpIntrinsic::from_parts(call.name, call.args).unwrap();
        assert_eq!(
            raised,
            WarpIntrinsic::Shuffle {
                op: ShuffleOp::UpI32,
                mask: 1,
                value: 2,
                offset: 3,
                clamp: 0
            }
        );
    }

    #[test]
    fn test_from_parts_unknown_name() {
        let err = WarpIntrinsic::<i32>::from_parts("cuda_match_all", vec![]).unwrap_err();
        assert_eq!(err, WarpError::UnknownIntrinsic("cuda_match_all".to_string()));
    }

    #[test]
    fn test_from_parts_arity() {
        let err = WarpIntrinsic::from_parts("warp_barrier", vec![Arg::Value(1), Arg::Value(2)])
            .unwrap_err();
        assert_eq!(
            err,
            WarpError::ArityMismatch {
                name: "warp_barrier",
                expected: 1,
                actual: 2
            }
        );
    }

    #[test]
    fn test_from_parts_operand_kind() {
        let err = WarpIntrinsic::from_parts(
            "cuda_shfl_sync_i32",
            vec![Arg::Value(1), Arg::Imm(2), Arg::Value(3), Arg::Imm(31)],
        )
        .unwrap_err();
        assert!(matches!(err, WarpError::OperandKind { position: 1, .. }));

        let err = WarpIntrinsic::from_parts(
            "cuda_shfl_sync_i32",
            vec![Arg::Value(1), Arg::Value(2), Arg::Value(3), Arg::Value(31)],
        )
        .unwrap_err();
        assert!(matches!(
            err,
            WarpError::OperandKind {
                position: 3,
                expected: "an immediate",
                ..
            }
        ));
    }

    #[test]
    fn test_intrinsic_requirements() {
        for id in IntrinsicId::ALL {
            assert!(!id.requires_runtime_context(), "{id} must not need context");
        }
        assert!(!IntrinsicId::Barrier.returns_value());
        assert!(IntrinsicId::ActiveMask.returns_value());
        assert_eq!(IntrinsicId::Shuffle(ShuffleOp::SyncF32).arity(), 4);
        assert_eq!(IntrinsicId::Ballot.arity(), 1);
    }

    #[test]
    fn test_from_parts_every_shape() {
        assert_eq!(
            WarpIntrinsic::<u8>::from_parts("cuda_active_mask", vec![]).unwrap(),
            WarpIntrinsic::ActiveMask
        );
        assert_eq!(
            WarpIntrinsic::from_parts("cuda_ballot_i32", vec![Arg::Value(7u8)]).unwrap(),
            WarpIntrinsic::Ballot { predicate: 7 }
        );
        assert_eq!(
            WarpIntrinsic::from_parts("warp_barrier", vec![Arg::Value(3u8)]).unwrap(),
            WarpIntrinsic::Barrier { mask: 3 }
        );

        let err = WarpIntrinsic::<u8>::from_parts("cuda_active_mask", vec![Arg::Imm(0)])
            .unwrap_err();
        assert_eq!(
            err,
            WarpError::ArityMismatch {
                name: "cuda_active_mask",
                expected: 0,
                actual: 1
            }
        );

        let err = WarpIntrinsic::<u8>::from_parts("warp_barrier", vec![Arg::Imm(1)]).unwrap_err();
        assert!(matches!(
            err,
            WarpError::OperandKind {
                position: 0,
                expected: "a value",
                ..
            }
        ));
    }

    #[test]
    fn test_arg_as_imm() {
        assert_eq!(Arg::<u8>::Imm(31).as_imm(), Some(31));
        assert_eq!(Arg::Value(31u8).as_imm(), None);
    }
}
