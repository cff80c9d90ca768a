//! Warp intrinsics façade.
//!
//! [`Warp`] exposes the warp-level primitives a kernel body calls. Every
//! method builds one [`WarpIntrinsic`] and hands it to the dispatcher; no
//! semantics are computed here.

use tracing::{trace, warn};

use crate::dispatch::IntrinsicDispatcher;
use crate::error::{Result, WarpError};
use crate::intrinsic::{ShuffleOp, VoteOp, WarpIntrinsic};
use crate::types::WarpConfig;

/// Warp-level intrinsics bound to a dispatcher.
///
/// # Example
///
/// ```
/// use warpcall_core::{RecordingDispatcher, Warp, Arg, FULL_MASK};
///
/// let recorder = RecordingDispatcher::new(0i64);
/// let warp = Warp::new(&recorder);
/// warp.shfl_sync_i32(FULL_MASK as i64, 42, 5).unwrap();
///
/// let calls = recorder.calls();
/// assert_eq!(calls[0].name, "cuda_shfl_sync_i32");
/// assert_eq!(calls[0].args[3], Arg::Imm(31));
/// ```
pub struct Warp<'d, D: IntrinsicDispatcher + ?Sized> {
    dispatcher: &'d D,
    config: WarpConfig,
}

impl<'d, D: IntrinsicDispatcher + ?Sized> Warp<'d, D> {
    /// Bind to a dispatcher targeting a 32-lane warp.
    pub fn new(dispatcher: &'d D) -> Self {
        Self {
            dispatcher,
            config: WarpConfig::default(),
        }
    }

    /// Bind to a dispatcher with explicit warp geometry.
    pub fn with_config(dispatcher: &'d D, config: WarpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { dispatcher, config })
    }

    /// Warp geometry.
    #[inline]
    pub fn config(&self) -> &WarpConfig {
        &self.config
    }

    // === Votes ===

    /// Nonzero iff `predicate` is nonzero on every lane in `mask`.
    pub fn all_nonzero(&self, mask: D::Value, predicate: D::Value) -> Result<D::Value> {
        self.vote(VoteOp::All, mask, predicate)
    }

    /// Nonzero iff `predicate` is nonzero on any lane in `mask`.
    pub fn any_nonzero(&self, mask: D::Value, predicate: D::Value) -> Result<D::Value> {
        self.vote(VoteOp::Any, mask, predicate)
    }

    /// Nonzero iff `predicate` agrees on every lane in `mask`.
    pub fn unique(&self, mask: D::Value, predicate: D::Value) -> Result<D::Value> {
        self.vote(VoteOp::Uni, mask, predicate)
    }

    /// Bitmask of lanes where `predicate` is nonzero.
    pub fn ballot(&self, predicate: D::Value) -> Result<D::Value> {
        self.call(WarpIntrinsic::Ballot { predicate })
    }

    // === Shuffles ===

    /// `val` read from lane `offset`.
    pub fn shfl_sync_i32(
        &self,
        mask: D::Value,
        val: D::Value,
        offset: D::Value,
    ) -> Result<D::Value> {
        self.shuffle(ShuffleOp::SyncI32, mask, val, offset)
    }

    /// `val` read from lane `offset`.
    pub fn shfl_sync_f32(
        &self,
        mask: D::Value,
        val: D::Value,
        offset: D::Value,
    ) -> Result<D::Value> {
        self.shuffle(ShuffleOp::SyncF32, mask, val, offset)
    }

    /// `val` read from `lane - offset`; lanes below `offset` keep their own.
    pub fn shfl_up_i32(&self, mask: D::Value, val: D::Value, offset: D::Value) -> Result<D::Value> {
        self.shuffle(ShuffleOp::UpI32, mask, val, offset)
    }

    /// `val` read from `lane - offset`; lanes below `offset` keep their own.
    pub fn shfl_up_f32(&self, mask: D::Value, val: D::Value, offset: D::Value) -> Result<D::Value> {
        self.shuffle(ShuffleOp::UpF32, mask, val, offset)
    }

    /// `val` read from `lane + offset`; lanes past the top keep their own.
    pub fn shfl_down_i32(
        &self,
        mask: D::Value,
        val: D::Value,
        offset: D::Value,
    ) -> Result<D::Value> {
        self.shuffle(ShuffleOp::DownI32, mask, val, offset)
    }

    /// `val` read from `lane + offset`; lanes past the top keep their own.
    pub fn shfl_down_f32(
        &self,
        mask: D::Value,
        val: D::Value,
        offset: D::Value,
    ) -> Result<D::Value> {
        self.shuffle(ShuffleOp::DownF32, mask, val, offset)
    }

    /// `val` read from `lane ^ offset`.
    pub fn shfl_xor_i32(
        &self,
        mask: D::Value,
        val: D::Value,
        offset: D::Value,
    ) -> Result<D::Value> {
        self.shuffle(ShuffleOp::XorI32, mask, val, offset)
    }

    // === Match ===

    /// Lanes holding the same value as the caller.
    ///
    /// Has no dispatch target yet and always fails.
    pub fn match_any(&self) -> Result<D::Value> {
        warn!("match_any invoked but has no dispatch target");
        Err(WarpError::NotImplemented("match_any"))
    }

    /// Whether every lane holds the same value.
    ///
    /// Has no dispatch target yet and always fails.
    pub fn match_all(&self) -> Result<D::Value> {
        warn!("match_all invoked but has no dispatch target");
        Err(WarpError::NotImplemented("match_all"))
    }

    // === Mask and barrier ===

    /// Bitmask of lanes currently executing.
    pub fn active_mask(&self) -> Result<D::Value> {
        self.call(WarpIntrinsic::ActiveMask)
    }

    /// Block until every lane in `mask` arrives.
    pub fn sync(&self, mask: D::Value) -> Result<()> {
        self.dispatch(WarpIntrinsic::Barrier { mask })?;
        Ok(())
    }

    fn vote(&self, op: VoteOp, mask: D::Value, predicate: D::Value) -> Result<D::Value> {
        self.call(WarpIntrinsic::Vote {
            op,
            mask,
            predicate,
        })
    }

    fn shuffle(
        &self,
        op: ShuffleOp,
        mask: D::Value,
        value: D::Value,
        offset: D::Value,
    ) -> Result<D::Value> {
        self.call(WarpIntrinsic::shuffle(
            op,
            mask,
            value,
            offset,
            &self.config,
        ))
    }

    /// Dispatch an intrinsic that must produce a value.
    fn call(&self, intrinsic: WarpIntrinsic<D::Value>) -> Result<D::Value> {
        let name = intrinsic.name();
        self.dispatch(intrinsic)?.ok_or(WarpError::MissingResult(name))
    }

    fn dispatch(&self, intrinsic: WarpIntrinsic<D::Value>) -> Result<Option<D::Value>> {
        trace!("Dispatching warp intrinsic '{}'", intrinsic.name());
        self.dispatcher.dispatch(intrinsic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::RecordingDispatcher;
    use crate::intrinsic::Arg;

    #[test]
    fn test_shuffle_uses_configured_clamp() {
        let recorder = RecordingDispatcher::new(0u32);
        let warp = Warp::with_config(&recorder, WarpConfig::new().with_warp_size(16)).unwrap();

        warp.shfl_down_f32(1, 2, 3).unwrap();
        warp.shfl_up_i32(1, 2, 3).unwrap();

        let calls = recorder.calls();
        assert_eq!(calls[0].args.last(), Some(&Arg::Imm(15)));
        assert_eq!(calls[1].args.last(), Some(&Arg::Imm(0)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let recorder = RecordingDispatcher::new(0u32);
        let result = Warp::with_config(&recorder, WarpConfig::new().with_warp_size(12));
        assert!(matches!(result, Err(WarpError::InvalidWarpSize(12))));
    }

    #[test]
    fn test_match_placeholders_do_not_dispatch() {
        let recorder = RecordingDispatcher::new(0u32);
        let warp = Warp::new(&recorder);

        assert_eq!(
            warp.match_any().unwrap_err(),
            WarpError::NotImplemented("match_any")
        );
        assert_eq!(
            warp.match_all().unwrap_err(),
            WarpError::NotImplemented("match_all")
        );
        assert!(recorder.is_empty());
    }

    struct Silent;

    impl IntrinsicDispatcher for Silent {
        type Value = u32;

        fn dispatch(&self, _intrinsic: WarpIntrinsic<u32>) -> Result<Option<u32>> {
            Ok(None)
        }
    }

    #[test]
    fn test_missing_result() {
        let warp = Warp::new(&Silent);
        assert_eq!(
            warp.ballot(1).unwrap_err(),
            WarpError::MissingResult("cuda_ballot_i32")
        );
        assert!(warp.sync(0xFFFF_FFFF).is_ok());
    }

    #[test]
    fn test_sync_and_values_share_one_dispatch_path() {
        let recorder = RecordingDispatcher::new(9u32);
        let warp = Warp::new(&recorder);

        warp.sync(0xF).unwrap();
        assert_eq!(warp.active_mask().unwrap(), 9);

        let calls = recorder.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].name, "warp_barrier");
        assert_eq!(calls[0].args, vec![Arg::Value(0xF)]);
        assert_eq!(calls[1].name, "cuda_active_mask");
    }

    struct Failing;

    impl IntrinsicDispatcher for Failing {
        type Value = u32;

        fn dispatch(&self, intrinsic: WarpIntrinsic<u32>) -> Result<Option<u32>> {
            Err(WarpError::Dispatch(format!("no lowering for {}", intrinsic.name())))
        }
    }

    #[test]
    fn test_dispatcher_errors_surface_unchanged() {
        let warp = Warp::new(&Failing);
        assert_eq!(
            warp.sync(1).unwrap_err(),
            WarpError::Dispatch("no lowering for warp_barrier".to_string())
        );
        assert_eq!(
            warp.active_mask().unwrap_err(),
            WarpError::Dispatch("no lowering for cuda_active_mask".to_string())
        );
    }
}
