//! CPU warp emulator.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info, trace};

use warpcall_core::{
    IntrinsicDispatcher, IntrinsicId, Result, ScalarType, ShuffleMode, ShuffleOp, VoteOp, Warp,
    WarpConfig, WarpError, WarpIntrinsic,
};

use crate::lanes::Lanes;

/// Lane field of a shuffle immediate.
const CLAMP_BITS: u32 = 0x1f;

/// Counters for intrinsics executed by a [`CpuWarp`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarpMetrics {
    /// Intrinsics dispatched, including ones that failed.
    pub dispatched: u64,
    /// Barriers completed.
    pub barriers: u64,
}

/// A single warp executed lane by lane on the CPU.
///
/// Every lane named by the active mask executes each dispatched intrinsic
/// together. Lanes outside it keep their registers untouched and read back
/// zero from votes, ballots and mask queries.
pub struct CpuWarp {
    /// Warp geometry.
    config: WarpConfig,
    /// Lanes currently executing.
    active: RwLock<u32>,
    /// Total intrinsics dispatched.
    dispatched: AtomicU64,
    /// Total barriers completed.
    barriers: AtomicU64,
}

impl Default for CpuWarp {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuWarp {
    /// Create a 32-lane warp with every lane active.
    pub fn new() -> Self {
        Self::build(WarpConfig::default())
    }

    /// Create a warp with the given geometry and every lane active.
    pub fn with_config(config: WarpConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: WarpConfig) -> Self {
        info!("Initializing CPU warp (warp_size={})", config.warp_size);

        Self {
            config,
            active: RwLock::new(config.full_mask()),
            dispatched: AtomicU64::new(0),
            barriers: AtomicU64::new(0),
        }
    }

    /// Warp geometry.
    pub fn config(&self) -> &WarpConfig {
        &self.config
    }

    /// Number of lanes.
    pub fn width(&self) -> usize {
        self.config.warp_size as usize
    }

    /// Lanes currently executing.
    pub fn active_mask(&self) -> u32 {
        *self.active.read()
    }

    /// Change which lanes execute, as after a divergent branch.
    pub fn set_active_mask(&self, mask: u32) -> Result<()> {
        let full = self.config.full_mask();
        if mask == 0 || mask & !full != 0 {
            return Err(WarpError::InvalidMask {
                name: "set_active_mask",
                mask,
                reason: format!("must be a nonempty subset of {:#010x}", full),
            });
        }

        debug!("CPU warp active mask {:#010x} -> {:#010x}", self.active_mask(), mask);
        *self.active.write() = mask;
        Ok(())
    }

    /// A mask operand naming `mask` on every lane.
    pub fn mask_lanes(&self, mask: u32) -> Lanes {
        Lanes::mask(self.width(), mask)
    }

    /// Façade bound to this warp.
    pub fn warp(&self) -> Result<Warp<'_, Self>> {
        Warp::with_config(self, self.config)
    }

    /// Execution counters.
    pub fn metrics(&self) -> WarpMetrics {
        WarpMetrics {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            barriers: self.barriers.load(Ordering::Relaxed),
        }
    }

    fn is_active(active: u32, lane: u32) -> bool {
        lane < u32::BITS && active & (1u32 << lane) != 0
    }

    /// `value` on active lanes, zero elsewhere.
    fn broadcast(&self, active: u32, value: i32) -> Lanes {
        Lanes::from_fn_i32(self.width(), |lane| {
            if Self::is_active(active, lane) {
                value
            } else {
                0
            }
        })
    }

    fn check_width(&self, name: &'static str, lanes: &Lanes) -> Result<()> {
        if lanes.len() != self.width() {
            return Err(WarpError::LaneCountMismatch {
                name,
                expected: self.width(),
                actual: lanes.len(),
            });
        }
        Ok(())
    }

    fn int_operand<'a>(&self, name: &'static str, lanes: &'a Lanes) -> Result<&'a [i32]> {
        self.check_width(name, lanes)?;
        lanes.as_i32().ok_or(WarpError::TypeMismatch {
            name,
            expected: ScalarType::I32,
            actual: lanes.scalar_type(),
        })
    }

    /// Resolve a mask operand against the executing lanes.
    ///
    /// The mask must be uniform across active lanes and, truncated to the
    /// warp width, name exactly the lanes that execute the call.
    fn participants(&self, name: &'static str, mask: &Lanes) -> Result<u32> {
        let values = self.int_operand(name, mask)?;
        let active = self.active_mask();

        let mut seen = None;
        for lane in (0..self.config.warp_size).filter(|&l| Self::is_active(active, l)) {
            let m = values[lane as usize] as u32;
            match seen {
                None => seen = Some(m),
                Some(first) if first != m => {
                    return Err(WarpError::InvalidMask {
                        name,
                        mask: first,
                        reason: format!("lane {} passes {:#010x}", lane, m),
                    });
                }
                Some(_) => {}
            }
        }

        let raw = seen.unwrap_or(0);
        let mask = raw & self.config.full_mask();
        if mask == active {
            return Ok(mask);
        }

        let reason = if active & !mask != 0 {
            format!("excludes executing lanes {:#010x}", active & !mask)
        } else {
            format!("names inactive lanes {:#010x}", mask & !active)
        };
        Err(WarpError::InvalidMask {
            name,
            mask: raw,
            reason,
        })
    }

    fn vote(&self, op: VoteOp, mask: &Lanes, predicate: &Lanes) -> Result<Lanes> {
        let name = op.id().name();
        let members = self.participants(name, mask)?;
        let preds = self.int_operand(name, predicate)?;

        let mut votes = (0..self.config.warp_size)
            .filter(|&lane| Self::is_active(members, lane))
            .map(|lane| preds[lane as usize] != 0);

        let result = match op {
            VoteOp::All => votes.all(|p| p),
            VoteOp::Any => votes.any(|p| p),
            VoteOp::Uni => match votes.next() {
                Some(first) => votes.all(|p| p == first),
                None => true,
            },
        };

        Ok(self.broadcast(members, result as i32))
    }

    fn ballot(&self, predicate: &Lanes) -> Result<Lanes> {
        let name = IntrinsicId::Ballot.name();
        let preds = self.int_operand(name, predicate)?;
        let active = self.active_mask();

        let bits = (0..self.config.warp_size)
            .filter(|&lane| Self::is_active(active, lane) && preds[lane as usize] != 0)
            .fold(0u32, |acc, lane| acc | (1u32 << lane));

        Ok(self.broadcast(active, bits as i32))
    }

    fn shuffle(
        &self,
        op: ShuffleOp,
        mask: &Lanes,
        value: Lanes,
        offset: &Lanes,
        clamp: u32,
    ) -> Result<Lanes> {
        let name = IntrinsicId::Shuffle(op).name();
        let members = self.participants(name, mask)?;
        self.check_width(name, &value)?;
        if value.scalar_type() != op.scalar_type() {
            return Err(WarpError::TypeMismatch {
                name,
                expected: op.scalar_type(),
                actual: value.scalar_type(),
            });
        }
        let offsets = self.int_operand(name, offset)?;

        let mut sources = Vec::with_capacity(self.width());
        for lane in 0..self.config.warp_size {
            if !Self::is_active(members, lane) {
                sources.push(lane as usize);
                continue;
            }
            let src = source_lane(op.mode(), lane, offsets[lane as usize] as u32, clamp);
            if src >= self.config.warp_size || !Self::is_active(members, src) {
                return Err(WarpError::InactiveSourceLane {
                    lane,
                    source_lane: src,
                });
            }
            sources.push(src as usize);
        }

        Ok(match value {
            Lanes::I32(v) => Lanes::I32(sources.iter().map(|&s| v[s]).collect()),
            Lanes::F32(v) => Lanes::F32(sources.iter().map(|&s| v[s]).collect()),
        })
    }

    fn barrier(&self, mask: &Lanes) -> Result<()> {
        let members = self.participants(IntrinsicId::Barrier.name(), mask)?;
        self.barriers.fetch_add(1, Ordering::Relaxed);
        trace!("CPU warp barrier released lanes {:#010x}", members);
        Ok(())
    }
}

/// Lane a shuffle reads from, following `shfl.sync` clamp semantics.
///
/// `b` contributes only its low five bits in every mode. `c` packs the clamp
/// value in bits 0..5 and the segment mask in bits 8..13. Sources outside the
/// lane's segment fall back to the lane itself.
fn source_lane(mode: ShuffleMode, lane: u32, b: u32, c: u32) -> u32 {
    let b = b & CLAMP_BITS;
    let clamp = c & CLAMP_BITS;
    let segmask = (c >> 8) & CLAMP_BITS;
    let min_lane = lane & segmask;
    let max_lane = i64::from(min_lane | (clamp & !segmask));

    let (j, in_range) = match mode {
        ShuffleMode::Up => {
            let j = i64::from(lane) - i64::from(b);
            (j, j >= max_lane)
        }
        ShuffleMode::Down => {
            let j = i64::from(lane) + i64::from(b);
            (j, j <= max_lane)
        }
        ShuffleMode::Xor => {
            let j = i64::from(lane ^ b);
            (j, j <= max_lane)
        }
        ShuffleMode::Idx => {
            let j = i64::from(min_lane | (b & !segmask));
            (j, j <= max_lane)
        }
    };

    if in_range {
        j as u32
    } else {
        lane
    }
}

impl IntrinsicDispatcher for CpuWarp {
    type Value = Lanes;

    fn dispatch(&self, intrinsic: WarpIntrinsic<Lanes>) -> Result<Option<Lanes>> {
        self.dispatched.fetch_add(1, Ordering::Relaxed);

        match intrinsic {
            WarpIntrinsic::Vote {
                op,
                mask,
                predicate,
            } => self.vote(op, &mask, &predicate).map(Some),
            WarpIntrinsic::Ballot { predicate } => self.ballot(&predicate).map(Some),
            WarpIntrinsic::Shuffle {
                op,
                mask,
                value,
                offset,
                clamp,
            } => self.shuffle(op, &mask, value, &offset, clamp).map(Some),
            WarpIntrinsic::ActiveMask => {
                let active = self.active_mask();
                Ok(Some(self.broadcast(active, active as i32)))
            }
            WarpIntrinsic::Barrier { mask } => self.barrier(&mask).map(|()| None),
        }
    }
}
