//! Scalar types, warp constants and warp configuration.

use serde::{Deserialize, Serialize};

use crate::error::{Result, WarpError};

/// Lanes per warp on the default target.
pub const WARP_SIZE: u32 = 32;

/// Mask naming every lane of a 32-lane warp.
pub const FULL_MASK: u32 = 0xFFFF_FFFF;

/// Clamp immediate for shuffle-up. The lower segment bound is lane 0.
pub const SHFL_UP_CLAMP: u32 = 0;

/// Scalar element type carried by typed intrinsics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// 32-bit signed integer.
    I32,
    /// 32-bit float.
    F32,
}

impl ScalarType {
    /// Suffix used in dispatched intrinsic names.
    pub fn suffix(&self) -> &'static str {
        match self {
            ScalarType::I32 => "i32",
            ScalarType::F32 => "f32",
        }
    }
}

impl std::fmt::Display for ScalarType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Warp geometry used to derive shuffle clamp constants.
///
/// ```
/// use warpcall_core::WarpConfig;
///
/// let config = WarpConfig::new().with_warp_size(16);
/// assert!(config.validate().is_ok());
/// assert_eq!(config.lane_clamp(), 15);
/// assert_eq!(config.full_mask(), 0xFFFF);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarpConfig {
    /// Number of lanes in a warp.
    pub warp_size: u32,
}

impl Default for WarpConfig {
    fn default() -> Self {
        Self {
            warp_size: WARP_SIZE,
        }
    }
}

impl WarpConfig {
    /// Configuration for a 32-lane warp.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the warp width.
    pub fn with_warp_size(mut self, warp_size: u32) -> Self {
        self.warp_size = warp_size;
        self
    }

    /// Check that the warp width is a power of two no wider than a `u32` mask.
    pub fn validate(&self) -> Result<()> {
        if self.warp_size == 0 || self.warp_size > WARP_SIZE || !self.warp_size.is_power_of_two()
        {
            return Err(WarpError::InvalidWarpSize(self.warp_size));
        }
        Ok(())
    }

    /// Highest lane index; the clamp immediate for idx, down and xor shuffles.
    #[inline]
    pub fn lane_clamp(&self) -> u32 {
        self.warp_size.saturating_sub(1)
    }

    /// Mask naming every lane of this warp.
    #[inline]
    pub fn full_mask(&self) -> u32 {
        match self.warp_size {
            0 => 0,
            n if n >= WARP_SIZE => FULL_MASK,
            n => (1u32 << n) - 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WarpConfig::default();
        assert_eq!(config.warp_size, 32);
        assert_eq!(config.lane_clamp(), 31);
        assert_eq!(config.full_mask(), FULL_MASK);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_warp_sizes() {
        for size in [0, 3, 24, 64] {
            let config = WarpConfig::new().with_warp_size(size);
            assert_eq!(config.validate(), Err(WarpError::InvalidWarpSize(size)));
        }
    }

    #[test]
    fn test_narrow_warp() {
        let config = WarpConfig::new().with_warp_size(8);
        assert_eq!(config.lane_clamp(), 7);
        assert_eq!(config.full_mask(), 0xFF);
    }

    #[test]
    fn test_config_from_json() {
        let config: WarpConfig = serde_json::from_str(r#"{"warp_size": 16}"#).unwrap();
        assert_eq!(config.warp_size, 16);

        let config: WarpConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, WarpConfig::default());
    }

    #[test]
    fn test_scalar_type_suffix() {
        assert_eq!(ScalarType::I32.to_string(), "i32");
        assert_eq!(ScalarType::F32.suffix(), "f32");
    }
}
