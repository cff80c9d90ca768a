//! Per-lane register values.

use warpcall_core::ScalarType;

/// One register across every lane of a warp.
#[derive(Debug, Clone, PartialEq)]
pub enum Lanes {
    /// Integer register.
    I32(Vec<i32>),
    /// Float register.
    F32(Vec<f32>),
}

impl Lanes {
    /// Same integer on every lane.
    pub fn splat_i32(width: usize, value: i32) -> Self {
        Lanes::I32(vec![value; width])
    }

    /// Same float on every lane.
    pub fn splat_f32(width: usize, value: f32) -> Self {
        Lanes::F32(vec![value; width])
    }

    /// A lane mask broadcast to every lane.
    pub fn mask(width: usize, mask: u32) -> Self {
        Self::splat_i32(width, mask as i32)
    }

    /// Integer register computed from the lane index.
    pub fn from_fn_i32(width: usize, f: impl FnMut(u32) -> i32) -> Self {
        Lanes::I32((0..width as u32).map(f).collect())
    }

    /// Float register computed from the lane index.
    pub fn from_fn_f32(width: usize, f: impl FnMut(u32) -> f32) -> Self {
        Lanes::F32((0..width as u32).map(f).collect())
    }

    /// Lane index on every lane (`%laneid`).
    pub fn lane_ids(width: usize) -> Self {
        Self::from_fn_i32(width, |lane| lane as i32)
    }

    /// Number of lanes.
    pub fn len(&self) -> usize {
        match self {
            Lanes::I32(v) => v.len(),
            Lanes::F32(v) => v.len(),
        }
    }

    /// Whether the register holds no lanes.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element type.
    pub fn scalar_type(&self) -> ScalarType {
        match self {
            Lanes::I32(_) => ScalarType::I32,
            Lanes::F32(_) => ScalarType::F32,
        }
    }

    /// Integer lanes, if this is an integer register.
    pub fn as_i32(&self) -> Option<&[i32]> {
        match self {
            Lanes::I32(v) => Some(v),
            Lanes::F32(_) => None,
        }
    }

    /// Float lanes, if this is a float register.
    pub fn as_f32(&self) -> Option<&[f32]> {
        match self {
            Lanes::F32(v) => Some(v),
            Lanes::I32(_) => None,
        }
    }

    /// Value on one lane of an integer register.
    pub fn lane_i32(&self, lane: usize) -> Option<i32> {
        self.as_i32().and_then(|v| v.get(lane).copied())
    }

    /// Value on one lane of a float register.
    pub fn lane_f32(&self, lane: usize) -> Option<f32> {
        self.as_f32().and_then(|v| v.get(lane).copied())
    }
}

impl From<Vec<i32>> for Lanes {
    fn from(v: Vec<i32>) -> Self {
        Lanes::I32(v)
    }
}

impl From<Vec<f32>> for Lanes {
    fn from(v: Vec<f32>) -> Self {
        Lanes::F32(v)
    }
}
