//! Value ⇄ bucket-index conversion at a given scale.
//!
//! Bucket `i` at scale `s` covers `(base^i, base^(i+1)]` with
//! `base = 2^(2^-s)`. Non-positive scales use exact exponent arithmetic
//! ([`ExponentMapping`]); positive scales go through the natural logarithm
//! ([`LogarithmMapping`]) with exact handling of powers of two.

use super::ieee754::{
    get_normal_base2, get_significand, pow2, MAX_NORMAL_EXPONENT, MIN_NORMAL_EXPONENT,
    MIN_NORMAL_VALUE,
};
use crate::core::{MetricsError, Result};
use once_cell::sync::Lazy;
use std::f64::consts::LOG2_E;

/// Smallest scale any mapping supports
pub const MIN_SCALE: i32 = -10;
/// Largest scale any mapping supports
pub const MAX_SCALE: i32 = 20;

/// `LOG2_E * 2^scale` for every positive scale
static SCALE_FACTORS: Lazy<[f64; MAX_SCALE as usize + 1]> = Lazy::new(|| {
    let mut factors = [0.0; MAX_SCALE as usize + 1];
    for (scale, factor) in factors.iter_mut().enumerate() {
        *factor = LOG2_E * pow2(scale as i32);
    }
    factors
});

/// Mapping for scales in `[-10, 0]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExponentMapping {
    shift: u32,
}

impl ExponentMapping {
    pub fn new(scale: i32) -> Result<Self> {
        if !(MIN_SCALE..=0).contains(&scale) {
            return Err(MetricsError::InvalidScale {
                scale,
                min: MIN_SCALE,
                max: 0,
            });
        }
        Ok(Self {
            shift: scale.unsigned_abs(),
        })
    }

    pub fn scale(&self) -> i32 {
        -(self.shift as i32)
    }

    fn min_index(&self) -> i32 {
        (MIN_NORMAL_EXPONENT - 1) >> self.shift
    }

    fn max_index(&self) -> i32 {
        MAX_NORMAL_EXPONENT >> self.shift
    }

    pub fn map_to_index(&self, value: f64) -> i32 {
        if value < MIN_NORMAL_VALUE {
            return self.min_index();
        }
        let exp = get_normal_base2(value);
        // exact powers of two sit at the top of the bucket below
        let correction = if get_significand(value) == 0 { -1 } else { 0 };
        (exp + correction) >> self.shift
    }

    pub fn get_lower_boundary(&self, index: i32) -> Result<f64> {
        if index < self.min_index() {
            return Err(MetricsError::MappingUnderflow {
                index,
                scale: self.scale(),
            });
        }
        if index > self.max_index() {
            return Err(MetricsError::MappingOverflow {
                index,
                scale: self.scale(),
            });
        }
        Ok(pow2(index << self.shift))
    }
}

/// Mapping for scales in `[1, 20]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogarithmMapping {
    scale: i32,
    scale_factor: f64,
    min_normal_lower_boundary_index: i32,
    max_normal_lower_boundary_index: i32,
}

impl LogarithmMapping {
    pub fn new(scale: i32) -> Result<Self> {
        if !(1..=MAX_SCALE).contains(&scale) {
            return Err(MetricsError::InvalidScale {
                scale,
                min: 1,
                max: MAX_SCALE,
            });
        }
        Ok(Self {
            scale,
            scale_factor: SCALE_FACTORS[scale as usize],
            min_normal_lower_boundary_index: MIN_NORMAL_EXPONENT << scale,
            max_normal_lower_boundary_index: ((MAX_NORMAL_EXPONENT + 1) << scale) - 1,
        })
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    pub fn map_to_index(&self, value: f64) -> i32 {
        if value <= MIN_NORMAL_VALUE {
            return self.min_normal_lower_boundary_index - 1;
        }

        if get_significand(value) == 0 {
            let exp = get_normal_base2(value);
            return (exp << self.scale) - 1;
        }

        let index = (value.ln() * self.scale_factor).floor() as i32;
        index.min(self.max_normal_lower_boundary_index)
    }

    pub fn get_lower_boundary(&self, index: i32) -> Result<f64> {
        if index >= self.max_normal_lower_boundary_index {
            if index == self.max_normal_lower_boundary_index {
                // computed one exponent down to stay finite
                return Ok(2.0 * ((index - (1 << self.scale)) as f64 / self.scale_factor).exp());
            }
            return Err(MetricsError::MappingOverflow {
                index,
                scale: self.scale,
            });
        }

        if index <= self.min_normal_lower_boundary_index {
            if index == self.min_normal_lower_boundary_index {
                return Ok(MIN_NORMAL_VALUE);
            }
            if index == self.min_normal_lower_boundary_index - 1 {
                return Ok(((index + (1 << self.scale)) as f64 / self.scale_factor).exp() / 2.0);
            }
            return Err(MetricsError::MappingUnderflow {
                index,
                scale: self.scale,
            });
        }

        Ok((index as f64 / self.scale_factor).exp())
    }
}

/// A mapping at any supported scale
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Mapping {
    Exponent(ExponentMapping),
    Logarithm(LogarithmMapping),
}

impl Mapping {
    /// Build the mapping for `scale`, which must lie in `[-10, 20]`
    pub fn new(scale: i32) -> Result<Self> {
        if !(MIN_SCALE..=MAX_SCALE).contains(&scale) {
            return Err(MetricsError::InvalidScale {
                scale,
                min: MIN_SCALE,
                max: MAX_SCALE,
            });
        }
        if scale > 0 {
            LogarithmMapping::new(scale).map(Mapping::Logarithm)
        } else {
            ExponentMapping::new(scale).map(Mapping::Exponent)
        }
    }

    pub fn scale(&self) -> i32 {
        match self {
            Mapping::Exponent(m) => m.scale(),
            Mapping::Logarithm(m) => m.scale(),
        }
    }

    /// Index of the bucket containing `value`, which must be positive and
    /// finite; callers pass the absolute value.
    ///
    /// Subnormal values are clamped to the lowest normal bucket, whose lower
    /// boundary lies above them. `lower < value <= upper` holds for normal
    /// values only.
    #[inline]
    pub fn map_to_index(&self, value: f64) -> i32 {
        match self {
            Mapping::Exponent(m) => m.map_to_index(value),
            Mapping::Logarithm(m) => m.map_to_index(value),
        }
    }

    /// Lower boundary of bucket `index`
    pub fn get_lower_boundary(&self, index: i32) -> Result<f64> {
        match self {
            Mapping::Exponent(m) => m.get_lower_boundary(index),
            Mapping::Logarithm(m) => m.get_lower_boundary(index),
        }
    }
}
