//! Affine mapping between discrete button indices and a bounded real signal.

use crate::error::{Error, Result};

/// Maps `levels` evenly spaced indices onto `[min, max]` and back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quantizer {
    levels: usize,
    min: f32,
    max: f32,
}

impl Quantizer {
    pub fn new(levels: usize, min: f32, max: f32) -> Result<Self> {
        if levels < 2 {
            return Err(Error::Configuration(format!(
                "quantizer needs at least 2 levels, got {levels}"
            )));
        }
        if !min.is_finite() || !max.is_finite() || min >= max {
            return Err(Error::Configuration(format!(
                "quantizer interval [{min}, {max}] is empty or not finite"
            )));
        }
        if !(max - min).is_finite() {
            return Err(Error::Configuration(format!(
                "quantizer interval [{min}, {max}] is too wide to represent"
            )));
        }
        Ok(Self { levels, min, max })
    }

    /// `levels` indices over `[-1, 1]`.
    pub fn symmetric(levels: usize) -> Result<Self> {
        Self::new(levels, -1.0, 1.0)
    }

    pub fn levels(&self) -> usize {
        self.levels
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    fn step(&self) -> f32 {
        (self.max - self.min) / (self.levels - 1) as f32
    }

    pub fn discrete_to_real(&self, index: usize) -> Result<f32> {
        if index >= self.levels {
            return Err(Error::InvalidControl {
                index,
                alphabet: self.levels,
            });
        }
        let t = index as f32 / (self.levels - 1) as f32;
        Ok((self.min + t * (self.max - self.min)).clamp(self.min, self.max))
    }

    /// Nearest level to `value`, clamped into range. NaN maps to level 0.
    pub fn real_to_discrete(&self, value: f32) -> usize {
        let position = ((value - self.min) / self.step()).round();
        if position.is_nan() || position <= 0.0 {
            0
        } else {
            (position as usize).min(self.levels - 1)
        }
    }

    /// Holds no buffers; present so every component shares the same lifecycle.
    pub fn dispose(self) {}
}
