//! Key selection from decoder logits.

use genie_core::Error as CoreError;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::Result;

/// Draws a key from temperature-scaled softmax probabilities.
#[derive(Debug, Clone)]
pub struct KeySampler {
    temperature: f32,
    rng: StdRng,
}

impl KeySampler {
    pub fn new(temperature: f32, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { temperature, rng }
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Pick a key index. A temperature of zero (or below) is greedy.
    pub fn sample(&mut self, logits: &[f32]) -> Result<usize> {
        if logits.iter().any(|v| !v.is_finite()) {
            return Err(CoreError::InvalidInput("logits must be finite".into()).into());
        }
        let best = argmax(logits)
            .ok_or_else(|| CoreError::InvalidInput("cannot sample from empty logits".into()))?;
        if self.temperature <= 0.0 {
            return Ok(best);
        }

        let weights = softmax(logits, self.temperature);
        let dist = WeightedIndex::new(&weights)
            .map_err(|e| CoreError::InvalidInput(format!("degenerate key distribution: {e}")))?;
        Ok(dist.sample(&mut self.rng))
    }
}

/// Index of the largest value; the first one wins ties.
pub fn argmax(values: &[f32]) -> Option<usize> {
    values
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (i, &v)| match best {
            Some((_, b)) if b >= v => best,
            _ => Some((i, v)),
        })
        .map(|(i, _)| i)
}

/// Softmax of `logits / temperature`, computed in f64.
pub fn softmax(logits: &[f32], temperature: f32) -> Vec<f64> {
    let t = f64::from(temperature);
    let max = logits
        .iter()
        .map(|&v| f64::from(v) / t)
        .fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = logits
        .iter()
        .map(|&v| (f64::from(v) / t - max).exp())
        .collect();
    let sum: f64 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}
