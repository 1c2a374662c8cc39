//! Golden-trace parity harness.
//!
//! Replays a recorded trace through a decoder, carrying the recurrent state
//! forward, and compares the produced logits with the recorded ones.

use crate::decoder::{Lifecycle, StepDecoder};
use crate::error::Error;
use crate::ledger::BufferLedger;
use crate::trace::GoldenTrace;

/// Committed bound on the cumulative absolute logit error of a trace.
pub const PARITY_TOLERANCE: f32 = 0.015;

#[derive(Debug, thiserror::Error)]
pub enum ParityFailure {
    #[error("Cumulative logit error {error} exceeds tolerance {tolerance}")]
    Tolerance { error: f64, tolerance: f32 },

    #[error("Cumulative logit error is not a finite number (first at step {step})")]
    Undefined { step: usize },

    #[error("Step {step}: decoder produced {produced} logits, trace expects {expected}")]
    LogitCount {
        step: usize,
        produced: usize,
        expected: usize,
    },

    #[error("Leaked buffers: {before} live bytes before the run, {after} after disposal")]
    Leak { before: usize, after: usize },

    #[error("Decoder failed: {0}")]
    Decoder(#[from] Error),
}

/// Summary of a successful replay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParityReport {
    pub steps: usize,
    pub cumulative_error: f64,
    pub max_abs_error: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct ParityHarness {
    tolerance: f32,
}

impl Default for ParityHarness {
    fn default() -> Self {
        Self::new(PARITY_TOLERANCE)
    }
}

impl ParityHarness {
    pub fn new(tolerance: f32) -> Self {
        Self { tolerance }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Replay `trace` through an initialised decoder.
    pub fn replay<D: StepDecoder>(
        &self,
        decoder: &D,
        trace: &GoldenTrace,
    ) -> Result<ParityReport, ParityFailure> {
        let mut state: Option<D::State> = None;
        let mut cumulative = 0.0f64;
        let mut max_abs = 0.0f32;

        for (step, (input, expected)) in trace.steps().enumerate() {
            let output = decoder.forward(&input, state.as_ref())?;
            if let Some(superseded) = state.replace(output.state) {
                drop(superseded);
            }

            if output.logits.len() != expected.len() {
                return Err(ParityFailure::LogitCount {
                    step,
                    produced: output.logits.len(),
                    expected: expected.len(),
                });
            }

            for (&produced, &wanted) in output.logits.iter().zip(expected) {
                let diff = (produced - wanted).abs();
                cumulative += f64::from(diff);
                max_abs = max_abs.max(diff);
            }
            if !cumulative.is_finite() {
                return Err(ParityFailure::Undefined { step });
            }
        }

        if cumulative > f64::from(self.tolerance) {
            return Err(ParityFailure::Tolerance {
                error: cumulative,
                tolerance: self.tolerance,
            });
        }

        tracing::debug!(
            "Parity replay of {} steps: cumulative error {:.6}, max {:.6}",
            trace.len(),
            cumulative,
            max_abs
        );

        Ok(ParityReport {
            steps: trace.len(),
            cumulative_error: cumulative,
            max_abs_error: max_abs,
        })
    }

    /// Build, initialise, replay and dispose a decoder, then check that the
    /// ledger returned to the count observed before `build` ran.
    pub fn run_isolated<D, F>(
        &self,
        ledger: &BufferLedger,
        build: F,
        trace: &GoldenTrace,
    ) -> Result<ParityReport, ParityFailure>
    where
        D: StepDecoder,
        F: FnOnce(&BufferLedger) -> Result<D, Error>,
    {
        let before = ledger.live_bytes();

        let mut decoder = build(ledger)?;
        let outcome = decoder
            .init()
            .map_err(ParityFailure::from)
            .and_then(|()| self.replay(&decoder, trace));
        if decoder.lifecycle() == Lifecycle::Ready {
            decoder.dispose()?;
        }
        drop(decoder);
        let report = outcome?;

        let after = ledger.live_bytes();
        if after != before {
            return Err(ParityFailure::Leak { before, after });
        }
        Ok(report)
    }
}
