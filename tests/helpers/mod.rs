//! Test helpers and fixtures for Genie integration tests
//!
//! The bundled model under `tests/data/` is a small decoder with the full
//! 8-button / 88-key alphabets: 16-wide input projection, two 16-wide LSTM
//! layers, default parameter names. `golden_trace.json` holds 128 steps of
//! its reference output.
//!
//! ## Tolerance Levels
//!
//! Use the appropriate tolerance from [`tolerances`] module:
//! - `FLOAT_EPSILON` (1e-6): Same computation on the same backend
//! - `LOGIT_EPSILON` (1e-4): Per-logit agreement across layouts or backends
//! - `PARITY_TOLERANCE` (0.015): Cumulative error over a whole trace

#![allow(dead_code)]

pub mod tolerances;

use genie::core::{BufferLedger, GoldenTrace, ParameterStore};
use genie::prelude::*;
use std::path::PathBuf;

/// Steps in the committed golden trace.
pub const GOLDEN_STEPS: usize = 128;

/// Directory holding the committed fixtures.
pub fn test_data_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("data")
}

pub fn manifest_path() -> PathBuf {
    test_data_dir().join("weights_manifest.json")
}

pub fn trace_path() -> PathBuf {
    test_data_dir().join("golden_trace.json")
}

pub fn load_store() -> ParameterStore {
    ParameterStore::load(manifest_path()).expect("Failed to load test parameters")
}

pub fn load_trace() -> GoldenTrace {
    GoldenTrace::load(trace_path()).expect("Failed to load golden trace")
}

/// Create a CPU test engine over the bundled model with a fixed seed.
pub fn test_engine(temperature: f32, seed: u64) -> GenieEngine {
    test_engine_with_ledger(temperature, seed, BufferLedger::new())
}

pub fn test_engine_with_ledger(temperature: f32, seed: u64, ledger: BufferLedger) -> GenieEngine {
    GenieEngine::builder()
        .manifest(manifest_path())
        .placement(DevicePlacement::Cpu)
        .temperature(temperature)
        .seed(seed)
        .ledger(ledger)
        .build()
        .expect("Failed to create test engine")
}

/// Copy the fixture manifest and payload into `dir`, returning the new
/// manifest path. The payload is passed through `edit_payload` first.
pub fn copy_fixture(dir: &std::path::Path, edit_payload: impl FnOnce(&mut Vec<u8>)) -> PathBuf {
    let manifest = dir.join("weights_manifest.json");
    std::fs::copy(manifest_path(), &manifest).expect("copy manifest");
    let mut payload = std::fs::read(test_data_dir().join("group1-shard1of1.bin")).expect("read payload");
    edit_payload(&mut payload);
    std::fs::write(dir.join("group1-shard1of1.bin"), payload).expect("write payload");
    manifest
}

/// Index of the largest value.
pub fn argmax(values: &[f32]) -> usize {
    genie::argmax(values).expect("non-empty logits")
}

/// Sum of absolute element-wise differences.
pub fn cumulative_abs_diff(a: &[f32], b: &[f32]) -> f64 {
    assert_eq!(a.len(), b.len(), "length mismatch");
    a.iter()
        .zip(b)
        .map(|(x, y)| f64::from((x - y).abs()))
        .sum()
}
