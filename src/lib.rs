//! # Genie - eight buttons in, piano keys out
//!
//! A 2-layer LSTM step decoder that turns presses on eight buttons into keys
//! on an 88-key piano, one step per press.
//!
//! ## Architecture
//!
//! Genie is an umbrella crate that coordinates:
//! - **genie-core** - Weights manifest, parameter store, quantizer, buffer
//!   ledger, step decoder trait and golden-trace parity harness
//! - **genie-burn** - Burn decoder on CPU (NdArray) or GPU (wgpu)
//!
//! On top of these it adds the interactive session ([`Performance`]), key
//! sampling ([`KeySampler`]), a keyboard map and the [`GenieEngine`] builder.
//!
//! ## Quick Start
//!
//! ```ignore
//! use genie::prelude::*;
//!
//! let mut engine = GenieEngine::builder()
//!     .manifest("model/weights_manifest.json")
//!     .seed(7)
//!     .build()?;
//!
//! for (i, c) in "1234".chars().enumerate() {
//!     if let Some(press) = engine.press_char(c, i as f64 * 0.25)? {
//!         println!("{} -> MIDI {}", c, press.midi_note);
//!     }
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `default` - Burn backend
//! - `burn` - [`GenieEngine`], [`BurnDecoder`] and CPU/GPU dispatch

/// Re-export of genie-core for direct access
pub use genie_core as core;

pub use genie_core::{
    BufferLedger, DecoderConfig, GateOrder, GoldenTrace, HostTensor, LedgerSnapshot, Lifecycle,
    ParameterStore, ParityFailure, ParityHarness, ParityReport, Quantizer, StepDecoder,
    StepInput, StepOutput, WeightsManifest, PARITY_TOLERANCE,
};

// Burn backend
#[cfg(feature = "burn")]
pub use genie_burn as backend;

#[cfg(feature = "burn")]
pub use genie_burn::{BackendPool, BurnDecoder, DeviceDecoder, DevicePlacement, HiddenState};

mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{GenieConfig, PerformanceConfig};

pub mod input;
pub use input::KeyboardMap;

mod sampling;
pub use sampling::{argmax, softmax, KeySampler};

mod performance;
pub use performance::{KeyPress, Performance, LOWEST_MIDI_NOTE};

#[cfg(feature = "burn")]
mod builder;
#[cfg(feature = "burn")]
mod engine;

#[cfg(feature = "burn")]
pub use builder::GenieEngineBuilder;
#[cfg(feature = "burn")]
pub use engine::GenieEngine;

/// Convenience prelude for common imports
pub mod prelude {
    // Main engine
    #[cfg(feature = "burn")]
    pub use crate::{DevicePlacement, GenieEngine, GenieEngineBuilder};

    // Session
    pub use crate::{KeyPress, KeySampler, KeyboardMap, Performance};

    // Decoder
    pub use crate::core::{DecoderConfig, ParameterStore, StepDecoder, StepInput};

    // Configuration
    pub use crate::{GenieConfig, PerformanceConfig};
}
