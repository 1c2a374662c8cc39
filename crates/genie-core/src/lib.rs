//! Framework-agnostic core of the Genie decoder.
//!
//! Everything here works on host memory and flat `f32` data: the weights
//! manifest and [`ParameterStore`], the button [`Quantizer`], the
//! [`StepDecoder`] capability trait with its step I/O types, the
//! [`BufferLedger`] used to account for long-lived device buffers, and the
//! golden-trace [`ParityHarness`]. Tensor backends (see `genie-burn`)
//! implement [`StepDecoder`] on top of these.
//!
//! ```rust,ignore
//! use genie_core::{DecoderConfig, GoldenTrace, ParameterStore, ParityHarness};
//!
//! let store = ParameterStore::load("model/weights_manifest.json")?;
//! let trace = GoldenTrace::load("model/golden_trace.json")?;
//! let report = ParityHarness::default().replay(&decoder, &trace)?;
//! ```

mod error;
pub use error::{Error, Result};

pub mod config;
pub use config::{DecoderConfig, GateOrder, ParameterNames};

pub mod manifest;
pub use manifest::{ParameterSpec, WeightEntry, WeightGroup, WeightsManifest};

mod store;
pub use store::{HostTensor, ParameterStore};

mod quantizer;
pub use quantizer::Quantizer;

mod ledger;
pub use ledger::{BufferGuard, BufferLedger, LedgerSnapshot};

mod decoder;
pub use decoder::{encode_features, Lifecycle, StepDecoder, StepInput, StepOutput};

mod trace;
pub use trace::GoldenTrace;

pub mod parity;
pub use parity::{ParityFailure, ParityHarness, ParityReport, PARITY_TOLERANCE};
