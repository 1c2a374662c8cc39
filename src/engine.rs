//! GenieEngine: a Burn decoder wired to a performance session.

use crate::input::KeyboardMap;
use crate::performance::{KeyPress, Performance};
use crate::{GenieEngineBuilder, Result};
use genie_burn::{DeviceDecoder, DevicePlacement};
use genie_core::{BufferLedger, DecoderConfig, StepDecoder};

/// Interactive decoder engine.
///
/// Owns one initialised [`DeviceDecoder`] and the session around it. Each
/// [`press`](GenieEngine::press) runs one decoder step and returns the key
/// to play.
///
/// # Example
///
/// ```ignore
/// use genie::prelude::*;
///
/// let mut engine = GenieEngine::builder()
///     .manifest("model/weights_manifest.json")
///     .temperature(0.25)
///     .build()?;
///
/// let press = engine.press(3, 0.0)?;
/// println!("play MIDI note {}", press.midi_note);
/// ```
pub struct GenieEngine {
    performance: Performance<DeviceDecoder>,
    keyboard: KeyboardMap,
    ledger: BufferLedger,
}

impl GenieEngine {
    /// Create a new engine builder
    pub fn builder() -> GenieEngineBuilder {
        GenieEngineBuilder::default()
    }

    pub(crate) fn from_parts(
        performance: Performance<DeviceDecoder>,
        keyboard: KeyboardMap,
        ledger: BufferLedger,
    ) -> Self {
        Self {
            performance,
            keyboard,
            ledger,
        }
    }

    /// Decode a press of `button` at `time_seconds`.
    pub fn press(&mut self, button: usize, time_seconds: f64) -> Result<KeyPress> {
        self.performance.press(button, time_seconds)
    }

    /// Decode a typed character. Characters outside the layout return `None`.
    pub fn press_char(&mut self, c: char, time_seconds: f64) -> Result<Option<KeyPress>> {
        match self.keyboard.button(c) {
            Some(button) => self.press(button, time_seconds).map(Some),
            None => Ok(None),
        }
    }

    /// Start a new sequence, releasing the current hidden state.
    pub fn reset(&mut self) {
        self.performance.reset();
    }

    /// Release the decoder. Presses afterwards fail with a usage error.
    pub fn dispose(&mut self) -> Result<()> {
        self.performance.dispose()?;
        tracing::info!(
            "Genie engine disposed, {} live buffer bytes remain",
            self.ledger.live_bytes()
        );
        Ok(())
    }

    pub fn placement(&self) -> DevicePlacement {
        self.performance.decoder().placement()
    }

    pub fn config(&self) -> &DecoderConfig {
        self.performance.decoder().config()
    }

    pub fn num_keys(&self) -> usize {
        self.performance.decoder().num_keys()
    }

    pub fn temperature(&self) -> f32 {
        self.performance.sampler().temperature()
    }

    pub fn keyboard(&self) -> &KeyboardMap {
        &self.keyboard
    }

    /// Ledger tracking every device buffer the engine holds.
    pub fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }
}
