//! Interactive session: button presses in, piano keys out.

use crate::sampling::KeySampler;
use crate::Result;
use genie_core::{Error as CoreError, StepDecoder, StepInput};

/// MIDI note number of key 0 (A0).
pub const LOWEST_MIDI_NOTE: u8 = 21;

/// One decoded button press.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPress {
    pub button: usize,
    /// Piano key index, `0..num_keys`.
    pub key: usize,
    pub midi_note: u8,
    pub logits: Vec<f32>,
}

/// Carries the recurrent state, previous key and press time between presses.
pub struct Performance<D: StepDecoder> {
    decoder: D,
    sampler: KeySampler,
    state: Option<D::State>,
    last_key: Option<usize>,
    last_time: Option<f64>,
}

impl<D: StepDecoder> Performance<D> {
    /// `decoder` must already be initialised.
    pub fn new(decoder: D, sampler: KeySampler) -> Self {
        Self {
            decoder,
            sampler,
            state: None,
            last_key: None,
            last_time: None,
        }
    }

    /// Decode a press of `button` at `time_seconds` on a monotonic clock.
    ///
    /// The session is left untouched when the press is rejected.
    pub fn press(&mut self, button: usize, time_seconds: f64) -> Result<KeyPress> {
        if !time_seconds.is_finite() {
            return Err(CoreError::InvalidInput(format!(
                "press time must be finite, got {time_seconds}"
            ))
            .into());
        }
        let time_delta = match self.last_time {
            Some(last) if time_seconds < last => {
                return Err(CoreError::InvalidInput(format!(
                    "press at {time_seconds}s precedes previous press at {last}s"
                ))
                .into())
            }
            Some(last) => (time_seconds - last) as f32,
            None => 0.0,
        };

        let input = StepInput::new(self.last_key, time_delta, button);
        let output = self.decoder.forward(&input, self.state.as_ref())?;
        let key = self.sampler.sample(&output.logits)?;
        let midi_note = u8::try_from(key)
            .ok()
            .and_then(|k| k.checked_add(LOWEST_MIDI_NOTE))
            .ok_or(CoreError::InvalidControl {
                index: key,
                alphabet: self.decoder.num_keys(),
            })?;

        // Replacing the state releases the superseded one.
        self.state = Some(output.state);
        self.last_key = Some(key);
        self.last_time = Some(time_seconds);

        tracing::trace!("button {button} -> key {key} (midi {midi_note}, dt {time_delta:.3}s)");
        Ok(KeyPress {
            button,
            key,
            midi_note,
            logits: output.logits,
        })
    }

    /// Forget the session: the next press starts a new sequence.
    pub fn reset(&mut self) {
        self.state = None;
        self.last_key = None;
        self.last_time = None;
        tracing::debug!("Performance session reset");
    }

    pub fn last_key(&self) -> Option<usize> {
        self.last_key
    }

    pub fn state(&self) -> Option<&D::State> {
        self.state.as_ref()
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn sampler(&self) -> &KeySampler {
        &self.sampler
    }

    /// Drop the session state and release the decoder.
    pub fn dispose(&mut self) -> Result<()> {
        self.reset();
        self.decoder.dispose()?;
        Ok(())
    }
}
