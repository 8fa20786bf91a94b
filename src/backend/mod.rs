//! Host audio subsystem.
//!
//! [`AudioBackend`] is everything the mixer needs from the platform: a
//! monotonic hardware clock, a run state, a decoder, and voices that can be
//! started, stopped, and that report natural completion.

mod cpal_backend;
mod manual;

pub use cpal_backend::CpalBackend;
pub use manual::ManualBackend;

use crate::audio_data::{CadenzaAudioData, DecodeOptions, decode_audio_bytes};
use crate::error::{AudioError, DecodeError};
use crate::playback::VoiceId;

/// Run state of the hardware clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextState {
    /// Clock is stopped; it can be resumed.
    Suspended,
    /// Clock is advancing and voices are audible.
    Running,
    /// Resources are released; the backend cannot run again.
    Closed,
}

pub trait AudioBackend {
    fn state(&self) -> ContextState;

    /// Starts (or restarts) the hardware clock. Succeeds immediately when already running.
    fn resume(&mut self) -> Result<(), AudioError>;

    fn suspend(&mut self) -> Result<(), AudioError>;

    fn close(&mut self);

    /// Hardware clock reading in seconds. Monotonic; only advances while running.
    fn current_time(&self) -> f64;

    /// Turns container bytes into a buffer this backend can play.
    fn decode(&mut self, bytes: Vec<u8>) -> Result<CadenzaAudioData, DecodeError> {
        decode_audio_bytes(bytes, &DecodeOptions::default())
    }

    /// Starts a new voice `offset` seconds into `audio_data`.
    fn start_voice(&mut self, audio_data: &CadenzaAudioData, offset: f64) -> VoiceId;

    /// Silences a voice. Stopping does not produce an ended notification.
    fn stop_voice(&mut self, voice: VoiceId);

    /// Voices that ran out of frames since the last call, in completion order.
    fn drain_ended(&mut self) -> Vec<VoiceId>;
}
