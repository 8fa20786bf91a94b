//! Hardware voices.
//!
//! A [`Voice`] is one started instance of a decoded buffer. It is created by a
//! backend's `start_voice`, renders from its own frame cursor, and finishes
//! exactly once: either it runs out of frames (natural completion, which the
//! backend reports as "ended") or it is stopped and discarded.

use crate::audio_data::CadenzaAudioData;
use std::fmt;

/// Opaque identity of a started voice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VoiceId(pub(crate) u64);

impl VoiceId {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "voice#{}", self.0)
    }
}

/// Hands out monotonically increasing voice ids.
#[derive(Debug, Default)]
pub(crate) struct VoiceIdAllocator {
    next: u64,
}

impl VoiceIdAllocator {
    pub fn allocate(&mut self) -> VoiceId {
        self.next += 1;
        VoiceId(self.next)
    }
}

#[derive(Debug)]
pub struct Voice {
    id: VoiceId,
    audio_data: CadenzaAudioData,
    current_frame: usize,
    reached_end: bool,
}

impl Voice {
    /// Creates a voice positioned `offset_seconds` into the buffer.
    pub fn new(id: VoiceId, audio_data: CadenzaAudioData, offset_seconds: f64) -> Self {
        let offset = offset_seconds.max(0.0) * audio_data.sample_rate() as f64;
        let current_frame = (offset.round() as usize).min(audio_data.total_frames());
        Self {
            id,
            audio_data,
            current_frame,
            reached_end: false,
        }
    }

    pub fn id(&self) -> VoiceId {
        self.id
    }

    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    /// Position in the buffer, in seconds.
    pub fn position(&self) -> f64 {
        self.current_frame as f64 / self.audio_data.sample_rate() as f64
    }

    pub fn is_finished(&self) -> bool {
        self.reached_end
    }

    /// Mixes up to one block of this voice into `buffer` (interleaved, `channels` wide).
    /// Returns the number of frames filled.
    ///
    /// When the cursor reaches the end of the buffer the voice is marked
    /// finished; the caller collects finished voices after the block.
    pub fn fill_buffer(&mut self, buffer: &mut [f32], channels: u16) -> usize {
        if self.reached_end {
            return 0;
        }

        let channels_usize = channels as usize;
        let frame_count = buffer.len() / channels_usize.max(1);
        let mut frames_filled = 0;

        for frame_idx in 0..frame_count {
            let source_frame = self.current_frame + frame_idx;
            if source_frame >= self.audio_data.total_frames() {
                break;
            }

            for channel in 0..channels_usize {
                if let Some(sample) = self.audio_data.sample(source_frame, channel) {
                    buffer[frame_idx * channels_usize + channel] += sample;
                }
            }

            frames_filled += 1;
        }

        self.current_frame += frames_filled;
        if self.current_frame >= self.audio_data.total_frames() {
            log::debug!(
                "{} reached end at frame {}",
                self.id,
                self.current_frame
            );
            self.reached_end = true;
        }

        frames_filled
    }
}
