use crate::audio_data::CadenzaAudioData;
use crate::backend::{AudioBackend, ContextState};
use crate::error::AudioError;
use crate::playback::{VoiceId, VoiceIdAllocator};

#[derive(Debug)]
struct ManualVoice {
    id: VoiceId,
    remaining: f64,
}

/// Deterministic backend whose clock only moves when told to.
///
/// Used by headless hosts (offline rendering of timelines, servers) and by
/// tests. Voices are not rendered; each one tracks how much of its buffer is
/// left and is reported as ended once [`advance`](Self::advance) consumes it.
#[derive(Debug)]
pub struct ManualBackend {
    state: ContextState,
    time: f64,
    resume_failure: Option<String>,
    voices: Vec<ManualVoice>,
    ended: Vec<VoiceId>,
    started: Vec<(VoiceId, f64)>,
    stopped: Vec<VoiceId>,
    voice_ids: VoiceIdAllocator,
}

impl Default for ManualBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualBackend {
    pub fn new() -> Self {
        Self {
            state: ContextState::Suspended,
            time: 0.0,
            resume_failure: None,
            voices: Vec::new(),
            ended: Vec::new(),
            started: Vec::new(),
            stopped: Vec::new(),
            voice_ids: VoiceIdAllocator::default(),
        }
    }

    /// Make the next resumes fail, as a host without playback permission would.
    pub fn deny_resume(&mut self, reason: impl Into<String>) {
        self.resume_failure = Some(reason.into());
    }

    pub fn allow_resume(&mut self) {
        self.resume_failure = None;
    }

    /// Moves the clock forward by `seconds` when running. Voices whose
    /// remaining content is consumed are queued as ended, in start order.
    pub fn advance(&mut self, seconds: f64) {
        if self.state != ContextState::Running || seconds.is_nan() || seconds <= 0.0 {
            return;
        }
        self.time += seconds;

        let mut i = 0;
        while i < self.voices.len() {
            self.voices[i].remaining -= seconds;
            if self.voices[i].remaining <= 0.0 {
                let voice = self.voices.remove(i);
                log::debug!("{} ended at {:.3}s", voice.id, self.time);
                self.ended.push(voice.id);
            } else {
                i += 1;
            }
        }
    }

    /// Ends a voice right away, as if the hardware reported completion.
    pub fn finish_voice(&mut self, voice: VoiceId) {
        if let Some(pos) = self.voices.iter().position(|v| v.id == voice) {
            self.voices.remove(pos);
            self.ended.push(voice);
        }
    }

    pub fn is_voice_active(&self, voice: VoiceId) -> bool {
        self.voices.iter().any(|v| v.id == voice)
    }

    pub fn active_voices(&self) -> usize {
        self.voices.len()
    }

    /// Every voice started so far with its buffer offset.
    pub fn started_voices(&self) -> &[(VoiceId, f64)] {
        &self.started
    }

    /// Every voice explicitly stopped so far.
    pub fn stopped_voices(&self) -> &[VoiceId] {
        &self.stopped
    }
}

impl AudioBackend for ManualBackend {
    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        match self.state {
            ContextState::Running => Ok(()),
            ContextState::Closed => Err(AudioError::Closed),
            ContextState::Suspended => {
                if let Some(reason) = &self.resume_failure {
                    return Err(AudioError::Device(reason.clone()));
                }
                self.state = ContextState::Running;
                Ok(())
            }
        }
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        match self.state {
            ContextState::Closed => Err(AudioError::Closed),
            _ => {
                self.state = ContextState::Suspended;
                Ok(())
            }
        }
    }

    fn close(&mut self) {
        self.voices.clear();
        self.state = ContextState::Closed;
    }

    fn current_time(&self) -> f64 {
        self.time
    }

    fn start_voice(&mut self, audio_data: &CadenzaAudioData, offset: f64) -> VoiceId {
        let id = self.voice_ids.allocate();
        let remaining = audio_data.duration().as_secs_f64() - offset.max(0.0);
        self.voices.push(ManualVoice { id, remaining });
        self.started.push((id, offset));
        id
    }

    fn stop_voice(&mut self, voice: VoiceId) {
        self.voices.retain(|v| v.id != voice);
        self.stopped.push(voice);
    }

    fn drain_ended(&mut self) -> Vec<VoiceId> {
        std::mem::take(&mut self.ended)
    }
}
