use crate::audio_data::{CadenzaAudioData, DecodeOptions, decode_audio_bytes};
use crate::backend::{AudioBackend, ContextState};
use crate::config::CadenzaConfig;
use crate::error::{AudioError, DecodeError};
use crate::playback::{Voice, VoiceId, VoiceIdAllocator};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, SizedSample};
use crossbeam_channel::{Receiver, Sender, unbounded};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Voices shared between the control thread and the cpal callback.
#[derive(Debug, Default)]
struct RenderState {
    voices: Vec<Voice>,
}

/// Hardware output through the default cpal device.
///
/// The clock is the number of frames the device has pulled divided by the
/// sample rate, so it stands still while the stream is paused. Voices that run
/// out of frames are reported from the audio thread over a channel and picked
/// up by [`drain_ended`](AudioBackend::drain_ended).
pub struct CpalBackend {
    config: CadenzaConfig,
    stream: Option<cpal::Stream>,
    state: ContextState,
    render: Arc<Mutex<RenderState>>,
    frames_rendered: Arc<AtomicU64>,
    ended_sender: Sender<VoiceId>,
    ended_receiver: Receiver<VoiceId>,
    voice_ids: VoiceIdAllocator,
}

impl CpalBackend {
    /// Create a suspended backend. No device is opened until [`resume`](AudioBackend::resume).
    pub fn new(config: CadenzaConfig) -> crate::error::Result<Self> {
        config.validate()?;
        let (ended_sender, ended_receiver) = unbounded();
        Ok(Self {
            config,
            stream: None,
            state: ContextState::Suspended,
            render: Arc::new(Mutex::new(RenderState::default())),
            frames_rendered: Arc::new(AtomicU64::new(0)),
            ended_sender,
            ended_receiver,
            voice_ids: VoiceIdAllocator::default(),
        })
    }

    pub fn config(&self) -> &CadenzaConfig {
        &self.config
    }

    /// Get the number of audio frames rendered since the stream was opened
    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered.load(Ordering::Relaxed)
    }

    pub fn active_voices(&self) -> usize {
        self.lock_render().voices.len()
    }

    fn lock_render(&self) -> MutexGuard<'_, RenderState> {
        // Recover from a poisoned lock
        self.render.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn open_stream(&self) -> Result<cpal::Stream, AudioError> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| AudioError::Device("No default output device available".into()))?;

        let stream_config = cpal::StreamConfig {
            channels: self.config.channels,
            sample_rate: cpal::SampleRate(self.config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(self.config.block_size as u32),
        };

        let default_config = device
            .default_output_config()
            .map_err(|e| AudioError::Device(format!("Failed to get default config: {}", e)))?;

        log::info!(
            "Opening output stream on {:?}: {} Hz, {} ch, {:?}",
            device.name().unwrap_or_else(|_| "unknown device".to_string()),
            self.config.sample_rate,
            self.config.channels,
            default_config.sample_format()
        );

        match default_config.sample_format() {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(&device, &stream_config),
            cpal::SampleFormat::I16 => self.build_stream::<i16>(&device, &stream_config),
            cpal::SampleFormat::U16 => self.build_stream::<u16>(&device, &stream_config),
            other => Err(AudioError::Device(format!(
                "Unsupported sample format: {:?}",
                other
            ))),
        }
    }

    fn build_stream<T>(
        &self,
        device: &cpal::Device,
        config: &cpal::StreamConfig,
    ) -> Result<cpal::Stream, AudioError>
    where
        T: SizedSample + FromSample<f32>,
    {
        let channels = config.channels;
        let channels_usize = channels as usize;
        let render = self.render.clone();
        let frames_rendered = self.frames_rendered.clone();
        let ended_sender = self.ended_sender.clone();

        device
            .build_output_stream(
                config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let mut mix = vec![0.0f32; data.len()];

                    // Never block the device callback; a contended block plays silence
                    if let Ok(mut render) = render.try_lock() {
                        for voice in render.voices.iter_mut() {
                            voice.fill_buffer(&mut mix, channels);
                        }
                        render.voices.retain(|voice| {
                            if voice.is_finished() {
                                let _ = ended_sender.send(voice.id());
                                false
                            } else {
                                true
                            }
                        });
                    }

                    for (out, sample) in data.iter_mut().zip(mix) {
                        *out = T::from_sample(sample);
                    }

                    frames_rendered.fetch_add((data.len() / channels_usize) as u64, Ordering::Relaxed);
                },
                move |err| {
                    log::error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| AudioError::Stream(format!("Failed to build stream: {}", e)))
    }
}

impl AudioBackend for CpalBackend {
    fn state(&self) -> ContextState {
        self.state
    }

    fn resume(&mut self) -> Result<(), AudioError> {
        match self.state {
            ContextState::Running => return Ok(()),
            ContextState::Closed => return Err(AudioError::Closed),
            ContextState::Suspended => {}
        }

        if self.stream.is_none() {
            self.stream = Some(self.open_stream()?);
        }

        if let Some(stream) = &self.stream {
            stream
                .play()
                .map_err(|e| AudioError::Stream(format!("Failed to start stream: {}", e)))?;
        }

        self.state = ContextState::Running;
        log::info!("Audio clock running");
        Ok(())
    }

    fn suspend(&mut self) -> Result<(), AudioError> {
        match self.state {
            ContextState::Suspended => return Ok(()),
            ContextState::Closed => return Err(AudioError::Closed),
            ContextState::Running => {}
        }

        if let Some(stream) = &self.stream {
            stream
                .pause()
                .map_err(|e| AudioError::Stream(format!("Failed to pause stream: {}", e)))?;
        }

        self.state = ContextState::Suspended;
        log::info!("Audio clock suspended at {:.3}s", self.current_time());
        Ok(())
    }

    fn close(&mut self) {
        if self.state == ContextState::Closed {
            return;
        }
        // Dropping the stream stops the device callback
        drop(self.stream.take());
        self.lock_render().voices.clear();
        self.state = ContextState::Closed;
        log::info!("Audio backend closed");
    }

    fn current_time(&self) -> f64 {
        self.frames_rendered() as f64 / self.config.sample_rate as f64
    }

    fn decode(&mut self, bytes: Vec<u8>) -> Result<CadenzaAudioData, DecodeError> {
        let options = DecodeOptions::new().target_sample_rate(self.config.sample_rate);
        decode_audio_bytes(bytes, &options)
    }

    fn start_voice(&mut self, audio_data: &CadenzaAudioData, offset: f64) -> VoiceId {
        let id = self.voice_ids.allocate();
        if audio_data.sample_rate() != self.config.sample_rate {
            log::warn!(
                "{} plays {} Hz content on a {} Hz stream",
                id,
                audio_data.sample_rate(),
                self.config.sample_rate
            );
        }
        self.lock_render()
            .voices
            .push(Voice::new(id, audio_data.clone(), offset));
        id
    }

    fn stop_voice(&mut self, voice: VoiceId) {
        self.lock_render().voices.retain(|v| v.id() != voice);
    }

    fn drain_ended(&mut self) -> Vec<VoiceId> {
        self.ended_receiver.try_iter().collect()
    }
}

impl Drop for CpalBackend {
    fn drop(&mut self) {
        self.close();
    }
}
