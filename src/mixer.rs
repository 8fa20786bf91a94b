//! Named sources multiplexed onto one hardware clock.
//!
//! The [`Mixer`] owns an [`AudioBackend`] (the clock and its voices), a
//! registry of named sources, and a pending [`FrameRequest`] for its next tick.
//! Each tick first settles voices the hardware reported as ended, then calls
//! every playing source's time-update callback with
//! `current_time - clock_offset + start_offset`, then requests the next tick.
//!
//! Everything runs on the host's event-loop thread; callbacks are plain
//! `FnMut` closures and are never called concurrently.

use crate::audio_data::CadenzaAudioData;
use crate::backend::{AudioBackend, ContextState, CpalBackend};
use crate::config::CadenzaConfig;
use crate::error::{AudioError, DecodeError, NotFoundError};
use crate::events::CadenzaEvent;
use crate::frame::{FrameRequest, FrameScheduler, IntervalFrameScheduler};
use crate::playback::VoiceId;
use uuid::Uuid;

/// Called once per tick with the source's elapsed playback time in seconds.
pub type TimeUpdateCallback = Box<dyn FnMut(f64)>;

/// Called once each time a source plays through to the end of its buffer.
pub type EndedCallback = Box<dyn FnMut()>;

struct Source {
    id: Uuid,
    name: String,
    audio_data: CadenzaAudioData,
    start_offset: f64,
    clock_offset: f64,
    is_playing: bool,
    voice: Option<VoiceId>,
    on_time_update: TimeUpdateCallback,
    on_ended: EndedCallback,
}

impl Source {
    fn elapsed(&self, now: f64) -> f64 {
        now - self.clock_offset + self.start_offset
    }

    fn reset(&mut self) {
        self.voice = None;
        self.start_offset = 0.0;
        self.clock_offset = 0.0;
        self.is_playing = false;
    }

    fn info(&self) -> SourceInfo {
        SourceInfo {
            id: self.id,
            name: self.name.clone(),
            is_playing: self.is_playing,
            start_offset: self.start_offset,
            clock_offset: self.clock_offset,
            duration: self.audio_data.duration().as_secs_f64(),
        }
    }
}

/// Returned by [`Mixer::add_source`]; identifies one registration of a name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceHandle {
    id: Uuid,
    name: String,
}

impl SourceHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Snapshot of a source's playback bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceInfo {
    pub id: Uuid,
    pub name: String,
    pub is_playing: bool,
    /// Position in the buffer playback started from, in seconds
    pub start_offset: f64,
    /// Clock reading when playback started, in seconds
    pub clock_offset: f64,
    /// Length of the decoded buffer, in seconds
    pub duration: f64,
}

pub struct Mixer<B: AudioBackend, S: FrameScheduler> {
    backend: B,
    frames: S,
    sources: Vec<Source>,
    pending_frame: Option<FrameRequest>,
    events: Vec<CadenzaEvent>,
}

impl Mixer<CpalBackend, IntervalFrameScheduler> {
    /// Mixer on the default output device, ticking at `config.refresh_rate`.
    pub fn with_cpal(config: CadenzaConfig) -> crate::error::Result<Self> {
        let frames = IntervalFrameScheduler::new(config.frame_interval());
        let backend = CpalBackend::new(config)?;
        Ok(Self::new(backend, frames))
    }
}

impl<B: AudioBackend, S: FrameScheduler> Mixer<B, S> {
    /// Creates the mixer and schedules its first tick.
    pub fn new(backend: B, mut frames: S) -> Self {
        let pending_frame = Some(frames.request_frame());
        Self {
            backend,
            frames,
            sources: Vec::new(),
            pending_frame,
            events: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn frame_scheduler(&self) -> &S {
        &self.frames
    }

    pub fn frame_scheduler_mut(&mut self) -> &mut S {
        &mut self.frames
    }

    /// Ensures the hardware clock is running. A no-op when it already is.
    ///
    /// Failures (no device, no permission to start audio) are returned as-is
    /// and not retried.
    pub fn resume(&mut self) -> Result<(), AudioError> {
        if self.is_running() {
            return Ok(());
        }
        self.backend.resume().inspect_err(|e| {
            log::warn!("Failed to resume audio clock: {}", e);
        })?;
        log::info!("Audio clock resumed at {:.3}s", self.backend.current_time());
        self.events.push(CadenzaEvent::ClockResumed);
        Ok(())
    }

    /// Pauses the hardware clock. Playing sources keep their flags; their
    /// elapsed time stands still with the clock.
    pub fn suspend(&mut self) -> Result<(), AudioError> {
        match self.backend.state() {
            ContextState::Running => {}
            ContextState::Suspended => return Ok(()),
            ContextState::Closed => return Err(AudioError::Closed),
        }
        self.backend.suspend()?;
        self.events.push(CadenzaEvent::ClockSuspended);
        Ok(())
    }

    /// Releases the hardware. Sources stay registered but nothing can play again.
    pub fn close(&mut self) {
        for source in self.sources.iter_mut() {
            Self::stop_source(&mut self.backend, source, &mut self.events);
        }
        self.backend.close();
    }

    pub fn is_running(&self) -> bool {
        self.backend.state() == ContextState::Running
    }

    /// Current hardware clock reading, in seconds.
    pub fn current_time(&self) -> f64 {
        self.backend.current_time()
    }

    /// Decodes `bytes` and registers the result under `name`, stopped.
    ///
    /// A name that is already registered is replaced: its voice is stopped and
    /// the new source takes its slot in tick order. Nothing is registered when
    /// decoding fails.
    pub fn add_source<F, E>(
        &mut self,
        name: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
        on_time_update: F,
        on_ended: E,
    ) -> Result<SourceHandle, DecodeError>
    where
        F: FnMut(f64) + 'static,
        E: FnMut() + 'static,
    {
        let name = name.into();
        let audio_data = self.backend.decode(bytes.into()).inspect_err(|e| {
            log::warn!("Source '{}' could not be decoded: {}", name, e);
        })?;

        let source = Source {
            id: Uuid::new_v4(),
            name: name.clone(),
            audio_data,
            start_offset: 0.0,
            clock_offset: 0.0,
            is_playing: false,
            voice: None,
            on_time_update: Box::new(on_time_update),
            on_ended: Box::new(on_ended),
        };
        let handle = SourceHandle {
            id: source.id,
            name: name.clone(),
        };
        let duration = source.audio_data.duration().as_secs_f64();

        match self.index_of(&name) {
            Some(index) => {
                if let Some(voice) = self.sources[index].voice.take() {
                    self.backend.stop_voice(voice);
                }
                self.sources[index] = source;
                log::info!("Source '{}' replaced ({:.3}s)", name, duration);
                self.events.push(CadenzaEvent::SourceReplaced { name });
            }
            None => {
                self.sources.push(source);
                log::info!("Source '{}' added ({:.3}s)", name, duration);
                self.events
                    .push(CadenzaEvent::SourceAdded { name, duration });
            }
        }

        Ok(handle)
    }

    /// Unregisters a source, silencing it first. Its ended callback is not called.
    pub fn remove_source(&mut self, name: &str) -> Result<(), NotFoundError> {
        let index = self.lookup(name)?;
        let source = self.sources.remove(index);
        if let Some(voice) = source.voice {
            self.backend.stop_voice(voice);
        }
        log::info!("Source '{}' removed", name);
        self.events.push(CadenzaEvent::SourceRemoved {
            name: source.name,
        });
        Ok(())
    }

    /// Starts `name` from `start_position` seconds into its buffer.
    ///
    /// Playing a source that is already playing stops its current voice and
    /// restarts timing from now. Negative or non-finite positions start from 0.
    pub fn play(&mut self, name: &str, start_position: f64) -> Result<(), NotFoundError> {
        let index = self.lookup(name)?;

        let start_position = if start_position.is_finite() && start_position >= 0.0 {
            start_position
        } else {
            log::warn!(
                "Source '{}': invalid start position {}, playing from 0",
                name,
                start_position
            );
            0.0
        };

        let now = self.backend.current_time();
        let source = &mut self.sources[index];

        if let Some(previous) = source.voice.take() {
            log::debug!("Source '{}' restarted, stopping {}", name, previous);
            self.backend.stop_voice(previous);
        }

        source.clock_offset = now;
        source.start_offset = start_position;
        source.voice = Some(self.backend.start_voice(&source.audio_data, start_position));
        source.is_playing = true;

        log::debug!(
            "Source '{}' playing from {:.3}s at clock {:.3}s",
            name,
            start_position,
            now
        );
        self.events.push(CadenzaEvent::SourceStarted {
            name: name.to_string(),
            position: start_position,
            clock_time: now,
        });
        Ok(())
    }

    /// Stops `name` and rewinds it. Its ended callback is not called.
    pub fn stop(&mut self, name: &str) -> Result<(), NotFoundError> {
        let index = self.lookup(name)?;
        Self::stop_source(&mut self.backend, &mut self.sources[index], &mut self.events);
        Ok(())
    }

    pub fn stop_all(&mut self) {
        for source in self.sources.iter_mut().filter(|s| s.is_playing) {
            Self::stop_source(&mut self.backend, source, &mut self.events);
        }
    }

    fn stop_source(backend: &mut B, source: &mut Source, events: &mut Vec<CadenzaEvent>) {
        let was_playing = source.is_playing;
        if let Some(voice) = source.voice.take() {
            backend.stop_voice(voice);
        }
        source.reset();
        if was_playing {
            log::debug!("Source '{}' stopped", source.name);
            events.push(CadenzaEvent::SourceStopped {
                name: source.name.clone(),
            });
        }
    }

    /// Settles voices the hardware reported as finished: the owning source
    /// stops, rewinds and gets its ended callback. Reports for voices that
    /// were stopped or superseded are dropped. Returns how many sources ended.
    pub fn process_ended(&mut self) -> usize {
        let mut ended = 0;
        for voice in self.backend.drain_ended() {
            let Some(source) = self.sources.iter_mut().find(|s| s.voice == Some(voice)) else {
                log::debug!("Ignoring end of {}, no source owns it", voice);
                continue;
            };
            source.reset();
            log::info!("Source '{}' ended", source.name);
            (source.on_ended)();
            self.events.push(CadenzaEvent::SourceEnded {
                name: source.name.clone(),
            });
            ended += 1;
        }
        ended
    }

    /// Runs one tick if `request` is the pending one, then schedules the next.
    ///
    /// Requests that are stale (already fired or cancelled) are ignored, so a
    /// host can never drive two ticks from one request.
    pub fn on_frame(&mut self, request: FrameRequest) {
        if self.pending_frame != Some(request) {
            log::debug!("Ignoring stale frame request {}", request.as_u64());
            return;
        }
        self.pending_frame = None;
        self.tick();
        self.pending_frame = Some(self.frames.request_frame());
    }

    fn tick(&mut self) {
        self.process_ended();

        let now = self.backend.current_time();
        for source in self.sources.iter_mut().filter(|s| s.is_playing) {
            let elapsed = source.elapsed(now);
            (source.on_time_update)(elapsed);
        }
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Elapsed playback time of `name`, or None if it is unknown or not playing.
    pub fn elapsed(&self, name: &str) -> Option<f64> {
        let now = self.backend.current_time();
        self.sources
            .iter()
            .find(|s| s.name == name && s.is_playing)
            .map(|s| s.elapsed(now))
    }

    pub fn source_info(&self, name: &str) -> Option<SourceInfo> {
        self.sources.iter().find(|s| s.name == name).map(Source::info)
    }

    pub fn is_playing(&self, name: &str) -> bool {
        self.sources.iter().any(|s| s.name == name && s.is_playing)
    }

    /// Registered names in tick order.
    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// Drains the notifications queued since the last call.
    pub fn poll_events(&mut self) -> Vec<CadenzaEvent> {
        std::mem::take(&mut self.events)
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.sources.iter().position(|s| s.name == name)
    }

    fn lookup(&self, name: &str) -> Result<usize, NotFoundError> {
        self.index_of(name).ok_or_else(|| {
            log::debug!("No source named '{}'", name);
            NotFoundError::new(name)
        })
    }
}

impl<B: AudioBackend, S: FrameScheduler> Drop for Mixer<B, S> {
    fn drop(&mut self) {
        if let Some(request) = self.pending_frame.take() {
            self.frames.cancel_frame(request);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ManualBackend;
    use crate::frame::ManualFrameScheduler;
    use crate::test_support::wav_bytes;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type TestMixer = Mixer<ManualBackend, ManualFrameScheduler>;

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn running_mixer() -> TestMixer {
        init();
        let mut mixer = Mixer::new(ManualBackend::new(), ManualFrameScheduler::new());
        mixer.resume().unwrap();
        mixer
    }

    /// Ten seconds of mono audio at 1 kHz.
    fn ten_seconds() -> Vec<u8> {
        wav_bytes(1000, 1, 10_000)
    }

    fn tick(mixer: &mut TestMixer) {
        let request = mixer
            .frame_scheduler_mut()
            .fire()
            .expect("mixer should always have a tick pending");
        mixer.on_frame(request);
    }

    fn recording_source(
        mixer: &mut TestMixer,
        name: &str,
        bytes: Vec<u8>,
    ) -> (Rc<RefCell<Vec<f64>>>, Rc<Cell<u32>>) {
        let updates = Rc::new(RefCell::new(Vec::new()));
        let ended = Rc::new(Cell::new(0));
        let (u, e) = (updates.clone(), ended.clone());
        mixer
            .add_source(
                name,
                bytes,
                move |t| u.borrow_mut().push(t),
                move || e.set(e.get() + 1),
            )
            .unwrap();
        (updates, ended)
    }

    #[test]
    fn test_elapsed_tracks_clock_from_start_position() {
        let mut mixer = running_mixer();
        let (updates, _) = recording_source(&mut mixer, "music", ten_seconds());

        mixer.backend_mut().advance(0.25);
        mixer.play("music", 5.0).unwrap();
        tick(&mut mixer);
        mixer.backend_mut().advance(1.0);
        tick(&mut mixer);

        assert_eq!(*updates.borrow(), vec![5.0, 6.0]);
        assert_eq!(mixer.elapsed("music"), Some(6.0));
    }

    #[test]
    fn test_unknown_names_are_not_found_without_side_effects() {
        let mut mixer = running_mixer();
        recording_source(&mut mixer, "music", ten_seconds());
        mixer.poll_events();

        assert_eq!(mixer.play("ghost", 1.0), Err(NotFoundError::new("ghost")));
        assert_eq!(mixer.stop("ghost"), Err(NotFoundError::new("ghost")));
        assert!(mixer.remove_source("ghost").is_err());

        assert!(mixer.backend().started_voices().is_empty());
        assert!(mixer.backend().stopped_voices().is_empty());
        assert!(mixer.poll_events().is_empty());
        assert!(!mixer.is_playing("music"));
    }

    #[test]
    fn test_resume_is_idempotent() {
        let mut mixer = running_mixer();
        assert!(mixer.is_running());
        mixer.poll_events();
        assert!(mixer.resume().is_ok());
        assert!(mixer.poll_events().is_empty());
    }

    #[test]
    fn test_resume_failure_is_surfaced() {
        let mut backend = ManualBackend::new();
        backend.deny_resume("playback requires a user gesture");
        let mut mixer = Mixer::new(backend, ManualFrameScheduler::new());

        assert!(matches!(mixer.resume(), Err(AudioError::Device(_))));
        assert!(!mixer.is_running());
    }

    #[test]
    fn test_undecodable_bytes_register_nothing() {
        let mut mixer = running_mixer();
        let result = mixer.add_source("noise", b"not audio".to_vec(), |_| {}, || {});
        assert!(result.is_err());
        assert!(mixer.is_empty());
        assert_eq!(mixer.source_info("noise"), None);
    }

    #[test]
    fn test_new_source_is_stopped() {
        let mut mixer = running_mixer();
        let handle = mixer
            .add_source("music", ten_seconds(), |_| {}, || {})
            .unwrap();
        let info = mixer.source_info("music").unwrap();
        assert_eq!(handle.name(), "music");
        assert_eq!(info.id, handle.id());
        assert!(!info.is_playing);
        assert_eq!(info.start_offset, 0.0);
        assert!((info.duration - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_only_updates_playing_sources_in_registration_order() {
        let mut mixer = running_mixer();
        let order = Rc::new(RefCell::new(Vec::new()));
        for name in ["a", "b", "c"] {
            let order = order.clone();
            mixer
                .add_source(
                    name,
                    ten_seconds(),
                    move |t| order.borrow_mut().push((name, t)),
                    || {},
                )
                .unwrap();
        }

        mixer.play("c", 1.0).unwrap();
        mixer.play("a", 2.0).unwrap();
        tick(&mut mixer);

        assert_eq!(*order.borrow(), vec![("a", 2.0), ("c", 1.0)]);
    }

    #[test]
    fn test_natural_completion_fires_ended_once() {
        let mut mixer = running_mixer();
        let (updates, ended) = recording_source(&mut mixer, "music", ten_seconds());

        mixer.play("music", 8.0).unwrap();
        mixer.backend_mut().advance(1.0);
        tick(&mut mixer);
        assert_eq!(ended.get(), 0);

        mixer.backend_mut().advance(1.5);
        tick(&mut mixer);
        assert_eq!(ended.get(), 1);

        let info = mixer.source_info("music").unwrap();
        assert!(!info.is_playing);
        assert_eq!(info.start_offset, 0.0);

        // Ended before the broadcast: no update for the finished source
        assert_eq!(*updates.borrow(), vec![9.0]);

        tick(&mut mixer);
        assert_eq!(ended.get(), 1);
        assert_eq!(updates.borrow().len(), 1);
    }

    #[test]
    fn test_stop_does_not_fire_ended() {
        let mut mixer = running_mixer();
        let (updates, ended) = recording_source(&mut mixer, "music", ten_seconds());

        mixer.play("music", 1.0).unwrap();
        mixer.stop("music").unwrap();
        mixer.backend_mut().advance(20.0);
        tick(&mut mixer);

        assert_eq!(ended.get(), 0);
        assert!(updates.borrow().is_empty());
        let info = mixer.source_info("music").unwrap();
        assert!(!info.is_playing);
        assert_eq!(info.start_offset, 0.0);
    }

    #[test]
    fn test_play_stop_play_scenario() {
        let mut mixer = running_mixer();
        let (updates, ended) = recording_source(&mut mixer, "music", ten_seconds());

        mixer.play("music", 2.0).unwrap();
        assert!(mixer.is_playing("music"));
        mixer.backend_mut().advance(1.0);
        tick(&mut mixer);

        mixer.stop("music").unwrap();
        assert!(!mixer.is_playing("music"));
        tick(&mut mixer);

        mixer.play("music", 2.0).unwrap();
        assert!(mixer.is_playing("music"));
        mixer.backend_mut().advance(8.0);
        tick(&mut mixer);

        assert_eq!(*updates.borrow(), vec![3.0]);
        assert_eq!(ended.get(), 1);
        assert!(!mixer.is_playing("music"));
    }

    #[test]
    fn test_replay_stops_previous_voice() {
        let mut mixer = running_mixer();
        let (updates, ended) = recording_source(&mut mixer, "music", ten_seconds());

        mixer.play("music", 0.0).unwrap();
        mixer.backend_mut().advance(3.0);
        mixer.play("music", 1.0).unwrap();

        let started = mixer.backend().started_voices().to_vec();
        assert_eq!(started.len(), 2);
        assert_eq!(mixer.backend().stopped_voices(), &[started[0].0]);
        assert_eq!(mixer.backend().active_voices(), 1);

        let info = mixer.source_info("music").unwrap();
        assert_eq!(info.clock_offset, 3.0);
        assert_eq!(info.start_offset, 1.0);

        mixer.backend_mut().advance(0.5);
        tick(&mut mixer);
        assert_eq!(*updates.borrow(), vec![1.5]);
        assert_eq!(ended.get(), 0);
    }

    #[test]
    fn test_invalid_start_position_plays_from_zero() {
        let mut mixer = running_mixer();
        recording_source(&mut mixer, "music", ten_seconds());
        mixer.play("music", -3.0).unwrap();
        assert_eq!(mixer.source_info("music").unwrap().start_offset, 0.0);
        mixer.play("music", f64::NAN).unwrap();
        assert_eq!(mixer.source_info("music").unwrap().start_offset, 0.0);
    }

    #[test]
    fn test_stop_all_stops_only_playing_sources() {
        let mut mixer = running_mixer();
        recording_source(&mut mixer, "a", ten_seconds());
        recording_source(&mut mixer, "b", ten_seconds());
        recording_source(&mut mixer, "c", ten_seconds());
        mixer.play("a", 0.0).unwrap();
        mixer.play("c", 0.0).unwrap();
        mixer.poll_events();

        mixer.stop_all();

        assert!(!mixer.is_playing("a"));
        assert!(!mixer.is_playing("c"));
        assert_eq!(mixer.backend().active_voices(), 0);
        let stopped: Vec<_> = mixer
            .poll_events()
            .iter()
            .filter_map(|e| e.source_name().map(str::to_string))
            .collect();
        assert_eq!(stopped, vec!["a", "c"]);
    }

    #[test]
    fn test_adding_same_name_replaces_source() {
        let mut mixer = running_mixer();
        let (_, first_ended) = recording_source(&mut mixer, "a", ten_seconds());
        recording_source(&mut mixer, "b", ten_seconds());
        mixer.play("a", 0.0).unwrap();

        let (second_updates, _) = recording_source(&mut mixer, "a", wav_bytes(1000, 1, 2000));

        assert_eq!(mixer.source_names(), vec!["a", "b"]);
        assert!(!mixer.is_playing("a"));
        assert_eq!(mixer.backend().active_voices(), 0);
        assert!((mixer.source_info("a").unwrap().duration - 2.0).abs() < 1e-9);

        mixer.play("a", 0.5).unwrap();
        tick(&mut mixer);
        assert_eq!(*second_updates.borrow(), vec![0.5]);
        assert_eq!(first_ended.get(), 0);
    }

    #[test]
    fn test_stale_frame_request_is_ignored() {
        let mut mixer = running_mixer();
        let (updates, _) = recording_source(&mut mixer, "music", ten_seconds());
        mixer.play("music", 0.0).unwrap();

        let first = mixer.frame_scheduler_mut().fire().unwrap();
        mixer.on_frame(first);
        mixer.on_frame(first);

        assert_eq!(updates.borrow().len(), 1);
        assert!(mixer.has_pending_frame());
    }

    #[test]
    fn test_drop_cancels_pending_tick() {
        let mixer = running_mixer();
        let log = mixer.frame_scheduler().log();
        let pending = log.pending();
        assert_eq!(pending.len(), 1);

        drop(mixer);

        assert_eq!(log.cancelled(), pending);
        assert!(log.pending().is_empty());
    }

    #[test]
    fn test_removed_source_never_reports_ended() {
        let mut mixer = running_mixer();
        let (_, ended) = recording_source(&mut mixer, "music", ten_seconds());
        mixer.play("music", 0.0).unwrap();
        let voice = mixer.backend().started_voices()[0].0;

        mixer.remove_source("music").unwrap();
        mixer.backend_mut().finish_voice(voice);
        tick(&mut mixer);

        assert_eq!(ended.get(), 0);
        assert!(mixer.is_empty());
    }

    #[test]
    fn test_events_follow_lifecycle() {
        init();
        let mut mixer = Mixer::new(ManualBackend::new(), ManualFrameScheduler::new());
        mixer.resume().unwrap();
        recording_source(&mut mixer, "music", wav_bytes(1000, 1, 1000));
        mixer.play("music", 0.0).unwrap();
        mixer.backend_mut().advance(1.0);
        tick(&mut mixer);

        let events = mixer.poll_events();
        assert_eq!(
            events,
            vec![
                CadenzaEvent::ClockResumed,
                CadenzaEvent::SourceAdded {
                    name: "music".to_string(),
                    duration: 1.0,
                },
                CadenzaEvent::SourceStarted {
                    name: "music".to_string(),
                    position: 0.0,
                    clock_time: 0.0,
                },
                CadenzaEvent::SourceEnded {
                    name: "music".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_close_resets_sources() {
        let mut mixer = running_mixer();
        recording_source(&mut mixer, "music", ten_seconds());
        recording_source(&mut mixer, "idle", ten_seconds());
        mixer.play("music", 0.0).unwrap();
        mixer.poll_events();

        mixer.close();
        assert!(!mixer.is_running());
        assert!(!mixer.is_playing("music"));
        assert_eq!(
            mixer.poll_events(),
            vec![CadenzaEvent::SourceStopped {
                name: "music".to_string(),
            }]
        );
        assert!(matches!(mixer.resume(), Err(AudioError::Closed)));
        assert!(matches!(mixer.suspend(), Err(AudioError::Closed)));
    }

    #[test]
    fn test_elapsed_freezes_while_suspended() {
        let mut mixer = running_mixer();
        let (updates, ended) = recording_source(&mut mixer, "music", ten_seconds());

        mixer.play("music", 2.0).unwrap();
        mixer.backend_mut().advance(1.0);
        tick(&mut mixer);
        mixer.poll_events();

        mixer.suspend().unwrap();
        assert!(!mixer.is_running());
        assert_eq!(mixer.poll_events(), vec![CadenzaEvent::ClockSuspended]);
        assert!(mixer.suspend().is_ok());
        assert!(mixer.poll_events().is_empty());

        mixer.backend_mut().advance(1.0);
        tick(&mut mixer);
        assert!(mixer.is_playing("music"));

        mixer.resume().unwrap();
        mixer.backend_mut().advance(1.0);
        tick(&mut mixer);

        assert_eq!(*updates.borrow(), vec![3.0, 3.0, 4.0]);
        assert_eq!(ended.get(), 0);
    }
}
