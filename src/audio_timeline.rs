//! A mixer source driving a [`Timeline`].
//!
//! [`AudioTimeline`] registers one source whose time updates are fed to a
//! timeline; the resulting snapshot is published to a change callback only
//! when it is a new snapshot, so consumers re-render once per fired batch
//! rather than once per tick.
//!
//! Event callbacks run while the timeline is being evaluated; from inside one,
//! [`AudioTimeline::state`] and [`AudioTimeline::pending_events`] report the
//! values from before the evaluation.

use crate::backend::AudioBackend;
use crate::error::{NotFoundError, Result};
use crate::frame::FrameScheduler;
use crate::mixer::{Mixer, SourceHandle};
use crate::timeline::{AccumulatedState, TimedEvent, Timeline};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

pub struct AudioTimeline {
    name: String,
    timeline: Rc<RefCell<Timeline>>,
    state: Rc<RefCell<AccumulatedState>>,
    pending: Rc<Cell<usize>>,
}

impl AudioTimeline {
    pub fn new(name: impl Into<String>, events: impl IntoIterator<Item = TimedEvent>) -> Self {
        let timeline = Timeline::new(events);
        let pending = Rc::new(Cell::new(timeline.pending()));
        Self {
            name: name.into(),
            timeline: Rc::new(RefCell::new(timeline)),
            state: Rc::new(RefCell::new(AccumulatedState::new())),
            pending,
        }
    }

    pub fn source_name(&self) -> &str {
        &self.name
    }

    /// Latest published snapshot.
    pub fn state(&self) -> AccumulatedState {
        self.state.borrow().clone()
    }

    /// Events that have not fired yet.
    pub fn pending_events(&self) -> usize {
        self.pending.get()
    }

    /// Resumes the mixer's clock, then decodes `bytes` and registers them as
    /// this timeline's source. `on_change` receives every new snapshot.
    pub fn setup<B, S, F, E>(
        &self,
        mixer: &mut Mixer<B, S>,
        bytes: impl Into<Vec<u8>>,
        mut on_change: F,
        on_ended: E,
    ) -> Result<SourceHandle>
    where
        B: AudioBackend,
        S: FrameScheduler,
        F: FnMut(&AccumulatedState) + 'static,
        E: FnMut() + 'static,
    {
        mixer.resume()?;

        let timeline = self.timeline.clone();
        let state = self.state.clone();
        let pending = self.pending.clone();
        let handle = mixer.add_source(
            self.name.clone(),
            bytes,
            move |time| {
                let previous = state.borrow().clone();
                let next = timeline.borrow_mut().evaluate(time, &previous);
                pending.set(timeline.borrow().pending());
                if next.same_as(&previous) {
                    return;
                }
                *state.borrow_mut() = next.clone();
                on_change(&next);
            },
            on_ended,
        )?;

        log::debug!(
            "Timeline bound to source '{}' ({} events pending)",
            self.name,
            self.pending.get()
        );
        Ok(handle)
    }

    pub fn play<B, S>(&self, mixer: &mut Mixer<B, S>, position: f64) -> std::result::Result<(), NotFoundError>
    where
        B: AudioBackend,
        S: FrameScheduler,
    {
        mixer.play(&self.name, position)
    }

    pub fn stop<B, S>(&self, mixer: &mut Mixer<B, S>) -> std::result::Result<(), NotFoundError>
    where
        B: AudioBackend,
        S: FrameScheduler,
    {
        mixer.stop(&self.name)
    }
}
