//! One-shot timed events folded into an accumulated state.
//!
//! A [`Timeline`] holds [`TimedEvent`]s in registration order. Evaluating it
//! at a time fires every event that is due and has not fired yet, in
//! registration order, and shallow-merges their partial states onto the
//! previous [`AccumulatedState`] with the last writer winning. Each event
//! fires at most once per timeline, whatever order times arrive in.
//!
//! When nothing fires, the previous snapshot is handed back as the very same
//! shared value, so callers detect "no change" with
//! [`AccumulatedState::same_as`] instead of comparing contents.

use serde_json::{Map, Value};
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

/// Key/value mapping produced by one event.
pub type PartialState = Map<String, Value>;

/// Key/value mapping of the accumulated state.
pub type StateMap = Map<String, Value>;

/// Immutable, cheaply clonable snapshot of the merged state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccumulatedState(Rc<StateMap>);

impl AccumulatedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(map: StateMap) -> Self {
        Self(Rc::new(map))
    }

    /// True when both handles point at the same snapshot.
    pub fn same_as(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub fn as_map(&self) -> &StateMap {
        &self.0
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.as_map().clone())
    }
}

impl Deref for AccumulatedState {
    type Target = StateMap;

    fn deref(&self) -> &StateMap {
        &self.0
    }
}

impl From<StateMap> for AccumulatedState {
    fn from(map: StateMap) -> Self {
        Self::from_map(map)
    }
}

pub struct TimedEvent {
    target_time: f64,
    callback: Box<dyn FnMut() -> PartialState>,
    emitted: bool,
}

impl TimedEvent {
    /// An event due once the time reaches `target_time` seconds.
    /// A NaN target is never due.
    pub fn new<F>(target_time: f64, callback: F) -> Self
    where
        F: FnMut() -> PartialState + 'static,
    {
        Self {
            target_time,
            callback: Box::new(callback),
            emitted: false,
        }
    }

    pub fn target_time(&self) -> f64 {
        self.target_time
    }

    pub fn is_emitted(&self) -> bool {
        self.emitted
    }

    fn fire_if_due(&mut self, time: f64) -> Option<PartialState> {
        let due = time >= self.target_time;
        if self.emitted || !due {
            return None;
        }
        self.emitted = true;
        Some((self.callback)())
    }
}

impl fmt::Debug for TimedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedEvent")
            .field("target_time", &self.target_time)
            .field("emitted", &self.emitted)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct Timeline {
    events: Vec<TimedEvent>,
}

impl Timeline {
    pub fn new(events: impl IntoIterator<Item = TimedEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }

    /// Fires due events and merges their output onto `previous`.
    ///
    /// Returns `previous` itself (see [`AccumulatedState::same_as`]) when no
    /// event fired.
    pub fn evaluate(&mut self, time: f64, previous: &AccumulatedState) -> AccumulatedState {
        let mut merged: Option<StateMap> = None;

        for event in self.events.iter_mut() {
            let Some(partial) = event.fire_if_due(time) else {
                continue;
            };
            log::debug!(
                "Timed event at {:.3}s fired at {:.3}s ({} keys)",
                event.target_time,
                time,
                partial.len()
            );
            let state = merged.get_or_insert_with(|| previous.as_map().clone());
            for (key, value) in partial {
                state.insert(key, value);
            }
        }

        match merged {
            Some(state) => AccumulatedState::from_map(state),
            None => previous.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of events that have not fired yet.
    pub fn pending(&self) -> usize {
        self.events.iter().filter(|e| !e.emitted).count()
    }

    pub fn is_finished(&self) -> bool {
        self.pending() == 0
    }

    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }
}

impl FromIterator<TimedEvent> for Timeline {
    fn from_iter<I: IntoIterator<Item = TimedEvent>>(iter: I) -> Self {
        Self::new(iter)
    }
}
