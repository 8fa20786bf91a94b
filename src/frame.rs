//! Refresh-cycle scheduling.
//!
//! The mixer's time-update tick is self-perpetuating: each tick asks the
//! host for the next one. A [`FrameScheduler`] is the host primitive for that
//! request and its cancellation. Requests are identified by a
//! [`FrameRequest`] handle so a stale or cancelled request can never drive a
//! tick.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Handle for one pending refresh callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(u64);

impl FrameRequest {
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

pub trait FrameScheduler {
    /// Registers interest in the next refresh cycle.
    fn request_frame(&mut self) -> FrameRequest;

    /// Withdraws a pending request. Unknown or already-fired requests are ignored.
    fn cancel_frame(&mut self, request: FrameRequest);
}

/// Fixed-cadence scheduler for hosts without a display refresh signal.
///
/// Deadlines are spaced by `interval` from the previous deadline rather than
/// from when the tick ran, so slow ticks do not make the cadence drift. A host
/// that falls behind gets its next frame immediately.
#[derive(Debug)]
pub struct IntervalFrameScheduler {
    interval: Duration,
    next_id: u64,
    pending: Option<(FrameRequest, Instant)>,
    last_deadline: Option<Instant>,
}

impl IntervalFrameScheduler {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_id: 0,
            pending: None,
            last_deadline: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Returns the pending request if its deadline is at or before `now`.
    pub fn poll(&mut self, now: Instant) -> Option<FrameRequest> {
        let (request, deadline) = self.pending?;
        if deadline > now {
            return None;
        }
        self.pending = None;
        self.last_deadline = Some(deadline);
        Some(request)
    }

    /// Sleeps until the pending request is due and returns it.
    /// Returns None when nothing is pending (the loop was cancelled).
    pub fn wait_for_frame(&mut self) -> Option<FrameRequest> {
        let (_, deadline) = self.pending?;
        let now = Instant::now();
        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        self.poll(deadline.max(Instant::now()))
    }
}

impl FrameScheduler for IntervalFrameScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        self.next_id += 1;
        let request = FrameRequest(self.next_id);
        let now = Instant::now();
        let deadline = match self.last_deadline {
            Some(last) => (last + self.interval).max(now),
            None => now + self.interval,
        };
        if let Some((replaced, _)) = self.pending.replace((request, deadline)) {
            log::debug!("Frame request {} superseded", replaced.0);
        }
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if matches!(self.pending, Some((pending, _)) if pending == request) {
            self.pending = None;
        }
    }
}

#[derive(Debug, Default)]
struct FrameLogInner {
    next_id: u64,
    pending: Vec<FrameRequest>,
    requested: Vec<FrameRequest>,
    cancelled: Vec<FrameRequest>,
}

/// Observer over a [`ManualFrameScheduler`]'s history. Stays valid after the
/// scheduler (and whatever owns it) is dropped.
#[derive(Debug, Clone, Default)]
pub struct FrameLog {
    inner: Rc<RefCell<FrameLogInner>>,
}

impl FrameLog {
    pub fn requested(&self) -> Vec<FrameRequest> {
        self.inner.borrow().requested.clone()
    }

    pub fn pending(&self) -> Vec<FrameRequest> {
        self.inner.borrow().pending.clone()
    }

    pub fn cancelled(&self) -> Vec<FrameRequest> {
        self.inner.borrow().cancelled.clone()
    }
}

/// Scheduler fired by hand: each call to [`fire`](Self::fire) is one refresh cycle.
#[derive(Debug, Default)]
pub struct ManualFrameScheduler {
    log: FrameLog,
}

impl ManualFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> FrameLog {
        self.log.clone()
    }

    /// Takes the oldest pending request, if any.
    pub fn fire(&mut self) -> Option<FrameRequest> {
        let mut inner = self.log.inner.borrow_mut();
        if inner.pending.is_empty() {
            None
        } else {
            Some(inner.pending.remove(0))
        }
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&mut self) -> FrameRequest {
        let mut inner = self.log.inner.borrow_mut();
        inner.next_id += 1;
        let request = FrameRequest(inner.next_id);
        inner.pending.push(request);
        inner.requested.push(request);
        request
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut inner = self.log.inner.borrow_mut();
        if let Some(pos) = inner.pending.iter().position(|r| *r == request) {
            inner.pending.remove(pos);
            inner.cancelled.push(request);
        }
    }
}
