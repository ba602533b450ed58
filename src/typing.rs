//! Simulated "client is typing…" indicator for the open conversation.
//!
//! Opening a conversation that has unread client messages arms two
//! deadlines: show the indicator after `show_after`, hide it again at
//! `hide_after` (both measured from the trigger). Switching conversations
//! or any change to the message log drops both deadlines before anything
//! new is armed, so an indicator can never outlive the conversation it
//! was started for.
//!
//! Nothing here spawns timers. The owner calls [`TypingSimulator::tick`]
//! from its event loop and the simulator fires whatever is due according
//! to its [`Clock`], which keeps tests free of real sleeps.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

/// Source of "now" for the simulator.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Virtual clock that only moves when told to. Clones share the same time,
/// so a test can hand one to the simulator and keep another to advance.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    elapsed_ms: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Move forward by `by`, saturating at the largest representable offset.
    pub fn advance(&self, by: Duration) {
        let by = whole_millis(by);
        let _ = self
            .elapsed_ms
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |ms| Some(ms.saturating_add(by)));
    }

    /// Jump to an absolute offset from the clock's origin.
    pub fn set(&self, since_origin: Duration) {
        self.elapsed_ms.store(whole_millis(since_origin), Ordering::SeqCst);
    }

    pub fn elapsed(&self) -> Duration {
        Duration::from_millis(self.elapsed_ms.load(Ordering::SeqCst))
    }
}

fn whole_millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypingTimings {
    /// Delay from trigger until the indicator appears.
    pub show_after: Duration,
    /// Delay from trigger until the indicator disappears.
    pub hide_after: Duration,
}

impl Default for TypingTimings {
    fn default() -> Self {
        Self {
            show_after: Duration::from_millis(500),
            hide_after: Duration::from_millis(3500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingState {
    Idle,
    PendingShow,
    Showing,
}

#[derive(Debug, Clone, Copy)]
struct Deadlines {
    show_at: Instant,
    hide_at: Instant,
}

pub struct TypingSimulator<C: Clock> {
    clock: C,
    timings: TypingTimings,
    active_client: Option<String>,
    state: TypingState,
    deadlines: Option<Deadlines>,
}

impl<C: Clock> TypingSimulator<C> {
    pub fn new(clock: C, timings: TypingTimings) -> Self {
        Self {
            clock,
            timings,
            active_client: None,
            state: TypingState::Idle,
            deadlines: None,
        }
    }

    /// The conversation for `client_id` became the open one. Arms the
    /// indicator only if that conversation has unread client messages.
    pub fn activate(&mut self, client_id: &str, has_unread_client_message: bool) {
        self.reset();
        self.active_client = Some(client_id.to_string());
        self.arm(has_unread_client_message);
    }

    /// No conversation is open any more.
    pub fn cancel(&mut self) {
        self.reset();
        self.active_client = None;
    }

    /// The message log changed. Pending deadlines are dropped no matter
    /// what, then the trigger is evaluated again for the open conversation.
    pub fn messages_changed(&mut self, has_unread_client_message: bool) {
        self.reset();
        if self.active_client.is_some() {
            self.arm(has_unread_client_message);
        }
    }

    /// Fire every transition that is due. A tick late enough to pass both
    /// deadlines goes straight back to `Idle`.
    pub fn tick(&mut self) -> TypingState {
        let Some(deadlines) = self.deadlines else {
            return self.state;
        };
        let now = self.clock.now();
        if self.state == TypingState::PendingShow && now >= deadlines.show_at {
            self.transition(TypingState::Showing);
        }
        if now >= deadlines.hide_at {
            self.transition(TypingState::Idle);
            self.deadlines = None;
        }
        self.state
    }

    pub fn state(&self) -> TypingState {
        self.state
    }

    pub fn active_client(&self) -> Option<&str> {
        self.active_client.as_deref()
    }

    pub fn is_showing_for(&self, client_id: &str) -> bool {
        self.state == TypingState::Showing && self.active_client.as_deref() == Some(client_id)
    }

    pub fn timings(&self) -> TypingTimings {
        self.timings
    }

    fn arm(&mut self, has_unread_client_message: bool) {
        if !has_unread_client_message {
            return;
        }
        let now = self.clock.now();
        self.deadlines = Some(Deadlines {
            show_at: now + self.timings.show_after,
            hide_at: now + self.timings.hide_after,
        });
        self.transition(TypingState::PendingShow);
    }

    fn reset(&mut self) {
        self.deadlines = None;
        self.transition(TypingState::Idle);
    }

    fn transition(&mut self, next: TypingState) {
        if self.state != next {
            debug!(
                client = self.active_client.as_deref().unwrap_or("-"),
                from = ?self.state,
                to = ?next,
                "typing indicator"
            );
            self.state = next;
        }
    }
}
