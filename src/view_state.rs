//! View phase tracking for screens that wait on a single async request.
//!
//! A [`ViewState`] holds exactly one [`Phase`] at a time together with the
//! [`Generation`] of the request that produced it. Starting a request bumps the
//! generation; results from any older generation are discarded, so a slow
//! response can never overwrite the state of a newer one.

use std::fmt;

use tracing::debug;

/// Identifies one request issued by a view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mutually exclusive lifecycle phase of a view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase<T> {
    /// Nothing has been requested yet.
    Idle,
    /// A request is in flight.
    Loading,
    /// The last request failed with a user-facing message.
    Failed(String),
    /// The last request succeeded.
    Ready(T),
}

#[derive(Debug)]
pub struct ViewState<T> {
    phase: Phase<T>,
    generation: Generation,
}

impl<T> Default for ViewState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ViewState<T> {
    pub const fn new() -> Self {
        Self {
            phase: Phase::Idle,
            generation: Generation(0),
        }
    }

    /// Enter [`Phase::Loading`] for a new request.
    ///
    /// Any previous error or data is dropped. The returned generation must be
    /// handed back to [`ViewState::finish`] together with the outcome.
    pub fn begin(&mut self) -> Generation {
        self.generation = self.generation.next();
        self.phase = Phase::Loading;
        self.generation
    }

    /// Settle the request identified by `generation`.
    ///
    /// Returns `false` and leaves the state untouched when the result belongs
    /// to a superseded request.
    pub fn finish(&mut self, generation: Generation, outcome: Result<T, String>) -> bool {
        if !self.is_current(generation) {
            debug!(
                %generation,
                current = %self.generation,
                "Discarding stale result"
            );
            return false;
        }

        self.phase = match outcome {
            Ok(data) => Phase::Ready(data),
            Err(message) => Phase::Failed(message),
        };
        true
    }

    /// Whether `generation` is the request this view is still waiting for.
    pub fn is_current(&self, generation: Generation) -> bool {
        generation == self.generation && self.is_loading()
    }

    pub const fn phase(&self) -> &Phase<T> {
        &self.phase
    }

    pub const fn generation(&self) -> Generation {
        self.generation
    }

    pub const fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match &self.phase {
            Phase::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub const fn data(&self) -> Option<&T> {
        match &self.phase {
            Phase::Ready(data) => Some(data),
            _ => None,
        }
    }
}
