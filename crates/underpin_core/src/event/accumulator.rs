//! Validated single-value holder threaded through observer chains.

use log::warn;
use std::fmt::{Debug, Formatter};

type StateValidator<S> = Box<dyn Fn(&S) -> bool>;

/// Mutable state with a default and a validity predicate.
///
/// # Invariants
/// - `get_state` only ever returns the default or a state the predicate
///   accepted.
/// - A rejected update is reported through the return value and a warning,
///   never raised.
pub struct Accumulator<S> {
    default: S,
    state: S,
    validator: StateValidator<S>,
}

impl<S: Clone> Accumulator<S> {
    /// Accumulator accepting every state.
    pub fn new(default: S) -> Self {
        Self::with_validator(default, |_| true)
    }

    pub fn with_validator(default: S, validator: impl Fn(&S) -> bool + 'static) -> Self {
        Self {
            state: default.clone(),
            default,
            validator: Box::new(validator),
        }
    }

    /// Restores the default state.
    pub fn reset(&mut self) {
        self.state = self.default.clone();
    }
}

impl<S> Accumulator<S> {
    /// Commits `state` when valid. Returns whether it was committed.
    pub fn update(&mut self, state: S) -> bool {
        if !(self.validator)(&state) {
            warn!("event=accumulator_update module=event status=rejected");
            return false;
        }
        self.state = state;
        true
    }

    pub fn get_state(&self) -> &S {
        &self.state
    }

    pub fn default_state(&self) -> &S {
        &self.default
    }

    pub fn into_state(self) -> S {
        self.state
    }
}

impl<S: Debug> Debug for Accumulator<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Accumulator")
            .field("default", &self.default)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
