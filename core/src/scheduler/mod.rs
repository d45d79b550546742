//! Update scheduling
//!
//! Bursts of game-state change events collapse into one resolved visual
//! update per token per settle window. [`UpdateScheduler`] owns the
//! pending per-token delta accumulators and the debounce deadline as
//! instance state and is deterministically testable by draining manually;
//! [`Coordinator`] drives it with a real timer and runs the full
//! resolve-and-apply path on flush.

mod coordinator;

pub use coordinator::Coordinator;

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

/// Added/removed effect-name deltas accumulated for one token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectDelta {
    pub added: HashSet<String>,
    pub removed: HashSet<String>,
}

impl EffectDelta {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_added<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            added: names.into_iter().map(Into::into).collect(),
            removed: HashSet::new(),
        }
    }

    pub fn with_removed<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            added: HashSet::new(),
            removed: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Merge a later delta into this one. Per name, the later direction
    /// wins: an add cancels a pending remove and vice versa.
    pub fn merge(&mut self, other: EffectDelta) {
        for name in other.added {
            self.removed.remove(&name);
            self.added.insert(name);
        }
        for name in other.removed {
            self.added.remove(&name);
            self.removed.insert(name);
        }
    }
}

/// Per-process debounce queue: one pending delta per token, one shared
/// deadline. Every `schedule` call merges and pushes the deadline out, so
/// a burst settles into a single batch.
#[derive(Debug)]
pub struct UpdateScheduler {
    pending: HashMap<String, EffectDelta>,
    delay: Duration,
    deadline: Option<Instant>,
}

impl UpdateScheduler {
    pub fn new(delay: Duration) -> Self {
        Self {
            pending: HashMap::new(),
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Adjust the settle window; applies from the next `schedule` call
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// The instant the current batch settles, if anything is queued
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Queue a delta for a token, merging into any pending entry, and
    /// reset the shared debounce deadline.
    pub fn schedule(&mut self, token_id: impl Into<String>, delta: EffectDelta) {
        self.pending
            .entry(token_id.into())
            .or_default()
            .merge(delta);
        self.deadline = Some(Instant::now() + self.delay);
    }

    /// Drop any pending delta for one token
    pub fn forget(&mut self, token_id: &str) {
        self.pending.remove(token_id);
        if self.pending.is_empty() {
            self.deadline = None;
        }
    }

    /// Take the whole batch. Sorted by token id: cross-token order within
    /// a flush carries no guarantee, so keep it reproducible.
    pub fn drain(&mut self) -> Vec<(String, EffectDelta)> {
        self.deadline = None;
        let mut batch: Vec<(String, EffectDelta)> = self.pending.drain().collect();
        batch.sort_by(|a, b| a.0.cmp(&b.0));
        batch
    }
}
