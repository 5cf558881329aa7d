use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
}

/// One assertion, as seen by a [`Reporter`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerificationEvent {
    pub check: &'static str,
    pub outcome: Outcome,
    pub detail: String,
}

impl VerificationEvent {
    pub fn passed(check: &'static str, detail: impl Into<String>) -> Self {
        Self {
            check,
            outcome: Outcome::Passed,
            detail: detail.into(),
        }
    }

    pub fn failed(check: &'static str, detail: impl Into<String>) -> Self {
        Self {
            check,
            outcome: Outcome::Failed,
            detail: detail.into(),
        }
    }
}

pub trait Reporter: Send + Sync {
    fn record(&self, event: &VerificationEvent);
}

/// Forwards events to `tracing`: passes at `info`, failures at `warn`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn record(&self, event: &VerificationEvent) {
        match event.outcome {
            Outcome::Passed => info!(check = event.check, detail = %event.detail, "assertion passed"),
            Outcome::Failed => warn!(check = event.check, detail = %event.detail, "assertion failed"),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<VerificationEvent>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    // A panic while recording leaves the list intact, so a poisoned lock is
    // still read and written.
    fn lock(&self) -> MutexGuard<'_, Vec<VerificationEvent>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn events(&self) -> Vec<VerificationEvent> {
        self.lock().clone()
    }

    pub fn failures(&self) -> Vec<VerificationEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.outcome == Outcome::Failed)
            .collect()
    }

    pub fn count(&self, check: &str, outcome: Outcome) -> usize {
        self.events()
            .iter()
            .filter(|event| event.check == check && event.outcome == outcome)
            .count()
    }
}

impl Reporter for RecordingReporter {
    fn record(&self, event: &VerificationEvent) {
        self.lock().push(event.clone());
    }
}

/// Fans each event out to two reporters.
pub struct Tee<'a> {
    first: &'a dyn Reporter,
    second: &'a dyn Reporter,
}

impl<'a> Tee<'a> {
    pub fn new(first: &'a dyn Reporter, second: &'a dyn Reporter) -> Self {
        Self { first, second }
    }
}

impl Reporter for Tee<'_> {
    fn record(&self, event: &VerificationEvent) {
        self.first.record(event);
        self.second.record(event);
    }
}
