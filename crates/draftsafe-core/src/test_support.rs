//! Test doubles shared by unit tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Semaphore;

use crate::error::{Error, Result};
use crate::models::{SaveOutcome, SaveRequest, SaveStatus, StatusKind, StatusSink};
use crate::transport::SaveTransport;

enum Scripted {
    Outcome(SaveOutcome),
    Error(String),
    Panic,
}

#[derive(Default)]
struct FakeState {
    script: VecDeque<Scripted>,
    requests: Vec<SaveRequest>,
    in_flight: usize,
    max_in_flight: usize,
    next_token: i64,
}

/// Scripted transport that records every request
///
/// With an empty script every call succeeds with an increasing version
/// token. While held, calls park after being recorded until released.
pub struct FakeTransport {
    state: Mutex<FakeState>,
    held: AtomicBool,
    gate: Semaphore,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_token: 1_000,
                ..FakeState::default()
            }),
            held: AtomicBool::new(false),
            gate: Semaphore::new(0),
        }
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push_outcome(&self, outcome: SaveOutcome) {
        self.state().script.push_back(Scripted::Outcome(outcome));
    }

    pub fn push_error(&self, message: &str) {
        self.state()
            .script
            .push_back(Scripted::Error(message.to_string()));
    }

    pub fn push_panic(&self) {
        self.state().script.push_back(Scripted::Panic);
    }

    /// Park subsequent calls until [`FakeTransport::release`]
    pub fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Stop parking and let every parked call finish
    pub fn release(&self) {
        self.held.store(false, Ordering::SeqCst);
        self.gate.add_permits(64);
    }

    pub fn call_count(&self) -> usize {
        self.state().requests.len()
    }

    pub fn requests(&self) -> Vec<SaveRequest> {
        self.state().requests.clone()
    }

    pub fn in_flight(&self) -> usize {
        self.state().in_flight
    }

    pub fn max_in_flight(&self) -> usize {
        self.state().max_in_flight
    }
}

impl SaveTransport for FakeTransport {
    async fn save(&self, request: SaveRequest) -> Result<SaveOutcome> {
        {
            let mut state = self.state();
            state.requests.push(request);
            state.in_flight += 1;
            state.max_in_flight = state.max_in_flight.max(state.in_flight);
        }

        if self.held.load(Ordering::SeqCst) {
            if let Ok(permit) = self.gate.acquire().await {
                permit.forget();
            }
        }

        let scripted = {
            let mut state = self.state();
            state.in_flight -= 1;
            let scripted = state.script.pop_front();
            if scripted.is_none() {
                state.next_token += 1;
            }
            scripted.unwrap_or(Scripted::Outcome(SaveOutcome::Success {
                new_version_token: state.next_token,
            }))
        };

        match scripted {
            Scripted::Outcome(outcome) => Ok(outcome),
            Scripted::Error(message) => Err(Error::Storage(message)),
            Scripted::Panic => panic!("scripted transport panic"),
        }
    }
}

/// Status sink that remembers every reported status
#[derive(Clone, Default)]
pub struct StatusLog {
    entries: Arc<Mutex<Vec<SaveStatus>>>,
}

impl StatusLog {
    fn entries(&self) -> MutexGuard<'_, Vec<SaveStatus>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn all(&self) -> Vec<SaveStatus> {
        self.entries().clone()
    }

    pub fn kinds(&self) -> Vec<StatusKind> {
        self.entries().iter().map(SaveStatus::kind).collect()
    }

    pub fn last(&self) -> Option<SaveStatus> {
        self.entries().last().cloned()
    }
}

impl StatusSink for StatusLog {
    fn report(&self, status: &SaveStatus) {
        self.entries().push(status.clone());
    }
}
