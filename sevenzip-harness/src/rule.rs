//! Execution rules deciding how a unit's body is run
//!
//! The runner only marks units; a rule turns that mark into an execution
//! discipline. [`MultithreadedRule`] is the stock rule: normal units run once,
//! multithreaded units run the same body on several threads at once against a
//! shared instance. The rule is also the single place expected failures are
//! matched, for both kinds of unit.

use parking_lot::Mutex;
use serde::Serialize;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Barrier, Once};
use std::thread;

use crate::class::{ExpectedFailure, Invocation};
use crate::config::TestConfiguration;
use crate::unit::ExecutionUnit;

/// Verdict for one unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message", rename_all = "lowercase")]
pub enum Outcome {
    /// The unit passed
    Passed,
    /// The unit failed with a message
    Failed(String),
}

impl Outcome {
    /// Whether the unit passed
    pub fn is_passed(&self) -> bool {
        matches!(self, Outcome::Passed)
    }

    /// Failure message, if any
    pub fn message(&self) -> Option<&str> {
        match self {
            Outcome::Passed => None,
            Outcome::Failed(message) => Some(message),
        }
    }
}

/// Runs a bound test according to the unit's runtime tag
pub trait ExecutionRule: Send + Sync {
    /// Evaluate `test` for `unit` and produce a verdict
    fn evaluate(&self, unit: &ExecutionUnit, test: &dyn Invocation) -> Outcome;
}

/// Stock rule: direct invocation, or `thread_count` concurrent invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MultithreadedRule {
    thread_count: usize,
}

impl MultithreadedRule {
    /// Create a rule running multithreaded units on `thread_count` threads
    pub fn new(thread_count: usize) -> Self {
        Self {
            thread_count: thread_count.max(1),
        }
    }

    /// Create a rule from the configured thread count
    pub fn from_config(config: &TestConfiguration) -> Self {
        Self::new(config.thread_count)
    }

    /// Number of threads used for multithreaded units
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    fn run_concurrently(&self, expected: Option<&ExpectedFailure>, test: &dyn Invocation) -> Outcome {
        let barrier = Barrier::new(self.thread_count);
        let failures: Mutex<Vec<(usize, String)>> = Mutex::new(Vec::new());

        thread::scope(|scope| {
            for index in 0..self.thread_count {
                let barrier = &barrier;
                let failures = &failures;
                scope.spawn(move || {
                    barrier.wait();
                    if let Outcome::Failed(message) = check_expected(expected, run_once(test)) {
                        failures.lock().push((index, message));
                    }
                });
            }
        });

        let mut failures = failures.into_inner();
        if failures.is_empty() {
            return Outcome::Passed;
        }

        failures.sort_by_key(|(index, _)| *index);
        log::debug!(
            "{} of {} thread(s) failed",
            failures.len(),
            self.thread_count
        );

        let details = failures
            .iter()
            .map(|(index, message)| format!("[thread {}] {}", index, message))
            .collect::<Vec<_>>()
            .join("\n");
        Outcome::Failed(format!(
            "{} of {} thread(s) failed:\n{}",
            failures.len(),
            self.thread_count,
            details
        ))
    }
}

impl Default for MultithreadedRule {
    fn default() -> Self {
        Self::from_config(&TestConfiguration::default())
    }
}

impl ExecutionRule for MultithreadedRule {
    fn evaluate(&self, unit: &ExecutionUnit, test: &dyn Invocation) -> Outcome {
        let expected = unit.expected_failure();
        if unit.runtime_info().is_multithreaded() {
            self.run_concurrently(expected, test)
        } else {
            check_expected(expected, run_once(test))
        }
    }
}

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static PANIC_LOCATION: RefCell<Option<String>> = const { RefCell::new(None) };
}

static QUIET_HOOK: Once = Once::new();

/// Wrap the panic hook so panics caught by [`run_once`] are not printed.
///
/// Other threads, and panics outside `run_once`, still reach the previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if CAPTURING.with(Cell::get) {
                let location = info
                    .location()
                    .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()));
                PANIC_LOCATION.with(|slot| *slot.borrow_mut() = location);
            } else {
                previous(info);
            }
        }));
    });
}

/// Invoke once, turning errors and panics into a failure message.
///
/// A panic's location is appended to its message, since the panic hook stays
/// silent for it.
pub fn run_once(test: &dyn Invocation) -> Result<(), String> {
    install_quiet_hook();
    CAPTURING.with(|c| c.set(true));
    let result = panic::catch_unwind(AssertUnwindSafe(|| test.invoke()));
    CAPTURING.with(|c| c.set(false));

    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(error)) => Err(format!("{:#}", error)),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            match PANIC_LOCATION.with(|slot| slot.borrow_mut().take()) {
                Some(location) => Err(format!("{}\n  at {}", message, location)),
                None => Err(message),
            }
        }
    }
}

/// Whether the current thread is inside [`run_once`]
#[cfg(test)]
fn is_capturing() -> bool {
    CAPTURING.with(Cell::get)
}

/// Match a single run against an optional expected failure
pub fn check_expected(expected: Option<&ExpectedFailure>, result: Result<(), String>) -> Outcome {
    match (expected, result) {
        (None, Ok(())) => Outcome::Passed,
        (None, Err(message)) => Outcome::Failed(message),
        (Some(expected), Ok(())) => Outcome::Failed(format!("expected {}, but the test passed", expected)),
        (Some(expected), Err(message)) if expected.matches(&message) => Outcome::Passed,
        (Some(expected), Err(message)) => Outcome::Failed(format!(
            "expected {}, got: {}",
            expected, message
        )),
    }
}

/// Extract the message of a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| payload.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "test panicked with a non-string payload".to_string())
}
