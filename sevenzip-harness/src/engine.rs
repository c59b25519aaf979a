//! Executes suites and collects a report

use serde::Serialize;
use std::panic::{self, AssertUnwindSafe};
use std::time::Instant;

use crate::rule::{panic_message, ExecutionRule, MultithreadedRule, Outcome};
use crate::suite::Suite;
use crate::unit::ExecutionUnit;

/// Result of one executed unit
#[derive(Debug, Clone, Serialize)]
pub struct UnitReport {
    /// Full reported name
    pub name: String,
    /// Class under test
    pub class: String,
    /// Parameter set index
    pub set_index: usize,
    /// Whether this was the multithreaded variant
    pub multithreaded: bool,
    /// Verdict
    pub outcome: Outcome,
    /// Wall clock time in milliseconds
    pub duration_ms: u64,
}

/// Results of a whole run
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Executed units in execution order
    pub units: Vec<UnitReport>,
    /// Number of passed units
    pub passed: usize,
    /// Number of failed units
    pub failed: usize,
    /// Number of units skipped by the filter
    pub filtered_out: usize,
}

impl RunReport {
    /// Whether every executed unit passed
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// Reports of failed units
    pub fn failures(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|unit| !unit.outcome.is_passed())
    }

    /// Append another report
    pub fn merge(&mut self, other: RunReport) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.filtered_out += other.filtered_out;
        self.units.extend(other.units);
    }

    fn record(&mut self, report: UnitReport) {
        if report.outcome.is_passed() {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.units.push(report);
    }
}

/// Receives progress events during a run
pub trait RunNotifier {
    /// A suite is about to run `count` units
    fn suite_started(&mut self, _suite: &Suite, _count: usize) {}

    /// A unit is about to run
    fn unit_started(&mut self, _unit: &ExecutionUnit) {}

    /// A unit finished
    fn unit_finished(&mut self, _report: &UnitReport) {}
}

/// Notifier that ignores every event
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentNotifier;

impl RunNotifier for SilentNotifier {}

/// Selects units by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitFilter {
    pattern: Option<String>,
    exact: bool,
    reject_all: bool,
}

impl UnitFilter {
    /// Match every unit
    pub fn all() -> Self {
        Self::default()
    }

    /// Match no unit at all
    pub fn none() -> Self {
        Self {
            reject_all: true,
            ..Self::default()
        }
    }

    /// Match units whose name contains `pattern`
    pub fn containing(pattern: impl Into<String>) -> Self {
        Self {
            pattern: Some(pattern.into()),
            ..Self::default()
        }
    }

    /// Match the unit named exactly `name`
    pub fn exact(name: impl Into<String>) -> Self {
        Self {
            pattern: Some(name.into()),
            exact: true,
            ..Self::default()
        }
    }

    /// Check a unit against the filter
    pub fn matches(&self, unit: &ExecutionUnit) -> bool {
        if self.reject_all {
            return false;
        }
        match &self.pattern {
            None => true,
            Some(pattern) if self.exact => unit.name() == pattern.as_str(),
            Some(pattern) => unit.name().contains(pattern.as_str()),
        }
    }
}

/// Runs units one after another through an execution rule
#[derive(Debug, Clone)]
pub struct Executor<R = MultithreadedRule> {
    rule: R,
    filter: UnitFilter,
}

impl<R: ExecutionRule> Executor<R> {
    /// Create an executor applying `rule` to every unit
    pub fn new(rule: R) -> Self {
        Self {
            rule,
            filter: UnitFilter::all(),
        }
    }

    /// Only run units accepted by `filter`
    pub fn with_filter(mut self, filter: UnitFilter) -> Self {
        self.filter = filter;
        self
    }

    /// The rule applied to every unit
    pub fn rule(&self) -> &R {
        &self.rule
    }

    /// Run every selected unit of `suite`, consuming it
    pub fn run(&self, suite: Suite, notifier: &mut dyn RunNotifier) -> RunReport {
        let mut report = RunReport::default();
        let selected = suite.units().filter(|unit| self.filter.matches(unit)).count();
        report.filtered_out = suite.len() - selected;
        notifier.suite_started(&suite, selected);

        for unit in suite.into_units() {
            if !self.filter.matches(&unit) {
                continue;
            }

            notifier.unit_started(&unit);
            let unit_report = self.run_unit(&unit);
            notifier.unit_finished(&unit_report);
            report.record(unit_report);
        }

        report
    }

    /// Run several suites in order
    pub fn run_all<I>(&self, suites: I, notifier: &mut dyn RunNotifier) -> RunReport
    where
        I: IntoIterator<Item = Suite>,
    {
        let mut report = RunReport::default();
        for suite in suites {
            report.merge(self.run(suite, notifier));
        }
        report
    }

    /// Run a single unit: construct a fresh instance, then apply the rule
    pub fn run_unit(&self, unit: &ExecutionUnit) -> UnitReport {
        let started = Instant::now();
        log::debug!("Running {}", unit.name());

        let created = panic::catch_unwind(AssertUnwindSafe(|| unit.create_test()));
        let outcome = match created {
            Ok(Ok(test)) => self.rule.evaluate(unit, test.as_ref()),
            Ok(Err(error)) => Outcome::Failed(format!("cannot create test instance: {}", error)),
            Err(payload) => Outcome::Failed(format!(
                "test constructor panicked: {}",
                panic_message(payload.as_ref())
            )),
        };

        if let Outcome::Failed(message) = &outcome {
            log::debug!("{} failed: {}", unit.name(), message);
        }

        UnitReport {
            name: unit.name().to_string(),
            class: unit.class_name().to_string(),
            set_index: unit.set_index(),
            multithreaded: unit.is_multithreaded(),
            outcome,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

impl Default for Executor<MultithreadedRule> {
    fn default() -> Self {
        Self::new(MultithreadedRule::default())
    }
}
