//! # sevenzip-harness - Parameterized Test Harness
//!
//! A test harness for validating the 7-Zip native binding across many
//! parameter combinations, with an optional multithreaded execution mode
//! layered onto existing test methods.
//!
//! ## Features
//!
//! - One test instance per parameter set, built by an explicit constructor
//! - Deterministic names for parameter sets and test cases
//! - Optional display names for parameter slots
//! - Multithreaded variants for tagged classes or methods, without rewriting them
//! - Process-wide configuration from TOML and environment
//! - libtest-style command line front end for `harness = false` binaries
//!
//! ## Example
//!
//! ```
//! use sevenzip_harness::{param_tuple, ParamValue, Suite, TestClassDescriptor, TestConfiguration};
//!
//! struct ExtractTest {
//!     archive: String,
//!     files: i64,
//! }
//!
//! # fn main() -> Result<(), sevenzip_harness::HarnessError> {
//! let class = TestClassDescriptor::builder::<ExtractTest>("ExtractTest")
//!     .constructor(2, |set| {
//!         Ok(ExtractTest {
//!             archive: set.str_at(0)?.to_string(),
//!             files: set.int_at(1)?,
//!         })
//!     })
//!     .parameters(|| Some(ParamValue::list([param_tuple!["a.7z", 1], param_tuple!["b.7z", 2]])))
//!     .parameter_names(|| Some(vec!["archive".into(), "files".into()]))
//!     .multithreaded_test("extractAll", |t| {
//!         assert!(t.files > 0, "{} is empty", t.archive);
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let config = TestConfiguration {
//!     multithreaded_enabled: true,
//!     ..Default::default()
//! };
//! let suite = Suite::with_config(class, &config)?;
//! let names: Vec<_> = suite.units().map(|u| u.name()).collect();
//! assert_eq!(
//!     names,
//!     [
//!         "extractAll - Set 0: [archive: a.7z, files: 1]",
//!         "extractAll <Multithreaded> - Set 0: [archive: a.7z, files: 1]",
//!         "extractAll - Set 1: [archive: b.7z, files: 2]",
//!         "extractAll <Multithreaded> - Set 1: [archive: b.7z, files: 2]",
//!     ]
//! );
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod class;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod naming;
pub mod params;
pub mod rule;
pub mod runner;
pub mod suite;
pub mod unit;
pub mod value;

// Re-export commonly used types
pub use class::{
    ExpectedFailure, Invocation, MethodDescriptor, Modifiers, Tag, TestClassBuilder,
    TestClassDescriptor, TestOptions, TestResult,
};
pub use config::TestConfiguration;
pub use engine::{Executor, RunNotifier, RunReport, SilentNotifier, UnitFilter, UnitReport};
pub use error::{HarnessError, Result};
pub use params::{normalize, ParameterTuple};
pub use rule::{ExecutionRule, MultithreadedRule, Outcome};
pub use runner::ParameterSetRunner;
pub use suite::Suite;
pub use unit::{ExecutionUnit, FrameworkMethod, RuntimeInfo, UnitId};
pub use value::ParamValue;

/// Label of the unparameterized parameter set
pub const NO_PARAMETERS_LABEL: &str = "All test";

/// Suffix appended to the names of multithreaded variants
pub const MULTITHREADED_SUFFIX: &str = " <Multithreaded>";
