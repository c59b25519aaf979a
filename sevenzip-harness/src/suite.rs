//! Top-level suite orchestration

use std::sync::Arc;

use crate::class::TestClassDescriptor;
use crate::config::TestConfiguration;
use crate::error::Result;
use crate::params;
use crate::runner::ParameterSetRunner;
use crate::unit::ExecutionUnit;

/// All execution units of one test class.
///
/// Runners appear in parameter set order and units within a runner in method
/// declaration order. Reporting relies on this order.
#[derive(Debug)]
pub struct Suite {
    class: Arc<TestClassDescriptor>,
    runners: Vec<ParameterSetRunner>,
}

impl Suite {
    /// Build the suite using the process-wide configuration
    pub fn new(class: TestClassDescriptor) -> Result<Self> {
        let config = TestConfiguration::init()?;
        Self::with_config(class, config)
    }

    /// Build the suite against an explicit configuration.
    ///
    /// Configuration errors (bad factory result, arity mismatch, ambiguous
    /// factories in strict mode) abort construction.
    pub fn with_config(class: TestClassDescriptor, config: &TestConfiguration) -> Result<Self> {
        let strict = config.strict_factory_selection;
        let tuples = params::load_parameters(&class, strict)?;
        let names = params::load_parameter_names(&class, strict)?;

        for (index, tuple) in tuples.iter().enumerate() {
            class.check_arity(tuple, index)?;
        }

        let class = Arc::new(class);
        let runners = tuples
            .into_iter()
            .enumerate()
            .map(|(index, tuple)| {
                ParameterSetRunner::new(
                    Arc::clone(&class),
                    tuple,
                    names.as_deref(),
                    index,
                    config.multithreaded_enabled,
                )
            })
            .collect::<Vec<_>>();

        log::info!(
            "Suite {}: {} parameter set(s), multithreading {}",
            class.name(),
            runners.len(),
            if config.multithreaded_enabled {
                "enabled"
            } else {
                "disabled"
            }
        );

        Ok(Self { class, runners })
    }

    /// Name of the class under test
    pub fn name(&self) -> &str {
        self.class.name()
    }

    /// The class under test
    pub fn class(&self) -> &TestClassDescriptor {
        &self.class
    }

    /// One runner per parameter set
    pub fn children(&self) -> &[ParameterSetRunner] {
        &self.runners
    }

    /// All units, runner order then method order
    pub fn units(&self) -> impl Iterator<Item = &ExecutionUnit> {
        self.runners.iter().flat_map(|runner| runner.children().iter())
    }

    /// Number of units in the suite
    pub fn len(&self) -> usize {
        self.runners.iter().map(|runner| runner.children().len()).sum()
    }

    /// Whether the suite has no units
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Hand all units over for execution
    pub fn into_units(self) -> Vec<ExecutionUnit> {
        self.runners
            .into_iter()
            .flat_map(ParameterSetRunner::into_children)
            .collect()
    }
}
