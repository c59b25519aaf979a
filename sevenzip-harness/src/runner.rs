//! Per-parameter-set test runner

use std::sync::{Arc, OnceLock};

use crate::class::TestClassDescriptor;
use crate::naming;
use crate::params::ParameterTuple;
use crate::unit::{ExecutionUnit, FrameworkMethod};

/// Runs every test method of a class against one parameter set.
///
/// Nothing is instantiated up front. Units are computed on first request and
/// each unit constructs its own instance when executed.
#[derive(Debug)]
pub struct ParameterSetRunner {
    class: Arc<TestClassDescriptor>,
    tuple: Arc<ParameterTuple>,
    index: usize,
    label: String,
    multithreaded_enabled: bool,
    children: OnceLock<Vec<ExecutionUnit>>,
}

impl ParameterSetRunner {
    /// Create the runner for parameter set `index`
    pub fn new(
        class: Arc<TestClassDescriptor>,
        tuple: ParameterTuple,
        names: Option<&[String]>,
        index: usize,
        multithreaded_enabled: bool,
    ) -> Self {
        let label = naming::describe_parameter_set(index, &tuple, names);
        Self {
            class,
            tuple: Arc::new(tuple),
            index,
            label,
            multithreaded_enabled,
            children: OnceLock::new(),
        }
    }

    /// Label of the parameter set, e.g. `Set 0: [a, 1]` or `All test`
    pub fn name(&self) -> &str {
        &self.label
    }

    /// Parameter set index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Constructor arguments shared by all units of this runner
    pub fn tuple(&self) -> &ParameterTuple {
        &self.tuple
    }

    /// Name of a test case in this parameter set
    pub fn test_name(&self, method: &FrameworkMethod) -> String {
        naming::test_name(&method.name(), &self.label)
    }

    /// Units of this runner, in method declaration order
    pub fn children(&self) -> &[ExecutionUnit] {
        self.children.get_or_init(|| self.compute_children())
    }

    /// Take ownership of the units
    pub fn into_children(mut self) -> Vec<ExecutionUnit> {
        self.children();
        self.children.take().unwrap_or_default()
    }

    fn compute_children(&self) -> Vec<ExecutionUnit> {
        let class_marker = self.class.is_multithreaded();
        let mut units = Vec::new();

        for method in self.class.test_methods() {
            let normal = FrameworkMethod::Normal(Arc::clone(method));

            if self.multithreaded_enabled && (class_marker || method.is_multithreaded()) {
                let wrapped = normal.to_multithreaded();
                units.push(self.unit(normal));
                units.push(self.unit(wrapped));
            } else {
                units.push(self.unit(normal));
            }
        }

        log::debug!(
            "{} / {}: {} unit(s)",
            self.class.name(),
            self.label,
            units.len()
        );
        units
    }

    fn unit(&self, method: FrameworkMethod) -> ExecutionUnit {
        let name = self.test_name(&method);
        ExecutionUnit::new(
            Arc::clone(&self.class),
            method,
            Arc::clone(&self.tuple),
            self.index,
            name,
        )
    }
}
