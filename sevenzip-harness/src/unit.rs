//! Execution units and the multithreaded method wrapper

use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::class::{ExpectedFailure, Invocation, MethodDescriptor, TestClassDescriptor};
use crate::error::Result;
use crate::naming;
use crate::params::ParameterTuple;

/// Scheduling tag consulted by the execution rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct RuntimeInfo {
    multithreaded: bool,
}

impl RuntimeInfo {
    /// Run the body once, directly
    pub const NORMAL: RuntimeInfo = RuntimeInfo {
        multithreaded: false,
    };

    /// Run the body under the multithreaded rule
    pub const MULTITHREADED: RuntimeInfo = RuntimeInfo {
        multithreaded: true,
    };

    /// Whether the unit runs under the multithreaded rule
    pub fn is_multithreaded(self) -> bool {
        self.multithreaded
    }
}

/// A test method as scheduled.
///
/// `Multithreaded` wraps the same method: the body is identical, only the
/// reported name and the runtime tag differ.
#[derive(Debug, Clone)]
pub enum FrameworkMethod {
    /// Plain invocation
    Normal(Arc<MethodDescriptor>),
    /// Invocation under the multithreaded rule
    Multithreaded(Arc<MethodDescriptor>),
}

impl FrameworkMethod {
    /// The underlying method
    pub fn method(&self) -> &Arc<MethodDescriptor> {
        match self {
            FrameworkMethod::Normal(method) | FrameworkMethod::Multithreaded(method) => method,
        }
    }

    /// Wrap the same method as its multithreaded variant
    pub fn to_multithreaded(&self) -> FrameworkMethod {
        FrameworkMethod::Multithreaded(Arc::clone(self.method()))
    }

    /// Reported method name
    pub fn name(&self) -> String {
        naming::method_display_name(self.method().name(), self.runtime_info().is_multithreaded())
    }

    /// Tag consulted by the execution rule
    pub fn runtime_info(&self) -> RuntimeInfo {
        match self {
            FrameworkMethod::Normal(_) => RuntimeInfo::NORMAL,
            FrameworkMethod::Multithreaded(_) => RuntimeInfo::MULTITHREADED,
        }
    }
}

/// Reporting identity of a unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UnitId {
    /// Plain method name
    pub method: String,
    /// Parameter set index
    pub set_index: usize,
    /// Whether this is the multithreaded variant
    pub multithreaded: bool,
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}#{}",
            naming::method_display_name(&self.method, self.multithreaded),
            self.set_index
        )
    }
}

/// One schedulable (method, parameter set, multithreaded flag) triple
#[derive(Debug, Clone)]
pub struct ExecutionUnit {
    class: Arc<TestClassDescriptor>,
    method: FrameworkMethod,
    tuple: Arc<ParameterTuple>,
    set_index: usize,
    name: String,
}

impl ExecutionUnit {
    pub(crate) fn new(
        class: Arc<TestClassDescriptor>,
        method: FrameworkMethod,
        tuple: Arc<ParameterTuple>,
        set_index: usize,
        name: String,
    ) -> Self {
        Self {
            class,
            method,
            tuple,
            set_index,
            name,
        }
    }

    /// Full reported name, `method - Set k: [...]`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Reporting identity
    pub fn id(&self) -> UnitId {
        UnitId {
            method: self.method.method().name().to_string(),
            set_index: self.set_index,
            multithreaded: self.is_multithreaded(),
        }
    }

    /// Name of the class under test
    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    /// The scheduled method
    pub fn method(&self) -> &FrameworkMethod {
        &self.method
    }

    /// Parameter set index
    pub fn set_index(&self) -> usize {
        self.set_index
    }

    /// Constructor arguments for this unit
    pub fn tuple(&self) -> &ParameterTuple {
        &self.tuple
    }

    /// Tag consulted by the execution rule
    pub fn runtime_info(&self) -> RuntimeInfo {
        self.method.runtime_info()
    }

    /// Whether the unit runs under the multithreaded rule
    pub fn is_multithreaded(&self) -> bool {
        self.runtime_info().is_multithreaded()
    }

    /// Expected failure declared on the method
    pub fn expected_failure(&self) -> Option<&ExpectedFailure> {
        self.method.method().expected_failure()
    }

    /// Construct a fresh instance and bind the method to it
    pub fn create_test(&self) -> Result<Box<dyn Invocation>> {
        self.class
            .create_test(&self.tuple, self.set_index, self.method.method())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Fixture;

    #[test]
    fn test_wrapper_changes_only_metadata() {
        let class = TestClassDescriptor::builder::<Fixture>("Fixture")
            .default_constructor()
            .test("extract", |_| Ok(()))
            .build()
            .unwrap();
        let method = Arc::clone(class.test_methods().next().unwrap());

        let normal = FrameworkMethod::Normal(method);
        let wrapped = normal.to_multithreaded();

        assert_eq!(normal.name(), "extract");
        assert_eq!(wrapped.name(), "extract <Multithreaded>");
        assert_eq!(normal.runtime_info(), RuntimeInfo::NORMAL);
        assert_eq!(wrapped.runtime_info(), RuntimeInfo::MULTITHREADED);
        assert!(Arc::ptr_eq(normal.method(), wrapped.method()));
    }

    #[test]
    fn test_unit_id_display() {
        let id = UnitId {
            method: "extract".to_string(),
            set_index: 2,
            multithreaded: true,
        };
        assert_eq!(id.to_string(), "extract <Multithreaded>#2");
    }
}
