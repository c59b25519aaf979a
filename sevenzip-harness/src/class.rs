//! Test class registry
//!
//! Rust has no runtime reflection, so a test class is described up front: a
//! builder records every test method and static factory together with the
//! modifiers and tags the harness selects on. The result is an immutable
//! [`TestClassDescriptor`] that the suite orchestrator resolves against.
//!
//! ```
//! use sevenzip_harness::{ParamValue, TestClassDescriptor};
//!
//! struct ArchiveFormatTest {
//!     format: String,
//! }
//!
//! let class = TestClassDescriptor::builder::<ArchiveFormatTest>("ArchiveFormatTest")
//!     .constructor(1, |set| Ok(ArchiveFormatTest { format: set.str_at(0)?.to_string() }))
//!     .parameters(|| Some(ParamValue::list(["7z", "zip", "tar"])))
//!     .test("formatIsNamed", |t| {
//!         assert!(!t.format.is_empty());
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(class.test_methods().count(), 1);
//! ```

use bitflags::bitflags;
use std::fmt;
use std::sync::Arc;

use crate::error::{HarnessError, Result};
use crate::params::ParameterTuple;
use crate::value::ParamValue;

/// Result of a single test body invocation
pub type TestResult = anyhow::Result<()>;

/// Zero-argument static factory supplying parameter sets
pub type ParametersFn = Arc<dyn Fn() -> Option<ParamValue> + Send + Sync>;

/// Zero-argument static factory supplying parameter display names
pub type ParameterNamesFn = Arc<dyn Fn() -> Option<Vec<String>> + Send + Sync>;

type Constructor<T> = Box<dyn Fn(&ParameterTuple) -> Result<T> + Send + Sync>;
type TestBody<T> = Arc<dyn Fn(&T) -> TestResult + Send + Sync>;

/// Default name of a factory registered with [`TestClassBuilder::parameters`]
pub const DEFAULT_PARAMETERS_METHOD: &str = "parameters";

/// Default name of a factory registered with [`TestClassBuilder::parameter_names`]
pub const DEFAULT_PARAMETER_NAMES_METHOD: &str = "parameterNames";

bitflags! {
    /// Method modifiers consulted when selecting factories
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// Visible to the harness
        const PUBLIC = 0x01;
        /// Callable without an instance
        const STATIC = 0x02;
    }
}

/// Marker a method is registered under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Test method
    Test,
    /// Parameter set factory
    Parameters,
    /// Parameter names factory
    ParameterNames,
}

impl Tag {
    /// Display name of the tag
    pub fn name(self) -> &'static str {
        match self {
            Tag::Test => "Test",
            Tag::Parameters => "Parameters",
            Tag::ParameterNames => "ParameterNames",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Failure a test method declares it expects.
///
/// The harness never matches this itself; it travels with the unit to the
/// execution rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedFailure {
    message: Option<String>,
}

impl ExpectedFailure {
    /// Expect any failure
    pub fn any() -> Self {
        Self { message: None }
    }

    /// Expect a failure whose message contains `fragment`
    pub fn containing(fragment: impl Into<String>) -> Self {
        Self {
            message: Some(fragment.into()),
        }
    }

    /// The required message fragment, if any
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Check a failure message against the expectation
    pub fn matches(&self, failure: &str) -> bool {
        self.message
            .as_deref()
            .is_none_or(|fragment| failure.contains(fragment))
    }
}

impl fmt::Display for ExpectedFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(fragment) => write!(f, "failure containing `{}`", fragment),
            None => f.write_str("failure"),
        }
    }
}

/// Options for registering a test method
#[derive(Debug, Clone, Default)]
pub struct TestOptions {
    multithreaded: bool,
    expected: Option<ExpectedFailure>,
}

impl TestOptions {
    /// Default options: single-threaded, no expected failure
    pub fn new() -> Self {
        Self::default()
    }

    /// Tag the method as multithreaded
    pub fn multithreaded(mut self) -> Self {
        self.multithreaded = true;
        self
    }

    /// Declare an expected failure
    pub fn expecting(mut self, expected: ExpectedFailure) -> Self {
        self.expected = Some(expected);
        self
    }
}

/// What a registered method is
#[derive(Clone)]
pub enum MethodKind {
    /// Test method; `slot` indexes the typed body
    Test {
        /// Position of the body in the instance factory
        slot: usize,
        /// Declared expected failure
        expected: Option<ExpectedFailure>,
    },
    /// Parameter set factory
    Parameters(ParametersFn),
    /// Parameter names factory
    ParameterNames(ParameterNamesFn),
}

impl fmt::Debug for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MethodKind::Test { slot, expected } => f
                .debug_struct("Test")
                .field("slot", slot)
                .field("expected", expected)
                .finish(),
            MethodKind::Parameters(_) => f.write_str("Parameters(..)"),
            MethodKind::ParameterNames(_) => f.write_str("ParameterNames(..)"),
        }
    }
}

/// Metadata for one registered method
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    name: String,
    modifiers: Modifiers,
    multithreaded: bool,
    kind: MethodKind,
}

impl MethodDescriptor {
    /// Method name as reported
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared modifiers
    pub fn modifiers(&self) -> Modifiers {
        self.modifiers
    }

    /// Tag the method is registered under
    pub fn tag(&self) -> Tag {
        match self.kind {
            MethodKind::Test { .. } => Tag::Test,
            MethodKind::Parameters(_) => Tag::Parameters,
            MethodKind::ParameterNames(_) => Tag::ParameterNames,
        }
    }

    /// What the method is
    pub fn kind(&self) -> &MethodKind {
        &self.kind
    }

    /// Whether the method carries the multithreaded marker
    pub fn is_multithreaded(&self) -> bool {
        self.multithreaded
    }

    /// Whether the method is `public static`
    pub fn is_public_static(&self) -> bool {
        self.modifiers.contains(Modifiers::PUBLIC | Modifiers::STATIC)
    }

    /// Expected failure declared on a test method
    pub fn expected_failure(&self) -> Option<&ExpectedFailure> {
        match &self.kind {
            MethodKind::Test { expected, .. } => expected.as_ref(),
            _ => None,
        }
    }

    pub(crate) fn slot(&self) -> Option<usize> {
        match self.kind {
            MethodKind::Test { slot, .. } => Some(slot),
            _ => None,
        }
    }
}

/// A test bound to a freshly constructed instance
pub trait Invocation: Send + Sync {
    /// Run the test body once
    fn invoke(&self) -> TestResult;
}

trait InstanceFactory: Send + Sync {
    fn arity(&self) -> usize;
    fn create_test(&self, tuple: &ParameterTuple, slot: usize) -> Result<Box<dyn Invocation>>;
}

struct TypedFactory<T> {
    constructor: Constructor<T>,
    arity: usize,
    bodies: Vec<TestBody<T>>,
}

struct BoundTest<T> {
    instance: T,
    body: TestBody<T>,
}

impl<T: Send + Sync> Invocation for BoundTest<T> {
    fn invoke(&self) -> TestResult {
        (self.body)(&self.instance)
    }
}

impl<T: Send + Sync + 'static> InstanceFactory for TypedFactory<T> {
    fn arity(&self) -> usize {
        self.arity
    }

    fn create_test(&self, tuple: &ParameterTuple, slot: usize) -> Result<Box<dyn Invocation>> {
        let body = self
            .bodies
            .get(slot)
            .ok_or_else(|| HarnessError::Config(format!("no test body in slot {}", slot)))?;
        let instance = (self.constructor)(tuple)?;
        Ok(Box::new(BoundTest {
            instance,
            body: Arc::clone(body),
        }))
    }
}

/// Immutable description of a test class
pub struct TestClassDescriptor {
    name: String,
    multithreaded: bool,
    methods: Vec<Arc<MethodDescriptor>>,
    factory: Arc<dyn InstanceFactory>,
}

impl fmt::Debug for TestClassDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClassDescriptor")
            .field("name", &self.name)
            .field("multithreaded", &self.multithreaded)
            .field("constructor_arity", &self.factory.arity())
            .field("methods", &self.methods)
            .finish()
    }
}

impl TestClassDescriptor {
    /// Start describing a test class whose instances are `T`
    pub fn builder<T: Send + Sync + 'static>(name: impl Into<String>) -> TestClassBuilder<T> {
        TestClassBuilder::new(name)
    }

    /// Class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the class carries the multithreaded marker
    pub fn is_multithreaded(&self) -> bool {
        self.multithreaded
    }

    /// Number of arguments the constructor takes
    pub fn constructor_arity(&self) -> usize {
        self.factory.arity()
    }

    /// All registered methods in declaration order
    pub fn methods(&self) -> &[Arc<MethodDescriptor>] {
        &self.methods
    }

    /// Methods registered under `tag`, in declaration order
    pub fn annotated_methods(&self, tag: Tag) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.methods.iter().filter(move |m| m.tag() == tag)
    }

    /// Test methods in declaration order
    pub fn test_methods(&self) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.annotated_methods(Tag::Test)
    }

    /// Construct a fresh instance from `tuple` and bind `method` to it
    pub fn create_test(
        &self,
        tuple: &ParameterTuple,
        set_index: usize,
        method: &MethodDescriptor,
    ) -> Result<Box<dyn Invocation>> {
        self.check_arity(tuple, set_index)?;

        let slot = method.slot().ok_or_else(|| {
            HarnessError::Config(format!(
                "{}: `{}` is tagged {}, not Test",
                self.name,
                method.name(),
                method.tag()
            ))
        })?;

        // Descriptors from another class carry slots into a different body table
        let registered = self
            .methods
            .iter()
            .any(|m| std::ptr::eq(m.as_ref(), method));
        if !registered {
            return Err(HarnessError::Config(format!(
                "{}: `{}` is not a method of this class",
                self.name,
                method.name()
            )));
        }

        self.factory.create_test(tuple, slot)
    }

    /// Reject tuples whose arity differs from the constructor's
    pub fn check_arity(&self, tuple: &ParameterTuple, set_index: usize) -> Result<()> {
        let expected = self.factory.arity();
        if tuple.arity() != expected {
            return Err(HarnessError::ConstructorArity {
                class: self.name.clone(),
                expected,
                found: tuple.arity(),
                index: set_index,
            });
        }
        Ok(())
    }
}

/// Builder for [`TestClassDescriptor`]
pub struct TestClassBuilder<T> {
    name: String,
    multithreaded: bool,
    constructor: Option<(usize, Constructor<T>)>,
    methods: Vec<MethodDescriptor>,
    bodies: Vec<TestBody<T>>,
}

impl<T> fmt::Debug for TestClassBuilder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestClassBuilder")
            .field("name", &self.name)
            .field("multithreaded", &self.multithreaded)
            .field("constructor_arity", &self.constructor.as_ref().map(|(a, _)| *a))
            .field("methods", &self.methods)
            .finish()
    }
}

impl<T: Send + Sync + 'static> TestClassBuilder<T> {
    /// Create a builder for the class `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            multithreaded: false,
            constructor: None,
            methods: Vec::new(),
            bodies: Vec::new(),
        }
    }

    /// Register the class's only constructor, taking `arity` arguments
    pub fn constructor<F>(mut self, arity: usize, constructor: F) -> Self
    where
        F: Fn(&ParameterTuple) -> Result<T> + Send + Sync + 'static,
    {
        self.constructor = Some((arity, Box::new(constructor)));
        self
    }

    /// Register a zero-argument constructor using `T::default()`
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(0, |_| Ok(T::default()))
    }

    /// Put the multithreaded marker on the class
    pub fn multithreaded(mut self) -> Self {
        self.multithreaded = true;
        self
    }

    /// Register a test method
    pub fn test<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&T) -> TestResult + Send + Sync + 'static,
    {
        self.test_with(name, TestOptions::new(), body)
    }

    /// Register a test method carrying the multithreaded marker
    pub fn multithreaded_test<F>(self, name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&T) -> TestResult + Send + Sync + 'static,
    {
        self.test_with(name, TestOptions::new().multithreaded(), body)
    }

    /// Register a test method that is expected to fail
    pub fn test_expecting<F>(self, name: impl Into<String>, expected: ExpectedFailure, body: F) -> Self
    where
        F: Fn(&T) -> TestResult + Send + Sync + 'static,
    {
        self.test_with(name, TestOptions::new().expecting(expected), body)
    }

    /// Register a test method with explicit options
    pub fn test_with<F>(mut self, name: impl Into<String>, options: TestOptions, body: F) -> Self
    where
        F: Fn(&T) -> TestResult + Send + Sync + 'static,
    {
        let slot = self.bodies.len();
        self.bodies.push(Arc::new(body));
        self.methods.push(MethodDescriptor {
            name: name.into(),
            modifiers: Modifiers::PUBLIC,
            multithreaded: options.multithreaded,
            kind: MethodKind::Test {
                slot,
                expected: options.expected,
            },
        });
        self
    }

    /// Register a public static parameter factory
    pub fn parameters<F>(self, factory: F) -> Self
    where
        F: Fn() -> Option<ParamValue> + Send + Sync + 'static,
    {
        self.parameters_with(
            DEFAULT_PARAMETERS_METHOD,
            Modifiers::PUBLIC | Modifiers::STATIC,
            factory,
        )
    }

    /// Register a parameter factory with explicit name and modifiers
    pub fn parameters_with<F>(mut self, name: impl Into<String>, modifiers: Modifiers, factory: F) -> Self
    where
        F: Fn() -> Option<ParamValue> + Send + Sync + 'static,
    {
        self.methods.push(MethodDescriptor {
            name: name.into(),
            modifiers,
            multithreaded: false,
            kind: MethodKind::Parameters(Arc::new(factory)),
        });
        self
    }

    /// Register a public static parameter names factory
    pub fn parameter_names<F>(self, factory: F) -> Self
    where
        F: Fn() -> Option<Vec<String>> + Send + Sync + 'static,
    {
        self.parameter_names_with(
            DEFAULT_PARAMETER_NAMES_METHOD,
            Modifiers::PUBLIC | Modifiers::STATIC,
            factory,
        )
    }

    /// Register a parameter names factory with explicit name and modifiers
    pub fn parameter_names_with<F>(
        mut self,
        name: impl Into<String>,
        modifiers: Modifiers,
        factory: F,
    ) -> Self
    where
        F: Fn() -> Option<Vec<String>> + Send + Sync + 'static,
    {
        self.methods.push(MethodDescriptor {
            name: name.into(),
            modifiers,
            multithreaded: false,
            kind: MethodKind::ParameterNames(Arc::new(factory)),
        });
        self
    }

    /// Finish the description
    pub fn build(self) -> Result<TestClassDescriptor> {
        let (arity, constructor) = self
            .constructor
            .ok_or_else(|| HarnessError::MissingConstructor(self.name.clone()))?;

        log::debug!(
            "Registered test class {}: {} test(s), {} method(s) total, constructor arity {}",
            self.name,
            self.bodies.len(),
            self.methods.len(),
            arity
        );

        Ok(TestClassDescriptor {
            name: self.name,
            multithreaded: self.multithreaded,
            methods: self.methods.into_iter().map(Arc::new).collect(),
            factory: Arc::new(TypedFactory {
                constructor,
                arity,
                bodies: self.bodies,
            }),
        })
    }
}
