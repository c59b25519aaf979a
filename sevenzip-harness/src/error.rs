//! Error types for suite construction

use std::io;
use thiserror::Error;

/// Errors raised while building a suite.
///
/// Every variant is a configuration error: it aborts suite construction for the
/// class that caused it. Failures of test bodies are not errors of the harness and
/// are reported per unit by the executor instead.
#[derive(Error, Debug)]
pub enum HarnessError {
    /// I/O error while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration file could not be parsed
    #[error("Invalid configuration file: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration value is out of range or malformed
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// The parameter factory returned something that is not a collection
    #[error("{class}: return type for the parameter method `{method}` should be a collection, got {found}")]
    InvalidParameterSource {
        /// Class under test
        class: String,
        /// Factory method name
        method: String,
        /// Kind of the returned value
        found: &'static str,
    },

    /// The parameter collection mixes tuples and scalars
    #[error("{class}: parameter set {index} is a {found}, but the first set is a tuple")]
    MixedParameterShapes {
        /// Class under test
        class: String,
        /// Position of the offending element
        index: usize,
        /// Kind of the offending element
        found: &'static str,
    },

    /// A parameter tuple does not fit the class constructor
    #[error("{class}: constructor takes {expected} argument(s), parameter set {index} has {found}")]
    ConstructorArity {
        /// Class under test
        class: String,
        /// Declared constructor arity
        expected: usize,
        /// Arity of the tuple
        found: usize,
        /// Parameter set index
        index: usize,
    },

    /// The class was registered without a constructor
    #[error("{0}: test class should have exactly one public constructor")]
    MissingConstructor(String),

    /// More than one public static factory carries the same tag
    #[error("{class}: {count} public static methods are tagged as {tag}")]
    AmbiguousFactory {
        /// Class under test
        class: String,
        /// Tag shared by the methods
        tag: &'static str,
        /// Number of qualifying methods
        count: usize,
    },

    /// A constructor read a tuple slot with the wrong type
    #[error("Parameter {index}: expected {expected}, found {found}")]
    InvalidParameter {
        /// Slot position
        index: usize,
        /// Type the constructor asked for
        expected: &'static str,
        /// Type stored in the slot
        found: &'static str,
    },
}

/// Result alias used across the harness
pub type Result<T> = std::result::Result<T, HarnessError>;
