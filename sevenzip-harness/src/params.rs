//! Parameter source resolution and parameter set normalization

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::class::{MethodDescriptor, MethodKind, Tag, TestClassDescriptor};
use crate::error::{HarnessError, Result};
use crate::value::{write_sequence, ParamValue};

/// One ordered set of constructor arguments
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterTuple {
    values: Vec<ParamValue>,
    unparameterized: bool,
}

impl ParameterTuple {
    /// Create a tuple from constructor arguments
    pub fn new(values: Vec<ParamValue>) -> Self {
        Self {
            values,
            unparameterized: false,
        }
    }

    /// The zero-arity sentinel meaning "run once, unparameterized"
    pub fn unparameterized() -> Self {
        Self {
            values: Vec::new(),
            unparameterized: true,
        }
    }

    /// Whether this is the unparameterized sentinel.
    ///
    /// A factory returning an empty tuple does not produce the sentinel.
    pub fn is_unparameterized(&self) -> bool {
        self.unparameterized
    }

    /// Number of values
    pub fn arity(&self) -> usize {
        self.values.len()
    }

    /// All values in order
    pub fn values(&self) -> &[ParamValue] {
        &self.values
    }

    /// Value at `index`, if present
    pub fn get(&self, index: usize) -> Option<&ParamValue> {
        self.values.get(index)
    }

    /// Value at `index`, or a configuration error
    pub fn value_at(&self, index: usize) -> Result<&ParamValue> {
        self.values.get(index).ok_or(HarnessError::InvalidParameter {
            index,
            expected: "value",
            found: "nothing",
        })
    }

    /// String at `index`
    pub fn str_at(&self, index: usize) -> Result<&str> {
        let value = self.value_at(index)?;
        value.as_str().ok_or_else(|| mismatch(index, "string", value))
    }

    /// Integer at `index`
    pub fn int_at(&self, index: usize) -> Result<i64> {
        let value = self.value_at(index)?;
        value.as_int().ok_or_else(|| mismatch(index, "int", value))
    }

    /// Float at `index`; integers widen
    pub fn float_at(&self, index: usize) -> Result<f64> {
        let value = self.value_at(index)?;
        value.as_float().ok_or_else(|| mismatch(index, "float", value))
    }

    /// Boolean at `index`
    pub fn bool_at(&self, index: usize) -> Result<bool> {
        let value = self.value_at(index)?;
        value.as_bool().ok_or_else(|| mismatch(index, "bool", value))
    }

    /// Convert back into a factory value
    pub fn to_value(&self) -> ParamValue {
        ParamValue::Tuple(self.values.clone())
    }
}

fn mismatch(index: usize, expected: &'static str, value: &ParamValue) -> HarnessError {
    HarnessError::InvalidParameter {
        index,
        expected,
        found: value.kind(),
    }
}

impl fmt::Display for ParameterTuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_sequence(f, &self.values)
    }
}

/// Shape problems found while normalizing a factory result
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    /// The factory did not return a collection
    #[error("expected a collection, got {0}")]
    NotACollection(&'static str),

    /// A collection that starts with a tuple holds something else later on
    #[error("element {index} is a {found}, but the first element is a tuple")]
    MixedShapes {
        /// Position of the offending element
        index: usize,
        /// Kind of the offending element
        found: &'static str,
    },
}

/// Convert a raw factory result into a non-empty list of tuples.
///
/// - nothing, null or an empty collection gives the unparameterized sentinel
/// - a collection of tuples passes through in order
/// - a collection of scalars is wrapped one value per tuple
pub fn normalize(raw: Option<ParamValue>) -> std::result::Result<Vec<ParameterTuple>, ShapeError> {
    let items = match raw {
        None | Some(ParamValue::Null) => return Ok(vec![ParameterTuple::unparameterized()]),
        Some(ParamValue::List(items)) => items,
        Some(other) => return Err(ShapeError::NotACollection(other.kind())),
    };

    let tupled = match items.first() {
        None => return Ok(vec![ParameterTuple::unparameterized()]),
        Some(first) => matches!(first, ParamValue::Tuple(_)),
    };

    if !tupled {
        return Ok(items
            .into_iter()
            .map(|item| ParameterTuple::new(vec![item]))
            .collect());
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| match item {
            ParamValue::Tuple(values) => Ok(ParameterTuple::new(values)),
            other => Err(ShapeError::MixedShapes {
                index,
                found: other.kind(),
            }),
        })
        .collect()
}

/// Find the parameter factory of `class`
pub fn resolve_parameters_method(
    class: &TestClassDescriptor,
    strict: bool,
) -> Result<Option<&Arc<MethodDescriptor>>> {
    resolve_factory(class, Tag::Parameters, strict)
}

/// Find the parameter names factory of `class`
pub fn resolve_parameter_names_method(
    class: &TestClassDescriptor,
    strict: bool,
) -> Result<Option<&Arc<MethodDescriptor>>> {
    resolve_factory(class, Tag::ParameterNames, strict)
}

/// First `public static` method tagged `tag`.
///
/// With `strict` a second qualifying method is an error, otherwise the first
/// one wins.
fn resolve_factory(
    class: &TestClassDescriptor,
    tag: Tag,
    strict: bool,
) -> Result<Option<&Arc<MethodDescriptor>>> {
    let mut qualifying = class.annotated_methods(tag).filter(|method| {
        let eligible = method.is_public_static();
        if !eligible {
            log::debug!(
                "{}: skipping {} method `{}`, not public static",
                class.name(),
                tag,
                method.name()
            );
        }
        eligible
    });

    let first = qualifying.next();
    let others = qualifying.count();

    if let Some(method) = first {
        if others > 0 {
            if strict {
                return Err(HarnessError::AmbiguousFactory {
                    class: class.name().to_string(),
                    tag: tag.name(),
                    count: others + 1,
                });
            }
            log::warn!(
                "{}: {} public static methods tagged {}, using `{}`",
                class.name(),
                others + 1,
                tag,
                method.name()
            );
        }
    }

    Ok(first)
}

/// Resolve, invoke and normalize the parameter factory of `class`
pub fn load_parameters(class: &TestClassDescriptor, strict: bool) -> Result<Vec<ParameterTuple>> {
    let Some(method) = resolve_parameters_method(class, strict)? else {
        log::debug!("{}: no parameter factory, running unparameterized", class.name());
        return Ok(vec![ParameterTuple::unparameterized()]);
    };

    let raw = match method.kind() {
        MethodKind::Parameters(factory) => factory(),
        _ => None,
    };

    let tuples = normalize(raw).map_err(|e| match e {
        ShapeError::NotACollection(found) => HarnessError::InvalidParameterSource {
            class: class.name().to_string(),
            method: method.name().to_string(),
            found,
        },
        ShapeError::MixedShapes { index, found } => HarnessError::MixedParameterShapes {
            class: class.name().to_string(),
            index,
            found,
        },
    })?;

    log::debug!(
        "{}: `{}` supplied {} parameter set(s)",
        class.name(),
        method.name(),
        tuples.len()
    );
    Ok(tuples)
}

/// Resolve and invoke the parameter names factory of `class`
pub fn load_parameter_names(
    class: &TestClassDescriptor,
    strict: bool,
) -> Result<Option<Vec<String>>> {
    let names = resolve_parameter_names_method(class, strict)?.and_then(|method| {
        match method.kind() {
            MethodKind::ParameterNames(factory) => factory(),
            _ => None,
        }
    });
    Ok(names)
}
