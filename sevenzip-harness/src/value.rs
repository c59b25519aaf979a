//! Opaque parameter values handed from factories to test constructors

use std::fmt;

/// A value produced by a parameter factory.
///
/// `List` stands for "a collection" (what a factory returns), `Tuple` for
/// "an array of values" (one constructor call worth of arguments). Everything
/// else is a scalar.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Null reference
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value
    Str(String),
    /// Fixed-arity group of values
    Tuple(Vec<ParamValue>),
    /// Ordered collection of values
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Build a collection from anything convertible into values
    pub fn list<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        ParamValue::List(values.into_iter().map(Into::into).collect())
    }

    /// Build a tuple from anything convertible into values
    pub fn tuple<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ParamValue>,
    {
        ParamValue::Tuple(values.into_iter().map(Into::into).collect())
    }

    /// Short name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Null => "null",
            ParamValue::Bool(_) => "bool",
            ParamValue::Int(_) => "int",
            ParamValue::Float(_) => "float",
            ParamValue::Str(_) => "string",
            ParamValue::Tuple(_) => "tuple",
            ParamValue::List(_) => "list",
        }
    }

    /// Check if this is the null value
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Borrow the string payload
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Get the integer payload
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the float payload; integers widen
    pub fn as_float(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            ParamValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Get the boolean payload
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

/// Write `[a, b, c]`
pub(crate) fn write_sequence(f: &mut fmt::Formatter<'_>, values: &[ParamValue]) -> fmt::Result {
    f.write_str("[")?;
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", value)?;
    }
    f.write_str("]")
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Null => f.write_str("null"),
            ParamValue::Bool(v) => write!(f, "{}", v),
            ParamValue::Int(v) => write!(f, "{}", v),
            // Debug keeps the fractional part: 1.0 stays "1.0"
            ParamValue::Float(v) => write!(f, "{:?}", v),
            ParamValue::Str(s) => f.write_str(s),
            ParamValue::Tuple(values) | ParamValue::List(values) => write_sequence(f, values),
        }
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for ParamValue {
                fn from(v: $ty) -> Self {
                    ParamValue::Int(v as i64)
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<f32> for ParamValue {
    fn from(v: f32) -> Self {
        ParamValue::Float(v as f64)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(ParamValue::Null, Into::into)
    }
}

/// Build a [`ParamValue::Tuple`] from heterogeneous values.
///
/// ```
/// use sevenzip_harness::{param_tuple, ParamValue};
///
/// let set = param_tuple!["a", 1];
/// assert_eq!(set, ParamValue::Tuple(vec!["a".into(), 1.into()]));
/// ```
#[macro_export]
macro_rules! param_tuple {
    ($($value:expr),* $(,)?) => {
        $crate::ParamValue::Tuple(vec![$($crate::ParamValue::from($value)),*])
    };
}
