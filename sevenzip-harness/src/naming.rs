//! Display names for parameter sets and test cases

use std::fmt::Write;

use crate::params::ParameterTuple;
use crate::{MULTITHREADED_SUFFIX, NO_PARAMETERS_LABEL};

/// Render values as `[name: value, value]`, pairing names positionally.
///
/// Values past the end of `names` render bare.
pub fn render_tuple(tuple: &ParameterTuple, names: Option<&[String]>) -> String {
    let Some(names) = names else {
        return tuple.to_string();
    };

    let mut rendered = String::from("[");
    let mut names = names.iter();
    for (i, value) in tuple.values().iter().enumerate() {
        if i > 0 {
            rendered.push_str(", ");
        }
        if let Some(name) = names.next() {
            let _ = write!(rendered, "{}: ", name);
        }
        let _ = write!(rendered, "{}", value);
    }
    rendered.push(']');
    rendered
}

/// Label for the parameter set at `index`
pub fn describe_parameter_set(
    index: usize,
    tuple: &ParameterTuple,
    names: Option<&[String]>,
) -> String {
    if tuple.is_unparameterized() {
        return NO_PARAMETERS_LABEL.to_string();
    }
    format!("Set {}: {}", index, render_tuple(tuple, names))
}

/// Name of one test case within a parameter set
pub fn test_name(method_name: &str, set_label: &str) -> String {
    format!("{} - {}", method_name, set_label)
}

/// Reported name of a method, with the multithreaded suffix when wrapped
pub fn method_display_name(method_name: &str, multithreaded: bool) -> String {
    if multithreaded {
        format!("{}{}", method_name, MULTITHREADED_SUFFIX)
    } else {
        method_name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ParamValue;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_sentinel_label_ignores_index() {
        let tuple = ParameterTuple::unparameterized();
        assert_eq!(describe_parameter_set(0, &tuple, None), "All test");
        assert_eq!(describe_parameter_set(7, &tuple, Some(names(&["x"]).as_slice())), "All test");
    }

    #[test]
    fn test_unnamed_rendering() {
        let tuple = ParameterTuple::new(vec![ParamValue::from("a"), ParamValue::from(1)]);
        assert_eq!(describe_parameter_set(3, &tuple, None), "Set 3: [a, 1]");
    }

    #[test]
    fn test_short_names() {
        let tuple = ParameterTuple::new(vec![1.into(), 2.into(), 3.into()]);
        assert_eq!(
            render_tuple(&tuple, Some(names(&["level"]).as_slice())),
            "[level: 1, 2, 3]"
        );
    }

    #[test]
    fn test_extra_names_are_ignored() {
        let tuple = ParameterTuple::new(vec![1.into()]);
        assert_eq!(render_tuple(&tuple, Some(names(&["a", "b"]).as_slice())), "[a: 1]");
    }

    #[test]
    fn test_empty_tuple_from_factory() {
        let tuple = ParameterTuple::new(vec![]);
        assert_eq!(describe_parameter_set(0, &tuple, None), "Set 0: []");
    }

    #[test]
    fn test_case_names() {
        assert_eq!(
            test_name("initializationTest", "All test"),
            "initializationTest - All test"
        );
        assert_eq!(
            method_display_name("extract", true),
            "extract <Multithreaded>"
        );
        assert_eq!(method_display_name("extract", false), "extract");
    }
}
