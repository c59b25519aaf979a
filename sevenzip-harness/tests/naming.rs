//! Properties of parameter set and test case names

use proptest::prelude::*;
use sevenzip_harness::naming::{describe_parameter_set, render_tuple, test_name};
use sevenzip_harness::{ParamValue, ParameterTuple};

fn scalar() -> impl Strategy<Value = ParamValue> {
    prop_oneof![
        any::<i64>().prop_map(ParamValue::Int),
        any::<bool>().prop_map(ParamValue::Bool),
        (-1.0e6f64..1.0e6).prop_map(ParamValue::Float),
        "[a-zA-Z0-9._-]{0,12}".prop_map(ParamValue::Str),
        Just(ParamValue::Null),
    ]
}

/// A non-empty tuple together with a name list that may be shorter than it
fn tuple_with_short_names() -> impl Strategy<Value = (Vec<ParamValue>, Vec<String>)> {
    prop::collection::vec(scalar(), 1..6).prop_flat_map(|values| {
        let arity = values.len();
        (
            Just(values),
            prop::collection::vec("[a-z]{1,8}", 0..arity),
        )
    })
}

proptest! {
    #[test]
    fn prop_labels_are_deterministic(
        values in prop::collection::vec(scalar(), 0..6),
        names in prop::option::of(prop::collection::vec("[a-z]{1,8}", 0..6)),
        index in 0usize..1000,
    ) {
        let first = ParameterTuple::new(values.clone());
        let second = ParameterTuple::new(values);
        let names = names.as_deref();

        let label = describe_parameter_set(index, &first, names);
        prop_assert_eq!(&label, &describe_parameter_set(index, &second, names));
        prop_assert_eq!(&label, &describe_parameter_set(index, &first, names));
        prop_assert_eq!(
            test_name("extract", &label),
            test_name("extract", &describe_parameter_set(index, &second, names))
        );
    }

    #[test]
    fn prop_values_past_the_names_render_bare((values, names) in tuple_with_short_names()) {
        let tuple = ParameterTuple::new(values.clone());
        let rendered = render_tuple(&tuple, Some(names.as_slice()));

        let expected: Vec<String> = values
            .iter()
            .enumerate()
            .map(|(i, value)| match names.get(i) {
                Some(name) => format!("{}: {}", name, value),
                None => value.to_string(),
            })
            .collect();
        prop_assert_eq!(&rendered, &format!("[{}]", expected.join(", ")));

        let label = describe_parameter_set(7, &tuple, Some(names.as_slice()));
        prop_assert_eq!(label, format!("Set 7: {}", rendered));
    }

    #[test]
    fn prop_without_names_label_is_the_tuple(values in prop::collection::vec(scalar(), 0..6)) {
        let tuple = ParameterTuple::new(values);
        prop_assert_eq!(render_tuple(&tuple, None), tuple.to_string());
    }
}

#[test]
fn test_unparameterized_label_ignores_names() {
    let names = vec!["archive".to_string()];
    assert_eq!(
        describe_parameter_set(0, &ParameterTuple::unparameterized(), Some(names.as_slice())),
        "All test"
    );
}
