//! Integration tests

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;
    use sevenzip_harness::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn config(multithreaded: bool) -> TestConfiguration {
        TestConfiguration {
            multithreaded_enabled: multithreaded,
            thread_count: 3,
            ..Default::default()
        }
    }

    fn names(suite: &Suite) -> Vec<String> {
        suite.units().map(|unit| unit.name().to_string()).collect()
    }

    struct Archive {
        name: String,
        count: i64,
    }

    fn archive_class() -> TestClassBuilder<Archive> {
        TestClassDescriptor::builder::<Archive>("ArchiveTest").constructor(2, |set| {
            Ok(Archive {
                name: set.str_at(0)?.to_string(),
                count: set.int_at(1)?,
            })
        })
    }

    #[derive(Default)]
    struct Binding;

    #[test]
    fn test_unparameterized_class_runs_once() {
        let class = TestClassDescriptor::builder::<Binding>("BindingTest")
            .default_constructor()
            .test("initializationTest", |_| Ok(()))
            .build()
            .unwrap();

        let suite = Suite::with_config(class, &config(false)).unwrap();
        assert_eq!(names(&suite), ["initializationTest - All test"]);
        assert_eq!(suite.children()[0].name(), NO_PARAMETERS_LABEL);
    }

    #[test]
    fn test_empty_factory_result_runs_once() {
        let class = TestClassDescriptor::builder::<Binding>("EmptyTest")
            .default_constructor()
            .parameters(|| Some(ParamValue::List(Vec::new())))
            .test("initializationTest", |_| Ok(()))
            .build()
            .unwrap();

        let suite = Suite::with_config(class, &config(false)).unwrap();
        assert_eq!(names(&suite), ["initializationTest - All test"]);
    }

    #[test]
    fn test_scalar_sets_are_named_by_index() {
        struct Level(i64);

        let class = TestClassDescriptor::builder::<Level>("LevelTest")
            .constructor(1, |set| Ok(Level(set.int_at(0)?)))
            .parameters(|| Some(ParamValue::list([1, 2, 3])))
            .test("compress", |level| {
                anyhow::ensure!(level.0 > 0, "bad level");
                Ok(())
            })
            .build()
            .unwrap();

        let suite = Suite::with_config(class, &config(false)).unwrap();
        let labels: Vec<_> = suite.children().iter().map(|r| r.name()).collect();
        assert_eq!(labels, ["Set 0: [1]", "Set 1: [2]", "Set 2: [3]"]);
    }

    #[test]
    fn test_parameter_names_prefix_values() {
        let class = archive_class()
            .parameters(|| Some(ParamValue::list([param_tuple!["a", 1], param_tuple!["b", 2]])))
            .parameter_names(|| Some(vec!["name".into(), "count".into()]))
            .test("open", |_| Ok(()))
            .build()
            .unwrap();

        let suite = Suite::with_config(class, &config(false)).unwrap();
        assert_eq!(
            names(&suite),
            [
                "open - Set 0: [name: a, count: 1]",
                "open - Set 1: [name: b, count: 2]",
            ]
        );
    }

    #[test]
    fn test_short_name_list_leaves_rest_unnamed() {
        let class = archive_class()
            .parameters(|| Some(ParamValue::list([param_tuple!["a", 1]])))
            .parameter_names(|| Some(vec!["name".into()]))
            .test("open", |_| Ok(()))
            .build()
            .unwrap();

        let suite = Suite::with_config(class, &config(false)).unwrap();
        assert_eq!(names(&suite), ["open - Set 0: [name: a, 1]"]);
    }

    #[test]
    fn test_multithreaded_variants_follow_the_switch() {
        let build = || {
            archive_class()
                .parameters(|| Some(ParamValue::list([param_tuple!["a", 1]])))
                .test("listEntries", |_| Ok(()))
                .multithreaded_test("extractAll", |_| Ok(()))
                .build()
                .unwrap()
        };

        let disabled = Suite::with_config(build(), &config(false)).unwrap();
        assert_eq!(disabled.len(), 2);
        assert!(disabled.units().all(|unit| !unit.is_multithreaded()));

        let enabled = Suite::with_config(build(), &config(true)).unwrap();
        assert_eq!(
            names(&enabled),
            [
                "listEntries - Set 0: [a, 1]",
                "extractAll - Set 0: [a, 1]",
                "extractAll <Multithreaded> - Set 0: [a, 1]",
            ]
        );
    }

    #[test]
    fn test_class_marker_wraps_every_method() {
        let class = TestClassDescriptor::builder::<Binding>("ConcurrentTest")
            .default_constructor()
            .multithreaded()
            .test("first", |_| Ok(()))
            .test("second", |_| Ok(()))
            .build()
            .unwrap();

        let suite = Suite::with_config(class, &config(true)).unwrap();
        assert_eq!(suite.len(), 4);
        let wrapped: Vec<_> = suite
            .units()
            .filter(|unit| unit.runtime_info() == RuntimeInfo::MULTITHREADED)
            .map(|unit| unit.method().name())
            .collect();
        assert_eq!(wrapped, ["first <Multithreaded>", "second <Multithreaded>"]);
    }

    #[test]
    fn test_invalid_factory_result_aborts_suite() {
        let class = TestClassDescriptor::builder::<Binding>("BrokenTest")
            .default_constructor()
            .parameters(|| Some(ParamValue::from("not a list")))
            .test("t", |_| Ok(()))
            .build()
            .unwrap();

        let err = Suite::with_config(class, &config(false)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "BrokenTest: return type for the parameter method `parameters` should be a collection, got string"
        );
    }

    #[test]
    fn test_non_static_factory_is_ignored() {
        let class = TestClassDescriptor::builder::<Binding>("InstanceFactoryTest")
            .default_constructor()
            .parameters_with("instanceParameters", Modifiers::PUBLIC, || {
                Some(ParamValue::list([1, 2]))
            })
            .test("t", |_| Ok(()))
            .build()
            .unwrap();

        let suite = Suite::with_config(class, &config(false)).unwrap();
        assert_eq!(names(&suite), ["t - All test"]);
    }

    #[test]
    fn test_first_factory_wins_unless_strict() {
        struct Value(i64);

        let build = || {
            TestClassDescriptor::builder::<Value>("TwoFactories")
                .constructor(1, |set| Ok(Value(set.int_at(0)?)))
                .parameters_with("primary", Modifiers::PUBLIC | Modifiers::STATIC, || {
                    Some(ParamValue::list([10]))
                })
                .parameters_with("secondary", Modifiers::PUBLIC | Modifiers::STATIC, || {
                    Some(ParamValue::list([20, 30]))
                })
                .test("t", |value| {
                    anyhow::ensure!(value.0 == 10, "wrong factory");
                    Ok(())
                })
                .build()
                .unwrap()
        };

        let suite = Suite::with_config(build(), &config(false)).unwrap();
        assert_eq!(names(&suite), ["t - Set 0: [10]"]);

        let strict = TestConfiguration {
            strict_factory_selection: true,
            ..config(false)
        };
        assert!(matches!(
            Suite::with_config(build(), &strict),
            Err(HarnessError::AmbiguousFactory { count: 2, .. })
        ));
    }

    #[test]
    fn test_each_unit_gets_a_fresh_instance() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructed);

        let class = TestClassDescriptor::builder::<Archive>("FreshInstanceTest")
            .constructor(2, move |set| {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Archive {
                    name: set.str_at(0)?.to_string(),
                    count: set.int_at(1)?,
                })
            })
            .parameters(|| Some(ParamValue::list([param_tuple!["a", 1], param_tuple!["b", 2]])))
            .test("open", |a| {
                anyhow::ensure!(!a.name.is_empty(), "unnamed archive");
                Ok(())
            })
            .test("count", |a| {
                anyhow::ensure!(a.count > 0, "empty archive");
                Ok(())
            })
            .build()
            .unwrap();

        let suite = Suite::with_config(class, &config(false)).unwrap();
        assert_eq!(constructed.load(Ordering::SeqCst), 0);

        let report = Executor::default().run(suite, &mut SilentNotifier);
        assert!(report.is_success());
        assert_eq!(constructed.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_multithreaded_unit_runs_on_every_thread() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);

        let class = TestClassDescriptor::builder::<Binding>("ThreadedTest")
            .default_constructor()
            .multithreaded_test("extract", move |_| {
                seen.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
            .unwrap();

        let cfg = config(true);
        let report = Executor::new(MultithreadedRule::from_config(&cfg))
            .run(Suite::with_config(class, &cfg).unwrap(), &mut SilentNotifier);

        assert_eq!(report.passed, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 1 + cfg.thread_count);
        assert!(report.units[1].multithreaded);
    }

    #[test]
    fn test_expected_failures_are_matched() {
        let class = TestClassDescriptor::builder::<Binding>("DoubleInitTest")
            .default_constructor()
            .test_expecting(
                "doubleInitializationTest",
                ExpectedFailure::containing("already initialized"),
                |_| anyhow::bail!("binding already initialized"),
            )
            .test_expecting("silentTest", ExpectedFailure::any(), |_| Ok(()))
            .build()
            .unwrap();

        let report = Executor::default().run(
            Suite::with_config(class, &config(false)).unwrap(),
            &mut SilentNotifier,
        );
        assert_eq!(report.passed, 1);
        assert_eq!(
            report.failures().map(|u| u.name.as_str()).collect::<Vec<_>>(),
            ["silentTest - All test"]
        );
    }

    #[test]
    fn test_report_serializes() {
        let class = TestClassDescriptor::builder::<Binding>("JsonTest")
            .default_constructor()
            .test("fails", |_| anyhow::bail!("corrupt header"))
            .build()
            .unwrap();

        let report = Executor::default().run(
            Suite::with_config(class, &config(false)).unwrap(),
            &mut SilentNotifier,
        );
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["failed"], 1);
        assert_eq!(json["units"][0]["name"], "fails - All test");
        assert_eq!(json["units"][0]["outcome"]["status"], "failed");
        assert_eq!(json["units"][0]["outcome"]["message"], "corrupt header");
    }

    #[test]
    fn test_configuration_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("sevenzip-test.toml");

        let config = TestConfiguration {
            multithreaded_enabled: true,
            thread_count: 12,
            strict_factory_selection: true,
        };
        config.save_to_file(&path).unwrap();

        let loaded = TestConfiguration::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_configuration_file_rejects_zero_threads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "thread_count = 0\n").unwrap();

        assert!(matches!(
            TestConfiguration::load_from_file(&path),
            Err(HarnessError::Config(_))
        ));
    }

    #[test]
    fn test_cli_lists_without_running() {
        let ran = Arc::new(AtomicUsize::new(0));
        let flag = Arc::clone(&ran);

        let class = TestClassDescriptor::builder::<Binding>("ListedTest")
            .default_constructor()
            .multithreaded_test("t", move |_| {
                flag.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .build()
            .unwrap();

        let args = cli::Arguments::try_parse_from(["harness", "--list", "--multithreaded", "-q"]).unwrap();
        let conclusion = cli::run(&args, vec![class]);
        assert!(!conclusion.has_failed());
        assert_eq!(ran.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_cli_counts_broken_suites() {
        let broken = TestClassDescriptor::builder::<Binding>("BrokenSuite")
            .default_constructor()
            .parameters(|| Some(ParamValue::Int(3)))
            .test("t", |_| Ok(()))
            .build()
            .unwrap();
        let healthy = TestClassDescriptor::builder::<Binding>("HealthySuite")
            .default_constructor()
            .test("t", |_| Ok(()))
            .build()
            .unwrap();

        let args = cli::Arguments::try_parse_from(["harness", "-q"]).unwrap();
        let conclusion = cli::run(&args, vec![broken, healthy]);
        assert_eq!(conclusion.broken_suites, 1);
        assert_eq!(conclusion.passed, 1);
        assert!(conclusion.has_failed());
    }
}
