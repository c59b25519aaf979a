//! Command line front end for harness binaries
//!
//! A test binary built with `harness = false` registers its classes and hands
//! them to [`main`]:
//!
//! ```no_run
//! use sevenzip_harness::{cli, TestClassDescriptor};
//!
//! #[derive(Default)]
//! struct InitCheck;
//!
//! fn main() {
//!     let class = TestClassDescriptor::builder::<InitCheck>("InitCheck")
//!         .default_constructor()
//!         .test("initializationTest", |_| Ok(()))
//!         .build()
//!         .expect("valid test class");
//!     cli::main(vec![class]);
//! }
//! ```

use clap::{Parser, ValueEnum};
use colored::*;
use serde::Serialize;
use std::path::PathBuf;

use crate::class::TestClassDescriptor;
use crate::config::TestConfiguration;
use crate::engine::{Executor, RunNotifier, RunReport, UnitFilter, UnitReport};
use crate::error::Result;
use crate::rule::{MultithreadedRule, Outcome};
use crate::suite::Suite;
use crate::unit::{ExecutionUnit, UnitId};

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human readable progress
    Text,
    /// Machine readable report on stdout
    Json,
}

/// Command line arguments of a harness binary
#[derive(Parser, Debug, Clone)]
#[command(
    name = "sevenzip-harness",
    about = "Run parameterized 7-Zip binding tests",
    version
)]
pub struct Arguments {
    /// Only run tests whose name contains this string
    pub filter: Option<String>,

    /// Match the filter against the full test name exactly
    #[arg(long)]
    pub exact: bool,

    /// List tests instead of running them
    #[arg(long)]
    pub list: bool,

    /// Add multithreaded variants for tagged tests
    #[arg(long)]
    pub multithreaded: bool,

    /// Worker threads for multithreaded variants
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=1024))]
    pub threads: Option<u32>,

    /// Fail when a class has more than one parameter factory
    #[arg(long)]
    pub strict: bool,

    /// Read configuration from this TOML file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Only run ignored tests; no unit is ever ignored, so this selects nothing
    #[arg(long, hide = true, conflicts_with = "include_ignored")]
    pub ignored: bool,

    /// Accepted for libtest compatibility
    #[arg(long, hide = true)]
    pub include_ignored: bool,

    /// Accepted for libtest compatibility
    #[arg(long, hide = true)]
    pub nocapture: bool,

    /// Accepted for libtest compatibility
    #[arg(long, hide = true)]
    pub show_output: bool,

    /// Accepted for libtest compatibility; units run one after another
    #[arg(long, hide = true, value_name = "N")]
    pub test_threads: Option<usize>,

    /// Accepted for libtest compatibility; listing always uses the terse format
    #[arg(long, hide = true, value_name = "FORMAT")]
    pub format: Option<String>,

    /// Accepted for libtest compatibility
    #[arg(short = 'Z', hide = true, value_name = "FLAG")]
    pub unstable: Vec<String>,
}

impl Arguments {
    /// Parse the process arguments
    pub fn from_args() -> Self {
        Self::parse()
    }

    /// Configuration for this run: file or environment, then flags
    pub fn configuration(&self) -> Result<TestConfiguration> {
        let mut config = match &self.config {
            Some(path) => {
                let mut config = TestConfiguration::load_from_file(path)?;
                config.apply_overrides(|key| std::env::var(key).ok())?;
                config
            }
            None => TestConfiguration::load()?,
        };

        if self.multithreaded {
            config.multithreaded_enabled = true;
        }
        if let Some(threads) = self.threads {
            config.thread_count = threads as usize;
        }
        if self.strict {
            config.strict_factory_selection = true;
        }

        config.validate()?;
        Ok(config)
    }

    fn filter(&self) -> UnitFilter {
        if self.ignored {
            return UnitFilter::none();
        }
        match &self.filter {
            Some(pattern) if self.exact => UnitFilter::exact(pattern.clone()),
            Some(pattern) => UnitFilter::containing(pattern.clone()),
            None => UnitFilter::all(),
        }
    }
}

/// Summary of a harness run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Conclusion {
    /// Passed units
    pub passed: usize,
    /// Failed units
    pub failed: usize,
    /// Units skipped by the filter
    pub filtered_out: usize,
    /// Classes whose suite could not be built
    pub broken_suites: usize,
}

impl Conclusion {
    /// Whether anything failed
    pub fn has_failed(&self) -> bool {
        self.failed > 0 || self.broken_suites > 0
    }

    /// Process exit status for this conclusion, 101 on failure like libtest
    pub fn exit_code(&self) -> i32 {
        if self.has_failed() {
            101
        } else {
            0
        }
    }

    /// Exit the process with [`exit_code`](Self::exit_code)
    pub fn exit(&self) -> ! {
        std::process::exit(self.exit_code())
    }
}

#[derive(Serialize)]
struct ListedUnit<'a> {
    name: &'a str,
    class: &'a str,
    id: UnitId,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    report: &'a RunReport,
    errors: &'a [String],
    conclusion: &'a Conclusion,
}

/// Prints libtest-style progress lines
struct TextNotifier {
    quiet: bool,
}

impl RunNotifier for TextNotifier {
    fn suite_started(&mut self, suite: &Suite, count: usize) {
        if !self.quiet {
            println!();
            println!("running {} test(s) in {}", count, suite.name().bold());
        }
    }

    fn unit_started(&mut self, unit: &ExecutionUnit) {
        log::trace!("starting {}", unit.id());
    }

    fn unit_finished(&mut self, report: &UnitReport) {
        if self.quiet {
            return;
        }
        let status = match report.outcome {
            Outcome::Passed => "ok".green(),
            Outcome::Failed(_) => "FAILED".red(),
        };
        println!("test {} ... {}", report.name, status);
    }
}

/// Install the `env_logger` backend for the requested verbosity
pub fn init_logging(args: &Arguments) {
    let log_level = match (args.quiet, args.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    // A logger may already be installed by the embedding binary
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .try_init();
}

/// Build suites for `classes` and list or run them
pub fn run(args: &Arguments, classes: Vec<TestClassDescriptor>) -> Conclusion {
    if args.no_color || args.output != OutputFormat::Text {
        colored::control::set_override(false);
    }

    let mut conclusion = Conclusion::default();
    let mut errors = Vec::new();

    let config = match args.configuration() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            conclusion.broken_suites = classes.len();
            return conclusion;
        }
    };

    let installed = TestConfiguration::init_with(config.clone());
    if *installed != config {
        log::warn!("Process configuration was already initialized; command line settings apply to this run only");
    }

    let mut suites = Vec::new();
    for class in classes {
        let name = class.name().to_string();
        match Suite::with_config(class, &config) {
            Ok(suite) => suites.push(suite),
            Err(e) => {
                log::error!("Cannot build suite for {}: {}", name, e);
                if args.output == OutputFormat::Text {
                    eprintln!("{} {}", "error:".red().bold(), e);
                }
                errors.push(e.to_string());
                conclusion.broken_suites += 1;
            }
        }
    }

    if args.list {
        list(args, &suites);
        return conclusion;
    }

    let executor = Executor::new(MultithreadedRule::from_config(&config)).with_filter(args.filter());
    let report = match args.output {
        OutputFormat::Text => {
            let mut notifier = TextNotifier { quiet: args.quiet };
            executor.run_all(suites, &mut notifier)
        }
        OutputFormat::Json => executor.run_all(suites, &mut crate::engine::SilentNotifier),
    };

    conclusion.passed = report.passed;
    conclusion.failed = report.failed;
    conclusion.filtered_out = report.filtered_out;

    match args.output {
        OutputFormat::Text => print_summary(args, &report, &conclusion),
        OutputFormat::Json => {
            let output = JsonOutput {
                report: &report,
                errors: &errors,
                conclusion: &conclusion,
            };
            match serde_json::to_string_pretty(&output) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("{} cannot serialize report: {}", "error:".red().bold(), e),
            }
        }
    }

    conclusion
}

/// Parse arguments, install logging, run `classes` and exit
pub fn main(classes: Vec<TestClassDescriptor>) -> ! {
    let args = Arguments::from_args();
    init_logging(&args);
    run(&args, classes).exit()
}

fn list(args: &Arguments, suites: &[Suite]) {
    let filter = args.filter();
    let units: Vec<&ExecutionUnit> = suites
        .iter()
        .flat_map(|suite| suite.units())
        .filter(|unit| filter.matches(unit))
        .collect();

    match args.output {
        OutputFormat::Text => {
            for unit in &units {
                println!("{}: test", unit.name());
            }
            // Terse listings are parsed line by line by external runners
            if !args.quiet && args.format.as_deref() != Some("terse") {
                println!();
                println!("{} test(s)", units.len());
            }
        }
        OutputFormat::Json => {
            let listed: Vec<ListedUnit<'_>> = units
                .iter()
                .map(|unit| ListedUnit {
                    name: unit.name(),
                    class: unit.class_name(),
                    id: unit.id(),
                })
                .collect();
            match serde_json::to_string_pretty(&listed) {
                Ok(json) => println!("{}", json),
                Err(e) => eprintln!("{} cannot serialize listing: {}", "error:".red().bold(), e),
            }
        }
    }
}

fn print_summary(args: &Arguments, report: &RunReport, conclusion: &Conclusion) {
    if report.failed > 0 {
        println!();
        println!("failures:");
        for failure in report.failures() {
            println!();
            println!("---- {} ----", failure.name.red());
            if let Some(message) = failure.outcome.message() {
                for line in message.lines() {
                    println!("    {}", line);
                }
            }
        }
    }

    if args.quiet && !conclusion.has_failed() {
        return;
    }

    let verdict = if conclusion.has_failed() {
        "FAILED".red()
    } else {
        "ok".green()
    };
    println!();
    println!(
        "test result: {}. {} passed; {} failed; {} filtered out; {} broken suite(s)",
        verdict,
        conclusion.passed,
        conclusion.failed,
        conclusion.filtered_out,
        conclusion.broken_suites
    );
}
