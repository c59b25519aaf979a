//! Process-wide test configuration

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::error::{HarnessError, Result};

/// Environment variable naming a TOML configuration file
pub const CONFIG_PATH_ENV: &str = "SEVENZIP_TEST_CONFIG";

/// Environment variable overriding [`TestConfiguration::multithreaded_enabled`]
pub const MULTITHREADED_ENV: &str = "SEVENZIP_TEST_MULTITHREADED";

/// Environment variable overriding [`TestConfiguration::thread_count`]
pub const THREADS_ENV: &str = "SEVENZIP_TEST_THREADS";

/// Configuration file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "sevenzip-test.toml";

static CURRENT: OnceLock<TestConfiguration> = OnceLock::new();

/// Settings shared by every suite in the process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfiguration {
    /// Whether tagged methods also get a multithreaded variant
    pub multithreaded_enabled: bool,

    /// Number of worker threads for multithreaded units
    pub thread_count: usize,

    /// Treat more than one qualifying parameter factory as an error
    pub strict_factory_selection: bool,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            multithreaded_enabled: false,
            thread_count: 4,
            strict_factory_selection: false,
        }
    }
}

impl TestConfiguration {
    /// Initialize the process-wide configuration from the environment.
    ///
    /// Only the first successful call loads anything; later calls return the
    /// already installed configuration.
    pub fn init() -> Result<&'static TestConfiguration> {
        if let Some(current) = CURRENT.get() {
            return Ok(current);
        }

        let loaded = Self::load()?;
        Ok(Self::install(loaded))
    }

    /// Install an explicit configuration unless one is already in place
    pub fn init_with(config: TestConfiguration) -> &'static TestConfiguration {
        Self::install(config)
    }

    /// The installed configuration, if [`init`](Self::init) has run
    pub fn current() -> Option<&'static TestConfiguration> {
        CURRENT.get()
    }

    fn install(config: TestConfiguration) -> &'static TestConfiguration {
        let mut installed = false;
        let current = CURRENT.get_or_init(|| {
            installed = true;
            config
        });

        if installed {
            log::debug!("Test configuration initialized: {:?}", current);
        } else {
            log::debug!("Test configuration already initialized, keeping {:?}", current);
        }

        current
    }

    /// Load configuration from the config file (if any) and the environment
    pub fn load() -> Result<Self> {
        let mut config = match Self::config_path() {
            Some(path) => Self::load_from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("Loading test configuration from {}", path.display());

        let contents = fs::read_to_string(path)?;
        let config: TestConfiguration = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a specific TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| HarnessError::Config(format!("cannot serialize configuration: {}", e)))?;

        // Create parent directories if needed
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, contents)?;
        Ok(())
    }

    /// Resolve the configuration file location
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.exists().then_some(local)
    }

    /// Apply overrides looked up by key, e.g. from the environment
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(MULTITHREADED_ENV) {
            self.multithreaded_enabled = parse_flag(MULTITHREADED_ENV, &value)?;
        }

        if let Some(value) = lookup(THREADS_ENV) {
            self.thread_count = value.trim().parse().map_err(|_| {
                HarnessError::Config(format!("{} must be a number, got `{}`", THREADS_ENV, value))
            })?;
        }

        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.thread_count == 0 {
            return Err(HarnessError::Config(
                "thread_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(HarnessError::Config(format!(
            "{} must be a boolean, got `{}`",
            key, value
        ))),
    }
}
