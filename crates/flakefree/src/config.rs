//! Suite configuration.
//!
//! Defaults match the local demo server. A YAML file can override any field;
//! the CLI layers its flags and environment variables on top.

use crate::expect::DEFAULT_EXPECT_TIMEOUT_MS;
use crate::result::{FlakeError, FlakeResult};
use crate::wait::{WaitOptions, DEFAULT_POLL_INTERVAL_MS, DEFAULT_WAIT_TIMEOUT_MS};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default application URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

/// Default number of logins in the multi-login scenario
pub const DEFAULT_LOGIN_ITERATIONS: u32 = 3;

/// Browser viewport size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Configuration for one suite run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Application URL; scenario paths are resolved against it
    pub base_url: String,
    /// Run the browser without a window
    pub headless: bool,
    /// Keep Chromium's sandbox enabled (disable in containers)
    pub sandbox: bool,
    /// Chromium binary (None = auto-detect)
    pub chromium_path: Option<String>,
    /// Scenarios run concurrently
    pub workers: usize,
    /// Timeout for element and page waits
    pub wait_timeout_ms: u64,
    /// Retry window for expectations
    pub expect_timeout_ms: u64,
    /// Interval between probes
    pub poll_interval_ms: u64,
    /// Logins performed by the multi-login scenario
    pub login_iterations: u32,
    /// Browser viewport
    pub viewport: Viewport,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            headless: true,
            sandbox: true,
            chromium_path: None,
            workers: default_workers(),
            wait_timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            expect_timeout_ms: DEFAULT_EXPECT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            login_iterations: DEFAULT_LOGIN_ITERATIONS,
            viewport: Viewport::default(),
        }
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(4)
}

impl SuiteConfig {
    /// Create a configuration with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a YAML configuration file; missing fields take their defaults
    pub fn from_yaml_file(path: impl AsRef<Path>) -> FlakeResult<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&raw)
    }

    /// Parse a YAML configuration
    pub fn from_yaml_str(raw: &str) -> FlakeResult<Self> {
        let config: Self = serde_yaml_ng::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the application URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Disable Chromium's sandbox
    #[must_use]
    pub const fn with_no_sandbox(mut self) -> Self {
        self.sandbox = false;
        self
    }

    /// Set the Chromium binary
    #[must_use]
    pub fn with_chromium_path(mut self, path: impl Into<String>) -> Self {
        self.chromium_path = Some(path.into());
        self
    }

    /// Set concurrent scenario count
    #[must_use]
    pub const fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Set wait timeout
    #[must_use]
    pub const fn with_wait_timeout(mut self, timeout_ms: u64) -> Self {
        self.wait_timeout_ms = timeout_ms;
        self
    }

    /// Set expectation retry window
    #[must_use]
    pub const fn with_expect_timeout(mut self, timeout_ms: u64) -> Self {
        self.expect_timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Set multi-login iteration count
    #[must_use]
    pub const fn with_login_iterations(mut self, iterations: u32) -> Self {
        self.login_iterations = iterations;
        self
    }

    /// Set viewport
    #[must_use]
    pub const fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport { width, height };
        self
    }

    /// Options for waits
    #[must_use]
    pub const fn wait_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.wait_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Options for expectations
    #[must_use]
    pub const fn expect_options(&self) -> WaitOptions {
        WaitOptions {
            timeout_ms: self.expect_timeout_ms,
            poll_interval_ms: self.poll_interval_ms,
        }
    }

    /// Resolve a scenario path against the base URL
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Reject values no run can succeed with
    pub fn validate(&self) -> FlakeResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(FlakeError::config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        if self.workers == 0 {
            return Err(FlakeError::config("workers must be at least 1"));
        }
        if self.poll_interval_ms == 0 {
            return Err(FlakeError::config("poll_interval_ms must be at least 1"));
        }
        if self.login_iterations == 0 {
            return Err(FlakeError::config("login_iterations must be at least 1"));
        }
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Err(FlakeError::config("viewport must be non-empty"));
        }
        Ok(())
    }
}
