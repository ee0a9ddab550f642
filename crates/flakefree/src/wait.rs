//! Wait Mechanisms
//!
//! Playwright-compatible waits for element state and page conditions.
//!
//! Every wait polls the live page through [`PageDriver`] until its predicate is
//! observed true. The predicate is checked at least once, even with a zero timeout,
//! and a wait never succeeds because time has passed. The poll interval only paces
//! the checks.

use crate::driver::PageDriver;
use crate::locator::{js_string, Locator};
use crate::result::{FlakeError, FlakeResult};
use crate::state::ElementState;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Default timeout for wait operations (30 seconds)
pub const DEFAULT_WAIT_TIMEOUT_MS: u64 = 30_000;

/// Default polling interval (50ms)
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load states (Playwright parity)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoadState {
    /// Wait for the `load` event to fire
    #[default]
    Load,
    /// Wait for `DOMContentLoaded` event
    DomContentLoaded,
}

impl LoadState {
    /// Get the JavaScript event name for this load state
    #[must_use]
    pub const fn event_name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::DomContentLoaded => "DOMContentLoaded",
        }
    }

    /// Page expression that is true once this state has been reached
    #[must_use]
    pub const fn ready_expression(&self) -> &'static str {
        match self {
            Self::Load => "document.readyState === 'complete'",
            Self::DomContentLoaded => "document.readyState !== 'loading'",
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.event_name())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl Default for WaitOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_WAIT_TIMEOUT_MS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl WaitOptions {
    /// Create new wait options with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set timeout in milliseconds
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    /// Set polling interval in milliseconds
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Apply a locator's own timeout override, if it has one
    #[must_use]
    pub fn for_locator(self, locator: &Locator) -> Self {
        match locator.timeout() {
            Some(timeout) => self.with_timeout(duration_ms(timeout)),
            None => self,
        }
    }
}

// =============================================================================
// WAIT CONDITION
// =============================================================================

/// What a wait is waiting for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitFor {
    /// A locator reaching an element state
    Element {
        /// Element to observe
        locator: Locator,
        /// Required state
        state: ElementState,
    },
    /// A page expression becoming truthy
    Function(String),
}

impl WaitFor {
    /// Get description for error messages
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Element { locator, state } => format!("{locator} to be {state}"),
            Self::Function(expression) => format!("`{expression}` to be truthy"),
        }
    }

    async fn is_satisfied<D: PageDriver + ?Sized>(&self, page: &D) -> FlakeResult<bool> {
        match self {
            Self::Element { locator, state } => {
                let snapshot = page.probe(locator).await?;
                Ok(state.is_satisfied_by(&snapshot))
            }
            Self::Function(expression) => Ok(is_truthy(&page.evaluate(expression).await?)),
        }
    }

    /// One check; a lost execution context reads as "not yet"
    async fn check<D: PageDriver + ?Sized>(&self, page: &D) -> FlakeResult<bool> {
        match self.is_satisfied(page).await {
            Err(e) if e.is_transient() => {
                tracing::debug!(error = %e, "transient probe failure, polling again");
                Ok(false)
            }
            other => other,
        }
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitResult {
    /// Time spent waiting
    pub elapsed: Duration,
    /// Number of times the predicate was checked
    pub polls: usize,
    /// Description of what was waited for
    pub waited_for: String,
}

// =============================================================================
// WAIT PRIMITIVE
// =============================================================================

/// Poll `condition` until it holds or `options.timeout` elapses.
///
/// Probe failures caused by a replaced execution context are treated as "not yet";
/// every other driver error is returned unchanged.
pub async fn wait_for<D: PageDriver + ?Sized>(
    page: &D,
    condition: &WaitFor,
    options: &WaitOptions,
) -> FlakeResult<WaitResult> {
    let start = Instant::now();
    let mut polls = 1usize;

    // First check runs outside the deadline: a zero timeout still completes one probe.
    let outcome = if condition.check(page).await? {
        Ok(Ok(()))
    } else {
        let remaining = options.timeout().saturating_sub(start.elapsed());
        tokio::time::timeout(remaining, async {
            loop {
                tokio::time::sleep(options.poll_interval()).await;
                polls += 1;
                match condition.check(page).await {
                    Ok(true) => return Ok(()),
                    Ok(false) => {}
                    Err(e) => return Err(e),
                }
            }
        })
        .await
    };

    let elapsed = start.elapsed();
    let waited_for = condition.description();
    match outcome {
        Ok(Ok(())) => {
            tracing::debug!(
                waited_for = %waited_for,
                polls,
                elapsed_ms = duration_ms(elapsed),
                "wait satisfied"
            );
            Ok(WaitResult {
                elapsed,
                polls,
                waited_for,
            })
        }
        Ok(Err(e)) => Err(e),
        Err(_) => {
            tracing::debug!(waited_for = %waited_for, polls, "wait timed out");
            Err(FlakeError::Timeout {
                waited_for,
                timeout_ms: options.timeout_ms,
                elapsed_ms: duration_ms(elapsed),
            })
        }
    }
}

/// Wait until `locator` reaches `state`
pub async fn wait_for_state<D: PageDriver + ?Sized>(
    page: &D,
    locator: &Locator,
    state: ElementState,
    options: &WaitOptions,
) -> FlakeResult<WaitResult> {
    let condition = WaitFor::Element {
        locator: locator.clone(),
        state,
    };
    wait_for(page, &condition, &options.for_locator(locator)).await
}

/// Wait until a page expression evaluates truthy, e.g. `window.isAppReady===true`
pub async fn wait_for_function<D: PageDriver + ?Sized>(
    page: &D,
    expression: &str,
    options: &WaitOptions,
) -> FlakeResult<WaitResult> {
    wait_for(page, &WaitFor::Function(expression.to_string()), options).await
}

/// Wait until the document reaches a load state
pub async fn wait_for_load_state<D: PageDriver + ?Sized>(
    page: &D,
    state: LoadState,
    options: &WaitOptions,
) -> FlakeResult<WaitResult> {
    wait_for_function(page, state.ready_expression(), options).await
}

/// Wait until a global flag on `window` is strictly `true`
pub async fn wait_for_ready_flag<D: PageDriver + ?Sized>(
    page: &D,
    flag: &str,
    options: &WaitOptions,
) -> FlakeResult<WaitResult> {
    let expression = format!("window[{}] === true", js_string(flag));
    wait_for_function(page, &expression, options).await
}

/// JavaScript truthiness of an evaluated value
#[must_use]
pub fn is_truthy(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => false,
        serde_json::Value::Bool(b) => *b,
        serde_json::Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        serde_json::Value::String(s) => !s.is_empty(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => true,
    }
}

pub(crate) fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

// =============================================================================
// TESTS
// =============================================================================
