//! Flakefree: race-free browser end-to-end tests for login flows
//!
//! Every interaction waits on a UI-state predicate before it acts. Nothing sleeps
//! for a fixed duration in place of a predicate.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    FLAKEFREE Architecture                        │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Scenario   │    │ Actions /  │    │ Wait       │            │
//! │   │ Runner     │───►│ Animation  │───►│ Primitive  │──► Page    │
//! │   │ (@c1..@c4) │    │ Helpers    │    │ (polling)  │    Driver  │
//! │   └─────┬──────┘    └────────────┘    └────────────┘            │
//! │         └──────────► expect (retrying assertions) ──────────►    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use flakefree::prelude::*;
//!
//! let browser = Browser::launch(BrowserConfig::default()).await?;
//! let config = SuiteConfig::default();
//! let report = run_suite(&browser, &config, &ScenarioId::ALL).await;
//! assert!(report.all_passed());
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
mod actions;
#[allow(clippy::missing_errors_doc)]
mod animation;
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
mod browser;
#[allow(clippy::missing_errors_doc)]
mod config;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod driver;
#[allow(clippy::missing_errors_doc)]
mod expect;
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::missing_const_for_fn,
    clippy::doc_markdown
)]
mod locator;
#[allow(clippy::missing_errors_doc)]
mod report;
mod result;
mod state;

/// Suite runner: concurrent scenarios, one isolated page each
#[allow(clippy::missing_errors_doc)]
pub mod runner;

/// Login-flow scenarios and the step-recording context they run in
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod scenario;

/// Wait primitives: element state, page expressions, load states
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod wait;

pub use actions::{
    click_when_visible, fill_when_visible, wait_for_disappearance, wait_for_disappearance_with,
    Disappearance,
};
pub use animation::{finish_script, wait_for_animations_to_finish, AnimationReport};
pub use browser::{is_context_lost_message, BrowserConfig};
#[cfg(feature = "browser")]
pub use browser::{Browser, ChromiumPage};
pub use config::{SuiteConfig, Viewport, DEFAULT_BASE_URL, DEFAULT_LOGIN_ITERATIONS};
pub use driver::{DriverCall, MockDriver, MockPageFactory, MockProbe, PageDriver, PageFactory};
pub use expect::{default_expect_options, expect, Expect, DEFAULT_EXPECT_TIMEOUT_MS};
pub use locator::{js_string, normalize_whitespace, Locator, Selector};
pub use report::{ScenarioReport, ScenarioStatus, StepRecord, SuiteReport};
pub use result::{FlakeError, FlakeResult};
pub use runner::{run_scenario, run_suite};
pub use scenario::{selectors, ScenarioContext, ScenarioId};
pub use state::{ElementSnapshot, ElementState};
pub use wait::{
    is_truthy, wait_for, wait_for_function, wait_for_load_state, wait_for_ready_flag,
    wait_for_state, LoadState, WaitFor, WaitOptions, WaitResult, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_WAIT_TIMEOUT_MS,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::actions::*;
    pub use super::animation::*;
    pub use super::browser::*;
    pub use super::config::*;
    pub use super::driver::*;
    pub use super::expect::*;
    pub use super::locator::*;
    pub use super::report::*;
    pub use super::result::*;
    pub use super::runner::*;
    pub use super::scenario::{ScenarioContext, ScenarioId};
    pub use super::state::*;
    pub use super::wait::*;
}
