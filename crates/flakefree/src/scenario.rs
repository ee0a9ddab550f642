//! Login-flow scenarios.
//!
//! Each scenario is a straight-line sequence of named steps over one page. Steps
//! are guarded by predicate waits only; the first failing step ends the scenario
//! and is reported as [`FlakeError::StepFailed`].
//!
//! ```text
//! Init ─► FormVisible ─► Filled ─► Submitting ─► Result ─► (LoggedOut)
//! ```

use crate::actions::{click_when_visible, fill_when_visible, wait_for_disappearance};
use crate::animation::{wait_for_animations_to_finish, AnimationReport};
use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::expect::expect;
use crate::locator::Locator;
use crate::report::StepRecord;
use crate::result::{FlakeError, FlakeResult};
use crate::state::ElementState;
use crate::wait::{
    duration_ms, wait_for_load_state, wait_for_ready_flag, wait_for_state, LoadState, WaitResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::time::Instant;

/// Selectors of the application under test
pub mod selectors {
    /// Email input
    pub const EMAIL: &str = "#email";
    /// Password input
    pub const PASSWORD: &str = "#password";
    /// Login submit button
    pub const SUBMIT_BUTTON: &str = "#submitButton";
    /// Animated login form container
    pub const ANIMATED_FORM: &str = "#animatedForm";
    /// Submit button while the request is in flight
    pub const SUBMIT_LOADING: &str = ".submit-btn.loading";
    /// Submit button in any state
    pub const SUBMIT_BTN: &str = ".submit-btn";
    /// Success banner while shown
    pub const SUCCESS_SHOWN: &str = ".success-message.show";
    /// Success banner
    pub const SUCCESS_MESSAGE: &str = ".success-message";
    /// Submitted email echo
    pub const EMAIL_DISPLAY: &str = "#emailDisplay";
    /// Submitted password echo
    pub const PASSWORD_DISPLAY: &str = "#passwordDisplay";
    /// Greeting after the animated login
    pub const WELCOME_MESSAGE: &str = ".welcome-message";
    /// Logged-in user's email
    pub const USER_EMAIL: &str = "#userEmail";
    /// Dashboard once its scripts have bound handlers
    pub const INITIALIZED: &str = "[data-initialized=\"true\"]";
    /// User menu toggle
    pub const MENU_BUTTON: &str = "#menuButton";
    /// Open user menu
    pub const DROPDOWN_SHOWN: &str = ".dropdown-menu.show";
    /// Account submenu
    pub const ACCOUNT_MENU: &str = "#accountMenu";
    /// Logout entry of the account submenu
    pub const LOGOUT_OPTION: &str = "#logoutOption";
    /// Profile menu toggle
    pub const PROFILE_BUTTON: &str = "#profileButton";
    /// Page body of the reset flow
    pub const MAIN_CONTENT: &str = "#mainContent";
    /// Global flag set once the app has bound its handlers
    pub const APP_READY_FLAG: &str = "isAppReady";

    /// Link from the landing page to challenge `n`
    #[must_use]
    pub fn challenge_link(n: u8) -> String {
        format!("//*[@href='/challenge{n}.html']")
    }
}

use selectors as sel;

// =============================================================================
// SCENARIO CONTEXT
// =============================================================================

/// One scenario's view of its page, recording every step it runs.
#[derive(Debug)]
pub struct ScenarioContext<'a, D: PageDriver + ?Sized> {
    page: &'a D,
    config: &'a SuiteConfig,
    phase: Option<String>,
    steps: Vec<StepRecord>,
}

impl<'a, D: PageDriver + ?Sized> ScenarioContext<'a, D> {
    /// Create a context over `page`
    #[must_use]
    pub const fn new(page: &'a D, config: &'a SuiteConfig) -> Self {
        Self {
            page,
            config,
            phase: None,
            steps: Vec::new(),
        }
    }

    /// The page under test
    #[must_use]
    pub const fn page(&self) -> &'a D {
        self.page
    }

    /// Suite configuration
    #[must_use]
    pub const fn config(&self) -> &'a SuiteConfig {
        self.config
    }

    /// Steps run so far
    #[must_use]
    pub fn steps(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Consume the context, returning its step records
    #[must_use]
    pub fn into_steps(self) -> Vec<StepRecord> {
        self.steps
    }

    /// Prefix following step names with `phase` (e.g. `login 2`)
    pub fn begin_phase(&mut self, phase: impl Into<String>) {
        self.phase = Some(phase.into());
    }

    /// Stop prefixing step names
    pub fn end_phase(&mut self) {
        self.phase = None;
    }

    /// Run `action` as a named step.
    ///
    /// The step is recorded either way. A failure comes back wrapped in
    /// [`FlakeError::StepFailed`].
    pub async fn step<T, F>(&mut self, name: impl Into<String>, action: F) -> FlakeResult<T>
    where
        F: Future<Output = FlakeResult<T>>,
    {
        let name = match &self.phase {
            Some(phase) => format!("{phase}: {}", name.into()),
            None => name.into(),
        };
        let start = Instant::now();
        let outcome = action.await;
        let elapsed_ms = duration_ms(start.elapsed());

        match outcome {
            Ok(value) => {
                tracing::debug!(step = %name, elapsed_ms, "step passed");
                self.steps.push(StepRecord {
                    name,
                    elapsed_ms,
                    passed: true,
                });
                Ok(value)
            }
            Err(e) => {
                tracing::warn!(step = %name, elapsed_ms, error = %e, "step failed");
                self.steps.push(StepRecord {
                    name: name.clone(),
                    elapsed_ms,
                    passed: false,
                });
                Err(FlakeError::StepFailed {
                    step: name,
                    elapsed_ms,
                    source: Box::new(e),
                })
            }
        }
    }

    /// Navigate to a path under the base URL
    pub async fn goto(&mut self, path: &str) -> FlakeResult<()> {
        let url = self.config.url(path);
        let page = self.page;
        self.step(format!("goto {path}"), page.goto(&url)).await
    }

    /// Click once visible
    pub async fn click(&mut self, locator: &Locator) -> FlakeResult<WaitResult> {
        let (page, options) = (self.page, self.config.wait_options());
        self.step(
            format!("click {locator}"),
            click_when_visible(page, locator, &options),
        )
        .await
    }

    /// Type into a field once visible
    pub async fn fill(&mut self, locator: &Locator, text: &str) -> FlakeResult<WaitResult> {
        let (page, options) = (self.page, self.config.wait_options());
        self.step(
            format!("fill {locator}"),
            fill_when_visible(page, locator, text, &options),
        )
        .await
    }

    /// Wait until a locator is in `state`
    pub async fn wait_for(
        &mut self,
        locator: &Locator,
        state: ElementState,
    ) -> FlakeResult<WaitResult> {
        let (page, options) = (self.page, self.config.wait_options());
        self.step(
            format!("wait for {locator} {state}"),
            wait_for_state(page, locator, state, &options),
        )
        .await
    }

    /// Wait until a locator is visible
    pub async fn wait_visible(&mut self, locator: &Locator) -> FlakeResult<WaitResult> {
        self.wait_for(locator, ElementState::Visible).await
    }

    /// Wait until a locator is hidden or gone
    pub async fn wait_hidden(&mut self, locator: &Locator) -> FlakeResult<WaitResult> {
        self.wait_for(locator, ElementState::Hidden).await
    }

    /// Wait until a locator has appeared and then disappeared
    pub async fn wait_disappearance(&mut self, locator: &Locator) -> FlakeResult<WaitResult> {
        let (page, options) = (self.page, self.config.wait_options());
        self.step(
            format!("wait for {locator} to disappear"),
            wait_for_disappearance(page, locator, &options),
        )
        .await
    }

    /// Wait for animations running on a locator to finish
    pub async fn wait_animations(&mut self, locator: &Locator) -> FlakeResult<AnimationReport> {
        let (page, options) = (self.page, self.config.wait_options());
        self.step(
            format!("wait for animations on {locator}"),
            wait_for_animations_to_finish(page, locator, &options),
        )
        .await
    }

    /// Wait for the document to reach a load state
    pub async fn wait_load_state(&mut self, state: LoadState) -> FlakeResult<WaitResult> {
        let (page, options) = (self.page, self.config.wait_options());
        self.step(
            format!("wait for {state}"),
            wait_for_load_state(page, state, &options),
        )
        .await
    }

    /// Wait for `window[flag] === true`
    pub async fn wait_ready_flag(&mut self, flag: &str) -> FlakeResult<WaitResult> {
        let (page, options) = (self.page, self.config.wait_options());
        self.step(
            format!("wait for window.{flag}"),
            wait_for_ready_flag(page, flag, &options),
        )
        .await
    }

    /// Expect exact (normalised) text
    pub async fn expect_text(&mut self, locator: &Locator, text: &str) -> FlakeResult<()> {
        let (page, options) = (self.page, self.config.expect_options());
        let check = async move {
            expect(page, locator)
                .with_options(options)
                .to_have_text(text)
                .await
                .map(drop)
        };
        self.step(format!("expect {locator} to have text {text:?}"), check)
            .await
    }

    /// Expect text containing `text`
    pub async fn expect_contains(&mut self, locator: &Locator, text: &str) -> FlakeResult<()> {
        let (page, options) = (self.page, self.config.expect_options());
        let check = async move {
            expect(page, locator)
                .with_options(options)
                .to_contain_text(text)
                .await
                .map(drop)
        };
        self.step(format!("expect {locator} to contain text {text:?}"), check)
            .await
    }

    /// Expect a locator to be visible
    pub async fn expect_visible(&mut self, locator: &Locator) -> FlakeResult<()> {
        let (page, options) = (self.page, self.config.expect_options());
        let check = async move {
            expect(page, locator)
                .with_options(options)
                .to_be_visible()
                .await
                .map(drop)
        };
        self.step(format!("expect {locator} to be visible"), check)
            .await
    }

    /// Expect a locator not to be visible
    pub async fn expect_not_visible(&mut self, locator: &Locator) -> FlakeResult<()> {
        let (page, options) = (self.page, self.config.expect_options());
        let check = async move {
            expect(page, locator)
                .with_options(options)
                .not()
                .to_be_visible()
                .await
                .map(drop)
        };
        self.step(format!("expect {locator} not to be visible"), check)
            .await
    }
}

// =============================================================================
// SCENARIOS
// =============================================================================

/// The login-flow scenarios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScenarioId {
    /// `@c1` repeated login with success banner checks
    MultiLogin,
    /// `@c2` login on an animated form, logout through nested menus
    AnimatedLogin,
    /// `@c3` password reset request
    ForgotPassword,
    /// `@c4` login gated on `window.isAppReady`, logout through profile menu
    ReadyGatedLogin,
}

impl ScenarioId {
    /// Every scenario in declaration order
    pub const ALL: [Self; 4] = [
        Self::MultiLogin,
        Self::AnimatedLogin,
        Self::ForgotPassword,
        Self::ReadyGatedLogin,
    ];

    /// Scenario title
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::MultiLogin => "Login multiple times successfully",
            Self::AnimatedLogin => "Login animated form and logout successfully",
            Self::ForgotPassword => "Forgot password",
            Self::ReadyGatedLogin => "Login and logout",
        }
    }

    /// Scenario tag
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::MultiLogin => "@c1",
            Self::AnimatedLogin => "@c2",
            Self::ForgotPassword => "@c3",
            Self::ReadyGatedLogin => "@c4",
        }
    }

    /// Whether a `--grep` pattern selects this scenario: exact tag, or a
    /// case-insensitive substring of the title
    #[must_use]
    pub fn matches(&self, pattern: &str) -> bool {
        let pattern = pattern.trim();
        pattern.eq_ignore_ascii_case(self.tag())
            || self
                .name()
                .to_lowercase()
                .contains(&pattern.to_lowercase())
    }

    /// Scenarios selected by an optional pattern, in declaration order
    #[must_use]
    pub fn select(pattern: Option<&str>) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|id| pattern.map_or(true, |p| id.matches(p)))
            .collect()
    }

    /// Run this scenario's steps
    pub async fn run<D: PageDriver + ?Sized>(
        self,
        ctx: &mut ScenarioContext<'_, D>,
    ) -> FlakeResult<()> {
        match self {
            Self::MultiLogin => multi_login(ctx).await,
            Self::AnimatedLogin => animated_login(ctx).await,
            Self::ForgotPassword => forgot_password(ctx).await,
            Self::ReadyGatedLogin => ready_gated_login(ctx).await,
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.tag(), self.name())
    }
}

fn sign_in_button() -> Locator {
    Locator::role("button").with_name("Sign In")
}

fn forgot_password_button() -> Locator {
    Locator::role("button").with_name("Forgot Password?")
}

async fn validate_login_form<D: PageDriver + ?Sized>(
    ctx: &mut ScenarioContext<'_, D>,
) -> FlakeResult<()> {
    ctx.expect_visible(&Locator::role("heading").with_name("Login Form"))
        .await?;
    ctx.expect_visible(&Locator::label("Email")).await?;
    ctx.expect_visible(&Locator::label("Password")).await?;
    ctx.expect_visible(&sign_in_button()).await
}

async fn multi_login<D: PageDriver + ?Sized>(ctx: &mut ScenarioContext<'_, D>) -> FlakeResult<()> {
    let email = Locator::new(sel::EMAIL);
    let password = Locator::new(sel::PASSWORD);
    let banner = Locator::new(sel::SUCCESS_SHOWN);

    ctx.goto("/").await?;
    ctx.click(&Locator::new(sel::challenge_link(1))).await?;

    for i in 1..=ctx.config().login_iterations {
        ctx.begin_phase(format!("login {i}"));
        ctx.wait_visible(&Locator::new(sel::ANIMATED_FORM)).await?;
        ctx.wait_visible(&email).await?;
        validate_login_form(ctx).await?;

        ctx.fill(&email, &format!("test{i}@example.com")).await?;
        ctx.fill(&password, &format!("password{i}")).await?;
        ctx.click(&Locator::new(sel::SUBMIT_BUTTON)).await?;
        ctx.wait_disappearance(&Locator::new(sel::SUBMIT_LOADING))
            .await?;

        ctx.wait_visible(&banner).await?;
        ctx.expect_contains(&banner, "Successfully submitted!").await?;
        ctx.expect_text(
            &Locator::new(sel::EMAIL_DISPLAY),
            &format!("Email: test{i}@example.com"),
        )
        .await?;
        ctx.expect_text(
            &Locator::new(sel::PASSWORD_DISPLAY),
            &format!("Password: password{i}"),
        )
        .await?;
        ctx.wait_hidden(&banner).await?;
    }
    ctx.end_phase();
    Ok(())
}

async fn animated_login<D: PageDriver + ?Sized>(
    ctx: &mut ScenarioContext<'_, D>,
) -> FlakeResult<()> {
    let email = Locator::new(sel::EMAIL);
    let password = Locator::new(sel::PASSWORD);

    ctx.goto("/").await?;
    ctx.click(&Locator::new(sel::challenge_link(2))).await?;
    ctx.wait_load_state(LoadState::DomContentLoaded).await?;

    ctx.fill(&email, "test1@example.com").await?;
    ctx.fill(&password, "password1").await?;
    ctx.wait_animations(&Locator::new(sel::SUBMIT_BUTTON))
        .await?;
    ctx.click(&sign_in_button()).await?;

    ctx.expect_text(&Locator::new(sel::WELCOME_MESSAGE), "Welcome!")
        .await?;
    ctx.expect_contains(&Locator::new(sel::USER_EMAIL), "test1@example.com")
        .await?;

    ctx.wait_visible(&Locator::new(sel::INITIALIZED)).await?;
    ctx.click(&Locator::new(sel::MENU_BUTTON)).await?;
    ctx.wait_visible(&Locator::new(sel::DROPDOWN_SHOWN)).await?;
    ctx.click(&Locator::new(sel::ACCOUNT_MENU)).await?;
    ctx.click(&Locator::new(sel::LOGOUT_OPTION)).await?;

    ctx.expect_visible(&email).await?;
    ctx.expect_visible(&password).await
}

async fn forgot_password<D: PageDriver + ?Sized>(
    ctx: &mut ScenarioContext<'_, D>,
) -> FlakeResult<()> {
    let email = Locator::new(sel::EMAIL);
    let forgot = forgot_password_button();

    ctx.goto("/").await?;
    ctx.wait_visible(&Locator::role("heading").with_name("Form Animation Challenges"))
        .await?;
    ctx.click(&Locator::new(sel::challenge_link(3))).await?;
    ctx.wait_visible(&email).await?;

    ctx.expect_visible(&forgot).await?;
    ctx.click(&forgot).await?;
    ctx.wait_visible(&Locator::role("heading").with_name("Reset Password"))
        .await?;

    ctx.fill(&email, "test@example.com").await?;
    ctx.click(&Locator::role("button").with_name("Reset Password"))
        .await?;
    ctx.expect_not_visible(&Locator::role("button").with_name("Reset Password?"))
        .await?;

    ctx.wait_visible(&Locator::new(sel::SUCCESS_MESSAGE)).await?;
    ctx.wait_visible(&Locator::new(sel::SUBMIT_BTN)).await?;
    ctx.expect_visible(&Locator::role("heading").with_name("Success!"))
        .await?;
    ctx.expect_contains(&Locator::new(sel::MAIN_CONTENT), "Password reset link sent!")
        .await?;
    ctx.expect_not_visible(&forgot).await
}

async fn ready_gated_login<D: PageDriver + ?Sized>(
    ctx: &mut ScenarioContext<'_, D>,
) -> FlakeResult<()> {
    let email = Locator::new(sel::EMAIL);
    let password = Locator::new(sel::PASSWORD);

    ctx.goto("/").await?;
    ctx.click(&Locator::new(sel::challenge_link(4))).await?;
    ctx.wait_ready_flag(sel::APP_READY_FLAG).await?;

    ctx.fill(&email, "test@example.com").await?;
    ctx.fill(&password, "password").await?;
    ctx.click(&Locator::new(sel::SUBMIT_BUTTON)).await?;

    ctx.click(&Locator::new(sel::PROFILE_BUTTON)).await?;
    ctx.click(&Locator::text("Logout")).await?;

    ctx.expect_visible(&email).await?;
    ctx.expect_visible(&password).await
}
