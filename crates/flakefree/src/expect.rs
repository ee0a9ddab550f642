//! Auto-retrying expectations on element text and visibility.
//!
//! ```ignore
//! expect(&page, &Locator::new("#userEmail"))
//!     .to_contain_text("test1@example.com")
//!     .await?;
//! expect(&page, &forgot_button).not().to_be_visible().await?;
//! ```
//!
//! Each matcher re-probes the page until it holds or the expect timeout
//! (default 5 s) runs out. Text is compared after whitespace normalisation.

use crate::driver::PageDriver;
use crate::locator::{normalize_whitespace, Locator};
use crate::result::{FlakeError, FlakeResult};
use crate::state::ElementSnapshot;
use crate::wait::{duration_ms, WaitOptions, DEFAULT_POLL_INTERVAL_MS};
use std::time::{Duration, Instant};

/// Default expect timeout (5 seconds)
pub const DEFAULT_EXPECT_TIMEOUT_MS: u64 = 5_000;

/// Default options for expectations
#[must_use]
pub const fn default_expect_options() -> WaitOptions {
    WaitOptions {
        timeout_ms: DEFAULT_EXPECT_TIMEOUT_MS,
        poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
    }
}

/// Start an expectation on `locator`
#[must_use]
pub fn expect<'a, D: PageDriver + ?Sized>(page: &'a D, locator: &Locator) -> Expect<'a, D> {
    Expect {
        page,
        locator: locator.clone(),
        negated: false,
        options: default_expect_options(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Matcher {
    HaveText(String),
    ContainText(String),
    Visible,
    Hidden,
}

impl Matcher {
    fn name(&self) -> &'static str {
        match self {
            Self::HaveText(_) => "to have text",
            Self::ContainText(_) => "to contain text",
            Self::Visible => "to be visible",
            Self::Hidden => "to be hidden",
        }
    }

    fn expected(&self) -> String {
        match self {
            Self::HaveText(text) | Self::ContainText(text) => normalize_whitespace(text),
            Self::Visible => "visible".to_string(),
            Self::Hidden => "hidden".to_string(),
        }
    }

    fn matches(&self, snapshot: &ElementSnapshot) -> bool {
        match self {
            Self::HaveText(text) => {
                snapshot.is_attached()
                    && normalize_whitespace(snapshot.text_or_empty()) == normalize_whitespace(text)
            }
            Self::ContainText(text) => {
                snapshot.is_attached()
                    && normalize_whitespace(snapshot.text_or_empty())
                        .contains(&normalize_whitespace(text))
            }
            Self::Visible => snapshot.is_visible(),
            Self::Hidden => !snapshot.is_visible(),
        }
    }

    fn actual(&self, snapshot: &ElementSnapshot) -> String {
        match self {
            Self::HaveText(_) | Self::ContainText(_) if snapshot.is_attached() => {
                normalize_whitespace(snapshot.text_or_empty())
            }
            _ if !snapshot.is_attached() => "<no element>".to_string(),
            _ if snapshot.is_visible() => "visible".to_string(),
            _ => "hidden".to_string(),
        }
    }
}

/// Pending expectation built by [`expect`]
#[derive(Debug)]
pub struct Expect<'a, D: PageDriver + ?Sized> {
    page: &'a D,
    locator: Locator,
    negated: bool,
    options: WaitOptions,
}

impl<D: PageDriver + ?Sized> Expect<'_, D> {
    /// Invert the next matcher
    #[must_use]
    pub const fn not(mut self) -> Self {
        self.negated = !self.negated;
        self
    }

    /// Override the retry window
    #[must_use]
    pub const fn with_timeout(mut self, timeout_ms: u64) -> Self {
        self.options.timeout_ms = timeout_ms;
        self
    }

    /// Override both retry window and poll interval
    #[must_use]
    pub const fn with_options(mut self, options: WaitOptions) -> Self {
        self.options = options;
        self
    }

    /// Element text equals `text` after whitespace normalisation
    pub async fn to_have_text(self, text: &str) -> FlakeResult<Duration> {
        self.run(Matcher::HaveText(text.to_string())).await
    }

    /// Element text contains `text` after whitespace normalisation
    pub async fn to_contain_text(self, text: &str) -> FlakeResult<Duration> {
        self.run(Matcher::ContainText(text.to_string())).await
    }

    /// Element is visible
    pub async fn to_be_visible(self) -> FlakeResult<Duration> {
        self.run(Matcher::Visible).await
    }

    /// Element is hidden or absent
    pub async fn to_be_hidden(self) -> FlakeResult<Duration> {
        self.run(Matcher::Hidden).await
    }

    fn description(&self, matcher: &Matcher) -> String {
        let not = if self.negated { "not " } else { "" };
        format!("{} {not}{}", self.locator, matcher.name())
    }

    /// One probe; records what was seen in `last_actual`
    async fn check(&self, matcher: &Matcher, last_actual: &mut String) -> FlakeResult<bool> {
        match self.page.probe(&self.locator).await {
            Ok(snapshot) => {
                if matcher.matches(&snapshot) != self.negated {
                    return Ok(true);
                }
                *last_actual = matcher.actual(&snapshot);
                Ok(false)
            }
            Err(e) if e.is_transient() => {
                tracing::debug!(error = %e, "transient probe failure, retrying expectation");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    async fn run(self, matcher: Matcher) -> FlakeResult<Duration> {
        let start = Instant::now();
        let options = self.options;
        let mut last_actual = "<not probed>".to_string();

        let outcome = if self.check(&matcher, &mut last_actual).await? {
            Ok(Ok(()))
        } else {
            let remaining = options.timeout().saturating_sub(start.elapsed());
            tokio::time::timeout(remaining, async {
                loop {
                    tokio::time::sleep(options.poll_interval()).await;
                    match self.check(&matcher, &mut last_actual).await {
                        Ok(true) => return Ok(()),
                        Ok(false) => {}
                        Err(e) => return Err(e),
                    }
                }
            })
            .await
        };

        let elapsed = start.elapsed();
        match outcome {
            Ok(Ok(())) => {
                tracing::debug!(
                    assertion = %self.description(&matcher),
                    elapsed_ms = duration_ms(elapsed),
                    "expectation met"
                );
                Ok(elapsed)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => Err(FlakeError::Assertion {
                assertion: self.description(&matcher),
                expected: matcher.expected(),
                actual: last_actual,
                elapsed_ms: duration_ms(elapsed),
            }),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::{MockDriver, MockProbe};

    fn quick<D: PageDriver + ?Sized>(e: Expect<'_, D>) -> Expect<'_, D> {
        e.with_options(WaitOptions::new().with_timeout(60).with_poll_interval(5))
    }

    mod text_tests {
        use super::*;

        #[tokio::test]
        async fn test_to_have_text_normalises_whitespace() {
            let page = MockDriver::new().with_element(
                "#emailDisplay",
                [ElementSnapshot::visible("\n   Email:   test1@example.com\n ")],
            );
            quick(expect(&page, &Locator::new("#emailDisplay")))
                .to_have_text("Email: test1@example.com")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_to_have_text_retries_until_match() {
            let page = MockDriver::new().with_element(
                ".welcome-message",
                [
                    ElementSnapshot::absent(),
                    ElementSnapshot::visible(""),
                    ElementSnapshot::visible("Welcome!"),
                ],
            );
            quick(expect(&page, &Locator::new(".welcome-message")))
                .to_have_text("Welcome!")
                .await
                .unwrap();
            assert_eq!(page.probe_count(".welcome-message"), 3);
        }

        #[tokio::test]
        async fn test_to_have_text_is_exact() {
            let page = MockDriver::new()
                .with_element("#emailDisplay", [ElementSnapshot::visible("Email: test11@example.com")]);
            let err = quick(expect(&page, &Locator::new("#emailDisplay")))
                .to_have_text("Email: test1@example.com")
                .await
                .unwrap_err();
            match err {
                FlakeError::Assertion {
                    assertion,
                    expected,
                    actual,
                    ..
                } => {
                    assert_eq!(assertion, "#emailDisplay to have text");
                    assert_eq!(expected, "Email: test1@example.com");
                    assert_eq!(actual, "Email: test11@example.com");
                }
                other => panic!("expected assertion failure, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_to_contain_text() {
            let page = MockDriver::new().with_element(
                "#mainContent",
                [ElementSnapshot::visible("Success! Password reset link sent! Check your inbox.")],
            );
            quick(expect(&page, &Locator::new("#mainContent")))
                .to_contain_text("Password reset link sent!")
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_text_on_missing_element_reports_no_element() {
            let page = MockDriver::new();
            let err = quick(expect(&page, &Locator::new("#userEmail")))
                .to_contain_text("test1@example.com")
                .await
                .unwrap_err();
            assert!(matches!(err, FlakeError::Assertion { ref actual, .. } if actual == "<no element>"));
        }
    }

    mod visibility_tests {
        use super::*;

        #[tokio::test]
        async fn test_to_be_visible() {
            let page = MockDriver::new().with_element("#email", [ElementSnapshot::visible("")]);
            quick(expect(&page, &Locator::new("#email")))
                .to_be_visible()
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_not_visible_passes_for_absent() {
            let forgot = Locator::role("button").with_name("Forgot Password?");
            let page = MockDriver::new();
            quick(expect(&page, &forgot)).not().to_be_visible().await.unwrap();
        }

        #[tokio::test]
        async fn test_not_visible_fails_when_stuck_visible() {
            let page = MockDriver::new().with_element("#email", [ElementSnapshot::visible("")]);
            let err = quick(expect(&page, &Locator::new("#email")))
                .not()
                .to_be_visible()
                .await
                .unwrap_err();
            match err {
                FlakeError::Assertion {
                    assertion, actual, ..
                } => {
                    assert_eq!(assertion, "#email not to be visible");
                    assert_eq!(actual, "visible");
                }
                other => panic!("expected assertion failure, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_to_be_hidden() {
            let page = MockDriver::new().with_element(
                ".success-message.show",
                [ElementSnapshot::visible("ok"), ElementSnapshot::hidden()],
            );
            quick(expect(&page, &Locator::new(".success-message.show")))
                .to_be_hidden()
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_double_not_cancels() {
            let page = MockDriver::new().with_element("#email", [ElementSnapshot::visible("")]);
            quick(expect(&page, &Locator::new("#email")))
                .not()
                .not()
                .to_be_visible()
                .await
                .unwrap();
        }

        #[tokio::test]
        async fn test_context_loss_is_retried() {
            let page = MockDriver::new().with_probes(
                "#password",
                [
                    MockProbe::ContextLost,
                    MockProbe::Snapshot(ElementSnapshot::visible("")),
                ],
            );
            quick(expect(&page, &Locator::new("#password")))
                .to_be_visible()
                .await
                .unwrap();
        }
    }

    mod slow_driver_tests {
        use super::*;
        use std::time::Duration;

        fn slow() -> MockDriver {
            MockDriver::new().with_latency(Duration::from_millis(5))
        }

        #[tokio::test]
        async fn test_zero_timeout_completes_one_probe() {
            let page = slow().with_element("#email", [ElementSnapshot::visible("")]);
            expect(&page, &Locator::new("#email"))
                .with_timeout(0)
                .to_be_visible()
                .await
                .unwrap();
            assert_eq!(page.probe_count("#email"), 1);
        }

        #[tokio::test]
        async fn test_zero_timeout_reports_what_was_seen() {
            let page = slow().with_element("#email", [ElementSnapshot::hidden()]);
            let err = expect(&page, &Locator::new("#email"))
                .with_timeout(0)
                .to_be_visible()
                .await
                .unwrap_err();
            match err {
                FlakeError::Assertion { actual, .. } => assert_eq!(actual, "hidden"),
                other => panic!("expected assertion, got {other:?}"),
            }
        }

        #[tokio::test]
        async fn test_retries_across_slow_probes() {
            let page = slow().with_element(
                "#userEmail",
                [
                    ElementSnapshot::absent(),
                    ElementSnapshot::visible("Logged in as test1@example.com"),
                ],
            );
            quick(expect(&page, &Locator::new("#userEmail")))
                .to_contain_text("test1@example.com")
                .await
                .unwrap();
            assert_eq!(page.probe_count("#userEmail"), 2);
        }
    }

    #[test]
    fn test_default_expect_timeout() {
        assert_eq!(default_expect_options().timeout_ms, 5_000);
    }
}
