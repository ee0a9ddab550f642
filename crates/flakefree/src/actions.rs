//! Interaction helpers.
//!
//! Each helper pairs one wait with one action. The action is dispatched only after
//! the wait has observed its predicate; if the wait fails the action is never
//! attempted and the wait error is returned as is.

use crate::driver::PageDriver;
use crate::locator::Locator;
use crate::result::FlakeResult;
use crate::state::ElementState;
use crate::wait::{wait_for_state, WaitOptions, WaitResult};
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// How [`wait_for_disappearance_with`] treats an element that is hidden from the start
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disappearance {
    /// The element must be seen visible before it counts as gone
    #[default]
    RequireAppearance,
    /// An element hidden on the first probe is already gone
    AllowAlreadyHidden,
}

/// Wait until `locator` is visible, then type `text` into it key by key.
pub async fn fill_when_visible<D: PageDriver + ?Sized>(
    page: &D,
    locator: &Locator,
    text: &str,
    options: &WaitOptions,
) -> FlakeResult<WaitResult> {
    let waited = wait_for_state(page, locator, ElementState::Visible, options).await?;
    page.type_text(locator, text).await?;
    tracing::debug!(locator = %locator, chars = text.chars().count(), "filled");
    Ok(waited)
}

/// Wait until `locator` is visible, then click its centre.
pub async fn click_when_visible<D: PageDriver + ?Sized>(
    page: &D,
    locator: &Locator,
    options: &WaitOptions,
) -> FlakeResult<WaitResult> {
    let waited = wait_for_state(page, locator, ElementState::Visible, options).await?;
    page.click(locator).await?;
    tracing::debug!(locator = %locator, "clicked");
    Ok(waited)
}

/// Wait until `locator` has been visible and then become hidden.
pub async fn wait_for_disappearance<D: PageDriver + ?Sized>(
    page: &D,
    locator: &Locator,
    options: &WaitOptions,
) -> FlakeResult<WaitResult> {
    wait_for_disappearance_with(page, locator, Disappearance::default(), options).await
}

/// [`wait_for_disappearance`] with an explicit policy for elements that never showed.
///
/// Each phase gets the full timeout. The returned result spans both phases.
pub async fn wait_for_disappearance_with<D: PageDriver + ?Sized>(
    page: &D,
    locator: &Locator,
    policy: Disappearance,
    options: &WaitOptions,
) -> FlakeResult<WaitResult> {
    let start = Instant::now();
    let waited_for = format!("{locator} to disappear");

    let appeared = match policy {
        Disappearance::RequireAppearance => {
            wait_for_state(page, locator, ElementState::Visible, options).await?
        }
        Disappearance::AllowAlreadyHidden => {
            let already_hidden = match page.probe(locator).await {
                Ok(snapshot) => ElementState::Hidden.is_satisfied_by(&snapshot),
                Err(e) if e.is_transient() => false,
                Err(e) => return Err(e),
            };
            if already_hidden {
                tracing::debug!(locator = %locator, "already hidden");
                return Ok(WaitResult {
                    elapsed: start.elapsed(),
                    polls: 1,
                    waited_for,
                });
            }
            wait_for_state(page, locator, ElementState::Visible, options).await?
        }
    };
    let gone = wait_for_state(page, locator, ElementState::Hidden, options).await?;

    Ok(WaitResult {
        elapsed: start.elapsed(),
        polls: appeared.polls + gone.polls,
        waited_for,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::driver::{DriverCall, MockDriver};
    use crate::result::FlakeError;
    use crate::state::ElementSnapshot;

    fn fast() -> WaitOptions {
        WaitOptions::new().with_timeout(150).with_poll_interval(5)
    }

    mod fill_tests {
        use super::*;

        #[tokio::test]
        async fn test_fill_waits_then_types() {
            let page = MockDriver::new().with_element(
                "#email",
                [ElementSnapshot::absent(), ElementSnapshot::visible("")],
            );
            let result = fill_when_visible(&page, &Locator::new("#email"), "test1@example.com", &fast())
                .await
                .unwrap();
            assert_eq!(result.polls, 2);
            assert_eq!(
                page.typed(),
                vec![("#email".to_string(), "test1@example.com".to_string())]
            );
        }

        #[tokio::test]
        async fn test_fill_never_types_when_wait_fails() {
            let page = MockDriver::new().with_element("#email", [ElementSnapshot::hidden()]);
            let err = fill_when_visible(&page, &Locator::new("#email"), "x", &fast())
                .await
                .unwrap_err();
            assert!(matches!(err, FlakeError::Timeout { ref waited_for, .. }
                if waited_for == "#email to be visible"));
            assert!(page.typed().is_empty());
        }

        #[tokio::test]
        async fn test_fill_last_call_is_type() {
            let page = MockDriver::new().with_element("#password", [ElementSnapshot::visible("")]);
            fill_when_visible(&page, &Locator::new("#password"), "password1", &fast())
                .await
                .unwrap();
            let history = page.history();
            assert_eq!(history.first(), Some(&DriverCall::Probe("#password".to_string())));
            assert!(matches!(history.last(), Some(DriverCall::Type { .. })));
        }
    }

    mod click_tests {
        use super::*;

        #[tokio::test]
        async fn test_click_role_locator() {
            let sign_in = Locator::role("button").with_name("Sign In");
            let page = MockDriver::new()
                .with_element(sign_in.to_string(), [ElementSnapshot::visible("Sign In")]);
            click_when_visible(&page, &sign_in, &fast()).await.unwrap();
            assert_eq!(page.clicks(), vec![sign_in.to_string()]);
        }

        #[tokio::test]
        async fn test_click_never_dispatched_on_timeout() {
            let page = MockDriver::new();
            let err = click_when_visible(&page, &Locator::new("#submitButton"), &fast())
                .await
                .unwrap_err();
            assert!(err.is_timeout());
            assert!(page.clicks().is_empty());
        }
    }

    mod disappearance_tests {
        use super::*;

        #[tokio::test]
        async fn test_requires_appearance_before_hidden() {
            let page = MockDriver::new().with_element(
                ".submit-btn.loading",
                [
                    ElementSnapshot::absent(),
                    ElementSnapshot::hidden(),
                    ElementSnapshot::visible(""),
                    ElementSnapshot::visible(""),
                    ElementSnapshot::absent(),
                ],
            );
            let result = wait_for_disappearance(&page, &Locator::new(".submit-btn.loading"), &fast())
                .await
                .unwrap();
            assert_eq!(result.polls, 5);
            assert_eq!(result.waited_for, ".submit-btn.loading to disappear");
        }

        #[tokio::test]
        async fn test_never_shown_times_out_by_default() {
            let page = MockDriver::new();
            let err = wait_for_disappearance(&page, &Locator::new(".submit-btn.loading"), &fast())
                .await
                .unwrap_err();
            assert!(matches!(err, FlakeError::Timeout { ref waited_for, .. }
                if waited_for == ".submit-btn.loading to be visible"));
        }

        #[tokio::test]
        async fn test_allow_already_hidden_returns_at_once() {
            let page = MockDriver::new();
            let result = wait_for_disappearance_with(
                &page,
                &Locator::new(".submit-btn.loading"),
                Disappearance::AllowAlreadyHidden,
                &fast(),
            )
            .await
            .unwrap();
            assert_eq!(result.polls, 1);
            assert_eq!(page.probe_count(".submit-btn.loading"), 1);
        }

        #[tokio::test]
        async fn test_allow_already_hidden_with_slow_driver() {
            let page = MockDriver::new()
                .with_latency(std::time::Duration::from_millis(5))
                .with_element(".submit-btn.loading", [ElementSnapshot::hidden()]);
            let result = wait_for_disappearance_with(
                &page,
                &Locator::new(".submit-btn.loading"),
                Disappearance::AllowAlreadyHidden,
                &fast(),
            )
            .await
            .unwrap();
            assert_eq!(result.polls, 1);
            assert_eq!(page.probe_count(".submit-btn.loading"), 1);
        }

        #[tokio::test]
        async fn test_require_appearance_with_slow_driver() {
            let page = MockDriver::new()
                .with_latency(std::time::Duration::from_millis(5))
                .with_element(
                    ".submit-btn.loading",
                    [
                        ElementSnapshot::absent(),
                        ElementSnapshot::visible(""),
                        ElementSnapshot::absent(),
                    ],
                );
            let result = wait_for_disappearance(&page, &Locator::new(".submit-btn.loading"), &fast())
                .await
                .unwrap();
            assert_eq!(result.polls, 3);
        }

        #[tokio::test]
        async fn test_allow_already_hidden_propagates_driver_errors() {
            struct Broken;

            #[async_trait::async_trait]
            impl PageDriver for Broken {
                async fn goto(&self, _url: &str) -> FlakeResult<()> {
                    Ok(())
                }
                async fn evaluate(&self, _e: &str) -> FlakeResult<serde_json::Value> {
                    Err(FlakeError::driver("target crashed"))
                }
                async fn type_text(&self, _l: &Locator, _t: &str) -> FlakeResult<()> {
                    Ok(())
                }
                async fn click(&self, _l: &Locator) -> FlakeResult<()> {
                    Ok(())
                }
            }

            let err = wait_for_disappearance_with(
                &Broken,
                &Locator::new(".spinner"),
                Disappearance::AllowAlreadyHidden,
                &fast(),
            )
            .await
            .unwrap_err();
            assert!(err.to_string().contains("target crashed"));
        }

        #[tokio::test]
        async fn test_allow_already_hidden_still_waits_for_visible_element() {
            let page = MockDriver::new().with_element(
                ".spinner",
                [
                    ElementSnapshot::visible(""),
                    ElementSnapshot::visible(""),
                    ElementSnapshot::visible(""),
                    ElementSnapshot::hidden(),
                ],
            );
            let result = wait_for_disappearance_with(
                &page,
                &Locator::new(".spinner"),
                Disappearance::AllowAlreadyHidden,
                &fast(),
            )
            .await
            .unwrap();
            assert_eq!(page.probe_count(".spinner"), 4);
            assert_eq!(result.polls, 3);
        }

        #[tokio::test]
        async fn test_stuck_visible_times_out_on_hidden() {
            let page = MockDriver::new().with_element(".spinner", [ElementSnapshot::visible("")]);
            let err = wait_for_disappearance(&page, &Locator::new(".spinner"), &fast())
                .await
                .unwrap_err();
            assert!(matches!(err, FlakeError::Timeout { ref waited_for, .. }
                if waited_for == ".spinner to be hidden"));
        }
    }
}
