//! Page driver seam.
//!
//! Everything above this module talks to the browser through [`PageDriver`]. The
//! Chrome DevTools implementation lives in [`crate::browser`] behind the `browser`
//! feature; [`MockDriver`] replays scripted page states for unit tests.
//!
//! ```text
//! scenario ──► actions / animation ──► wait ──► PageDriver
//!                                                 ├── ChromiumPage (CDP)
//!                                                 └── MockDriver (scripted)
//! ```

use crate::locator::Locator;
use crate::result::{FlakeError, FlakeResult};
use crate::state::ElementSnapshot;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// Abstract page automation used by every wait, action and assertion.
///
/// Locators are passed by reference and resolved inside the page on each call.
#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate to an absolute URL
    async fn goto(&self, url: &str) -> FlakeResult<()>;

    /// Evaluate an expression in page context, awaiting it if it is a promise
    async fn evaluate(&self, expression: &str) -> FlakeResult<serde_json::Value>;

    /// Observe the live state of a locator
    async fn probe(&self, locator: &Locator) -> FlakeResult<ElementSnapshot> {
        let value = self
            .evaluate(&locator.selector().to_probe_script())
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Focus the located element and type `text` one key event per character
    async fn type_text(&self, locator: &Locator, text: &str) -> FlakeResult<()>;

    /// Click the centre of the located element
    async fn click(&self, locator: &Locator) -> FlakeResult<()>;

    /// Discard the page and its browser context
    async fn close(&self) -> FlakeResult<()> {
        Ok(())
    }
}

/// Source of isolated pages, one per scenario
#[async_trait]
pub trait PageFactory: Send + Sync {
    /// Page type produced by this factory
    type Page: PageDriver + 'static;

    /// Open a fresh page in its own browser context
    async fn new_page(&self) -> FlakeResult<Self::Page>;
}

/// Recorded driver call, for verification in tests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// `goto(url)`
    Goto(String),
    /// `evaluate(expression)`
    Evaluate(String),
    /// `probe(locator)`
    Probe(String),
    /// `type_text(locator, text)`
    Type {
        /// Locator description
        locator: String,
        /// Typed text
        text: String,
    },
    /// `click(locator)`
    Click(String),
    /// `close()`
    Close,
}

/// One scripted probe outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockProbe {
    /// The page reports this snapshot
    Snapshot(ElementSnapshot),
    /// The execution context is replaced mid-probe
    ContextLost,
}

#[derive(Debug, Default)]
struct MockState {
    url: String,
    elements: Vec<(String, VecDeque<MockProbe>)>,
    expressions: Vec<(String, VecDeque<serde_json::Value>)>,
    history: Vec<DriverCall>,
}

/// Mock driver replaying scripted page states.
///
/// Each locator (keyed by its display string) and each expression (matched by
/// substring) owns a queue. A probe pops the front of the queue; the last entry
/// stays and answers every later probe. Unscripted locators are absent and
/// unscripted expressions evaluate to `null`. With [`MockDriver::with_latency`],
/// probes and evaluations suspend before answering, like a protocol round trip.
#[derive(Debug, Default)]
pub struct MockDriver {
    state: Mutex<MockState>,
    latency: Duration,
}

impl MockDriver {
    /// Create new mock driver
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Delay every probe and evaluation by `latency`
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Script successive snapshots for a locator
    #[must_use]
    pub fn with_element(
        self,
        locator: impl Into<String>,
        snapshots: impl IntoIterator<Item = ElementSnapshot>,
    ) -> Self {
        self.with_probes(locator, snapshots.into_iter().map(MockProbe::Snapshot))
    }

    /// Script successive probe outcomes for a locator
    #[must_use]
    pub fn with_probes(
        self,
        locator: impl Into<String>,
        probes: impl IntoIterator<Item = MockProbe>,
    ) -> Self {
        let key = locator.into();
        {
            let mut state = self.lock();
            let queue: VecDeque<MockProbe> = probes.into_iter().collect();
            if let Some(entry) = state.elements.iter_mut().find(|(k, _)| *k == key) {
                entry.1.extend(queue);
            } else {
                state.elements.push((key, queue));
            }
        }
        self
    }

    /// Script successive results for any expression containing `needle`
    #[must_use]
    pub fn with_expression(
        self,
        needle: impl Into<String>,
        values: impl IntoIterator<Item = serde_json::Value>,
    ) -> Self {
        self.lock()
            .expressions
            .push((needle.into(), values.into_iter().collect()));
        self
    }

    /// Get call history
    #[must_use]
    pub fn history(&self) -> Vec<DriverCall> {
        self.lock().history.clone()
    }

    /// Current URL
    #[must_use]
    pub fn current_url(&self) -> String {
        self.lock().url.clone()
    }

    /// Number of probes made against a locator
    #[must_use]
    pub fn probe_count(&self, locator: &str) -> usize {
        self.lock()
            .history
            .iter()
            .filter(|c| matches!(c, DriverCall::Probe(l) if l == locator))
            .count()
    }

    /// Locators clicked, in order
    #[must_use]
    pub fn clicks(&self) -> Vec<String> {
        self.lock()
            .history
            .iter()
            .filter_map(|c| match c {
                DriverCall::Click(l) => Some(l.clone()),
                _ => None,
            })
            .collect()
    }

    /// Text typed per locator, in order
    #[must_use]
    pub fn typed(&self) -> Vec<(String, String)> {
        self.lock()
            .history
            .iter()
            .filter_map(|c| match c {
                DriverCall::Type { locator, text } => Some((locator.clone(), text.clone())),
                _ => None,
            })
            .collect()
    }

    /// Actions (goto, type, click, close) in order, without probes and evaluations
    #[must_use]
    pub fn actions(&self) -> Vec<DriverCall> {
        self.lock()
            .history
            .iter()
            .filter(|c| !matches!(c, DriverCall::Probe(_) | DriverCall::Evaluate(_)))
            .cloned()
            .collect()
    }

    fn next_probe(state: &mut MockState, key: &str) -> MockProbe {
        state
            .elements
            .iter_mut()
            .find(|(k, _)| k == key)
            .and_then(|(_, queue)| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
            .unwrap_or(MockProbe::Snapshot(ElementSnapshot::absent()))
    }
}

#[async_trait]
impl PageDriver for MockDriver {
    async fn goto(&self, url: &str) -> FlakeResult<()> {
        let mut state = self.lock();
        state.history.push(DriverCall::Goto(url.to_string()));
        state.url = url.to_string();
        Ok(())
    }

    async fn evaluate(&self, expression: &str) -> FlakeResult<serde_json::Value> {
        self.round_trip().await;
        let mut state = self.lock();
        state
            .history
            .push(DriverCall::Evaluate(expression.to_string()));
        let value = state
            .expressions
            .iter_mut()
            .find(|(needle, _)| expression.contains(needle.as_str()))
            .and_then(|(_, queue)| {
                if queue.len() > 1 {
                    queue.pop_front()
                } else {
                    queue.front().cloned()
                }
            })
            .unwrap_or(serde_json::Value::Null);
        Ok(value)
    }

    async fn probe(&self, locator: &Locator) -> FlakeResult<ElementSnapshot> {
        self.round_trip().await;
        let key = locator.to_string();
        let mut state = self.lock();
        state.history.push(DriverCall::Probe(key.clone()));
        match Self::next_probe(&mut state, &key) {
            MockProbe::Snapshot(snapshot) => Ok(snapshot),
            MockProbe::ContextLost => Err(FlakeError::ContextLost {
                message: "Execution context was destroyed".to_string(),
            }),
        }
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> FlakeResult<()> {
        self.lock().history.push(DriverCall::Type {
            locator: locator.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn click(&self, locator: &Locator) -> FlakeResult<()> {
        self.lock()
            .history
            .push(DriverCall::Click(locator.to_string()));
        Ok(())
    }

    async fn close(&self) -> FlakeResult<()> {
        self.lock().history.push(DriverCall::Close);
        Ok(())
    }
}

/// Page factory building scripted [`MockDriver`] pages
pub struct MockPageFactory<F>
where
    F: Fn() -> MockDriver + Send + Sync,
{
    build: F,
}

impl<F> MockPageFactory<F>
where
    F: Fn() -> MockDriver + Send + Sync,
{
    /// Create a factory calling `build` once per page
    pub const fn new(build: F) -> Self {
        Self { build }
    }
}

impl<F> std::fmt::Debug for MockPageFactory<F>
where
    F: Fn() -> MockDriver + Send + Sync,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockPageFactory").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> PageFactory for MockPageFactory<F>
where
    F: Fn() -> MockDriver + Send + Sync,
{
    type Page = MockDriver;

    async fn new_page(&self) -> FlakeResult<MockDriver> {
        Ok((self.build)())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    mod mock_driver_tests {
        use super::*;

        #[test]
        fn test_mock_driver_creation() {
            let driver = MockDriver::new();
            assert!(driver.history().is_empty());
            assert!(driver.current_url().is_empty());
        }

        #[tokio::test]
        async fn test_unscripted_locator_is_absent() {
            let driver = MockDriver::new();
            let snap = driver.probe(&Locator::new("#missing")).await.unwrap();
            assert_eq!(snap, ElementSnapshot::absent());
            assert_eq!(driver.probe_count("#missing"), 1);
        }

        #[tokio::test]
        async fn test_last_snapshot_sticks() {
            let driver = MockDriver::new().with_element(
                "#email",
                [ElementSnapshot::hidden(), ElementSnapshot::visible("")],
            );
            let loc = Locator::new("#email");
            assert!(!driver.probe(&loc).await.unwrap().is_visible());
            assert!(driver.probe(&loc).await.unwrap().is_visible());
            assert!(driver.probe(&loc).await.unwrap().is_visible());
        }

        #[tokio::test]
        async fn test_context_lost_probe() {
            let driver = MockDriver::new().with_probes(
                "#email",
                [
                    MockProbe::ContextLost,
                    MockProbe::Snapshot(ElementSnapshot::visible("")),
                ],
            );
            let loc = Locator::new("#email");
            let err = driver.probe(&loc).await.unwrap_err();
            assert!(err.is_transient());
            assert!(driver.probe(&loc).await.unwrap().is_visible());
        }

        #[tokio::test]
        async fn test_expression_matched_by_substring() {
            let driver = MockDriver::new()
                .with_expression("window.isAppReady", [json!(false), json!(true)]);
            let first = driver.evaluate("window.isAppReady===true").await.unwrap();
            let second = driver.evaluate("window.isAppReady===true").await.unwrap();
            assert_eq!(first, json!(false));
            assert_eq!(second, json!(true));
            assert_eq!(driver.evaluate("1 + 1").await.unwrap(), json!(null));
        }

        #[tokio::test]
        async fn test_latency_delays_probe_and_evaluate() {
            let driver = MockDriver::new()
                .with_latency(Duration::from_millis(5))
                .with_element("#email", [ElementSnapshot::visible("")]);
            let start = std::time::Instant::now();
            assert!(driver.probe(&Locator::new("#email")).await.unwrap().is_visible());
            driver.evaluate("1 + 1").await.unwrap();
            assert!(start.elapsed() >= Duration::from_millis(10));
        }

        #[tokio::test]
        async fn test_history_tracking() {
            let driver = MockDriver::new();
            driver.goto("http://localhost:3000/").await.unwrap();
            driver
                .type_text(&Locator::new("#email"), "a@b.c")
                .await
                .unwrap();
            driver.click(&Locator::new("#submitButton")).await.unwrap();
            driver.close().await.unwrap();

            assert_eq!(driver.current_url(), "http://localhost:3000/");
            assert_eq!(
                driver.typed(),
                vec![("#email".to_string(), "a@b.c".to_string())]
            );
            assert_eq!(driver.clicks(), vec!["#submitButton".to_string()]);
            assert_eq!(driver.actions().last(), Some(&DriverCall::Close));
        }

        #[tokio::test]
        async fn test_default_probe_goes_through_evaluate() {
            struct EvalOnly;

            #[async_trait]
            impl PageDriver for EvalOnly {
                async fn goto(&self, _url: &str) -> FlakeResult<()> {
                    Ok(())
                }
                async fn evaluate(&self, expression: &str) -> FlakeResult<serde_json::Value> {
                    assert!(expression.contains("count: els.length"));
                    Ok(json!({"count": 1, "visible": true, "text": "Welcome!"}))
                }
                async fn type_text(&self, _l: &Locator, _t: &str) -> FlakeResult<()> {
                    Ok(())
                }
                async fn click(&self, _l: &Locator) -> FlakeResult<()> {
                    Ok(())
                }
            }

            let snap = EvalOnly
                .probe(&Locator::new(".welcome-message"))
                .await
                .unwrap();
            assert_eq!(snap, ElementSnapshot::visible("Welcome!"));
        }
    }

    mod factory_tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_factory_builds_independent_pages() {
            let factory = MockPageFactory::new(MockDriver::new);
            let a = factory.new_page().await.unwrap();
            let b = factory.new_page().await.unwrap();
            a.goto("http://a/").await.unwrap();
            assert_eq!(a.current_url(), "http://a/");
            assert!(b.current_url().is_empty());
        }
    }
}
