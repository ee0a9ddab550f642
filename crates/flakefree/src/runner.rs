//! Suite runner.
//!
//! Scenarios run concurrently up to `workers`, each on its own page from a
//! [`PageFactory`]. A failing scenario never stops its siblings. The page is
//! closed whatever the outcome.

use crate::config::SuiteConfig;
use crate::driver::{PageDriver, PageFactory};
use crate::report::{ScenarioReport, StepRecord, SuiteReport};
use crate::result::FlakeError;
use crate::scenario::{ScenarioContext, ScenarioId};
use crate::wait::duration_ms;
use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::time::Instant;
use tracing::Instrument;

/// Run one scenario on a fresh page
pub async fn run_scenario<F: PageFactory + ?Sized>(
    factory: &F,
    id: ScenarioId,
    config: &SuiteConfig,
) -> ScenarioReport {
    let span = tracing::info_span!("scenario", tag = id.tag());
    async move {
        let start = Instant::now();
        tracing::info!(name = id.name(), "scenario started");

        let page = match factory.new_page().await {
            Ok(page) => page,
            Err(e) => {
                let elapsed_ms = duration_ms(start.elapsed());
                let err = FlakeError::StepFailed {
                    step: "open page".to_string(),
                    elapsed_ms,
                    source: Box::new(e),
                };
                tracing::warn!(error = %err, "scenario could not start");
                let steps = vec![StepRecord {
                    name: "open page".to_string(),
                    elapsed_ms,
                    passed: false,
                }];
                return ScenarioReport::failed(id.name(), id.tag(), steps, start.elapsed(), &err);
            }
        };

        let mut ctx = ScenarioContext::new(&page, config);
        let outcome = id.run(&mut ctx).await;
        let steps = ctx.into_steps();

        if let Err(e) = page.close().await {
            tracing::warn!(error = %e, "failed to close page");
        }

        let report = match outcome {
            Ok(()) => ScenarioReport::passed(id.name(), id.tag(), steps, start.elapsed()),
            Err(e) => ScenarioReport::failed(id.name(), id.tag(), steps, start.elapsed(), &e),
        };
        tracing::info!(
            status = ?report.status,
            duration_ms = report.duration_ms,
            "scenario finished"
        );
        report
    }
    .instrument(span)
    .await
}

/// Run `scenarios` with at most `config.workers` in flight.
///
/// The report lists scenarios in the order given, regardless of completion order.
pub async fn run_suite<F: PageFactory + ?Sized>(
    factory: &F,
    config: &SuiteConfig,
    scenarios: &[ScenarioId],
) -> SuiteReport {
    let mut report = SuiteReport::new(config.base_url.clone());
    let workers = config.workers.max(1);
    tracing::info!(
        run_id = %report.run_id,
        scenarios = scenarios.len(),
        workers,
        "suite started"
    );

    let mut results: Vec<(usize, ScenarioReport)> = stream::iter(scenarios.iter().enumerate())
        .map(|(index, id)| async move { (index, run_scenario(factory, *id, config).await) })
        .buffer_unordered(workers)
        .collect()
        .await;
    results.sort_by_key(|(index, _)| *index);

    report.scenarios = results.into_iter().map(|(_, r)| r).collect();
    report.finished_at = Utc::now();
    tracing::info!(
        passed = report.passed_count(),
        failed = report.failed_count(),
        "suite finished"
    );
    report
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::driver::MockDriver;
    use crate::locator::Locator;
    use crate::result::FlakeResult;
    use crate::state::ElementSnapshot;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Counters {
        opened: AtomicUsize,
        closed: AtomicUsize,
        live: AtomicUsize,
        peak: AtomicUsize,
    }

    #[derive(Debug)]
    struct CountedPage {
        inner: MockDriver,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl PageDriver for CountedPage {
        async fn goto(&self, url: &str) -> FlakeResult<()> {
            self.inner.goto(url).await
        }
        async fn evaluate(&self, expression: &str) -> FlakeResult<serde_json::Value> {
            self.inner.evaluate(expression).await
        }
        async fn probe(&self, locator: &Locator) -> FlakeResult<ElementSnapshot> {
            tokio::time::sleep(std::time::Duration::from_millis(1)).await;
            self.inner.probe(locator).await
        }
        async fn type_text(&self, locator: &Locator, text: &str) -> FlakeResult<()> {
            self.inner.type_text(locator, text).await
        }
        async fn click(&self, locator: &Locator) -> FlakeResult<()> {
            self.inner.click(locator).await
        }
        async fn close(&self) -> FlakeResult<()> {
            self.counters.closed.fetch_add(1, Ordering::SeqCst);
            self.counters.live.fetch_sub(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct CountingFactory {
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl PageFactory for CountingFactory {
        type Page = CountedPage;

        async fn new_page(&self) -> FlakeResult<CountedPage> {
            self.counters.opened.fetch_add(1, Ordering::SeqCst);
            let live = self.counters.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.counters.peak.fetch_max(live, Ordering::SeqCst);
            Ok(CountedPage {
                inner: MockDriver::new(),
                counters: Arc::clone(&self.counters),
            })
        }
    }

    #[derive(Debug)]
    struct BrokenFactory;

    #[async_trait]
    impl PageFactory for BrokenFactory {
        type Page = MockDriver;

        async fn new_page(&self) -> FlakeResult<MockDriver> {
            Err(FlakeError::BrowserLaunch {
                message: "chromium not found".to_string(),
            })
        }
    }

    fn fast_config(workers: usize) -> SuiteConfig {
        SuiteConfig::new()
            .with_workers(workers)
            .with_wait_timeout(30)
            .with_expect_timeout(20)
            .with_poll_interval(5)
    }

    #[tokio::test]
    async fn test_failures_are_isolated_and_pages_closed() {
        let factory = CountingFactory::default();
        let report = run_suite(&factory, &fast_config(2), &ScenarioId::ALL).await;

        assert_eq!(report.total(), 4);
        assert_eq!(report.failed_count(), 4);
        assert_eq!(factory.counters.opened.load(Ordering::SeqCst), 4);
        assert_eq!(factory.counters.closed.load(Ordering::SeqCst), 4);
        for scenario in &report.scenarios {
            assert!(scenario.failed_step.is_some());
        }
    }

    #[tokio::test]
    async fn test_report_keeps_declaration_order() {
        let factory = CountingFactory::default();
        let report = run_suite(&factory, &fast_config(4), &ScenarioId::ALL).await;
        let tags: Vec<_> = report.scenarios.iter().map(|s| s.tag.as_str()).collect();
        assert_eq!(tags, vec!["@c1", "@c2", "@c3", "@c4"]);
    }

    #[tokio::test]
    async fn test_workers_bound_concurrency() {
        let factory = CountingFactory::default();
        let _ = run_suite(&factory, &fast_config(1), &ScenarioId::ALL).await;
        assert_eq!(factory.counters.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_page_open_failure_is_reported() {
        let report = run_scenario(&BrokenFactory, ScenarioId::ForgotPassword, &fast_config(1)).await;
        assert!(!report.is_passed());
        assert_eq!(report.failed_step.as_deref(), Some("open page"));
        assert!(report.error.unwrap().contains("chromium not found"));
    }

    #[tokio::test]
    async fn test_empty_selection() {
        let report = run_suite(&BrokenFactory, &fast_config(1), &[]).await;
        assert_eq!(report.total(), 0);
        assert!(report.all_passed());
    }
}
