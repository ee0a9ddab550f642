//! Suite runner: scenario selection, browser lifecycle, result rendering

use crate::commands::{ListArgs, RunArgs};
use crate::config::{suite_config, CliConfig};
use crate::error::{CliError, CliResult};
use crate::output::{OutputFormat, Reporter};
use flakefree::{ScenarioId, SuiteConfig, SuiteReport};

/// Drives the `run` and `list` commands
#[derive(Debug)]
pub struct SuiteRunner {
    reporter: Reporter,
}

impl SuiteRunner {
    /// Create a runner printing through a reporter built from `config`
    #[must_use]
    pub fn new(config: &CliConfig) -> Self {
        Self {
            reporter: Reporter::new(config.color.should_color(), config.verbosity.is_quiet()),
        }
    }

    /// Scenarios selected by `--grep`; an empty selection is an error
    pub fn select(grep: Option<&str>) -> CliResult<Vec<ScenarioId>> {
        let selected = ScenarioId::select(grep);
        if selected.is_empty() {
            return Err(CliError::invalid_argument(format!(
                "no scenario matches {:?}",
                grep.unwrap_or_default()
            )));
        }
        Ok(selected)
    }

    /// Print the selected scenarios with their tags
    pub fn list(&self, args: &ListArgs) -> CliResult<()> {
        let selected = Self::select(args.grep.as_deref())?;
        self.reporter.list(&selected);
        Ok(())
    }

    /// Run the selected scenarios and render the report.
    ///
    /// Fails when any scenario failed, so the process exits non-zero.
    pub fn run(&self, args: &RunArgs) -> CliResult<()> {
        let suite = suite_config(args)?;
        let selected = Self::select(args.grep.as_deref())?;
        let format = OutputFormat::from_json_flag(args.json);

        if format == OutputFormat::Text {
            self.reporter
                .header(&format!("Running {} scenarios against {}", selected.len(), suite.base_url));
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;
        let report = runtime.block_on(execute(&suite, &selected))?;
        self.finish(&report, format)
    }

    /// Render `report` and turn failures into an error
    pub fn finish(&self, report: &SuiteReport, format: OutputFormat) -> CliResult<()> {
        match format {
            OutputFormat::Json => self.reporter.raw(&report.to_json()?),
            OutputFormat::Text => self.reporter.report(report),
        }

        if report.all_passed() {
            Ok(())
        } else {
            Err(CliError::test_execution(format!(
                "{} of {} scenarios failed",
                report.failed_count(),
                report.total()
            )))
        }
    }
}

#[cfg(feature = "browser")]
async fn execute(suite: &SuiteConfig, selected: &[ScenarioId]) -> CliResult<SuiteReport> {
    use flakefree::{Browser, BrowserConfig};

    let browser = Browser::launch(BrowserConfig::from(suite)).await?;
    let report = flakefree::run_suite(&browser, suite, selected).await;
    if let Err(e) = browser.close().await {
        tracing::warn!(error = %e, "failed to close browser");
    }
    Ok(report)
}

#[cfg(not(feature = "browser"))]
#[allow(clippy::unused_async)]
async fn execute(_suite: &SuiteConfig, _selected: &[ScenarioId]) -> CliResult<SuiteReport> {
    Err(CliError::config(
        "browser support not enabled. Rebuild with --features browser",
    ))
}
