//! Output formatting for scenario lists and suite reports

use console::{style, Style, Term};
use flakefree::{ScenarioId, ScenarioReport, SuiteReport};
use serde::{Deserialize, Serialize};

/// Output format for suite results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    /// Human-readable text
    #[default]
    Text,
    /// JSON report on stdout
    Json,
}

impl OutputFormat {
    /// Pick the format for a `--json` flag
    #[must_use]
    pub const fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Writes suite progress and results to stdout
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a new reporter
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        if self.quiet {
            return;
        }
        let styled = if self.use_color {
            style(title).bold().underlined().to_string()
        } else {
            format!("=== {title} ===")
        };
        let _ = self.term.write_line(&styled);
    }

    /// Print the scenario listing
    pub fn list(&self, scenarios: &[ScenarioId]) {
        let _ = self.term.write_str(&render_list(scenarios, self.use_color));
    }

    /// Print every scenario's outcome then the summary line.
    ///
    /// In quiet mode only failures and the summary are printed.
    pub fn report(&self, report: &SuiteReport) {
        let _ = self
            .term
            .write_str(&render_report(report, self.use_color, self.quiet));
    }

    /// Print raw text as-is
    pub fn raw(&self, text: &str) {
        let _ = self.term.write_line(text);
    }
}

/// Render `tag  title` lines for the given scenarios
#[must_use]
pub fn render_list(scenarios: &[ScenarioId], use_color: bool) -> String {
    let mut out = String::new();
    for id in scenarios {
        let tag = if use_color {
            style(id.tag()).cyan().bold().to_string()
        } else {
            id.tag().to_string()
        };
        out.push_str(&format!("{tag}  {}\n", id.name()));
    }
    out
}

fn render_scenario(scenario: &ScenarioReport, use_color: bool) -> String {
    let (mark, tag) = if use_color {
        let mark = if scenario.is_passed() {
            style("✓").green().bold()
        } else {
            style("✗").red().bold()
        };
        (mark.to_string(), style(&scenario.tag).cyan().to_string())
    } else {
        let mark = if scenario.is_passed() { "PASS" } else { "FAIL" };
        (mark.to_string(), scenario.tag.clone())
    };

    let mut out = format!(
        "{mark} {tag} {} ({}ms)\n",
        scenario.name, scenario.duration_ms
    );
    if let Some(ref step) = scenario.failed_step {
        out.push_str(&format!("    step: {step}\n"));
    }
    if let Some(ref error) = scenario.error {
        out.push_str(&format!("    error: {error}\n"));
    }
    out
}

/// Render a suite report as text
#[must_use]
pub fn render_report(report: &SuiteReport, use_color: bool, quiet: bool) -> String {
    let mut out = String::new();
    for scenario in &report.scenarios {
        if quiet && scenario.is_passed() {
            continue;
        }
        out.push_str(&render_scenario(scenario, use_color));
    }

    let status = if report.all_passed() { "PASSED" } else { "FAILED" };
    let summary = if use_color {
        let status_style = if report.all_passed() {
            Style::new().green().bold()
        } else {
            Style::new().red().bold()
        };
        format!("{} {report}", status_style.apply_to(status))
    } else {
        format!("{status} {report}")
    };
    out.push('\n');
    out.push_str(&summary);
    out.push('\n');
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use flakefree::{FlakeError, StepRecord};
    use std::time::Duration;

    fn sample_report() -> SuiteReport {
        let mut report = SuiteReport::new("http://localhost:3000");
        report.scenarios.push(ScenarioReport::passed(
            "Forgot password",
            "@c3",
            vec![],
            Duration::from_millis(120),
        ));
        let err = FlakeError::StepFailed {
            step: "wait for window.isAppReady".to_string(),
            elapsed_ms: 30,
            source: Box::new(FlakeError::Timeout {
                waited_for: "`window[\"isAppReady\"] === true` to be truthy".to_string(),
                timeout_ms: 30,
                elapsed_ms: 30,
            }),
        };
        report.scenarios.push(ScenarioReport::failed(
            "Login and logout",
            "@c4",
            vec![StepRecord {
                name: "wait for window.isAppReady".to_string(),
                elapsed_ms: 30,
                passed: false,
            }],
            Duration::from_millis(40),
            &err,
        ));
        report
    }

    mod output_format_tests {
        use super::*;

        #[test]
        fn test_default_format() {
            assert_eq!(OutputFormat::default(), OutputFormat::Text);
        }

        #[test]
        fn test_from_json_flag() {
            assert_eq!(OutputFormat::from_json_flag(true), OutputFormat::Json);
            assert_eq!(OutputFormat::from_json_flag(false), OutputFormat::Text);
        }
    }

    mod render_tests {
        use super::*;

        #[test]
        fn test_render_list_plain() {
            let out = render_list(&ScenarioId::ALL, false);
            assert_eq!(out.lines().count(), 4);
            assert!(out.starts_with("@c1  Login multiple times successfully\n"));
            assert!(out.contains("@c4  Login and logout"));
        }

        #[test]
        fn test_render_report_plain() {
            let out = render_report(&sample_report(), false, false);
            assert!(out.contains("PASS @c3 Forgot password (120ms)"));
            assert!(out.contains("FAIL @c4 Login and logout"));
            assert!(out.contains("    step: wait for window.isAppReady"));
            assert!(out.contains("isAppReady"));
            assert!(out.contains("FAILED 1 passed, 1 failed, 2 total"));
        }

        #[test]
        fn test_render_report_quiet_hides_passes() {
            let out = render_report(&sample_report(), false, true);
            assert!(!out.contains("@c3"));
            assert!(out.contains("@c4"));
        }

        #[test]
        fn test_render_empty_report_passes() {
            let out = render_report(&SuiteReport::new("http://localhost:3000"), false, false);
            assert!(out.contains("PASSED 0 passed, 0 failed, 0 total"));
        }
    }

    mod reporter_tests {
        use super::*;

        #[test]
        fn test_new_reporter() {
            let reporter = Reporter::new(false, true);
            assert!(!reporter.use_color);
            assert!(reporter.quiet);
        }

        #[test]
        fn test_default_reporter() {
            let reporter = Reporter::default();
            assert!(reporter.use_color);
            assert!(!reporter.quiet);
        }
    }
}
