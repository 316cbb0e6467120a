/// Report generation: terminal and JSON output for scenario runs.
use crate::metrics::EvalResult;

/// Summary of a single scenario run.
#[derive(Debug, serde::Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub category: String,
    pub strategy: String,
    pub passed: bool,
    pub located: usize,
    pub expected: usize,
    pub localization_rate: f64,
    pub rmse_mm: f64,
    pub max_error_mm: f64,
    pub spurious: usize,
    pub threshold_mm: f64,
}

impl ScenarioReport {
    pub fn new(
        name: &str,
        category: &str,
        strategy: &str,
        expected: usize,
        threshold_mm: f64,
        result: &EvalResult,
    ) -> Self {
        let located = result.matches.iter().filter(|m| m.located.is_some()).count();
        let passed = located >= expected && result.rmse_mm <= threshold_mm;
        ScenarioReport {
            name: name.to_string(),
            category: category.to_string(),
            strategy: strategy.to_string(),
            passed,
            located,
            expected,
            localization_rate: result.localization_rate,
            rmse_mm: result.rmse_mm,
            max_error_mm: result.max_error_mm,
            spurious: result.spurious,
            threshold_mm,
        }
    }
}

/// Full report across all scenarios.
#[derive(Debug, serde::Serialize)]
pub struct FullReport {
    pub scenarios: Vec<ScenarioReport>,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

impl FullReport {
    pub fn from_scenarios(scenarios: Vec<ScenarioReport>) -> Self {
        let total = scenarios.len();
        let passed = scenarios.iter().filter(|s| s.passed).count();
        FullReport {
            scenarios,
            total,
            passed,
            failed: total - passed,
        }
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Print a terminal table summarizing results.
pub fn print_terminal(report: &FullReport) {
    println!(
        "{:<28} {:>8} {:>7} {:>10} {:>10} {:>6}",
        "Scenario", "Strategy", "Loc", "RMSE(mm)", "Max(mm)", "Status"
    );
    println!("{}", "-".repeat(75));

    for s in &report.scenarios {
        let status = if s.passed { "PASS" } else { "FAIL" };
        println!(
            "{:<28} {:>8} {:>4}/{:<2} {:>10.2} {:>10.2} {:>6}",
            truncate(&s.name, 28),
            s.strategy,
            s.located,
            s.expected,
            s.rmse_mm,
            s.max_error_mm,
            status,
        );
    }

    println!("{}", "-".repeat(75));
    println!(
        "{} scenarios, {} passed, {} failed",
        report.total, report.passed, report.failed
    );
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}…", &s[..max - 1])
    }
}
