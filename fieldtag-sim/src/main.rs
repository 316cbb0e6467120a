use clap::{Parser, Subcommand};
use rayon::iter::{IntoParallelIterator, ParallelIterator};

use fieldtag_sim::catalog::{self, Scenario, Strategy};
use fieldtag_sim::metrics;
use fieldtag_sim::report::{self, FullReport, ScenarioReport};

#[derive(Parser)]
#[command(name = "fieldtag-sim", about = "Localization accuracy harness")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run scenarios and report localization accuracy.
    Run {
        /// Filter by category name.
        #[arg(long)]
        category: Option<String>,
        /// Filter by scenario name (substring match).
        #[arg(long)]
        scenario: Option<String>,
        /// Output format: terminal, json.
        #[arg(long, default_value = "terminal")]
        format: String,
    },
    /// List available scenarios.
    List {
        /// Filter by category.
        #[arg(long)]
        category: Option<String>,
    },
    /// Run all scenarios and exit with code 1 on any failure.
    Regression,
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::Run {
            category,
            scenario,
            format,
        } => cmd_run(category, scenario, &format),
        Command::List { category } => cmd_list(category),
        Command::Regression => cmd_regression(),
    }
}

fn select(category: Option<String>, scenario: Option<String>) -> Vec<Scenario> {
    let mut scenarios = match category.as_deref() {
        Some(name) => match catalog::Category::from_name(name) {
            Some(cat) => catalog::scenarios_for_category(cat),
            None => {
                eprintln!("unknown category: {name}");
                std::process::exit(2);
            }
        },
        None => catalog::all_scenarios(),
    };
    if let Some(pattern) = scenario {
        scenarios.retain(|s| s.name.contains(pattern.as_str()));
    }
    scenarios
}

fn run_scenario(scenario: &Scenario) -> ScenarioReport {
    let (locator, scene) = scenario.build();

    let positions = match scenario.strategy {
        Strategy::Ray => locator.locate_frame(&scene.frame),
        Strategy::Pose(tag_size) => locator.locate_frame_by_pose(&scene.frame, tag_size),
    };

    let result = metrics::evaluate(&scene.ground_truth, &positions);
    let strategy = match scenario.strategy {
        Strategy::Ray => "ray",
        Strategy::Pose(_) => "pose",
    };

    ScenarioReport::new(
        &scenario.name,
        scenario.category.name(),
        strategy,
        scenario.expect_located,
        scenario.max_rmse_mm,
        &result,
    )
}

fn run_all(scenarios: Vec<Scenario>) -> FullReport {
    let reports: Vec<ScenarioReport> = scenarios
        .into_par_iter()
        .map(|s| run_scenario(&s))
        .collect();
    FullReport::from_scenarios(reports)
}

fn cmd_run(category: Option<String>, scenario: Option<String>, format: &str) {
    let scenarios = select(category, scenario);
    if scenarios.is_empty() {
        eprintln!("no scenarios selected");
        std::process::exit(2);
    }

    let report = run_all(scenarios);

    match format {
        "json" => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("failed to serialize report: {e}");
                std::process::exit(2);
            }
        },
        _ => report::print_terminal(&report),
    }
}

fn cmd_list(category: Option<String>) {
    for scenario in select(category, None) {
        println!(
            "{:<28} [{}] {}",
            scenario.name,
            scenario.category.name(),
            scenario.description
        );
    }
}

fn cmd_regression() {
    let report = run_all(catalog::all_scenarios());
    report::print_terminal(&report);
    if !report.all_passed() {
        std::process::exit(1);
    }
}
