use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use hp_core::StepKind;
use hp_run::{run, InitSelection, RunConfig, RunMode, RunReport};
use hp_solver::PathSolver;
use hp_survey::ExceptionTable;

#[derive(Parser)]
#[command(name = "hp-cli")]
#[command(about = "HydroPlan CLI - Water allocation network planning tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate survey file syntax, tables, and wiring
    Validate {
        /// Path to the survey YAML/JSON file
        survey_path: PathBuf,
    },
    /// Run the allocation pipeline over a survey
    Run {
        /// Path to the survey YAML/JSON file
        survey_path: PathBuf,
        /// Path to the exception table YAML file
        #[arg(long)]
        exceptions: Option<PathBuf>,
        /// Timestep granularity
        #[arg(long, value_enum, default_value_t = StepArg::Monthly)]
        step: StepArg,
        /// Horizon start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
        /// Horizon end date (YYYY-MM-DD)
        #[arg(long)]
        end: NaiveDate,
        /// Label the run as an optimization run instead of a planning run
        #[arg(long)]
        optimization: bool,
        /// Junction name designated as the overflow sink
        #[arg(long)]
        overflow: Option<String>,
        /// Use sampled initialization with the given seed instead of survey rows
        #[arg(long)]
        sampled: Option<u64>,
        /// Log per-stage wall-clock timings
        #[arg(long)]
        timing: bool,
        /// Output JSON report path (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StepArg {
    Daily,
    Monthly,
}

impl From<StepArg> for StepKind {
    fn from(step: StepArg) -> Self {
        match step {
            StepArg::Daily => StepKind::Daily,
            StepArg::Monthly => StepKind::Monthly,
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Survey(#[from] hp_survey::SurveyError),

    #[error(transparent)]
    Run(#[from] hp_run::RunError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

type CliResult<T> = Result<T, CliError>;

fn main() -> CliResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { survey_path } => cmd_validate(&survey_path),
        Commands::Run {
            survey_path,
            exceptions,
            step,
            start,
            end,
            optimization,
            overflow,
            sampled,
            timing,
            output,
        } => {
            if timing {
                hp_core::timing::enable_timing();
            }
            let mut config = RunConfig::new(start, end, step.into());
            if optimization {
                config.mode = RunMode::Optimization;
            }
            config.overflow_label = overflow;
            if let Some(seed) = sampled {
                config.init = InitSelection::Sampled { seed };
            }
            cmd_run(&survey_path, exceptions.as_deref(), &config, output.as_deref())
        }
    }
}

fn load_survey(path: &Path) -> CliResult<hp_survey::Survey> {
    let survey = if path.extension().is_some_and(|e| e == "json") {
        hp_survey::load_json(path)?
    } else {
        hp_survey::load_yaml(path)?
    };
    Ok(survey)
}

fn cmd_validate(survey_path: &Path) -> CliResult<()> {
    println!("Validating survey: {}", survey_path.display());
    let survey = load_survey(survey_path)?;
    println!(
        "✓ Survey is valid ({} topology rows)",
        survey.topology.len()
    );
    Ok(())
}

fn cmd_run(
    survey_path: &Path,
    exceptions_path: Option<&Path>,
    config: &RunConfig,
    output: Option<&Path>,
) -> CliResult<()> {
    let survey = load_survey(survey_path)?;
    let exceptions = match exceptions_path {
        Some(path) => hp_survey::load_exceptions_yaml(path)?,
        None => ExceptionTable::default(),
    };

    let report = run(&survey, &exceptions, config, &PathSolver::new())?;
    print_summary(&report);

    let json = serde_json::to_string_pretty(&report)?;
    match output {
        Some(path) => {
            fs::write(path, json)?;
            println!("✓ Report written to {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    println!(
        "✓ Run completed: {} timesteps, {} demands",
        report.results.timestamps.len(),
        report.results.demands.len()
    );
    println!(
        "  Input total: {:.3}  Output total: {:.3}",
        report.results.totals.input_total, report.results.totals.output_total
    );
    for category in &report.results.totals.categories {
        println!(
            "  {}: planned {:.3}, actual {:.3}, deficit {:.1}%",
            category.category, category.planned, category.actual, category.deficit_pct
        );
    }
    if !report.manifest.misses.is_empty() {
        println!("  Unmatched physical rows: {}", report.manifest.misses.len());
    }
    if !report.manifest.exceptions.resolved.is_empty() {
        println!(
            "  Resolved isolations: {}",
            report.manifest.exceptions.resolved.len()
        );
    }
}
