#![deny(warnings)]

//! Headless CLI for the business-plan scenario model.

mod export;
mod report;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use plan_core::{load_plan, PlanConfig};
use plan_econ::{analyze_breakeven, sensitivity_sweep, ScenarioCalculator};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("GIT_SHA"),
    ", built ",
    env!("BUILD_DATE"),
    ")"
);

#[derive(Parser)]
#[command(name = "plan-cli", version = VERSION)]
#[command(about = "Scenario P&L, breakeven and sensitivity for the business plan", long_about = None)]
struct Cli {
    /// Plan file (.yaml, .yml or .json); the built-in Dubai plan when omitted
    #[arg(long, global = true)]
    plan: Option<PathBuf>,

    /// Print the view as JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Market constants, prices and the Year-1 scenario snapshot
    Overview,
    /// Every plan input as a parameter/value table
    Assumptions,
    /// Pilot phase summary and Year-1 scenario P&L
    Pnl,
    /// Breakeven units and cumulative profit curve for one scenario
    Breakeven {
        /// Scenario name; the plan's breakeven scenario when omitted
        #[arg(short, long)]
        scenario: Option<String>,
    },
    /// Adoption-rate sweep
    Sensitivity,
    /// Export the Year-1 scenario table
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Output file
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Json,
    Csv,
}

fn load(path: Option<&PathBuf>) -> Result<PlanConfig> {
    match path {
        Some(p) => Ok(load_plan(p)?),
        None => {
            let plan = PlanConfig::default();
            plan.validate()?;
            info!("using built-in plan");
            Ok(plan)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[derive(Serialize)]
struct PnlView<'a> {
    pilot: &'a plan_econ::ScenarioResult,
    year_one: &'a [plan_econ::ScenarioResult],
}

fn main() -> Result<()> {
    // Logging setup
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let plan = load(cli.plan.as_ref())?;
    let calc = ScenarioCalculator::from_plan(&plan);
    let year_one = calc.compute_all(&plan.scenarios);
    info!(
        scenarios = year_one.len(),
        fixed_costs = %calc.fixed_costs(),
        "plan ready"
    );

    match cli.command {
        Command::Overview => {
            if cli.json {
                print_json(&year_one)?;
            } else {
                print!("{}", report::render_overview(&plan, &year_one));
            }
        }
        Command::Assumptions => {
            if cli.json {
                print_json(&plan)?;
            } else {
                print!("{}", report::render_assumptions(&plan));
            }
        }
        Command::Pnl => {
            let pilot = calc.compute_scenario(&plan.pilot);
            if cli.json {
                print_json(&PnlView {
                    pilot: &pilot,
                    year_one: &year_one,
                })?;
            } else {
                print!("{}", report::render_pnl(&plan, &pilot, &year_one));
            }
        }
        Command::Breakeven { scenario } => {
            let name = scenario.unwrap_or_else(|| plan.breakeven.scenario.clone());
            let input = plan
                .scenario(&name)
                .with_context(|| format!("unknown scenario: {name}"))?;
            let result = calc.compute_scenario(input);
            let analysis =
                analyze_breakeven(&result, plan.breakeven.headroom, plan.breakeven.samples);
            if cli.json {
                print_json(&analysis)?;
            } else {
                print!("{}", report::render_breakeven(&plan, &analysis));
            }
        }
        Command::Sensitivity => {
            let sens = &plan.sensitivity;
            let rows = sensitivity_sweep(&calc, &sens.base, &sens.line, &sens.rates);
            if cli.json {
                print_json(&rows)?;
            } else {
                print!("{}", report::render_sensitivity(&plan, &rows));
            }
        }
        Command::Export { format, out } => {
            match format {
                ExportFormat::Json => export::write_json(&plan, &year_one, &out)?,
                ExportFormat::Csv => export::write_csv(&plan, &year_one, &out)?,
            }
            info!(path = %out.display(), "exported scenarios");
        }
    }

    Ok(())
}
