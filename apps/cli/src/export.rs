//! Scenario table export to JSON or CSV.

use anyhow::{Context, Result};
use chrono::{SecondsFormat, Utc};
use plan_core::PlanConfig;
use plan_econ::ScenarioResult;
use serde::Serialize;
use std::fs;
use std::path::Path;

#[derive(Serialize)]
struct ScenarioExport<'a> {
    generated_at: String,
    currency: &'a str,
    fixed_costs: rust_decimal::Decimal,
    scenarios: &'a [ScenarioResult],
}

/// Write scenarios as pretty JSON with a generation timestamp.
pub fn write_json(plan: &PlanConfig, scenarios: &[ScenarioResult], out: &Path) -> Result<()> {
    let doc = ScenarioExport {
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        currency: &plan.currency,
        fixed_costs: plan.fixed_costs_total(),
        scenarios,
    };
    let text = serde_json::to_string_pretty(&doc)?;
    fs::write(out, text).with_context(|| format!("writing {}", out.display()))?;
    Ok(())
}

/// Column headers of the CSV export; one units/revenue/COGS triple per line.
pub fn csv_headers(plan: &PlanConfig) -> Vec<String> {
    let mut headers = vec!["scenario".to_string(), "tier".to_string()];
    for l in &plan.lines {
        headers.push(format!("{}_units", l.key));
        headers.push(format!("{}_revenue", l.key));
        headers.push(format!("{}_cogs", l.key));
    }
    headers.extend(
        [
            "total_units",
            "total_revenue",
            "total_cogs",
            "gross_profit",
            "gross_margin_pct",
            "fixed_costs",
            "ebit",
            "ebit_margin_pct",
            "contribution_per_unit",
        ]
        .map(String::from),
    );
    headers
}

/// One CSV record per scenario, full precision.
pub fn csv_record(r: &ScenarioResult) -> Vec<String> {
    let mut rec = vec![r.name.clone(), r.tier.to_string()];
    for l in &r.lines {
        rec.push(l.units.normalize().to_string());
        rec.push(l.revenue.normalize().to_string());
        rec.push(l.cogs.normalize().to_string());
    }
    rec.extend(
        [
            r.total_units,
            r.total_revenue,
            r.total_cogs,
            r.gross_profit,
            r.gross_margin_pct,
            r.fixed_costs,
            r.ebit,
            r.ebit_margin_pct,
            r.contribution_per_unit,
        ]
        .map(|v| v.normalize().to_string()),
    );
    rec
}

/// Write scenarios as CSV.
pub fn write_csv(plan: &PlanConfig, scenarios: &[ScenarioResult], out: &Path) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(out).with_context(|| format!("creating {}", out.display()))?;
    wtr.write_record(csv_headers(plan))?;
    for r in scenarios {
        wtr.write_record(csv_record(r))?;
    }
    wtr.flush()?;
    Ok(())
}
