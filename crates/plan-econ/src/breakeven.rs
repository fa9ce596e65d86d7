//! Breakeven volume, its split across product lines, and the cumulative
//! profit curve drawn around it.

use crate::{safe_ratio, ScenarioResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;
use tracing::warn;

/// Total unit volume at which cumulative profit reaches zero.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "status", content = "units", rename_all = "snake_case")]
pub enum Breakeven {
    /// Breakeven is reached after this many units.
    Units(Decimal),
    /// Contribution per unit is zero or negative, or so small that the volume
    /// needed exceeds the `Decimal` range.
    Unreachable,
}

impl Breakeven {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Breakeven::Units(_))
    }

    pub fn units(&self) -> Option<Decimal> {
        match self {
            Breakeven::Units(u) => Some(*u),
            Breakeven::Unreachable => None,
        }
    }

    /// Floating-point view: positive infinity when unreachable.
    pub fn to_f64(&self) -> f64 {
        match self {
            Breakeven::Units(u) => u.to_f64().unwrap_or(f64::INFINITY),
            Breakeven::Unreachable => f64::INFINITY,
        }
    }
}

impl fmt::Display for Breakeven {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Breakeven::Units(u) => write!(f, "{}", u.round_dp(0)),
            Breakeven::Unreachable => f.write_str("∞"),
        }
    }
}

/// Breakeven units = fixed costs ÷ contribution per unit, for positive
/// contribution only.
pub fn breakeven_units(contribution_per_unit: Decimal, fixed_costs: Decimal) -> Breakeven {
    if contribution_per_unit <= Decimal::ZERO {
        return Breakeven::Unreachable;
    }
    fixed_costs
        .checked_div(contribution_per_unit)
        .map_or(Breakeven::Unreachable, Breakeven::Units)
}

/// One sample of the cumulative profit curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ProfitPoint {
    pub units: Decimal,
    pub profit: Decimal,
}

/// Sample `profit(u) = u × contribution − fixed` at each unit count.
pub fn cumulative_profit_curve(
    contribution_per_unit: Decimal,
    fixed_costs: Decimal,
    units: &[Decimal],
) -> Vec<ProfitPoint> {
    units
        .iter()
        .map(|&u| ProfitPoint {
            units: u,
            profit: u
                .saturating_mul(contribution_per_unit)
                .saturating_sub(fixed_costs),
        })
        .collect()
}

/// `samples` evenly spaced values from `start` to `end`, both inclusive.
pub fn linspace(start: Decimal, end: Decimal, samples: usize) -> Vec<Decimal> {
    match samples {
        0 => Vec::new(),
        1 => vec![start],
        n => {
            let step = (end - start) / Decimal::from(n - 1);
            let mut out: Vec<Decimal> = (0..n - 1)
                .map(|i| start + step * Decimal::from(i))
                .collect();
            out.push(end);
            out
        }
    }
}

/// Unit counts for the breakeven chart: 0 up to the whole-unit part of
/// `breakeven × headroom`. Empty when breakeven is unreachable.
pub fn breakeven_chart_range(breakeven: Breakeven, headroom: Decimal, samples: usize) -> Vec<Decimal> {
    match breakeven {
        Breakeven::Units(u) => linspace(Decimal::ZERO, u.saturating_mul(headroom).trunc(), samples),
        Breakeven::Unreachable => Vec::new(),
    }
}

/// Share of a reachable breakeven volume attributed to one product line.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineBreakeven {
    pub key: String,
    pub label: String,
    /// Fraction of the scenario's units sold by this line.
    pub share: Decimal,
    pub units: Decimal,
}

/// Split breakeven units across lines using the scenario's unit mix.
/// `None` when breakeven is unreachable.
pub fn breakeven_mix(result: &ScenarioResult, breakeven: Breakeven) -> Option<Vec<LineBreakeven>> {
    let total = breakeven.units()?;
    Some(
        result
            .lines
            .iter()
            .map(|l| {
                let share = safe_ratio(l.units, result.total_units);
                LineBreakeven {
                    key: l.key.clone(),
                    label: l.label.clone(),
                    share,
                    units: total.saturating_mul(share),
                }
            })
            .collect(),
    )
}

/// Everything the breakeven view shows for one scenario.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BreakevenAnalysis {
    pub scenario: String,
    pub contribution_per_unit: Decimal,
    pub fixed_costs: Decimal,
    pub breakeven: Breakeven,
    /// Per-line split; `None` when breakeven is unreachable.
    pub mix: Option<Vec<LineBreakeven>>,
    /// Cumulative profit samples; empty when breakeven is unreachable.
    pub curve: Vec<ProfitPoint>,
}

/// Breakeven, mix and sampled curve for a computed scenario.
pub fn analyze_breakeven(result: &ScenarioResult, headroom: Decimal, samples: usize) -> BreakevenAnalysis {
    let contribution = result.contribution_per_unit;
    let breakeven = breakeven_units(contribution, result.fixed_costs);
    if !breakeven.is_reachable() {
        warn!(
            scenario = %result.name,
            contribution = %contribution,
            "breakeven unreachable: contribution per unit too small to cover fixed costs"
        );
    }
    let range = breakeven_chart_range(breakeven, headroom, samples);
    BreakevenAnalysis {
        scenario: result.name.clone(),
        contribution_per_unit: contribution,
        fixed_costs: result.fixed_costs,
        breakeven,
        mix: breakeven_mix(result, breakeven),
        curve: cumulative_profit_curve(contribution, result.fixed_costs, &range),
    }
}
