//! Adoption-rate sensitivity sweeps.

use crate::{ScenarioCalculator, ScenarioResult};
use plan_core::{ScenarioInput, Volume};
use rust_decimal::Decimal;

/// Label of a sweep point: whole percent, truncated ("15%").
pub fn rate_label(rate: Decimal) -> String {
    format!("{}%", (rate * Decimal::from(100)).trunc().normalize())
}

/// Recompute `base` once per adoption rate of `line`, keeping every other
/// line's volume fixed. Each result is named after its rate.
pub fn sensitivity_sweep(
    calculator: &ScenarioCalculator<'_>,
    base: &ScenarioInput,
    line: &str,
    rates: &[Decimal],
) -> Vec<ScenarioResult> {
    rates
        .iter()
        .map(|&rate| {
            let mut input = base.clone();
            input.name = rate_label(rate);
            input.volumes.insert(line.to_string(), Volume::Adoption(rate));
            calculator.compute_scenario(&input)
        })
        .collect()
}
