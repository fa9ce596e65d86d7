#![deny(warnings)]

//! Scenario economics: profit-and-loss projection for a business plan.
//!
//! This crate provides:
//! - Scenario computation (units, revenue, COGS, gross profit, EBIT, margins)
//! - Breakeven volume and the sampled cumulative-profit curve
//! - Adoption-rate sensitivity sweeps
//!
//! Every operation is pure. Non-positive denominators never fail: margins and
//! contribution fall back to 0 and breakeven becomes [`Breakeven::Unreachable`].
//! Amounts outside the `Decimal` range saturate instead of panicking; plans
//! that would reach them are rejected by validation.

use plan_core::{MarketAssumptions, PlanConfig, PricingTier, ProductLine, ScenarioInput, Volume};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

pub mod breakeven;
pub mod sensitivity;

pub use breakeven::{
    analyze_breakeven, breakeven_chart_range, breakeven_mix, breakeven_units,
    cumulative_profit_curve, linspace, Breakeven, BreakevenAnalysis, LineBreakeven, ProfitPoint,
};
pub use sensitivity::{rate_label, sensitivity_sweep};

/// Outcome of one product line in a scenario.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LineResult {
    pub key: String,
    pub label: String,
    pub units: Decimal,
    pub price: Decimal,
    pub unit_cost: Decimal,
    pub revenue: Decimal,
    pub cogs: Decimal,
}

/// Financial summary of a scenario. Built fresh on every computation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScenarioResult {
    pub name: String,
    pub tier: PricingTier,
    /// Per-line outcomes, in plan order.
    pub lines: Vec<LineResult>,
    pub total_units: Decimal,
    pub total_revenue: Decimal,
    pub total_cogs: Decimal,
    pub gross_profit: Decimal,
    /// Gross profit as a percentage of revenue; 0 without revenue.
    pub gross_margin_pct: Decimal,
    pub fixed_costs: Decimal,
    pub ebit: Decimal,
    /// EBIT as a percentage of revenue; 0 without revenue.
    pub ebit_margin_pct: Decimal,
    /// Blended gross profit per unit; 0 without units.
    pub contribution_per_unit: Decimal,
}

impl ScenarioResult {
    /// Outcome of a product line by key.
    pub fn line(&self, key: &str) -> Option<&LineResult> {
        self.lines.iter().find(|l| l.key == key)
    }
}

/// Percentage of `numer` over `denom`, or 0 when `denom` is not positive.
pub fn safe_pct(numer: Decimal, denom: Decimal) -> Decimal {
    safe_ratio(numer, denom).saturating_mul(Decimal::ONE_HUNDRED)
}

/// `numer / denom`, or 0 when `denom` is not positive. Saturates at the
/// `Decimal` bounds.
pub fn safe_ratio(numer: Decimal, denom: Decimal) -> Decimal {
    if denom <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    numer.checked_div(denom).unwrap_or(if numer.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}

/// Evaluates scenarios against a fixed set of market constants, product
/// lines and total fixed costs.
#[derive(Clone, Copy, Debug)]
pub struct ScenarioCalculator<'a> {
    market: &'a MarketAssumptions,
    lines: &'a [ProductLine],
    fixed_costs: Decimal,
}

impl<'a> ScenarioCalculator<'a> {
    pub fn new(market: &'a MarketAssumptions, lines: &'a [ProductLine], fixed_costs: Decimal) -> Self {
        Self {
            market,
            lines,
            fixed_costs,
        }
    }

    /// Calculator over a whole plan, charging its total fixed costs.
    pub fn from_plan(plan: &'a PlanConfig) -> Self {
        Self::new(&plan.market, &plan.lines, plan.fixed_costs_total())
    }

    pub fn fixed_costs(&self) -> Decimal {
        self.fixed_costs
    }

    /// Units sold by a line. Missing volumes and adoption rates without an
    /// addressable market resolve to 0.
    pub fn resolve_units(&self, line: &ProductLine, volume: Option<&Volume>) -> Decimal {
        match volume {
            Some(Volume::Units(units)) => *units,
            Some(Volume::Adoption(rate)) => line
                .addressable_units(self.market)
                .map(|demand| rate.saturating_mul(demand))
                .unwrap_or(Decimal::ZERO),
            None => Decimal::ZERO,
        }
    }

    /// Compute the profit-and-loss summary of one scenario.
    pub fn compute_scenario(&self, input: &ScenarioInput) -> ScenarioResult {
        let mut lines = Vec::with_capacity(self.lines.len());
        let mut total_units = Decimal::ZERO;
        let mut total_revenue = Decimal::ZERO;
        let mut total_cogs = Decimal::ZERO;

        for line in self.lines {
            let units = self.resolve_units(line, input.volumes.get(&line.key));
            let econ = line.economics.at(input.tier);
            let revenue = units.saturating_mul(econ.price);
            let cogs = units.saturating_mul(econ.unit_cost);
            total_units = total_units.saturating_add(units);
            total_revenue = total_revenue.saturating_add(revenue);
            total_cogs = total_cogs.saturating_add(cogs);
            lines.push(LineResult {
                key: line.key.clone(),
                label: line.label.clone(),
                units,
                price: econ.price,
                unit_cost: econ.unit_cost,
                revenue,
                cogs,
            });
        }

        let gross_profit = total_revenue.saturating_sub(total_cogs);
        let ebit = gross_profit.saturating_sub(self.fixed_costs);
        let result = ScenarioResult {
            name: input.name.clone(),
            tier: input.tier,
            lines,
            total_units,
            total_revenue,
            total_cogs,
            gross_profit,
            gross_margin_pct: safe_pct(gross_profit, total_revenue),
            fixed_costs: self.fixed_costs,
            ebit,
            ebit_margin_pct: safe_pct(ebit, total_revenue),
            contribution_per_unit: safe_ratio(gross_profit, total_units),
        };
        debug!(
            scenario = %result.name,
            tier = %result.tier,
            revenue = %result.total_revenue,
            ebit = %result.ebit,
            "computed scenario"
        );
        result
    }

    /// Compute every scenario, preserving order.
    pub fn compute_all(&self, inputs: &[ScenarioInput]) -> Vec<ScenarioResult> {
        inputs.iter().map(|s| self.compute_scenario(s)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_core::{DemandSource, FixedCostStructure, ProductEconomics};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    fn d(v: i64) -> Decimal {
        Decimal::new(v, 0)
    }

    fn line(key: &str, price: i64, cost: i64, addressable: Option<DemandSource>) -> ProductLine {
        ProductLine {
            key: key.to_string(),
            label: key.to_uppercase(),
            economics: ProductEconomics {
                pilot_price: d(price - 50),
                launch_price: d(price),
                unit_cost: d(cost),
                pilot_unit_cost: None,
            },
            addressable,
        }
    }

    fn market() -> MarketAssumptions {
        MarketAssumptions {
            fleet_size: d(40_000),
            bags_per_unit_per_year: Decimal::new(15, 1),
            consumer_tam_units: Some(d(20_000)),
        }
    }

    fn lines() -> Vec<ProductLine> {
        vec![
            line("b2b", 450, 200, Some(DemandSource::FleetReplacement)),
            line("b2c", 599, 305, None),
        ]
    }

    fn base(b2b_rate: Decimal, b2c_units: Decimal) -> ScenarioInput {
        ScenarioInput::new("Base", PricingTier::Launch)
            .with_volume("b2b", Volume::Adoption(b2b_rate))
            .with_volume("b2c", Volume::Units(b2c_units))
    }

    #[test]
    fn base_scenario_matches_hand_computation() {
        let fixed = FixedCostStructure {
            salaries: d(360_000),
            marketing: d(90_000),
            rnd: d(40_000),
            operations: d(120_000),
            other: d(30_000),
        };
        let (m, ls) = (market(), lines());
        let calc = ScenarioCalculator::new(&m, &ls, fixed.total());
        let r = calc.compute_scenario(&base(Decimal::new(10, 2), d(900)));

        let b2b = r.line("b2b").unwrap();
        assert_eq!(b2b.units, d(6_000));
        assert_eq!(b2b.revenue, d(2_700_000));
        assert_eq!(b2b.cogs, d(1_200_000));
        let b2c = r.line("b2c").unwrap();
        assert_eq!(b2c.revenue, d(539_100));
        assert_eq!(b2c.cogs, d(274_500));

        assert_eq!(r.total_units, d(6_900));
        assert_eq!(r.total_revenue, d(3_239_100));
        assert_eq!(r.total_cogs, d(1_474_500));
        assert_eq!(r.gross_profit, d(1_764_600));
        assert_eq!(r.fixed_costs, d(640_000));
        assert_eq!(r.ebit, d(1_124_600));
        let expected = d(1_764_600) / d(6_900);
        assert!((r.contribution_per_unit - expected).abs() < Decimal::new(1, 12));
        assert_eq!(
            r.gross_margin_pct.round_dp(1),
            Decimal::new(545, 1) // 54.5
        );
    }

    #[test]
    fn zero_volumes_give_zero_margins() {
        let (m, ls) = (market(), lines());
        let calc = ScenarioCalculator::new(&m, &ls, d(640_000));
        let r = calc.compute_scenario(&base(Decimal::ZERO, Decimal::ZERO));
        assert_eq!(r.total_revenue, Decimal::ZERO);
        assert_eq!(r.gross_margin_pct, Decimal::ZERO);
        assert_eq!(r.ebit_margin_pct, Decimal::ZERO);
        assert_eq!(r.contribution_per_unit, Decimal::ZERO);
        assert_eq!(r.ebit, d(-640_000));
    }

    #[test]
    fn pilot_tier_uses_pilot_prices() {
        let (m, ls) = (market(), lines());
        let calc = ScenarioCalculator::new(&m, &ls, Decimal::ZERO);
        let pilot = ScenarioInput::new("Pilot", PricingTier::Pilot)
            .with_volume("b2b", Volume::Units(d(400)))
            .with_volume("b2c", Volume::Units(d(200)));
        let r = calc.compute_scenario(&pilot);
        assert_eq!(r.line("b2b").unwrap().revenue, d(400 * 400));
        assert_eq!(r.line("b2c").unwrap().revenue, d(200 * 549));
        assert_eq!(r.tier, PricingTier::Pilot);
    }

    #[test]
    fn per_line_volume_mode_is_explicit() {
        let mut ls = lines();
        ls[1].addressable = Some(DemandSource::ConsumerTam);
        let m = market();
        let calc = ScenarioCalculator::new(&m, &ls, Decimal::ZERO);
        let s = ScenarioInput::new("TAM", PricingTier::Launch)
            .with_volume("b2b", Volume::Units(d(1_000)))
            .with_volume("b2c", Volume::Adoption(Decimal::new(5, 2)));
        let r = calc.compute_scenario(&s);
        assert_eq!(r.line("b2b").unwrap().units, d(1_000));
        assert_eq!(r.line("b2c").unwrap().units, d(1_000));
    }

    #[test]
    fn adoption_without_market_and_missing_volume_sell_nothing() {
        let (m, ls) = (market(), lines());
        let calc = ScenarioCalculator::new(&m, &ls, Decimal::ZERO);
        let s = ScenarioInput::new("Odd", PricingTier::Launch)
            .with_volume("b2c", Volume::Adoption(Decimal::new(5, 1)));
        let r = calc.compute_scenario(&s);
        assert_eq!(r.total_units, Decimal::ZERO);
        assert_eq!(r.lines.len(), 2);
    }

    #[test]
    fn negative_margin_is_computed_not_rejected() {
        let ls = vec![line("b2b", 150, 200, Some(DemandSource::FleetReplacement))];
        let m = market();
        let calc = ScenarioCalculator::new(&m, &ls, d(1_000));
        let r = calc.compute_scenario(
            &ScenarioInput::new("Loss", PricingTier::Launch)
                .with_volume("b2b", Volume::Units(d(10))),
        );
        assert_eq!(r.gross_profit, d(-500));
        assert_eq!(r.contribution_per_unit, d(-50));
        assert!(r.gross_margin_pct < Decimal::ZERO);
        assert!(!breakeven_units(r.contribution_per_unit, r.fixed_costs).is_reachable());
    }

    #[test]
    fn compute_is_deterministic() {
        let (m, ls) = (market(), lines());
        let calc = ScenarioCalculator::new(&m, &ls, d(640_000));
        let input = base(Decimal::new(20, 2), d(1_200));
        let snapshot = input.clone();
        let a = calc.compute_scenario(&input);
        let b = calc.compute_scenario(&input);
        assert_eq!(a, b);
        assert_eq!(input, snapshot);
    }

    #[test]
    fn safe_division_helpers() {
        assert_eq!(safe_pct(d(-5), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_pct(d(1), d(4)), d(25));
        assert_eq!(safe_ratio(d(10), d(-2)), Decimal::ZERO);
        let tiny = Decimal::new(1, 28);
        assert_eq!(safe_ratio(d(640_000), tiny), Decimal::MAX);
        assert_eq!(safe_ratio(d(-640_000), tiny), Decimal::MIN);
        assert_eq!(safe_pct(d(640_000), tiny), Decimal::MAX);
    }

    #[test]
    fn out_of_range_volumes_saturate() {
        let (m, ls) = (market(), lines());
        let calc = ScenarioCalculator::new(&m, &ls, d(640_000));
        let s = ScenarioInput::new("Huge", PricingTier::Launch)
            .with_volume("b2b", Volume::Units(Decimal::MAX))
            .with_volume("b2c", Volume::Units(Decimal::MAX));
        let r = calc.compute_scenario(&s);
        assert_eq!(r.total_units, Decimal::MAX);
        assert_eq!(r.total_revenue, Decimal::MAX);
        assert_eq!(r.total_cogs, Decimal::MAX);
        assert_eq!(r.gross_profit, Decimal::ZERO);
        assert_eq!(r.ebit, d(-640_000));
    }

    proptest! {
        #[test]
        fn totals_are_exact_sums(rate_bp in 0i64..=10_000, b2c in 0i64..50_000, fixed in 0i64..5_000_000) {
            let (m, ls) = (market(), lines());
            let calc = ScenarioCalculator::new(&m, &ls, d(fixed));
            let r = calc.compute_scenario(&base(Decimal::new(rate_bp, 4), d(b2c)));
            let b2b = r.line("b2b").unwrap();
            let b2cl = r.line("b2c").unwrap();
            prop_assert_eq!(b2b.revenue, b2b.units * d(450));
            prop_assert_eq!(b2cl.revenue, d(b2c) * d(599));
            prop_assert_eq!(r.total_revenue, b2b.revenue + b2cl.revenue);
            prop_assert_eq!(r.total_cogs, b2b.cogs + b2cl.cogs);
            prop_assert_eq!(r.gross_profit, r.total_revenue - r.total_cogs);
            prop_assert_eq!(r.ebit, r.gross_profit - d(fixed));
            prop_assert_eq!(r.total_units, b2b.units + b2cl.units);
        }

        #[test]
        fn zero_revenue_margins_are_zero(price_cents in -10_000i64..10_000, cost in 0i64..1_000) {
            // Negative prices can drive revenue to or below zero.
            let ls = vec![ProductLine {
                key: "x".to_string(),
                label: "X".to_string(),
                economics: ProductEconomics {
                    pilot_price: Decimal::new(price_cents, 2),
                    launch_price: Decimal::new(price_cents, 2),
                    unit_cost: d(cost),
                    pilot_unit_cost: None,
                },
                addressable: None,
            }];
            let m = market();
            let calc = ScenarioCalculator::new(&m, &ls, d(100));
            let r = calc.compute_scenario(
                &ScenarioInput::new("P", PricingTier::Launch).with_volume("x", Volume::Units(d(3))),
            );
            if r.total_revenue <= Decimal::ZERO {
                prop_assert_eq!(r.gross_margin_pct, Decimal::ZERO);
                prop_assert_eq!(r.ebit_margin_pct, Decimal::ZERO);
            } else {
                prop_assert_eq!(r.gross_margin_pct, r.gross_profit / r.total_revenue * d(100));
            }
        }
    }
}
