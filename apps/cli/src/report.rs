//! Plain-text rendering of the plan views.

use plan_core::{PlanConfig, PricingTier, Volume};
use plan_econ::{Breakeven, BreakevenAnalysis, ScenarioResult};
use rust_decimal::Decimal;
use std::fmt::Write;

/// Whole-unit amount with thousands separators, e.g. `-1,124,600`.
pub fn fmt_amount(v: Decimal) -> String {
    let rounded = v.round_dp(0);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let digits = rounded.abs().trunc().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if negative {
        out.insert(0, '-');
    }
    out
}

/// Percentage with one decimal, e.g. `54.5%`.
pub fn fmt_pct(v: Decimal) -> String {
    let mut r = v.round_dp(1);
    r.rescale(1);
    format!("{r}%")
}

/// Breakeven units, or `∞` when unreachable.
pub fn fmt_breakeven(b: Breakeven) -> String {
    match b {
        Breakeven::Units(u) => fmt_amount(u),
        Breakeven::Unreachable => b.to_string(),
    }
}

fn fmt_demand(v: Option<Decimal>) -> String {
    v.map(fmt_amount).unwrap_or_else(|| "N/A".to_string())
}

/// Round parts to whole units so they add up to `total` rounded the way
/// `fmt_amount` rounds it. Leftover units go to the largest fractions.
pub fn whole_unit_split(total: Decimal, parts: &[Decimal]) -> Vec<Decimal> {
    let mut out: Vec<Decimal> = parts.iter().map(|p| p.floor()).collect();
    let mut short = total.round_dp(0) - out.iter().copied().sum::<Decimal>();
    let mut order: Vec<usize> = (0..parts.len()).collect();
    order.sort_by(|&a, &b| (parts[b] - out[b]).cmp(&(parts[a] - out[a])));
    for i in order {
        if short <= Decimal::ZERO {
            break;
        }
        out[i] += Decimal::ONE;
        short -= Decimal::ONE;
    }
    out
}

fn fmt_volume(v: &Volume) -> String {
    match v {
        Volume::Adoption(rate) => format!("{} adoption", rate.normalize()),
        Volume::Units(units) => format!("{} units", fmt_amount(*units)),
    }
}

/// Render rows under headers; the first column is left-aligned, the rest right-aligned.
pub fn table(headers: &[String], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(i) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let line = |cells: &[String]| -> String {
        cells
            .iter()
            .zip(&widths)
            .enumerate()
            .map(|(i, (c, w))| {
                let pad = w.saturating_sub(c.chars().count());
                if i == 0 {
                    format!("{c}{}", " ".repeat(pad))
                } else {
                    format!("{}{c}", " ".repeat(pad))
                }
            })
            .collect::<Vec<_>>()
            .join(" | ")
    };
    let mut out = String::new();
    let _ = writeln!(out, "{}", line(headers));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    for row in rows {
        let _ = writeln!(out, "{}", line(row.as_slice()));
    }
    out
}

fn unit_headers(plan: &PlanConfig) -> Vec<String> {
    plan.lines
        .iter()
        .map(|l| format!("{} units", l.key.to_uppercase()))
        .collect()
}

fn unit_cells(r: &ScenarioResult) -> Vec<String> {
    r.lines.iter().map(|l| fmt_amount(l.units)).collect()
}

/// Market constants, line prices and the Year-1 scenario snapshot.
pub fn render_overview(plan: &PlanConfig, year_one: &[ScenarioResult]) -> String {
    let cur = &plan.currency;
    let mut out = String::new();
    let _ = writeln!(out, "Market");
    let _ = writeln!(out, "  Active delivery bikes: {}", fmt_amount(plan.market.fleet_size));
    let _ = writeln!(
        out,
        "  Annual delivery-bag demand: {} bags",
        fmt_demand(plan.market.annual_bag_demand())
    );
    if let Some(tam) = plan.market.consumer_tam_units {
        let _ = writeln!(out, "  Consumer TAM: {} units/year", fmt_amount(tam));
    }
    let _ = writeln!(out, "\nProduct lines");
    for l in &plan.lines {
        let _ = writeln!(
            out,
            "  {}: launch {} {cur}/unit, COGS {} {cur}/unit, margin {} {cur}/unit",
            l.label,
            fmt_amount(l.economics.launch_price),
            fmt_amount(l.economics.unit_cost),
            fmt_amount(l.economics.at(PricingTier::Launch).unit_margin()),
        );
    }

    let _ = writeln!(out, "\nScenario snapshot, Year 1");
    let mut headers = vec!["Scenario".to_string()];
    headers.extend(unit_headers(plan));
    headers.push(format!("Revenue ({cur})"));
    headers.push(format!("Gross profit ({cur})"));
    headers.push(format!("EBIT ({cur})"));
    let rows: Vec<Vec<String>> = year_one
        .iter()
        .map(|r| {
            let mut row = vec![r.name.clone()];
            row.extend(unit_cells(r));
            row.push(fmt_amount(r.total_revenue));
            row.push(fmt_amount(r.gross_profit));
            row.push(fmt_amount(r.ebit));
            row
        })
        .collect();
    out.push_str(&table(&headers, &rows));
    out
}

/// Parameter/value listing of every plan input.
pub fn render_assumptions(plan: &PlanConfig) -> String {
    let cur = &plan.currency;
    let mut rows: Vec<Vec<String>> = vec![
        vec!["Active delivery bikes".into(), fmt_amount(plan.market.fleet_size)],
        vec![
            "Bags per bike per year".into(),
            plan.market.bags_per_unit_per_year.normalize().to_string(),
        ],
        vec![
            "Annual bag demand".into(),
            fmt_demand(plan.market.annual_bag_demand()),
        ],
    ];
    for l in &plan.lines {
        let e = &l.economics;
        rows.push(vec![format!("{} price, pilot ({cur})", l.label), fmt_amount(e.pilot_price)]);
        rows.push(vec![format!("{} price, launch ({cur})", l.label), fmt_amount(e.launch_price)]);
        rows.push(vec![format!("{} COGS ({cur})", l.label), fmt_amount(e.unit_cost)]);
        if let Some(c) = e.pilot_unit_cost {
            rows.push(vec![format!("{} COGS, pilot ({cur})", l.label), fmt_amount(c)]);
        }
    }
    for s in plan.scenarios.iter().chain(std::iter::once(&plan.pilot)) {
        for (key, v) in &s.volumes {
            rows.push(vec![format!("{}, {key}", s.name), fmt_volume(v)]);
        }
    }
    for (name, value) in plan.fixed_costs.buckets() {
        rows.push(vec![format!("Fixed: {name} ({cur}/year)"), fmt_amount(value)]);
    }
    rows.push(vec![
        format!("Total fixed costs ({cur}/year)"),
        fmt_amount(plan.fixed_costs_total()),
    ]);
    table(&["Parameter".to_string(), "Value".to_string()], &rows)
}

/// Pilot phase summary followed by the Year-1 P&L table.
pub fn render_pnl(plan: &PlanConfig, pilot: &ScenarioResult, year_one: &[ScenarioResult]) -> String {
    let cur = &plan.currency;
    let mut out = String::new();
    let _ = writeln!(out, "Pilot phase ({} pricing, not annualised)", pilot.tier);
    let _ = writeln!(out, "  Revenue ({cur}): {}", fmt_amount(pilot.total_revenue));
    let _ = writeln!(out, "  Gross profit ({cur}): {}", fmt_amount(pilot.gross_profit));
    let _ = writeln!(
        out,
        "  Gross profit / unit ({cur}): {}",
        fmt_amount(pilot.contribution_per_unit)
    );
    let _ = writeln!(out, "  Gross margin: {}", fmt_pct(pilot.gross_margin_pct));

    let _ = writeln!(out, "\nYear 1 scenario P&L");
    let mut headers = vec!["Scenario".to_string()];
    headers.extend(unit_headers(plan));
    headers.extend([
        format!("Revenue ({cur})"),
        format!("COGS ({cur})"),
        format!("Gross profit ({cur})"),
        "Gross margin".to_string(),
        format!("EBIT ({cur})"),
        "EBIT margin".to_string(),
    ]);
    let rows: Vec<Vec<String>> = year_one
        .iter()
        .map(|r| {
            let mut row = vec![r.name.clone()];
            row.extend(unit_cells(r));
            row.extend([
                fmt_amount(r.total_revenue),
                fmt_amount(r.total_cogs),
                fmt_amount(r.gross_profit),
                fmt_pct(r.gross_margin_pct),
                fmt_amount(r.ebit),
                fmt_pct(r.ebit_margin_pct),
            ]);
            row
        })
        .collect();
    out.push_str(&table(&headers, &rows));
    out
}

/// Breakeven figures, per-line split and the cumulative profit curve.
pub fn render_breakeven(plan: &PlanConfig, a: &BreakevenAnalysis) -> String {
    let cur = &plan.currency;
    let mut out = String::new();
    let _ = writeln!(out, "Breakeven, scenario {}", a.scenario);
    let _ = writeln!(
        out,
        "  Contribution / unit ({cur}): {}",
        fmt_amount(a.contribution_per_unit)
    );
    let _ = writeln!(out, "  Fixed costs ({cur}): {}", fmt_amount(a.fixed_costs));
    let _ = writeln!(out, "  Breakeven units (total): {}", fmt_breakeven(a.breakeven));
    match (&a.mix, a.breakeven.units()) {
        (Some(mix), Some(total)) => {
            let parts: Vec<Decimal> = mix.iter().map(|m| m.units).collect();
            for (m, units) in mix.iter().zip(whole_unit_split(total, &parts)) {
                let _ = writeln!(
                    out,
                    "  Breakeven {} units (approx.): {}",
                    m.key.to_uppercase(),
                    fmt_amount(units)
                );
            }
        }
        _ => {
            for l in &plan.lines {
                let _ = writeln!(out, "  Breakeven {} units (approx.): N/A", l.key.to_uppercase());
            }
        }
    }

    if a.curve.is_empty() {
        let _ = writeln!(
            out,
            "\nBreakeven cannot be computed because contribution per unit is non-positive."
        );
        return out;
    }
    let _ = writeln!(out, "\nCumulative profit vs. units sold");
    let rows: Vec<Vec<String>> = a
        .curve
        .iter()
        .map(|p| vec![fmt_amount(p.units), fmt_amount(p.profit)])
        .collect();
    out.push_str(&table(
        &["Total units sold".to_string(), format!("Cumulative profit ({cur})")],
        &rows,
    ));
    out
}

/// Adoption-rate sweep table.
pub fn render_sensitivity(plan: &PlanConfig, rows: &[ScenarioResult]) -> String {
    let cur = &plan.currency;
    let line = &plan.sensitivity.line;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "Sensitivity: {} adoption rate (other lines held constant)",
        line.to_uppercase()
    );
    let headers = vec![
        "Scenario".to_string(),
        format!("{} units", line.to_uppercase()),
        format!("Revenue ({cur})"),
        format!("Gross profit ({cur})"),
        format!("EBIT ({cur})"),
        "EBIT margin".to_string(),
    ];
    let body: Vec<Vec<String>> = rows
        .iter()
        .map(|r| {
            vec![
                r.name.clone(),
                r.line(line).map(|l| fmt_amount(l.units)).unwrap_or_default(),
                fmt_amount(r.total_revenue),
                fmt_amount(r.gross_profit),
                fmt_amount(r.ebit),
                fmt_pct(r.ebit_margin_pct),
            ]
        })
        .collect();
    out.push_str(&table(&headers, &body));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use plan_econ::{analyze_breakeven, ScenarioCalculator};

    #[test]
    fn amounts_group_thousands() {
        assert_eq!(fmt_amount(Decimal::new(3_239_100, 0)), "3,239,100");
        assert_eq!(fmt_amount(Decimal::new(-640_000, 0)), "-640,000");
        assert_eq!(fmt_amount(Decimal::new(999, 0)), "999");
        assert_eq!(fmt_amount(Decimal::new(25_573_913, 5)), "256");
        assert_eq!(fmt_amount(Decimal::new(-4, 1)), "0");
    }

    #[test]
    fn percentages_keep_one_decimal() {
        assert_eq!(fmt_pct(Decimal::new(50, 0)), "50.0%");
        assert_eq!(fmt_pct(Decimal::new(54_478, 3)), "54.5%");
    }

    #[test]
    fn unreachable_breakeven_renders_infinity() {
        assert_eq!(fmt_breakeven(Breakeven::Unreachable), "∞");
    }

    #[test]
    fn overview_shows_base_scenario() {
        let plan = PlanConfig::default();
        let calc = ScenarioCalculator::from_plan(&plan);
        let text = render_overview(&plan, &calc.compute_all(&plan.scenarios));
        assert!(text.contains("60,000 bags"));
        assert!(text.contains("3,239,100"));
        assert!(text.contains("1,124,600"));
    }

    #[test]
    fn breakeven_view_without_contribution() {
        let plan = PlanConfig::default();
        let calc = ScenarioCalculator::from_plan(&plan);
        let empty = calc.compute_scenario(&plan_core::ScenarioInput::new(
            "Empty",
            plan_core::PricingTier::Launch,
        ));
        let text = render_breakeven(&plan, &analyze_breakeven(&empty, Decimal::ONE, 10));
        assert!(text.contains("Breakeven units (total): ∞"));
        assert!(text.contains("N/A"));
        assert!(text.contains("cannot be computed"));
    }

    #[test]
    fn breakeven_split_adds_up_to_displayed_total() {
        let plan = PlanConfig::default();
        let calc = ScenarioCalculator::from_plan(&plan);
        let base = calc.compute_scenario(plan.scenario("Base").unwrap());
        let text = render_breakeven(&plan, &analyze_breakeven(&base, Decimal::new(15, 1), 50));
        // 2,502.55 total: 2,176.13 for B2B and 326.42 for B2C.
        assert!(text.contains("Breakeven units (total): 2,503"));
        assert!(text.contains("Breakeven B2B units (approx.): 2,176"));
        assert!(text.contains("Breakeven B2C units (approx.): 327"));
    }

    #[test]
    fn whole_unit_split_never_goes_negative() {
        let parts = [Decimal::new(6, 1), Decimal::new(6, 1), Decimal::new(2, 1)];
        let split = whole_unit_split(Decimal::new(14, 1), &parts);
        assert_eq!(split.iter().copied().sum::<Decimal>(), Decimal::ONE);
        assert!(split.iter().all(|u| *u >= Decimal::ZERO));
        assert!(whole_unit_split(Decimal::new(7, 0), &[]).is_empty());
    }

    #[test]
    fn table_aligns_columns() {
        let t = table(
            &["A".to_string(), "Value".to_string()],
            &[vec!["long name".to_string(), "1".to_string()]],
        );
        let lines: Vec<&str> = t.lines().collect();
        assert_eq!(lines[0], "A         | Value");
        assert_eq!(lines[2], "long name |     1");
    }
}
