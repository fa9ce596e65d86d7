#![deny(warnings)]

//! Core domain models and invariants for the business-plan scenario model.
//!
//! This crate defines the serializable inputs shared by every scenario
//! computation (market constants, product economics, fixed costs and
//! scenario volumes) together with validation helpers that guarantee basic
//! invariants when a plan is loaded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

pub mod config;

pub use config::{load_plan, BreakevenSettings, ConfigError, PlanConfig, SensitivitySettings};

/// Market-size constants for one run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketAssumptions {
    /// Active delivery bikes (riders) in the target market.
    pub fleet_size: Decimal,
    /// Delivery bags consumed per bike per year (wear and replacement).
    pub bags_per_unit_per_year: Decimal,
    /// Consumer market size in units per year, when modeled.
    #[serde(default)]
    pub consumer_tam_units: Option<Decimal>,
}

impl MarketAssumptions {
    /// Annual bag demand = fleet size × bags per bike per year; `None` when
    /// the product leaves the decimal range.
    pub fn annual_bag_demand(&self) -> Option<Decimal> {
        self.fleet_size.checked_mul(self.bags_per_unit_per_year)
    }
}

/// Pricing tier applied to every product line of a scenario.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingTier {
    /// Introductory pilot pricing.
    Pilot,
    /// Full launch pricing.
    #[default]
    Launch,
}

impl std::fmt::Display for PricingTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PricingTier::Pilot => f.write_str("pilot"),
            PricingTier::Launch => f.write_str("launch"),
        }
    }
}

/// Price and unit cost selected for one tier.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitEconomics {
    pub price: Decimal,
    pub unit_cost: Decimal,
}

impl UnitEconomics {
    /// Gross profit per unit sold; negative when cost exceeds price.
    pub fn unit_margin(&self) -> Decimal {
        self.price - self.unit_cost
    }
}

/// Price points and cost of goods for a product line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductEconomics {
    /// Unit price during the pilot phase.
    pub pilot_price: Decimal,
    /// Unit price after launch.
    pub launch_price: Decimal,
    /// Cost of goods per unit.
    pub unit_cost: Decimal,
    /// Cost of goods per unit during the pilot, if it differs from `unit_cost`.
    #[serde(default)]
    pub pilot_unit_cost: Option<Decimal>,
}

impl ProductEconomics {
    /// Select the price/cost pair for a tier.
    pub fn at(&self, tier: PricingTier) -> UnitEconomics {
        match tier {
            PricingTier::Pilot => UnitEconomics {
                price: self.pilot_price,
                unit_cost: self.pilot_unit_cost.unwrap_or(self.unit_cost),
            },
            PricingTier::Launch => UnitEconomics {
                price: self.launch_price,
                unit_cost: self.unit_cost,
            },
        }
    }
}

/// Annual fixed operating costs, bucketed by purpose.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedCostStructure {
    /// Salaries and founders' compensation.
    pub salaries: Decimal,
    /// Brand and performance marketing.
    pub marketing: Decimal,
    /// Product development and R&D.
    pub rnd: Decimal,
    /// Operations, logistics overhead and office.
    pub operations: Decimal,
    /// Legal, accounting and everything else.
    pub other: Decimal,
}

impl FixedCostStructure {
    /// Named buckets in display order.
    pub fn buckets(&self) -> [(&'static str, Decimal); 5] {
        [
            ("salaries", self.salaries),
            ("marketing", self.marketing),
            ("rnd", self.rnd),
            ("operations", self.operations),
            ("other", self.other),
        ]
    }

    /// Sum of all buckets, recomputed on every call.
    pub fn total(&self) -> Decimal {
        self.buckets().iter().map(|(_, v)| *v).sum()
    }
}

/// Where a product line's addressable annual demand comes from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DemandSource {
    /// Replacement demand of the delivery fleet (`annual_bag_demand`).
    FleetReplacement,
    /// The consumer TAM configured on the market.
    ConsumerTam,
    /// A fixed TAM constant in units per year.
    Fixed(Decimal),
}

impl DemandSource {
    /// Addressable units per year; `None` when the source is not configured.
    pub fn units(&self, market: &MarketAssumptions) -> Option<Decimal> {
        match self {
            DemandSource::FleetReplacement => market.annual_bag_demand(),
            DemandSource::ConsumerTam => market.consumer_tam_units,
            DemandSource::Fixed(units) => Some(*units),
        }
    }
}

/// A product line sold under the plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductLine {
    /// Stable identifier used by scenario volumes, e.g. "b2b".
    pub key: String,
    /// Display label.
    pub label: String,
    pub economics: ProductEconomics,
    /// Addressable market used to resolve adoption-rate volumes.
    #[serde(default)]
    pub addressable: Option<DemandSource>,
}

impl ProductLine {
    /// Addressable annual demand for this line, if any.
    pub fn addressable_units(&self, market: &MarketAssumptions) -> Option<Decimal> {
        self.addressable.as_ref().and_then(|d| d.units(market))
    }
}

/// Volume of a product line in a scenario: an adoption rate against the
/// line's addressable market, or a direct unit count.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Volume {
    /// Fraction in [0, 1] of the line's addressable demand.
    Adoption(Decimal),
    /// Units sold.
    Units(Decimal),
}

/// A named scenario: per-line volumes plus the pricing tier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Display label, opaque to the computation.
    pub name: String,
    /// Volume per product line key. Lines without an entry sell nothing.
    #[serde(default)]
    pub volumes: BTreeMap<String, Volume>,
    #[serde(default)]
    pub tier: PricingTier,
}

impl ScenarioInput {
    pub fn new(name: impl Into<String>, tier: PricingTier) -> Self {
        Self {
            name: name.into(),
            volumes: BTreeMap::new(),
            tier,
        }
    }

    /// Builder-style volume assignment.
    pub fn with_volume(mut self, line: impl Into<String>, volume: Volume) -> Self {
        self.volumes.insert(line.into(), volume);
        self
    }
}

/// Validation errors for domain invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// Market constants must be non-negative.
    #[error("market value `{0}` must be non-negative")]
    NegativeMarketValue(&'static str),
    /// Prices, costs and fixed-cost buckets must be non-negative.
    #[error("negative monetary value for {0}")]
    NegativeMoney(String),
    /// Adoption rates are fractions of the addressable market.
    #[error("adoption rate {rate} for line `{line}` is outside [0, 1]")]
    AdoptionOutOfRange { line: String, rate: Decimal },
    /// Unit counts must be non-negative.
    #[error("negative unit count for line `{0}`")]
    NegativeUnits(String),
    /// Names and keys must not be blank.
    #[error("empty {0}")]
    EmptyName(&'static str),
    /// Product line keys must be unique.
    #[error("duplicate product line key: {0}")]
    DuplicateLine(String),
    /// A scenario references a line that is not part of the plan.
    #[error("scenario `{scenario}` references unknown line `{line}`")]
    UnknownLine { scenario: String, line: String },
    /// Adoption volumes need an addressable market to resolve against.
    #[error("line `{0}` has no addressable market for an adoption volume")]
    NoAddressableMarket(String),
    /// A named scenario is not part of the plan.
    #[error("unknown scenario: {0}")]
    UnknownScenario(String),
    /// A derived amount does not fit in a `Decimal`.
    #[error("{0} overflows the decimal range")]
    Overflow(String),
    /// Chart sampling parameters.
    #[error("breakeven chart headroom must be > 0")]
    InvalidHeadroom,
}

/// Validate market constants.
pub fn validate_market(m: &MarketAssumptions) -> Result<(), ValidationError> {
    if m.fleet_size < Decimal::ZERO {
        return Err(ValidationError::NegativeMarketValue("fleet_size"));
    }
    if m.bags_per_unit_per_year < Decimal::ZERO {
        return Err(ValidationError::NegativeMarketValue("bags_per_unit_per_year"));
    }
    if m.consumer_tam_units.is_some_and(|t| t < Decimal::ZERO) {
        return Err(ValidationError::NegativeMarketValue("consumer_tam_units"));
    }
    if m.annual_bag_demand().is_none() {
        return Err(ValidationError::Overflow("annual bag demand".to_string()));
    }
    Ok(())
}

/// Validate the price points of a product line. Price below cost is allowed.
pub fn validate_economics(key: &str, e: &ProductEconomics) -> Result<(), ValidationError> {
    let values = [
        e.pilot_price,
        e.launch_price,
        e.unit_cost,
        e.pilot_unit_cost.unwrap_or(Decimal::ZERO),
    ];
    if values.iter().any(|v| *v < Decimal::ZERO) {
        return Err(ValidationError::NegativeMoney(format!("line `{key}`")));
    }
    Ok(())
}

/// Validate fixed-cost buckets.
pub fn validate_fixed_costs(f: &FixedCostStructure) -> Result<(), ValidationError> {
    for (name, value) in f.buckets() {
        if value < Decimal::ZERO {
            return Err(ValidationError::NegativeMoney(format!("fixed cost `{name}`")));
        }
    }
    Ok(())
}

/// Validate the product lines, including key uniqueness.
pub fn validate_lines(
    market: &MarketAssumptions,
    lines: &[ProductLine],
) -> Result<(), ValidationError> {
    let mut keys: BTreeSet<&str> = BTreeSet::new();
    for line in lines {
        if line.key.trim().is_empty() {
            return Err(ValidationError::EmptyName("product line key"));
        }
        if !keys.insert(line.key.as_str()) {
            return Err(ValidationError::DuplicateLine(line.key.clone()));
        }
        validate_economics(&line.key, &line.economics)?;
        if let Some(DemandSource::Fixed(units)) = &line.addressable {
            if *units < Decimal::ZERO {
                return Err(ValidationError::NegativeMarketValue("fixed TAM"));
            }
        }
        if line.addressable.is_some() && line.addressable_units(market).is_none() {
            return Err(ValidationError::NoAddressableMarket(line.key.clone()));
        }
    }
    Ok(())
}

/// Validate a scenario against the product lines it refers to. Each line's
/// revenue and COGS at the scenario's tier must be representable.
pub fn validate_scenario(
    s: &ScenarioInput,
    market: &MarketAssumptions,
    lines: &[ProductLine],
) -> Result<(), ValidationError> {
    if s.name.trim().is_empty() {
        return Err(ValidationError::EmptyName("scenario name"));
    }
    for (key, volume) in &s.volumes {
        let line = lines
            .iter()
            .find(|l| &l.key == key)
            .ok_or_else(|| ValidationError::UnknownLine {
                scenario: s.name.clone(),
                line: key.clone(),
            })?;
        validate_volume(line, volume, market)?;
        let units = match volume {
            Volume::Units(units) => *units,
            Volume::Adoption(rate) => line
                .addressable_units(market)
                .and_then(|demand| rate.checked_mul(demand))
                .unwrap_or(Decimal::ZERO),
        };
        let econ = line.economics.at(s.tier);
        if units.checked_mul(econ.price).is_none() || units.checked_mul(econ.unit_cost).is_none() {
            return Err(ValidationError::Overflow(format!(
                "scenario `{}` revenue of line `{key}`",
                s.name
            )));
        }
    }
    Ok(())
}

/// Validate one volume entry for a line.
pub fn validate_volume(
    line: &ProductLine,
    volume: &Volume,
    market: &MarketAssumptions,
) -> Result<(), ValidationError> {
    match volume {
        Volume::Adoption(rate) => {
            if *rate < Decimal::ZERO || *rate > Decimal::ONE {
                return Err(ValidationError::AdoptionOutOfRange {
                    line: line.key.clone(),
                    rate: *rate,
                });
            }
            if line.addressable_units(market).is_none() {
                return Err(ValidationError::NoAddressableMarket(line.key.clone()));
            }
        }
        Volume::Units(units) => {
            if *units < Decimal::ZERO {
                return Err(ValidationError::NegativeUnits(line.key.clone()));
            }
        }
    }
    Ok(())
}
