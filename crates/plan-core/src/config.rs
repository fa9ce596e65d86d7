//! Plan files: the full set of inputs for one run, loaded from YAML or JSON.

use crate::{
    validate_fixed_costs, validate_lines, validate_market, validate_scenario, validate_volume,
    DemandSource, FixedCostStructure, MarketAssumptions, PricingTier, ProductEconomics,
    ProductLine, ScenarioInput, ValidationError, Volume,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_yaml::with::singleton_map_recursive;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Errors raised while reading a plan file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid YAML plan: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid JSON plan: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported plan format: {0} (expected .yaml, .yml or .json)")]
    UnsupportedFormat(String),
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Adoption-rate sweep over one product line.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensitivitySettings {
    /// Line whose adoption rate is swept.
    pub line: String,
    /// Adoption rates tested, as fractions.
    pub rates: Vec<Decimal>,
    /// Volumes of the other lines, held constant across the sweep.
    pub base: ScenarioInput,
}

/// Sampling of the cumulative-profit curve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BreakevenSettings {
    /// Scenario used when none is requested.
    pub scenario: String,
    /// Curve extends to `breakeven × headroom` units.
    pub headroom: Decimal,
    /// Number of evenly spaced samples.
    pub samples: usize,
}

/// Every input of a plan run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    /// Currency label used in reports.
    pub currency: String,
    pub market: MarketAssumptions,
    pub lines: Vec<ProductLine>,
    pub fixed_costs: FixedCostStructure,
    /// Year-1 scenarios, usually Pessimistic, Base and Optimistic.
    pub scenarios: Vec<ScenarioInput>,
    /// Pilot phase, priced at pilot tier with direct unit counts.
    pub pilot: ScenarioInput,
    pub sensitivity: SensitivitySettings,
    pub breakeven: BreakevenSettings,
}

impl Default for PlanConfig {
    /// The Dubai launch plan.
    fn default() -> Self {
        let year_one = |name: &str, adoption: Decimal, b2c_units: i64| {
            ScenarioInput::new(name, PricingTier::Launch)
                .with_volume("b2b", Volume::Adoption(adoption))
                .with_volume("b2c", Volume::Units(Decimal::new(b2c_units, 0)))
        };
        Self {
            currency: "AED".to_string(),
            market: MarketAssumptions {
                fleet_size: Decimal::new(40_000, 0),
                bags_per_unit_per_year: Decimal::new(15, 1),
                consumer_tam_units: None,
            },
            lines: vec![
                ProductLine {
                    key: "b2b".to_string(),
                    label: "NOORSOL retrofit".to_string(),
                    economics: ProductEconomics {
                        pilot_price: Decimal::new(399, 0),
                        launch_price: Decimal::new(450, 0),
                        unit_cost: Decimal::new(200, 0),
                        pilot_unit_cost: None,
                    },
                    addressable: Some(DemandSource::FleetReplacement),
                },
                ProductLine {
                    key: "b2c".to_string(),
                    label: "NOORSOL MOVE beach-lite".to_string(),
                    economics: ProductEconomics {
                        pilot_price: Decimal::new(499, 0),
                        launch_price: Decimal::new(599, 0),
                        unit_cost: Decimal::new(305, 0),
                        pilot_unit_cost: None,
                    },
                    addressable: None,
                },
            ],
            fixed_costs: FixedCostStructure {
                salaries: Decimal::new(360_000, 0),
                marketing: Decimal::new(90_000, 0),
                rnd: Decimal::new(40_000, 0),
                operations: Decimal::new(120_000, 0),
                other: Decimal::new(30_000, 0),
            },
            scenarios: vec![
                year_one("Pessimistic", Decimal::new(5, 2), 600),
                year_one("Base", Decimal::new(10, 2), 900),
                year_one("Optimistic", Decimal::new(20, 2), 1200),
            ],
            pilot: ScenarioInput::new("Pilot", PricingTier::Pilot)
                .with_volume("b2b", Volume::Units(Decimal::new(400, 0)))
                .with_volume("b2c", Volume::Units(Decimal::new(200, 0))),
            sensitivity: SensitivitySettings {
                line: "b2b".to_string(),
                rates: vec![Decimal::new(15, 2), Decimal::new(25, 2), Decimal::new(40, 2)],
                base: ScenarioInput::new("Sensitivity", PricingTier::Launch)
                    .with_volume("b2c", Volume::Units(Decimal::new(900, 0))),
            },
            breakeven: BreakevenSettings {
                scenario: "Base".to_string(),
                headroom: Decimal::new(15, 1),
                samples: 50,
            },
        }
    }
}

impl PlanConfig {
    /// Total annual fixed costs shared by every scenario.
    pub fn fixed_costs_total(&self) -> Decimal {
        self.fixed_costs.total()
    }

    /// Look up a product line by key.
    pub fn line(&self, key: &str) -> Option<&ProductLine> {
        self.lines.iter().find(|l| l.key == key)
    }

    /// Look up a Year-1 scenario by name, case-insensitively.
    pub fn scenario(&self, name: &str) -> Option<&ScenarioInput> {
        self.scenarios
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }

    /// Check every invariant of the plan.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.currency.trim().is_empty() {
            return Err(ValidationError::EmptyName("currency"));
        }
        validate_market(&self.market)?;
        validate_lines(&self.market, &self.lines)?;
        validate_fixed_costs(&self.fixed_costs)?;
        for s in &self.scenarios {
            validate_scenario(s, &self.market, &self.lines)?;
        }
        validate_scenario(&self.pilot, &self.market, &self.lines)?;

        let sens = &self.sensitivity;
        validate_scenario(&sens.base, &self.market, &self.lines)?;
        let line = self
            .line(&sens.line)
            .ok_or_else(|| ValidationError::UnknownLine {
                scenario: sens.base.name.clone(),
                line: sens.line.clone(),
            })?;
        for rate in &sens.rates {
            validate_volume(line, &Volume::Adoption(*rate), &self.market)?;
        }

        if self.breakeven.headroom <= Decimal::ZERO {
            return Err(ValidationError::InvalidHeadroom);
        }
        if self.scenario(&self.breakeven.scenario).is_none() {
            return Err(ValidationError::UnknownScenario(
                self.breakeven.scenario.clone(),
            ));
        }
        Ok(())
    }

    /// Parse and validate a YAML plan. Enum values are written as plain
    /// strings (`fleet_replacement`) or single-key maps (`{ adoption: 0.10 }`).
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let plan: PlanConfig =
            singleton_map_recursive::deserialize(serde_yaml::Deserializer::from_str(text))?;
        plan.validate()?;
        Ok(plan)
    }

    /// Serialize in the same YAML shape `from_yaml_str` reads.
    pub fn to_yaml_string(&self) -> Result<String, ConfigError> {
        let mut buf = Vec::new();
        singleton_map_recursive::serialize(self, &mut serde_yaml::Serializer::new(&mut buf))?;
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }

    /// Parse and validate a JSON plan.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let plan: PlanConfig = serde_json::from_str(text)?;
        plan.validate()?;
        Ok(plan)
    }
}

/// Load a plan file, choosing the format from its extension.
pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<PlanConfig, ConfigError> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let plan = match ext.as_str() {
        "yaml" | "yml" => PlanConfig::from_yaml_str(&text)?,
        "json" => PlanConfig::from_json_str(&text)?,
        other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
    };
    info!(
        path = %path.display(),
        lines = plan.lines.len(),
        scenarios = plan.scenarios.len(),
        "loaded plan"
    );
    Ok(plan)
}
