//! Analysis configuration.
//!
//! Every empirical constant the estimators use lives here so callers can
//! tune them without touching model code. `AnalysisConfig::default()` carries
//! the reference values; `AnalysisConfig::load()` overlays a JSON file in
//! which every section and key is optional.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

// ── Pricing ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ServicePrice {
    pub keyword: String,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Keywords are matched case-insensitively as substrings of the service text.
    pub services: Vec<ServicePrice>,
    pub fallback_price: f64,
}

impl Default for PricingConfig {
    fn default() -> Self {
        let services = [
            ("waterless pedicure", 90.0),
            ("smart pedicure", 95.0),
            ("e-file manicure", 55.0),
            ("gel polish", 25.0),
            ("nail polish", 15.0),
            ("feet massage", 20.0),
            ("hands massage", 15.0),
            ("hard gel strengthening", 35.0),
            ("nail repair", 20.0),
            ("french tip", 15.0),
            ("paramedical pedicure", 120.0),
            ("consultation", 50.0),
            ("b/s brace", 80.0),
        ]
        .into_iter()
        .map(|(keyword, price)| ServicePrice {
            keyword: keyword.into(),
            price,
        })
        .collect();

        Self {
            services,
            fallback_price: 85.0,
        }
    }
}

// ── Frequency model ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FrequencyModelConfig {
    /// Inclusive bounds applied to both `r` and `alpha`.
    pub param_min: f64,
    pub param_max: f64,
    /// Floor applied to the method-of-moments starting point.
    pub init_floor: f64,
    pub max_iterations: usize,
    pub tolerance: f64,
    /// Chi-square per degree of freedom below which the fit is "good".
    pub good_fit_below: f64,
    pub moderate_fit_below: f64,
    /// `r` below which heterogeneity is "high".
    pub high_heterogeneity_below: f64,
    pub moderate_heterogeneity_below: f64,
}

impl Default for FrequencyModelConfig {
    fn default() -> Self {
        Self {
            param_min: 0.01,
            param_max: 100.0,
            init_floor: 0.1,
            max_iterations: 500,
            tolerance: 1e-10,
            good_fit_below: 2.0,
            moderate_fit_below: 4.0,
            high_heterogeneity_below: 0.5,
            moderate_heterogeneity_below: 1.5,
        }
    }
}

// ── Value model ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValueModelConfig {
    pub min_repeat_customers: usize,
    /// Assumed future-value uplift applied to historical spend.
    pub growth_factor: f64,
    pub top_fraction: f64,
    pub hidden_gem_max_frequency: u32,
    pub hidden_gem_limit: usize,
    /// Visits per year assumed by the "if they came monthly" projection.
    pub projection_visits: f64,
}

impl Default for ValueModelConfig {
    fn default() -> Self {
        Self {
            min_repeat_customers: 10,
            growth_factor: 1.2,
            top_fraction: 0.10,
            hidden_gem_max_frequency: 4,
            hidden_gem_limit: 10,
            projection_visits: 12.0,
        }
    }
}

// ── Churn model ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChurnModelConfig {
    pub recency_weight: f64,
    pub frequency_weight: f64,
    pub high_risk: f64,
    pub medium_risk: f64,
    /// Fraction of a high-risk customer's historical spend counted as exposed.
    pub revenue_exposure: f64,
}

impl Default for ChurnModelConfig {
    fn default() -> Self {
        Self {
            recency_weight: 0.7,
            frequency_weight: 0.3,
            high_risk: 0.70,
            medium_risk: 0.40,
            revenue_exposure: 0.8,
        }
    }
}

// ── Retention & upgrades ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub overdue_days: [i64; 3],
    pub valuable_exposure: f64,
    pub regular_active_days: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            overdue_days: [30, 60, 90],
            valuable_exposure: 0.5,
            regular_active_days: 45,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeConfig {
    pub min_visits: u32,
    pub limit: usize,
}

impl Default for UpgradeConfig {
    fn default() -> Self {
        Self {
            min_visits: 6,
            limit: 10,
        }
    }
}

// ── Health score ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthConfig {
    pub active_days: i64,
    pub retention_cap: f64,
    pub loyalty_multiplier: f64,
    pub loyalty_cap: f64,
    pub new_customer_days: i64,
    pub growth_multiplier: f64,
    pub growth_cap: f64,
    /// Growth points awarded when there are no transactions to measure.
    pub growth_neutral: f64,
    pub value_reference_spend: f64,
    pub value_cap: f64,
    pub strong_at: u32,
    pub stable_at: u32,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            active_days: 60,
            retention_cap: 30.0,
            loyalty_multiplier: 1.25,
            loyalty_cap: 25.0,
            new_customer_days: 90,
            growth_multiplier: 2.5,
            growth_cap: 25.0,
            growth_neutral: 12.5,
            value_reference_spend: 200.0,
            value_cap: 20.0,
            strong_at: 70,
            stable_at: 50,
        }
    }
}

// ── Root ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub pricing: PricingConfig,
    pub frequency_model: FrequencyModelConfig,
    pub value_model: ValueModelConfig,
    pub churn_model: ChurnModelConfig,
    pub retention: RetentionConfig,
    pub upgrades: UpgradeConfig,
    pub health: HealthConfig,
}

impl AnalysisConfig {
    /// Load overrides from a JSON file. Missing keys keep their defaults.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: AnalysisConfig = serde_json::from_str(&content)?;
        config.validate()?;
        log::debug!("config: loaded overrides from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        let fm = &self.frequency_model;
        if !(fm.param_min > 0.0 && fm.param_min < fm.param_max) {
            return Err(invalid(format!(
                "frequency_model bounds must satisfy 0 < param_min < param_max (got {} .. {})",
                fm.param_min, fm.param_max
            )));
        }
        if fm.max_iterations == 0 {
            return Err(invalid("frequency_model.max_iterations must be > 0".into()));
        }
        if fm.good_fit_below > fm.moderate_fit_below
            || fm.high_heterogeneity_below > fm.moderate_heterogeneity_below
        {
            return Err(invalid("frequency_model bands must be ordered".into()));
        }

        let vm = &self.value_model;
        if vm.growth_factor < 0.0 || !(0.0..=1.0).contains(&vm.top_fraction) {
            return Err(invalid(
                "value_model needs growth_factor ≥ 0 and top_fraction in [0, 1]".into(),
            ));
        }

        let cm = &self.churn_model;
        if cm.recency_weight < 0.0 || cm.frequency_weight < 0.0 {
            return Err(invalid("churn_model weights must be non-negative".into()));
        }
        if cm.medium_risk > cm.high_risk {
            return Err(invalid(format!(
                "churn_model.medium_risk ({}) must not exceed high_risk ({})",
                cm.medium_risk, cm.high_risk
            )));
        }

        let od = &self.retention.overdue_days;
        if !(od[0] <= od[1] && od[1] <= od[2]) {
            return Err(invalid("retention.overdue_days must be ascending".into()));
        }

        let pricing = &self.pricing;
        if pricing.services.iter().any(|s| s.price < 0.0) || pricing.fallback_price < 0.0 {
            return Err(invalid("pricing entries must be non-negative".into()));
        }
        Ok(())
    }
}

fn invalid(msg: String) -> CoreError {
    CoreError::InvalidConfig(msg)
}
