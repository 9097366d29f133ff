//! Value model — simplified customer lifetime value.
//!
//! CLV is approximated as `avg_spend × frequency × growth_factor` over
//! repeat customers. This is a proxy for a gamma-gamma spend model, not
//! an implementation of one.
//!
//! Too few repeat customers is an ordinary state for a young business, so
//! it comes back as `ClvOutcome::Insufficient`, never as an error.

use crate::{
    aggregation::CustomerAggregate,
    config::ValueModelConfig,
    types::{CustomerId, VisitCount},
};
use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerClv {
    pub customer_id: CustomerId,
    pub frequency: VisitCount,
    pub avg_spend: f64,
    pub clv: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HiddenGem {
    pub customer_id: CustomerId,
    pub frequency: VisitCount,
    pub avg_spend: f64,
    pub total_spend: f64,
    /// What-if value had the customer visited monthly.
    pub projected_clv_if_regular: f64,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClvEstimate {
    pub per_customer_clv: Vec<CustomerClv>,
    pub mean_clv: f64,
    pub total_clv: f64,
    pub top_decile_mean_clv: f64,
    pub hidden_gems: Vec<HiddenGem>,
    pub n_repeat_customers: usize,
}

/// Serializes flat with a `success` flag: `{"success": false, "message", ..}`
/// or `{"success": true, "per_customer_clv", ..}`.
#[derive(Debug, Clone)]
pub enum ClvOutcome {
    Insufficient {
        message: String,
        n_repeat_customers: usize,
    },
    Estimated(ClvEstimate),
}

impl ClvOutcome {
    pub fn success(&self) -> bool {
        matches!(self, ClvOutcome::Estimated(_))
    }

    pub fn estimate(&self) -> Option<&ClvEstimate> {
        match self {
            ClvOutcome::Estimated(e) => Some(e),
            ClvOutcome::Insufficient { .. } => None,
        }
    }
}

impl Serialize for ClvOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ClvOutcome::Insufficient {
                message,
                n_repeat_customers,
            } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("message", message)?;
                map.serialize_entry("n_repeat_customers", n_repeat_customers)?;
                map.end()
            }
            ClvOutcome::Estimated(e) => {
                let mut map = serializer.serialize_map(Some(7))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("per_customer_clv", &e.per_customer_clv)?;
                map.serialize_entry("mean_clv", &e.mean_clv)?;
                map.serialize_entry("total_clv", &e.total_clv)?;
                map.serialize_entry("top_decile_mean_clv", &e.top_decile_mean_clv)?;
                map.serialize_entry("hidden_gems", &e.hidden_gems)?;
                map.serialize_entry("n_repeat_customers", &e.n_repeat_customers)?;
                map.end()
            }
        }
    }
}

pub struct ValueModel {
    config: ValueModelConfig,
}

impl ValueModel {
    pub fn new(config: ValueModelConfig) -> Self {
        Self { config }
    }

    pub fn estimate(&self, customers: &[CustomerAggregate]) -> ClvOutcome {
        let cfg = &self.config;
        let repeat: Vec<&CustomerAggregate> =
            customers.iter().filter(|c| c.frequency >= 2).collect();

        if repeat.len() < cfg.min_repeat_customers {
            log::info!(
                "value_model: {} repeat customers, need {}",
                repeat.len(),
                cfg.min_repeat_customers
            );
            return ClvOutcome::Insufficient {
                message: format!(
                    "Need at least {} repeat customers for CLV analysis",
                    cfg.min_repeat_customers
                ),
                n_repeat_customers: repeat.len(),
            };
        }

        let per_customer_clv: Vec<CustomerClv> = repeat
            .iter()
            .map(|c| CustomerClv {
                customer_id: c.customer_id.clone(),
                frequency: c.frequency,
                avg_spend: c.avg_spend,
                clv: c.avg_spend * c.frequency as f64 * cfg.growth_factor,
            })
            .collect();

        let n = per_customer_clv.len();
        let total_clv: f64 = per_customer_clv.iter().map(|c| c.clv).sum();
        let mean_clv = if n > 0 { total_clv / n as f64 } else { 0.0 };
        let top_decile_mean_clv = top_mean(&per_customer_clv, cfg.top_fraction);
        let hidden_gems = self.hidden_gems(customers);

        log::info!(
            "value_model: {n} repeat customers, mean_clv={mean_clv:.2} total_clv={total_clv:.2} gems={}",
            hidden_gems.len()
        );

        ClvOutcome::Estimated(ClvEstimate {
            per_customer_clv,
            mean_clv,
            total_clv,
            top_decile_mean_clv,
            hidden_gems,
            n_repeat_customers: n,
        })
    }

    /// Low-frequency customers who spend above the population median per
    /// visit, highest spenders first.
    pub fn hidden_gems(&self, customers: &[CustomerAggregate]) -> Vec<HiddenGem> {
        let cfg = &self.config;
        let Some(median_spend) = median(customers.iter().map(|c| c.avg_spend).collect()) else {
            return Vec::new();
        };

        let mut gems: Vec<&CustomerAggregate> = customers
            .iter()
            .filter(|c| c.frequency <= cfg.hidden_gem_max_frequency && c.avg_spend > median_spend)
            .collect();
        gems.sort_by(|a, b| b.avg_spend.total_cmp(&a.avg_spend));

        gems.into_iter()
            .take(cfg.hidden_gem_limit)
            .map(|c| HiddenGem {
                customer_id: c.customer_id.clone(),
                frequency: c.frequency,
                avg_spend: c.avg_spend,
                total_spend: c.total_spend,
                projected_clv_if_regular: c.avg_spend * cfg.projection_visits,
                email: c.email.clone(),
                phone: c.phone.clone(),
            })
            .collect()
    }
}

/// Mean CLV of the top `fraction` of customers, at least one customer.
fn top_mean(clvs: &[CustomerClv], fraction: f64) -> f64 {
    if clvs.is_empty() {
        return 0.0;
    }
    let k = ((clvs.len() as f64 * fraction).floor() as usize).clamp(1, clvs.len());
    let mut values: Vec<f64> = clvs.iter().map(|c| c.clv).collect();
    values.sort_by(|a, b| b.total_cmp(a));
    values[..k].iter().sum::<f64>() / k as f64
}

/// Median with the midpoint rule for even lengths.
pub fn median(mut values: Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}
