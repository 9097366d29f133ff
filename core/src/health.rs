//! Business health score — a 0–100 headline built from four capped parts.
//!
//!   retention  share of customers seen in the last 60 days      (≤ 30)
//!   loyalty    share of Regulars and Superusers                 (≤ 25)
//!   growth     share of customers new in the last 90 days       (≤ 25)
//!   value      mean total spend relative to a reference spend   (≤ 20)

use crate::{
    aggregation::CustomerAggregate,
    config::HealthConfig,
    ingest::Transaction,
    segmentation::Segment,
};
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthBand {
    Strong,
    Stable,
    AtRisk,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: u32,
    pub band: HealthBand,
    pub retention_component: f64,
    pub loyalty_component: f64,
    pub growth_component: f64,
    pub value_component: f64,
}

/// Score `customers`. Growth is measured over the full `transactions`
/// history so a customer's first-ever visit counts, not their first visit
/// inside the analysis window.
pub fn health_score(
    customers: &[CustomerAggregate],
    transactions: &[Transaction],
    config: &HealthConfig,
) -> HealthScore {
    let n = customers.len();
    let share = |count: usize| if n > 0 { count as f64 / n as f64 } else { 0.0 };

    let active = customers
        .iter()
        .filter(|c| c.days_since_visit <= config.active_days)
        .count();
    let retention_component = (share(active) * 100.0).min(config.retention_cap);

    let loyal = customers
        .iter()
        .filter(|c| Segment::for_frequency(c.frequency).is_loyal())
        .count();
    let loyalty_component =
        (share(loyal) * 100.0 * config.loyalty_multiplier).min(config.loyalty_cap);

    let growth_component = match transactions.iter().map(|t| t.timestamp).max() {
        Some(latest) => {
            let cutoff = latest - Duration::days(config.new_customer_days);
            let mut first_seen: HashMap<&str, chrono::NaiveDateTime> = HashMap::new();
            for t in transactions {
                first_seen
                    .entry(t.customer_id.as_str())
                    .and_modify(|ts| *ts = (*ts).min(t.timestamp))
                    .or_insert(t.timestamp);
            }
            let new_customers = first_seen.values().filter(|&&ts| ts >= cutoff).count();
            (share(new_customers) * 100.0 * config.growth_multiplier).min(config.growth_cap)
        }
        None => config.growth_neutral,
    };

    let mean_spend = if n > 0 {
        customers.iter().map(|c| c.total_spend).sum::<f64>() / n as f64
    } else {
        0.0
    };
    let value_component =
        (mean_spend / config.value_reference_spend * 10.0).min(config.value_cap);

    let total = retention_component + loyalty_component + growth_component + value_component;
    let score = total.clamp(0.0, 100.0) as u32;
    let band = if score >= config.strong_at {
        HealthBand::Strong
    } else if score >= config.stable_at {
        HealthBand::Stable
    } else {
        HealthBand::AtRisk
    };

    log::debug!(
        "health: score={score} (retention={retention_component:.1} loyalty={loyalty_component:.1} growth={growth_component:.1} value={value_component:.1})"
    );

    HealthScore {
        score,
        band,
        retention_component,
        loyalty_component,
        growth_component,
        value_component,
    }
}
