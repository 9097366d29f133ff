//! Churn scorer — closed-form recency/frequency risk.
//!
//! p_churn = clip(w_r · days/max_days + w_f · (1 − freq/max_freq), 0, 1)
//!
//! Both terms are normalised by the population maximum, so the score is
//! relative to this business's own customers. A zero maximum zeroes the
//! term instead of dividing. No fitting, no state: the same aggregate
//! always scores the same.

use crate::{
    aggregation::CustomerAggregate,
    config::ChurnModelConfig,
    types::{CustomerId, VisitCount},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChurnScore {
    pub customer_id: CustomerId,
    pub frequency: VisitCount,
    pub days_since_visit: i64,
    pub total_spend: f64,
    pub recency_score: f64,
    pub frequency_score: f64,
    pub p_churn: f64,
    pub risk_level: RiskLevel,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurnSummary {
    pub per_customer: Vec<ChurnScore>,
    pub high_risk_count: usize,
    pub medium_risk_count: usize,
    pub low_risk_count: usize,
    pub revenue_at_risk: f64,
    pub still_active_fraction: f64,
    pub high_risk_customers: Vec<ChurnScore>,
}

pub struct ChurnModel {
    config: ChurnModelConfig,
}

impl ChurnModel {
    pub fn new(config: ChurnModelConfig) -> Self {
        Self { config }
    }

    pub fn classify(&self, p_churn: f64) -> RiskLevel {
        if p_churn >= self.config.high_risk {
            RiskLevel::High
        } else if p_churn >= self.config.medium_risk {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn score(&self, customers: &[CustomerAggregate]) -> Vec<ChurnScore> {
        let cfg = &self.config;
        let max_days = customers.iter().map(|c| c.days_since_visit).max().unwrap_or(0);
        let max_freq = customers.iter().map(|c| c.frequency).max().unwrap_or(0);

        customers
            .iter()
            .map(|c| {
                let recency_score = if max_days > 0 {
                    c.days_since_visit as f64 / max_days as f64
                } else {
                    0.0
                };
                let frequency_score = if max_freq > 0 {
                    1.0 - c.frequency as f64 / max_freq as f64
                } else {
                    0.0
                };
                let p_churn = (cfg.recency_weight * recency_score
                    + cfg.frequency_weight * frequency_score)
                    .clamp(0.0, 1.0);

                ChurnScore {
                    customer_id: c.customer_id.clone(),
                    frequency: c.frequency,
                    days_since_visit: c.days_since_visit,
                    total_spend: c.total_spend,
                    recency_score,
                    frequency_score,
                    p_churn,
                    risk_level: self.classify(p_churn),
                    email: c.email.clone(),
                    phone: c.phone.clone(),
                }
            })
            .collect()
    }

    pub fn summarize(&self, customers: &[CustomerAggregate]) -> ChurnSummary {
        let per_customer = self.score(customers);
        let count = |level: RiskLevel| {
            per_customer
                .iter()
                .filter(|s| s.risk_level == level)
                .count()
        };

        let high_risk_count = count(RiskLevel::High);
        let medium_risk_count = count(RiskLevel::Medium);
        let low_risk_count = count(RiskLevel::Low);

        let high_risk_customers: Vec<ChurnScore> = per_customer
            .iter()
            .filter(|s| s.risk_level == RiskLevel::High)
            .cloned()
            .collect();
        let revenue_at_risk = high_risk_customers.iter().map(|s| s.total_spend).sum::<f64>()
            * self.config.revenue_exposure;

        let still_active_fraction = if per_customer.is_empty() {
            0.0
        } else {
            low_risk_count as f64 / per_customer.len() as f64
        };

        log::info!(
            "churn_model: high={high_risk_count} medium={medium_risk_count} low={low_risk_count} revenue_at_risk={revenue_at_risk:.2}"
        );

        ChurnSummary {
            per_customer,
            high_risk_count,
            medium_risk_count,
            low_risk_count,
            revenue_at_risk,
            still_active_fraction,
            high_risk_customers,
        }
    }
}
