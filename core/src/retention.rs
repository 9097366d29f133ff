//! Retention overview — who is overdue, and what that is worth.

use crate::{
    aggregation::CustomerAggregate,
    config::RetentionConfig,
    segmentation::Segment,
    types::CustomerId,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OverdueCustomer {
    pub customer_id: CustomerId,
    pub segment: Segment,
    pub days_since_visit: i64,
    pub total_spend: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionOverview {
    /// Customers overdue by more than each configured threshold, ascending.
    pub overdue_counts: [(i64, usize); 3],
    /// Casual-or-better customers past the first threshold, biggest spend first.
    pub valuable_at_risk: Vec<OverdueCustomer>,
    pub valuable_value_at_risk: f64,
    pub regular_retention: f64,
}

pub fn retention_overview(
    customers: &[CustomerAggregate],
    config: &RetentionConfig,
) -> RetentionOverview {
    let overdue_counts = config.overdue_days.map(|days| {
        (
            days,
            customers.iter().filter(|c| c.days_since_visit > days).count(),
        )
    });

    let first_threshold = config.overdue_days[0];
    let mut valuable_at_risk: Vec<OverdueCustomer> = customers
        .iter()
        .filter(|c| c.days_since_visit > first_threshold)
        .map(|c| OverdueCustomer {
            customer_id: c.customer_id.clone(),
            segment: Segment::for_frequency(c.frequency),
            days_since_visit: c.days_since_visit,
            total_spend: c.total_spend,
        })
        .filter(|o| o.segment >= Segment::Casual)
        .collect();
    valuable_at_risk.sort_by(|a, b| b.total_spend.total_cmp(&a.total_spend));

    let valuable_value_at_risk = valuable_at_risk.iter().map(|o| o.total_spend).sum::<f64>()
        * config.valuable_exposure;

    let regulars: Vec<&CustomerAggregate> = customers
        .iter()
        .filter(|c| Segment::for_frequency(c.frequency) == Segment::Regular)
        .collect();
    let regular_retention = if regulars.is_empty() {
        0.0
    } else {
        regulars
            .iter()
            .filter(|c| c.days_since_visit <= config.regular_active_days)
            .count() as f64
            / regulars.len() as f64
    };

    RetentionOverview {
        overdue_counts,
        valuable_at_risk,
        valuable_value_at_risk,
        regular_retention,
    }
}
