//! Segmentation — visit-count tiers and the summaries built on them.
//!
//! Tiers partition the positive integers:
//!   Explorer [1,2] · Casual [3,8] · Regular [9,12] · Superuser [13,∞)

use crate::{
    aggregation::CustomerAggregate,
    config::UpgradeConfig,
    types::{CustomerId, VisitCount},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Segment {
    Explorer,
    Casual,
    Regular,
    Superuser,
}

impl Segment {
    pub const ALL: [Segment; 4] = [
        Segment::Explorer,
        Segment::Casual,
        Segment::Regular,
        Segment::Superuser,
    ];

    /// Tier for a visit count. A count outside every range (only 0 is
    /// possible) falls back to `Explorer` instead of failing.
    pub fn for_frequency(frequency: VisitCount) -> Self {
        match frequency {
            1..=2 => Segment::Explorer,
            3..=8 => Segment::Casual,
            9..=12 => Segment::Regular,
            13.. => Segment::Superuser,
            0 => Segment::Explorer,
        }
    }

    /// Inclusive visit range; `None` upper bound means unbounded.
    pub fn bounds(&self) -> (VisitCount, Option<VisitCount>) {
        match self {
            Segment::Explorer => (1, Some(2)),
            Segment::Casual => (3, Some(8)),
            Segment::Regular => (9, Some(12)),
            Segment::Superuser => (13, None),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Segment::Explorer => "Explorer",
            Segment::Casual => "Casual",
            Segment::Regular => "Regular",
            Segment::Superuser => "Superuser",
        }
    }

    /// Regulars and Superusers.
    pub fn is_loyal(&self) -> bool {
        *self >= Segment::Regular
    }
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentedCustomer {
    #[serde(flatten)]
    pub customer: CustomerAggregate,
    pub segment: Segment,
}

pub fn assign_segments(customers: &[CustomerAggregate]) -> Vec<SegmentedCustomer> {
    customers
        .iter()
        .map(|c| SegmentedCustomer {
            customer: c.clone(),
            segment: Segment::for_frequency(c.frequency),
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SegmentSummary {
    pub segment: Segment,
    pub customer_count: usize,
    pub total_revenue: f64,
    pub avg_revenue: f64,
    pub avg_frequency: f64,
}

/// Per-tier totals in tier order. Empty tiers are omitted.
pub fn segment_summary(customers: &[CustomerAggregate]) -> Vec<SegmentSummary> {
    Segment::ALL
        .iter()
        .filter_map(|&segment| {
            let members: Vec<&CustomerAggregate> = customers
                .iter()
                .filter(|c| Segment::for_frequency(c.frequency) == segment)
                .collect();
            if members.is_empty() {
                return None;
            }
            let n = members.len() as f64;
            let total_revenue: f64 = members.iter().map(|c| c.total_spend).sum();
            let total_visits: f64 = members.iter().map(|c| c.frequency as f64).sum();
            Some(SegmentSummary {
                segment,
                customer_count: members.len(),
                total_revenue,
                avg_revenue: total_revenue / n,
                avg_frequency: total_visits / n,
            })
        })
        .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpgradeCandidate {
    pub customer_id: CustomerId,
    pub frequency: VisitCount,
    pub total_spend: f64,
    pub visits_to_next_tier: VisitCount,
}

/// Casuals closest to becoming Regulars, most visits first.
pub fn upgrade_candidates(
    customers: &[CustomerAggregate],
    config: &UpgradeConfig,
) -> Vec<UpgradeCandidate> {
    let regular_floor = Segment::Regular.bounds().0;

    let mut candidates: Vec<&CustomerAggregate> = customers
        .iter()
        .filter(|c| {
            Segment::for_frequency(c.frequency) == Segment::Casual
                && c.frequency >= config.min_visits
        })
        .collect();
    candidates.sort_by(|a, b| b.frequency.cmp(&a.frequency));

    candidates
        .into_iter()
        .take(config.limit)
        .map(|c| UpgradeCandidate {
            customer_id: c.customer_id.clone(),
            frequency: c.frequency,
            total_spend: c.total_spend,
            visits_to_next_tier: regular_floor.saturating_sub(c.frequency),
        })
        .collect()
}

/// Extra revenue expected from moving one Casual up to Regular: the gap
/// between the tiers' mean spend, floored at zero.
pub fn upgrade_value(customers: &[CustomerAggregate]) -> f64 {
    let mean_spend = |segment: Segment| {
        let spends: Vec<f64> = customers
            .iter()
            .filter(|c| Segment::for_frequency(c.frequency) == segment)
            .map(|c| c.total_spend)
            .collect();
        if spends.is_empty() {
            None
        } else {
            Some(spends.iter().sum::<f64>() / spends.len() as f64)
        }
    };

    match (mean_spend(Segment::Casual), mean_spend(Segment::Regular)) {
        (Some(casual), Some(regular)) => (regular - casual).max(0.0),
        _ => 0.0,
    }
}
