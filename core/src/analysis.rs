//! Analysis runner — one end-to-end recomputation per call.
//!
//! EXECUTION ORDER (fixed):
//!   1. Aggregation         (transactions → customers, once)
//!   2. Segmentation        (+ summary, upgrade candidates)
//!   3. Frequency model
//!   4. Value model
//!   5. Churn model
//!   6. Retention overview
//!   7. Health score
//!
//! RULES:
//!   - Steps 2–7 all read the same immutable snapshot.
//!   - No step reads another step's output.
//!   - An insufficient-data result in one step never blocks another.
//!   - Nothing is cached: a new window means a new run.

use crate::{
    aggregation::{aggregate, DateWindow},
    churn_model::{ChurnModel, ChurnSummary},
    component::{AnalysisComponent, Snapshot},
    config::AnalysisConfig,
    frequency_model::{FrequencyFit, FrequencyModel},
    health::{health_score, HealthScore},
    ingest::Transaction,
    retention::{retention_overview, RetentionOverview},
    segmentation::{
        assign_segments, segment_summary, upgrade_candidates, upgrade_value, SegmentSummary,
        SegmentedCustomer, UpgradeCandidate,
    },
    types::Timestamp,
    value_model::{ClvOutcome, ValueModel},
};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub as_of: Timestamp,
    pub window: DateWindow,
    pub customers: Vec<SegmentedCustomer>,
    pub segment_summary: Vec<SegmentSummary>,
    pub upgrade_candidates: Vec<UpgradeCandidate>,
    pub upgrade_value_per_customer: f64,
    pub frequency: FrequencyFit,
    pub clv: ClvOutcome,
    pub churn: ChurnSummary,
    pub retention: RetentionOverview,
    pub health: HealthScore,
}

pub struct Analysis {
    config: AnalysisConfig,
    frequency: FrequencyModel,
    value: ValueModel,
    churn: ChurnModel,
}

impl Analysis {
    pub fn new(config: AnalysisConfig) -> Self {
        Self {
            frequency: FrequencyModel::new(config.frequency_model.clone()),
            value: ValueModel::new(config.value_model.clone()),
            churn: ChurnModel::new(config.churn_model.clone()),
            config,
        }
    }

    /// Aggregate `transactions` within `window` as of `as_of`, then run
    /// every component on the result.
    pub fn run(
        &self,
        transactions: &[Transaction],
        window: &DateWindow,
        as_of: Timestamp,
    ) -> AnalysisReport {
        let customers = aggregate(transactions, window, as_of);
        let snapshot = Snapshot {
            customers: &customers,
            transactions,
        };

        let frequency = run_component(&self.frequency, &snapshot);
        let clv = run_component(&self.value, &snapshot);
        let churn = run_component(&self.churn, &snapshot);

        let report = AnalysisReport {
            as_of,
            window: *window,
            customers: assign_segments(&customers),
            segment_summary: segment_summary(&customers),
            upgrade_candidates: upgrade_candidates(&customers, &self.config.upgrades),
            upgrade_value_per_customer: upgrade_value(&customers),
            frequency,
            clv,
            churn,
            retention: retention_overview(&customers, &self.config.retention),
            health: health_score(&customers, transactions, &self.config.health),
        };

        log::info!(
            "analysis: {} customers, health={} clv_success={}",
            customers.len(),
            report.health.score,
            report.clv.success(),
        );
        report
    }

    /// Same as [`Analysis::run`] but measured against the local wall clock.
    pub fn run_now(&self, transactions: &[Transaction], window: &DateWindow) -> AnalysisReport {
        self.run(transactions, window, chrono::Local::now().naive_local())
    }
}

fn run_component<C: AnalysisComponent>(component: &C, snapshot: &Snapshot<'_>) -> C::Output {
    log::debug!(
        "{}: running on {} customers",
        component.name(),
        snapshot.customers.len()
    );
    component.run(snapshot)
}
