//! Component trait and the snapshot every component reads.
//!
//! RULE: Every estimator implements AnalysisComponent.
//! A component reads ONLY the snapshot it is handed. It never sees
//! another component's output and keeps no state between calls, so any
//! component can be re-run against a differently filtered aggregate
//! without resetting anything.

use crate::{
    aggregation::CustomerAggregate, churn_model::ChurnModel, churn_model::ChurnSummary,
    frequency_model::FrequencyFit, frequency_model::FrequencyModel, ingest::Transaction,
    value_model::ClvOutcome, value_model::ValueModel,
};

/// Immutable input shared by all components in one analysis run.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot<'a> {
    /// Aggregated customers for the selected window.
    pub customers: &'a [CustomerAggregate],
    /// Full accepted transaction history, unfiltered.
    pub transactions: &'a [Transaction],
}

/// The contract every estimator fulfils.
pub trait AnalysisComponent {
    type Output;

    /// Unique stable name, used as the log prefix.
    fn name(&self) -> &'static str;

    /// Pure function of the snapshot.
    fn run(&self, snapshot: &Snapshot<'_>) -> Self::Output;
}

impl AnalysisComponent for FrequencyModel {
    type Output = FrequencyFit;

    fn name(&self) -> &'static str {
        "frequency_model"
    }

    fn run(&self, snapshot: &Snapshot<'_>) -> FrequencyFit {
        self.fit(snapshot.customers)
    }
}

impl AnalysisComponent for ValueModel {
    type Output = ClvOutcome;

    fn name(&self) -> &'static str {
        "value_model"
    }

    fn run(&self, snapshot: &Snapshot<'_>) -> ClvOutcome {
        self.estimate(snapshot.customers)
    }
}

impl AnalysisComponent for ChurnModel {
    type Output = ChurnSummary;

    fn name(&self) -> &'static str {
        "churn_model"
    }

    fn run(&self, snapshot: &Snapshot<'_>) -> ChurnSummary {
        self.summarize(snapshot.customers)
    }
}
