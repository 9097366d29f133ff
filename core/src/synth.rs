//! Synthetic appointment exports for demos and tests.
//!
//! Each potential customer draws a visit rate λ ~ Gamma(r, alpha) and a
//! visit count ~ Poisson(λ), which is exactly the NBD the frequency model
//! assumes. Customers who draw zero visits never appear in the export:
//! they are the unseen market the model should recover.

use crate::{
    config::PricingConfig,
    ingest::{RawAppointment, ACCEPTED_STATUS, START_FORMAT},
    rng::{RngStream, SeededRng},
    types::Timestamp,
};
use chrono::Duration;

const NON_ACCEPTED: [&str; 3] = ["cancelled", "no_show", "declined"];

#[derive(Debug, Clone)]
pub struct SynthParams {
    pub seed: u64,
    /// Potential customers, including those who will never visit.
    pub customers: usize,
    pub r: f64,
    pub alpha: f64,
    pub window_days: i64,
    /// Latest possible appointment time.
    pub end: Timestamp,
    /// Probability an extra non-accepted row is emitted per visit.
    pub cancel_rate: f64,
}

/// Generate raw rows. Identical params always yield identical rows.
pub fn generate(params: &SynthParams, pricing: &PricingConfig) -> Vec<RawAppointment> {
    let mut population = SeededRng::new(params.seed, RngStream::Population);
    let mut visits = SeededRng::new(params.seed, RngStream::Visits);
    let mut services = SeededRng::new(params.seed, RngStream::Services);
    let mut status = SeededRng::new(params.seed, RngStream::Status);

    let window_secs = (params.window_days.max(1) * 86_400) as u64;
    let mut rows = Vec::new();
    let mut unseen = 0usize;

    for i in 0..params.customers {
        let rate = population.gamma(params.r, params.alpha);
        let count = visits.poisson(rate);
        if count == 0 {
            unseen += 1;
            continue;
        }

        let client_name = format!("client-{i:05}");
        let email = format!("client{i:05}@example.com");
        let phone = format!("+1555{:07}", i);

        for _ in 0..count {
            let offset = visits.next_u64_below(window_secs) as i64;
            let start = params.end - Duration::seconds(offset);
            let service = if pricing.services.is_empty() {
                None
            } else {
                let idx = services.next_u64_below(pricing.services.len() as u64) as usize;
                Some(pricing.services[idx].keyword.clone())
            };

            let row = RawAppointment {
                client_name: client_name.clone(),
                start: start.format(START_FORMAT).to_string(),
                status: ACCEPTED_STATUS.into(),
                service,
                estimated_total_price: None,
                email: Some(email.clone()),
                phone: Some(phone.clone()),
            };

            if status.chance(params.cancel_rate) {
                let pick = status.next_u64_below(NON_ACCEPTED.len() as u64) as usize;
                rows.push(RawAppointment {
                    status: NON_ACCEPTED[pick].into(),
                    ..row.clone()
                });
            }
            rows.push(row);
        }
    }

    log::debug!(
        "synth: {} rows from {} potential customers ({} unseen)",
        rows.len(),
        params.customers,
        unseen,
    );
    rows
}
