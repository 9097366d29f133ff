//! Ingestion — turns raw appointment rows into validated transactions.
//!
//! This is the only place malformed input is rejected. Everything
//! downstream assumes a clean, accepted-only transaction set.
//!
//! RULES:
//!   - Only rows with status `accepted` survive.
//!   - A row whose `start` cannot be parsed is dropped, not rejected.
//!   - A missing or unparseable price falls back to the keyword estimate.

use crate::{
    config::PricingConfig,
    error::{CoreError, CoreResult},
    types::{CustomerId, Timestamp},
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Columns an appointment export must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["client_name", "start", "status"];

/// Timestamp layout of the appointment export, e.g. `03-14-2024 02:30:00 PM`.
pub const START_FORMAT: &str = "%m-%d-%Y %I:%M:%S %p";

pub const ACCEPTED_STATUS: &str = "accepted";

/// One row as it arrives from the booking system export.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawAppointment {
    pub client_name: String,
    pub start: String,
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub estimated_total_price: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

/// A completed, priced visit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    pub customer_id: CustomerId,
    pub timestamp: Timestamp,
    pub value: f64,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Reject a header row that lacks any required column.
pub fn validate_columns<S: AsRef<str>>(headers: &[S]) -> CoreResult<()> {
    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|col| !headers.iter().any(|h| h.as_ref().trim() == *col))
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(CoreError::MissingColumn {
            columns: missing.join(", "),
        })
    }
}

/// Estimate a visit's price from its service description.
///
/// Every keyword found in the text contributes its price, so combined
/// services ("gel polish + nail repair") are summed.
pub fn estimate_price(service: Option<&str>, pricing: &PricingConfig) -> f64 {
    let Some(service) = service else {
        return pricing.fallback_price;
    };
    let lower = service.to_lowercase();

    let matched: Vec<f64> = pricing
        .services
        .iter()
        .filter(|s| lower.contains(&s.keyword.to_lowercase()))
        .map(|s| s.price)
        .collect();

    if matched.is_empty() {
        pricing.fallback_price
    } else {
        matched.iter().sum()
    }
}

pub fn parse_start(raw: &str) -> Option<Timestamp> {
    NaiveDateTime::parse_from_str(raw.trim(), START_FORMAT).ok()
}

/// Validate and price a batch of raw rows.
pub fn ingest(rows: &[RawAppointment], pricing: &PricingConfig) -> CoreResult<Vec<Transaction>> {
    let mut out = Vec::with_capacity(rows.len());
    let mut skipped_status = 0usize;
    let mut skipped_time = 0usize;

    for (i, row) in rows.iter().enumerate() {
        if row.status.trim() != ACCEPTED_STATUS {
            skipped_status += 1;
            continue;
        }

        let customer_id = row.client_name.trim();
        if customer_id.is_empty() {
            return Err(CoreError::InvalidField {
                row: i + 1,
                field: "client_name",
                value: row.client_name.clone(),
            });
        }

        let Some(timestamp) = parse_start(&row.start) else {
            log::warn!("ingest: row {} has unparseable start '{}', dropped", i + 1, row.start);
            skipped_time += 1;
            continue;
        };

        let value = row
            .estimated_total_price
            .as_deref()
            .and_then(|p| p.trim().parse::<f64>().ok())
            .filter(|p| p.is_finite())
            .unwrap_or_else(|| estimate_price(row.service.as_deref(), pricing));

        out.push(Transaction {
            customer_id: customer_id.to_string(),
            timestamp,
            value,
            email: non_blank(&row.email),
            phone: non_blank(&row.phone),
        });
    }

    log::info!(
        "ingest: {} accepted of {} rows ({} other status, {} bad timestamp)",
        out.len(),
        rows.len(),
        skipped_status,
        skipped_time,
    );
    Ok(out)
}

fn non_blank(field: &Option<String>) -> Option<String> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
