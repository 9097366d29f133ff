//! Aggregator — collapses transactions into one row per customer.
//!
//! The aggregate is rebuilt from scratch on every call. A different date
//! window produces an entirely new set; nothing is updated in place.
//!
//! Contact policy: `email` and `phone` take the first non-empty value in
//! the order transactions are supplied. Callers that care which contact
//! wins must order their input accordingly.

use crate::{
    ingest::Transaction,
    types::{CustomerId, Timestamp, VisitCount},
};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Inclusive timestamp window. An open side does not filter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<Timestamp>,
    pub end: Option<Timestamp>,
}

impl DateWindow {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Window from calendar dates: `start` at midnight, `end` through the
    /// last instant of that day.
    pub fn from_dates(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self {
            start: start.map(|d| d.and_time(NaiveTime::MIN)),
            end: end.and_then(|d| d.and_hms_milli_opt(23, 59, 59, 999)),
        }
    }

    pub fn contains(&self, ts: &Timestamp) -> bool {
        self.start.map_or(true, |s| *ts >= s) && self.end.map_or(true, |e| *ts <= e)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CustomerAggregate {
    pub customer_id: CustomerId,
    pub frequency: VisitCount,
    pub recency: Timestamp,
    pub first_visit: Timestamp,
    pub total_spend: f64,
    pub avg_spend: f64,
    pub days_since_visit: i64,
    pub email: Option<String>,
    pub phone: Option<String>,
}

struct Accumulator {
    frequency: VisitCount,
    recency: Timestamp,
    first_visit: Timestamp,
    total_spend: f64,
    email: Option<String>,
    phone: Option<String>,
}

/// Aggregate `transactions` inside `window`, measuring recency against `as_of`.
///
/// Customers are returned sorted by identifier. `days_since_visit` is the
/// whole number of days from `recency` to `as_of`, saturating at 0.
pub fn aggregate(
    transactions: &[Transaction],
    window: &DateWindow,
    as_of: Timestamp,
) -> Vec<CustomerAggregate> {
    let mut by_customer: BTreeMap<&str, Accumulator> = BTreeMap::new();

    for txn in transactions.iter().filter(|t| window.contains(&t.timestamp)) {
        let acc = by_customer
            .entry(txn.customer_id.as_str())
            .or_insert_with(|| Accumulator {
                frequency: 0,
                recency: txn.timestamp,
                first_visit: txn.timestamp,
                total_spend: 0.0,
                email: None,
                phone: None,
            });

        acc.frequency += 1;
        acc.recency = acc.recency.max(txn.timestamp);
        acc.first_visit = acc.first_visit.min(txn.timestamp);
        acc.total_spend += txn.value;
        if acc.email.is_none() {
            acc.email = txn.email.clone();
        }
        if acc.phone.is_none() {
            acc.phone = txn.phone.clone();
        }
    }

    let customers: Vec<CustomerAggregate> = by_customer
        .into_iter()
        .map(|(id, acc)| CustomerAggregate {
            customer_id: id.to_string(),
            frequency: acc.frequency,
            recency: acc.recency,
            first_visit: acc.first_visit,
            total_spend: acc.total_spend,
            avg_spend: acc.total_spend / acc.frequency as f64,
            days_since_visit: (as_of - acc.recency).num_days().max(0),
            email: acc.email,
            phone: acc.phone,
        })
        .collect();

    log::debug!(
        "aggregation: {} transactions -> {} customers (as_of={as_of})",
        transactions.len(),
        customers.len(),
    );
    customers
}

/// Aggregate against the local wall clock.
///
/// Results drift as real time passes; prefer [`aggregate`] with an
/// explicit reference timestamp when reproducibility matters.
pub fn aggregate_now(transactions: &[Transaction], window: &DateWindow) -> Vec<CustomerAggregate> {
    aggregate(transactions, window, chrono::Local::now().naive_local())
}
