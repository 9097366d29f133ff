//! Shared primitive types used across the estimation core.

use chrono::NaiveDateTime;

/// Stable customer identifier (the client name in appointment exports).
pub type CustomerId = String;

/// Local wall-clock timestamp of an appointment.
pub type Timestamp = NaiveDateTime;

/// A visit count. Always ≥ 1 for an aggregated customer.
pub type VisitCount = u32;
