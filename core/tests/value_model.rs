use bizpulse_core::{
    aggregation::CustomerAggregate,
    config::ValueModelConfig,
    value_model::{median, ClvOutcome, ValueModel},
};
use chrono::NaiveDate;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn customer(id: &str, frequency: u32, avg_spend: f64) -> CustomerAggregate {
    let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    CustomerAggregate {
        customer_id: id.into(),
        frequency,
        recency: ts,
        first_visit: ts,
        total_spend: avg_spend * frequency as f64,
        avg_spend,
        days_since_visit: 0,
        email: Some(format!("{id}@example.com")),
        phone: None,
    }
}

fn repeat_population(n: usize) -> Vec<CustomerAggregate> {
    (0..n)
        .map(|i| customer(&format!("r{i:02}"), 2 + (i % 5) as u32, 40.0 + i as f64))
        .collect()
}

fn model() -> ValueModel {
    ValueModel::new(ValueModelConfig::default())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn nine_repeat_customers_is_insufficient() {
    let mut customers = repeat_population(9);
    customers.extend((0..30).map(|i| customer(&format!("once{i}"), 1, 80.0)));

    match model().estimate(&customers) {
        ClvOutcome::Insufficient {
            message,
            n_repeat_customers,
        } => {
            assert_eq!(n_repeat_customers, 9);
            assert!(message.contains("10"));
        }
        ClvOutcome::Estimated(_) => panic!("9 repeat customers must not be enough"),
    }
}

#[test]
fn ten_repeat_customers_is_enough() {
    let outcome = model().estimate(&repeat_population(10));
    assert!(outcome.success());
    assert_eq!(outcome.estimate().unwrap().n_repeat_customers, 10);
}

#[test]
fn single_one_visit_customer_is_insufficient() {
    let outcome = model().estimate(&[customer("solo", 1, 100.0)]);
    assert!(!outcome.success());
}

#[test]
fn empty_population_is_insufficient() {
    assert!(!model().estimate(&[]).success());
}

#[test]
fn clv_is_spend_times_visits_times_growth() {
    let customers = repeat_population(12);
    let outcome = model().estimate(&customers);
    let est = outcome.estimate().unwrap();

    for c in &est.per_customer_clv {
        let expected = c.avg_spend * c.frequency as f64 * 1.2;
        assert!((c.clv - expected).abs() < 1e-9);
    }
    let total: f64 = est.per_customer_clv.iter().map(|c| c.clv).sum();
    assert!((est.total_clv - total).abs() < 1e-9);
    assert!((est.mean_clv - total / 12.0).abs() < 1e-9);
}

#[test]
fn one_visit_customers_get_no_clv() {
    let mut customers = repeat_population(10);
    customers.push(customer("once", 1, 500.0));
    let outcome = model().estimate(&customers);
    let est = outcome.estimate().unwrap();
    assert!(est.per_customer_clv.iter().all(|c| c.customer_id != "once"));
}

/// 25 repeat customers → top 10% is the top 2.
#[test]
fn top_decile_mean_uses_floor_of_ten_percent() {
    let customers: Vec<CustomerAggregate> = (0..25)
        .map(|i| customer(&format!("c{i:02}"), 2, 10.0 * (i + 1) as f64))
        .collect();
    let outcome = model().estimate(&customers);
    let est = outcome.estimate().unwrap();
    // Top two avg_spend are 250 and 240 → CLV 600 and 576.
    assert!((est.top_decile_mean_clv - 588.0).abs() < 1e-9);
}

/// Fewer than 10 eligible rows would floor to zero; at least one is used.
#[test]
fn top_decile_takes_at_least_one_customer() {
    let cfg = ValueModelConfig {
        min_repeat_customers: 3,
        ..ValueModelConfig::default()
    };
    let customers = vec![
        customer("a", 2, 10.0),
        customer("b", 2, 30.0),
        customer("c", 2, 20.0),
    ];
    let outcome = ValueModel::new(cfg).estimate(&customers);
    let est = outcome.estimate().unwrap();
    assert!((est.top_decile_mean_clv - 72.0).abs() < 1e-9);
}

#[test]
fn hidden_gems_are_low_frequency_high_spenders() {
    let mut customers = repeat_population(10);
    customers.push(customer("gem-big", 1, 400.0));
    customers.push(customer("gem-small", 3, 300.0));
    customers.push(customer("frequent-big", 9, 500.0));
    customers.push(customer("cheap", 1, 5.0));

    let outcome = model().estimate(&customers);
    let gems = &outcome.estimate().unwrap().hidden_gems;

    let ids: Vec<&str> = gems.iter().map(|g| g.customer_id.as_str()).collect();
    assert_eq!(&ids[..2], &["gem-big", "gem-small"]);
    assert!(!ids.contains(&"frequent-big"));
    assert!(!ids.contains(&"cheap"));
    assert!((gems[0].projected_clv_if_regular - 400.0 * 12.0).abs() < 1e-9);
    assert_eq!(gems[0].email.as_deref(), Some("gem-big@example.com"));

    let median_spend = median(customers.iter().map(|c| c.avg_spend).collect()).unwrap();
    assert!(gems.iter().all(|g| g.frequency <= 4 && g.avg_spend > median_spend));
    assert!(gems.windows(2).all(|w| w[0].avg_spend >= w[1].avg_spend));
}

#[test]
fn hidden_gems_capped_at_ten() {
    let mut customers = repeat_population(10);
    customers.extend((0..30).map(|i| customer(&format!("g{i:02}"), 1, 1_000.0 + i as f64)));
    let outcome = model().estimate(&customers);
    assert_eq!(outcome.estimate().unwrap().hidden_gems.len(), 10);
}

#[test]
fn median_midpoint_for_even_lengths() {
    assert_eq!(median(vec![4.0, 1.0, 3.0, 2.0]), Some(2.5));
    assert_eq!(median(vec![5.0, 1.0, 3.0]), Some(3.0));
    assert_eq!(median(vec![]), None);
}

#[test]
fn insufficient_outcome_serializes_with_success_false() {
    let outcome = model().estimate(&[customer("solo", 1, 100.0)]);
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["success"], false);
    assert_eq!(json["n_repeat_customers"], 0);
    assert!(json["message"].as_str().unwrap().contains("10"));
    assert!(json.get("per_customer_clv").is_none());
}

#[test]
fn estimated_outcome_serializes_flat_with_success_true() {
    let outcome = model().estimate(&repeat_population(12));
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["n_repeat_customers"], 12);
    assert_eq!(json["per_customer_clv"].as_array().unwrap().len(), 12);
    for key in ["mean_clv", "total_clv", "top_decile_mean_clv", "hidden_gems"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
    assert!(json.get("status").is_none());
}
