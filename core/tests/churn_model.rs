use bizpulse_core::{
    aggregation::CustomerAggregate,
    churn_model::{ChurnModel, RiskLevel},
    config::ChurnModelConfig,
};
use chrono::NaiveDate;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn customer(
    id: &str,
    frequency: u32,
    days_since_visit: i64,
    total_spend: f64,
) -> CustomerAggregate {
    let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(9, 0, 0)
        .unwrap();
    CustomerAggregate {
        customer_id: id.into(),
        frequency,
        recency: ts,
        first_visit: ts,
        total_spend,
        avg_spend: total_spend / frequency.max(1) as f64,
        days_since_visit,
        email: None,
        phone: Some("+15550000000".into()),
    }
}

fn model() -> ChurnModel {
    ChurnModel::new(ChurnModelConfig::default())
}

fn three_customers() -> Vec<CustomerAggregate> {
    vec![
        customer("loyal", 10, 0, 1_000.0),
        customer("drifting", 5, 50, 400.0),
        customer("gone", 1, 100, 250.0),
    ]
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn scores_follow_weighted_formula() {
    let scores = model().score(&three_customers());

    assert_eq!(scores[0].p_churn, 0.0);
    assert_eq!(scores[0].risk_level, RiskLevel::Low);

    // 0.7 · 0.5 + 0.3 · 0.5
    assert!((scores[1].p_churn - 0.5).abs() < 1e-12);
    assert_eq!(scores[1].risk_level, RiskLevel::Medium);

    // 0.7 · 1.0 + 0.3 · 0.9
    assert!((scores[2].p_churn - 0.97).abs() < 1e-12);
    assert_eq!(scores[2].risk_level, RiskLevel::High);
}

#[test]
fn summary_counts_and_revenue_at_risk() {
    let summary = model().summarize(&three_customers());
    assert_eq!(
        (summary.high_risk_count, summary.medium_risk_count, summary.low_risk_count),
        (1, 1, 1)
    );
    assert!((summary.revenue_at_risk - 250.0 * 0.8).abs() < 1e-9);
    assert!((summary.still_active_fraction - 1.0 / 3.0).abs() < 1e-12);
    assert_eq!(summary.high_risk_customers.len(), 1);
    assert_eq!(summary.high_risk_customers[0].customer_id, "gone");
}

#[test]
fn everyone_seen_today_only_frequency_matters() {
    let customers = vec![
        customer("top", 8, 0, 100.0),
        customer("mid", 4, 0, 100.0),
        customer("low", 1, 0, 100.0),
    ];
    let scores = model().score(&customers);

    assert!(scores.iter().all(|s| s.recency_score == 0.0));
    assert_eq!(scores[0].p_churn, 0.0);
    assert!((scores[1].p_churn - 0.3 * 0.5).abs() < 1e-12);
    // Frequency alone can never exceed its weight.
    assert!(scores.iter().all(|s| s.p_churn <= 0.3 + 1e-12));
}

#[test]
fn rescaling_days_leaves_scores_unchanged() {
    let base = three_customers();
    let tripled: Vec<CustomerAggregate> = base
        .iter()
        .cloned()
        .map(|mut c| {
            c.days_since_visit *= 3;
            c
        })
        .collect();

    let a = model().score(&base);
    let b = model().score(&tripled);
    for (x, y) in a.iter().zip(&b) {
        assert!((x.p_churn - y.p_churn).abs() < 1e-12);
        assert_eq!(x.risk_level, y.risk_level);
    }
}

#[test]
fn equal_frequencies_give_zero_frequency_term() {
    let customers = vec![customer("a", 3, 10, 90.0), customer("b", 3, 40, 90.0)];
    let scores = model().score(&customers);
    assert!(scores.iter().all(|s| s.frequency_score == 0.0));
    assert!((scores[1].p_churn - 0.7).abs() < 1e-12);
    assert_eq!(scores[1].risk_level, RiskLevel::High);
}

#[test]
fn single_customer_scores_on_recency_alone() {
    let scores = model().score(&[customer("solo", 1, 200, 50.0)]);
    assert_eq!(scores[0].recency_score, 1.0);
    assert_eq!(scores[0].frequency_score, 0.0);
    assert!((scores[0].p_churn - 0.7).abs() < 1e-12);
}

#[test]
fn band_thresholds_are_inclusive() {
    let m = model();
    assert_eq!(m.classify(0.70), RiskLevel::High);
    assert_eq!(m.classify(0.6999), RiskLevel::Medium);
    assert_eq!(m.classify(0.40), RiskLevel::Medium);
    assert_eq!(m.classify(0.3999), RiskLevel::Low);
}

#[test]
fn scoring_is_deterministic() {
    let customers = three_customers();
    assert_eq!(model().score(&customers), model().score(&customers));
}

#[test]
fn contacts_carried_through() {
    let scores = model().score(&three_customers());
    assert_eq!(scores[2].phone.as_deref(), Some("+15550000000"));
    assert_eq!(scores[2].email, None);
}

#[test]
fn empty_population() {
    let summary = model().summarize(&[]);
    assert!(summary.per_customer.is_empty());
    assert_eq!(summary.revenue_at_risk, 0.0);
    assert_eq!(summary.still_active_fraction, 0.0);
}
