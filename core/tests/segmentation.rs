use bizpulse_core::{
    aggregation::CustomerAggregate,
    config::UpgradeConfig,
    segmentation::{
        assign_segments, segment_summary, upgrade_candidates, upgrade_value, Segment,
    },
};
use chrono::NaiveDate;

// ── Helpers ──────────────────────────────────────────────────────────────────

fn customer(id: &str, frequency: u32, total_spend: f64) -> CustomerAggregate {
    let ts = NaiveDate::from_ymd_opt(2024, 5, 1)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap();
    CustomerAggregate {
        customer_id: id.into(),
        frequency,
        recency: ts,
        first_visit: ts,
        total_spend,
        avg_spend: total_spend / frequency.max(1) as f64,
        days_since_visit: 0,
        email: None,
        phone: None,
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn tier_boundaries() {
    assert_eq!(Segment::for_frequency(1), Segment::Explorer);
    assert_eq!(Segment::for_frequency(2), Segment::Explorer);
    assert_eq!(Segment::for_frequency(3), Segment::Casual);
    assert_eq!(Segment::for_frequency(8), Segment::Casual);
    assert_eq!(Segment::for_frequency(9), Segment::Regular);
    assert_eq!(Segment::for_frequency(12), Segment::Regular);
    assert_eq!(Segment::for_frequency(13), Segment::Superuser);
    assert_eq!(Segment::for_frequency(10_000), Segment::Superuser);
}

/// Frequency 0 cannot come out of aggregation, but must not panic.
#[test]
fn zero_visits_fall_back_to_explorer() {
    assert_eq!(Segment::for_frequency(0), Segment::Explorer);
}

/// Every frequency lands in exactly one tier, and tiers never go down
/// as frequency goes up.
#[test]
fn tiers_partition_and_are_monotonic() {
    let mut previous = Segment::Explorer;
    for f in 1..=200u32 {
        let seg = Segment::for_frequency(f);
        let containing: Vec<Segment> = Segment::ALL
            .iter()
            .copied()
            .filter(|s| {
                let (lo, hi) = s.bounds();
                f >= lo && hi.map_or(true, |h| f <= h)
            })
            .collect();
        assert_eq!(containing, vec![seg], "frequency {f}");
        assert!(seg >= previous, "tier dropped at frequency {f}");
        previous = seg;
    }
}

#[test]
fn twelve_customer_scenario_counts() {
    let freqs = [1, 1, 1, 2, 2, 3, 4, 5, 9, 10, 13, 15];
    let customers: Vec<CustomerAggregate> = freqs
        .iter()
        .enumerate()
        .map(|(i, &f)| customer(&format!("c{i}"), f, 50.0 * f as f64))
        .collect();

    let segmented = assign_segments(&customers);
    let count = |s: Segment| segmented.iter().filter(|c| c.segment == s).count();

    assert_eq!(count(Segment::Explorer), 5);
    assert_eq!(count(Segment::Casual), 3);
    assert_eq!(count(Segment::Regular), 2);
    assert_eq!(count(Segment::Superuser), 2);
    assert_eq!(segmented.len(), 12);
}

#[test]
fn summary_is_in_tier_order_and_skips_empty_tiers() {
    let customers = vec![
        customer("a", 14, 1400.0),
        customer("b", 1, 80.0),
        customer("c", 2, 120.0),
    ];
    let summary = segment_summary(&customers);

    let order: Vec<Segment> = summary.iter().map(|s| s.segment).collect();
    assert_eq!(order, vec![Segment::Explorer, Segment::Superuser]);

    let explorers = &summary[0];
    assert_eq!(explorers.customer_count, 2);
    assert!((explorers.total_revenue - 200.0).abs() < 1e-9);
    assert!((explorers.avg_revenue - 100.0).abs() < 1e-9);
    assert!((explorers.avg_frequency - 1.5).abs() < 1e-9);
}

#[test]
fn upgrade_candidates_are_casuals_near_regular() {
    let customers = vec![
        customer("five", 5, 400.0),
        customer("six", 6, 500.0),
        customer("eight", 8, 700.0),
        customer("seven", 7, 600.0),
        customer("regular", 10, 900.0),
    ];
    let picks = upgrade_candidates(&customers, &UpgradeConfig::default());

    let ids: Vec<&str> = picks.iter().map(|p| p.customer_id.as_str()).collect();
    assert_eq!(ids, vec!["eight", "seven", "six"]);
    assert_eq!(picks[0].visits_to_next_tier, 1);
    assert_eq!(picks[2].visits_to_next_tier, 3);
}

#[test]
fn upgrade_candidates_respect_limit() {
    let customers: Vec<CustomerAggregate> =
        (0..25).map(|i| customer(&format!("c{i}"), 7, 300.0)).collect();
    let cfg = UpgradeConfig {
        limit: 4,
        ..UpgradeConfig::default()
    };
    assert_eq!(upgrade_candidates(&customers, &cfg).len(), 4);
}

#[test]
fn upgrade_value_is_gap_between_tier_means() {
    let customers = vec![
        customer("c1", 4, 200.0),
        customer("c2", 5, 400.0),
        customer("r1", 10, 1000.0),
    ];
    assert!((upgrade_value(&customers) - 700.0).abs() < 1e-9);

    let no_regulars = vec![customer("c1", 4, 200.0)];
    assert_eq!(upgrade_value(&no_regulars), 0.0);
}
