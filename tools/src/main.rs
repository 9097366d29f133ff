//! bizpulse-runner: headless analysis runner.
//!
//! Usage:
//!   bizpulse-runner --csv appointments.csv --from 2024-01-01 --to 2024-06-30
//!   bizpulse-runner --demo --seed 12345 --customers 800 --json
//!
//! Without --as-of, CSV runs measure recency against the wall clock and
//! demo runs against the end of the generated window.

use anyhow::{bail, Context, Result};
use bizpulse_core::{
    analysis::{Analysis, AnalysisReport},
    config::AnalysisConfig,
    ingest::{self, RawAppointment},
    synth::{self, SynthParams},
    value_model::ClvOutcome,
    DateWindow,
};
use chrono::{NaiveDate, NaiveTime};
use std::env;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let demo = args.iter().any(|a| a == "--demo");
    let json = args.iter().any(|a| a == "--json");
    let csv_path = arg_value(&args, "--csv");
    let seed = parse_arg(&args, "--seed", 42u64);
    let customers = parse_arg(&args, "--customers", 600usize);

    let config = match arg_value(&args, "--config") {
        Some(path) => AnalysisConfig::load(path)?,
        None => AnalysisConfig::default(),
    };

    let window = DateWindow::from_dates(
        parse_date(&args, "--from")?,
        parse_date(&args, "--to")?,
    );
    let as_of = parse_date(&args, "--as-of")?.map(|d| d.and_time(NaiveTime::MIN));

    let (rows, default_as_of) = match (csv_path, demo) {
        (Some(path), false) => (read_csv(path)?, None),
        (None, true) => {
            let end = chrono::Local::now().naive_local();
            let params = SynthParams {
                seed,
                customers,
                r: 0.8,
                alpha: 0.25,
                window_days: 365,
                end,
                cancel_rate: 0.08,
            };
            (synth::generate(&params, &config.pricing), Some(end))
        }
        _ => bail!("pass exactly one of --csv FILE or --demo"),
    };

    if !json {
        println!("BizPulse — bizpulse-runner");
        println!("  source:    {}", csv_path.unwrap_or("synthetic"));
        if demo {
            println!("  seed:      {seed}");
        }
        println!("  rows:      {}", rows.len());
        println!();
    }

    let transactions = ingest::ingest(&rows, &config.pricing)?;
    log::info!(
        "runner: {} of {} rows accepted as transactions",
        transactions.len(),
        rows.len()
    );
    let analysis = Analysis::new(config);
    let report = match as_of.or(default_as_of) {
        Some(ts) => analysis.run(&transactions, &window, ts),
        None => analysis.run_now(&transactions, &window),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&report);
    }
    Ok(())
}

fn read_csv(path: &str) -> Result<Vec<RawAppointment>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Cannot open {path}"))?;

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    ingest::validate_columns(headers.as_slice())?;

    let mut rows = Vec::new();
    for (i, record) in reader.deserialize::<RawAppointment>().enumerate() {
        let row = record.with_context(|| format!("{path}: malformed row {}", i + 1))?;
        rows.push(row);
    }
    Ok(rows)
}

fn print_summary(report: &AnalysisReport) {
    println!("=== CUSTOMERS ===");
    println!("  as of:          {}", report.as_of);
    println!("  customers:      {}", report.customers.len());
    for s in &report.segment_summary {
        println!(
            "  {:<10} {:>5} customers | revenue ${:.0} | avg visits {:.1}",
            s.segment.label(),
            s.customer_count,
            s.total_revenue,
            s.avg_frequency
        );
    }

    println!();
    println!("=== HEALTH ===");
    println!("  score:          {} ({:?})", report.health.score, report.health.band);

    let f = &report.frequency;
    println!();
    println!("=== LATENT DEMAND ===");
    println!("  r / alpha:      {:.3} / {:.3}", f.r, f.alpha);
    println!("  unseen (f0):    {:.0}", f.f0);
    println!("  market reached: {:.1}%", f.market_reached * 100.0);
    println!(
        "  fit:            {:?} (chi2 {:.2}, df {})",
        f.fit_quality_level, f.chi_square, f.degrees_of_freedom
    );
    println!("                  {}", f.fit_quality_level.description());
    println!("  heterogeneity:  {}", f.heterogeneity_level.description());

    println!();
    println!("=== LIFETIME VALUE ===");
    match &report.clv {
        ClvOutcome::Insufficient { message, .. } => println!("  ({message})"),
        ClvOutcome::Estimated(e) => {
            println!("  repeat:         {}", e.n_repeat_customers);
            println!("  mean CLV:       ${:.0}", e.mean_clv);
            println!("  top 10% CLV:    ${:.0}", e.top_decile_mean_clv);
            println!("  total CLV:      ${:.0}", e.total_clv);
            println!("  hidden gems:    {}", e.hidden_gems.len());
        }
    }

    let c = &report.churn;
    println!();
    println!("=== CHURN ===");
    println!(
        "  high/med/low:   {}/{}/{}",
        c.high_risk_count, c.medium_risk_count, c.low_risk_count
    );
    println!("  revenue @ risk: ${:.0}", c.revenue_at_risk);
    println!("  still active:   {:.0}%", c.still_active_fraction * 100.0);
    println!(
        "  upgrade picks:  {} Casuals close to Regular",
        report.upgrade_candidates.len()
    );
}

fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn parse_arg<T: std::str::FromStr + Copy>(args: &[String], flag: &str, default: T) -> T {
    args.windows(2)
        .find(|w| w[0] == flag)
        .and_then(|w| w[1].parse().ok())
        .unwrap_or(default)
}

fn parse_date(args: &[String], flag: &str) -> Result<Option<NaiveDate>> {
    arg_value(args, flag)
        .map(|raw| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .with_context(|| format!("{flag} expects YYYY-MM-DD, got '{raw}'"))
        })
        .transpose()
}
