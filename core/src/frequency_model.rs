//! Frequency model — zero-truncated negative binomial (ZT-NBD) fit.
//!
//! Visits per customer are modelled as NBD(r, alpha) conditioned on at
//! least one visit, because customers who never came are not in the data.
//! Fitting the truncated likelihood lets us extrapolate back to x = 0 and
//! estimate the unseen market f0.
//!
//! The fit never fails. A degenerate optimum still returns a result; the
//! chi-square diagnostics carry the low confidence instead.

use crate::{
    aggregation::CustomerAggregate,
    config::FrequencyModelConfig,
    numeric::{ln_gamma, minimize_bounded, MinimizeOptions},
    types::VisitCount,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Smallest predicted bin count used as a chi-square denominator.
const MIN_EXPECTED: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Heterogeneity {
    High,
    Moderate,
    Low,
}

impl Heterogeneity {
    pub fn description(&self) -> &'static str {
        match self {
            Heterogeneity::High => "Your customers are very different from each other",
            Heterogeneity::Moderate => "Your customers have moderately varied visit patterns",
            Heterogeneity::Low => "Your customers have fairly similar visit patterns",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitQuality {
    Good,
    Moderate,
    Poor,
}

impl FitQuality {
    pub fn description(&self) -> &'static str {
        match self {
            FitQuality::Good => "This model fits your data well",
            FitQuality::Moderate => {
                "This model captures most patterns, treat estimates as directional"
            }
            FitQuality::Poor => "This model has limited fit, estimates are rough approximations",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequencyFit {
    pub r: f64,
    pub alpha: f64,
    /// Estimated number of potential customers with zero visits.
    pub f0: f64,
    pub n_observed: usize,
    pub total_market: f64,
    pub market_reached: f64,
    pub chi_square: f64,
    pub degrees_of_freedom: i64,
    pub log_likelihood: f64,
    pub heterogeneity_level: Heterogeneity,
    pub fit_quality_level: FitQuality,
    /// Customers per observed visit count.
    pub observed_histogram: BTreeMap<VisitCount, usize>,
    /// Model-implied customers for the same visit counts.
    pub predicted_histogram: BTreeMap<VisitCount, f64>,
    pub mean_frequency: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Untruncated NBD parameters with helpers for the truncated pmf.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NbdParams {
    pub r: f64,
    pub alpha: f64,
}

impl NbdParams {
    /// ln P(X = 0) = r · ln(alpha / (alpha + 1)).
    pub fn ln_p_zero(&self) -> f64 {
        -self.r * (1.0 / self.alpha).ln_1p()
    }

    pub fn p_zero(&self) -> f64 {
        self.ln_p_zero().exp()
    }

    /// ln P(X = x) for the untruncated NBD.
    pub fn ln_pmf(&self, x: VisitCount) -> f64 {
        let x = x as f64;
        ln_gamma(self.r + x) - ln_gamma(self.r) - ln_gamma(x + 1.0) + self.ln_p_zero()
            - x * self.alpha.ln_1p()
    }

    /// ln P(X = x | X ≥ 1).
    pub fn ln_pmf_truncated(&self, x: VisitCount) -> f64 {
        // ln(1 − P0) computed as ln(−expm1(ln P0)) to keep precision when P0 → 0.
        self.ln_pmf(x) - (-self.ln_p_zero().exp_m1()).ln()
    }

    /// Total truncated log-likelihood of a visit-count histogram.
    pub fn log_likelihood(&self, histogram: &BTreeMap<VisitCount, usize>) -> f64 {
        histogram
            .iter()
            .filter(|&(&x, &count)| x >= 1 && count > 0)
            .map(|(&x, &count)| count as f64 * self.ln_pmf_truncated(x))
            .sum()
    }
}

pub struct FrequencyModel {
    config: FrequencyModelConfig,
}

impl FrequencyModel {
    pub fn new(config: FrequencyModelConfig) -> Self {
        Self { config }
    }

    /// Method-of-moments starting point when the data is overdispersed,
    /// otherwise (1, 1). Floored and clamped into the parameter box.
    pub fn initial_params(&self, frequencies: &[VisitCount]) -> NbdParams {
        let cfg = &self.config;
        let n = frequencies.len();
        let (r0, alpha0) = if n >= 2 {
            let mean = frequencies.iter().map(|&f| f as f64).sum::<f64>() / n as f64;
            let var = frequencies
                .iter()
                .map(|&f| (f as f64 - mean).powi(2))
                .sum::<f64>()
                / (n - 1) as f64;
            if var > mean {
                (mean * mean / (var - mean), mean / (var - mean))
            } else {
                (1.0, 1.0)
            }
        } else {
            (1.0, 1.0)
        };

        let fix = |v: f64| v.max(cfg.init_floor).clamp(cfg.param_min, cfg.param_max);
        NbdParams {
            r: fix(r0),
            alpha: fix(alpha0),
        }
    }

    pub fn fit(&self, customers: &[CustomerAggregate]) -> FrequencyFit {
        let frequencies: Vec<VisitCount> = customers.iter().map(|c| c.frequency).collect();
        self.fit_frequencies(&frequencies)
    }

    pub fn fit_frequencies(&self, frequencies: &[VisitCount]) -> FrequencyFit {
        let cfg = &self.config;
        let n_observed = frequencies.len();

        let mut observed_histogram: BTreeMap<VisitCount, usize> = BTreeMap::new();
        for &f in frequencies {
            *observed_histogram.entry(f).or_insert(0) += 1;
        }

        if n_observed == 0 {
            log::debug!("frequency_model: no customers, returning empty fit");
            return FrequencyFit::empty();
        }

        let start = self.initial_params(frequencies);

        // Search in log space: the box spans several decades.
        let bounds = [
            (cfg.param_min.ln(), cfg.param_max.ln()),
            (cfg.param_min.ln(), cfg.param_max.ln()),
        ];
        let objective = |p: &[f64; 2]| {
            let params = NbdParams {
                r: p[0].exp(),
                alpha: p[1].exp(),
            };
            -params.log_likelihood(&observed_histogram)
        };
        let opts = MinimizeOptions {
            max_iterations: cfg.max_iterations,
            tolerance: cfg.tolerance,
            ..MinimizeOptions::default()
        };

        let first = minimize_bounded(objective, [start.r.ln(), start.alpha.ln()], bounds, opts);
        // One restart from the optimum to recover from a collapsed simplex.
        let second = minimize_bounded(objective, first.x, bounds, opts);
        let best = if second.value <= first.value { second } else { first };

        let params = NbdParams {
            r: best.x[0].exp().clamp(cfg.param_min, cfg.param_max),
            alpha: best.x[1].exp().clamp(cfg.param_min, cfg.param_max),
        };
        let iterations = first.iterations + second.iterations;

        let p_zero = params.p_zero();
        let f0 = (n_observed as f64 * p_zero / (1.0 - p_zero)).max(0.0);
        let total_market = n_observed as f64 + f0;
        let market_reached = n_observed as f64 / total_market;

        let predicted_histogram: BTreeMap<VisitCount, f64> = observed_histogram
            .keys()
            .map(|&x| (x, params.ln_pmf_truncated(x).exp() * n_observed as f64))
            .collect();

        let chi_square: f64 = observed_histogram
            .iter()
            .map(|(x, &obs)| {
                let expected = predicted_histogram[x].max(MIN_EXPECTED);
                (obs as f64 - expected).powi(2) / expected
            })
            .sum();
        let degrees_of_freedom = observed_histogram.len() as i64 - 2;

        let fit_quality_level = self.classify_fit(chi_square, degrees_of_freedom);
        let heterogeneity_level = self.classify_heterogeneity(params.r);
        let log_likelihood = params.log_likelihood(&observed_histogram);
        let mean_frequency =
            frequencies.iter().map(|&f| f as f64).sum::<f64>() / n_observed as f64;

        log::info!(
            "frequency_model: r={:.4} alpha={:.4} f0={:.1} reached={:.1}% chi2={:.2} df={} ({} iterations, converged={})",
            params.r,
            params.alpha,
            f0,
            market_reached * 100.0,
            chi_square,
            degrees_of_freedom,
            iterations,
            best.converged,
        );

        FrequencyFit {
            r: params.r,
            alpha: params.alpha,
            f0,
            n_observed,
            total_market,
            market_reached,
            chi_square,
            degrees_of_freedom,
            log_likelihood,
            heterogeneity_level,
            fit_quality_level,
            observed_histogram,
            predicted_histogram,
            mean_frequency,
            iterations,
            converged: best.converged,
        }
    }

    pub fn classify_fit(&self, chi_square: f64, degrees_of_freedom: i64) -> FitQuality {
        let per_df = chi_square / degrees_of_freedom.max(1) as f64;
        if per_df < self.config.good_fit_below {
            FitQuality::Good
        } else if per_df < self.config.moderate_fit_below {
            FitQuality::Moderate
        } else {
            FitQuality::Poor
        }
    }

    pub fn classify_heterogeneity(&self, r: f64) -> Heterogeneity {
        if r < self.config.high_heterogeneity_below {
            Heterogeneity::High
        } else if r < self.config.moderate_heterogeneity_below {
            Heterogeneity::Moderate
        } else {
            Heterogeneity::Low
        }
    }
}

impl FrequencyFit {
    /// Neutral result for an empty customer set.
    pub fn empty() -> Self {
        Self {
            r: 1.0,
            alpha: 1.0,
            f0: 0.0,
            n_observed: 0,
            total_market: 0.0,
            market_reached: 0.0,
            chi_square: 0.0,
            degrees_of_freedom: 0,
            log_likelihood: 0.0,
            heterogeneity_level: Heterogeneity::Moderate,
            fit_quality_level: FitQuality::Poor,
            observed_histogram: BTreeMap::new(),
            predicted_histogram: BTreeMap::new(),
            mean_frequency: 0.0,
            iterations: 0,
            converged: false,
        }
    }

    pub fn params(&self) -> NbdParams {
        NbdParams {
            r: self.r,
            alpha: self.alpha,
        }
    }
}
