//! Numerical building blocks for the estimators.
//!
//! - `ln_gamma`: Lanczos approximation (g = 7, n = 9).
//! - `minimize_bounded`: box-constrained Nelder–Mead with a hard
//!   iteration cap, so every fit terminates.

use std::f64::consts::PI;

/// ln Γ(x) for x > 0. Returns +∞ for non-positive input.
pub fn ln_gamma(x: f64) -> f64 {
    const COEFFS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];
    const G: f64 = 7.0;

    if x <= 0.0 {
        return f64::INFINITY;
    }

    if x < 0.5 {
        // Reflection.
        let sin_val = (PI * x).sin();
        return PI.ln() - sin_val.abs().ln() - ln_gamma(1.0 - x);
    }

    let z = x - 1.0;
    let mut sum = COEFFS[0];
    for (i, &c) in COEFFS[1..].iter().enumerate() {
        sum += c / (z + i as f64 + 1.0);
    }

    let t = z + G + 0.5;
    0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + sum.ln()
}

#[derive(Debug, Clone, Copy)]
pub struct MinimizeOptions {
    pub max_iterations: usize,
    /// Stop once the simplex's objective spread falls below this.
    pub tolerance: f64,
    /// Initial simplex step as a fraction of each bound's width.
    pub initial_step: f64,
}

impl Default for MinimizeOptions {
    fn default() -> Self {
        Self {
            max_iterations: 500,
            tolerance: 1e-10,
            initial_step: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Minimum<const N: usize> {
    pub x: [f64; N],
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Minimise `f` over the box `bounds`, starting from `x0`.
///
/// Every trial point is projected back onto the box, so `f` is never
/// evaluated outside it. Non-finite objective values are treated as +∞.
pub fn minimize_bounded<const N: usize, F>(
    f: F,
    x0: [f64; N],
    bounds: [(f64, f64); N],
    opts: MinimizeOptions,
) -> Minimum<N>
where
    F: Fn(&[f64; N]) -> f64,
{
    const REFLECT: f64 = 1.0;
    const EXPAND: f64 = 2.0;
    const CONTRACT: f64 = 0.5;
    const SHRINK: f64 = 0.5;

    let project = |mut p: [f64; N]| {
        for (v, &(lo, hi)) in p.iter_mut().zip(bounds.iter()) {
            *v = v.clamp(lo, hi);
        }
        p
    };
    let eval = |p: &[f64; N]| {
        let v = f(p);
        if v.is_finite() {
            v
        } else {
            f64::INFINITY
        }
    };

    // Initial simplex: x0 plus one step along each axis, stepping inward
    // when x0 sits on the upper bound.
    let start = project(x0);
    let mut simplex: Vec<([f64; N], f64)> = Vec::with_capacity(N + 1);
    simplex.push((start, eval(&start)));
    for i in 0..N {
        let (lo, hi) = bounds[i];
        let step = (hi - lo) * opts.initial_step;
        let mut p = start;
        p[i] = if p[i] + step <= hi { p[i] + step } else { p[i] - step };
        let p = project(p);
        simplex.push((p, eval(&p)));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < opts.max_iterations {
        simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
        let best = simplex[0].1;
        let worst = simplex[N].1;

        if (worst - best).abs() <= opts.tolerance * (1.0 + best.abs()) {
            converged = true;
            break;
        }
        iterations += 1;

        let mut centroid = [0.0; N];
        for (p, _) in &simplex[..N] {
            for (c, v) in centroid.iter_mut().zip(p.iter()) {
                *c += v / N as f64;
            }
        }

        let toward = |coef: f64| {
            let mut p = [0.0; N];
            for j in 0..N {
                p[j] = centroid[j] + coef * (simplex[N].0[j] - centroid[j]);
            }
            project(p)
        };

        let reflected = toward(-REFLECT);
        let f_reflected = eval(&reflected);

        if f_reflected < best {
            let expanded = toward(-EXPAND);
            let f_expanded = eval(&expanded);
            simplex[N] = if f_expanded < f_reflected {
                (expanded, f_expanded)
            } else {
                (reflected, f_reflected)
            };
            continue;
        }

        if f_reflected < simplex[N - 1].1 {
            simplex[N] = (reflected, f_reflected);
            continue;
        }

        let contracted = if f_reflected < worst {
            toward(-CONTRACT)
        } else {
            toward(CONTRACT)
        };
        let f_contracted = eval(&contracted);
        if f_contracted < worst.min(f_reflected) {
            simplex[N] = (contracted, f_contracted);
            continue;
        }

        let anchor = simplex[0].0;
        for (p, v) in simplex.iter_mut().skip(1) {
            for j in 0..N {
                p[j] = anchor[j] + SHRINK * (p[j] - anchor[j]);
            }
            *p = project(*p);
            *v = eval(p);
        }
    }

    simplex.sort_by(|a, b| a.1.total_cmp(&b.1));
    let (x, value) = simplex[0];
    Minimum {
        x,
        value,
        iterations,
        converged,
    }
}
