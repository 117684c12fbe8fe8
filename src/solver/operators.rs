//! Sampling and variation operators shared by all algorithms.
//!
//! Every operator draws from the caller's seeded RNG and keeps its output
//! inside the variable bounds.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use super::population::Individual;
use super::SolverConfig;
use crate::problem::Problem;

/// Latin hypercube sample of `n` points: each dimension is split into `n`
/// strata and every stratum is hit exactly once.
pub fn latin_hypercube(rng: &mut ChaCha8Rng, n: usize, bounds: &[(f64, f64)]) -> Vec<Vec<f64>> {
    let strata: Vec<Vec<usize>> = bounds
        .iter()
        .map(|_| {
            let mut idx: Vec<usize> = (0..n).collect();
            idx.shuffle(rng);
            idx
        })
        .collect();

    (0..n)
        .map(|i| {
            bounds
                .iter()
                .enumerate()
                .map(|(j, &(lo, hi))| {
                    let u = (strata[j][i] as f64 + rng.gen::<f64>()) / n as f64;
                    (lo + u * (hi - lo)).clamp(lo, hi)
                })
                .collect()
        })
        .collect()
}

/// Simulated binary crossover (SBX).
pub fn sbx_crossover(
    rng: &mut ChaCha8Rng,
    p1: &[f64],
    p2: &[f64],
    bounds: &[(f64, f64)],
    config: &SolverConfig,
) -> (Vec<f64>, Vec<f64>) {
    let mut c1 = p1.to_vec();
    let mut c2 = p2.to_vec();

    if rng.gen::<f64>() > config.crossover_prob {
        return (c1, c2);
    }

    let exponent = 1.0 / (config.eta_c + 1.0);
    for (i, &(lo, hi)) in bounds.iter().enumerate() {
        if rng.gen::<f64>() > 0.5 {
            continue;
        }

        let y1 = p1[i].min(p2[i]);
        let y2 = p1[i].max(p2[i]);
        if (y2 - y1).abs() < 1e-14 * (hi - lo).abs().max(f64::MIN_POSITIVE) {
            continue;
        }

        let u = rng.gen::<f64>();
        let spread = |beta: f64| {
            let alpha = 2.0 - beta.powf(-(config.eta_c + 1.0));
            if u <= 1.0 / alpha {
                (u * alpha).powf(exponent)
            } else {
                (1.0 / (2.0 - u * alpha)).powf(exponent)
            }
        };

        let beta_lo = 1.0 + 2.0 * (y1 - lo) / (y2 - y1);
        let beta_hi = 1.0 + 2.0 * (hi - y2) / (y2 - y1);
        let a = 0.5 * ((y1 + y2) - spread(beta_lo) * (y2 - y1));
        let b = 0.5 * ((y1 + y2) + spread(beta_hi) * (y2 - y1));

        let (a, b) = (a.clamp(lo, hi), b.clamp(lo, hi));
        if rng.gen::<bool>() {
            c1[i] = b;
            c2[i] = a;
        } else {
            c1[i] = a;
            c2[i] = b;
        }
    }

    (c1, c2)
}

/// Polynomial mutation.
pub fn polynomial_mutation(
    rng: &mut ChaCha8Rng,
    x: &mut [f64],
    bounds: &[(f64, f64)],
    config: &SolverConfig,
) {
    let prob = config.mutation_prob.unwrap_or(1.0 / x.len().max(1) as f64);
    let exponent = 1.0 / (config.eta_m + 1.0);

    for (xi, &(lo, hi)) in x.iter_mut().zip(bounds) {
        if rng.gen::<f64>() > prob {
            continue;
        }
        let width = hi - lo;
        if width <= 0.0 {
            *xi = lo;
            continue;
        }

        let y = *xi;
        let delta1 = (y - lo) / width;
        let delta2 = (hi - y) / width;

        let u = rng.gen::<f64>();
        let deltaq = if u < 0.5 {
            let xy = 1.0 - delta1;
            let val = 2.0 * u + (1.0 - 2.0 * u) * xy.powf(config.eta_m + 1.0);
            val.powf(exponent) - 1.0
        } else {
            let xy = 1.0 - delta2;
            let val = 2.0 * (1.0 - u) + 2.0 * (u - 0.5) * xy.powf(config.eta_m + 1.0);
            1.0 - val.powf(exponent)
        };

        *xi = (y + deltaq * width).clamp(lo, hi);
    }
}

/// Two children from two parents: SBX followed by polynomial mutation.
pub fn offspring_pair(
    rng: &mut ChaCha8Rng,
    p1: &[f64],
    p2: &[f64],
    bounds: &[(f64, f64)],
    config: &SolverConfig,
) -> (Vec<f64>, Vec<f64>) {
    let (mut c1, mut c2) = sbx_crossover(rng, p1, p2, bounds, config);
    polynomial_mutation(rng, &mut c1, bounds, config);
    polynomial_mutation(rng, &mut c2, bounds, config);
    (c1, c2)
}

/// Binary tournament over `n` candidates; `better(a, b)` decides the winner.
pub fn tournament<F>(rng: &mut ChaCha8Rng, n: usize, better: F) -> usize
where
    F: Fn(usize, usize) -> bool,
{
    let a = rng.gen_range(0..n);
    let b = rng.gen_range(0..n);
    if better(b, a) {
        b
    } else {
        a
    }
}

/// Evaluate design vectors as a batch and wrap them as individuals.
pub fn evaluate_all<P: Problem + ?Sized>(problem: &P, xs: Vec<Vec<f64>>) -> Vec<Individual> {
    let evals = problem.evaluate_batch(&xs);
    xs.into_iter()
        .zip(evals)
        .map(|(x, e)| Individual::evaluated(x, e))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn config() -> SolverConfig {
        SolverConfig {
            crossover_prob: 1.0,
            mutation_prob: Some(1.0),
            ..Default::default()
        }
    }

    #[test]
    fn lhs_hits_every_stratum() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let bounds = [(0.0, 10.0), (-1.0, 1.0)];
        let pts = latin_hypercube(&mut rng, 10, &bounds);

        let mut strata: Vec<usize> = pts.iter().map(|p| p[0].floor() as usize).collect();
        strata.sort_unstable();
        assert_eq!(strata, (0..10).collect::<Vec<_>>());
        assert!(pts.iter().all(|p| (-1.0..=1.0).contains(&p[1])));
    }

    #[test]
    fn degenerate_dimension_stays_fixed() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let bounds = [(2.0, 2.0), (0.0, 1.0)];
        let mut x = vec![2.0, 0.5];
        for _ in 0..100 {
            polynomial_mutation(&mut rng, &mut x, &bounds, &config());
            assert_eq!(x[0], 2.0);
        }
    }

    proptest! {
        #[test]
        fn variation_respects_bounds(
            seed in any::<u64>(),
            a in 0.0_f64..1.0,
            b in 0.0_f64..1.0,
            c in 0.0_f64..1.0,
            d in 0.0_f64..1.0,
        ) {
            let bounds = [(5e-4, 3e-3), (0.3, 0.7)];
            let scale = |(lo, hi): (f64, f64), u: f64| lo + u * (hi - lo);
            let p1 = vec![scale(bounds[0], a), scale(bounds[1], b)];
            let p2 = vec![scale(bounds[0], c), scale(bounds[1], d)];

            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let (c1, c2) = offspring_pair(&mut rng, &p1, &p2, &bounds, &config());
            for child in [c1, c2] {
                for (v, (lo, hi)) in child.iter().zip(bounds) {
                    prop_assert!(*v >= lo && *v <= hi);
                }
            }
        }
    }
}
