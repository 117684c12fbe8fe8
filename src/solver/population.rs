//! Individuals and constraint-aware comparison.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use std::cmp::Ordering;

use crate::model::Evaluation;

/// Aggregate constraint violation of one individual.
///
/// Residuals of different constraints have unrelated scales, so the count of
/// violated constraints is compared before their summed magnitude.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Violation {
    pub count: usize,
    pub total: f64,
}

impl Violation {
    pub fn from_residuals(g: &[f64]) -> Self {
        g.iter().filter(|&&v| v > 0.0).fold(Self::default(), |acc, &v| Self {
            count: acc.count + 1,
            total: acc.total + v,
        })
    }

    pub fn is_feasible(&self) -> bool {
        self.count == 0
    }

    pub fn compare(&self, other: &Self) -> Ordering {
        self.count
            .cmp(&other.count)
            .then_with(|| self.total.partial_cmp(&other.total).unwrap_or(Ordering::Equal))
    }
}

/// Individual in the population
#[derive(Clone, Debug)]
pub struct Individual {
    /// Design variables
    pub x: Vec<f64>,
    /// Objective values (all minimized)
    pub f: Vec<f64>,
    /// Raw constraint residuals
    pub g: Vec<f64>,
    pub violation: Violation,
    /// Pareto rank (0 = non-dominated front)
    pub rank: usize,
    pub crowding_distance: f64,
    /// Algorithm-specific fitness (SPEA2), lower is better
    pub fitness: f64,
}

impl Individual {
    pub fn new(x: Vec<f64>) -> Self {
        Self {
            x,
            f: Vec::new(),
            g: Vec::new(),
            violation: Violation::default(),
            rank: usize::MAX,
            crowding_distance: 0.0,
            fitness: 0.0,
        }
    }

    pub fn evaluated(x: Vec<f64>, eval: Evaluation) -> Self {
        let mut ind = Self::new(x);
        ind.violation = Violation::from_residuals(&eval.constraints);
        ind.f = eval.objectives;
        ind.g = eval.constraints;
        ind
    }

    pub fn is_feasible(&self) -> bool {
        self.violation.is_feasible()
    }

    /// Constrained dominance: a less-violating individual dominates; between
    /// equally violating ones, plain Pareto dominance on the objectives.
    pub fn dominates(&self, other: &Individual) -> bool {
        match self.violation.compare(&other.violation) {
            Ordering::Less => return true,
            Ordering::Greater => return false,
            Ordering::Equal => {}
        }

        let mut better = false;
        for (a, b) in self.f.iter().zip(other.f.iter()) {
            if a > b {
                return false;
            }
            if a < b {
                better = true;
            }
        }
        better
    }

    /// Single-objective ordering: violation first, then the first objective.
    pub fn cmp_scalar(&self, other: &Individual) -> Ordering {
        self.violation.compare(&other.violation).then_with(|| {
            self.f[0]
                .partial_cmp(&other.f[0])
                .unwrap_or(Ordering::Equal)
        })
    }
}

/// Fast non-dominated sorting. Sets `rank` on every individual and returns the
/// fronts as index lists, best first.
pub fn non_dominated_sort(population: &mut [Individual]) -> Vec<Vec<usize>> {
    let n = population.len();

    for ind in population.iter_mut() {
        ind.rank = usize::MAX;
    }

    let mut domination_count: Vec<usize> = vec![0; n];
    let mut dominated_by: Vec<Vec<usize>> = vec![Vec::new(); n];

    for i in 0..n {
        for j in (i + 1)..n {
            if population[i].dominates(&population[j]) {
                dominated_by[i].push(j);
                domination_count[j] += 1;
            } else if population[j].dominates(&population[i]) {
                dominated_by[j].push(i);
                domination_count[i] += 1;
            }
        }
    }

    let mut fronts = Vec::new();
    let mut current: Vec<usize> = (0..n).filter(|&i| domination_count[i] == 0).collect();
    let mut rank = 0;
    while !current.is_empty() {
        let mut next = Vec::new();
        for &i in &current {
            population[i].rank = rank;
            for &j in &dominated_by[i] {
                domination_count[j] -= 1;
                if domination_count[j] == 0 {
                    next.push(j);
                }
            }
        }
        fronts.push(current);
        current = next;
        rank += 1;
    }
    fronts
}

/// Crowding distance within each front.
pub fn crowding_distance(population: &mut [Individual], fronts: &[Vec<usize>]) {
    for ind in population.iter_mut() {
        ind.crowding_distance = 0.0;
    }
    let Some(n_obj) = population.first().map(|ind| ind.f.len()) else {
        return;
    };

    for front in fronts {
        if front.len() <= 2 {
            for &i in front {
                population[i].crowding_distance = f64::INFINITY;
            }
            continue;
        }

        let mut order = front.clone();
        for m in 0..n_obj {
            order.sort_by(|&a, &b| {
                population[a].f[m]
                    .partial_cmp(&population[b].f[m])
                    .unwrap_or(Ordering::Equal)
            });

            let first = order[0];
            let last = order[order.len() - 1];
            population[first].crowding_distance = f64::INFINITY;
            population[last].crowding_distance = f64::INFINITY;

            let f_min = population[first].f[m];
            let f_max = population[last].f[m];
            let range = if (f_max - f_min).abs() > 1e-10 {
                f_max - f_min
            } else {
                1.0
            };

            for k in 1..(order.len() - 1) {
                let prev = population[order[k - 1]].f[m];
                let next = population[order[k + 1]].f[m];
                population[order[k]].crowding_distance += (next - prev) / range;
            }
        }
    }
}

/// Retained set of a Pareto search: the non-dominated members, restricted to
/// feasible ones when any exist. With no feasible member, the constrained
/// first front already holds only the least-violating individuals.
pub fn pareto_set(population: &[Individual]) -> Vec<Individual> {
    let mut pop = population.to_vec();
    let fronts = non_dominated_sort(&mut pop);
    let Some(first) = fronts.first() else {
        return Vec::new();
    };
    first.iter().map(|&i| pop[i].clone()).collect()
}
