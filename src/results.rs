//! Tabular view of an optimization result.
//!
//! Author: PEM Design Group
//! License: MIT
//! Version: 0.3.0

use serde::Serialize;

use crate::problem::Problem;
use crate::solver::OptimizationResult;

/// Named columns with one row per retained design.
///
/// Columns are the variable names, the objective names and then
/// `G1..GK` for the constraint residuals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<f64>>,
}

impl ResultTable {
    /// Assemble the table for `result`, which must come from `problem`.
    /// Results without a constraint matrix have their residuals recomputed.
    pub fn assemble<P: Problem + ?Sized>(problem: &P, result: &OptimizationResult) -> Self {
        let mut columns = problem.variable_names();
        columns.extend(problem.objective_names());
        columns.extend((1..=problem.n_constraints()).map(|k| format!("G{k}")));

        let constraints = match &result.g {
            Some(g) => g.clone(),
            None => problem
                .evaluate_batch(&result.x)
                .into_iter()
                .map(|e| e.constraints)
                .collect(),
        };

        let rows = result
            .x
            .iter()
            .zip(&result.f)
            .zip(&constraints)
            .map(|((x, f), g)| x.iter().chain(f).chain(g).copied().collect())
            .collect();

        Self { columns, rows }
    }

    pub fn column(&self, name: &str) -> Option<Vec<f64>> {
        let idx = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[idx]).collect())
    }

    /// Whitespace-aligned text rendering.
    pub fn render(&self) -> String {
        let width = self.columns.iter().map(String::len).max().unwrap_or(0).max(12);
        let mut out = String::new();
        for name in &self.columns {
            out.push_str(&format!("{name:>width$} "));
        }
        out.push('\n');
        for row in &self.rows {
            for v in row {
                out.push_str(&format!("{v:>width$.6e} "));
            }
            out.push('\n');
        }
        out
    }
}
