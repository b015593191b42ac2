//! Two-objective value space shared by the search agent and its observers.
//!
//! Both objectives are minimized: the efficiency reading (FLOPs, parameters,
//! or latency) and the classification error rate.

use serde::{Deserialize, Serialize};

/// One architecture's position in objective space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectivePoint {
    pub efficiency: f64,
    pub error_rate: f64,
}

impl ObjectivePoint {
    pub fn new(efficiency: f64, error_rate: f64) -> Self {
        Self {
            efficiency,
            error_rate,
        }
    }

    /// Pareto dominance under minimization: no worse on both axes and
    /// strictly better on at least one.
    pub fn dominates(&self, other: &Self) -> bool {
        let no_worse =
            self.efficiency <= other.efficiency && self.error_rate <= other.error_rate;
        let strictly_better =
            self.efficiency < other.efficiency || self.error_rate < other.error_rate;
        no_worse && strictly_better
    }
}

/// Indices of the non-dominated members of `points`.
pub fn non_dominated_indices(points: &[ObjectivePoint]) -> Vec<usize> {
    (0..points.len())
        .filter(|&i| {
            points
                .iter()
                .enumerate()
                .all(|(j, other)| i == j || !other.dominates(&points[i]))
        })
        .collect()
}

/// Min-max normalization bounds over a point set, per axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBounds {
    pub efficiency: (f64, f64),
    pub error_rate: (f64, f64),
}

impl AxisBounds {
    /// Bounds of `points`. Degenerate axes (min == max) normalize to zero.
    pub fn of(points: &[ObjectivePoint]) -> Self {
        let mut eff = (f64::INFINITY, f64::NEG_INFINITY);
        let mut err = (f64::INFINITY, f64::NEG_INFINITY);
        for p in points {
            eff = (eff.0.min(p.efficiency), eff.1.max(p.efficiency));
            err = (err.0.min(p.error_rate), err.1.max(p.error_rate));
        }
        Self {
            efficiency: eff,
            error_rate: err,
        }
    }

    pub fn normalize(&self, p: &ObjectivePoint) -> ObjectivePoint {
        ObjectivePoint {
            efficiency: scale(p.efficiency, self.efficiency),
            error_rate: scale(p.error_rate, self.error_rate),
        }
    }
}

fn scale(value: f64, (lo, hi): (f64, f64)) -> f64 {
    if hi > lo {
        (value - lo) / (hi - lo)
    } else {
        0.0
    }
}

/// Inverted generational distance of `obtained` relative to `reference`.
///
/// Mean over reference points of the euclidean distance to the closest
/// obtained point. Lower is better; 0 means the reference front is covered.
/// Returns `f64::INFINITY` when `obtained` is empty.
pub fn igd(reference: &[ObjectivePoint], obtained: &[ObjectivePoint]) -> f64 {
    if reference.is_empty() {
        return 0.0;
    }
    if obtained.is_empty() {
        return f64::INFINITY;
    }
    let total: f64 = reference
        .iter()
        .map(|r| {
            obtained
                .iter()
                .map(|o| {
                    let de = r.efficiency - o.efficiency;
                    let dr = r.error_rate - o.error_rate;
                    (de * de + dr * dr).sqrt()
                })
                .fold(f64::INFINITY, f64::min)
        })
        .sum();
    total / reference.len() as f64
}
