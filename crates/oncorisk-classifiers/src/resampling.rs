//! ADASYN oversampling of the minority class.
//!
//! Minority rows surrounded by many majority rows receive more synthetic
//! neighbours than rows deep inside their own class. Synthetic rows are
//! straight-line interpolations between a minority row and one of its nearest
//! minority neighbours, so they stay inside the minority region.
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::data_handling::{Diagnosis, Frame, Origin};
use crate::error::{ClassifierError, Result};
use crate::math::Array2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Adasyn {
    /// Fraction of the class gap to fill; 1 balances the classes exactly.
    pub beta: f64,
    pub k_neighbors: usize,
    pub seed: u64,
}

impl Default for Adasyn {
    fn default() -> Self {
        Adasyn {
            beta: 1.0,
            k_neighbors: 5,
            seed: 1,
        }
    }
}

/// A rebalanced training frame.
#[derive(Debug)]
pub struct Resampled {
    /// Original rows first, then the synthetic rows.
    pub frame: Frame,
    pub synthetic_count: usize,
    /// Minority rows that had fewer same-class neighbours than requested.
    pub degraded: Vec<ClassifierError>,
}

impl Adasyn {
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.beta >= 0.0) || !self.beta.is_finite() {
            return Err(ClassifierError::InvalidParameter(format!(
                "beta must be a non-negative number, got {}",
                self.beta
            )));
        }
        if self.k_neighbors == 0 {
            return Err(ClassifierError::InvalidParameter(
                "k_neighbors must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Append synthetic minority rows to `train`.
    pub fn balance(&self, train: &Frame) -> Result<Resampled> {
        self.validate()?;
        for class in Diagnosis::ALL {
            if train.count(class) == 0 {
                return Err(ClassifierError::Data(format!(
                    "cannot resample without any '{}' records",
                    class
                )));
            }
        }

        let unchanged = || Resampled {
            frame: train.clone(),
            synthetic_count: 0,
            degraded: Vec::new(),
        };
        let Some(((majority, n_majority), (minority, n_minority))) = train.majority_minority()
        else {
            log::info!("Classes already balanced; no synthetic records generated");
            return Ok(unchanged());
        };
        let target = (self.beta * (n_majority - n_minority) as f64).round() as usize;
        if target == 0 {
            log::info!("ADASYN target is 0 records (beta {}); training set unchanged", self.beta);
            return Ok(unchanged());
        }

        let minority_rows = train.class_rows(minority);
        let difficulty = difficulty_scores(train, &minority_rows, majority, self.k_neighbors);
        let allocation = allocate(&difficulty, target);

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let mut x = train.x.clone();
        let mut y = train.y.clone();
        let mut origin = train.origin.clone();
        let mut degraded = Vec::new();

        for (&source, &count) in minority_rows.iter().zip(&allocation) {
            let neighbours = nearest(&train.x, source, &minority_rows, self.k_neighbors);
            if neighbours.len() < self.k_neighbors {
                let record = train.origin[source].record_id().unwrap_or(source);
                log::warn!(
                    "Record {} has {} same-class neighbours, {} requested; using {}",
                    record,
                    neighbours.len(),
                    self.k_neighbors,
                    neighbours.len()
                );
                degraded.push(ClassifierError::InsufficientNeighbors {
                    record,
                    available: neighbours.len(),
                    requested: self.k_neighbors,
                });
            }

            for _ in 0..count {
                let neighbor = if neighbours.is_empty() {
                    source
                } else {
                    neighbours[rng.gen_range(0..neighbours.len())]
                };
                let gap: f64 = rng.gen();
                let row: Vec<f64> = train
                    .x
                    .row(source)
                    .iter()
                    .zip(train.x.row(neighbor))
                    .map(|(s, n)| s + gap * (n - s))
                    .collect();
                x.push_row(&row)
                    .map_err(|e| ClassifierError::Data(e.to_string()))?;
                y.push(minority);
                origin.push(Origin::Synthetic { source, neighbor });
            }
        }

        let frame = Frame::with_origins(train.feature_names.clone(), x, y, origin)?;
        log::info!(
            "ADASYN generated {} synthetic '{}' records ({} -> {} vs {} '{}')",
            target,
            minority,
            n_minority,
            frame.count(minority),
            n_majority,
            majority
        );
        Ok(Resampled {
            frame,
            synthetic_count: target,
            degraded,
        })
    }
}

/// Convenience wrapper for a one-off rebalance.
pub fn balance(train: &Frame, beta: f64, k_neighbors: usize, seed: u64) -> Result<Resampled> {
    Adasyn {
        beta,
        k_neighbors,
        seed,
    }
    .balance(train)
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Up to `k` nearest rows to `row` among `candidates`, excluding `row`
/// itself. Equal distances keep candidate order.
fn nearest(x: &Array2<f64>, row: usize, candidates: &[usize], k: usize) -> Vec<usize> {
    let mut scored: Vec<(f64, usize)> = candidates
        .iter()
        .filter(|&&c| c != row)
        .map(|&c| (squared_distance(x.row(row), x.row(c)), c))
        .collect();
    scored.sort_by(|a, b| {
        a.0.partial_cmp(&b.0)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.1.cmp(&b.1))
    });
    scored.into_iter().take(k).map(|(_, c)| c).collect()
}

/// Normalised share of majority rows among each minority row's neighbours.
fn difficulty_scores(train: &Frame, minority_rows: &[usize], majority: Diagnosis, k: usize) -> Vec<f64> {
    let all_rows: Vec<usize> = (0..train.nrows()).collect();
    let raw: Vec<f64> = minority_rows
        .iter()
        .map(|&i| {
            let neighbours = nearest(&train.x, i, &all_rows, k);
            if neighbours.is_empty() {
                return 0.0;
            }
            let hostile = neighbours.iter().filter(|&&j| train.y[j] == majority).count();
            hostile as f64 / neighbours.len() as f64
        })
        .collect();

    let total: f64 = raw.iter().sum();
    if total > 0.0 {
        raw.iter().map(|r| r / total).collect()
    } else {
        vec![1.0 / raw.len() as f64; raw.len()]
    }
}

/// Split `total` across `weights` (summing to 1) by largest remainder, so the
/// counts add up to exactly `total`. Equal remainders favour earlier rows.
fn allocate(weights: &[f64], total: usize) -> Vec<usize> {
    let exact: Vec<f64> = weights.iter().map(|w| w * total as f64).collect();
    let mut counts: Vec<usize> = exact.iter().map(|e| e.floor() as usize).collect();
    let assigned: usize = counts.iter().sum();

    let mut by_remainder: Vec<usize> = (0..weights.len()).collect();
    by_remainder.sort_by(|&a, &b| {
        let ra = exact[a] - exact[a].floor();
        let rb = exact[b] - exact[b].floor();
        rb.partial_cmp(&ra)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    for &i in by_remainder.iter().take(total.saturating_sub(assigned)) {
        counts[i] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_sums_to_target() {
        assert_eq!(allocate(&[0.5, 0.5], 3), vec![2, 1]);
        assert_eq!(allocate(&[0.2, 0.3, 0.5], 7), vec![1, 2, 4]);
        assert_eq!(allocate(&[1.0 / 3.0; 3], 10).iter().sum::<usize>(), 10);
    }

    #[test]
    fn nearest_breaks_ties_by_row_order() {
        let x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, -1.0, 5.0]).unwrap();
        assert_eq!(nearest(&x, 0, &[0, 1, 2, 3], 2), vec![1, 2]);
        assert_eq!(nearest(&x, 0, &[0, 3], 5), vec![3]);
    }

    #[test]
    fn rejects_negative_beta() {
        let x = Array2::from_shape_vec((2, 1), vec![0.0, 1.0]).unwrap();
        let frame = Frame::new(
            vec!["a".to_string()],
            x,
            vec![Diagnosis::NoCancer, Diagnosis::Cancer],
        )
        .unwrap();
        assert!(matches!(
            Adasyn::default().with_beta(-1.0).balance(&frame),
            Err(ClassifierError::InvalidParameter(_))
        ));
    }
}
