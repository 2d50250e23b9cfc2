//! Stochastic gradient boosting of shallow regression trees.
//!
//! Two classes under multinomial deviance reduce to the binomial deviance on
//! a single logit, which is what is fitted here. Each round draws a bag of
//! training rows, grows a tree of `interaction_depth` levels on the residuals
//! `y - p`, and sets every leaf to the Newton step `sum(r) / sum(p (1 - p))`.
//! The number of rounds actually used is chosen by an inner cross-validation
//! on the held-out deviance.
use rand::seq::index::sample;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use crate::config::{ModelConfig, ModelType};
use crate::cross_validation::fold_assignments;
use crate::data_handling::{Diagnosis, Frame};
use crate::error::{ClassifierError, Result};
use crate::math::Array2;
use crate::models::classifier_trait::{single_class_prediction, ClassifierModel, Prediction};
use crate::models::tree::{split_threshold, Node, Tree};

const PREVALENCE_FLOOR: f64 = 1e-6;

pub struct BoostingClassifier {
    params: ModelConfig,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct BoostSettings {
    n_rounds: usize,
    shrinkage: f64,
    depth: usize,
    bag_fraction: f64,
    min_obs: usize,
    cv_folds: usize,
}

/// An additive model: `init + shrinkage * sum(tree(row))` on the logit scale.
#[derive(Debug, Clone)]
pub struct BoostedModel {
    pub init: f64,
    pub shrinkage: f64,
    pub trees: Vec<Tree>,
}

impl BoostedModel {
    pub fn margin(&self, row: &[f64]) -> f64 {
        self.init + self.shrinkage * self.trees.iter().map(|t| t.predict(row)).sum::<f64>()
    }

    pub fn probability(&self, row: &[f64]) -> f64 {
        sigmoid(self.margin(row))
    }

    pub fn n_rounds(&self) -> usize {
        self.trees.len()
    }
}

impl BoostingClassifier {
    pub fn new(params: ModelConfig) -> Self {
        BoostingClassifier { params }
    }

    pub(crate) fn settings(&self) -> Result<BoostSettings> {
        match &self.params.model_type {
            ModelType::Boosting {
                n_rounds,
                shrinkage,
                interaction_depth,
                bag_fraction,
                min_obs_in_node,
                cv_folds,
            } => {
                if *n_rounds == 0 {
                    return Err(ClassifierError::InvalidParameter(
                        "boosting needs at least one round".to_string(),
                    ));
                }
                if !(*shrinkage > 0.0) {
                    return Err(ClassifierError::InvalidParameter(format!(
                        "shrinkage must be positive, got {}",
                        shrinkage
                    )));
                }
                if !(*bag_fraction > 0.0 && *bag_fraction <= 1.0) {
                    return Err(ClassifierError::InvalidParameter(format!(
                        "bag fraction must lie in (0, 1], got {}",
                        bag_fraction
                    )));
                }
                if *interaction_depth == 0 {
                    return Err(ClassifierError::InvalidParameter(
                        "interaction depth must be at least 1".to_string(),
                    ));
                }
                Ok(BoostSettings {
                    n_rounds: *n_rounds,
                    shrinkage: *shrinkage,
                    depth: *interaction_depth,
                    bag_fraction: *bag_fraction,
                    min_obs: (*min_obs_in_node).max(1),
                    cv_folds: *cv_folds,
                })
            }
            other => Err(ClassifierError::InvalidParameter(format!(
                "Expected ModelType::Boosting params, got {}",
                other.name()
            ))),
        }
    }

    /// Pick the round count minimising the mean held-out deviance over the
    /// inner folds. Falls back to every configured round when the training
    /// rows cannot be folded.
    pub fn select_rounds(&self, x: &Array2<f64>, labels: &[Diagnosis]) -> Result<usize> {
        let settings = self.settings()?;
        if settings.cv_folds < 2 {
            return Ok(settings.n_rounds);
        }
        let assignments = match fold_assignments(labels, settings.cv_folds, 1, self.params.seed) {
            Ok(assignments) => assignments,
            Err(e) => {
                log::info!(
                    "Boosting round selection skipped ({}); using all {} rounds",
                    e,
                    settings.n_rounds
                );
                return Ok(settings.n_rounds);
            }
        };

        let y = targets(labels);
        let curves: Vec<Vec<f64>> = assignments
            .par_iter()
            .map(|assignment| {
                let fit_rows = complement(labels.len(), &assignment.held_out);
                let fit_x = x.select_rows(&fit_rows);
                let fit_y: Vec<f64> = fit_rows.iter().map(|&i| y[i]).collect();
                let held_x = x.select_rows(&assignment.held_out);
                let held_y: Vec<f64> = assignment.held_out.iter().map(|&i| y[i]).collect();
                let inner_seed = self.params.seed.wrapping_add(assignment.fold as u64 + 1);
                let (_, curve) = fit_boosted(
                    &fit_x,
                    &fit_y,
                    &settings,
                    settings.n_rounds,
                    inner_seed,
                    Some((&held_x, &held_y)),
                );
                curve
            })
            .collect();

        let mut best_round = 0;
        let mut best_deviance = f64::INFINITY;
        for round in 0..settings.n_rounds {
            let mean = curves.iter().map(|c| c[round]).sum::<f64>() / curves.len() as f64;
            if mean < best_deviance {
                best_deviance = mean;
                best_round = round;
            }
        }
        log::debug!(
            "Boosting: {} of {} rounds minimise held-out deviance ({:.4})",
            best_round + 1,
            settings.n_rounds,
            best_deviance
        );
        Ok(best_round + 1)
    }

    /// Select the round count and fit the final model on all rows.
    pub fn fit(&self, x: &Array2<f64>, labels: &[Diagnosis]) -> Result<BoostedModel> {
        let settings = self.settings()?;
        if x.nrows() == 0 {
            return Err(ClassifierError::Data("cannot boost without records".to_string()));
        }
        let rounds = self.select_rounds(x, labels)?;
        let (model, _) = fit_boosted(x, &targets(labels), &settings, rounds, self.params.seed, None);
        if !model.init.is_finite() {
            return Err(ClassifierError::Fit {
                model: self.name().to_string(),
                reason: "non-finite initial log-odds".to_string(),
            });
        }
        Ok(model)
    }
}

impl ClassifierModel for BoostingClassifier {
    fn fit_predict(&self, train: &Frame, test: &Frame) -> Result<Prediction> {
        if let Some(prediction) = single_class_prediction(train, test) {
            return Ok(prediction);
        }
        let model = self.fit(&train.x, &train.y)?;
        let scores = test.x.rows().map(|row| model.probability(row)).collect();
        Ok(Prediction::from_scores(scores))
    }

    fn name(&self) -> &str {
        "Boosting"
    }
}

fn targets(labels: &[Diagnosis]) -> Vec<f64> {
    labels.iter().map(|d| d.code()).collect()
}

fn complement(n: usize, held_out: &[usize]) -> Vec<usize> {
    let mut excluded = vec![false; n];
    for &i in held_out {
        excluded[i] = true;
    }
    (0..n).filter(|&i| !excluded[i]).collect()
}

fn sigmoid(f: f64) -> f64 {
    1.0 / (1.0 + (-f).exp())
}

/// Mean binomial deviance of margins `f` against 0 / 1 targets.
fn mean_deviance(margins: &[f64], y: &[f64]) -> f64 {
    if y.is_empty() {
        return 0.0;
    }
    let total: f64 = margins
        .iter()
        .zip(y)
        .map(|(&f, &yi)| {
            // log(1 + e^f) without overflow
            let softplus = f.max(0.0) + (-f.abs()).exp().ln_1p();
            2.0 * (softplus - yi * f)
        })
        .sum();
    total / y.len() as f64
}

/// Run `rounds` boosting iterations. When a holdout set is given, the
/// returned curve holds its mean deviance after each round.
pub(crate) fn fit_boosted(
    x: &Array2<f64>,
    y: &[f64],
    settings: &BoostSettings,
    rounds: usize,
    seed: u64,
    holdout: Option<(&Array2<f64>, &[f64])>,
) -> (BoostedModel, Vec<f64>) {
    let n = x.nrows();
    let prevalence = (y.iter().sum::<f64>() / n.max(1) as f64)
        .clamp(PREVALENCE_FLOOR, 1.0 - PREVALENCE_FLOOR);
    let init = (prevalence / (1.0 - prevalence)).ln();

    let order = presort(x);
    let bag_size = ((settings.bag_fraction * n as f64).floor() as usize).clamp(1, n.max(1));
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let mut margins = vec![init; n];
    let mut held_margins = holdout.map(|(hx, _)| vec![init; hx.nrows()]);
    let mut curve = Vec::with_capacity(if holdout.is_some() { rounds } else { 0 });
    let mut trees = Vec::with_capacity(rounds);

    for _ in 0..rounds {
        let p: Vec<f64> = margins.iter().map(|&f| sigmoid(f)).collect();
        let residual: Vec<f64> = y.iter().zip(&p).map(|(yi, pi)| yi - pi).collect();
        let hessian: Vec<f64> = p.iter().map(|pi| pi * (1.0 - pi)).collect();
        let bag = sample(&mut rng, n, bag_size).into_vec();

        let tree = grow_tree(x, &order, &residual, &hessian, &bag, settings);
        for (i, row) in x.rows().enumerate() {
            margins[i] += settings.shrinkage * tree.predict(row);
        }
        if let (Some((hx, hy)), Some(hm)) = (holdout, held_margins.as_mut()) {
            for (i, row) in hx.rows().enumerate() {
                hm[i] += settings.shrinkage * tree.predict(row);
            }
            curve.push(mean_deviance(hm, hy));
        }
        trees.push(tree);
    }

    (
        BoostedModel {
            init,
            shrinkage: settings.shrinkage,
            trees,
        },
        curve,
    )
}

/// Row positions of `x` sorted by each column, one vector per column.
fn presort(x: &Array2<f64>) -> Vec<Vec<usize>> {
    (0..x.ncols())
        .map(|f| {
            let mut rows: Vec<usize> = (0..x.nrows()).collect();
            rows.sort_by(|&a, &b| {
                x[(a, f)]
                    .partial_cmp(&x[(b, f)])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            rows
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Open {
    node: usize,
    count: usize,
    sum_residual: f64,
    sum_hessian: f64,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

/// Grow one tree level by level over the bagged rows.
///
/// Every open node of a level is split in a single sweep over each presorted
/// column, so a level costs O(rows x columns).
fn grow_tree(
    x: &Array2<f64>,
    order: &[Vec<usize>],
    residual: &[f64],
    hessian: &[f64],
    bag: &[usize],
    settings: &BoostSettings,
) -> Tree {
    let mut slot_of: Vec<Option<usize>> = vec![None; x.nrows()];
    for &r in bag {
        slot_of[r] = Some(0);
    }
    let mut nodes = vec![Node::Leaf { value: 0.0 }];
    let mut open = vec![node_stats(0, bag, residual, hessian)];

    for _ in 0..settings.depth {
        let best = best_splits(x, order, residual, &slot_of, &open, settings.min_obs);
        if best.iter().all(Option::is_none) {
            break;
        }

        // children of slot s land at next-level slots child_slot[s] and +1
        let mut child_slot = vec![None; open.len()];
        let mut next = Vec::new();
        for (s, candidate) in best.iter().enumerate() {
            match candidate {
                Some(c) => {
                    let left = nodes.len();
                    nodes.push(Node::Leaf { value: 0.0 });
                    nodes.push(Node::Leaf { value: 0.0 });
                    nodes[open[s].node] = Node::Split {
                        feature: c.feature,
                        threshold: c.threshold,
                        left,
                        right: left + 1,
                    };
                    child_slot[s] = Some(next.len());
                    next.push(empty_open(left));
                    next.push(empty_open(left + 1));
                }
                None => {
                    nodes[open[s].node] = Node::Leaf {
                        value: newton_step(&open[s]),
                    };
                }
            }
        }

        for &r in bag {
            let Some(s) = slot_of[r] else { continue };
            slot_of[r] = match (child_slot[s], best[s]) {
                (Some(base), Some(c)) => {
                    let child = if x[(r, c.feature)] <= c.threshold {
                        base
                    } else {
                        base + 1
                    };
                    let stats = &mut next[child];
                    stats.count += 1;
                    stats.sum_residual += residual[r];
                    stats.sum_hessian += hessian[r];
                    Some(child)
                }
                _ => None,
            };
        }
        open = next;
    }

    for stats in &open {
        nodes[stats.node] = Node::Leaf {
            value: newton_step(stats),
        };
    }
    Tree::from_nodes(nodes)
}

fn node_stats(node: usize, rows: &[usize], residual: &[f64], hessian: &[f64]) -> Open {
    Open {
        node,
        count: rows.len(),
        sum_residual: rows.iter().map(|&r| residual[r]).sum(),
        sum_hessian: rows.iter().map(|&r| hessian[r]).sum(),
    }
}

fn empty_open(node: usize) -> Open {
    Open {
        node,
        count: 0,
        sum_residual: 0.0,
        sum_hessian: 0.0,
    }
}

fn newton_step(stats: &Open) -> f64 {
    if stats.sum_hessian < 1e-12 {
        0.0
    } else {
        stats.sum_residual / stats.sum_hessian
    }
}

/// Least-squares split of the residuals for every open slot.
fn best_splits(
    x: &Array2<f64>,
    order: &[Vec<usize>],
    residual: &[f64],
    slot_of: &[Option<usize>],
    open: &[Open],
    min_obs: usize,
) -> Vec<Option<Candidate>> {
    let k = open.len();
    let mut best: Vec<Option<Candidate>> = vec![None; k];

    for (feature, rows) in order.iter().enumerate() {
        let mut left_count = vec![0usize; k];
        let mut left_sum = vec![0.0f64; k];
        let mut last: Vec<Option<f64>> = vec![None; k];

        for &r in rows {
            let Some(s) = slot_of[r] else { continue };
            let value = x[(r, feature)];
            if let Some(prev) = last[s] {
                if value > prev {
                    let node = &open[s];
                    let n_left = left_count[s];
                    let n_right = node.count - n_left;
                    if n_left >= min_obs && n_right >= min_obs {
                        let s_left = left_sum[s];
                        let s_right = node.sum_residual - s_left;
                        let gain = s_left * s_left / n_left as f64
                            + s_right * s_right / n_right as f64
                            - node.sum_residual * node.sum_residual / node.count as f64;
                        if gain > best[s].map_or(1e-12, |c| c.gain) {
                            best[s] = Some(Candidate {
                                feature,
                                threshold: split_threshold(prev, value),
                                gain,
                            });
                        }
                    }
                }
            }
            left_count[s] += 1;
            left_sum[s] += residual[r];
            last[s] = Some(value);
        }
    }

    best
}
