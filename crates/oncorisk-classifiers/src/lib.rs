//! oncorisk-classifiers: model comparison helpers for cancer risk-factor data.
//!
//! This crate loads and imputes the risk-factor table, builds stratified
//! train/test partitions, runs repeated stratified cross-validation over a
//! small family of classifiers (logistic regression, random forest, gradient
//! boosting), rebalances the training partition with ADASYN and scores the
//! held-out partition with confusion-matrix metrics and ROC curves.
//!
//! Every source of randomness takes an explicit seed so a run can be
//! reproduced exactly.
pub mod config;
pub mod cross_validation;
pub mod data_handling;
pub mod error;
pub mod evaluation;
pub mod io;
pub mod math;
pub mod models;
pub mod preprocessing;
pub mod resampling;
pub mod split;
pub mod stats;
