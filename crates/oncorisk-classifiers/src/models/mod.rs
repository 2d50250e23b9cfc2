pub mod boosting;
pub mod logistic;
pub mod random_forest;
pub mod tree;

pub mod classifier_trait;
pub mod factory;
