//! lungrisk: Lung Disease Risk Classification Library
//!
//! Cleans and encodes lifestyle and medical-history survey records, fits a
//! regularized logistic regression chosen by cross-validated grid search,
//! evaluates it on a holdout split and stores it for scoring new records.

pub mod cli;
pub mod pipeline;
pub mod report;
pub mod utils;
