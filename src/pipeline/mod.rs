//! Pipeline module - the training and scoring stages

pub mod correlation;
pub mod dataset;
pub mod eda;
pub mod error;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod pca;
pub mod preprocess;
pub mod runner;
pub mod scaler;
pub mod schema;
pub mod search;
pub mod split;
pub mod store;
pub mod target;

pub use correlation::*;
pub use dataset::*;
pub use eda::*;
pub use error::PipelineError;
pub use loader::*;
pub use metrics::*;
pub use model::*;
pub use pca::*;
pub use preprocess::*;
pub use runner::*;
pub use scaler::*;
pub use schema::*;
pub use search::*;
pub use split::*;
pub use store::*;
pub use target::*;
