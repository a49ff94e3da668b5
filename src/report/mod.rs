//! Report module - terminal summary and JSON export of a training run

pub mod export;
pub mod summary;

pub use export::*;
pub use summary::*;
