//! CLI module - argument parsing, prompts and the predict command

mod args;
pub mod predict;
mod prompts;

pub use args::*;
pub use prompts::*;
