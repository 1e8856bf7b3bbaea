//! Post-classification filters

mod eliminate;

pub use eliminate::{Connectivity, EliminationSummary, SinglePixelEliminator};
