pub mod matrix;
mod raptor;
mod reconstruct;
pub mod state;

pub use raptor::{pareto_filter, solve, Raptor};
pub use state::{RaptorState, ViaTimes, MAX_ROUNDS, MAX_TRANSFERS, MAX_VIAS};
