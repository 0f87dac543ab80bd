//! ks-opt: random-search design optimization over sketch models.
//!
//! The engine samples design variables inside their bounds, applies them to
//! a copy of the model snapshot, simulates the required cases through a
//! caller-supplied [`Simulator`], and scores each trial with a linear
//! constraint-penalty method. [`worker::SearchWorker`] runs the search on a
//! dedicated thread and reports over a channel.

pub mod apply;
pub mod engine;
pub mod spec;
pub mod worker;

pub use apply::apply_design_vars;
pub use engine::{BestRecord, SearchOutcome, SimRun, Simulator, run_search};
pub use spec::{Comparator, ConstraintSpec, DesignVariable, Direction, ObjectiveSpec, SearchSpec};
pub use worker::{SearchMessage, SearchWorker};

pub type OptResult<T> = Result<T, OptError>;

#[derive(thiserror::Error, Debug)]
pub enum OptError {
    #[error("No cases available.")]
    NoCases,

    #[error("invalid bounds for design variable '{name}': {lower}..{upper}")]
    InvalidBounds {
        name: String,
        lower: f64,
        upper: f64,
    },

    #[error("simulation failed: {0}")]
    Simulation(String),
}
