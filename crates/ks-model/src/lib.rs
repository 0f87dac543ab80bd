//! ks-model: sketch model schema and derived data shapes.
//!
//! Contains:
//! - snapshot (serialized sketch geometry: points, links, angles, params)
//! - registry (named parameter store with expression derivation)
//! - frame (dynamic per-step simulation records)
//! - status (simulator status records)
//! - case (simulation case specification)
//! - signals (frames + snapshot -> signal table)

pub mod case;
pub mod frame;
pub mod registry;
pub mod signals;
pub mod snapshot;
pub mod status;

pub use case::CaseSpec;
pub use frame::{Frame, FrameValue};
pub use registry::ParameterRegistry;
pub use signals::{build_signals, model_variable_signals};
pub use snapshot::{AngleDim, Link, ModelSnapshot, ParamEntry, Point, SnapshotConstraint};
pub use status::RunStatus;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("Invalid parameter name: {0:?}")]
    InvalidParamName(String),
}
