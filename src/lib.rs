use thiserror::Error;

/// Branching trajectory graph: nodes, handles and traversal
pub mod node;

/// Prediction models that extrapolate the next point of a trajectory
pub mod prediction;

/// Multi-hypothesis tracker implementations (generic, coordinate and extended)
pub mod trackers;

/// Coordinate helpers
pub mod utils;

/// Synthetic data generators for tests and benchmarks
pub mod test_stuff;

/// Most used types
pub mod prelude;

pub use nalgebra;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Errors {
    #[error("Threshold `{0}` must be a finite positive squared distance, got {1}.")]
    InvalidDistanceThreshold(&'static str, f32),
    #[error("Good fitness threshold must be within [0; 1], got {0}.")]
    InvalidFitnessThreshold(f32),
    #[error("Maximum stop time must be at least 1, got {0}.")]
    InvalidStopTime(i64),
    #[error("Maximum prediction length must be at least 1, got {0}.")]
    InvalidPredictionLength(usize),
    #[error("Measurement #{0} has {1} components while the tracker expects {2}.")]
    DimensionMismatch(usize, usize, usize),
    #[error("Scene {0} is not registered in the batch.")]
    MissingScene(u64),
}

pub(crate) const EPS: f32 = 0.00001;

/// Estimates two objects are close to each other
pub trait EstimateClose {
    fn almost_same(&self, other: &Self, eps: f32) -> bool;
}

impl EstimateClose for f32 {
    fn almost_same(&self, other: &Self, eps: f32) -> bool {
        (self - other).abs() < eps
    }
}
