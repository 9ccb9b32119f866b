pub use crate::node::{Time, Trajectory, TrajectoryNode};
pub use crate::prediction::{ConstantVelocity, NoPrediction, PredictionModel, Stationary};
pub use crate::trackers::batch::{BatchRecords, SceneBatch};
pub use crate::trackers::coordinate::{CoordinateModel, CoordinateTracker, DistanceFitness};
pub use crate::trackers::extended::{ExtendedCoordinateTracker, ExtendedModel};
pub use crate::trackers::hypothesis::{HypothesisModel, MultiHypothesisTracker, StepContext};
pub use crate::trackers::lifecycle::{CollectTrajectories, DropTrajectories, TrajectorySink};
pub use crate::trackers::options::{TrackerConfig, TrackerOptions};
pub use crate::trackers::tracker_api::{CoordinateTrackerAPI, TrajectoryTracker};
pub use crate::utils::point::{point2, Point};
