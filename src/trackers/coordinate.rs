use crate::node::{Time, Trajectory, TrajectoryNode};
use crate::prediction::{ConstantVelocity, PredictionModel};
use crate::trackers::hypothesis::{HypothesisModel, MultiHypothesisTracker, StepContext};
use crate::trackers::options::TrackerConfig;
use crate::utils::point::{squared_distance, Point};

/// Distance-based fitness of a measurement against a trajectory head
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceFitness {
    prediction_threshold: f32,
    initial_threshold: f32,
}

impl DistanceFitness {
    pub fn new(config: &TrackerConfig) -> Self {
        Self {
            prediction_threshold: config.prediction_threshold(),
            initial_threshold: config.initial_threshold(),
        }
    }

    /// Scores the measurement.
    ///
    /// * head with a prediction: linear falloff from `1` at the prediction to `0` at the squared
    ///   distance `prediction_threshold` and beyond;
    /// * head without a prediction: `1` when the squared distance to the head is below
    ///   `initial_threshold`, `0` otherwise.
    ///
    pub fn score<const D: usize>(
        &self,
        head: &TrajectoryNode<Point<D>>,
        measurement: &Point<D>,
    ) -> f32 {
        match head.prediction() {
            Some(prediction) => {
                let d = squared_distance(&prediction, measurement);
                ((self.prediction_threshold - d) / self.prediction_threshold).clamp(0.0, 1.0)
            }
            None => {
                if squared_distance(head.measurement(), measurement) < self.initial_threshold {
                    1.0
                } else {
                    0.0
                }
            }
        }
    }
}

/// Hypothesis model for D-dimensional points.
///
/// New trajectories are seeded only at `t == 0`.
///
pub struct CoordinateModel<const D: usize, P = ConstantVelocity> {
    fitness: DistanceFitness,
    prediction: P,
}

impl<const D: usize, P> CoordinateModel<D, P>
where
    P: PredictionModel<D>,
{
    pub fn new(config: &TrackerConfig, prediction: P) -> Self {
        Self {
            fitness: DistanceFitness::new(config),
            prediction,
        }
    }

    pub fn fitness(&self) -> &DistanceFitness {
        &self.fitness
    }

    /// Stores the forecast for time `t` on every head
    ///
    pub fn predict(&self, trajectories: &[Trajectory<Point<D>>], t: Time) {
        for trajectory in trajectories {
            trajectory.set_prediction(self.prediction.predict(trajectory, t));
        }
    }
}

impl<const D: usize, P> HypothesisModel<Point<D>> for CoordinateModel<D, P>
where
    P: PredictionModel<D>,
{
    type Scratch = ();

    fn begin_step(
        &mut self,
        trajectories: &[Trajectory<Point<D>>],
        _measurements: &[Point<D>],
        t: Time,
    ) -> Self::Scratch {
        self.predict(trajectories, t);
    }

    fn measure_fit(
        &self,
        _ctx: &mut StepContext<Self::Scratch>,
        trajectory: Option<&Trajectory<Point<D>>>,
        measurement: &Point<D>,
        t: Time,
    ) -> f32 {
        match trajectory {
            Some(trajectory) => self.fitness.score(trajectory, measurement),
            None if t == 0 => 1.0,
            None => 0.0,
        }
    }
}

/// Multi-hypothesis tracker of D-dimensional points
///
pub type CoordinateTracker<const D: usize, P = ConstantVelocity> =
    MultiHypothesisTracker<Point<D>, CoordinateModel<D, P>>;

impl<const D: usize> CoordinateTracker<D> {
    /// Creates the tracker with constant velocity prediction
    ///
    pub fn new(config: &TrackerConfig) -> Self {
        Self::with_prediction(
            config,
            ConstantVelocity::new(config.maximum_prediction_length()),
        )
    }
}

impl<const D: usize, P> CoordinateTracker<D, P>
where
    P: PredictionModel<D>,
{
    /// Creates the tracker with a custom prediction model
    ///
    pub fn with_prediction(config: &TrackerConfig, prediction: P) -> Self {
        Self::with_model(CoordinateModel::new(config, prediction))
    }
}
