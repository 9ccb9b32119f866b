use crate::node::{Time, TrajectoryNode};
use crate::utils::point::Point;

/// Model that forecasts where the trajectory is going to be at time `t`.
///
/// The forecast is computed once per step for every active head and consumed by the
/// fitness function during the same step.
///
pub trait PredictionModel<const D: usize>: Send + Sync {
    /// Returns the forecast or `None` when the trajectory history is too short
    ///
    fn predict(&self, head: &TrajectoryNode<Point<D>>, t: Time) -> Option<Point<D>>;
}

/// Linear extrapolation of the displacement between the head and an earlier reference point
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantVelocity {
    max_lookback: usize,
}

impl ConstantVelocity {
    /// Creates the model
    ///
    /// # Parameters
    /// * `max_lookback` - how many distinct earlier time instants the reference point may be away from the head
    ///
    pub fn new(max_lookback: usize) -> Self {
        assert!(max_lookback > 0, "Lookback must be at least 1");
        Self { max_lookback }
    }

    pub fn max_lookback(&self) -> usize {
        self.max_lookback
    }
}

impl Default for ConstantVelocity {
    fn default() -> Self {
        Self::new(1)
    }
}

impl<const D: usize> PredictionModel<D> for ConstantVelocity {
    fn predict(&self, head: &TrajectoryNode<Point<D>>, t: Time) -> Option<Point<D>> {
        predict_constant_velocity(head, t, self.max_lookback)
    }
}

/// The object is expected to stay where it was observed last time
///
#[derive(Debug, Clone, Copy, Default)]
pub struct Stationary;

impl<const D: usize> PredictionModel<D> for Stationary {
    fn predict(&self, head: &TrajectoryNode<Point<D>>, _t: Time) -> Option<Point<D>> {
        Some(*head.measurement())
    }
}

/// Never predicts: the fitness always falls back to the proximity gate
///
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPrediction;

impl<const D: usize> PredictionModel<D> for NoPrediction {
    fn predict(&self, _head: &TrajectoryNode<Point<D>>, _t: Time) -> Option<Point<D>> {
        None
    }
}

/// Constant velocity forecast for time `t`.
///
/// Walks from the head to older nodes, skipping nodes that repeat the previous time stamp, and
/// picks the node `max_lookback` distinct time instants away (or the oldest distinct one if the
/// chain is shorter) as the reference. The head-to-reference displacement is scaled by
/// `(t - head.time) / (head.time - reference.time)` and added to the head.
///
/// Returns `None` if the chain has no earlier distinct time instant.
///
pub fn predict_constant_velocity<const D: usize>(
    head: &TrajectoryNode<Point<D>>,
    t: Time,
    max_lookback: usize,
) -> Option<Point<D>> {
    let mut reference = None;
    let mut last_time = head.time();
    let mut lookback = 0;
    for node in head.iter().skip(1) {
        if lookback >= max_lookback {
            break;
        }
        if node.time() == last_time {
            continue;
        }
        last_time = node.time();
        reference = Some(node);
        lookback += 1;
    }

    let reference = reference?;
    let observed_gap = (head.time() - reference.time()) as f32;
    let requested_gap = (t - head.time()) as f32;
    let movement = (head.measurement() - reference.measurement()) * (requested_gap / observed_gap);
    Some(head.measurement() + movement)
}
