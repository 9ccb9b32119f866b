use crate::node::{Time, Trajectory};
use crate::prediction::ConstantVelocity;
use crate::trackers::coordinate::CoordinateModel;
use crate::trackers::hypothesis::{HypothesisModel, MultiHypothesisTracker, StepContext};
use crate::trackers::lifecycle::{DropTrajectories, TrajectorySink};
use crate::trackers::options::TrackerConfig;
use crate::utils::point::Point;
use log::debug;
use std::mem::take;

/// Best fitness seen during the step for every measurement and every old trajectory
///
#[derive(Debug, Default, Clone)]
pub struct FitnessLedger {
    pub max_measurement_fitness: Vec<f32>,
    pub max_trajectory_fitness: Vec<f32>,
}

impl FitnessLedger {
    pub fn new(measurements: usize, trajectories: usize) -> Self {
        Self {
            max_measurement_fitness: vec![0.0; measurements],
            max_trajectory_fitness: vec![0.0; trajectories],
        }
    }
}

/// Coordinate model with trajectory lifecycle.
///
/// * a measurement that matched nothing well starts a new trajectory;
/// * a trajectory that found no good continuation is kept alive unextended;
/// * a trajectory not extended for more than `maximum_stop_time` steps is terminated and handed
///   to the sink.
///
pub struct ExtendedModel<const D: usize, L = DropTrajectories> {
    base: CoordinateModel<D, ConstantVelocity>,
    good_fitness_threshold: f32,
    maximum_stop_time: Time,
    merge_converging: bool,
    sink: L,
}

impl<const D: usize, L> ExtendedModel<D, L>
where
    L: TrajectorySink<Point<D>>,
{
    pub fn new(config: &TrackerConfig, sink: L) -> Self {
        Self {
            base: CoordinateModel::new(
                config,
                ConstantVelocity::new(config.maximum_prediction_length()),
            ),
            good_fitness_threshold: config.good_fitness_threshold(),
            maximum_stop_time: config.maximum_stop_time(),
            merge_converging: config.merge_converging(),
            sink,
        }
    }

    pub fn sink(&self) -> &L {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut L {
        &mut self.sink
    }

    /// Old heads that found no good continuation are kept: unshared heads as they are, heads
    /// that branched anyway are replaced by an unshared copy.
    ///
    fn retain_unmatched(
        &self,
        old: Vec<Trajectory<Point<D>>>,
        ledger: &FitnessLedger,
        active: &mut Vec<Trajectory<Point<D>>>,
    ) -> usize {
        let mut retained = 0;
        for (trajectory, best) in old.into_iter().zip(&ledger.max_trajectory_fitness) {
            if *best > self.good_fitness_threshold {
                continue;
            }
            retained += 1;
            if trajectory.branch_count() > 0 {
                active.push(trajectory.clone_head());
            } else {
                active.push(trajectory);
            }
        }
        retained
    }
}

/// Collapses heads with the same time and measurement, keeping the best trajectory fitness
///
fn merge_converging_heads<M: PartialEq>(heads: Vec<Trajectory<M>>) -> Vec<Trajectory<M>> {
    let mut merged: Vec<Trajectory<M>> = Vec::with_capacity(heads.len());
    for head in heads {
        match merged.iter_mut().find(|m| **m == head) {
            Some(existing) => {
                if head.trajectory_fitness() > existing.trajectory_fitness() {
                    *existing = head;
                }
            }
            None => merged.push(head),
        }
    }
    merged
}

impl<const D: usize, L> HypothesisModel<Point<D>> for ExtendedModel<D, L>
where
    L: TrajectorySink<Point<D>>,
{
    type Scratch = FitnessLedger;

    fn begin_step(
        &mut self,
        trajectories: &[Trajectory<Point<D>>],
        measurements: &[Point<D>],
        t: Time,
    ) -> Self::Scratch {
        self.base.predict(trajectories, t);
        FitnessLedger::new(measurements.len(), trajectories.len())
    }

    fn measure_fit(
        &self,
        ctx: &mut StepContext<Self::Scratch>,
        trajectory: Option<&Trajectory<Point<D>>>,
        measurement: &Point<D>,
        _t: Time,
    ) -> f32 {
        let j = ctx.current_measurement_index();
        match trajectory {
            Some(trajectory) => {
                let score = self.base.fitness().score(trajectory, measurement);
                let i = ctx.current_trajectory_index();
                let ledger = &mut ctx.scratch;
                ledger.max_measurement_fitness[j] = ledger.max_measurement_fitness[j].max(score);
                if let Some(i) = i {
                    ledger.max_trajectory_fitness[i] = ledger.max_trajectory_fitness[i].max(score);
                }
                score
            }
            None => {
                let best = ctx.scratch.max_measurement_fitness[j];
                if best <= self.good_fitness_threshold {
                    1.0 - best
                } else {
                    0.0
                }
            }
        }
    }

    fn end_step(
        &mut self,
        old: Vec<Trajectory<Point<D>>>,
        new: Vec<Trajectory<Point<D>>>,
        ledger: Self::Scratch,
        t: Time,
    ) -> Vec<Trajectory<Point<D>>> {
        let created = new.len();
        let mut active = new;
        let retained = self.retain_unmatched(old, &ledger, &mut active);

        if self.merge_converging {
            active = merge_converging_heads(active);
        }

        let max_stop = self.maximum_stop_time;
        let (active, evicted): (Vec<_>, Vec<_>) = active
            .into_iter()
            .partition(|trajectory| t - trajectory.time() <= max_stop);

        debug!(
            "Step {}: {} created, {} retained, {} evicted, {} active",
            t,
            created,
            retained,
            evicted.len(),
            active.len()
        );
        self.sink.end_trajectories(evicted, t);
        active
    }
}

/// Coordinate tracker with branch retention and stop-time termination
///
pub type ExtendedCoordinateTracker<const D: usize, L = DropTrajectories> =
    MultiHypothesisTracker<Point<D>, ExtendedModel<D, L>>;

impl<const D: usize> ExtendedCoordinateTracker<D> {
    /// Creates the tracker that drops terminated trajectories
    ///
    pub fn new(config: &TrackerConfig) -> Self {
        Self::with_sink(config, DropTrajectories)
    }
}

impl<const D: usize, L> ExtendedCoordinateTracker<D, L>
where
    L: TrajectorySink<Point<D>>,
{
    /// Creates the tracker that hands terminated trajectories to `sink`
    ///
    pub fn with_sink(config: &TrackerConfig, sink: L) -> Self {
        Self::with_model(ExtendedModel::new(config, sink))
    }

    pub fn sink(&self) -> &L {
        self.model().sink()
    }

    pub fn sink_mut(&mut self) -> &mut L {
        self.model_mut().sink_mut()
    }

    /// Terminates every active trajectory, e.g. when the stream ends
    ///
    pub fn terminate_all(&mut self, t: Time) {
        let (model, trajectories) = self.parts_mut();
        let ended = take(trajectories);
        debug!("Terminating {} trajectories at {}", ended.len(), t);
        model.sink.end_trajectories(ended, t);
    }
}
