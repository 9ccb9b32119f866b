use crate::node::{Time, Trajectory};
use crate::trackers::tracker_api::TrajectoryTracker;
use itertools::Itertools;
use log::{debug, trace, warn};
use std::mem::take;

/// Per-step bookkeeping handed to the fitness callback.
///
/// It carries the indices of the measurement and the trajectory being evaluated, so the model can
/// correlate the callbacks with its own per-step scratch buffers.
///
#[derive(Debug)]
pub struct StepContext<S> {
    measurement_index: usize,
    trajectory_index: Option<usize>,
    /// Model-defined scratch data that lives for one step
    pub scratch: S,
}

impl<S> StepContext<S> {
    pub fn new(scratch: S) -> Self {
        Self {
            measurement_index: 0,
            trajectory_index: None,
            scratch,
        }
    }

    /// Index of the measurement being evaluated
    ///
    pub fn current_measurement_index(&self) -> usize {
        self.measurement_index
    }

    /// Index of the old trajectory being evaluated, `None` when a new trajectory is evaluated
    ///
    pub fn current_trajectory_index(&self) -> Option<usize> {
        self.trajectory_index
    }

    pub fn into_scratch(self) -> S {
        self.scratch
    }
}

/// Policy plugged into the generic association algorithm.
///
/// The algorithm itself has no numeric policy: the model decides how well a measurement fits a
/// trajectory, how new heads are created and what happens with the old heads after the step.
///
pub trait HypothesisModel<M: Clone> {
    /// Scratch data that lives for one step
    type Scratch;

    /// Invoked with the snapshot of active trajectories before the association runs
    ///
    fn begin_step(
        &mut self,
        trajectories: &[Trajectory<M>],
        measurements: &[M],
        t: Time,
    ) -> Self::Scratch;

    /// Scores the measurement against the trajectory.
    ///
    /// # Parameters
    /// * `ctx` - step context with the current indices
    /// * `trajectory` - old trajectory or `None` when a brand-new trajectory is evaluated
    /// * `measurement` - the measurement
    /// * `t` - current time
    ///
    /// # Returns
    /// Fitness within `[0; 1]`, zero means the pair is rejected.
    ///
    fn measure_fit(
        &self,
        ctx: &mut StepContext<Self::Scratch>,
        trajectory: Option<&Trajectory<M>>,
        measurement: &M,
        t: Time,
    ) -> f32;

    /// Creates the new head for an accepted pair. The head must link to `trajectory`.
    ///
    fn create_trajectory(
        &self,
        trajectory: Option<&Trajectory<M>>,
        measurement: &M,
        fitness: f32,
        t: Time,
    ) -> Trajectory<M> {
        Trajectory::extend(measurement.clone(), t, fitness, trajectory)
    }

    /// Builds the final active set from the consumed old heads and the freshly created ones
    ///
    fn end_step(
        &mut self,
        _old: Vec<Trajectory<M>>,
        new: Vec<Trajectory<M>>,
        _scratch: Self::Scratch,
        _t: Time,
    ) -> Vec<Trajectory<M>> {
        new
    }
}

fn checked_fitness(score: f32) -> f32 {
    debug_assert!(
        (0.0..=1.0).contains(&score),
        "Fitness must be within [0; 1], got {}",
        score
    );
    if score.is_nan() {
        warn!("NaN fitness is treated as a rejection");
        0.0
    } else if !(0.0..=1.0).contains(&score) {
        warn!("Fitness {} is clamped to [0; 1]", score);
        score.clamp(0.0, 1.0)
    } else {
        score
    }
}

/// One greedy association step.
///
/// Every `(trajectory, measurement)` pair is scored and every pair with positive fitness spawns a
/// new head, so one trajectory may branch into several hypotheses. Then every measurement is scored
/// as the start of a brand-new trajectory. The input snapshot is never modified; the new heads are
/// returned in a fresh collection.
///
pub fn associate<M, H>(
    model: &H,
    trajectories: &[Trajectory<M>],
    measurements: &[M],
    t: Time,
    ctx: &mut StepContext<H::Scratch>,
) -> Vec<Trajectory<M>>
where
    M: Clone,
    H: HypothesisModel<M>,
{
    let mut created = Vec::new();

    for ((i, trajectory), (j, measurement)) in trajectories
        .iter()
        .enumerate()
        .cartesian_product(measurements.iter().enumerate())
    {
        ctx.trajectory_index = Some(i);
        ctx.measurement_index = j;
        let score = checked_fitness(model.measure_fit(ctx, Some(trajectory), measurement, t));
        if score > 0.0 {
            let head = model.create_trajectory(Some(trajectory), measurement, score, t);
            debug_assert!(
                head.next().map_or(false, |n| n.ptr_eq(trajectory)),
                "The created head must extend the evaluated trajectory"
            );
            trace!(
                "Trajectory #{} extended with measurement #{} at {}, fitness={}",
                i,
                j,
                t,
                score
            );
            created.push(head);
        }
    }

    ctx.trajectory_index = None;
    for (j, measurement) in measurements.iter().enumerate() {
        ctx.measurement_index = j;
        let score = checked_fitness(model.measure_fit(ctx, None, measurement, t));
        if score > 0.0 {
            let head = model.create_trajectory(None, measurement, score, t);
            debug_assert!(
                head.next().is_none(),
                "The created head of a new trajectory must not have a predecessor"
            );
            trace!(
                "New trajectory seeded with measurement #{} at {}, fitness={}",
                j,
                t,
                score
            );
            created.push(head);
        }
    }

    created
}

/// Greedy multi-hypothesis tracker parameterized by the measurement type and the model
///
pub struct MultiHypothesisTracker<M, H> {
    model: H,
    trajectories: Vec<Trajectory<M>>,
    last_time: Option<Time>,
}

impl<M, H> MultiHypothesisTracker<M, H>
where
    M: Clone,
    H: HypothesisModel<M>,
{
    /// Creates the tracker with no active trajectories
    ///
    pub fn with_model(model: H) -> Self {
        Self {
            model,
            trajectories: Vec::new(),
            last_time: None,
        }
    }

    /// Processes the measurements observed at time `t`.
    ///
    /// The active set is replaced as a whole: the old heads are handed to the model, the new set is
    /// built from scratch and swapped in at the end of the step.
    ///
    pub fn add_measurements(&mut self, measurements: &[M], t: Time) {
        if let Some(last) = self.last_time {
            debug_assert!(t >= last, "Time must not decrease: {} < {}", t, last);
        }
        self.last_time = Some(t);

        let old = take(&mut self.trajectories);
        let scratch = self.model.begin_step(&old, measurements, t);
        let mut ctx = StepContext::new(scratch);
        let created = associate(&self.model, &old, measurements, t, &mut ctx);
        debug!(
            "Step {}: {} measurements, {} old trajectories, {} new heads",
            t,
            measurements.len(),
            old.len(),
            created.len()
        );
        self.trajectories = self.model.end_step(old, created, ctx.into_scratch(), t);
    }

    /// Heads of the currently active trajectories
    ///
    pub fn trajectories(&self) -> &[Trajectory<M>] {
        &self.trajectories
    }

    /// Time of the last processed step
    ///
    pub fn current_time(&self) -> Option<Time> {
        self.last_time
    }

    pub fn model(&self) -> &H {
        &self.model
    }

    pub fn model_mut(&mut self) -> &mut H {
        &mut self.model
    }

    pub(crate) fn parts_mut(&mut self) -> (&mut H, &mut Vec<Trajectory<M>>) {
        (&mut self.model, &mut self.trajectories)
    }
}

impl<M, H> TrajectoryTracker<M> for MultiHypothesisTracker<M, H>
where
    M: Clone,
    H: HypothesisModel<M>,
{
    fn add_measurements(&mut self, measurements: &[M], t: Time) {
        MultiHypothesisTracker::add_measurements(self, measurements, t)
    }

    fn trajectories(&self) -> &[Trajectory<M>] {
        MultiHypothesisTracker::trajectories(self)
    }
}
