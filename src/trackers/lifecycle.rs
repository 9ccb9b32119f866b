use crate::node::{Time, Trajectory};
use std::mem::take;

/// Receives trajectories that were terminated by the tracker.
///
/// The callback is invoked synchronously at the end of every step with the evicted trajectories
/// (possibly none). Downstream consumers walk the chains from the head to compute their statistics.
///
pub trait TrajectorySink<M> {
    fn end_trajectories(&mut self, evicted: Vec<Trajectory<M>>, t: Time);
}

/// Releases terminated trajectories right away
///
#[derive(Default, Clone, Debug)]
pub struct DropTrajectories;

impl<M> TrajectorySink<M> for DropTrajectories {
    fn end_trajectories(&mut self, _evicted: Vec<Trajectory<M>>, _t: Time) {}
}

/// Keeps terminated trajectories until they are drained
///
#[derive(Clone, Debug)]
pub struct CollectTrajectories<M> {
    ended: Vec<(Time, Trajectory<M>)>,
}

impl<M> Default for CollectTrajectories<M> {
    fn default() -> Self {
        Self { ended: Vec::new() }
    }
}

impl<M> CollectTrajectories<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes the collected trajectories together with the time they were terminated at
    ///
    pub fn drain(&mut self) -> Vec<(Time, Trajectory<M>)> {
        take(&mut self.ended)
    }

    pub fn len(&self) -> usize {
        self.ended.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ended.is_empty()
    }
}

impl<M> TrajectorySink<M> for CollectTrajectories<M> {
    fn end_trajectories(&mut self, evicted: Vec<Trajectory<M>>, t: Time) {
        self.ended.extend(evicted.into_iter().map(|tr| (t, tr)));
    }
}
