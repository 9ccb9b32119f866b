use log::warn;
use std::fmt;
use std::ops::Deref;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Discrete time index of a processing step
pub type Time = i64;

/// One `(measurement, time)` pair that belongs to one or more candidate trajectories.
///
/// Nodes are linked backward in time: `next` points to the predecessor (older) node. A node
/// shared by several hypotheses has `branch_count > 1`. The node is immutable once another node
/// links to it; the only exception is the branch counter itself.
///
pub struct TrajectoryNode<M> {
    measurement: M,
    time: Time,
    measurement_fitness: f32,
    trajectory_fitness: f32,
    prediction: RwLock<Option<M>>,
    next: Option<Trajectory<M>>,
    length: usize,
    branch_count: AtomicUsize,
}

impl<M> TrajectoryNode<M> {
    /// The measurement held by the node
    ///
    pub fn measurement(&self) -> &M {
        &self.measurement
    }

    /// Time index the measurement was observed at
    ///
    pub fn time(&self) -> Time {
        self.time
    }

    /// How well the measurement matched its predecessor
    ///
    pub fn measurement_fitness(&self) -> f32 {
        self.measurement_fitness
    }

    /// Aggregate fitness of the whole path ending at this node
    ///
    pub fn trajectory_fitness(&self) -> f32 {
        self.trajectory_fitness
    }

    /// The predecessor (older) node
    ///
    pub fn next(&self) -> Option<&Trajectory<M>> {
        self.next.as_ref()
    }

    /// Number of nodes from this one to the end of the chain (inclusive)
    ///
    pub fn length(&self) -> usize {
        self.length
    }

    /// Number of live nodes referencing this node as their predecessor
    ///
    pub fn branch_count(&self) -> usize {
        self.branch_count.load(Ordering::Acquire)
    }

    /// Number of nodes from this one up to the first shared node (`branch_count > 1`) or the end of the chain.
    ///
    /// The value is derived by walking the chain every time.
    ///
    pub fn length_to_branch(&self) -> usize {
        1 + self
            .iter()
            .skip(1)
            .take_while(|node| node.branch_count() <= 1)
            .count()
    }

    /// Iterates the chain from this node to the oldest one
    ///
    pub fn iter(&self) -> TrajectoryIter<'_, M> {
        TrajectoryIter { cursor: Some(self) }
    }

    /// Forecast for the next point, computed for the current step
    ///
    pub fn prediction(&self) -> Option<M>
    where
        M: Clone,
    {
        self.prediction
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Stores the forecast for the current step.
    ///
    /// Only an unshared node (no successors) may be updated, otherwise the call is ignored.
    ///
    pub(crate) fn set_prediction(&self, prediction: Option<M>) {
        let successors = self.branch_count();
        debug_assert_eq!(
            successors, 0,
            "Prediction must not be changed for the node shared by {} successors",
            successors
        );
        if successors > 0 {
            warn!(
                "Prediction update ignored for the node at time {} shared by {} successors",
                self.time, successors
            );
            return;
        }
        *self
            .prediction
            .write()
            .unwrap_or_else(PoisonError::into_inner) = prediction;
    }

    fn acquire_branch(&self) {
        self.branch_count.fetch_add(1, Ordering::AcqRel);
    }

    fn release_branch(&self) {
        let released =
            self.branch_count
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| c.checked_sub(1));
        debug_assert!(
            released.is_ok(),
            "Branch count underflow for the node at time {}",
            self.time
        );
        if released.is_err() {
            warn!("Branch count underflow for the node at time {}", self.time);
        }
    }
}

/// Nodes are dropped iteratively, so long unshared chains never exhaust the stack.
///
impl<M> Drop for TrajectoryNode<M> {
    fn drop(&mut self) {
        let mut next = self.next.take();
        while let Some(Trajectory(node)) = next {
            node.release_branch();
            next = match Arc::try_unwrap(node) {
                Ok(mut owned) => owned.next.take(),
                Err(_) => None,
            };
        }
    }
}

/// Two nodes are equal when they hold the same measurement at the same time
///
impl<M: PartialEq> PartialEq for TrajectoryNode<M> {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.measurement == other.measurement
    }
}

impl<M: fmt::Debug> fmt::Debug for TrajectoryNode<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrajectoryNode")
            .field("measurement", &self.measurement)
            .field("time", &self.time)
            .field("measurement_fitness", &self.measurement_fitness)
            .field("trajectory_fitness", &self.trajectory_fitness)
            .field("length", &self.length)
            .field("branch_count", &self.branch_count())
            .finish()
    }
}

/// Iterator over the chain, from the newest node to the oldest one
///
pub struct TrajectoryIter<'a, M> {
    cursor: Option<&'a TrajectoryNode<M>>,
}

impl<'a, M> Iterator for TrajectoryIter<'a, M> {
    type Item = &'a TrajectoryNode<M>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cursor?;
        self.cursor = node.next.as_deref();
        Some(node)
    }
}

/// Shared handle to the head node of a trajectory.
///
/// A trajectory is not a separate structure: it is the head node together with the chain of
/// its predecessors. Handles are cheap to clone; the chain is released when the last handle
/// (or successor) goes away.
///
pub struct Trajectory<M>(Arc<TrajectoryNode<M>>);

impl<M> Clone for Trajectory<M> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<M> Deref for Trajectory<M> {
    type Target = TrajectoryNode<M>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<M: PartialEq> PartialEq for Trajectory<M> {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl<M: fmt::Debug> fmt::Debug for Trajectory<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl<M> Trajectory<M> {
    /// Starts a brand-new trajectory
    ///
    pub fn new(measurement: M, time: Time, fitness: f32) -> Self {
        Self::extend(measurement, time, fitness, None)
    }

    /// Creates a new head node for `measurement` observed at `time`.
    ///
    /// # Parameters
    /// * `measurement` - the point that extends the trajectory
    /// * `time` - observation time, must not precede the predecessor time
    /// * `fitness` - how well the measurement matches the predecessor
    /// * `predecessor` - the trajectory to extend, `None` starts a new one
    ///
    /// The trajectory fitness of the new node is the mean of the measurement fitness values along the chain.
    ///
    pub fn extend(
        measurement: M,
        time: Time,
        fitness: f32,
        predecessor: Option<&Trajectory<M>>,
    ) -> Self {
        let trajectory_fitness = match predecessor {
            Some(p) => {
                debug_assert!(
                    time >= p.time,
                    "Trajectory cannot be extended backward in time: {} < {}",
                    time,
                    p.time
                );
                let len = p.length as f32;
                (p.trajectory_fitness * len + fitness) / (len + 1.0)
            }
            None => fitness,
        };
        Self::link(
            measurement,
            time,
            fitness,
            trajectory_fitness,
            predecessor.cloned(),
        )
    }

    /// Replaces the head by an unshared copy that links to the same predecessor.
    ///
    /// The visible length doesn't change. It is used to keep a trajectory alive when the
    /// original head is already shared by other branches.
    ///
    pub fn clone_head(&self) -> Self
    where
        M: Clone,
    {
        let head = Self::link(
            self.measurement.clone(),
            self.time,
            self.measurement_fitness,
            self.trajectory_fitness,
            self.next.clone(),
        );
        *head
            .prediction
            .write()
            .unwrap_or_else(PoisonError::into_inner) = self.prediction();
        head
    }

    fn link(
        measurement: M,
        time: Time,
        measurement_fitness: f32,
        trajectory_fitness: f32,
        next: Option<Trajectory<M>>,
    ) -> Self {
        let length = match &next {
            Some(n) => {
                n.acquire_branch();
                n.length + 1
            }
            None => 1,
        };
        Self(Arc::new(TrajectoryNode {
            measurement,
            time,
            measurement_fitness,
            trajectory_fitness,
            prediction: RwLock::new(None),
            next,
            length,
            branch_count: AtomicUsize::new(0),
        }))
    }

    /// Checks that both handles point to the very same node
    ///
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Returns the `(time, measurement)` pairs of the trajectory in chronological order
    ///
    pub fn points(&self) -> Vec<(Time, M)>
    where
        M: Clone,
    {
        let mut points = self
            .iter()
            .map(|n| (n.time, n.measurement.clone()))
            .collect::<Vec<_>>();
        points.reverse();
        points
    }
}

#[cfg(test)]
mod tests {
    use crate::node::Trajectory;
    use std::sync::Arc;

    #[test]
    fn extend_lengths() {
        let t1 = Trajectory::new(1, 0, 1.0);
        assert_eq!(t1.length(), 1);
        assert!(t1.next().is_none());

        let t2 = Trajectory::extend(2, 1, 0.5, Some(&t1));
        assert_eq!(t2.length(), 2);
        assert_eq!(t1.branch_count(), 1);
        assert!(t2.next().unwrap().ptr_eq(&t1));
        assert_eq!(t2.measurement_fitness(), 0.5);
        assert_eq!(t2.trajectory_fitness(), 0.75);

        let t3 = Trajectory::extend(3, 2, 0.0, Some(&t2));
        assert_eq!(t3.length(), 3);
        assert_eq!(t3.trajectory_fitness(), 0.5);
        assert_eq!(t3.iter().count(), t3.length());
    }

    #[test]
    fn branching() {
        let root = Trajectory::new(0, 0, 1.0);
        let b1 = Trajectory::extend(1, 1, 1.0, Some(&root));
        let b2 = Trajectory::extend(2, 1, 1.0, Some(&root));
        assert_eq!(root.branch_count(), 2);
        assert_eq!(b1.length_to_branch(), 1);
        assert_eq!(b2.length_to_branch(), 1);

        let b11 = Trajectory::extend(11, 2, 1.0, Some(&b1));
        assert_eq!(b11.length_to_branch(), 2);
        assert_eq!(b11.length(), 3);

        drop(b2);
        assert_eq!(root.branch_count(), 1);
        assert_eq!(b11.length_to_branch(), 3);
    }

    #[test]
    fn clone_head_keeps_length() {
        let root = Trajectory::new(0, 0, 1.0);
        let head = Trajectory::extend(1, 1, 0.5, Some(&root));
        let branch = Trajectory::extend(2, 2, 1.0, Some(&head));
        assert_eq!(head.branch_count(), 1);

        let clone = head.clone_head();
        assert!(!clone.ptr_eq(&head));
        assert_eq!(clone, head);
        assert_eq!(clone.length(), head.length());
        assert_eq!(clone.trajectory_fitness(), head.trajectory_fitness());
        assert_eq!(clone.branch_count(), 0);
        assert_eq!(root.branch_count(), 2);

        drop(head);
        drop(branch);
        assert_eq!(root.branch_count(), 1);
        assert_eq!(clone.length(), 2);
    }

    #[test]
    fn clone_head_of_fresh_trajectory() {
        let root = Trajectory::new(7, 3, 1.0);
        let clone = root.clone_head();
        assert!(clone.next().is_none());
        assert_eq!(clone.length(), 1);
        assert_eq!(clone.time(), 3);
    }

    #[test]
    fn cascade_release() {
        let root = Trajectory::new(0, 0, 1.0);
        let weak_root = Arc::downgrade(&root.0);
        let mut head = Trajectory::extend(1, 1, 1.0, Some(&root));
        drop(root);
        for i in 2..10 {
            head = Trajectory::extend(i, i as i64, 1.0, Some(&head));
        }
        let weak_head = Arc::downgrade(&head.0);
        let fork = Trajectory::extend(100, 10, 1.0, head.next());
        assert!(weak_root.upgrade().is_some());

        drop(head);
        assert!(weak_head.upgrade().is_none());
        assert!(weak_root.upgrade().is_some());

        drop(fork);
        assert!(weak_root.upgrade().is_none());
    }

    #[test]
    fn long_chain_drop() {
        let mut head = Trajectory::new(0_usize, 0, 1.0);
        for i in 1..500_000 {
            head = Trajectory::extend(i, i as i64, 1.0, Some(&head));
        }
        assert_eq!(head.length(), 500_000);
        drop(head);
    }

    #[test]
    fn equality() {
        let a = Trajectory::new(5, 1, 1.0);
        let b = Trajectory::new(5, 1, 0.1);
        let c = Trajectory::new(5, 2, 1.0);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn points_in_chronological_order() {
        let t = Trajectory::new('a', 0, 1.0);
        let t = Trajectory::extend('b', 1, 1.0, Some(&t));
        let t = Trajectory::extend('c', 3, 1.0, Some(&t));
        assert_eq!(t.points(), vec![(0, 'a'), (1, 'b'), (3, 'c')]);
        let times = t.iter().map(|n| n.time()).collect::<Vec<_>>();
        assert!(times.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn prediction_update() {
        let t = Trajectory::new(1, 0, 1.0);
        assert!(t.prediction().is_none());
        t.set_prediction(Some(2));
        assert_eq!(t.prediction(), Some(2));
        assert_eq!(t.prediction(), Some(2));
        let clone = t.clone_head();
        assert_eq!(clone.prediction(), Some(2));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn shared_node_prediction_is_frozen() {
        let t = Trajectory::new(1, 0, 1.0);
        let _succ = Trajectory::extend(2, 1, 1.0, Some(&t));
        t.set_prediction(Some(3));
    }
}
