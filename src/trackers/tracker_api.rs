use crate::node::{Time, Trajectory};
use crate::utils::point::{points_from_list, points_from_matrix, Point};
use anyhow::Result;
use nalgebra::DMatrix;

/// Step-driven tracker of measurements of type `M`
///
pub trait TrajectoryTracker<M> {
    /// Processes the measurements observed at time `t`. Time must not decrease between calls.
    ///
    fn add_measurements(&mut self, measurements: &[M], t: Time);

    /// Heads of the currently active trajectories
    ///
    fn trajectories(&self) -> &[Trajectory<M>];
}

/// Convenience entry points for trackers of D-dimensional points
///
pub trait CoordinateTrackerAPI<const D: usize>: TrajectoryTracker<Point<D>> {
    /// Processes measurements passed as a `N x D` matrix, one point per row
    ///
    fn add_measurement_matrix(&mut self, measurements: &DMatrix<f32>, t: Time) -> Result<()> {
        let points = points_from_matrix::<D>(measurements)?;
        self.add_measurements(&points, t);
        Ok(())
    }

    /// Processes measurements passed as a list of coordinate vectors
    ///
    fn add_measurement_list(&mut self, measurements: &[Vec<f32>], t: Time) -> Result<()> {
        let points = points_from_list::<D>(measurements)?;
        self.add_measurements(&points, t);
        Ok(())
    }
}

impl<const D: usize, T> CoordinateTrackerAPI<D> for T where T: TrajectoryTracker<Point<D>> {}
