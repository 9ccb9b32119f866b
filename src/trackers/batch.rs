use crate::node::Time;
use crate::trackers::tracker_api::TrajectoryTracker;
use crate::Errors;
use anyhow::Result;
use log::debug;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::collections::HashMap;

/// Measurements of one step grouped by scene id
pub type BatchRecords<M> = HashMap<u64, Vec<M>>;

/// Independent trackers keyed by a scene id (camera, realm, etc.).
///
/// Scenes never share trajectories, so every step runs them in parallel. Inside a scene the step
/// is still a single sequential transformation.
///
pub struct SceneBatch<T> {
    scenes: HashMap<u64, T>,
    pool: ThreadPool,
}

impl<T> SceneBatch<T>
where
    T: Send,
{
    /// Creates the batch with one worker per cpu
    ///
    pub fn new() -> Result<Self> {
        Self::with_threads(num_cpus::get())
    }

    /// Creates the batch with `threads` workers
    ///
    pub fn with_threads(threads: usize) -> Result<Self> {
        let pool = ThreadPoolBuilder::new().num_threads(threads).build()?;
        Ok(Self {
            scenes: HashMap::default(),
            pool,
        })
    }

    /// Registers the tracker for the scene, returns the tracker previously registered for it
    ///
    pub fn add_scene(&mut self, scene_id: u64, tracker: T) -> Option<T> {
        self.scenes.insert(scene_id, tracker)
    }

    pub fn remove_scene(&mut self, scene_id: u64) -> Option<T> {
        self.scenes.remove(&scene_id)
    }

    pub fn scene(&self, scene_id: u64) -> Option<&T> {
        self.scenes.get(&scene_id)
    }

    pub fn scene_mut(&mut self, scene_id: u64) -> Option<&mut T> {
        self.scenes.get_mut(&scene_id)
    }

    pub fn scene_ids(&self) -> Vec<u64> {
        let mut ids = self.scenes.keys().copied().collect::<Vec<_>>();
        ids.sort_unstable();
        ids
    }

    /// Runs one step for every registered scene.
    ///
    /// Scenes missing from `batch` are stepped with no measurements so their trajectories keep
    /// aging. Records for unknown scenes are rejected before any scene is stepped.
    ///
    pub fn add_measurements<M>(&mut self, batch: &BatchRecords<M>, t: Time) -> Result<()>
    where
        T: TrajectoryTracker<M>,
        M: Sync,
    {
        if let Some(missing) = batch.keys().find(|id| !self.scenes.contains_key(*id)) {
            return Err(Errors::MissingScene(*missing).into());
        }
        debug!(
            "Step {}: {} scenes, {} with measurements",
            t,
            self.scenes.len(),
            batch.len()
        );
        let scenes = &mut self.scenes;
        self.pool.install(|| {
            scenes.par_iter_mut().for_each(|(scene_id, tracker)| {
                let measurements = batch.get(scene_id).map(Vec::as_slice).unwrap_or(&[]);
                tracker.add_measurements(measurements, t);
            })
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::test_stuff::{frame, PointGen2};
    use crate::trackers::batch::{BatchRecords, SceneBatch};
    use crate::trackers::extended::ExtendedCoordinateTracker;
    use crate::trackers::options::TrackerOptions;
    use crate::utils::point::point2;
    use crate::Errors;

    #[test]
    fn scenes_are_independent() {
        let config = TrackerOptions::new()
            .prediction_threshold(1.0)
            .initial_threshold(4.0)
            .build()
            .unwrap();
        let mut batch = SceneBatch::with_threads(2).unwrap();
        batch.add_scene(1, ExtendedCoordinateTracker::<2>::new(&config));
        batch.add_scene(2, ExtendedCoordinateTracker::<2>::new(&config));
        assert_eq!(batch.scene_ids(), vec![1, 2]);

        let mut objects = [
            PointGen2::new(0.0, 0.0, 1.0, 0.0, 0.1),
            PointGen2::new(50.0, 50.0, 0.0, -1.0, 0.1),
        ];
        for t in 0..10 {
            let mut records = BatchRecords::default();
            records.insert(1, frame(&mut objects));
            if t < 2 {
                records.insert(2, vec![point2(0.0, 0.0)]);
            }
            batch.add_measurements(&records, t).unwrap();
        }

        let scene = batch.scene(1).unwrap();
        assert_eq!(scene.trajectories().len(), 2);
        assert!(scene.trajectories().iter().all(|t| t.length() == 10));
        assert!(batch.scene(2).unwrap().trajectories().is_empty());
    }

    #[test]
    fn unknown_scene() {
        let mut batch = SceneBatch::with_threads(1).unwrap();
        batch.add_scene(
            0,
            ExtendedCoordinateTracker::<2>::new(&TrackerOptions::new().build().unwrap()),
        );
        let mut records = BatchRecords::default();
        records.insert(7, vec![point2(0.0, 0.0)]);
        let err = batch.add_measurements(&records, 0).unwrap_err();
        assert_eq!(err.downcast_ref::<Errors>(), Some(&Errors::MissingScene(7)));
        assert!(batch.scene(0).unwrap().trajectories().is_empty());
        assert!(batch.remove_scene(0).is_some());
        assert!(batch.scene_mut(0).is_none());
    }
}
