use crate::utils::point::{point2, Point};
use rand::distributions::Uniform;
use rand::prelude::ThreadRng;
use rand::Rng;

/// Initializes `env_logger` for tests; repeated calls are harmless
///
pub fn init_logs() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Object moving with constant velocity on a plane; every item is a noisy observation of its position
///
pub struct PointGen2 {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    gen: ThreadRng,
    noise: Uniform<f32>,
}

impl PointGen2 {
    /// # Parameters
    /// * `x`, `y` - initial position
    /// * `vx`, `vy` - displacement per step
    /// * `noise` - maximum absolute observation error per axis
    ///
    pub fn new(x: f32, y: f32, vx: f32, vy: f32, noise: f32) -> Self {
        Self {
            x,
            y,
            vx,
            vy,
            gen: rand::thread_rng(),
            noise: Uniform::new_inclusive(-noise, noise),
        }
    }
}

impl Iterator for PointGen2 {
    type Item = Point<2>;

    fn next(&mut self) -> Option<Self::Item> {
        let observed = point2(
            self.x + self.gen.sample(&self.noise),
            self.y + self.gen.sample(&self.noise),
        );
        self.x += self.vx;
        self.y += self.vy;
        Some(observed)
    }
}

/// Observations of all objects for one frame
///
pub fn frame(objects: &mut [PointGen2]) -> Vec<Point<2>> {
    objects.iter_mut().filter_map(|o| o.next()).collect()
}

#[cfg(test)]
mod tests {
    use crate::test_stuff::{frame, PointGen2};
    use crate::utils::point::{point2, squared_distance};

    #[test]
    fn noise_is_bounded() {
        let mut objects = [PointGen2::new(0.0, 0.0, 1.0, 2.0, 0.5)];
        for t in 0..100 {
            let f = frame(&mut objects);
            assert_eq!(f.len(), 1);
            let truth = point2(t as f32, 2.0 * t as f32);
            assert!(squared_distance(&f[0], &truth) <= 0.5 + 1e-3);
        }
    }

    #[test]
    fn noiseless() {
        let mut gen = PointGen2::new(1.0, 1.0, 0.0, 0.0, 0.0);
        assert_eq!(gen.next(), Some(point2(1.0, 1.0)));
        assert_eq!(gen.next(), Some(point2(1.0, 1.0)));
    }
}
