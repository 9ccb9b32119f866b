use crate::node::Time;
use crate::Errors;
use anyhow::Result;

/// Validated tracker configuration. Construct it with [TrackerOptions](TrackerOptions).
///
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    prediction_threshold: f32,
    initial_threshold: f32,
    good_fitness_threshold: f32,
    maximum_stop_time: Time,
    maximum_prediction_length: usize,
    merge_converging: bool,
}

impl TrackerConfig {
    /// Squared distance from the prediction at which the fitness drops to zero
    pub fn prediction_threshold(&self) -> f32 {
        self.prediction_threshold
    }

    /// Squared distance gate for trajectories that have no prediction yet
    pub fn initial_threshold(&self) -> f32 {
        self.initial_threshold
    }

    /// Fitness at or below which a measurement or a trajectory is considered unmatched
    pub fn good_fitness_threshold(&self) -> f32 {
        self.good_fitness_threshold
    }

    /// How many time steps a trajectory may stay unextended
    pub fn maximum_stop_time(&self) -> Time {
        self.maximum_stop_time
    }

    /// Constant velocity lookback
    pub fn maximum_prediction_length(&self) -> usize {
        self.maximum_prediction_length
    }

    pub fn merge_converging(&self) -> bool {
        self.merge_converging
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            prediction_threshold: 1.0,
            initial_threshold: 1.0,
            good_fitness_threshold: 0.0,
            maximum_stop_time: 1,
            maximum_prediction_length: 1,
            merge_converging: false,
        }
    }
}

/// Builder for [TrackerConfig](TrackerConfig); the values are validated by `build`
///
#[derive(Debug, Clone, Default)]
pub struct TrackerOptions {
    config: TrackerConfig,
}

impl TrackerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn prediction_threshold(mut self, threshold: f32) -> Self {
        self.config.prediction_threshold = threshold;
        self
    }

    pub fn initial_threshold(mut self, threshold: f32) -> Self {
        self.config.initial_threshold = threshold;
        self
    }

    pub fn good_fitness_threshold(mut self, threshold: f32) -> Self {
        self.config.good_fitness_threshold = threshold;
        self
    }

    pub fn maximum_stop_time(mut self, time: Time) -> Self {
        self.config.maximum_stop_time = time;
        self
    }

    pub fn maximum_prediction_length(mut self, n: usize) -> Self {
        self.config.maximum_prediction_length = n;
        self
    }

    /// Collapse active heads that converged to the same measurement at the same time
    ///
    pub fn merge_converging(mut self, merge: bool) -> Self {
        self.config.merge_converging = merge;
        self
    }

    pub fn build(self) -> Result<TrackerConfig> {
        let c = self.config;
        for (name, threshold) in [
            ("prediction_threshold", c.prediction_threshold),
            ("initial_threshold", c.initial_threshold),
        ] {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(Errors::InvalidDistanceThreshold(name, threshold).into());
            }
        }
        if !(0.0..=1.0).contains(&c.good_fitness_threshold) {
            return Err(Errors::InvalidFitnessThreshold(c.good_fitness_threshold).into());
        }
        if c.maximum_stop_time < 1 {
            return Err(Errors::InvalidStopTime(c.maximum_stop_time).into());
        }
        if c.maximum_prediction_length < 1 {
            return Err(Errors::InvalidPredictionLength(c.maximum_prediction_length).into());
        }
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use crate::trackers::options::{TrackerConfig, TrackerOptions};
    use crate::Errors;

    #[test]
    fn tracker_options_builder() {
        let config = TrackerOptions::new()
            .prediction_threshold(5.0)
            .initial_threshold(4.0)
            .good_fitness_threshold(0.3)
            .maximum_stop_time(2)
            .maximum_prediction_length(3)
            .merge_converging(true)
            .build()
            .unwrap();
        assert_eq!(config.prediction_threshold(), 5.0);
        assert_eq!(config.initial_threshold(), 4.0);
        assert_eq!(config.good_fitness_threshold(), 0.3);
        assert_eq!(config.maximum_stop_time(), 2);
        assert_eq!(config.maximum_prediction_length(), 3);
        assert!(config.merge_converging());
    }

    #[test]
    fn defaults_are_valid() {
        let config = TrackerOptions::new().build().unwrap();
        assert_eq!(config, TrackerConfig::default());
        assert_eq!(config.good_fitness_threshold(), 0.0);
        assert_eq!(config.maximum_stop_time(), 1);
        assert_eq!(config.maximum_prediction_length(), 1);
    }

    #[test]
    fn invalid_values() {
        let err = |o: TrackerOptions| o.build().unwrap_err().downcast::<Errors>().unwrap();

        assert_eq!(
            err(TrackerOptions::new().prediction_threshold(0.0)),
            Errors::InvalidDistanceThreshold("prediction_threshold", 0.0)
        );
        assert!(matches!(
            err(TrackerOptions::new().initial_threshold(f32::NAN)),
            Errors::InvalidDistanceThreshold("initial_threshold", _)
        ));
        assert_eq!(
            err(TrackerOptions::new().good_fitness_threshold(1.5)),
            Errors::InvalidFitnessThreshold(1.5)
        );
        assert_eq!(
            err(TrackerOptions::new().good_fitness_threshold(-0.1)),
            Errors::InvalidFitnessThreshold(-0.1)
        );
        assert_eq!(
            err(TrackerOptions::new().maximum_stop_time(0)),
            Errors::InvalidStopTime(0)
        );
        assert_eq!(
            err(TrackerOptions::new().maximum_prediction_length(0)),
            Errors::InvalidPredictionLength(0)
        );
    }
}
