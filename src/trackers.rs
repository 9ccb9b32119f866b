/// Tracker interfaces shared by all implementations
pub mod tracker_api;

/// Generic greedy multi-hypothesis association
pub mod hypothesis;

/// Cartesian specialization with distance-based fitness
pub mod coordinate;

/// Coordinate tracker with branch retention and stop-time termination
pub mod extended;

/// Tracker configuration
pub mod options;

/// Callbacks receiving terminated trajectories
pub mod lifecycle;

/// Independent scenes processed in parallel
pub mod batch;
