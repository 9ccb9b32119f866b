/// Points in a D-dimensional Cartesian space and conversions into them
pub mod point;
