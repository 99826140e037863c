//! Collection of general or specifc algorithms which may be useful
//! to any kind of depth-based pose tracking implementation

pub mod camera;
pub mod icp;
pub mod point_cloud;
