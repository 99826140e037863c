//! Sensor-side inputs consumed by trackers

pub mod imu;
