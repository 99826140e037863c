use image::{ImageBuffer, Luma};

use crate::{algorithms::camera::Intrinsics, sensors::imu::ImuMeasurement};

/// Metric depth image; values `<= 0` mark pixels without a measurement
pub type DepthImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Sensor data for the frame being tracked
pub struct Frame {
    pub timestamp: f64,
    pub depth: DepthImage,
    pub intrinsics: Intrinsics,
    /// Present when an IMU is attached to the camera
    pub imu: Option<ImuMeasurement>,
}

impl Frame {
    pub fn new(timestamp: f64, depth: DepthImage, intrinsics: Intrinsics) -> Self {
        Self {
            timestamp,
            depth,
            intrinsics,
            imu: None,
        }
    }

    pub fn with_imu(mut self, measurement: ImuMeasurement) -> Self {
        self.imu = Some(measurement);
        self
    }
}

pub(crate) fn valid_depth(depth: &DepthImage, x: u32, y: u32) -> Option<f32> {
    if x >= depth.width() || y >= depth.height() {
        return None;
    }
    let value = depth.get_pixel(x, y).0[0];
    (value > 0.0 && value.is_finite()).then_some(value)
}
