use std::sync::{Arc, Mutex};

use nalgebra::UnitQuaternion;

/// Absolute device orientation reported by the IMU for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImuMeasurement {
    pub timestamp: f64,
    /// Orientation of the IMU in its own world frame
    pub orientation: UnitQuaternion<f64>,
}

/// Turns successive IMU orientations into camera rotation increments
pub trait ImuCalibrator: Send {
    /// Record the orientation for the current frame
    fn register_measurement(&mut self, orientation: &UnitQuaternion<f64>);

    /// Rotation of the camera between the previous and the current measurement,
    /// expressed in the camera's world frame.
    /// Identity until two measurements have been registered.
    fn differential_rotation_change(&self) -> UnitQuaternion<f64>;
}

/// Calibrator handle shared between the pipeline and the inertial tracker
pub type SharedImuCalibrator = Arc<Mutex<dyn ImuCalibrator>>;

/// Calibrator for an IMU rigidly mounted to the depth camera.
///
/// `imu_to_camera` maps the IMU's world frame onto the camera's world frame;
/// increments are conjugated by it.
#[derive(Debug, Clone)]
pub struct RelativeRotationCalibrator {
    imu_to_camera: UnitQuaternion<f64>,
    previous: Option<UnitQuaternion<f64>>,
    current: Option<UnitQuaternion<f64>>,
}

impl RelativeRotationCalibrator {
    pub fn new(imu_to_camera: UnitQuaternion<f64>) -> Self {
        Self {
            imu_to_camera,
            previous: None,
            current: None,
        }
    }

    /// Wrap into the shared handle expected by the tracker context
    pub fn shared(self) -> SharedImuCalibrator {
        Arc::new(Mutex::new(self))
    }
}

impl Default for RelativeRotationCalibrator {
    fn default() -> Self {
        Self::new(UnitQuaternion::identity())
    }
}

impl ImuCalibrator for RelativeRotationCalibrator {
    fn register_measurement(&mut self, orientation: &UnitQuaternion<f64>) {
        self.previous = self.current.replace(*orientation);
    }

    fn differential_rotation_change(&self) -> UnitQuaternion<f64> {
        match (self.previous, self.current) {
            (Some(previous), Some(current)) => {
                let delta_imu = current * previous.inverse();
                self.imu_to_camera * delta_imu * self.imu_to_camera.inverse()
            }
            _ => UnitQuaternion::identity(),
        }
    }
}
