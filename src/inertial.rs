use log::warn;

use crate::{
    error::{Result, TrackerError},
    frame::Frame,
    sensors::imu::SharedImuCalibrator,
    tracker::Tracker,
    tracking::{TrackingState, TrackingStatus},
};

/// Rotation prior from the IMU.
///
/// Rotates the camera by the calibrator's differential rotation and leaves
/// its position for a later stage to refine.
pub struct ImuTracker {
    calibrator: SharedImuCalibrator,
}

impl ImuTracker {
    pub fn new(calibrator: SharedImuCalibrator) -> Self {
        Self { calibrator }
    }
}

impl Tracker for ImuTracker {
    fn track_camera(&mut self, state: &mut TrackingState, frame: &Frame) -> Result<TrackingStatus> {
        let Some(measurement) = frame.imu.as_ref() else {
            warn!("frame at t={} carries no IMU measurement", frame.timestamp);
            return Ok(TrackingStatus::Lost);
        };

        let delta = {
            let mut calibrator = self
                .calibrator
                .lock()
                .map_err(|e| TrackerError::Calibrator(e.to_string()))?;
            calibrator.register_measurement(&measurement.orientation);
            calibrator.differential_rotation_change()
        };

        state.camera_to_world.rotation = delta * state.camera_to_world.rotation;
        Ok(TrackingStatus::Ok)
    }

    fn name(&self) -> &str {
        "imu"
    }
}
