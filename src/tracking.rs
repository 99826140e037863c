use nalgebra::Isometry3;

use crate::algorithms::point_cloud::PointCloud;

/// Outcome a tracker reports for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrackingStatus {
    #[default]
    Ok,
    /// The pose estimate for this frame cannot be trusted
    Lost,
}

impl TrackingStatus {
    pub fn is_ok(self) -> bool {
        self == TrackingStatus::Ok
    }
}

/// Pose estimate threaded through every tracker stage of a frame
#[derive(Debug, Clone, Default)]
pub struct TrackingState {
    /// Current estimate of the depth camera pose (camera to world)
    pub camera_to_world: Isometry3<f64>,
    /// Reference surface rendered from the scene model, if any
    pub point_cloud: Option<PointCloud>,
    /// Frames tracked since `point_cloud` was rendered
    pub age_point_cloud: u32,
    /// Set when tracking is lost; the next reference cloud should come from
    /// a full render of the scene
    pub requires_full_rendering: bool,
}

impl TrackingState {
    pub fn new(camera_to_world: Isometry3<f64>) -> Self {
        Self {
            camera_to_world,
            ..Default::default()
        }
    }

    /// Replace the reference surface, resetting its age and any pending
    /// render request
    pub fn set_point_cloud(&mut self, point_cloud: PointCloud) {
        self.point_cloud = Some(point_cloud);
        self.age_point_cloud = 0;
        self.requires_full_rendering = false;
    }
}
