use std::sync::Arc;

use log::{trace, warn};
use nalgebra::{Isometry3, Point3};

use crate::{
    algorithms::{
        camera::Intrinsics,
        icp::{apply_twist, NormalEquations},
        point_cloud::PointCloud,
    },
    backends::DepthTrackerSettings,
    engine::LowLevelEngine,
    error::{Result, TrackerError},
    frame::{valid_depth, DepthImage, Frame},
    tracker::{BoxedTracker, Tracker},
    tracking::{TrackingState, TrackingStatus},
};

/// Point-to-plane ICP against the reference point cloud, coarse to fine
pub struct CpuDepthTracker {
    settings: DepthTrackerSettings,
    engine: Arc<dyn LowLevelEngine>,
}

/// [`DepthTrackerMaker`](super::DepthTrackerMaker) for the CPU backend
pub fn make_depth_tracker(
    settings: &DepthTrackerSettings,
    engine: Arc<dyn LowLevelEngine>,
) -> BoxedTracker {
    Box::new(CpuDepthTracker::new(settings.clone(), engine))
}

impl CpuDepthTracker {
    pub fn new(settings: DepthTrackerSettings, engine: Arc<dyn LowLevelEngine>) -> Self {
        Self { settings, engine }
    }

    /// Normal equations for every pixel of `depth` that lands on the
    /// reference surface within the distance threshold
    fn accumulate(
        &self,
        depth: &DepthImage,
        intrinsics: &Intrinsics,
        pose: &Isometry3<f64>,
        reference: &PointCloud,
        world_to_reference: &Isometry3<f64>,
    ) -> NormalEquations {
        let threshold = self.settings.icp_threshold as f64;
        let rotation_inverse = pose.rotation.inverse();
        let mut equations = NormalEquations::default();

        for y in 0..depth.height() {
            for x in 0..depth.width() {
                let Some(d) = valid_depth(depth, x, y) else {
                    continue;
                };
                let point = intrinsics.backproject(x as f64, y as f64, d as f64);
                let world = pose * Point3::from(point);
                let in_reference = world_to_reference * world;

                let Some(sample) = reference
                    .intrinsics
                    .project(&in_reference.coords)
                    .and_then(|pixel| reference.lookup(&pixel))
                else {
                    continue;
                };

                let difference = world.coords - sample.position;
                if difference.norm_squared() > threshold {
                    continue;
                }

                let residual = sample.normal.dot(&difference);
                equations.add(&point, &(rotation_inverse * sample.normal), residual);
            }
        }

        equations
    }
}

/// Keep the pose and ask for a fresh render of the reference surface
fn lose_track(state: &mut TrackingState) -> TrackingStatus {
    state.requires_full_rendering = true;
    TrackingStatus::Lost
}

fn valid_pixels(depth: &DepthImage) -> usize {
    let (width, height) = depth.dimensions();
    (0..height)
        .flat_map(|y| (0..width).map(move |x| (x, y)))
        .filter(|&(x, y)| valid_depth(depth, x, y).is_some())
        .count()
}

impl Tracker for CpuDepthTracker {
    fn track_camera(&mut self, state: &mut TrackingState, frame: &Frame) -> Result<TrackingStatus> {
        let expected = self.settings.image_size;
        if frame.depth.dimensions() != (expected.width, expected.height) {
            return Err(TrackerError::Config(format!(
                "depth frame is {}x{}, tracker was built for {}x{}",
                frame.depth.width(),
                frame.depth.height(),
                expected.width,
                expected.height
            )));
        }

        let Some(reference) = state.point_cloud.as_ref() else {
            warn!("no reference point cloud at t={}, cannot run ICP", frame.timestamp);
            return Ok(lose_track(state));
        };
        let world_to_reference = reference.pose.inverse();

        let settings = &self.settings;
        let pyramid = self
            .engine
            .depth_pyramid(&frame.depth, settings.hierarchy_levels);
        let mut pose = state.camera_to_world;

        for level in (settings.run_till_level..settings.hierarchy_levels).rev() {
            let depth = &pyramid[level];
            let intrinsics = frame.intrinsics.at_level(level);
            let iteration_type = settings.tracking_regime[level];

            for iteration in 0..settings.iterations_per_level[level] {
                let equations =
                    self.accumulate(depth, &intrinsics, &pose, reference, &world_to_reference);
                let Some(step) = equations.solve(iteration_type) else {
                    warn!(
                        "ICP lost track at t={}: {} correspondences on level {level} do not constrain {iteration_type:?}",
                        frame.timestamp,
                        equations.count()
                    );
                    return Ok(lose_track(state));
                };
                pose = apply_twist(&pose, &step);
                trace!(
                    "level {level} iteration {iteration}: {} correspondences, rms {:.5}, step {:.2e}",
                    equations.count(),
                    equations.rms_error(),
                    step.norm()
                );
                if step.norm() < settings.convergence_threshold {
                    break;
                }
            }
        }

        let finest = &pyramid[settings.run_till_level];
        let intrinsics = frame.intrinsics.at_level(settings.run_till_level);
        let inliers = self
            .accumulate(finest, &intrinsics, &pose, reference, &world_to_reference)
            .count();
        let valid = valid_pixels(finest);
        let inlier_fraction = if valid == 0 {
            0.0
        } else {
            inliers as f32 / valid as f32
        };

        if inlier_fraction < settings.min_inlier_fraction {
            warn!(
                "ICP lost track at t={}: inlier fraction {inlier_fraction:.3} below {}",
                frame.timestamp, settings.min_inlier_fraction
            );
            return Ok(lose_track(state));
        }

        state.camera_to_world = pose;
        state.age_point_cloud += 1;
        Ok(TrackingStatus::Ok)
    }

    fn name(&self) -> &str {
        "cpu depth"
    }
}
