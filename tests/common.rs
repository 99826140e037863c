//! Synthetic scenes for tracker tests.

#![allow(dead_code)]

use image::Luma;
use nalgebra::{Isometry3, UnitQuaternion, Vector3};
use slamr_trackers::{
    algorithms::{camera::Intrinsics, point_cloud::PointCloud},
    sensors::imu::ImuMeasurement,
    DepthImage, Frame, ImageSize, TrackerConfig, TrackerIterationType,
};

pub const WIDTH: u32 = 80;
pub const HEIGHT: u32 = 60;

/// Room half-extents along x and y, and the back wall distance along z
const ROOM: [f64; 3] = [1.0, 0.8, 3.0];

pub fn intrinsics() -> Intrinsics {
    Intrinsics::from_focal(60.0, WIDTH as f64, HEIGHT as f64)
}

/// Depth seen from `position` (camera axes aligned with the world) inside a
/// box room open behind the camera
pub fn render_room(position: Vector3<f64>) -> DepthImage {
    let k = intrinsics();
    DepthImage::from_fn(WIDTH, HEIGHT, |u, v| {
        let ray = k.backproject(u as f64, v as f64, 1.0);
        let mut nearest = f64::INFINITY;
        for axis in 0..3 {
            let walls = if axis == 2 {
                vec![ROOM[2]]
            } else {
                vec![-ROOM[axis], ROOM[axis]]
            };
            for wall in walls {
                if ray[axis].abs() < 1e-12 {
                    continue;
                }
                let t = (wall - position[axis]) / ray[axis];
                if t > 0.0 && t < nearest {
                    nearest = t;
                }
            }
        }
        // ray has unit z, so the hit parameter is the depth
        Luma([nearest as f32])
    })
}

pub fn frame_at(timestamp: f64, position: Vector3<f64>) -> Frame {
    Frame::new(timestamp, render_room(position), intrinsics())
}

pub fn frame_with_imu(
    timestamp: f64,
    position: Vector3<f64>,
    orientation: UnitQuaternion<f64>,
) -> Frame {
    frame_at(timestamp, position).with_imu(ImuMeasurement {
        timestamp,
        orientation,
    })
}

/// Reference cloud of the room rendered from `position`
pub fn reference_at(position: Vector3<f64>) -> PointCloud {
    PointCloud::from_depth(
        &render_room(position),
        intrinsics(),
        Isometry3::translation(position.x, position.y, position.z),
    )
}

/// Small pyramid solving the full pose on every level
pub fn icp_config() -> TrackerConfig {
    TrackerConfig {
        image_size: ImageSize::new(WIDTH, HEIGHT),
        hierarchy_levels: 3,
        run_till_level: 0,
        tracking_regime: Some(vec![TrackerIterationType::Both; 3]),
        iterations_per_level: Some(vec![10, 10, 10]),
        convergence_threshold: 1e-6,
        ..Default::default()
    }
}
