use nalgebra::{Isometry3, Point3, Vector2, Vector3};

use crate::{
    algorithms::camera::Intrinsics,
    frame::{valid_depth, DepthImage},
};

/// Surface sample with its outward normal, both in world coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vector3<f64>,
    pub normal: Vector3<f64>,
}

/// Dense, image-ordered point cloud rendered from a known viewpoint.
///
/// Depth trackers align incoming frames against this by projecting into
/// the view it was rendered from.
#[derive(Debug, Clone)]
pub struct PointCloud {
    pub width: u32,
    pub height: u32,
    pub points: Vec<Option<SurfacePoint>>,
    /// Camera-to-world pose of the rendering viewpoint
    pub pose: Isometry3<f64>,
    pub intrinsics: Intrinsics,
}

impl PointCloud {
    /// Build a cloud from a depth image seen from `pose`.
    ///
    /// Normals come from forward differences; pixels on the last row or
    /// column, or next to a hole, get no sample.
    pub fn from_depth(depth: &DepthImage, intrinsics: Intrinsics, pose: Isometry3<f64>) -> Self {
        let (width, height) = depth.dimensions();
        let world_at = |x: u32, y: u32| {
            valid_depth(depth, x, y).map(|d| {
                let p = intrinsics.backproject(x as f64, y as f64, d as f64);
                (pose * Point3::from(p)).coords
            })
        };
        let camera_centre = pose.translation.vector;

        let mut points = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                let sample = match (world_at(x, y), world_at(x + 1, y), world_at(x, y + 1)) {
                    (Some(p), Some(px), Some(py)) => {
                        (px - p).cross(&(py - p)).try_normalize(1e-12).map(|normal| {
                            let normal = if normal.dot(&(camera_centre - p)) < 0.0 {
                                -normal
                            } else {
                                normal
                            };
                            SurfacePoint {
                                position: p,
                                normal,
                            }
                        })
                    }
                    _ => None,
                };
                points.push(sample);
            }
        }

        Self {
            width,
            height,
            points,
            pose,
            intrinsics,
        }
    }

    /// Sample nearest to an image position in the rendering view
    pub fn lookup(&self, pixel: &Vector2<f64>) -> Option<&SurfacePoint> {
        let (x, y) = (pixel.x.round(), pixel.y.round());
        if x < 0.0 || y < 0.0 || x >= self.width as f64 || y >= self.height as f64 {
            return None;
        }
        self.points[y as usize * self.width as usize + x as usize].as_ref()
    }
}
