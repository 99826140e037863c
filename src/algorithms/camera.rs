use nalgebra::{Vector2, Vector3};

/// Pinhole intrinsics of the depth camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl Intrinsics {
    pub const fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> Self {
        Self { fx, fy, cx, cy }
    }

    /// Square-pixel camera with the principal point in the image centre
    pub fn from_focal(focal: f64, width: f64, height: f64) -> Self {
        Self::new(focal, focal, width / 2.0, height / 2.0)
    }

    /// Intrinsics for a pyramid level where every level averages 2x2 blocks.
    /// The principal point shifts so pixel centres stay aligned.
    pub fn at_level(&self, level: usize) -> Self {
        let scale = 0.5f64.powi(level as i32);
        Self::new(
            self.fx * scale,
            self.fy * scale,
            (self.cx + 0.5) * scale - 0.5,
            (self.cy + 0.5) * scale - 0.5,
        )
    }

    /// Lift pixel `(u, v)` with metric depth into the camera frame
    pub fn backproject(&self, u: f64, v: f64, depth: f64) -> Vector3<f64> {
        Vector3::new(
            (u - self.cx) / self.fx * depth,
            (v - self.cy) / self.fy * depth,
            depth,
        )
    }

    /// Project a camera-frame point onto the image plane.
    /// Points on or behind the camera plane have no projection.
    pub fn project(&self, point: &Vector3<f64>) -> Option<Vector2<f64>> {
        if point.z <= 0.0 {
            return None;
        }
        Some(Vector2::new(
            self.fx * point.x / point.z + self.cx,
            self.fy * point.y / point.z + self.cy,
        ))
    }
}
