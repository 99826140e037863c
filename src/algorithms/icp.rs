use nalgebra::{Isometry3, Matrix6, Vector3, Vector6};

use crate::config::TrackerIterationType;

/// Gauss-Newton normal equations for point-to-plane ICP.
///
/// The pose update is a right-multiplied twist `[omega, v]` in the camera
/// frame, so rotation-only iterations spin about the camera centre.
#[derive(Debug, Clone)]
pub struct NormalEquations {
    hessian: Matrix6<f64>,
    gradient: Vector6<f64>,
    squared_error: f64,
    count: usize,
}

impl Default for NormalEquations {
    fn default() -> Self {
        Self {
            hessian: Matrix6::zeros(),
            gradient: Vector6::zeros(),
            squared_error: 0.0,
            count: 0,
        }
    }
}

impl NormalEquations {
    /// Accumulate one correspondence.
    ///
    /// `point` is the measured point and `normal` the reference normal, both
    /// in the current camera frame; `residual` is the signed plane distance.
    pub fn add(&mut self, point: &Vector3<f64>, normal: &Vector3<f64>, residual: f64) {
        let rotational = point.cross(normal);
        let jacobian = Vector6::new(
            rotational.x,
            rotational.y,
            rotational.z,
            normal.x,
            normal.y,
            normal.z,
        );
        self.hessian += jacobian * jacobian.transpose();
        self.gradient += jacobian * residual;
        self.squared_error += residual * residual;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Root mean square plane distance of the accumulated correspondences
    pub fn rms_error(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.squared_error / self.count as f64).sqrt()
        }
    }

    /// Solve for the twist restricted to the parameters `iteration_type` allows.
    /// Returns `None` when the system is under-constrained.
    pub fn solve(&self, iteration_type: TrackerIterationType) -> Option<Vector6<f64>> {
        if self.count < iteration_type.parameter_count() {
            return None;
        }
        match iteration_type {
            TrackerIterationType::Both => {
                let step = self.hessian.cholesky()?.solve(&-self.gradient);
                Some(step)
            }
            TrackerIterationType::Rotation | TrackerIterationType::Translation => {
                let offset = if iteration_type == TrackerIterationType::Rotation {
                    0
                } else {
                    3
                };
                let block = self.hessian.fixed_slice::<3, 3>(offset, offset).into_owned();
                let rhs = -self.gradient.fixed_rows::<3>(offset).into_owned();
                let partial = block.cholesky()?.solve(&rhs);

                let mut step = Vector6::zeros();
                step.fixed_rows_mut::<3>(offset).copy_from(&partial);
                Some(step)
            }
        }
    }
}

/// Apply a camera-frame twist `[omega, v]` to a camera-to-world pose
pub fn apply_twist(pose: &Isometry3<f64>, step: &Vector6<f64>) -> Isometry3<f64> {
    let omega = Vector3::new(step[0], step[1], step[2]);
    let v = Vector3::new(step[3], step[4], step[5]);
    pose * Isometry3::new(v, omega)
}
