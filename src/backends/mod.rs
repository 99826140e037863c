//! Device backends for depth tracking.
//!
//! Each device that has a depth tracker linked into the process owns one
//! entry in [`DeviceBackends`]. Only the CPU backend ships with this crate;
//! GPU backends register their constructor for [`DeviceKind::Cuda`] or
//! [`DeviceKind::Metal`] when they are linked in.

pub mod cpu;

use std::{collections::HashMap, sync::Arc};

use log::debug;

use crate::{
    config::{DeviceKind, ImageSize, TrackerConfig, TrackerIterationType},
    engine::LowLevelEngine,
    tracker::BoxedTracker,
};

pub use cpu::CpuDepthTracker;

/// Constructor parameters shared by every depth tracker backend
#[derive(Debug, Clone, PartialEq)]
pub struct DepthTrackerSettings {
    pub image_size: ImageSize,
    /// Iteration type per pyramid level, finest first
    pub tracking_regime: Vec<TrackerIterationType>,
    /// Iteration limit per pyramid level, finest first
    pub iterations_per_level: Vec<u32>,
    pub hierarchy_levels: usize,
    pub run_till_level: usize,
    /// Squared distance threshold for accepting a correspondence
    pub icp_threshold: f32,
    pub convergence_threshold: f64,
    pub min_inlier_fraction: f32,
}

impl DepthTrackerSettings {
    /// Copy the values a depth tracker needs out of the caller's config
    pub fn from_config(config: &TrackerConfig) -> Self {
        Self {
            image_size: config.image_size,
            tracking_regime: config.tracking_regime(),
            iterations_per_level: config.iterations_per_level(),
            hierarchy_levels: config.hierarchy_levels,
            run_till_level: config.run_till_level,
            icp_threshold: config.icp_threshold,
            convergence_threshold: config.convergence_threshold,
            min_inlier_fraction: config.min_inlier_fraction,
        }
    }
}

/// Builds a depth tracker for one device
pub type DepthTrackerMaker = fn(&DepthTrackerSettings, Arc<dyn LowLevelEngine>) -> BoxedTracker;

/// Device kind -> depth tracker constructor
#[derive(Clone, Default)]
pub struct DeviceBackends {
    depth: HashMap<DeviceKind, DepthTrackerMaker>,
}

impl DeviceBackends {
    /// No backend at all
    pub fn empty() -> Self {
        Self::default()
    }

    /// Backends compiled into this crate
    pub fn compiled() -> Self {
        let mut backends = Self::empty();
        backends.register_depth(DeviceKind::Cpu, cpu::make_depth_tracker);
        backends
    }

    /// Link a depth tracker backend for `device`, returning the one it replaces
    pub fn register_depth(
        &mut self,
        device: DeviceKind,
        maker: DepthTrackerMaker,
    ) -> Option<DepthTrackerMaker> {
        debug!("registering depth tracker backend for {device:?}");
        self.depth.insert(device, maker)
    }

    pub fn depth(&self, device: DeviceKind) -> Option<DepthTrackerMaker> {
        self.depth.get(&device).copied()
    }

    pub fn supports(&self, device: DeviceKind) -> bool {
        self.depth.contains_key(&device)
    }
}
