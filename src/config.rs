//! Tracker configuration.
//!
//! [`TrackerConfig`] is owned by the caller and only read by the factory.
//! Every field has a default so a TOML file only needs to name what it
//! changes:
//!
//! ```toml
//! tracker_kind = "inertial_assisted"
//! device = "cpu"
//! hierarchy_levels = 4
//! run_till_level = 1
//! icp_threshold = 0.02
//!
//! [image_size]
//! width = 640
//! height = 480
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Tracking algorithm requested from the factory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum TrackerKind {
    /// Depth-only ICP alignment against the rendered scene
    DepthOnly,
    /// Inertial rotation prior followed by depth ICP refinement
    InertialAssisted,
}

/// Compute backend a tracker should run on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceKind {
    Cpu,
    Cuda,
    Metal,
}

/// Which pose parameters an ICP iteration at a given pyramid level solves for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerIterationType {
    Both,
    Translation,
    Rotation,
}

impl TrackerIterationType {
    /// Number of pose parameters solved per iteration
    pub fn parameter_count(self) -> usize {
        match self {
            TrackerIterationType::Both => 6,
            TrackerIterationType::Translation | TrackerIterationType::Rotation => 3,
        }
    }
}

/// Resolution of the depth images handed to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Whether a pyramid of `levels` levels keeps at least one pixel per axis
    /// on its coarsest level
    pub fn supports_levels(self, levels: usize) -> bool {
        let shift = u32::try_from(levels.saturating_sub(1)).unwrap_or(u32::MAX);
        let coarsest = |extent: u32| extent.checked_shr(shift).unwrap_or(0);
        coarsest(self.width) > 0 && coarsest(self.height) > 0
    }
}

impl Default for ImageSize {
    fn default() -> Self {
        Self::new(640, 480)
    }
}

/// Immutable description of how a tracker should be built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Tracker kind used by [`TrackerFactory::make_configured`](crate::factory::TrackerFactory::make_configured)
    #[serde(default = "default_tracker_kind")]
    pub tracker_kind: TrackerKind,

    /// Compute backend (default: cpu)
    #[serde(default = "default_device")]
    pub device: DeviceKind,

    /// Tracked depth image resolution (default: 640x480)
    #[serde(default)]
    pub image_size: ImageSize,

    /// Number of image pyramid levels (default: 5)
    #[serde(default = "default_hierarchy_levels")]
    pub hierarchy_levels: usize,

    /// Finest pyramid level ICP runs down to (default: 0)
    #[serde(default)]
    pub run_till_level: usize,

    /// Squared point distance beyond which correspondences are rejected (default: 0.01)
    #[serde(default = "default_icp_threshold")]
    pub icp_threshold: f32,

    /// Per-level iteration type, finest level first.
    /// Derived from `hierarchy_levels` when absent.
    #[serde(default)]
    pub tracking_regime: Option<Vec<TrackerIterationType>>,

    /// Per-level iteration limit, finest level first.
    /// Derived from `hierarchy_levels` when absent.
    #[serde(default)]
    pub iterations_per_level: Option<Vec<u32>>,

    /// ICP stops a level once the update step norm drops below this (default: 1e-3)
    #[serde(default = "default_convergence_threshold")]
    pub convergence_threshold: f64,

    /// Fraction of valid depth pixels that must find a correspondence
    /// at the finest level for tracking to count as successful (default: 0.1)
    #[serde(default = "default_min_inlier_fraction")]
    pub min_inlier_fraction: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tracker_kind: default_tracker_kind(),
            device: default_device(),
            image_size: ImageSize::default(),
            hierarchy_levels: default_hierarchy_levels(),
            run_till_level: 0,
            icp_threshold: default_icp_threshold(),
            tracking_regime: None,
            iterations_per_level: None,
            convergence_threshold: default_convergence_threshold(),
            min_inlier_fraction: default_min_inlier_fraction(),
        }
    }
}

impl TrackerConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse from a TOML string and validate
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Iteration type per pyramid level, finest first.
    ///
    /// The finest level solves the full pose, the next one translation only,
    /// and all coarser levels rotation only.
    pub fn tracking_regime(&self) -> Vec<TrackerIterationType> {
        match &self.tracking_regime {
            Some(regime) => regime.clone(),
            None => (0..self.hierarchy_levels)
                .map(|level| match level {
                    0 => TrackerIterationType::Both,
                    1 => TrackerIterationType::Translation,
                    _ => TrackerIterationType::Rotation,
                })
                .collect(),
        }
    }

    /// Iteration limit per pyramid level, finest first (2, 4, 6, ... by default)
    pub fn iterations_per_level(&self) -> Vec<u32> {
        match &self.iterations_per_level {
            Some(iterations) => iterations.clone(),
            None => (0..self.hierarchy_levels)
                .map(|level| 2 * (level as u32 + 1))
                .collect(),
        }
    }

    /// Check the configuration describes a buildable tracker
    pub fn validate(&self) -> Result<()> {
        if self.image_size.width == 0 || self.image_size.height == 0 {
            return Err(TrackerError::Config(format!(
                "image size {}x{} must be non-zero",
                self.image_size.width, self.image_size.height
            )));
        }
        if self.hierarchy_levels == 0 {
            return Err(TrackerError::Config(
                "hierarchy_levels must be at least 1".to_string(),
            ));
        }
        if self.run_till_level >= self.hierarchy_levels {
            return Err(TrackerError::Config(format!(
                "run_till_level {} must be below hierarchy_levels {}",
                self.run_till_level, self.hierarchy_levels
            )));
        }
        if !self.image_size.supports_levels(self.hierarchy_levels) {
            return Err(TrackerError::Config(format!(
                "{} hierarchy levels shrink a {}x{} image below one pixel",
                self.hierarchy_levels, self.image_size.width, self.image_size.height
            )));
        }
        if let Some(regime) = &self.tracking_regime {
            if regime.len() != self.hierarchy_levels {
                return Err(TrackerError::Config(format!(
                    "tracking_regime has {} entries, expected {}",
                    regime.len(),
                    self.hierarchy_levels
                )));
            }
        }
        if let Some(iterations) = &self.iterations_per_level {
            if iterations.len() != self.hierarchy_levels {
                return Err(TrackerError::Config(format!(
                    "iterations_per_level has {} entries, expected {}",
                    iterations.len(),
                    self.hierarchy_levels
                )));
            }
        }
        if !(self.icp_threshold > 0.0) {
            return Err(TrackerError::Config(format!(
                "icp_threshold must be positive, got {}",
                self.icp_threshold
            )));
        }
        if !(self.convergence_threshold > 0.0) {
            return Err(TrackerError::Config(format!(
                "convergence_threshold must be positive, got {}",
                self.convergence_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.min_inlier_fraction) {
            return Err(TrackerError::Config(format!(
                "min_inlier_fraction must lie in [0, 1], got {}",
                self.min_inlier_fraction
            )));
        }
        Ok(())
    }
}

// Default value functions
fn default_tracker_kind() -> TrackerKind {
    TrackerKind::DepthOnly
}
fn default_device() -> DeviceKind {
    DeviceKind::Cpu
}
fn default_hierarchy_levels() -> usize {
    5
}
fn default_icp_threshold() -> f32 {
    0.1 * 0.1
}
fn default_convergence_threshold() -> f64 {
    1e-3
}
fn default_min_inlier_fraction() -> f32 {
    0.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = TrackerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.device, DeviceKind::Cpu);
        assert_eq!(config.hierarchy_levels, 5);
        assert_eq!(config.image_size, ImageSize::new(640, 480));
    }

    #[test]
    fn test_derived_regime_and_iterations() {
        let config = TrackerConfig::default();
        assert_eq!(
            config.tracking_regime(),
            vec![
                TrackerIterationType::Both,
                TrackerIterationType::Translation,
                TrackerIterationType::Rotation,
                TrackerIterationType::Rotation,
                TrackerIterationType::Rotation,
            ]
        );
        assert_eq!(config.iterations_per_level(), vec![2, 4, 6, 8, 10]);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = TrackerConfig::from_toml(
            r#"
            tracker_kind = "inertial_assisted"
            device = "cuda"
            hierarchy_levels = 4
            run_till_level = 1
            icp_threshold = 0.02

            [image_size]
            width = 320
            height = 240
            "#,
        )
        .unwrap();

        assert_eq!(config.tracker_kind, TrackerKind::InertialAssisted);
        assert_eq!(config.device, DeviceKind::Cuda);
        assert_eq!(config.hierarchy_levels, 4);
        assert_eq!(config.run_till_level, 1);
        assert_eq!(config.image_size, ImageSize::new(320, 240));
        assert_eq!(config.tracking_regime().len(), 4);
        assert_eq!(config.min_inlier_fraction, 0.1);
    }

    #[test]
    fn test_from_toml_rejects_unknown_device() {
        let err = TrackerConfig::from_toml(r#"device = "fpga""#).unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
    }

    #[test]
    fn test_validate_run_till_level() {
        let config = TrackerConfig {
            hierarchy_levels: 3,
            run_till_level: 3,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_validate_regime_length() {
        let config = TrackerConfig {
            hierarchy_levels: 2,
            tracking_regime: Some(vec![TrackerIterationType::Both]),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TrackerError::Config(_))));
    }

    #[test]
    fn test_validate_pyramid_depth() {
        let too_deep = TrackerConfig {
            hierarchy_levels: 33,
            ..Default::default()
        };
        assert!(matches!(too_deep.validate(), Err(TrackerError::Config(_))));

        // 480 >> 8 == 1, 480 >> 9 == 0
        let deepest = TrackerConfig {
            hierarchy_levels: 9,
            ..Default::default()
        };
        assert!(deepest.validate().is_ok());
        let below_one_pixel = TrackerConfig {
            hierarchy_levels: 10,
            ..Default::default()
        };
        assert!(matches!(
            below_one_pixel.validate(),
            Err(TrackerError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        std::fs::write(
            &path,
            r#"
            device = "metal"
            hierarchy_levels = 3
            "#,
        )
        .unwrap();

        let config = TrackerConfig::load(&path).unwrap();
        assert_eq!(config.device, DeviceKind::Metal);
        assert_eq!(config.hierarchy_levels, 3);
        assert_eq!(config.iterations_per_level(), vec![2, 4, 6]);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = TrackerConfig::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, TrackerError::Config(_)));
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracker.toml");
        std::fs::write(&path, "hierarchy_levels = 0\n").unwrap();
        assert!(matches!(
            TrackerConfig::load(&path),
            Err(TrackerError::Config(_))
        ));
    }
}
