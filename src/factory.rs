//! Tracker construction.
//!
//! [`TrackerFactory`] maps a [`TrackerKind`] to a [`Maker`]; each maker then
//! picks the backend for `config.device` out of the context's
//! [`DeviceBackends`]. One factory is built at startup per pipeline flavour
//! and handed to whatever sets up tracking sessions.

use std::{collections::HashMap, num::NonZeroUsize, sync::Arc};

use log::{debug, info};

use crate::{
    backends::{DepthTrackerMaker, DepthTrackerSettings, DeviceBackends},
    composite::CompositeTracker,
    config::{TrackerConfig, TrackerKind},
    engine::{CpuLowLevelEngine, LowLevelEngine},
    error::{Result, TrackerError},
    inertial::ImuTracker,
    sensors::imu::{RelativeRotationCalibrator, SharedImuCalibrator},
    tracker::BoxedTracker,
};

/// Collaborators construction routines pass through to the trackers they build
#[derive(Clone)]
pub struct TrackerContext {
    pub low_level_engine: Arc<dyn LowLevelEngine>,
    pub imu_calibrator: SharedImuCalibrator,
    pub backends: DeviceBackends,
}

impl TrackerContext {
    pub fn new(
        low_level_engine: Arc<dyn LowLevelEngine>,
        imu_calibrator: SharedImuCalibrator,
        backends: DeviceBackends,
    ) -> Self {
        Self {
            low_level_engine,
            imu_calibrator,
            backends,
        }
    }
}

impl Default for TrackerContext {
    /// CPU engine, identity-mounted IMU and the backends compiled into this crate
    fn default() -> Self {
        Self::new(
            Arc::new(CpuLowLevelEngine),
            RelativeRotationCalibrator::default().shared(),
            DeviceBackends::compiled(),
        )
    }
}

/// Construction routine for one tracker kind
pub type Maker = fn(TrackerKind, &TrackerConfig, &TrackerContext) -> Result<BoxedTracker>;

/// Registry of construction routines keyed by tracker kind
#[derive(Clone, Default)]
pub struct TrackerFactory {
    makers: HashMap<TrackerKind, Maker>,
}

impl TrackerFactory {
    /// Factory with the depth-only and inertial-assisted makers registered
    pub fn new() -> Self {
        let mut factory = Self::empty();
        factory.register_maker(TrackerKind::DepthOnly, make_depth_only_tracker);
        factory.register_maker(TrackerKind::InertialAssisted, make_inertial_assisted_tracker);
        factory
    }

    /// Factory without any maker
    pub fn empty() -> Self {
        Self::default()
    }

    /// Associate `kind` with `maker`. A later registration for the same
    /// kind replaces the earlier one, which is handed back.
    pub fn register_maker(&mut self, kind: TrackerKind, maker: Maker) -> Option<Maker> {
        let previous = self.makers.insert(kind, maker);
        if previous.is_some() {
            debug!("replaced maker for {kind:?}");
        } else {
            debug!("registered maker for {kind:?}");
        }
        previous
    }

    pub fn is_registered(&self, kind: TrackerKind) -> bool {
        self.makers.contains_key(&kind)
    }

    /// Build a tracker of `kind` for `config`. The caller owns the result.
    ///
    /// The built-in makers resolve the device backend before validating
    /// `config`, so an unsupported device is reported ahead of bad values.
    pub fn make(
        &self,
        kind: TrackerKind,
        config: &TrackerConfig,
        context: &TrackerContext,
    ) -> Result<BoxedTracker> {
        let maker = self
            .makers
            .get(&kind)
            .ok_or(TrackerError::KindNotRegistered(kind))?;

        let tracker = maker(kind, config, context)?;
        info!(
            "built {} tracker for {kind:?} on {:?} ({}x{}, {} levels)",
            tracker.name(),
            config.device,
            config.image_size.width,
            config.image_size.height,
            config.hierarchy_levels
        );
        Ok(tracker)
    }

    /// Build the tracker kind named by `config.tracker_kind`
    pub fn make_configured(
        &self,
        config: &TrackerConfig,
        context: &TrackerContext,
    ) -> Result<BoxedTracker> {
        self.make(config.tracker_kind, config, context)
    }
}

/// Depth tracker backend for the configured device
fn depth_backend(
    kind: TrackerKind,
    config: &TrackerConfig,
    context: &TrackerContext,
) -> Result<DepthTrackerMaker> {
    context
        .backends
        .depth(config.device)
        .ok_or(TrackerError::UnsupportedDevice {
            kind,
            device: config.device,
        })
}

/// Single depth tracker on the configured device
pub fn make_depth_only_tracker(
    kind: TrackerKind,
    config: &TrackerConfig,
    context: &TrackerContext,
) -> Result<BoxedTracker> {
    let backend = depth_backend(kind, config, context)?;
    config.validate()?;
    Ok(backend(
        &DepthTrackerSettings::from_config(config),
        Arc::clone(&context.low_level_engine),
    ))
}

/// IMU rotation prior in slot 0, depth refinement on the configured device in slot 1
pub fn make_inertial_assisted_tracker(
    kind: TrackerKind,
    config: &TrackerConfig,
    context: &TrackerContext,
) -> Result<BoxedTracker> {
    const STAGES: NonZeroUsize = NonZeroUsize::MIN.saturating_add(1);

    let backend = depth_backend(kind, config, context)?;
    config.validate()?;

    let mut composite = CompositeTracker::new(STAGES);
    composite.set_tracker(
        Box::new(ImuTracker::new(Arc::clone(&context.imu_calibrator))),
        0,
    )?;
    composite.set_tracker(
        backend(
            &DepthTrackerSettings::from_config(config),
            Arc::clone(&context.low_level_engine),
        ),
        1,
    )?;
    Ok(Box::new(composite))
}
