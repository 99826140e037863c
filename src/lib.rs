//! Construction and composition of camera pose trackers.
//!
//! A [`TrackerFactory`] turns a [`TrackerKind`] plus a [`TrackerConfig`]
//! into a ready [`Tracker`] for the configured device. Fusion kinds come back
//! as a [`CompositeTracker`] whose stages run in slot order, but callers only
//! ever see a [`BoxedTracker`].
//!
//! ```no_run
//! use slamr_trackers::{TrackerConfig, TrackerContext, TrackerFactory, TrackerKind};
//!
//! let factory = TrackerFactory::new();
//! let context = TrackerContext::default();
//! let tracker = factory.make(TrackerKind::DepthOnly, &TrackerConfig::default(), &context)?;
//! # Ok::<(), slamr_trackers::TrackerError>(())
//! ```

pub mod algorithms;
pub mod backends;
pub mod composite;
pub mod config;
pub mod engine;
pub mod error;
pub mod factory;
pub mod frame;
pub mod inertial;
pub mod sensors;
pub mod tracker;
pub mod tracking;

pub use composite::CompositeTracker;
pub use config::{DeviceKind, ImageSize, TrackerConfig, TrackerIterationType, TrackerKind};
pub use error::{Result, TrackerError};
pub use factory::{Maker, TrackerContext, TrackerFactory};
pub use frame::{DepthImage, Frame};
pub use tracker::{BoxedTracker, Tracker};
pub use tracking::{TrackingState, TrackingStatus};
