use crate::{
    error::Result,
    frame::Frame,
    tracking::{TrackingState, TrackingStatus},
};

/// Owned handle to any tracker, primitive or composite
pub type BoxedTracker = Box<dyn Tracker>;

/// A camera tracker. It receives a frame and refines the camera pose in
/// `state`, starting from whatever estimate `state` already holds.
///
/// Backend-specific primitives and [`CompositeTracker`](crate::composite::CompositeTracker)
/// both implement this, so callers never tell them apart.
pub trait Tracker: Send {
    /// Update `state` with the pose of `frame` and report whether it can be trusted.
    ///
    /// `Err` is reserved for contract violations such as an unfilled composite;
    /// losing track is an `Ok(TrackingStatus::Lost)`.
    fn track_camera(&mut self, state: &mut TrackingState, frame: &Frame) -> Result<TrackingStatus>;

    /// Adjust the initial guess in `state` before a frame is integrated
    fn update_initial_pose(&mut self, _state: &mut TrackingState) -> Result<()> {
        Ok(())
    }

    /// Name of this tracker for logging/debugging
    fn name(&self) -> &str;
}
