use std::num::NonZeroUsize;

use log::{debug, warn};

use crate::{
    error::{Result, TrackerError},
    frame::Frame,
    tracker::{BoxedTracker, Tracker},
    tracking::{TrackingState, TrackingStatus},
};

/// Fixed-arity, ordered group of trackers that behaves as one.
///
/// Slot order is execution order: slot `i + 1` starts from the pose slot `i`
/// produced. The first stage reporting [`TrackingStatus::Lost`] ends the frame.
pub struct CompositeTracker {
    slots: Vec<Option<BoxedTracker>>,
}

impl CompositeTracker {
    pub fn new(len: NonZeroUsize) -> Self {
        Self {
            slots: (0..len.get()).map(|_| None).collect(),
        }
    }

    /// Number of slots, fixed at construction
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Install `tracker` into `index`, handing back the previous occupant
    pub fn set_tracker(
        &mut self,
        tracker: BoxedTracker,
        index: usize,
    ) -> Result<Option<BoxedTracker>> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(TrackerError::IndexOutOfRange { index, len })?;
        debug!("composite slot {index}/{len} <- {}", tracker.name());
        Ok(slot.replace(tracker))
    }

    /// Take the tracker out of `index`, leaving the slot empty
    pub fn take_tracker(&mut self, index: usize) -> Result<Option<BoxedTracker>> {
        let len = self.slots.len();
        self.slots
            .get_mut(index)
            .map(Option::take)
            .ok_or(TrackerError::IndexOutOfRange { index, len })
    }

    /// Indices of the slots still waiting for a tracker
    pub fn missing_slots(&self) -> Vec<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.is_none().then_some(i))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Every stage in slot order, or `IncompleteComposite` if any slot is empty
    fn stages(&mut self) -> Result<impl Iterator<Item = &mut BoxedTracker>> {
        let missing = self.missing_slots();
        if !missing.is_empty() {
            return Err(TrackerError::IncompleteComposite { missing });
        }
        Ok(self.slots.iter_mut().flatten())
    }
}

impl Tracker for CompositeTracker {
    fn track_camera(&mut self, state: &mut TrackingState, frame: &Frame) -> Result<TrackingStatus> {
        for (index, stage) in self.stages()?.enumerate() {
            let status = stage.track_camera(state, frame)?;
            if !status.is_ok() {
                warn!(
                    "composite stage {index} ({}) lost track at t={}, skipping later stages",
                    stage.name(),
                    frame.timestamp
                );
                return Ok(status);
            }
        }
        Ok(TrackingStatus::Ok)
    }

    fn update_initial_pose(&mut self, state: &mut TrackingState) -> Result<()> {
        for stage in self.stages()? {
            stage.update_initial_pose(state)?;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "composite"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use nalgebra::{Isometry3, Vector3};

    use super::*;
    use crate::{algorithms::camera::Intrinsics, frame::DepthImage};

    type Log = Arc<Mutex<Vec<(usize, Vector3<f64>)>>>;

    /// Records the pose it was handed, then nudges it along x
    struct Stage {
        id: usize,
        log: Log,
        status: TrackingStatus,
    }

    impl Stage {
        fn boxed(id: usize, log: &Log, status: TrackingStatus) -> BoxedTracker {
            Box::new(Self {
                id,
                log: log.clone(),
                status,
            })
        }
    }

    impl Tracker for Stage {
        fn track_camera(
            &mut self,
            state: &mut TrackingState,
            _frame: &Frame,
        ) -> Result<TrackingStatus> {
            self.log
                .lock()
                .unwrap()
                .push((self.id, state.camera_to_world.translation.vector));
            state.camera_to_world.translation.vector.x += 1.0;
            Ok(self.status)
        }

        fn update_initial_pose(&mut self, state: &mut TrackingState) -> Result<()> {
            state.camera_to_world.translation.vector.y += 1.0;
            Ok(())
        }

        fn name(&self) -> &str {
            "stage"
        }
    }

    fn frame() -> Frame {
        Frame::new(
            0.0,
            DepthImage::new(4, 4),
            Intrinsics::from_focal(4.0, 4.0, 4.0),
        )
    }

    fn composite(len: usize) -> CompositeTracker {
        CompositeTracker::new(NonZeroUsize::new(len).unwrap())
    }

    #[test]
    fn test_set_tracker_out_of_range() {
        let log = Log::default();
        let mut tracker = composite(2);
        let err = tracker
            .set_tracker(Stage::boxed(0, &log, TrackingStatus::Ok), 2)
            .err()
            .unwrap();
        assert_eq!(err, TrackerError::IndexOutOfRange { index: 2, len: 2 });
    }

    #[test]
    fn test_incomplete_composite_runs_nothing() {
        let log = Log::default();
        let mut tracker = composite(2);
        tracker
            .set_tracker(Stage::boxed(0, &log, TrackingStatus::Ok), 0)
            .unwrap();

        let mut state = TrackingState::default();
        let err = tracker.track_camera(&mut state, &frame()).unwrap_err();
        assert_eq!(err, TrackerError::IncompleteComposite { missing: vec![1] });
        assert!(log.lock().unwrap().is_empty());
        assert_eq!(state.camera_to_world, Isometry3::identity());

        let err = tracker.update_initial_pose(&mut state).unwrap_err();
        assert!(matches!(err, TrackerError::IncompleteComposite { .. }));
    }

    #[test]
    fn test_stages_run_in_slot_order_threading_pose() {
        let log = Log::default();
        let mut tracker = composite(3);
        // fill out of order; slot index decides execution order
        for index in [2, 0, 1] {
            tracker
                .set_tracker(Stage::boxed(index, &log, TrackingStatus::Ok), index)
                .unwrap();
        }

        let mut state = TrackingState::default();
        let status = tracker.track_camera(&mut state, &frame()).unwrap();
        assert_eq!(status, TrackingStatus::Ok);

        let log = log.lock().unwrap();
        let order: Vec<usize> = log.iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![0, 1, 2]);
        for (i, (_, seen)) in log.iter().enumerate() {
            assert_eq!(seen.x, i as f64);
        }
        assert_eq!(state.camera_to_world.translation.vector.x, 3.0);
    }

    #[test]
    fn test_failure_short_circuits() {
        let log = Log::default();
        let mut tracker = composite(3);
        tracker
            .set_tracker(Stage::boxed(0, &log, TrackingStatus::Ok), 0)
            .unwrap();
        tracker
            .set_tracker(Stage::boxed(1, &log, TrackingStatus::Lost), 1)
            .unwrap();
        tracker
            .set_tracker(Stage::boxed(2, &log, TrackingStatus::Ok), 2)
            .unwrap();

        let mut state = TrackingState::default();
        let status = tracker.track_camera(&mut state, &frame()).unwrap();
        assert_eq!(status, TrackingStatus::Lost);

        let order: Vec<usize> = log.lock().unwrap().iter().map(|(id, _)| *id).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_replacing_slot_returns_previous() {
        let log = Log::default();
        let mut tracker = composite(1);
        assert!(tracker
            .set_tracker(Stage::boxed(0, &log, TrackingStatus::Ok), 0)
            .unwrap()
            .is_none());

        let previous = tracker
            .set_tracker(Stage::boxed(1, &log, TrackingStatus::Ok), 0)
            .unwrap();
        assert!(previous.is_some());

        let mut state = TrackingState::default();
        tracker.track_camera(&mut state, &frame()).unwrap();
        assert_eq!(log.lock().unwrap()[0].0, 1);
    }

    #[test]
    fn test_take_tracker_empties_slot() {
        let log = Log::default();
        let mut tracker = composite(2);
        tracker
            .set_tracker(Stage::boxed(0, &log, TrackingStatus::Ok), 0)
            .unwrap();
        tracker
            .set_tracker(Stage::boxed(1, &log, TrackingStatus::Ok), 1)
            .unwrap();
        assert!(tracker.is_complete());

        assert!(tracker.take_tracker(1).unwrap().is_some());
        assert_eq!(tracker.missing_slots(), vec![1]);
        assert!(matches!(
            tracker.take_tracker(5),
            Err(TrackerError::IndexOutOfRange { index: 5, len: 2 })
        ));
    }

    #[test]
    fn test_update_initial_pose_visits_every_stage() {
        let log = Log::default();
        let mut tracker = composite(2);
        tracker
            .set_tracker(Stage::boxed(0, &log, TrackingStatus::Ok), 0)
            .unwrap();
        tracker
            .set_tracker(Stage::boxed(1, &log, TrackingStatus::Ok), 1)
            .unwrap();

        let mut state = TrackingState::default();
        tracker.update_initial_pose(&mut state).unwrap();
        assert_eq!(state.camera_to_world.translation.vector.y, 2.0);
    }
}
