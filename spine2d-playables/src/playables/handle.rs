use crate::{Event, PropertyId, Skeleton, SkeletonData};
use std::collections::HashSet;
use std::sync::Arc;

/// Receives events fired by animation tracks while the sequencer is playing.
pub trait SkeletonEventListener {
    fn on_event(&mut self, track_index: usize, event: &Event);
}

/// The skeleton a group of sequencer tracks writes to.
///
/// Tracks are processed in ascending index order each frame, all sharing one set of
/// properties already written this frame. Call [`SkeletonPlayableHandle::begin_frame`] before
/// the first track.
pub struct SkeletonPlayableHandle {
    skeleton: Skeleton,
    frame_applied_properties: HashSet<PropertyId>,
    listener: Option<Box<dyn SkeletonEventListener>>,
}

impl SkeletonPlayableHandle {
    pub fn new(skeleton: Skeleton) -> Self {
        Self {
            skeleton,
            frame_applied_properties: HashSet::new(),
            listener: None,
        }
    }

    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    pub fn skeleton_mut(&mut self) -> &mut Skeleton {
        &mut self.skeleton
    }

    pub fn skeleton_data(&self) -> &Arc<SkeletonData> {
        &self.skeleton.data
    }

    pub fn set_listener<L: SkeletonEventListener + 'static>(&mut self, listener: L) {
        self.listener = Some(Box::new(listener));
    }

    pub fn begin_frame(&mut self) {
        self.frame_applied_properties.clear();
    }

    pub fn frame_applied_properties(&self) -> &HashSet<PropertyId> {
        &self.frame_applied_properties
    }

    pub(crate) fn pose_targets_mut(&mut self) -> (&mut Skeleton, &mut HashSet<PropertyId>) {
        (&mut self.skeleton, &mut self.frame_applied_properties)
    }

    pub fn handle_events(&mut self, track_index: usize, events: &[Event]) {
        let Some(listener) = self.listener.as_mut() else {
            return;
        };
        for event in events {
            listener.on_event(track_index, event);
        }
    }
}
