use super::{SkeletonPlayableHandle, is_zero_weight};
use crate::{
    Animation, Event, MixDirection, MixPose, PropertyId, Skeleton, SkeletonData, Timeline,
    wrap_time,
};
use std::collections::HashSet;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One animation clip on a sequencer track.
///
/// Thresholds are compared against the clip's weight: events fire only above
/// `event_threshold`, attachment and draw order keys are ignored below their thresholds.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnimationClip {
    pub animation_name: String,
    pub looped: bool,
    pub event_threshold: f32,
    pub attachment_threshold: f32,
    pub draw_order_threshold: f32,
    #[cfg_attr(feature = "serde", serde(skip))]
    animation: Option<Arc<Animation>>,
}

impl AnimationClip {
    pub fn new(animation: Arc<Animation>) -> Self {
        Self {
            animation_name: animation.name.clone(),
            animation: Some(animation),
            ..Self::default()
        }
    }

    /// Looks the animation up by name. An unknown name yields a clip that contributes nothing.
    pub fn from_skeleton_data(data: &SkeletonData, animation_name: &str, looped: bool) -> Self {
        let mut clip = Self {
            animation_name: animation_name.to_string(),
            looped,
            ..Self::default()
        };
        clip.resolve(data);
        clip
    }

    /// Re-resolves `animation_name` against `data`. Returns whether an animation was found.
    pub fn resolve(&mut self, data: &SkeletonData) -> bool {
        self.animation = data
            .animation(&self.animation_name)
            .map(|(_, animation)| animation.clone());
        if self.animation.is_none() && !self.animation_name.is_empty() {
            log::warn!(
                "animation '{}' not found; clip will be skipped",
                self.animation_name
            );
        }
        self.animation.is_some()
    }

    pub fn animation(&self) -> Option<&Arc<Animation>> {
        self.animation.as_ref()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct MixerInput<'a> {
    pub clip: &'a AnimationClip,
    pub weight: f32,
    /// Local clip time; looping clips are wrapped by the mixer.
    pub time: f32,
}

/// Per-input facts that decide how each of its timelines is applied this frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct InputBlend {
    pub is_first_on_lowest_track: bool,
    pub has_lower_contributor: bool,
    pub track_pose: MixPose,
    pub direction: MixDirection,
    pub skip_attachments: bool,
    pub skip_draw_order: bool,
}

impl InputBlend {
    /// Pose and direction for one timeline, or `None` when it sits this frame out.
    pub(crate) fn timeline_blend(
        &self,
        timeline: &Timeline,
        already_applied: bool,
    ) -> Option<(MixPose, MixDirection)> {
        // The base clip may blend into the existing pose rather than override from setup.
        let mut pose = if self.is_first_on_lowest_track
            || (self.has_lower_contributor && already_applied)
        {
            self.track_pose
        } else {
            MixPose::Setup
        };
        let mut direction = self.direction;

        let below_threshold = match timeline {
            Timeline::Attachment(_) => self.skip_attachments,
            Timeline::DrawOrder(_) => self.skip_draw_order,
            _ => false,
        };
        if below_threshold {
            match direction {
                MixDirection::In => return None,
                MixDirection::Out => {
                    pose = MixPose::Setup;
                    direction = MixDirection::Out;
                }
            }
        }
        Some((pose, direction))
    }
}

/// Blends the weighted clips of one sequencer track into a skeleton.
///
/// Weight and time history is kept per input slot. It only ever grows: the falling-edge check
/// compares against the previous frame's weight of the same slot.
#[derive(Debug, Default)]
pub struct AnimationMixer {
    last_weights: Vec<f32>,
    last_times: Vec<f32>,
    events: Vec<Event>,
}

impl AnimationMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_weight(&self, input_index: usize) -> Option<f32> {
        self.last_weights.get(input_index).copied()
    }

    pub fn last_time(&self, input_index: usize) -> Option<f32> {
        self.last_times.get(input_index).copied()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Applies one frame to the bound handle and dispatches events while playing.
    ///
    /// Without a bound handle this is a no-op returning 0.
    pub fn process_frame(
        &mut self,
        handle: Option<&mut SkeletonPlayableHandle>,
        inputs: &[MixerInput<'_>],
        track_index: usize,
        playing: bool,
    ) -> usize {
        let Some(handle) = handle else {
            return 0;
        };
        let (skeleton, applied) = handle.pose_targets_mut();
        let contributing = self.apply_frame(inputs, skeleton, applied, track_index);
        if playing {
            handle.handle_events(track_index, &self.events);
        }
        self.events.clear();
        contributing
    }

    /// Applies every input of track `track_index` to `skeleton`.
    ///
    /// Returns the number of inputs that contributed (non-zero weight). Events are appended to
    /// [`AnimationMixer::events`] and are left for the caller to dispatch and clear.
    pub fn apply_frame(
        &mut self,
        inputs: &[MixerInput<'_>],
        skeleton: &mut Skeleton,
        frame_applied_properties: &mut HashSet<PropertyId>,
        track_index: usize,
    ) -> usize {
        let input_count = inputs.len();
        let is_upper_track = track_index > 0;
        if self.last_weights.len() < input_count {
            self.last_weights.resize(input_count, 0.0);
            self.last_times.resize(input_count, 0.0);
        }
        let track_pose = if is_upper_track {
            MixPose::CurrentLayered
        } else {
            MixPose::Current
        };

        let mut contributing = 0;
        for (i, input) in inputs.iter().enumerate() {
            let clip = input.clip;
            let Some(animation) = clip.animation() else {
                continue;
            };
            let last_weight = self.last_weights[i];
            let mut weight = input.weight;
            let mut apply_time = input.time;

            if is_zero_weight(weight) {
                if last_weight > 0.0 {
                    // Last frame of a fade-out: put back what this clip keyed.
                    if is_upper_track {
                        for timeline in &animation.timelines {
                            let id = timeline.property_id();
                            if !frame_applied_properties.contains(&id) {
                                timeline.set_to_setup_pose(skeleton);
                            }
                            frame_applied_properties.insert(id);
                        }
                    } else {
                        animation.set_keyed_items_to_setup_pose(skeleton);
                    }
                    log::trace!(
                        "track {track_index} input {i}: '{}' faded out",
                        animation.name
                    );
                    weight = 0.0;
                }
                apply_time = self.last_times[i];
            } else {
                let mut last_time = self.last_times[i];
                let duration = animation.duration;
                if clip.looped && duration != 0.0 {
                    apply_time = wrap_time(apply_time, duration);
                    if last_time > 0.0 {
                        last_time = wrap_time(last_time, duration);
                    }
                }

                let blend = InputBlend {
                    is_first_on_lowest_track: !is_upper_track
                        && i == 0
                        && (input_count == 1 || inputs[1].weight == 0.0),
                    has_lower_contributor: contributing > 0 || is_upper_track,
                    track_pose,
                    direction: if weight < last_weight {
                        MixDirection::Out
                    } else {
                        MixDirection::In
                    },
                    skip_attachments: weight < clip.attachment_threshold,
                    skip_draw_order: weight < clip.draw_order_threshold,
                };
                let fire_events = weight > clip.event_threshold;

                for timeline in &animation.timelines {
                    let id = timeline.property_id();
                    let Some((pose, direction)) =
                        blend.timeline_blend(timeline, frame_applied_properties.contains(&id))
                    else {
                        continue;
                    };
                    let events = if fire_events {
                        Some(&mut self.events)
                    } else {
                        None
                    };
                    timeline.apply(
                        skeleton, last_time, apply_time, events, weight, pose, direction,
                    );
                    frame_applied_properties.insert(id);
                }

                contributing += 1;
            }

            self.last_weights[i] = weight;
            self.last_times[i] = apply_time;
        }

        contributing
    }
}
