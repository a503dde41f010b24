use crate::{MixDirection, MixPose, SkeletonAnimation};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A clip that hands its animation to the bound [`crate::AnimationState`] when it starts.
///
/// An empty `animation_name` mixes track 0 out to the setup pose.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct StateClip {
    pub animation_name: String,
    pub looped: bool,
    /// Use `mix_duration` instead of the mix configured in the state data.
    pub custom_duration: bool,
    pub mix_duration: f32,
    pub event_threshold: f32,
    pub attachment_threshold: f32,
    pub draw_order_threshold: f32,
}

#[derive(Clone, Copy, Debug)]
pub struct StateMixerInput<'a> {
    pub clip: &'a StateClip,
    pub weight: f32,
    pub time: f32,
}

/// Drives track 0 of an [`crate::AnimationState`] from sequencer clips.
///
/// While playing, a clip whose weight rises starts its animation and the state does the
/// crossfading. Outside of playback the skeleton is posed directly as a preview.
#[derive(Debug, Default)]
pub struct AnimationStateMixer {
    last_weights: Vec<f32>,
}

impl AnimationStateMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn process_frame(
        &mut self,
        target: Option<&mut SkeletonAnimation>,
        inputs: &[StateMixerInput<'_>],
        playing: bool,
    ) {
        let Some(target) = target else {
            return;
        };
        if !playing {
            Self::preview_edit_mode_pose(inputs, target);
            return;
        }

        if self.last_weights.len() < inputs.len() {
            self.last_weights.resize(inputs.len(), 0.0);
        }

        for (i, input) in inputs.iter().enumerate() {
            let started = input.weight > self.last_weights[i];
            self.last_weights[i] = input.weight;
            if started {
                Self::start_clip(target, input.clip);
            }
        }
    }

    fn start_clip(target: &mut SkeletonAnimation, clip: &StateClip) {
        let state = &mut target.state;
        if clip.animation_name.is_empty() {
            let mix_duration = if clip.custom_duration {
                clip.mix_duration
            } else {
                state.data().default_mix
            };
            if let Err(err) = state.set_empty_animation(0, mix_duration) {
                log::warn!("failed to mix out track 0: {err}");
            }
            return;
        }

        match state.set_animation(0, &clip.animation_name, clip.looped) {
            Ok(entry) => {
                log::debug!("track 0: clip started '{}'", clip.animation_name);
                entry.set_event_threshold(state, clip.event_threshold);
                entry.set_draw_order_threshold(state, clip.draw_order_threshold);
                entry.set_attachment_threshold(state, clip.attachment_threshold);
                if clip.custom_duration {
                    entry.set_mix_duration(state, clip.mix_duration);
                }
            }
            Err(err) => log::warn!("clip ignored: {err}"),
        }
    }

    /// Approximates what the animation state would show at the current sequencer time.
    ///
    /// Only the last fully weighted clip and the clip right before it are considered.
    pub fn preview_edit_mode_pose(inputs: &[StateMixerInput<'_>], target: &mut SkeletonAnimation) {
        let Some(to_index) = inputs.iter().rposition(|input| input.weight >= 1.0) else {
            return;
        };
        let to_input = &inputs[to_index];
        let skeleton_data = target.skeleton.data.clone();
        let Some((_, to_animation)) = skeleton_data.animation(&to_input.clip.animation_name) else {
            return;
        };

        let from = to_index
            .checked_sub(1)
            .map(|i| &inputs[i])
            .and_then(|input| {
                skeleton_data
                    .animation(&input.clip.animation_name)
                    .map(|(_, animation)| (animation, input))
            });

        let mut mix_duration = to_input.clip.mix_duration;
        if let Some((from_animation, _)) = from {
            if !to_input.clip.custom_duration {
                mix_duration = target.state.data().mix(from_animation, to_animation);
            }
        }

        let skeleton = &mut target.skeleton;
        skeleton.set_to_setup_pose();
        let to_time = to_input.time;
        match from {
            Some((from_animation, from_input)) if mix_duration > 0.0 && to_time < mix_duration => {
                let from_alpha = 1.0 - to_time / mix_duration;
                // Avoid the dip a linear crossfade shows halfway through.
                let from_alpha = if from_alpha > 0.5 {
                    1.0
                } else {
                    from_alpha * 2.0
                };
                from_animation.apply(
                    skeleton,
                    0.0,
                    from_input.time,
                    from_input.clip.looped,
                    None,
                    from_alpha,
                    MixPose::Setup,
                    MixDirection::Out,
                );
                to_animation.apply(
                    skeleton,
                    0.0,
                    to_time,
                    to_input.clip.looped,
                    None,
                    to_time / mix_duration,
                    MixPose::Current,
                    MixDirection::In,
                );
            }
            _ => to_animation.pose_skeleton(skeleton, to_time, to_input.clip.looped),
        }
    }
}
