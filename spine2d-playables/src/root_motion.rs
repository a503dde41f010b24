use crate::{AnimationState, Error, Skeleton, TrackEntry};
use glam::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RootMotionConfig {
    /// Bone whose translation becomes object motion.
    pub source_bone_name: String,
    pub use_x: bool,
    pub use_y: bool,
    /// Bones moved by the same correction as the source bone, typically other immediate
    /// children of the root such as IK targets.
    pub sibling_bone_names: Vec<String>,
}

impl Default for RootMotionConfig {
    fn default() -> Self {
        Self {
            source_bone_name: "root".to_string(),
            use_x: true,
            use_y: false,
            sibling_bone_names: Vec::new(),
        }
    }
}

/// The host object moved when no rigid body is bound.
pub trait LocalTransform {
    /// Moves the object by `delta` in its own local space.
    fn translate_local(&mut self, delta: Vec2);

    /// Converts a local-space vector to world space.
    fn transform_vector(&self, local: Vec2) -> Vec2;
}

pub trait RigidBody2D {
    fn velocity(&self) -> Vec2;
    fn set_velocity(&mut self, velocity: Vec2);
}

/// Extracts the motion of one bone from track 0 and moves the host object instead.
///
/// [`RootMotion::update_local`] runs after every pose update, [`RootMotion::fixed_update`] once
/// per physics tick when a rigid body is bound.
///
/// An entry started on an empty track with a non-zero mix duration never advances its mix
/// time, so it contributes no motion until it is replaced or mixed into.
#[derive(Clone, Debug)]
pub struct RootMotion {
    config: RootMotionConfig,
    bone_index: usize,
    sibling_bones: Vec<usize>,
    accumulated_displacement: Vec2,
    use_rigid_body: bool,
    enabled: bool,
}

impl RootMotion {
    pub fn new(config: RootMotionConfig, skeleton: &Skeleton) -> Self {
        let mut root_motion = Self {
            config,
            bone_index: 0,
            sibling_bones: Vec::new(),
            accumulated_displacement: Vec2::ZERO,
            use_rigid_body: false,
            enabled: true,
        };
        let source = root_motion.config.source_bone_name.clone();
        root_motion.set_source_bone(skeleton, &source);

        for name in &root_motion.config.sibling_bone_names {
            match skeleton.find_bone_index(name) {
                Some(index) => root_motion.sibling_bones.push(index),
                None => log::warn!("sibling bone '{name}' not found; skipped"),
            }
        }
        root_motion
    }

    pub fn config(&self) -> &RootMotionConfig {
        &self.config
    }

    pub fn bone_index(&self) -> usize {
        self.bone_index
    }

    pub fn sibling_bones(&self) -> &[usize] {
        &self.sibling_bones
    }

    pub fn accumulated_displacement(&self) -> Vec2 {
        self.accumulated_displacement
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling discards displacement not yet handed to the rigid body.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.accumulated_displacement = Vec2::ZERO;
        }
    }

    /// With a rigid body bound, motion is buffered for [`RootMotion::fixed_update`].
    pub fn bind_rigid_body(&mut self, bound: bool) {
        self.use_rigid_body = bound;
    }

    /// Tracks `name` from now on. An unknown name falls back to the root bone.
    pub fn set_source_bone(&mut self, skeleton: &Skeleton, name: &str) {
        let found = skeleton
            .find_bone_index(name)
            .ok_or_else(|| Error::UnknownBone {
                name: name.to_string(),
            });
        self.bone_index = match found {
            Ok(index) => index,
            Err(err) => {
                log::warn!("{err}; using the root bone");
                0
            }
        };
        self.config.source_bone_name = name.to_string();
    }

    /// Replaces the siblings with every other child of the source bone's parent.
    pub fn refresh_sibling_bones(&mut self, skeleton: &Skeleton) {
        let Some(bone_index) = skeleton.find_bone_index(&self.config.source_bone_name) else {
            return;
        };
        self.bone_index = bone_index;
        self.sibling_bones.clear();
        self.config.sibling_bone_names.clear();

        let Some(parent) = skeleton.bones[bone_index].parent_index() else {
            return;
        };
        for &child in skeleton.children(parent) {
            if child == bone_index {
                continue;
            }
            self.sibling_bones.push(child);
            self.config
                .sibling_bone_names
                .push(skeleton.data.bones[child].name.clone());
        }
    }

    /// Motion of the source bone since the previous apply, across track 0's mixing chain.
    ///
    /// Flip and disabled axes are already accounted for.
    pub fn compute_local_delta(&self, skeleton: &Skeleton, state: &AnimationState) -> Vec2 {
        let mut local_delta = Vec2::ZERO;
        let mut next: Option<&TrackEntry> = None;
        for track in state.mixing_chain(0) {
            local_delta += self.track_delta(track, next);
            next = Some(track);
        }

        if skeleton.flip_x {
            local_delta.x = -local_delta.x;
        }
        if skeleton.flip_y {
            local_delta.y = -local_delta.y;
        }
        if !self.config.use_x {
            local_delta.x = 0.0;
        }
        if !self.config.use_y {
            local_delta.y = 0.0;
        }
        local_delta
    }

    fn track_delta(&self, track: &TrackEntry, next: Option<&TrackEntry>) -> Vec2 {
        let animation = track.animation();
        let Some(timeline) = animation.find_translate_timeline_for_bone(self.bone_index) else {
            return Vec2::ZERO;
        };
        let value = |time: f32| timeline.evaluate(time, None);

        let start = track.animation_last();
        let end = track.animation_time();
        let delta = if start > end {
            // Wrapped since the last apply.
            (value(end) - value(0.0)) + (value(animation.duration) - value(start))
        } else if start != end {
            value(end) - value(start)
        } else {
            Vec2::ZERO
        };

        let factor = match next {
            Some(next) => {
                let mix = if next.mix_duration == 0.0 {
                    1.0
                } else {
                    (next.mix_time / next.mix_duration).min(1.0)
                };
                track.alpha * next.interrupt_alpha * (1.0 - mix)
            }
            None if track.mix_duration == 0.0 => 1.0,
            None => (track.alpha * (track.mix_time / track.mix_duration)).min(1.0),
        };
        delta * factor
    }

    /// Moves the host by this frame's motion and pulls the source bone back to the origin.
    pub fn update_local(
        &mut self,
        skeleton: &mut Skeleton,
        state: &AnimationState,
        transform: &mut dyn LocalTransform,
    ) {
        if !self.enabled {
            return;
        }
        let local_delta = self.compute_local_delta(skeleton, state);
        if self.use_rigid_body {
            self.accumulated_displacement += transform.transform_vector(local_delta);
        } else {
            transform.translate_local(local_delta);
        }

        let Some(bone) = skeleton.bones.get(self.bone_index) else {
            return;
        };
        let (bone_x, bone_y) = (bone.x, bone.y);
        let (use_x, use_y) = (self.config.use_x, self.config.use_y);
        for &sibling in &self.sibling_bones {
            let Some(sibling) = skeleton.bones.get_mut(sibling) else {
                continue;
            };
            if use_x {
                sibling.x -= bone_x;
            }
            if use_y {
                sibling.y -= bone_y;
            }
        }
        let bone = &mut skeleton.bones[self.bone_index];
        if use_x {
            bone.x = 0.0;
        }
        if use_y {
            bone.y = 0.0;
        }
    }

    /// Turns the buffered displacement into velocity on the enabled axes.
    pub fn fixed_update(&mut self, fixed_delta_time: f32, body: &mut dyn RigidBody2D) {
        if !self.enabled || !self.use_rigid_body {
            return;
        }
        if fixed_delta_time > 0.0 {
            let mut velocity = body.velocity();
            if self.config.use_x {
                velocity.x = self.accumulated_displacement.x / fixed_delta_time;
            }
            if self.config.use_y {
                velocity.y = self.accumulated_displacement.y / fixed_delta_time;
            }
            body.set_velocity(velocity);
        }
        self.accumulated_displacement = Vec2::ZERO;
    }
}
