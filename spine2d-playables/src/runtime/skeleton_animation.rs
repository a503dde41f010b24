use crate::{AnimationState, AnimationStateData, Skeleton, SkeletonData};
use std::sync::Arc;

/// A skeleton driven by an [`AnimationState`].
pub struct SkeletonAnimation {
    pub skeleton: Skeleton,
    pub state: AnimationState,
}

impl SkeletonAnimation {
    pub fn new(data: Arc<SkeletonData>) -> Self {
        Self::with_state_data(AnimationStateData::new(data))
    }

    pub fn with_state_data(state_data: AnimationStateData) -> Self {
        Self {
            skeleton: Skeleton::new(state_data.skeleton_data.clone()),
            state: AnimationState::new(state_data),
        }
    }

    pub fn update(&mut self, delta: f32) {
        self.update_with_local_hook(delta, |_, _| {});
    }

    /// Advances and applies the state, then passes the freshly posed skeleton to `update_local`.
    ///
    /// Local pose edits made by the hook (root motion, procedural bones) land after animation.
    pub fn update_with_local_hook(
        &mut self,
        delta: f32,
        update_local: impl FnOnce(&mut Skeleton, &AnimationState),
    ) {
        self.state.update(delta);
        self.state.apply(&mut self.skeleton);
        update_local(&mut self.skeleton, &self.state);
    }
}
