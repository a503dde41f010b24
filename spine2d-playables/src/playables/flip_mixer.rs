use super::SkeletonPlayableHandle;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct FlipClip {
    pub flip_x: bool,
    pub flip_y: bool,
}

#[derive(Clone, Copy, Debug)]
pub struct FlipInput<'a> {
    pub clip: &'a FlipClip,
    pub weight: f32,
}

/// Sets the skeleton's flip flags from the most weighted clip.
///
/// The flags found on the first processed frame are the defaults. They come back whenever the
/// clips cover less weight than is left uncovered, and when the graph stops.
#[derive(Debug, Default)]
pub struct SkeletonFlipMixer {
    defaults: Option<(bool, bool)>,
}

impl SkeletonFlipMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn defaults(&self) -> Option<(bool, bool)> {
        self.defaults
    }

    pub fn process_frame(
        &mut self,
        handle: Option<&mut SkeletonPlayableHandle>,
        inputs: &[FlipInput<'_>],
    ) {
        let Some(handle) = handle else {
            return;
        };
        let skeleton = handle.skeleton_mut();
        let (default_x, default_y) = *self
            .defaults
            .get_or_insert((skeleton.flip_x, skeleton.flip_y));

        let mut total_weight = 0.0;
        let mut greatest_weight = 0.0;
        let mut active_inputs = 0;
        let mut chosen = None;
        for input in inputs {
            total_weight += input.weight;
            if input.weight > greatest_weight {
                greatest_weight = input.weight;
                chosen = Some(*input.clip);
            }
            if input.weight > 0.0 {
                active_inputs += 1;
            }
        }

        let (flip_x, flip_y) = if active_inputs != 1 && 1.0 - total_weight > greatest_weight {
            (default_x, default_y)
        } else {
            match chosen {
                Some(clip) => (clip.flip_x, clip.flip_y),
                None => (default_x, default_y),
            }
        };
        if (skeleton.flip_x, skeleton.flip_y) != (flip_x, flip_y) {
            log::trace!("flip changed to ({flip_x}, {flip_y})");
        }
        skeleton.flip_x = flip_x;
        skeleton.flip_y = flip_y;
    }

    /// Restores the flags the skeleton had before the first frame.
    pub fn on_graph_stop(&mut self, handle: &mut SkeletonPlayableHandle) {
        let Some((flip_x, flip_y)) = self.defaults.take() else {
            return;
        };
        let skeleton = handle.skeleton_mut();
        skeleton.flip_x = flip_x;
        skeleton.flip_y = flip_y;
    }
}
