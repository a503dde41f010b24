use crate::{
    BoneData, FlipClip, FlipInput, Skeleton, SkeletonData, SkeletonFlipMixer,
    SkeletonPlayableHandle,
};
use std::sync::Arc;

fn handle(flip_x: bool, flip_y: bool) -> SkeletonPlayableHandle {
    let data = SkeletonData::new(vec![BoneData::new("root", None)], Vec::new());
    let mut skeleton = Skeleton::new(Arc::new(data));
    skeleton.flip_x = flip_x;
    skeleton.flip_y = flip_y;
    SkeletonPlayableHandle::new(skeleton)
}

fn flips(handle: &SkeletonPlayableHandle) -> (bool, bool) {
    (handle.skeleton().flip_x, handle.skeleton().flip_y)
}

const MIRROR_X: FlipClip = FlipClip {
    flip_x: true,
    flip_y: false,
};
const UPSIDE_DOWN: FlipClip = FlipClip {
    flip_x: false,
    flip_y: true,
};

#[test]
fn greatest_weight_wins() {
    let mut handle = handle(false, false);
    let mut mixer = SkeletonFlipMixer::new();

    mixer.process_frame(
        Some(&mut handle),
        &[
            FlipInput {
                clip: &MIRROR_X,
                weight: 0.3,
            },
            FlipInput {
                clip: &UPSIDE_DOWN,
                weight: 0.7,
            },
        ],
    );
    assert_eq!(flips(&handle), (false, true));
    assert_eq!(mixer.defaults(), Some((false, false)));
}

#[test]
fn mostly_uncovered_frame_reverts_to_defaults() {
    let mut handle = handle(false, true);
    let mut mixer = SkeletonFlipMixer::new();

    mixer.process_frame(
        Some(&mut handle),
        &[
            FlipInput {
                clip: &MIRROR_X,
                weight: 0.2,
            },
            FlipInput {
                clip: &MIRROR_X,
                weight: 0.1,
            },
        ],
    );
    assert_eq!(flips(&handle), (false, true));

    mixer.process_frame(Some(&mut handle), &[]);
    assert_eq!(flips(&handle), (false, true));
}

#[test]
fn single_active_input_applies_at_any_weight() {
    let mut handle = handle(false, false);
    let mut mixer = SkeletonFlipMixer::new();

    mixer.process_frame(
        Some(&mut handle),
        &[
            FlipInput {
                clip: &MIRROR_X,
                weight: 0.2,
            },
            FlipInput {
                clip: &UPSIDE_DOWN,
                weight: 0.0,
            },
        ],
    );
    assert_eq!(flips(&handle), (true, false));
}

#[test]
fn graph_stop_restores_the_first_seen_flags() {
    let mut handle = handle(true, false);
    let mut mixer = SkeletonFlipMixer::new();

    mixer.process_frame(
        Some(&mut handle),
        &[FlipInput {
            clip: &UPSIDE_DOWN,
            weight: 1.0,
        }],
    );
    assert_eq!(flips(&handle), (false, true));

    mixer.on_graph_stop(&mut handle);
    assert_eq!(flips(&handle), (true, false));
    assert_eq!(mixer.defaults(), None);
}

#[test]
fn unbound_handle_is_a_no_op() {
    let mut mixer = SkeletonFlipMixer::new();
    mixer.process_frame(
        None,
        &[FlipInput {
            clip: &MIRROR_X,
            weight: 1.0,
        }],
    );
    assert_eq!(mixer.defaults(), None);
}
