use crate::{
    Animation, AttachmentTimeline, Curve, DrawOrderTimeline, Event, EventTimeline, FloatFrame,
    RotateTimeline, ScaleTimeline, Skeleton, SkeletonData, Timeline, TranslateTimeline, Vec2Frame,
};
use glam::Vec2;

/// Which pose a timeline blends from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MixPose {
    /// Blend from the setup pose. Before the first key the setup value is written.
    Setup,
    /// Blend from the current pose. Before the first key the current value moves toward setup.
    Current,
    /// Blend from the current pose. Before the first key nothing is written.
    CurrentLayered,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum MixDirection {
    In,
    Out,
}

const PROPERTY_ROTATE: u64 = 1 << 0;
const PROPERTY_TRANSLATE: u64 = 1 << 1;
const PROPERTY_SCALE: u64 = 1 << 2;
const PROPERTY_ATTACHMENT: u64 = 1 << 3;
const PROPERTY_DRAW_ORDER: u64 = 1 << 4;
const PROPERTY_EVENT: u64 = 1 << 5;

/// Identifies the skeleton property a timeline writes. Two timelines with the same id conflict.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct PropertyId(u64);

/// Wraps `time` into `[0, duration)`. `duration` must be non-zero.
pub(crate) fn wrap_time(time: f32, duration: f32) -> f32 {
    let wrapped = time.rem_euclid(duration);
    // rem_euclid rounds tiny negative times up to `duration`.
    if wrapped >= duration {
        0.0
    } else {
        wrapped
    }
}

impl PropertyId {
    fn new(property: u64, target: usize) -> Self {
        Self((property << 32) | (target as u64 & 0xffff_ffff))
    }
}

impl Timeline {
    pub fn property_id(&self) -> PropertyId {
        match self {
            Self::Rotate(t) => PropertyId::new(PROPERTY_ROTATE, t.bone_index),
            Self::Translate(t) => PropertyId::new(PROPERTY_TRANSLATE, t.bone_index),
            Self::Scale(t) => PropertyId::new(PROPERTY_SCALE, t.bone_index),
            Self::Attachment(t) => PropertyId::new(PROPERTY_ATTACHMENT, t.slot_index),
            Self::DrawOrder(_) => PropertyId::new(PROPERTY_DRAW_ORDER, 0),
            Self::Event(_) => PropertyId::new(PROPERTY_EVENT, 0),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &self,
        skeleton: &mut Skeleton,
        last_time: f32,
        time: f32,
        events: Option<&mut Vec<Event>>,
        alpha: f32,
        pose: MixPose,
        direction: MixDirection,
    ) {
        match self {
            Self::Rotate(t) => apply_rotate(t, skeleton, time, alpha, pose),
            Self::Translate(t) => apply_translate(t, skeleton, time, alpha, pose),
            Self::Scale(t) => apply_scale(t, skeleton, time, alpha, pose, direction),
            Self::Attachment(t) => apply_attachment(t, skeleton, time, pose, direction),
            Self::DrawOrder(t) => apply_draw_order(t, skeleton, time, pose, direction),
            Self::Event(t) => {
                if let Some(events) = events {
                    collect_events(t, last_time, time, events);
                }
            }
        }
    }

    /// Writes the setup value of the targeted property.
    pub fn set_to_setup_pose(&self, skeleton: &mut Skeleton) {
        self.apply(
            skeleton,
            0.0,
            0.0,
            None,
            0.0,
            MixPose::Setup,
            MixDirection::Out,
        );
    }
}

impl Animation {
    /// Applies every timeline. Looping wraps both times into `[0, duration)`.
    #[allow(clippy::too_many_arguments)]
    pub fn apply(
        &self,
        skeleton: &mut Skeleton,
        last_time: f32,
        time: f32,
        looped: bool,
        mut events: Option<&mut Vec<Event>>,
        alpha: f32,
        pose: MixPose,
        direction: MixDirection,
    ) {
        let mut last_time = last_time;
        let mut time = time;
        if looped && self.duration != 0.0 {
            time = wrap_time(time, self.duration);
            if last_time > 0.0 {
                last_time = wrap_time(last_time, self.duration);
            }
        }

        for timeline in &self.timelines {
            timeline.apply(
                skeleton,
                last_time,
                time,
                events.as_deref_mut(),
                alpha,
                pose,
                direction,
            );
        }
    }

    /// Poses the skeleton fully at `time`, ignoring events.
    pub fn pose_skeleton(&self, skeleton: &mut Skeleton, time: f32, looped: bool) {
        self.apply(
            skeleton,
            0.0,
            time,
            looped,
            None,
            1.0,
            MixPose::Setup,
            MixDirection::In,
        );
    }

    /// Resets only the properties this animation keys.
    pub fn set_keyed_items_to_setup_pose(&self, skeleton: &mut Skeleton) {
        for timeline in &self.timelines {
            timeline.set_to_setup_pose(skeleton);
        }
    }

    pub fn has_timeline(&self, id: PropertyId) -> bool {
        self.timelines.iter().any(|t| t.property_id() == id)
    }

    pub fn find_translate_timeline_for_bone(&self, bone_index: usize) -> Option<&TranslateTimeline> {
        self.timelines.iter().find_map(|t| match t {
            Timeline::Translate(tt) if tt.bone_index == bone_index => Some(tt),
            _ => None,
        })
    }
}

impl TranslateTimeline {
    /// Curve value at `time`, `(0, 0)` before the first key.
    ///
    /// With `skeleton_data` the bone's setup position is added, giving a local-absolute value.
    pub fn evaluate(&self, time: f32, skeleton_data: Option<&SkeletonData>) -> Vec2 {
        let Some(first) = self.frames.first() else {
            return Vec2::ZERO;
        };
        if time < first.time {
            return Vec2::ZERO;
        }
        let offset = sample_vec2(&self.frames, time);
        match skeleton_data.and_then(|d| d.bones.get(self.bone_index)) {
            Some(bone) => offset + Vec2::new(bone.x, bone.y),
            None => offset,
        }
    }
}

impl Curve {
    /// Maps the linear fraction between two keys to the eased fraction.
    pub fn percent(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Stepped => 0.0,
            Self::Bezier { cx1, cy1, cx2, cy2 } => bezier_percent(t, cx1, cy1, cx2, cy2),
        }
    }
}

fn bezier_percent(t: f32, cx1: f32, cy1: f32, cx2: f32, cy2: f32) -> f32 {
    fn cubic(s: f32, p1: f32, p2: f32) -> f32 {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
    }

    // x(s) is monotonic for control points inside [0, 1].
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    for _ in 0..24 {
        let mid = (lo + hi) * 0.5;
        if cubic(mid, cx1, cx2) < t {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    cubic((lo + hi) * 0.5, cy1, cy2)
}

/// Index of the key at or before `time` and the eased fraction toward the next key.
fn segment<F: Keyframe>(frames: &[F], time: f32) -> (usize, Option<f32>) {
    let next = frames.partition_point(|f| f.time() <= time);
    if next == 0 {
        return (0, None);
    }
    if next >= frames.len() {
        return (frames.len() - 1, None);
    }
    let prev = next - 1;
    let prev_time = frames[prev].time();
    let denom = frames[next].time() - prev_time;
    if denom.abs() <= 1.0e-12 {
        return (next, None);
    }
    let percent = frames[prev].curve().percent((time - prev_time) / denom);
    (prev, Some(percent))
}

trait Keyframe {
    fn time(&self) -> f32;
    fn curve(&self) -> Curve;
}

impl Keyframe for FloatFrame {
    fn time(&self) -> f32 {
        self.time
    }

    fn curve(&self) -> Curve {
        self.curve
    }
}

impl Keyframe for Vec2Frame {
    fn time(&self) -> f32 {
        self.time
    }

    fn curve(&self) -> Curve {
        self.curve
    }
}

fn sample_vec2(frames: &[Vec2Frame], time: f32) -> Vec2 {
    let (index, percent) = segment(frames, time);
    let prev = &frames[index];
    match percent {
        Some(p) => {
            let next = &frames[index + 1];
            Vec2::new(prev.x + (next.x - prev.x) * p, prev.y + (next.y - prev.y) * p)
        }
        None => Vec2::new(prev.x, prev.y),
    }
}

fn sample_rotate(frames: &[FloatFrame], time: f32) -> f32 {
    let (index, percent) = segment(frames, time);
    let prev = frames[index].value;
    match percent {
        Some(p) => {
            let next = frames[index + 1].value;
            wrap_degrees(prev + wrap_degrees(next - prev) * p)
        }
        None => prev,
    }
}

fn wrap_degrees(r: f32) -> f32 {
    r - 360.0 * (r / 360.0).round()
}

fn sign(value: f32) -> f32 {
    if value > 0.0 {
        1.0
    } else if value < 0.0 {
        -1.0
    } else {
        0.0
    }
}

pub(crate) fn apply_rotate(
    timeline: &RotateTimeline,
    skeleton: &mut Skeleton,
    time: f32,
    alpha: f32,
    pose: MixPose,
) {
    let Some(setup) = skeleton
        .data
        .bones
        .get(timeline.bone_index)
        .map(|b| b.rotation)
    else {
        return;
    };
    let Some(bone) = skeleton.bones.get_mut(timeline.bone_index) else {
        return;
    };
    let Some(first) = timeline.frames.first() else {
        return;
    };

    if time < first.time {
        match pose {
            MixPose::Setup => bone.rotation = setup,
            MixPose::Current => {
                bone.rotation += wrap_degrees(setup - bone.rotation) * alpha;
            }
            MixPose::CurrentLayered => {}
        }
        return;
    }

    let r = sample_rotate(&timeline.frames, time);
    match pose {
        MixPose::Setup => bone.rotation = setup + r * alpha,
        MixPose::Current | MixPose::CurrentLayered => {
            bone.rotation += wrap_degrees(setup + r - bone.rotation) * alpha;
        }
    }
}

pub(crate) fn apply_translate(
    timeline: &TranslateTimeline,
    skeleton: &mut Skeleton,
    time: f32,
    alpha: f32,
    pose: MixPose,
) {
    let Some(setup) = skeleton
        .data
        .bones
        .get(timeline.bone_index)
        .map(|b| Vec2::new(b.x, b.y))
    else {
        return;
    };
    let Some(bone) = skeleton.bones.get_mut(timeline.bone_index) else {
        return;
    };
    let Some(first) = timeline.frames.first() else {
        return;
    };

    if time < first.time {
        match pose {
            MixPose::Setup => {
                bone.x = setup.x;
                bone.y = setup.y;
            }
            MixPose::Current => {
                bone.x += (setup.x - bone.x) * alpha;
                bone.y += (setup.y - bone.y) * alpha;
            }
            MixPose::CurrentLayered => {}
        }
        return;
    }

    let offset = sample_vec2(&timeline.frames, time);
    match pose {
        MixPose::Setup => {
            bone.x = setup.x + offset.x * alpha;
            bone.y = setup.y + offset.y * alpha;
        }
        MixPose::Current | MixPose::CurrentLayered => {
            bone.x += (setup.x + offset.x - bone.x) * alpha;
            bone.y += (setup.y + offset.y - bone.y) * alpha;
        }
    }
}

pub(crate) fn apply_scale(
    timeline: &ScaleTimeline,
    skeleton: &mut Skeleton,
    time: f32,
    alpha: f32,
    pose: MixPose,
    direction: MixDirection,
) {
    let Some(setup) = skeleton
        .data
        .bones
        .get(timeline.bone_index)
        .map(|b| Vec2::new(b.scale_x, b.scale_y))
    else {
        return;
    };
    let Some(bone) = skeleton.bones.get_mut(timeline.bone_index) else {
        return;
    };
    let Some(first) = timeline.frames.first() else {
        return;
    };

    if time < first.time {
        match pose {
            MixPose::Setup => {
                bone.scale_x = setup.x;
                bone.scale_y = setup.y;
            }
            MixPose::Current => {
                bone.scale_x += (setup.x - bone.scale_x) * alpha;
                bone.scale_y += (setup.y - bone.scale_y) * alpha;
            }
            MixPose::CurrentLayered => {}
        }
        return;
    }

    let mut target = sample_vec2(&timeline.frames, time) * setup;
    if alpha == 1.0 {
        bone.scale_x = target.x;
        bone.scale_y = target.y;
        return;
    }

    let mut from = match pose {
        MixPose::Setup => setup,
        MixPose::Current | MixPose::CurrentLayered => Vec2::new(bone.scale_x, bone.scale_y),
    };
    // Mixing out keeps the sign of the pose being left, mixing in takes the sign of the key.
    match direction {
        MixDirection::Out => {
            target.x = target.x.abs() * sign(from.x);
            target.y = target.y.abs() * sign(from.y);
        }
        MixDirection::In => {
            from.x = from.x.abs() * sign(target.x);
            from.y = from.y.abs() * sign(target.y);
        }
    }
    bone.scale_x = from.x + (target.x - from.x) * alpha;
    bone.scale_y = from.y + (target.y - from.y) * alpha;
}

pub(crate) fn apply_attachment(
    timeline: &AttachmentTimeline,
    skeleton: &mut Skeleton,
    time: f32,
    pose: MixPose,
    direction: MixDirection,
) {
    if skeleton.slots.get(timeline.slot_index).is_none() {
        return;
    }
    if direction == MixDirection::Out && pose == MixPose::Setup {
        skeleton.set_slot_to_setup_attachment(timeline.slot_index);
        return;
    }
    let Some(first) = timeline.frames.first() else {
        return;
    };
    if time < first.time {
        if pose == MixPose::Setup {
            skeleton.set_slot_to_setup_attachment(timeline.slot_index);
        }
        return;
    }

    let frame_index = timeline
        .frames
        .partition_point(|f| f.time <= time)
        .saturating_sub(1);
    let name = timeline.frames[frame_index].name.clone();
    skeleton.slots[timeline.slot_index].attachment = name;
}

pub(crate) fn apply_draw_order(
    timeline: &DrawOrderTimeline,
    skeleton: &mut Skeleton,
    time: f32,
    pose: MixPose,
    direction: MixDirection,
) {
    if direction == MixDirection::Out && pose == MixPose::Setup {
        skeleton.reset_draw_order();
        return;
    }
    let Some(first) = timeline.frames.first() else {
        return;
    };
    if time < first.time {
        if pose == MixPose::Setup {
            skeleton.reset_draw_order();
        }
        return;
    }

    let frame_index = timeline
        .frames
        .partition_point(|f| f.time <= time)
        .saturating_sub(1);
    match timeline.frames[frame_index].draw_order_to_setup_index.as_ref() {
        Some(order) if order.len() == skeleton.slots.len() => {
            skeleton.draw_order.clone_from(order);
        }
        Some(_) => {}
        None => skeleton.reset_draw_order(),
    }
}

/// Fires events in `(last_time, time]`. When `last_time > time` the animation looped, so the
/// tail `(last_time, end]` fires first, followed by everything up to `time`.
pub(crate) fn collect_events(
    timeline: &EventTimeline,
    last_time: f32,
    time: f32,
    out: &mut Vec<Event>,
) {
    let mut emit = |from: f32, to: f32| {
        out.extend(
            timeline
                .events
                .iter()
                .filter(|ev| ev.time > from && ev.time <= to)
                .cloned(),
        );
    };

    if last_time > time {
        emit(last_time, f32::MAX);
        emit(-1.0, time);
    } else {
        emit(last_time, time);
    }
}
