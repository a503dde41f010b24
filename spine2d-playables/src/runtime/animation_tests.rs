use crate::{
    Animation, AttachmentFrame, AttachmentTimeline, BoneData, Curve, DrawOrderFrame,
    DrawOrderTimeline, Event, EventData, EventTimeline, FloatFrame, MixDirection, MixPose,
    RotateTimeline, ScaleTimeline, Skeleton, SkeletonData, SlotData, Timeline, TranslateTimeline,
    Vec2Frame, wrap_time,
};
use glam::Vec2;
use std::sync::Arc;

fn assert_approx(a: f32, b: f32, eps: f32, ctx: &str) {
    if (a - b).abs() > eps {
        panic!("{ctx}: expected {b}, got {a} (diff {})", (a - b).abs());
    }
}

fn key(time: f32, x: f32, y: f32) -> Vec2Frame {
    Vec2Frame {
        time,
        x,
        y,
        curve: Curve::Linear,
    }
}

fn event(time: f32, name: &str) -> Event {
    let data = EventData {
        name: name.to_string(),
        int_value: 7,
        float_value: 0.5,
        string: String::new(),
    };
    Event::from_data(&data, time)
}

fn skeleton_data() -> Arc<SkeletonData> {
    let mut hip = BoneData::new("hip", Some(0));
    hip.x = 3.0;
    hip.y = 1.0;
    let slots = vec![
        SlotData {
            name: "body".to_string(),
            bone: 1,
            attachment: Some("a".to_string()),
        },
        SlotData {
            name: "arm".to_string(),
            bone: 1,
            attachment: None,
        },
    ];
    Arc::new(SkeletonData::new(
        vec![BoneData::new("root", None), hip],
        slots,
    ))
}

fn translate(frames: Vec<Vec2Frame>) -> TranslateTimeline {
    TranslateTimeline {
        bone_index: 1,
        frames,
    }
}

#[test]
fn translate_setup_pose_scales_offset_by_alpha() {
    let data = skeleton_data();
    let mut skeleton = Skeleton::new(data);
    let timeline = Timeline::Translate(translate(vec![key(0.0, 0.0, 0.0), key(1.0, 10.0, 4.0)]));

    timeline.apply(
        &mut skeleton,
        0.0,
        0.5,
        None,
        0.5,
        MixPose::Setup,
        MixDirection::In,
    );
    assert_approx(skeleton.bones[1].x, 3.0 + 2.5, 1e-5, "x");
    assert_approx(skeleton.bones[1].y, 1.0 + 1.0, 1e-5, "y");
}

#[test]
fn before_first_key_depends_on_pose() {
    let data = skeleton_data();
    let mut skeleton = Skeleton::new(data);
    let timeline = Timeline::Translate(translate(vec![key(0.5, 10.0, 0.0)]));

    skeleton.bones[1].x = 7.0;
    timeline.apply(
        &mut skeleton,
        0.0,
        0.0,
        None,
        1.0,
        MixPose::CurrentLayered,
        MixDirection::In,
    );
    assert_approx(skeleton.bones[1].x, 7.0, 1e-6, "layered leaves the bone");

    timeline.apply(
        &mut skeleton,
        0.0,
        0.0,
        None,
        0.5,
        MixPose::Current,
        MixDirection::In,
    );
    assert_approx(skeleton.bones[1].x, 5.0, 1e-6, "current moves toward setup");

    timeline.apply(
        &mut skeleton,
        0.0,
        0.0,
        None,
        0.5,
        MixPose::Setup,
        MixDirection::In,
    );
    assert_approx(skeleton.bones[1].x, 3.0, 1e-6, "setup writes setup");
}

#[test]
fn stepped_and_bezier_curves() {
    assert_eq!(Curve::Stepped.percent(0.9), 0.0);
    assert_approx(Curve::Linear.percent(0.3), 0.3, 1e-6, "linear");

    let ease = Curve::Bezier {
        cx1: 0.25,
        cy1: 0.25,
        cx2: 0.75,
        cy2: 0.75,
    };
    assert_approx(ease.percent(0.0), 0.0, 1e-4, "bezier start");
    assert_approx(ease.percent(0.4), 0.4, 1e-3, "straight bezier");
    assert_approx(ease.percent(1.0), 1.0, 1e-4, "bezier end");

    let frames = vec![
        Vec2Frame {
            curve: Curve::Stepped,
            ..key(0.0, 0.0, 0.0)
        },
        key(1.0, 10.0, 0.0),
    ];
    let timeline = translate(frames);
    assert_eq!(timeline.evaluate(0.99, None), Vec2::ZERO);
    assert_eq!(timeline.evaluate(1.0, None), Vec2::new(10.0, 0.0));
}

#[test]
fn rotation_takes_the_short_way_around() {
    let data = skeleton_data();
    let mut skeleton = Skeleton::new(data);
    let timeline = Timeline::Rotate(RotateTimeline {
        bone_index: 1,
        frames: vec![
            FloatFrame {
                time: 0.0,
                value: 170.0,
                curve: Curve::Linear,
            },
            FloatFrame {
                time: 1.0,
                value: -170.0,
                curve: Curve::Linear,
            },
        ],
    });

    timeline.apply(
        &mut skeleton,
        0.0,
        0.5,
        None,
        1.0,
        MixPose::Setup,
        MixDirection::In,
    );
    assert_approx(skeleton.bones[1].rotation.abs(), 180.0, 1e-4, "rotation");
}

#[test]
fn scale_sign_follows_direction() {
    let data = skeleton_data();
    let mut skeleton = Skeleton::new(data);
    let timeline = Timeline::Scale(ScaleTimeline {
        bone_index: 1,
        frames: vec![key(0.0, -1.0, 1.0)],
    });

    timeline.apply(
        &mut skeleton,
        0.0,
        0.0,
        None,
        0.5,
        MixPose::Setup,
        MixDirection::In,
    );
    assert_approx(skeleton.bones[1].scale_x, -1.0, 1e-6, "in takes key sign");

    timeline.apply(
        &mut skeleton,
        0.0,
        0.0,
        None,
        0.5,
        MixPose::Setup,
        MixDirection::Out,
    );
    assert_approx(skeleton.bones[1].scale_x, 1.0, 1e-6, "out keeps pose sign");
}

#[test]
fn attachment_mixing_out_from_setup_restores_setup() {
    let data = skeleton_data();
    let mut skeleton = Skeleton::new(data);
    let timeline = Timeline::Attachment(AttachmentTimeline {
        slot_index: 0,
        frames: vec![AttachmentFrame {
            time: 0.0,
            name: Some("b".to_string()),
        }],
    });

    timeline.apply(
        &mut skeleton,
        0.0,
        0.5,
        None,
        1.0,
        MixPose::Current,
        MixDirection::In,
    );
    assert_eq!(skeleton.slots[0].attachment.as_deref(), Some("b"));

    timeline.set_to_setup_pose(&mut skeleton);
    assert_eq!(skeleton.slots[0].attachment.as_deref(), Some("a"));
}

#[test]
fn draw_order_keys_and_reset() {
    let data = skeleton_data();
    let mut skeleton = Skeleton::new(data);
    let timeline = Timeline::DrawOrder(DrawOrderTimeline {
        frames: vec![
            DrawOrderFrame {
                time: 0.0,
                draw_order_to_setup_index: Some(vec![1, 0]),
            },
            DrawOrderFrame {
                time: 1.0,
                draw_order_to_setup_index: None,
            },
        ],
    });

    timeline.apply(
        &mut skeleton,
        0.0,
        0.5,
        None,
        1.0,
        MixPose::Current,
        MixDirection::In,
    );
    assert_eq!(skeleton.draw_order, vec![1, 0]);

    timeline.apply(
        &mut skeleton,
        0.5,
        1.0,
        None,
        1.0,
        MixPose::Current,
        MixDirection::In,
    );
    assert_eq!(skeleton.draw_order, vec![0, 1]);
}

#[test]
fn events_fire_across_the_loop_boundary() {
    let data = skeleton_data();
    let mut skeleton = Skeleton::new(data);
    let timeline = Timeline::Event(EventTimeline {
        events: vec![event(0.2, "early"), event(0.8, "late")],
    });

    let mut fired = Vec::new();
    timeline.apply(
        &mut skeleton,
        0.5,
        0.3,
        Some(&mut fired),
        1.0,
        MixPose::Current,
        MixDirection::In,
    );
    let names = fired.iter().map(|e| e.name.as_str()).collect::<Vec<_>>();
    assert_eq!(names, vec!["late", "early"]);

    fired.clear();
    timeline.apply(
        &mut skeleton,
        0.2,
        0.8,
        None,
        1.0,
        MixPose::Current,
        MixDirection::In,
    );
    assert!(fired.is_empty(), "no buffer, no events");
}

#[test]
fn looped_animation_wraps_time() {
    let data = skeleton_data();
    let mut skeleton = Skeleton::new(data);
    let animation = Animation::new(
        "walk",
        2.0,
        vec![Timeline::Translate(translate(vec![
            key(0.0, 0.0, 0.0),
            key(2.0, 20.0, 0.0),
        ]))],
    );

    animation.pose_skeleton(&mut skeleton, 3.0, true);
    assert_approx(skeleton.bones[1].x, 3.0 + 10.0, 1e-5, "looped");

    animation.pose_skeleton(&mut skeleton, 3.0, false);
    assert_approx(skeleton.bones[1].x, 3.0 + 20.0, 1e-5, "clamped to last key");
}

#[test]
fn evaluate_is_relative_unless_data_is_given() {
    let data = skeleton_data();
    let timeline = translate(vec![key(0.5, 0.0, 0.0), key(1.5, 10.0, 10.0)]);

    assert_eq!(timeline.evaluate(0.0, None), Vec2::ZERO);
    assert_eq!(timeline.evaluate(1.0, None), Vec2::new(5.0, 5.0));
    assert_eq!(timeline.evaluate(1.0, Some(data.as_ref())), Vec2::new(8.0, 6.0));
}

#[test]
fn property_ids_identify_the_written_property() {
    let a = Timeline::Translate(translate(vec![key(0.0, 1.0, 0.0)]));
    let b = Timeline::Translate(translate(vec![key(1.0, 5.0, 0.0)]));
    let c = Timeline::Scale(ScaleTimeline {
        bone_index: 1,
        frames: vec![key(0.0, 1.0, 1.0)],
    });
    assert_eq!(a.property_id(), b.property_id());
    assert_ne!(a.property_id(), c.property_id());

    let animation = Animation::new("a", 1.0, vec![a]);
    assert!(animation.has_timeline(b.property_id()));
    assert!(!animation.has_timeline(c.property_id()));
    assert!(animation.find_translate_timeline_for_bone(1).is_some());
    assert!(animation.find_translate_timeline_for_bone(0).is_none());
}

#[test]
fn keyed_items_reset_leaves_other_properties() {
    let data = skeleton_data();
    let mut skeleton = Skeleton::new(data);
    let animation = Animation::new(
        "a",
        1.0,
        vec![Timeline::Translate(translate(vec![key(0.0, 1.0, 0.0)]))],
    );

    skeleton.bones[1].x = 50.0;
    skeleton.bones[1].rotation = 45.0;
    animation.set_keyed_items_to_setup_pose(&mut skeleton);
    assert_approx(skeleton.bones[1].x, 3.0, 1e-6, "x reset");
    assert_approx(skeleton.bones[1].rotation, 45.0, 1e-6, "rotation untouched");
}

#[test]
fn wrapped_time_stays_below_duration() {
    assert_eq!(wrap_time(3.0, 2.0), 1.0);
    assert_eq!(wrap_time(-0.5, 2.0), 1.5);
    assert_eq!(wrap_time(-1e-8, 2.0), 0.0);
    assert_eq!(wrap_time(4.0, 2.0), 0.0);
}
