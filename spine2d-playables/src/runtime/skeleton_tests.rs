use crate::{BoneData, Skeleton, SkeletonData, SlotData};
use std::sync::Arc;

fn skeleton() -> Skeleton {
    let mut hip = BoneData::new("hip", Some(0));
    hip.x = 4.0;
    let bones = vec![
        BoneData::new("root", None),
        hip,
        BoneData::new("spine", Some(1)),
        BoneData::new("head", Some(2)),
        BoneData::new("ik-target", Some(0)),
    ];
    let slots = vec![
        SlotData {
            name: "torso".to_string(),
            bone: 2,
            attachment: Some("torso".to_string()),
        },
        SlotData {
            name: "face".to_string(),
            bone: 3,
            attachment: None,
        },
    ];
    Skeleton::new(Arc::new(SkeletonData::new(bones, slots)))
}

#[test]
fn children_follow_the_hierarchy() {
    let skeleton = skeleton();
    assert_eq!(skeleton.children(0), &[1, 4]);
    assert_eq!(skeleton.children(2), &[3]);
    assert!(skeleton.children(3).is_empty());
    assert!(skeleton.children(99).is_empty());
    assert_eq!(skeleton.root_bone().map(|b| b.data_index()), Some(0));
}

#[test]
fn root_branch_is_the_child_of_the_root() {
    let skeleton = skeleton();
    assert_eq!(skeleton.root_branch_of(3), Some(1));
    assert_eq!(skeleton.root_branch_of(1), Some(1));
    assert_eq!(skeleton.root_branch_of(4), Some(4));
    assert_eq!(skeleton.root_branch_of(0), None);
    assert_eq!(skeleton.root_branch_of(42), None);
}

#[test]
fn setup_pose_restores_bones_slots_and_draw_order() {
    let mut skeleton = skeleton();
    let hip = skeleton.find_bone_mut("hip").unwrap();
    hip.x = 100.0;
    hip.rotation = 30.0;
    skeleton.slots[0].attachment = None;
    skeleton.slots[1].attachment = Some("smile".to_string());
    skeleton.draw_order = vec![1, 0];

    skeleton.set_to_setup_pose();
    let hip = skeleton.find_bone("hip").unwrap();
    assert_eq!(hip.x, 4.0);
    assert_eq!(hip.rotation, 0.0);
    assert_eq!(hip.parent_index(), Some(0));
    assert_eq!(skeleton.slots[0].attachment.as_deref(), Some("torso"));
    assert_eq!(skeleton.slots[1].attachment, None);
    assert_eq!(skeleton.draw_order, vec![0, 1]);
}

#[test]
fn unknown_bone_lookups_return_none() {
    let mut skeleton = skeleton();
    assert_eq!(skeleton.find_bone_index("tail"), None);
    assert!(skeleton.find_bone("tail").is_none());
    assert!(skeleton.find_bone_mut("tail").is_none());
    assert_eq!(skeleton.find_bone_index("head"), Some(3));
}
