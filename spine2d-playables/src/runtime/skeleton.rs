use crate::SkeletonData;
use std::sync::Arc;

/// Upper bound on parent hops when searching a bone's root branch.
const BONE_SEARCH_LIMIT: usize = 500;

#[derive(Clone, Debug)]
pub struct Bone {
    data_index: usize,
    parent: Option<usize>,

    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl Bone {
    pub fn data_index(&self) -> usize {
        self.data_index
    }

    pub fn parent_index(&self) -> Option<usize> {
        self.parent
    }
}

#[derive(Clone, Debug)]
pub struct Slot {
    data_index: usize,
    pub bone: usize,
    pub attachment: Option<String>,
}

impl Slot {
    pub fn data_index(&self) -> usize {
        self.data_index
    }
}

#[derive(Clone, Debug)]
pub struct Skeleton {
    pub data: Arc<SkeletonData>,
    pub bones: Vec<Bone>,
    bone_children: Vec<Vec<usize>>,
    pub slots: Vec<Slot>,
    pub draw_order: Vec<usize>,
    pub flip_x: bool,
    pub flip_y: bool,
}

impl Skeleton {
    pub fn new(data: Arc<SkeletonData>) -> Self {
        let bones = data
            .bones
            .iter()
            .enumerate()
            .map(|(data_index, bone)| Bone {
                data_index,
                parent: bone.parent,
                x: bone.x,
                y: bone.y,
                rotation: bone.rotation,
                scale_x: bone.scale_x,
                scale_y: bone.scale_y,
            })
            .collect::<Vec<_>>();

        let mut bone_children = vec![Vec::new(); bones.len()];
        for (index, bone) in bones.iter().enumerate() {
            if let Some(parent) = bone.parent.filter(|&p| p < bone_children.len()) {
                bone_children[parent].push(index);
            }
        }

        let slots = data
            .slots
            .iter()
            .enumerate()
            .map(|(data_index, slot)| Slot {
                data_index,
                bone: slot.bone,
                attachment: slot.attachment.clone(),
            })
            .collect::<Vec<_>>();
        let draw_order = (0..slots.len()).collect();

        Self {
            data,
            bones,
            bone_children,
            slots,
            draw_order,
            flip_x: false,
            flip_y: false,
        }
    }

    pub fn find_bone_index(&self, name: &str) -> Option<usize> {
        self.data.find_bone_index(name)
    }

    pub fn find_bone(&self, name: &str) -> Option<&Bone> {
        self.find_bone_index(name).and_then(|i| self.bones.get(i))
    }

    pub fn find_bone_mut(&mut self, name: &str) -> Option<&mut Bone> {
        let index = self.find_bone_index(name)?;
        self.bones.get_mut(index)
    }

    /// The implicit root: bone 0.
    pub fn root_bone(&self) -> Option<&Bone> {
        self.bones.first()
    }

    pub fn children(&self, bone_index: usize) -> &[usize] {
        self.bone_children
            .get(bone_index)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Returns the ancestor of `bone_index` (possibly itself) that is an immediate child of the
    /// root bone. `None` for the root bone itself or an invalid index.
    pub fn root_branch_of(&self, bone_index: usize) -> Option<usize> {
        let mut current = bone_index;
        for _ in 0..BONE_SEARCH_LIMIT {
            let parent = self.bones.get(current)?.parent?;
            if parent == 0 {
                return Some(current);
            }
            current = parent;
        }
        None
    }

    pub fn set_to_setup_pose(&mut self) {
        self.set_bones_to_setup_pose();
        self.set_slots_to_setup_pose();
    }

    pub fn set_bones_to_setup_pose(&mut self) {
        for (bone, data) in self.bones.iter_mut().zip(self.data.bones.iter()) {
            bone.x = data.x;
            bone.y = data.y;
            bone.rotation = data.rotation;
            bone.scale_x = data.scale_x;
            bone.scale_y = data.scale_y;
        }
    }

    pub fn set_slots_to_setup_pose(&mut self) {
        self.reset_draw_order();
        for (slot, data) in self.slots.iter_mut().zip(self.data.slots.iter()) {
            slot.attachment.clone_from(&data.attachment);
        }
    }

    pub(crate) fn reset_draw_order(&mut self) {
        self.draw_order.clear();
        self.draw_order.extend(0..self.slots.len());
    }

    pub(crate) fn set_slot_to_setup_attachment(&mut self, slot_index: usize) {
        let setup = self
            .data
            .slots
            .get(slot_index)
            .and_then(|s| s.attachment.clone());
        if let Some(slot) = self.slots.get_mut(slot_index) {
            slot.attachment = setup;
        }
    }
}
