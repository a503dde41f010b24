use std::collections::HashMap;
use std::sync::Arc;

#[derive(Clone, Debug)]
pub struct BoneData {
    pub name: String,
    pub parent: Option<usize>,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
}

impl BoneData {
    /// Identity setup pose at the parent's origin.
    pub fn new(name: impl Into<String>, parent: Option<usize>) -> Self {
        Self {
            name: name.into(),
            parent,
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SlotData {
    pub name: String,
    pub bone: usize,
    pub attachment: Option<String>,
}

#[derive(Clone, Debug)]
pub struct EventData {
    pub name: String,
    pub int_value: i32,
    pub float_value: f32,
    pub string: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub time: f32,
    pub name: String,
    pub int_value: i32,
    pub float_value: f32,
    pub string: String,
}

impl Event {
    pub fn from_data(data: &EventData, time: f32) -> Self {
        Self {
            time,
            name: data.name.clone(),
            int_value: data.int_value,
            float_value: data.float_value,
            string: data.string.clone(),
        }
    }
}

/// Interpolation from a key to the next one.
///
/// `Bezier` control points are normalized: both axes run from 0 at the key to 1 at the next key.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
pub enum Curve {
    #[default]
    Linear,
    Stepped,
    Bezier {
        cx1: f32,
        cy1: f32,
        cx2: f32,
        cy2: f32,
    },
}

#[derive(Clone, Debug)]
pub struct FloatFrame {
    pub time: f32,
    pub value: f32,
    pub curve: Curve,
}

#[derive(Clone, Debug)]
pub struct Vec2Frame {
    pub time: f32,
    pub x: f32,
    pub y: f32,
    pub curve: Curve,
}

#[derive(Clone, Debug)]
pub struct RotateTimeline {
    pub bone_index: usize,
    pub frames: Vec<FloatFrame>,
}

/// Offsets from the bone's setup position.
#[derive(Clone, Debug)]
pub struct TranslateTimeline {
    pub bone_index: usize,
    pub frames: Vec<Vec2Frame>,
}

/// Multipliers of the bone's setup scale.
#[derive(Clone, Debug)]
pub struct ScaleTimeline {
    pub bone_index: usize,
    pub frames: Vec<Vec2Frame>,
}

#[derive(Clone, Debug)]
pub struct AttachmentFrame {
    pub time: f32,
    pub name: Option<String>,
}

#[derive(Clone, Debug)]
pub struct AttachmentTimeline {
    pub slot_index: usize,
    pub frames: Vec<AttachmentFrame>,
}

#[derive(Clone, Debug)]
pub struct DrawOrderFrame {
    pub time: f32,
    /// `None` restores the setup order.
    pub draw_order_to_setup_index: Option<Vec<usize>>,
}

#[derive(Clone, Debug)]
pub struct DrawOrderTimeline {
    pub frames: Vec<DrawOrderFrame>,
}

#[derive(Clone, Debug)]
pub struct EventTimeline {
    pub events: Vec<Event>,
}

#[derive(Clone, Debug)]
pub enum Timeline {
    Rotate(RotateTimeline),
    Translate(TranslateTimeline),
    Scale(ScaleTimeline),
    Attachment(AttachmentTimeline),
    DrawOrder(DrawOrderTimeline),
    Event(EventTimeline),
}

#[derive(Clone, Debug)]
pub struct Animation {
    pub name: String,
    pub duration: f32,
    pub timelines: Vec<Timeline>,
}

impl Animation {
    pub fn new(name: impl Into<String>, duration: f32, timelines: Vec<Timeline>) -> Self {
        Self {
            name: name.into(),
            duration,
            timelines,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SkeletonData {
    pub bones: Vec<BoneData>,
    pub slots: Vec<SlotData>,
    pub events: HashMap<String, EventData>,
    pub animations: Vec<Arc<Animation>>,
    pub animation_index: HashMap<String, usize>,
}

impl SkeletonData {
    pub fn new(bones: Vec<BoneData>, slots: Vec<SlotData>) -> Self {
        Self {
            bones,
            slots,
            ..Self::default()
        }
    }

    /// Registers an animation, replacing any previous one with the same name.
    pub fn add_animation(&mut self, animation: Animation) -> usize {
        let animation = Arc::new(animation);
        if let Some(&index) = self.animation_index.get(&animation.name) {
            self.animations[index] = animation;
            return index;
        }
        let index = self.animations.len();
        self.animation_index.insert(animation.name.clone(), index);
        self.animations.push(animation);
        index
    }

    pub fn animation(&self, name: &str) -> Option<(usize, &Arc<Animation>)> {
        let index = *self.animation_index.get(name)?;
        Some((index, &self.animations[index]))
    }

    pub fn find_bone_index(&self, name: &str) -> Option<usize> {
        self.bones.iter().position(|b| b.name == name)
    }

    pub fn find_slot_index(&self, name: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.name == name)
    }
}
