use crate::{
    Animation, Error, Event, MixDirection, MixPose, PropertyId, Skeleton, SkeletonData, Timeline,
    wrap_time,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

const EMPTY_ANIMATION_NAME: &str = "<empty>";

fn empty_animation() -> Arc<Animation> {
    Arc::new(Animation::new(EMPTY_ANIMATION_NAME, 0.0, Vec::new()))
}

/// Generational handle into the track entry arena. A freed entry's id never resolves again.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct EntryId {
    index: usize,
    generation: u32,
}

#[derive(Debug)]
struct EntrySlot {
    generation: u32,
    entry: Option<TrackEntry>,
}

#[derive(Clone, Debug)]
pub struct AnimationStateData {
    pub skeleton_data: Arc<SkeletonData>,
    pub default_mix: f32,
    mixes: HashMap<(usize, usize), f32>,
}

impl AnimationStateData {
    pub fn new(skeleton_data: Arc<SkeletonData>) -> Self {
        Self {
            skeleton_data,
            default_mix: 0.0,
            mixes: HashMap::new(),
        }
    }

    pub fn set_mix(&mut self, from: &str, to: &str, duration: f32) -> Result<(), Error> {
        if duration.is_nan() || duration < 0.0 {
            return Err(Error::InvalidValue {
                message: "mix duration must be finite and >= 0".to_string(),
            });
        }
        let from_index = self.animation_index(from)?;
        let to_index = self.animation_index(to)?;
        self.mixes.insert((from_index, to_index), duration);
        Ok(())
    }

    /// Crossfade duration between two animations, falling back to `default_mix`.
    pub fn mix(&self, from: &Animation, to: &Animation) -> f32 {
        let index = |name: &str| self.skeleton_data.animation_index.get(name).copied();
        match (index(&from.name), index(&to.name)) {
            (Some(from), Some(to)) => self
                .mixes
                .get(&(from, to))
                .copied()
                .unwrap_or(self.default_mix),
            _ => self.default_mix,
        }
    }

    fn animation_index(&self, name: &str) -> Result<usize, Error> {
        self.skeleton_data
            .animation(name)
            .map(|(index, _)| index)
            .ok_or_else(|| Error::UnknownAnimation {
                name: name.to_string(),
            })
    }
}

/// Playback state of one animation on one track.
///
/// `mixing_from` links to the entry this one is crossfading from, so a track forms a chain
/// `current -> ... -> oldest` that ends at an entry without a predecessor.
#[derive(Clone, Debug)]
pub struct TrackEntry {
    pub track_index: usize,
    animation: Arc<Animation>,
    pub looped: bool,

    pub animation_start: f32,
    pub animation_end: f32,
    pub track_time: f32,
    pub track_end: f32,
    pub time_scale: f32,

    animation_last: f32,
    next_animation_last: f32,
    track_last: f32,
    next_track_last: f32,

    pub alpha: f32,
    pub mix_time: f32,
    pub mix_duration: f32,
    pub interrupt_alpha: f32,
    pub total_alpha: f32,
    mixing_from: Option<EntryId>,

    pub event_threshold: f32,
    pub attachment_threshold: f32,
    pub draw_order_threshold: f32,
}

impl TrackEntry {
    fn new(track_index: usize, animation: Arc<Animation>, looped: bool) -> Self {
        let animation_end = animation.duration;
        Self {
            track_index,
            animation,
            looped,
            animation_start: 0.0,
            animation_end,
            track_time: 0.0,
            track_end: f32::MAX,
            time_scale: 1.0,
            animation_last: -1.0,
            next_animation_last: -1.0,
            track_last: -1.0,
            next_track_last: -1.0,
            alpha: 1.0,
            mix_time: 0.0,
            mix_duration: 0.0,
            interrupt_alpha: 1.0,
            total_alpha: 0.0,
            mixing_from: None,
            event_threshold: 0.0,
            attachment_threshold: 0.0,
            draw_order_threshold: 0.0,
        }
    }

    pub fn animation(&self) -> &Arc<Animation> {
        &self.animation
    }

    /// Animation time applied on the previous frame, `-1` before the first apply.
    pub fn animation_last(&self) -> f32 {
        self.animation_last
    }

    pub fn track_last(&self) -> f32 {
        self.track_last
    }

    pub fn mixing_from(&self) -> Option<EntryId> {
        self.mixing_from
    }

    /// Track time mapped into the animation, wrapped when looping.
    pub fn animation_time(&self) -> f32 {
        if self.looped {
            let duration = self.animation_end - self.animation_start;
            if duration == 0.0 {
                return self.animation_start;
            }
            return wrap_time(self.track_time, duration) + self.animation_start;
        }
        (self.track_time + self.animation_start).min(self.animation_end)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrackEntryHandle {
    id: EntryId,
}

impl TrackEntryHandle {
    pub fn id(&self) -> EntryId {
        self.id
    }

    fn with_entry_mut(&self, state: &mut AnimationState, f: impl FnOnce(&mut TrackEntry)) {
        if let Some(entry) = state.entry_mut(self.id) {
            f(entry);
        }
    }

    pub fn set_mix_duration(&self, state: &mut AnimationState, mix_duration: f32) {
        self.with_entry_mut(state, |entry| {
            entry.mix_duration = mix_duration;
        });
    }

    pub fn set_alpha(&self, state: &mut AnimationState, alpha: f32) {
        self.with_entry_mut(state, |entry| {
            entry.alpha = alpha;
        });
    }

    pub fn set_track_end(&self, state: &mut AnimationState, track_end: f32) {
        self.with_entry_mut(state, |entry| {
            entry.track_end = track_end;
        });
    }

    pub fn set_time_scale(&self, state: &mut AnimationState, time_scale: f32) {
        self.with_entry_mut(state, |entry| {
            entry.time_scale = time_scale;
        });
    }

    pub fn set_event_threshold(&self, state: &mut AnimationState, threshold: f32) {
        self.with_entry_mut(state, |entry| {
            entry.event_threshold = threshold;
        });
    }

    pub fn set_attachment_threshold(&self, state: &mut AnimationState, threshold: f32) {
        self.with_entry_mut(state, |entry| {
            entry.attachment_threshold = threshold;
        });
    }

    pub fn set_draw_order_threshold(&self, state: &mut AnimationState, threshold: f32) {
        self.with_entry_mut(state, |entry| {
            entry.draw_order_threshold = threshold;
        });
    }
}

/// Walks a track's mixing chain from the current entry to the oldest one.
pub struct MixingChain<'a> {
    state: &'a AnimationState,
    next: Option<EntryId>,
}

impl<'a> Iterator for MixingChain<'a> {
    type Item = &'a TrackEntry;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.state.entry(self.next?)?;
        self.next = entry.mixing_from;
        Some(entry)
    }
}

pub struct AnimationState {
    data: AnimationStateData,
    tracks: Vec<Option<EntryId>>,
    entries: Vec<EntrySlot>,
    free_list: Vec<usize>,
    events: Vec<Event>,
    property_ids: HashSet<PropertyId>,
}

impl AnimationState {
    pub fn new(data: AnimationStateData) -> Self {
        Self {
            data,
            tracks: Vec::new(),
            entries: Vec::new(),
            free_list: Vec::new(),
            events: Vec::new(),
            property_ids: HashSet::new(),
        }
    }

    pub fn data(&self) -> &AnimationStateData {
        &self.data
    }

    pub fn tracks_len(&self) -> usize {
        self.tracks.len()
    }

    pub fn current(&self, track_index: usize) -> Option<&TrackEntry> {
        let id = (*self.tracks.get(track_index)?)?;
        self.entry(id)
    }

    pub fn entry(&self, id: EntryId) -> Option<&TrackEntry> {
        let slot = self.entries.get(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    pub fn mixing_chain(&self, track_index: usize) -> MixingChain<'_> {
        MixingChain {
            state: self,
            next: self.tracks.get(track_index).copied().flatten(),
        }
    }

    /// Events fired by [`AnimationState::apply`] since the last drain.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, Event> {
        self.events.drain(..)
    }

    pub fn set_animation(
        &mut self,
        track_index: usize,
        animation_name: &str,
        looped: bool,
    ) -> Result<TrackEntryHandle, Error> {
        let animation = self
            .data
            .skeleton_data
            .animation(animation_name)
            .map(|(_, animation)| animation.clone())
            .ok_or_else(|| Error::UnknownAnimation {
                name: animation_name.to_string(),
            })?;
        Ok(self.set_animation_internal(track_index, animation, looped))
    }

    /// Mixes the track out to the setup pose over `mix_duration`, then clears it.
    pub fn set_empty_animation(
        &mut self,
        track_index: usize,
        mix_duration: f32,
    ) -> Result<TrackEntryHandle, Error> {
        if !mix_duration.is_finite() || mix_duration < 0.0 {
            return Err(Error::InvalidValue {
                message: "mix duration must be finite and >= 0".to_string(),
            });
        }
        let entry = self.set_animation_internal(track_index, empty_animation(), false);
        entry.set_mix_duration(self, mix_duration);
        entry.set_track_end(self, mix_duration);
        Ok(entry)
    }

    fn set_animation_internal(
        &mut self,
        track_index: usize,
        animation: Arc<Animation>,
        looped: bool,
    ) -> TrackEntryHandle {
        self.ensure_track(track_index);

        let mut previous = self.tracks[track_index];
        if let Some(old) = previous {
            // Never applied: replace it outright instead of mixing from it.
            let unapplied = self.entry(old).map(|e| (e.next_track_last < 0.0, e.mixing_from));
            if let Some((true, from)) = unapplied {
                self.tracks[track_index] = from;
                self.free_entry(old);
                previous = from;
            }
        }

        let mut entry = TrackEntry::new(track_index, animation, looped);
        if let Some(from) = previous.and_then(|id| self.entry(id)) {
            entry.mix_duration = self.data.mix(&from.animation, &entry.animation);
            entry.mixing_from = previous;
            entry.mix_time = 0.0;
            if from.mixing_from.is_some() && from.mix_duration > 0.0 {
                entry.interrupt_alpha *= (from.mix_time / from.mix_duration).min(1.0);
            }
        }

        log::trace!(
            "track {track_index}: set animation '{}' (mix {})",
            entry.animation.name,
            entry.mix_duration
        );
        let id = self.alloc_entry(entry);
        self.tracks[track_index] = Some(id);
        TrackEntryHandle { id }
    }

    pub fn update(&mut self, delta: f32) {
        if !delta.is_finite() || delta < 0.0 {
            return;
        }

        for track_index in 0..self.tracks.len() {
            let Some(current_id) = self.tracks[track_index] else {
                continue;
            };
            let Some(current) = self.entry_mut(current_id) else {
                self.tracks[track_index] = None;
                continue;
            };

            current.animation_last = current.next_animation_last;
            current.track_last = current.next_track_last;
            let current_delta = delta * current.time_scale;
            let mixing_from = current.mixing_from;

            if mixing_from.is_none() && current.track_last >= current.track_end {
                log::trace!("track {track_index}: reached track end");
                self.clear_track(track_index);
                continue;
            }

            if mixing_from.is_some() && self.update_mixing_from(current_id, delta) {
                // Every predecessor has finished: drop what is left of the chain.
                let rest = self
                    .entry_mut(current_id)
                    .and_then(|current| current.mixing_from.take());
                self.free_chain(rest);
            }

            if let Some(current) = self.entry_mut(current_id) {
                current.track_time += current_delta;
            }
        }
    }

    fn update_mixing_from(&mut self, to_id: EntryId, delta: f32) -> bool {
        let Some(from_id) = self.entry(to_id).and_then(|to| to.mixing_from) else {
            return true;
        };
        let finished = self.update_mixing_from(from_id, delta);

        let Some(from) = self.entry_mut(from_id) else {
            return finished;
        };
        from.animation_last = from.next_animation_last;
        from.track_last = from.next_track_last;
        let (from_total_alpha, from_mixing_from, from_interrupt_alpha, from_time_scale) = (
            from.total_alpha,
            from.mixing_from,
            from.interrupt_alpha,
            from.time_scale,
        );

        let Some(to) = self.entry_mut(to_id) else {
            return finished;
        };
        // Requiring mix_time > 0 guarantees the predecessor was applied at least once.
        if to.mix_time > 0.0 && to.mix_time >= to.mix_duration {
            if from_total_alpha == 0.0 || to.mix_duration == 0.0 {
                to.mixing_from = from_mixing_from;
                to.interrupt_alpha = from_interrupt_alpha;
                log::debug!("track {}: mix finished", to.track_index);
                self.free_entry(from_id);
            }
            return finished;
        }
        to.mix_time += delta;

        if let Some(from) = self.entry_mut(from_id) {
            from.track_time += delta * from_time_scale;
        }
        false
    }

    /// Applies every track to the skeleton. Returns `false` when no track has an entry.
    pub fn apply(&mut self, skeleton: &mut Skeleton) -> bool {
        self.property_ids.clear();
        let mut applied = false;

        for track_index in 0..self.tracks.len() {
            let Some(current_id) = self.tracks[track_index] else {
                continue;
            };
            let Some(current) = self.entry(current_id) else {
                continue;
            };
            applied = true;

            let current_pose = if track_index == 0 {
                MixPose::Current
            } else {
                MixPose::CurrentLayered
            };

            let (mut mix, has_from, ended) = (
                current.alpha,
                current.mixing_from.is_some(),
                current.track_time >= current.track_end,
            );
            if has_from {
                mix *= self.apply_mixing_from(current_id, skeleton, current_pose);
            } else if ended {
                mix = 0.0;
            }

            let Some(current) = self.entry(current_id) else {
                continue;
            };
            let animation = current.animation.clone();
            let animation_last = current.animation_last;
            let animation_time = current.animation_time();
            let track_time = current.track_time;

            for timeline in &animation.timelines {
                let first = self.property_ids.insert(timeline.property_id());
                let pose = if mix >= 1.0 || first {
                    MixPose::Setup
                } else {
                    current_pose
                };
                timeline.apply(
                    skeleton,
                    animation_last,
                    animation_time,
                    Some(&mut self.events),
                    mix.min(1.0),
                    pose,
                    MixDirection::In,
                );
            }

            if let Some(current) = self.entry_mut(current_id) {
                current.next_animation_last = animation_time;
                current.next_track_last = track_time;
            }
        }

        applied
    }

    fn apply_mixing_from(
        &mut self,
        to_id: EntryId,
        skeleton: &mut Skeleton,
        current_pose: MixPose,
    ) -> f32 {
        let Some(from_id) = self.entry(to_id).and_then(|to| to.mixing_from) else {
            return 1.0;
        };
        if self.entry(from_id).is_some_and(|from| from.mixing_from.is_some()) {
            self.apply_mixing_from(from_id, skeleton, current_pose);
        }

        let (Some(to), Some(from)) = (self.entry(to_id), self.entry(from_id)) else {
            return 1.0;
        };
        let mix = if to.mix_duration == 0.0 {
            1.0
        } else {
            (to.mix_time / to.mix_duration).min(1.0)
        };
        let fire_events = mix < from.event_threshold;
        let attachments = mix < from.attachment_threshold;
        let draw_order = mix < from.draw_order_threshold;
        let alpha = from.alpha * to.interrupt_alpha * (1.0 - mix);

        let animation = from.animation.clone();
        let animation_last = from.animation_last;
        let animation_time = from.animation_time();
        let track_time = from.track_time;

        let mut total_alpha = 0.0;
        for timeline in &animation.timelines {
            let pose = if self.property_ids.insert(timeline.property_id()) {
                MixPose::Setup
            } else {
                match timeline {
                    Timeline::Attachment(_) if !attachments => continue,
                    Timeline::DrawOrder(_) if !draw_order => continue,
                    _ => current_pose,
                }
            };
            let events = if fire_events {
                Some(&mut self.events)
            } else {
                None
            };
            timeline.apply(
                skeleton,
                animation_last,
                animation_time,
                events,
                alpha,
                pose,
                MixDirection::Out,
            );
            total_alpha += alpha;
        }

        if let Some(from) = self.entry_mut(from_id) {
            from.total_alpha = total_alpha;
            from.next_animation_last = animation_time;
            from.next_track_last = track_time;
        }
        mix
    }

    pub fn clear_track(&mut self, track_index: usize) {
        let Some(slot) = self.tracks.get_mut(track_index) else {
            return;
        };
        let head = slot.take();
        self.free_chain(head);
    }

    pub fn clear_tracks(&mut self) {
        for track_index in 0..self.tracks.len() {
            self.clear_track(track_index);
        }
        self.tracks.clear();
    }

    fn ensure_track(&mut self, track_index: usize) {
        if self.tracks.len() <= track_index {
            self.tracks.resize(track_index + 1, None);
        }
    }

    fn free_chain(&mut self, mut next: Option<EntryId>) {
        while let Some(id) = next {
            next = self.entry(id).and_then(|e| e.mixing_from);
            self.free_entry(id);
        }
    }

    fn alloc_entry(&mut self, entry: TrackEntry) -> EntryId {
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.entries[index];
            slot.entry = Some(entry);
            EntryId {
                index,
                generation: slot.generation,
            }
        } else {
            let index = self.entries.len();
            self.entries.push(EntrySlot {
                generation: 0,
                entry: Some(entry),
            });
            EntryId {
                index,
                generation: 0,
            }
        }
    }

    fn entry_mut(&mut self, id: EntryId) -> Option<&mut TrackEntry> {
        let slot = self.entries.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    fn free_entry(&mut self, id: EntryId) {
        let Some(slot) = self.entries.get_mut(id.index) else {
            return;
        };
        if slot.generation != id.generation {
            return;
        }
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(id.index);
    }
}
