//! Sequencer track mixing and root motion extraction for Spine-style skeletons (unofficial).
//!
//! The crate carries a small skeleton/animation runtime and two cores built on top of it:
//! [`AnimationMixer`] blends weighted clips from a host sequencer into a [`Skeleton`], and
//! [`RootMotion`] turns the translation of a bone into transform or rigid body motion.
//!
//! Engine integration (scene graph, physics, editor UI) stays on the host side, behind the
//! [`LocalTransform`] and [`RigidBody2D`] traits.

#![forbid(unsafe_code)]

mod error;
mod model;
mod playables;
mod root_motion;
mod runtime;

pub use error::*;
pub use model::*;
pub use playables::*;
pub use root_motion::*;
pub use runtime::*;
