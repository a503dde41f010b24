mod animation;
mod animation_state;
mod skeleton;
mod skeleton_animation;

pub use animation::*;
pub use animation_state::*;
pub use skeleton::*;
pub use skeleton_animation::*;

#[cfg(test)]
mod animation_tests;


#[cfg(test)]
mod skeleton_tests;
