//! Glide Core
//!
//! Value types shared by the Glide animation engine and the UI layers that
//! drive it:
//!
//! - **Color**: straight RGBA in the 0..1 range
//! - **Vec2 / Vec3**: positions, sizes and scales
//! - **Angle**: rotations in degrees with wrap-around helpers
//!
//! These are plain `Copy` data. Interpolation rules live in
//! `glide_animation::values`.

pub mod value;

pub use value::{Angle, Color, Vec2, Vec3};
