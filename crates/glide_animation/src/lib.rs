//! Glide Animation System
//!
//! Implicit property animation: write properties inside a definition
//! callback and the engine turns the writes into timed transitions.
//!
//! # Features
//!
//! - **Implicit Timelines**: property writes inside `animate` are captured, not applied
//! - **Collision Takeover**: a property animated by a new timeline leaves the old one
//! - **Chaining**: `then`, `then_after`, `then_animate` successors start on completion
//! - **Per-Owner Clocks**: time scale and liveness read from the owning node every frame
//! - **Easing**: named easing functions, custom curves, smoothstep by default
//! - **Typed Values**: floats (unclamped), angles (shortest path), colors, vectors
//! - **Pooling**: value records are recycled through per-kind free lists
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use glide_animation::{AnimationScheduler, EngineConfig, OwnerRef, PropertyHandle, Transition};
//!
//! let scheduler = AnimationScheduler::with_config(EngineConfig::deterministic());
//! let alpha = Rc::new(Cell::new(1.0_f32));
//! let (get, set) = (alpha.clone(), alpha.clone());
//! let opacity = PropertyHandle::new(
//!     scheduler.handle(),
//!     OwnerRef::detached(),
//!     move || get.get(),
//!     move |v| set.set(v),
//! );
//!
//! let fade = scheduler.animate(&OwnerRef::detached(), Transition::new(0.5), move || {
//!     opacity.set(0.0);
//! });
//!
//! scheduler.tick(0.25);
//! assert_eq!(alpha.get(), 0.5);
//! scheduler.tick(0.25);
//! assert_eq!(alpha.get(), 0.0);
//! assert!(fade.is_completed());
//! ```

pub mod config;
pub mod curve;
pub mod definition;
pub mod easing;
pub mod error;
pub mod owner;
mod pool;
pub mod property;
pub mod scheduler;
pub mod timeline;
pub mod track;
pub mod values;


pub use config::EngineConfig;
pub use curve::{AnimationCurve, CurveKey};
pub use definition::DefinitionContext;
pub use easing::{smoothstep, Easing, EasingRule};
pub use error::{EngineError, Result};
pub use owner::{AnimationOwner, OwnerRef};
pub use property::{ActiveTransition, LazyProperty, PropertyHandle};
pub use scheduler::{
    clear_thread_scheduler, get_scheduler, is_scheduler_initialized, set_thread_scheduler,
    try_get_scheduler, AnimationScheduler, NodeAnimations, SchedulerHandle, TimelineId, ValueId,
};
pub use timeline::{Callback, Phase, Timeline, Transition};
pub use track::{AnimatedValue, CustomTrack};
pub use values::Interpolate;

pub use glide_core::{Angle, Color, Vec2, Vec3};
