//! Animated value records
//!
//! A record binds one property (or one custom callback) to one timeline for
//! the duration of a transition. Records live in the scheduler's arena, are
//! addressed by [`ValueId`], and go back to the [`ValuePool`] when detached.
//!
//! [`ValuePool`]: crate::pool::ValuePool

use std::any::{Any, TypeId};
use std::rc::{Rc, Weak};

use crate::property::PropertyCell;
use crate::scheduler::{TimelineId, ValueId};
use crate::values::Interpolate;

/// A deferred property write, run once the scheduler state is released
pub(crate) type PendingWrite = Box<dyn FnOnce()>;

/// Type-erased record stored in the scheduler arena
pub(crate) trait Track: Any {
    /// Timeline that owns this record
    fn timeline(&self) -> TimelineId;

    /// (delay, duration) captured at attachment
    fn timing(&self) -> (f32, f32);

    /// Build the write for eased progress `eased`
    ///
    /// Returns `None` when the target is gone.
    fn sample(&self, eased: f32) -> Option<PendingWrite>;

    /// Unlink from the property, if it still points at `id`
    fn unlink(&mut self, id: ValueId);

    /// Clear every field before parking in the pool
    fn reset(&mut self);

    fn kind(&self) -> TypeId;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

// ============================================================================
// Typed property records
// ============================================================================

/// Start/end/timing record for one property inside one timeline
///
/// `start` is captured once, when the property is first written inside the
/// timeline's definition; later writes in the same definition only move `end`.
pub struct AnimatedValue<T: Interpolate> {
    start: Option<T>,
    end: Option<T>,
    delay: f32,
    duration: f32,
    timeline: TimelineId,
    property: Weak<PropertyCell<T>>,
}

impl<T: Interpolate> Default for AnimatedValue<T> {
    fn default() -> Self {
        Self {
            start: None,
            end: None,
            delay: 0.0,
            duration: 0.0,
            timeline: TimelineId::default(),
            property: Weak::new(),
        }
    }
}

impl<T: Interpolate> AnimatedValue<T> {
    pub(crate) fn bind(
        &mut self,
        timeline: TimelineId,
        property: &Rc<PropertyCell<T>>,
        start: T,
        end: T,
        delay: f32,
        duration: f32,
    ) {
        self.timeline = timeline;
        self.property = Rc::downgrade(property);
        self.start = Some(start);
        self.end = Some(end);
        self.delay = delay.max(0.0);
        self.duration = duration.max(0.0);
    }

    pub(crate) fn set_end(&mut self, end: T) {
        self.end = Some(end);
    }

    pub fn start(&self) -> Option<&T> {
        self.start.as_ref()
    }

    pub fn end(&self) -> Option<&T> {
        self.end.as_ref()
    }

    pub fn delay(&self) -> f32 {
        self.delay
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn timeline(&self) -> TimelineId {
        self.timeline
    }
}

impl<T: Interpolate> Track for AnimatedValue<T> {
    fn timeline(&self) -> TimelineId {
        self.timeline
    }

    fn timing(&self) -> (f32, f32) {
        (self.delay, self.duration)
    }

    fn sample(&self, eased: f32) -> Option<PendingWrite> {
        let property = self.property.upgrade()?;
        let (start, end) = (self.start.as_ref()?, self.end.as_ref()?);
        // Land exactly on the target instead of start + (end - start) * 1
        let value = if eased == 1.0 {
            end.clone()
        } else {
            start.lerp(end, eased)
        };
        Some(Box::new(move || property.apply(value)))
    }

    fn unlink(&mut self, id: ValueId) {
        if let Some(property) = self.property.upgrade() {
            if property.active.get() == Some(id) {
                property.active.set(None);
            }
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn kind(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// ============================================================================
// Custom callback records
// ============================================================================

/// Per-frame callback receiving eased progress, registered through
/// `animate_custom`
#[derive(Default)]
pub struct CustomTrack {
    callback: Option<Rc<dyn Fn(f32)>>,
    delay: f32,
    duration: f32,
    timeline: TimelineId,
}

impl CustomTrack {
    pub(crate) fn bind(
        &mut self,
        timeline: TimelineId,
        callback: Rc<dyn Fn(f32)>,
        delay: f32,
        duration: f32,
    ) {
        self.timeline = timeline;
        self.callback = Some(callback);
        self.delay = delay.max(0.0);
        self.duration = duration.max(0.0);
    }
}

impl Track for CustomTrack {
    fn timeline(&self) -> TimelineId {
        self.timeline
    }

    fn timing(&self) -> (f32, f32) {
        (self.delay, self.duration)
    }

    fn sample(&self, eased: f32) -> Option<PendingWrite> {
        let callback = self.callback.clone()?;
        Some(Box::new(move || callback(eased)))
    }

    fn unlink(&mut self, _id: ValueId) {}

    fn reset(&mut self) {
        *self = Self::default();
    }

    fn kind(&self) -> TypeId {
        TypeId::of::<Self>()
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
