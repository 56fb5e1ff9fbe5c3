//! Animatable properties
//!
//! A [`PropertyHandle`] wraps a node's getter/setter pair. Writing through it
//! either applies the value at once or, while a timeline is being defined,
//! records a transition that the scheduler plays back frame by frame.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use glide_animation::{AnimationScheduler, EngineConfig, OwnerRef, PropertyHandle, Transition};
//!
//! let scheduler = AnimationScheduler::with_config(EngineConfig::deterministic());
//! let x = Rc::new(Cell::new(0.0_f32));
//!
//! let prop = {
//!     let (get, set) = (x.clone(), x.clone());
//!     PropertyHandle::new(
//!         scheduler.handle(),
//!         OwnerRef::detached(),
//!         move || get.get(),
//!         move |v| set.set(v),
//!     )
//! };
//!
//! // Outside a definition: applied immediately
//! prop.set(5.0);
//! assert_eq!(x.get(), 5.0);
//!
//! // Inside a definition: captured, then played back by tick()
//! let p = prop.clone();
//! scheduler.animate(&OwnerRef::detached(), Transition::new(1.0), move || p.set(10.0));
//! assert_eq!(x.get(), 5.0);
//!
//! scheduler.tick(1.0);
//! assert_eq!(x.get(), 10.0);
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::owner::OwnerRef;
use crate::scheduler::{SchedulerHandle, TimelineId, ValueId};
use crate::values::Interpolate;

type Getter<T> = Box<dyn Fn() -> T>;
type Setter<T> = Box<dyn Fn(T)>;
type Validity = Box<dyn Fn() -> bool>;

/// Shared state behind a property handle
pub(crate) struct PropertyCell<T> {
    getter: Getter<T>,
    setter: Setter<T>,
    validity: Option<Validity>,
    owner: OwnerRef,
    /// Record currently animating this property, if any
    pub(crate) active: Cell<Option<ValueId>>,
}

impl<T> PropertyCell<T> {
    pub(crate) fn get(&self) -> T {
        (self.getter)()
    }

    pub(crate) fn is_valid(&self) -> bool {
        self.owner.is_alive() && self.validity.as_ref().map_or(true, |valid| valid())
    }

    /// Playback write: silently skipped once the property is invalid
    pub(crate) fn apply(&self, value: T) {
        if self.is_valid() {
            (self.setter)(value);
        }
    }
}

/// Snapshot of the transition currently driving a property
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveTransition<T> {
    pub timeline: TimelineId,
    pub start: T,
    pub end: T,
    pub delay: f32,
    pub duration: f32,
}

/// Typed accessor for one logical property of one node
pub struct PropertyHandle<T: Interpolate> {
    cell: Rc<PropertyCell<T>>,
    scheduler: SchedulerHandle,
}

impl<T: Interpolate> Clone for PropertyHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cell: Rc::clone(&self.cell),
            scheduler: self.scheduler.clone(),
        }
    }
}

impl<T: Interpolate> PropertyHandle<T> {
    /// Create a handle that is valid for as long as its owner is alive
    pub fn new<G, S>(scheduler: SchedulerHandle, owner: OwnerRef, get: G, set: S) -> Self
    where
        G: Fn() -> T + 'static,
        S: Fn(T) + 'static,
    {
        Self::build(scheduler, owner, Box::new(get), Box::new(set), None)
    }

    /// Create a handle with an extra validity check
    ///
    /// Use this when the property's backing resource can disappear before
    /// its owner does (a texture, a text layout). While `valid` returns
    /// `false` playback writes are skipped; the timeline keeps running.
    pub fn with_validity<G, S, V>(
        scheduler: SchedulerHandle,
        owner: OwnerRef,
        get: G,
        set: S,
        valid: V,
    ) -> Self
    where
        G: Fn() -> T + 'static,
        S: Fn(T) + 'static,
        V: Fn() -> bool + 'static,
    {
        Self::build(
            scheduler,
            owner,
            Box::new(get),
            Box::new(set),
            Some(Box::new(valid)),
        )
    }

    fn build(
        scheduler: SchedulerHandle,
        owner: OwnerRef,
        getter: Getter<T>,
        setter: Setter<T>,
        validity: Option<Validity>,
    ) -> Self {
        Self {
            cell: Rc::new(PropertyCell {
                getter,
                setter,
                validity,
                owner,
                active: Cell::new(None),
            }),
            scheduler,
        }
    }

    /// Current live value
    pub fn get(&self) -> T {
        self.cell.get()
    }

    /// Write a value
    ///
    /// Inside a definition callback this becomes (or retargets) a
    /// transition on the timeline being defined; otherwise the setter runs
    /// immediately.
    pub fn set(&self, value: T) {
        if let Some(value) = self.scheduler.capture_write(&self.cell, value) {
            (self.cell.setter)(value);
        }
    }

    /// Write through to the setter, bypassing any definition in progress
    pub fn set_immediate(&self, value: T) {
        (self.cell.setter)(value);
    }

    pub fn is_valid(&self) -> bool {
        self.cell.is_valid()
    }

    /// Whether a timeline currently drives this property
    pub fn is_animating(&self) -> bool {
        self.cell.active.get().is_some()
    }

    /// Details of the transition driving this property
    pub fn active_transition(&self) -> Option<ActiveTransition<T>> {
        self.cell
            .active
            .get()
            .and_then(|id| self.scheduler.inspect_value::<T>(id))
    }

    pub fn owner(&self) -> &OwnerRef {
        &self.cell.owner
    }

    pub fn scheduler(&self) -> &SchedulerHandle {
        &self.scheduler
    }
}

/// Lazily created property slot for a node
///
/// Nodes create their handles on first access and drop them on teardown.
///
/// ```ignore
/// struct Panel {
///     opacity: LazyProperty<f32>,
///     // ...
/// }
///
/// impl Panel {
///     fn opacity(self: &Rc<Self>) -> PropertyHandle<f32> {
///         self.opacity.get_or_init(|| {
///             let (a, b) = (self.clone(), self.clone());
///             PropertyHandle::new(
///                 get_scheduler(),
///                 OwnerRef::new(self),
///                 move || a.alpha(),
///                 move |v| b.set_alpha(v),
///             )
///         })
///     }
/// }
/// ```
pub struct LazyProperty<T: Interpolate> {
    slot: RefCell<Option<PropertyHandle<T>>>,
}

impl<T: Interpolate> Default for LazyProperty<T> {
    fn default() -> Self {
        Self {
            slot: RefCell::new(None),
        }
    }
}

impl<T: Interpolate> LazyProperty<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the handle, creating it with `init` on first access
    pub fn get_or_init(&self, init: impl FnOnce() -> PropertyHandle<T>) -> PropertyHandle<T> {
        if let Some(handle) = self.slot.borrow().as_ref() {
            return handle.clone();
        }
        let handle = init();
        *self.slot.borrow_mut() = Some(handle.clone());
        handle
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.borrow().is_some()
    }

    /// Forget the handle (node teardown)
    pub fn reset(&self) {
        self.slot.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::owner::AnimationOwner;
    use crate::scheduler::AnimationScheduler;

    struct Node;

    impl AnimationOwner for Node {}

    fn float_property(
        scheduler: &AnimationScheduler,
        owner: OwnerRef,
    ) -> (PropertyHandle<f32>, Rc<Cell<f32>>) {
        let backing = Rc::new(Cell::new(1.0_f32));
        let (get, set) = (backing.clone(), backing.clone());
        let prop = PropertyHandle::new(
            scheduler.handle(),
            owner,
            move || get.get(),
            move |v| set.set(v),
        );
        (prop, backing)
    }

    #[test]
    fn test_set_outside_definition_applies() {
        let scheduler = AnimationScheduler::new();
        let (prop, backing) = float_property(&scheduler, OwnerRef::detached());

        prop.set(3.0);
        assert_eq!(backing.get(), 3.0);
        assert_eq!(prop.get(), 3.0);
        assert!(!prop.is_animating());
    }

    #[test]
    fn test_dead_scheduler_applies_directly() {
        let (prop, backing) = {
            let scheduler = AnimationScheduler::new();
            float_property(&scheduler, OwnerRef::detached())
        };
        prop.set(7.0);
        assert_eq!(backing.get(), 7.0);
    }

    #[test]
    fn test_validity_tracks_owner_and_predicate() {
        let scheduler = AnimationScheduler::new();
        let node = Rc::new(Node);
        let flag = Rc::new(Cell::new(true));
        let check = flag.clone();
        let prop = PropertyHandle::with_validity(
            scheduler.handle(),
            OwnerRef::new(&node),
            || 0.0_f32,
            |_| {},
            move || check.get(),
        );

        assert!(prop.is_valid());
        flag.set(false);
        assert!(!prop.is_valid());
        flag.set(true);
        drop(node);
        assert!(!prop.is_valid());
    }

    #[test]
    fn test_lazy_property_initializes_once() {
        let scheduler = AnimationScheduler::new();
        let lazy: LazyProperty<f32> = LazyProperty::new();
        let calls = Cell::new(0);

        for _ in 0..3 {
            lazy.get_or_init(|| {
                calls.set(calls.get() + 1);
                float_property(&scheduler, OwnerRef::detached()).0
            });
        }
        assert_eq!(calls.get(), 1);
        assert!(lazy.is_initialized());

        lazy.reset();
        assert!(!lazy.is_initialized());
    }
}
