//! Animation owners
//!
//! Every timeline belongs to an owner: the node whose properties it drives.
//! The engine never keeps an owner alive. It holds a weak reference and asks
//! the owner, every frame, whether it is still alive and how fast its clock
//! runs.

use std::fmt;
use std::rc::{Rc, Weak};

/// Host-side capability exposed by an animatable node
pub trait AnimationOwner {
    /// Clock multiplier applied to every frame delta (0 pauses)
    fn time_scale(&self) -> f32 {
        1.0
    }

    /// Whether the node can still be animated
    ///
    /// A node may be torn down while some `Rc` still points at it; returning
    /// `false` here makes the scheduler drop its timelines without
    /// advancing them or firing callbacks.
    fn is_alive(&self) -> bool {
        true
    }
}

/// Weak reference to an [`AnimationOwner`]
///
/// `OwnerRef::detached()` is an owner-less reference: always alive, time
/// scale 1. It is used for global animations and deferred callbacks that
/// don't belong to a node.
#[derive(Clone, Default)]
pub struct OwnerRef {
    inner: Option<Weak<dyn AnimationOwner>>,
}

impl OwnerRef {
    /// Reference a node without taking ownership
    pub fn new<N: AnimationOwner + 'static>(node: &Rc<N>) -> Self {
        let rc: Rc<dyn AnimationOwner> = node.clone();
        Self {
            inner: Some(Rc::downgrade(&rc)),
        }
    }

    /// An owner-less reference
    pub fn detached() -> Self {
        Self { inner: None }
    }

    pub fn is_detached(&self) -> bool {
        self.inner.is_none()
    }

    /// Liveness check used by the scheduler
    pub fn is_alive(&self) -> bool {
        match &self.inner {
            None => true,
            Some(weak) => weak.upgrade().is_some_and(|owner| owner.is_alive()),
        }
    }

    /// Current time scale, read fresh on every call
    ///
    /// A dead owner reports 0 so nothing advances on its behalf.
    pub fn time_scale(&self) -> f32 {
        match &self.inner {
            None => 1.0,
            Some(weak) => weak.upgrade().map_or(0.0, |owner| owner.time_scale()),
        }
    }

    /// Identity comparison
    pub fn same_owner(&self, other: &OwnerRef) -> bool {
        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some(a), Some(b)) => a.as_ptr() as *const () == b.as_ptr() as *const (),
            _ => false,
        }
    }
}

impl<N: AnimationOwner + 'static> From<&Rc<N>> for OwnerRef {
    fn from(node: &Rc<N>) -> Self {
        OwnerRef::new(node)
    }
}

impl fmt::Debug for OwnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            None => write!(f, "OwnerRef(detached)"),
            Some(weak) => write!(f, "OwnerRef({:p})", weak.as_ptr() as *const ()),
        }
    }
}
