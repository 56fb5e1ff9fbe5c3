//! Timelines
//!
//! A timeline is one implicit animation: the property writes captured while
//! its definition callback ran, plus timing, easing, an owner, an optional
//! completion callback and an optional chained successor.
//!
//! ```text
//! Pending ──start──▶ Defining ──┬─(delay + duration <= 0)──▶ Completed
//!                               └──▶ Running ──┬──▶ Completed
//!                                              └──▶ Cancelled
//! ```
//!
//! `Pending` is the state of a chained successor waiting for its
//! predecessor. Finished timelines are discarded by the scheduler; their
//! [`Timeline`] handles keep reporting the final phase.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::easing::EasingRule;
use crate::error::{EngineError, Result};
use crate::owner::OwnerRef;
use crate::scheduler::{SchedulerHandle, TimelineId, ValueId};

/// Boxed one-shot callback (definition or completion)
pub type Callback = Box<dyn FnOnce()>;

/// Lifecycle phase of a timeline
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Created as a chained successor, waiting for its predecessor
    Pending,
    /// Definition callback is executing
    Defining,
    /// Registered with the scheduler and advancing every frame
    Running,
    Completed,
    Cancelled,
}

impl Phase {
    pub fn is_finished(self) -> bool {
        matches!(self, Phase::Completed | Phase::Cancelled)
    }
}

// ============================================================================
// Transition options
// ============================================================================

/// Timing and easing for a new timeline
///
/// ```
/// use glide_animation::{Easing, Transition};
///
/// let t = Transition::new(0.3).delay(0.1).easing(Easing::EaseOutBack);
/// assert_eq!(t.total(), 0.4);
/// ```
#[derive(Default)]
pub struct Transition {
    pub(crate) duration: f32,
    pub(crate) delay: f32,
    pub(crate) easing: EasingRule,
    pub(crate) on_complete: Option<Callback>,
}

impl Transition {
    /// A transition lasting `duration` seconds
    pub fn new(duration: f32) -> Self {
        Self {
            duration: duration.max(0.0),
            ..Self::default()
        }
    }

    /// A zero-length transition: writes land and callbacks fire at once
    pub fn instant() -> Self {
        Self::default()
    }

    /// Seconds to wait before values start moving
    pub fn delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Named easing function or custom curve
    pub fn easing(mut self, easing: impl Into<EasingRule>) -> Self {
        self.easing = easing.into();
        self
    }

    /// Run `callback` once the timeline completes (not on cancel)
    pub fn on_complete(mut self, callback: impl FnOnce() + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    pub fn total(&self) -> f32 {
        self.delay + self.duration
    }
}

impl fmt::Debug for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transition")
            .field("duration", &self.duration)
            .field("delay", &self.delay)
            .field("easing", &self.easing)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

// ============================================================================
// Scheduler-side state
// ============================================================================

/// Timeline record owned by the scheduler
pub(crate) struct TimelineState {
    pub(crate) status: Rc<Cell<Phase>>,
    pub(crate) owner: OwnerRef,
    /// Working values handed to records attached from now on
    pub(crate) duration: f32,
    pub(crate) delay: f32,
    /// High-water marks; the timeline ends at `max_delay + max_duration`
    pub(crate) max_duration: f32,
    pub(crate) max_delay: f32,
    pub(crate) easing: EasingRule,
    pub(crate) values: SmallVec<[ValueId; 8]>,
    pub(crate) definition: Option<Callback>,
    pub(crate) on_complete: Option<Callback>,
    pub(crate) chained: Option<TimelineId>,
    pub(crate) elapsed: f32,
}

impl TimelineState {
    pub(crate) fn new(
        owner: OwnerRef,
        transition: Transition,
        definition: Option<Callback>,
    ) -> Self {
        Self {
            status: Rc::new(Cell::new(Phase::Pending)),
            owner,
            duration: transition.duration,
            delay: transition.delay,
            max_duration: transition.duration,
            max_delay: transition.delay,
            easing: transition.easing,
            values: SmallVec::new(),
            definition,
            on_complete: transition.on_complete,
            chained: None,
            elapsed: 0.0,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.status.get()
    }

    pub(crate) fn set_phase(&self, phase: Phase) {
        self.status.set(phase);
    }

    pub(crate) fn total(&self) -> f32 {
        self.max_delay + self.max_duration
    }

    pub(crate) fn add_delay(&mut self, extra: f32) {
        self.delay = (self.delay + extra).max(0.0);
        self.max_delay = self.max_delay.max(self.delay);
    }

    pub(crate) fn add_duration(&mut self, extra: f32) {
        self.duration = (self.duration + extra).max(0.0);
        self.max_duration = self.max_duration.max(self.duration);
    }

    /// Take both callbacks so they can be run or dropped outside the
    /// scheduler borrow
    pub(crate) fn take_callbacks(&mut self) -> [Option<Callback>; 2] {
        [self.definition.take(), self.on_complete.take()]
    }
}

// ============================================================================
// Public handle
// ============================================================================

/// Handle to a timeline
///
/// Cheap to clone. Every operation goes through the scheduler; once the
/// scheduler is gone they are no-ops and the phase stays where it was.
#[derive(Clone)]
pub struct Timeline {
    scheduler: SchedulerHandle,
    id: TimelineId,
    status: Rc<Cell<Phase>>,
    owner: OwnerRef,
}

impl Timeline {
    pub(crate) fn from_parts(
        scheduler: SchedulerHandle,
        id: TimelineId,
        status: Rc<Cell<Phase>>,
        owner: OwnerRef,
    ) -> Self {
        Self {
            scheduler,
            id,
            status,
            owner,
        }
    }

    pub fn id(&self) -> TimelineId {
        self.id
    }

    /// Node this timeline animates; successors inherit it
    pub fn owner(&self) -> &OwnerRef {
        &self.owner
    }

    pub fn phase(&self) -> Phase {
        self.status.get()
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == Phase::Completed
    }

    pub fn is_cancelled(&self) -> bool {
        self.phase() == Phase::Cancelled
    }

    pub fn is_finished(&self) -> bool {
        self.phase().is_finished()
    }

    /// Scaled seconds since the timeline started
    ///
    /// `None` once the timeline has been discarded.
    pub fn elapsed(&self) -> Option<f32> {
        self.scheduler.with_timeline(self.id, |t| t.elapsed)
    }

    /// Overall progress in 0..1
    pub fn progress(&self) -> f32 {
        match self.phase() {
            Phase::Completed => 1.0,
            Phase::Pending | Phase::Cancelled => 0.0,
            Phase::Defining | Phase::Running => self
                .scheduler
                .with_timeline(self.id, |t| {
                    let total = t.total();
                    if total <= 0.0 {
                        1.0
                    } else {
                        (t.elapsed / total).clamp(0.0, 1.0)
                    }
                })
                .unwrap_or(0.0),
        }
    }

    /// Number of values this timeline currently drives
    pub fn value_count(&self) -> usize {
        self.scheduler
            .with_timeline(self.id, |t| t.values.len())
            .unwrap_or(0)
    }

    /// Push back the start of values written after this call
    ///
    /// Only meaningful inside the definition callback; values written
    /// earlier keep their delay.
    pub fn add_delay(&self, extra: f32) {
        if let Err(err) = self.try_add_delay(extra) {
            tracing::warn!("Timeline {:?}: add_delay ignored: {}", self.id, err);
        }
    }

    pub fn try_add_delay(&self, extra: f32) -> Result<()> {
        self.adjust(|t| t.add_delay(extra))
    }

    /// Lengthen values written after this call
    pub fn add_duration(&self, extra: f32) {
        if let Err(err) = self.try_add_duration(extra) {
            tracing::warn!("Timeline {:?}: add_duration ignored: {}", self.id, err);
        }
    }

    pub fn try_add_duration(&self, extra: f32) -> Result<()> {
        self.adjust(|t| t.add_duration(extra))
    }

    fn adjust(&self, f: impl FnOnce(&mut TimelineState)) -> Result<()> {
        if self.phase() != Phase::Defining {
            return Err(EngineError::NotDefining);
        }
        self.scheduler
            .with_timeline(self.id, f)
            .ok_or(EngineError::SchedulerDropped)
    }

    /// Attach (or replace) the completion callback
    ///
    /// Runs at once if the timeline already completed; dropped if it was
    /// cancelled.
    pub fn on_complete(&self, callback: impl FnOnce() + 'static) {
        match self.phase() {
            Phase::Completed => callback(),
            Phase::Cancelled => {}
            _ => {
                let callback: Callback = Box::new(callback);
                // The replaced callback is dropped after the scheduler borrow ends
                let previous = self
                    .scheduler
                    .with_timeline(self.id, move |t| t.on_complete.replace(callback))
                    .flatten();
                drop(previous);
            }
        }
    }

    // =========================================================================
    // Chaining
    // =========================================================================

    /// Run `callback` right after this timeline completes
    pub fn then(&self, callback: impl FnOnce() + 'static) -> Timeline {
        self.then_animate_inner(Transition::instant().on_complete(callback), None)
    }

    /// Run `callback` `delay` seconds after this timeline completes
    pub fn then_after(&self, delay: f32, callback: impl FnOnce() + 'static) -> Timeline {
        let transition = Transition::instant().delay(delay).on_complete(callback);
        self.then_animate_inner(transition, None)
    }

    /// Wait `delay` seconds after this timeline; chain onto the result
    pub fn then_delay(&self, delay: f32) -> Timeline {
        self.then_animate_inner(Transition::instant().delay(delay), None)
    }

    /// Start another implicit animation once this one completes
    ///
    /// The successor inherits this timeline's owner. Its definition callback
    /// runs when it starts, so it captures the property values at that
    /// moment.
    ///
    /// Chaining a second successor is a usage error: it asserts in debug
    /// builds; in release the previous successor is discarded and replaced.
    pub fn then_animate(
        &self,
        transition: Transition,
        definition: impl FnOnce() + 'static,
    ) -> Timeline {
        self.then_animate_inner(transition, Some(Box::new(definition)))
    }

    /// Like [`then_animate`](Self::then_animate) but reports an occupied
    /// chain instead of replacing it
    pub fn try_then_animate(
        &self,
        transition: Transition,
        definition: impl FnOnce() + 'static,
    ) -> Result<Timeline> {
        if self.scheduler.chained_of(self.id).is_some() {
            return Err(EngineError::ChainOccupied);
        }
        if !self.scheduler.is_alive() {
            return Err(EngineError::SchedulerDropped);
        }
        Ok(self.then_animate_inner(transition, Some(Box::new(definition))))
    }

    fn then_animate_inner(&self, transition: Transition, definition: Option<Callback>) -> Timeline {
        self.scheduler.chain(self, transition, definition)
    }

    // =========================================================================
    // Control
    // =========================================================================

    /// Stop without completing
    ///
    /// Values stay where they are, the completion callback does not run and
    /// any chained successors are discarded.
    pub fn cancel(&self) {
        self.scheduler.cancel_timeline(self.id);
    }

    /// Jump every value to its end, then complete normally
    pub fn complete_immediate(&self) {
        self.scheduler.complete_timeline_immediate(self.id);
    }
}

impl fmt::Debug for Timeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Timeline")
            .field("id", &self.id)
            .field("phase", &self.phase())
            .finish()
    }
}

impl PartialEq for Timeline {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.status, &other.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::easing::Easing;

    #[test]
    fn test_transition_builder() {
        let t = Transition::new(0.5)
            .delay(0.25)
            .easing(Easing::Linear)
            .on_complete(|| {});
        assert_eq!(t.total(), 0.75);
        assert_eq!(t.easing, EasingRule::Function(Easing::Linear));
        assert!(t.on_complete.is_some());

        let negative = Transition::new(-1.0).delay(-2.0);
        assert_eq!(negative.total(), 0.0);
    }

    #[test]
    fn test_high_water_marks() {
        let transition = Transition::new(1.0).delay(0.5);
        let mut state = TimelineState::new(OwnerRef::detached(), transition, None);
        state.add_delay(0.5);
        state.add_duration(1.0);
        assert_eq!(state.delay, 1.0);
        assert_eq!(state.duration, 2.0);

        state.add_delay(-1.0);
        state.add_duration(-1.5);
        assert_eq!(state.delay, 0.0);
        assert_eq!(state.duration, 0.5);
        assert_eq!(state.max_delay, 1.0);
        assert_eq!(state.max_duration, 2.0);
        assert_eq!(state.total(), 3.0);
    }

    #[test]
    fn test_phase_finished() {
        assert!(Phase::Completed.is_finished());
        assert!(Phase::Cancelled.is_finished());
        assert!(!Phase::Running.is_finished());
        assert!(!Phase::Pending.is_finished());
    }
}
