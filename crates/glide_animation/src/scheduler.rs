//! Animation scheduler
//!
//! Owns every timeline and animated value record, and advances running
//! timelines once per frame. Timelines are created implicitly through
//! [`AnimationScheduler::animate`]: property writes made inside the definition
//! callback become transitions instead of immediate assignments.
//!
//! The engine is single-threaded. State lives behind an `Rc<RefCell<..>>`
//! and is never borrowed while host code runs (getters, setters, definition
//! and completion callbacks), so every callback may re-enter the scheduler.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use slotmap::{new_key_type, SlotMap};

use crate::config::EngineConfig;
use crate::definition::DefinitionContext;
use crate::owner::{AnimationOwner, OwnerRef};
use crate::pool::ValuePool;
use crate::property::{ActiveTransition, PropertyCell};
use crate::timeline::{Callback, Phase, Timeline, TimelineState, Transition};
use crate::track::{AnimatedValue, CustomTrack, Track};
use crate::values::Interpolate;

// ============================================================================
// Thread Scheduler State
// ============================================================================

thread_local! {
    /// Scheduler handle installed for the current (UI) thread
    static THREAD_SCHEDULER: RefCell<Option<SchedulerHandle>> = const { RefCell::new(None) };
}

/// Install the animation scheduler for the current thread
///
/// Call once at startup after creating the [`AnimationScheduler`]. Installing
/// again replaces the previous handle.
pub fn set_thread_scheduler(handle: SchedulerHandle) {
    THREAD_SCHEDULER.with(|slot| {
        if slot.borrow_mut().replace(handle).is_some() {
            tracing::debug!("set_thread_scheduler: replacing installed scheduler");
        }
    });
}

/// Get the scheduler installed for the current thread
///
/// # Panics
///
/// Panics if `set_thread_scheduler()` has not been called on this thread.
///
/// # Example
///
/// ```ignore
/// use glide_animation::{get_scheduler, OwnerRef, Transition};
///
/// get_scheduler().animate(&OwnerRef::new(&node), Transition::new(0.2), move || {
///     node.opacity().set(0.0);
/// });
/// ```
pub fn get_scheduler() -> SchedulerHandle {
    try_get_scheduler()
        .expect("Animation scheduler not installed. Call set_thread_scheduler() at app startup.")
}

/// Try to get the thread's scheduler (returns None if not installed)
pub fn try_get_scheduler() -> Option<SchedulerHandle> {
    THREAD_SCHEDULER.with(|slot| slot.borrow().clone())
}

/// Check if a live scheduler is installed on this thread
pub fn is_scheduler_initialized() -> bool {
    try_get_scheduler().is_some_and(|handle| handle.is_alive())
}

/// Remove the thread's scheduler handle
pub fn clear_thread_scheduler() {
    THREAD_SCHEDULER.with(|slot| slot.borrow_mut().take());
}

new_key_type! {
    /// Handle to a timeline in the scheduler arena
    pub struct TimelineId;
    /// Handle to an animated value record
    pub struct ValueId;
}

// ============================================================================
// Scheduler state
// ============================================================================

type Shared = Rc<RefCell<SchedulerState>>;

struct SchedulerState {
    config: EngineConfig,
    timelines: SlotMap<TimelineId, TimelineState>,
    values: SlotMap<ValueId, Box<dyn Track>>,
    pool: ValuePool,
    /// Timelines advanced by `tick`; may hold finished entries mid-tick
    running: Vec<TimelineId>,
    definition: DefinitionContext,
    ticking: bool,
    first_tick_pending: bool,
    frame: u64,
}

impl SchedulerState {
    fn new(config: EngineConfig) -> Self {
        Self {
            pool: ValuePool::new(config.pool_capacity),
            config,
            timelines: SlotMap::with_key(),
            values: SlotMap::with_key(),
            running: Vec::new(),
            definition: DefinitionContext::new(),
            ticking: false,
            first_tick_pending: true,
            frame: 0,
        }
    }

    /// Remove a record from the arena, unlink its property and pool it
    fn release_value(&mut self, id: ValueId) {
        if let Some(mut track) = self.values.remove(id) {
            track.unlink(id);
            self.pool.release(track);
        }
    }

    fn prune_running(&mut self) {
        let timelines = &self.timelines;
        self.running.retain(|id| {
            timelines
                .get(*id)
                .is_some_and(|t| t.phase() == Phase::Running)
        });
    }

    /// Running timelines, skipping entries finished earlier in this tick
    fn running_len(&self) -> usize {
        self.running
            .iter()
            .filter(|id| {
                self.timelines
                    .get(**id)
                    .is_some_and(|t| t.phase() == Phase::Running)
            })
            .count()
    }

    fn running_for(&self, owner: &OwnerRef) -> Vec<TimelineId> {
        self.running
            .iter()
            .copied()
            .filter(|id| {
                self.timelines.get(*id).is_some_and(|t| {
                    t.phase() == Phase::Running && t.owner.same_owner(owner)
                })
            })
            .collect()
    }
}

fn handle_of(shared: &Shared) -> SchedulerHandle {
    SchedulerHandle {
        inner: Rc::downgrade(shared),
    }
}

// ============================================================================
// Timeline lifecycle
// ============================================================================

fn create(
    shared: &Shared,
    owner: OwnerRef,
    transition: Transition,
    definition: Option<Callback>,
) -> Timeline {
    let state = TimelineState::new(owner.clone(), transition, definition);
    let status = Rc::clone(&state.status);
    let id = shared.borrow_mut().timelines.insert(state);
    Timeline::from_parts(handle_of(shared), id, status, owner)
}

/// Start a timeline and track it if it did not finish synchronously
fn register(shared: &Shared, id: TimelineId) {
    if start(shared, id) {
        shared.borrow_mut().running.push(id);
    }
}

/// Run the definition callback; returns true if the timeline is now running
fn start(shared: &Shared, id: TimelineId) -> bool {
    let definition = {
        let mut guard = shared.borrow_mut();
        let state = &mut *guard;
        let Some(timeline) = state.timelines.get_mut(id) else {
            return false;
        };
        if timeline.phase() != Phase::Pending {
            return false;
        }
        timeline.set_phase(Phase::Defining);
        timeline.elapsed = 0.0;
        state.definition.push(id);
        timeline.definition.take()
    };

    {
        let _scope = DefinitionScope { shared, id };
        if let Some(definition) = definition {
            definition();
        }
    }

    // The callback may have cancelled or completed its own timeline
    let instant = {
        let state = shared.borrow();
        match state.timelines.get(id) {
            Some(timeline) if timeline.phase() == Phase::Defining => timeline.total() <= 0.0,
            _ => return false,
        }
    };

    if instant {
        tracing::debug!("Timeline {:?}: instant", id);
        finish_now(shared, id);
        return false;
    }

    let state = shared.borrow();
    let Some(timeline) = state.timelines.get(id) else {
        return false;
    };
    timeline.set_phase(Phase::Running);
    tracing::debug!(
        "Timeline {:?}: running {} values over {:.3}s",
        id,
        timeline.values.len(),
        timeline.total()
    );
    true
}

/// Advance one running timeline by `dt` unscaled seconds
fn advance(shared: &Shared, id: TimelineId, dt: f32) {
    let owner = match shared.borrow().timelines.get(id) {
        Some(timeline) => timeline.owner.clone(),
        None => return,
    };
    let scale = owner.time_scale().max(0.0);

    let (writes, done) = {
        let mut guard = shared.borrow_mut();
        let state = &mut *guard;
        let Some(timeline) = state.timelines.get_mut(id) else {
            return;
        };
        if timeline.phase() != Phase::Running {
            return;
        }
        timeline.elapsed += scale * dt;
        let elapsed = timeline.elapsed;
        let done = elapsed >= timeline.total();

        let mut writes = Vec::with_capacity(timeline.values.len());
        for value_id in &timeline.values {
            let Some(track) = state.values.get(*value_id) else {
                continue;
            };
            let (delay, duration) = track.timing();
            if elapsed <= delay && !done {
                continue;
            }
            let t = if duration <= 0.0 {
                1.0
            } else {
                ((elapsed - delay) / duration).clamp(0.0, 1.0)
            };
            if let Some(write) = track.sample(timeline.easing.apply(t)) {
                writes.push(write);
            }
        }
        tracing::trace!(
            "Timeline {:?}: elapsed {:.4}, {} writes",
            id,
            elapsed,
            writes.len()
        );
        (writes, done)
    };

    for write in writes {
        write();
    }
    if done {
        complete(shared, id);
    }
}

/// Detach every value, run the completion callback, start the successor
fn complete(shared: &Shared, id: TimelineId) {
    let (definition, on_complete, chained) = {
        let mut guard = shared.borrow_mut();
        let state = &mut *guard;
        let Some(mut timeline) = state.timelines.remove(id) else {
            return;
        };
        timeline.set_phase(Phase::Completed);
        for value in timeline.values.drain(..) {
            state.release_value(value);
        }
        if !state.ticking {
            state.running.retain(|running| *running != id);
        }
        let [definition, on_complete] = timeline.take_callbacks();
        (definition, on_complete, timeline.chained.take())
    };
    drop(definition);

    tracing::debug!("Timeline {:?}: completed", id);
    if let Some(on_complete) = on_complete {
        on_complete();
    }
    if let Some(next) = chained {
        tracing::debug!("Timeline {:?}: starting chained {:?}", id, next);
        register(shared, next);
    }
}

/// Stop without completing; discards the pending chain
fn cancel(shared: &Shared, id: TimelineId) {
    let mut discarded: Vec<Callback> = Vec::new();
    {
        let mut guard = shared.borrow_mut();
        let state = &mut *guard;
        let mut next = Some(id);
        while let Some(current) = next {
            let Some(mut timeline) = state.timelines.remove(current) else {
                break;
            };
            timeline.set_phase(Phase::Cancelled);
            for value in timeline.values.drain(..) {
                state.release_value(value);
            }
            discarded.extend(timeline.take_callbacks().into_iter().flatten());
            next = timeline.chained.take();
            tracing::debug!("Timeline {:?}: cancelled", current);
        }
        if !state.ticking {
            state.prune_running();
        }
    }
    // Callbacks may own nodes whose teardown re-enters the scheduler
    drop(discarded);
}

/// Jump every value to its end, then complete
fn finish_now(shared: &Shared, id: TimelineId) {
    let phase = shared.borrow().timelines.get(id).map(|t| t.phase());
    match phase {
        None => return,
        Some(phase) if phase.is_finished() => return,
        Some(Phase::Pending) => {
            if !start(shared, id) {
                return;
            }
        }
        Some(_) => {}
    }

    let writes: Vec<_> = {
        let state = shared.borrow();
        let Some(timeline) = state.timelines.get(id) else {
            return;
        };
        timeline
            .values
            .iter()
            .filter_map(|value| state.values.get(*value))
            .filter_map(|track| track.sample(1.0))
            .collect()
    };
    for write in writes {
        write();
    }
    complete(shared, id);
}

fn chain(
    shared: &Shared,
    predecessor: &Timeline,
    transition: Transition,
    definition: Option<Callback>,
) -> Timeline {
    let successor = create(shared, predecessor.owner().clone(), transition, definition);

    match predecessor.phase() {
        Phase::Completed => register(shared, successor.id()),
        Phase::Cancelled => cancel(shared, successor.id()),
        _ => {
            let slot = shared
                .borrow_mut()
                .timelines
                .get_mut(predecessor.id())
                .map(|t| t.chained.replace(successor.id()));
            match slot {
                // Predecessor discarded by `clear`
                None => cancel(shared, successor.id()),
                Some(None) => {}
                Some(Some(displaced)) => {
                    tracing::error!(
                        "Timeline {:?} already has a chained successor; replacing {:?}",
                        predecessor.id(),
                        displaced
                    );
                    cancel(shared, displaced);
                    if cfg!(debug_assertions) {
                        panic!("a timeline can have at most one chained successor");
                    }
                }
            }
        }
    }
    successor
}

fn tick(shared: &Shared, dt: f32) -> bool {
    {
        let mut state = shared.borrow_mut();
        if state.ticking {
            tracing::warn!("AnimationScheduler: re-entrant tick ignored");
            return true;
        }
        state.frame += 1;
        if state.first_tick_pending {
            state.first_tick_pending = false;
            if state.config.skip_first_tick {
                tracing::trace!("AnimationScheduler: skipping first tick");
                return !state.running.is_empty();
            }
        }
        state.ticking = true;
    }

    let guard = TickGuard { shared };
    // Callbacks may register timelines mid-pass; those start advancing on
    // the next tick
    let count = shared.borrow().running.len();
    for index in 0..count {
        let Some(id) = shared.borrow().running.get(index).copied() else {
            break;
        };

        let owner = match shared.borrow().timelines.get(id) {
            Some(timeline) if timeline.phase() == Phase::Running => timeline.owner.clone(),
            _ => continue,
        };
        if owner.is_alive() {
            advance(shared, id, dt);
        } else {
            tracing::debug!("Timeline {:?}: owner gone, dropping", id);
            cancel(shared, id);
        }
    }
    drop(guard);

    !shared.borrow().running.is_empty()
}

fn without_animating<R>(shared: &Shared, f: impl FnOnce() -> R) -> R {
    shared.borrow_mut().definition.begin_suppression();
    let _scope = SuppressionScope { shared };
    f()
}

fn animate_custom(shared: &Shared, callback: &Rc<dyn Fn(f32)>) -> bool {
    let mut guard = shared.borrow_mut();
    let state = &mut *guard;
    let Some(timeline_id) = state.definition.current() else {
        return false;
    };
    let Some(timeline) = state.timelines.get_mut(timeline_id) else {
        return false;
    };
    let mut record: Box<CustomTrack> = state.pool.acquire();
    record.bind(
        timeline_id,
        Rc::clone(callback),
        timeline.delay,
        timeline.duration,
    );
    let value_id = state.values.insert(record);
    timeline.values.push(value_id);
    true
}

fn defining(shared: &Shared) -> Option<Timeline> {
    let state = shared.borrow();
    let id = state.definition.top()?;
    let timeline = state.timelines.get(id)?;
    Some(Timeline::from_parts(
        handle_of(shared),
        id,
        Rc::clone(&timeline.status),
        timeline.owner.clone(),
    ))
}

fn cancel_all_for(shared: &Shared, owner: &OwnerRef) {
    let ids = shared.borrow().running_for(owner);
    for id in ids {
        cancel(shared, id);
    }
}

fn complete_all_for(shared: &Shared, owner: &OwnerRef) {
    let ids = shared.borrow().running_for(owner);
    for id in ids {
        finish_now(shared, id);
    }
}

fn clear(shared: &Shared) {
    let ids: Vec<TimelineId> = shared.borrow().timelines.keys().collect();
    for id in ids {
        cancel(shared, id);
    }
    let mut state = shared.borrow_mut();
    state.running.clear();
    state.pool.clear();
}

// ============================================================================
// Scope guards
// ============================================================================

/// Pops a timeline off the definition stack, even if its callback panics
struct DefinitionScope<'a> {
    shared: &'a Shared,
    id: TimelineId,
}

impl Drop for DefinitionScope<'_> {
    fn drop(&mut self) {
        let Ok(mut state) = self.shared.try_borrow_mut() else {
            return;
        };
        if let Err(err) = state.definition.pop_expected(self.id) {
            drop(state);
            tracing::error!("Timeline {:?}: {}", self.id, err);
            if cfg!(debug_assertions) && !std::thread::panicking() {
                panic!("definition stack out of balance: {}", err);
            }
        }
    }
}

struct SuppressionScope<'a> {
    shared: &'a Shared,
}

impl Drop for SuppressionScope<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.try_borrow_mut() {
            if let Err(err) = state.definition.end_suppression() {
                tracing::error!("without_animating: {}", err);
            }
        }
    }
}

/// Clears the ticking flag and drops finished entries from the running list
struct TickGuard<'a> {
    shared: &'a Shared,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.shared.try_borrow_mut() {
            state.ticking = false;
            state.prune_running();
        }
    }
}

// ============================================================================
// AnimationScheduler
// ============================================================================

/// The animation scheduler that ticks all active timelines
///
/// The host calls [`tick`](Self::tick) once per frame with the frame delta.
/// Components reach the scheduler through a [`SchedulerHandle`], which does
/// not keep it alive.
pub struct AnimationScheduler {
    inner: Shared,
}

impl AnimationScheduler {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        tracing::debug!(
            "AnimationScheduler: created (skip_first_tick={}, pool_capacity={})",
            config.skip_first_tick,
            config.pool_capacity
        );
        Self {
            inner: Rc::new(RefCell::new(SchedulerState::new(config))),
        }
    }

    /// Get a weak handle for registering animations
    pub fn handle(&self) -> SchedulerHandle {
        handle_of(&self.inner)
    }

    pub fn config(&self) -> EngineConfig {
        self.inner.borrow().config.clone()
    }

    /// Advance all running timelines by `dt` seconds
    ///
    /// Returns true if any timeline is still running.
    pub fn tick(&self, dt: f32) -> bool {
        tick(&self.inner, dt)
    }

    /// Start an implicit animation
    ///
    /// `definition` runs immediately. Property writes made inside it become
    /// transitions from the value each property had before the call to the
    /// last value written.
    pub fn animate(
        &self,
        owner: &OwnerRef,
        transition: Transition,
        definition: impl FnOnce() + 'static,
    ) -> Timeline {
        let timeline = create(&self.inner, owner.clone(), transition, Some(Box::new(definition)));
        register(&self.inner, timeline.id());
        timeline
    }

    /// Run `callback` after `delay` seconds of the owner's clock
    pub fn after(
        &self,
        owner: &OwnerRef,
        delay: f32,
        callback: impl FnOnce() + 'static,
    ) -> Timeline {
        let transition = Transition::instant().delay(delay).on_complete(callback);
        let timeline = create(&self.inner, owner.clone(), transition, None);
        register(&self.inner, timeline.id());
        timeline
    }

    /// Drive `callback` with eased progress every frame of the timeline being
    /// defined; outside a definition it is called once with 1.0
    pub fn animate_custom(&self, callback: impl Fn(f32) + 'static) {
        let callback: Rc<dyn Fn(f32)> = Rc::new(callback);
        if !animate_custom(&self.inner, &callback) {
            callback(1.0);
        }
    }

    /// Run `f` with property writes applied immediately
    pub fn without_animating<R>(&self, f: impl FnOnce() -> R) -> R {
        without_animating(&self.inner, f)
    }

    /// Timeline whose definition callback is currently running
    pub fn defining(&self) -> Option<Timeline> {
        defining(&self.inner)
    }

    /// Cancel every running timeline of `owner`
    pub fn cancel_all_for(&self, owner: &OwnerRef) {
        cancel_all_for(&self.inner, owner);
    }

    /// Jump every running timeline of `owner` to its end
    pub fn complete_all_for(&self, owner: &OwnerRef) {
        complete_all_for(&self.inner, owner);
    }

    /// Check if any running timeline belongs to `owner`
    pub fn is_animating(&self, owner: &OwnerRef) -> bool {
        !self.inner.borrow().running_for(owner).is_empty()
    }

    pub fn has_active_animations(&self) -> bool {
        self.running_count() > 0
    }

    pub fn running_count(&self) -> usize {
        self.inner.borrow().running_len()
    }

    /// Timelines held by the scheduler, including pending successors
    pub fn timeline_count(&self) -> usize {
        self.inner.borrow().timelines.len()
    }

    /// Value records currently attached to timelines
    pub fn value_count(&self) -> usize {
        self.inner.borrow().values.len()
    }

    /// Parked records for properties of type `T`
    pub fn pooled_count<T: Interpolate>(&self) -> usize {
        self.inner.borrow().pool.len_of::<AnimatedValue<T>>()
    }

    /// Frames ticked so far, including a skipped first tick
    pub fn frame_count(&self) -> u64 {
        self.inner.borrow().frame
    }

    /// Cancel everything silently (teardown)
    pub fn clear(&self) {
        clear(&self.inner);
    }
}

impl Default for AnimationScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        // Unlink properties so they stop reporting stale transitions
        clear(&self.inner);
    }
}

// ============================================================================
// SchedulerHandle
// ============================================================================

/// A weak handle to the animation scheduler
///
/// This is passed to property handles and timelines. It won't prevent the
/// scheduler from being dropped; once it is, operations return `None` and
/// property writes apply immediately.
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<RefCell<SchedulerState>>,
}

impl SchedulerHandle {
    /// Start an implicit animation
    pub fn animate(
        &self,
        owner: &OwnerRef,
        transition: Transition,
        definition: impl FnOnce() + 'static,
    ) -> Option<Timeline> {
        self.inner.upgrade().map(|shared| {
            let timeline = create(&shared, owner.clone(), transition, Some(Box::new(definition)));
            register(&shared, timeline.id());
            timeline
        })
    }

    /// Run `callback` after `delay` seconds of the owner's clock
    pub fn after(
        &self,
        owner: &OwnerRef,
        delay: f32,
        callback: impl FnOnce() + 'static,
    ) -> Option<Timeline> {
        self.inner.upgrade().map(|shared| {
            let transition = Transition::instant().delay(delay).on_complete(callback);
            let timeline = create(&shared, owner.clone(), transition, None);
            register(&shared, timeline.id());
            timeline
        })
    }

    /// See [`AnimationScheduler::animate_custom`]
    pub fn animate_custom(&self, callback: impl Fn(f32) + 'static) {
        let callback: Rc<dyn Fn(f32)> = Rc::new(callback);
        let captured = self
            .inner
            .upgrade()
            .is_some_and(|shared| animate_custom(&shared, &callback));
        if !captured {
            callback(1.0);
        }
    }

    pub fn without_animating<R>(&self, f: impl FnOnce() -> R) -> R {
        match self.inner.upgrade() {
            Some(shared) => without_animating(&shared, f),
            None => f(),
        }
    }

    pub fn defining(&self) -> Option<Timeline> {
        self.inner.upgrade().and_then(|shared| defining(&shared))
    }

    pub fn cancel_all_for(&self, owner: &OwnerRef) {
        if let Some(shared) = self.inner.upgrade() {
            cancel_all_for(&shared, owner);
        }
    }

    pub fn complete_all_for(&self, owner: &OwnerRef) {
        if let Some(shared) = self.inner.upgrade() {
            complete_all_for(&shared, owner);
        }
    }

    pub fn is_animating(&self, owner: &OwnerRef) -> bool {
        self.inner
            .upgrade()
            .is_some_and(|shared| !shared.borrow().running_for(owner).is_empty())
    }

    pub fn running_count(&self) -> usize {
        self.inner
            .upgrade()
            .map_or(0, |shared| shared.borrow().running_len())
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }

    // =========================================================================
    // Crate-internal operations
    // =========================================================================

    /// Route a property write into the timeline being defined
    ///
    /// Returns the value back when it should be applied immediately.
    pub(crate) fn capture_write<T: Interpolate>(
        &self,
        cell: &Rc<PropertyCell<T>>,
        value: T,
    ) -> Option<T> {
        let Some(shared) = self.inner.upgrade() else {
            return Some(value);
        };

        let timeline_id = {
            let mut guard = shared.borrow_mut();
            let state = &mut *guard;
            let Some(timeline_id) = state
                .definition
                .current()
                .filter(|id| state.timelines.contains_key(*id))
            else {
                return Some(value);
            };

            if let Some(active) = cell.active.get() {
                match state.values.get(active).map(|track| track.timeline()) {
                    Some(holder) if holder == timeline_id => {
                        // Written again in the same definition: keep start
                        if let Some(record) = state
                            .values
                            .get_mut(active)
                            .and_then(|track| track.as_any_mut().downcast_mut::<AnimatedValue<T>>())
                        {
                            record.set_end(value);
                            return None;
                        }
                    }
                    Some(holder) => {
                        if let Some(other) = state.timelines.get_mut(holder) {
                            other.values.retain(|id| *id != active);
                        }
                        tracing::trace!(
                            "Timeline {:?}: takes over value {:?} from {:?}",
                            timeline_id,
                            active,
                            holder
                        );
                    }
                    None => {}
                }
                state.release_value(active);
                cell.active.set(None);
            }
            timeline_id
        };

        // Snapshot outside the borrow: the getter is host code
        let start = cell.get();

        let mut guard = shared.borrow_mut();
        let state = &mut *guard;
        let Some(timeline) = state.timelines.get_mut(timeline_id) else {
            return Some(value);
        };
        let mut record: Box<AnimatedValue<T>> = state.pool.acquire();
        record.bind(
            timeline_id,
            cell,
            start,
            value,
            timeline.delay,
            timeline.duration,
        );
        let value_id = state.values.insert(record);
        timeline.values.push(value_id);
        cell.active.set(Some(value_id));
        None
    }

    pub(crate) fn inspect_value<T: Interpolate>(&self, id: ValueId) -> Option<ActiveTransition<T>> {
        let shared = self.inner.upgrade()?;
        let mut state = shared.borrow_mut();
        let record = state
            .values
            .get_mut(id)?
            .as_any_mut()
            .downcast_ref::<AnimatedValue<T>>()?;
        Some(ActiveTransition {
            timeline: record.timeline(),
            start: record.start()?.clone(),
            end: record.end()?.clone(),
            delay: record.delay(),
            duration: record.duration(),
        })
    }

    /// Access a timeline's scheduler-side state
    ///
    /// Returns None if the scheduler is dropped or the timeline was discarded.
    pub(crate) fn with_timeline<F, R>(&self, id: TimelineId, f: F) -> Option<R>
    where
        F: FnOnce(&mut TimelineState) -> R,
    {
        self.inner
            .upgrade()
            .and_then(|shared| shared.borrow_mut().timelines.get_mut(id).map(f))
    }

    pub(crate) fn chained_of(&self, id: TimelineId) -> Option<TimelineId> {
        self.with_timeline(id, |t| t.chained).flatten()
    }

    pub(crate) fn chain(
        &self,
        predecessor: &Timeline,
        transition: Transition,
        definition: Option<Callback>,
    ) -> Timeline {
        match self.inner.upgrade() {
            Some(shared) => chain(&shared, predecessor, transition, definition),
            None => Timeline::from_parts(
                self.clone(),
                TimelineId::default(),
                Rc::new(Cell::new(Phase::Cancelled)),
                predecessor.owner().clone(),
            ),
        }
    }

    pub(crate) fn cancel_timeline(&self, id: TimelineId) {
        if let Some(shared) = self.inner.upgrade() {
            cancel(&shared, id);
        }
    }

    pub(crate) fn complete_timeline_immediate(&self, id: TimelineId) {
        if let Some(shared) = self.inner.upgrade() {
            finish_now(&shared, id);
        }
    }
}

// ============================================================================
// Node-level helpers
// ============================================================================

/// Animation controls for a node, routed through the thread's scheduler
pub trait NodeAnimations {
    /// Cancel every running timeline owned by this node
    fn cancel_animations(&self);

    /// Jump every running timeline owned by this node to its end
    fn complete_animations(&self);

    /// Check if any running timeline is owned by this node
    fn is_animating(&self) -> bool;
}

impl<N: AnimationOwner + 'static> NodeAnimations for Rc<N> {
    fn cancel_animations(&self) {
        if let Some(scheduler) = try_get_scheduler() {
            scheduler.cancel_all_for(&OwnerRef::new(self));
        }
    }

    fn complete_animations(&self) {
        if let Some(scheduler) = try_get_scheduler() {
            scheduler.complete_all_for(&OwnerRef::new(self));
        }
    }

    fn is_animating(&self) -> bool {
        try_get_scheduler().is_some_and(|scheduler| scheduler.is_animating(&OwnerRef::new(self)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyHandle;

    fn deterministic() -> AnimationScheduler {
        AnimationScheduler::with_config(EngineConfig::deterministic())
    }

    #[test]
    fn test_first_tick_is_skipped_by_default() {
        let scheduler = AnimationScheduler::new();
        let timeline = scheduler.after(&OwnerRef::detached(), 0.5, || {});

        assert!(scheduler.tick(10.0));
        assert_eq!(timeline.elapsed(), Some(0.0));
        assert!(timeline.is_running());

        scheduler.tick(0.25);
        assert_eq!(timeline.elapsed(), Some(0.25));
        assert_eq!(scheduler.frame_count(), 2);
    }

    #[test]
    fn test_handle_outlives_scheduler() {
        let handle = {
            let scheduler = deterministic();
            scheduler.handle()
        };
        assert!(!handle.is_alive());
        assert!(handle.animate(&OwnerRef::detached(), Transition::new(1.0), || {}).is_none());
        assert_eq!(handle.running_count(), 0);
        assert_eq!(handle.without_animating(|| 3), 3);
    }

    #[test]
    fn test_thread_scheduler_install() {
        let scheduler = deterministic();
        clear_thread_scheduler();
        assert!(try_get_scheduler().is_none());
        assert!(!is_scheduler_initialized());

        set_thread_scheduler(scheduler.handle());
        assert!(is_scheduler_initialized());
        assert!(get_scheduler().is_alive());

        clear_thread_scheduler();
        assert!(try_get_scheduler().is_none());
    }

    #[test]
    fn test_clear_discards_everything() {
        let scheduler = deterministic();
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        let timeline = scheduler.after(&OwnerRef::detached(), 1.0, move || flag.set(true));
        let successor = timeline.then(|| {});
        assert_eq!(scheduler.timeline_count(), 2);

        scheduler.clear();
        assert_eq!(scheduler.timeline_count(), 0);
        assert_eq!(scheduler.running_count(), 0);
        assert!(timeline.is_cancelled());
        assert!(successor.is_cancelled());

        scheduler.tick(2.0);
        assert!(!fired.get());
    }

    #[test]
    fn test_definition_scope_survives_panic() {
        let scheduler = deterministic();
        let handle = scheduler.handle();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            handle.animate(&OwnerRef::detached(), Transition::new(1.0), || panic!("boom"));
        }));
        assert!(result.is_err());
        assert!(scheduler.defining().is_none());
        assert!(scheduler.inner.borrow().definition.is_empty());
    }

    #[test]
    fn test_suppression_survives_panic() {
        let scheduler = deterministic();
        let handle = scheduler.handle();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            handle.without_animating::<()>(|| panic!("boom"));
        }));
        assert!(result.is_err());
        assert!(!scheduler.inner.borrow().definition.is_suppressed());

        let value = Rc::new(Cell::new(0.0_f32));
        let (get, set) = (value.clone(), value.clone());
        let prop = PropertyHandle::new(
            scheduler.handle(),
            OwnerRef::detached(),
            move || get.get(),
            move |v| set.set(v),
        );
        let timeline = scheduler.animate(&OwnerRef::detached(), Transition::new(1.0), move || {
            prop.set(10.0);
        });
        assert_eq!(value.get(), 0.0);
        assert_eq!(timeline.value_count(), 1);
    }

    #[test]
    fn test_running_count_skips_finished_mid_tick() {
        let scheduler = deterministic();
        let handle = scheduler.handle();
        let seen = Rc::new(Cell::new(usize::MAX));

        let sink = seen.clone();
        let observer = handle.clone();
        scheduler.after(&OwnerRef::detached(), 1.0, move || {
            sink.set(observer.running_count());
        });
        scheduler.after(&OwnerRef::detached(), 2.0, || {});
        assert_eq!(scheduler.running_count(), 2);

        scheduler.tick(1.0);
        assert_eq!(seen.get(), 1);
        assert_eq!(scheduler.running_count(), 1);
        assert!(scheduler.has_active_animations());
    }
}
