//! Definition context
//!
//! While a timeline's definition callback runs, the timeline sits on this
//! stack and property writes are captured as animated values instead of being
//! applied. Definitions nest: a callback may start further timelines, which
//! push and pop above it.
//!
//! A suppression scope (`without_animating`) hides the stack so writes apply
//! immediately even from inside a definition callback. Suppression is
//! counted, so nested scopes only re-enable capture when the outermost one
//! ends.

use smallvec::SmallVec;

use crate::error::{EngineError, Result};
use crate::scheduler::TimelineId;

/// Stack of timelines whose definition callbacks are executing
#[derive(Debug, Default)]
pub struct DefinitionContext {
    stack: SmallVec<[TimelineId; 4]>,
    suppression: u32,
}

impl DefinitionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, timeline: TimelineId) {
        self.stack.push(timeline);
    }

    /// Pop the innermost timeline
    ///
    /// Popping an empty stack is a usage error, reported as
    /// [`EngineError::DefinitionStackEmpty`] rather than a panic. The
    /// scheduler's own definition scope pops through
    /// [`pop_expected`](Self::pop_expected) and panics on imbalance in debug
    /// builds.
    pub fn pop(&mut self) -> Result<TimelineId> {
        self.stack.pop().ok_or(EngineError::DefinitionStackEmpty)
    }

    /// Pop `expected`, which must be the innermost timeline
    ///
    /// On a mismatch the stack is unwound down to and including `expected`
    /// (if present) so a misbehaving callback can't leave stale entries.
    pub fn pop_expected(&mut self, expected: TimelineId) -> Result<()> {
        match self.stack.last().copied() {
            None => Err(EngineError::DefinitionStackEmpty),
            Some(top) if top == expected => {
                self.stack.pop();
                Ok(())
            }
            Some(top) => {
                if let Some(pos) = self.stack.iter().rposition(|id| *id == expected) {
                    self.stack.truncate(pos);
                }
                Err(EngineError::DefinitionStackMismatch {
                    expected: format!("{:?}", expected),
                    found: format!("{:?}", top),
                })
            }
        }
    }

    /// Innermost timeline, ignoring suppression
    pub fn top(&self) -> Option<TimelineId> {
        self.stack.last().copied()
    }

    /// Timeline that should capture property writes right now
    ///
    /// `None` while a suppression scope is active, whatever the stack holds.
    pub fn current(&self) -> Option<TimelineId> {
        if self.suppression > 0 {
            None
        } else {
            self.top()
        }
    }

    pub fn begin_suppression(&mut self) {
        self.suppression += 1;
    }

    pub fn end_suppression(&mut self) -> Result<()> {
        if self.suppression == 0 {
            return Err(EngineError::SuppressionUnderflow);
        }
        self.suppression -= 1;
        Ok(())
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppression > 0
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn contains(&self, timeline: TimelineId) -> bool {
        self.stack.contains(&timeline)
    }

    /// Drop every entry (scheduler teardown)
    pub fn clear(&mut self) {
        self.stack.clear();
        self.suppression = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn ids(n: usize) -> Vec<TimelineId> {
        let mut map: SlotMap<TimelineId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn test_nested_push_pop() {
        let ids = ids(2);
        let mut ctx = DefinitionContext::new();
        assert_eq!(ctx.current(), None);

        ctx.push(ids[0]);
        ctx.push(ids[1]);
        assert_eq!(ctx.current(), Some(ids[1]));
        assert_eq!(ctx.depth(), 2);

        assert!(ctx.pop_expected(ids[1]).is_ok());
        assert_eq!(ctx.current(), Some(ids[0]));
        assert_eq!(ctx.pop(), Ok(ids[0]));
        assert!(ctx.is_empty());
    }

    #[test]
    fn test_pop_empty_is_error() {
        let mut ctx = DefinitionContext::new();
        assert_eq!(ctx.pop(), Err(EngineError::DefinitionStackEmpty));
    }

    #[test]
    fn test_mismatched_pop_unwinds() {
        let ids = ids(3);
        let mut ctx = DefinitionContext::new();
        ctx.push(ids[0]);
        ctx.push(ids[1]);
        ctx.push(ids[2]);

        let err = ctx.pop_expected(ids[1]).unwrap_err();
        assert!(matches!(err, EngineError::DefinitionStackMismatch { .. }));
        assert_eq!(ctx.top(), Some(ids[0]));
    }

    #[test]
    fn test_suppression_nests() {
        let ids = ids(1);
        let mut ctx = DefinitionContext::new();
        ctx.push(ids[0]);

        ctx.begin_suppression();
        ctx.begin_suppression();
        assert_eq!(ctx.current(), None);
        assert_eq!(ctx.top(), Some(ids[0]));

        ctx.end_suppression().unwrap();
        assert_eq!(ctx.current(), None);
        ctx.end_suppression().unwrap();
        assert_eq!(ctx.current(), Some(ids[0]));

        assert_eq!(ctx.end_suppression(), Err(EngineError::SuppressionUnderflow));
    }
}
