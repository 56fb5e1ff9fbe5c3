//! Custom easing curves
//!
//! An [`AnimationCurve`] is a list of `(time, value)` keys sampled with
//! linear segments. It is the authored alternative to a named [`Easing`]:
//! values may go above 1 or below 0 to overshoot.
//!
//! [`Easing`]: crate::easing::Easing

use smallvec::SmallVec;

/// A single curve key
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurveKey {
    /// Normalized time (0.0 to 1.0)
    pub time: f32,
    /// Eased progress at this time
    pub value: f32,
}

/// Piecewise-linear easing curve
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AnimationCurve {
    keys: SmallVec<[CurveKey; 4]>,
}

impl AnimationCurve {
    /// Create an empty curve (evaluates as linear)
    pub fn new() -> Self {
        Self::default()
    }

    /// The straight line from (0, 0) to (1, 1)
    pub fn linear() -> Self {
        Self::new().key(0.0, 0.0).key(1.0, 1.0)
    }

    /// Add a key (builder pattern); keys stay sorted by time
    pub fn key(mut self, time: f32, value: f32) -> Self {
        self.insert(time, value);
        self
    }

    /// Insert a key, replacing any key at the same time
    pub fn insert(&mut self, time: f32, value: f32) {
        match self
            .keys
            .iter()
            .position(|k| (k.time - time).abs() < f32::EPSILON)
        {
            Some(i) => self.keys[i].value = value,
            None => {
                let at = self
                    .keys
                    .iter()
                    .position(|k| k.time > time)
                    .unwrap_or(self.keys.len());
                self.keys.insert(at, CurveKey { time, value });
            }
        }
    }

    pub fn keys(&self) -> &[CurveKey] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sample the curve at `t`
    ///
    /// Outside the key range the nearest key's value is held.
    pub fn evaluate(&self, t: f32) -> f32 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(first), Some(last)) => (first, last),
            _ => return t,
        };

        if t <= first.time {
            return first.value;
        }
        if t >= last.time {
            return last.value;
        }

        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if t <= b.time {
                let span = b.time - a.time;
                if span <= f32::EPSILON {
                    return b.value;
                }
                let local = (t - a.time) / span;
                return a.value + (b.value - a.value) * local;
            }
        }

        last.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_curve_is_identity() {
        let curve = AnimationCurve::new();
        assert_eq!(curve.evaluate(0.3), 0.3);
    }

    #[test]
    fn test_piecewise_sampling() {
        let curve = AnimationCurve::new()
            .key(1.0, 1.0)
            .key(0.0, 0.0)
            .key(0.5, 1.2);

        assert_eq!(curve.keys()[1].time, 0.5);
        assert!((curve.evaluate(0.25) - 0.6).abs() < 1e-6);
        assert!((curve.evaluate(0.5) - 1.2).abs() < 1e-6);
        assert!((curve.evaluate(0.75) - 1.1).abs() < 1e-6);
        assert_eq!(curve.evaluate(2.0), 1.0);
        assert_eq!(curve.evaluate(-1.0), 0.0);
    }

    #[test]
    fn test_insert_replaces_same_time() {
        let mut curve = AnimationCurve::linear();
        curve.insert(1.0, 0.5);
        assert_eq!(curve.keys().len(), 2);
        assert_eq!(curve.evaluate(1.0), 0.5);
    }
}
