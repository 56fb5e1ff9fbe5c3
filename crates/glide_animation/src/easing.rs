//! Easing functions
//!
//! An easing maps normalized progress `t ∈ [0, 1]` to eased progress.
//! Most curves stay inside `[0, 1]`; the back and elastic families overshoot,
//! which is why float properties interpolate without clamping.

use std::f32::consts::PI;

use crate::curve::AnimationCurve;

/// Named easing functions
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub enum Easing {
    Linear,
    /// Hermite smoothstep `t²(3 - 2t)`, the engine default
    #[default]
    SmoothStep,
    EaseInQuad,
    EaseOutQuad,
    EaseInOutQuad,
    /// Cubic ease-in
    EaseIn,
    /// Cubic ease-out
    EaseOut,
    /// Cubic ease-in-out
    EaseInOut,
    EaseInSine,
    EaseOutSine,
    EaseInOutSine,
    EaseInExpo,
    EaseOutExpo,
    EaseInBack,
    EaseOutBack,
    EaseInOutBack,
    EaseOutElastic,
    EaseOutBounce,
    /// CSS-style cubic bezier with control points (x1, y1) and (x2, y2)
    CubicBezier(f32, f32, f32, f32),
}

const BACK_C1: f32 = 1.70158;
const BACK_C2: f32 = BACK_C1 * 1.525;
const BACK_C3: f32 = BACK_C1 + 1.0;

impl Easing {
    /// Apply the easing to a progress value (clamped to 0..1 first)
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::SmoothStep => smoothstep(t),
            Easing::EaseInQuad => t * t,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseInSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::EaseOutSine => (t * PI / 2.0).sin(),
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::EaseInExpo => {
                if t == 0.0 {
                    0.0
                } else {
                    2f32.powf(10.0 * t - 10.0)
                }
            }
            Easing::EaseOutExpo => {
                if t == 1.0 {
                    1.0
                } else {
                    1.0 - 2f32.powf(-10.0 * t)
                }
            }
            Easing::EaseInBack => BACK_C3 * t * t * t - BACK_C1 * t * t,
            Easing::EaseOutBack => {
                let u = t - 1.0;
                1.0 + BACK_C3 * u * u * u + BACK_C1 * u * u
            }
            Easing::EaseInOutBack => {
                if t < 0.5 {
                    ((2.0 * t).powi(2) * ((BACK_C2 + 1.0) * 2.0 * t - BACK_C2)) / 2.0
                } else {
                    ((2.0 * t - 2.0).powi(2) * ((BACK_C2 + 1.0) * (t * 2.0 - 2.0) + BACK_C2)
                        + 2.0)
                        / 2.0
                }
            }
            Easing::EaseOutElastic => {
                if t == 0.0 || t == 1.0 {
                    t
                } else {
                    let c4 = (2.0 * PI) / 3.0;
                    2f32.powf(-10.0 * t) * ((t * 10.0 - 0.75) * c4).sin() + 1.0
                }
            }
            Easing::EaseOutBounce => bounce_out(t),
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(*x1, *y1, *x2, *y2, t),
        }
    }

    /// Whether this easing can leave the 0..1 range
    pub fn overshoots(&self) -> bool {
        match self {
            Easing::EaseInBack
            | Easing::EaseOutBack
            | Easing::EaseInOutBack
            | Easing::EaseOutElastic => true,
            Easing::CubicBezier(_, y1, _, y2) => {
                !(0.0..=1.0).contains(y1) || !(0.0..=1.0).contains(y2)
            }
            _ => false,
        }
    }
}

/// Hermite smoothstep on 0..1
#[inline]
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// The easing a timeline applies to every value it drives
///
/// A named function wins over a custom curve; with neither set the timeline
/// falls back to smoothstep.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum EasingRule {
    #[default]
    Default,
    Function(Easing),
    Curve(AnimationCurve),
}

impl EasingRule {
    pub fn apply(&self, t: f32) -> f32 {
        match self {
            EasingRule::Function(easing) => easing.apply(t),
            EasingRule::Curve(curve) => curve.evaluate(t.clamp(0.0, 1.0)),
            EasingRule::Default => smoothstep(t),
        }
    }
}

impl From<Easing> for EasingRule {
    fn from(easing: Easing) -> Self {
        EasingRule::Function(easing)
    }
}

impl From<AnimationCurve> for EasingRule {
    fn from(curve: AnimationCurve) -> Self {
        EasingRule::Curve(curve)
    }
}

fn bounce_out(t: f32) -> f32 {
    const N1: f32 = 7.5625;
    const D1: f32 = 2.75;

    if t < 1.0 / D1 {
        N1 * t * t
    } else if t < 2.0 / D1 {
        let t = t - 1.5 / D1;
        N1 * t * t + 0.75
    } else if t < 2.5 / D1 {
        let t = t - 2.25 / D1;
        N1 * t * t + 0.9375
    } else {
        let t = t - 2.625 / D1;
        N1 * t * t + 0.984375
    }
}

// Newton-Raphson on x(s), then evaluate y(s).
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, progress: f32) -> f32 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let mut s = progress;
    for _ in 0..8 {
        let x = bezier_axis(x1, x2, s) - progress;
        if x.abs() < 1e-6 {
            break;
        }
        let dx = bezier_axis_derivative(x1, x2, s);
        if dx.abs() < 1e-6 {
            break;
        }
        s = (s - x / dx).clamp(0.0, 1.0);
    }

    bezier_axis(y1, y2, s)
}

#[inline]
fn bezier_axis(p1: f32, p2: f32, s: f32) -> f32 {
    let ms = 1.0 - s;
    3.0 * ms * ms * s * p1 + 3.0 * ms * s * s * p2 + s * s * s
}

#[inline]
fn bezier_axis_derivative(p1: f32, p2: f32, s: f32) -> f32 {
    let ms = 1.0 - s;
    3.0 * ms * ms * p1 + 6.0 * ms * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}
