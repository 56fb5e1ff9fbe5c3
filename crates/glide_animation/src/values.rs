//! Animatable value types
//!
//! The [`Interpolate`] trait supplies the per-kind interpolation rule that a
//! [`PropertyHandle`](crate::property::PropertyHandle) uses during playback.

use glide_core::{Angle, Color, Vec2, Vec3};

/// Trait for values that can be interpolated by an animation
pub trait Interpolate: Clone + 'static {
    /// Interpolate between self and other by factor t
    ///
    /// `t` is the eased progress and may leave 0..1 when the easing
    /// overshoots; each kind decides whether to extrapolate or clamp.
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

// ============================================================================
// f32 Implementation
// ============================================================================

/// Unclamped: `t` outside 0..1 extrapolates past the endpoints.
impl Interpolate for f32 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + t * (other - self)
    }
}

// ============================================================================
// Angle Implementation
// ============================================================================

/// Rotates along the shorter arc, so 350° → 10° passes through 0°.
impl Interpolate for Angle {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Angle(self.0 + self.shortest_delta(*other) * t)
    }
}

// ============================================================================
// Color Implementation
// ============================================================================

impl Interpolate for Color {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Color::lerp(self, other, t)
    }
}

// ============================================================================
// Vector Implementations
// ============================================================================

impl Interpolate for Vec2 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec2::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
        )
    }
}

impl Interpolate for Vec3 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Vec3::new(
            self.x + (other.x - self.x) * t,
            self.y + (other.y - self.y) * t,
            self.z + (other.z - self.z) * t,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_interpolation() {
        assert!((0.0_f32.lerp(&1.0, 0.5) - 0.5).abs() < 1e-6);
        assert!((10.0_f32.lerp(&20.0, 0.25) - 12.5).abs() < 1e-6);
    }

    #[test]
    fn test_float_extrapolates() {
        assert!((0.0_f32.lerp(&10.0, 1.5) - 15.0).abs() < 1e-6);
        assert!((0.0_f32.lerp(&10.0, -0.5) + 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_angle_takes_short_way() {
        let mid = Angle(350.0).lerp(&Angle(10.0), 0.5);
        assert!((mid.0 - 360.0).abs() < 1e-4);
        assert!(mid.shortest_delta(Angle(0.0)).abs() < 1e-4);

        let quarter = Angle(10.0).lerp(&Angle(350.0), 0.5);
        assert!((quarter.0 - 0.0).abs() < 1e-4);
    }

    #[test]
    fn test_color_clamped() {
        let over = Color::BLACK.lerp(&Color::WHITE, 1.4);
        assert_eq!(over.to_array(), Color::WHITE.to_array());
    }

    #[test]
    fn test_vec3_interpolation() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(10.0, 20.0, 30.0);
        let mid = a.lerp(&b, 0.5);

        assert!((mid.x - 5.0).abs() < 1e-6);
        assert!((mid.y - 10.0).abs() < 1e-6);
        assert!((mid.z - 15.0).abs() < 1e-6);
    }
}
