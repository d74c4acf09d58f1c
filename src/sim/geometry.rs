//! Axis-aligned rectangles and overlap tests
//!
//! Screen coordinates: x grows right, y grows down, `pos` is the top-left corner.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    /// Fully past the left edge of the canvas
    #[inline]
    pub fn is_off_screen_left(&self) -> bool {
        self.right() < 0.0
    }
}

/// Overlap test between two rectangles, the first inflated by `extra_range`
/// on every side (magnet capture).
///
/// Strict inequalities: touching edges do not collide. Each axis compares
/// `lo - extra < other_hi` in both directions, so swapping `a` and `b` runs
/// the exact same float comparisons.
#[inline]
pub fn collides(a: &Rect, b: &Rect, extra_range: f32) -> bool {
    spans_overlap(a.left(), a.right(), b.left(), b.right(), extra_range)
        && spans_overlap(a.top(), a.bottom(), b.top(), b.bottom(), extra_range)
}

#[inline]
fn spans_overlap(a_lo: f32, a_hi: f32, b_lo: f32, b_hi: f32, extra: f32) -> bool {
    a_lo - extra < b_hi && b_lo - extra < a_hi
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_overlap() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert!(collides(&a, &b, 0.0));
    }

    #[test]
    fn test_touching_edges_do_not_collide() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!collides(&a, &b, 0.0));
    }

    #[test]
    fn test_magnet_range_captures_nearby() {
        let player = Rect::new(100.0, 550.0, 50.0, 50.0);
        let coin = Rect::new(220.0, 560.0, 24.0, 24.0);
        assert!(!collides(&player, &coin, 0.0));
        assert!(collides(&player, &coin, 100.0));
    }

    #[test]
    fn test_off_screen() {
        assert!(Rect::new(-31.0, 0.0, 30.0, 10.0).is_off_screen_left());
        assert!(!Rect::new(-29.0, 0.0, 30.0, 10.0).is_off_screen_left());
    }

    fn rect() -> impl Strategy<Value = Rect> {
        (-500.0f32..500.0, -500.0f32..500.0, 0.0f32..200.0, 0.0f32..200.0)
            .prop_map(|(x, y, w, h)| Rect::new(x, y, w, h))
    }

    proptest! {
        #[test]
        fn prop_collision_is_symmetric(a in rect(), b in rect(), extra in 0.0f32..150.0) {
            prop_assert_eq!(collides(&a, &b, extra), collides(&b, &a, extra));
        }

        #[test]
        fn prop_larger_range_never_loses_contact(a in rect(), b in rect(), extra in 0.0f32..150.0) {
            if collides(&a, &b, 0.0) {
                prop_assert!(collides(&a, &b, extra));
            }
        }
    }
}
