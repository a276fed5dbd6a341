//! Small vector math helpers.

use num_traits::Float;

/// A three component vector.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vector3<T> {
    /// The x component.
    pub x: T,
    /// The y component.
    pub y: T,
    /// The z component.
    pub z: T,
}

impl<T> Vector3<T> {
    /// Creates a new vector.
    pub const fn new(x: T, y: T, z: T) -> Self {
        Self { x, y, z }
    }
}

impl<T: Float> Vector3<T> {
    /// Per-axis absolute difference between `self` and `other`.
    #[must_use]
    pub fn abs_diff(&self, other: &Self) -> Self {
        Self {
            x: (self.x - other.x).abs(),
            y: (self.y - other.y).abs(),
            z: (self.z - other.z).abs(),
        }
    }

    /// Length of the horizontal (x/z) projection.
    #[must_use]
    pub fn horizontal_length(&self) -> T {
        self.x.hypot(self.z)
    }

    /// Returns true if every component is neither `NaN` nor infinite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Returns the components as an array, in x, y, z order.
    #[must_use]
    pub const fn to_array(&self) -> [T; 3] {
        [self.x, self.y, self.z]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn abs_diff_is_symmetric() {
        let a = Vector3::new(1.0, -5.0, 10.0);
        let b = Vector3::new(-2.0, 5.0, 4.0);
        assert_eq!(a.abs_diff(&b), Vector3::new(3.0, 10.0, 6.0));
        assert_eq!(b.abs_diff(&a), a.abs_diff(&b));
    }

    #[test]
    fn horizontal_length_ignores_y() {
        let v = Vector3::new(3.0, 1000.0, 4.0);
        assert!((v.horizontal_length() - 5.0_f64).abs() < f64::EPSILON);
    }

    #[test]
    fn finiteness() {
        assert!(Vector3::new(0.0, 1.0, 2.0).is_finite());
        assert!(!Vector3::new(f64::NAN, 1.0, 2.0).is_finite());
        assert!(!Vector3::new(0.0, f64::NEG_INFINITY, 2.0).is_finite());
    }
}
