use glam::Vec2;

/// Axis-aligned bounding box in the 2D world plane.
///
/// Invariant: `min.x <= max.x` and `min.y <= max.y`. The constructor
/// enforces this by sorting components.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    /// Create an AABB from two corners. Automatically sorts
    /// components so that min <= max on every axis.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create an AABB from a center point and half-extents.
    pub fn from_center_half_extents(center: Vec2, half: Vec2) -> Self {
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Returns true if the point lies inside or on the boundary.
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Returns true if this AABB overlaps with other
    /// (including touching edges).
    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Returns the center point of the AABB.
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the point inside the AABB closest to `p`.
    ///
    /// For points inside the box this is `p` itself.
    pub fn closest_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    /// Squared Euclidean distance from `p` to the nearest point of the box.
    ///
    /// Zero when `p` is inside or on the boundary. Squared distance avoids
    /// a square root in visibility tests that compare against a squared
    /// radius.
    pub fn distance_squared(&self, p: Vec2) -> f32 {
        self.closest_point(p).distance_squared(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_sorts_corners() {
        let b = Aabb2::new(Vec2::new(4.0, -1.0), Vec2::new(-2.0, 3.0));
        assert_eq!(b.min, Vec2::new(-2.0, -1.0));
        assert_eq!(b.max, Vec2::new(4.0, 3.0));
    }

    #[test]
    fn test_contains_point_boundary_inclusive() {
        let b = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert!(b.contains_point(Vec2::new(0.0, 0.0)));
        assert!(b.contains_point(Vec2::new(10.0, 10.0)));
        assert!(b.contains_point(Vec2::new(5.0, 5.0)));
        assert!(!b.contains_point(Vec2::new(10.1, 5.0)));
    }

    #[test]
    fn test_distance_squared_inside_is_zero() {
        let b = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        assert_eq!(b.distance_squared(Vec2::new(3.0, 7.0)), 0.0);
    }

    #[test]
    fn test_distance_squared_outside_single_axis() {
        let b = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        // 3 units past the +x face.
        assert_eq!(b.distance_squared(Vec2::new(13.0, 5.0)), 9.0);
    }

    #[test]
    fn test_distance_squared_outside_corner() {
        let b = Aabb2::new(Vec2::ZERO, Vec2::new(10.0, 10.0));
        // 3-4-5 triangle past the max corner.
        assert_eq!(b.distance_squared(Vec2::new(13.0, 14.0)), 25.0);
    }

    #[test]
    fn test_intersects_touching_edges() {
        let a = Aabb2::new(Vec2::ZERO, Vec2::new(1.0, 1.0));
        let b = Aabb2::new(Vec2::new(1.0, 0.0), Vec2::new(2.0, 1.0));
        let c = Aabb2::new(Vec2::new(1.5, 0.0), Vec2::new(2.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
    }
}
