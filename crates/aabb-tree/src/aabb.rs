//! Axis-aligned bounding box representation and operations.

use nalgebra::{Point3, Vector3};

/// An axis-aligned bounding box in 3D space, stored as min/max corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    min: Point3<f32>,
    max: Point3<f32>,
}

impl Aabb {
    /// Creates a new box from its minimum and maximum corners.
    ///
    /// # Panics (debug builds only)
    /// Panics if `min` exceeds `max` on any axis.
    pub fn new(min: Point3<f32>, max: Point3<f32>) -> Self {
        debug_assert!(
            min.x <= max.x && min.y <= max.y && min.z <= max.z,
            "Aabb min corner must not exceed max corner"
        );
        Self { min, max }
    }

    /// Creates a box from its center and half-extents.
    pub fn from_center_extents(center: Point3<f32>, extents: Vector3<f32>) -> Self {
        Self::new(center - extents, center + extents)
    }

    /// Returns the minimum corner of the box.
    #[inline]
    pub fn min(&self) -> Point3<f32> {
        self.min
    }

    /// Returns the maximum corner of the box.
    #[inline]
    pub fn max(&self) -> Point3<f32> {
        self.max
    }

    /// Returns the center of the box.
    #[inline]
    pub fn center(&self) -> Point3<f32> {
        self.min + (self.max - self.min) * 0.5
    }

    /// Returns the half-extents of the box.
    #[inline]
    pub fn extents(&self) -> Vector3<f32> {
        (self.max - self.min) * 0.5
    }

    /// Returns the full edge lengths of the box.
    #[inline]
    pub fn size(&self) -> Vector3<f32> {
        self.max - self.min
    }

    /// Computes the smallest box enclosing both `self` and `other`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: Point3::new(
                self.min.x.min(other.min.x),
                self.min.y.min(other.min.y),
                self.min.z.min(other.min.z),
            ),
            max: Point3::new(
                self.max.x.max(other.max.x),
                self.max.y.max(other.max.y),
                self.max.z.max(other.max.z),
            ),
        }
    }

    /// Computes the volume of the box as the product of its edge lengths.
    #[inline]
    pub fn volume(&self) -> f32 {
        let size = self.size();
        size.x * size.y * size.z
    }

    /// Returns `true` if `other` lies entirely within `self` (boundaries
    /// included).
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.min.z <= other.min.z
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
            && other.max.z <= self.max.z
    }

    /// Returns `true` if `self` and `other` overlap (boundaries included).
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
            && self.min.z <= other.max.z
            && other.min.z <= self.max.z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(min: [f32; 3], max: [f32; 3]) -> Aabb {
        Aabb::new(
            Point3::new(min[0], min[1], min[2]),
            Point3::new(max[0], max[1], max[2]),
        )
    }

    #[test]
    fn center_and_extents() {
        let b = boxed([0.0, 2.0, 4.0], [2.0, 6.0, 10.0]);
        assert_eq!(b.center(), Point3::new(1.0, 4.0, 7.0));
        assert_eq!(b.extents(), Vector3::new(1.0, 2.0, 3.0));
        assert_eq!(b.size(), Vector3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn from_center_extents_round_trips() {
        let b = Aabb::from_center_extents(Point3::new(1.0, 2.0, 3.0), Vector3::new(0.5, 1.0, 1.5));
        assert_eq!(b, boxed([0.5, 1.0, 1.5], [1.5, 3.0, 4.5]));
    }

    #[test]
    fn union_is_componentwise_hull() {
        let a = boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let b = boxed([5.0, 5.0, 5.0], [6.0, 6.0, 6.0]);
        assert_eq!(a.union(&b), boxed([0.0, 0.0, 0.0], [6.0, 6.0, 6.0]));
        assert_eq!(b.union(&a), a.union(&b));
    }

    #[test]
    fn volume_is_product_of_edges() {
        let b = boxed([0.0, 0.0, 0.0], [2.0, 3.0, 4.0]);
        assert_eq!(b.volume(), 24.0);

        // A flat box has zero volume.
        let flat = boxed([0.0, 0.0, 0.0], [2.0, 3.0, 0.0]);
        assert_eq!(flat.volume(), 0.0);
    }

    #[test]
    fn contains_is_closed() {
        let outer = boxed([0.0, 0.0, 0.0], [4.0, 4.0, 4.0]);
        let inner = boxed([1.0, 1.0, 1.0], [3.0, 3.0, 3.0]);
        assert!(outer.contains(&inner));
        assert!(!inner.contains(&outer));
        assert!(outer.contains(&outer));

        let straddling = boxed([3.0, 3.0, 3.0], [5.0, 5.0, 5.0]);
        assert!(!outer.contains(&straddling));
    }

    #[test]
    fn intersects_includes_touching_faces() {
        let a = boxed([0.0, 0.0, 0.0], [1.0, 1.0, 1.0]);
        let touching = boxed([1.0, 0.0, 0.0], [2.0, 1.0, 1.0]);
        let apart = boxed([2.0, 2.0, 2.0], [3.0, 3.0, 3.0]);
        assert!(a.intersects(&touching));
        assert!(touching.intersects(&a));
        assert!(!a.intersects(&apart));
    }
}
