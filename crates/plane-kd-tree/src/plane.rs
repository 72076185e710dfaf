//! Infinite plane representation for half-space partitioning.

use nalgebra::{Point3, Vector3};

/// Which half-space of a plane a point occupies.
///
/// The test is one-sided: a point exactly on the plane counts as
/// [`InFrontOrEqual`](HalfSpace::InFrontOrEqual), matching the
/// partitioning rule of the bounded-plane tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfSpace {
    /// Negative side of the plane normal.
    Behind,
    /// Positive side of the plane normal, or on the plane itself.
    InFrontOrEqual,
}

/// A plane in 3D space, represented as `normal · point = offset`.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    normal: Vector3<f32>,
    offset: f32,
}

impl Plane {
    /// Creates a new plane from a normal vector and offset.
    /// The normal will be normalized automatically.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn new(normal: Vector3<f32>, offset: f32) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        Self {
            normal: normal / norm,
            offset: offset / norm,
        }
    }

    /// Creates a plane from a point on the plane and a normal vector.
    /// The normal will be normalized automatically.
    ///
    /// # Panics
    /// Panics if the normal vector has zero length.
    pub fn from_point_and_normal(point: Point3<f32>, normal: Vector3<f32>) -> Self {
        let norm = normal.norm();
        assert!(norm > f32::EPSILON, "Plane normal cannot be zero");
        let unit_normal = normal / norm;
        let offset = unit_normal.dot(&point.coords);
        Self {
            normal: unit_normal,
            offset,
        }
    }

    /// Returns the unit normal vector of the plane.
    #[inline]
    pub fn normal(&self) -> Vector3<f32> {
        self.normal
    }

    /// Returns the signed distance from the origin to the plane along the normal.
    #[inline]
    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Computes the signed distance from a point to the plane.
    /// - Positive: point is in front (same side as normal)
    /// - Negative: point is behind (opposite side from normal)
    /// - Zero: point is on the plane
    #[inline]
    pub fn signed_distance(&self, point: Point3<f32>) -> f32 {
        self.normal.dot(&point.coords) - self.offset
    }

    /// Classifies which half-space of the plane a point occupies.
    ///
    /// A point exactly on the plane counts as `InFrontOrEqual`.
    #[inline]
    pub fn half_space(&self, point: Point3<f32>) -> HalfSpace {
        if self.signed_distance(point) >= 0.0 {
            HalfSpace::InFrontOrEqual
        } else {
            HalfSpace::Behind
        }
    }

    /// Projects a point onto the plane (finds the closest point on the plane).
    #[inline]
    pub fn project_point(&self, point: Point3<f32>) -> Point3<f32> {
        point - self.normal * self.signed_distance(point)
    }
}
