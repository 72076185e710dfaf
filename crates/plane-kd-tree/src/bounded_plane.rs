//! Bounded plane (finite rectangular patch) representation.

use nalgebra::{Point3, UnitQuaternion, Vector2, Vector3};

use crate::Plane;

/// A finite rectangular patch lying in a plane.
///
/// The patch is defined by its world-space `center`, half-extents along
/// its local X (width) and Y (height) axes, and a `rotation` mapping the
/// local frame into world space. The patch normal is the rotated local +Z
/// axis, and the carried infinite [`Plane`] passes through `center` with
/// that normal.
///
/// Two patches compare equal only when center, extents, and rotation are
/// identical; the tree treats an equal patch with an equal payload as the
/// same entry.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundedPlane {
    center: Point3<f32>,
    extents: Vector2<f32>,
    rotation: UnitQuaternion<f32>,
    plane: Plane,
}

impl BoundedPlane {
    /// Creates a patch from its center, half-extents, and orientation.
    ///
    /// `extents.x` is the half-width along the local X axis, `extents.y`
    /// the half-height along the local Y axis.
    pub fn new(center: Point3<f32>, extents: Vector2<f32>, rotation: UnitQuaternion<f32>) -> Self {
        let normal = rotation * Vector3::z();
        let plane = Plane::from_point_and_normal(center, normal);
        Self {
            center,
            extents,
            rotation,
            plane,
        }
    }

    /// Returns the world-space center of the patch.
    #[inline]
    pub fn center(&self) -> Point3<f32> {
        self.center
    }

    /// Returns the half-extents of the patch in its local frame.
    #[inline]
    pub fn extents(&self) -> Vector2<f32> {
        self.extents
    }

    /// Returns the rotation mapping the local frame into world space.
    #[inline]
    pub fn rotation(&self) -> UnitQuaternion<f32> {
        self.rotation
    }

    /// Returns the infinite plane the patch lies on.
    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Returns the four world-space corners of the patch.
    ///
    /// Order: (-x,-y), (+x,-y), (+x,+y), (-x,+y) in the local frame.
    pub fn corners(&self) -> [Point3<f32>; 4] {
        let right = self.rotation * (Vector3::x() * self.extents.x);
        let up = self.rotation * (Vector3::y() * self.extents.y);
        [
            self.center - right - up,
            self.center + right - up,
            self.center + right + up,
            self.center - right + up,
        ]
    }

    /// Finds the closest point on the patch to a world-space point.
    ///
    /// The point is taken into the local frame, clamped to the patch
    /// extents, and mapped back. Unlike projecting onto the infinite
    /// plane, the result never leaves the rectangle.
    pub fn closest_point(&self, point: Point3<f32>) -> Point3<f32> {
        let local = self.rotation.inverse_transform_vector(&(point - self.center));
        let clamped = Vector3::new(
            local.x.clamp(-self.extents.x, self.extents.x),
            local.y.clamp(-self.extents.y, self.extents.y),
            0.0,
        );
        self.center + self.rotation * clamped
    }

    /// Computes the squared distance from a world-space point to the patch.
    #[inline]
    pub fn distance_squared(&self, point: Point3<f32>) -> f32 {
        (point - self.closest_point(point)).norm_squared()
    }
}
