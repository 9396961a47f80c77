// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Planes and the six-plane view frustum used for culling.

use super::{Aabb, BoundingSphere, Mat4, Vec3, Vec4, EPSILON};
use serde::{Deserialize, Serialize};

/// A plane in Hessian normal form: `normal . p + d = 0`.
///
/// Points with a positive signed distance are on the side the normal points to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// The plane normal. Unit length after [`Plane::normalized`].
    pub normal: Vec3,
    /// The plane constant.
    pub d: f32,
}

impl Plane {
    /// Creates a plane from a normal and a constant.
    #[inline]
    pub const fn new(normal: Vec3, d: f32) -> Self {
        Self { normal, d }
    }

    /// Builds a plane from the `(a, b, c, d)` coefficients of a matrix row combination.
    #[inline]
    pub fn from_coefficients(v: Vec4) -> Self {
        Self::new(v.truncate(), v.w).normalized()
    }

    /// Rescales the plane so the normal has unit length.
    #[inline]
    pub fn normalized(&self) -> Self {
        let len = self.normal.length();
        if len < EPSILON {
            return *self;
        }
        Self::new(self.normal / len, self.d / len)
    }

    /// Signed distance from `point` to the plane.
    #[inline]
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.d
    }
}

/// A view frustum, the intersection of six inward-facing planes.
///
/// A frustum is a per-frame snapshot derived from a camera's view and projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frustum {
    /// Planes in the order left, right, bottom, top, near, far. Normals point inwards.
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Extracts the frustum from a combined `projection * view` matrix with a `[0, 1]`
    /// depth range.
    pub fn from_view_projection(m: &Mat4) -> Self {
        let (r0, r1, r2, r3) = (m.row(0), m.row(1), m.row(2), m.row(3));
        Self {
            planes: [
                Plane::from_coefficients(r3 + r0),
                Plane::from_coefficients(r3 - r0),
                Plane::from_coefficients(r3 + r1),
                Plane::from_coefficients(r3 - r1),
                Plane::from_coefficients(r2),
                Plane::from_coefficients(r3 - r2),
            ],
        }
    }

    /// Returns `true` unless the sphere lies fully outside one of the planes.
    ///
    /// A sphere is visible iff its signed distance is `>= -radius` for every plane.
    #[inline]
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.signed_distance(sphere.center) >= -sphere.radius)
    }

    /// Returns `true` unless the box lies fully outside one of the planes.
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        if !aabb.is_valid() {
            return false;
        }
        self.planes.iter().all(|p| {
            // The corner furthest along the plane normal.
            let positive = Vec3::new(
                if p.normal.x >= 0.0 { aabb.max.x } else { aabb.min.x },
                if p.normal.y >= 0.0 { aabb.max.y } else { aabb.min.y },
                if p.normal.z >= 0.0 { aabb.max.z } else { aabb.min.z },
            );
            p.signed_distance(positive) >= 0.0
        })
    }

    /// Returns `true` if the point is inside or on the frustum.
    #[inline]
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.signed_distance(point) >= 0.0)
    }
}

/// The culling policy shared by every renderable.
///
/// `None` means culling is disabled for this query, and everything is visible.
#[inline]
pub fn is_visible(frustum: Option<&Frustum>, sphere: &BoundingSphere) -> bool {
    match frustum {
        Some(f) => f.intersects_sphere(sphere),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::FRAC_PI_2;

    /// Camera at the origin looking down -Z, near 1, far 100, 90 degree fov.
    fn test_frustum() -> Frustum {
        let proj = Mat4::perspective_rh_zo(FRAC_PI_2, 1.0, 1.0, 100.0);
        Frustum::from_view_projection(&proj)
    }

    #[test]
    fn test_point_sphere_inside_is_visible() {
        let f = test_frustum();
        let s = BoundingSphere::new(Vec3::new(0.0, 0.0, -10.0), 0.0);
        assert!(f.intersects_sphere(&s));
        assert!(f.contains_point(s.center));
    }

    #[test]
    fn test_sphere_outside_each_plane_is_culled() {
        let f = test_frustum();
        let outside = [
            Vec3::new(-50.0, 0.0, -10.0),
            Vec3::new(50.0, 0.0, -10.0),
            Vec3::new(0.0, -50.0, -10.0),
            Vec3::new(0.0, 50.0, -10.0),
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -500.0),
        ];
        for c in outside {
            assert!(!f.intersects_sphere(&BoundingSphere::new(c, 1.0)), "{c:?}");
        }
    }

    #[test]
    fn test_sphere_straddling_plane_is_visible() {
        let f = test_frustum();
        // Left plane at z = -10 is x = -10; a sphere touching it from outside is visible.
        assert!(f.intersects_sphere(&BoundingSphere::new(Vec3::new(-11.0, 0.0, -10.0), 2.0)));
    }

    #[test]
    fn test_aabb_intersection() {
        let f = test_frustum();
        let inside = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, -20.0), Vec3::ONE);
        let behind = Aabb::from_center_half_extents(Vec3::new(0.0, 0.0, 20.0), Vec3::ONE);
        assert!(f.intersects_aabb(&inside));
        assert!(!f.intersects_aabb(&behind));
        assert!(!f.intersects_aabb(&Aabb::INVALID));
    }

    #[test]
    fn test_no_frustum_means_visible() {
        let far_away = BoundingSphere::new(Vec3::splat(1.0e6), 1.0);
        assert!(is_visible(None, &far_away));
        assert!(!is_visible(Some(&test_frustum()), &far_away));
    }
}
