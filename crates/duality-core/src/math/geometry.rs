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

//! Bounding volumes: axis-aligned boxes and spheres.
//!
//! Meshes ship both volumes in local space. Renderables transform them into world space
//! every frame; the sphere is the one used for frustum culling.

use super::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// An Axis-Aligned Bounding Box defined by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    /// The corner with the smallest coordinates on every axis.
    pub min: Vec3,
    /// The corner with the largest coordinates on every axis.
    pub max: Vec3,
}

impl Aabb {
    /// A box that contains nothing. Merging anything into it yields the other box.
    pub const INVALID: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Creates a box from two corners, ordering them component-wise.
    #[inline]
    pub fn from_min_max(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates a box from its center and half extents.
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self::from_min_max(center - half_extents, center + half_extents)
    }

    /// Creates the tightest box around a set of points, `None` if the slice is empty.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(rest.iter().fold(Self::from_min_max(*first, *first), |acc, p| {
            acc.merged_with_point(*p)
        }))
    }

    /// The center point of the box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half the size of the box on each axis.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// `true` when `min <= max` on every axis.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Returns `true` if the point lies inside or on the box.
    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        (self.min.x..=self.max.x).contains(&p.x)
            && (self.min.y..=self.max.y).contains(&p.y)
            && (self.min.z..=self.max.z).contains(&p.z)
    }

    /// Component-wise min/max union of two boxes.
    #[inline]
    pub fn merge(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Grows the box to include `point`.
    #[inline]
    pub fn merged_with_point(&self, point: Vec3) -> Self {
        Self {
            min: self.min.min(point),
            max: self.max.max(point),
        }
    }

    /// Transforms the box and returns the axis-aligned box enclosing the result.
    ///
    /// Uses the absolute value of the linear part, so the result is exact for the
    /// transformed extents and never requires visiting the eight corners.
    pub fn transform(&self, matrix: &Mat4) -> Self {
        if !self.is_valid() {
            return *self;
        }
        let center = matrix.transform_point(self.center());
        let e = self.half_extents();
        let abs_col = |i: usize| {
            let c = matrix.cols[i].truncate();
            Vec3::new(c.x.abs(), c.y.abs(), c.z.abs())
        };
        let extent = abs_col(0) * e.x + abs_col(1) * e.y + abs_col(2) * e.z;
        Self::from_center_half_extents(center, extent)
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::INVALID
    }
}

/// A sphere used as the culling volume of renderables.
///
/// The radius is never negative; constructors clamp it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingSphere {
    /// Center of the sphere.
    pub center: Vec3,
    /// Radius of the sphere, `>= 0`.
    pub radius: f32,
}

impl BoundingSphere {
    /// A zero-radius sphere at the origin.
    pub const EMPTY: Self = Self {
        center: Vec3::ZERO,
        radius: 0.0,
    };

    /// Creates a sphere, clamping a negative or NaN radius to zero.
    #[inline]
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius: if radius > 0.0 { radius } else { 0.0 },
        }
    }

    /// The sphere centered on the box that touches its corners.
    #[inline]
    pub fn from_aabb(aabb: &Aabb) -> Self {
        if !aabb.is_valid() {
            return Self::EMPTY;
        }
        Self::new(aabb.center(), aabb.half_extents().length())
    }

    /// Returns `true` if `other` lies entirely inside this sphere.
    #[inline]
    pub fn contains_sphere(&self, other: &BoundingSphere) -> bool {
        self.center.distance(other.center) + other.radius <= self.radius + super::EPSILON
    }

    /// Returns `true` if the point lies inside or on the sphere.
    #[inline]
    pub fn contains_point(&self, p: Vec3) -> bool {
        self.center.distance(p) <= self.radius
    }

    /// The smallest sphere enclosing both `a` and `b`.
    ///
    /// When one sphere already contains the other, that sphere is returned unchanged.
    pub fn create_merged(a: &BoundingSphere, b: &BoundingSphere) -> Self {
        if a.contains_sphere(b) {
            return *a;
        }
        if b.contains_sphere(a) {
            return *b;
        }
        let offset = b.center - a.center;
        let distance = offset.length();
        let radius = (a.radius + b.radius + distance) * 0.5;
        // Non-containment implies distance > |ra - rb| >= 0.
        let center = a.center + offset * ((radius - a.radius) / distance);
        Self::new(center, radius)
    }

    /// Method form of [`BoundingSphere::create_merged`].
    #[inline]
    pub fn merged(&self, other: &BoundingSphere) -> Self {
        Self::create_merged(self, other)
    }

    /// Transforms the sphere into the space of `matrix`.
    ///
    /// The center goes through the full matrix. The radius is scaled by the largest axis
    /// scale factor, which over-estimates the bounds under non-uniform scale.
    #[inline]
    pub fn transform(&self, matrix: &Mat4) -> Self {
        Self::new(
            matrix.transform_point(self.center),
            self.radius * matrix.max_scale(),
        )
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::EMPTY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Quaternion;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_aabb_from_points_and_merge() {
        assert!(Aabb::from_points(&[]).is_none());
        let a = Aabb::from_points(&[Vec3::new(1.0, 2.0, 3.0), Vec3::new(-1.0, 0.0, 5.0)]).unwrap();
        assert_eq!(a.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(a.max, Vec3::new(1.0, 2.0, 5.0));

        let b = Aabb::from_min_max(Vec3::splat(4.0), Vec3::splat(6.0));
        let m = a.merge(&b);
        assert_eq!(m.min, Vec3::new(-1.0, 0.0, 3.0));
        assert_eq!(m.max, Vec3::splat(6.0));
        assert_eq!(Aabb::INVALID.merge(&b), b);
    }

    #[test]
    fn test_aabb_transform_rotation_grows_box() {
        let a = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let m = Mat4::from_quat(Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_4));
        let t = a.transform(&m);
        let expected = 2.0_f32.sqrt();
        assert_relative_eq!(t.max.x, expected, epsilon = 1e-5);
        assert_relative_eq!(t.max.y, 1.0, epsilon = 1e-5);
        assert_relative_eq!(t.max.z, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_negative_radius_clamped() {
        assert_eq!(BoundingSphere::new(Vec3::ZERO, -3.0).radius, 0.0);
        assert_eq!(BoundingSphere::new(Vec3::ZERO, f32::NAN).radius, 0.0);
    }

    #[test]
    fn test_merged_contains_both() {
        let a = BoundingSphere::new(Vec3::new(-2.0, 0.0, 0.0), 1.0);
        let b = BoundingSphere::new(Vec3::new(3.0, 1.0, 0.0), 2.0);
        let m = BoundingSphere::create_merged(&a, &b);
        assert!(m.contains_sphere(&a));
        assert!(m.contains_sphere(&b));
        let expected = (1.0 + 2.0 + a.center.distance(b.center)) * 0.5;
        assert_relative_eq!(m.radius, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_merged_contained_returns_larger_unchanged() {
        let big = BoundingSphere::new(Vec3::new(1.0, 1.0, 1.0), 10.0);
        let small = BoundingSphere::new(Vec3::new(2.0, 1.0, 0.0), 1.0);
        assert_eq!(BoundingSphere::create_merged(&big, &small), big);
        assert_eq!(BoundingSphere::create_merged(&small, &big), big);
        assert_eq!(big.merged(&big), big);
    }

    #[test]
    fn test_sphere_transform_uniform_scale() {
        let s = BoundingSphere::new(Vec3::new(1.0, 0.0, 0.0), 2.0);
        let m = Mat4::from_scale_rotation_translation(
            Vec3::splat(3.0),
            Quaternion::from_axis_angle(Vec3::Z, FRAC_PI_4),
            Vec3::new(0.0, 5.0, 0.0),
        );
        let t = s.transform(&m);
        assert_relative_eq!(t.center, m.transform_point(s.center), epsilon = 1e-5);
        assert_relative_eq!(t.radius, 6.0, epsilon = 1e-5);
    }

    #[test]
    fn test_sphere_transform_non_uniform_uses_max_axis() {
        let s = BoundingSphere::new(Vec3::ZERO, 1.0);
        let t = s.transform(&Mat4::from_scale(Vec3::new(1.0, 5.0, 2.0)));
        assert_relative_eq!(t.radius, 5.0);
    }

    #[test]
    fn test_sphere_from_aabb() {
        let s = BoundingSphere::from_aabb(&Aabb::from_center_half_extents(Vec3::ONE, Vec3::ONE));
        assert_eq!(s.center, Vec3::ONE);
        assert_relative_eq!(s.radius, 3.0_f32.sqrt());
        assert_eq!(BoundingSphere::from_aabb(&Aabb::INVALID), BoundingSphere::EMPTY);
    }
}
