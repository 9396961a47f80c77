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

use super::Transform;
use duality_core::math::{Frustum, Mat4, Rect};
use duality_core::renderer::{RenderError, VisibilityFlags};
use serde::{Deserialize, Serialize};

/// Defines the type of camera projection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProjectionType {
    /// Perspective projection with field of view.
    Perspective {
        /// The vertical field of view in radians.
        fov_y_radians: f32,
    },
    /// Orthographic projection with view bounds.
    Orthographic {
        /// The height of the orthographic view volume; the width follows the aspect ratio.
        height: f32,
    },
}

/// The point of view the pipeline renders from.
///
/// The pipeline reads the camera once per frame and never mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// The type of projection.
    pub projection: ProjectionType,
    /// The distance to the near clipping plane.
    pub z_near: f32,
    /// The distance to the far clipping plane.
    pub z_far: f32,
    /// Output region in normalized `[0, 1]` units, top-left origin.
    pub viewport: Rect,
    /// Groups of renderables this camera draws.
    pub visibility_mask: VisibilityFlags,
    /// When `false` the camera provides no frustum and nothing is culled.
    pub culling_enabled: bool,
    /// World placement. The camera looks down its local `-Z` axis.
    pub transform: Transform,
}

impl Camera {
    /// Creates a perspective camera covering the whole output.
    pub fn new_perspective(fov_y_radians: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            projection: ProjectionType::Perspective { fov_y_radians },
            z_near,
            z_far,
            viewport: Rect::FULL,
            visibility_mask: VisibilityFlags::default(),
            culling_enabled: true,
            transform: Transform::identity(),
        }
    }

    /// Creates an orthographic camera covering the whole output.
    pub fn new_orthographic(height: f32, z_near: f32, z_far: f32) -> Self {
        Self {
            projection: ProjectionType::Orthographic { height },
            ..Self::new_perspective(0.0, z_near, z_far)
        }
    }

    /// Builder-style setter for the viewport.
    pub fn with_viewport(mut self, viewport: Rect) -> Self {
        self.viewport = viewport;
        self
    }

    /// Builder-style setter for the transform.
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Rejects viewports that are non-finite, inverted or outside `[0, 1]`.
    pub fn validate_viewport(&self) -> Result<(), RenderError> {
        let v = &self.viewport;
        if !v.is_valid() {
            return Err(RenderError::invalid_argument(
                "camera.viewport",
                format!("{v:?} is not finite or has a negative size"),
            ));
        }
        if v.x < 0.0 || v.y < 0.0 || v.x + v.width > 1.0 + 1e-6 || v.y + v.height > 1.0 + 1e-6 {
            return Err(RenderError::invalid_argument(
                "camera.viewport",
                format!("{v:?} lies outside the normalized output"),
            ));
        }
        Ok(())
    }

    /// The world-to-view matrix. A degenerate (zero-scale) transform yields identity.
    pub fn view_matrix(&self) -> Mat4 {
        self.transform.to_mat4().affine_inverse().unwrap_or_else(|| {
            log::debug!("Camera transform is not invertible; using identity view");
            Mat4::IDENTITY
        })
    }

    /// The projection for an output of the given aspect ratio.
    pub fn projection_matrix(&self, aspect_ratio: f32) -> Mat4 {
        match self.projection {
            ProjectionType::Perspective { fov_y_radians } => {
                Mat4::perspective_rh_zo(fov_y_radians, aspect_ratio, self.z_near, self.z_far)
            }
            ProjectionType::Orthographic { height } => {
                let half_height = height / 2.0;
                let half_width = half_height * aspect_ratio;
                Mat4::orthographic_rh_zo(
                    -half_width,
                    half_width,
                    -half_height,
                    half_height,
                    self.z_near,
                    self.z_far,
                )
            }
        }
    }

    /// The culling frustum, `None` when culling is disabled.
    pub fn frustum(&self, aspect_ratio: f32) -> Option<Frustum> {
        if !self.culling_enabled {
            return None;
        }
        let view_projection = self.projection_matrix(aspect_ratio) * self.view_matrix();
        Some(Frustum::from_view_projection(&view_projection))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(60.0_f32.to_radians(), 0.1, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duality_core::math::{BoundingSphere, Vec3};

    #[test]
    fn test_frustum_follows_camera_transform() {
        let camera = Camera::default()
            .with_transform(Transform::from_translation(Vec3::new(100.0, 0.0, 0.0)));
        let frustum = camera.frustum(1.0).unwrap();
        let ahead = BoundingSphere::new(Vec3::new(100.0, 0.0, -10.0), 0.5);
        let at_origin = BoundingSphere::new(Vec3::new(0.0, 0.0, -10.0), 0.5);
        assert!(frustum.intersects_sphere(&ahead));
        assert!(!frustum.intersects_sphere(&at_origin));
    }

    #[test]
    fn test_culling_disabled_has_no_frustum() {
        let mut camera = Camera::default();
        camera.culling_enabled = false;
        assert!(camera.frustum(1.0).is_none());
    }

    #[test]
    fn test_viewport_validation() {
        let mut camera = Camera::default();
        assert!(camera.validate_viewport().is_ok());
        camera.viewport = Rect::new(0.5, 0.5, 0.5, 0.5);
        assert!(camera.validate_viewport().is_ok());
        camera.viewport = Rect::new(0.0, 0.0, f32::INFINITY, 1.0);
        assert!(matches!(
            camera.validate_viewport(),
            Err(RenderError::InvalidArgument { name: "camera.viewport", .. })
        ));
        camera.viewport = Rect::new(0.0, 0.0, -0.5, 1.0);
        assert!(camera.validate_viewport().is_err());
        camera.viewport = Rect::new(0.8, 0.0, 0.5, 1.0);
        assert!(camera.validate_viewport().is_err());
    }

    #[test]
    fn test_orthographic_projection_maps_edges() {
        let camera = Camera::new_orthographic(10.0, 0.1, 100.0);
        let p = camera.projection_matrix(2.0).transform_point(Vec3::new(10.0, 5.0, -1.0));
        assert!((p.x - 1.0).abs() < 1e-5);
        assert!((p.y - 1.0).abs() < 1e-5);
    }
}
