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

use super::{PrepareStats, Renderable, RenderableBase};
use crate::components::SharedTransform;
use duality_core::math::{Aabb, BoundingSphere, Frustum, Mat4, Vec2, Vec3};
use duality_core::renderer::{Material, MeshHandle, RenderOperationList, ResourceRef};

/// Draws a textured rectangle in the object's XY plane.
///
/// Sprites are 2D content and are never culled against the 3D frustum.
#[derive(Debug, Clone)]
pub struct SpriteRenderer {
    base: RenderableBase,
    quad_mesh: MeshHandle,
    material: Option<ResourceRef<Material>>,
    size: Vec2,
    revision: u64,
}

impl SpriteRenderer {
    /// Creates a sprite drawn with the unit quad `quad_mesh`, stretched to `size`.
    pub fn new(
        transform: SharedTransform,
        quad_mesh: MeshHandle,
        material: Option<ResourceRef<Material>>,
        size: Vec2,
    ) -> Self {
        Self {
            base: RenderableBase::new(transform),
            quad_mesh,
            material,
            size,
            revision: 0,
        }
    }

    /// The sprite size in local units.
    pub fn size(&self) -> Vec2 {
        self.size
    }

    /// Resizes the sprite.
    pub fn set_size(&mut self, size: Vec2) {
        self.size = size;
        self.revision = self.revision.wrapping_add(1);
    }
}

impl Renderable for SpriteRenderer {
    fn base(&self) -> &RenderableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RenderableBase {
        &mut self.base
    }

    fn update_bounds(&mut self) {
        let half = Vec3::new(self.size.x * 0.5, self.size.y * 0.5, 0.0);
        self.base.refresh_bounds(self.revision, || {
            let aabb = Aabb::from_center_half_extents(Vec3::ZERO, half);
            (BoundingSphere::from_aabb(&aabb), aabb)
        });
    }

    fn prepare_render_operations(
        &mut self,
        _frustum: Option<&Frustum>,
        operations: &mut RenderOperationList,
    ) -> PrepareStats {
        self.update_bounds();
        let Some(material) = self.material.as_ref().and_then(|m| m.get()) else {
            return PrepareStats {
                skipped: 1,
                ..PrepareStats::default()
            };
        };
        let transform = self.base.bounds.world_matrix()
            * Mat4::from_scale(Vec3::new(self.size.x, self.size.y, 1.0));
        operations.add(
            self.quad_mesh,
            transform,
            material,
            None,
            false,
            self.base.cast_shadows,
        );
        PrepareStats {
            emitted: 1,
            ..PrepareStats::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;
    use duality_core::renderer::MaterialId;

    #[test]
    fn test_sprite_ignores_frustum() {
        let material = ResourceRef::new(Material::new(MaterialId(5), "sprite"));
        let transform = Transform::from_translation(Vec3::new(0.0, 0.0, 50.0)).into_shared();
        let mut sprite = SpriteRenderer::new(transform, MeshHandle(7), Some(material), Vec2::new(4.0, 2.0));
        sprite.update_bounds();

        let frustum = Frustum::from_view_projection(&Mat4::perspective_rh_zo(1.0, 1.0, 0.1, 10.0));
        assert!(!frustum.intersects_sphere(&sprite.world_bounding_sphere()));

        let mut ops = RenderOperationList::new();
        let stats = sprite.prepare_render_operations(Some(&frustum), &mut ops);
        assert_eq!(stats.emitted, 1);
        let op = ops.get(0).unwrap();
        assert_eq!(op.mesh, MeshHandle(7));
        assert_eq!(op.transform.transform_point(Vec3::new(0.5, 0.5, 0.0)), Vec3::new(2.0, 1.0, 50.0));
    }

    #[test]
    fn test_sprite_without_material_is_skipped() {
        let mut sprite = SpriteRenderer::new(Transform::identity().into_shared(), MeshHandle(7), None, Vec2::ONE);
        sprite.update_bounds();
        let mut ops = RenderOperationList::new();
        assert_eq!(sprite.prepare_render_operations(None, &mut ops).skipped, 1);
        assert!(ops.is_empty());
    }
}
