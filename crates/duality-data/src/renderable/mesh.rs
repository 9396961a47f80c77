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
use duality_core::math::{is_visible, Aabb, BoundingSphere, Frustum, Mat4};
use duality_core::renderer::{
    Material, Mesh, RenderOperationList, ResourceRef, SkeletonInstance, SubMesh,
};
use std::rc::Rc;

/// The geometry provider: a mesh plus per-submesh material overrides.
///
/// Material resolution for submesh `i`: the override in slot `i` if it is set and
/// loaded, otherwise the submesh's default material if loaded, otherwise the submesh is
/// skipped.
#[derive(Debug, Clone, Default)]
pub struct MeshGeometry {
    mesh: Option<ResourceRef<Mesh>>,
    materials: Vec<Option<ResourceRef<Material>>>,
    revision: u64,
    /// Requests the backend's alternate draw mode.
    pub custom_draw: bool,
}

impl MeshGeometry {
    /// Creates a provider for `mesh` with no material overrides.
    pub fn new(mesh: Option<ResourceRef<Mesh>>) -> Self {
        Self {
            mesh,
            ..Self::default()
        }
    }

    /// The assigned mesh.
    pub fn mesh(&self) -> Option<&ResourceRef<Mesh>> {
        self.mesh.as_ref()
    }

    /// Assigns another mesh. Local bounds are rebuilt on the next update.
    pub fn set_mesh(&mut self, mesh: Option<ResourceRef<Mesh>>) {
        self.mesh = mesh;
        self.revision = self.revision.wrapping_add(1);
    }

    /// Replaces all overrides. Slot `i` applies to submesh `i`.
    pub fn set_materials(&mut self, materials: Vec<Option<ResourceRef<Material>>>) {
        self.materials = materials;
    }

    /// Sets the override for one submesh, growing the override array as needed.
    pub fn set_material(&mut self, index: usize, material: Option<ResourceRef<Material>>) {
        if index >= self.materials.len() {
            self.materials.resize(index + 1, None);
        }
        self.materials[index] = material;
    }

    /// The override array.
    pub fn materials(&self) -> &[Option<ResourceRef<Material>>] {
        &self.materials
    }

    /// Resolves the material for submesh `index`.
    pub fn resolve_material(&self, index: usize, submesh: &SubMesh) -> Option<Rc<Material>> {
        self.materials
            .get(index)
            .and_then(|slot| slot.as_ref())
            .and_then(|m| m.get())
            .or_else(|| submesh.default_material.as_ref().and_then(|m| m.get()))
    }

    /// Changes whenever the mesh is reassigned, loaded or unloaded.
    pub fn content_generation(&self) -> u64 {
        let mesh_generation = self.mesh.as_ref().map_or(0, |m| m.generation());
        (self.revision << 32) ^ mesh_generation
    }

    /// Local bounds of the whole mesh; empty when no mesh is loaded.
    pub fn local_bounds(&self) -> (BoundingSphere, Aabb) {
        match self.mesh.as_ref().and_then(|m| m.get()) {
            Some(mesh) => (mesh.bounding_sphere(), mesh.bounding_box()),
            None => (BoundingSphere::EMPTY, Aabb::INVALID),
        }
    }

    /// Culls each submesh against `frustum` and emits one operation per survivor.
    pub fn emit(
        &self,
        world: &Mat4,
        frustum: Option<&Frustum>,
        skeleton: Option<&Rc<dyn SkeletonInstance>>,
        cast_shadows: bool,
        operations: &mut RenderOperationList,
    ) -> PrepareStats {
        let mut stats = PrepareStats::default();
        let Some(mesh_ref) = self.mesh.as_ref() else {
            return stats;
        };
        let Some(mesh) = mesh_ref.get() else {
            log::trace!("Skipping renderer: mesh not loaded");
            stats.skipped += 1;
            return stats;
        };

        for (index, submesh) in mesh.submeshes.iter().enumerate() {
            let world_sphere = submesh.bounding_sphere.transform(world);
            if !is_visible(frustum, &world_sphere) {
                stats.culled += 1;
                continue;
            }
            let Some(material) = self.resolve_material(index, submesh) else {
                log::trace!("Skipping submesh {index}: no usable material");
                stats.skipped += 1;
                continue;
            };
            operations.add(
                submesh.handle,
                *world,
                material,
                skeleton.cloned(),
                self.custom_draw,
                cast_shadows,
            );
            stats.emitted += 1;
        }
        stats
    }

    fn submesh_count(&self) -> usize {
        self.mesh
            .as_ref()
            .and_then(|m| m.get())
            .map_or(0, |m| m.submeshes.len())
    }
}

/// Draws a static mesh.
#[derive(Debug, Clone)]
pub struct MeshRenderer {
    base: RenderableBase,
    geometry: MeshGeometry,
}

impl MeshRenderer {
    /// Creates a renderer for `mesh` placed by `transform`.
    pub fn new(transform: SharedTransform, mesh: Option<ResourceRef<Mesh>>) -> Self {
        Self {
            base: RenderableBase::new(transform),
            geometry: MeshGeometry::new(mesh),
        }
    }

    /// The geometry provider.
    pub fn geometry(&self) -> &MeshGeometry {
        &self.geometry
    }

    /// The geometry provider, mutably.
    pub fn geometry_mut(&mut self) -> &mut MeshGeometry {
        &mut self.geometry
    }
}

impl Renderable for MeshRenderer {
    fn base(&self) -> &RenderableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RenderableBase {
        &mut self.base
    }

    fn update_bounds(&mut self) {
        let geometry = &self.geometry;
        self.base
            .refresh_bounds(geometry.content_generation(), || geometry.local_bounds());
    }

    fn prepare_render_operations(
        &mut self,
        frustum: Option<&Frustum>,
        operations: &mut RenderOperationList,
    ) -> PrepareStats {
        self.update_bounds();
        prepare_mesh(&self.base, &self.geometry, None, frustum, operations)
    }
}

/// Whole-mesh early out, then per-submesh emission.
pub(super) fn prepare_mesh(
    base: &RenderableBase,
    geometry: &MeshGeometry,
    skeleton: Option<&Rc<dyn SkeletonInstance>>,
    frustum: Option<&Frustum>,
    operations: &mut RenderOperationList,
) -> PrepareStats {
    if !is_visible(frustum, &base.bounds.world_sphere()) {
        return PrepareStats {
            culled: geometry.submesh_count(),
            ..PrepareStats::default()
        };
    }
    geometry.emit(
        &base.bounds.world_matrix(),
        frustum,
        skeleton,
        base.cast_shadows,
        operations,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;
    use duality_core::math::{Vec3, FRAC_PI_2};
    use duality_core::renderer::{MaterialId, MeshHandle};

    fn material(id: u64) -> ResourceRef<Material> {
        ResourceRef::new(Material::new(MaterialId(id), format!("m{id}")))
    }

    fn two_submesh_mesh(defaults: [Option<ResourceRef<Material>>; 2]) -> ResourceRef<Mesh> {
        let [a, b] = defaults;
        let unit = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE);
        let mut first = SubMesh::new(MeshHandle(1), unit);
        first.default_material = a;
        let mut second = SubMesh::new(MeshHandle(2), unit);
        second.default_material = b;
        ResourceRef::new(Mesh::new(vec![first, second]))
    }

    fn frustum_looking_down_neg_z() -> Frustum {
        Frustum::from_view_projection(&Mat4::perspective_rh_zo(FRAC_PI_2, 1.0, 0.1, 100.0))
    }

    fn renderer_at(z: f32, mesh: ResourceRef<Mesh>) -> MeshRenderer {
        let transform = Transform::from_translation(Vec3::new(0.0, 0.0, z)).into_shared();
        let mut r = MeshRenderer::new(transform, Some(mesh));
        r.update_bounds();
        r
    }

    #[test]
    fn test_two_submeshes_in_view_emit_two_operations() {
        let mut r = renderer_at(-10.0, two_submesh_mesh([Some(material(1)), Some(material(2))]));
        let mut ops = RenderOperationList::new();
        let stats = r.prepare_render_operations(Some(&frustum_looking_down_neg_z()), &mut ops);
        assert_eq!(stats.emitted, 2);
        assert_eq!(ops.len(), 2);
        assert_eq!(ops.get(0).map(|o| o.mesh), Some(MeshHandle(1)));
        assert_eq!(ops.get(1).map(|o| o.mesh), Some(MeshHandle(2)));
        assert_eq!(ops.get(0).map(|o| o.transform), ops.get(1).map(|o| o.transform));
        assert_eq!(ops.get(1).map(|o| o.material.id), Some(MaterialId(2)));
    }

    #[test]
    fn test_unavailable_material_without_fallback_is_skipped() {
        let missing = ResourceRef::unavailable();
        let mut r = renderer_at(-10.0, two_submesh_mesh([Some(material(1)), None]));
        r.geometry_mut().set_material(1, Some(missing));
        let mut ops = RenderOperationList::new();
        let stats = r.prepare_render_operations(Some(&frustum_looking_down_neg_z()), &mut ops);
        assert_eq!(ops.len(), 1);
        assert_eq!(ops.get(0).map(|o| o.mesh), Some(MeshHandle(1)));
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_override_falls_back_to_default() {
        let unloaded = material(9);
        unloaded.unload();
        let mut r = renderer_at(-10.0, two_submesh_mesh([Some(material(1)), Some(material(2))]));
        r.geometry_mut().set_materials(vec![Some(material(7)), Some(unloaded)]);
        let mut ops = RenderOperationList::new();
        r.prepare_render_operations(None, &mut ops);
        let ids: Vec<MaterialId> = ops.iter().map(|o| o.material.id).collect();
        assert_eq!(ids, vec![MaterialId(7), MaterialId(2)]);
    }

    #[test]
    fn test_behind_camera_is_culled_but_null_frustum_is_not() {
        let mut r = renderer_at(10.0, two_submesh_mesh([Some(material(1)), Some(material(2))]));
        let mut ops = RenderOperationList::new();
        let stats = r.prepare_render_operations(Some(&frustum_looking_down_neg_z()), &mut ops);
        assert_eq!(ops.len(), 0);
        assert_eq!(stats.culled, 2);

        let stats = r.prepare_render_operations(None, &mut ops);
        assert_eq!(ops.len(), 2);
        assert_eq!(stats.emitted, 2);
    }

    #[test]
    fn test_no_mesh_contributes_nothing() {
        let transform = Transform::identity().into_shared();
        let mut r = MeshRenderer::new(transform, None);
        r.update_bounds();
        let mut ops = RenderOperationList::new();
        assert_eq!(r.prepare_render_operations(None, &mut ops), PrepareStats::default());

        r.geometry_mut().set_mesh(Some(ResourceRef::unavailable()));
        r.update_bounds();
        let stats = r.prepare_render_operations(None, &mut ops);
        assert!(ops.is_empty());
        assert_eq!(stats.skipped, 1);
    }

    #[test]
    fn test_bounds_rebuilt_on_transform_or_mesh_change() {
        let transform = Transform::identity().into_shared();
        let mesh = two_submesh_mesh([None, None]);
        let mut r = MeshRenderer::new(transform.clone(), Some(mesh.clone()));
        r.update_bounds();
        r.update_bounds();
        assert_eq!(r.base().bounds.recomputations(), 1);

        transform.borrow_mut().set_translation(Vec3::new(0.0, 0.0, -3.0));
        r.update_bounds();
        assert_eq!(r.base().bounds.recomputations(), 2);
        assert_eq!(r.world_bounding_sphere().center, Vec3::new(0.0, 0.0, -3.0));

        mesh.unload();
        r.update_bounds();
        assert_eq!(r.base().bounds.recomputations(), 3);
        assert_eq!(r.world_bounding_sphere().radius, 0.0);
    }

    #[test]
    fn test_operations_use_the_current_transform() {
        let transform = Transform::identity().into_shared();
        let mut r = MeshRenderer::new(
            transform.clone(),
            Some(two_submesh_mesh([Some(material(1)), Some(material(2))])),
        );
        let mut ops = RenderOperationList::new();
        r.prepare_render_operations(None, &mut ops);
        assert_eq!(ops.get(0).map(|op| op.transform.translation()), Some(Vec3::ZERO));

        transform.borrow_mut().set_translation(Vec3::new(0.0, 0.0, -10.0));
        ops.clear();
        let stats = r.prepare_render_operations(Some(&frustum_looking_down_neg_z()), &mut ops);
        assert_eq!(stats.emitted, 2);
        assert!(ops.iter().all(|op| op.transform.translation() == Vec3::new(0.0, 0.0, -10.0)));
    }
}
