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

//! The per-scene registry of active renderables and lights.

use crate::components::{ComponentState, LightComponent};
use crate::renderable::{PrepareStats, Renderable};
use duality_core::math::Frustum;
use duality_core::renderer::{LightParameters, RenderOperationList, VisibilityFlags};
use std::cell::RefCell;
use std::rc::Rc;

/// A renderable shared between its scene object and the [`Stage`].
pub type SharedRenderable = Rc<RefCell<dyn Renderable>>;

/// A light shared between its scene object and the [`Stage`].
pub type SharedLight = Rc<RefCell<LightComponent>>;

/// Identifies a renderable registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderableId(u64);

/// Identifies a light registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LightId(u64);

/// Holds the components a scene currently renders.
///
/// Registration happens from component activation and deactivation on the frame
/// thread. Iteration follows registration order, so a fixed registration sequence
/// always produces the same operation order.
#[derive(Debug, Default)]
pub struct Stage {
    renderables: Vec<(RenderableId, SharedRenderable)>,
    lights: Vec<(LightId, SharedLight)>,
    next_id: u64,
}

impl Stage {
    /// Creates an empty stage.
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    /// Activates a renderable. Registering the same component twice returns its
    /// existing ID.
    pub fn register_renderable(&mut self, renderable: SharedRenderable) -> RenderableId {
        if let Some((id, _)) = self
            .renderables
            .iter()
            .find(|(_, r)| Rc::ptr_eq(r, &renderable))
        {
            return *id;
        }
        let id = RenderableId(self.allocate_id());
        renderable.borrow_mut().set_state(ComponentState::Active);
        self.renderables.push((id, renderable));
        log::debug!("Registered renderable {id:?}");
        id
    }

    /// Deactivates a renderable and hands it back. Unknown IDs return `None`.
    pub fn deregister_renderable(&mut self, id: RenderableId) -> Option<SharedRenderable> {
        let index = self.renderables.iter().position(|(rid, _)| *rid == id)?;
        let (_, renderable) = self.renderables.remove(index);
        renderable.borrow_mut().set_state(ComponentState::Inactive);
        log::debug!("Deregistered renderable {id:?}");
        Some(renderable)
    }

    /// Activates a light. Registering the same light twice returns its existing ID.
    pub fn register_light(&mut self, light: SharedLight) -> LightId {
        if let Some((id, _)) = self.lights.iter().find(|(_, l)| Rc::ptr_eq(l, &light)) {
            return *id;
        }
        let id = LightId(self.allocate_id());
        light.borrow_mut().set_state(ComponentState::Active);
        self.lights.push((id, light));
        log::debug!("Registered light {id:?}");
        id
    }

    /// Deactivates a light and hands it back. Unknown IDs return `None`.
    pub fn deregister_light(&mut self, id: LightId) -> Option<SharedLight> {
        let index = self.lights.iter().position(|(lid, _)| *lid == id)?;
        let (_, light) = self.lights.remove(index);
        light.borrow_mut().set_state(ComponentState::Inactive);
        log::debug!("Deregistered light {id:?}");
        Some(light)
    }

    /// Number of active renderables.
    pub fn renderable_count(&self) -> usize {
        self.renderables.len()
    }

    /// Number of active lights, enabled or not.
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }

    /// Active renderables in registration order.
    pub fn renderables(&self) -> impl Iterator<Item = &SharedRenderable> {
        self.renderables.iter().map(|(_, r)| r)
    }

    /// Asks every active renderable in `mask` to append its operations.
    ///
    /// Renderables outside the mask count as culled. A renderable that is already
    /// borrowed elsewhere is skipped for this frame.
    pub fn prepare_render_operations(
        &self,
        frustum: Option<&Frustum>,
        mask: VisibilityFlags,
        operations: &mut RenderOperationList,
    ) -> PrepareStats {
        let mut stats = PrepareStats::default();
        for (id, shared) in &self.renderables {
            let Ok(mut renderable) = shared.try_borrow_mut() else {
                log::warn!("Renderable {id:?} is borrowed during render preparation; skipped");
                stats.skipped += 1;
                continue;
            };
            if !renderable.visibility().intersects(mask) {
                stats.culled += 1;
                continue;
            }
            stats += renderable.prepare_render_operations(frustum, operations);
        }
        stats
    }

    /// Appends the parameters of every enabled light, in registration order.
    pub fn collect_lights(&self, out: &mut Vec<LightParameters>) {
        out.extend(
            self.lights
                .iter()
                .filter_map(|(_, l)| l.try_borrow().ok())
                .filter(|l| l.enabled)
                .map(|l| l.parameters()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;
    use crate::renderable::{MeshRenderer, SpriteRenderer};
    use duality_core::math::{Aabb, Vec2, Vec3};
    use duality_core::renderer::{
        LightKind, Material, MaterialId, Mesh, MeshHandle, ResourceRef, SubMesh,
    };

    fn mesh_renderer(handle: u64) -> Rc<RefCell<MeshRenderer>> {
        let material = ResourceRef::new(Material::new(MaterialId(handle), "m"));
        let mesh = ResourceRef::new(Mesh::new(vec![SubMesh::new(
            MeshHandle(handle),
            Aabb::from_center_half_extents(Vec3::ZERO, Vec3::ONE),
        )
        .with_default_material(material)]));
        Rc::new(RefCell::new(MeshRenderer::new(
            Transform::identity().into_shared(),
            Some(mesh),
        )))
    }

    #[test]
    fn test_lifecycle_inactive_active_inactive() {
        let mut stage = Stage::new();
        let r = mesh_renderer(1);
        assert_eq!(r.borrow().state(), ComponentState::Inactive);

        let id = stage.register_renderable(r.clone());
        assert_eq!(r.borrow().state(), ComponentState::Active);
        assert_eq!(stage.register_renderable(r.clone()), id);
        assert_eq!(stage.renderable_count(), 1);

        assert!(stage.deregister_renderable(id).is_some());
        assert_eq!(r.borrow().state(), ComponentState::Inactive);
        assert!(stage.deregister_renderable(id).is_none());
        assert_eq!(stage.renderable_count(), 0);
    }

    #[test]
    fn test_operations_follow_registration_order() {
        let mut stage = Stage::new();
        let ids: Vec<RenderableId> = [3, 1, 2]
            .into_iter()
            .map(|h| stage.register_renderable(mesh_renderer(h)))
            .collect();
        let mut ops = RenderOperationList::new();
        stage.prepare_render_operations(None, VisibilityFlags::ALL, &mut ops);
        let handles: Vec<u64> = ops.iter().map(|o| o.mesh.0).collect();
        assert_eq!(handles, vec![3, 1, 2]);

        stage.deregister_renderable(ids[1]);
        ops.clear();
        stage.prepare_render_operations(None, VisibilityFlags::ALL, &mut ops);
        let handles: Vec<u64> = ops.iter().map(|o| o.mesh.0).collect();
        assert_eq!(handles, vec![3, 2]);
    }

    #[test]
    fn test_visibility_mask_filters_renderables() {
        let mut stage = Stage::new();
        let overlay = Rc::new(RefCell::new(SpriteRenderer::new(
            Transform::identity().into_shared(),
            MeshHandle(50),
            Some(ResourceRef::new(Material::new(MaterialId(50), "hud"))),
            Vec2::ONE,
        )));
        overlay.borrow_mut().base_mut().visibility = VisibilityFlags::SCREEN_OVERLAY;
        stage.register_renderable(overlay);
        stage.register_renderable(mesh_renderer(1));

        let mut ops = RenderOperationList::new();
        let stats = stage.prepare_render_operations(None, VisibilityFlags::default(), &mut ops);
        assert_eq!(ops.len(), 1);
        assert_eq!(stats.culled, 1);

        ops.clear();
        stage.prepare_render_operations(None, VisibilityFlags::ALL, &mut ops);
        assert_eq!(ops.len(), 2);
    }

    #[test]
    fn test_borrowed_renderable_is_skipped() {
        let mut stage = Stage::new();
        let r = mesh_renderer(1);
        stage.register_renderable(r.clone());
        let _guard = r.borrow_mut();
        let mut ops = RenderOperationList::new();
        let stats = stage.prepare_render_operations(None, VisibilityFlags::ALL, &mut ops);
        assert_eq!(stats.skipped, 1);
        assert!(ops.is_empty());
    }

    #[test]
    fn test_lights_collected_when_enabled() {
        let mut stage = Stage::new();
        let sun = Rc::new(RefCell::new(LightComponent::new(
            LightKind::Directional,
            Transform::identity().into_shared(),
        )));
        let lamp = Rc::new(RefCell::new(LightComponent::new(
            LightKind::Point { range: 3.0 },
            Transform::identity().into_shared(),
        )));
        stage.register_light(sun.clone());
        let lamp_id = stage.register_light(lamp.clone());
        assert_eq!(lamp.borrow().state(), ComponentState::Active);

        let mut out = Vec::new();
        stage.collect_lights(&mut out);
        assert_eq!(out.len(), 2);

        sun.borrow_mut().enabled = false;
        out.clear();
        stage.collect_lights(&mut out);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].kind, LightKind::Point { range: 3.0 });

        stage.deregister_light(lamp_id);
        assert_eq!(lamp.borrow().state(), ComponentState::Inactive);
        assert_eq!(stage.light_count(), 1);
    }
}
