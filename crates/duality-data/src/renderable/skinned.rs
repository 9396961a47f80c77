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

use super::mesh::prepare_mesh;
use super::{MeshGeometry, PrepareStats, Renderable, RenderableBase};
use crate::components::SharedTransform;
use duality_core::math::Frustum;
use duality_core::renderer::{Mesh, RenderOperationList, ResourceRef, SkeletonInstance};
use std::rc::Rc;

/// Draws a mesh deformed by a skeleton pose.
///
/// Pairs the same geometry provider as [`MeshRenderer`](super::MeshRenderer) with a
/// pose provider. Every emitted operation carries the pose; without one the mesh is
/// drawn in its bind pose.
#[derive(Debug, Clone)]
pub struct SkinnedMeshRenderer {
    base: RenderableBase,
    geometry: MeshGeometry,
    pose: Option<Rc<dyn SkeletonInstance>>,
}

impl SkinnedMeshRenderer {
    /// Creates a renderer for `mesh` animated by `pose`.
    pub fn new(
        transform: SharedTransform,
        mesh: Option<ResourceRef<Mesh>>,
        pose: Option<Rc<dyn SkeletonInstance>>,
    ) -> Self {
        Self {
            base: RenderableBase::new(transform),
            geometry: MeshGeometry::new(mesh),
            pose,
        }
    }

    /// The geometry provider.
    pub fn geometry_mut(&mut self) -> &mut MeshGeometry {
        &mut self.geometry
    }

    /// Replaces the pose provider.
    pub fn set_pose(&mut self, pose: Option<Rc<dyn SkeletonInstance>>) {
        self.pose = pose;
    }
}

impl Renderable for SkinnedMeshRenderer {
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
        prepare_mesh(
            &self.base,
            &self.geometry,
            self.pose.as_ref(),
            frustum,
            operations,
        )
    }
}
