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

//! Lazily recomputed local bounds with per-frame world transformation.

use crate::components::Transform;
use duality_core::math::{Aabb, BoundingSphere, Mat4};

/// Caches a renderable's bounding volumes.
///
/// Local bounds come from mesh or particle data and are expensive to rebuild, so they
/// are recomputed only when the owning transform's version or the content generation
/// differs from the last computation. The cheap world-space transform of the cached
/// local bounds runs on every update.
#[derive(Debug, Clone, Default)]
pub struct BoundsCache {
    local_sphere: BoundingSphere,
    local_box: Aabb,
    world_sphere: BoundingSphere,
    world_box: Aabb,
    world_matrix: Mat4,
    seen: Option<(u64, u64)>,
    recomputations: u64,
}

impl BoundsCache {
    /// Creates a dirty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if the local bounds must be rebuilt.
    pub fn is_dirty(&self, transform_version: u64, content_generation: u64) -> bool {
        self.seen != Some((transform_version, content_generation))
    }

    /// Forces a rebuild on the next update.
    pub fn invalidate(&mut self) {
        self.seen = None;
    }

    /// Brings the cache up to date. Returns `true` if the local bounds were rebuilt.
    pub fn update<F>(&mut self, transform: &Transform, content_generation: u64, compute_local: F) -> bool
    where
        F: FnOnce() -> (BoundingSphere, Aabb),
    {
        let rebuilt = self.is_dirty(transform.version(), content_generation);
        if rebuilt {
            let (sphere, aabb) = compute_local();
            self.local_sphere = sphere;
            self.local_box = aabb;
            self.seen = Some((transform.version(), content_generation));
            self.recomputations += 1;
        }
        self.world_matrix = transform.to_mat4();
        self.world_sphere = self.local_sphere.transform(&self.world_matrix);
        self.world_box = self.local_box.transform(&self.world_matrix);
        rebuilt
    }

    /// Local-space sphere from the last rebuild.
    pub fn local_sphere(&self) -> BoundingSphere {
        self.local_sphere
    }

    /// World-space sphere from the last update.
    pub fn world_sphere(&self) -> BoundingSphere {
        self.world_sphere
    }

    /// World-space box from the last update.
    pub fn world_box(&self) -> Aabb {
        self.world_box
    }

    /// The model matrix used by the last update.
    pub fn world_matrix(&self) -> Mat4 {
        self.world_matrix
    }

    /// How many times the local bounds were rebuilt.
    pub fn recomputations(&self) -> u64 {
        self.recomputations
    }
}
