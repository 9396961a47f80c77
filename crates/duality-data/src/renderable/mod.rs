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

//! The renderable capability and its variants.
//!
//! Every drawable component implements [`Renderable`]: once per frame the `Stage` asks
//! it to append one [`RenderOperation`] per visible sub-unit (submesh, particle or
//! sprite quad) to the shared list, refreshing its bounds on the way.
//!
//! The variants are built by composition. [`MeshGeometry`] is the geometry provider
//! shared by [`MeshRenderer`] and [`SkinnedMeshRenderer`]; the skinned variant adds a
//! pose provider.
//!
//! [`RenderOperation`]: duality_core::renderer::RenderOperation

mod bounds;
mod mesh;
mod particle;
mod skinned;
mod sprite;

pub use self::bounds::BoundsCache;
pub use self::mesh::{MeshGeometry, MeshRenderer};
pub use self::particle::{Particle, ParticleRenderer, ParticleSystem};
pub use self::skinned::SkinnedMeshRenderer;
pub use self::sprite::SpriteRenderer;

use crate::components::{ComponentState, SharedTransform};
use duality_core::math::{Aabb, BoundingSphere, Frustum};
use duality_core::renderer::{RenderOperationList, VisibilityFlags};
use std::fmt;
use std::ops::AddAssign;

/// Counts of what a preparation step did with the drawable units it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PrepareStats {
    /// Units that produced an operation.
    pub emitted: usize,
    /// Units rejected by the frustum or the visibility mask.
    pub culled: usize,
    /// Units dropped because a mesh or material was not available.
    pub skipped: usize,
}

impl AddAssign for PrepareStats {
    fn add_assign(&mut self, rhs: Self) {
        self.emitted += rhs.emitted;
        self.culled += rhs.culled;
        self.skipped += rhs.skipped;
    }
}

/// State shared by every renderable variant.
#[derive(Debug, Clone)]
pub struct RenderableBase {
    /// Placement of the owning scene object.
    pub transform: SharedTransform,
    /// Groups this renderable belongs to.
    pub visibility: VisibilityFlags,
    /// Whether emitted operations cast shadows.
    pub cast_shadows: bool,
    /// Cached bounding volumes.
    pub bounds: BoundsCache,
    state: ComponentState,
}

impl RenderableBase {
    /// Creates an inactive base in the default visibility groups.
    pub fn new(transform: SharedTransform) -> Self {
        Self {
            transform,
            visibility: VisibilityFlags::default(),
            cast_shadows: true,
            bounds: BoundsCache::new(),
            state: ComponentState::Inactive,
        }
    }

    /// Updates the bounds cache against the current transform.
    pub fn refresh_bounds<F>(&mut self, content_generation: u64, compute_local: F) -> bool
    where
        F: FnOnce() -> (BoundingSphere, Aabb),
    {
        let transform = self.transform.borrow();
        self.bounds.update(&transform, content_generation, compute_local)
    }
}

/// A component that contributes render operations.
pub trait Renderable: fmt::Debug {
    /// Shared state.
    fn base(&self) -> &RenderableBase;

    /// Shared state, mutably.
    fn base_mut(&mut self) -> &mut RenderableBase;

    /// Rebuilds local bounds if stale and re-transforms them into world space.
    fn update_bounds(&mut self);

    /// Refreshes the bounds, then appends one operation per visible, resolvable
    /// sub-unit. Culling and emitted transforms both use the transform as it is now.
    ///
    /// `None` for `frustum` disables culling. A renderable without data contributes
    /// nothing and never fails.
    fn prepare_render_operations(
        &mut self,
        frustum: Option<&Frustum>,
        operations: &mut RenderOperationList,
    ) -> PrepareStats;

    /// The lifecycle state.
    fn state(&self) -> ComponentState {
        self.base().state
    }

    /// Called by the `Stage` on registration and deregistration.
    fn set_state(&mut self, state: ComponentState) {
        self.base_mut().state = state;
    }

    /// Groups this renderable belongs to.
    fn visibility(&self) -> VisibilityFlags {
        self.base().visibility
    }

    /// World-space culling sphere as of the last [`update_bounds`](Self::update_bounds).
    fn world_bounding_sphere(&self) -> BoundingSphere {
        self.base().bounds.world_sphere()
    }
}
