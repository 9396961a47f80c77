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
use duality_core::math::{
    is_visible, Aabb, BoundingSphere, Frustum, LinearRgba, Mat4, Vec3, FRAC_1_SQRT_2,
};
use duality_core::renderer::{
    Material, MeshHandle, RenderError, RenderOperationList, ResourceRef,
};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// One simulated particle, in the particle system's local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Local position.
    pub position: Vec3,
    /// Edge length of the particle quad.
    pub size: f32,
    /// Tint.
    pub color: LinearRgba,
    /// Remaining lifetime in seconds. Particles with `life <= 0` are dead.
    pub life: f32,
}

impl Particle {
    /// Returns `true` while the particle should be drawn.
    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }
}

/// The simulation behind a [`ParticleRenderer`]. Emission and integration are up to
/// the implementor.
pub trait ParticleSystem: fmt::Debug {
    /// The current particle pool, dead particles included.
    fn particles(&self) -> &[Particle];

    /// Incremented whenever the particle set changes.
    fn generation(&self) -> u64;
}

/// Draws every live particle of a system as a quad, one operation per particle.
#[derive(Debug, Clone)]
pub struct ParticleRenderer {
    base: RenderableBase,
    system: Rc<RefCell<dyn ParticleSystem>>,
    quad_mesh: MeshHandle,
    material: Option<ResourceRef<Material>>,
}

impl ParticleRenderer {
    /// Creates a renderer for `system`.
    ///
    /// A particle renderer is meaningless without its system, so a missing one is
    /// rejected as an invalid argument.
    pub fn new(
        transform: SharedTransform,
        system: Option<Rc<RefCell<dyn ParticleSystem>>>,
        quad_mesh: MeshHandle,
        material: Option<ResourceRef<Material>>,
    ) -> Result<Self, RenderError> {
        let system = system.ok_or_else(|| {
            RenderError::invalid_argument("system", "a particle renderer requires a particle system")
        })?;
        Ok(Self {
            base: RenderableBase::new(transform),
            system,
            quad_mesh,
            material,
        })
    }

    /// Rebinds the renderer to another system. `None` is rejected and keeps the old one.
    pub fn set_system(
        &mut self,
        system: Option<Rc<RefCell<dyn ParticleSystem>>>,
    ) -> Result<(), RenderError> {
        match system {
            Some(system) => {
                self.system = system;
                self.base.bounds.invalidate();
                Ok(())
            }
            None => Err(RenderError::invalid_argument(
                "system",
                "a particle renderer requires a particle system",
            )),
        }
    }

    /// Replaces the material shared by all particles.
    pub fn set_material(&mut self, material: Option<ResourceRef<Material>>) {
        self.material = material;
    }

    fn local_bounds(particles: &[Particle]) -> (BoundingSphere, Aabb) {
        let aabb = particles
            .iter()
            .filter(|p| p.is_alive())
            .fold(Aabb::INVALID, |acc, p| {
                let half = Vec3::splat(p.size * 0.5);
                acc.merge(&Aabb::from_center_half_extents(p.position, half))
            });
        (BoundingSphere::from_aabb(&aabb), aabb)
    }
}

impl Renderable for ParticleRenderer {
    fn base(&self) -> &RenderableBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut RenderableBase {
        &mut self.base
    }

    fn update_bounds(&mut self) {
        let Ok(system) = self.system.try_borrow() else {
            log::debug!("Particle system is borrowed; bounds kept from the last update");
            return;
        };
        self.base
            .refresh_bounds(system.generation(), || Self::local_bounds(system.particles()));
    }

    fn prepare_render_operations(
        &mut self,
        frustum: Option<&Frustum>,
        operations: &mut RenderOperationList,
    ) -> PrepareStats {
        let mut stats = PrepareStats::default();
        let Ok(system) = self.system.try_borrow() else {
            log::warn!("Particle system is borrowed during render preparation; skipped");
            stats.skipped = 1;
            return stats;
        };
        self.base
            .refresh_bounds(system.generation(), || Self::local_bounds(system.particles()));
        let live = system.particles().iter().filter(|p| p.is_alive());

        if !is_visible(frustum, &self.base.bounds.world_sphere()) {
            stats.culled = live.count();
            return stats;
        }
        let Some(material) = self.material.as_ref().and_then(|m| m.get()) else {
            log::trace!("Skipping particle renderer: material not available");
            stats.skipped = live.count();
            return stats;
        };

        let world = self.base.bounds.world_matrix();
        let scale = world.max_scale();
        for particle in live {
            // Radius reaches the quad corners, not just its edges.
            let sphere = BoundingSphere::new(
                world.transform_point(particle.position),
                particle.size * FRAC_1_SQRT_2 * scale,
            );
            if !is_visible(frustum, &sphere) {
                stats.culled += 1;
                continue;
            }
            let transform = world
                * Mat4::from_translation(particle.position)
                * Mat4::from_scale(Vec3::splat(particle.size));
            operations.add(
                self.quad_mesh,
                transform,
                Rc::clone(&material),
                None,
                false,
                self.base.cast_shadows,
            );
            stats.emitted += 1;
        }
        stats
    }
}
