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

// Duality sandbox
// Renders a small animated scene through the headless backend and logs frame stats.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use duality_core::math::{Aabb, LinearRgba, Mat4, Quaternion, Rect, Vec2, Vec3, FRAC_PI_4};
use duality_core::renderer::{
    EffectParameter, GraphicsBackend, HeadlessBackend, LightKind, Material, MaterialId, Mesh,
    MeshHandle, Quad, QuadBatchKey, ResourceRef, SkeletonInstance, SpriteFlags, SubMesh,
    TextureId,
};
use duality_core::RenderSettings;
use duality_data::components::{Camera, LightComponent, Transform};
use duality_data::renderable::{
    MeshRenderer, Particle, ParticleRenderer, ParticleSystem, SkinnedMeshRenderer, SpriteRenderer,
};
use duality_data::Stage;
use duality_lanes::{DeferredRenderer, FullscreenEffect, RenderLane};

const FRAMES: u32 = 4;
const QUAD_MESH: MeshHandle = MeshHandle(1);

#[derive(Debug)]
struct RestPose {
    bones: Vec<Mat4>,
}

impl SkeletonInstance for RestPose {
    fn bone_count(&self) -> usize {
        self.bones.len()
    }

    fn bone_matrices(&self) -> &[Mat4] {
        &self.bones
    }
}

/// Sparks rising from the origin, one new spark per step.
#[derive(Debug, Default)]
struct Fountain {
    particles: Vec<Particle>,
    generation: u64,
}

impl Fountain {
    fn step(&mut self, dt: f32) {
        for p in &mut self.particles {
            p.position += Vec3::new(0.0, dt, 0.0);
            p.life -= dt;
        }
        self.particles.retain(Particle::is_alive);
        let x = (self.generation % 5) as f32 * 0.2 - 0.4;
        self.particles.push(Particle {
            position: Vec3::new(x, 0.0, 0.0),
            size: 0.1,
            color: LinearRgba::rgb(1.0, 0.6, 0.2),
            life: 1.5,
        });
        self.generation += 1;
    }
}

impl ParticleSystem for Fountain {
    fn particles(&self) -> &[Particle] {
        &self.particles
    }

    fn generation(&self) -> u64 {
        self.generation
    }
}

fn material(id: u64, name: &str, sort_key: u32, texture: usize) -> ResourceRef<Material> {
    ResourceRef::new(
        Material::new(MaterialId(id), name)
            .with_sort_key(sort_key)
            .with_texture(TextureId(texture)),
    )
}

fn load_settings() -> Result<RenderSettings> {
    match std::env::args().nth(1).map(PathBuf::from) {
        Some(path) => RenderSettings::load(&path)
            .with_context(|| format!("Failed to load render settings from {}", path.display())),
        None => {
            log::info!("No settings file given, using defaults");
            Ok(RenderSettings::default())
        }
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let settings = load_settings()?;
    let mut renderer =
        DeferredRenderer::new(settings).context("Failed to create the deferred renderer")?;
    renderer.post_effects_mut().add_effect(Box::new(
        FullscreenEffect::new("tonemap").with_parameter(EffectParameter::float("exposure", 1.0)),
    ))?;
    log::info!("Render strategy: {}", renderer.strategy_name());

    // --- Scene ---
    let stone = material(1, "stone", 0, 10);
    let metal = material(2, "metal", 1, 11);
    let skin = material(3, "skin", 2, 12);
    let spark = material(4, "spark", 3, 13);

    let cube = Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5));
    let statue = ResourceRef::new(Mesh::new(vec![
        SubMesh::new(MeshHandle(10), cube).with_default_material(stone),
        SubMesh::new(MeshHandle(11), cube).with_default_material(metal.clone()),
    ]));
    let character = ResourceRef::new(Mesh::new(vec![
        SubMesh::new(MeshHandle(20), cube).with_default_material(skin),
    ]));

    let statue_transform = Transform::from_translation(Vec3::new(-1.5, 0.0, 0.0)).into_shared();
    let fountain = Rc::new(RefCell::new(Fountain::default()));
    let pose: Rc<dyn SkeletonInstance> = Rc::new(RestPose {
        bones: vec![Mat4::IDENTITY; 4],
    });

    let mut stage = Stage::new();
    stage.register_renderable(Rc::new(RefCell::new(MeshRenderer::new(
        statue_transform.clone(),
        Some(statue),
    ))));
    stage.register_renderable(Rc::new(RefCell::new(SkinnedMeshRenderer::new(
        Transform::from_translation(Vec3::new(1.5, 0.0, 0.0)).into_shared(),
        Some(character),
        Some(pose),
    ))));
    stage.register_renderable(Rc::new(RefCell::new(
        ParticleRenderer::new(
            Transform::from_translation(Vec3::new(0.0, 0.5, 0.0)).into_shared(),
            Some(fountain.clone()),
            QUAD_MESH,
            Some(spark),
        )
        .context("Failed to create the particle renderer")?,
    )));
    stage.register_renderable(Rc::new(RefCell::new(SpriteRenderer::new(
        Transform::from_translation(Vec3::new(0.0, 1.5, -2.0)).into_shared(),
        QUAD_MESH,
        Some(metal),
        Vec2::new(2.0, 1.0),
    ))));

    stage.register_light(Rc::new(RefCell::new(
        LightComponent::new(
            LightKind::Directional,
            Transform::new(
                Vec3::ZERO,
                Quaternion::from_axis_angle(Vec3::X, -FRAC_PI_4),
                Vec3::ONE,
            )
            .into_shared(),
        )
        .with_color(LinearRgba::rgb(1.0, 0.95, 0.9), 2.0),
    )));
    stage.register_light(Rc::new(RefCell::new(
        LightComponent::new(
            LightKind::Point { range: 6.0 },
            Transform::from_translation(Vec3::new(0.0, 2.0, 1.0)).into_shared(),
        )
        .with_color(LinearRgba::rgb(0.3, 0.5, 1.0), 4.0),
    )));

    let camera = Camera::default()
        .with_transform(Transform::from_translation(Vec3::new(0.0, 1.0, 6.0)))
        .with_viewport(Rect::new(0.0, 0.0, 1.0, 1.0));
    let hud = QuadBatchKey {
        texture: Some(TextureId(100)),
        flags: SpriteFlags::ALPHA_BLEND,
        smooth: false,
    };

    // --- Frames ---
    let mut backend = HeadlessBackend::new();
    for frame in 0..FRAMES {
        fountain.borrow_mut().step(0.25);
        statue_transform
            .borrow_mut()
            .set_rotation(Quaternion::from_axis_angle(Vec3::Y, frame as f32 * 0.3));
        for slot in 0..3 {
            let position = Vec2::new(16.0 + slot as f32 * 40.0, 16.0);
            renderer.queue_sprite(
                hud,
                &Quad::rect(position, Vec2::new(32.0, 32.0), 0.0, LinearRgba::WHITE),
            );
        }
        if frame == 2 {
            renderer.resize(1920, 1080)?;
        }

        let stats = renderer.render_frame(&mut backend, &stage, Some(&camera))?;
        log::info!("{stats}");
        backend.take_commands();
    }

    renderer.release(&mut backend);
    backend.shutdown();
    let stats = renderer.render_frame(&mut backend, &stage, Some(&camera))?;
    log::info!(
        "After shutdown: {} draw calls, backend alive: {}",
        stats.draw_calls,
        backend.is_alive()
    );
    Ok(())
}
