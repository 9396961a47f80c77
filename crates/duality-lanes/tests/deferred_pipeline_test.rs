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

//! Integration tests for the deferred pipeline, driven through the headless backend.

use duality_core::math::{Aabb, Extent2D, LinearRgba, Rect, Vec2, Vec3};
use duality_core::renderer::{
    BackendCommand, GraphicsBackend, HeadlessBackend, LightKind, Material, MaterialId, Mesh,
    MeshHandle, Quad, QuadBatchKey, RenderError, RenderOperationList, ResourceRef,
    ShaderProgramKind, SpriteFlags, SubMesh, TextureId, VisibilityFlags,
};
use duality_core::settings::RenderSettings;
use duality_data::components::{Camera, LightComponent, Transform};
use duality_data::renderable::{MeshRenderer, Renderable};
use duality_data::Stage;
use duality_lanes::{DeferredRenderer, FullscreenEffect, LaneError, RenderLane, SpriteBatch};
use std::cell::RefCell;
use std::rc::Rc;

fn settings() -> RenderSettings {
    RenderSettings {
        initial_width: 64,
        initial_height: 32,
        ..RenderSettings::default()
    }
}

fn renderer() -> DeferredRenderer {
    DeferredRenderer::new(settings()).unwrap()
}

fn material(id: u64) -> ResourceRef<Material> {
    ResourceRef::new(Material::new(MaterialId(id), format!("material-{id}")))
}

fn unit_box() -> Aabb {
    Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(0.5))
}

/// A renderer in front of the default camera with one submesh per handle.
fn mesh_renderer(at: Vec3, handles: &[u64]) -> Rc<RefCell<MeshRenderer>> {
    let submeshes = handles
        .iter()
        .map(|&h| SubMesh::new(MeshHandle(h), unit_box()).with_default_material(material(h)))
        .collect();
    let mesh = ResourceRef::new(Mesh::new(submeshes));
    Rc::new(RefCell::new(MeshRenderer::new(
        Transform::from_translation(at).into_shared(),
        Some(mesh),
    )))
}

fn drawn_meshes(backend: &HeadlessBackend) -> Vec<MeshHandle> {
    backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            BackendCommand::DrawMesh { mesh, .. } => Some(*mesh),
            _ => None,
        })
        .collect()
}

fn count(backend: &HeadlessBackend, pred: impl Fn(&BackendCommand) -> bool) -> usize {
    backend.commands().iter().filter(|c| pred(c)).count()
}

const IN_FRONT: Vec3 = Vec3::new(0.0, 0.0, -5.0);

// ─────────────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_two_submeshes_yield_two_operations() {
    let mut stage = Stage::new();
    stage.register_renderable(mesh_renderer(IN_FRONT, &[10, 11]));
    let camera = Camera::default();

    let mut ops = RenderOperationList::new();
    let frustum = camera.frustum(2.0);
    assert!(frustum.is_some());
    let prepared = stage.prepare_render_operations(frustum.as_ref(), camera.visibility_mask, &mut ops);
    assert_eq!(prepared.emitted, 2);
    assert_eq!(ops.len(), 2);
    assert_eq!(ops.get(0).map(|op| op.mesh), Some(MeshHandle(10)));
    assert_eq!(ops.get(1).map(|op| op.mesh), Some(MeshHandle(11)));
    assert_eq!(ops.get(0).map(|op| op.transform), ops.get(1).map(|op| op.transform));

    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    let stats = r.render_frame(&mut backend, &stage, Some(&camera)).unwrap();
    assert_eq!(stats.operations, 2);
    assert_eq!(drawn_meshes(&backend), vec![MeshHandle(10), MeshHandle(11)]);
}

#[test]
fn test_unavailable_material_without_fallback_skips_submesh() {
    let no_default = SubMesh::new(MeshHandle(21), unit_box());
    let mesh = ResourceRef::new(Mesh::new(vec![
        SubMesh::new(MeshHandle(20), unit_box()).with_default_material(material(20)),
        no_default,
    ]));
    let renderable = Rc::new(RefCell::new(MeshRenderer::new(
        Transform::from_translation(IN_FRONT).into_shared(),
        Some(mesh),
    )));
    renderable
        .borrow_mut()
        .geometry_mut()
        .set_material(1, Some(ResourceRef::unavailable()));
    let mut stage = Stage::new();
    stage.register_renderable(renderable);

    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    let stats = r
        .render_frame(&mut backend, &stage, Some(&Camera::default()))
        .unwrap();
    assert_eq!(stats.operations, 1);
    assert_eq!(stats.skipped_units, 1);
    assert_eq!(drawn_meshes(&backend), vec![MeshHandle(20)]);
    assert!(backend.is_idle());
}

#[test]
fn test_sprite_overlay_flushes_per_key_run() {
    let t1 = QuadBatchKey {
        texture: Some(TextureId(1)),
        flags: SpriteFlags::ALPHA_BLEND,
        smooth: true,
    };
    let t2 = QuadBatchKey {
        texture: Some(TextureId(2)),
        ..t1
    };
    let quad = Quad::rect(Vec2::new(4.0, 4.0), Vec2::new(8.0, 8.0), 0.0, LinearRgba::WHITE);

    let mut r = renderer();
    r.queue_sprite(t1, &quad);
    r.queue_sprite(t1, &quad);
    r.queue_sprite(t2, &quad);

    let mut backend = HeadlessBackend::new();
    let stats = r
        .render_frame(&mut backend, &Stage::new(), Some(&Camera::default()))
        .unwrap();
    assert_eq!(stats.sprite_flushes, 2);
    let batches: Vec<(QuadBatchKey, usize)> = backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            BackendCommand::DrawQuadBatch { key, quads } => Some((*key, *quads)),
            _ => None,
        })
        .collect();
    assert_eq!(batches, vec![(t1, 2), (t2, 1)]);
    assert_eq!(r.sprites().pending(), 0);

    // Sprites are drawn after the composite, inside the screen pass.
    let commands = backend.commands();
    let composite = commands
        .iter()
        .rposition(|c| matches!(c, BackendCommand::DrawFullscreen))
        .unwrap();
    let first_batch = commands
        .iter()
        .position(|c| matches!(c, BackendCommand::DrawQuadBatch { .. }))
        .unwrap();
    assert!(composite < first_batch);
}

#[test]
fn test_resize_rebuilds_gbuffer_before_next_frame() {
    let mut stage = Stage::new();
    stage.register_renderable(mesh_renderer(IN_FRONT, &[1]));
    let camera = Camera::default();
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();

    r.render_frame(&mut backend, &stage, Some(&camera)).unwrap();
    let first = r.gbuffer().geometry_target().unwrap();
    assert_eq!(backend.render_target(first).unwrap().size, Extent2D::new(64, 32));

    r.resize(128, 64).unwrap();
    r.resize(256, 128).unwrap();
    let stats = r.render_frame(&mut backend, &stage, Some(&camera)).unwrap();
    assert_eq!(stats.operations, 1);

    let second = r.gbuffer().geometry_target().unwrap();
    assert_ne!(first, second);
    assert!(backend.render_target(first).is_none());
    assert_eq!(backend.render_target(second).unwrap().size, Extent2D::new(256, 128));
    assert_eq!(r.gbuffer().generation(), 2);
    assert!(backend.is_idle());
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure semantics
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_missing_camera_issues_no_draw_calls() {
    let mut stage = Stage::new();
    stage.register_renderable(mesh_renderer(IN_FRONT, &[1]));
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();

    let stats = r.render_frame(&mut backend, &stage, None).unwrap();
    assert_eq!(stats.draw_calls, 0);
    assert_eq!(
        backend.commands(),
        &[BackendCommand::BeginScene, BackendCommand::EndScene]
    );
}

#[test]
fn test_rendering_after_shutdown_is_a_no_op() {
    let mut stage = Stage::new();
    stage.register_renderable(mesh_renderer(IN_FRONT, &[1]));
    let camera = Camera::default();
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    r.render_frame(&mut backend, &stage, Some(&camera)).unwrap();

    backend.shutdown();
    let recorded = backend.commands().len();
    for _ in 0..2 {
        let stats = r.render_frame(&mut backend, &stage, Some(&camera)).unwrap();
        assert_eq!(stats, Default::default());
    }
    assert_eq!(backend.commands().len(), recorded);
    assert!(!backend.is_alive());
}

#[test]
fn test_invalid_viewport_is_rejected_before_any_call() {
    let camera = Camera::default().with_viewport(Rect::new(0.0, 0.0, -1.0, 1.0));
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    let err = r
        .render_frame(&mut backend, &Stage::new(), Some(&camera))
        .unwrap_err();
    assert!(matches!(
        err,
        LaneError::Render(RenderError::InvalidArgument { .. })
    ));
    assert!(backend.commands().is_empty());
}

#[test]
fn test_zero_resize_is_invalid_argument() {
    let mut r = renderer();
    assert!(matches!(
        r.resize(0, 0),
        Err(LaneError::Render(RenderError::InvalidArgument { .. }))
    ));
    assert_eq!(r.output_size(), Extent2D::new(64, 32));
}

#[test]
fn test_backend_error_still_closes_the_scene() {
    let mut stage = Stage::new();
    stage.register_renderable(mesh_renderer(IN_FRONT, &[1]));
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    r.render_frame(&mut backend, &stage, Some(&Camera::default()))
        .unwrap();

    // A second backend knows none of the renderer's render targets.
    let mut other = HeadlessBackend::new();
    let result = r.render_frame(&mut other, &stage, Some(&Camera::default()));
    assert!(result.is_err());
    assert!(other.is_idle());

    // Stale handles are dropped by the failure, so the next frame recovers.
    r.render_frame(&mut other, &stage, Some(&Camera::default()))
        .unwrap();
    assert_eq!(drawn_meshes(&other), vec![MeshHandle(1)]);
}

#[test]
fn test_failed_frame_releases_its_operations() {
    let stone = material(7);
    let mesh = ResourceRef::new(Mesh::new(vec![
        SubMesh::new(MeshHandle(7), unit_box()).with_default_material(stone.clone())
    ]));
    let mut stage = Stage::new();
    stage.register_renderable(Rc::new(RefCell::new(MeshRenderer::new(
        Transform::from_translation(IN_FRONT).into_shared(),
        Some(mesh),
    ))));
    let held = stone.get().unwrap();
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();

    r.render_frame(&mut backend, &stage, Some(&Camera::default()))
        .unwrap();
    let after_frame = Rc::strong_count(&held);

    let mut other = HeadlessBackend::new();
    assert!(r
        .render_frame(&mut other, &stage, Some(&Camera::default()))
        .is_err());
    assert_eq!(Rc::strong_count(&held), after_frame);
}

#[test]
fn test_lost_gbuffer_target_is_recreated() {
    let mut stage = Stage::new();
    stage.register_renderable(mesh_renderer(IN_FRONT, &[1]));
    let camera = Camera::default();
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    r.render_frame(&mut backend, &stage, Some(&camera)).unwrap();

    let lost = r.gbuffer().geometry_target().unwrap();
    backend.destroy_render_target(lost).unwrap();
    for _ in 0..2 {
        let stats = r.render_frame(&mut backend, &stage, Some(&camera)).unwrap();
        assert_eq!(stats.operations, 1);
    }
    assert_ne!(r.gbuffer().geometry_target(), Some(lost));
    assert_eq!(r.gbuffer().generation(), 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Pipeline behaviour
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_begin_end_calls_are_paired() {
    let mut stage = Stage::new();
    stage.register_renderable(mesh_renderer(IN_FRONT, &[1, 2, 3]));
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    r.post_effects_mut()
        .add_effect(Box::new(FullscreenEffect::new("tonemap")))
        .unwrap();
    r.render_frame(&mut backend, &stage, Some(&Camera::default()))
        .unwrap();

    let begins = count(&backend, |c| matches!(c, BackendCommand::BeginPass(_)));
    let ends = count(&backend, |c| matches!(c, BackendCommand::EndPass));
    assert_eq!(begins, ends);
    let instances = count(&backend, |c| matches!(c, BackendCommand::BeginInstance { .. }));
    assert_eq!(instances, count(&backend, |c| matches!(c, BackendCommand::EndInstance)));
    assert_eq!(instances, 3);
    assert!(backend.is_idle());
}

#[test]
fn test_draw_call_statistics_match_the_backend() {
    let mut stage = Stage::new();
    stage.register_renderable(mesh_renderer(IN_FRONT, &[1, 2]));
    stage.register_light(Rc::new(RefCell::new(LightComponent::new(
        LightKind::Directional,
        Transform::identity().into_shared(),
    ))));
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    r.queue_sprite(
        QuadBatchKey::default(),
        &Quad::rect(Vec2::ZERO, Vec2::ONE, 0.0, LinearRgba::WHITE),
    );
    let stats = r
        .render_frame(&mut backend, &stage, Some(&Camera::default()))
        .unwrap();

    // 2 meshes, ambient + sun, SSAO + blur, composite, 1 sprite batch
    assert_eq!(stats.draw_calls, 8);
    assert_eq!(stats.draw_calls, backend.draw_call_count());
    assert_eq!(stats.lights, 2);
    assert_eq!(stats.post_effects, 1);
    assert_eq!(r.last_frame_stats(), stats);
}

#[test]
fn test_sorting_reduces_material_switches() {
    let shared_a = material(1);
    let shared_b = ResourceRef::new(Material::new(MaterialId(2), "b").with_sort_key(1));
    let mesh = ResourceRef::new(Mesh::new(vec![
        SubMesh::new(MeshHandle(1), unit_box()).with_default_material(shared_a.clone()),
        SubMesh::new(MeshHandle(2), unit_box()).with_default_material(shared_b.clone()),
        SubMesh::new(MeshHandle(3), unit_box()).with_default_material(shared_a),
        SubMesh::new(MeshHandle(4), unit_box()).with_default_material(shared_b),
    ]));
    let mut stage = Stage::new();
    stage.register_renderable(Rc::new(RefCell::new(MeshRenderer::new(
        Transform::from_translation(IN_FRONT).into_shared(),
        Some(mesh),
    ))));
    let camera = Camera::default();

    let mut backend = HeadlessBackend::new();
    let mut sorted = renderer();
    let stats = sorted.render_frame(&mut backend, &stage, Some(&camera)).unwrap();
    assert_eq!(stats.material_switches, 2);
    assert_eq!(
        drawn_meshes(&backend),
        vec![MeshHandle(1), MeshHandle(3), MeshHandle(2), MeshHandle(4)]
    );

    let mut backend = HeadlessBackend::new();
    let mut unsorted = DeferredRenderer::new(RenderSettings {
        sort_operations: false,
        ..settings()
    })
    .unwrap();
    let stats = unsorted.render_frame(&mut backend, &stage, Some(&camera)).unwrap();
    assert_eq!(stats.material_switches, 4);
}

#[test]
fn test_lighting_uses_additive_state_and_skips_disabled_lights() {
    let mut stage = Stage::new();
    let lamp = Rc::new(RefCell::new(LightComponent::new(
        LightKind::Point { range: 4.0 },
        Transform::from_translation(IN_FRONT).into_shared(),
    )));
    let off = Rc::new(RefCell::new(LightComponent::new(
        LightKind::Directional,
        Transform::identity().into_shared(),
    )));
    off.borrow_mut().enabled = false;
    let ambient = Rc::new(RefCell::new(
        LightComponent::new(LightKind::Ambient, Transform::identity().into_shared())
            .with_color(LinearRgba::rgb(0.2, 0.2, 0.2), 1.0),
    ));
    stage.register_light(lamp);
    stage.register_light(off);
    stage.register_light(ambient);

    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    let stats = r
        .render_frame(&mut backend, &stage, Some(&Camera::default()))
        .unwrap();
    // The scene provides its own ambient light, so no fallback is added.
    assert_eq!(stats.lights, 2);
    assert_eq!(count(&backend, |c| matches!(c, BackendCommand::SetLight(_))), 2);
    assert!(backend.commands().iter().any(|c| matches!(
        c,
        BackendCommand::CreateRenderState { descriptor, .. }
            if *descriptor == duality_core::renderer::RenderStateDescriptor::ADDITIVE
    )));
}

#[test]
fn test_composite_targets_camera_sub_viewport() {
    let camera = Camera::default().with_viewport(Rect::new(0.5, 0.0, 0.5, 0.5));
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    r.render_frame(&mut backend, &Stage::new(), Some(&camera))
        .unwrap();

    let screen_pass = backend.commands().iter().find_map(|c| match c {
        BackendCommand::BeginPass(desc) if desc.target.is_none() => Some(*desc),
        _ => None,
    });
    assert_eq!(
        screen_pass.map(|p| p.viewport),
        Some(Rect::new(32.0, 0.0, 32.0, 16.0))
    );
}

#[test]
fn test_post_chain_runs_ssao_then_custom_effects() {
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    r.post_effects_mut()
        .add_effect(Box::new(FullscreenEffect::new("tonemap")))
        .unwrap();
    let stats = r
        .render_frame(&mut backend, &Stage::new(), Some(&Camera::default()))
        .unwrap();
    assert_eq!(stats.post_effects, 2);

    let programs: Vec<ShaderProgramKind> = backend
        .commands()
        .iter()
        .filter_map(|c| match c {
            BackendCommand::CreateShaderProgram { kind, .. } => Some(kind.clone()),
            _ => None,
        })
        .collect();
    let position = |kind: ShaderProgramKind| programs.iter().position(|k| *k == kind).unwrap();
    assert!(position(ShaderProgramKind::Lighting) < position(ShaderProgramKind::Ssao));
    assert!(position(ShaderProgramKind::Ssao) < position(ShaderProgramKind::Custom("tonemap".into())));
    assert!(
        position(ShaderProgramKind::Custom("tonemap".into())) < position(ShaderProgramKind::Composite)
    );

    r.post_effects_mut().set_enabled("ssao", false).unwrap();
    r.post_effects_mut().set_enabled("tonemap", false).unwrap();
    let stats = r
        .render_frame(&mut backend, &Stage::new(), Some(&Camera::default()))
        .unwrap();
    assert_eq!(stats.post_effects, 0);
}

#[test]
fn test_mask_and_frustum_culling_are_counted() {
    let mut stage = Stage::new();
    stage.register_renderable(mesh_renderer(Vec3::new(0.0, 0.0, 50.0), &[1, 2]));
    let hidden = mesh_renderer(IN_FRONT, &[3]);
    hidden.borrow_mut().base_mut().visibility = VisibilityFlags::group(4).unwrap();
    stage.register_renderable(hidden);

    let mut camera = Camera::default();
    camera.visibility_mask = VisibilityFlags::group(0).unwrap();
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();
    let stats = r.render_frame(&mut backend, &stage, Some(&camera)).unwrap();
    assert_eq!(stats.operations, 0);
    assert_eq!(stats.culled_units, 3);
    assert!(drawn_meshes(&backend).is_empty());
}

#[test]
fn test_culling_disabled_draws_everything() {
    let mut stage = Stage::new();
    stage.register_renderable(mesh_renderer(Vec3::new(0.0, 0.0, 50.0), &[1, 2]));
    let mut camera = Camera::default();
    camera.culling_enabled = false;

    let mut backend = HeadlessBackend::new();
    let stats = renderer()
        .render_frame(&mut backend, &stage, Some(&camera))
        .unwrap();
    assert_eq!(stats.operations, 2);
    assert_eq!(stats.culled_units, 0);
}

#[test]
fn test_unloaded_mesh_is_retried_next_frame() {
    let mesh = ResourceRef::new(Mesh::new(vec![
        SubMesh::new(MeshHandle(7), unit_box()).with_default_material(material(7)),
    ]));
    let mut stage = Stage::new();
    stage.register_renderable(Rc::new(RefCell::new(MeshRenderer::new(
        Transform::from_translation(IN_FRONT).into_shared(),
        Some(mesh.clone()),
    ))));
    let camera = Camera::default();
    let mut backend = HeadlessBackend::new();
    let mut r = renderer();

    let loaded = mesh.get().unwrap();
    mesh.unload();
    let stats = r.render_frame(&mut backend, &stage, Some(&camera)).unwrap();
    assert_eq!(stats.operations, 0);
    assert_eq!(stats.skipped_units, 1);

    mesh.set(Mesh::new(loaded.submeshes.clone()));
    let stats = r.render_frame(&mut backend, &stage, Some(&camera)).unwrap();
    assert_eq!(stats.operations, 1);
}

#[test]
fn test_standalone_sprite_batch_needs_a_size() {
    let mut batch = SpriteBatch::with_capacity(1);
    let mut programs = duality_lanes::ProgramCache::new();
    let mut backend = HeadlessBackend::new();
    batch.add_quad(
        QuadBatchKey::default(),
        &Quad::rect(Vec2::ZERO, Vec2::ONE, 0.0, LinearRgba::WHITE),
    );
    assert!(batch.render(&mut backend, &mut programs, 10, 0).is_err());
}
