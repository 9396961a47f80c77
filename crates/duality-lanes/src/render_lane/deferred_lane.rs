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

//! Deferred shading: geometry into the G-buffer first, lighting from it afterwards.
//!
//! One frame runs these stages, in order:
//!
//! 1. `BeginScene`
//! 2. `RenderGBuffer` - every render operation writes position, normal, albedo and
//!    material channels.
//! 3. `RenderLighting` - one additive full-screen draw per light.
//! 4. `PostEffectChain` - SSAO, then custom effects.
//! 5. `Composite` - the result is copied into the camera's viewport on screen and
//!    pending sprites are drawn over it.
//! 6. `EndScene`
//!
//! Without a camera only the first and last stage run.

use super::{
    DrawOrder, FrameStats, GBuffer, LaneError, ProgramCache, RenderLane, GBUFFER_CHANNELS,
};
use crate::post_lane::{PostEffectChain, SsaoEffect};
use crate::sprite_lane::SpriteBatch;
use duality_core::math::{Extent2D, LinearRgba, Mat4, Rect, Vec3};
use duality_core::renderer::{
    ClearFlags, GraphicsBackend, LightKind, LightParameters, MaterialId, PassDescriptor, Quad,
    QuadBatchKey, RenderError, RenderOperationList, RenderStateDescriptor, RenderTargetId,
    ResourceError, ShaderProgramId, ShaderProgramKind,
};
use duality_core::settings::RenderSettings;
use duality_data::components::Camera;
use duality_data::Stage;

/// The stages of a deferred frame, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FrameStage {
    /// The backend frame is opened.
    BeginScene,
    /// Geometry is written to the G-buffer.
    RenderGBuffer,
    /// Lights are accumulated from the G-buffer.
    RenderLighting,
    /// Full-screen post effects run.
    PostEffectChain,
    /// The result reaches the screen, sprites on top.
    Composite,
    /// The backend frame is closed.
    EndScene,
}

/// The default [`RenderLane`].
#[derive(Debug)]
pub struct DeferredRenderer {
    settings: RenderSettings,
    gbuffer: GBuffer,
    programs: ProgramCache,
    post: PostEffectChain,
    sprites: SpriteBatch,
    operations: RenderOperationList,
    order: DrawOrder,
    lights: Vec<LightParameters>,
    stages: Vec<FrameStage>,
    frame_number: u64,
    last_stats: FrameStats,
    backend_lost: bool,
}

impl DeferredRenderer {
    /// Creates a renderer for an output of `settings.initial_width` x
    /// `settings.initial_height`. No backend resource is created until the first frame.
    pub fn new(settings: RenderSettings) -> Result<Self, LaneError> {
        let size = Extent2D::new(settings.initial_width, settings.initial_height);
        let mut gbuffer = GBuffer::new(size, settings.gbuffer_format, settings.lighting_format);
        gbuffer.resize(size)?;

        let ssao = SsaoEffect::new(settings.ssao.clone(), settings.lighting_format);
        Ok(Self {
            gbuffer,
            programs: ProgramCache::new(),
            post: PostEffectChain::new(ssao, settings.lighting_format),
            sprites: SpriteBatch::with_capacity(settings.sprite_batch_capacity),
            operations: RenderOperationList::new(),
            order: DrawOrder::new(),
            lights: Vec::new(),
            stages: Vec::new(),
            frame_number: 0,
            last_stats: FrameStats::default(),
            backend_lost: false,
            settings,
        })
    }

    /// The settings the renderer was built with.
    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    /// The current output size.
    pub fn output_size(&self) -> Extent2D {
        self.gbuffer.size()
    }

    /// The G-buffer.
    pub fn gbuffer(&self) -> &GBuffer {
        &self.gbuffer
    }

    /// The post-processing chain.
    pub fn post_effects(&self) -> &PostEffectChain {
        &self.post
    }

    /// Mutable access to the post-processing chain.
    pub fn post_effects_mut(&mut self) -> &mut PostEffectChain {
        &mut self.post
    }

    /// Queues a screen-space quad drawn on top of the next frame.
    pub fn queue_sprite(&mut self, key: QuadBatchKey, quad: &Quad) {
        self.sprites.add_quad(key, quad);
    }

    /// The pending sprite overlay.
    pub fn sprites(&self) -> &SpriteBatch {
        &self.sprites
    }

    /// The stages the last frame went through.
    pub fn last_frame_stages(&self) -> &[FrameStage] {
        &self.stages
    }

    /// Number of frames started so far.
    pub fn frame_number(&self) -> u64 {
        self.frame_number
    }

    /// Destroys every render target the renderer owns.
    pub fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        self.gbuffer.release(backend);
        self.post.release(backend);
        self.programs.clear();
    }

    fn enter(&mut self, stage: FrameStage) {
        log::trace!("Frame {}: {stage:?}", self.frame_number);
        self.stages.push(stage);
    }

    fn render_view(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        stage: &Stage,
        camera: &Camera,
        stats: &mut FrameStats,
    ) -> Result<(), LaneError> {
        let viewport = camera.viewport.to_pixels(self.gbuffer.size());
        let extent = viewport.extent();
        if extent.is_empty() {
            log::debug!("Camera viewport covers no pixel; nothing drawn");
            self.sprites.clear();
            return Ok(());
        }

        let aspect = viewport.width / viewport.height;
        let view = camera.view_matrix();
        let projection = camera.projection_matrix(aspect);
        let frustum = camera.frustum(aspect);

        let prepared =
            stage.prepare_render_operations(frustum.as_ref(), camera.visibility_mask, &mut self.operations);
        stats.operations = self.operations.len();
        stats.culled_units = prepared.culled;
        stats.skipped_units = prepared.skipped;
        stage.collect_lights(&mut self.lights);

        let (geometry, lighting) = self.gbuffer.ensure(backend)?;

        self.enter(FrameStage::RenderGBuffer);
        self.geometry_pass(backend, geometry, &view, &projection, stats)?;

        self.enter(FrameStage::RenderLighting);
        self.lighting_pass(backend, geometry, lighting, stats)?;

        self.enter(FrameStage::PostEffectChain);
        let chain = self.post.run(
            backend,
            &mut self.programs,
            geometry,
            lighting,
            self.gbuffer.size(),
        )?;
        stats.post_effects = chain.effects;
        stats.draw_calls += chain.draw_calls;

        self.enter(FrameStage::Composite);
        self.composite_pass(backend, chain.target, viewport, stats)?;
        Ok(())
    }

    fn full_viewport(&self) -> Rect {
        let size = self.gbuffer.size();
        Rect::new(0.0, 0.0, size.width as f32, size.height as f32)
    }

    fn geometry_pass(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        target: RenderTargetId,
        view: &Mat4,
        projection: &Mat4,
        stats: &mut FrameStats,
    ) -> Result<(), RenderError> {
        let state = self
            .programs
            .render_state(backend, &RenderStateDescriptor::OPAQUE)?;
        let static_program = self.programs.program(backend, &ShaderProgramKind::GBuffer)?;
        let skinned_program = if self.operations.iter().any(|op| op.skeleton.is_some()) {
            Some(self.programs.program(backend, &ShaderProgramKind::SkinnedGBuffer)?)
        } else {
            None
        };

        backend.begin_pass(&PassDescriptor {
            target: Some(target),
            clear_color: LinearRgba::TRANSPARENT,
            clear_flags: ClearFlags::ALL,
            viewport: self.full_viewport(),
        })?;
        backend.set_render_state(state)?;
        backend.set_camera(view, projection)?;

        let mut bound_program: Option<ShaderProgramId> = None;
        let mut bound_material: Option<MaterialId> = None;
        let ops = self.operations.as_slice();
        for &index in self.order.build(&self.operations, self.settings.sort_operations) {
            let op = &ops[index];
            let program = match (&op.skeleton, skinned_program) {
                (Some(_), Some(skinned)) => skinned,
                _ => static_program,
            };
            if bound_program != Some(program) {
                backend.use_program(program)?;
                bound_program = Some(program);
            }
            if bound_material != Some(op.material.id) {
                backend.bind_material(&op.material)?;
                bound_material = Some(op.material.id);
                stats.material_switches += 1;
            }
            backend.begin_instance(&op.transform, op.skeleton.as_deref())?;
            backend.draw_mesh(op.mesh, op.custom_draw)?;
            backend.end_instance()?;
            stats.draw_calls += 1;
        }
        backend.end_pass()
    }

    fn lighting_pass(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        gbuffer: RenderTargetId,
        target: RenderTargetId,
        stats: &mut FrameStats,
    ) -> Result<(), RenderError> {
        let state = self
            .programs
            .render_state(backend, &RenderStateDescriptor::ADDITIVE)?;
        let program = self.programs.program(backend, &ShaderProgramKind::Lighting)?;

        backend.begin_pass(&PassDescriptor {
            target: Some(target),
            clear_color: LinearRgba::TRANSPARENT,
            clear_flags: ClearFlags::COLOR,
            viewport: self.full_viewport(),
        })?;
        backend.set_render_state(state)?;
        backend.use_program(program)?;
        for attachment in 0..GBUFFER_CHANNELS.len() as u32 {
            backend.bind_render_target(attachment, gbuffer, attachment)?;
        }

        let has_ambient = self
            .lights
            .iter()
            .any(|light| matches!(light.kind, LightKind::Ambient));
        let fallback_ambient = (!has_ambient).then(|| LightParameters {
            kind: LightKind::Ambient,
            position: Vec3::ZERO,
            direction: Vec3::new(0.0, 0.0, -1.0),
            color: self.settings.ambient_light,
            intensity: 1.0,
        });
        for light in fallback_ambient.iter().chain(self.lights.iter()) {
            backend.set_light(light)?;
            backend.draw_fullscreen()?;
            stats.lights += 1;
            stats.draw_calls += 1;
        }
        backend.end_pass()
    }

    fn composite_pass(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        source: RenderTargetId,
        viewport: Rect,
        stats: &mut FrameStats,
    ) -> Result<(), RenderError> {
        let state = self
            .programs
            .render_state(backend, &RenderStateDescriptor::FULLSCREEN)?;
        let program = self.programs.program(backend, &ShaderProgramKind::Composite)?;

        backend.begin_pass(&PassDescriptor {
            target: None,
            clear_color: self.settings.clear_color,
            clear_flags: ClearFlags::ALL,
            viewport,
        })?;
        backend.set_render_state(state)?;
        backend.use_program(program)?;
        backend.bind_render_target(0, source, 0)?;
        backend.draw_fullscreen()?;
        stats.draw_calls += 1;

        let extent = viewport.extent();
        let flushes = self
            .sprites
            .render(backend, &mut self.programs, extent.width, extent.height)?;
        stats.sprite_flushes = flushes;
        stats.draw_calls += flushes;
        backend.end_pass()
    }

    /// Drops this frame's references so unloaded resources can go.
    fn end_frame(&mut self) {
        self.operations.clear();
        self.lights.clear();
    }

    /// Closes whatever is still open after a failed frame.
    fn abort_frame(backend: &mut dyn GraphicsBackend) {
        if !backend.is_alive() {
            return;
        }
        let attempts = [
            ("end_instance", backend.end_instance()),
            ("end_pass", backend.end_pass()),
            ("end_scene", backend.end_scene()),
        ];
        for (call, result) in attempts {
            if let Err(err) = result {
                log::debug!("Frame abort: {call} not needed ({err})");
            }
        }
    }
}

impl RenderLane for DeferredRenderer {
    fn strategy_name(&self) -> &'static str {
        "Deferred"
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), LaneError> {
        self.gbuffer.resize(Extent2D::new(width, height))?;
        Ok(())
    }

    fn render_frame(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        stage: &Stage,
        camera: Option<&Camera>,
    ) -> Result<FrameStats, LaneError> {
        self.stages.clear();
        if !backend.is_alive() {
            if !self.backend_lost {
                log::warn!("Graphics backend has shut down; frames are skipped");
                self.backend_lost = true;
                self.gbuffer.forget();
                self.post.forget();
                self.programs.clear();
            }
            self.last_stats = FrameStats::default();
            return Ok(self.last_stats);
        }
        if self.backend_lost {
            log::info!("Graphics backend is alive again; resuming rendering");
            self.backend_lost = false;
        }
        if let Some(camera) = camera {
            camera.validate_viewport()?;
        }

        self.frame_number += 1;
        let mut stats = FrameStats {
            frame_number: self.frame_number,
            ..FrameStats::default()
        };
        self.operations.clear();
        self.lights.clear();

        self.enter(FrameStage::BeginScene);
        backend.begin_scene()?;

        let outcome = match camera {
            Some(camera) => self.render_view(backend, stage, camera, &mut stats),
            None => {
                log::trace!("No camera; frame {} has no passes", self.frame_number);
                self.sprites.clear();
                Ok(())
            }
        };
        if let Err(err) = outcome {
            log::error!("Frame {} failed: {err}", self.frame_number);
            Self::abort_frame(backend);
            self.end_frame();
            if matches!(
                err,
                LaneError::Render(RenderError::ResourceError(ResourceError::InvalidHandle))
            ) {
                log::debug!("Cached programs and states are stale; recreating next frame");
                self.programs.clear();
            }
            return Err(err);
        }

        self.enter(FrameStage::EndScene);
        let closed = backend.end_scene();
        self.end_frame();
        closed?;

        log::trace!("{stats}");
        self.last_stats = stats;
        Ok(stats)
    }

    fn last_frame_stats(&self) -> FrameStats {
        self.last_stats
    }
}
