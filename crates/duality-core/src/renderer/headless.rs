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

//! A [`GraphicsBackend`] that records calls instead of talking to a GPU.
//!
//! Used by tests and by the sandbox. It validates call ordering and resource handles the
//! way a real backend would, so pipeline bugs surface as errors instead of silent
//! garbage.

use crate::math::{Extent2D, LinearRgba, Mat4, Rect};
use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use crate::renderer::traits::GraphicsBackend;
use std::collections::HashMap;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    /// `begin_scene`.
    BeginScene,
    /// `end_scene`.
    EndScene,
    /// `create_render_target`.
    CreateRenderTarget {
        /// The new ID.
        id: RenderTargetId,
        /// Requested size.
        size: Extent2D,
        /// Number of color attachments.
        color_attachments: usize,
    },
    /// `destroy_render_target`.
    DestroyRenderTarget(RenderTargetId),
    /// `create_shader_program`.
    CreateShaderProgram {
        /// The new ID.
        id: ShaderProgramId,
        /// Requested program.
        kind: ShaderProgramKind,
    },
    /// `create_render_state`.
    CreateRenderState {
        /// The new ID.
        id: RenderStateId,
        /// Requested state.
        descriptor: RenderStateDescriptor,
    },
    /// `begin_pass`.
    BeginPass(PassDescriptor),
    /// `end_pass`.
    EndPass,
    /// `set_render_target`.
    SetRenderTarget(Option<RenderTargetId>),
    /// `set_viewport`.
    SetViewport(Rect),
    /// `clear`.
    Clear(LinearRgba, ClearFlags),
    /// `set_render_state`.
    SetRenderState(RenderStateId),
    /// `use_program`.
    UseProgram(ShaderProgramId),
    /// `set_camera`.
    SetCamera {
        /// View matrix.
        view: Mat4,
        /// Projection matrix.
        projection: Mat4,
    },
    /// `bind_material`.
    BindMaterial(MaterialId),
    /// `bind_texture`.
    BindTexture {
        /// Sampler slot.
        slot: u32,
        /// Texture.
        texture: TextureId,
    },
    /// `bind_render_target`.
    BindRenderTarget {
        /// Sampler slot.
        slot: u32,
        /// Source target.
        target: RenderTargetId,
        /// Attachment index.
        attachment: u32,
    },
    /// `set_effect_parameters`.
    SetEffectParameters(Vec<EffectParameter>),
    /// `set_light`.
    SetLight(LightParameters),
    /// `begin_instance`.
    BeginInstance {
        /// Model transform.
        transform: Mat4,
        /// Whether a pose was supplied.
        skinned: bool,
    },
    /// `draw_mesh`.
    DrawMesh {
        /// Geometry.
        mesh: MeshHandle,
        /// Alternate draw mode.
        custom_draw: bool,
    },
    /// `end_instance`.
    EndInstance,
    /// `draw_fullscreen`.
    DrawFullscreen,
    /// `draw_quad_batch`.
    DrawQuadBatch {
        /// Batching key.
        key: QuadBatchKey,
        /// Number of quads.
        quads: usize,
    },
}

impl BackendCommand {
    /// Returns `true` for calls that issue GPU draws.
    pub fn is_draw(&self) -> bool {
        matches!(
            self,
            BackendCommand::DrawMesh { .. }
                | BackendCommand::DrawFullscreen
                | BackendCommand::DrawQuadBatch { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Scene,
    Pass,
    Instance,
}

impl Phase {
    fn expected_call(self) -> &'static str {
        match self {
            Phase::Idle => "begin_scene",
            Phase::Scene => "begin_pass or end_scene",
            Phase::Pass => "end_pass",
            Phase::Instance => "end_instance",
        }
    }
}

/// A GPU-less backend recording every call as a [`BackendCommand`].
#[derive(Debug)]
pub struct HeadlessBackend {
    alive: bool,
    phase: Phase,
    commands: Vec<BackendCommand>,
    render_targets: HashMap<RenderTargetId, RenderTargetDescriptor>,
    programs: HashMap<ShaderProgramKind, ShaderProgramId>,
    states: HashMap<RenderStateDescriptor, RenderStateId>,
    next_id: usize,
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessBackend {
    /// Creates a live backend with no resources.
    pub fn new() -> Self {
        Self {
            alive: true,
            phase: Phase::Idle,
            commands: Vec::new(),
            render_targets: HashMap::new(),
            programs: HashMap::new(),
            states: HashMap::new(),
            next_id: 1,
        }
    }

    /// Shuts the backend down and releases every render target.
    pub fn shutdown(&mut self) {
        if self.alive {
            log::info!(
                "Headless backend shutting down ({} render targets released)",
                self.render_targets.len()
            );
        }
        self.alive = false;
        self.phase = Phase::Idle;
        self.render_targets.clear();
    }

    /// Every call recorded so far.
    pub fn commands(&self) -> &[BackendCommand] {
        &self.commands
    }

    /// Returns and forgets the recorded calls.
    pub fn take_commands(&mut self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.commands)
    }

    /// Number of recorded draw calls.
    pub fn draw_call_count(&self) -> usize {
        self.commands.iter().filter(|c| c.is_draw()).count()
    }

    /// Number of render targets currently alive.
    pub fn live_render_targets(&self) -> usize {
        self.render_targets.len()
    }

    /// The descriptor of a live render target.
    pub fn render_target(&self, id: RenderTargetId) -> Option<&RenderTargetDescriptor> {
        self.render_targets.get(&id)
    }

    /// Returns `true` if no scene, pass or instance is open.
    pub fn is_idle(&self) -> bool {
        self.phase == Phase::Idle
    }

    fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn check_alive(&self) -> Result<(), RenderError> {
        if self.alive {
            Ok(())
        } else {
            Err(RenderError::BackendShutdown)
        }
    }

    fn transition(
        &mut self,
        from: Phase,
        to: Phase,
        found: &'static str,
    ) -> Result<(), RenderError> {
        self.check_alive()?;
        if self.phase != from {
            return Err(RenderError::InvalidPassOrder {
                expected: self.phase.expected_call(),
                found,
            });
        }
        self.phase = to;
        Ok(())
    }

    /// Calls that bind state are legal anywhere inside a pass.
    fn require_pass(&self, found: &'static str) -> Result<(), RenderError> {
        self.check_alive()?;
        match self.phase {
            Phase::Pass | Phase::Instance => Ok(()),
            other => Err(RenderError::InvalidPassOrder {
                expected: other.expected_call(),
                found,
            }),
        }
    }

    fn check_target(&self, target: Option<RenderTargetId>) -> Result<(), RenderError> {
        match target {
            Some(id) if !self.render_targets.contains_key(&id) => {
                Err(ResourceError::InvalidHandle.into())
            }
            _ => Ok(()),
        }
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn is_alive(&self) -> bool {
        self.alive
    }

    fn begin_scene(&mut self) -> Result<(), RenderError> {
        self.transition(Phase::Idle, Phase::Scene, "begin_scene")?;
        self.commands.push(BackendCommand::BeginScene);
        Ok(())
    }

    fn end_scene(&mut self) -> Result<(), RenderError> {
        self.transition(Phase::Scene, Phase::Idle, "end_scene")?;
        self.commands.push(BackendCommand::EndScene);
        Ok(())
    }

    fn create_render_target(
        &mut self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTargetId, ResourceError> {
        if !self.alive {
            return Err(ResourceError::BackendError("backend shut down".into()));
        }
        if descriptor.size.is_empty() {
            return Err(ResourceError::BackendError(format!(
                "render target '{}' has zero size",
                descriptor.label
            )));
        }
        let id = RenderTargetId(self.allocate_id());
        self.render_targets.insert(id, descriptor.clone());
        self.commands.push(BackendCommand::CreateRenderTarget {
            id,
            size: descriptor.size,
            color_attachments: descriptor.color_formats.len(),
        });
        Ok(id)
    }

    fn destroy_render_target(&mut self, id: RenderTargetId) -> Result<(), ResourceError> {
        if self.render_targets.remove(&id).is_none() {
            return Err(ResourceError::InvalidHandle);
        }
        self.commands.push(BackendCommand::DestroyRenderTarget(id));
        Ok(())
    }

    fn has_render_target(&self, id: RenderTargetId) -> bool {
        self.render_targets.contains_key(&id)
    }

    fn create_shader_program(
        &mut self,
        kind: &ShaderProgramKind,
    ) -> Result<ShaderProgramId, ResourceError> {
        if !self.alive {
            return Err(ResourceError::BackendError("backend shut down".into()));
        }
        if let Some(id) = self.programs.get(kind) {
            return Ok(*id);
        }
        let id = ShaderProgramId(self.allocate_id());
        self.programs.insert(kind.clone(), id);
        self.commands.push(BackendCommand::CreateShaderProgram {
            id,
            kind: kind.clone(),
        });
        Ok(id)
    }

    fn create_render_state(
        &mut self,
        descriptor: &RenderStateDescriptor,
    ) -> Result<RenderStateId, ResourceError> {
        if !self.alive {
            return Err(ResourceError::BackendError("backend shut down".into()));
        }
        if let Some(id) = self.states.get(descriptor) {
            return Ok(*id);
        }
        let id = RenderStateId(self.allocate_id());
        self.states.insert(*descriptor, id);
        self.commands.push(BackendCommand::CreateRenderState {
            id,
            descriptor: *descriptor,
        });
        Ok(id)
    }

    fn begin_pass(&mut self, descriptor: &PassDescriptor) -> Result<(), RenderError> {
        self.check_target(descriptor.target)?;
        self.transition(Phase::Scene, Phase::Pass, "begin_pass")?;
        self.commands.push(BackendCommand::BeginPass(*descriptor));
        Ok(())
    }

    fn end_pass(&mut self) -> Result<(), RenderError> {
        self.transition(Phase::Pass, Phase::Scene, "end_pass")?;
        self.commands.push(BackendCommand::EndPass);
        Ok(())
    }

    fn set_render_target(&mut self, target: Option<RenderTargetId>) -> Result<(), RenderError> {
        self.require_pass("set_render_target")?;
        self.check_target(target)?;
        self.commands.push(BackendCommand::SetRenderTarget(target));
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Rect) -> Result<(), RenderError> {
        self.require_pass("set_viewport")?;
        self.commands.push(BackendCommand::SetViewport(viewport));
        Ok(())
    }

    fn clear(&mut self, color: LinearRgba, flags: ClearFlags) -> Result<(), RenderError> {
        self.require_pass("clear")?;
        self.commands.push(BackendCommand::Clear(color, flags));
        Ok(())
    }

    fn set_render_state(&mut self, state: RenderStateId) -> Result<(), RenderError> {
        self.require_pass("set_render_state")?;
        if !self.states.values().any(|id| *id == state) {
            return Err(ResourceError::InvalidHandle.into());
        }
        self.commands.push(BackendCommand::SetRenderState(state));
        Ok(())
    }

    fn use_program(&mut self, program: ShaderProgramId) -> Result<(), RenderError> {
        self.require_pass("use_program")?;
        if !self.programs.values().any(|id| *id == program) {
            return Err(ResourceError::InvalidHandle.into());
        }
        self.commands.push(BackendCommand::UseProgram(program));
        Ok(())
    }

    fn set_camera(&mut self, view: &Mat4, projection: &Mat4) -> Result<(), RenderError> {
        self.require_pass("set_camera")?;
        self.commands.push(BackendCommand::SetCamera {
            view: *view,
            projection: *projection,
        });
        Ok(())
    }

    fn bind_material(&mut self, material: &Material) -> Result<(), RenderError> {
        self.require_pass("bind_material")?;
        self.commands.push(BackendCommand::BindMaterial(material.id));
        Ok(())
    }

    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> Result<(), RenderError> {
        self.require_pass("bind_texture")?;
        self.commands
            .push(BackendCommand::BindTexture { slot, texture });
        Ok(())
    }

    fn bind_render_target(
        &mut self,
        slot: u32,
        target: RenderTargetId,
        attachment: u32,
    ) -> Result<(), RenderError> {
        self.require_pass("bind_render_target")?;
        let descriptor = self
            .render_targets
            .get(&target)
            .ok_or(RenderError::ResourceError(ResourceError::InvalidHandle))?;
        if attachment as usize >= descriptor.color_formats.len() {
            return Err(ResourceError::NotFound.into());
        }
        self.commands.push(BackendCommand::BindRenderTarget {
            slot,
            target,
            attachment,
        });
        Ok(())
    }

    fn set_effect_parameters(&mut self, parameters: &[EffectParameter]) -> Result<(), RenderError> {
        self.require_pass("set_effect_parameters")?;
        self.commands
            .push(BackendCommand::SetEffectParameters(parameters.to_vec()));
        Ok(())
    }

    fn set_light(&mut self, light: &LightParameters) -> Result<(), RenderError> {
        self.require_pass("set_light")?;
        self.commands.push(BackendCommand::SetLight(*light));
        Ok(())
    }

    fn begin_instance(
        &mut self,
        transform: &Mat4,
        skeleton: Option<&dyn SkeletonInstance>,
    ) -> Result<(), RenderError> {
        self.transition(Phase::Pass, Phase::Instance, "begin_instance")?;
        self.commands.push(BackendCommand::BeginInstance {
            transform: *transform,
            skinned: skeleton.is_some(),
        });
        Ok(())
    }

    fn draw_mesh(&mut self, mesh: MeshHandle, custom_draw: bool) -> Result<(), RenderError> {
        self.check_alive()?;
        if self.phase != Phase::Instance {
            return Err(RenderError::InvalidPassOrder {
                expected: self.phase.expected_call(),
                found: "draw_mesh",
            });
        }
        self.commands
            .push(BackendCommand::DrawMesh { mesh, custom_draw });
        Ok(())
    }

    fn end_instance(&mut self) -> Result<(), RenderError> {
        self.transition(Phase::Instance, Phase::Pass, "end_instance")?;
        self.commands.push(BackendCommand::EndInstance);
        Ok(())
    }

    fn draw_fullscreen(&mut self) -> Result<(), RenderError> {
        self.transition(Phase::Pass, Phase::Pass, "draw_fullscreen")?;
        self.commands.push(BackendCommand::DrawFullscreen);
        Ok(())
    }

    fn draw_quad_batch(
        &mut self,
        key: &QuadBatchKey,
        vertices: &[QuadVertex],
    ) -> Result<(), RenderError> {
        self.transition(Phase::Pass, Phase::Pass, "draw_quad_batch")?;
        if vertices.len() % 4 != 0 {
            return Err(RenderError::invalid_argument(
                "vertices",
                format!("{} is not a multiple of 4", vertices.len()),
            ));
        }
        self.commands.push(BackendCommand::DrawQuadBatch {
            key: *key,
            quads: vertices.len() / 4,
        });
        Ok(())
    }
}
