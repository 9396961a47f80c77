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

use crate::math::{LinearRgba, Mat4, Rect};
use crate::renderer::api::*;
use crate::renderer::error::{RenderError, ResourceError};
use std::fmt::Debug;

/// The capability surface the render pipeline drives.
///
/// A backend owns every GPU object it hands out an ID for. The pipeline only stores and
/// forwards those IDs. Calls come from one thread, in strict pairs:
/// `begin_scene`/`end_scene`, `begin_pass`/`end_pass` (inside a scene) and
/// `begin_instance`/`end_instance` (inside a pass). Implementations reject out-of-order
/// calls with [`RenderError::InvalidPassOrder`].
pub trait GraphicsBackend: Debug {
    /// Returns `false` once the backend has shut down. A dead backend must not be driven.
    fn is_alive(&self) -> bool;

    /// Opens the frame bracket.
    fn begin_scene(&mut self) -> Result<(), RenderError>;

    /// Closes the frame bracket and presents.
    fn end_scene(&mut self) -> Result<(), RenderError>;

    // --- Resources ---

    /// Creates an offscreen render target.
    /// ## Errors
    /// * `ResourceError` - If the size is zero or the backend cannot allocate it.
    fn create_render_target(
        &mut self,
        descriptor: &RenderTargetDescriptor,
    ) -> Result<RenderTargetId, ResourceError>;

    /// Releases a render target. Its ID becomes invalid.
    fn destroy_render_target(&mut self, id: RenderTargetId) -> Result<(), ResourceError>;

    /// Returns `true` while `id` names a render target the backend still holds.
    fn has_render_target(&self, id: RenderTargetId) -> bool;

    /// Creates (or looks up) the program for `kind`.
    fn create_shader_program(
        &mut self,
        kind: &ShaderProgramKind,
    ) -> Result<ShaderProgramId, ResourceError>;

    /// Creates a fixed-function render state object.
    fn create_render_state(
        &mut self,
        descriptor: &RenderStateDescriptor,
    ) -> Result<RenderStateId, ResourceError>;

    // --- Passes ---

    /// Binds `target` (the screen when `None`), sets the viewport and clears as requested.
    fn begin_pass(&mut self, descriptor: &PassDescriptor) -> Result<(), RenderError>;

    /// Finishes the current pass.
    fn end_pass(&mut self) -> Result<(), RenderError>;

    /// Rebinds the output target inside the current pass.
    fn set_render_target(&mut self, target: Option<RenderTargetId>) -> Result<(), RenderError>;

    /// Sets the viewport, in pixels.
    fn set_viewport(&mut self, viewport: Rect) -> Result<(), RenderError>;

    /// Clears the bound target.
    fn clear(&mut self, color: LinearRgba, flags: ClearFlags) -> Result<(), RenderError>;

    /// Binds a render state created by [`create_render_state`](Self::create_render_state).
    fn set_render_state(&mut self, state: RenderStateId) -> Result<(), RenderError>;

    /// Binds a shader program.
    fn use_program(&mut self, program: ShaderProgramId) -> Result<(), RenderError>;

    /// Sets the camera matrices for the following draws.
    fn set_camera(&mut self, view: &Mat4, projection: &Mat4) -> Result<(), RenderError>;

    // --- Binding ---

    /// Uploads a material's properties and binds its textures.
    fn bind_material(&mut self, material: &Material) -> Result<(), RenderError>;

    /// Binds a texture to a sampler slot.
    fn bind_texture(&mut self, slot: u32, texture: TextureId) -> Result<(), RenderError>;

    /// Binds one attachment of a render target to a sampler slot.
    fn bind_render_target(
        &mut self,
        slot: u32,
        target: RenderTargetId,
        attachment: u32,
    ) -> Result<(), RenderError>;

    /// Uploads parameters for the bound full-screen program.
    fn set_effect_parameters(&mut self, parameters: &[EffectParameter]) -> Result<(), RenderError>;

    /// Uploads one light for the next full-screen lighting draw.
    fn set_light(&mut self, light: &LightParameters) -> Result<(), RenderError>;

    // --- Drawing ---

    /// Starts a mesh instance with its model transform and optional skinning pose.
    fn begin_instance(
        &mut self,
        transform: &Mat4,
        skeleton: Option<&dyn SkeletonInstance>,
    ) -> Result<(), RenderError>;

    /// Draws a submesh inside the current instance.
    fn draw_mesh(&mut self, mesh: MeshHandle, custom_draw: bool) -> Result<(), RenderError>;

    /// Ends the current instance.
    fn end_instance(&mut self) -> Result<(), RenderError>;

    /// Draws a screen-covering triangle pair with the bound program.
    fn draw_fullscreen(&mut self) -> Result<(), RenderError>;

    /// Draws `vertices.len() / 4` quads sharing `key` in one call.
    fn draw_quad_batch(
        &mut self,
        key: &QuadBatchKey,
        vertices: &[QuadVertex],
    ) -> Result<(), RenderError>;
}
