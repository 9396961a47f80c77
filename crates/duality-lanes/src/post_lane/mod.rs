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

//! Full-screen effects applied between lighting and composite.
//!
//! Effects run in a fixed order: screen-space ambient occlusion first, then custom
//! effects in registration order. Each effect reads the previous output and writes
//! into one of two ping-pong targets, so the chain never reads and writes the same
//! target in one pass.

mod fullscreen;
mod ssao;

pub use fullscreen::*;
pub use ssao::*;

use crate::render_lane::{LaneError, ProgramCache};
use duality_core::math::{Extent2D, LinearRgba, Rect};
use duality_core::renderer::{
    ClearFlags, GraphicsBackend, PassDescriptor, RenderError, RenderTargetDescriptor,
    RenderTargetId, TextureFormat,
};
use std::fmt;

/// What an effect needs to run one pass.
#[derive(Debug)]
pub struct EffectContext<'a> {
    /// Program and state cache of the renderer.
    pub programs: &'a mut ProgramCache,
    /// The G-buffer, readable through its attachments.
    pub gbuffer: RenderTargetId,
    /// Color produced by the previous stage.
    pub input: RenderTargetId,
    /// Where this effect writes.
    pub output: RenderTargetId,
    /// Size of every target in the chain.
    pub size: Extent2D,
}

/// A full-screen pass in the post chain.
pub trait PostEffect: fmt::Debug {
    /// Unique name within a chain.
    fn name(&self) -> &str;

    /// Disabled effects are skipped and cost nothing.
    fn is_enabled(&self) -> bool;

    /// Enables or disables the effect.
    fn set_enabled(&mut self, enabled: bool);

    /// Reads `ctx.input`, writes `ctx.output` and returns the draw calls issued.
    ///
    /// Called with a scene open and no pass open; the effect must leave no pass open.
    fn apply(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        ctx: &mut EffectContext<'_>,
    ) -> Result<usize, RenderError>;

    /// Destroys backend resources the effect owns.
    fn release(&mut self, _backend: &mut dyn GraphicsBackend) {}

    /// Drops resource handles without touching the backend.
    fn forget(&mut self) {}
}

/// Begins a pass writing all of `target` without clearing it.
pub(crate) fn begin_effect_pass(
    backend: &mut dyn GraphicsBackend,
    target: RenderTargetId,
    size: Extent2D,
) -> Result<(), RenderError> {
    backend.begin_pass(&PassDescriptor {
        target: Some(target),
        clear_color: LinearRgba::TRANSPARENT,
        clear_flags: ClearFlags::NONE,
        viewport: Rect::new(0.0, 0.0, size.width as f32, size.height as f32),
    })
}

/// Result of running the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainOutput {
    /// Target holding the final color.
    pub target: RenderTargetId,
    /// Effects that ran.
    pub effects: usize,
    /// Draw calls issued.
    pub draw_calls: usize,
}

/// The ordered post-processing chain.
#[derive(Debug)]
pub struct PostEffectChain {
    ssao: SsaoEffect,
    custom: Vec<Box<dyn PostEffect>>,
    format: TextureFormat,
    targets: Option<[RenderTargetId; 2]>,
    target_size: Extent2D,
}

impl PostEffectChain {
    /// Creates a chain holding only `ssao`. Ping-pong targets use `format`.
    pub fn new(ssao: SsaoEffect, format: TextureFormat) -> Self {
        Self {
            ssao,
            custom: Vec::new(),
            format,
            targets: None,
            target_size: Extent2D::default(),
        }
    }

    /// The built-in ambient occlusion effect.
    pub fn ssao(&self) -> &SsaoEffect {
        &self.ssao
    }

    /// Mutable access to the built-in ambient occlusion effect.
    pub fn ssao_mut(&mut self) -> &mut SsaoEffect {
        &mut self.ssao
    }

    /// Appends a custom effect after every effect already registered.
    pub fn add_effect(&mut self, effect: Box<dyn PostEffect>) -> Result<(), LaneError> {
        if self.effect_names().any(|name| name == effect.name()) {
            return Err(LaneError::DuplicateEffect(effect.name().to_owned()));
        }
        log::debug!("Added post effect '{}'", effect.name());
        self.custom.push(effect);
        Ok(())
    }

    /// Removes a custom effect. The built-in ambient occlusion can only be disabled.
    pub fn remove_effect(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        name: &str,
    ) -> Result<Box<dyn PostEffect>, LaneError> {
        let index = self
            .custom
            .iter()
            .position(|e| e.name() == name)
            .ok_or_else(|| LaneError::EffectNotFound(name.to_owned()))?;
        let mut effect = self.custom.remove(index);
        effect.release(backend);
        Ok(effect)
    }

    /// Enables or disables an effect by name.
    pub fn set_enabled(&mut self, name: &str, enabled: bool) -> Result<(), LaneError> {
        if self.ssao.name() == name {
            self.ssao.set_enabled(enabled);
            return Ok(());
        }
        let effect = self
            .custom
            .iter_mut()
            .find(|e| e.name() == name)
            .ok_or_else(|| LaneError::EffectNotFound(name.to_owned()))?;
        effect.set_enabled(enabled);
        Ok(())
    }

    /// Every effect name in execution order, disabled ones included.
    pub fn effect_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.ssao.name()).chain(self.custom.iter().map(|e| e.name()))
    }

    /// Number of effects that would run this frame.
    pub fn enabled_count(&self) -> usize {
        usize::from(self.ssao.is_enabled()) + self.custom.iter().filter(|e| e.is_enabled()).count()
    }

    /// Runs every enabled effect over `input`.
    ///
    /// With nothing enabled no pass is issued and `input` is returned untouched.
    pub fn run(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        programs: &mut ProgramCache,
        gbuffer: RenderTargetId,
        input: RenderTargetId,
        size: Extent2D,
    ) -> Result<ChainOutput, RenderError> {
        let mut output = ChainOutput {
            target: input,
            effects: 0,
            draw_calls: 0,
        };
        if self.enabled_count() == 0 {
            return Ok(output);
        }
        let targets = self.ensure_targets(backend, size)?;

        let mut run_one = |effect: &mut dyn PostEffect, out: &mut ChainOutput| {
            let target = targets[out.effects % 2];
            let mut ctx = EffectContext {
                programs: &mut *programs,
                gbuffer,
                input: out.target,
                output: target,
                size,
            };
            log::trace!("Post effect '{}' -> {target:?}", effect.name());
            out.draw_calls += effect.apply(&mut *backend, &mut ctx)?;
            out.target = target;
            out.effects += 1;
            Ok::<(), RenderError>(())
        };

        if self.ssao.is_enabled() {
            run_one(&mut self.ssao, &mut output)?;
        }
        for effect in self.custom.iter_mut().filter(|e| e.is_enabled()) {
            run_one(effect.as_mut(), &mut output)?;
        }
        Ok(output)
    }

    fn ensure_targets(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        size: Extent2D,
    ) -> Result<[RenderTargetId; 2], RenderError> {
        if let Some(targets) = self.targets {
            let alive = targets.iter().all(|&id| backend.has_render_target(id));
            if self.target_size == size && alive {
                return Ok(targets);
            }
        }
        self.release_targets(backend);
        let mut create = |label: &str| {
            backend.create_render_target(&RenderTargetDescriptor {
                label: label.to_owned(),
                size,
                color_formats: vec![self.format],
                depth: false,
            })
        };
        let ping = create("post.ping")?;
        let pong = create("post.pong")?;
        self.targets = Some([ping, pong]);
        self.target_size = size;
        Ok([ping, pong])
    }

    fn release_targets(&mut self, backend: &mut dyn GraphicsBackend) {
        for id in self.targets.take().into_iter().flatten() {
            if let Err(err) = backend.destroy_render_target(id) {
                log::debug!("Dropping stale post target {id:?}: {err}");
            }
        }
    }

    /// Destroys the chain's targets and every effect's resources.
    pub fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        self.release_targets(backend);
        self.ssao.release(backend);
        for effect in &mut self.custom {
            effect.release(backend);
        }
    }

    /// Drops every handle without touching the backend.
    pub fn forget(&mut self) {
        self.targets = None;
        self.ssao.forget();
        for effect in &mut self.custom {
            effect.forget();
        }
    }
}
