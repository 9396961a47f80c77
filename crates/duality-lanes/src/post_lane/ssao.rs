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

use super::{begin_effect_pass, EffectContext, PostEffect};
use crate::render_lane::{NORMAL_ATTACHMENT, POSITION_ATTACHMENT};
use duality_core::math::{Extent2D, Vec3, Vec4, TAU};
use duality_core::renderer::{
    EffectParameter, EffectValue, GraphicsBackend, RenderError, RenderStateDescriptor,
    RenderTargetDescriptor, RenderTargetId, ShaderProgramKind, TextureFormat,
};
use duality_core::settings::SsaoSettings;

/// Radical inverse of `index` in `base`.
fn halton(index: u32, base: u32) -> f32 {
    let mut result = 0.0;
    let mut fraction = 1.0 / base as f32;
    let mut i = index;
    while i > 0 {
        result += fraction * (i % base) as f32;
        i /= base;
        fraction /= base as f32;
    }
    result
}

/// Builds `count` sample offsets in the +Z hemisphere.
///
/// Directions come from a Halton sequence, so the kernel is the same every run.
/// Sample `i` has length `lerp(0.1, 1.0, (i / count)^2)`, packing samples near the
/// origin where occlusion matters most.
pub fn hemisphere_kernel(count: usize) -> Vec<Vec3> {
    (0..count)
        .map(|i| {
            let phi = TAU * halton(i as u32 + 1, 2);
            let cos_theta = 1.0 - halton(i as u32 + 1, 3);
            let sin_theta = (1.0 - cos_theta * cos_theta).max(0.0).sqrt();
            let direction = Vec3::new(sin_theta * phi.cos(), sin_theta * phi.sin(), cos_theta);

            let t = i as f32 / count as f32;
            direction * (0.1 + 0.9 * t * t)
        })
        .collect()
}

/// Screen-space ambient occlusion over the lighting result.
///
/// Samples G-buffer positions and normals with a hemisphere kernel and darkens the
/// input color by the occlusion term. With blur enabled the raw term is written to a
/// scratch target and a second pass blurs it while applying it.
#[derive(Debug)]
pub struct SsaoEffect {
    settings: SsaoSettings,
    kernel: Vec<Vec3>,
    format: TextureFormat,
    scratch: Option<RenderTargetId>,
    scratch_size: Extent2D,
}

impl SsaoEffect {
    /// Name of the effect inside a chain.
    pub const NAME: &'static str = "ssao";

    /// Creates the effect. The scratch target uses `format`.
    pub fn new(settings: SsaoSettings, format: TextureFormat) -> Self {
        Self {
            kernel: hemisphere_kernel(settings.kernel_size as usize),
            settings,
            format,
            scratch: None,
            scratch_size: Extent2D::default(),
        }
    }

    /// Current settings.
    pub fn settings(&self) -> &SsaoSettings {
        &self.settings
    }

    /// Replaces the settings, rebuilding the kernel if its size changed.
    pub fn set_settings(&mut self, settings: SsaoSettings) {
        if settings.kernel_size != self.settings.kernel_size {
            self.kernel = hemisphere_kernel(settings.kernel_size as usize);
        }
        self.settings = settings;
    }

    /// The sample kernel.
    pub fn kernel(&self) -> &[Vec3] {
        &self.kernel
    }

    fn parameters(&self, size: Extent2D) -> Vec<EffectParameter> {
        let (w, h) = (size.width as f32, size.height as f32);
        vec![
            EffectParameter::float("radius", self.settings.radius),
            EffectParameter::float("bias", self.settings.bias),
            EffectParameter::float("intensity", self.settings.intensity),
            EffectParameter {
                name: "kernel",
                value: EffectValue::Vec3Array(self.kernel.clone()),
            },
            EffectParameter {
                name: "screen_size",
                value: EffectValue::Vec4(Vec4::new(w, h, 1.0 / w, 1.0 / h)),
            },
        ]
    }

    fn ensure_scratch(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        size: Extent2D,
    ) -> Result<RenderTargetId, RenderError> {
        if let Some(id) = self.scratch {
            if self.scratch_size == size && backend.has_render_target(id) {
                return Ok(id);
            }
        }
        self.release(backend);
        let id = backend.create_render_target(&RenderTargetDescriptor {
            label: "ssao.occlusion".to_owned(),
            size,
            color_formats: vec![self.format],
            depth: false,
        })?;
        self.scratch = Some(id);
        self.scratch_size = size;
        Ok(id)
    }
}

impl PostEffect for SsaoEffect {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn is_enabled(&self) -> bool {
        self.settings.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.settings.enabled = enabled;
    }

    fn apply(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        ctx: &mut EffectContext<'_>,
    ) -> Result<usize, RenderError> {
        let occlusion_target = if self.settings.blur {
            self.ensure_scratch(backend, ctx.size)?
        } else {
            ctx.output
        };
        let state = ctx
            .programs
            .render_state(backend, &RenderStateDescriptor::FULLSCREEN)?;
        let program = ctx.programs.program(backend, &ShaderProgramKind::Ssao)?;

        begin_effect_pass(backend, occlusion_target, ctx.size)?;
        backend.set_render_state(state)?;
        backend.use_program(program)?;
        backend.bind_render_target(0, ctx.input, 0)?;
        backend.bind_render_target(1, ctx.gbuffer, POSITION_ATTACHMENT)?;
        backend.bind_render_target(2, ctx.gbuffer, NORMAL_ATTACHMENT)?;
        backend.set_effect_parameters(&self.parameters(ctx.size))?;
        backend.draw_fullscreen()?;
        backend.end_pass()?;

        if !self.settings.blur {
            return Ok(1);
        }

        let blur = ctx.programs.program(backend, &ShaderProgramKind::SsaoBlur)?;
        begin_effect_pass(backend, ctx.output, ctx.size)?;
        backend.set_render_state(state)?;
        backend.use_program(blur)?;
        backend.bind_render_target(0, occlusion_target, 0)?;
        backend.bind_render_target(1, ctx.input, 0)?;
        backend.bind_render_target(2, ctx.gbuffer, POSITION_ATTACHMENT)?;
        backend.draw_fullscreen()?;
        backend.end_pass()?;
        Ok(2)
    }

    fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        if let Some(id) = self.scratch.take() {
            if let Err(err) = backend.destroy_render_target(id) {
                log::debug!("Dropping stale occlusion target {id:?}: {err}");
            }
        }
    }

    fn forget(&mut self) {
        self.scratch = None;
    }
}
