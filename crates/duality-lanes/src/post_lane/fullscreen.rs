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
use crate::render_lane::GBUFFER_CHANNELS;
use duality_core::renderer::{
    EffectParameter, GraphicsBackend, RenderError, RenderStateDescriptor, ShaderProgramKind,
};

/// A single-pass effect running a custom program over the previous output.
///
/// The program is requested as [`ShaderProgramKind::Custom`] with the effect name;
/// the input color is bound to slot 0 and the G-buffer attachments to slots 1-4.
#[derive(Debug, Clone)]
pub struct FullscreenEffect {
    name: String,
    enabled: bool,
    parameters: Vec<EffectParameter>,
}

impl FullscreenEffect {
    /// Creates an enabled effect without parameters.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            parameters: Vec::new(),
        }
    }

    /// Adds a parameter uploaded before every draw.
    pub fn with_parameter(mut self, parameter: EffectParameter) -> Self {
        self.set_parameter(parameter);
        self
    }

    /// Sets a parameter, replacing any with the same name.
    pub fn set_parameter(&mut self, parameter: EffectParameter) {
        match self.parameters.iter_mut().find(|p| p.name == parameter.name) {
            Some(existing) => *existing = parameter,
            None => self.parameters.push(parameter),
        }
    }

    /// Current parameters.
    pub fn parameters(&self) -> &[EffectParameter] {
        &self.parameters
    }
}

impl PostEffect for FullscreenEffect {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn apply(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        ctx: &mut EffectContext<'_>,
    ) -> Result<usize, RenderError> {
        let state = ctx
            .programs
            .render_state(backend, &RenderStateDescriptor::FULLSCREEN)?;
        let program = ctx
            .programs
            .program(backend, &ShaderProgramKind::Custom(self.name.clone()))?;

        begin_effect_pass(backend, ctx.output, ctx.size)?;
        backend.set_render_state(state)?;
        backend.use_program(program)?;
        backend.bind_render_target(0, ctx.input, 0)?;
        for attachment in 0..GBUFFER_CHANNELS.len() as u32 {
            backend.bind_render_target(attachment + 1, ctx.gbuffer, attachment)?;
        }
        if !self.parameters.is_empty() {
            backend.set_effect_parameters(&self.parameters)?;
        }
        backend.draw_fullscreen()?;
        backend.end_pass()?;
        Ok(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_replace_by_name() {
        let mut fx = FullscreenEffect::new("exposure").with_parameter(EffectParameter::float("ev", 1.0));
        fx.set_parameter(EffectParameter::float("ev", 2.0));
        fx.set_parameter(EffectParameter::float("gamma", 2.2));
        assert_eq!(fx.parameters().len(), 2);
        assert_eq!(fx.parameters()[0], EffectParameter::float("ev", 2.0));
    }
}
