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

//! Lazily created shader programs and render states.

use duality_core::renderer::{
    GraphicsBackend, RenderStateDescriptor, RenderStateId, ResourceError, ShaderProgramId,
    ShaderProgramKind,
};
use std::collections::HashMap;

/// Caches the programs and states a renderer has asked its backend for.
///
/// Each entry is created on first use. The cache belongs to one renderer and must be
/// [`clear`](Self::clear)ed when the backend it was filled from goes away.
#[derive(Debug, Default)]
pub struct ProgramCache {
    programs: HashMap<ShaderProgramKind, ShaderProgramId>,
    states: HashMap<RenderStateDescriptor, RenderStateId>,
}

impl ProgramCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the program for `kind`, creating it on first use.
    pub fn program(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        kind: &ShaderProgramKind,
    ) -> Result<ShaderProgramId, ResourceError> {
        if let Some(id) = self.programs.get(kind) {
            return Ok(*id);
        }
        let id = backend.create_shader_program(kind)?;
        log::debug!("Created shader program {kind:?} as {id:?}");
        self.programs.insert(kind.clone(), id);
        Ok(id)
    }

    /// Returns the state object for `descriptor`, creating it on first use.
    pub fn render_state(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        descriptor: &RenderStateDescriptor,
    ) -> Result<RenderStateId, ResourceError> {
        if let Some(id) = self.states.get(descriptor) {
            return Ok(*id);
        }
        let id = backend.create_render_state(descriptor)?;
        self.states.insert(*descriptor, id);
        Ok(id)
    }

    /// Number of cached programs.
    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// Forgets every cached entry.
    pub fn clear(&mut self) {
        self.programs.clear();
        self.states.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duality_core::renderer::{BackendCommand, HeadlessBackend};

    #[test]
    fn test_programs_are_created_once() {
        let mut backend = HeadlessBackend::new();
        let mut cache = ProgramCache::new();
        let a = cache.program(&mut backend, &ShaderProgramKind::GBuffer).unwrap();
        let b = cache.program(&mut backend, &ShaderProgramKind::GBuffer).unwrap();
        assert_eq!(a, b);
        cache
            .render_state(&mut backend, &RenderStateDescriptor::OPAQUE)
            .unwrap();
        cache
            .render_state(&mut backend, &RenderStateDescriptor::OPAQUE)
            .unwrap();

        let creations = backend
            .commands()
            .iter()
            .filter(|c| {
                matches!(
                    c,
                    BackendCommand::CreateShaderProgram { .. } | BackendCommand::CreateRenderState { .. }
                )
            })
            .count();
        assert_eq!(creations, 2);
        assert_eq!(cache.program_count(), 1);
    }

    #[test]
    fn test_dead_backend_fails_creation() {
        let mut backend = HeadlessBackend::new();
        backend.shutdown();
        let mut cache = ProgramCache::new();
        assert!(cache.program(&mut backend, &ShaderProgramKind::Lighting).is_err());
        assert_eq!(cache.program_count(), 0);
    }
}
