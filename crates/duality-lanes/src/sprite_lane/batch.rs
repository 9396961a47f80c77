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

use crate::render_lane::ProgramCache;
use bytemuck::Zeroable;
use duality_core::math::Mat4;
use duality_core::renderer::{
    GraphicsBackend, Quad, QuadBatchKey, QuadVertex, RenderError, RenderStateDescriptor,
    ShaderProgramKind,
};

/// Accumulates quads and draws runs sharing a [`QuadBatchKey`] in one call.
///
/// Only consecutive quads are merged, so submission order is also draw order. The
/// backing store is indexed rather than pushed into and doubles when full; it is kept
/// across frames.
#[derive(Debug)]
pub struct SpriteBatch {
    vertices: Vec<QuadVertex>,
    keys: Vec<QuadBatchKey>,
    pending: usize,
}

impl Default for SpriteBatch {
    fn default() -> Self {
        Self::with_capacity(64)
    }
}

impl SpriteBatch {
    /// Creates a batch with room for `quads` quads before growing.
    pub fn with_capacity(quads: usize) -> Self {
        let quads = quads.max(1);
        Self {
            vertices: vec![QuadVertex::zeroed(); quads * 4],
            keys: vec![QuadBatchKey::default(); quads],
            pending: 0,
        }
    }

    /// Quads the store holds before it has to grow.
    pub fn capacity(&self) -> usize {
        self.keys.len()
    }

    /// Quads waiting for the next [`render`](Self::render).
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Queues one quad.
    pub fn add_quad(&mut self, key: QuadBatchKey, quad: &Quad) {
        if self.pending == self.capacity() {
            let capacity = self.capacity() * 2;
            log::debug!("Sprite batch grows to {capacity} quads");
            self.vertices.resize(capacity * 4, QuadVertex::zeroed());
            self.keys.resize(capacity, QuadBatchKey::default());
        }
        let first = self.pending * 4;
        self.vertices[first..first + 4].copy_from_slice(&quad.vertices);
        self.keys[self.pending] = key;
        self.pending += 1;
    }

    /// Drops every pending quad.
    pub fn clear(&mut self) {
        self.pending = 0;
    }

    /// Draws every pending quad into the open pass and empties the batch.
    ///
    /// Uses a single orthographic projection mapping pixels of a `width` x `height`
    /// viewport, origin top-left. Returns the number of batches flushed.
    pub fn render(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        programs: &mut ProgramCache,
        width: u32,
        height: u32,
    ) -> Result<usize, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::invalid_argument(
                "viewport",
                format!("{width}x{height} has a zero dimension"),
            ));
        }
        if self.pending == 0 {
            return Ok(0);
        }

        let projection = Mat4::orthographic_rh_zo(0.0, width as f32, height as f32, 0.0, -1.0, 1.0);
        let state = programs.render_state(backend, &RenderStateDescriptor::OVERLAY)?;
        let program = programs.program(backend, &ShaderProgramKind::Sprite)?;
        backend.set_render_state(state)?;
        backend.use_program(program)?;
        backend.set_camera(&Mat4::IDENTITY, &projection)?;

        let mut flushes = 0;
        let mut start = 0;
        for end in 1..=self.pending {
            if end < self.pending && self.keys[end] == self.keys[start] {
                continue;
            }
            let key = self.keys[start];
            if let Some(texture) = key.texture {
                backend.bind_texture(0, texture)?;
            }
            backend.draw_quad_batch(&key, &self.vertices[start * 4..end * 4])?;
            flushes += 1;
            start = end;
        }
        log::trace!("Flushed {} sprite quads in {flushes} batches", self.pending);
        self.pending = 0;
        Ok(flushes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duality_core::math::{LinearRgba, Rect, Vec2};
    use duality_core::renderer::{
        BackendCommand, ClearFlags, HeadlessBackend, PassDescriptor, SpriteFlags, TextureId,
    };

    fn key(texture: usize) -> QuadBatchKey {
        QuadBatchKey {
            texture: Some(TextureId(texture)),
            flags: SpriteFlags::ALPHA_BLEND,
            smooth: true,
        }
    }

    fn quad() -> Quad {
        Quad::rect(Vec2::ZERO, Vec2::new(8.0, 8.0), 0.0, LinearRgba::WHITE)
    }

    fn open_pass(backend: &mut HeadlessBackend) {
        backend.begin_scene().unwrap();
        backend
            .begin_pass(&PassDescriptor {
                target: None,
                clear_color: LinearRgba::BLACK,
                clear_flags: ClearFlags::NONE,
                viewport: Rect::new(0.0, 0.0, 64.0, 64.0),
            })
            .unwrap();
    }

    fn batch_sizes(backend: &HeadlessBackend) -> Vec<(QuadBatchKey, usize)> {
        backend
            .commands()
            .iter()
            .filter_map(|c| match c {
                BackendCommand::DrawQuadBatch { key, quads } => Some((*key, *quads)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_consecutive_runs_are_merged() {
        let mut backend = HeadlessBackend::new();
        let mut programs = ProgramCache::new();
        open_pass(&mut backend);

        let mut batch = SpriteBatch::default();
        for _ in 0..3 {
            batch.add_quad(key(1), &quad());
        }
        for _ in 0..2 {
            batch.add_quad(key(2), &quad());
        }
        batch.add_quad(key(1), &quad());

        assert_eq!(batch.render(&mut backend, &mut programs, 64, 64).unwrap(), 3);
        assert_eq!(batch_sizes(&backend), vec![(key(1), 3), (key(2), 2), (key(1), 1)]);
        assert_eq!(batch.pending(), 0);

        let ortho = backend.commands().iter().find_map(|c| match c {
            BackendCommand::SetCamera { projection, .. } => Some(*projection),
            _ => None,
        });
        assert_eq!(
            ortho,
            Some(Mat4::orthographic_rh_zo(0.0, 64.0, 64.0, 0.0, -1.0, 1.0))
        );
    }

    #[test]
    fn test_capacity_doubles_and_is_kept() {
        let mut backend = HeadlessBackend::new();
        let mut programs = ProgramCache::new();
        open_pass(&mut backend);

        let mut batch = SpriteBatch::with_capacity(2);
        for _ in 0..5 {
            batch.add_quad(key(1), &quad());
        }
        assert_eq!(batch.capacity(), 8);
        batch.render(&mut backend, &mut programs, 64, 64).unwrap();
        assert_eq!(batch.capacity(), 8);
        assert_eq!(batch_sizes(&backend), vec![(key(1), 5)]);
    }

    #[test]
    fn test_zero_viewport_is_rejected() {
        let mut backend = HeadlessBackend::new();
        let mut programs = ProgramCache::new();
        let mut batch = SpriteBatch::default();
        batch.add_quad(key(1), &quad());
        assert!(matches!(
            batch.render(&mut backend, &mut programs, 0, 64),
            Err(RenderError::InvalidArgument { name: "viewport", .. })
        ));
        assert_eq!(batch.pending(), 1);
        assert!(backend.commands().is_empty());
    }

    #[test]
    fn test_empty_batch_issues_nothing() {
        let mut backend = HeadlessBackend::new();
        let mut programs = ProgramCache::new();
        open_pass(&mut backend);
        let before = backend.commands().len();
        assert_eq!(SpriteBatch::default().render(&mut backend, &mut programs, 64, 64).unwrap(), 0);
        assert_eq!(backend.commands().len(), before);
    }
}
