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

//! Render targets owned by the deferred pipeline.

use duality_core::math::Extent2D;
use duality_core::renderer::{
    GraphicsBackend, RenderError, RenderTargetDescriptor, RenderTargetId, TextureFormat,
};

/// G-buffer color attachments, in attachment order.
pub const GBUFFER_CHANNELS: [&str; 4] = ["position", "normal", "albedo", "material"];

/// Attachment index of view-space positions.
pub const POSITION_ATTACHMENT: u32 = 0;
/// Attachment index of view-space normals.
pub const NORMAL_ATTACHMENT: u32 = 1;

/// The geometry buffer plus the lighting accumulation target.
///
/// Targets are created lazily by [`ensure`](Self::ensure). A resize only records the
/// new size; the stale targets are destroyed and recreated at the next `ensure`.
#[derive(Debug)]
pub struct GBuffer {
    size: Extent2D,
    format: TextureFormat,
    lighting_format: TextureFormat,
    geometry: Option<RenderTargetId>,
    lighting: Option<RenderTargetId>,
    built_size: Extent2D,
    generation: u64,
}

impl GBuffer {
    /// Describes a G-buffer of `size`. Nothing is allocated yet.
    pub fn new(size: Extent2D, format: TextureFormat, lighting_format: TextureFormat) -> Self {
        Self {
            size,
            format,
            lighting_format,
            geometry: None,
            lighting: None,
            built_size: Extent2D::default(),
            generation: 0,
        }
    }

    /// The size the next [`ensure`](Self::ensure) builds for.
    pub fn size(&self) -> Extent2D {
        self.size
    }

    /// How many times the targets were (re)built.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The geometry target, if built.
    pub fn geometry_target(&self) -> Option<RenderTargetId> {
        self.geometry
    }

    /// The lighting target, if built.
    pub fn lighting_target(&self) -> Option<RenderTargetId> {
        self.lighting
    }

    /// Requests a new size.
    pub fn resize(&mut self, size: Extent2D) -> Result<(), RenderError> {
        if size.is_empty() {
            return Err(RenderError::invalid_argument(
                "size",
                format!("{}x{} has a zero dimension", size.width, size.height),
            ));
        }
        if size != self.size {
            log::debug!(
                "G-buffer resize requested: {}x{} -> {}x{}",
                self.size.width,
                self.size.height,
                size.width,
                size.height
            );
            self.size = size;
        }
        Ok(())
    }

    /// Makes sure both targets exist at the requested size and returns
    /// `(geometry, lighting)`.
    pub fn ensure(
        &mut self,
        backend: &mut dyn GraphicsBackend,
    ) -> Result<(RenderTargetId, RenderTargetId), RenderError> {
        if let (Some(geometry), Some(lighting)) = (self.geometry, self.lighting) {
            let alive = backend.has_render_target(geometry) && backend.has_render_target(lighting);
            if self.built_size == self.size && alive {
                return Ok((geometry, lighting));
            }
            if !alive {
                log::debug!("G-buffer targets were lost by the backend; rebuilding");
            }
        }
        self.release(backend);

        let geometry = backend.create_render_target(&RenderTargetDescriptor {
            label: "gbuffer".to_owned(),
            size: self.size,
            color_formats: vec![self.format; GBUFFER_CHANNELS.len()],
            depth: true,
        })?;
        self.geometry = Some(geometry);
        let lighting = backend.create_render_target(&RenderTargetDescriptor {
            label: "lighting".to_owned(),
            size: self.size,
            color_formats: vec![self.lighting_format],
            depth: false,
        })?;
        self.lighting = Some(lighting);

        self.built_size = self.size;
        self.generation += 1;
        log::info!(
            "Built G-buffer at {}x{} (generation {})",
            self.size.width,
            self.size.height,
            self.generation
        );
        Ok((geometry, lighting))
    }

    /// Destroys the targets. Handles the backend no longer knows are dropped quietly.
    pub fn release(&mut self, backend: &mut dyn GraphicsBackend) {
        for id in [self.geometry.take(), self.lighting.take()].into_iter().flatten() {
            if let Err(err) = backend.destroy_render_target(id) {
                log::debug!("Dropping stale render target {id:?}: {err}");
            }
        }
    }

    /// Drops the handles without touching the backend, for after it shut down.
    pub fn forget(&mut self) {
        self.geometry = None;
        self.lighting = None;
    }
}
