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

//! Screen-space quads and the key used to batch them.

use crate::math::{LinearRgba, Vec2, Vec3};
use crate::renderer::api::flags::SpriteFlags;
use crate::renderer::api::handles::TextureId;

/// One corner of a sprite quad, laid out for direct upload.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct QuadVertex {
    /// Position in pixels; `z` is the depth.
    pub position: Vec3,
    /// Texture coordinate.
    pub tex_coord: Vec2,
    /// Vertex tint.
    pub color: LinearRgba,
}

/// Four vertices in top-left, top-right, bottom-right, bottom-left order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    /// The corners.
    pub vertices: [QuadVertex; 4],
}

impl Quad {
    /// An axis-aligned rectangle covering the full texture.
    pub fn rect(position: Vec2, size: Vec2, depth: f32, color: LinearRgba) -> Self {
        let corner = |dx: f32, dy: f32| QuadVertex {
            position: Vec3::new(position.x + size.x * dx, position.y + size.y * dy, depth),
            tex_coord: Vec2::new(dx, dy),
            color,
        };
        Self {
            vertices: [
                corner(0.0, 0.0),
                corner(1.0, 0.0),
                corner(1.0, 1.0),
                corner(0.0, 1.0),
            ],
        }
    }
}

/// Quads sharing a key can be drawn in one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QuadBatchKey {
    /// The texture sampled, `None` for flat color.
    pub texture: Option<TextureId>,
    /// Blend and depth options.
    pub flags: SpriteFlags,
    /// Linear (`true`) or nearest (`false`) filtering.
    pub smooth: bool,
}
