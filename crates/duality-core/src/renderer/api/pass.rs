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

//! Descriptors for render targets, passes, fixed-function states and programs.

use crate::math::{Extent2D, LinearRgba, Rect, Vec3, Vec4};
use crate::renderer::api::flags::ClearFlags;
use crate::renderer::api::handles::RenderTargetId;
use serde::{Deserialize, Serialize};

/// Pixel format of a render target attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextureFormat {
    /// 8 bits per channel, normalized.
    Rgba8,
    /// 16-bit float per channel.
    Rgba16Float,
    /// 32-bit float per channel.
    Rgba32Float,
    /// 24-bit depth with 8-bit stencil.
    Depth24Stencil8,
}

impl TextureFormat {
    /// Size of one pixel in bytes.
    pub const fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::Rgba8 | TextureFormat::Depth24Stencil8 => 4,
            TextureFormat::Rgba16Float => 8,
            TextureFormat::Rgba32Float => 16,
        }
    }
}

/// Describes an offscreen render target.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderTargetDescriptor {
    /// Debug label.
    pub label: String,
    /// Size in pixels. Never zero.
    pub size: Extent2D,
    /// One format per color attachment, in attachment order.
    pub color_formats: Vec<TextureFormat>,
    /// Whether the target carries a depth attachment.
    pub depth: bool,
}

/// Where a pass draws to and how it prepares the target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassDescriptor {
    /// The render target, `None` for the screen.
    pub target: Option<RenderTargetId>,
    /// The color written by a color clear.
    pub clear_color: LinearRgba,
    /// Which buffers to clear.
    pub clear_flags: ClearFlags,
    /// The viewport in pixels.
    pub viewport: Rect,
}

/// How fragment output combines with the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Replace.
    Opaque,
    /// Classic `src_alpha, 1 - src_alpha` blending.
    Alpha,
    /// `One + One` accumulation. Commutative.
    Additive,
}

/// Fixed-function state bound before drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RenderStateDescriptor {
    /// Blend equation.
    pub blend: BlendMode,
    /// Whether fragments are depth-tested.
    pub depth_test: bool,
    /// Whether fragments write depth.
    pub depth_write: bool,
}

impl RenderStateDescriptor {
    /// Depth-tested, depth-writing opaque geometry.
    pub const OPAQUE: Self = Self {
        blend: BlendMode::Opaque,
        depth_test: true,
        depth_write: true,
    };
    /// Additive accumulation without depth.
    pub const ADDITIVE: Self = Self {
        blend: BlendMode::Additive,
        depth_test: false,
        depth_write: false,
    };
    /// Full-screen passes: opaque, no depth.
    pub const FULLSCREEN: Self = Self {
        blend: BlendMode::Opaque,
        depth_test: false,
        depth_write: false,
    };
    /// Screen-space sprites: alpha blended, no depth.
    pub const OVERLAY: Self = Self {
        blend: BlendMode::Alpha,
        depth_test: false,
        depth_write: false,
    };
}

/// The shader programs the pipeline asks a backend to provide.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ShaderProgramKind {
    /// Writes the G-buffer channels for static geometry.
    GBuffer,
    /// Writes the G-buffer channels for skinned geometry.
    SkinnedGBuffer,
    /// Accumulates one light from the G-buffer.
    Lighting,
    /// Screen-space ambient occlusion.
    Ssao,
    /// Depth-aware blur of the occlusion term.
    SsaoBlur,
    /// Copies a color target onto the screen.
    Composite,
    /// Textured, colored quads.
    Sprite,
    /// A user-supplied full-screen effect, identified by name.
    Custom(String),
}

/// A value uploaded to a full-screen effect.
#[derive(Debug, Clone, PartialEq)]
pub enum EffectValue {
    /// A scalar.
    Float(f32),
    /// A 4-component vector.
    Vec4(Vec4),
    /// An array of 3-component vectors, such as a sample kernel.
    Vec3Array(Vec<Vec3>),
}

/// A named parameter of a full-screen effect.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectParameter {
    /// Uniform name.
    pub name: &'static str,
    /// Value.
    pub value: EffectValue,
}

impl EffectParameter {
    /// Creates a scalar parameter.
    pub fn float(name: &'static str, value: f32) -> Self {
        Self {
            name,
            value: EffectValue::Float(value),
        }
    }
}
