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

//! Sizes and rectangles used for render targets and viewports.

use serde::{Deserialize, Serialize};

/// A 2D size in pixels, used for render targets and the output resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Extent2D {
    /// The width in pixels.
    pub width: u32,
    /// The height in pixels.
    pub height: u32,
}

impl Extent2D {
    /// Creates a new extent.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if either dimension is zero.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Width divided by height, or `1.0` for an empty extent.
    #[inline]
    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// An axis-aligned rectangle with `f32` coordinates and a top-left origin.
///
/// Cameras express their viewport as a `Rect` in normalized `[0, 1]` units relative to
/// the output; [`Rect::to_pixels`] turns it into a pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width, must be non-negative.
    pub width: f32,
    /// Height, must be non-negative.
    pub height: f32,
}

impl Rect {
    /// The full `[0, 1] x [0, 1]` normalized rectangle.
    pub const FULL: Self = Self::new(0.0, 0.0, 1.0, 1.0);

    /// Creates a new rectangle.
    #[inline]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if every coordinate is finite and the size is not negative.
    #[inline]
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Maps a normalized rectangle onto an output of the given size.
    #[inline]
    pub fn to_pixels(&self, extent: Extent2D) -> Self {
        let w = extent.width as f32;
        let h = extent.height as f32;
        Self::new(self.x * w, self.y * h, self.width * w, self.height * h)
    }

    /// The pixel size of the rectangle, rounded to the nearest integer.
    #[inline]
    pub fn extent(&self) -> Extent2D {
        Extent2D::new(self.width.round() as u32, self.height.round() as u32)
    }
}

impl Default for Rect {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_to_pixels_sub_region() {
        let r = Rect::new(0.5, 0.0, 0.5, 0.5).to_pixels(Extent2D::new(800, 600));
        assert_eq!(r, Rect::new(400.0, 0.0, 400.0, 300.0));
        assert_eq!(r.extent(), Extent2D::new(400, 300));
    }

    #[test]
    fn test_rect_validity() {
        assert!(Rect::FULL.is_valid());
        assert!(!Rect::new(0.0, 0.0, -1.0, 1.0).is_valid());
        assert!(!Rect::new(f32::NAN, 0.0, 1.0, 1.0).is_valid());
    }
}
