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

//! Light descriptions handed to the lighting pass.

use crate::math::{LinearRgba, Vec3};
use serde::{Deserialize, Serialize};

/// The shape of a light source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LightKind {
    /// Uniform light from every direction. Ignores position and direction.
    Ambient,
    /// Parallel rays along a direction, like the sun.
    Directional,
    /// Omnidirectional light with a finite range.
    Point {
        /// Distance at which the contribution reaches zero.
        range: f32,
    },
    /// A cone of light.
    Spot {
        /// Distance at which the contribution reaches zero.
        range: f32,
        /// Half-angle of the fully lit cone, in radians.
        inner_angle: f32,
        /// Half-angle where the light fades to zero, in radians.
        outer_angle: f32,
    },
}

/// A world-space light, resolved for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParameters {
    /// The light shape.
    pub kind: LightKind,
    /// World position. Unused by ambient and directional lights.
    pub position: Vec3,
    /// Normalized direction the light points to. Unused by ambient and point lights.
    pub direction: Vec3,
    /// Linear color.
    pub color: LinearRgba,
    /// Intensity multiplier.
    pub intensity: f32,
}

impl LightParameters {
    /// The color pre-multiplied by the intensity.
    pub fn radiance(&self) -> LinearRgba {
        self.color.scaled(self.intensity)
    }
}
