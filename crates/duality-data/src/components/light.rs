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

use super::{ComponentState, SharedTransform};
use duality_core::math::LinearRgba;
use duality_core::renderer::{LightKind, LightParameters};

/// A light attached to a scene object.
///
/// Position and direction come from the shared transform. Registered lights are read by
/// the lighting pass every frame; disabled ones are skipped.
#[derive(Debug, Clone)]
pub struct LightComponent {
    /// The light shape.
    pub kind: LightKind,
    /// Linear color.
    pub color: LinearRgba,
    /// Intensity multiplier.
    pub intensity: f32,
    /// Whether the lighting pass uses this light.
    pub enabled: bool,
    transform: SharedTransform,
    state: ComponentState,
}

impl LightComponent {
    /// Creates an enabled white light of intensity `1.0`.
    pub fn new(kind: LightKind, transform: SharedTransform) -> Self {
        Self {
            kind,
            color: LinearRgba::WHITE,
            intensity: 1.0,
            enabled: true,
            transform,
            state: ComponentState::Inactive,
        }
    }

    /// Builder-style setter for color and intensity.
    pub fn with_color(mut self, color: LinearRgba, intensity: f32) -> Self {
        self.color = color;
        self.intensity = intensity;
        self
    }

    /// The lifecycle state, driven by the `Stage`.
    pub fn state(&self) -> ComponentState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ComponentState) {
        self.state = state;
    }

    /// Resolves the light against the current transform.
    pub fn parameters(&self) -> LightParameters {
        let transform = self.transform.borrow();
        LightParameters {
            kind: self.kind,
            position: transform.translation(),
            direction: transform.forward().normalize(),
            color: self.color,
            intensity: self.intensity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Transform;
    use duality_core::math::{Quaternion, Vec3, FRAC_PI_2};
    use approx::assert_relative_eq;

    #[test]
    fn test_parameters_follow_transform() {
        let transform = Transform::from_translation(Vec3::new(1.0, 2.0, 3.0)).into_shared();
        let light = LightComponent::new(LightKind::Point { range: 5.0 }, transform.clone())
            .with_color(LinearRgba::rgb(1.0, 0.5, 0.0), 2.0);
        let p = light.parameters();
        assert_eq!(p.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(p.radiance(), LinearRgba::rgb(2.0, 1.0, 0.0));

        transform
            .borrow_mut()
            .set_rotation(Quaternion::from_axis_angle(Vec3::Y, FRAC_PI_2));
        assert_relative_eq!(light.parameters().direction, -Vec3::X, epsilon = 1e-5);
    }
}
