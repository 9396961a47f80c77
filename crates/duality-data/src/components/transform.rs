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

use duality_core::math::{Mat4, Quaternion, Vec3};
use std::cell::RefCell;
use std::rc::Rc;

/// A transform shared between a scene object and the components attached to it.
pub type SharedTransform = Rc<RefCell<Transform>>;

/// Position, rotation and scale of a scene object in world space.
///
/// Every mutation bumps a version counter. Components compare it with the version they
/// last saw to decide whether cached data derived from the transform is stale.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    translation: Vec3,
    rotation: Quaternion,
    scale: Vec3,
    version: u64,
}

impl Transform {
    /// Creates a transform from its parts.
    pub fn new(translation: Vec3, rotation: Quaternion, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            version: 0,
        }
    }

    /// Creates a transform with a translation and identity rotation/scale.
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quaternion::IDENTITY, Vec3::ONE)
    }

    /// The identity transform.
    pub fn identity() -> Self {
        Self::from_translation(Vec3::ZERO)
    }

    /// Wraps the transform for sharing with components.
    pub fn into_shared(self) -> SharedTransform {
        Rc::new(RefCell::new(self))
    }

    /// World position.
    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    /// World rotation.
    pub fn rotation(&self) -> Quaternion {
        self.rotation
    }

    /// World scale.
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Incremented on every change.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Moves the object.
    pub fn set_translation(&mut self, translation: Vec3) {
        self.translation = translation;
        self.touch();
    }

    /// Rotates the object.
    pub fn set_rotation(&mut self, rotation: Quaternion) {
        self.rotation = rotation;
        self.touch();
    }

    /// Rescales the object.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
        self.touch();
    }

    /// The direction the object faces: local `-Z` rotated into world space.
    pub fn forward(&self) -> Vec3 {
        self.rotation * -Vec3::Z
    }

    /// The model matrix, `T * R * S`.
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.translation)
    }

    fn touch(&mut self) {
        self.version = self.version.wrapping_add(1);
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}
