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

//! Scene components read by the render pipeline.

mod camera;
mod light;
mod transform;

pub use self::camera::{Camera, ProjectionType};
pub use self::light::LightComponent;
pub use self::transform::{SharedTransform, Transform};

/// Lifecycle of a component with respect to its scene's `Stage`.
///
/// A component starts `Inactive`, becomes `Active` when it is registered and returns to
/// `Inactive` when it is deregistered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ComponentState {
    /// Not registered with any stage.
    #[default]
    Inactive,
    /// Registered and considered by the pipeline every frame.
    Active,
}
