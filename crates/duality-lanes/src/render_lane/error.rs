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

use duality_core::renderer::{RenderError, ResourceError};
use thiserror::Error;

/// Errors raised while running a lane.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LaneError {
    /// A backend call or argument check failed.
    #[error("{0}")]
    Render(#[from] RenderError),

    /// A post effect with this name is already part of the chain.
    #[error("Post effect '{0}' is already registered")]
    DuplicateEffect(String),

    /// No post effect with this name is part of the chain.
    #[error("Post effect '{0}' not found")]
    EffectNotFound(String),
}

impl From<ResourceError> for LaneError {
    fn from(err: ResourceError) -> Self {
        Self::Render(err.into())
    }
}
