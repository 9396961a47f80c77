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

//! # Duality Data
//!
//! Scene-side state consumed by the render pipeline: versioned transforms, cameras,
//! lights, the [`Renderable`](renderable::Renderable) capability with its mesh, skinned,
//! particle and sprite variants, and the [`Stage`](stage::Stage) registry that tracks
//! which of them are active.

#![warn(missing_docs)]

pub mod components;
pub mod renderable;
pub mod stage;

pub use stage::{LightId, RenderableId, SharedLight, SharedRenderable, Stage};
