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

//! The frame pipeline of the Duality render core.
//!
//! Lanes turn the state gathered by `duality-data` into backend calls: the deferred
//! renderer drives the G-buffer, lighting, post-processing and composite passes,
//! and the sprite lane batches screen-space quads on top.

#![warn(missing_docs)]

pub mod post_lane;
pub mod render_lane;
pub mod sprite_lane;

pub use post_lane::{EffectContext, FullscreenEffect, PostEffect, PostEffectChain, SsaoEffect};
pub use render_lane::{
    DeferredRenderer, FrameStage, FrameStats, GBuffer, LaneError, ProgramCache, RenderLane,
};
pub use sprite_lane::SpriteBatch;
