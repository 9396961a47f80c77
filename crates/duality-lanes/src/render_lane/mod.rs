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

//! Rendering lane - the per-frame pass sequence.

mod deferred_lane;
mod error;
mod gbuffer;
mod ordering;
mod programs;
mod stats;

pub use deferred_lane::*;
pub use error::*;
pub use gbuffer::*;
pub use ordering::*;
pub use programs::*;
pub use stats::*;

use duality_core::renderer::GraphicsBackend;
use duality_data::components::Camera;
use duality_data::Stage;

/// A strategy turning a [`Stage`] into backend calls.
///
/// A frame is bracketed by `begin_scene`/`end_scene` on the backend. Once begun, a
/// frame always reaches `end_scene`; recoverable problems skip work instead of
/// abandoning the frame.
pub trait RenderLane {
    /// Identifies the strategy in logs, e.g. `"Deferred"`.
    fn strategy_name(&self) -> &'static str;

    /// Changes the output size. Takes effect at the next frame.
    fn resize(&mut self, width: u32, height: u32) -> Result<(), LaneError>;

    /// Renders `stage` as seen from `camera`.
    ///
    /// Without a camera the frame is opened and closed with no draw calls. A backend
    /// that has shut down makes this a no-op returning empty stats.
    fn render_frame(
        &mut self,
        backend: &mut dyn GraphicsBackend,
        stage: &Stage,
        camera: Option<&Camera>,
    ) -> Result<FrameStats, LaneError>;

    /// Statistics of the last call to [`render_frame`](Self::render_frame).
    fn last_frame_stats(&self) -> FrameStats;
}
