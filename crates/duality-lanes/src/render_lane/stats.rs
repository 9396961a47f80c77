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

use std::fmt;

/// Counters describing one rendered frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Monotonic frame counter, `0` for frames that were never started.
    pub frame_number: u64,
    /// Render operations gathered from the stage.
    pub operations: usize,
    /// Draw calls issued: meshes, full-screen passes and quad batches.
    pub draw_calls: usize,
    /// Units rejected by visibility masks or frustum culling.
    pub culled_units: usize,
    /// Units skipped because a resource was unavailable.
    pub skipped_units: usize,
    /// Material binds in the G-buffer pass.
    pub material_switches: usize,
    /// Lights accumulated, the ambient term included.
    pub lights: usize,
    /// Post effects that ran.
    pub post_effects: usize,
    /// Sprite batches flushed.
    pub sprite_flushes: usize,
}

impl fmt::Display for FrameStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {}: {} ops, {} draws, {} culled, {} skipped, {} material switches, {} lights, {} post effects, {} sprite batches",
            self.frame_number,
            self.operations,
            self.draw_calls,
            self.culled_units,
            self.skipped_units,
            self.material_switches,
            self.lights,
            self.post_effects,
            self.sprite_flushes
        )
    }
}
