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

use duality_core::renderer::{MeshHandle, RenderOperation, RenderOperationList, TextureId};

/// The key operations are sorted by to reduce state changes.
pub fn sort_key(op: &RenderOperation) -> (u32, Option<TextureId>, MeshHandle) {
    (op.material.sort_key, op.material.primary_texture(), op.mesh)
}

/// A reusable permutation of a frame's operations.
///
/// Sorting reorders indices, never the list itself, and is stable so equal keys
/// keep submission order.
#[derive(Debug, Default)]
pub struct DrawOrder {
    indices: Vec<usize>,
}

impl DrawOrder {
    /// Creates an empty order.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the order for `operations`, sorted when `sort` is set.
    pub fn build(&mut self, operations: &RenderOperationList, sort: bool) -> &[usize] {
        self.indices.clear();
        self.indices.extend(0..operations.len());
        if sort {
            let ops = operations.as_slice();
            self.indices.sort_by_key(|&i| sort_key(&ops[i]));
        }
        &self.indices
    }
}
