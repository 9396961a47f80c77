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

//! The per-frame list of draw requests gathered from the scene.

use crate::math::Mat4;
use crate::renderer::api::handles::MeshHandle;
use crate::renderer::api::resource::{Material, SkeletonInstance};
use std::rc::Rc;

/// A single draw request: one submesh, one transform, one resolved material.
///
/// Operations are only valid for the frame that produced them.
#[derive(Debug, Clone)]
pub struct RenderOperation {
    /// Backend geometry handle.
    pub mesh: MeshHandle,
    /// Model-to-world transform.
    pub transform: Mat4,
    /// The resolved material. Never missing: unresolvable units are not emitted.
    pub material: Rc<Material>,
    /// Pose for skinned draws.
    pub skeleton: Option<Rc<dyn SkeletonInstance>>,
    /// Requests the backend's alternate draw mode for this mesh.
    pub custom_draw: bool,
    /// Whether the unit casts shadows.
    pub cast_shadows: bool,
}

/// An ordered, reusable collection of [`RenderOperation`]s.
///
/// The list never sorts or deduplicates; ordering for state changes is the consumer's
/// job. [`clear`](Self::clear) keeps the backing storage so steady-state frames do not
/// allocate.
#[derive(Debug, Default)]
pub struct RenderOperationList {
    operations: Vec<RenderOperation>,
}

impl RenderOperationList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty list with room for `capacity` operations.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            operations: Vec::with_capacity(capacity),
        }
    }

    /// Appends one operation.
    pub fn add(
        &mut self,
        mesh: MeshHandle,
        transform: Mat4,
        material: Rc<Material>,
        skeleton: Option<Rc<dyn SkeletonInstance>>,
        custom_draw: bool,
        cast_shadows: bool,
    ) {
        self.operations.push(RenderOperation {
            mesh,
            transform,
            material,
            skeleton,
            custom_draw,
            cast_shadows,
        });
    }

    /// Appends an already-built operation.
    pub fn push(&mut self, operation: RenderOperation) {
        self.operations.push(operation);
    }

    /// Removes every operation, keeping the allocation.
    pub fn clear(&mut self) {
        self.operations.clear();
    }

    /// Number of operations.
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Returns `true` if the list holds no operation.
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Allocated room, in operations.
    pub fn capacity(&self) -> usize {
        self.operations.capacity()
    }

    /// The operation at `index`.
    pub fn get(&self, index: usize) -> Option<&RenderOperation> {
        self.operations.get(index)
    }

    /// Iterates in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, RenderOperation> {
        self.operations.iter()
    }

    /// The operations as a slice, in insertion order.
    pub fn as_slice(&self) -> &[RenderOperation] {
        &self.operations
    }
}

impl<'a> IntoIterator for &'a RenderOperationList {
    type Item = &'a RenderOperation;
    type IntoIter = std::slice::Iter<'a, RenderOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec3;
    use crate::renderer::api::handles::MaterialId;

    fn material() -> Rc<Material> {
        Rc::new(Material::new(MaterialId(1), "test"))
    }

    #[test]
    fn test_add_preserves_insertion_order() {
        let mut list = RenderOperationList::new();
        let m = material();
        for i in 0..5 {
            list.add(
                MeshHandle(10 - i),
                Mat4::from_translation(Vec3::new(i as f32, 0.0, 0.0)),
                Rc::clone(&m),
                None,
                false,
                true,
            );
        }
        assert_eq!(list.len(), 5);
        let handles: Vec<u64> = list.iter().map(|op| op.mesh.0).collect();
        assert_eq!(handles, vec![10, 9, 8, 7, 6]);
        assert_eq!(list.get(2).map(|op| op.transform.translation().x), Some(2.0));
    }

    #[test]
    fn test_clear_keeps_capacity_and_is_idempotent() {
        let mut list = RenderOperationList::with_capacity(4);
        let m = material();
        for i in 0..16 {
            list.add(MeshHandle(i), Mat4::IDENTITY, Rc::clone(&m), None, false, false);
        }
        let capacity = list.capacity();
        list.clear();
        assert_eq!(list.len(), 0);
        assert!(list.is_empty());
        assert_eq!(list.capacity(), capacity);
        list.clear();
        assert_eq!(list.len(), 0);
        assert_eq!(list.capacity(), capacity);
        // Operations no longer hold the material once cleared.
        assert_eq!(Rc::strong_count(&m), 1);
    }
}
