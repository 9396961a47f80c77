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

//! Content resources referenced by renderables: materials, meshes and skeleton poses.
//!
//! Loading is out of scope; a [`ResourceRef`] is only a slot that may or may not hold
//! loaded content at any given frame.

use crate::math::{Aabb, BoundingSphere, LinearRgba, Mat4};
use crate::renderer::api::handles::{MaterialId, MeshHandle, TextureId};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

struct ResourceSlot<T> {
    value: RefCell<Option<Rc<T>>>,
    generation: Cell<u64>,
}

/// A shared reference to a resource whose content can be loaded or unloaded at any time.
///
/// Clones share the same slot. Every load or unload bumps a generation counter, which
/// lets holders detect content changes without subscribing to events.
pub struct ResourceRef<T> {
    slot: Rc<ResourceSlot<T>>,
}

impl<T> ResourceRef<T> {
    /// Creates a reference holding loaded content.
    pub fn new(value: T) -> Self {
        Self {
            slot: Rc::new(ResourceSlot {
                value: RefCell::new(Some(Rc::new(value))),
                generation: Cell::new(0),
            }),
        }
    }

    /// Creates a reference whose content is not loaded.
    pub fn unavailable() -> Self {
        Self {
            slot: Rc::new(ResourceSlot {
                value: RefCell::new(None),
                generation: Cell::new(0),
            }),
        }
    }

    /// Returns the content, or `None` if it is not loaded.
    pub fn get(&self) -> Option<Rc<T>> {
        self.slot.value.borrow().clone()
    }

    /// Returns `true` if the content is loaded.
    pub fn is_available(&self) -> bool {
        self.slot.value.borrow().is_some()
    }

    /// Replaces the content.
    pub fn set(&self, value: T) {
        *self.slot.value.borrow_mut() = Some(Rc::new(value));
        self.bump();
    }

    /// Drops the content; the slot stays valid.
    pub fn unload(&self) {
        *self.slot.value.borrow_mut() = None;
        self.bump();
    }

    /// A counter incremented on every [`set`](Self::set) and [`unload`](Self::unload).
    pub fn generation(&self) -> u64 {
        self.slot.generation.get()
    }

    /// Returns `true` if both references share the same slot.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.slot, &other.slot)
    }

    fn bump(&self) {
        self.slot.generation.set(self.slot.generation.get().wrapping_add(1));
    }
}

impl<T> Clone for ResourceRef<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<T> fmt::Debug for ResourceRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceRef")
            .field("available", &self.is_available())
            .field("generation", &self.generation())
            .finish()
    }
}

/// Surface properties bound before drawing a submesh.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Unique identity.
    pub id: MaterialId,
    /// Debug name.
    pub name: String,
    /// Primary ordering key. Operations sharing a key are drawn together.
    pub sort_key: u32,
    /// Tint color.
    pub main_color: LinearRgba,
    /// Bound textures, slot 0 first.
    pub textures: Vec<TextureId>,
}

impl Material {
    /// Creates an untextured white material.
    pub fn new(id: MaterialId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            sort_key: 0,
            main_color: LinearRgba::WHITE,
            textures: Vec::new(),
        }
    }

    /// Builder-style setter for the sort key.
    pub fn with_sort_key(mut self, sort_key: u32) -> Self {
        self.sort_key = sort_key;
        self
    }

    /// Builder-style setter appending a texture.
    pub fn with_texture(mut self, texture: TextureId) -> Self {
        self.textures.push(texture);
        self
    }

    /// The texture in slot 0, if any.
    pub fn primary_texture(&self) -> Option<TextureId> {
        self.textures.first().copied()
    }
}

/// One drawable part of a mesh.
#[derive(Debug, Clone)]
pub struct SubMesh {
    /// Backend draw handle.
    pub handle: MeshHandle,
    /// Material used when the renderer does not override it.
    pub default_material: Option<ResourceRef<Material>>,
    /// Local-space bounding sphere.
    pub bounding_sphere: BoundingSphere,
    /// Local-space bounding box.
    pub bounding_box: Aabb,
}

impl SubMesh {
    /// Creates a submesh whose sphere is derived from its box.
    pub fn new(handle: MeshHandle, bounding_box: Aabb) -> Self {
        Self {
            handle,
            default_material: None,
            bounding_sphere: BoundingSphere::from_aabb(&bounding_box),
            bounding_box,
        }
    }

    /// Builder-style setter for the default material.
    pub fn with_default_material(mut self, material: ResourceRef<Material>) -> Self {
        self.default_material = Some(material);
        self
    }
}

/// Geometry made of an ordered list of submeshes.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    /// Submeshes in draw order.
    pub submeshes: Vec<SubMesh>,
}

impl Mesh {
    /// Creates a mesh from its submeshes.
    pub fn new(submeshes: Vec<SubMesh>) -> Self {
        Self { submeshes }
    }

    /// The union of all submesh boxes, [`Aabb::INVALID`] for an empty mesh.
    pub fn bounding_box(&self) -> Aabb {
        self.submeshes
            .iter()
            .fold(Aabb::INVALID, |acc, s| acc.merge(&s.bounding_box))
    }

    /// The union of all submesh spheres, [`BoundingSphere::EMPTY`] for an empty mesh.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        let mut iter = self.submeshes.iter();
        match iter.next() {
            Some(first) => iter.fold(first.bounding_sphere, |acc, s| {
                acc.merged(&s.bounding_sphere)
            }),
            None => BoundingSphere::EMPTY,
        }
    }
}

/// An opaque pose provider for skinned draws.
///
/// The render core never reads bone data; it forwards the instance to the backend.
pub trait SkeletonInstance: fmt::Debug {
    /// Number of bones in the pose.
    fn bone_count(&self) -> usize;

    /// Skinning matrices, one per bone.
    fn bone_matrices(&self) -> &[Mat4];
}
