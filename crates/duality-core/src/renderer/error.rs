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

//! Error types for the rendering subsystem.
//!
//! Missing content (an unloaded mesh or material) is never an error: the pipeline skips
//! the affected draw unit. These types cover the remaining failures: invalid arguments
//! at a call boundary, a backend that has already shut down, and backend resource faults.

use std::fmt;

/// An error raised by a backend while creating, looking up or using a GPU resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// A generic resource could not be found.
    NotFound,
    /// The handle or ID used to reference a resource is invalid or was destroyed.
    InvalidHandle,
    /// An error originating from the specific graphics backend implementation.
    BackendError(String),
    /// The resource exists but its content is not loaded.
    Unavailable(String),
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::NotFound => write!(f, "Resource not found with ID."),
            ResourceError::InvalidHandle => write!(f, "Invalid resource handle or ID."),
            ResourceError::BackendError(msg) => {
                write!(f, "Backend-specific resource error: {msg}")
            }
            ResourceError::Unavailable(what) => write!(f, "Resource '{what}' is not available."),
        }
    }
}

impl std::error::Error for ResourceError {}

/// A high-level error surfaced by the render pipeline or a graphics backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A required argument was missing or out of range. This is a programming error.
    InvalidArgument {
        /// The name of the offending argument.
        name: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
    /// The backend has been shut down; nothing can be rendered any more.
    BackendShutdown,
    /// An error occurred while managing a GPU resource.
    ResourceError(ResourceError),
    /// A begin/end call arrived out of order.
    InvalidPassOrder {
        /// The call that was allowed in the current state.
        expected: &'static str,
        /// The call that was actually made.
        found: &'static str,
    },
    /// An unexpected or internal error occurred.
    Internal(String),
}

impl RenderError {
    /// Shorthand for building an [`RenderError::InvalidArgument`].
    pub fn invalid_argument(name: &'static str, reason: impl Into<String>) -> Self {
        RenderError::InvalidArgument {
            name,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::InvalidArgument { name, reason } => {
                write!(f, "Invalid argument '{name}': {reason}")
            }
            RenderError::BackendShutdown => {
                write!(f, "The graphics backend has been shut down.")
            }
            RenderError::ResourceError(err) => {
                write!(f, "Graphics resource operation failed: {err}")
            }
            RenderError::InvalidPassOrder { expected, found } => {
                write!(f, "Invalid call order: expected {expected}, found {found}")
            }
            RenderError::Internal(msg) => {
                write!(f, "An internal or unexpected error occurred: {msg}")
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::ResourceError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ResourceError> for RenderError {
    fn from(err: ResourceError) -> Self {
        RenderError::ResourceError(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_resource_error_converts_and_chains() {
        let err: RenderError = ResourceError::InvalidHandle.into();
        assert_eq!(err, RenderError::ResourceError(ResourceError::InvalidHandle));
        assert!(err.source().is_some());
        assert!(err.to_string().contains("Invalid resource handle"));
    }

    #[test]
    fn test_invalid_argument_display() {
        let err = RenderError::invalid_argument("width", "must be non-zero");
        assert_eq!(err.to_string(), "Invalid argument 'width': must be non-zero");
        assert!(err.source().is_none());
    }
}
