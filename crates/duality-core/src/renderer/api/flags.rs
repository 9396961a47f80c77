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

//! Bit flag sets used by passes, sprites and visibility filtering.

use serde::{Deserialize, Serialize};

/// Which buffers a pass clears when it begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClearFlags {
    bits: u32,
}

impl ClearFlags {
    /// Clear nothing; keep the previous contents.
    pub const NONE: Self = Self { bits: 0 };
    /// Clear the color attachments.
    pub const COLOR: Self = Self { bits: 1 << 0 };
    /// Clear the depth buffer.
    pub const DEPTH: Self = Self { bits: 1 << 1 };
    /// Clear color and depth.
    pub const ALL: Self = Self {
        bits: Self::COLOR.bits | Self::DEPTH.bits,
    };

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if every flag in `other` is also set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl std::ops::BitOr for ClearFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Per-sprite drawing options. Part of the sprite batching key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct SpriteFlags {
    bits: u32,
}

impl SpriteFlags {
    /// Opaque, depth-tested drawing.
    pub const NONE: Self = Self { bits: 0 };
    /// Alpha blending.
    pub const ALPHA_BLEND: Self = Self { bits: 1 << 0 };
    /// Additive blending.
    pub const ADDITIVE: Self = Self { bits: 1 << 1 };
    /// Ignore the depth buffer.
    pub const NO_DEPTH: Self = Self { bits: 1 << 2 };

    /// Creates flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if every flag in `other` is also set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }
}

impl std::ops::BitOr for SpriteFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

/// Visibility groups a renderable belongs to, and the groups a camera renders.
///
/// Bits 0 to 30 are free-form groups. Bit 31 marks screen overlay content, which the
/// 3D scene pass does not draw unless the camera asks for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VisibilityFlags {
    bits: u32,
}

impl VisibilityFlags {
    /// No group.
    pub const NONE: Self = Self { bits: 0 };
    /// The first group.
    pub const GROUP_0: Self = Self { bits: 1 << 0 };
    /// The second group.
    pub const GROUP_1: Self = Self { bits: 1 << 1 };
    /// Every one of the 31 scene groups, without the overlay bit.
    pub const ALL_GROUPS: Self = Self { bits: 0x7FFF_FFFF };
    /// Screen overlay content.
    pub const SCREEN_OVERLAY: Self = Self { bits: 1 << 31 };
    /// Every bit.
    pub const ALL: Self = Self { bits: u32::MAX };

    /// Creates flags from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self { bits }
    }

    /// The flag for group `index`, `None` if `index > 30`.
    pub const fn group(index: u32) -> Option<Self> {
        if index < 31 {
            Some(Self { bits: 1 << index })
        } else {
            None
        }
    }

    /// Returns the raw bits.
    pub const fn bits(&self) -> u32 {
        self.bits
    }

    /// Combines two sets of flags.
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// Checks if every flag in `other` is also set in `self`.
    pub const fn contains(&self, other: Self) -> bool {
        (self.bits & other.bits) == other.bits
    }

    /// Checks if the two sets share at least one group.
    pub const fn intersects(&self, other: Self) -> bool {
        (self.bits & other.bits) != 0
    }

    /// Checks if no flag is set.
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }
}

impl Default for VisibilityFlags {
    fn default() -> Self {
        Self::ALL_GROUPS
    }
}

impl std::ops::BitOr for VisibilityFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.union(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_flags_union() {
        let f = ClearFlags::COLOR | ClearFlags::DEPTH;
        assert_eq!(f, ClearFlags::ALL);
        assert!(f.contains(ClearFlags::DEPTH));
        assert!(ClearFlags::NONE.is_empty());
    }

    #[test]
    fn test_visibility_default_excludes_overlay() {
        let d = VisibilityFlags::default();
        assert!(!d.intersects(VisibilityFlags::SCREEN_OVERLAY));
        assert!(d.contains(VisibilityFlags::GROUP_1));
        assert_eq!(VisibilityFlags::group(31), None);
        assert_eq!(
            VisibilityFlags::ALL_GROUPS | VisibilityFlags::SCREEN_OVERLAY,
            VisibilityFlags::ALL
        );
    }
}
