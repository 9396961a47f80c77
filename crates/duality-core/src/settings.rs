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

//! Render pipeline configuration, loadable from RON.

use crate::math::LinearRgba;
use crate::renderer::api::TextureFormat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Screen-space ambient occlusion parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SsaoSettings {
    /// Whether the effect runs at all.
    pub enabled: bool,
    /// Sampling radius in view-space units.
    pub radius: f32,
    /// Depth bias against self-occlusion.
    pub bias: f32,
    /// Strength of the darkening.
    pub intensity: f32,
    /// Number of hemisphere samples.
    pub kernel_size: u32,
    /// Whether the occlusion term is blurred before use.
    pub blur: bool,
}

impl Default for SsaoSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            radius: 0.5,
            bias: 0.025,
            intensity: 1.0,
            kernel_size: 16,
            blur: true,
        }
    }
}

/// Global settings for the deferred render pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Clear color of the screen and of the lighting target.
    pub clear_color: LinearRgba,
    /// Format of the G-buffer color channels.
    pub gbuffer_format: TextureFormat,
    /// Format of the lighting and post-effect targets.
    pub lighting_format: TextureFormat,
    /// Ambient term added when the scene has no ambient light.
    pub ambient_light: LinearRgba,
    /// Order operations by material and texture before drawing.
    pub sort_operations: bool,
    /// Ambient occlusion.
    pub ssao: SsaoSettings,
    /// Output width before the first resize.
    pub initial_width: u32,
    /// Output height before the first resize.
    pub initial_height: u32,
    /// Initial quad capacity of the sprite batch.
    pub sprite_batch_capacity: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            clear_color: LinearRgba::BLACK,
            gbuffer_format: TextureFormat::Rgba16Float,
            lighting_format: TextureFormat::Rgba16Float,
            ambient_light: LinearRgba::rgb(0.05, 0.05, 0.05),
            sort_operations: true,
            ssao: SsaoSettings::default(),
            initial_width: 1280,
            initial_height: 720,
            sprite_batch_capacity: 256,
        }
    }
}

impl RenderSettings {
    /// Parses settings from RON text. Missing fields take their default value.
    pub fn from_ron_str(text: &str) -> Result<Self, SettingsError> {
        Ok(ron::from_str(text)?)
    }

    /// Reads and parses a RON settings file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_ron_str(&text)
    }

    /// Serializes the settings as pretty-printed RON.
    pub fn to_ron_string(&self) -> Result<String, SettingsError> {
        let config = ron::ser::PrettyConfig::default().indentor("  ".to_string());
        ron::ser::to_string_pretty(self, config).map_err(SettingsError::Serialize)
    }
}

/// An error raised while loading or saving [`RenderSettings`].
#[derive(Debug)]
pub enum SettingsError {
    /// The file could not be read.
    Io(std::io::Error),
    /// The text is not valid settings RON.
    Parse(ron::error::SpannedError),
    /// The settings could not be written out.
    Serialize(ron::Error),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(err) => write!(f, "Failed to read render settings: {err}"),
            SettingsError::Parse(err) => write!(f, "Invalid render settings: {err}"),
            SettingsError::Serialize(err) => {
                write!(f, "Failed to serialize render settings: {err}")
            }
        }
    }
}

impl std::error::Error for SettingsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SettingsError::Io(err) => Some(err),
            SettingsError::Parse(err) => Some(err),
            SettingsError::Serialize(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for SettingsError {
    fn from(err: std::io::Error) -> Self {
        SettingsError::Io(err)
    }
}

impl From<ron::error::SpannedError> for SettingsError {
    fn from(err: ron::error::SpannedError) -> Self {
        SettingsError::Parse(err)
    }
}
