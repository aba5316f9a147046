use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::renderer::gl::Precision;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default)]
    pub precision: Precision,
    #[serde(default = "RenderSettings::default_true")]
    pub premultiplied_alpha: bool,
    #[serde(default = "RenderSettings::default_true")]
    pub sort_objects: bool,
    #[serde(default = "RenderSettings::default_true")]
    pub auto_clear: bool,
    #[serde(default = "RenderSettings::default_true")]
    pub auto_clear_color: bool,
    #[serde(default = "RenderSettings::default_true")]
    pub auto_clear_depth: bool,
    #[serde(default = "RenderSettings::default_true")]
    pub auto_clear_stencil: bool,
    #[serde(default = "RenderSettings::default_true")]
    pub auto_update_scene: bool,
    #[serde(default)]
    pub gamma_input: bool,
    #[serde(default)]
    pub gamma_output: bool,
    #[serde(default = "RenderSettings::default_gamma_factor")]
    pub gamma_factor: f32,
    #[serde(default)]
    pub logarithmic_depth_buffer: bool,
    #[serde(default = "RenderSettings::default_max_morph_targets")]
    pub max_morph_targets: u32,
    #[serde(default = "RenderSettings::default_max_morph_normals")]
    pub max_morph_normals: u32,
    #[serde(default)]
    pub clear_color: [f32; 3],
    #[serde(default = "RenderSettings::default_clear_alpha")]
    pub clear_alpha: f32,
    #[serde(default)]
    pub shadow_map: ShadowMapSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            precision: Precision::default(),
            premultiplied_alpha: true,
            sort_objects: true,
            auto_clear: true,
            auto_clear_color: true,
            auto_clear_depth: true,
            auto_clear_stencil: true,
            auto_update_scene: true,
            gamma_input: false,
            gamma_output: false,
            gamma_factor: Self::default_gamma_factor(),
            logarithmic_depth_buffer: false,
            max_morph_targets: Self::default_max_morph_targets(),
            max_morph_normals: Self::default_max_morph_normals(),
            clear_color: [0.0; 3],
            clear_alpha: Self::default_clear_alpha(),
            shadow_map: ShadowMapSettings::default(),
        }
    }
}

impl RenderSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RenderSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded render settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default render settings.",
                        path, err
                    );
                    RenderSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    pub fn validate(mut self) -> Self {
        if !(self.gamma_factor.is_finite() && self.gamma_factor > 0.0) {
            warn!("Gamma factor must be positive. Using default value.");
            self.gamma_factor = Self::default_gamma_factor();
        }

        if self.max_morph_targets > Self::default_max_morph_targets() {
            warn!(
                "At most {} morph targets are supported. Using the maximum.",
                Self::default_max_morph_targets()
            );
            self.max_morph_targets = Self::default_max_morph_targets();
        }

        if self.max_morph_normals > Self::default_max_morph_normals() {
            warn!(
                "At most {} morph normals are supported. Using the maximum.",
                Self::default_max_morph_normals()
            );
            self.max_morph_normals = Self::default_max_morph_normals();
        }

        if !(0.0..=1.0).contains(&self.clear_alpha) {
            warn!("Clear alpha must be within [0, 1]. Using default value.");
            self.clear_alpha = Self::default_clear_alpha();
        }

        if self.clear_color.iter().any(|c| !c.is_finite()) {
            warn!("Clear color must be finite. Using black.");
            self.clear_color = [0.0; 3];
        }

        if self.shadow_map.map_size == 0 || !self.shadow_map.map_size.is_power_of_two() {
            warn!("Shadow map size must be a power of two. Using default value.");
            self.shadow_map.map_size = ShadowMapSettings::default_map_size();
        }

        self
    }

    const fn default_true() -> bool {
        true
    }

    const fn default_gamma_factor() -> f32 {
        2.0
    }

    const fn default_max_morph_targets() -> u32 {
        8
    }

    const fn default_max_morph_normals() -> u32 {
        4
    }

    const fn default_clear_alpha() -> f32 {
        1.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShadowMapSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub kind: ShadowMapKind,
    #[serde(default = "RenderSettings::default_true")]
    pub cull_front_faces: bool,
    #[serde(default = "RenderSettings::default_true")]
    pub auto_update: bool,
    /// Used for lights whose `ShadowCaster` does not pick a size.
    #[serde(default = "ShadowMapSettings::default_map_size")]
    pub map_size: u32,
}

impl Default for ShadowMapSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            kind: ShadowMapKind::default(),
            cull_front_faces: true,
            auto_update: true,
            map_size: Self::default_map_size(),
        }
    }
}

impl ShadowMapSettings {
    const fn default_map_size() -> u32 {
        512
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadowMapKind {
    Basic,
    #[default]
    Pcf,
    PcfSoft,
}

impl ShadowMapKind {
    pub fn define(self) -> &'static str {
        match self {
            ShadowMapKind::Basic => "SHADOWMAP_TYPE_BASIC",
            ShadowMapKind::Pcf => "SHADOWMAP_TYPE_PCF",
            ShadowMapKind::PcfSoft => "SHADOWMAP_TYPE_PCF_SOFT",
        }
    }
}
