//! Startup configuration, read from an optional JSON file.
//!
//! Every field has a default, so a file only needs the keys it changes:
//!
//! ```json
//! { "light_mode": true, "grid": { "pixels_per_unit": [120, 60] } }
//! ```

use crate::arena;
use crate::canvas::grid::StepPolicy;
use crate::errors::ViewerError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "Grid Plot".to_string(),
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// TTF/OTF file; the bundled monospace face is used when unset.
    pub path: Option<PathBuf>,
    pub size: f32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            path: None,
            size: 16.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub scale_step: f32,
    pub scale_min: f32,
    pub scale_max: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            scale_step: 0.2,
            scale_min: 0.2,
            scale_max: 10.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub pixels_per_unit: [f32; 2],
    pub step: [f32; 2],
    pub auto_scale: bool,
    pub policy: StepPolicy,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            pixels_per_unit: [80.0, 80.0],
            step: [1.0, 1.0],
            auto_scale: true,
            policy: StepPolicy::PowerOfTwo,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub xs: Vec<f32>,
    pub ys: Vec<f32>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            xs: vec![0.0, 1.0, 2.5, 5.0, 10.0],
            ys: vec![0.0, 1.0, 4.0, 5.0, 10.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window: WindowConfig,
    pub fps: u32,
    pub font: FontConfig,
    pub camera: CameraConfig,
    pub grid: GridConfig,
    pub light_mode: bool,
    pub data: DataConfig,
    /// Byte budget of the per-frame arena.
    pub arena_capacity: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            fps: 60,
            font: FontConfig::default(),
            camera: CameraConfig::default(),
            grid: GridConfig::default(),
            light_mode: false,
            data: DataConfig::default(),
            arena_capacity: arena::DEFAULT_CAPACITY,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<Self, ViewerError> {
        let text = fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self, ViewerError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ViewerError> {
        let positive = |v: f32| v.is_finite() && v > 0.0;

        if !positive(self.window.width) || !positive(self.window.height) {
            return Err(ViewerError::Config(format!(
                "window size must be positive, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if self.fps == 0 {
            return Err(ViewerError::Config("fps must be at least 1".into()));
        }
        if !positive(self.font.size) {
            return Err(ViewerError::Config(format!(
                "font size must be positive, got {}",
                self.font.size
            )));
        }

        let cam = &self.camera;
        if !positive(cam.scale_min) || !positive(cam.scale_max) || !positive(cam.scale_step) {
            return Err(ViewerError::Config(
                "camera scale_step, scale_min and scale_max must be positive".into(),
            ));
        }
        if cam.scale_min > cam.scale_max {
            return Err(ViewerError::Config(format!(
                "scale_min ({}) is larger than scale_max ({})",
                cam.scale_min, cam.scale_max
            )));
        }

        let grid = &self.grid;
        if !grid.pixels_per_unit.iter().copied().all(positive) {
            return Err(ViewerError::Config(format!(
                "pixels_per_unit must be positive, got {:?}",
                grid.pixels_per_unit
            )));
        }
        if !grid.step.iter().copied().all(positive) {
            return Err(ViewerError::Config(format!(
                "grid step must be positive, got {:?}",
                grid.step
            )));
        }

        if self.data.xs.len() != self.data.ys.len() {
            return Err(ViewerError::Dataset {
                xs: self.data.xs.len(),
                ys: self.data.ys.len(),
            });
        }
        if self.arena_capacity == 0 {
            return Err(ViewerError::Config("arena_capacity must be non-zero".into()));
        }
        Ok(())
    }
}
