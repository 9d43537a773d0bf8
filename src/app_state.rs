use crate::camera::Camera;
use crate::canvas::grid::GridLayout;
use crate::config::ViewerConfig;
use crate::errors::ViewerError;
use eframe::egui;

/// The plotted series: equal-length x and y columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphData {
    xs: Vec<f32>,
    ys: Vec<f32>,
}

impl GraphData {
    pub fn new(xs: Vec<f32>, ys: Vec<f32>) -> Result<Self, ViewerError> {
        if xs.len() != ys.len() {
            return Err(ViewerError::Dataset {
                xs: xs.len(),
                ys: ys.len(),
            });
        }
        Ok(Self { xs, ys })
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = egui::Pos2> + '_ {
        self.xs
            .iter()
            .zip(&self.ys)
            .map(|(&x, &y)| egui::pos2(x, y))
    }
}

/// Everything the frame phases read and mutate, threaded through explicitly.
#[derive(Debug, Clone)]
pub struct AppState {
    pub camera: Camera,
    pub grid: GridLayout,
    pub light_mode: bool,
    pub show_slider_control: bool,
    /// Whether the controls bar is part of the picture (off for export).
    pub show_controls: bool,

    // Drag tracking
    pub track_mouse: bool,
    pub mouse: egui::Pos2,

    pub data: GraphData,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            grid: GridLayout::default(),
            light_mode: false,
            show_slider_control: false,
            show_controls: true,
            track_mouse: false,
            mouse: egui::Pos2::ZERO,
            data: GraphData::default(),
        }
    }
}

impl AppState {
    pub fn from_config(config: &ViewerConfig) -> Result<Self, ViewerError> {
        config.validate()?;

        let camera = Camera::new(
            config.camera.scale_step,
            config.camera.scale_min,
            config.camera.scale_max,
        );

        let [ppu_x, ppu_y] = config.grid.pixels_per_unit;
        let [step_x, step_y] = config.grid.step;
        let mut grid = GridLayout::new(
            egui::vec2(ppu_x, ppu_y),
            egui::vec2(step_x, step_y),
            egui::pos2(config.window.width * 0.5, config.window.height * 0.5),
        );
        grid.auto_scale = config.grid.auto_scale;
        grid.policy = config.grid.policy;

        Ok(Self {
            camera,
            grid,
            light_mode: config.light_mode,
            data: GraphData::new(config.data.xs.clone(), config.data.ys.clone())?,
            ..Self::default()
        })
    }

    /// Keeps the graph origin centred in the window.
    pub fn on_resize(&mut self, size: egui::Vec2) {
        self.grid.origin = (size * 0.5).to_pos2();
    }
}
