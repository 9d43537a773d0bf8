//! Visible-range tracking and grid-step auto-fit.

use crate::camera::Camera;
use eframe::egui;
use serde::{Deserialize, Serialize};

/// Fewest labelled gridlines an axis may show after fitting.
pub const MIN_LINES: f32 = 4.0;
/// Most labelled gridlines an axis may show after fitting.
pub const MAX_LINES: f32 = 12.0;

// f32 spans roughly 2^-149..2^128, so any finite input settles well before this.
const MAX_FIT_ITERATIONS: u32 = 512;

/// Ladder the step walks along while refitting.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPolicy {
    /// Double / halve: every step is a power-of-two multiple of the first one.
    #[default]
    PowerOfTwo,
    /// 1, 2, 5, 10, 20, 50... times a power of ten.
    Decimal125,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    /// Degenerate window; nothing was touched.
    Skipped,
    Fitted,
    /// Refinement gave up on an axis; the step is the best found so far.
    IterationCap,
}

/// Per-axis grid state carried from frame to frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    /// Visible range in grid units (world units divided by `step`).
    pub x_range: egui::Rangef,
    pub y_range: egui::Rangef,
    pub step: egui::Vec2,
    /// Base world-to-pixel ratio before camera zoom.
    pub pixels_per_unit: egui::Vec2,
    /// Screen pixel where world (0, 0) sits when the camera is at rest.
    pub origin: egui::Pos2,
    pub auto_scale: bool,
    pub policy: StepPolicy,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::new(egui::vec2(80.0, 80.0), egui::vec2(1.0, 1.0), egui::pos2(640.0, 360.0))
    }
}

impl GridLayout {
    pub fn new(pixels_per_unit: egui::Vec2, step: egui::Vec2, origin: egui::Pos2) -> Self {
        Self {
            x_range: egui::Rangef::new(0.0, 0.0),
            y_range: egui::Rangef::new(0.0, 0.0),
            step: egui::vec2(sanitize_step(step.x), sanitize_step(step.y)),
            pixels_per_unit,
            origin,
            auto_scale: true,
            policy: StepPolicy::default(),
        }
    }

    /// Visible world rectangle for a window of `window_size` pixels, or
    /// `None` when the window is degenerate.
    pub fn world_ranges(
        &self,
        camera: &Camera,
        window_size: egui::Vec2,
    ) -> Option<(egui::Rangef, egui::Rangef)> {
        let usable = |v: f32| v.is_finite() && v > 0.0;
        if !usable(window_size.x) || !usable(window_size.y) {
            return None;
        }

        let top_left = camera.camera_to_screen(egui::Pos2::ZERO);
        let bottom_right = camera.camera_to_screen(window_size.to_pos2());
        let ppu = self.pixels_per_unit;
        let origin = self.origin;

        let x = egui::Rangef::new(
            (top_left.x - origin.x) / ppu.x,
            (bottom_right.x - origin.x) / ppu.x,
        );
        let y = egui::Rangef::new(
            (origin.y - bottom_right.y) / ppu.y,
            (origin.y - top_left.y) / ppu.y,
        );
        Some((x, y))
    }

    /// Recomputes the visible range and, in auto-scale mode, walks the step
    /// until each axis shows between [`MIN_LINES`] and [`MAX_LINES`] lines.
    pub fn fit(&mut self, camera: &Camera, window_size: egui::Vec2) -> FitOutcome {
        let Some((x_world, y_world)) = self.world_ranges(camera, window_size) else {
            return FitOutcome::Skipped;
        };

        let mut outcome = FitOutcome::Fitted;
        if self.auto_scale {
            let (sx, capped_x) = refine_step(x_world.max - x_world.min, self.step.x, self.policy);
            let (sy, capped_y) = refine_step(y_world.max - y_world.min, self.step.y, self.policy);
            if sx != self.step.x || sy != self.step.y {
                log::debug!(
                    "grid step {:?} -> ({sx}, {sy})",
                    (self.step.x, self.step.y)
                );
            }
            self.step = egui::vec2(sx, sy);
            if capped_x || capped_y {
                outcome = FitOutcome::IterationCap;
            }
        }

        self.x_range = egui::Rangef::new(x_world.min / self.step.x, x_world.max / self.step.x);
        self.y_range = egui::Rangef::new(y_world.min / self.step.y, y_world.max / self.step.y);
        outcome
    }
}

fn sanitize_step(step: f32) -> f32 {
    if step.is_finite() && step > 0.0 {
        step
    } else {
        1.0
    }
}

/// Walks `step` along the policy's ladder until `span / step` lands inside
/// the readable band. Returns the new step and whether the iteration cap was
/// hit. Non-positive or non-finite spans leave the step alone.
pub fn refine_step(span: f32, step: f32, policy: StepPolicy) -> (f32, bool) {
    if !(span.is_finite() && span > 0.0) {
        return (step, false);
    }

    match policy {
        StepPolicy::PowerOfTwo => {
            let mut step = sanitize_step(step);
            let mut iterations = 0;
            while span / step > MAX_LINES {
                if iterations == MAX_FIT_ITERATIONS {
                    return (step, true);
                }
                step *= 2.0;
                iterations += 1;
            }
            while span / step < MIN_LINES {
                if iterations == MAX_FIT_ITERATIONS || step / 2.0 <= 0.0 {
                    return (step, true);
                }
                step /= 2.0;
                iterations += 1;
            }
            (step, false)
        }
        StepPolicy::Decimal125 => {
            let mut rung = Rung::snap(sanitize_step(step));
            let mut iterations = 0;
            while span / rung.value() > MAX_LINES {
                if iterations == MAX_FIT_ITERATIONS || !rung.up().value().is_finite() {
                    return (rung.value(), true);
                }
                rung = rung.up();
                iterations += 1;
            }
            while span / rung.value() < MIN_LINES {
                if iterations == MAX_FIT_ITERATIONS || rung.down().value() <= 0.0 {
                    return (rung.value(), true);
                }
                rung = rung.down();
                iterations += 1;
            }
            (rung.value(), false)
        }
    }
}

const MANTISSAS: [f32; 3] = [1.0, 2.0, 5.0];

/// A point on the 1-2-5 ladder, kept as integers so walking it never drifts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rung {
    mantissa: usize,
    exponent: i32,
}

impl Rung {
    fn snap(step: f32) -> Self {
        let exponent = step.log10().floor() as i32;
        let base = step / 10f32.powi(exponent);
        let (mantissa, exponent) = if base < 1.5 {
            (0, exponent)
        } else if base < 3.5 {
            (1, exponent)
        } else if base < 7.5 {
            (2, exponent)
        } else {
            (0, exponent + 1)
        };
        Self { mantissa, exponent }
    }

    fn value(self) -> f32 {
        MANTISSAS[self.mantissa] * 10f32.powi(self.exponent)
    }

    fn up(self) -> Self {
        if self.mantissa + 1 == MANTISSAS.len() {
            Self {
                mantissa: 0,
                exponent: self.exponent + 1,
            }
        } else {
            Self {
                mantissa: self.mantissa + 1,
                ..self
            }
        }
    }

    fn down(self) -> Self {
        if self.mantissa == 0 {
            Self {
                mantissa: MANTISSAS.len() - 1,
                exponent: self.exponent - 1,
            }
        } else {
            Self {
                mantissa: self.mantissa - 1,
                ..self
            }
        }
    }
}
