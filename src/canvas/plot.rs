//! Gridlines, axes, tick labels and dataset points.

use super::batch::DrawBatch;
use super::overlay;
use crate::app_state::AppState;
use crate::fonts::TextMetrics;
use eframe::egui::{self, pos2, vec2, Color32, Pos2, Rect};
use std::ops::RangeInclusive;

pub const LINE_WIDTH: f32 = 2.0;
pub const AXIS_WIDTH: f32 = 2.0 * LINE_WIDTH;
pub const PADDING: f32 = 10.0;
pub const POINT_RADIUS: f32 = 8.0;

/// Axes spanning more grid units than this are not drawn at all.
pub const MAX_GRID_LINES: i64 = 4096;

/// Builds a colour from a `0xRRGGBBAA` literal.
pub fn rgba(hex: u32) -> Color32 {
    let [r, g, b, a] = hex.to_be_bytes();
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color32,
    pub text: Color32,
    pub grid: Color32,
    pub axis: Color32,
    pub point: Color32,
}

impl Palette {
    pub fn for_mode(light_mode: bool) -> Self {
        if light_mode {
            Self {
                background: Color32::WHITE,
                text: rgba(0x121212FF),
                grid: rgba(0xBFBFBFFF),
                axis: rgba(0x0F0F0FFF),
                point: rgba(0xFF0000FF),
            }
        } else {
            Self {
                background: rgba(0x121212FF),
                text: rgba(0xFFFFFFFF),
                grid: rgba(0x262626FF),
                axis: rgba(0x4A4A4AFF),
                point: rgba(0xFF0000FF),
            }
        }
    }
}

/// Counters from one plot pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PlotStats {
    pub gridlines: usize,
    pub points: usize,
    pub skipped_points: usize,
    pub skipped_axes: usize,
}

/// Integer gridline indices inside `range`, or `None` past the line guard.
fn line_indices(range: egui::Rangef) -> Option<RangeInclusive<i64>> {
    // `as` truncates toward zero and saturates, NaN becomes 0.
    let lo = range.min as i64;
    let hi = range.max as i64;
    if hi.saturating_sub(lo) > MAX_GRID_LINES {
        return None;
    }
    Some(lo..=hi)
}

/// Emits the graph for `state` into `scene` (geometry) and `overlay` (labels).
pub fn draw_graph(
    state: &AppState,
    window_size: egui::Vec2,
    font: &dyn TextMetrics,
    scene: &mut DrawBatch<'_>,
    overlay: &mut DrawBatch<'_>,
) -> PlotStats {
    let palette = Palette::for_mode(state.light_mode);
    let grid = &state.grid;
    let scale = state.camera.scale();
    let origin = state.camera.screen_to_camera(grid.origin);
    let font_size = font.font_size();
    let spacing = vec2(
        scale * grid.step.x * grid.pixels_per_unit.x,
        scale * grid.step.y * grid.pixels_per_unit.y,
    );
    let top_limit = 2.0 * PADDING
        + if state.show_controls {
            overlay::bar_height(font)
        } else {
            0.0
        };

    let mut stats = PlotStats::default();
    let half = LINE_WIDTH * 0.5;

    match line_indices(grid.x_range) {
        Some(indices) => {
            for i in indices.filter(|&i| i != 0) {
                let x = origin.x + i as f32 * spacing.x;
                scene.rect(
                    Rect::from_min_max(pos2(x - half, 0.0), pos2(x + half, window_size.y)),
                    palette.grid,
                    0.0,
                );

                let label = scene
                    .arena()
                    .alloc_fmt(format_args!("{:.2}", i as f32 * grid.step.x));
                let width = font.text_width(&scene.arena().resolve(label));
                let mut pos = pos2(x - width * 0.5, origin.y + font_size + PADDING);
                if pos.y <= top_limit {
                    pos.y = top_limit;
                } else if pos.y + PADDING >= window_size.y {
                    pos.y = window_size.y - PADDING;
                }
                overlay.text_span(font, pos, palette.text, label);
                stats.gridlines += 1;
            }
        }
        None => stats.skipped_axes += 1,
    }

    match line_indices(grid.y_range) {
        Some(indices) => {
            for i in indices.filter(|&i| i != 0) {
                let y = origin.y - i as f32 * spacing.y;
                scene.rect(
                    Rect::from_min_max(pos2(0.0, y - half), pos2(window_size.x, y + half)),
                    palette.grid,
                    0.0,
                );

                let label = scene
                    .arena()
                    .alloc_fmt(format_args!("{:.2}", i as f32 * grid.step.y));
                let width = font.text_width(&scene.arena().resolve(label));
                let mut pos = pos2(
                    origin.x - width - PADDING,
                    y - LINE_WIDTH + font_size * 0.5,
                );
                if pos.x <= PADDING {
                    pos.x = PADDING;
                } else if pos.x + width + PADDING >= window_size.x {
                    pos.x = window_size.x - width - PADDING;
                }
                overlay.text_span(font, pos, palette.text, label);
                stats.gridlines += 1;
            }
        }
        None => stats.skipped_axes += 1,
    }

    // Axes go over the gridlines.
    let axis_half = AXIS_WIDTH * 0.5;
    scene.rect(
        Rect::from_min_max(
            pos2(origin.x - axis_half, 0.0),
            pos2(origin.x + axis_half, window_size.y),
        ),
        palette.axis,
        0.0,
    );
    scene.rect(
        Rect::from_min_max(
            pos2(0.0, origin.y - axis_half),
            pos2(window_size.x, origin.y + axis_half),
        ),
        palette.axis,
        0.0,
    );

    let unit = grid.pixels_per_unit * scale;
    for point in state.data.points() {
        if !point.x.is_finite() || !point.y.is_finite() {
            stats.skipped_points += 1;
            continue;
        }
        let center: Pos2 = origin + vec2(point.x * unit.x, -point.y * unit.y);
        scene.circle(center, POINT_RADIUS, palette.point);
        stats.points += 1;
    }

    stats
}
