//! The controls bar along the top of the window and the slider info panel.

use super::batch::DrawBatch;
use super::plot::{rgba, Palette, PADDING};
use crate::app_state::AppState;
use crate::fonts::TextMetrics;
use eframe::egui::{self, pos2, vec2, Rect};

pub const SAVE_LABEL: &str = "Save";

const PANEL_WIDTH: f32 = 300.0;
const PANEL_BOTTOM: f32 = 200.0;
const LINE_SPACING: f32 = 1.25;

pub fn bar_height(font: &dyn TextMetrics) -> f32 {
    font.font_size() * 2.0
}

/// Clickable area of the "Save" label.
pub fn save_button_rect(font: &dyn TextMetrics) -> Rect {
    let width = font.text_width(SAVE_LABEL);
    Rect::from_min_size(
        pos2(PADDING - 4.0, 0.0),
        vec2(width + 8.0, bar_height(font)),
    )
}

pub fn draw_controls(
    state: &AppState,
    window_size: egui::Vec2,
    font: &dyn TextMetrics,
    overlay: &mut DrawBatch<'_>,
) {
    if !state.show_controls {
        return;
    }
    let bar = bar_height(font);
    let white = rgba(0xFFFFFFFF);

    overlay.rect(
        Rect::from_min_max(pos2(0.0, 0.0), pos2(window_size.x, bar)),
        rgba(0x242424FF),
        0.0,
    );
    overlay.text(font, pos2(PADDING, font.font_size() * 1.5), white, SAVE_LABEL);

    if state.show_slider_control {
        draw_slider_panel(state, font, bar, overlay);
    }
}

fn draw_slider_panel(
    state: &AppState,
    font: &dyn TextMetrics,
    bar: f32,
    overlay: &mut DrawBatch<'_>,
) {
    let panel = Rect::from_min_max(
        pos2(PADDING, bar + PADDING),
        pos2(PADDING + PANEL_WIDTH, bar + PANEL_BOTTOM),
    );
    overlay.rect(panel, rgba(0x242424C8), 4.0);

    let arena = overlay.arena();
    let theme = if state.light_mode { "light" } else { "dark" };
    let auto = if state.grid.auto_scale { "on" } else { "off" };
    let lines = [
        arena.alloc_fmt(format_args!("zoom: {:.2}x", state.camera.scale())),
        arena.alloc_fmt(format_args!("step x: {:.2}", state.grid.step.x)),
        arena.alloc_fmt(format_args!("step y: {:.2}", state.grid.step.y)),
        arena.alloc_fmt(format_args!("auto-scale: {auto}")),
        arena.alloc_fmt(format_args!("theme: {theme}")),
    ];

    let color = Palette::for_mode(false).text;
    let advance = font.font_size() * LINE_SPACING;
    for (n, line) in lines.into_iter().enumerate() {
        let pos = panel.min + vec2(PADDING, PADDING + (n + 1) as f32 * advance);
        overlay.text_span(font, pos, color, line);
    }
}
