use super::batch::{Backend, DrawCommand};
use crate::arena::FrameArena;
use crate::fonts::{PlotFont, TextMetrics};
use eframe::egui;

/// Presents draw commands through an egui [`egui::Painter`].
pub struct PainterBackend<'p> {
    painter: &'p egui::Painter,
    font: &'p PlotFont,
    size: egui::Vec2,
}

impl<'p> PainterBackend<'p> {
    pub fn new(painter: &'p egui::Painter, font: &'p PlotFont, size: egui::Vec2) -> Self {
        Self {
            painter,
            font,
            size,
        }
    }
}

impl Backend for PainterBackend<'_> {
    fn window_size(&self) -> egui::Vec2 {
        self.size
    }

    fn begin_frame(&mut self, clear: egui::Color32) {
        self.painter
            .rect_filled(egui::Rect::from_min_size(egui::Pos2::ZERO, self.size), 0.0, clear);
    }

    fn submit(&mut self, command: &DrawCommand, arena: &FrameArena) {
        match *command {
            DrawCommand::Rect {
                rect,
                color,
                corner_radius,
            } => {
                self.painter.rect_filled(rect, corner_radius, color);
            }
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => {
                self.painter.circle_filled(center, radius, color);
            }
            DrawCommand::Text {
                pos,
                size,
                color,
                text,
            } => {
                // egui anchors text at its top edge; commands carry the baseline.
                // Ascent scales linearly with the pixel size.
                let ascent = self.font.ascent() * size / self.font.font_size();
                let top = egui::pos2(pos.x, pos.y - ascent);
                self.painter.text(
                    top,
                    egui::Align2::LEFT_TOP,
                    &*arena.resolve(text),
                    self.font.font_id(size),
                    color,
                );
            }
        }
    }

    fn end_frame(&mut self) {}
}
