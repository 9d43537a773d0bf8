//! CPU backend: rasterizes draw commands into a `tiny_skia::Pixmap`.
//!
//! Shapes go through tiny-skia's anti-aliased path filler. Text is drawn by
//! rasterizing `ab_glyph` outlines and blending the coverage straight into the
//! premultiplied pixel buffer.
//!
//! Commands are in points; `pixels_per_point` maps them onto the pixmap.

use super::batch::{Backend, DrawCommand};
use crate::arena::FrameArena;
use crate::errors::ViewerError;
use crate::fonts::PlotFont;
use ab_glyph::Font;
use eframe::egui;
use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, PremultipliedColorU8, Transform};

pub struct RasterBackend<'f> {
    pixmap: Pixmap,
    font: &'f PlotFont,
    pixels_per_point: f32,
}

impl<'f> RasterBackend<'f> {
    pub fn new(width: u32, height: u32, font: &'f PlotFont) -> Result<Self, ViewerError> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| {
            ViewerError::Config(format!("cannot allocate a {width}x{height} pixmap"))
        })?;
        Ok(Self {
            pixmap,
            font,
            pixels_per_point: 1.0,
        })
    }

    /// Draws every command scaled by `pixels_per_point`, so a window on a
    /// HiDPI display exports at its physical resolution.
    pub fn with_pixels_per_point(mut self, pixels_per_point: f32) -> Self {
        if pixels_per_point.is_finite() && pixels_per_point > 0.0 {
            self.pixels_per_point = pixels_per_point;
        }
        self
    }

    /// Un-premultiplies the finished frame into an RGBA image.
    pub fn into_image(self) -> Result<image::RgbaImage, ViewerError> {
        let (width, height) = (self.pixmap.width(), self.pixmap.height());
        let mut raw = Vec::with_capacity(self.pixmap.data().len());
        for px in self.pixmap.pixels() {
            let c = px.demultiply();
            raw.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        image::RgbaImage::from_raw(width, height, raw)
            .ok_or_else(|| ViewerError::Config("pixmap size does not match its data".into()))
    }

    fn fill(&mut self, path: &Path, color: egui::Color32) {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        let mut paint = Paint::default();
        paint.set_color_rgba8(r, g, b, a);
        paint.anti_alias = true;
        let ppp = self.pixels_per_point;
        self.pixmap
            .fill_path(path, &paint, FillRule::Winding, Transform::from_scale(ppp, ppp), None);
    }

    fn draw_text(&mut self, text: &str, size: f32, baseline: egui::Pos2, color: egui::Color32) {
        let [r, g, b, a] = color.to_srgba_unmultiplied();
        let width = self.pixmap.width() as i32;
        let height = self.pixmap.height() as i32;
        let ppp = self.pixels_per_point;
        let origin = egui::pos2(baseline.x * ppp, baseline.y * ppp);
        let pixels = self.pixmap.pixels_mut();

        for glyph in self.font.layout(text, size * ppp, origin) {
            let Some(outlined) = self.font.face().outline_glyph(glyph) else {
                continue;
            };
            let bounds = outlined.px_bounds();
            let left = bounds.min.x as i32;
            let top = bounds.min.y as i32;
            outlined.draw(|gx, gy, coverage| {
                let x = left + gx as i32;
                let y = top + gy as i32;
                if x < 0 || y < 0 || x >= width || y >= height {
                    return;
                }
                let idx = (y * width + x) as usize;
                pixels[idx] = blend(pixels[idx], [r, g, b, a], coverage);
            });
        }
    }
}

/// Source-over of an unpremultiplied colour at `coverage` onto a
/// premultiplied pixel.
fn blend(dst: PremultipliedColorU8, src: [u8; 4], coverage: f32) -> PremultipliedColorU8 {
    let alpha = (src[3] as f32 / 255.0) * coverage.clamp(0.0, 1.0);
    let inv = 1.0 - alpha;
    let channel = |s: u8, d: u8| (s as f32 * alpha + d as f32 * inv).round().min(255.0) as u8;

    let out_a = channel(255, dst.alpha());
    let out_r = channel(src[0], dst.red()).min(out_a);
    let out_g = channel(src[1], dst.green()).min(out_a);
    let out_b = channel(src[2], dst.blue()).min(out_a);
    PremultipliedColorU8::from_rgba(out_r, out_g, out_b, out_a).unwrap_or(dst)
}

fn rounded_rect(rect: tiny_skia::Rect, radius: f32) -> Option<Path> {
    let radius = radius.min(rect.width() * 0.5).min(rect.height() * 0.5);
    let (l, t, r, b) = (rect.left(), rect.top(), rect.right(), rect.bottom());
    let mut pb = PathBuilder::new();
    pb.move_to(l + radius, t);
    pb.line_to(r - radius, t);
    pb.quad_to(r, t, r, t + radius);
    pb.line_to(r, b - radius);
    pb.quad_to(r, b, r - radius, b);
    pb.line_to(l + radius, b);
    pb.quad_to(l, b, l, b - radius);
    pb.line_to(l, t + radius);
    pb.quad_to(l, t, l + radius, t);
    pb.close();
    pb.finish()
}

impl Backend for RasterBackend<'_> {
    fn window_size(&self) -> egui::Vec2 {
        egui::vec2(self.pixmap.width() as f32, self.pixmap.height() as f32) / self.pixels_per_point
    }

    fn begin_frame(&mut self, clear: egui::Color32) {
        let [r, g, b, a] = clear.to_srgba_unmultiplied();
        self.pixmap.fill(tiny_skia::Color::from_rgba8(r, g, b, a));
    }

    fn submit(&mut self, command: &DrawCommand, arena: &FrameArena) {
        match *command {
            DrawCommand::Rect {
                rect,
                color,
                corner_radius,
            } => {
                let Some(area) =
                    tiny_skia::Rect::from_ltrb(rect.min.x, rect.min.y, rect.max.x, rect.max.y)
                else {
                    return;
                };
                let path = if corner_radius > 0.0 {
                    rounded_rect(area, corner_radius)
                } else {
                    Some(PathBuilder::from_rect(area))
                };
                if let Some(path) = path {
                    self.fill(&path, color);
                }
            }
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => {
                if let Some(path) = PathBuilder::from_circle(center.x, center.y, radius) {
                    self.fill(&path, color);
                }
            }
            DrawCommand::Text {
                pos,
                size,
                color,
                text,
            } => {
                let text = arena.resolve(text);
                self.draw_text(&text, size, pos, color);
            }
        }
    }

    fn end_frame(&mut self) {}
}
