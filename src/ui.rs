use crate::canvas::painter::PainterBackend;
use crate::diagnostics;
use crate::events;
use crate::export;
use crate::fonts::{PlotFont, TextMetrics};
use crate::frame::{FrameOutcome, Viewer};
use eframe::egui;

pub struct PlotApp {
    viewer: Viewer,
    font: PlotFont,
    last_size: Option<egui::Vec2>,
}

pub fn create_app(cc: &eframe::CreationContext<'_>, viewer: Viewer, font: PlotFont) -> PlotApp {
    font.register(&cc.egui_ctx);
    log::info!("Plot font: {} at {}px", font.name(), font.font_size());
    PlotApp {
        viewer,
        font,
        last_size: None,
    }
}

impl PlotApp {
    /// A failed export is logged and the viewer keeps running.
    fn export(&self, size: egui::Vec2, pixels_per_point: f32) {
        if let Err(err) = export::export_interactive(
            &self.viewer.state,
            size,
            pixels_per_point,
            &self.font,
            self.viewer.arena_capacity(),
        ) {
            log::error!("Export failed: {err}");
        }
    }
}

impl eframe::App for PlotApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let events = events::collect(ctx, &mut self.last_size);
        let size = ctx.screen_rect().size();

        let painter = ctx.layer_painter(egui::LayerId::background());
        let mut backend = PainterBackend::new(&painter, &self.font, size);

        match self.viewer.tick(&events, &mut backend, &self.font) {
            FrameOutcome::Continue => {}
            FrameOutcome::Export => self.export(size, ctx.pixels_per_point()),
            FrameOutcome::Quit => {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                return;
            }
        }

        if let Some(report) = self.viewer.take_frame_report() {
            diagnostics::report_and_exit(&report);
        }
        ctx.request_repaint();
    }
}
