//! Saving the current view to a JPEG or PNG file.

use crate::app_state::AppState;
use crate::arena::FrameArena;
use crate::canvas::batch::{self, Backend, DrawBatch};
use crate::canvas::rasterizer::RasterBackend;
use crate::errors::ViewerError;
use crate::fonts::PlotFont;
use crate::frame;
use eframe::egui;
use image::ImageEncoder;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

pub const DEFAULT_FILE_NAME: &str = "graph.jpg";
const JPEG_QUALITY: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Jpeg,
    Png,
}

impl ExportFormat {
    /// Picks the format from the file extension, case-insensitively.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }
}

/// The snapshot an export draws: light theme, no controls.
pub fn export_state(state: &AppState) -> AppState {
    AppState {
        light_mode: true,
        show_controls: false,
        show_slider_control: false,
        track_mouse: false,
        ..state.clone()
    }
}

/// Replays the drawing routine for `state` into an off-screen image. `size`
/// is in points; the image is `size * pixels_per_point` pixels, matching what
/// the window shows. The live state is not touched.
pub fn render_offscreen(
    state: &AppState,
    size: egui::Vec2,
    pixels_per_point: f32,
    font: &PlotFont,
    arena_capacity: usize,
) -> Result<image::RgbaImage, ViewerError> {
    let ppp = if pixels_per_point.is_finite() && pixels_per_point > 0.0 {
        pixels_per_point
    } else {
        1.0
    };
    let width = (size.x * ppp).round().max(0.0) as u32;
    let height = (size.y * ppp).round().max(0.0) as u32;
    let mut backend = RasterBackend::new(width, height, font)?.with_pixels_per_point(ppp);
    let size = backend.window_size();

    let mut snapshot = export_state(state);
    let camera = snapshot.camera;
    snapshot.grid.fit(&camera, size);

    let arena = FrameArena::with_capacity(arena_capacity);
    let mut scene_list = Vec::new();
    let mut overlay_list = Vec::new();
    let mut scene = DrawBatch::begin(&arena, &mut scene_list);
    let mut overlay = DrawBatch::begin(&arena, &mut overlay_list);
    frame::draw_phase(&snapshot, size, font, &mut scene, &mut overlay);

    backend.begin_frame(egui::Color32::WHITE);
    batch::flush(&mut backend, &scene);
    batch::flush(&mut backend, &overlay);
    backend.end_frame();
    backend.into_image()
}

/// Encodes `image` next to `path` and renames it into place, so a failed
/// encode never leaves a truncated file behind.
pub fn write_image(
    image: &image::RgbaImage,
    path: &Path,
    format: ExportFormat,
) -> Result<(), ViewerError> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    {
        let mut out = BufWriter::new(tmp.as_file_mut());
        let (w, h) = image.dimensions();
        match format {
            ExportFormat::Jpeg => {
                let rgb = image::DynamicImage::ImageRgba8(image.clone()).to_rgb8();
                image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
                    .encode(rgb.as_raw(), w, h, image::ColorType::Rgb8)?;
            }
            ExportFormat::Png => {
                image::codecs::png::PngEncoder::new(&mut out).write_image(
                    image.as_raw(),
                    w,
                    h,
                    image::ColorType::Rgba8,
                )?;
            }
        }
        out.flush()?;
    }
    tmp.persist(path)?;
    Ok(())
}

pub fn choose_path() -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_title("Save graph")
        .add_filter("JPEG image", &["jpg", "jpeg"])
        .add_filter("PNG image", &["png"])
        .set_file_name(DEFAULT_FILE_NAME)
        .save_file()
}

/// Asks for a destination and saves the view there. `Ok(None)` means the
/// user cancelled or picked a path with an unsupported extension.
pub fn export_interactive(
    state: &AppState,
    size: egui::Vec2,
    pixels_per_point: f32,
    font: &PlotFont,
    arena_capacity: usize,
) -> Result<Option<PathBuf>, ViewerError> {
    let Some(path) = choose_path() else {
        log::info!("Export cancelled");
        return Ok(None);
    };
    let Some(format) = ExportFormat::from_path(&path) else {
        log::info!("Export skipped: unsupported file extension in {:?}", path);
        return Ok(None);
    };

    let image = render_offscreen(state, size, pixels_per_point, font, arena_capacity)?;
    write_image(&image, &path, format)?;
    log::info!("Saved {}x{} {:?} to {:?}", image.width(), image.height(), format, path);
    Ok(Some(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::batch::{DrawCommand, RecordingBackend};
    use crate::frame::{FramePacer, Viewer};
    use crate::events::ViewerEvent;
    use eframe::egui::Key;

    #[test]
    fn format_follows_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a/graph.jpg")), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_path(Path::new("graph.JPEG")), Some(ExportFormat::Jpeg));
        assert_eq!(ExportFormat::from_path(Path::new("graph.png")), Some(ExportFormat::Png));
        assert_eq!(ExportFormat::from_path(Path::new("graph.bmp")), None);
        assert_eq!(ExportFormat::from_path(Path::new("graph")), None);
    }

    #[test]
    fn export_replays_live_light_mode_commands() {
        let font = PlotFont::bundled(16.0).expect("bundled face");
        let mut state = AppState::default();
        state.on_resize(egui::vec2(640.0, 360.0));
        state.camera.pan(egui::vec2(37.0, -12.0));

        // live frame in light mode without the controls bar
        let mut live_state = state.clone();
        live_state.light_mode = true;
        live_state.show_controls = false;
        let mut viewer = Viewer::new(live_state, 1 << 16, None::<FramePacer>);
        let mut live = RecordingBackend::new(640.0, 360.0);
        viewer.tick(&[], &mut live, &font);

        // what export would draw
        let mut snapshot = export_state(&state);
        let camera = snapshot.camera;
        snapshot.grid.fit(&camera, egui::vec2(640.0, 360.0));
        let arena = FrameArena::default();
        let (mut a, mut b) = (Vec::new(), Vec::new());
        let mut scene = DrawBatch::begin(&arena, &mut a);
        let mut overlay = DrawBatch::begin(&arena, &mut b);
        frame::draw_phase(&snapshot, egui::vec2(640.0, 360.0), &font, &mut scene, &mut overlay);
        let mut offscreen = RecordingBackend::new(640.0, 360.0);
        offscreen.begin_frame(egui::Color32::WHITE);
        batch::flush(&mut offscreen, &scene);
        batch::flush(&mut offscreen, &overlay);

        assert_eq!(live.texts, offscreen.texts);
        assert_eq!(live.submitted.len(), offscreen.submitted.len());
        for (l, o) in live.submitted.iter().zip(&offscreen.submitted) {
            match (l, o) {
                // handles point into different arenas; compare what they carry
                (
                    DrawCommand::Text { pos: lp, size: ls, color: lc, .. },
                    DrawCommand::Text { pos: op, size: os, color: oc, .. },
                ) => assert_eq!((lp, ls, lc), (op, os, oc)),
                _ => assert_eq!(l, o),
            }
        }
    }

    #[test]
    fn offscreen_render_is_light_and_sized() {
        let font = PlotFont::bundled(16.0).expect("bundled face");
        let mut state = AppState::default();
        state.on_resize(egui::vec2(320.0, 200.0));
        let image = render_offscreen(&state, egui::vec2(320.0, 200.0), 1.0, &font, 1 << 16)
            .expect("render");
        assert_eq!(image.dimensions(), (320, 200));
        // top-left corner is background, not the dark controls bar
        assert_eq!(image.get_pixel(1, 1).0, [255, 255, 255, 255]);
        assert!(!state.light_mode);
    }

    #[test]
    fn hidpi_export_keeps_layout_at_physical_size() {
        let font = PlotFont::bundled(16.0).expect("bundled face");
        let mut state = AppState::default();
        state.on_resize(egui::vec2(320.0, 200.0));
        let logical = render_offscreen(&state, egui::vec2(320.0, 200.0), 1.0, &font, 1 << 16)
            .expect("render");
        let physical = render_offscreen(&state, egui::vec2(320.0, 200.0), 2.0, &font, 1 << 16)
            .expect("render");
        assert_eq!(physical.dimensions(), (640, 400));

        // the y axis is 4 points wide around x = 160 in both renders
        let red = |image: &image::RgbaImage, x: u32, y: u32| image.get_pixel(x, y).0[0];
        assert!(red(&logical, 159, 150) < 64);
        assert!(red(&logical, 166, 150) > 200);
        assert!(red(&physical, 318, 300) < 64);
        assert!(red(&physical, 332, 300) > 200);
    }

    #[test]
    fn write_into_missing_directory_fails_without_output() {
        let font = PlotFont::bundled(16.0).expect("bundled face");
        let image = render_offscreen(&AppState::default(), egui::vec2(32.0, 24.0), 1.0, &font, 1 << 16)
            .expect("render");
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing").join("graph.png");
        assert!(write_image(&image, &path, ExportFormat::Png).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn save_writes_decodable_files() {
        let font = PlotFont::bundled(16.0).expect("bundled face");
        let state = AppState::default();
        let image = render_offscreen(&state, egui::vec2(64.0, 48.0), 1.0, &font, 1 << 16)
            .expect("render");
        let dir = tempfile::tempdir().expect("tempdir");

        for name in ["out.png", "out.jpg"] {
            let path = dir.path().join(name);
            let format = ExportFormat::from_path(&path).expect("known extension");
            write_image(&image, &path, format).expect("write");
            let decoded = image::open(&path).expect("decodes");
            assert_eq!((decoded.width(), decoded.height()), (64, 48));
        }
        // only the two finished files, no temp leftovers
        assert_eq!(std::fs::read_dir(dir.path()).expect("list").count(), 2);
    }

    #[test]
    fn zero_size_export_fails_cleanly() {
        let font = PlotFont::bundled(16.0).expect("bundled face");
        let mut viewer = Viewer::new(AppState::default(), 1 << 16, None)
            .with_diagnostics(crate::diagnostics::Diagnostics::new(true));
        let mut live = RecordingBackend::new(640.0, 360.0);
        viewer.tick(&[], &mut live, &font);

        let err = render_offscreen(&viewer.state, egui::Vec2::ZERO, 1.0, &font, 1024);
        assert!(err.is_err());
        // the viewer carries on with nothing to report
        assert_eq!(viewer.take_frame_report(), None);
        assert_eq!(viewer.tick(&[], &mut live, &font), crate::frame::FrameOutcome::Continue);
    }

    #[test]
    fn ctrl_s_leaves_live_view_untouched() {
        let font = PlotFont::bundled(16.0).expect("bundled face");
        let mut viewer = Viewer::new(AppState::default(), 1 << 16, None);
        let mut live = RecordingBackend::new(640.0, 360.0);
        viewer.tick(
            &[ViewerEvent::KeyDown { key: Key::S, ctrl: true }],
            &mut live,
            &font,
        );
        let before = viewer.state.clone();
        render_offscreen(&viewer.state, egui::vec2(640.0, 360.0), 1.0, &font, 1 << 16).expect("render");
        assert_eq!(viewer.state.grid, before.grid);
        assert_eq!(viewer.state.light_mode, before.light_mode);
        assert!(viewer.state.show_controls);
    }
}
