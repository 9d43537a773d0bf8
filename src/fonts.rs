use crate::errors::ViewerError;
use ab_glyph::{Font, FontArc, PxScale, ScaleFont};
use eframe::egui;
use std::fmt;
use std::fs;
use std::path::Path;

/// Family name the plot font is registered under in egui.
pub const FAMILY: &str = "plot";

/// Egui's bundled monospace face, used when no font file is configured.
const BUNDLED_FACE: &str = "Hack";

/// Measurement side of the font service.
pub trait TextMetrics {
    fn font_size(&self) -> f32;
    /// Distance from the top of a line to its baseline, in pixels.
    fn ascent(&self) -> f32;
    fn text_width(&self, text: &str) -> f32;
}

/// The single face the viewer draws labels with.
///
/// The raw bytes are kept so the exact same face can be handed to egui for
/// live drawing and to `ab_glyph` for measuring and for off-screen export.
#[derive(Clone)]
pub struct PlotFont {
    name: String,
    bytes: Vec<u8>,
    font: FontArc,
    size: f32,
}

impl fmt::Debug for PlotFont {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlotFont")
            .field("name", &self.name)
            .field("bytes", &self.bytes.len())
            .field("size", &self.size)
            .finish()
    }
}

impl PlotFont {
    pub fn from_bytes(name: &str, bytes: Vec<u8>, size: f32) -> Result<Self, ViewerError> {
        let font = FontArc::try_from_vec(bytes.clone())
            .map_err(|e| ViewerError::Font(format!("{name}: {e}")))?;
        Ok(Self {
            name: name.to_owned(),
            bytes,
            font,
            size,
        })
    }

    pub fn load(path: &Path, size: f32) -> Result<Self, ViewerError> {
        let bytes = fs::read(path)?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| FAMILY.to_owned());
        Self::from_bytes(&name, bytes, size)
    }

    pub fn bundled(size: f32) -> Result<Self, ViewerError> {
        let defs = egui::FontDefinitions::default();
        let data = defs
            .font_data
            .get(BUNDLED_FACE)
            .ok_or_else(|| ViewerError::Font(format!("egui has no bundled {BUNDLED_FACE} face")))?;
        Self::from_bytes(BUNDLED_FACE, data.font.to_vec(), size)
    }

    /// Loads `path` if given, falling back to the bundled face when it is
    /// missing or unreadable.
    pub fn load_or_bundled(path: Option<&Path>, size: f32) -> Result<Self, ViewerError> {
        if let Some(path) = path {
            match Self::load(path, size) {
                Ok(font) => {
                    log::info!("Loaded font {:?} at {}px", path, size);
                    return Ok(font);
                }
                Err(err) => log::warn!("Could not load font {:?} ({err}); using bundled face", path),
            }
        }
        Self::bundled(size)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn face(&self) -> &FontArc {
        &self.font
    }

    /// Makes this face available to egui under [`FAMILY`].
    pub fn register(&self, ctx: &egui::Context) {
        let mut defs = egui::FontDefinitions::default();
        defs.font_data
            .insert(FAMILY.to_owned(), egui::FontData::from_owned(self.bytes.clone()));
        defs.families
            .insert(egui::FontFamily::Name(FAMILY.into()), vec![FAMILY.to_owned()]);
        ctx.set_fonts(defs);
    }

    pub fn font_id(&self, size: f32) -> egui::FontId {
        egui::FontId::new(size, egui::FontFamily::Name(FAMILY.into()))
    }

    /// Positions every glyph of `text` on a baseline starting at `origin`,
    /// using the same advances and kerning as [`TextMetrics::text_width`].
    pub fn layout(&self, text: &str, size: f32, origin: egui::Pos2) -> Vec<ab_glyph::Glyph> {
        let scale = PxScale::from(size);
        let scaled = self.font.as_scaled(scale);
        let mut glyphs = Vec::with_capacity(text.len());
        let mut cursor = origin.x;
        let mut prev: Option<ab_glyph::GlyphId> = None;

        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = prev {
                cursor += scaled.kern(prev, id);
            }
            glyphs.push(id.with_scale_and_position(scale, ab_glyph::point(cursor, origin.y)));
            cursor += scaled.h_advance(id);
            prev = Some(id);
        }
        glyphs
    }
}

impl TextMetrics for PlotFont {
    fn font_size(&self) -> f32 {
        self.size
    }

    fn ascent(&self) -> f32 {
        self.font.as_scaled(PxScale::from(self.size)).ascent()
    }

    fn text_width(&self, text: &str) -> f32 {
        let scaled = self.font.as_scaled(PxScale::from(self.size));
        let mut width = 0.0;
        let mut prev: Option<ab_glyph::GlyphId> = None;
        for ch in text.chars() {
            let id = scaled.glyph_id(ch);
            if let Some(prev) = prev {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            prev = Some(id);
        }
        width
    }
}

/// Monospace stand-in used by headless tests.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance {
    pub size: f32,
    pub advance: f32,
}

#[cfg(test)]
impl FixedAdvance {
    pub fn new(size: f32, advance: f32) -> Self {
        Self { size, advance }
    }
}

#[cfg(test)]
impl TextMetrics for FixedAdvance {
    fn font_size(&self) -> f32 {
        self.size
    }

    fn ascent(&self) -> f32 {
        self.size * 0.8
    }

    fn text_width(&self, text: &str) -> f32 {
        text.chars().count() as f32 * self.advance
    }
}
