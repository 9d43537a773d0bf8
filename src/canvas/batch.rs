//! Deferred draw-command batches.
//!
//! A [`DrawBatch`] records rectangles, circles and text runs in paint order
//! and hands them to a [`Backend`] on [`flush`]. Text payloads are copied
//! into the frame arena; the batch itself only owns the command list it was
//! given.

use crate::arena::{ArenaStr, FrameArena};
use crate::fonts::TextMetrics;
use eframe::egui;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DrawCommand {
    Rect {
        rect: egui::Rect,
        color: egui::Color32,
        corner_radius: f32,
    },
    Circle {
        center: egui::Pos2,
        radius: f32,
        color: egui::Color32,
    },
    /// `pos` is the left end of the text baseline.
    Text {
        pos: egui::Pos2,
        size: f32,
        color: egui::Color32,
        text: ArenaStr,
    },
}

/// Something that can present a frame of [`DrawCommand`]s.
pub trait Backend {
    fn window_size(&self) -> egui::Vec2;
    fn begin_frame(&mut self, clear: egui::Color32);
    fn submit(&mut self, command: &DrawCommand, arena: &FrameArena);
    fn end_frame(&mut self);
}

pub struct DrawBatch<'a> {
    arena: &'a FrameArena,
    list: &'a mut Vec<DrawCommand>,
}

impl<'a> DrawBatch<'a> {
    /// Binds a batch to `arena`, reusing `storage` (emptied first) for the
    /// command list.
    pub fn begin(arena: &'a FrameArena, storage: &'a mut Vec<DrawCommand>) -> Self {
        storage.clear();
        Self {
            arena,
            list: storage,
        }
    }

    pub fn arena(&self) -> &'a FrameArena {
        self.arena
    }

    pub fn rect(&mut self, rect: egui::Rect, color: egui::Color32, corner_radius: f32) {
        self.list.push(DrawCommand::Rect {
            rect,
            color,
            corner_radius,
        });
    }

    pub fn circle(&mut self, center: egui::Pos2, radius: f32, color: egui::Color32) {
        self.list.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    pub fn text(
        &mut self,
        font: &dyn TextMetrics,
        pos: egui::Pos2,
        color: egui::Color32,
        text: &str,
    ) {
        let text = self.arena.alloc_str(text);
        self.text_span(font, pos, color, text);
    }

    /// Appends text already formatted into this batch's arena.
    pub fn text_span(
        &mut self,
        font: &dyn TextMetrics,
        pos: egui::Pos2,
        color: egui::Color32,
        text: ArenaStr,
    ) {
        debug_assert_eq!(text.generation(), self.arena.generation());
        self.list.push(DrawCommand::Text {
            pos,
            size: font.font_size(),
            color,
            text,
        });
    }

    pub fn commands(&self) -> &[DrawCommand] {
        self.list.as_slice()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

/// Submits every command in recording order. The arena is left untouched.
pub fn flush(backend: &mut dyn Backend, batch: &DrawBatch<'_>) {
    if batch.is_empty() {
        return;
    }
    log::trace!("flushing {} commands", batch.len());
    for command in batch.commands() {
        backend.submit(command, batch.arena);
    }
}

/// Test double that records what it is asked to draw.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingBackend {
    pub size: egui::Vec2,
    pub frames_begun: usize,
    pub frames_ended: usize,
    pub clear: Option<egui::Color32>,
    pub submitted: Vec<DrawCommand>,
    pub texts: Vec<String>,
}

#[cfg(test)]
impl RecordingBackend {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: egui::vec2(width, height),
            ..Default::default()
        }
    }
}

#[cfg(test)]
impl Backend for RecordingBackend {
    fn window_size(&self) -> egui::Vec2 {
        self.size
    }

    fn begin_frame(&mut self, clear: egui::Color32) {
        self.frames_begun += 1;
        self.clear = Some(clear);
        self.submitted.clear();
        self.texts.clear();
    }

    fn submit(&mut self, command: &DrawCommand, arena: &FrameArena) {
        if let DrawCommand::Text { text, .. } = command {
            self.texts.push(arena.resolve(*text).to_string());
        }
        self.submitted.push(*command);
    }

    fn end_frame(&mut self) {
        self.frames_ended += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fonts::FixedAdvance;

    #[test]
    fn flush_preserves_recording_order() {
        let arena = FrameArena::default();
        let font = FixedAdvance::new(16.0, 8.0);
        let mut storage = Vec::new();
        let mut batch = DrawBatch::begin(&arena, &mut storage);

        let a = egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(10.0, 10.0));
        batch.rect(a, egui::Color32::RED, 0.0);
        batch.circle(egui::pos2(5.0, 5.0), 3.0, egui::Color32::GREEN);
        batch.text(&font, egui::pos2(1.0, 20.0), egui::Color32::WHITE, "label");
        batch.rect(a, egui::Color32::BLUE, 2.0);

        let mut backend = RecordingBackend::new(100.0, 100.0);
        flush(&mut backend, &batch);

        assert_eq!(backend.submitted.as_slice(), batch.commands());
        assert!(matches!(backend.submitted[0], DrawCommand::Rect { color, .. } if color == egui::Color32::RED));
        assert!(matches!(backend.submitted[1], DrawCommand::Circle { .. }));
        assert!(matches!(backend.submitted[2], DrawCommand::Text { size, .. } if size == 16.0));
        assert!(matches!(backend.submitted[3], DrawCommand::Rect { corner_radius, .. } if corner_radius == 2.0));
        assert_eq!(backend.texts, vec!["label".to_string()]);
    }

    #[test]
    fn begin_reuses_and_empties_storage() {
        let mut arena = FrameArena::default();
        let mut storage = Vec::new();
        {
            let mut batch = DrawBatch::begin(&arena, &mut storage);
            batch.circle(egui::Pos2::ZERO, 1.0, egui::Color32::RED);
            assert_eq!(batch.len(), 1);
        }
        arena.clear();
        let batch = DrawBatch::begin(&arena, &mut storage);
        assert!(batch.is_empty());
    }

    #[test]
    fn flush_does_not_clear_the_arena() {
        let arena = FrameArena::default();
        let font = FixedAdvance::new(12.0, 6.0);
        let mut storage = Vec::new();
        let mut batch = DrawBatch::begin(&arena, &mut storage);
        batch.text(&font, egui::Pos2::ZERO, egui::Color32::WHITE, "abc");

        let mut backend = RecordingBackend::new(10.0, 10.0);
        flush(&mut backend, &batch);
        flush(&mut backend, &batch);
        assert_eq!(arena.used(), 3);
        assert_eq!(backend.texts, vec!["abc".to_string(), "abc".to_string()]);
    }
}
