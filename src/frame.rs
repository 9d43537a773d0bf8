//! The per-frame state machine: input, layout, draw, flush, pace.

use crate::app_state::AppState;
use crate::arena::FrameArena;
use crate::canvas::batch::{self, Backend, DrawBatch, DrawCommand};
use crate::canvas::grid::FitOutcome;
use crate::canvas::overlay;
use crate::canvas::plot::{self, Palette, PlotStats};
use crate::diagnostics::Diagnostics;
use crate::events::{self, ViewerEvent};
use crate::fonts::TextMetrics;
use eframe::egui;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Input,
    Layout,
    Draw,
    Flush,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Continue,
    /// The user asked for the current view to be saved to an image.
    Export,
    Quit,
}

/// Sleeps out whatever is left of a fixed frame budget.
#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    target: Duration,
}

impl FramePacer {
    pub fn new(target: Duration) -> Self {
        Self { target }
    }

    pub fn from_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs_f64(1.0 / f64::from(fps.max(1))))
    }

    pub fn target(&self) -> Duration {
        self.target
    }

    pub fn remaining(&self, elapsed: Duration) -> Option<Duration> {
        self.target.checked_sub(elapsed).filter(|d| !d.is_zero())
    }

    pub fn wait(&self, started: Instant) {
        if let Some(rest) = self.remaining(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }
}

/// Draws `state` into the two batches: plot geometry into `scene`, labels and
/// controls into `overlay`. Used both for the live window and for export.
pub fn draw_phase(
    state: &AppState,
    window_size: egui::Vec2,
    font: &dyn TextMetrics,
    scene: &mut DrawBatch<'_>,
    overlay: &mut DrawBatch<'_>,
) -> PlotStats {
    let stats = plot::draw_graph(state, window_size, font, scene, overlay);
    overlay::draw_controls(state, window_size, font, overlay);
    stats
}

pub fn clear_color(light_mode: bool) -> egui::Color32 {
    Palette::for_mode(light_mode).background
}

fn enter(phase: &mut FramePhase, next: FramePhase) {
    log::trace!("frame phase {:?} -> {:?}", phase, next);
    *phase = next;
}

pub struct Viewer {
    pub state: AppState,
    phase: FramePhase,
    arena: FrameArena,
    scene: Vec<DrawCommand>,
    overlay: Vec<DrawCommand>,
    diagnostics: Diagnostics,
    pacer: Option<FramePacer>,
    frames: u64,
}

impl Viewer {
    pub fn new(state: AppState, arena_capacity: usize, pacer: Option<FramePacer>) -> Self {
        Self {
            state,
            phase: FramePhase::Idle,
            arena: FrameArena::with_capacity(arena_capacity),
            scene: Vec::new(),
            overlay: Vec::new(),
            diagnostics: Diagnostics::default(),
            pacer,
            frames: 0,
        }
    }

    #[cfg(test)]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    #[cfg(test)]
    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    #[cfg(test)]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn arena_capacity(&self) -> usize {
        self.arena.capacity()
    }

    /// Everything recorded since the last call, once a frame has finished.
    pub fn take_frame_report(&mut self) -> Option<String> {
        self.diagnostics.end_frame(&self.arena)
    }

    /// Runs one full frame against `backend`.
    pub fn tick(
        &mut self,
        events: &[ViewerEvent],
        backend: &mut dyn Backend,
        font: &dyn TextMetrics,
    ) -> FrameOutcome {
        let started = Instant::now();
        self.arena.clear();

        enter(&mut self.phase, FramePhase::Input);
        let requests = events::handle_input(&mut self.state, events, font);
        if requests.quit {
            enter(&mut self.phase, FramePhase::Quit);
            log::info!("quit requested after {} frames", self.frames);
            return FrameOutcome::Quit;
        }

        enter(&mut self.phase, FramePhase::Layout);
        let window_size = backend.window_size();
        let camera = self.state.camera;
        if self.state.grid.fit(&camera, window_size) == FitOutcome::IterationCap {
            self.diagnostics.record(format!(
                "grid auto-fit hit its iteration cap (step {:?})",
                self.state.grid.step
            ));
        }

        enter(&mut self.phase, FramePhase::Draw);
        let mut scene = DrawBatch::begin(&self.arena, &mut self.scene);
        let mut overlay = DrawBatch::begin(&self.arena, &mut self.overlay);
        let stats = draw_phase(&self.state, window_size, font, &mut scene, &mut overlay);
        if stats.skipped_points > 0 {
            self.diagnostics
                .record(format!("{} data points are not finite", stats.skipped_points));
        }
        if stats.skipped_axes > 0 {
            log::debug!("{} axes exceed the gridline limit", stats.skipped_axes);
        }

        enter(&mut self.phase, FramePhase::Flush);
        backend.begin_frame(clear_color(self.state.light_mode));
        batch::flush(backend, &scene);
        batch::flush(backend, &overlay);
        backend.end_frame();

        if let Some(pacer) = &self.pacer {
            pacer.wait(started);
        }
        enter(&mut self.phase, FramePhase::Idle);
        self.frames += 1;

        if requests.export {
            FrameOutcome::Export
        } else {
            FrameOutcome::Continue
        }
    }
}
