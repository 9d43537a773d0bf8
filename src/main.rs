mod app_state;
mod arena;
mod camera;
mod canvas;
mod config;
mod diagnostics;
mod errors;
mod events;
mod export;
mod fonts;
mod frame;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use config::ViewerConfig;
use eframe::egui;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridplot", about = "Interactive pan/zoom plot viewer")]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in the light theme
    #[arg(long)]
    light: bool,

    /// Keep the configured grid step instead of refitting it
    #[arg(long)]
    no_auto_scale: bool,

    /// TTF/OTF font used for labels
    #[arg(long)]
    font: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, config: &mut ViewerConfig) {
        if self.light {
            config.light_mode = true;
        }
        if self.no_auto_scale {
            config.grid.auto_scale = false;
        }
        if let Some(font) = &self.font {
            config.font.path = Some(font.clone());
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ViewerConfig::load(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => ViewerConfig::default(),
    };
    cli.apply(&mut config);
    config.validate()?;

    let font = fonts::PlotFont::load_or_bundled(config.font.path.as_deref(), config.font.size)?;
    let state = app_state::AppState::from_config(&config)?;
    if state.data.is_empty() {
        log::warn!("Dataset is empty, only the grid will be drawn");
    }
    let pacer = frame::FramePacer::from_fps(config.fps);
    log::info!(
        "Opening {}x{} window, {} points, {:?} per frame",
        config.window.width,
        config.window.height,
        state.data.len(),
        pacer.target()
    );
    let viewer = frame::Viewer::new(state, config.arena_capacity, Some(pacer));

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(config.window.title.clone())
            .with_inner_size([config.window.width, config.window.height])
            .with_resizable(true),
        vsync: false,
        renderer: eframe::Renderer::Wgpu,
        ..Default::default()
    };
    eframe::run_native(
        &config.window.title,
        native_options,
        Box::new(move |cc| Box::new(ui::create_app(cc, viewer, font))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))?;
    Ok(())
}
