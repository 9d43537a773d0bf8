#[derive(Debug, thiserror::Error)]
pub enum ViewerError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Dataset has {xs} x values but {ys} y values")]
    Dataset { xs: usize, ys: usize },

    #[error("Frame arena exhausted: requested {requested} bytes, capacity {capacity}")]
    ArenaExhausted { requested: usize, capacity: usize },

    #[error("Image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Could not move exported file into place: {0}")]
    Persist(#[from] tempfile::PersistError),
}

/// Unrecoverable failure: surface the message to the user and terminate.
pub fn fatal(err: &ViewerError) -> ! {
    log::error!("fatal: {err}");
    let _ = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Error)
        .set_title("Error")
        .set_description(err.to_string())
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
    std::process::exit(1)
}
