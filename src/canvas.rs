//! Everything that turns view state into pixels.
//
// `batch` defines the command stream and the `Backend` seam; `plot` and
// `overlay` produce commands; `painter` (egui) and `rasterizer` (tiny-skia)
// consume them.
pub mod batch;
pub mod grid;
pub mod overlay;
pub mod painter;
pub mod plot;
pub mod rasterizer;
