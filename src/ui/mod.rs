//! UI panels for the map application.
//!
//! - Top bar: letter toggles, zoom controls, best score
//! - Right panel: game controls and highlighted-country summary
//! - Central canvas: the map itself

mod canvas;
mod right_panel;
mod top_bar;

pub use canvas::{allocate_canvas, handle_canvas_input, install_badge_loaders, paint_draw_list};
pub use right_panel::render_right_panel;
pub use top_bar::render_top_bar;
