//! Render pipeline: turns geometry and session state into layered draw
//! instructions for the canvas, plus the side-panel summary.

mod draw;
mod pipeline;
mod scheduler;
mod style;
mod summary;

pub use draw::{DrawCommand, DrawLayer, DrawList, LayerKind};
pub use pipeline::{build_draw_list, circle_radius, thumbnail_width, RenderInput};
pub use scheduler::RenderScheduler;
pub use style::ResolvedStyle;
pub use summary::{sort_summary, SummaryEntry};
