//! Core engine: runs checks over a scene, aggregates results and renders
//! reports.

mod junit;
mod merge;
mod receipt;
mod render;
mod run;
mod selection;
mod shape;

pub use junit::render_junit_for_receipt;
pub use merge::merge_results;
pub use receipt::{
    ReceiptOptions, SceneNames, build_receipt, component_suffix, compute_exit_code, display_items,
};
pub use render::{NORMAL_ITEM_LIMIT, render_markdown_for_receipt};
pub use run::{CancelToken, RunError, Runner};
pub use selection::{SelectionError, select_checks};
pub use shape::{ShapeError, normalise};
