//! Embassy tasks
//!
//! - [`arrival_task`]: core 1, frames host bytes into commands and sends replies
//! - [`foreground`]: core 0, dispatches commands and renders frames

mod arrival;
pub mod foreground;

pub use arrival::arrival_task;
pub use foreground::{foreground_loop, Foreground};
