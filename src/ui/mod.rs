//! Terminal user interface.
//!
//! # Module Structure
//!
//! - `loop_runner` - Main event loop and terminal management
//! - `input` - Keyboard dispatch per overlay, edit mode and tab
//! - `events` - Completion events from flow tasks
//! - `helpers` - Spawning flow tasks
//! - `render` - Layout and tab dispatch
//! - `sources`, `results`, `preview`, `analytics` - One per tab
//! - `help`, `prompt`, `status` - Overlays and chrome

mod analytics;
mod events;
mod help;
mod helpers;
mod input;
mod loop_runner;
pub mod preview;
mod prompt;
mod render;
mod results;
mod sources;
mod status;

pub use loop_runner::{run, Action};
