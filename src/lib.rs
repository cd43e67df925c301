//! newsdesk: a terminal client for a news scraping and article generation
//! service.
//!
//! The binary wires these modules together; they are exposed as a library so
//! integration tests can drive the flows without a terminal.

pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod keybindings;
pub mod storage;
pub mod theme;
pub mod ui;
pub mod util;
