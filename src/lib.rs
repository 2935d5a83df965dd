//! Window/level (brightness/contrast) dragging for heatmap plots.
//!
//! Dragging over a plot rescales contrast horizontally and shifts brightness
//! vertically; a double click or double tap restores a robust percentile
//! range computed from the plot's data.

pub mod application;
pub mod config;
pub mod domain;
pub mod event_utils;
pub mod global_state;
pub mod infrastructure;
pub mod presentation;

pub use presentation::wasm_api::*;
