// src/gfx/rendering/mod.rs
//! Core rendering functionality
//!
//! Displays the simulation through the viewport camera and captures screenshots.

pub mod render_engine;
pub mod screenshot;

// Re-export main types
pub use render_engine::{CapturedFrame, RenderEngine};
pub use screenshot::write_screenshot;
