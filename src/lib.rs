// src/lib.rs
//! Automata
//!
//! A GPU-resident cellular automaton: a compute kernel steps a pair of images in
//! alternation while a render pass shows the latest one, with pan, zoom and timing
//! controls. Built on wgpu and winit.

pub mod app;
pub mod config;
pub mod error;
pub mod gfx;
pub mod input;
pub mod performance;
pub mod simulation;
pub mod wgpu_utils;

// Re-export main types for convenience
pub use app::AutomataApp;
pub use config::AppConfig;
pub use error::{AutomataError, Result};
