// src/gfx/resources/mod.rs
//! GPU resource management
//!
//! Handles the textures shared between the compute kernel and the display pass.

pub mod texture_resource;

// Re-export main types
pub use texture_resource::TextureResource;
