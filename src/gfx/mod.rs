//! # Graphics Module
//!
//! Everything between the simulation images and the window.
//!
//! - **Camera System** ([`camera`]) - Pan/zoom viewport over the simulation texture
//! - **Rendering** ([`rendering`]) - Fullscreen display pass and TGA screenshots
//! - **Resources** ([`resources`]) - Texture allocation shared by compute and render

pub mod camera;
pub mod rendering;
pub mod resources;

// Re-export commonly used types
pub use camera::{CameraController, CameraUniform, ViewportCamera};
pub use rendering::render_engine::RenderEngine;
