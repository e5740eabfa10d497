pub mod camera_controller;
pub mod camera_utils;
pub mod viewport_camera;

// Re-export main types
pub use camera_controller::CameraController;
pub use camera_utils::CameraUniform;
pub use viewport_camera::{ViewTransform, ViewportCamera};
