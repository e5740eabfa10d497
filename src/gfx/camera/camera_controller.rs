use winit::{
    dpi::PhysicalPosition,
    event::{DeviceEvent, ElementState, MouseScrollDelta},
};

use super::viewport_camera::ViewportCamera;

/// Pixel scroll deltas (touchpads) per line of wheel scroll
const PIXELS_PER_LINE: f32 = 20.0;

/// Collects mouse gestures between frames and applies them to a [`ViewportCamera`]
pub struct CameraController {
    /// Multiplier on raw mouse motion
    pub pan_speed: f32,
    /// Multiplier on scroll lines
    pub zoom_speed: f32,
    is_mouse_pressed: bool,
    is_captured: bool,
    pending_pan: (f32, f32),
    pending_zoom: f32,
}

impl CameraController {
    pub fn new(pan_speed: f32, zoom_speed: f32) -> Self {
        Self {
            pan_speed,
            zoom_speed,
            is_mouse_pressed: false,
            is_captured: false,
            pending_pan: (0.0, 0.0),
            pending_zoom: 0.0,
        }
    }

    pub fn process_events(&mut self, event: &DeviceEvent) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.is_panning() {
                self.pending_pan.0 += delta.0 as f32;
                self.pending_pan.1 += delta.1 as f32;
            }
        }
    }

    pub fn process_scroll(&mut self, delta: &MouseScrollDelta) {
        self.pending_zoom += match delta {
            MouseScrollDelta::LineDelta(_, scroll) => *scroll,
            MouseScrollDelta::PixelDelta(PhysicalPosition { y: scroll, .. }) => {
                *scroll as f32 / PIXELS_PER_LINE
            }
        };
    }

    /// Left button state; dragging with it held pans
    pub fn set_mouse_button(&mut self, state: ElementState) {
        self.is_mouse_pressed = state == ElementState::Pressed;
    }

    /// While captured, any mouse motion pans
    pub fn set_captured(&mut self, captured: bool) {
        self.is_captured = captured;
    }

    pub fn is_captured(&self) -> bool {
        self.is_captured
    }

    fn is_panning(&self) -> bool {
        self.is_mouse_pressed || self.is_captured
    }

    /// Apply everything gathered since the last frame. Content follows the cursor, so
    /// the view moves against the motion.
    pub fn update_camera(&mut self, camera: &mut ViewportCamera) {
        let (dx, dy) = std::mem::take(&mut self.pending_pan);
        if dx != 0.0 || dy != 0.0 {
            camera.pan(-dx * self.pan_speed, -dy * self.pan_speed);
        }

        let scroll = std::mem::take(&mut self.pending_zoom);
        if scroll != 0.0 {
            camera.zoom(scroll * self.zoom_speed);
        }
    }
}

impl Default for CameraController {
    fn default() -> Self {
        // physical pixels against a half-viewport domain
        Self::new(0.5, 1.0)
    }
}
