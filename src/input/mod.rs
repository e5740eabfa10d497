//! # Input Handling
//!
//! Turns winit events into per-frame state for the main loop. Discrete commands are
//! queued as [`Action`]s and drained once per frame; held keys and mouse gestures are
//! sampled as levels.

use std::collections::VecDeque;

use winit::{
    event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent},
    keyboard::{KeyCode, PhysicalKey},
};

use crate::gfx::camera::{CameraController, ViewportCamera};
use crate::simulation::IntervalDirection;

/// Discrete commands, each fired once per press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleRunning,
    Screenshot,
    Step,
    ResetCamera,
    ToggleCursorCapture,
}

impl Action {
    fn for_key(key: KeyCode) -> Option<Self> {
        match key {
            KeyCode::Escape => Some(Action::Quit),
            KeyCode::Space => Some(Action::ToggleRunning),
            KeyCode::Enter | KeyCode::NumpadEnter => Some(Action::Screenshot),
            KeyCode::KeyN => Some(Action::Step),
            KeyCode::KeyR => Some(Action::ResetCamera),
            _ => None,
        }
    }
}

/// Fires on a released-to-pressed transition only; key repeat and held frames don't
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyLatch {
    held: bool,
}

impl KeyLatch {
    /// Record the new state, returning true if this is a fresh press
    pub fn update(&mut self, pressed: bool) -> bool {
        let fired = pressed && !self.held;
        self.held = pressed;
        fired
    }
}

const LATCHED_KEYS: [KeyCode; 6] = [
    KeyCode::Escape,
    KeyCode::Space,
    KeyCode::Enter,
    KeyCode::NumpadEnter,
    KeyCode::KeyN,
    KeyCode::KeyR,
];

pub struct InputHandler {
    actions: VecDeque<Action>,
    latches: [KeyLatch; LATCHED_KEYS.len()],
    capture_latch: KeyLatch,
    slower_held: bool,
    faster_held: bool,
    camera_controller: CameraController,
}

impl InputHandler {
    pub fn new(camera_controller: CameraController) -> Self {
        Self {
            actions: VecDeque::new(),
            latches: [KeyLatch::default(); LATCHED_KEYS.len()],
            capture_latch: KeyLatch::default(),
            slower_held: false,
            faster_held: false,
            camera_controller,
        }
    }

    /// Feed a window event; returns true if it was an input event this handler uses
    pub fn handle_window_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key_code),
                        state,
                        ..
                    },
                ..
            } => self.process_key(*key_code, *state),
            WindowEvent::MouseInput { button, state, .. } => {
                self.process_mouse_button(*button, *state)
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.camera_controller.process_scroll(delta);
                true
            }
            WindowEvent::Focused(false) => {
                // releases are not delivered to an unfocused window
                self.release_all();
                false
            }
            _ => false,
        }
    }

    pub fn handle_device_event(&mut self, event: &DeviceEvent) {
        self.camera_controller.process_events(event);
    }

    pub fn process_key(&mut self, key: KeyCode, state: ElementState) -> bool {
        let pressed = state == ElementState::Pressed;
        match key {
            KeyCode::ArrowUp => {
                self.slower_held = pressed;
                true
            }
            KeyCode::ArrowDown => {
                self.faster_held = pressed;
                true
            }
            _ => {
                let Some(index) = LATCHED_KEYS.iter().position(|k| *k == key) else {
                    return false;
                };
                if self.latches[index].update(pressed) {
                    if let Some(action) = Action::for_key(key) {
                        self.actions.push_back(action);
                    }
                }
                true
            }
        }
    }

    pub fn process_mouse_button(&mut self, button: MouseButton, state: ElementState) -> bool {
        match button {
            MouseButton::Left => {
                self.camera_controller.set_mouse_button(state);
                true
            }
            MouseButton::Right => {
                if self.capture_latch.update(state == ElementState::Pressed) {
                    self.actions.push_back(Action::ToggleCursorCapture);
                }
                true
            }
            _ => false,
        }
    }

    /// Actions queued since the last drain, oldest first
    pub fn drain_actions(&mut self) -> impl Iterator<Item = Action> + '_ {
        self.actions.drain(..)
    }

    /// Interval scaling requested by held keys, if exactly one direction is held
    pub fn interval_direction(&self) -> Option<IntervalDirection> {
        match (self.slower_held, self.faster_held) {
            (true, false) => Some(IntervalDirection::Slower),
            (false, true) => Some(IntervalDirection::Faster),
            _ => None,
        }
    }

    /// Apply pan and zoom gathered since the last frame
    pub fn update_camera(&mut self, camera: &mut ViewportCamera) {
        self.camera_controller.update_camera(camera);
    }

    pub fn set_cursor_captured(&mut self, captured: bool) {
        self.camera_controller.set_captured(captured);
    }

    pub fn is_cursor_captured(&self) -> bool {
        self.camera_controller.is_captured()
    }

    fn release_all(&mut self) {
        for latch in &mut self.latches {
            latch.update(false);
        }
        self.capture_latch.update(false);
        self.slower_held = false;
        self.faster_held = false;
        self.camera_controller.set_mouse_button(ElementState::Released);
    }
}

impl Default for InputHandler {
    fn default() -> Self {
        Self::new(CameraController::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::event::MouseScrollDelta;

    fn press(handler: &mut InputHandler, key: KeyCode) {
        handler.process_key(key, ElementState::Pressed);
    }

    fn release(handler: &mut InputHandler, key: KeyCode) {
        handler.process_key(key, ElementState::Released);
    }

    #[test]
    fn test_latch_fires_once_per_press() {
        let mut latch = KeyLatch::default();
        assert!(latch.update(true));
        assert!(!latch.update(true));
        assert!(!latch.update(true));
        assert!(!latch.update(false));
        assert!(latch.update(true));
    }

    #[test]
    fn test_held_space_toggles_once() {
        let mut handler = InputHandler::default();

        // key repeat delivers extra presses while held
        for _ in 0..30 {
            press(&mut handler, KeyCode::Space);
        }
        let actions: Vec<_> = handler.drain_actions().collect();
        assert_eq!(actions, vec![Action::ToggleRunning]);

        release(&mut handler, KeyCode::Space);
        press(&mut handler, KeyCode::Space);
        let actions: Vec<_> = handler.drain_actions().collect();
        assert_eq!(actions, vec![Action::ToggleRunning]);
    }

    #[test]
    fn test_actions_queue_in_order() {
        let mut handler = InputHandler::default();
        press(&mut handler, KeyCode::KeyN);
        press(&mut handler, KeyCode::Enter);
        press(&mut handler, KeyCode::KeyR);
        press(&mut handler, KeyCode::Escape);

        let actions: Vec<_> = handler.drain_actions().collect();
        assert_eq!(
            actions,
            vec![
                Action::Step,
                Action::Screenshot,
                Action::ResetCamera,
                Action::Quit
            ]
        );
        assert_eq!(handler.drain_actions().count(), 0);
    }

    #[test]
    fn test_interval_keys_are_level_triggered() {
        let mut handler = InputHandler::default();
        assert_eq!(handler.interval_direction(), None);

        press(&mut handler, KeyCode::ArrowUp);
        assert_eq!(handler.interval_direction(), Some(IntervalDirection::Slower));
        assert_eq!(handler.interval_direction(), Some(IntervalDirection::Slower));

        press(&mut handler, KeyCode::ArrowDown);
        assert_eq!(handler.interval_direction(), None);

        release(&mut handler, KeyCode::ArrowUp);
        assert_eq!(handler.interval_direction(), Some(IntervalDirection::Faster));
        assert_eq!(handler.drain_actions().count(), 0);
    }

    #[test]
    fn test_right_click_toggles_capture() {
        let mut handler = InputHandler::default();
        handler.process_mouse_button(MouseButton::Right, ElementState::Pressed);
        handler.process_mouse_button(MouseButton::Right, ElementState::Released);
        handler.process_mouse_button(MouseButton::Right, ElementState::Pressed);

        let actions: Vec<_> = handler.drain_actions().collect();
        assert_eq!(
            actions,
            vec![Action::ToggleCursorCapture, Action::ToggleCursorCapture]
        );
    }

    #[test]
    fn test_focus_loss_releases_held_keys() {
        let mut handler = InputHandler::default();
        press(&mut handler, KeyCode::ArrowUp);
        press(&mut handler, KeyCode::Space);
        handler.drain_actions().for_each(drop);

        handler.handle_window_event(&WindowEvent::Focused(false));
        assert_eq!(handler.interval_direction(), None);

        press(&mut handler, KeyCode::Space);
        assert_eq!(handler.drain_actions().count(), 1);
    }

    #[test]
    fn test_scroll_and_drag_reach_camera() {
        let mut handler = InputHandler::default();
        let mut camera = ViewportCamera::new(800, 800, (100, 100)).with_wrap(false);

        handler
            .camera_controller
            .process_scroll(&MouseScrollDelta::LineDelta(0.0, 2.0));
        handler.update_camera(&mut camera);
        assert!(camera.zoom_factor() < 1.0);

        // motion without a held button is ignored
        let before = camera.position;
        handler.handle_device_event(&DeviceEvent::MouseMotion { delta: (10.0, 0.0) });
        handler.update_camera(&mut camera);
        assert_eq!(camera.position, before);

        handler.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        handler.handle_device_event(&DeviceEvent::MouseMotion { delta: (10.0, 0.0) });
        handler.update_camera(&mut camera);
        assert!(camera.position.x < before.x);
    }
}
