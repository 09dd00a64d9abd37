use std::collections::HashSet;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

use super::controller::{Button, Controller};

/// Pixel-delta wheel events are converted to lines at this rate
const PIXELS_PER_LINE: f32 = 40.0;

/// Adapter that bridges Winit events to the Controller trait
#[derive(Debug, Clone)]
pub struct WinitController {
    /// Currently pressed buttons
    pressed_keys: HashSet<Button>,
    /// All pressed buttons as a vec (for efficient get_down_keys)
    pressed_vec: Vec<Button>,
    /// Current pointer position in logical pixels
    mouse_position: Option<(f32, f32)>,
    /// Pointer movement since last reset
    mouse_delta: (f32, f32),
    /// Wheel lines since last reset
    wheel_delta: f32,
    scale_factor: f32,
}

impl WinitController {
    pub fn new() -> Self {
        Self {
            pressed_keys: HashSet::new(),
            pressed_vec: Vec::new(),
            mouse_position: None,
            mouse_delta: (0.0, 0.0),
            wheel_delta: 0.0,
            scale_factor: 1.0,
        }
    }

    /// Physical cursor positions are divided by this before accumulating
    pub fn set_scale_factor(&mut self, scale_factor: f64) {
        if scale_factor > 0.0 {
            self.scale_factor = scale_factor as f32;
        }
    }

    /// Process a Winit WindowEvent and update internal state
    pub fn process_event(&mut self, event: &WindowEvent) {
        self.handle_event(event, false);
    }

    /// Process an event the overlay has already used. Presses and wheel
    /// turns are dropped, but releases still land so no button stays held
    /// after being let go over the overlay.
    pub fn process_captured_event(&mut self, event: &WindowEvent) {
        self.handle_event(event, true);
    }

    fn handle_event(&mut self, event: &WindowEvent, captured: bool) {
        match event {
            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(keycode) = event.physical_key {
                    if let Some(button) = Self::keycode_to_button(keycode) {
                        self.button_input(button, event.state, captured);
                    }
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                if let Some(btn) = Self::mouse_button_to_button(*button) {
                    self.button_input(btn, *state, captured);
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.cursor_input(
                    position.x as f32 / self.scale_factor,
                    position.y as f32 / self.scale_factor,
                    captured,
                );
            }
            WindowEvent::CursorLeft { .. } => {
                self.mouse_position = None;
            }
            WindowEvent::MouseWheel { delta, .. } if !captured => {
                self.wheel_delta += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_LINE,
                };
            }
            WindowEvent::Focused(false) => {
                self.pressed_keys.clear();
                self.pressed_vec.clear();
            }
            _ => {}
        }
    }

    fn button_input(&mut self, button: Button, state: ElementState, captured: bool) {
        if captured && state == ElementState::Pressed {
            return;
        }
        self.set_button(button, state);
    }

    fn set_button(&mut self, button: Button, state: ElementState) {
        match state {
            ElementState::Pressed => {
                if self.pressed_keys.insert(button) {
                    self.pressed_vec.push(button);
                }
            }
            ElementState::Released => {
                if self.pressed_keys.remove(&button) {
                    self.pressed_vec.retain(|&b| b != button);
                }
            }
        }
    }

    fn cursor_input(&mut self, x: f32, y: f32, captured: bool) {
        if captured {
            // track the position so leaving the overlay does not jump
            self.mouse_position = Some((x, y));
        } else {
            self.move_cursor(x, y);
        }
    }

    fn move_cursor(&mut self, x: f32, y: f32) {
        if let Some(old_pos) = self.mouse_position {
            self.mouse_delta.0 += x - old_pos.0;
            self.mouse_delta.1 += y - old_pos.1;
        }
        self.mouse_position = Some((x, y));
    }

    /// Reset per-frame state (pointer and wheel deltas)
    /// Call this once the controls have consumed the frame's input
    pub fn reset_deltas(&mut self) {
        self.mouse_delta = (0.0, 0.0);
        self.wheel_delta = 0.0;
    }

    pub fn mouse_position(&self) -> Option<(f32, f32)> {
        self.mouse_position
    }

    fn keycode_to_button(keycode: KeyCode) -> Option<Button> {
        match keycode {
            KeyCode::ShiftLeft | KeyCode::ShiftRight => Some(Button::Shift),
            KeyCode::ControlLeft | KeyCode::ControlRight => Some(Button::Control),
            KeyCode::Escape => Some(Button::Escape),
            _ => None,
        }
    }

    fn mouse_button_to_button(button: MouseButton) -> Option<Button> {
        match button {
            MouseButton::Left => Some(Button::MouseLeft),
            MouseButton::Right => Some(Button::MouseRight),
            MouseButton::Middle => Some(Button::MouseMiddle),
            _ => None,
        }
    }
}

impl Default for WinitController {
    fn default() -> Self {
        Self::new()
    }
}

impl Controller for WinitController {
    fn is_down(&self, button: Button) -> bool {
        self.pressed_keys.contains(&button)
    }

    fn get_down_keys(&self) -> &[Button] {
        &self.pressed_vec
    }

    fn pointer_delta(&self) -> (f32, f32) {
        self.mouse_delta
    }

    fn wheel_delta(&self) -> f32 {
        self.wheel_delta
    }
}
