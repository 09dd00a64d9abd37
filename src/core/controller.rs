/// Input button identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    MouseLeft,
    MouseRight,
    MouseMiddle,
    Shift,
    Control,
    Escape,
}

/// Controller - button state plus the pointer motion accumulated this frame
pub trait Controller {
    /// Check if button is currently down
    fn is_down(&self, button: Button) -> bool;

    /// Get all currently pressed buttons
    fn get_down_keys(&self) -> &[Button];

    /// Pointer movement in logical pixels since the last reset
    fn pointer_delta(&self) -> (f32, f32);

    /// Wheel movement in lines since the last reset; positive scrolls away from the user
    fn wheel_delta(&self) -> f32;
}
