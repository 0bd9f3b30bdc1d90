//! Explicit input state
//!
//! Window events update [`InputState`] one at a time; the frame loop reads
//! the held movement keys once per tick.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

/// Two presses closer than this in time count as a double-click
pub const DOUBLE_CLICK_INTERVAL: Duration = Duration::from_millis(350);
/// ...and closer than this in pixels, per axis
pub const DOUBLE_CLICK_DISTANCE: f32 = 6.0;

/// Keys that move the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MovementKey {
    Forward,
    Backward,
    Left,
    Right,
    Up,
    Down,
    StrafeRight,
    StrafeLeft,
}

impl MovementKey {
    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        match code {
            KeyCode::KeyW => Some(Self::Forward),
            KeyCode::KeyS => Some(Self::Backward),
            KeyCode::KeyA => Some(Self::Left),
            KeyCode::KeyD => Some(Self::Right),
            KeyCode::Space => Some(Self::Up),
            KeyCode::KeyC => Some(Self::Down),
            KeyCode::KeyQ => Some(Self::StrafeRight),
            KeyCode::KeyE => Some(Self::StrafeLeft),
            _ => None,
        }
    }

    /// Strafe keys move at a fraction of the speed and skip the target re-pin
    pub fn is_primary(&self) -> bool {
        !matches!(self, Self::StrafeRight | Self::StrafeLeft)
    }
}

/// Detects double presses of the primary button
#[derive(Debug, Clone, Default)]
pub struct ClickTracker {
    last_press: Option<((f32, f32), Instant)>,
}

impl ClickTracker {
    /// Records a press; returns `true` when it completes a double-click
    ///
    /// A completed double-click is consumed, so a third quick press starts
    /// a new sequence.
    pub fn register_press(&mut self, position: (f32, f32), now: Instant) -> bool {
        let is_double = self.last_press.is_some_and(|(last, at)| {
            now.saturating_duration_since(at) <= DOUBLE_CLICK_INTERVAL
                && (last.0 - position.0).abs() <= DOUBLE_CLICK_DISTANCE
                && (last.1 - position.1).abs() <= DOUBLE_CLICK_DISTANCE
        });

        self.last_press = if is_double { None } else { Some((position, now)) };
        is_double
    }

    pub fn reset(&mut self) {
        self.last_press = None;
    }
}

/// What a primary button press turned out to be
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Single,
    Double,
}

/// Pointer, button and movement-key state
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pressed: HashSet<MovementKey>,
    pointer: Option<(f32, f32)>,
    primary_down: bool,
    clicks: ClickTracker,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates the held keys; returns `true` when the event was a movement key
    pub fn handle_key_event(&mut self, event: &KeyEvent) -> bool {
        let PhysicalKey::Code(code) = event.physical_key else {
            return false;
        };
        match MovementKey::from_key_code(code) {
            Some(key) => {
                self.set_key(key, event.state == ElementState::Pressed);
                true
            }
            None => false,
        }
    }

    pub fn set_key(&mut self, key: MovementKey, pressed: bool) {
        if pressed {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    pub fn is_pressed(&self, key: MovementKey) -> bool {
        self.pressed.contains(&key)
    }

    pub fn pressed_keys(&self) -> impl Iterator<Item = MovementKey> + '_ {
        self.pressed.iter().copied()
    }

    pub fn any_movement(&self) -> bool {
        !self.pressed.is_empty()
    }

    /// Drops every held key, e.g. when the window loses focus
    pub fn release_all_keys(&mut self) {
        self.pressed.clear();
    }

    pub fn set_pointer(&mut self, position: (f32, f32)) {
        self.pointer = Some(position);
    }

    pub fn pointer(&self) -> Option<(f32, f32)> {
        self.pointer
    }

    pub fn press_primary(&mut self, now: Instant) -> PressKind {
        self.primary_down = true;
        let position = self.pointer.unwrap_or((0.0, 0.0));
        if self.clicks.register_press(position, now) {
            PressKind::Double
        } else {
            PressKind::Single
        }
    }

    pub fn release_primary(&mut self) {
        self.primary_down = false;
    }

    pub fn primary_down(&self) -> bool {
        self.primary_down
    }

    pub fn pointer_left(&mut self) {
        self.pointer = None;
        self.primary_down = false;
        self.clicks.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_mapping_covers_bindings() {
        assert_eq!(MovementKey::from_key_code(KeyCode::KeyW), Some(MovementKey::Forward));
        assert_eq!(MovementKey::from_key_code(KeyCode::Space), Some(MovementKey::Up));
        assert_eq!(MovementKey::from_key_code(KeyCode::KeyQ), Some(MovementKey::StrafeRight));
        assert_eq!(MovementKey::from_key_code(KeyCode::KeyX), None);
        assert!(!MovementKey::StrafeLeft.is_primary());
        assert!(MovementKey::Down.is_primary());
    }

    #[test]
    fn held_keys_track_press_and_release() {
        let mut input = InputState::new();
        input.set_key(MovementKey::Forward, true);
        input.set_key(MovementKey::Left, true);
        input.set_key(MovementKey::Forward, false);
        assert!(!input.is_pressed(MovementKey::Forward));
        assert!(input.is_pressed(MovementKey::Left));

        input.release_all_keys();
        assert!(!input.any_movement());
    }

    #[test]
    fn double_click_within_thresholds() {
        let mut clicks = ClickTracker::default();
        let t0 = Instant::now();
        assert!(!clicks.register_press((100.0, 100.0), t0));
        assert!(clicks.register_press((104.0, 97.0), t0 + Duration::from_millis(200)));
        // consumed: next quick press starts over
        assert!(!clicks.register_press((104.0, 97.0), t0 + Duration::from_millis(300)));
    }

    #[test]
    fn slow_or_distant_presses_are_single() {
        let mut clicks = ClickTracker::default();
        let t0 = Instant::now();
        clicks.register_press((10.0, 10.0), t0);
        assert!(!clicks.register_press((10.0, 10.0), t0 + Duration::from_millis(400)));
        assert!(!clicks.register_press((20.0, 10.0), t0 + Duration::from_millis(450)));
    }

    #[test]
    fn press_primary_uses_pointer_position() {
        let mut input = InputState::new();
        let t0 = Instant::now();
        input.set_pointer((50.0, 60.0));
        assert_eq!(input.press_primary(t0), PressKind::Single);
        assert!(input.primary_down());
        input.release_primary();
        assert_eq!(input.press_primary(t0 + Duration::from_millis(100)), PressKind::Double);

        input.pointer_left();
        assert!(!input.primary_down());
        assert_eq!(input.pointer(), None);
    }
}
