use glam::Vec3;

/// Input event types the simulation understands.
/// Hosts translate their windowing events into these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    /// A key was pressed.
    KeyDown { key_code: u32 },
    /// A key was released.
    KeyUp { key_code: u32 },
    /// A pointer button was pressed.
    PointerDown { button: u32 },
    /// A pointer button was released.
    PointerUp { button: u32 },
    /// New aim direction for the cue, in world space.
    Aim { x: f32, y: f32, z: f32 },
}

/// A queue of input events.
/// The host pushes events between frames; the simulation drains them.
pub struct InputQueue {
    events: Vec<InputEvent>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: InputEvent) {
        self.events.push(event);
    }

    /// Drain all pending events. Returns a Vec and clears the queue.
    pub fn drain(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }

    /// Iterate over pending events without consuming them.
    pub fn iter(&self) -> impl Iterator<Item = &InputEvent> {
        self.events.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }
}

impl Default for InputQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns raw key and pointer events into cue strikes.
///
/// A strike fires once on the press edge of the strike key or the primary
/// button. Holding the key does not re-fire; auto-repeat `KeyDown`s are
/// swallowed until the matching release.
#[derive(Debug, Clone)]
pub struct StrikeLatch {
    aim: Vec3,
    key_held: bool,
    button_held: bool,
}

impl StrikeLatch {
    pub const KEY_SPACE: u32 = 32;
    pub const BUTTON_PRIMARY: u32 = 0;

    pub fn new() -> Self {
        Self {
            aim: Vec3::X,
            key_held: false,
            button_held: false,
        }
    }

    pub fn aim(&self) -> Vec3 {
        self.aim
    }

    /// Feed one event. Returns the strike direction when a strike fires.
    pub fn feed(&mut self, event: InputEvent) -> Option<Vec3> {
        match event {
            InputEvent::Aim { x, y, z } => {
                let aim = Vec3::new(x, y, z).normalize_or_zero();
                if aim == Vec3::ZERO {
                    log::warn!("Ignoring zero-length aim");
                } else {
                    self.aim = aim;
                }
                None
            }
            InputEvent::KeyDown { key_code } if key_code == Self::KEY_SPACE => {
                let fired = !self.key_held;
                self.key_held = true;
                fired.then_some(self.aim)
            }
            InputEvent::KeyUp { key_code } if key_code == Self::KEY_SPACE => {
                self.key_held = false;
                None
            }
            InputEvent::PointerDown { button } if button == Self::BUTTON_PRIMARY => {
                let fired = !self.button_held;
                self.button_held = true;
                fired.then_some(self.aim)
            }
            InputEvent::PointerUp { button } if button == Self::BUTTON_PRIMARY => {
                self.button_held = false;
                None
            }
            _ => None,
        }
    }

    pub fn release_all(&mut self) {
        self.key_held = false;
        self.button_held = false;
    }
}

impl Default for StrikeLatch {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_and_drain() {
        let mut q = InputQueue::new();
        q.push(InputEvent::PointerDown { button: 0 });
        q.push(InputEvent::KeyDown { key_code: 32 });
        assert_eq!(q.len(), 2);
        let events = q.drain();
        assert_eq!(events.len(), 2);
        assert!(q.is_empty());
    }

    #[test]
    fn strike_fires_once_per_press() {
        let mut latch = StrikeLatch::new();
        let space = InputEvent::KeyDown { key_code: StrikeLatch::KEY_SPACE };
        assert_eq!(latch.feed(space), Some(Vec3::X));
        // Auto-repeat
        assert_eq!(latch.feed(space), None);
        latch.feed(InputEvent::KeyUp { key_code: StrikeLatch::KEY_SPACE });
        assert_eq!(latch.feed(space), Some(Vec3::X));
    }

    #[test]
    fn aim_is_normalized_and_zero_aim_ignored() {
        let mut latch = StrikeLatch::new();
        latch.feed(InputEvent::Aim { x: 0.0, y: 0.0, z: -4.0 });
        assert_eq!(latch.aim(), Vec3::NEG_Z);
        latch.feed(InputEvent::Aim { x: 0.0, y: 0.0, z: 0.0 });
        assert_eq!(latch.aim(), Vec3::NEG_Z);
        assert_eq!(
            latch.feed(InputEvent::PointerDown { button: StrikeLatch::BUTTON_PRIMARY }),
            Some(Vec3::NEG_Z)
        );
    }

    #[test]
    fn other_keys_and_buttons_do_nothing() {
        let mut latch = StrikeLatch::new();
        assert_eq!(latch.feed(InputEvent::KeyDown { key_code: 13 }), None);
        assert_eq!(latch.feed(InputEvent::PointerDown { button: 2 }), None);
    }

    #[test]
    fn key_and_button_latch_independently() {
        let mut latch = StrikeLatch::new();
        assert!(latch.feed(InputEvent::KeyDown { key_code: 32 }).is_some());
        assert!(latch.feed(InputEvent::PointerDown { button: 0 }).is_some());
        latch.release_all();
        assert!(latch.feed(InputEvent::KeyDown { key_code: 32 }).is_some());
    }
}
