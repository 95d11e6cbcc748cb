// Input
pub const KEYPAD_SIZE: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeypadState {
    pub state: [bool; KEYPAD_SIZE],
}

impl KeypadState {
    pub fn new() -> Self {
        Self {
            state: [false; KEYPAD_SIZE],
        }
    }

    /// Keys are addressed by the low nibble only.
    pub fn is_pressed(&self, key: u8) -> bool {
        self.state[(key & 0xF) as usize]
    }

    pub fn set(&mut self, key: u8, pressed: bool) {
        self.state[(key & 0xF) as usize] = pressed;
    }

    /// Lowest numbered key currently held down.
    pub fn first_pressed(&self) -> Option<u8> {
        self.state.iter().position(|pressed| *pressed).map(|i| i as u8)
    }
}

impl From<[bool; KEYPAD_SIZE]> for KeypadState {
    fn from(state: [bool; KEYPAD_SIZE]) -> Self {
        Self { state }
    }
}

#[cfg(test)]
mod tests {
    use super::KeypadState;

    #[test]
    fn first_pressed_test() {
        let mut keypad = KeypadState::new();
        assert_eq!(keypad.first_pressed(), None);

        keypad.set(0xC, true);
        keypad.set(0x5, true);
        assert_eq!(keypad.first_pressed(), Some(0x5));
        assert!(keypad.is_pressed(0xC));
        assert!(keypad.is_pressed(0x1C));
        assert!(!keypad.is_pressed(0x0));
    }
}
