//! Controller word encoding for the two joystick ports.
//!
//! A controller is read through a two-segment strobe protocol: a flip-flop
//! (set via the 0x80/0xC0 port bands) picks which half of a 16-bit word the
//! next read of the 0xE0 band returns. The low byte carries the keypad code
//! and right fire, the high byte the joystick directions, spinner and left
//! fire. The hardware lines are active-low, so the bus complements the
//! selected byte before handing it to the CPU.

/// Baseline word the input callback must start from: bit 7 of each segment
/// reads as 1 before complementation.
pub const BASELINE: u16 = 0x8080;

// High-segment bits (joystick half, returned when cseg = 1).
pub const INPUT_UP: u16 = 0x0100;
pub const INPUT_DOWN: u16 = 0x0400;
pub const INPUT_LEFT: u16 = 0x0200;
pub const INPUT_RIGHT: u16 = 0x0800;
pub const INPUT_SPIN_PLUS: u16 = 0x3000;
pub const INPUT_SPIN_MINUS: u16 = 0x1000;
pub const INPUT_FIRE_LEFT: u16 = 0x4000;

// Low-segment bits (keypad half, returned when cseg = 0).
pub const INPUT_FIRE_RIGHT: u16 = 0x0040;

/// Keypad keys, including the two extra buttons on the Super Action
/// Controller which report as keypad codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keypad {
    Key1,
    Key2,
    Key3,
    Key4,
    Key5,
    Key6,
    Key7,
    Key8,
    Key9,
    Key0,
    Star,
    Pound,
    Purple,
    Blue,
}

impl Keypad {
    /// 4-bit matrix code as seen on the port lines. The codes are not
    /// sequential; they fall out of the keypad's diode matrix.
    pub fn code(self) -> u8 {
        match self {
            Keypad::Key1 => 0x2,
            Keypad::Key2 => 0x8,
            Keypad::Key3 => 0x3,
            Keypad::Key4 => 0xD,
            Keypad::Key5 => 0xC,
            Keypad::Key6 => 0x1,
            Keypad::Key7 => 0xA,
            Keypad::Key8 => 0xE,
            Keypad::Key9 => 0x4,
            Keypad::Key0 => 0x5,
            Keypad::Star => 0x6,
            Keypad::Pound => 0x9,
            Keypad::Purple => 0x7,
            Keypad::Blue => 0xB,
        }
    }
}

/// A glue type for frontends: button states of one controller, packable
/// into the word the input callback returns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ControllerState {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub fire_left: bool,
    pub fire_right: bool,
    pub spin_plus: bool,
    pub spin_minus: bool,
    pub keypad: Option<Keypad>,
}

impl ControllerState {
    pub fn to_word(self) -> u16 {
        let mut w = BASELINE;
        if self.up {
            w |= INPUT_UP;
        }
        if self.down {
            w |= INPUT_DOWN;
        }
        if self.left {
            w |= INPUT_LEFT;
        }
        if self.right {
            w |= INPUT_RIGHT;
        }
        if self.fire_left {
            w |= INPUT_FIRE_LEFT;
        }
        if self.fire_right {
            w |= INPUT_FIRE_RIGHT;
        }
        if self.spin_plus {
            w |= INPUT_SPIN_PLUS;
        }
        if self.spin_minus {
            w |= INPUT_SPIN_MINUS;
        }
        if let Some(key) = self.keypad {
            w |= key.code() as u16;
        }
        w
    }
}

/// Polls the frontend for one controller's word. The argument is the port
/// index (0 or 1). Invoked from inside an I/O read; it must not touch the
/// emulator (the `&mut` borrow already enforces that) and its value is
/// latched before use.
pub type InputCallback = Box<dyn FnMut(usize) -> u16>;
