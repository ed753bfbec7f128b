//! Input Mapper
//!
//! Translates host keyboard and joypad state into the MSX keyboard matrix and
//! the joystick lines the engine reads through its PSG port.
//!
//! ## Keyboard matrix
//!
//! The MSX keyboard is scanned one row at a time through the PPI: the row is
//! selected with the low nibble of port C and port B returns eight column bits.
//! Column bits are active-low, so a pressed key reads as 0.
//!
//! ```text
//! Row\Bit |   0      1      2      3      4      5      6      7
//! --------|--------------------------------------------------------
//!    6    | SHIFT  CTRL  GRAPH  CAPS   CODE    F1     F2     F3
//!    7    |  F4     F5    ESC    TAB   STOP    BS   SELECT  RET
//!    8    | SPACE  HOME   INS    DEL   LEFT    UP    DOWN  RIGHT
//!    9    | KP*    KP+    KP/    KP0    KP1    KP2    KP3    KP4
//!   10    | KP5    KP6    KP7    KP8    KP9    KP-    KP,    KP.
//! ```
//!
//! The state is rebuilt from scratch on every call, so a key released on the
//! host can never stay latched in the matrix.

use bitflags::bitflags;

use crate::ffi::*;
use crate::host::{InputQuery, InputSource};

/// Rows addressable through the PPI row select.
pub const KEY_ROWS: usize = 16;

/// Joypad ports the host exposes.
pub const JOYPAD_PORTS: u32 = 2;

/// MSX keys reachable from the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MsxKey {
    Left,
    Up,
    Right,
    Down,
    Shift,
    Control,
    Graph,
    Backspace,
    Tab,
    CapsLock,
    Select,
    Home,
    Enter,
    Delete,
    Insert,
    /// CODE / kana key
    Country,
    Stop,
    F1,
    F2,
    F3,
    F4,
    F5,
    Escape,
    Space,
    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
}

impl MsxKey {
    /// Matrix row and column mask for this key.
    pub const fn position(self) -> (usize, u8) {
        match self {
            MsxKey::Shift => (6, 0x01),
            MsxKey::Control => (6, 0x02),
            MsxKey::Graph => (6, 0x04),
            MsxKey::CapsLock => (6, 0x08),
            MsxKey::Country => (6, 0x10),
            MsxKey::F1 => (6, 0x20),
            MsxKey::F2 => (6, 0x40),
            MsxKey::F3 => (6, 0x80),
            MsxKey::F4 => (7, 0x01),
            MsxKey::F5 => (7, 0x02),
            MsxKey::Escape => (7, 0x04),
            MsxKey::Tab => (7, 0x08),
            MsxKey::Stop => (7, 0x10),
            MsxKey::Backspace => (7, 0x20),
            MsxKey::Select => (7, 0x40),
            MsxKey::Enter => (7, 0x80),
            MsxKey::Space => (8, 0x01),
            MsxKey::Home => (8, 0x02),
            MsxKey::Insert => (8, 0x04),
            MsxKey::Delete => (8, 0x08),
            MsxKey::Left => (8, 0x10),
            MsxKey::Up => (8, 0x20),
            MsxKey::Down => (8, 0x40),
            MsxKey::Right => (8, 0x80),
            MsxKey::Numpad0 => (9, 0x08),
            MsxKey::Numpad1 => (9, 0x10),
            MsxKey::Numpad2 => (9, 0x20),
            MsxKey::Numpad3 => (9, 0x40),
            MsxKey::Numpad4 => (9, 0x80),
            MsxKey::Numpad5 => (10, 0x01),
            MsxKey::Numpad6 => (10, 0x02),
            MsxKey::Numpad7 => (10, 0x04),
            MsxKey::Numpad8 => (10, 0x08),
            MsxKey::Numpad9 => (10, 0x10),
        }
    }
}

/// Host key → MSX key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyBinding {
    /// libretro `RETROK_*` code
    pub host: u32,
    pub key: MsxKey,
}

const fn bind(host: u32, key: MsxKey) -> KeyBinding {
    KeyBinding { host, key }
}

/// Default keyboard table. Several host keys may share one MSX key
/// (both shifts, both controls); every entry is checked every frame.
pub const KEYMAP: &[KeyBinding] = &[
    bind(RETROK_LEFT, MsxKey::Left),
    bind(RETROK_UP, MsxKey::Up),
    bind(RETROK_RIGHT, MsxKey::Right),
    bind(RETROK_DOWN, MsxKey::Down),
    bind(RETROK_LSHIFT, MsxKey::Shift),
    bind(RETROK_RSHIFT, MsxKey::Shift),
    bind(RETROK_LCTRL, MsxKey::Control),
    bind(RETROK_RCTRL, MsxKey::Control),
    bind(RETROK_LALT, MsxKey::Graph),
    bind(RETROK_BACKSPACE, MsxKey::Backspace),
    bind(RETROK_TAB, MsxKey::Tab),
    bind(RETROK_CAPSLOCK, MsxKey::CapsLock),
    bind(RETROK_END, MsxKey::Select),
    bind(RETROK_HOME, MsxKey::Home),
    bind(RETROK_RETURN, MsxKey::Enter),
    bind(RETROK_DELETE, MsxKey::Delete),
    bind(RETROK_INSERT, MsxKey::Insert),
    bind(RETROK_PAGEUP, MsxKey::Country),
    bind(RETROK_PAUSE, MsxKey::Stop),
    bind(RETROK_F1, MsxKey::F1),
    bind(RETROK_F2, MsxKey::F2),
    bind(RETROK_F3, MsxKey::F3),
    bind(RETROK_F4, MsxKey::F4),
    bind(RETROK_F5, MsxKey::F5),
    bind(RETROK_KP0, MsxKey::Numpad0),
    bind(RETROK_KP1, MsxKey::Numpad1),
    bind(RETROK_KP2, MsxKey::Numpad2),
    bind(RETROK_KP3, MsxKey::Numpad3),
    bind(RETROK_ESCAPE, MsxKey::Escape),
    bind(RETROK_KP4, MsxKey::Numpad4),
    bind(RETROK_KP5, MsxKey::Numpad5),
    bind(RETROK_KP6, MsxKey::Numpad6),
    bind(RETROK_KP7, MsxKey::Numpad7),
    bind(RETROK_SPACE, MsxKey::Space),
    bind(RETROK_KP8, MsxKey::Numpad8),
    bind(RETROK_KP9, MsxKey::Numpad9),
];

/// Joypad buttons on port 0 that double as keyboard shortcuts.
pub const PAD_SHORTCUTS: &[(u32, MsxKey)] = &[
    (RETRO_DEVICE_ID_JOYPAD_X, MsxKey::F1),
    (RETRO_DEVICE_ID_JOYPAD_Y, MsxKey::F2),
    (RETRO_DEVICE_ID_JOYPAD_L, MsxKey::F3),
    (RETRO_DEVICE_ID_JOYPAD_R, MsxKey::F4),
    (RETRO_DEVICE_ID_JOYPAD_L2, MsxKey::F5),
    (RETRO_DEVICE_ID_JOYPAD_L3, MsxKey::Space),
];

bitflags! {
    /// Joystick lines as the engine reads them:
    /// `0.0.B2.A2.R2.L2.D2.U2.0.0.B1.A1.R1.L1.D1.U1`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Joystick: u32 {
        const UP = 0x0001;
        const DOWN = 0x0002;
        const LEFT = 0x0004;
        const RIGHT = 0x0008;
        const FIRE_A = 0x0010;
        const FIRE_B = 0x0020;
        const UP_2 = 0x0100;
        const DOWN_2 = 0x0200;
        const LEFT_2 = 0x0400;
        const RIGHT_2 = 0x0800;
        const FIRE_A_2 = 0x1000;
        const FIRE_B_2 = 0x2000;
    }
}

/// Joypad buttons that drive joystick lines, expressed for the first stick.
const PAD_LINES: [(u32, Joystick); 6] = [
    (RETRO_DEVICE_ID_JOYPAD_UP, Joystick::UP),
    (RETRO_DEVICE_ID_JOYPAD_DOWN, Joystick::DOWN),
    (RETRO_DEVICE_ID_JOYPAD_LEFT, Joystick::LEFT),
    (RETRO_DEVICE_ID_JOYPAD_RIGHT, Joystick::RIGHT),
    (RETRO_DEVICE_ID_JOYPAD_A, Joystick::FIRE_A),
    (RETRO_DEVICE_ID_JOYPAD_B, Joystick::FIRE_B),
];

impl Joystick {
    /// Move first-stick lines onto the stick wired to `port`.
    pub fn on_port(self, port: u32) -> Joystick {
        Joystick::from_bits_truncate(self.bits() << (8 * port))
    }
}

/// MSX keyboard matrix, active-low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMatrix {
    rows: [u8; KEY_ROWS],
}

impl Default for KeyMatrix {
    fn default() -> Self {
        Self::released()
    }
}

impl KeyMatrix {
    /// Matrix with every key up.
    pub const fn released() -> Self {
        Self {
            rows: [0xFF; KEY_ROWS],
        }
    }

    pub fn press(&mut self, key: MsxKey) {
        let (row, mask) = key.position();
        self.rows[row] &= !mask;
    }

    pub fn is_pressed(&self, key: MsxKey) -> bool {
        let (row, mask) = key.position();
        self.rows[row] & mask == 0
    }

    /// Raw column bits for `row`, as port B returns them.
    pub fn row(&self, row: usize) -> u8 {
        self.rows.get(row).copied().unwrap_or(0xFF)
    }

    pub fn any_pressed(&self) -> bool {
        self.rows.iter().any(|&r| r != 0xFF)
    }
}

/// Keyboard and joystick state for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InputState {
    pub keys: KeyMatrix,
    pub joystick: Joystick,
}

/// Stateless translation from host input to [`InputState`].
#[derive(Debug, Clone, Copy)]
pub struct InputMapper {
    keymap: &'static [KeyBinding],
    ports: u32,
}

impl Default for InputMapper {
    fn default() -> Self {
        Self::new(KEYMAP)
    }
}

impl InputMapper {
    pub fn new(keymap: &'static [KeyBinding]) -> Self {
        Self {
            keymap,
            ports: JOYPAD_PORTS,
        }
    }

    /// Build this frame's state from the host's current input.
    pub fn map<I: InputQuery + ?Sized>(&self, input: &I) -> InputState {
        let mut state = InputState::default();

        for binding in self.keymap {
            if input.is_pressed(InputSource::Key(binding.host)) {
                state.keys.press(binding.key);
            }
        }

        for port in 0..self.ports {
            for &(button, line) in &PAD_LINES {
                if input.is_pressed(InputSource::Joypad { port, button }) {
                    state.joystick |= line.on_port(port);
                }
            }
        }

        for &(button, key) in PAD_SHORTCUTS {
            if input.is_pressed(InputSource::Joypad { port: 0, button }) {
                state.keys.press(key);
            }
        }

        state
    }
}
