pub mod layout;
pub mod special;

use crate::consts::MAX_MODIFIERS;
use crate::error::{CodecError, Result};
use crate::parse;

use std::{fmt::Display, str::FromStr};

use enumset::{EnumSet, EnumSetType};
use itertools::Itertools as _;
use num::FromPrimitive;
use num_derive::{FromPrimitive, ToPrimitive};
use serde_with::DeserializeFromStr;
use strum_macros::{EnumIter, EnumMessage, EnumString, IntoStaticStr};

pub use special::{SpecialCategory, SpecialFunction, SpecialKey};

/// Slot value of the Fn key in the remap table
pub const FN_TOGGLE: [u8; 4] = [0x0a, 0x01, 0x00, 0x00];

/// Usage code of the first modifier
const MODIFIER_BASE: u8 = 0xe0;

/// Modifiers that can be combined with a remapped key. The right meta key
/// does not exist on this keyboard and is not accepted as a modifier.
#[derive(Debug, ToPrimitive, FromPrimitive, EnumSetType, EnumString, EnumIter, EnumMessage)]
#[strum(ascii_case_insensitive)]
pub enum Modifier {
    #[strum(serialize = "LEFTCTRL", serialize = "CTRL")]
    LeftCtrl,
    #[strum(serialize = "LEFTSHIFT", serialize = "SHIFT")]
    LeftShift,
    #[strum(serialize = "LEFTALT", serialize = "ALT")]
    LeftAlt,
    #[strum(serialize = "LEFTMETA", serialize = "META", serialize = "WIN")]
    LeftMeta,
    #[strum(serialize = "RIGHTCTRL")]
    RightCtrl,
    #[strum(serialize = "RIGHTSHIFT")]
    RightShift,
    #[strum(serialize = "RIGHTALT")]
    RightAlt,
}

pub type ModifierSet = EnumSet<Modifier>;

impl Modifier {
    /// HID usage code (0xe0..0xe6)
    pub fn code(self) -> u8 {
        MODIFIER_BASE + self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        <Self as FromPrimitive>::from_u8(code.wrapping_sub(MODIFIER_BASE))
    }

    /// Accepts `KEY_LEFTCTRL`, `leftctrl` or `ctrl`.
    pub fn from_key_name(name: &str) -> Option<Self> {
        Self::from_str(strip_key_prefix(name)).ok()
    }
}

impl Display for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Modifier::LeftCtrl => "LEFTCTRL",
            Modifier::LeftShift => "LEFTSHIFT",
            Modifier::LeftAlt => "LEFTALT",
            Modifier::LeftMeta => "LEFTMETA",
            Modifier::RightCtrl => "RIGHTCTRL",
            Modifier::RightShift => "RIGHTSHIFT",
            Modifier::RightAlt => "RIGHTALT",
        };
        write!(f, "KEY_{name}")
    }
}

/// HID keyboard usage codes known to the keyboard's firmware.
#[derive(
    Debug,
    FromPrimitive,
    ToPrimitive,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[repr(u8)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "UPPERCASE")]
pub enum ScanCode {
    A = 0x04,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    I,
    J,
    K,
    L,
    M,
    N,
    O,
    P,
    Q,
    R,
    S,
    T,
    U,
    V,
    W,
    X,
    Y,
    Z,
    #[strum(serialize = "1")]
    N1,
    #[strum(serialize = "2")]
    N2,
    #[strum(serialize = "3")]
    N3,
    #[strum(serialize = "4")]
    N4,
    #[strum(serialize = "5")]
    N5,
    #[strum(serialize = "6")]
    N6,
    #[strum(serialize = "7")]
    N7,
    #[strum(serialize = "8")]
    N8,
    #[strum(serialize = "9")]
    N9,
    #[strum(serialize = "0")]
    N0,
    Enter,
    #[strum(to_string = "ESC", serialize = "ESCAPE")]
    Esc,
    Backspace,
    Tab,
    Space,
    Minus,
    Equal,
    LeftBrace,
    RightBrace,
    Backslash,
    HashTilde,
    Semicolon,
    Apostrophe,
    Grave,
    Comma,
    Dot,
    Slash,
    CapsLock,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
    PrintScreen,
    ScrollLock,
    Pause,
    Insert,
    Home,
    PageUp,
    Delete,
    End,
    PageDown,
    Right,
    Left,
    Down,
    Up,
    #[strum(serialize = "102ND")]
    Key102nd = 0x64,
    Mute = 0x7f,
    VolumeUp,
    VolumeDown,
    LeftCtrl = 0xe0,
    LeftShift,
    LeftAlt,
    LeftMeta,
    RightCtrl,
    RightShift,
    RightAlt,
    RightMeta,
    PlayPause,
    StopCd,
    PreviousSong,
    NextSong,
    EjectCd,
    Www = 0xf0,
    Back,
    Forward,
    Sleep = 0xf8,
    Coffee,
    Refresh,
    Calc,
    Mail = 0xfd,
    Search,
}

impl ScanCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        <Self as FromPrimitive>::from_u8(code)
    }

    /// Accepts the name with or without the `KEY_` prefix, in any case.
    pub fn from_key_name(name: &str) -> Option<Self> {
        Self::from_str(strip_key_prefix(name)).ok()
    }
}

impl Display for ScanCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name: &'static str = self.into();
        write!(f, "KEY_{name}")
    }
}

pub(crate) fn strip_key_prefix(name: &str) -> &str {
    match name.get(..4) {
        Some(prefix) if prefix.eq_ignore_ascii_case("KEY_") => &name[4..],
        _ => name,
    }
}

/// A color of the backlight.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn bytes(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }

    pub fn from_bytes(bytes: [u8; 3]) -> Self {
        let [r, g, b] = bytes;
        Self { r, g, b }
    }

    pub fn is_black(self) -> bool {
        self == Self::BLACK
    }
}

impl FromStr for Rgb {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        parse::from_str(parse::rgb, s)
    }
}

impl Display for Rgb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// What a key does once remapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr)]
pub enum KeyAction {
    Disabled,
    /// A usage code, optionally combined with up to two modifiers.
    Scancode { code: u8, modifiers: ModifierSet },
    /// The keyboard's Fn layer key.
    FnToggle,
    Special(SpecialFunction),
    /// A slot value that fits no other variant, passed to the keyboard as is.
    Raw([u8; 4]),
}

impl KeyAction {
    /// A plain key without modifiers.
    pub fn key(code: ScanCode) -> Self {
        Self::Scancode {
            code: code.code(),
            modifiers: ModifierSet::empty(),
        }
    }

    /// `code` pressed together with `modifiers`.
    ///
    /// Fails for a zero code, a repeated modifier or more than two modifiers.
    pub fn chord(code: u8, modifiers: &[Modifier]) -> Result<Self> {
        Self::Scancode {
            code,
            modifiers: ModifierSet::empty(),
        }
        .with_modifiers(modifiers)
    }

    /// Adds `modifiers` to this action. Only a scancode can carry modifiers.
    pub fn with_modifiers(self, modifiers: &[Modifier]) -> Result<Self> {
        if modifiers.is_empty() {
            self.validate()?;
            return Ok(self);
        }
        let set: ModifierSet = modifiers.iter().copied().collect();
        if set.len() != modifiers.len() {
            return Err(CodecError::validation(format!(
                "duplicate modifier in {}",
                modifiers.iter().format(":")
            )));
        }
        match self {
            Self::Scancode { code, modifiers: m } => {
                let action = Self::Scancode {
                    code,
                    modifiers: m | set,
                };
                action.validate()?;
                Ok(action)
            }
            Self::FnToggle => Err(CodecError::validation(
                "the Fn key cannot be combined with modifiers",
            )),
            other => Err(CodecError::validation(format!(
                "{other} cannot be combined with modifiers"
            ))),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Self::Raw(slot) = *self {
            let decoded = Self::from_slot(slot);
            if decoded != *self {
                return Err(CodecError::validation(format!(
                    "raw slot {} is {decoded}",
                    hex_slot(slot)
                )));
            }
        }
        if let Self::Scancode { code, modifiers } = self {
            if modifiers.len() > MAX_MODIFIERS {
                return Err(CodecError::validation(format!(
                    "at most {MAX_MODIFIERS} modifiers per key, got {}",
                    modifiers.len()
                )));
            }
            if *code == 0 {
                return Err(CodecError::validation(
                    "scancode 0 is not a key, disable the key instead",
                ));
            }
        }
        Ok(())
    }

    /// The four byte slot stored by the keyboard.
    pub fn to_slot(&self) -> Result<[u8; 4]> {
        self.validate()?;
        Ok(self.slot_bytes())
    }

    fn slot_bytes(&self) -> [u8; 4] {
        match *self {
            Self::Disabled => [0; 4],
            Self::Scancode { code, modifiers } => {
                let mut codes = modifiers.iter().map(Modifier::code);
                match (codes.next(), codes.next()) {
                    (None, _) => [0x00, 0x00, code, 0x00],
                    (Some(m), None) => [0x00, m, code, 0x00],
                    (Some(lo), Some(hi)) => [0x00, lo, hi, code],
                }
            }
            Self::FnToggle => FN_TOGGLE,
            Self::Special(special) => special.code(),
            Self::Raw(bytes) => bytes,
        }
    }

    /// Inverse of [`KeyAction::to_slot`]; slot values that fit no known
    /// pattern come back as [`KeyAction::Raw`].
    pub fn from_slot(slot: [u8; 4]) -> Self {
        let modifier = Modifier::from_code;
        match slot {
            [0, 0, 0, 0] => Self::Disabled,
            FN_TOGGLE => Self::FnToggle,
            [0, 0, code, 0] => Self::Scancode {
                code,
                modifiers: ModifierSet::empty(),
            },
            [0, m, code, 0] if code != 0 => match modifier(m) {
                Some(m) => Self::Scancode {
                    code,
                    modifiers: m.into(),
                },
                None => Self::Raw(slot),
            },
            [0, m2, m1, code] if code != 0 && m1 != m2 => match (modifier(m1), modifier(m2)) {
                (Some(m1), Some(m2)) => Self::Scancode {
                    code,
                    modifiers: m1 | m2,
                },
                _ => Self::Raw(slot),
            },
            [lead, ..] if lead != 0 => match SpecialKey::from_code(slot) {
                Some(key) => Self::Special(key.into()),
                None => Self::Raw(slot),
            },
            _ => Self::Raw(slot),
        }
    }
}

fn hex_slot(slot: [u8; 4]) -> String {
    slot.iter().map(|b| format!("{b:02x}")).join("")
}

impl FromStr for KeyAction {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        parse::from_str(parse::remap_target, s)?.into_action()
    }
}

impl Display for KeyAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyAction::Disabled => write!(f, "disable"),
            KeyAction::Scancode { code, modifiers } => {
                match ScanCode::from_code(*code) {
                    Some(sc) => {
                        for m in modifiers.iter() {
                            write!(f, "{m}:")?;
                        }
                        write!(f, "{sc}")
                    }
                    // unnamed codes are written as the slot they occupy
                    None => write!(f, "{}", hex_slot(self.slot_bytes())),
                }
            }
            KeyAction::FnToggle => write!(f, "KEY_FN"),
            KeyAction::Special(special) => write!(f, "{special}"),
            KeyAction::Raw(bytes) => write!(f, "{}", hex_slot(*bytes)),
        }
    }
}
