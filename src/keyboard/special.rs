use std::fmt::Display;

use itertools::Itertools as _;
use strum::IntoEnumIterator as _;
use strum_macros::{Display, EnumIter, EnumString};

use crate::error::{CodecError, Result};

/// Kind of a special function, only used for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
#[strum(serialize_all = "kebab-case")]
pub enum SpecialCategory {
    Media,
    Display,
    AppLauncher,
    System,
    Zoom,
    Mouse,
}

/// A non keyboard action stored as a four byte code. Only codes of the
/// [`SpecialKey`] table are special functions; the category follows the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecialFunction {
    key: SpecialKey,
}

impl SpecialFunction {
    /// Fails for a code that is not in the special function table.
    pub fn new(code: [u8; 4]) -> Result<Self> {
        SpecialKey::from_code(code)
            .map(Self::from)
            .ok_or_else(|| {
                CodecError::validation(format!(
                    "{} is not a special function code",
                    code.iter().map(|b| format!("{b:02x}")).join("")
                ))
            })
    }

    pub fn key(&self) -> SpecialKey {
        self.key
    }

    pub fn category(&self) -> SpecialCategory {
        self.key.category()
    }

    pub fn code(&self) -> [u8; 4] {
        self.key.code()
    }
}

impl From<SpecialKey> for SpecialFunction {
    fn from(key: SpecialKey) -> Self {
        Self { key }
    }
}

impl Display for SpecialFunction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key)
    }
}

/// Named special functions understood by the firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive)]
pub enum SpecialKey {
    PlayPause,
    Stop,
    PrevTrack,
    NextTrack,
    VolumeDown,
    VolumeUp,
    Mute,
    MicMute,
    AudioSourceNext,
    BrightnessUp,
    BrightnessDown,
    AppMail,
    AppCalendar,
    AppCalculator,
    AppMediaPlayer,
    BrowserBack,
    BrowserForward,
    BrowserRefresh,
    BrowserStop,
    BrowserFavorites,
    BrowserHome,
    Search,
    GameMode,
    MacroRecord,
    LedEffectNext,
    LedBrightnessUp,
    LedBrightnessDown,
    ZoomIn,
    ZoomOut,
    MouseLeft,
    MouseRight,
    MouseCenter,
    MouseScrollUp,
    MouseScrollDown,
}

impl SpecialKey {
    pub fn code(self) -> [u8; 4] {
        use SpecialKey::*;
        match self {
            PlayPause => [0x03, 0x00, 0xcd, 0x00],
            Stop => [0x03, 0x00, 0xb7, 0x00],
            PrevTrack => [0x03, 0x00, 0xb6, 0x00],
            NextTrack => [0x03, 0x00, 0xb5, 0x00],
            VolumeDown => [0x03, 0x00, 0xea, 0x00],
            VolumeUp => [0x03, 0x00, 0xe9, 0x00],
            Mute => [0x03, 0x00, 0xe2, 0x00],
            MicMute => [0x03, 0x00, 0x93, 0x02],
            AudioSourceNext => [0x03, 0x00, 0x94, 0x02],
            BrightnessUp => [0x03, 0x00, 0x6f, 0x00],
            BrightnessDown => [0x03, 0x00, 0x70, 0x00],
            AppMail => [0x03, 0x00, 0x8a, 0x01],
            AppCalendar => [0x03, 0x00, 0x8d, 0x01],
            AppCalculator => [0x03, 0x00, 0x92, 0x01],
            AppMediaPlayer => [0x03, 0x00, 0x83, 0x01],
            BrowserBack => [0x03, 0x00, 0x24, 0x02],
            BrowserForward => [0x03, 0x00, 0x25, 0x02],
            BrowserRefresh => [0x03, 0x00, 0x27, 0x02],
            BrowserStop => [0x03, 0x00, 0x26, 0x02],
            BrowserFavorites => [0x03, 0x00, 0x2a, 0x02],
            BrowserHome => [0x03, 0x00, 0x23, 0x02],
            Search => [0x03, 0x00, 0x21, 0x02],
            GameMode => [0x03, 0x00, 0x85, 0x02],
            MacroRecord => [0x03, 0x00, 0x86, 0x02],
            LedEffectNext => [0x03, 0x00, 0x87, 0x02],
            LedBrightnessUp => [0x03, 0x00, 0x88, 0x02],
            LedBrightnessDown => [0x03, 0x00, 0x89, 0x02],
            // consumer page AC Zoom In / AC Zoom Out
            ZoomIn => [0x03, 0x00, 0x2d, 0x02],
            ZoomOut => [0x03, 0x00, 0x2e, 0x02],
            MouseLeft => [0x01, 0x00, 0xf0, 0x00],
            MouseRight => [0x01, 0x00, 0xf1, 0x00],
            MouseCenter => [0x01, 0x00, 0xf2, 0x00],
            MouseScrollUp => [0x01, 0x00, 0xf5, 0x01],
            MouseScrollDown => [0x01, 0x00, 0xf5, 0xff],
        }
    }

    pub fn category(self) -> SpecialCategory {
        use SpecialKey::*;
        match self {
            PlayPause | Stop | PrevTrack | NextTrack | VolumeDown | VolumeUp | Mute | MicMute
            | AudioSourceNext => SpecialCategory::Media,
            BrightnessUp | BrightnessDown => SpecialCategory::Display,
            AppMail | AppCalendar | AppCalculator | AppMediaPlayer | BrowserBack
            | BrowserForward | BrowserRefresh | BrowserStop | BrowserFavorites | BrowserHome
            | Search => SpecialCategory::AppLauncher,
            GameMode | MacroRecord | LedEffectNext | LedBrightnessUp | LedBrightnessDown => {
                SpecialCategory::System
            }
            ZoomIn | ZoomOut => SpecialCategory::Zoom,
            MouseLeft | MouseRight | MouseCenter | MouseScrollUp | MouseScrollDown => {
                SpecialCategory::Mouse
            }
        }
    }

    pub fn from_code(code: [u8; 4]) -> Option<Self> {
        Self::iter().find(|key| key.code() == code)
    }
}
