//! Values that describe a complete keyboard configuration.

use std::{fmt::Display, str::FromStr};

use num_derive::{FromPrimitive, ToPrimitive};
use serde_with::DeserializeFromStr;
use strum_macros::{Display, EnumIter, EnumString};

use crate::consts::{COLOR_POSITIONS, MAX_BRIGHTNESS, REMAP_POSITIONS};
use crate::error::{CodecError, Result};
use crate::keyboard::layout::{Layout, PhysicalKey};
use crate::keyboard::{KeyAction, Rgb};

/// Backlight animations, numbered as the firmware numbers them.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    FromPrimitive,
    ToPrimitive,
    EnumString,
    EnumIter,
    Display,
    DeserializeFromStr,
)]
#[repr(u8)]
#[strum(serialize_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum EffectMode {
    Off = 0x00,
    Static,
    Breath,
    Neon,
    Wave,
    #[strum(serialize = "waterdrop")]
    WaterDrop,
    Rain,
    Snake,
    #[strum(serialize = "fadeout")]
    FadeOut,
    Spiral,
    Sinusoid,
    Kaleidoscope,
    Linear,
    /// Per key colors
    User,
    Laser,
    #[strum(serialize = "roundwave")]
    RoundWave,
    Shining,
    #[strum(serialize = "rain2")]
    Rain2,
    Horizontal,
    #[strum(serialize = "staticfade")]
    StaticFade,
    MusicEdm,
    Screen,
    MusicStandard,
    Surf,
    Skew,
}

impl EffectMode {
    pub fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        num::FromPrimitive::from_u8(id)
    }

    /// Names of the variants of this mode, indexed by submode number.
    pub fn submodes(self) -> &'static [&'static str] {
        match self {
            EffectMode::Wave => &["right", "left", "down", "up"],
            EffectMode::Snake => &["linear", "tocenter"],
            EffectMode::Kaleidoscope => &["fromcenter", "tocenter"],
            EffectMode::RoundWave => &["counterclockwise", "clockwise"],
            EffectMode::MusicEdm => &["upright", "separate", "cross"],
            _ => &[],
        }
    }

    pub fn submode_by_name(self, name: &str) -> Result<u8> {
        self.submodes()
            .iter()
            .position(|s| s.eq_ignore_ascii_case(name))
            .map(|i| i as u8)
            .ok_or_else(|| {
                CodecError::validation(format!(
                    "mode {self} has no submode '{name}' (available: {})",
                    if self.submodes().is_empty() {
                        "none".to_owned()
                    } else {
                        self.submodes().join(", ")
                    }
                ))
            })
    }

    pub fn submode_name(self, submode: u8) -> Option<&'static str> {
        self.submodes().get(usize::from(submode)).copied()
    }
}

/// Colors the firmware knows by number.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    FromPrimitive,
    ToPrimitive,
    EnumString,
    EnumIter,
    Display,
)]
#[repr(u8)]
#[strum(serialize_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum PresetColor {
    Red = 0,
    Green,
    Blue,
    Orange,
    Pink,
    Yellow,
    White,
    /// Cycles through all colors
    Rainbow,
}

impl PresetColor {
    pub fn flag(self) -> u8 {
        self as u8
    }

    pub fn from_flag(flag: u8) -> Option<Self> {
        num::FromPrimitive::from_u8(flag)
    }

    /// RGB value sent along with the preset flag.
    pub fn rgb(self) -> Rgb {
        match self {
            PresetColor::Red => Rgb::new(0xff, 0x00, 0x00),
            PresetColor::Green => Rgb::new(0x00, 0xff, 0x00),
            PresetColor::Blue => Rgb::new(0x00, 0x00, 0xff),
            PresetColor::Orange => Rgb::new(0xff, 0x69, 0x00),
            PresetColor::Pink => Rgb::new(0xff, 0x14, 0x93),
            PresetColor::Yellow => Rgb::new(0xff, 0xff, 0x00),
            PresetColor::White => Rgb::new(0xff, 0xff, 0xff),
            PresetColor::Rainbow => Rgb::BLACK,
        }
    }
}

/// Flag value selecting [`ColorSource::Custom`]
pub const CUSTOM_COLOR_FLAG: u8 = 0x08;

/// Color of an effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr)]
pub enum ColorSource {
    Preset(PresetColor),
    Custom(Rgb),
}

impl ColorSource {
    pub fn flag(self) -> u8 {
        match self {
            ColorSource::Preset(preset) => preset.flag(),
            ColorSource::Custom(_) => CUSTOM_COLOR_FLAG,
        }
    }

    pub fn rgb(self) -> Rgb {
        match self {
            ColorSource::Preset(preset) => preset.rgb(),
            ColorSource::Custom(rgb) => rgb,
        }
    }
}

impl FromStr for ColorSource {
    type Err = CodecError;

    /// A preset name, or a custom color in any form [`Rgb`] accepts.
    fn from_str(s: &str) -> Result<Self> {
        match PresetColor::from_str(s) {
            Ok(preset) => Ok(Self::Preset(preset)),
            Err(_) => s.parse().map(Self::Custom),
        }
    }
}

impl Display for ColorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorSource::Preset(preset) => write!(f, "{preset}"),
            ColorSource::Custom(rgb) => write!(f, "{rgb}"),
        }
    }
}

/// Global backlight setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LightingEffect {
    pub mode: EffectMode,
    pub speed: u8,
    /// 0 (off) ..= 4
    pub brightness: u8,
    /// Index into [`EffectMode::submodes`], 0 for modes without variants
    pub submode: u8,
    pub color: ColorSource,
}

impl LightingEffect {
    pub fn with_mode(mode: EffectMode) -> Self {
        Self {
            mode,
            speed: 4,
            brightness: MAX_BRIGHTNESS,
            submode: 0,
            color: ColorSource::Preset(PresetColor::Rainbow),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.brightness > MAX_BRIGHTNESS {
            return Err(CodecError::validation(format!(
                "brightness {} is above {MAX_BRIGHTNESS}",
                self.brightness
            )));
        }
        let count = self.mode.submodes().len();
        if self.submode != 0 && usize::from(self.submode) >= count {
            return Err(CodecError::validation(format!(
                "mode {} has {count} submodes, got submode {}",
                self.mode, self.submode
            )));
        }
        Ok(())
    }
}

impl Default for LightingEffect {
    fn default() -> Self {
        Self::with_mode(EffectMode::Static)
    }
}

/// Color of every position of the matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyColorMap([Rgb; COLOR_POSITIONS]);

impl KeyColorMap {
    /// Builds a map from a list of exactly [`COLOR_POSITIONS`] colors.
    pub fn from_colors(colors: &[Rgb]) -> Result<Self> {
        let colors: [Rgb; COLOR_POSITIONS] = colors.try_into().map_err(|_| {
            CodecError::validation(format!(
                "a color map has {COLOR_POSITIONS} entries, got {}",
                colors.len()
            ))
        })?;
        Ok(Self(colors))
    }

    pub fn get(&self, position: usize) -> Option<Rgb> {
        self.0.get(position).copied()
    }

    pub fn set(&mut self, position: usize, color: Rgb) -> Result<()> {
        let slot = self.0.get_mut(position).ok_or_else(|| {
            CodecError::validation(format!(
                "color position {position} is outside 0..{COLOR_POSITIONS}"
            ))
        })?;
        *slot = color;
        Ok(())
    }

    pub fn colors(&self) -> &[Rgb] {
        &self.0
    }
}

impl Default for KeyColorMap {
    fn default() -> Self {
        Self([Rgb::BLACK; COLOR_POSITIONS])
    }
}

/// Action of every position of the remap table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRemapTable([KeyAction; REMAP_POSITIONS]);

impl KeyRemapTable {
    /// The table a keyboard ships with: every key sends its own code.
    pub fn factory(layout: &Layout) -> Self {
        let mut actions = [KeyAction::Disabled; REMAP_POSITIONS];
        for (pos, key) in layout.keys() {
            if let Some(slot) = actions.get_mut(pos) {
                *slot = match key {
                    PhysicalKey::Code(code) => KeyAction::key(code),
                    PhysicalKey::Fn => KeyAction::FnToggle,
                };
            }
        }
        Self(actions)
    }

    pub fn from_actions(actions: &[KeyAction]) -> Result<Self> {
        let actions: [KeyAction; REMAP_POSITIONS] = actions.try_into().map_err(|_| {
            CodecError::validation(format!(
                "a remap table has {REMAP_POSITIONS} entries, got {}",
                actions.len()
            ))
        })?;
        Ok(Self(actions))
    }

    pub fn get(&self, position: usize) -> Option<KeyAction> {
        self.0.get(position).copied()
    }

    pub fn set(&mut self, position: usize, action: KeyAction) -> Result<()> {
        let slot = self.0.get_mut(position).ok_or_else(|| {
            CodecError::validation(format!(
                "remap position {position} is outside 0..{REMAP_POSITIONS}"
            ))
        })?;
        *slot = action;
        Ok(())
    }

    pub fn actions(&self) -> &[KeyAction] {
        &self.0
    }

    /// Positions whose action differs from `other`.
    pub fn diff<'a>(&'a self, other: &'a Self) -> impl Iterator<Item = (usize, KeyAction)> + 'a {
        self.0
            .iter()
            .zip(other.0.iter())
            .enumerate()
            .filter(|(_, (a, b))| a != b)
            .map(|(pos, (a, _))| (pos, *a))
    }
}

impl Default for KeyRemapTable {
    fn default() -> Self {
        Self::factory(&Layout::default())
    }
}
