use std::str::FromStr;

use enumset::{EnumSet, EnumSetType};
use serde::Deserialize;
use serde_with::DeserializeFromStr;
use strum_macros::Display;

use crate::codec::{EffectCodec, KeyColorCodec, ReadSlices, RemapCodec};
use crate::error::{CodecError, Result};
use crate::keyboard::layout::{KeySelector, Layout, PhysicalKey};
use crate::keyboard::{KeyAction, Rgb};
use crate::packet::PacketSequence;
use crate::parse;
use crate::settings::{ColorSource, EffectMode, KeyColorMap, KeyRemapTable, LightingEffect};

/// Settings document read by `validate` and `program`.
///
/// ```yaml
/// effect:
///   mode: wave
///   submode: left
///   speed: 3
/// key_colors:
///   - ALL:000000
///   - ALL_WASD:#ff0000
/// key_remap:
///   - KEY_CAPSLOCK:disable
///   - KEY_ESC:KEY_LEFTALT:KEY_F1
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub effect: Option<EffectConfig>,

    /// Applied in order, later rules override earlier ones.
    #[serde(default)]
    pub key_colors: Vec<ColorRule>,

    #[serde(default)]
    pub key_remap: Vec<RemapRule>,

    #[serde(default)]
    pub color_protocol: ColorProtocol,
}

/// Overrides for the global effect. Missing fields keep their current value.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EffectConfig {
    pub mode: Option<EffectMode>,
    pub submode: Option<String>,
    pub speed: Option<u8>,
    pub brightness: Option<u8>,
    pub color: Option<ColorSource>,
}

/// Framing of color matrix transfers.
#[derive(Debug, Default, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ColorProtocol {
    pub write_packets: Option<usize>,
    pub read_slices: Option<Vec<usize>>,
}

/// `SELECTOR:COLOR`, e.g. `ALL_F:#00ff00`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr)]
pub struct ColorRule {
    pub selector: KeySelector,
    pub color: Rgb,
}

/// `KEY:TARGET`, e.g. `KEY_ESC:KEY_LEFTALT:KEY_F1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, DeserializeFromStr)]
pub struct RemapRule {
    pub key: PhysicalKey,
    pub action: KeyAction,
}

/// Configuration types, written as separate packet sequences.
#[derive(Debug, Display, EnumSetType)]
#[strum(serialize_all = "kebab-case")]
pub enum Section {
    Effect,
    KeyColors,
    KeyRemap,
}

/// Values of the configuration types a document touches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyboardState {
    pub effect: Option<LightingEffect>,
    pub key_colors: Option<KeyColorMap>,
    pub key_remap: Option<KeyRemapTable>,
}

impl FromStr for ColorRule {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let (selector, color) = parse::from_str(parse::color_rule, s)?;
        Ok(Self { selector, color })
    }
}

impl FromStr for RemapRule {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        let (key, target) = parse::from_str(parse::remap_rule, s)?;
        Ok(Self {
            key,
            action: target.into_action()?,
        })
    }
}

impl EffectConfig {
    /// Applies the overrides on top of `current`. Switching to another mode
    /// starts from its first submode.
    pub fn apply(&self, current: LightingEffect) -> Result<LightingEffect> {
        let mut effect = current;
        if let Some(mode) = self.mode {
            if mode != effect.mode {
                effect.mode = mode;
                effect.submode = 0;
            }
        }
        if let Some(name) = &self.submode {
            effect.submode = effect.mode.submode_by_name(name)?;
        }
        if let Some(speed) = self.speed {
            effect.speed = speed;
        }
        if let Some(brightness) = self.brightness {
            effect.brightness = brightness;
        }
        if let Some(color) = self.color {
            effect.color = color;
        }
        effect.validate()?;
        Ok(effect)
    }
}

impl ColorProtocol {
    pub fn codec<'a>(&self, layout: &'a Layout) -> Result<KeyColorCodec<'a>> {
        let mut codec = KeyColorCodec::new(layout);
        if let Some(packets) = self.write_packets {
            codec = codec.with_write_packets(packets)?;
        }
        if let Some(slices) = &self.read_slices {
            codec = codec.with_read_slices(ReadSlices::new(slices.clone())?);
        }
        Ok(codec)
    }
}

impl Config {
    /// Configuration types this document changes.
    pub fn sections(&self) -> EnumSet<Section> {
        let mut sections = EnumSet::new();
        if self.effect.is_some() {
            sections.insert(Section::Effect);
        }
        if !self.key_colors.is_empty() {
            sections.insert(Section::KeyColors);
        }
        if !self.key_remap.is_empty() {
            sections.insert(Section::KeyRemap);
        }
        sections
    }

    pub fn render_key_colors(&self, layout: &Layout, current: KeyColorMap) -> Result<KeyColorMap> {
        let mut colors = current;
        for rule in &self.key_colors {
            for pos in layout.resolve(&[rule.selector])? {
                colors.set(pos, rule.color)?;
            }
        }
        Ok(colors)
    }

    pub fn render_key_remap(
        &self,
        layout: &Layout,
        current: KeyRemapTable,
    ) -> Result<KeyRemapTable> {
        let mut table = current;
        for rule in &self.key_remap {
            let pos = layout.position_of(rule.key).ok_or_else(|| {
                CodecError::validation(format!("{} is not on this keyboard", rule.key))
            })?;
            table.set(pos, rule.action)?;
        }
        Ok(table)
    }

    /// Applies the document on top of `current`. Sections the document does
    /// not touch are left out of the result; touched sections missing from
    /// `current` start from their defaults.
    pub fn render(&self, layout: &Layout, current: KeyboardState) -> Result<KeyboardState> {
        let sections = self.sections();
        let effect = match &self.effect {
            Some(effect) => Some(effect.apply(current.effect.unwrap_or_default())?),
            None => None,
        };
        let key_colors = if sections.contains(Section::KeyColors) {
            Some(self.render_key_colors(layout, current.key_colors.unwrap_or_default())?)
        } else {
            None
        };
        let key_remap = if sections.contains(Section::KeyRemap) {
            let table = current
                .key_remap
                .unwrap_or_else(|| KeyRemapTable::factory(layout));
            Some(self.render_key_remap(layout, table)?)
        } else {
            None
        };
        Ok(KeyboardState {
            effect,
            key_colors,
            key_remap,
        })
    }
}

impl KeyboardState {
    /// One packet sequence per section present, effect first.
    pub fn encode(
        &self,
        colors: &KeyColorCodec,
        remap: &RemapCodec,
    ) -> Result<Vec<(Section, PacketSequence)>> {
        let mut sequences = vec![];
        if let Some(effect) = &self.effect {
            let packet = EffectCodec.encode(effect)?;
            sequences.push((Section::Effect, PacketSequence::new(vec![packet])));
        }
        if let Some(map) = &self.key_colors {
            sequences.push((Section::KeyColors, colors.encode(map)?));
        }
        if let Some(table) = &self.key_remap {
            sequences.push((Section::KeyRemap, remap.encode(table)?));
        }
        Ok(sequences)
    }
}
