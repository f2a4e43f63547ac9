use log::debug;

use crate::consts::cmd;
use crate::error::{CodecError, Result};
use crate::keyboard::Rgb;
use crate::packet::{checksum, Packet};
use crate::settings::{ColorSource, EffectMode, LightingEffect, PresetColor, CUSTOM_COLOR_FLAG};

/// Meaningful bytes of an effect packet, checksum excluded
const EFFECT_LEN: usize = 8;

/// Encodes and decodes the global backlight effect (one packet).
#[derive(Debug, Clone, Copy, Default)]
pub struct EffectCodec;

impl EffectCodec {
    pub fn encode(&self, effect: &LightingEffect) -> Result<Packet> {
        effect.validate()?;
        let Rgb { r, g, b } = effect.color.rgb();
        let bytes = [
            cmd::SET_EFFECT,
            effect.mode.id(),
            effect.speed,
            effect.brightness,
            (effect.submode << 4) | effect.color.flag(),
            r,
            g,
            b,
        ];
        let packet = Packet::command(&bytes)?;
        debug!("effect {effect:?}: {:02x?}", &packet.as_bytes()[..=EFFECT_LEN]);
        Ok(packet)
    }

    /// Decodes a written effect packet (checksum verified) or the answer to
    /// [`EffectCodec::read_query`], which carries no checksum.
    pub fn decode(&self, packet: &Packet) -> Result<LightingEffect> {
        let bytes = packet.as_bytes();
        match bytes[0] {
            cmd::SET_EFFECT => {
                let expected = checksum(&bytes[..EFFECT_LEN]);
                let found = bytes[EFFECT_LEN];
                if expected != found {
                    return Err(CodecError::Checksum {
                        packet: 0,
                        expected,
                        found,
                    });
                }
            }
            cmd::GET_EFFECT => {}
            other => {
                return Err(CodecError::sequence(format!(
                    "0x{other:02x} is not an effect packet"
                )))
            }
        }

        let mode = EffectMode::from_id(bytes[1])
            .ok_or_else(|| CodecError::validation(format!("unknown mode 0x{:02x}", bytes[1])))?;
        let flag = bytes[4] & 0x0f;
        let color = match flag {
            CUSTOM_COLOR_FLAG => ColorSource::Custom(Rgb::new(bytes[5], bytes[6], bytes[7])),
            _ => ColorSource::Preset(PresetColor::from_flag(flag).ok_or_else(|| {
                CodecError::validation(format!("unknown color flag 0x{flag:02x}"))
            })?),
        };
        let effect = LightingEffect {
            mode,
            speed: bytes[2],
            brightness: bytes[3],
            submode: bytes[4] >> 4,
            color,
        };
        effect.validate()?;
        Ok(effect)
    }

    /// Asks the keyboard for its current effect.
    pub fn read_query(&self) -> Result<Packet> {
        Packet::command(&[cmd::GET_EFFECT, 0, 0, 0, 0, 0, 0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_util::packet as from_hex;

    /// Captured effect bytes, checksum appended.
    fn captured(s: &str) -> Packet {
        let mut bytes = *from_hex(s).as_bytes();
        bytes[EFFECT_LEN] = checksum(&bytes[..EFFECT_LEN]);
        bytes.into()
    }

    #[test]
    fn static_red() -> anyhow::Result<()> {
        let effect = LightingEffect {
            mode: EffectMode::Static,
            speed: 4,
            brightness: 4,
            submode: 0,
            color: ColorSource::Custom(Rgb::new(0xff, 0, 0)),
        };
        let packet = EffectCodec.encode(&effect)?;
        assert_eq!(
            &packet.to_hex()[..18],
            "0701040408ff0000e8",
            "checking effect bytes"
        );
        assert!(packet.as_bytes()[9..].iter().all(|b| *b == 0));
        assert_eq!(EffectCodec.decode(&packet)?, effect);
        Ok(())
    }

    #[test]
    fn captures_decode() -> anyhow::Result<()> {
        let cases = [
            (
                "0701040408ff0000",
                EffectMode::Static,
                4,
                4,
                0,
                ColorSource::Custom(Rgb::new(0xff, 0, 0)),
            ),
            (
                "0702040407000000",
                EffectMode::Breath,
                4,
                4,
                0,
                ColorSource::Preset(PresetColor::Rainbow),
            ),
            (
                "0704020427000000",
                EffectMode::Wave,
                2,
                4,
                2,
                ColorSource::Preset(PresetColor::Rainbow),
            ),
            (
                "0707020418ff456e",
                EffectMode::Snake,
                2,
                4,
                1,
                ColorSource::Custom(Rgb::new(0xff, 0x45, 0x6e)),
            ),
            (
                "070402040800ff00",
                EffectMode::Wave,
                2,
                4,
                0,
                ColorSource::Custom(Rgb::new(0, 0xff, 0)),
            ),
            (
                "0700040007000000",
                EffectMode::Off,
                4,
                0,
                0,
                ColorSource::Preset(PresetColor::Rainbow),
            ),
        ];
        for (hex, mode, speed, brightness, submode, color) in cases {
            let expected = LightingEffect {
                mode,
                speed,
                brightness,
                submode,
                color,
            };
            let packet = captured(hex);
            assert_eq!(EffectCodec.decode(&packet)?, expected, "decoding {hex}");
            assert_eq!(
                EffectCodec.encode(&expected)?,
                packet,
                "re-encoding {hex}"
            );
        }
        Ok(())
    }

    #[test]
    fn preset_sends_its_own_rgb() -> anyhow::Result<()> {
        // kaleidoscope with rainbow, captured with a stale custom color behind the flag
        let packet = captured("070b020407ff456e");
        let effect = EffectCodec.decode(&packet)?;
        assert_eq!(effect.mode, EffectMode::Kaleidoscope);
        assert_eq!(effect.color, ColorSource::Preset(PresetColor::Rainbow));
        assert_eq!(
            &EffectCodec.encode(&effect)?.to_hex()[..16],
            "070b020407000000",
            "the stale color is not written back"
        );

        let mut orange = effect;
        orange.color = ColorSource::Preset(PresetColor::Orange);
        assert_eq!(&EffectCodec.encode(&orange)?.to_hex()[..16], "070b020403ff6900");
        Ok(())
    }

    #[test]
    fn read_response_has_no_checksum() -> anyhow::Result<()> {
        let response = from_hex("87070204188844aa");
        let effect = EffectCodec.decode(&response)?;
        assert_eq!(effect.mode, EffectMode::Snake);
        assert_eq!(effect.submode, 1);
        assert_eq!(effect.color, ColorSource::Custom(Rgb::new(0x88, 0x44, 0xaa)));
        Ok(())
    }

    #[test]
    fn read_query_bytes() -> anyhow::Result<()> {
        assert_eq!(
            &EffectCodec.read_query()?.to_hex()[..16],
            "8700000000000078"
        );
        Ok(())
    }

    #[test]
    fn rejects_bad_packets() {
        let bad_checksum = from_hex("0701040408ff0000e9");
        assert!(matches!(
            EffectCodec.decode(&bad_checksum),
            Err(CodecError::Checksum {
                expected: 0xe8,
                found: 0xe9,
                ..
            })
        ));

        let unknown_mode = from_hex("87190404080000");
        assert!(matches!(
            EffectCodec.decode(&unknown_mode),
            Err(CodecError::Validation(_))
        ));

        let unknown_flag = from_hex("8701040409000000");
        assert!(matches!(
            EffectCodec.decode(&unknown_flag),
            Err(CodecError::Validation(_))
        ));

        let too_bright = from_hex("8701040508000000");
        assert!(matches!(
            EffectCodec.decode(&too_bright),
            Err(CodecError::Validation(_))
        ));

        let not_an_effect = from_hex("0c0080010000");
        assert!(matches!(
            EffectCodec.decode(&not_an_effect),
            Err(CodecError::Sequence(_))
        ));
    }

    #[test]
    fn encode_validates() {
        let mut effect = LightingEffect::with_mode(EffectMode::Static);
        effect.submode = 2;
        assert!(matches!(
            EffectCodec.encode(&effect),
            Err(CodecError::Validation(_))
        ));
    }
}
