//! nom parsers for key names, colors and rule expressions.
//! Callers outside this module go through `parse` or `from_str`, which
//! require the whole input to be consumed.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while1, take_while_m_n},
    character::complete::{char, digit1, satisfy},
    combinator::{all_consuming, map, map_opt, map_res, not, opt},
    error::ParseError,
    multi::many0,
    sequence::{separated_pair, terminated},
    IResult, Input, Parser,
};

use std::str::FromStr;

use crate::error::{CodecError, Result};
use crate::keyboard::layout::{KeySelector, PhysicalKey};
use crate::keyboard::{KeyAction, Modifier, Rgb, ScanCode, SpecialKey};

pub fn address(s: &str) -> IResult<&str, (u8, u8)> {
    let byte = || map_res(digit1, u8::from_str);
    separated_pair(byte(), char(':'), byte()).parse(s)
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// A key, group, modifier or function name.
fn name(s: &str) -> IResult<&str, &str> {
    take_while1(is_name_char).parse(s)
}

fn hex_byte(s: &str) -> IResult<&str, u8> {
    map_res(take_while_m_n(2, 2, |c: char| c.is_ascii_hexdigit()), |h| {
        u8::from_str_radix(h, 16)
    })
    .parse(s)
}

/// `RRGGBB`, optionally prefixed with `#` or `rgb:`.
pub fn rgb(s: &str) -> IResult<&str, Rgb> {
    let prefix = opt(alt((tag("#"), tag_no_case("rgb:"))));
    let triple = (hex_byte, hex_byte, hex_byte);
    map(
        terminated((prefix, triple), not(satisfy(is_name_char))),
        |(_, (r, g, b))| Rgb::new(r, g, b),
    )
    .parse(s)
}

/// A key or a key group.
pub fn selector(s: &str) -> IResult<&str, KeySelector> {
    map_opt(name, KeySelector::from_name).parse(s)
}

pub fn physical_key(s: &str) -> IResult<&str, PhysicalKey> {
    map_opt(name, PhysicalKey::from_key_name).parse(s)
}

fn modifier(s: &str) -> IResult<&str, Modifier> {
    map_opt(name, Modifier::from_key_name).parse(s)
}

/// Right hand side of a remap rule, before its modifiers are validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetExpr {
    pub modifiers: Vec<Modifier>,
    pub target: Target,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Disable,
    Raw([u8; 4]),
    Fn,
    Special(SpecialKey),
    Code(ScanCode),
}

impl TargetExpr {
    /// Checks the modifiers and builds the action. A raw slot becomes the
    /// action the keyboard would read back from it.
    pub fn into_action(self) -> Result<KeyAction> {
        let action = match self.target {
            Target::Disable => KeyAction::Disabled,
            Target::Raw(bytes) => KeyAction::from_slot(bytes),
            Target::Fn => KeyAction::FnToggle,
            Target::Special(key) => KeyAction::Special(key.into()),
            Target::Code(code) => KeyAction::key(code),
        };
        action.with_modifiers(&self.modifiers)
    }
}

fn target(s: &str) -> IResult<&str, Target> {
    // special names win over scan codes of the same name, `MUTE` vs `KEY_MUTE`
    map_opt(name, |n: &str| {
        if let Ok(key) = SpecialKey::from_str(n) {
            return Some(Target::Special(key));
        }
        match PhysicalKey::from_key_name(n)? {
            PhysicalKey::Fn => Some(Target::Fn),
            PhysicalKey::Code(code) => Some(Target::Code(code)),
        }
    })
    .parse(s)
}

fn raw_slot(s: &str) -> IResult<&str, [u8; 4]> {
    map(
        terminated(
            (hex_byte, hex_byte, hex_byte, hex_byte),
            not(satisfy(is_name_char)),
        ),
        |(a, b, c, d)| [a, b, c, d],
    )
    .parse(s)
}

/// `disable`, eight hex digits, or `[MOD:[MOD:]]TARGET`.
pub fn remap_target(s: &str) -> IResult<&str, TargetExpr> {
    let disable = map(
        terminated(tag_no_case("disable"), not(satisfy(is_name_char))),
        |_| TargetExpr {
            modifiers: vec![],
            target: Target::Disable,
        },
    );
    let raw = map(raw_slot, |bytes| TargetExpr {
        modifiers: vec![],
        target: Target::Raw(bytes),
    });
    let chord = map(
        (many0(terminated(modifier, char(':'))), target),
        |(modifiers, target)| TargetExpr { modifiers, target },
    );
    alt((disable, raw, chord)).parse(s)
}

/// `KEY:TARGET`
pub fn remap_rule(s: &str) -> IResult<&str, (PhysicalKey, TargetExpr)> {
    separated_pair(physical_key, char(':'), remap_target).parse(s)
}

/// `SELECTOR:COLOR`
pub fn color_rule(s: &str) -> IResult<&str, (KeySelector, Rgb)> {
    separated_pair(selector, char(':'), rgb).parse(s)
}

/// Parses string with given parser ensuring that whole input is consumed.
pub fn parse<I, O, E, P>(parser: P, input: I) -> std::result::Result<O, E>
where
    I: Input,
    E: ParseError<I>,
    P: Parser<I, Output = O, Error = E>,
{
    use nom::Finish as _;
    all_consuming(parser)
        .parse(input)
        .finish()
        .map(|(_, value)| value)
}

/// Parses string using given parser, as `parse` do, but also converts the
/// error into a [`CodecError::Parse`], so it may be used in implementations
/// of `FromStr`.
pub fn from_str<O, P>(parser: P, s: &str) -> Result<O>
where
    for<'a> P: Parser<&'a str, Output = O, Error = nom::error::Error<&'a str>>,
{
    parse(parser, s).map_err(|nom::error::Error { input, code }| CodecError::Parse {
        input: s.to_owned(),
        reason: if input.is_empty() {
            "unexpected end of input".to_owned()
        } else {
            format!("unexpected '{input}' ({code:?})")
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyboard::layout::KeyGroup;

    #[test]
    fn parse_address() -> anyhow::Result<()> {
        assert_eq!(from_str(address, "3:14")?, (3, 14));
        assert!(from_str(address, "3:256").is_err());
        Ok(())
    }

    #[test]
    fn parse_rgb() -> anyhow::Result<()> {
        assert_eq!(from_str(rgb, "336699")?, Rgb::new(0x33, 0x66, 0x99));
        assert_eq!(from_str(rgb, "RGB:ABCDEF")?, Rgb::new(0xab, 0xcd, 0xef));
        assert!(from_str(rgb, "3366990").is_err());
        assert!(from_str(rgb, "#33669").is_err());
        Ok(())
    }

    #[test]
    fn parse_targets() -> anyhow::Result<()> {
        assert_eq!(
            from_str(remap_target, "KEY_LEFTALT:KEY_F1")?,
            TargetExpr {
                modifiers: vec![Modifier::LeftAlt],
                target: Target::Code(ScanCode::F1),
            }
        );
        assert_eq!(from_str(remap_target, "Disable")?.target, Target::Disable);
        assert_eq!(
            from_str(remap_target, "0300cd00")?.target,
            Target::Raw([0x03, 0x00, 0xcd, 0x00])
        );
        assert_eq!(from_str(remap_target, "KEY_FN")?.target, Target::Fn);
        assert_eq!(
            from_str(remap_target, "MUTE")?.target,
            Target::Special(SpecialKey::Mute)
        );
        assert_eq!(
            from_str(remap_target, "KEY_MUTE")?.target,
            Target::Code(ScanCode::Mute)
        );
        // a modifier may itself be the target
        assert_eq!(
            from_str(remap_target, "KEY_LEFTSHIFT")?.target,
            Target::Code(ScanCode::LeftShift)
        );
        assert!(from_str(remap_target, "KEY_NOPE").is_err());
        assert!(from_str(remap_target, "KEY_LEFTALT:").is_err());
        Ok(())
    }

    #[test]
    fn parse_rules() -> anyhow::Result<()> {
        let (key, target) = from_str(remap_rule, "KEY_ESC:ctrl:shift:KEY_ESC")?;
        assert_eq!(key, PhysicalKey::Code(ScanCode::Esc));
        assert_eq!(target.modifiers, [Modifier::LeftCtrl, Modifier::LeftShift]);

        let (key, _) = from_str(remap_rule, "KEY_FN:KEY_RIGHTMETA")?;
        assert_eq!(key, PhysicalKey::Fn);

        assert_eq!(
            from_str(color_rule, "ALL_F:#ffff00")?,
            (KeySelector::Group(KeyGroup::AllF), Rgb::new(0xff, 0xff, 0))
        );
        assert!(from_str(color_rule, "ALL_F").is_err());
        Ok(())
    }

    #[test]
    fn raw_slots_match_named_targets() -> anyhow::Result<()> {
        assert_eq!("00000500".parse::<KeyAction>()?, KeyAction::key(ScanCode::B));
        assert_eq!(
            "0300cd00".parse::<KeyAction>()?,
            KeyAction::Special(SpecialKey::PlayPause.into())
        );
        assert_eq!("0a010000".parse::<KeyAction>()?, KeyAction::FnToggle);
        assert_eq!("00000000".parse::<KeyAction>()?, KeyAction::Disabled);
        assert_eq!(
            "05010203".parse::<KeyAction>()?,
            KeyAction::Raw([0x05, 0x01, 0x02, 0x03])
        );
        Ok(())
    }

    #[test]
    fn errors_carry_input() {
        let err = from_str(rgb, "nope").unwrap_err();
        assert!(
            matches!(&err, CodecError::Parse { input, .. } if input == "nope"),
            "{err}"
        );
    }

    #[test]
    fn syntax_and_validation_errors_differ() {
        let err = "KEY_LEFTALT:KEY_LEFTALT:KEY_A".parse::<KeyAction>().unwrap_err();
        assert!(matches!(err, CodecError::Validation(_)), "{err}");
        let err = "KEY_LEFTALT::KEY_A".parse::<KeyAction>().unwrap_err();
        assert!(matches!(err, CodecError::Parse { .. }), "{err}");
    }
}
