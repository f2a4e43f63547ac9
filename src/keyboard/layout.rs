//! Physical arrangement of the keys: which key sits at which position of
//! the color matrix and of the remap table.

use std::collections::BTreeSet;
use std::{fmt::Display, str::FromStr};

use serde_with::DeserializeFromStr;
use strum_macros::{Display, EnumIter, EnumString};

use super::{strip_key_prefix, ScanCode};
use crate::error::{CodecError, Result};
use crate::parse;

/// A key that can occupy a position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PhysicalKey {
    Code(ScanCode),
    /// The Fn layer key, which has no usage code of its own.
    Fn,
}

impl PhysicalKey {
    pub fn from_key_name(name: &str) -> Option<Self> {
        if strip_key_prefix(name).eq_ignore_ascii_case("FN") {
            return Some(Self::Fn);
        }
        ScanCode::from_key_name(name).map(Self::Code)
    }
}

impl FromStr for PhysicalKey {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_key_name(s).ok_or_else(|| CodecError::Parse {
            input: s.to_owned(),
            reason: "unknown key".to_owned(),
        })
    }
}

impl Display for PhysicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhysicalKey::Code(code) => write!(f, "{code}"),
            PhysicalKey::Fn => write!(f, "KEY_FN"),
        }
    }
}

const fn key(code: ScanCode) -> Option<PhysicalKey> {
    Some(PhysicalKey::Code(code))
}

const YKB3700: [Option<PhysicalKey>; 90] = {
    use ScanCode::*;
    [
        key(Esc),
        key(Grave),
        key(Tab),
        key(CapsLock),
        key(LeftShift),
        key(LeftCtrl),
        None,
        key(N1),
        key(Q),
        key(A),
        key(Key102nd),
        None,
        key(F1),
        key(N2),
        key(W),
        key(S),
        key(Z),
        key(LeftMeta),
        key(F2),
        key(N3),
        key(E),
        key(D),
        key(X),
        key(LeftAlt),
        key(F3),
        key(N4),
        key(R),
        key(F),
        key(C),
        None,
        key(F4),
        key(N5),
        key(T),
        key(G),
        key(V),
        None,
        key(F5),
        key(N6),
        key(Y),
        key(H),
        key(B),
        key(Space),
        key(F6),
        key(N7),
        key(U),
        key(J),
        key(N),
        key(RightAlt),
        key(F7),
        key(N8),
        key(I),
        key(K),
        key(M),
        Some(PhysicalKey::Fn),
        key(F8),
        key(N9),
        key(O),
        key(L),
        key(Comma),
        key(RightCtrl),
        key(F9),
        key(N0),
        key(P),
        key(Semicolon),
        key(Dot),
        key(Left),
        key(F10),
        key(Minus),
        key(LeftBrace),
        key(Apostrophe),
        key(Slash),
        key(Down),
        key(F11),
        key(Equal),
        key(RightBrace),
        key(HashTilde),
        key(RightShift),
        key(Right),
        key(F12),
        key(Backspace),
        key(Backslash),
        key(Enter),
        key(Up),
        key(Insert),
        key(PrintScreen),
        key(Home),
        key(End),
        key(PageUp),
        key(PageDown),
        key(Delete),
    ]
};

/// Maps positions to physical keys. Positions without a key are reserved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    keys: &'static [Option<PhysicalKey>],
}

impl Layout {
    /// The 90 position layout of the YKB3700.
    pub fn ykb3700() -> Self {
        Self { keys: &YKB3700 }
    }

    pub fn key_at(&self, position: usize) -> Option<PhysicalKey> {
        self.keys.get(position).copied().flatten()
    }

    pub fn position_of(&self, key: PhysicalKey) -> Option<usize> {
        self.keys.iter().position(|k| *k == Some(key))
    }

    pub fn is_reserved(&self, position: usize) -> bool {
        self.key_at(position).is_none()
    }

    /// All keys in position order.
    pub fn keys(&self) -> impl Iterator<Item = (usize, PhysicalKey)> + '_ {
        self.keys
            .iter()
            .enumerate()
            .filter_map(|(pos, key)| key.map(|k| (pos, k)))
    }

    /// Positions addressed by any of `selectors`.
    ///
    /// Members of a group that are missing from this layout are skipped, a
    /// single key that is missing is an error.
    pub fn resolve(&self, selectors: &[KeySelector]) -> Result<BTreeSet<usize>> {
        let mut positions = BTreeSet::new();
        for selector in selectors {
            match selector {
                KeySelector::Key(key) => {
                    let pos = self.position_of(*key).ok_or_else(|| {
                        CodecError::validation(format!("{key} is not on this keyboard"))
                    })?;
                    positions.insert(pos);
                }
                KeySelector::Group(KeyGroup::All) => {
                    positions.extend(self.keys().map(|(pos, _)| pos));
                }
                KeySelector::Group(group) => positions.extend(
                    group
                        .members()
                        .iter()
                        .filter_map(|code| self.position_of(PhysicalKey::Code(*code))),
                ),
            }
        }
        Ok(positions)
    }
}

impl Default for Layout {
    fn default() -> Self {
        Self::ykb3700()
    }
}

/// Named sets of keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[strum(ascii_case_insensitive)]
pub enum KeyGroup {
    All,
    #[strum(serialize = "ALL_F")]
    AllF,
    #[strum(serialize = "ALL_F1")]
    AllF1,
    #[strum(serialize = "ALL_F2")]
    AllF2,
    #[strum(serialize = "ALL_F3")]
    AllF3,
    AllMod,
    AllNav,
    AllNum,
    AllWasd,
    AllArrows,
    AllSpecial,
    AllAlpha,
}

impl KeyGroup {
    /// Keys of the group; empty for `ALL`, which means every key of a layout.
    pub fn members(self) -> &'static [ScanCode] {
        use ScanCode::*;
        match self {
            KeyGroup::All => &[],
            KeyGroup::AllF => &[F1, F2, F3, F4, F5, F6, F7, F8, F9, F10, F11, F12],
            KeyGroup::AllF1 => &[F1, F2, F3, F4],
            KeyGroup::AllF2 => &[F5, F6, F7, F8],
            KeyGroup::AllF3 => &[F9, F10, F11, F12],
            KeyGroup::AllMod => &[
                LeftCtrl, RightCtrl, LeftShift, RightShift, LeftAlt, RightAlt, LeftMeta,
                RightMeta,
            ],
            KeyGroup::AllNav => &[
                Left, Right, Up, Down, Home, End, PageUp, PageDown, Insert, Delete,
            ],
            KeyGroup::AllNum => &[N1, N2, N3, N4, N5, N6, N7, N8, N9, N0],
            KeyGroup::AllWasd => &[W, A, S, D],
            KeyGroup::AllArrows => &[Left, Right, Up, Down],
            KeyGroup::AllSpecial => &[Esc, Enter, Space, Backspace, Tab, CapsLock, PrintScreen],
            KeyGroup::AllAlpha => &[
                A, B, C, D, E, F, G, H, I, J, K, L, M, N, O, P, Q, R, S, T, U, V, W, X, Y, Z,
            ],
        }
    }
}

/// Left hand side of a color rule: one key or a group of keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, DeserializeFromStr)]
pub enum KeySelector {
    Key(PhysicalKey),
    Group(KeyGroup),
}

impl KeySelector {
    pub(crate) fn from_name(name: &str) -> Option<Self> {
        KeyGroup::from_str(name)
            .ok()
            .map(Self::Group)
            .or_else(|| PhysicalKey::from_key_name(name).map(Self::Key))
    }
}

impl FromStr for KeySelector {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        parse::from_str(parse::selector, s)
    }
}

impl Display for KeySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeySelector::Key(key) => write!(f, "{key}"),
            KeySelector::Group(group) => write!(f, "{group}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_positions() {
        let layout = Layout::ykb3700();
        for pos in [6, 11, 29, 35, 90, 125, 147, 500] {
            assert!(layout.is_reserved(pos), "checking position {pos}");
        }
        assert_eq!(layout.keys().count(), 86);
    }

    #[test]
    fn known_positions() {
        let layout = Layout::ykb3700();
        assert_eq!(layout.key_at(0), Some(PhysicalKey::Code(ScanCode::Esc)));
        assert_eq!(layout.key_at(18), Some(PhysicalKey::Code(ScanCode::F2)));
        assert_eq!(layout.key_at(53), Some(PhysicalKey::Fn));
        assert_eq!(layout.key_at(89), Some(PhysicalKey::Code(ScanCode::Delete)));
        assert_eq!(layout.position_of(PhysicalKey::Code(ScanCode::CapsLock)), Some(3));
        assert_eq!(layout.position_of(PhysicalKey::Code(ScanCode::RightMeta)), None);
    }

    #[test]
    fn every_key_appears_once() {
        let layout = Layout::ykb3700();
        let keys: BTreeSet<PhysicalKey> = layout.keys().map(|(_, k)| k).collect();
        assert_eq!(keys.len(), layout.keys().count());
    }

    #[test]
    fn selector_names() -> anyhow::Result<()> {
        assert_eq!(
            "ALL_F1".parse::<KeySelector>()?,
            KeySelector::Group(KeyGroup::AllF1)
        );
        assert_eq!(
            "all_wasd".parse::<KeySelector>()?,
            KeySelector::Group(KeyGroup::AllWasd)
        );
        assert_eq!("ALL".parse::<KeySelector>()?, KeySelector::Group(KeyGroup::All));
        assert_eq!(
            "KEY_FN".parse::<KeySelector>()?,
            KeySelector::Key(PhysicalKey::Fn)
        );
        assert_eq!(
            "key_esc".parse::<KeySelector>()?,
            KeySelector::Key(PhysicalKey::Code(ScanCode::Esc))
        );
        assert!("ALL_NOPE".parse::<KeySelector>().is_err());
        assert_eq!(KeyGroup::AllF3.to_string(), "ALL_F3");
        assert_eq!(KeyGroup::AllArrows.to_string(), "ALL_ARROWS");
        Ok(())
    }

    #[test]
    fn resolve_groups() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let wasd = layout.resolve(&[KeySelector::Group(KeyGroup::AllWasd)])?;
        assert_eq!(wasd.into_iter().collect::<Vec<_>>(), [9, 14, 15, 21]);

        // right meta is not on the keyboard and is skipped
        let mods = layout.resolve(&[KeySelector::Group(KeyGroup::AllMod)])?;
        assert_eq!(mods.len(), 7);

        let all = layout.resolve(&[KeySelector::Group(KeyGroup::All)])?;
        assert_eq!(all.len(), 86);
        assert!(!all.contains(&6), "reserved positions are not part of ALL");

        let union = layout.resolve(&[
            KeySelector::Group(KeyGroup::AllArrows),
            KeySelector::Group(KeyGroup::AllNav),
        ])?;
        assert_eq!(union.len(), 10);
        Ok(())
    }

    #[test]
    fn resolve_missing_key() {
        let layout = Layout::ykb3700();
        let selectors = [
            KeySelector::Key(PhysicalKey::Code(ScanCode::F2)),
            KeySelector::Key(PhysicalKey::Code(ScanCode::Mute)),
        ];
        let err = layout.resolve(&selectors).unwrap_err();
        assert!(matches!(err, CodecError::Validation(_)), "{err}");
    }
}
