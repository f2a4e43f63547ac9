use std::fmt::Write as _;

use itertools::Itertools as _;

use yenkey::config::KeyboardState;
use yenkey::keyboard::layout::Layout;
use yenkey::keyboard::Rgb;
use yenkey::settings::{KeyColorMap, KeyRemapTable, LightingEffect};

pub struct Printer {}

impl Printer {
    /// Renders read back settings as a document `program` accepts.
    ///
    /// # Arguments
    /// `state` - Sections read from the keyboard
    /// `layout` - Layout giving key names to positions
    /// `readable` - Positions covered by a color read
    ///
    pub fn to_yaml(state: &KeyboardState, layout: &Layout, readable: usize) -> String {
        let mut out = String::new();
        if let Some(effect) = &state.effect {
            Self::effect(&mut out, effect);
        }
        if let Some(colors) = &state.key_colors {
            Self::key_colors(&mut out, colors, layout, readable);
        }
        if let Some(table) = &state.key_remap {
            Self::key_remap(&mut out, table, layout);
        }
        out
    }

    fn effect(out: &mut String, effect: &LightingEffect) {
        let _ = writeln!(out, "effect:");
        let _ = writeln!(out, "  mode: {}", effect.mode);
        if let Some(name) = effect.mode.submode_name(effect.submode) {
            let _ = writeln!(out, "  submode: {name}");
        }
        let _ = writeln!(out, "  speed: {}", effect.speed);
        let _ = writeln!(out, "  brightness: {}", effect.brightness);
        let _ = writeln!(out, "  color: \"{}\"", effect.color);
    }

    /// Black is written once for every key, then each lit key.
    fn key_colors(out: &mut String, colors: &KeyColorMap, layout: &Layout, readable: usize) {
        let _ = writeln!(out, "key_colors:");
        let _ = writeln!(out, "  - \"ALL:{}\"", Rgb::BLACK);
        for (pos, key) in layout.keys().filter(|(pos, _)| *pos < readable) {
            match colors.get(pos) {
                Some(color) if !color.is_black() => {
                    let _ = writeln!(out, "  - \"{key}:{color}\"");
                }
                _ => {}
            }
        }
        let unread = layout.keys().filter(|(pos, _)| *pos >= readable).collect_vec();
        if !unread.is_empty() {
            let _ = writeln!(
                out,
                "  # not read back: {}",
                unread.iter().map(|(_, key)| key).join(", ")
            );
        }
    }

    /// Only positions that differ from the factory table are listed.
    fn key_remap(out: &mut String, table: &KeyRemapTable, layout: &Layout) {
        let factory = KeyRemapTable::factory(layout);
        let changes = table.diff(&factory).collect_vec();
        if changes.is_empty() {
            let _ = writeln!(out, "# key map is the factory default");
            return;
        }
        let _ = writeln!(out, "key_remap:");
        for (pos, action) in changes {
            match layout.key_at(pos) {
                Some(key) => {
                    let _ = writeln!(out, "  - \"{key}:{action}\"");
                }
                None => {
                    let _ = writeln!(out, "  # reserved position {pos}: {action}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;
    use yenkey::config::Config;
    use yenkey::keyboard::layout::PhysicalKey;
    use yenkey::keyboard::{KeyAction, Modifier, ModifierSet, ScanCode};
    use yenkey::settings::{ColorSource, EffectMode};

    #[test]
    fn effect() {
        let state = KeyboardState {
            effect: Some(LightingEffect {
                mode: EffectMode::Snake,
                speed: 2,
                brightness: 4,
                submode: 1,
                color: ColorSource::Custom(Rgb::new(0x88, 0x44, 0xaa)),
            }),
            ..Default::default()
        };
        let layout = Layout::ykb3700();
        assert_eq!(
            Printer::to_yaml(&state, &layout, 0),
            indoc! {r##"
                effect:
                  mode: snake
                  submode: tocenter
                  speed: 2
                  brightness: 4
                  color: "#8844aa"
            "##}
        );
    }

    #[test]
    fn remap_lists_changes_only() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let mut table = KeyRemapTable::factory(&layout);
        table.set(3, KeyAction::Disabled)?;
        table.set(6, KeyAction::key(ScanCode::A))?;
        let state = KeyboardState {
            key_remap: Some(table),
            ..Default::default()
        };
        assert_eq!(
            Printer::to_yaml(&state, &layout, 0),
            indoc! {r#"
                key_remap:
                  - "KEY_CAPSLOCK:disable"
                  # reserved position 6: KEY_A
            "#}
        );

        let factory = KeyboardState {
            key_remap: Some(KeyRemapTable::factory(&layout)),
            ..Default::default()
        };
        assert_eq!(
            Printer::to_yaml(&factory, &layout, 0),
            "# key map is the factory default\n"
        );
        Ok(())
    }

    #[test]
    fn colors_list_lit_keys() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let mut colors = KeyColorMap::default();
        let esc = layout
            .position_of(PhysicalKey::Code(ScanCode::Esc))
            .ok_or_else(|| anyhow::anyhow!("no esc"))?;
        colors.set(esc, Rgb::new(0xff, 0, 0))?;
        let state = KeyboardState {
            key_colors: Some(colors),
            ..Default::default()
        };
        let yaml = Printer::to_yaml(&state, &layout, 148);
        assert_eq!(yaml, "key_colors:\n  - \"ALL:#000000\"\n  - \"KEY_ESC:#ff0000\"\n");
        Ok(())
    }

    #[test]
    fn output_loads_back() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let config: Config = serde_yaml::from_str(indoc! {r##"
            effect: { mode: wave, submode: up, color: "#123456" }
            key_colors: ["ALL_WASD:#00ff00"]
            key_remap: ["KEY_ESC:KEY_LEFTCTRL:KEY_C", "KEY_Q:VOLUME_UP"]
        "##})?;
        let state = config.render(&layout, KeyboardState::default())?;

        let printed: Config = serde_yaml::from_str(&Printer::to_yaml(&state, &layout, 148))?;
        assert_eq!(
            printed.render(&layout, KeyboardState::default())?,
            state,
            "printing and loading keeps every setting"
        );
        Ok(())
    }

    #[test]
    fn unnamed_remap_targets_load_back() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let actions = [
            KeyAction::Scancode {
                code: 0x99,
                modifiers: ModifierSet::empty(),
            },
            KeyAction::chord(0x99, &[Modifier::LeftAlt, Modifier::RightShift])?,
            KeyAction::from_slot([0x03, 0x00, 0x99, 0x01]),
            KeyAction::Raw([0x00, 0x12, 0x04, 0x00]),
        ];
        let mut table = KeyRemapTable::factory(&layout);
        for ((pos, _), action) in layout.keys().zip(actions) {
            table.set(pos, action)?;
        }
        let state = KeyboardState {
            key_remap: Some(table),
            ..Default::default()
        };

        let yaml = Printer::to_yaml(&state, &layout, 0);
        assert!(yaml.contains(":00009900\""), "{yaml}");
        assert!(yaml.contains(":03009901\""), "{yaml}");
        let printed: Config = serde_yaml::from_str(&yaml)?;
        assert_eq!(printed.render(&layout, KeyboardState::default())?, state);
        Ok(())
    }
}
