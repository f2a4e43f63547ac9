mod options;
mod printer;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use itertools::Itertools;
use log::info;
use strum::EnumMessage as _;
use strum::IntoEnumIterator as _;

use yenkey::codec::{KeyColorCodec, RemapCodec};
use yenkey::config::{Config, KeyboardState, Section};
use yenkey::device::Device;
use yenkey::keyboard::layout::{KeyGroup, Layout};
use yenkey::keyboard::{Modifier, ScanCode, SpecialCategory, SpecialKey};
use yenkey::packet::PacketSequence;
use yenkey::settings::{EffectMode, LightingEffect, PresetColor};
use yenkey::transport::{self, HidKeyboard};

use crate::options::{Command, Options};
use crate::printer::Printer;

fn main() -> Result<()> {
    env_logger::init();
    let options = Options::parse();
    let layout = Layout::ykb3700();

    match &options.command {
        Command::ShowKeys => show_keys(&layout),

        Command::Validate => {
            let config = load_config()?;
            let colors = config.color_protocol.codec(&layout)?;
            let state = config
                .render(&layout, KeyboardState::default())
                .context("render settings config")?;
            let _ = state
                .encode(&colors, &RemapCodec::new(&layout))
                .context("encode settings")?;
            println!("config is valid 👌")
        }

        Command::Program { dry_run } => {
            let config = load_config()?;
            let colors = config.color_protocol.codec(&layout)?;
            if *dry_run {
                let state = config
                    .render(&layout, KeyboardState::default())
                    .context("render settings config")?;
                print_packets(&state.encode(&colors, &RemapCodec::new(&layout))?);
                return Ok(());
            }

            let mut device = open_device(&options, &layout, colors)?;
            let current = device
                .read(config.sections())
                .context("read current settings")?;
            let state = config
                .render(&layout, current)
                .context("render settings config")?;
            device.write(&state)?;

            println!("programming finished");
        }

        Command::Effect(command) => {
            let overrides = command.to_config();
            if command.dry_run {
                let effect = overrides.apply(LightingEffect::default())?;
                let state = KeyboardState {
                    effect: Some(effect),
                    ..Default::default()
                };
                let colors = KeyColorCodec::new(&layout);
                print_packets(&state.encode(&colors, &RemapCodec::new(&layout))?);
                return Ok(());
            }

            let mut device = open_device(&options, &layout, KeyColorCodec::new(&layout))?;
            let current = device.read_effect().context("read current effect")?;
            info!("current effect: {current:?}");
            let state = KeyboardState {
                effect: Some(overrides.apply(current)?),
                ..Default::default()
            };
            device.write(&state)?;
        }

        Command::Read { what } => {
            let colors = KeyColorCodec::new(&layout);
            let readable = colors.readable_positions();
            let mut device = open_device(&options, &layout, colors)?;
            let state = device.read(what.sections())?;
            print!("{}", Printer::to_yaml(&state, &layout, readable));
        }

        Command::FactoryReset => {
            let mut device = open_device(&options, &layout, KeyColorCodec::new(&layout))?;
            device.factory_reset()?;
            println!("factory settings restored");
        }

        Command::KeymapReset => {
            let mut device = open_device(&options, &layout, KeyColorCodec::new(&layout))?;
            device.keymap_reset()?;
            println!("factory key map restored");
        }
    }

    Ok(())
}

fn load_config() -> Result<Config> {
    serde_yaml::from_reader(std::io::stdin().lock()).context("load settings config")
}

fn open_device<'a>(
    options: &Options,
    layout: &'a Layout,
    colors: KeyColorCodec<'a>,
) -> Result<Device<'a, HidKeyboard>> {
    let devel = &options.devel_options;
    let keyboard = transport::open(
        devel.vendor_id,
        devel.product_id,
        devel.address,
        devel.interface_number,
    )?;
    Ok(Device::new(keyboard, colors, RemapCodec::new(layout)))
}

fn print_packets(sequences: &[(Section, PacketSequence)]) {
    for (section, packets) in sequences {
        println!("{section}:");
        for packet in packets {
            println!("  {}", packet.to_hex());
        }
    }
}

fn show_keys(layout: &Layout) {
    println!("Modifiers: ");
    for m in Modifier::iter() {
        println!(" - {}", m.get_serializations().iter().join(" / "));
    }

    println!();
    println!("Keys:");
    for (pos, key) in layout.keys() {
        println!(" - {key} (position {pos})");
    }

    println!();
    println!("Scan codes:");
    for c in ScanCode::iter() {
        println!(" - {c} (0x{:02x})", c.code());
    }

    println!();
    println!("Key groups:");
    for g in KeyGroup::iter() {
        println!(" - {g}");
    }

    println!();
    println!("Special functions:");
    for category in SpecialCategory::iter() {
        println!(" {category}:");
        for k in SpecialKey::iter().filter(|k| k.category() == category) {
            let code = k.code().iter().map(|b| format!("{b:02x}")).join("");
            println!("  - {k} ({code})");
        }
    }

    println!();
    println!("Remap targets: disable, KEY_FN, a key, a special function,");
    println!("up to two modifiers in front (KEY_LEFTALT:KEY_F1), or 8 hex digits");

    println!();
    println!("Effect modes:");
    for mode in EffectMode::iter() {
        let submodes = mode.submodes();
        if submodes.is_empty() {
            println!(" - {mode}");
        } else {
            println!(" - {mode} ({})", submodes.join(" / "));
        }
    }

    println!();
    println!("Preset colors:");
    for color in PresetColor::iter() {
        println!(" - {color}");
    }
}
