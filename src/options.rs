use std::num::ParseIntError;

use clap::{Args, Parser, Subcommand, ValueEnum};
use enumset::EnumSet;

use yenkey::config::{EffectConfig, Section};
use yenkey::consts::{INTERFACE, PRODUCT_ID, VENDOR_ID};
use yenkey::error::CodecError;
use yenkey::parse;
use yenkey::settings::{ColorSource, EffectMode};

#[derive(Parser)]
#[command(version, about)]
pub struct Options {
    #[command(subcommand)]
    pub command: Command,

    #[clap(flatten)]
    pub devel_options: DevelOptions,
}

#[derive(Args, Debug)]
#[clap(hide(true), next_help_heading = "Internal options (use with caution)")]
pub struct DevelOptions {
    #[arg(long, default_value_t=VENDOR_ID, value_parser=hex_or_decimal, hide=true)]
    pub vendor_id: u16,

    #[arg(long, default_value_t=PRODUCT_ID, value_parser=hex_or_decimal, hide=true)]
    pub product_id: u16,

    #[arg(long, value_parser=parse_address, hide=true)]
    pub address: Option<(u8, u8)>,

    #[arg(long, default_value_t=INTERFACE, hide=true)]
    pub interface_number: u8,
}

pub fn hex_or_decimal(s: &str) -> Result<u16, ParseIntError> {
    if s.to_ascii_lowercase().starts_with("0x") {
        u16::from_str_radix(&s[2..], 16)
    } else {
        s.parse()
    }
}

fn parse_address(s: &str) -> Result<(u8, u8), CodecError> {
    parse::from_str(parse::address, s)
}

#[derive(Subcommand)]
pub enum Command {
    /// Show supported keys, modes, colors and special functions
    ShowKeys,

    /// Validate settings config on stdin
    Validate,

    /// Program settings from stdin to device
    Program {
        /// Print the packets instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Change the backlight effect, keeping unspecified values
    Effect(EffectCommand),

    /// Read settings from device and print them as config
    Read {
        #[arg(value_enum, default_value_t = ReadTarget::All)]
        what: ReadTarget,
    },

    /// Restore every setting of the device to factory state
    FactoryReset,

    /// Restore the factory key map
    KeymapReset,
}

#[derive(Parser)]
pub struct EffectCommand {
    #[arg(long)]
    pub mode: Option<EffectMode>,

    /// Submode name, see show-keys
    #[arg(long)]
    pub submode: Option<String>,

    #[arg(long)]
    pub speed: Option<u8>,

    /// 0 (off) to 4
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=4))]
    pub brightness: Option<u8>,

    /// Preset name or RRGGBB
    #[arg(long)]
    pub color: Option<ColorSource>,

    /// Print the packet instead of sending it
    #[arg(long)]
    pub dry_run: bool,
}

impl EffectCommand {
    pub fn to_config(&self) -> EffectConfig {
        EffectConfig {
            mode: self.mode,
            submode: self.submode.clone(),
            speed: self.speed,
            brightness: self.brightness,
            color: self.color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReadTarget {
    Backlight,
    Colors,
    Remap,
    All,
}

impl ReadTarget {
    pub fn sections(self) -> EnumSet<Section> {
        match self {
            ReadTarget::Backlight => Section::Effect.into(),
            ReadTarget::Colors => Section::KeyColors.into(),
            ReadTarget::Remap => Section::KeyRemap.into(),
            ReadTarget::All => EnumSet::all(),
        }
    }
}
