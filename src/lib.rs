//! Configuration protocol of the YenKee YKB3700 keyboard: backlight effect,
//! per key colors and key remapping, carried in 64 byte HID feature reports.

pub mod codec;
pub mod config;
pub mod consts;
pub mod device;
pub mod error;
pub mod keyboard;
pub mod messages;
pub mod packet;
pub mod parse;
pub mod settings;
pub mod transport;
