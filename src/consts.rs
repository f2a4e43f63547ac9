use std::time::Duration;

pub const VENDOR_ID: u16 = 0x3151;
pub const PRODUCT_ID: u16 = 0x4002;

/// HID interface carrying the vendor feature reports
///
pub const INTERFACE: u8 = 1;

/// Timeout for a single control transfer
///
pub const TIMEOUT: Duration = Duration::from_millis(1000);

/// Pause between two packets of the same sequence
///
pub const PACKET_DELAY: Duration = Duration::from_millis(100);

/// Pause between two different configuration types (effect, key colors,
/// key remap); the firmware resets its state machine in between
///
pub const SETTLE_DELAY: Duration = Duration::from_millis(1000);

/// Size of every report exchanged with the keyboard (in bytes)
///
pub const PACKET_SIZE: usize = 64;

/// Size of the header in front of a bulk (color / remap) write packet
///
pub const BULK_HEADER_SIZE: usize = 8;

/// Payload carried by one bulk write packet
///
pub const BULK_PAYLOAD_SIZE: usize = PACKET_SIZE - BULK_HEADER_SIZE;

/// Number of positions in the per-key color matrix
///
pub const COLOR_POSITIONS: usize = 148;

/// Number of positions in the key remap table
///
pub const REMAP_POSITIONS: usize = 126;

/// Number of packets in a color matrix write
///
pub const COLOR_WRITE_PACKETS: usize = 7;

/// Number of queries in a color matrix read
///
pub const COLOR_READ_PACKETS: usize = 6;

/// Number of packets in a key remap write
///
pub const REMAP_WRITE_PACKETS: usize = 9;

/// Number of queries in a key remap read
///
pub const REMAP_READ_PACKETS: usize = 8;

/// Highest brightness level accepted by the effect command
///
pub const MAX_BRIGHTNESS: u8 = 4;

/// Maximum number of modifiers a single remapped key can carry
///
pub const MAX_MODIFIERS: usize = 2;

/// Command bytes
pub mod cmd {
    pub const FACTORY_RESET: u8 = 0x02;
    pub const SET_EFFECT: u8 = 0x07;
    pub const SET_KEYMAP: u8 = 0x09;
    pub const SET_KEY_COLORS: u8 = 0x0c;
    pub const GET_EFFECT: u8 = 0x87;
    pub const GET_KEYMAP: u8 = 0x89;
    pub const GET_KEY_COLORS: u8 = 0x8c;

    /// Second header byte of a bulk write, tied to the command
    pub const KEYMAP_BLOCK: u8 = 0xf8;
    pub const KEY_COLORS_BLOCK: u8 = 0x80;
}

/// USB HID class requests
pub mod hid {
    pub const REQUEST_TYPE_OUT: u8 = 0x21;
    pub const REQUEST_TYPE_IN: u8 = 0xa1;
    pub const GET_REPORT: u8 = 0x01;
    pub const SET_REPORT: u8 = 0x09;
    /// Report type "feature" in the high byte of wValue
    pub const FEATURE_REPORT: u16 = 0x0300;
}
