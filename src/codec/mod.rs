//! Conversions between settings and the packets carrying them.

pub mod effect;
pub mod key_color;
pub mod remap;

pub use effect::EffectCodec;
pub use key_color::{KeyColorCodec, ReadSlices};
pub use remap::RemapCodec;

#[cfg(test)]
pub(crate) mod test_util {
    use crate::packet::{Packet, PacketSequence};

    /// Packet from a hex capture, zero padded to full size.
    pub fn packet(hex: &str) -> Packet {
        let mut bytes = [0u8; 64];
        for (i, b) in bytes.iter_mut().enumerate().take(hex.len() / 2) {
            *b = u8::from_str_radix(&hex[2 * i..2 * i + 2], 16).unwrap();
        }
        bytes.into()
    }

    pub fn sequence(hex: &[&str]) -> PacketSequence {
        hex.iter().map(|h| packet(h)).collect()
    }
}
