use crate::codec::RemapCodec;
use crate::consts::cmd;
use crate::error::Result;
use crate::keyboard::layout::Layout;
use crate::packet::{Packet, PacketSequence};
use crate::settings::KeyRemapTable;

pub struct Messages {}

impl Messages {
    /// Message restoring every setting of the keyboard to its factory state
    ///
    pub fn factory_reset() -> Result<Packet> {
        Packet::command(&[cmd::FACTORY_RESET, 0, 0, 0, 0, 0, 0])
    }

    /// Messages writing the factory key map, leaving lighting untouched
    ///
    /// # Arguments
    /// `layout` - Physical layout the factory table is built from
    ///
    pub fn keymap_reset(layout: &Layout) -> Result<PacketSequence> {
        RemapCodec::new(layout).encode(&KeyRemapTable::factory(layout))
    }
}
