use log::debug;

use crate::consts::{cmd, REMAP_POSITIONS, REMAP_READ_PACKETS, REMAP_WRITE_PACKETS};
use crate::error::Result;
use crate::keyboard::layout::Layout;
use crate::keyboard::KeyAction;
use crate::packet::{BulkHeader, Packet, PacketSequence};
use crate::settings::KeyRemapTable;

const SLOT_SIZE: usize = 4;

/// Slots in one write packet
const WRITE_SLOTS: usize = 14;

const HEADER: BulkHeader = BulkHeader::new(cmd::SET_KEYMAP, cmd::KEYMAP_BLOCK);

/// Packs the key remap table, four bytes per position.
#[derive(Debug, Clone, Copy)]
pub struct RemapCodec<'a> {
    layout: &'a Layout,
}

impl<'a> RemapCodec<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &'a Layout {
        self.layout
    }

    pub fn encode(&self, table: &KeyRemapTable) -> Result<PacketSequence> {
        let mut data = Vec::with_capacity(REMAP_WRITE_PACKETS * WRITE_SLOTS * SLOT_SIZE);
        for (pos, action) in table.actions().iter().enumerate() {
            let slot = if self.layout.is_reserved(pos) {
                KeyAction::Disabled.to_slot()?
            } else {
                action.to_slot()?
            };
            data.extend_from_slice(&slot);
        }
        data.resize(REMAP_WRITE_PACKETS * WRITE_SLOTS * SLOT_SIZE, 0);

        let packets = data
            .chunks(WRITE_SLOTS * SLOT_SIZE)
            .enumerate()
            .map(|(i, payload)| Packet::frame(&HEADER.bytes(i as u8), payload))
            .collect::<Result<PacketSequence>>()?;
        for packet in &packets {
            debug!("remap packet: {:02x?}", packet.as_bytes());
        }
        Ok(packets)
    }

    /// Reads back a sequence produced by [`RemapCodec::encode`] (or a capture
    /// of the vendor tool).
    pub fn parse_written(&self, packets: &PacketSequence) -> Result<KeyRemapTable> {
        packets.expect_len(REMAP_WRITE_PACKETS, "a remap write")?;
        let mut data = Vec::new();
        for (i, packet) in packets.iter().enumerate() {
            HEADER.verify(packet, i)?;
            data.extend_from_slice(BulkHeader::payload(packet));
        }
        Self::to_table(&data)
    }

    /// Decodes the answers to [`RemapCodec::read_queries`].
    ///
    /// Responses carry no header, 16 slots each; the last one ends in 8
    /// bytes of padding.
    pub fn decode(&self, responses: &PacketSequence) -> Result<KeyRemapTable> {
        responses.expect_len(REMAP_READ_PACKETS, "a remap read")?;
        let data: Vec<u8> = responses
            .iter()
            .flat_map(|packet| packet.as_bytes().iter().copied())
            .collect();
        Self::to_table(&data)
    }

    pub fn read_queries(&self) -> Result<PacketSequence> {
        (0..REMAP_READ_PACKETS)
            .map(|i| Packet::command(&[cmd::GET_KEYMAP, 0x00, i as u8, 0, 0, 0, 0]))
            .collect()
    }

    fn to_table(data: &[u8]) -> Result<KeyRemapTable> {
        let actions: Vec<KeyAction> = data
            .chunks_exact(SLOT_SIZE)
            .take(REMAP_POSITIONS)
            .map(|s| KeyAction::from_slot([s[0], s[1], s[2], s[3]]))
            .collect();
        KeyRemapTable::from_actions(&actions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::test_util::sequence;
    use crate::error::CodecError;
    use crate::keyboard::{Modifier, ScanCode, SpecialKey};

    use itertools::Itertools as _;

    const RESET_KEYMAP: [&str; 9] = [
        "0900f801000000fd000029000000350000002b00000039000000e1000000e0000000000000001e000000140000000400000064000000000000003a0000001f00",
        "0900f801010000fc00001a000000160000001d000000e30000003b0000002000000008000000070000001b000000e20000003c00000021000000150000000900",
        "0900f801020000fb000006000000000000003d00000022000000170000000a00000019000000000000003e000000230000001c0000000b000000050000002c00",
        "0900f801030000fa00003f00000024000000180000000d00000011000000e600000040000000250000000c0000000e00000010000a0100000000410000002600",
        "0900f801040000f90000120000000f00000036000000e4000000420000002700000013000000330000003700000050000000430000002d0000002f0000003400",
        "0900f801050000f800003800000051000000440000002e0000003000000032000000e50000004f000000450000002a0000003100000028000000520000004900",
        "0900f801060000f70000460000004a0000004d0000004b0000004e0000004c000000000000000000000000000000000000000000000000000000000000000000",
        "0900f801070000f60000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
        "0900f801080000f50000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000",
    ];

    fn hex(packets: &PacketSequence) -> Vec<String> {
        packets.iter().map(Packet::to_hex).collect()
    }

    #[test]
    fn factory_table_matches_capture() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let codec = RemapCodec::new(&layout);
        let packets = codec.encode(&KeyRemapTable::factory(&layout))?;
        assert_eq!(hex(&packets), RESET_KEYMAP);
        Ok(())
    }

    #[test]
    fn disable_caps_lock() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let codec = RemapCodec::new(&layout);
        let mut table = KeyRemapTable::factory(&layout);
        table.set(3, KeyAction::Disabled)?;

        let mut expected = RESET_KEYMAP.map(str::to_owned);
        expected[0] = expected[0].replacen("00003900", "00000000", 1);
        assert_eq!(hex(&codec.encode(&table)?), expected);
        Ok(())
    }

    #[test]
    fn esc_to_alt_f1() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let codec = RemapCodec::new(&layout);
        let mut table = KeyRemapTable::factory(&layout);
        table.set(0, "KEY_LEFTALT:KEY_F1".parse()?)?;

        let mut expected = RESET_KEYMAP.map(str::to_owned);
        expected[0] = expected[0].replacen("00002900", "00e23a00", 1);
        let packets = codec.encode(&table)?;
        assert_eq!(hex(&packets), expected);

        assert_eq!(codec.parse_written(&packets)?, table);
        Ok(())
    }

    #[test]
    fn capture_round_trip() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let codec = RemapCodec::new(&layout);
        let table = codec.parse_written(&sequence(&RESET_KEYMAP))?;
        assert_eq!(table, KeyRemapTable::factory(&layout));
        Ok(())
    }

    #[test]
    fn every_kind_of_action_round_trips() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let codec = RemapCodec::new(&layout);
        let mut table = KeyRemapTable::factory(&layout);
        table.set(1, KeyAction::chord(ScanCode::C.code(), &[Modifier::LeftCtrl])?)?;
        table.set(
            2,
            KeyAction::chord(
                ScanCode::T.code(),
                &[Modifier::RightShift, Modifier::LeftMeta],
            )?,
        )?;
        table.set(3, KeyAction::Special(SpecialKey::VolumeUp.into()))?;
        table.set(4, KeyAction::Raw([0x05, 0x01, 0x02, 0x03]))?;
        table.set(5, KeyAction::FnToggle)?;
        table.set(53, KeyAction::key(ScanCode::RightMeta))?;

        assert_eq!(codec.parse_written(&codec.encode(&table)?)?, table);
        Ok(())
    }

    #[test]
    fn reserved_positions_are_disabled() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let codec = RemapCodec::new(&layout);
        let mut table = KeyRemapTable::factory(&layout);
        table.set(6, KeyAction::key(ScanCode::A))?;
        table.set(120, KeyAction::key(ScanCode::A))?;
        assert_eq!(hex(&codec.encode(&table)?), RESET_KEYMAP);
        Ok(())
    }

    #[test]
    fn invalid_action_is_rejected() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let codec = RemapCodec::new(&layout);
        let mut table = KeyRemapTable::factory(&layout);
        table.set(
            0,
            KeyAction::Scancode {
                code: ScanCode::A.code(),
                modifiers: Modifier::LeftCtrl | Modifier::LeftAlt | Modifier::LeftShift,
            },
        )?;
        assert!(matches!(codec.encode(&table), Err(CodecError::Validation(_))));
        Ok(())
    }

    #[test]
    fn read_back() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let codec = RemapCodec::new(&layout);
        let factory = KeyRemapTable::factory(&layout);

        // what the keyboard answers: 16 slots per response, no header
        let slots = factory
            .actions()
            .iter()
            .map(|a| a.to_slot().map(|s| s.iter().map(|b| format!("{b:02x}")).join("")))
            .collect::<crate::error::Result<Vec<_>>>()?;
        let mut responses = slots.chunks(16).map(|c| c.concat()).collect_vec();
        // padding behind the last slot is ignored
        responses[7].push_str("ffffffffffffffff");
        assert_eq!(responses.len(), 8);

        let refs = responses.iter().map(String::as_str).collect_vec();
        assert_eq!(codec.decode(&sequence(&refs))?, factory);
        Ok(())
    }

    #[test]
    fn read_queries_bytes() -> anyhow::Result<()> {
        let layout = Layout::ykb3700();
        let queries = RemapCodec::new(&layout).read_queries()?;
        assert_eq!(queries.len(), 8);
        assert_eq!(&queries.packets()[0].to_hex()[..16], "8900000000000076");
        assert_eq!(&queries.packets()[7].to_hex()[..16], "890007000000006f");
        Ok(())
    }

    #[test]
    fn wrong_packet_count() {
        let layout = Layout::ykb3700();
        let codec = RemapCodec::new(&layout);
        assert!(matches!(
            codec.parse_written(&sequence(&RESET_KEYMAP[..8])),
            Err(CodecError::Sequence(_))
        ));
        assert!(matches!(
            codec.decode(&sequence(&RESET_KEYMAP)),
            Err(CodecError::Sequence(_))
        ));
    }
}
