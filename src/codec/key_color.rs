use itertools::Itertools as _;
use log::debug;

use crate::consts::{
    cmd, BULK_PAYLOAD_SIZE, COLOR_POSITIONS, COLOR_READ_PACKETS, COLOR_WRITE_PACKETS,
    PACKET_SIZE,
};
use crate::error::{CodecError, Result};
use crate::keyboard::layout::Layout;
use crate::keyboard::Rgb;
use crate::packet::{BulkHeader, Packet, PacketSequence};
use crate::settings::KeyColorMap;

/// Bytes of the whole color matrix
const MATRIX_SIZE: usize = COLOR_POSITIONS * 3;

const HEADER: BulkHeader = BulkHeader::new(cmd::SET_KEY_COLORS, cmd::KEY_COLORS_BLOCK);

/// How many bytes of each read response belong to the color matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadSlices(Vec<usize>);

impl ReadSlices {
    pub fn new(slices: Vec<usize>) -> Result<Self> {
        if slices.is_empty() {
            return Err(CodecError::validation("no read slices given"));
        }
        if let Some(size) = slices.iter().find(|s| **s > PACKET_SIZE) {
            return Err(CodecError::validation(format!(
                "read slice of {size} bytes is larger than a packet"
            )));
        }
        let total: usize = slices.iter().sum();
        if total > MATRIX_SIZE || total % 3 != 0 {
            return Err(CodecError::validation(format!(
                "read slices cover {total} bytes, need a multiple of 3 up to {MATRIX_SIZE}"
            )));
        }
        Ok(Self(slices))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

impl Default for ReadSlices {
    /// Whole responses, which covers positions 0..128.
    fn default() -> Self {
        Self(vec![PACKET_SIZE; COLOR_READ_PACKETS])
    }
}

/// Packs the per key color matrix.
///
/// A write is a flat stream of RGB triples cut into 56 byte windows, so a
/// color can start in one packet and end in the next.
#[derive(Debug, Clone)]
pub struct KeyColorCodec<'a> {
    layout: &'a Layout,
    write_packets: usize,
    read_slices: ReadSlices,
}

impl<'a> KeyColorCodec<'a> {
    pub fn new(layout: &'a Layout) -> Self {
        Self {
            layout,
            write_packets: COLOR_WRITE_PACKETS,
            read_slices: ReadSlices::default(),
        }
    }

    /// Number of packets of a write; the firmware needs
    /// [`COLOR_WRITE_PACKETS`].
    pub fn with_write_packets(mut self, packets: usize) -> Result<Self> {
        let max = MATRIX_SIZE.div_ceil(BULK_PAYLOAD_SIZE);
        if !(1..=max).contains(&packets) {
            return Err(CodecError::validation(format!(
                "a color write takes 1 to {max} packets, got {packets}"
            )));
        }
        self.write_packets = packets;
        Ok(self)
    }

    pub fn with_read_slices(mut self, slices: ReadSlices) -> Self {
        self.read_slices = slices;
        self
    }

    fn window_size(&self) -> usize {
        (self.write_packets * BULK_PAYLOAD_SIZE).min(MATRIX_SIZE)
    }

    /// Highest position plus one that fits into a write.
    pub fn writable_positions(&self) -> usize {
        self.window_size() / 3
    }

    /// Highest position plus one covered by a read.
    pub fn readable_positions(&self) -> usize {
        self.read_slices.total() / 3
    }

    pub fn encode(&self, colors: &KeyColorMap) -> Result<PacketSequence> {
        let window = self.window_size();
        let mut stream = [0u8; MATRIX_SIZE];
        for (pos, color) in colors.colors().iter().enumerate() {
            if self.layout.is_reserved(pos) || color.is_black() {
                continue;
            }
            if (pos + 1) * 3 > window {
                return Err(CodecError::validation(format!(
                    "position {pos} ({color}) is beyond the {window} bytes of a color write"
                )));
            }
            stream[pos * 3..pos * 3 + 3].copy_from_slice(&color.bytes());
        }

        let packets = stream[..window]
            .chunks(BULK_PAYLOAD_SIZE)
            .enumerate()
            .map(|(i, payload)| Packet::frame(&HEADER.bytes(i as u8), payload))
            .collect::<Result<PacketSequence>>()?;
        for packet in &packets {
            debug!("color packet: {:02x?}", packet.as_bytes());
        }
        Ok(packets)
    }

    /// Reads back a sequence produced by [`KeyColorCodec::encode`] (or a
    /// capture of the vendor tool).
    pub fn parse_written(&self, packets: &PacketSequence) -> Result<KeyColorMap> {
        packets.expect_len(self.write_packets, "a color write")?;
        let mut data = Vec::with_capacity(self.window_size());
        for (i, packet) in packets.iter().enumerate() {
            HEADER.verify(packet, i)?;
            data.extend_from_slice(BulkHeader::payload(packet));
        }
        data.truncate(self.window_size());
        Self::to_map(&data)
    }

    /// Decodes the answers to [`KeyColorCodec::read_queries`].
    pub fn decode(&self, responses: &PacketSequence) -> Result<KeyColorMap> {
        responses.expect_len(self.read_slices.len(), "a color read")?;
        let data = responses
            .iter()
            .zip(self.read_slices.0.iter())
            .flat_map(|(packet, size)| packet.as_bytes()[..*size].iter().copied())
            .collect_vec();
        Self::to_map(&data)
    }

    pub fn read_queries(&self) -> Result<PacketSequence> {
        (0..self.read_slices.len())
            .map(|i| Packet::command(&[cmd::GET_KEY_COLORS, 0x00, i as u8, 0, 0, 0, 0]))
            .collect()
    }

    /// Positions past the end of `data` are black.
    fn to_map(data: &[u8]) -> Result<KeyColorMap> {
        let mut map = KeyColorMap::default();
        for (pos, rgb) in data.chunks_exact(3).enumerate() {
            map.set(pos, Rgb::from_bytes([rgb[0], rgb[1], rgb[2]]))?;
        }
        Ok(map)
    }
}
