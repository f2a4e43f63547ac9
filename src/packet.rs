//! Fixed size reports and the checksum shared by every command.

use std::fmt;

use itertools::Itertools as _;

use crate::consts::{BULK_HEADER_SIZE, PACKET_SIZE};
use crate::error::{CodecError, Result};

/// Checksum of a command: `(0x100 - ((sum + 1) mod 256)) mod 256`.
///
/// `bytes` are the meaningful bytes of the command, without the checksum
/// byte itself and without the zero padding behind it.
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
    0u8.wrapping_sub(sum.wrapping_add(1))
}

/// One 64 byte HID report.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet([u8; PACKET_SIZE]);

impl Packet {
    /// Builds a packet from `header` followed by `payload`, zero padded.
    pub fn frame(header: &[u8], payload: &[u8]) -> Result<Self> {
        let len = header.len() + payload.len();
        if len > PACKET_SIZE {
            return Err(CodecError::sequence(format!(
                "frame of {len} bytes does not fit into a {PACKET_SIZE} byte packet"
            )));
        }
        let mut buf = [0; PACKET_SIZE];
        buf[..header.len()].copy_from_slice(header);
        buf[header.len()..len].copy_from_slice(payload);
        Ok(Self(buf))
    }

    /// Builds a short command: `bytes`, their checksum, then zero padding.
    pub fn command(bytes: &[u8]) -> Result<Self> {
        Self::frame(bytes, &[checksum(bytes)])
    }

    pub fn as_bytes(&self) -> &[u8; PACKET_SIZE] {
        &self.0
    }

    /// Hex string without separators, the format used by captures.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).join("")
    }
}

impl TryFrom<&[u8]> for Packet {
    type Error = CodecError;

    fn try_from(buf: &[u8]) -> Result<Self> {
        let bytes: [u8; PACKET_SIZE] = buf.try_into().map_err(|_| {
            CodecError::sequence(format!(
                "expected a {PACKET_SIZE} byte packet, got {} bytes",
                buf.len()
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl From<[u8; PACKET_SIZE]> for Packet {
    fn from(bytes: [u8; PACKET_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Packet({})", self.to_hex())
    }
}

/// Ordered packets forming one complete configuration write or read.
///
/// A sequence has to reach the keyboard as a whole, in order, without any
/// packet of another sequence in between.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PacketSequence(Vec<Packet>);

impl PacketSequence {
    pub fn new(packets: Vec<Packet>) -> Self {
        Self(packets)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn packets(&self) -> &[Packet] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Packet> {
        self.0.iter()
    }

    pub(crate) fn expect_len(&self, expected: usize, what: &str) -> Result<()> {
        if self.len() != expected {
            return Err(CodecError::sequence(format!(
                "{what} takes {expected} packets, got {}",
                self.len()
            )));
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a PacketSequence {
    type Item = &'a Packet;
    type IntoIter = std::slice::Iter<'a, Packet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl IntoIterator for PacketSequence {
    type Item = Packet;
    type IntoIter = std::vec::IntoIter<Packet>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl FromIterator<Packet> for PacketSequence {
    fn from_iter<T: IntoIterator<Item = Packet>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Header layout of a multi packet write: `cmd 00 block 01 index 00 00 chk`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulkHeader {
    pub command: u8,
    pub block: u8,
}

impl BulkHeader {
    pub const fn new(command: u8, block: u8) -> Self {
        Self { command, block }
    }

    /// Header of packet `index`, checksum included.
    pub fn bytes(&self, index: u8) -> [u8; BULK_HEADER_SIZE] {
        let mut header = [self.command, 0x00, self.block, 0x01, index, 0x00, 0x00, 0x00];
        header[BULK_HEADER_SIZE - 1] = checksum(&header[..BULK_HEADER_SIZE - 1]);
        header
    }

    /// Checks that `packet` is packet `index` of this kind of write.
    pub fn verify(&self, packet: &Packet, index: usize) -> Result<()> {
        let bytes = packet.as_bytes();
        if bytes[0] != self.command || bytes[2] != self.block {
            return Err(CodecError::sequence(format!(
                "packet {index} is not a 0x{:02x} write (header {:02x?})",
                self.command,
                &bytes[..BULK_HEADER_SIZE]
            )));
        }
        if usize::from(bytes[4]) != index {
            return Err(CodecError::sequence(format!(
                "packet {index} carries sequence index {}",
                bytes[4]
            )));
        }
        let expected = checksum(&bytes[..BULK_HEADER_SIZE - 1]);
        let found = bytes[BULK_HEADER_SIZE - 1];
        if expected != found {
            return Err(CodecError::Checksum {
                packet: index,
                expected,
                found,
            });
        }
        Ok(())
    }

    /// The 56 data bytes behind the header.
    pub fn payload(packet: &Packet) -> &[u8] {
        &packet.as_bytes()[BULK_HEADER_SIZE..]
    }
}
