use std::thread;
use std::time::Duration;

use anyhow::{anyhow, ensure, Context as _, Result};
use indoc::indoc;
use itertools::Itertools as _;
use log::{debug, info};
use rusb::{Context, Device, DeviceDescriptor, DeviceHandle, UsbContext as _};

use crate::consts::{self, hid, PACKET_DELAY, PACKET_SIZE, SETTLE_DELAY};
use crate::packet::{Packet, PacketSequence};

/// Moves reports between the host and the keyboard.
pub trait Transport {
    /// Sends one report to the keyboard (HID SET_REPORT).
    fn set_report(&mut self, packet: &Packet) -> Result<()>;

    /// Fetches one report from the keyboard (HID GET_REPORT).
    fn get_report(&mut self, report_id: u8) -> Result<Packet>;

    /// Pause between two reports of a sequence.
    fn packet_delay(&self) -> Duration {
        PACKET_DELAY
    }

    /// Pause between two different configuration types.
    fn settle_delay(&self) -> Duration {
        SETTLE_DELAY
    }

    /// Sends a whole sequence in order.
    fn send_sequence(&mut self, packets: &PacketSequence) -> Result<()> {
        for (i, packet) in packets.iter().enumerate() {
            debug!("packet {}/{}: {:02x?}", i + 1, packets.len(), packet.as_bytes());
            self.set_report(packet)
                .with_context(|| format!("send packet {}/{}", i + 1, packets.len()))?;
            thread::sleep(self.packet_delay());
        }
        Ok(())
    }

    /// Sends each query and collects the answer to it.
    fn query(&mut self, queries: &PacketSequence) -> Result<PacketSequence> {
        let mut responses = Vec::with_capacity(queries.len());
        for (i, query) in queries.iter().enumerate() {
            self.set_report(query)
                .with_context(|| format!("send query {}/{}", i + 1, queries.len()))?;
            thread::sleep(self.packet_delay());
            let response = self
                .get_report(0)
                .with_context(|| format!("read response {}/{}", i + 1, queries.len()))?;
            debug!("response {}/{}: {:02x?}", i + 1, queries.len(), response.as_bytes());
            responses.push(response);
        }
        Ok(PacketSequence::new(responses))
    }
}

/// The keyboard's vendor interface, driven with control transfers.
pub struct HidKeyboard {
    handle: DeviceHandle<Context>,
    interface: u8,
}

impl HidKeyboard {
    pub fn new(handle: DeviceHandle<Context>, interface: u8) -> Self {
        Self { handle, interface }
    }
}

impl Transport for HidKeyboard {
    fn set_report(&mut self, packet: &Packet) -> Result<()> {
        let written = self.handle.write_control(
            hid::REQUEST_TYPE_OUT,
            hid::SET_REPORT,
            hid::FEATURE_REPORT,
            self.interface.into(),
            packet.as_bytes(),
            consts::TIMEOUT,
        )?;
        ensure!(written == PACKET_SIZE, "not all data written");
        Ok(())
    }

    fn get_report(&mut self, report_id: u8) -> Result<Packet> {
        let mut buf = [0u8; PACKET_SIZE];
        let read = self.handle.read_control(
            hid::REQUEST_TYPE_IN,
            hid::GET_REPORT,
            hid::FEATURE_REPORT | u16::from(report_id),
            self.interface.into(),
            &mut buf,
            consts::TIMEOUT,
        )?;
        Ok(Packet::try_from(&buf[..read])?)
    }
}

impl Drop for HidKeyboard {
    fn drop(&mut self) {
        let _ = self.handle.release_interface(self.interface);
    }
}

/// Opens the keyboard and claims its vendor interface. The kernel driver is
/// detached while the interface is claimed and attached again on release.
pub fn open(vid: u16, pid: u16, address: Option<(u8, u8)>, interface: u8) -> Result<HidKeyboard> {
    let (device, desc) = find_device(vid, pid, address).context("find USB device")?;
    ensure!(
        desc.num_configurations() == 1,
        "only one device configuration is expected"
    );

    let mut handle = device.open().context("open USB device")?;
    let _ = handle.set_auto_detach_kernel_driver(true);
    handle
        .claim_interface(interface)
        .context("claim interface")?;
    info!(
        "opened {:04x}:{:04x} at {}:{}, interface {interface}",
        vid,
        pid,
        device.bus_number(),
        device.address()
    );
    Ok(HidKeyboard::new(handle, interface))
}

pub fn find_device(
    vid: u16,
    pid: u16,
    address: Option<(u8, u8)>,
) -> Result<(Device<Context>, DeviceDescriptor)> {
    let options = vec![
        #[cfg(windows)]
        rusb::UsbOption::use_usbdk(),
    ];
    let usb_context = rusb::Context::with_options(&options)?;

    let mut found = vec![];
    for device in usb_context.devices().context("get USB device list")?.iter() {
        let desc = device.device_descriptor().context("get USB device info")?;
        debug!(
            "Bus {:03} Device {:03} ID {:04x}:{:04x}",
            device.bus_number(),
            device.address(),
            desc.vendor_id(),
            desc.product_id()
        );
        if desc.vendor_id() != vid || desc.product_id() != pid {
            continue;
        }
        if let Some((bus, addr)) = address {
            if device.bus_number() != bus || device.address() != addr {
                continue;
            }
        }
        found.push((device, desc));
    }

    match found.len() {
        0 => Err(anyhow!(
            "keyboard not found. Use --vendor-id and --product-id to override defaults"
        )),
        1 => found.pop().ok_or_else(|| anyhow!("keyboard not found")),
        _ => Err(anyhow!(
            indoc! {"
                Several compatible keyboards are found.
                Unfortunately, this model of keyboard doesn't have serial number.
                So specify USB address using --address option.

                Addresses:
                {}
            "},
            found
                .iter()
                .map(|(device, _)| format!("{}:{}", device.bus_number(), device.address()))
                .join("\n")
        )),
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;

    use std::cell::Cell;
    use std::collections::VecDeque;

    /// Records sent reports and answers GET_REPORT from a queue. Delays are
    /// zero; `settles` counts how often the settle delay was asked for.
    #[derive(Default)]
    pub struct MockTransport {
        pub sent: Vec<Packet>,
        pub responses: VecDeque<Packet>,
        pub settles: Cell<usize>,
    }

    impl Transport for MockTransport {
        fn set_report(&mut self, packet: &Packet) -> Result<()> {
            self.sent.push(*packet);
            Ok(())
        }

        fn get_report(&mut self, _report_id: u8) -> Result<Packet> {
            self.responses
                .pop_front()
                .ok_or_else(|| anyhow!("no response queued"))
        }

        fn packet_delay(&self) -> Duration {
            Duration::ZERO
        }

        fn settle_delay(&self) -> Duration {
            self.settles.set(self.settles.get() + 1);
            Duration::ZERO
        }
    }
}
