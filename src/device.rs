use std::thread;

use anyhow::{anyhow, Context as _, Result};
use enumset::EnumSet;
use log::info;

use crate::codec::{EffectCodec, KeyColorCodec, RemapCodec};
use crate::config::{KeyboardState, Section};
use crate::messages::Messages;
use crate::packet::PacketSequence;
use crate::settings::{KeyColorMap, KeyRemapTable, LightingEffect};
use crate::transport::Transport;

/// A keyboard session: reads and writes whole configuration types over a
/// [`Transport`], one at a time.
pub struct Device<'a, T> {
    transport: T,
    colors: KeyColorCodec<'a>,
    remap: RemapCodec<'a>,
    last: Option<Step>,
}

/// What the keyboard was last asked to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Section(Section),
    FactoryReset,
}

impl<'a, T: Transport> Device<'a, T> {
    pub fn new(transport: T, colors: KeyColorCodec<'a>, remap: RemapCodec<'a>) -> Self {
        Self {
            transport,
            colors,
            remap,
            last: None,
        }
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Waits when switching to another configuration type, and after a
    /// factory reset.
    fn settle(&mut self, step: Step) {
        if self.last.is_some_and(|last| last != step || last == Step::FactoryReset) {
            thread::sleep(self.transport.settle_delay());
        }
        self.last = Some(step);
    }

    pub fn read_effect(&mut self) -> Result<LightingEffect> {
        self.settle(Step::Section(Section::Effect));
        let query = PacketSequence::new(vec![EffectCodec.read_query()?]);
        let responses = self.transport.query(&query)?;
        let response = responses
            .packets()
            .first()
            .ok_or_else(|| anyhow!("no effect response"))?;
        Ok(EffectCodec.decode(response).context("decode effect")?)
    }

    pub fn read_key_colors(&mut self) -> Result<KeyColorMap> {
        self.settle(Step::Section(Section::KeyColors));
        let responses = self.transport.query(&self.colors.read_queries()?)?;
        Ok(self.colors.decode(&responses).context("decode key colors")?)
    }

    pub fn read_key_remap(&mut self) -> Result<KeyRemapTable> {
        self.settle(Step::Section(Section::KeyRemap));
        let responses = self.transport.query(&self.remap.read_queries()?)?;
        Ok(self.remap.decode(&responses).context("decode key remap")?)
    }

    /// Reads the current value of each of `sections`.
    pub fn read(&mut self, sections: EnumSet<Section>) -> Result<KeyboardState> {
        let mut state = KeyboardState::default();
        for section in sections {
            info!("reading {section}");
            match section {
                Section::Effect => state.effect = Some(self.read_effect()?),
                Section::KeyColors => state.key_colors = Some(self.read_key_colors()?),
                Section::KeyRemap => state.key_remap = Some(self.read_key_remap()?),
            }
        }
        Ok(state)
    }

    /// Writes every section present in `state`.
    pub fn write(&mut self, state: &KeyboardState) -> Result<()> {
        for (section, packets) in state.encode(&self.colors, &self.remap)? {
            self.settle(Step::Section(section));
            info!("writing {section} ({} packets)", packets.len());
            self.transport
                .send_sequence(&packets)
                .with_context(|| format!("write {section}"))?;
        }
        Ok(())
    }

    pub fn factory_reset(&mut self) -> Result<()> {
        self.settle(Step::FactoryReset);
        let packets = PacketSequence::new(vec![Messages::factory_reset()?]);
        self.transport.send_sequence(&packets).context("factory reset")
    }

    pub fn keymap_reset(&mut self) -> Result<()> {
        self.settle(Step::Section(Section::KeyRemap));
        let packets = Messages::keymap_reset(self.remap.layout())?;
        self.transport.send_sequence(&packets).context("keymap reset")
    }
}
