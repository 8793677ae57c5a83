//! In-memory stand-ins for the hardware capabilities.

use std::collections::{HashMap, VecDeque};

use super::{InterruptTableLoader, PortIo, TextMemory};
use crate::interrupts::TableDescriptor;
use crate::vga_buffer::BUFFER_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortAccess {
    Read(u16),
    Write(u16, u8),
}

/// Records every port access in order.
///
/// Reads return the next scripted value for that port, then the port's
/// default, then zero.
#[derive(Debug, Default)]
pub struct FakePorts {
    pub log: Vec<PortAccess>,
    scripted: HashMap<u16, VecDeque<u8>>,
    defaults: HashMap<u16, u8>,
}

impl FakePorts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&mut self, port: u16, values: &[u8]) -> &mut Self {
        self.scripted
            .entry(port)
            .or_default()
            .extend(values.iter().copied());
        self
    }

    pub fn set_default(&mut self, port: u16, value: u8) -> &mut Self {
        self.defaults.insert(port, value);
        self
    }

    pub fn writes_to(&self, port: u16) -> Vec<u8> {
        self.log
            .iter()
            .filter_map(|access| match *access {
                PortAccess::Write(p, value) if p == port => Some(value),
                _ => None,
            })
            .collect()
    }

    pub fn reads_of(&self, port: u16) -> usize {
        self.log
            .iter()
            .filter(|access| **access == PortAccess::Read(port))
            .count()
    }

    /// All writes, in order, that touched one of `ports`.
    pub fn writes_among(&self, ports: &[u16]) -> Vec<(u16, u8)> {
        self.log
            .iter()
            .filter_map(|access| match *access {
                PortAccess::Write(p, value) if ports.contains(&p) => Some((p, value)),
                _ => None,
            })
            .collect()
    }

    pub fn clear_log(&mut self) {
        self.log.clear();
    }
}

impl PortIo for FakePorts {
    fn read_u8(&mut self, port: u16) -> u8 {
        self.log.push(PortAccess::Read(port));
        self.scripted
            .get_mut(&port)
            .and_then(VecDeque::pop_front)
            .or_else(|| self.defaults.get(&port).copied())
            .unwrap_or(0)
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        self.log.push(PortAccess::Write(port, value));
    }
}

/// A display that lives in RAM and counts writes.
pub struct RamText {
    pub bytes: [u8; BUFFER_SIZE],
    pub writes: usize,
}

impl RamText {
    pub fn new() -> Self {
        RamText {
            bytes: [0; BUFFER_SIZE],
            writes: 0,
        }
    }
}

impl TextMemory for RamText {
    fn read_byte(&self, offset: usize) -> u8 {
        self.bytes[offset]
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        self.writes += 1;
        self.bytes[offset] = value;
    }
}

#[derive(Debug, Default)]
pub struct RecordingLoader {
    pub loaded: Vec<TableDescriptor>,
}

impl InterruptTableLoader for RecordingLoader {
    fn load(&mut self, descriptor: &TableDescriptor) {
        self.loaded.push(*descriptor);
    }
}
