//! The narrow capabilities the rest of the kernel uses to touch hardware.
//!
//! Port I/O, the text-mode display and the `lidt` instruction are the only
//! places raw access happens. Everything else in the crate is written
//! against these traits, so the bare-metal bindings in `arch` and the fakes
//! used by the tests are interchangeable.

use crate::interrupts::TableDescriptor;

#[cfg(test)]
pub mod fake;

/// Byte-wide access to the x86 I/O port space.
pub trait PortIo {
    fn read_u8(&mut self, port: u16) -> u8;
    fn write_u8(&mut self, port: u16, value: u8);
}

impl<T: PortIo + ?Sized> PortIo for &mut T {
    fn read_u8(&mut self, port: u16) -> u8 {
        (**self).read_u8(port)
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        (**self).write_u8(port, value)
    }
}

/// Byte-level access to the memory-mapped text display.
///
/// Offsets are byte offsets into the buffer: even offsets hold characters,
/// odd offsets hold attribute bytes.
pub trait TextMemory {
    fn read_byte(&self, offset: usize) -> u8;
    fn write_byte(&mut self, offset: usize, value: u8);
}

/// Hands an encoded interrupt table descriptor to the CPU.
pub trait InterruptTableLoader {
    fn load(&mut self, descriptor: &TableDescriptor);
}
