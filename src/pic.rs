//! The two cascaded 8259 interrupt controllers.
//!
//! Both chips come up mapping their lines onto vectors 0-15, on top of the
//! CPU exceptions, so they have to be remapped before any line is unmasked.

use log::debug;

use crate::hardware::PortIo;

pub const PIC_1_OFFSET: u8 = 0x20;
pub const PIC_2_OFFSET: u8 = PIC_1_OFFSET + 8;

const MASTER_COMMAND: u16 = 0x20;
const MASTER_DATA: u16 = 0x21;
const SLAVE_COMMAND: u16 = 0xA0;
const SLAVE_DATA: u16 = 0xA1;

/// ICW1: edge triggered, cascade mode, ICW4 follows.
const CMD_INIT: u8 = 0x11;
/// ICW4: 8086/88 mode.
const MODE_8086: u8 = 0x01;
const CMD_END_OF_INTERRUPT: u8 = 0x20;

/// The slave hangs off master line 2.
const MASTER_CASCADE_LINES: u8 = 1 << 2;
const SLAVE_CASCADE_IDENTITY: u8 = 2;

const KEYBOARD_LINE: u8 = 1;
const ALL_MASKED: u8 = 0xFF;

/// Unused port; writing to it takes long enough for the PIC to settle.
const WAIT_PORT: u16 = 0x80;

#[derive(Debug, Clone, Copy)]
struct Pic {
    offset: u8,
    command: u16,
    data: u16,
}

impl Pic {
    fn handles_interrupt(&self, interrupt_id: u8) -> bool {
        interrupt_id.wrapping_sub(self.offset) < 8
    }

    fn end_of_interrupt<P: PortIo>(&self, io: &mut P) {
        io.write_u8(self.command, CMD_END_OF_INTERRUPT);
    }

    fn write_mask<P: PortIo>(&self, io: &mut P, mask: u8) {
        io.write_u8(self.data, mask);
    }
}

/// Master and slave controller, programmed as a pair.
#[derive(Debug, Clone, Copy)]
pub struct ChainedPics {
    pics: [Pic; 2],
}

impl ChainedPics {
    pub const fn new(offset1: u8, offset2: u8) -> ChainedPics {
        ChainedPics {
            pics: [
                Pic {
                    offset: offset1,
                    command: MASTER_COMMAND,
                    data: MASTER_DATA,
                },
                Pic {
                    offset: offset2,
                    command: SLAVE_COMMAND,
                    data: SLAVE_DATA,
                },
            ],
        }
    }

    /// Runs the four-word initialization handshake on both chips.
    ///
    /// Each step goes to master then slave; within a chip the order is
    /// init, vector offset, cascade wiring, mode. Every line is left masked.
    /// There is no acknowledgment from the hardware.
    pub fn remap_and_configure_interrupt_controller<P: PortIo>(&mut self, io: &mut P) {
        let [master, slave] = self.pics;
        let mut write = |port: u16, value: u8| {
            io.write_u8(port, value);
            io.write_u8(WAIT_PORT, 0);
        };

        write(master.command, CMD_INIT);
        write(slave.command, CMD_INIT);

        write(master.data, master.offset);
        write(slave.data, slave.offset);

        write(master.data, MASTER_CASCADE_LINES);
        write(slave.data, SLAVE_CASCADE_IDENTITY);

        write(master.data, MODE_8086);
        write(slave.data, MODE_8086);

        self.write_masks(io, ALL_MASKED, ALL_MASKED);
        debug!(
            "interrupt controllers remapped to {:#x}/{:#x}",
            master.offset, slave.offset
        );
    }

    /// Unmasks the keyboard line on the master; every other line stays masked.
    pub fn enable_keyboard_line<P: PortIo>(&mut self, io: &mut P) {
        self.pics[0].write_mask(io, ALL_MASKED & !(1 << KEYBOARD_LINE));
        debug!("keyboard line unmasked");
    }

    /// Acknowledges `interrupt_id`. Slave vectors need both chips told.
    pub fn notify_end_of_interrupt<P: PortIo>(&mut self, io: &mut P, interrupt_id: u8) {
        if self.pics[1].handles_interrupt(interrupt_id) {
            self.pics[1].end_of_interrupt(io);
        }
        self.pics[0].end_of_interrupt(io);
    }

    pub fn write_masks<P: PortIo>(&mut self, io: &mut P, mask1: u8, mask2: u8) {
        self.pics[0].write_mask(io, mask1);
        self.pics[1].write_mask(io, mask2);
    }
}

impl Default for ChainedPics {
    fn default() -> Self {
        ChainedPics::new(PIC_1_OFFSET, PIC_2_OFFSET)
    }
}
