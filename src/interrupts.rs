//! The interrupt descriptor table.
//!
//! Entries use the 8-byte protected-mode gate layout and are serialized
//! explicitly into a CPU-visible image instead of relying on struct layout.

use log::info;
use x86_64::structures::gdt::SegmentSelector;
use x86_64::PrivilegeLevel;

use crate::hardware::InterruptTableLoader;
use crate::pic::PIC_1_OFFSET;

pub const IDT_ENTRIES: usize = 256;
pub const DESCRIPTOR_SIZE: usize = 8;
pub const TABLE_BYTES: usize = IDT_ENTRIES * DESCRIPTOR_SIZE;

/// Flat code segment installed by the boot stub, GDT index 1.
pub const KERNEL_CODE_SELECTOR: SegmentSelector = SegmentSelector::new(1, PrivilegeLevel::Ring0);

const GATE_PRESENT: u8 = 1 << 7;
const GATE_INTERRUPT_32: u8 = 0xE;

/// Type/attribute byte for a present 32-bit interrupt gate callable from `dpl`.
pub const fn interrupt_gate_attributes(dpl: PrivilegeLevel) -> u8 {
    GATE_PRESENT | (dpl as u8) << 5 | GATE_INTERRUPT_32
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InterruptIndex {
    /// IRQ 1 on the master.
    Keyboard = PIC_1_OFFSET + 1,
}

impl InterruptIndex {
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn as_usize(self) -> usize {
        usize::from(self.as_u8())
    }
}

/// One gate of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct InterruptDescriptor {
    pub offset_low: u16,
    pub selector: u16,
    pub zero: u8,
    pub type_attr: u8,
    pub offset_high: u16,
}

impl InterruptDescriptor {
    /// An all-zero entry: no handler installed.
    pub const fn missing() -> Self {
        InterruptDescriptor {
            offset_low: 0,
            selector: 0,
            zero: 0,
            type_attr: 0,
            offset_high: 0,
        }
    }

    pub const fn interrupt_gate(handler: u32, selector: SegmentSelector) -> Self {
        InterruptDescriptor {
            offset_low: (handler & 0xFFFF) as u16,
            selector: selector.0,
            zero: 0,
            type_attr: interrupt_gate_attributes(PrivilegeLevel::Ring0),
            offset_high: (handler >> 16) as u16,
        }
    }

    pub fn handler_address(&self) -> u32 {
        u32::from(self.offset_high) << 16 | u32::from(self.offset_low)
    }

    pub fn is_missing(&self) -> bool {
        *self == Self::missing()
    }

    /// Little-endian wire layout: offset low, selector, zero, type, offset high.
    pub fn to_bytes(&self) -> [u8; DESCRIPTOR_SIZE] {
        let low = self.offset_low.to_le_bytes();
        let selector = self.selector.to_le_bytes();
        let high = self.offset_high.to_le_bytes();
        [
            low[0],
            low[1],
            selector[0],
            selector[1],
            self.zero,
            self.type_attr,
            high[0],
            high[1],
        ]
    }
}

/// The operand of `lidt`: table limit and linear base address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableDescriptor {
    pub limit: u16,
    pub base: u32,
}

impl TableDescriptor {
    pub const fn for_table(base: u32) -> Self {
        TableDescriptor {
            limit: (TABLE_BYTES - 1) as u16,
            base,
        }
    }

    /// The descriptor as two 32-bit words: the limit with the low half of
    /// the base above it, then the high half of the base.
    pub fn encode(&self) -> [u32; 2] {
        [
            u32::from(self.limit) | (self.base & 0xFFFF) << 16,
            self.base >> 16,
        ]
    }

    /// The six bytes `lidt` reads.
    pub fn to_bytes(&self) -> [u8; 6] {
        let limit = self.limit.to_le_bytes();
        let base = self.base.to_le_bytes();
        [limit[0], limit[1], base[0], base[1], base[2], base[3]]
    }
}

#[repr(C, align(8))]
struct TableImage([u8; TABLE_BYTES]);

pub struct InterruptTable {
    entries: [InterruptDescriptor; IDT_ENTRIES],
    image: TableImage,
}

impl InterruptTable {
    pub const fn new() -> Self {
        InterruptTable {
            entries: [InterruptDescriptor::missing(); IDT_ENTRIES],
            image: TableImage([0; TABLE_BYTES]),
        }
    }

    /// Builds the table with a single keyboard gate and loads it.
    ///
    /// Must run before interrupts are enabled: the image is rewritten in
    /// place and nothing stops the CPU from reading it halfway.
    pub fn initialize_interrupts<L: InterruptTableLoader>(
        &mut self,
        keyboard_entry: u32,
        loader: &mut L,
    ) -> TableDescriptor {
        self.entries = [InterruptDescriptor::missing(); IDT_ENTRIES];
        self.entries[InterruptIndex::Keyboard.as_usize()] =
            InterruptDescriptor::interrupt_gate(keyboard_entry, KERNEL_CODE_SELECTOR);
        self.serialize();

        let descriptor = TableDescriptor::for_table(self.base_address());
        loader.load(&descriptor);

        info!(
            "interrupt table loaded: keyboard gate at vector {:#x}, base {:#010x}",
            InterruptIndex::Keyboard.as_u8(),
            descriptor.base
        );
        descriptor
    }

    fn serialize(&mut self) {
        for (entry, chunk) in self
            .entries
            .iter()
            .zip(self.image.0.chunks_exact_mut(DESCRIPTOR_SIZE))
        {
            chunk.copy_from_slice(&entry.to_bytes());
        }
    }

    pub fn entry(&self, vector: u8) -> &InterruptDescriptor {
        &self.entries[usize::from(vector)]
    }

    pub fn entries(&self) -> &[InterruptDescriptor; IDT_ENTRIES] {
        &self.entries
    }

    /// The bytes the CPU reads.
    pub fn image(&self) -> &[u8; TABLE_BYTES] {
        &self.image.0
    }

    fn base_address(&self) -> u32 {
        self.image.0.as_ptr() as usize as u32
    }
}

impl Default for InterruptTable {
    fn default() -> Self {
        Self::new()
    }
}
