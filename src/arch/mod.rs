//! Bare-metal bindings for 32-bit x86.
//!
//! The only module that executes privileged instructions or dereferences
//! physical addresses.

use core::arch::{asm, global_asm};

use lazy_static::lazy_static;
use log::info;
use spin::Mutex;
use uart_16550::SerialPort;
use volatile::Volatile;

use crate::hardware::{InterruptTableLoader, PortIo, TextMemory};
use crate::interrupts::{InterruptTable, TableDescriptor};
use crate::keyboard::US104;
use crate::serial::COM1;
use crate::vga_buffer::BUFFER_SIZE;
use crate::Kernel;

const VGA_BUFFER: usize = 0xb8000;
const EFLAGS_IF: u32 = 1 << 9;

lazy_static! {
    pub static ref KERNEL: Mutex<Kernel<RawPorts, VgaText>> = Mutex::new(Kernel::new(
        unsafe { RawPorts::new() },
        unsafe { VgaText::new() },
        US104.clone(),
    ));
    pub static ref SERIAL1: Mutex<SerialPort> = {
        let mut serial_port = unsafe { SerialPort::new(COM1) };
        serial_port.init();
        Mutex::new(serial_port)
    };
}

static IDT: Mutex<InterruptTable> = Mutex::new(InterruptTable::new());

extern "C" {
    fn keyboard_entry();
}

// Saves the general registers around the Rust handler and returns with
// iretd. The call runs on a 16-byte aligned stack; ebx is callee-saved.
global_asm!(
    r#"
    .section .text
    .global keyboard_entry
    keyboard_entry:
        pushad
        cld
        mov ebx, esp
        and esp, -16
        call keyboard_interrupt_main
        mov esp, ebx
        popad
        iretd
    "#
);

#[no_mangle]
pub extern "C" fn keyboard_interrupt_main() {
    KERNEL.lock().handle_keyboard_interrupt();
}

/// Runs the boot sequence, then enables interrupts.
///
/// Both locks are released before `sti` so the first keyboard interrupt
/// cannot find them held.
pub fn boot() {
    {
        let mut table = IDT.lock();
        let entry = keyboard_entry as usize as u32;
        KERNEL.lock().boot(&mut table, entry, &mut Lidt);
    }
    enable_interrupts();
    info!("interrupts enabled");
}

/// Port I/O through `in`/`out`.
#[derive(Debug, Clone, Copy)]
pub struct RawPorts {
    _private: (),
}

impl RawPorts {
    /// # Safety
    /// The caller must be running in ring 0.
    pub const unsafe fn new() -> Self {
        RawPorts { _private: () }
    }
}

impl PortIo for RawPorts {
    fn read_u8(&mut self, port: u16) -> u8 {
        let value: u8;
        unsafe {
            asm!("in al, dx", out("al") value, in("dx") port, options(nomem, nostack, preserves_flags));
        }
        value
    }

    fn write_u8(&mut self, port: u16, value: u8) {
        unsafe {
            asm!("out dx, al", in("dx") port, in("al") value, options(nomem, nostack, preserves_flags));
        }
    }
}

/// The VGA text buffer at its physical address.
pub struct VgaText {
    cells: &'static mut [Volatile<u8>; BUFFER_SIZE],
}

impl VgaText {
    /// # Safety
    /// Only one `VgaText` may exist, and 0xb8000 must be identity mapped.
    pub unsafe fn new() -> Self {
        VgaText {
            cells: unsafe { &mut *(VGA_BUFFER as *mut [Volatile<u8>; BUFFER_SIZE]) },
        }
    }
}

impl TextMemory for VgaText {
    fn read_byte(&self, offset: usize) -> u8 {
        self.cells[offset].read()
    }

    fn write_byte(&mut self, offset: usize, value: u8) {
        self.cells[offset].write(value);
    }
}

/// Loads the interrupt table register.
pub struct Lidt;

impl InterruptTableLoader for Lidt {
    fn load(&mut self, descriptor: &TableDescriptor) {
        let operand = descriptor.to_bytes();
        unsafe {
            asm!("lidt [{}]", in(reg) operand.as_ptr(), options(readonly, nostack, preserves_flags));
        }
    }
}

pub fn enable_interrupts() {
    unsafe {
        asm!("sti", options(nomem, nostack));
    }
}

/// Runs `f` with interrupts disabled, restoring the previous state after.
pub fn without_interrupts<F, R>(f: F) -> R
where
    F: FnOnce() -> R,
{
    let flags: u32;
    unsafe {
        asm!("pushfd", "pop {}", "cli", out(reg) flags, options(nomem));
    }

    let ret = f();

    if flags & EFLAGS_IF != 0 {
        enable_interrupts();
    }
    ret
}

pub fn hlt_loop() -> ! {
    loop {
        unsafe {
            asm!("hlt", options(nomem, nostack, preserves_flags));
        }
    }
}
