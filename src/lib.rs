//! Interrupt-driven keyboard echo for a minimal 32-bit kernel.
//!
//! Boot builds a one-gate interrupt table, remaps the 8259 pair and
//! unmasks the keyboard line. From then on every key press lands on the
//! text display through [`Kernel::handle_keyboard_interrupt`].

#![cfg_attr(not(test), no_std)]

pub mod hardware;
pub mod interrupts;
pub mod keyboard;
pub mod logger;
pub mod pic;
pub mod serial;
pub mod vga_buffer;

#[cfg(all(target_arch = "x86", target_os = "none"))]
pub mod arch;

#[cfg(all(target_arch = "x86", target_os = "none"))]
pub use arch::hlt_loop;

use log::info;

use hardware::{InterruptTableLoader, PortIo, TextMemory};
use interrupts::InterruptTable;
use keyboard::{KeyboardEvent, ScancodeMap};
use pic::ChainedPics;
use vga_buffer::{CursorOffset, Display};

pub const BANNER: &str = "Custom Kernel";

/// Everything the setup path and the keyboard interrupt share.
pub struct Kernel<P, M> {
    ports: P,
    display: Display<M>,
    pics: ChainedPics,
    keymap: ScancodeMap,
}

impl<P: PortIo, M: TextMemory> Kernel<P, M> {
    pub fn new(ports: P, memory: M, keymap: ScancodeMap) -> Self {
        Kernel {
            ports,
            display: Display::new(memory),
            pics: ChainedPics::default(),
            keymap,
        }
    }

    /// One-time setup. The caller enables interrupts afterwards, never before.
    pub fn boot<L: InterruptTableLoader>(
        &mut self,
        table: &mut InterruptTable,
        keyboard_entry: u32,
        loader: &mut L,
    ) {
        self.display.clear_screen();
        self.display.set_cursor(CursorOffset::start());
        self.display.write_string(BANNER);
        info!("banner written, cursor at {}", self.display.cursor().get());

        table.initialize_interrupts(keyboard_entry, loader);
        self.pics
            .remap_and_configure_interrupt_controller(&mut self.ports);
        self.pics.enable_keyboard_line(&mut self.ports);
        info!("keyboard interrupts ready");
    }

    pub fn handle_keyboard_interrupt(&mut self) -> KeyboardEvent {
        keyboard::handle_keyboard_interrupt(
            &mut self.ports,
            &mut self.display,
            &mut self.pics,
            &self.keymap,
        )
    }

    pub fn display(&self) -> &Display<M> {
        &self.display
    }

    pub fn display_mut(&mut self) -> &mut Display<M> {
        &mut self.display
    }

    pub fn ports(&self) -> &P {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut P {
        &mut self.ports
    }
}
