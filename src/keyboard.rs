//! Keyboard interrupt handling: scancode in, character on screen.

use lazy_static::lazy_static;
use log::trace;
use pc_keyboard::{layouts, DecodedKey, HandleControl, Keyboard, ScancodeSet1};

use crate::hardware::{PortIo, TextMemory};
use crate::interrupts::InterruptIndex;
use crate::pic::ChainedPics;
use crate::vga_buffer::{Color, ColorCode, Display};

pub const DATA_PORT: u16 = 0x60;
pub const STATUS_PORT: u16 = 0x64;

/// Status bit: a byte is waiting in the data register.
const OUTPUT_BUFFER_FULL: u8 = 0x01;
/// Scancode bit marking a key release.
const RELEASE_BIT: u8 = 0x80;

pub const SCANCODE_TABLE_LEN: usize = 128;

pub const KEY_COLOR: ColorCode = ColorCode::new(Color::LightGray, Color::Black);

lazy_static! {
    pub static ref US104: ScancodeMap = ScancodeMap::us104();
}

/// Why a scancode produced no character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyError {
    /// Top bit set.
    Released(u8),
    /// No entry in the translation table.
    OutOfTable(u8),
}

/// What one keyboard interrupt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyboardEvent {
    /// The controller had nothing for us.
    Spurious,
    Dropped(KeyError),
    Printed {
        scancode: u8,
        character: u8,
        offset: usize,
    },
}

/// Scancode set 1 make code to display byte.
#[derive(Clone, PartialEq, Eq)]
pub struct ScancodeMap([u8; SCANCODE_TABLE_LEN]);

impl ScancodeMap {
    pub const fn from_table(table: [u8; SCANCODE_TABLE_LEN]) -> Self {
        ScancodeMap(table)
    }

    /// Unshifted US layout. Keys without an ASCII meaning map to 0.
    pub fn us104() -> Self {
        let mut table = [0u8; SCANCODE_TABLE_LEN];
        for (code, slot) in (0u8..).zip(table.iter_mut()) {
            // fresh decoder per code so no modifier state carries over
            let mut keyboard =
                Keyboard::new(ScancodeSet1::new(), layouts::Us104Key, HandleControl::Ignore);
            if let Ok(Some(event)) = keyboard.add_byte(code) {
                if let Some(DecodedKey::Unicode(c)) = keyboard.process_keyevent(event) {
                    if c.is_ascii() {
                        *slot = c as u8;
                    }
                }
            }
        }
        ScancodeMap(table)
    }

    pub fn translate(&self, scancode: u8) -> Result<u8, KeyError> {
        if scancode & RELEASE_BIT != 0 {
            return Err(KeyError::Released(scancode));
        }
        self.0
            .get(usize::from(scancode))
            .copied()
            .ok_or(KeyError::OutOfTable(scancode))
    }
}

impl core::fmt::Debug for ScancodeMap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let mapped = self.0.iter().filter(|c| **c != 0).count();
        f.debug_struct("ScancodeMap").field("mapped", &mapped).finish()
    }
}

/// Services one keyboard interrupt.
///
/// Runs with interrupts disabled and is never re-entered. The controller is
/// acknowledged on every path, otherwise it stops delivering interrupts.
pub fn handle_keyboard_interrupt<P, M>(
    io: &mut P,
    display: &mut Display<M>,
    pics: &mut ChainedPics,
    keymap: &ScancodeMap,
) -> KeyboardEvent
where
    P: PortIo,
    M: TextMemory,
{
    let event = read_key(io, display, keymap);
    pics.notify_end_of_interrupt(io, InterruptIndex::Keyboard.as_u8());
    event
}

fn read_key<P, M>(io: &mut P, display: &mut Display<M>, keymap: &ScancodeMap) -> KeyboardEvent
where
    P: PortIo,
    M: TextMemory,
{
    if io.read_u8(STATUS_PORT) & OUTPUT_BUFFER_FULL == 0 {
        trace!("spurious keyboard interrupt");
        return KeyboardEvent::Spurious;
    }

    let scancode = io.read_u8(DATA_PORT);
    match keymap.translate(scancode) {
        Ok(character) => KeyboardEvent::Printed {
            scancode,
            character,
            offset: display.write_char(character, KEY_COLOR),
        },
        Err(err) => {
            trace!("dropped scancode: {:?}", err);
            KeyboardEvent::Dropped(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::fake::{FakePorts, PortAccess, RamText};
    use crate::vga_buffer::CursorOffset;

    const EOI: PortAccess = PortAccess::Write(0x20, 0x20);

    fn identity_map() -> ScancodeMap {
        let mut table = [0u8; SCANCODE_TABLE_LEN];
        for (i, slot) in table.iter_mut().enumerate() {
            *slot = i as u8;
        }
        ScancodeMap::from_table(table)
    }

    fn ports_with_key(scancode: u8) -> FakePorts {
        let mut io = FakePorts::new();
        io.script(STATUS_PORT, &[0x01]).script(DATA_PORT, &[scancode]);
        io
    }

    fn run(io: &mut FakePorts, display: &mut Display<RamText>, keymap: &ScancodeMap) -> KeyboardEvent {
        handle_keyboard_interrupt(io, display, &mut ChainedPics::default(), keymap)
    }

    #[test]
    fn empty_buffer_skips_read_and_still_acknowledges() {
        let mut io = FakePorts::new();
        let mut display = Display::new(RamText::new());

        let event = run(&mut io, &mut display, &identity_map());

        assert_eq!(event, KeyboardEvent::Spurious);
        assert_eq!(io.reads_of(DATA_PORT), 0);
        assert_eq!(display.memory().writes, 0);
        assert_eq!(io.log, vec![PortAccess::Read(STATUS_PORT), EOI]);
    }

    #[test]
    fn status_bits_other_than_output_full_are_ignored() {
        let mut io = FakePorts::new();
        io.script(STATUS_PORT, &[0xFE]);
        let mut display = Display::new(RamText::new());

        assert_eq!(run(&mut io, &mut display, &identity_map()), KeyboardEvent::Spurious);
    }

    #[test]
    fn printable_key_is_written_in_light_grey() {
        let mut io = ports_with_key(0x1E);
        let mut display = Display::new(RamText::new());

        let event = run(&mut io, &mut display, &US104);

        assert_eq!(
            event,
            KeyboardEvent::Printed {
                scancode: 0x1E,
                character: b'a',
                offset: 0
            }
        );
        assert_eq!(&display.memory().bytes[..2], &[b'a', 0x07]);
        assert_eq!(display.cursor().get(), 2);
        assert_eq!(io.writes_to(0x20), vec![0x20]);
    }

    #[test]
    fn every_make_code_appends_one_cell() {
        let keymap = identity_map();
        for scancode in 0u8..128 {
            let mut io = ports_with_key(scancode);
            let mut display = Display::new(RamText::new());

            let event = run(&mut io, &mut display, &keymap);

            assert!(matches!(event, KeyboardEvent::Printed { character, .. } if character == scancode));
            assert_eq!(display.memory().writes, 2);
            assert_eq!(io.writes_to(0x20), vec![0x20]);
        }
    }

    #[test]
    fn top_bit_scancodes_are_dropped_and_acknowledged() {
        let keymap = identity_map();
        for scancode in 128u8..=255 {
            let mut io = ports_with_key(scancode);
            let mut display = Display::new(RamText::new());

            let event = run(&mut io, &mut display, &keymap);

            assert_eq!(event, KeyboardEvent::Dropped(KeyError::Released(scancode)));
            assert_eq!(display.memory().writes, 0);
            assert_eq!(display.cursor(), CursorOffset::start());
            assert_eq!(io.writes_to(0x20), vec![0x20]);
        }
    }

    #[test]
    fn acknowledgment_is_the_last_access() {
        let mut io = ports_with_key(0x02);
        let mut display = Display::new(RamText::new());
        run(&mut io, &mut display, &US104);

        assert_eq!(
            io.log,
            vec![PortAccess::Read(STATUS_PORT), PortAccess::Read(DATA_PORT), EOI]
        );
    }

    #[test]
    fn translate_never_indexes_past_the_table() {
        let keymap = identity_map();
        for scancode in 0u8..=255 {
            match keymap.translate(scancode) {
                Ok(c) => assert_eq!(c, scancode),
                Err(KeyError::Released(s)) => assert!(s >= 128),
                Err(KeyError::OutOfTable(_)) => panic!("released codes are caught first"),
            }
        }
    }

    #[test]
    fn us104_table_matches_unshifted_layout() {
        assert_eq!(US104.translate(0x02), Ok(b'1'));
        assert_eq!(US104.translate(0x10), Ok(b'q'));
        assert_eq!(US104.translate(0x1E), Ok(b'a'));
        assert_eq!(US104.translate(0x39), Ok(b' '));
        // left shift decodes to no character
        assert_eq!(US104.translate(0x2A), Ok(0));
    }

    #[test]
    fn wraps_cursor_from_last_cell() {
        let mut io = ports_with_key(0x1E);
        let mut display = Display::new(RamText::new());
        display.set_cursor(CursorOffset::at(3998).unwrap());

        run(&mut io, &mut display, &US104);

        assert_eq!(&display.memory().bytes[3998..], &[b'a', 0x07]);
        assert_eq!(display.cursor().get(), 0);
    }
}
