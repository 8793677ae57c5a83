use core::fmt;

use crate::hardware::TextMemory;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Color {
    Black = 0,
    Blue = 1,
    Green = 2,
    Cyan = 3,
    Red = 4,
    Magenta = 5,
    Brown = 6,
    LightGray = 7,
    DarkGray = 8,
    LightBlue = 9,
    LightGreen = 10,
    LightCyan = 11,
    LightRed = 12,
    Pink = 13,
    Yellow = 14,
    White = 15,
}

/// Attribute byte of a text cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct ColorCode(u8);

impl ColorCode {
    pub const fn new(foreground: Color, background: Color) -> ColorCode {
        ColorCode((background as u8) << 4 | (foreground as u8))
    }

    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl Default for ColorCode {
    /// Light grey on black.
    fn default() -> Self {
        ColorCode::new(Color::LightGray, Color::Black)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct ScreenChar {
    pub ascii_character: u8,
    pub color_code: ColorCode,
}

pub const BUFFER_HEIGHT: usize = 25;
pub const BUFFER_WIDTH: usize = 80;
pub const BYTES_PER_CELL: usize = 2;
pub const BUFFER_SIZE: usize = BUFFER_WIDTH * BUFFER_HEIGHT * BYTES_PER_CELL;

/// Byte offset of the next cell to write.
///
/// Always even and below `BUFFER_SIZE`; advancing past the last cell wraps
/// back to the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorOffset(usize);

impl CursorOffset {
    pub const fn start() -> Self {
        CursorOffset(0)
    }

    /// Returns `None` for odd offsets or offsets past the end of the buffer.
    pub const fn at(offset: usize) -> Option<Self> {
        if offset % BYTES_PER_CELL == 0 && offset < BUFFER_SIZE {
            Some(CursorOffset(offset))
        } else {
            None
        }
    }

    pub const fn get(self) -> usize {
        self.0
    }

    pub fn advance(&mut self) {
        self.0 += BYTES_PER_CELL;
        if self.0 >= BUFFER_SIZE {
            self.0 = 0;
        }
    }

    fn next_row(&mut self) {
        let row = self.0 / (BUFFER_WIDTH * BYTES_PER_CELL);
        self.0 = ((row + 1) % BUFFER_HEIGHT) * BUFFER_WIDTH * BYTES_PER_CELL;
    }
}

/// Writes characters into the text display and tracks the cursor.
pub struct Display<M> {
    memory: M,
    cursor: CursorOffset,
}

impl<M: TextMemory> Display<M> {
    pub fn new(memory: M) -> Self {
        Display {
            memory,
            cursor: CursorOffset::start(),
        }
    }

    /// Writes `c` and `attribute` at the cursor, then advances it.
    ///
    /// Returns the offset the character landed at.
    pub fn write_char(&mut self, c: u8, attribute: ColorCode) -> usize {
        let offset = self.cursor.get();
        self.memory.write_byte(offset, c);
        self.memory.write_byte(offset + 1, attribute.as_u8());
        self.cursor.advance();
        offset
    }

    /// Fills every cell with a blank in the default attribute.
    ///
    /// The cursor is left where it was.
    pub fn clear_screen(&mut self) {
        let blank = ColorCode::default().as_u8();
        for offset in (0..BUFFER_SIZE).step_by(BYTES_PER_CELL) {
            self.memory.write_byte(offset, b' ');
            self.memory.write_byte(offset + 1, blank);
        }
    }

    pub fn write_string(&mut self, s: &str) {
        for byte in s.bytes() {
            match byte {
                b'\n' => self.cursor.next_row(),
                // printable ASCII byte
                0x20..=0x7e => {
                    self.write_char(byte, ColorCode::default());
                }
                _ => {
                    self.write_char(0xfe, ColorCode::default());
                }
            }
        }
    }

    pub fn read_cell(&self, offset: usize) -> ScreenChar {
        ScreenChar {
            ascii_character: self.memory.read_byte(offset),
            color_code: ColorCode(self.memory.read_byte(offset + 1)),
        }
    }

    pub fn cursor(&self) -> CursorOffset {
        self.cursor
    }

    pub fn set_cursor(&mut self, cursor: CursorOffset) {
        self.cursor = cursor;
    }

    pub fn memory(&self) -> &M {
        &self.memory
    }
}

impl<M: TextMemory> fmt::Write for Display<M> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_string(s);
        Ok(())
    }
}

// ----------------------------------------------------------------------------------------
// Macros

#[macro_export]
macro_rules! println {
    () => ($crate::print!("\n"));
    ($($arg:tt)*) => ($crate::print!("{}\n", format_args!($($arg)*)));
}

#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => ($crate::vga_buffer::_print(format_args!($($arg)*)));
}

#[doc(hidden)]
#[cfg(all(target_arch = "x86", target_os = "none"))]
pub fn _print(args: fmt::Arguments) {
    use core::fmt::Write;
    use crate::arch;

    // dropped when the display is held, e.g. a panic inside the keyboard handler
    arch::without_interrupts(|| {
        if let Some(mut kernel) = arch::KERNEL.try_lock() {
            let _ = kernel.display_mut().write_fmt(args);
        }
    });
}

// ----------------------------------------------------------------------------------------
// Tests
