pub const COM1: u16 = 0x3F8;

/// Early boot-safe serial initialization check
#[cfg(all(target_arch = "x86", target_os = "none"))]
pub fn init_serial() -> Result<(), &'static str> {
    // Programs the UART on first access; safe to call more than once.
    lazy_static::initialize(&crate::arch::SERIAL1);
    Ok(())
}

#[doc(hidden)]
#[cfg(all(target_arch = "x86", target_os = "none"))]
pub fn _print(args: ::core::fmt::Arguments) {
    use core::fmt::Write;
    use crate::arch;

    // Use direct Write trait to avoid heap allocations
    arch::without_interrupts(|| {
        arch::SERIAL1.lock().write_fmt(args).expect("Serial write failed");
    });
}

/// Prints to the host through the serial interface.
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => {
        $crate::serial::_print(format_args!($($arg)*));
    };
}

/// Prints to the host through the serial interface, appending a newline.
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($fmt:expr) => ($crate::serial_print!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::serial_print!(
        concat!($fmt, "\n"), $($arg)*));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn com1_uart_driver_is_port_based() {
        assert_eq!(COM1, 0x3F8);
        assert!(core::mem::size_of::<uart_16550::SerialPort>() >= core::mem::size_of::<u16>());
    }
}
