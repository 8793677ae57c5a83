use core::fmt;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Once;

/// Where formatted log lines go.
pub type Sink = fn(fmt::Arguments);

pub const DEFAULT_LEVEL: LevelFilter = if cfg!(feature = "verbose") {
    LevelFilter::Trace
} else {
    LevelFilter::Info
};

static LOGGER: KernelLogger = KernelLogger { sink: Once::new() };

struct KernelLogger {
    sink: Once<Sink>,
}

pub fn init(sink: Sink, level: LevelFilter) -> Result<(), SetLoggerError> {
    LOGGER.sink.call_once(|| sink);
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// `[LEVEL] target: message`
pub fn format_record<W: fmt::Write>(out: &mut W, record: &Record) -> fmt::Result {
    writeln!(out, "[{:<5}] {}: {}", record.level(), record.target(), record.args())
}

struct SinkWriter(Sink);

impl fmt::Write for SinkWriter {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        (self.0)(format_args!("{}", s));
        Ok(())
    }
}

impl Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        if let Some(sink) = self.sink.get() {
            let _ = format_record(&mut SinkWriter(*sink), record);
        }
    }

    fn flush(&self) {}
}
