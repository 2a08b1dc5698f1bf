//! Backend mínimo de `log` hacia stderr.

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("{} {:<5} {}: {}",
                      chrono::Local::now().format("%H:%M:%S%.3f"),
                      record.level(),
                      record.target(),
                      record.args());
        }
    }

    fn flush(&self) {}
}

/// Instala el logger. Sólo la primera llamada del proceso tiene efecto.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER).map(|()| log::set_max_level(level))
}
