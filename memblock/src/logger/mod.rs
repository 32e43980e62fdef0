//! Logging for the memory block library.
//! Records arriving through the `log` facade are kept in a bounded in-memory
//! buffer and, optionally, passed to a sink function as formatted lines.

use alloc::collections::VecDeque;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use lazy_static::lazy_static;
use log::{Level, LevelFilter, Metadata, Record, SetLoggerError};
use spin::Mutex;

/// Default number of entries kept in memory
const DEFAULT_BUFFER_SIZE: usize = 1000;

/// Where log entries go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Only the sink function
    Sink,
    /// Only the in-memory buffer
    Memory,
    Both,
}

/// Log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    /// Log level
    pub level: Level,
    /// Module that emitted the record
    pub module: String,
    /// Log message
    pub message: String,
    /// Position of this entry in the sequence of accepted records
    pub sequence: u64,
}

impl LogEntry {
    /// Create a new log entry
    pub fn new(level: Level, module: &str, message: &str, sequence: u64) -> Self {
        Self {
            level,
            module: module.to_string(),
            message: message.to_string(),
            sequence,
        }
    }

    /// Format the log entry
    pub fn format(&self) -> String {
        format!("[{:06}] {:<5} {}: {}", self.sequence, self.level.as_str(), self.module, self.message)
    }
}

/// Logger state
pub struct Logger {
    /// Most verbose level to keep
    min_level: LevelFilter,
    /// Log target
    target: LogTarget,
    /// Receives each formatted line when the target includes the sink
    sink: Option<fn(&str)>,
    /// In-memory log buffer (for viewing later)
    log_buffer: VecDeque<LogEntry>,
    /// Maximum log buffer size
    max_buffer_size: usize,
    /// Number of records accepted so far
    sequence: u64,
}

impl Logger {
    /// Create a new logger
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_SIZE)
    }

    /// Create a logger keeping at most `max_buffer_size` entries
    pub fn with_capacity(max_buffer_size: usize) -> Self {
        Self {
            min_level: LevelFilter::Info,
            target: LogTarget::Memory,
            sink: None,
            log_buffer: VecDeque::new(),
            max_buffer_size,
            sequence: 0,
        }
    }

    /// Set minimum log level
    pub fn set_min_level(&mut self, level: LevelFilter) {
        self.min_level = level;
    }

    /// Set log target
    pub fn set_target(&mut self, target: LogTarget) {
        self.target = target;
    }

    /// Set the function receiving formatted lines
    pub fn set_sink(&mut self, sink: Option<fn(&str)>) {
        self.sink = sink;
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.min_level
    }

    /// Log a message
    pub fn log(&mut self, level: Level, module: &str, message: &str) {
        if !self.enabled(level) {
            return;
        }

        let entry = LogEntry::new(level, module, message, self.sequence);
        self.sequence += 1;

        if matches!(self.target, LogTarget::Sink | LogTarget::Both) {
            if let Some(sink) = self.sink {
                sink(&entry.format());
            }
        }

        if matches!(self.target, LogTarget::Memory | LogTarget::Both) {
            self.log_buffer.push_back(entry);

            // Trim buffer if needed
            while self.log_buffer.len() > self.max_buffer_size {
                self.log_buffer.pop_front();
            }
        }
    }

    /// Get all buffered log entries, oldest first
    pub fn entries(&self) -> Vec<LogEntry> {
        self.log_buffer.iter().cloned().collect()
    }

    /// Clear the log buffer
    pub fn clear(&mut self) {
        self.log_buffer.clear();
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::new()
    }
}

// Global logger instance
lazy_static! {
    static ref LOGGER: Mutex<Logger> = Mutex::new(Logger::new());
}

/// Bridges the `log` facade to the global logger
struct GlobalLogger;

static GLOBAL_LOGGER: GlobalLogger = GlobalLogger;

impl log::Log for GlobalLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        LOGGER.lock().enabled(metadata.level())
    }

    fn log(&self, record: &Record<'_>) {
        // Format before taking the lock, the arguments may be arbitrary
        // Display impls
        let message = format!("{}", record.args());
        let module = record.module_path().unwrap_or_else(|| record.target());
        LOGGER.lock().log(record.level(), module, &message);
    }

    fn flush(&self) {}
}

/// Install the global logger, keeping records up to `level`.
///
/// Fails if another logger was installed first, in which case records from
/// this library go to that logger instead.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&GLOBAL_LOGGER)?;
    set_min_level(level);
    Ok(())
}

/// Set the most verbose level the global logger keeps
pub fn set_min_level(level: LevelFilter) {
    LOGGER.lock().set_min_level(level);
    log::set_max_level(level);
}

/// Set where the global logger sends entries
pub fn set_target(target: LogTarget) {
    LOGGER.lock().set_target(target);
}

/// Set the function receiving the global logger's formatted lines. The sink
/// must not log itself.
pub fn set_sink(sink: Option<fn(&str)>) {
    LOGGER.lock().set_sink(sink);
}

/// Get the global logger's buffered entries
pub fn entries() -> Vec<LogEntry> {
    LOGGER.lock().entries()
}

/// Clear the global logger's buffer
pub fn clear() {
    LOGGER.lock().clear();
}
