//! Logging plumbing for trading tools.
//!
//! - `LogSink`: the trait operations write human-readable trace messages to
//! - `RuntimeLogger`: console + optional file handler with a shared formatter
//! - `LogWriter`: `io::Write` adapter forwarding lines to a sink
//! - `MemorySink`: in-memory sink for tests and inspection

pub mod level;
pub mod logger;
pub mod sink;
pub mod writer;

pub use level::LogLevel;
pub use logger::{setup_logging, LineFormatter, RuntimeLogger, RUNTIME_LOGGER};
pub use sink::{LogSink, MemorySink};
pub use writer::LogWriter;
