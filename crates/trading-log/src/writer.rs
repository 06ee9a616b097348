//! `io::Write` adapter that turns written text into log lines.

use std::io;

use crate::level::LogLevel;
use crate::sink::LogSink;

/// Forwards each complete, non-blank line written to it to a sink.
///
/// Useful for routing a child process's or library's text output into the
/// runtime log. A trailing partial line is emitted on `flush` or drop.
///
/// Bytes are buffered undecoded until a newline arrives, so a multi-byte
/// character split across two writes still decodes intact.
pub struct LogWriter<S: LogSink> {
    sink: S,
    level: LogLevel,
    buffer: Vec<u8>,
}

impl<S: LogSink> LogWriter<S> {
    pub fn new(sink: S, level: LogLevel) -> Self {
        Self {
            sink,
            level,
            buffer: Vec::new(),
        }
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    fn emit(&self, bytes: &[u8]) {
        let text = String::from_utf8_lossy(bytes);
        let line = text.trim_end();
        if !line.trim().is_empty() {
            self.sink.log(self.level, line);
        }
    }
}

impl<S: LogSink> io::Write for LogWriter<S> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.extend_from_slice(buf);
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.emit(&line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.emit(&rest);
        }
        Ok(())
    }
}

impl<S: LogSink> Drop for LogWriter<S> {
    fn drop(&mut self) {
        let _ = io::Write::flush(self);
    }
}
