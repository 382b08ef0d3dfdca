//! Output plumbing for the `print`/`println` builtins.
//!
//! Implement [`PrintWriter`] to capture or redirect output from Rill code.
//! The default [`StdPrint`] writes to stdout; [`CollectPrint`] collects
//! into a string for tests; [`NoPrint`] discards everything.

use std::io::{self, Write as _};

use crate::exceptions::{Exception, RunResult};

/// Trait for handling output from the print builtins.
pub trait PrintWriter: Send {
    /// Writes one formatted argument, without separators or newline.
    fn stdout_write(&mut self, output: &str) -> RunResult<()>;

    /// Writes a single separator or terminator character.
    fn stdout_push(&mut self, end: char) -> RunResult<()>;
}

/// Default writer: line-buffered stdout.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: &str) -> RunResult<()> {
        io::stdout()
            .write_all(output.as_bytes())
            .map_err(|e| Exception::runtime_error(format!("stdout write failed: {e}")))
    }

    fn stdout_push(&mut self, end: char) -> RunResult<()> {
        let mut buf = [0u8; 4];
        let s = end.encode_utf8(&mut buf);
        io::stdout()
            .write_all(s.as_bytes())
            .and_then(|()| if end == '\n' { io::stdout().flush() } else { Ok(()) })
            .map_err(|e| Exception::runtime_error(format!("stdout write failed: {e}")))
    }
}

/// Writer that collects all output into a shared string.
///
/// Clones share the same buffer, so a test can keep one handle and give
/// the other to the interpreter.
#[derive(Debug, Clone, Default)]
pub struct CollectPrint(std::sync::Arc<parking_lot::Mutex<String>>);

impl CollectPrint {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the collected output so far.
    pub fn output(&self) -> String {
        self.0.lock().clone()
    }
}

impl PrintWriter for CollectPrint {
    fn stdout_write(&mut self, output: &str) -> RunResult<()> {
        self.0.lock().push_str(output);
        Ok(())
    }

    fn stdout_push(&mut self, end: char) -> RunResult<()> {
        self.0.lock().push(end);
        Ok(())
    }
}

/// Writer that ignores all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: &str) -> RunResult<()> {
        Ok(())
    }

    fn stdout_push(&mut self, _end: char) -> RunResult<()> {
        Ok(())
    }
}
