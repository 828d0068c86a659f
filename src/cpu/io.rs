//! Byte-oriented console used by the `IN` and `OUT` instructions.

use std::io::{self, BufWriter, Read, Write};

/// One-byte console attached to the machine.
pub trait Console {
    /// Block for the next input byte. `None` means end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;

    /// Emit one output byte.
    fn write_byte(&mut self, byte: u8) -> io::Result<()>;

    /// Push any buffered output to its destination.
    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A console over any reader/writer pair.
///
/// Pending output is flushed before every blocking read, so an interactive
/// program sees its prompt before it waits for input.
pub struct StreamConsole<R, W> {
    input: R,
    output: W,
}

impl<R: Read, W: Write> StreamConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Take the reader and writer back.
    pub fn into_parts(self) -> (R, W) {
        (self.input, self.output)
    }

    pub fn output(&self) -> &W {
        &self.output
    }
}

impl<R: Read, W: Write> Console for StreamConsole<R, W> {
    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        self.output.flush()?;
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        self.output.write_all(&[byte])
    }

    fn flush(&mut self) -> io::Result<()> {
        self.output.flush()
    }
}

/// Console wired to the process's stdin and stdout.
pub type StdConsole = StreamConsole<io::Stdin, BufWriter<io::Stdout>>;

impl StdConsole {
    pub fn stdio() -> Self {
        StreamConsole::new(io::stdin(), BufWriter::new(io::stdout()))
    }
}

/// In-memory console: reads from a byte slice, collects output in a `Vec`.
pub type BufferConsole<'a> = StreamConsole<&'a [u8], Vec<u8>>;

impl<'a> BufferConsole<'a> {
    pub fn with_input(input: &'a [u8]) -> Self {
        StreamConsole::new(input, Vec::new())
    }

    /// Output written so far.
    pub fn written(&self) -> &[u8] {
        &self.output
    }
}
