// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::io::{self, ErrorKind, Read, Write};

/// The machine's view of the outside world. PUTC and PUTN write through it,
/// GETC reads from it. Reads block until a byte or end of input arrives.
pub trait Console {
    /// Writes all of `bytes` and flushes so output interleaves correctly
    /// with later reads.
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Reads a single byte. `None` signals end of input.
    fn read_byte(&mut self) -> io::Result<Option<u8>>;
}

/// Console backed by any reader/writer pair: stdin and stdout for the
/// command-line runner, byte slices and vectors under test.
pub struct StdConsole<R, W> {
    input: R,
    output: W,
}

impl<R: Read, W: Write> StdConsole<R, W> {
    pub fn new(input: R, output: W) -> Self {
        StdConsole { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: Read, W: Write> Console for StdConsole<R, W> {
    fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.output.write_all(bytes)?;
        self.output.flush()
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        let mut buf = [0u8; 1];
        loop {
            match self.input.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_until_end_of_input() {
        let mut console = StdConsole::new(&b"hi"[..], Vec::new());
        assert_eq!(console.read_byte().unwrap(), Some(b'h'));
        assert_eq!(console.read_byte().unwrap(), Some(b'i'));
        assert_eq!(console.read_byte().unwrap(), None);
        assert_eq!(console.read_byte().unwrap(), None);
    }

    #[test]
    fn writes_are_collected_in_order() {
        let mut console = StdConsole::new(io::empty(), Vec::new());
        console.write_bytes(b"4").unwrap();
        console.write_bytes(b"2").unwrap();
        assert_eq!(console.into_output(), b"42".to_vec());
    }

    struct Flaky {
        interrupted: bool,
    }

    impl Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(ErrorKind::Interrupted));
            }
            buf[0] = b'k';
            Ok(1)
        }
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let mut console = StdConsole::new(Flaky { interrupted: false }, Vec::new());
        assert_eq!(console.read_byte().unwrap(), Some(b'k'));
    }

    #[test]
    fn other_read_errors_are_returned() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::from(ErrorKind::UnexpectedEof))
            }
        }

        let mut console = StdConsole::new(Broken, Vec::new());
        let err = console.read_byte().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnexpectedEof);
    }
}
