// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::log;
use crate::vm::memory::MEMORY_SIZE;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Reasons a program text can fail to load. Any of these stops the run
/// before a single instruction executes.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read program: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid character {byte:#04X} at line {line}, column {column}")]
    InvalidCharacter { byte: u8, line: u32, column: u32 },
    #[error("incomplete hex byte at end of input (line {line}, column {column})")]
    IncompleteByte { line: u32, column: u32 },
}

/// Memory image produced from program text, destined for address 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub bytes: Vec<u8>,
    // Set when the text held more bytes than memory; the excess was dropped.
    pub truncated: bool,
}

/// Reads a program text file at a given path and parses it.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Program, LoadError> {
    let mut buffer: Vec<u8> = Vec::new();
    let mut file = File::open(path)?;
    file.read_to_end(&mut buffer)?;
    parse_source(&buffer)
}

/// Parses program text: pairs of hex digits form consecutive bytes, ASCII
/// whitespace is ignored and `;` or `#` comment out the rest of a line.
///
/// Text that would overflow memory is not an error. Loading stops at the
/// first byte that does not fit and everything after it is ignored, even
/// characters that would otherwise be rejected.
pub fn parse_source(source: &[u8]) -> Result<Program, LoadError> {
    let mut bytes: Vec<u8> = Vec::new();
    let mut truncated = false;
    let mut in_comment = false;
    let mut pending: Option<u8> = None;
    let (mut line, mut column) = (1u32, 0u32);

    for &c in source {
        column += 1;

        if c == b'\n' {
            in_comment = false;
            line += 1;
            column = 0;
            continue;
        }
        if in_comment {
            continue;
        }
        if c == b';' || c == b'#' {
            in_comment = true;
            continue;
        }
        if is_space(c) {
            continue;
        }

        let digit = hex_value(c).ok_or(LoadError::InvalidCharacter {
            byte: c,
            line: line,
            column: column,
        })?;
        match pending.take() {
            None => pending = Some(digit),
            Some(high) => {
                if bytes.len() >= MEMORY_SIZE {
                    log::warn(format!("Memory full at {} bytes, truncating", MEMORY_SIZE));
                    truncated = true;
                    break;
                }
                bytes.push(high << 4 | digit);
            }
        }
    }

    if pending.is_some() && !truncated {
        return Err(LoadError::IncompleteByte {
            line: line,
            column: column,
        });
    }

    Ok(Program {
        bytes: bytes,
        truncated: truncated,
    })
}

/// Whitespace as the C locale sees it, vertical tab and form feed included.
fn is_space(c: u8) -> bool {
    match c {
        b' ' | b'\t' | b'\n' | b'\r' | 0x0B | 0x0C => true,
        _ => false,
    }
}

fn hex_value(c: u8) -> Option<u8> {
    (c as char).to_digit(16).map(|d| d as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_digit_pairs_in_either_case() {
        let program = parse_source(b"01 00 41\n10 00 08").unwrap();
        assert_eq!(program.bytes, vec![0x01, 0x00, 0x41, 0x10, 0x00, 0x08]);
        assert!(!program.truncated);

        let program = parse_source(b"aBcD\tEf").unwrap();
        assert_eq!(program.bytes, vec![0xAB, 0xCD, 0xEF]);
    }

    #[test]
    fn digits_of_a_byte_may_be_split_by_whitespace() {
        let program = parse_source(b"0\n1").unwrap();
        assert_eq!(program.bytes, vec![0x01]);
    }

    #[test]
    fn comments_run_to_end_of_line() {
        let source = b"; header zz\n01 00 41 # poke 'A' (not hex!)\r\n08";
        let program = parse_source(source).unwrap();
        assert_eq!(program.bytes, vec![0x01, 0x00, 0x41, 0x08]);
    }

    #[test]
    fn empty_source_is_an_empty_program() {
        let program = parse_source(b"  \n# nothing\n").unwrap();
        assert!(program.bytes.is_empty());
    }

    #[test]
    fn rejects_non_hex_characters_with_position() {
        match parse_source(b"01 02\n03 g4") {
            Err(LoadError::InvalidCharacter { byte, line, column }) => {
                assert_eq!(byte, b'g');
                assert_eq!(line, 2);
                assert_eq!(column, 4);
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(parse_source(&[0xC3, 0xA9]).is_err());
    }

    #[test]
    fn rejects_odd_digit_count() {
        match parse_source(b"01 0") {
            Err(LoadError::IncompleteByte { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn oversized_source_truncates_instead_of_failing() {
        let mut source = "00".repeat(MEMORY_SIZE);
        source.push_str(" 11 22 zz");
        let program = parse_source(source.as_bytes()).unwrap();
        assert!(program.truncated);
        assert_eq!(program.bytes.len(), MEMORY_SIZE);
        assert!(program.bytes.iter().all(|&b| b == 0));
    }

    #[test]
    fn exactly_full_source_is_not_truncated() {
        let source = "FF".repeat(MEMORY_SIZE);
        let program = parse_source(source.as_bytes()).unwrap();
        assert!(!program.truncated);
        assert_eq!(program.bytes.len(), MEMORY_SIZE);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        match load_file("/nonexistent/program.hex") {
            Err(LoadError::Io(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
