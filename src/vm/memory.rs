// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

/// Size of the unified code and data address space.
pub const MEMORY_SIZE: usize = 0x10000;

// Bytes shown per row of a memory dump.
const DUMP_ROW_LEN: u32 = 16;

/// Flat 64K memory holding both the program and its data. Addresses are
/// 16-bit so every access through `read_u8`/`write_u8` is in bounds by
/// construction; wider cursors (the instruction pointer, computed jump
/// targets) must go through the operand validator first.
pub struct Memory {
    bytes: Box<[u8]>,
}

impl Memory {
    pub fn new() -> Memory {
        Memory {
            bytes: vec![0; MEMORY_SIZE].into_boxed_slice(),
        }
    }

    /// Zeroes every byte.
    pub fn reset(&mut self) {
        for byte in self.bytes.iter_mut() {
            *byte = 0;
        }
    }

    /// Reads the byte at the given address.
    #[inline(always)]
    pub fn read_u8(&self, addr: u16) -> u8 {
        self.bytes[addr as usize]
    }

    /// Writes a byte to the given address.
    #[inline(always)]
    pub fn write_u8(&mut self, addr: u16, val: u8) {
        self.bytes[addr as usize] = val;
    }

    /// Borrows `len` bytes starting at `addr`, or `None` if any of them lie
    /// outside memory.
    pub fn slice(&self, addr: u32, len: u32) -> Option<&[u8]> {
        let start = addr as usize;
        let end = start.checked_add(len as usize)?;
        self.bytes.get(start..end)
    }

    /// Copies an image into memory starting at `addr`. Bytes that would land
    /// past the end are dropped; the number of bytes written is returned.
    pub fn memdump(&mut self, addr: u16, buf: &[u8]) -> usize {
        let start = addr as usize;
        let count = buf.len().min(MEMORY_SIZE - start);
        self.bytes[start..start + count].copy_from_slice(&buf[..count]);
        count
    }

    /// Returns a printable hex dump of the inclusive range `start..=end`.
    /// Out of range bounds are clamped and reversed bounds swapped.
    pub fn dump(&self, start: u32, end: u32) -> MemoryDump<'_> {
        let last = MEMORY_SIZE as u32 - 1;
        let start = if start > last { 0 } else { start };
        let end = end.min(last);
        let (start, end) = if start > end { (end, start) } else { (start, end) };

        MemoryDump {
            memory: self,
            start: start,
            end: end,
        }
    }
}

impl Default for Memory {
    fn default() -> Memory {
        Memory::new()
    }
}

/// Borrowed view over a memory range, rendered through `Display`.
pub struct MemoryDump<'a> {
    memory: &'a Memory,
    start: u32,
    end: u32,
}

impl<'a> fmt::Display for MemoryDump<'a> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "--- Memory Dump ({:#06X}-{:#06X}) ---", self.start, self.end)?;
        for addr in self.start..=self.end {
            let byte = self.memory.bytes[addr as usize];
            if (addr - self.start) % DUMP_ROW_LEN == 0 {
                write!(f, "\n{:04X}: {:02X}", addr, byte)?;
            } else {
                write!(f, " {:02X}", byte)?;
            }
        }
        writeln!(f)
    }
}
