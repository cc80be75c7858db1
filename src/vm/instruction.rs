// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use byteorder::{BigEndian, ByteOrder};
use crate::vm::dispatch::{self, OpcodeEntry, Shape};
use crate::vm::fault::FaultKind;
use crate::vm::memory::Memory;
use crate::vm::opcode::{self, Opcode};
use crate::vm::operands;
use std::fmt;

/// Widest instruction in the set (MOVE16: opcode plus two 16-bit addresses).
pub const MAX_WIDTH: usize = 5;

/// A decoded instruction. The raw bytes are copied out of memory at decode
/// time, so the operands stay stable even if the instruction overwrites
/// itself while executing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    pub ip: u32,
    pub opcode: Opcode,
    bytes: [u8; MAX_WIDTH],
    width: u8,
}

impl Instruction {
    /// Decodes the instruction at `ip`, checking that the instruction pointer
    /// is inside memory, that the opcode is known and that every operand byte
    /// it needs is present.
    pub fn decode(memory: &Memory, ip: u32) -> Result<Instruction, FaultKind> {
        if !operands::is_valid_address(ip) {
            return Err(FaultKind::IpOutOfBounds);
        }

        let byte = memory.read_u8(ip as u16);
        let entry = dispatch::lookup(byte).ok_or(FaultKind::UnknownOpcode(byte))?;
        if !operands::has_operands(ip, entry.width as u32) {
            return Err(FaultKind::TruncatedInstruction);
        }

        let raw = memory
            .slice(ip, entry.width as u32)
            .ok_or(FaultKind::TruncatedInstruction)?;
        let mut bytes = [0; MAX_WIDTH];
        bytes[..raw.len()].copy_from_slice(raw);

        Ok(Instruction {
            ip: ip,
            opcode: entry.opcode,
            bytes: bytes,
            width: entry.width,
        })
    }

    /// Operand byte `n`, counting the first byte after the opcode as 1.
    #[inline(always)]
    pub fn byte(&self, n: usize) -> u8 {
        self.bytes[n]
    }

    /// Big-endian 16-bit operand starting at operand byte `n`.
    #[inline(always)]
    pub fn word(&self, n: usize) -> u16 {
        BigEndian::read_u16(&self.bytes[n..n + 2])
    }

    /// Bytes consumed, opcode included.
    #[inline(always)]
    pub fn width(&self) -> u32 {
        self.width as u32
    }

    /// Address of the instruction that follows this one in memory.
    #[inline(always)]
    pub fn next(&self) -> u32 {
        self.ip + self.width()
    }

    pub fn entry(&self) -> &'static OpcodeEntry {
        dispatch::entry(self.opcode)
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let entry = self.entry();
        let name = entry.mnemonic;
        match entry.shape {
            Shape::Bare => write!(f, "{}", name),
            Shape::Unary => write!(f, "{} [{:02X}]", name, self.byte(1)),
            Shape::Read => write!(f, "{} -> [{:02X}]", name, self.byte(1)),
            Shape::Store => write!(f, "{} [{:02X}] <- {:02X}", name, self.byte(1), self.byte(2)),
            Shape::Copy => write!(f, "{} [{:02X}] -> [{:02X}]", name, self.byte(1), self.byte(2)),
            Shape::Binary => write!(
                f,
                "{} [{:02X}] [{:02X}] -> [{:02X}]",
                name,
                self.byte(1),
                self.byte(2),
                self.byte(3)
            ),
            Shape::Jump => write!(f, "{} {:02X}", name, self.byte(1)),
            Shape::JumpIfZero => write!(f, "{} {:02X} if [{:02X}]==0", name, self.byte(1), self.byte(2)),
            Shape::Skip => write!(f, "{} (len={})", name, self.byte(1)),
            Shape::Store16 => write!(f, "{} [{:04X}] <- {:02X}", name, self.word(1), self.byte(3)),
            Shape::Copy16 => write!(f, "{} [{:04X}] -> [{:04X}]", name, self.word(1), self.word(3)),
            Shape::Jump16 => write!(f, "{} {:04X}", name, self.word(1)),
            Shape::JumpIfZero16 => write!(f, "{} {:04X} if [{:02X}]==0", name, self.word(1), self.byte(3)),
        }
    }
}

/// Disassembles whatever sits at `ip`, including instructions that would
/// fault if executed. Never touches machine state.
pub fn disassemble(memory: &Memory, ip: u32) -> String {
    match Instruction::decode(memory, ip) {
        Ok(instr) => instr.to_string(),
        Err(FaultKind::IpOutOfBounds) => String::from("<OUT OF BOUNDS>"),
        Err(_) => {
            let byte = memory.read_u8(ip as u16);
            match dispatch::lookup(byte) {
                Some(entry) => format!("{} <truncated>", entry.mnemonic),
                None if opcode::is_reserved(byte) => format!("RESERVED {:#04X}", byte),
                None => format!("UNKNOWN {:#04X}", byte),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_with(addr: u16, bytes: &[u8]) -> Memory {
        let mut memory = Memory::new();
        memory.memdump(addr, bytes);
        memory
    }

    #[test]
    fn decodes_operands_and_width() {
        let memory = memory_with(0x10, &[0x1B, 0x01, 0x00, 0x02, 0x00]);
        let instr = Instruction::decode(&memory, 0x10).unwrap();
        assert_eq!(instr.opcode, Opcode::MOVE16);
        assert_eq!(instr.width(), 5);
        assert_eq!(instr.next(), 0x15);
        assert_eq!(instr.word(1), 0x0100);
        assert_eq!(instr.word(3), 0x0200);
    }

    #[test]
    fn rejects_bad_instruction_pointers_and_opcodes() {
        let memory = memory_with(0, &[0x1F, 0xFF]);
        assert_eq!(Instruction::decode(&memory, 0x10000), Err(FaultKind::IpOutOfBounds));
        assert_eq!(Instruction::decode(&memory, 0), Err(FaultKind::UnknownOpcode(0x1F)));
        assert_eq!(Instruction::decode(&memory, 1), Err(FaultKind::UnknownOpcode(0xFF)));
    }

    #[test]
    fn rejects_operands_running_off_the_end() {
        let memory = memory_with(0xFFFE, &[0x01, 0x00]);
        assert_eq!(
            Instruction::decode(&memory, 0xFFFE),
            Err(FaultKind::TruncatedInstruction)
        );
        let memory = memory_with(0xFFFF, &[0x08]);
        assert!(Instruction::decode(&memory, 0xFFFF).is_ok());
    }

    #[test]
    fn disassembles_each_shape() {
        let cases: &[(&[u8], &str)] = &[
            (&[0x00], "NOP"),
            (&[0x01, 0x00, 0x41], "POKE [00] <- 41"),
            (&[0x02, 0x10, 0x20], "MOVE [10] -> [20]"),
            (&[0x03, 0x05], "NOT [05]"),
            (&[0x14, 0x01, 0x02, 0x03], "ADD [01] [02] -> [03]"),
            (&[0x06, 0x10, 0x20], "JZ 10 if [20]==0"),
            (&[0x07, 0x30], "RUN 30"),
            (&[0x0F, 0x03], "COMMENT (len=3)"),
            (&[0x12, 0x40], "GETC -> [40]"),
            (&[0x1A, 0x12, 0x34, 0x56], "POKE16 [1234] <- 56"),
            (&[0x1B, 0x01, 0x00, 0x02, 0x00], "MOVE16 [0100] -> [0200]"),
            (&[0x1C, 0xFF, 0xFF], "JMP16 FFFF"),
            (&[0x1D, 0x01, 0x00, 0x07], "JZ16 0100 if [07]==0"),
        ];
        for &(bytes, text) in cases {
            let memory = memory_with(0, bytes);
            assert_eq!(disassemble(&memory, 0), text);
        }
    }

    #[test]
    fn disassembles_faulting_positions() {
        let memory = memory_with(0, &[0x20, 0x40]);
        assert_eq!(disassemble(&memory, 0), "RESERVED 0x20");
        assert_eq!(disassemble(&memory, 1), "UNKNOWN 0x40");
        assert_eq!(disassemble(&memory, 0x10000), "<OUT OF BOUNDS>");

        let memory = memory_with(0xFFFF, &[0x14]);
        assert_eq!(disassemble(&memory, 0xFFFF), "ADD <truncated>");
    }
}
