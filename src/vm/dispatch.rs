// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Opcode table and the semantic action behind every entry. The table is the
//! only place that knows an opcode's width, so the decoder's bounds check and
//! the handler that consumes the operands can never disagree.

use crate::io::console::Console;
use crate::io::log;
use crate::utils::arithmetic;
use crate::vm::fault::FaultKind;
use crate::vm::instruction::Instruction;
use crate::vm::machine::Machine;
use crate::vm::opcode::{decode_opcode, Opcode};
use crate::vm::operands;

/// What the engine should do once a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Keep running with the instruction pointer at this address.
    Continue(u32),
    /// Stop the machine normally.
    Stop,
}

/// Executes one decoded instruction against the machine. Returns the next
/// instruction pointer, a request to stop, or the fault that ends the run.
pub type Handler = fn(&mut Machine, &Instruction, &mut dyn Console) -> Result<Flow, FaultKind>;

/// Operand layout of an instruction, used for disassembly and to tell 8-bit
/// addressing forms from 16-bit ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Bare,         // OP
    Unary,        // OP [a]
    Read,         // OP -> [a]
    Store,        // OP [a] <- v
    Copy,         // OP [s] -> [d]
    Binary,       // OP [a] [b] -> [d]
    Jump,         // OP a
    JumpIfZero,   // OP a if [c]==0
    Skip,         // OP len, then len bytes of payload
    Store16,      // OP [aaaa] <- v
    Copy16,       // OP [ssss] -> [dddd]
    Jump16,       // OP aaaa
    JumpIfZero16, // OP aaaa if [c]==0
}

impl Shape {
    /// Number of operand bytes that follow the opcode.
    pub fn operand_len(&self) -> u8 {
        match *self {
            Shape::Bare => 0,
            Shape::Unary | Shape::Read | Shape::Jump | Shape::Skip => 1,
            Shape::Store | Shape::Copy | Shape::JumpIfZero | Shape::Jump16 => 2,
            Shape::Binary | Shape::Store16 | Shape::JumpIfZero16 => 3,
            Shape::Copy16 => 4,
        }
    }
}

pub struct OpcodeEntry {
    pub opcode: Opcode,
    pub mnemonic: &'static str,
    // Bytes consumed including the opcode itself. COMMENT's payload is not
    // counted here; its handler checks it separately.
    pub width: u8,
    pub shape: Shape,
    pub handler: Handler,
}

macro_rules! op {
    ($opcode:ident, $width:expr, $shape:ident, $handler:ident) => {
        OpcodeEntry {
            opcode: Opcode::$opcode,
            mnemonic: stringify!($opcode),
            width: $width,
            shape: Shape::$shape,
            handler: $handler,
        }
    };
}

// Indexed by opcode byte. Adding an instruction means adding a variant to
// `Opcode` and a row here; the run loop does not change.
static OPCODE_TABLE: [OpcodeEntry; 31] = [
    op!(NOP,     1, Bare,         nop),
    op!(POKE,    3, Store,        poke),
    op!(MOVE,    3, Copy,         move_byte),
    op!(NOT,     2, Unary,        not),
    op!(NAND,    4, Binary,       nand),
    op!(JMP,     2, Jump,         jmp),
    op!(JZ,      3, JumpIfZero,   jz),
    op!(RUN,     2, Jump,         run),
    op!(HALT,    1, Bare,         halt),
    op!(AND,     4, Binary,       and),
    op!(OR,      4, Binary,       or),
    op!(XOR,     4, Binary,       xor),
    op!(INC,     2, Unary,        inc),
    op!(DEC,     2, Unary,        dec),
    op!(CMP,     4, Binary,       cmp),
    op!(COMMENT, 2, Skip,         comment),
    op!(PUTC,    2, Unary,        putc),
    op!(PUTN,    2, Unary,        putn),
    op!(GETC,    2, Read,         getc),
    op!(RET,     1, Bare,         ret),
    op!(ADD,     4, Binary,       add),
    op!(SUB,     4, Binary,       sub),
    op!(MUL,     4, Binary,       mul),
    op!(DIV,     4, Binary,       div),
    op!(SHL,     4, Binary,       shl),
    op!(SHR,     4, Binary,       shr),
    op!(POKE16,  4, Store16,      poke16),
    op!(MOVE16,  5, Copy16,       move16),
    op!(JMP16,   3, Jump16,       jmp16),
    op!(JZ16,    4, JumpIfZero16, jz16),
    op!(RUN16,   3, Jump16,       run16),
];

/// Table entry for an opcode byte, or `None` if nothing is assigned to it.
pub fn lookup(byte: u8) -> Option<&'static OpcodeEntry> {
    decode_opcode(byte).map(entry)
}

/// Table entry for an already decoded opcode.
#[inline(always)]
pub fn entry(opcode: Opcode) -> &'static OpcodeEntry {
    &OPCODE_TABLE[opcode as usize]
}

// Helpers shared by the handlers.

/// Turns a computed address into a memory index, faulting if it lies outside
/// memory. Every 16-bit operand goes through here before it is used.
#[inline(always)]
fn checked_address(addr: u32) -> Result<u16, FaultKind> {
    if operands::is_valid_address(addr) {
        Ok(addr as u16)
    } else {
        Err(FaultKind::InvalidAddress(addr))
    }
}

/// Pushes the return address and transfers control to `target`.
fn call(m: &mut Machine, ret: u32, target: u32) -> Result<Flow, FaultKind> {
    let ret = checked_address(ret)?;
    m.stack.push(ret)?;
    log::trace(
        format!("  [STACK] Push {:#06X} (SP={})", ret, m.stack.depth()),
        &m.runtime_options,
    );
    Ok(Flow::Continue(target))
}

/// Pops a return address and resumes there.
fn return_from_call(m: &mut Machine) -> Result<Flow, FaultKind> {
    let addr = m.stack.pop()?;
    log::trace(
        format!("  [STACK] Pop {:#06X} (SP={})", addr, m.stack.depth()),
        &m.runtime_options,
    );
    Ok(Flow::Continue(addr as u32))
}

/// `[d] := op([a], [b])` for the three-address byte operations.
#[inline(always)]
fn binary(m: &mut Machine, i: &Instruction, op: fn(u8, u8) -> u8) -> Result<Flow, FaultKind> {
    let a = m.memory.read_u8(i.byte(1) as u16);
    let b = m.memory.read_u8(i.byte(2) as u16);
    m.memory.write_u8(i.byte(3) as u16, op(a, b));
    Ok(Flow::Continue(i.next()))
}

/// Like `binary`, but the operation also reports overflow, which replaces
/// the flag unconditionally.
#[inline(always)]
fn arithmetic_op(m: &mut Machine, i: &Instruction, op: fn(u8, u8) -> (u8, bool)) -> Result<Flow, FaultKind> {
    let a = m.memory.read_u8(i.byte(1) as u16);
    let b = m.memory.read_u8(i.byte(2) as u16);
    let (result, overflow) = op(a, b);
    m.memory.write_u8(i.byte(3) as u16, result);
    m.cpu.toggle_overflow_flag(overflow);
    Ok(Flow::Continue(i.next()))
}

#[inline(always)]
fn unary(m: &mut Machine, i: &Instruction, op: fn(u8) -> u8) -> Result<Flow, FaultKind> {
    let addr = i.byte(1) as u16;
    let value = m.memory.read_u8(addr);
    m.memory.write_u8(addr, op(value));
    Ok(Flow::Continue(i.next()))
}

fn write_console(console: &mut dyn Console, bytes: &[u8]) -> Result<(), FaultKind> {
    console.write_bytes(bytes).map_err(|e| FaultKind::Io(e.kind()))
}

// Core.

fn nop(_: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    Ok(Flow::Continue(i.next()))
}

fn poke(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    m.memory.write_u8(i.byte(1) as u16, i.byte(2));
    Ok(Flow::Continue(i.next()))
}

fn move_byte(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    let value = m.memory.read_u8(i.byte(1) as u16);
    m.memory.write_u8(i.byte(2) as u16, value);
    Ok(Flow::Continue(i.next()))
}

fn not(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    unary(m, i, |v| !v)
}

fn nand(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    binary(m, i, arithmetic::nand)
}

fn jmp(_: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    Ok(Flow::Continue(i.byte(1) as u32))
}

fn jz(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    if m.memory.read_u8(i.byte(2) as u16) == 0 {
        Ok(Flow::Continue(i.byte(1) as u32))
    } else {
        Ok(Flow::Continue(i.next()))
    }
}

fn run(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    call(m, i.next(), i.byte(1) as u32)
}

/// HALT returns from the innermost call when one is active and only stops
/// the machine once the call stack is empty.
fn halt(m: &mut Machine, _: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    if m.stack.is_empty() {
        Ok(Flow::Stop)
    } else {
        return_from_call(m)
    }
}

fn and(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    binary(m, i, |a, b| a & b)
}

fn or(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    binary(m, i, |a, b| a | b)
}

fn xor(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    binary(m, i, |a, b| a ^ b)
}

fn inc(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    unary(m, i, |v| v.wrapping_add(1))
}

fn dec(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    unary(m, i, |v| v.wrapping_sub(1))
}

fn cmp(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    binary(m, i, arithmetic::cmp)
}

/// Skips the length byte plus that many payload bytes. The payload must fit
/// in memory; landing exactly on the end is allowed and faults on the next
/// fetch instead.
fn comment(_: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    let len = i.byte(1) as u32;
    if !operands::has_operands(i.ip, i.width() + len) {
        return Err(FaultKind::TruncatedInstruction);
    }
    Ok(Flow::Continue(i.next() + len))
}

// Console I/O and return.

fn putc(m: &mut Machine, i: &Instruction, console: &mut dyn Console) -> Result<Flow, FaultKind> {
    let value = m.memory.read_u8(i.byte(1) as u16);
    write_console(console, &[value])?;
    Ok(Flow::Continue(i.next()))
}

fn putn(m: &mut Machine, i: &Instruction, console: &mut dyn Console) -> Result<Flow, FaultKind> {
    let value = m.memory.read_u8(i.byte(1) as u16);
    write_console(console, value.to_string().as_bytes())?;
    Ok(Flow::Continue(i.next()))
}

fn getc(m: &mut Machine, i: &Instruction, console: &mut dyn Console) -> Result<Flow, FaultKind> {
    let value = console
        .read_byte()
        .map_err(|e| FaultKind::Io(e.kind()))?
        .unwrap_or(0);
    m.memory.write_u8(i.byte(1) as u16, value);
    Ok(Flow::Continue(i.next()))
}

fn ret(m: &mut Machine, _: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    if m.stack.is_empty() {
        return Err(FaultKind::RetWithEmptyStack);
    }
    return_from_call(m)
}

// Arithmetic and shifts.

fn add(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    arithmetic_op(m, i, arithmetic::add)
}

fn sub(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    arithmetic_op(m, i, arithmetic::sub)
}

fn mul(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    arithmetic_op(m, i, arithmetic::mul)
}

fn div(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    let a = m.memory.read_u8(i.byte(1) as u16);
    let b = m.memory.read_u8(i.byte(2) as u16);
    let quotient = arithmetic::div(a, b).ok_or(FaultKind::DivisionByZero)?;
    m.memory.write_u8(i.byte(3) as u16, quotient);
    Ok(Flow::Continue(i.next()))
}

fn shl(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    binary(m, i, arithmetic::shl)
}

fn shr(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    binary(m, i, arithmetic::shr)
}

// 16-bit addressing. Addresses are validated before any memory is touched so
// a fault on one operand leaves memory unchanged.

fn poke16(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    let addr = checked_address(i.word(1) as u32)?;
    m.memory.write_u8(addr, i.byte(3));
    Ok(Flow::Continue(i.next()))
}

fn move16(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    let src = checked_address(i.word(1) as u32)?;
    let dest = checked_address(i.word(3) as u32)?;
    let value = m.memory.read_u8(src);
    m.memory.write_u8(dest, value);
    Ok(Flow::Continue(i.next()))
}

fn jmp16(_: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    let addr = checked_address(i.word(1) as u32)?;
    Ok(Flow::Continue(addr as u32))
}

fn jz16(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    let addr = checked_address(i.word(1) as u32)?;
    if m.memory.read_u8(i.byte(3) as u16) == 0 {
        Ok(Flow::Continue(addr as u32))
    } else {
        Ok(Flow::Continue(i.next()))
    }
}

fn run16(m: &mut Machine, i: &Instruction, _: &mut dyn Console) -> Result<Flow, FaultKind> {
    let addr = checked_address(i.word(1) as u32)?;
    call(m, i.next(), addr as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_indexed_by_opcode_byte() {
        for (index, entry) in OPCODE_TABLE.iter().enumerate() {
            assert_eq!(entry.opcode as usize, index, "{}", entry.mnemonic);
        }
    }

    #[test]
    fn widths_match_operand_shapes() {
        for entry in OPCODE_TABLE.iter() {
            assert_eq!(entry.width, 1 + entry.shape.operand_len(), "{}", entry.mnemonic);
        }
    }

    #[test]
    fn lookup_misses_reserved_bytes() {
        assert_eq!(lookup(0x14).map(|e| e.mnemonic), Some("ADD"));
        assert!(lookup(0x1F).is_none());
        assert!(lookup(0x36).is_none());
        assert!(lookup(0xFF).is_none());
    }

    #[test]
    fn checked_address_rejects_past_the_end() {
        assert_eq!(checked_address(0xFFFF), Ok(0xFFFF));
        assert_eq!(checked_address(0x10000), Err(FaultKind::InvalidAddress(0x10000)));
    }
}
