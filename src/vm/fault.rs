// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;
use std::io::ErrorKind;
use thiserror::Error;

/// Every way a run can die. All of them are terminal: the engine stops on the
/// spot and never dispatches another instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FaultKind {
    #[error("instruction pointer out of bounds")]
    IpOutOfBounds,
    #[error("instruction truncated by end of memory")]
    TruncatedInstruction,
    #[error("call stack overflow")]
    StackOverflow,
    #[error("call stack underflow")]
    StackUnderflow,
    #[error("address {0:#06X} out of bounds")]
    InvalidAddress(u32),
    #[error("division by zero")]
    DivisionByZero,
    #[error("RET with empty stack")]
    RetWithEmptyStack,
    #[error("unknown opcode {0:#04X}")]
    UnknownOpcode(u8),
    #[error("instruction limit exceeded, possible infinite loop")]
    InstructionLimitExceeded,
    #[error("console I/O failed: {0}")]
    Io(ErrorKind),
}

/// A fault together with where and when it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("CPU fault at {ip:#06X} (instruction {instruction_count}): {kind}")]
pub struct Fault {
    pub kind: FaultKind,
    pub ip: u32,
    pub instruction_count: u32,
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    Normal,
    Fault(Fault),
}

/// Terminal state of a run plus the machine registers a caller may want to
/// report on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub halt: Halt,
    pub ip: u32,
    pub instruction_count: u32,
    pub overflow: bool,
    pub stack_depth: usize,
}

impl Outcome {
    pub fn is_normal(&self) -> bool {
        self.halt == Halt::Normal
    }

    pub fn fault(&self) -> Option<&Fault> {
        match self.halt {
            Halt::Normal => None,
            Halt::Fault(ref fault) => Some(fault),
        }
    }

    /// Shorthand for matching on the fault kind in callers and tests.
    pub fn fault_kind(&self) -> Option<FaultKind> {
        self.fault().map(|fault| fault.kind)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.halt {
            Halt::Normal => write!(f, "halted normally")?,
            Halt::Fault(ref fault) => write!(f, "{}", fault)?,
        }
        write!(
            f,
            " [ip={:#06X} instructions={} overflow={} stack={}]",
            self.ip,
            self.instruction_count,
            if self.overflow { "SET" } else { "UNSET" },
            self.stack_depth
        )
    }
}
