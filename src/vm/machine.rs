// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::io::console::Console;
use crate::io::loader::Program;
use crate::io::log;
use crate::vm::cpu::CPU;
use crate::vm::dispatch::Flow;
use crate::vm::fault::{Fault, FaultKind, Halt, Outcome};
use crate::vm::instruction::{self, Instruction};
use crate::vm::memory::Memory;
use crate::vm::stack::CallStack;

/// Ceiling on dispatched instructions per run. Runaway control flow is
/// stopped by this and nothing else.
pub const MAX_INSTRUCTIONS: u32 = 1_000_000;

/// Options passed from the command-line that influence how the machine
/// behaves and how chatty it is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeOptions {
    // Log loading and execution milestones.
    pub verbose: bool,
    // Log every dispatched instruction and call stack operation.
    pub trace: bool,
    pub max_instructions: u32,
}

impl Default for RuntimeOptions {
    fn default() -> RuntimeOptions {
        RuntimeOptions {
            verbose: false,
            trace: false,
            max_instructions: MAX_INSTRUCTIONS,
        }
    }
}

/// Where the engine stands after a step that did not fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Running,
    Halted,
}

/// A complete machine instance. Every piece of state lives here, so separate
/// instances never share anything.
pub struct Machine {
    pub cpu: CPU,
    pub memory: Memory,
    pub stack: CallStack,
    pub runtime_options: RuntimeOptions,
}

impl Machine {
    pub fn new(runtime_options: RuntimeOptions) -> Machine {
        Machine {
            cpu: CPU::new(),
            memory: Memory::new(),
            stack: CallStack::new(),
            runtime_options: runtime_options,
        }
    }

    /// Clears memory and copies a loaded program image to address 0.
    pub fn load(&mut self, program: &Program) {
        self.memory.reset();
        let count = self.memory.memdump(0, &program.bytes);
        log::log(
            "loader",
            format!("Loaded {} bytes ({:#06X})", count, count),
            &self.runtime_options,
        );
    }

    /// Resets registers and the call stack, leaving memory as it is.
    pub fn reset(&mut self, start: u16) {
        self.cpu.reset(start);
        self.stack.clear();
    }

    /// Executes a single instruction: checks the watchdog, decodes at the
    /// instruction pointer and dispatches to the opcode's handler.
    pub fn step(&mut self, console: &mut dyn Console) -> Result<State, Fault> {
        if self.cpu.instruction_count >= self.runtime_options.max_instructions {
            return Err(self.fault(FaultKind::InstructionLimitExceeded));
        }
        self.cpu.instruction_count += 1;

        let ip = self.cpu.ip;
        if self.runtime_options.trace {
            log::trace(
                format!("[{:04X}] {}", ip, instruction::disassemble(&self.memory, ip)),
                &self.runtime_options,
            );
        }

        let instr = Instruction::decode(&self.memory, ip).map_err(|kind| self.fault(kind))?;
        let handler = instr.entry().handler;
        match handler(self, &instr, console) {
            Ok(Flow::Continue(next)) => {
                self.cpu.ip = next;
                Ok(State::Running)
            }
            Ok(Flow::Stop) => Ok(State::Halted),
            Err(kind) => Err(self.fault(kind)),
        }
    }

    /// Runs from `start` until the program halts or faults.
    pub fn run(&mut self, start: u16, console: &mut dyn Console) -> Outcome {
        self.reset(start);
        log::log(
            "vm",
            format!("Starting execution at {:#06X}", start),
            &self.runtime_options,
        );

        let halt = loop {
            match self.step(console) {
                Ok(State::Running) => {}
                Ok(State::Halted) => break Halt::Normal,
                Err(fault) => break Halt::Fault(fault),
            }
        };

        log::log(
            "vm",
            format!("Execution ended. Instructions executed: {}", self.cpu.instruction_count),
            &self.runtime_options,
        );
        self.outcome(halt)
    }

    /// Snapshot of the registers a caller reports on after a run.
    pub fn outcome(&self, halt: Halt) -> Outcome {
        Outcome {
            halt: halt,
            ip: self.cpu.ip,
            instruction_count: self.cpu.instruction_count,
            overflow: self.cpu.overflow_flag_set(),
            stack_depth: self.stack.depth(),
        }
    }

    fn fault(&self, kind: FaultKind) -> Fault {
        Fault {
            kind: kind,
            ip: self.cpu.ip,
            instruction_count: self.cpu.instruction_count,
        }
    }
}
