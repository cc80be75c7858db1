// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use std::fmt;

// Flag constants that allow easy bitwise getting and setting of flag values.
pub const OVERFLOW_FLAG: u8 = 0x1;

/// Register file of the machine. Memory and the call stack live next to it in
/// `Machine`; everything the dispatcher mutates besides those is here.
pub struct CPU {
    // The instruction pointer is wider than the address space on purpose: an
    // instruction that ends exactly at the top of memory leaves it at 0x10000,
    // which the next fetch rejects instead of silently wrapping to zero.
    pub ip: u32,

    // Status register. Only the overflow bit is defined; it is written by
    // ADD, SUB and MUL and left alone by everything else.
    pub p: u8,

    // Number of instructions dispatched in the current run. Checked against
    // the configured ceiling before every fetch.
    pub instruction_count: u32,
}

impl CPU {
    pub fn new() -> CPU {
        CPU {
            ip: 0,
            p: 0,
            instruction_count: 0,
        }
    }

    /// Puts the registers back to their power-on state with the instruction
    /// pointer at `start`.
    pub fn reset(&mut self, start: u16) {
        self.ip = start as u32;
        self.p = 0;
        self.instruction_count = 0;
    }

    /// Sets the overflow flag in the status register.
    #[inline(always)]
    pub fn set_overflow_flag(&mut self) {
        self.p |= OVERFLOW_FLAG;
    }

    /// Unsets the overflow flag in the status register.
    #[inline(always)]
    pub fn unset_overflow_flag(&mut self) {
        self.p &= !OVERFLOW_FLAG;
    }

    #[inline(always)]
    pub fn overflow_flag_set(&self) -> bool {
        self.p & OVERFLOW_FLAG == OVERFLOW_FLAG
    }

    /// Sets the overflow flag if the passed overflow is true, otherwise the
    /// flag is unset.
    #[inline(always)]
    pub fn toggle_overflow_flag(&mut self, overflow: bool) {
        if overflow {
            self.set_overflow_flag();
        } else {
            self.unset_overflow_flag();
        }
    }

    /// Returns "SET" if the passed boolean is true, otherwise "UNSET".
    fn fmt_flag(flag: bool) -> &'static str {
        if flag { "SET" } else { "UNSET" }
    }
}

impl Default for CPU {
    fn default() -> CPU {
        CPU::new()
    }
}

impl fmt::Display for CPU {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "CPU State:")?;
        writeln!(f, "    Instruction Pointer: {:#06X}", self.ip)?;
        writeln!(f, "    Instructions:        {}", self.instruction_count)?;
        writeln!(f, "Status Register: {:#X}", self.p)?;
        write!(f, "    Overflow Flag:       {}", CPU::fmt_flag(self.overflow_flag_set()))
    }
}
