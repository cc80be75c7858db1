// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use crate::vm::fault::FaultKind;

/// Maximum number of return addresses the call stack can hold.
pub const STACK_SIZE: usize = 64;

/// Fixed-depth LIFO of 16-bit return addresses. The stack pointer is the
/// number of live entries, so it doubles as the current call depth.
pub struct CallStack {
    entries: [u16; STACK_SIZE],
    sp: usize,
}

impl CallStack {
    pub fn new() -> CallStack {
        CallStack {
            entries: [0; STACK_SIZE],
            sp: 0,
        }
    }

    /// Pushes a return address. Fails once all 64 slots are taken.
    pub fn push(&mut self, addr: u16) -> Result<(), FaultKind> {
        if self.sp >= STACK_SIZE {
            return Err(FaultKind::StackOverflow);
        }
        self.entries[self.sp] = addr;
        self.sp += 1;
        Ok(())
    }

    /// Pops the most recently pushed return address.
    pub fn pop(&mut self) -> Result<u16, FaultKind> {
        if self.sp == 0 {
            return Err(FaultKind::StackUnderflow);
        }
        self.sp -= 1;
        Ok(self.entries[self.sp])
    }

    #[inline(always)]
    pub fn depth(&self) -> usize {
        self.sp
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.sp == 0
    }

    pub fn clear(&mut self) {
        self.entries = [0; STACK_SIZE];
        self.sp = 0;
    }
}

impl Default for CallStack {
    fn default() -> CallStack {
        CallStack::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sixty_fourth_push_is_the_last() {
        let mut stack = CallStack::new();
        for i in 0..STACK_SIZE {
            assert_eq!(stack.push(i as u16), Ok(()));
        }
        assert_eq!(stack.depth(), STACK_SIZE);
        assert_eq!(stack.push(0xBEEF), Err(FaultKind::StackOverflow));
        assert_eq!(stack.depth(), STACK_SIZE);
        assert_eq!(stack.pop(), Ok(63));
    }

    #[test]
    fn pops_in_reverse_order() {
        let mut stack = CallStack::new();
        stack.push(0x0102).unwrap();
        stack.push(0xFFFF).unwrap();
        assert_eq!(stack.pop(), Ok(0xFFFF));
        assert_eq!(stack.pop(), Ok(0x0102));
        assert!(stack.is_empty());
    }

    #[test]
    fn pop_on_empty_underflows() {
        let mut stack = CallStack::new();
        assert_eq!(stack.pop(), Err(FaultKind::StackUnderflow));

        stack.push(1).unwrap();
        stack.clear();
        assert_eq!(stack.pop(), Err(FaultKind::StackUnderflow));
    }
}
