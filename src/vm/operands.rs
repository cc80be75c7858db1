// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Bounds checks that guard every read of the instruction stream and every
//! use of a computed address. Nothing dereferences an address wider than
//! 16 bits without passing through here.

use crate::vm::memory::MEMORY_SIZE;

/// True when `needed` bytes starting at `ip` all lie inside memory.
#[inline]
pub fn has_operands(ip: u32, needed: u32) -> bool {
    let size = MEMORY_SIZE as u64;
    (ip as u64) < size && (needed as u64) <= size && ip as u64 + needed as u64 <= size
}

/// True when `addr` names a byte of memory.
#[inline]
pub fn is_valid_address(addr: u32) -> bool {
    (addr as usize) < MEMORY_SIZE
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operands_must_fit_before_the_end() {
        assert!(has_operands(0, 1));
        assert!(has_operands(0xFFFC, 4));
        assert!(has_operands(0xFFFF, 1));
        assert!(!has_operands(0xFFFD, 4));
        assert!(!has_operands(0xFFFF, 2));
    }

    #[test]
    fn ip_past_the_end_never_has_operands() {
        assert!(!has_operands(0x10000, 0));
        assert!(!has_operands(0x10000, 1));
    }

    #[test]
    fn huge_widths_do_not_wrap() {
        assert!(!has_operands(0, 0x10001));
        assert!(!has_operands(1, u32::MAX));
        assert!(!has_operands(u32::MAX, u32::MAX));
        assert!(has_operands(0, 0x10000));
    }

    #[test]
    fn addresses_stop_at_64k() {
        assert!(is_valid_address(0));
        assert!(is_valid_address(0xFFFF));
        assert!(!is_valid_address(0x10000));
    }
}
