// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

// Shift amounts only ever use the low three bits of the stored operand.
const SHIFT_MASK: u8 = 0b00000111;

/// Adds two bytes. The result wraps modulo 256 and the flag is set when the
/// true sum does not fit in a byte.
#[inline(always)]
pub fn add(a: u8, b: u8) -> (u8, bool) {
    a.overflowing_add(b)
}

/// Subtracts `b` from `a`. The flag is set when a borrow occurred, that is
/// when the signed difference would be negative.
#[inline(always)]
pub fn sub(a: u8, b: u8) -> (u8, bool) {
    a.overflowing_sub(b)
}

/// Multiplies two bytes, keeping the low byte of the product. The flag is set
/// when the full product exceeds 255.
#[inline(always)]
pub fn mul(a: u8, b: u8) -> (u8, bool) {
    let product = a as u16 * b as u16;
    (product as u8, product > u8::MAX as u16)
}

/// Unsigned division. `None` when dividing by zero.
#[inline(always)]
pub fn div(a: u8, b: u8) -> Option<u8> {
    a.checked_div(b)
}

#[inline(always)]
pub fn shl(value: u8, shift: u8) -> u8 {
    value << (shift & SHIFT_MASK)
}

#[inline(always)]
pub fn shr(value: u8, shift: u8) -> u8 {
    value >> (shift & SHIFT_MASK)
}

#[inline(always)]
pub fn nand(a: u8, b: u8) -> u8 {
    !(a & b)
}

/// Equality as a byte: 1 when equal, 0 otherwise.
#[inline(always)]
pub fn cmp(a: u8, b: u8) -> u8 {
    (a == b) as u8
}
