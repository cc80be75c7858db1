// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use enum_primitive::FromPrimitive;

// Opcode bytes set aside for the extended instruction set (stack push/pop,
// boolean and comparison variants, structured control flow). They have no
// semantics yet and fault as unknown when executed.
pub const RESERVED_START: u8 = 0x1F;
pub const RESERVED_END: u8 = 0x36;

enum_from_primitive! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Opcode {
        // Core.
        NOP     = 0x00,
        POKE    = 0x01,
        MOVE    = 0x02,
        NOT     = 0x03,
        NAND    = 0x04,
        JMP     = 0x05,
        JZ      = 0x06,
        RUN     = 0x07,
        HALT    = 0x08,
        AND     = 0x09,
        OR      = 0x0A,
        XOR     = 0x0B,
        INC     = 0x0C,
        DEC     = 0x0D,
        CMP     = 0x0E,
        COMMENT = 0x0F,

        // Console I/O and return.
        PUTC    = 0x10,
        PUTN    = 0x11,
        GETC    = 0x12,
        RET     = 0x13,

        // Arithmetic and shifts.
        ADD     = 0x14,
        SUB     = 0x15,
        MUL     = 0x16,
        DIV     = 0x17,
        SHL     = 0x18,
        SHR     = 0x19,

        // 16-bit addressing.
        POKE16  = 0x1A,
        MOVE16  = 0x1B,
        JMP16   = 0x1C,
        JZ16    = 0x1D,
        RUN16   = 0x1E,
    }
}

/// Decodes an opcode byte. Unassigned and reserved bytes yield `None`.
pub fn decode_opcode(opcode: u8) -> Option<Opcode> {
    Opcode::from_u8(opcode)
}

/// True for bytes in the reserved extension range.
#[inline(always)]
pub fn is_reserved(opcode: u8) -> bool {
    opcode >= RESERVED_START && opcode <= RESERVED_END
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn implemented_range_decodes() {
        for byte in 0x00..=0x1Eu8 {
            let opcode = decode_opcode(byte).expect("implemented opcode");
            assert_eq!(opcode as u8, byte);
        }
        assert_eq!(decode_opcode(0x08), Some(Opcode::HALT));
        assert_eq!(decode_opcode(0x1E), Some(Opcode::RUN16));
    }

    #[test]
    fn reserved_and_unassigned_bytes_do_not_decode() {
        for byte in RESERVED_START..=RESERVED_END {
            assert!(is_reserved(byte));
            assert_eq!(decode_opcode(byte), None);
        }
        assert_eq!(decode_opcode(0x37), None);
        assert_eq!(decode_opcode(0xFF), None);
        assert!(!is_reserved(0x1E));
        assert!(!is_reserved(0x37));
    }
}
