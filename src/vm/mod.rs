// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

pub mod cpu;
pub mod dispatch;
pub mod fault;
pub mod instruction;
pub mod machine;
pub mod memory;
pub mod opcode;
pub mod operands;
pub mod stack;
