// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A small byte-addressed virtual machine. Programs are written as hex
//! digit text, loaded into a flat 64K memory, and executed one opcode at a
//! time until they halt or fault.

extern crate byteorder;
extern crate chrono;
#[macro_use]
extern crate enum_primitive;
extern crate thiserror;

pub mod io;
pub mod utils;
pub mod vm;

pub use io::console::{Console, StdConsole};
pub use io::loader::{load_file, parse_source, LoadError, Program};
pub use vm::fault::{Fault, FaultKind, Halt, Outcome};
pub use vm::machine::{Machine, RuntimeOptions, State};
