// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use chrono::{DateTime, Local};
use crate::vm::machine::RuntimeOptions;

/// Logs a message to stdout with a given prefix if the machine was started
/// with the verbose flag set.
pub fn log<P, T>(prefix: P, text: T, runtime_options: &RuntimeOptions)
where
    P: Into<String>,
    T: Into<String>,
{
    if runtime_options.verbose {
        emit(prefix.into(), text.into());
    }
}

/// Like `log`, but only emits when tracing is enabled. Used for the per
/// instruction and per stack operation chatter.
pub fn trace<T>(text: T, runtime_options: &RuntimeOptions)
where
    T: Into<String>,
{
    if runtime_options.trace {
        emit("trace".into(), text.into());
    }
}

/// Warnings are printed regardless of verbosity.
pub fn warn<T>(text: T)
where
    T: Into<String>,
{
    let local: DateTime<Local> = Local::now();
    eprintln!("[{}] -- [warning] {}", local, text.into());
}

fn emit(prefix: String, text: String) {
    let local: DateTime<Local> = Local::now();
    println!("[{}] -- [{}] {}", local, prefix, text);
}
