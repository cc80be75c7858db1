// Copyright 2016 Walter Kuppens.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

extern crate getopts;
extern crate hexvm;

use getopts::{Matches, Options};
use hexvm::io::errors::{EXIT_FAILURE, EXIT_INVALID_PROGRAM, EXIT_SUCCESS};
use hexvm::io::log;
use hexvm::{load_file, Machine, RuntimeOptions, StdConsole};
use std::env;
use std::io;
use std::path::Path;

// Range dumped after a debug run when none is given on the command-line.
const DEFAULT_DUMP_RANGE: (u32, u32) = (0x00, 0xFF);

// Extension expected on program files.
const PROGRAM_EXTENSION: &str = "hex";

/// Prints usage information along with the memory and stack geometry.
fn print_usage(program: &str, opts: &Options) {
    let brief = format!("Usage: {} [OPTIONS] <program>", program);
    print!("{}", opts.usage(&brief));
    println!();
    println!("Memory: 64K bytes (0x0000-0xFFFF)");
    println!("Stack:  64 levels");
}

/// Parses a `START:END` pair of hex addresses.
fn parse_range(range: &str) -> Result<(u32, u32), String> {
    let invalid = || format!("invalid memory range '{}', use START:END (hex)", range);
    let mut parts = range.splitn(2, ':');
    let start = parts.next().ok_or_else(invalid)?;
    let end = parts.next().ok_or_else(invalid)?;
    let start = u32::from_str_radix(start, 16).map_err(|_| invalid())?;
    let end = u32::from_str_radix(end, 16).map_err(|_| invalid())?;
    Ok((start, end))
}

fn has_program_extension(path: &str) -> bool {
    Path::new(path)
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case(PROGRAM_EXTENSION))
}

fn parse_start(matches: &Matches) -> Result<u16, String> {
    match matches.opt_str("s") {
        Some(addr) => u16::from_str_radix(&addr, 16)
            .map_err(|_| format!("invalid start address '{}', use 0000-FFFF (hex)", addr)),
        None => Ok(0),
    }
}

fn parse_limit(matches: &Matches) -> Result<u32, String> {
    match matches.opt_str("l") {
        Some(limit) => limit
            .parse::<u32>()
            .map_err(|_| format!("invalid instruction limit '{}'", limit)),
        None => Ok(RuntimeOptions::default().max_instructions),
    }
}

/// Loads and runs the program named on the command-line. Returns an exit
/// code after which the process stops. A run that faults still counts as a
/// completed run; only bad arguments and unloadable programs fail.
fn init() -> i32 {
    let args: Vec<String> = env::args().collect();
    let program = args.first().cloned().unwrap_or_else(|| String::from("hexvm"));

    let mut opts = Options::new();
    opts.optflag("d", "debug", "enable debug mode");
    opts.optflag("t", "trace", "enable trace mode (implies debug)");
    opts.optopt("m", "dump", "dump memory range after the run (hex)", "START:END");
    opts.optopt("s", "start", "start address (hex, default 0000)", "ADDR");
    opts.optopt("l", "limit", "instruction limit (default 1000000)", "N");
    opts.optflag("h", "help", "show this help");

    if args.len() < 2 {
        print_usage(&program, &opts);
        return EXIT_SUCCESS;
    }

    let matches = match opts.parse(&args[1..]) {
        Ok(matches) => matches,
        Err(e) => {
            eprintln!("hexvm: {}", e);
            return EXIT_FAILURE;
        }
    };

    if matches.opt_present("h") {
        print_usage(&program, &opts);
        return EXIT_SUCCESS;
    }

    let dump_range = match matches.opt_str("m").map(|range| parse_range(&range)) {
        Some(Ok(range)) => range,
        Some(Err(e)) => {
            eprintln!("hexvm: {}", e);
            return EXIT_FAILURE;
        }
        None => DEFAULT_DUMP_RANGE,
    };
    let (start, max_instructions) = match (parse_start(&matches), parse_limit(&matches)) {
        (Ok(start), Ok(limit)) => (start, limit),
        (Err(e), _) | (_, Err(e)) => {
            eprintln!("hexvm: {}", e);
            return EXIT_FAILURE;
        }
    };

    let path = match matches.free.as_slice() {
        [path] => path.clone(),
        [] => {
            eprintln!("hexvm: no program file specified");
            return EXIT_FAILURE;
        }
        _ => {
            eprintln!("hexvm: only one program file may be given");
            return EXIT_FAILURE;
        }
    };

    let trace = matches.opt_present("t");
    let runtime_options = RuntimeOptions {
        verbose: trace || matches.opt_present("d"),
        trace: trace,
        max_instructions: max_instructions,
    };

    if !has_program_extension(&path) {
        log::warn(format!("{} does not have a .{} extension", path, PROGRAM_EXTENSION));
    }

    let image = match load_file(&path) {
        Ok(image) => image,
        Err(e) => {
            eprintln!("hexvm: {}: {}", path, e);
            return EXIT_INVALID_PROGRAM;
        }
    };

    let mut machine = Machine::new(runtime_options);
    machine.load(&image);

    let outcome = {
        let stdin = io::stdin();
        let stdout = io::stdout();
        let mut console = StdConsole::new(stdin.lock(), stdout.lock());
        machine.run(start, &mut console)
    };

    if let Some(fault) = outcome.fault() {
        eprintln!("hexvm: {}", fault);
    }

    if machine.runtime_options.verbose {
        println!();
        print!("{}", machine.memory.dump(dump_range.0, dump_range.1));
        println!("{}", machine.cpu);
        if outcome.overflow {
            println!("[!] Overflow flag is SET");
        }
        if outcome.stack_depth > 0 {
            println!("[!] Warning: Stack not empty (depth={})", outcome.stack_depth);
        }
        log::log("vm", format!("{}", outcome), &machine.runtime_options);
    }

    EXIT_SUCCESS
}

/// Entry point of the program and wrapper of init. Takes the exit code returned
/// from init and exits with it.
fn main() {
    let exit_code = init();
    std::process::exit(exit_code);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_ranges() {
        assert_eq!(parse_range("00:FF"), Ok((0x00, 0xFF)));
        assert_eq!(parse_range("100:1ff"), Ok((0x100, 0x1FF)));
        assert!(parse_range("00").is_err());
        assert!(parse_range("00:zz").is_err());
        assert!(parse_range(":10").is_err());
    }

    #[test]
    fn recognises_program_extension() {
        assert!(has_program_extension("hello.hex"));
        assert!(has_program_extension("dir/LOOP.HEX"));
        assert!(!has_program_extension("hello.txt"));
        assert!(!has_program_extension("hex"));
        assert!(!has_program_extension("hello"));
    }
}
