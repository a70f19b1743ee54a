// lireta -- a textual notation language for composing audio
// Copyright (C) 2020  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation.
//
// A copy of the license can be found in the LICENSE file in the root of
// this repository.

//! `lireta` evaluates a program and plays the resulting audio or writes it to a file.

use std::path::PathBuf;
use std::process;

use log::error;
use structopt::StructOpt;

use lireta::driver;

#[derive(Debug, StructOpt)]
#[structopt(name = "lireta", about = "Turning text into music")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// The source code of the music.
    #[structopt(parse(from_os_str))]
    source: PathBuf,

    /// Write the audio to this WAV file instead of playing it.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    /// Play the audio, also when writing it to a file.
    #[structopt(short, long)]
    play: bool,

    /// Print the program as the lexer understood it and exit.
    #[structopt(long)]
    dump_tree: bool,
}

fn main() {
    let opt = Opt::from_args();

    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    if let Err(err) = simple_logger::init_with_level(level) {
        eprintln!("could not set up logging: {}", err);
    }

    if let Err(err) = run(&opt) {
        error!("{}", err);
        process::exit(1);
    }
}

fn run(opt: &Opt) -> Result<(), driver::Error> {
    if opt.dump_tree {
        print!("{}", driver::dump_tree(&opt.source)?);
        return Ok(());
    }
    let outcome = driver::evaluate_file(&opt.source)?;
    driver::deliver(&outcome, opt.output.as_deref(), opt.play)
}
