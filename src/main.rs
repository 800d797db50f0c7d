// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! jitte CLI - run TypeScript/TSX files on the Boa engine

use clap::Parser;
use jitte::{Jitte, Options, VERSION};
use owo_colors::OwoColorize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "jitte",
    about = "Just-in-time TypeScript/TSX runner powered by Boa",
    version = VERSION,
    author = "Pegasus Heavy Industries"
)]
struct Cli {
    /// TypeScript, TSX, or JavaScript file to execute
    file: PathBuf,

    /// Surface the full error chain on failure
    #[arg(short = 'd', long)]
    debug: bool,

    /// Disable the module cache (re-transform on every require)
    #[arg(long = "no-cache")]
    no_cache: bool,

    /// Skip inline source maps in transformed output
    #[arg(long = "no-source-maps")]
    no_source_maps: bool,

    /// Enable verbose logging
    #[arg(long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("jitte=debug")
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter("jitte=warn")
            .init();
    }

    let cwd = std::env::current_dir()?;
    let file = cwd.join(&cli.file);
    let options = Options::default()
        .with_debug(cli.debug)
        .with_cache(!cli.no_cache)
        .with_source_maps(!cli.no_source_maps);

    // The loader is bound to the working directory, like a module living
    // there would be.
    let mut loader = Jitte::with_options(cwd.join("__jitte__"), options)?;

    let specifier = file.display().to_string();
    match loader.require(&specifier) {
        Ok(_) => Ok(()),
        Err(err) => {
            eprintln!("{}: {}", "Error".red().bold(), err);
            if cli.debug {
                eprintln!("{err:#?}");
            }
            std::process::exit(1);
        }
    }
}
