// cfront: typedef-aware C99 parser front end

use std::path::PathBuf;
use std::process;

use clap::Parser;

use cfront::driver;

const CFRONT_DEBUG_LOG: &str = "CFRONT_DEBUG_LOG";

/// Parse one C99 source file and report diagnostics.
///
/// Exit codes: 0 on success, 1 on syntax errors (with an `ERROR` marker
/// line on stdout), 2 when the file cannot be opened.
#[derive(Parser)]
#[clap(version)]
struct Opt {
    /// C source file to parse
    file: PathBuf,
}

fn main() {
    if std::env::var(CFRONT_DEBUG_LOG).is_ok() {
        env_logger::Builder::from_env(env_logger::Env::new().filter(CFRONT_DEBUG_LOG)).init();
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Error)
            .init();
    }

    let opt = Opt::parse();
    let verdict = driver::load_and_parse(&opt.file);
    process::exit(i32::from(verdict.exit_code()));
}
