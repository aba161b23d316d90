use clap::Parser;
use log::debug;
use snafu::ErrorCompat;

mod args;
mod pipeline;

use crate::args::Args;
use crate::pipeline::run_pipeline;

fn main() {
    let args = Args::parse();
    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();
    debug!("arguments: {:?}", args);
    match run_pipeline(&args) {
        Ok(()) => {}
        Err(e) => {
            eprintln!("An error occured: {}", e);
            if let Some(backtrace) = ErrorCompat::backtrace(&e) {
                debug!("backtrace: {}", backtrace);
            }
            std::process::exit(1);
        }
    }
}
