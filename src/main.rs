mod args;
mod dash;

use clap::Parser;
use log::{debug, info};
use snafu::ErrorCompat;

use crate::args::Args;

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    debug!("args: {:?}", args);

    match dash::run_dashboard(&args) {
        Ok(_) => info!("Done"),
        Err(e) => {
            eprintln!("An error occured: {}", e);
            let mut cause = std::error::Error::source(&e);
            while let Some(c) = cause {
                eprintln!("  caused by: {}", c);
                cause = c.source();
            }
            if let Some(bt) = ErrorCompat::backtrace(&e) {
                eprintln!("trace: {}", bt);
            }
            std::process::exit(1);
        }
    }
}
