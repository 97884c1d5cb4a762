//! wbs - hierarchical work breakdown structures from the command line

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = wbs_engine::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
