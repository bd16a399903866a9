//! modbuild - dependency-aware builds for multi-module native projects
//!
//! Entry point for the modbuild command-line application.

use clap::error::ErrorKind;
use clap::Parser;

use modbuild::cli::output::{display_error, exit_code};
use modbuild::cli::Cli;
use modbuild::error::ModbuildError;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // clap's rendering already carries the usage line
            let _ = e.print();
            let error = ModbuildError::Invocation {
                message: e.kind().to_string(),
            };
            std::process::exit(error.exit_code());
        }
    };

    // Apply output configuration globally
    let output_config = cli.output();
    output_config.apply_global();

    // Run the command and handle errors
    match cli.run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            display_error(&e);
            std::process::exit(exit_code(&e));
        }
    }
}
