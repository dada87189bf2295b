mod cli;
mod platform;

use std::process::ExitCode;

use clap::Parser;

use cli::{Cli, Command};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run(args) => platform::run_app(args),
        Command::InstallBrowser => platform::install_browser(),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("reader2pdf: {err:#}");
            ExitCode::FAILURE
        }
    }
}
