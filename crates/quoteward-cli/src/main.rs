mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use std::process::ExitCode;

use crate::cli::Cli;
use crate::error::CliError;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(error.exit_code())
        }
    }
}

async fn run() -> Result<ExitCode, CliError> {
    let cli = Cli::parse();
    output::init_logging(cli.log_json)?;

    if let Some(payload) = commands::run(&cli).await? {
        output::render(&payload, cli.pretty)?;
    }

    Ok(ExitCode::SUCCESS)
}
