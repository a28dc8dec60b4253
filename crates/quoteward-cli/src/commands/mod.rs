mod board;
mod quote;
mod run;
mod yield_sim;

use quoteward_core::{MarketHub, QuotewardConfig};
use serde_json::Value;

use crate::cli::{Cli, Command};
use crate::error::CliError;

/// Dispatch one command. `None` means the command printed nothing.
pub async fn run(cli: &Cli) -> Result<Option<Value>, CliError> {
    let config = QuotewardConfig::from_env()?;
    let hub = build_hub(config.clone(), cli.offline);

    match &cli.command {
        Command::Quote(args) => quote::run(args, &hub).await.map(Some),
        Command::Board => board::run(&hub).await.map(Some),
        Command::Yield(args) => yield_sim::run(args, &hub).await.map(Some),
        Command::Run => {
            run::run(&config, hub).await?;
            Ok(None)
        }
    }
}

fn build_hub(config: QuotewardConfig, offline: bool) -> MarketHub {
    let builder = MarketHub::builder(config);
    if offline {
        builder.offline().build()
    } else {
        builder.build()
    }
}
