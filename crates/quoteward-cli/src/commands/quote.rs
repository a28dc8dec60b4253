use serde::Serialize;
use serde_json::Value;

use quoteward_core::{Market, MarketHub, QuotePayload, Quoted};

use crate::cli::QuoteArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct QuoteResponseData {
    market: Market,
    #[serde(flatten)]
    quote: Quoted<QuotePayload>,
}

pub async fn run(args: &QuoteArgs, hub: &MarketHub) -> Result<Value, CliError> {
    let market = args.market.parse::<Market>()?;

    let quote = if args.refresh {
        hub.refresh(market).await
    } else {
        hub.latest_quote(market).await
    };

    Ok(serde_json::to_value(QuoteResponseData { market, quote })?)
}
