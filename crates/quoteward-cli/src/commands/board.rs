use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use quoteward_core::{Market, MarketHub, QuoteBoardSource, Ticker};

use crate::error::CliError;

#[derive(Debug, Serialize)]
struct BoardEntry<'a> {
    ticker: &'a Ticker,
    brl: Decimal,
    usd: Decimal,
}

#[derive(Debug, Serialize)]
struct BoardResponseData<'a> {
    usd_brl: Decimal,
    quotes: Vec<BoardEntry<'a>>,
}

/// Warm every market the board draws from, then print the board.
pub async fn run(hub: &MarketHub) -> Result<Value, CliError> {
    for market in [Market::Fx, Market::Crypto, Market::Stocks, Market::Reits, Market::Etfs] {
        let read = hub.latest_quote(market).await;
        tracing::debug!(%market, origin = read.origin.as_str(), "board input ready");
    }

    let board = hub.quote_board().await;
    let quotes = board
        .sorted()
        .into_iter()
        .map(|(ticker, quote)| BoardEntry {
            ticker,
            brl: quote.brl,
            usd: quote.usd,
        })
        .collect();

    Ok(serde_json::to_value(BoardResponseData {
        usd_brl: board.usd_brl().usd_brl,
        quotes,
    })?)
}
