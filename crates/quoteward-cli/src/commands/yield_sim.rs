use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use quoteward_core::{parse_decimal, MarketHub, YieldIndex};

use crate::cli::YieldArgs;
use crate::error::CliError;

#[derive(Debug, Serialize)]
struct YieldResponseData {
    balance: Decimal,
    percent: Decimal,
    index: YieldIndex,
    daily_yield: Decimal,
}

pub async fn run(args: &YieldArgs, hub: &MarketHub) -> Result<Value, CliError> {
    let balance = optional_decimal("balance", args.balance.as_deref())?;
    let percent = optional_decimal("percent", args.percent.as_deref())?;
    let index = args.index.parse::<YieldIndex>().unwrap_or_else(|error| {
        tracing::warn!(%error, "unknown index, simulating against CDI");
        YieldIndex::Cdi
    });

    let daily_yield = hub.daily_yield(balance, percent, index).await;
    Ok(serde_json::to_value(YieldResponseData {
        balance,
        percent,
        index,
        daily_yield,
    })?)
}

fn optional_decimal(field: &'static str, raw: Option<&str>) -> Result<Decimal, CliError> {
    match raw {
        Some(raw) => Ok(parse_decimal(field, raw)?),
        None => Ok(Decimal::ZERO),
    }
}
