//! CLI argument definitions for quoteward.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `quote` | Latest quote of one market (fx, crypto, indices, stocks, reits, etfs) |
//! | `board` | Every known ticker priced in BRL and USD |
//! | `yield` | One business day of yield for a fixed-income position |
//! | `run` | Background refreshes, alert sweeps and limiter sweeps until Ctrl-C |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--offline` | `false` | No network; serve last-resort values |
//! | `--log-json` | `false` | Emit logs as JSON lines |
//!
//! # Examples
//!
//! ```bash
//! quoteward quote fx --pretty
//! quoteward yield --balance 10000 --percent 110 --index cdi
//! RUST_LOG=quoteward_core=debug quoteward run
//! ```

use clap::{Args, Parser, Subcommand};

/// Resilient market quotes with fallback chains and price alerts.
#[derive(Debug, Parser)]
#[command(name = "quoteward", author, version, about)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Never touch the network. Every read serves cached or last-resort values.
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Write logs to stderr as JSON lines instead of plain text.
    #[arg(long, global = true, default_value_t = false)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Latest quote of one market.
    Quote(QuoteArgs),
    /// Unified price board built from freshly read quotes.
    Board,
    /// Simulate one business day of yield.
    Yield(YieldArgs),
    /// Keep every market warm and sweep alerts until interrupted.
    Run,
}

#[derive(Debug, Args)]
pub struct QuoteArgs {
    /// fx, crypto, indices, stocks, reits or etfs.
    pub market: String,

    /// Bypass the cache and run a full provider cycle.
    #[arg(long, default_value_t = false)]
    pub refresh: bool,
}

#[derive(Debug, Args)]
pub struct YieldArgs {
    /// Invested amount in BRL. Missing means zero.
    #[arg(long)]
    pub balance: Option<String>,

    /// Share of the index (110 for 110% of CDI) or the annual rate for PRE.
    #[arg(long)]
    pub percent: Option<String>,

    /// CDI, SELIC, IPCA or PRE. Unknown values fall back to CDI.
    #[arg(long, default_value = "CDI")]
    pub index: String,
}
