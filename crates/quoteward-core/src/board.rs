use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::{CoinQuote, DualQuote, EquityQuote, FxRate, Ticker};

/// Every known ticker priced in both currencies.
///
/// Equities are listed in BRL and get their USD leg from the FX rate; crypto
/// quotes already carry both legs and win on a ticker clash.
#[derive(Debug, Clone, PartialEq)]
pub struct QuoteBoard {
    usd_brl: FxRate,
    quotes: HashMap<Ticker, DualQuote>,
}

impl QuoteBoard {
    pub fn empty(usd_brl: FxRate) -> Self {
        Self {
            usd_brl,
            quotes: HashMap::new(),
        }
    }

    pub fn build<'a>(
        usd_brl: FxRate,
        equities: impl IntoIterator<Item = &'a EquityQuote>,
        coins: impl IntoIterator<Item = &'a CoinQuote>,
    ) -> Self {
        let mut board = Self::empty(usd_brl);

        for equity in equities {
            match DualQuote::from_brl(equity.price_brl, usd_brl) {
                Some(quote) => {
                    board.quotes.insert(equity.ticker.clone(), quote);
                }
                None => {
                    tracing::warn!(ticker = %equity.ticker, "zero FX rate, equity left off the board");
                }
            }
        }
        for coin in coins {
            board
                .quotes
                .insert(coin.symbol.clone(), DualQuote::new(coin.price_brl, coin.price_usd));
        }

        board
    }

    pub fn insert(&mut self, ticker: Ticker, quote: DualQuote) {
        self.quotes.insert(ticker, quote);
    }

    pub fn get(&self, ticker: &Ticker) -> Option<&DualQuote> {
        self.quotes.get(ticker)
    }

    pub fn usd_brl(&self) -> FxRate {
        self.usd_brl
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Entries sorted by ticker.
    pub fn sorted(&self) -> Vec<(&Ticker, &DualQuote)> {
        let mut entries = self.quotes.iter().collect::<Vec<_>>();
        entries.sort_by(|left, right| left.0.cmp(right.0));
        entries
    }
}

/// Anything able to assemble a [`QuoteBoard`] from already cached quotes.
pub trait QuoteBoardSource: Send + Sync {
    fn quote_board<'a>(&'a self) -> Pin<Box<dyn Future<Output = QuoteBoard> + Send + 'a>>;
}
